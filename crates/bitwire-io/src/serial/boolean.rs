//! 带冗余校验的布尔序列化器。

use bitwire_core::ByteOrder;

use super::{Reader, Writer};
use crate::{
    error::{ReadError, WriteError},
    transport::{ByteSink, ByteSource},
};

/// `false` 的线路字节。
pub const FALSE_BYTE: u8 = 0b0101_0101;
/// `true` 的线路字节，为 [`FALSE_BYTE`] 的按位取反。
pub const TRUE_BYTE: u8 = !FALSE_BYTE;

/// 布尔序列化器。
///
/// # 契约说明（What）
/// - 写入：`true` 为 [`TRUE_BYTE`]，`false` 为 [`FALSE_BYTE`]；
/// - 读取：除这两个字节外的任何值都是解码错误，错误消息包含该字节的二进制形式。
///   单比特翻转无法把一个合法值变成另一个合法值，读取端因此能发现线路损坏。
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct BoolCodec;

impl Writer<bool> for BoolCodec {
    fn write<K: ByteSink>(&self, value: &bool, sink: &mut K) -> Result<(), WriteError> {
        sink.write_u8(if *value { TRUE_BYTE } else { FALSE_BYTE })
    }
}

impl Reader<bool> for BoolCodec {
    fn read<K: ByteSource>(&self, source: &mut K) -> Result<bool, ReadError> {
        match source.read_value::<u8>(ByteOrder::BigEndian)? {
            TRUE_BYTE => Ok(true),
            FALSE_BYTE => Ok(false),
            other => Err(ReadError::decode(format!(
                "invalid boolean binary value: {other:08b}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use bitwire_core::{BufferKind, ByteBuffer};

    use super::*;

    #[test]
    fn encodings_are_bitwise_complements() {
        let mut buf = ByteBuffer::allocate(2, BufferKind::Heap);
        BoolCodec.write(&true, &mut buf).expect("写 true");
        BoolCodec.write(&false, &mut buf).expect("写 false");
        let raw = buf.storage();
        assert_ne!(raw[0], raw[1]);
        assert_eq!(raw[0], !raw[1]);
    }

    /// 除两个合法模式外的 254 个字节全部被拒绝。
    #[test]
    fn every_other_byte_is_rejected() {
        for byte in 0..=u8::MAX {
            let mut buf = ByteBuffer::copy_of(&[byte], BufferKind::Heap);
            let outcome = BoolCodec.read(&mut buf);
            match byte {
                TRUE_BYTE => assert!(outcome.expect("合法 true")),
                FALSE_BYTE => assert!(!outcome.expect("合法 false")),
                _ => {
                    let err = outcome.expect_err("非法模式");
                    assert_eq!(
                        err.to_string(),
                        format!("decode failed: invalid boolean binary value: {byte:08b}")
                    );
                }
            }
        }
    }
}
