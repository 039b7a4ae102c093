//! 定长原语序列化器。

use bitwire_core::{ByteOrder, Primitive};

use super::{Reader, Writer};
use crate::{
    error::{ReadError, WriteError},
    transport::{ByteSink, ByteSource},
};

/// 按固定字节序读写任意 [`Primitive`] 的序列化器。
///
/// 只持有一个字节序值，对 `u8`/`i8`/`u16`/`i16`/[`U24`](bitwire_core::U24)/`u32`/`i32`/
/// `u64`/`i64`/`f32`/`f64` 同时实现 [`Writer`] 与 [`Reader`]。
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct PrimitiveCodec {
    order: ByteOrder,
}

impl PrimitiveCodec {
    pub const BIG_ENDIAN: PrimitiveCodec = PrimitiveCodec::new(ByteOrder::BigEndian);
    pub const LITTLE_ENDIAN: PrimitiveCodec = PrimitiveCodec::new(ByteOrder::LittleEndian);

    pub const fn new(order: ByteOrder) -> Self {
        Self { order }
    }

    pub const fn order(&self) -> ByteOrder {
        self.order
    }
}

impl<T: Primitive> Writer<T> for PrimitiveCodec {
    fn write<K: ByteSink>(&self, value: &T, sink: &mut K) -> Result<(), WriteError> {
        sink.write_value(*value, self.order)
    }
}

impl<T: Primitive> Reader<T> for PrimitiveCodec {
    fn read<K: ByteSource>(&self, source: &mut K) -> Result<T, ReadError> {
        source.read_value(self.order)
    }
}

#[cfg(test)]
mod tests {
    use bitwire_core::{BufferKind, ByteBuffer};

    use super::*;

    #[test]
    fn one_codec_serves_every_width() {
        let mut buf = ByteBuffer::allocate(20, BufferKind::Heap);
        let codec = PrimitiveCodec::LITTLE_ENDIAN;
        codec.write(&i32::MIN, &mut buf).expect("int");
        codec.write(&i64::MAX, &mut buf).expect("long");
        codec.write(&-0.25f64, &mut buf).expect("double");
        buf.flip();

        let int: i32 = codec.read(&mut buf).expect("int");
        let long: i64 = codec.read(&mut buf).expect("long");
        let double: f64 = codec.read(&mut buf).expect("double");
        assert_eq!((int, long, double), (i32::MIN, i64::MAX, -0.25));
        assert_eq!(&buf.storage()[..4], &[0x00, 0x00, 0x00, 0x80]);
    }
}
