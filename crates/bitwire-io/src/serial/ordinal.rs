//! 枚举序号序列化器。

use core::marker::PhantomData;

use bitwire_core::{BufferKind, ByteOrder};

use super::{Reader, Writer, write_count};
use crate::{
    error::{ReadError, WriteError},
    transport::{ByteSink, ByteSource},
};

/// 以从零开始的序号标识的封闭枚举。
///
/// # 契约说明（What）
/// - `VARIANTS` 按序号顺序列出全部变体，`VARIANTS[v.ordinal()] == v`；
/// - `NAME` 出现在越界序号的错误消息中。
pub trait Ordinal: Sized + Clone + 'static {
    const NAME: &'static str;
    const VARIANTS: &'static [Self];

    fn ordinal(&self) -> usize;
}

/// 枚举序列化器：4 字节大端序号。
///
/// 读取时序号必须落在 `[0, VARIANTS.len())`，否则为解码错误。
pub struct EnumCodec<E> {
    _marker: PhantomData<fn() -> E>,
}

impl<E: Ordinal> EnumCodec<E> {
    pub const fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<E: Ordinal> Default for EnumCodec<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for EnumCodec<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for EnumCodec<E> {}

impl<E> core::fmt::Debug for EnumCodec<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("EnumCodec")
    }
}

impl<E: Ordinal> Writer<E> for EnumCodec<E> {
    fn write<K: ByteSink>(&self, value: &E, sink: &mut K) -> Result<(), WriteError> {
        write_count(sink, value.ordinal(), "enum ordinal")
    }
}

impl<E: Ordinal> Reader<E> for EnumCodec<E> {
    fn read<K: ByteSource>(&self, source: &mut K) -> Result<E, ReadError> {
        let ordinal: i32 = source.read_value(ByteOrder::BigEndian)?;
        usize::try_from(ordinal)
            .ok()
            .and_then(|index| E::VARIANTS.get(index))
            .cloned()
            .ok_or_else(|| {
                ReadError::decode(format!(
                    "read {} enum ordinal is out of bounds: {ordinal}",
                    E::NAME
                ))
            })
    }
}

impl Ordinal for ByteOrder {
    const NAME: &'static str = "ByteOrder";
    const VARIANTS: &'static [Self] = &[ByteOrder::BigEndian, ByteOrder::LittleEndian];

    fn ordinal(&self) -> usize {
        match self {
            ByteOrder::BigEndian => 0,
            ByteOrder::LittleEndian => 1,
        }
    }
}

impl Ordinal for BufferKind {
    const NAME: &'static str = "BufferKind";
    const VARIANTS: &'static [Self] = &[BufferKind::Heap, BufferKind::Direct];

    fn ordinal(&self) -> usize {
        match self {
            BufferKind::Heap => 0,
            BufferKind::Direct => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use bitwire_core::ByteBuffer;

    use super::*;

    fn assert_table_consistent<E: Ordinal + PartialEq + core::fmt::Debug>() {
        for (index, variant) in E::VARIANTS.iter().enumerate() {
            assert_eq!(variant.ordinal(), index, "{} 的序号表不一致", E::NAME);
        }
    }

    #[test]
    fn ordinal_tables_are_consistent() {
        assert_table_consistent::<ByteOrder>();
        assert_table_consistent::<BufferKind>();
    }

    #[test]
    fn every_variant_round_trips() {
        let codec = EnumCodec::<BufferKind>::new();
        let mut buf = ByteBuffer::allocate(8, BufferKind::Heap);
        for kind in BufferKind::VARIANTS {
            codec.write(kind, &mut buf).expect("写入序号");
        }
        buf.flip();
        assert_eq!(buf.remaining_slice(), &[0, 0, 0, 0, 0, 0, 0, 1]);
        for kind in BufferKind::VARIANTS {
            assert_eq!(&codec.read(&mut buf).expect("读回序号"), kind);
        }
    }

    #[test]
    fn out_of_range_ordinals_fail() {
        let codec = EnumCodec::<ByteOrder>::new();
        for bad in [2i32, -1] {
            let mut buf = ByteBuffer::allocate(4, BufferKind::Heap);
            buf.put_at(0, bad, ByteOrder::BigEndian).expect("写入序号");
            let err = codec.read(&mut buf).expect_err("越界序号");
            assert_eq!(
                err.to_string(),
                format!("decode failed: read ByteOrder enum ordinal is out of bounds: {bad}")
            );
        }
    }
}
