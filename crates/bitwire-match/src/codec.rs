//! 位匹配模式的持久化格式：两个首尾相接的长度前缀字节块，先值后掩码。

use bitwire_core::{BufferKind, DecodeLimits};
use bitwire_io::{
    ByteSink, ByteSource, LengthPrefixed, ReadError, Reader, WriteError, Writer,
};

use crate::bitmatch::BitMatch;

/// [`BitMatch`] 序列化器。
///
/// # 契约说明（What）
/// - 值与掩码各自按 [`BitVector::to_bytes`](bitwire_core::BitVector::to_bytes) 的最小字节形式写出；
/// - 读回的值/掩码违反不变式时返回解码错误，消息中带有具体原因。
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct BitMatchCodec {
    blocks: LengthPrefixed,
}

impl BitMatchCodec {
    pub const fn new() -> Self {
        Self {
            blocks: LengthPrefixed::new(BufferKind::Heap),
        }
    }

    /// 对值、掩码两个字节块分别施加长度上限。
    pub fn with_limits(mut self, limits: DecodeLimits) -> Self {
        self.blocks = self.blocks.with_limits(limits);
        self
    }
}

impl Writer<BitMatch> for BitMatchCodec {
    fn write<K: ByteSink>(&self, value: &BitMatch, sink: &mut K) -> Result<(), WriteError> {
        self.blocks.write(&value.value().to_bytes(), sink)?;
        self.blocks.write(&value.mask().to_bytes(), sink)
    }
}

impl Reader<BitMatch> for BitMatchCodec {
    fn read<K: ByteSource>(&self, source: &mut K) -> Result<BitMatch, ReadError> {
        let value: Vec<u8> = self.blocks.read(source)?;
        let mask: Vec<u8> = self.blocks.read(source)?;
        BitMatch::of_bytes(&value, &mask).map_err(|err| ReadError::decode(err.to_string()))
    }
}
