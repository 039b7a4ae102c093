//! 随机访问缓冲传输。
//!
//! # 模块定位（Why）
//! - 内存中的 [`ByteBuffer`] 本身就是一种传输：相对读写推进它的 `position`；
//! - 回填报文头、就地改写字段时需要“在指定偏移处读写但不碰任何游标”，
//!   [`PositionedBuffer`] 在外部维护一个独立偏移，使所有序列化器都能直接作用于绝对位置。
//!
//! # 契约说明（What）
//! - 读取越过 `limit` 统一报告 [`ReadError::EndOfStream`]，与通道、流的输入结束语义一致；
//! - 写入越界报告 [`WriteError::Buffer`]，携带原始的 `Overflow`/`IndexOutOfBounds`；
//! - 失败时缓冲游标与 [`PositionedBuffer`] 的偏移都保持调用前的值。

use core::fmt;

use bitwire_core::{BufferError, BufferOperation, ByteBuffer};

use crate::{
    error::{ReadError, WriteError},
    transport::{ByteSink, ByteSource},
};

fn exhausted(err: BufferError) -> ReadError {
    match err {
        BufferError::Underflow { .. } | BufferError::IndexOutOfBounds { .. } => {
            ReadError::EndOfStream
        }
        other => ReadError::Buffer(other),
    }
}

impl<S: AsRef<[u8]>> ByteSource for ByteBuffer<S> {
    fn read_exact_into(&mut self, dst: &mut [u8]) -> Result<(), ReadError> {
        self.get_bytes(dst, BufferOperation::AdvancePosition)
            .map_err(exhausted)
    }
}

impl<S: AsRef<[u8]> + AsMut<[u8]>> ByteSink for ByteBuffer<S> {
    fn write_all_from(&mut self, src: &[u8]) -> Result<(), WriteError> {
        Ok(self.put_bytes(src, BufferOperation::AdvancePosition)?)
    }

    fn write_zeros(&mut self, count: usize) -> Result<(), WriteError> {
        Ok(self.put_zeros(count, BufferOperation::AdvancePosition)?)
    }
}

/// 在缓冲的绝对偏移处读写、且不移动缓冲游标的传输。
///
/// # 逻辑解析（How）
/// - 持有缓冲的可变借用与一个独立偏移 `offset`；
/// - 每次成功读写后只推进 `offset`，缓冲的 `position`/`limit`/`mark` 始终不变；
/// - 可访问范围仍以缓冲的 `limit` 为界。
pub struct PositionedBuffer<'a, S> {
    buf: &'a mut ByteBuffer<S>,
    offset: usize,
}

impl<'a, S: AsRef<[u8]>> PositionedBuffer<'a, S> {
    pub fn new(buf: &'a mut ByteBuffer<S>, offset: usize) -> Self {
        Self { buf, offset }
    }

    /// 下一次读写的绝对偏移。
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn seek(&mut self, offset: usize) {
        self.offset = offset;
    }

    pub fn buffer(&self) -> &ByteBuffer<S> {
        self.buf
    }
}

impl<S: AsRef<[u8]>> fmt::Debug for PositionedBuffer<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PositionedBuffer")
            .field("offset", &self.offset)
            .field("position", &self.buf.position())
            .field("limit", &self.buf.limit())
            .field("capacity", &self.buf.capacity())
            .finish()
    }
}

impl<S: AsRef<[u8]>> ByteSource for PositionedBuffer<'_, S> {
    fn read_exact_into(&mut self, dst: &mut [u8]) -> Result<(), ReadError> {
        self.buf.get_bytes_at(self.offset, dst).map_err(exhausted)?;
        self.offset += dst.len();
        Ok(())
    }
}

impl<S: AsRef<[u8]> + AsMut<[u8]>> ByteSink for PositionedBuffer<'_, S> {
    fn write_all_from(&mut self, src: &[u8]) -> Result<(), WriteError> {
        self.buf.put_bytes_at(self.offset, src)?;
        self.offset += src.len();
        Ok(())
    }

    fn write_zeros(&mut self, count: usize) -> Result<(), WriteError> {
        self.buf.put_zeros_at(self.offset, count)?;
        self.offset += count;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use bitwire_core::{BufferKind, ByteOrder};

    use super::*;

    #[test]
    fn relative_transport_advances_position() {
        let mut buf = ByteBuffer::allocate(6, BufferKind::Heap);
        buf.write_value(0x0102_0304i32, ByteOrder::BigEndian)
            .expect("写入 int");
        buf.write_zeros(2).expect("写零");
        assert!(matches!(
            buf.write_u8(9),
            Err(WriteError::Buffer(BufferError::Overflow { .. }))
        ));
        buf.flip();
        assert_eq!(
            buf.read_value::<i32>(ByteOrder::LittleEndian).expect("读回 int"),
            0x0403_0201
        );
        assert!(matches!(
            buf.read_value::<i32>(ByteOrder::BigEndian),
            Err(ReadError::EndOfStream)
        ));
        assert_eq!(buf.position(), 4, "读取失败不推进游标");
    }

    /// 绝对偏移读写不改变缓冲的任何游标。
    #[test]
    fn positioned_access_never_moves_cursors() {
        let mut buf = ByteBuffer::allocate(8, BufferKind::Direct);
        buf.set_position(1).expect("位置合法");
        buf.mark();
        {
            let mut at = PositionedBuffer::new(&mut buf, 4);
            at.write_value(0xCAFEu16, ByteOrder::BigEndian)
                .expect("偏移 4 处写入");
            at.write_zeros(2).expect("写零");
            assert_eq!(at.offset(), 8);
            assert!(at.write_u8(1).is_err(), "超出 limit");
            at.seek(4);
            assert_eq!(
                at.read_value::<u16>(ByteOrder::LittleEndian).expect("读回"),
                0xFECA
            );
            at.seek(7);
            assert!(matches!(
                at.read_value::<u16>(ByteOrder::BigEndian),
                Err(ReadError::EndOfStream)
            ));
            assert_eq!(at.offset(), 7);
        }
        assert_eq!((buf.position(), buf.limit()), (1, 8));
        assert_eq!(
            format!("{:?}", PositionedBuffer::new(&mut buf, 3)),
            "PositionedBuffer { offset: 3, position: 1, limit: 8, capacity: 8 }"
        );
        buf.set_position(5).expect("位置合法");
        buf.reset().expect("标记仍然有效");
        assert_eq!(buf.position(), 1);
    }
}
