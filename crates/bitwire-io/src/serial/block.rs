//! 字节块序列化器。
//!
//! - [`LengthPrefixed`]：4 字节大端长度 + 原始字节；
//! - [`RawBytes`]：长度由双方事先约定，线路上只有原始字节。
//!
//! 两者都提供 `read_cached`：载荷读入当前线程的缓存缓冲，在闭包内就地解析，
//! 解析完成即归还，不为每条消息分配新内存。

use bitwire_core::{BufferKind, ByteBuffer, DecodeLimits, with_cached};

use super::{Reader, Writer, read_declared, read_length, write_count};
use crate::{
    error::{ReadError, WriteError},
    transport::{ByteSink, ByteSource},
};

/// 长度前缀字节块序列化器。
///
/// # 契约说明（What）
/// - 写入 [`ByteBuffer`] 时写出其 `[position, limit)`，源缓冲游标不动；
/// - 读出的缓冲类别为 `kind`，`position = 0`，`limit = capacity = 载荷长度`；
/// - 零长度块在线路上恰好是 4 个零字节。
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct LengthPrefixed {
    kind: BufferKind,
    limits: DecodeLimits,
}

impl LengthPrefixed {
    pub const fn new(kind: BufferKind) -> Self {
        Self {
            kind,
            limits: DecodeLimits::UNBOUNDED,
        }
    }

    pub fn with_limits(mut self, limits: DecodeLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn kind(&self) -> BufferKind {
        self.kind
    }

    /// 把载荷读入线程本地缓存缓冲并交给 `f` 解析。
    ///
    /// 载荷长度超过 [`bitwire_core::MAX_CACHED_BUFFER_CAPACITY`] 时返回
    /// `ReadError::Buffer(InvalidArgument)`；闭包内不得再次借用同类缓存。
    pub fn read_cached<K, R, F>(&self, source: &mut K, f: F) -> Result<R, ReadError>
    where
        K: ByteSource,
        F: FnOnce(&mut ByteBuffer<&mut [u8]>) -> Result<R, ReadError>,
    {
        let len = read_length(source, &self.limits)?;
        fill_cached(source, len, self.kind, f)
    }
}

impl Writer<[u8]> for LengthPrefixed {
    fn write<K: ByteSink>(&self, value: &[u8], sink: &mut K) -> Result<(), WriteError> {
        write_count(sink, value.len(), "buffer length")?;
        sink.write_all_from(value)
    }
}

impl Writer<Vec<u8>> for LengthPrefixed {
    fn write<K: ByteSink>(&self, value: &Vec<u8>, sink: &mut K) -> Result<(), WriteError> {
        Writer::<[u8]>::write(self, value, sink)
    }
}

impl<S: AsRef<[u8]>> Writer<ByteBuffer<S>> for LengthPrefixed {
    fn write<K: ByteSink>(&self, value: &ByteBuffer<S>, sink: &mut K) -> Result<(), WriteError> {
        Writer::<[u8]>::write(self, value.remaining_slice(), sink)
    }
}

impl Reader<ByteBuffer> for LengthPrefixed {
    fn read<K: ByteSource>(&self, source: &mut K) -> Result<ByteBuffer, ReadError> {
        let len = read_length(source, &self.limits)?;
        let raw = read_declared(source, len)?;
        Ok(ByteBuffer::copy_of(&raw, self.kind))
    }
}

impl Reader<Vec<u8>> for LengthPrefixed {
    fn read<K: ByteSource>(&self, source: &mut K) -> Result<Vec<u8>, ReadError> {
        let len = read_length(source, &self.limits)?;
        read_declared(source, len)
    }
}

/// 定长字节块序列化器，线路上没有长度前缀。
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RawBytes {
    len: usize,
    kind: BufferKind,
}

impl RawBytes {
    pub const fn new(len: usize, kind: BufferKind) -> Self {
        Self { len, kind }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// 把 `len` 字节读入线程本地缓存缓冲并交给 `f` 解析。
    pub fn read_cached<K, R, F>(&self, source: &mut K, f: F) -> Result<R, ReadError>
    where
        K: ByteSource,
        F: FnOnce(&mut ByteBuffer<&mut [u8]>) -> Result<R, ReadError>,
    {
        fill_cached(source, self.len, self.kind, f)
    }
}

impl Writer<[u8]> for RawBytes {
    fn write<K: ByteSink>(&self, value: &[u8], sink: &mut K) -> Result<(), WriteError> {
        if value.len() != self.len {
            return Err(WriteError::encode(format!(
                "raw block expects {} bytes, got {}",
                self.len,
                value.len()
            )));
        }
        sink.write_all_from(value)
    }
}

impl<S: AsRef<[u8]>> Writer<ByteBuffer<S>> for RawBytes {
    fn write<K: ByteSink>(&self, value: &ByteBuffer<S>, sink: &mut K) -> Result<(), WriteError> {
        Writer::<[u8]>::write(self, value.remaining_slice(), sink)
    }
}

impl Reader<ByteBuffer> for RawBytes {
    fn read<K: ByteSource>(&self, source: &mut K) -> Result<ByteBuffer, ReadError> {
        let mut buf = ByteBuffer::allocate(self.len, self.kind);
        source.read_exact_into(buf.remaining_slice_mut())?;
        Ok(buf)
    }
}

impl Reader<Vec<u8>> for RawBytes {
    fn read<K: ByteSource>(&self, source: &mut K) -> Result<Vec<u8>, ReadError> {
        let mut raw = vec![0u8; self.len];
        source.read_exact_into(&mut raw)?;
        Ok(raw)
    }
}

fn fill_cached<K, R, F>(source: &mut K, len: usize, kind: BufferKind, f: F) -> Result<R, ReadError>
where
    K: ByteSource,
    F: FnOnce(&mut ByteBuffer<&mut [u8]>) -> Result<R, ReadError>,
{
    with_cached(len, kind, |buf| {
        source.read_exact_into(buf.remaining_slice_mut())?;
        f(buf)
    })
}

#[cfg(test)]
mod tests {
    use bitwire_core::{BufferError, ByteOrder, MAX_CACHED_BUFFER_CAPACITY};

    use super::*;
    use crate::{serial::PREALLOCATE_BYTES, stream::Stream};

    #[test]
    fn empty_block_is_four_zero_bytes() {
        let codec = LengthPrefixed::new(BufferKind::Heap);
        let mut out = Stream::new(Vec::new());
        codec.write(&Vec::<u8>::new(), &mut out).expect("写空块");
        assert_eq!(out.get_ref(), &[0, 0, 0, 0]);

        let mut input = Stream::new(&out.get_ref()[..]);
        let back: ByteBuffer = codec.read(&mut input).expect("读空块");
        assert_eq!(back.capacity(), 0);
        assert!(!back.has_remaining());
    }

    /// 写出缓冲的剩余区间，不消费源缓冲。
    #[test]
    fn writing_a_buffer_leaves_it_untouched() {
        let mut src = ByteBuffer::copy_of(&[9, 1, 2, 3], BufferKind::Direct);
        src.set_position(1).expect("位置合法");
        let codec = LengthPrefixed::new(BufferKind::Direct);
        let mut out = Stream::new(Vec::new());
        codec.write(&src, &mut out).expect("写缓冲");
        assert_eq!(src.position(), 1);
        assert_eq!(out.get_ref(), &[0, 0, 0, 3, 1, 2, 3]);

        let mut input = Stream::new(&out.get_ref()[..]);
        let back: ByteBuffer = codec.read(&mut input).expect("读缓冲");
        assert_eq!(back.kind(), BufferKind::Direct);
        assert_eq!(back, src);
    }

    #[test]
    fn cached_read_parses_in_place() {
        let mut wire = ByteBuffer::allocate(12, BufferKind::Heap);
        wire.put(8i32, ByteOrder::BigEndian).expect("长度");
        wire.put(0x0102_0304_0506_0708i64, ByteOrder::BigEndian)
            .expect("载荷");
        wire.flip();

        let value = LengthPrefixed::new(BufferKind::Heap)
            .read_cached(&mut wire, |payload| {
                assert_eq!(payload.remaining(), 8);
                Ok(payload.get::<i64>(ByteOrder::LittleEndian)?)
            })
            .expect("缓存读取");
        assert_eq!(value, 0x0807_0605_0403_0201);
        assert!(!wire.has_remaining());
    }

    #[test]
    fn cached_read_rejects_oversized_payloads() {
        let mut wire = ByteBuffer::allocate(4, BufferKind::Heap);
        wire.put_at(0, (MAX_CACHED_BUFFER_CAPACITY + 1) as i32, ByteOrder::BigEndian)
            .expect("长度");
        let err = LengthPrefixed::new(BufferKind::Heap)
            .read_cached(&mut wire, |_| Ok(()))
            .expect_err("超过缓存上限");
        assert!(matches!(
            err,
            ReadError::Buffer(BufferError::InvalidArgument(_))
        ));
    }

    /// 声明长度远超实际输入时在输入结束处失败，不按声明长度预分配。
    #[test]
    fn oversized_declaration_fails_at_end_of_input() {
        let wire = [0x7F, 0xFF, 0xFF, 0xFF, 1, 2, 3];
        let codec = LengthPrefixed::new(BufferKind::Heap);
        let as_vec: Result<Vec<u8>, _> = codec.read(&mut Stream::new(&wire[..]));
        assert!(matches!(as_vec, Err(ReadError::EndOfStream)));
        let as_buf: Result<ByteBuffer, _> = codec.read(&mut Stream::new(&wire[..]));
        assert!(matches!(as_buf, Err(ReadError::EndOfStream)));
    }

    /// 超过单次预分配上限的块分批读入，内容与顺序不变。
    #[test]
    fn blocks_larger_than_preallocation_round_trip() {
        let payload: Vec<u8> = (0..3 * PREALLOCATE_BYTES + 5).map(|i| i as u8).collect();
        let codec = LengthPrefixed::new(BufferKind::Direct);
        let mut out = Stream::new(Vec::new());
        codec.write(&payload, &mut out).expect("写大块");

        let back: Vec<u8> = codec
            .read(&mut Stream::new(&out.get_ref()[..]))
            .expect("读回大块");
        assert_eq!(back, payload);
        let back: ByteBuffer = codec
            .read(&mut Stream::new(&out.get_ref()[..]))
            .expect("读回大块缓冲");
        assert_eq!(back.remaining_slice(), &payload[..]);
        assert_eq!(back.kind(), BufferKind::Direct);
    }

    #[test]
    fn raw_blocks_carry_no_prefix() {
        let codec = RawBytes::new(3, BufferKind::Heap);
        let mut out = Stream::new(Vec::new());
        codec.write(&[7u8, 8, 9][..], &mut out).expect("写定长块");
        assert_eq!(out.get_ref(), &[7, 8, 9]);
        assert!(matches!(
            codec.write(&[1u8][..], &mut out),
            Err(WriteError::Encode(_))
        ));

        let mut input = Stream::new(&out.get_ref()[..]);
        let sum = codec
            .read_cached(&mut input, |buf| {
                Ok(buf.remaining_slice().iter().map(|b| u32::from(*b)).sum::<u32>())
            })
            .expect("缓存读取");
        assert_eq!(sum, 24);
    }
}
