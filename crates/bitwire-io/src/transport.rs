//! 传输能力抽象：[`ByteSource`] 与 [`ByteSink`]。
//!
//! # 模块定位（Why）
//! - 通道、流、缓冲三种传输面在“读满/写完恰好 N 字节”这件事上语义一致，
//!   差异只在于如何搬运一小段字节；
//! - 两个 trait 只要求实现者提供一个“精确搬运”方法，原语读写、批量搬运、写零全部由默认方法给出，
//!   序列化组合子因此只需针对 trait 编写一次。
//!
//! # 设计概要（How）
//! - 单值原语经由栈上 8 字节暂存区编解码：先完整读入/写出暂存区，再解释字节；
//! - 批量操作借助 [`ByteBuffer::fill_with`]/[`ByteBuffer::consume_with`]，
//!   保证传输失败时缓冲游标不被提交；
//! - `&mut K` 自动获得同样的能力，组合子之间可以随意转借传输句柄。

use bitwire_core::{
    BufferOperation, ByteBuffer, ByteOrder, MAX_PRIMITIVE_SIZE, Primitive, ZERO_CHUNK,
    ZERO_CHUNK_SIZE,
};

use crate::error::{ReadError, WriteError};

/// 可精确读取字节的传输。
///
/// # 契约说明（What）
/// - `read_exact_into` 要么填满 `dst` 并返回 `Ok(())`，要么返回错误；
/// - 在凑满之前遇到输入结束时返回 [`ReadError::EndOfStream`]；
/// - 失败后传输内部可能已消费部分字节，调用方不应假设可以继续解析同一条消息。
pub trait ByteSource {
    /// 读取恰好 `dst.len()` 个字节。
    fn read_exact_into(&mut self, dst: &mut [u8]) -> Result<(), ReadError>;

    /// 读取一个按 `order` 编码的原语。
    fn read_value<T: Primitive>(&mut self, order: ByteOrder) -> Result<T, ReadError> {
        let mut scratch = [0u8; MAX_PRIMITIVE_SIZE];
        let raw = &mut scratch[..T::SIZE];
        self.read_exact_into(raw)?;
        Ok(T::decode(order, raw))
    }

    fn read_u8(&mut self) -> Result<u8, ReadError> {
        self.read_value(ByteOrder::BigEndian)
    }

    /// 读取恰好 `count` 个字节写入 `dst` 的 `[position, position + count)`，随后对 `dst` 施加 `op`。
    ///
    /// `dst` 剩余空间不足时返回 `ReadError::Buffer(Overflow)`，此时不会从传输读取任何字节。
    fn read_bytes<S>(
        &mut self,
        dst: &mut ByteBuffer<S>,
        count: usize,
        op: BufferOperation,
    ) -> Result<(), ReadError>
    where
        S: AsRef<[u8]> + AsMut<[u8]>,
    {
        dst.fill_with(count, op, |region| self.read_exact_into(region))
    }

    /// 读取 `dst` 的全部剩余空间。
    fn read_remaining<S>(
        &mut self,
        dst: &mut ByteBuffer<S>,
        op: BufferOperation,
    ) -> Result<(), ReadError>
    where
        S: AsRef<[u8]> + AsMut<[u8]>,
    {
        let count = dst.remaining();
        self.read_bytes(dst, count, op)
    }
}

/// 可精确写出字节的传输。
///
/// # 契约说明（What）
/// - `write_all_from` 要么写出 `src` 的全部字节，要么返回错误；
/// - 本层不缓冲也不重试，失败时已写出的前缀不会被撤回。
pub trait ByteSink {
    /// 写出 `src` 的全部字节。
    fn write_all_from(&mut self, src: &[u8]) -> Result<(), WriteError>;

    /// 写出一个按 `order` 编码的原语。
    fn write_value<T: Primitive>(&mut self, value: T, order: ByteOrder) -> Result<(), WriteError> {
        let mut scratch = [0u8; MAX_PRIMITIVE_SIZE];
        let raw = &mut scratch[..T::SIZE];
        value.encode(order, raw);
        self.write_all_from(raw)
    }

    fn write_u8(&mut self, value: u8) -> Result<(), WriteError> {
        self.write_value(value, ByteOrder::BigEndian)
    }

    /// 写出 `src` 的 `[position, position + count)`，随后对 `src` 施加 `op`。
    ///
    /// `src` 剩余字节不足时返回 `WriteError::Buffer(Underflow)`，此时不会写出任何字节。
    fn write_bytes<S>(
        &mut self,
        src: &mut ByteBuffer<S>,
        count: usize,
        op: BufferOperation,
    ) -> Result<(), WriteError>
    where
        S: AsRef<[u8]>,
    {
        src.consume_with(count, op, |region| self.write_all_from(region))
    }

    /// 写出 `src` 的全部剩余字节。
    fn write_remaining<S>(
        &mut self,
        src: &mut ByteBuffer<S>,
        op: BufferOperation,
    ) -> Result<(), WriteError>
    where
        S: AsRef<[u8]>,
    {
        let count = src.remaining();
        self.write_bytes(src, count, op)
    }

    /// 写出 `count` 个零字节，按 4096 字节分批。
    fn write_zeros(&mut self, count: usize) -> Result<(), WriteError> {
        let mut left = count;
        while left > 0 {
            let batch = left.min(ZERO_CHUNK_SIZE);
            self.write_all_from(&ZERO_CHUNK[..batch])?;
            left -= batch;
        }
        Ok(())
    }
}

impl<K: ByteSource + ?Sized> ByteSource for &mut K {
    fn read_exact_into(&mut self, dst: &mut [u8]) -> Result<(), ReadError> {
        (**self).read_exact_into(dst)
    }
}

impl<K: ByteSink + ?Sized> ByteSink for &mut K {
    fn write_all_from(&mut self, src: &[u8]) -> Result<(), WriteError> {
        (**self).write_all_from(src)
    }
}
