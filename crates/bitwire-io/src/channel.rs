//! 阻塞通道传输。
//!
//! # 模块定位（Why）
//! - 通道模型的一次读写可能只搬运部分字节，读取还可能显式报告“输入结束”；
//! - [`Channel`] 在部分搬运之上循环，直到凑满请求的字节数或遇到结束，再映射为统一的读写错误。
//!
//! # 设计概要（How）
//! - [`ReadableChannel`]/[`WritableChannel`] 描述“搬运一部分”的最小能力；
//! - [`IoChannel`] 把任意 `std::io::Read`/`Write` 桥接为通道；
//! - [`TracedChannel`] 包装任意通道，在每次成功搬运后把实际字节交给追踪回调，
//!   [`hex_tracer`] 是输出十六进制转储到 `tracing` 的现成回调。
//!
//! # 风险提示（Trade-offs）
//! - 读端返回 `Transfer::Bytes(0)` 时循环会立即重试，非阻塞通道会因此自旋；
//!   写端返回 `0` 则视为无法继续写出，报告 `ErrorKind::WriteZero`；
//!   本适配器面向阻塞通道，取消由通道自身负责（关闭后下一次调用失败）。

use std::io::{self, Read, Write};

use crate::{
    error::{ReadError, WriteError},
    transport::{ByteSink, ByteSource},
};

/// 一次部分读取的结果。
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Transfer {
    /// 读入了若干字节（可能为零）。
    Bytes(usize),
    /// 通道已到达输入结束，之后不会再有数据。
    End,
}

/// 支持部分读取的通道。
pub trait ReadableChannel {
    /// 读入至多 `dst.len()` 个字节。
    fn read_some(&mut self, dst: &mut [u8]) -> io::Result<Transfer>;
}

/// 支持部分写出的通道。
pub trait WritableChannel {
    /// 写出至多 `src.len()` 个字节，返回实际写出的数量。
    fn write_some(&mut self, src: &[u8]) -> io::Result<usize>;
}

impl<C: ReadableChannel + ?Sized> ReadableChannel for &mut C {
    fn read_some(&mut self, dst: &mut [u8]) -> io::Result<Transfer> {
        (**self).read_some(dst)
    }
}

impl<C: WritableChannel + ?Sized> WritableChannel for &mut C {
    fn write_some(&mut self, src: &[u8]) -> io::Result<usize> {
        (**self).write_some(src)
    }
}

/// 把 `std::io` 读写器桥接为通道。
///
/// # 契约说明（What）
/// - 非空读取返回 `Ok(0)` 视为 [`Transfer::End`]；
/// - `ErrorKind::Interrupted` 在桥接层内重试；
/// - 非空写出返回 `Ok(0)` 转换为 `ErrorKind::WriteZero` 错误，避免上层无限循环。
#[derive(Debug, Default)]
pub struct IoChannel<T> {
    inner: T,
}

impl<T> IoChannel<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read> ReadableChannel for IoChannel<T> {
    fn read_some(&mut self, dst: &mut [u8]) -> io::Result<Transfer> {
        loop {
            match self.inner.read(dst) {
                Ok(0) if !dst.is_empty() => return Ok(Transfer::End),
                Ok(n) => return Ok(Transfer::Bytes(n)),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
    }
}

impl<T: Write> WritableChannel for IoChannel<T> {
    fn write_some(&mut self, src: &[u8]) -> io::Result<usize> {
        loop {
            match self.inner.write(src) {
                Ok(0) if !src.is_empty() => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => return Ok(n),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
    }
}

/// 阻塞通道传输适配器。
///
/// 读取在 `Transfer::End` 时返回 [`ReadError::EndOfStream`]，其余底层错误包装为 `Io`。
#[derive(Debug, Default)]
pub struct Channel<C> {
    inner: C,
}

impl<C> Channel<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &C {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut C {
        &mut self.inner
    }

    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<T> Channel<IoChannel<T>> {
    /// 以 `std::io` 读写器构造通道传输。
    pub fn from_io(inner: T) -> Self {
        Self::new(IoChannel::new(inner))
    }
}

impl<C: ReadableChannel> ByteSource for Channel<C> {
    fn read_exact_into(&mut self, dst: &mut [u8]) -> Result<(), ReadError> {
        let mut filled = 0;
        while filled < dst.len() {
            match self.inner.read_some(&mut dst[filled..])? {
                Transfer::Bytes(n) => filled += n,
                Transfer::End => {
                    tracing::debug!(
                        wanted = dst.len(),
                        received = filled,
                        "channel reached end of input mid-read"
                    );
                    return Err(ReadError::EndOfStream);
                }
            }
        }
        Ok(())
    }
}

impl<C: WritableChannel> ByteSink for Channel<C> {
    fn write_all_from(&mut self, src: &[u8]) -> Result<(), WriteError> {
        let mut written = 0;
        while written < src.len() {
            match self.inner.write_some(&src[written..])? {
                0 => {
                    tracing::debug!(
                        wanted = src.len(),
                        written,
                        "channel accepted no bytes mid-write"
                    );
                    return Err(io::Error::from(io::ErrorKind::WriteZero).into());
                }
                n => written += n,
            }
        }
        Ok(())
    }
}

/// 追踪回调观察到的搬运方向。
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TraceDirection {
    Read,
    Write,
}

/// 在每次成功搬运后调用追踪回调的通道包装。
///
/// 回调收到的是本次实际搬运的字节（部分读写时只包含已完成的部分），
/// 读到 `Transfer::End` 或底层报错时不调用回调。
pub struct TracedChannel<C, F> {
    inner: C,
    tracer: F,
}

impl<C, F> TracedChannel<C, F>
where
    F: FnMut(TraceDirection, &[u8]),
{
    pub fn new(inner: C, tracer: F) -> Self {
        Self { inner, tracer }
    }

    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<C, F> ReadableChannel for TracedChannel<C, F>
where
    C: ReadableChannel,
    F: FnMut(TraceDirection, &[u8]),
{
    fn read_some(&mut self, dst: &mut [u8]) -> io::Result<Transfer> {
        let outcome = self.inner.read_some(dst)?;
        if let Transfer::Bytes(n) = outcome {
            (self.tracer)(TraceDirection::Read, &dst[..n]);
        }
        Ok(outcome)
    }
}

impl<C, F> WritableChannel for TracedChannel<C, F>
where
    C: WritableChannel,
    F: FnMut(TraceDirection, &[u8]),
{
    fn write_some(&mut self, src: &[u8]) -> io::Result<usize> {
        let n = self.inner.write_some(src)?;
        (self.tracer)(TraceDirection::Write, &src[..n]);
        Ok(n)
    }
}

/// 以 `trace` 级别输出大写十六进制转储的追踪回调。
pub fn hex_tracer(label: &'static str) -> impl FnMut(TraceDirection, &[u8]) {
    move |direction: TraceDirection, bytes: &[u8]| {
        tracing::trace!(
            channel = label,
            direction = ?direction,
            len = bytes.len(),
            bytes = %hex::encode_upper(bytes),
            "channel transfer"
        );
    }
}
