//! 字节流传输：基于 `std::io::Read`/`Write` 的 [`Stream`] 适配器。
//!
//! 与 [`Channel`](crate::Channel) 的差别只在于循环由标准库的 `read_exact`/`write_all` 完成，
//! `UnexpectedEof` 被映射为 [`ReadError::EndOfStream`]，其余错误原样包装。

use std::io::{self, Read, Write};

use crate::{
    error::{ReadError, WriteError},
    transport::{ByteSink, ByteSource},
};

/// 字节流传输适配器。
#[derive(Debug, Default)]
pub struct Stream<T> {
    inner: T,
}

impl<T> Stream<T> {
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

impl<T: Write> Stream<T> {
    /// 冲刷底层写端。
    pub fn flush(&mut self) -> Result<(), WriteError> {
        self.inner.flush().map_err(WriteError::from)
    }
}

impl<T: Read> ByteSource for Stream<T> {
    fn read_exact_into(&mut self, dst: &mut [u8]) -> Result<(), ReadError> {
        self.inner.read_exact(dst).map_err(|err| {
            if err.kind() == io::ErrorKind::UnexpectedEof {
                tracing::debug!(wanted = dst.len(), "stream reached end of input mid-read");
                ReadError::EndOfStream
            } else {
                ReadError::from(err)
            }
        })
    }
}

impl<T: Write> ByteSink for Stream<T> {
    fn write_all_from(&mut self, src: &[u8]) -> Result<(), WriteError> {
        self.inner.write_all(src).map_err(WriteError::from)
    }
}
