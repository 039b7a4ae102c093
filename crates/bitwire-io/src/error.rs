//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 传输与序列化层只有两类失败：读失败与写失败，二者都必须向调用方传播，本层不做任何重试；
//! - 读失败细分为流结束、底层 I/O、解码校验、尺寸超限与缓冲越界，便于上层决定是断开连接
//!   还是丢弃单条报文。
//!
//! ## 设计要求（What）
//! - 所有变体实现 `std::error::Error`，`source()` 指向底层 `io::Error` 或 [`BufferError`]；
//! - `code()` 返回稳定错误码，与 `bitwire_core::codes` 同样遵循 `<领域>.<语义>`。

use std::io;

use bitwire_core::BufferError;
use thiserror::Error;

/// 传输与序列化层错误码集合。
pub mod codes {
    /// 读取方向在凑满所需字节前遇到输入结束。
    pub const TRANSPORT_END_OF_STREAM: &str = "transport.end_of_stream";
    /// 底层读写失败。
    pub const TRANSPORT_IO: &str = "transport.io";
    /// 解码校验失败（非法布尔模式、越界枚举序号、负长度等）。
    pub const PROTOCOL_DECODE: &str = "protocol.decode";
    /// 待写入的值无法以线路格式表示。
    pub const PROTOCOL_ENCODE: &str = "protocol.encode";
    /// 对端声明的尺寸超过本地配置的上限。
    pub const PROTOCOL_BUDGET_EXCEEDED: &str = "protocol.budget_exceeded";
}

/// 读取失败。
///
/// # 教案式说明
/// - **意图 (Why)**：把“字节不够”“底层坏了”“字节够但内容不合法”三种本质不同的失败区分开；
/// - **契约 (What)**：
///   - `EndOfStream`：传输在凑满请求字节数之前报告结束；
///   - `Io`：底层传输返回的 I/O 错误，原样保留；
///   - `Decode`：字节已读出但不符合线路格式，消息中包含违规值；
///   - `LimitExceeded`：声明尺寸超过 [`DecodeLimits`](bitwire_core::DecodeLimits)，在分配前拒绝；
///   - `Buffer`：调用方提供的目标缓冲空间不足等本地前置条件违规。
/// - **风险 (Trade-offs)**：解码失败时传输可能已消费部分字节，本层不回滚，调用方通常应放弃该连接。
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("end of stream reached before the required bytes were read")]
    EndOfStream,

    #[error("read failed: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    #[error("decode failed: {0}")]
    Decode(String),

    #[error("declared {what} {declared} exceeds configured maximum {max}")]
    LimitExceeded {
        what: &'static str,
        declared: usize,
        max: usize,
    },

    #[error(transparent)]
    Buffer(#[from] BufferError),
}

impl ReadError {
    /// 构造解码失败，并以 debug 级别记录违规描述。
    pub fn decode(message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::debug!(reason = %message, "rejecting malformed input");
        Self::Decode(message)
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::EndOfStream => codes::TRANSPORT_END_OF_STREAM,
            Self::Io { .. } => codes::TRANSPORT_IO,
            Self::Decode(_) => codes::PROTOCOL_DECODE,
            Self::LimitExceeded { .. } => codes::PROTOCOL_BUDGET_EXCEEDED,
            Self::Buffer(err) => err.code(),
        }
    }
}

/// 写入失败。
///
/// - `Io`：底层传输返回的 I/O 错误；
/// - `Encode`：值超出线路格式的表示范围（例如元素数超过 `i32::MAX`）；
/// - `Buffer`：源缓冲字节不足等本地前置条件违规。
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("write failed: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    #[error("encode failed: {0}")]
    Encode(String),

    #[error(transparent)]
    Buffer(#[from] BufferError),
}

impl WriteError {
    pub fn encode(message: impl Into<String>) -> Self {
        Self::Encode(message.into())
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Io { .. } => codes::TRANSPORT_IO,
            Self::Encode(_) => codes::PROTOCOL_ENCODE,
            Self::Buffer(err) => err.code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn io_failures_keep_their_source() {
        let err = ReadError::from(io::Error::new(io::ErrorKind::BrokenPipe, "peer gone"));
        assert_eq!(err.code(), codes::TRANSPORT_IO);
        assert!(err.source().is_some(), "应保留底层 io::Error");

        let err = WriteError::from(io::Error::from(io::ErrorKind::WriteZero));
        assert_eq!(err.code(), codes::TRANSPORT_IO);
    }

    #[test]
    fn buffer_errors_reuse_core_codes() {
        let err = ReadError::from(BufferError::Overflow {
            requested: 4,
            available: 0,
        });
        assert_eq!(err.code(), bitwire_core::codes::BUFFER_OVERFLOW);
    }

    #[tracing_test::traced_test]
    #[test]
    fn decode_failures_are_logged() {
        let err = ReadError::decode("invalid boolean binary value: 11111111");
        assert_eq!(err.code(), codes::PROTOCOL_DECODE);
        assert!(logs_contain("rejecting malformed input"));
    }
}
