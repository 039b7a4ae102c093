//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 集中定义缓冲层的全部失败语义：越界、容量不足、参数非法以及线程本地缓存重入；
//! - 每个变体映射到稳定错误码，便于上层在日志与告警中按 `<领域>.<语义>` 检索。
//!
//! ## 设计要求（What）
//! - 所有错误均为同步、本地失败，不做任何重试；
//! - 返回错误时，调用方传入缓冲的游标元数据（`position`/`limit`）保持调用前的值。

use thiserror::Error;

use crate::order::BufferKind;

/// 缓冲层错误码集合。
///
/// # 设计背景（Why）
/// - 与上层传输错误码共享 `<领域>.<语义>` 命名约定，方便跨组件聚合；
/// - 错误码为 `&'static str` 常量，调用方可以直接 `match` 字符串而无需依赖枚举布局。
pub mod codes {
    /// 参数非法，例如请求的缓存容量超过上限。
    pub const BUFFER_INVALID_ARGUMENT: &str = "buffer.invalid_argument";
    /// 目标缓冲剩余空间不足以写入。
    pub const BUFFER_OVERFLOW: &str = "buffer.overflow";
    /// 源缓冲剩余字节不足以读取。
    pub const BUFFER_UNDERFLOW: &str = "buffer.underflow";
    /// 绝对索引越过缓冲 `limit`。
    pub const BUFFER_INDEX_OUT_OF_BOUNDS: &str = "buffer.index_out_of_bounds";
    /// 同一线程重入获取线程本地缓存。
    pub const BUFFER_CACHE_BUSY: &str = "buffer.cache_busy";
}

/// 缓冲核心错误域。
///
/// # 教案式说明
/// - **意图 (Why)**：把多种运行期失败收敛为一个可 `?` 传播的枚举，
///   让越界类错误在类型层面显式可见。
/// - **契约 (What)**：
///   - `Overflow`：写入方向空间不足，`requested` 为本次需要的字节数，`available` 为剩余空间；
///   - `Underflow`：读取方向字节不足，字段含义同上；
///   - `IndexOutOfBounds`：绝对访问 `[index, index + length)` 超出 `limit`；
///   - `InvalidArgument`：其余前置条件被违反，携带可读描述；
///   - `CacheBusy`：当前线程已持有同类缓存的借用。
/// - **设计权衡 (Trade-offs)**：`InvalidArgument` 使用 `String` 描述，牺牲少量分配换取排障可读性；
///   热路径上的越界错误均为纯数值字段，不产生堆分配。
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum BufferError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("buffer overflow: requested {requested} bytes but only {available} remain")]
    Overflow { requested: usize, available: usize },

    #[error("buffer underflow: requested {requested} bytes but only {available} remain")]
    Underflow { requested: usize, available: usize },

    #[error("index out of bounds: [{index}, {index} + {length}) exceeds limit {limit}")]
    IndexOutOfBounds {
        index: usize,
        length: usize,
        limit: usize,
    },

    #[error("thread-local {kind:?} cache is already borrowed on this thread")]
    CacheBusy { kind: BufferKind },
}

impl BufferError {
    /// 构造 `InvalidArgument`，接受任意可转为 `String` 的描述。
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// 返回与变体对应的稳定错误码。
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => codes::BUFFER_INVALID_ARGUMENT,
            Self::Overflow { .. } => codes::BUFFER_OVERFLOW,
            Self::Underflow { .. } => codes::BUFFER_UNDERFLOW,
            Self::IndexOutOfBounds { .. } => codes::BUFFER_INDEX_OUT_OF_BOUNDS,
            Self::CacheBusy { .. } => codes::BUFFER_CACHE_BUSY,
        }
    }
}

/// 缓冲层统一结果别名。
pub type Result<T, E = BufferError> = core::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    /// 错误码必须与变体一一对应，且遵循 `buffer.` 前缀。
    #[test]
    fn codes_follow_domain_prefix() {
        let samples = [
            BufferError::invalid_argument("x"),
            BufferError::Overflow {
                requested: 4,
                available: 1,
            },
            BufferError::Underflow {
                requested: 4,
                available: 1,
            },
            BufferError::IndexOutOfBounds {
                index: 3,
                length: 2,
                limit: 4,
            },
            BufferError::CacheBusy {
                kind: BufferKind::Heap,
            },
        ];
        for err in samples {
            assert!(err.code().starts_with("buffer."), "错误码 {} 缺少领域前缀", err.code());
        }
    }

    #[test]
    fn display_mentions_sizes() {
        let err = BufferError::Underflow {
            requested: 8,
            available: 3,
        };
        assert_eq!(
            err.to_string(),
            "buffer underflow: requested 8 bytes but only 3 remain"
        );
    }
}
