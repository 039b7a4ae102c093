//! 解码侧的尺寸上限配置。
//!
//! # 设计背景（Why）
//! - 线路上的长度前缀与元素计数由对端声明，若直接据此分配内存，恶意或损坏的报文
//!   可以让解码方一次申请 2 GiB；
//! - 上限以值对象形式传给读取器，默认值只保留线路格式本身的约束（`i32::MAX`），
//!   部署方可通过 TOML 收紧。
//!
//! # 配置格式（What）
//! ```toml
//! max_length = 65536
//! max_elements = 1024
//! ```
//! 缺省键回退到默认值，未知键与零值被拒绝。

use serde::{Deserialize, Serialize};

use crate::error::{BufferError, Result};

/// 线路格式允许的最大长度/计数（4 字节有符号大端整数的正数上界）。
pub const MAX_WIRE_COUNT: usize = i32::MAX as usize;

/// 解码时对声明尺寸的上限。
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecodeLimits {
    /// 长度前缀字节块（含字符串）的最大字节数。
    pub max_length: usize,
    /// 数组、集合、映射的最大元素数。
    pub max_elements: usize,
}

impl DecodeLimits {
    /// 仅受线路格式约束的上限。
    pub const UNBOUNDED: DecodeLimits = DecodeLimits {
        max_length: MAX_WIRE_COUNT,
        max_elements: MAX_WIRE_COUNT,
    };

    /// 从 TOML 文本解析并校验。
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let limits: Self = toml::from_str(text)
            .map_err(|err| BufferError::invalid_argument(format!("invalid decode limits: {err}")))?;
        limits.validate()
    }

    /// 零值上限视为配置错误。
    pub fn validate(self) -> Result<Self> {
        if self.max_length == 0 || self.max_elements == 0 {
            return Err(BufferError::invalid_argument(
                "decode limits must be positive",
            ));
        }
        Ok(self)
    }

    pub fn allows_length(&self, declared: usize) -> bool {
        declared <= self.max_length
    }

    pub fn allows_elements(&self, declared: usize) -> bool {
        declared <= self.max_elements
    }
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self::UNBOUNDED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_wire_limits() {
        let limits = DecodeLimits::from_toml_str("max_length = 4096").expect("合法配置");
        assert_eq!(limits.max_length, 4096);
        assert_eq!(limits.max_elements, MAX_WIRE_COUNT);
        assert!(limits.allows_length(4096));
        assert!(!limits.allows_length(4097));
    }

    #[test]
    fn zero_and_unknown_keys_are_rejected() {
        let zero = DecodeLimits::from_toml_str("max_elements = 0").expect_err("零值非法");
        assert_eq!(zero.code(), crate::error::codes::BUFFER_INVALID_ARGUMENT);
        assert!(DecodeLimits::from_toml_str("max_depth = 3").is_err());
    }

    #[test]
    fn empty_document_is_unbounded() {
        assert_eq!(
            DecodeLimits::from_toml_str("").expect("空文档合法"),
            DecodeLimits::UNBOUNDED
        );
    }
}
