//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 位匹配层的失败全部来自构造期校验：值/掩码不一致、值超出字段、字段越出报文头、位置溢出；
//! - 一旦构造成功，匹配与合并操作不再失败。
//!
//! ## 设计要求（What）
//! - 错误只携带数值字段，类型为 `Copy`，可在常量上下文中构造与丢弃；
//! - `code()` 与其余 crate 一样遵循 `<领域>.<语义>`。

use thiserror::Error;

/// 位匹配层错误码集合。
pub mod codes {
    /// 值中存在掩码未覆盖的置位。
    pub const MATCH_INVALID_VALUE_MASK: &str = "match.invalid_value_mask";
    /// 值的位长超过所属字段的位长。
    pub const MATCH_VALUE_EXCEEDS_FIELD: &str = "match.value_exceeds_field";
    /// 字段的结束位置越过所属报文头。
    pub const MATCH_FIELD_OUT_OF_HEADER: &str = "match.field_out_of_header";
    /// 起点与长度相加溢出。
    pub const MATCH_OVERFLOW: &str = "match.overflow";
}

#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
pub enum MatchError {
    #[error("value/mask bits are invalid: value has bits set outside the mask")]
    InvalidValueMask,

    #[error("value bit-length {value_bits} exceeds field bit-length {field_bits}")]
    ValueExceedsField { value_bits: usize, field_bits: usize },

    #[error("field bits [{start}, {end}) exceed header limit {header_end}")]
    FieldOutOfHeader {
        start: usize,
        end: usize,
        header_end: usize,
    },

    #[error("({0}) overflows")]
    Overflow(&'static str),
}

impl MatchError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidValueMask => codes::MATCH_INVALID_VALUE_MASK,
            Self::ValueExceedsField { .. } => codes::MATCH_VALUE_EXCEEDS_FIELD,
            Self::FieldOutOfHeader { .. } => codes::MATCH_FIELD_OUT_OF_HEADER,
            Self::Overflow(_) => codes::MATCH_OVERFLOW,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_domain_prefix() {
        let all = [
            MatchError::InvalidValueMask,
            MatchError::ValueExceedsField {
                value_bits: 9,
                field_bits: 8,
            },
            MatchError::FieldOutOfHeader {
                start: 0,
                end: 9,
                header_end: 8,
            },
            MatchError::Overflow("header bit-start + header bit-length"),
        ];
        for err in all {
            assert!(err.code().starts_with("match."), "{err}");
        }
        assert_eq!(
            all[2].to_string(),
            "field bits [0, 9) exceed header limit 8"
        );
    }
}
