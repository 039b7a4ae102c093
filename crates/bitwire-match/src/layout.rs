//! 报文头与字段的位维度。
//!
//! # 模块定位（Why）
//! - 位匹配模式需要知道每个字段在整条报文中的绝对位区间；
//! - 报文头按协议栈依次相接，字段以“所属报文头 + 头内偏移 + 位长”描述，
//!   绝对位置由二者相加得出。
//!
//! # 契约说明（What）
//! - 位序号与 [`BitVector::from_bytes`](bitwire_core::BitVector::from_bytes) 一致：
//!   第 `i` 位位于第 `i / 8` 字节的第 `i % 8` 低位；
//! - 构造函数均为 `const fn`，常量布局在编译期完成全部校验。

use core::fmt;

use crate::error::MatchError;

/// 报文中的一段报文头：`[bit_start, bit_start + bit_length)`。
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct BitHeader {
    bit_start: usize,
    bit_length: usize,
}

impl BitHeader {
    /// 起止位置相加溢出时返回 [`MatchError::Overflow`]。
    pub const fn new(bit_start: usize, bit_length: usize) -> Result<Self, MatchError> {
        if bit_start.checked_add(bit_length).is_none() {
            return Err(MatchError::Overflow("header bit-start + header bit-length"));
        }
        Ok(Self {
            bit_start,
            bit_length,
        })
    }

    pub const fn bit_start(&self) -> usize {
        self.bit_start
    }

    /// 紧随本报文头最后一位的位置。
    pub const fn bit_end(&self) -> usize {
        self.bit_start + self.bit_length
    }

    pub const fn bit_length(&self) -> usize {
        self.bit_length
    }

    /// 容纳本报文头所需的最少字节数。
    pub const fn bytes(&self) -> usize {
        self.bit_length.div_ceil(8)
    }

    /// 紧接在本报文头之后、长度为 `bit_length` 的下一层报文头。
    pub const fn next_header(&self, bit_length: usize) -> Result<BitHeader, MatchError> {
        BitHeader::new(self.bit_end(), bit_length)
    }

    /// 本报文头内、自 `bit_offset` 起长度为 `bit_length` 的字段。
    pub const fn field_at(
        &self,
        bit_offset: usize,
        bit_length: usize,
    ) -> Result<BitField, MatchError> {
        BitField::new(*self, bit_offset, bit_length)
    }
}

impl fmt::Display for BitHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitHeader[{}, {})", self.bit_start, self.bit_end())
    }
}

/// 报文头内的一个字段。
///
/// # 契约说明（What）
/// - `header_bit_offset + bit_length` 不得越过报文头末尾，否则为 [`MatchError::FieldOutOfHeader`]；
/// - 任一加法溢出为 [`MatchError::Overflow`]。
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct BitField {
    header: BitHeader,
    header_bit_offset: usize,
    bit_length: usize,
}

impl BitField {
    pub const fn new(
        header: BitHeader,
        header_bit_offset: usize,
        bit_length: usize,
    ) -> Result<Self, MatchError> {
        let Some(relative_end) = header_bit_offset.checked_add(bit_length) else {
            return Err(MatchError::Overflow("header bit-offset + bit-length"));
        };
        let Some(end) = header.bit_start.checked_add(relative_end) else {
            return Err(MatchError::Overflow(
                "header bit-start + header bit-offset + bit-length",
            ));
        };
        if end > header.bit_end() {
            return Err(MatchError::FieldOutOfHeader {
                start: header.bit_start + header_bit_offset,
                end,
                header_end: header.bit_end(),
            });
        }
        Ok(Self {
            header,
            header_bit_offset,
            bit_length,
        })
    }

    pub const fn header(&self) -> BitHeader {
        self.header
    }

    pub const fn header_bit_offset(&self) -> usize {
        self.header_bit_offset
    }

    /// 字段在整条报文中的起始位。
    pub const fn bit_start(&self) -> usize {
        self.header.bit_start + self.header_bit_offset
    }

    pub const fn bit_end(&self) -> usize {
        self.bit_start() + self.bit_length
    }

    pub const fn bit_length(&self) -> usize {
        self.bit_length
    }

    pub const fn bytes(&self) -> usize {
        self.bit_length.div_ceil(8)
    }
}

impl fmt::Display for BitField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitField[{}, {})", self.bit_start(), self.bit_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_stack_end_to_end() {
        let eth = BitHeader::new(0, 112).expect("以太网头");
        let ip = eth.next_header(160).expect("IPv4 头");
        assert_eq!((ip.bit_start(), ip.bit_end(), ip.bytes()), (112, 272, 20));
        assert_eq!(ip.to_string(), "BitHeader[112, 272)");
        assert_eq!(BitHeader::new(0, 9).expect("9 位").bytes(), 2);
    }

    #[test]
    fn fields_resolve_absolute_positions() {
        let header = BitHeader::new(16, 32).expect("报文头");
        let field = header.field_at(8, 16).expect("字段");
        assert_eq!((field.bit_start(), field.bit_end()), (24, 40));
        assert_eq!(field.header(), header);
        assert_eq!(field.to_string(), "BitField[24, 40)");

        assert_eq!(
            header.field_at(24, 9),
            Err(MatchError::FieldOutOfHeader {
                start: 40,
                end: 49,
                header_end: 48
            })
        );
        assert!(header.field_at(32, 0).is_ok(), "空字段可以位于报文头末尾");
    }

    #[test]
    fn overflow_is_reported() {
        assert!(matches!(
            BitHeader::new(usize::MAX, 1),
            Err(MatchError::Overflow(_))
        ));
        let header = BitHeader::new(8, 8).expect("报文头");
        assert!(matches!(
            header.field_at(usize::MAX, 1),
            Err(MatchError::Overflow(_))
        ));
        assert!(matches!(
            header.field_at(0, usize::MAX - 4),
            Err(MatchError::Overflow(_))
        ));
    }
}
