//! 值/掩码位匹配模式。
//!
//! # 模块定位（Why）
//! - 以“部分指定”的二进制模式测试任意字节序列：掩码为一的位必须与值相等，掩码为零的位不关心；
//! - 各字段可以独立构造成 [`BitMasked`]，再由 [`BitMatchBuilder`] 合并为整条报文的 [`BitMatch`]。
//!
//! # 设计概要（How）
//! - 候选位序列先与掩码做按位与，再与值逐位比较：精确匹配、通配、部分匹配共用这一步；
//! - 值与掩码以 [`FrozenBits`] 保存，构造后不可变，可在线程间共享；
//! - 不变式 `(mask | value) == mask` 在每个构造入口校验，违反时返回
//!   [`MatchError::InvalidValueMask`]。

use core::fmt;

use bitwire_core::{BitVector, ByteBuffer, FrozenBits};

use crate::{error::MatchError, layout::BitField};

fn is_valid_value_and_mask(value: &FrozenBits, mask: &FrozenBits) -> bool {
    let mut bits = mask.to_mutable();
    value.or_into(&mut bits);
    **mask == bits
}

/// 整条报文的位匹配模式。
///
/// # 契约说明（What）
/// - 候选 `c` 匹配当且仅当 `(c & mask) == value`；
/// - `bit_length()` 为值的最高置位加一，候选位数不足时直接判定不匹配；
/// - 相等性与哈希只比较值与掩码的有效位，尾部零不影响结果。
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct BitMatch {
    value: FrozenBits,
    mask: FrozenBits,
}

impl BitMatch {
    pub fn new(
        value: impl Into<FrozenBits>,
        mask: impl Into<FrozenBits>,
    ) -> Result<Self, MatchError> {
        let value = value.into();
        let mask = mask.into();
        if !is_valid_value_and_mask(&value, &mask) {
            return Err(MatchError::InvalidValueMask);
        }
        Ok(Self { value, mask })
    }

    /// 由字节序列构造，位序同 [`BitVector::from_bytes`]。
    pub fn of_bytes(value: &[u8], mask: &[u8]) -> Result<Self, MatchError> {
        Self::new(FrozenBits::from_bytes(value), FrozenBits::from_bytes(mask))
    }

    /// 匹配一切候选的模式：值与掩码均为空。
    pub fn anything() -> Self {
        Self::default()
    }

    pub fn builder() -> BitMatchBuilder {
        BitMatchBuilder::new()
    }

    pub fn bit_length(&self) -> usize {
        self.value.length()
    }

    pub fn value(&self) -> &FrozenBits {
        &self.value
    }

    pub fn mask(&self) -> &FrozenBits {
        &self.mask
    }

    pub fn matches_packet(&self, packet: &[u8]) -> bool {
        if packet.len().saturating_mul(8) < self.bit_length() {
            return false;
        }
        self.value_matches(BitVector::from_bytes(packet))
    }

    /// 以缓冲的剩余区间作为候选报文，游标不动。
    pub fn matches_buffer<S: AsRef<[u8]>>(&self, packet: &ByteBuffer<S>) -> bool {
        self.matches_packet(packet.remaining_slice())
    }

    pub fn matches_bits(&self, bits: &BitVector) -> bool {
        if bits.length() < self.bit_length() {
            return false;
        }
        self.value_matches(bits.clone())
    }

    /// 本模式是否至少与 `other` 一样宽松且与之一致。
    ///
    /// 成立时，凡是匹配 `other` 的候选也必然匹配本模式。
    pub fn matches_all_of(&self, other: &BitMatch) -> bool {
        self.value_matches(other.value.to_mutable()) && self.mask_matches(other.mask.to_mutable())
    }

    /// 以本模式为起点的构建器。
    pub fn to_builder(&self) -> BitMatchBuilder {
        BitMatchBuilder {
            value: self.value.to_mutable(),
            mask: self.mask.to_mutable(),
        }
    }

    fn value_matches(&self, mut bits: BitVector) -> bool {
        self.mask.and_into(&mut bits);
        *self.value == bits
    }

    fn mask_matches(&self, mut bits: BitVector) -> bool {
        self.mask.and_into(&mut bits);
        *self.mask == bits
    }
}

impl fmt::Display for BitMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}",
            self.value.to_hex_string(),
            self.mask.to_hex_string()
        )
    }
}

/// 绑定到某个报文字段的局部匹配模式。
///
/// 值与掩码的位序号相对字段起点计算；合并进 [`BitMatchBuilder`] 时平移到字段的绝对区间。
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct BitMasked {
    field: BitField,
    value: FrozenBits,
    mask: FrozenBits,
}

impl BitMasked {
    /// 值/掩码不一致返回 [`MatchError::InvalidValueMask`]，
    /// 值的位长超过字段返回 [`MatchError::ValueExceedsField`]。
    pub fn new(
        field: BitField,
        value: impl Into<FrozenBits>,
        mask: impl Into<FrozenBits>,
    ) -> Result<Self, MatchError> {
        let value = value.into();
        let mask = mask.into();
        if !is_valid_value_and_mask(&value, &mask) {
            return Err(MatchError::InvalidValueMask);
        }
        if value.length() > field.bit_length() {
            return Err(MatchError::ValueExceedsField {
                value_bits: value.length(),
                field_bits: field.bit_length(),
            });
        }
        Ok(Self { field, value, mask })
    }

    pub fn of_bytes(field: BitField, value: &[u8], mask: &[u8]) -> Result<Self, MatchError> {
        Self::new(field, FrozenBits::from_bytes(value), FrozenBits::from_bytes(mask))
    }

    /// 字段全部位都必须等于 `value`。
    pub fn of_exact(field: BitField, value: impl Into<FrozenBits>) -> Result<Self, MatchError> {
        Self::new(field, value, FrozenBits::full(field.bit_length()))
    }

    pub fn of_exact_bytes(field: BitField, value: &[u8]) -> Result<Self, MatchError> {
        Self::of_exact(field, FrozenBits::from_bytes(value))
    }

    /// 字段不参与匹配。
    pub fn of_wildcard(field: BitField) -> Self {
        Self {
            field,
            value: FrozenBits::empty(),
            mask: FrozenBits::empty(),
        }
    }

    pub fn field(&self) -> BitField {
        self.field
    }

    pub fn value(&self) -> &FrozenBits {
        &self.value
    }

    pub fn mask(&self) -> &FrozenBits {
        &self.mask
    }
}

impl fmt::Display for BitMasked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} @[{}, {})",
            self.value.to_hex_string(),
            self.mask.to_hex_string(),
            self.field.bit_start(),
            self.field.bit_end()
        )
    }
}

/// 把多个字段模式合并为整条报文模式的构建器。
///
/// # 逻辑解析（How）
/// - 初始值与掩码均为全零；
/// - `add` 先清空字段的绝对区间 `[bit_start, bit_end)`，再写入字段的局部值与掩码，
///   因此后加入的字段覆盖先前同一区间的内容；
/// - `build` 快照当前状态并再次校验不变式。
#[derive(Clone, Debug, Default)]
pub struct BitMatchBuilder {
    value: BitVector,
    mask: BitVector,
}

impl BitMatchBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, masked: &BitMasked) -> &mut Self {
        let start = masked.field.bit_start();
        let length = masked.field.bit_length();
        masked.value.copy_into(&mut self.value, start, length);
        masked.mask.copy_into(&mut self.mask, start, length);
        self
    }

    pub fn reset(&mut self) -> &mut Self {
        self.value.clear_all();
        self.mask.clear_all();
        self
    }

    pub fn build(&self) -> Result<BitMatch, MatchError> {
        BitMatch::new(&self.value, &self.mask)
    }
}

#[cfg(test)]
mod tests {
    use bitwire_core::BufferKind;

    use super::*;
    use crate::layout::BitHeader;

    fn byte_field(offset: usize) -> BitField {
        BitHeader::new(0, 64)
            .and_then(|header| header.field_at(offset * 8, 8))
            .expect("字段在报文头内")
    }

    #[test]
    fn value_outside_mask_is_rejected() {
        assert_eq!(
            BitMatch::of_bytes(&[0b0000_0011], &[0b0000_0001]),
            Err(MatchError::InvalidValueMask)
        );
        assert!(BitMatch::of_bytes(&[0b0000_0001], &[0b0000_0011]).is_ok());
    }

    #[test]
    fn anything_matches_every_packet() {
        let any = BitMatch::anything();
        assert_eq!(any.bit_length(), 0);
        assert!(any.matches_packet(&[]));
        assert!(any.matches_packet(&[0xFF, 0x00]));
        assert_eq!(any.to_string(), "0/0");
    }

    #[test]
    fn partial_match_ignores_unmasked_bits() {
        let pattern = BitMatch::of_bytes(&[0x0A], &[0x0F]).expect("合法模式");
        assert!(pattern.matches_packet(&[0xFA]));
        assert!(pattern.matches_packet(&[0x0A, 0x99]));
        assert!(!pattern.matches_packet(&[0x0B]));
        assert!(!pattern.matches_packet(&[]), "候选位数不足");
        assert_eq!(pattern.to_string(), "0A/0F");

        let buf = ByteBuffer::copy_of(&[0x3A], BufferKind::Heap);
        assert!(pattern.matches_buffer(&buf));
        assert!(pattern.matches_bits(&BitVector::from_bytes(&[0x1A])));
    }

    #[test]
    fn containment_requires_wider_mask() {
        let narrow = BitMatch::of_bytes(&[0x0A], &[0x0F]).expect("合法模式");
        let wide = BitMatch::of_bytes(&[0x0A], &[0xFF]).expect("合法模式");
        assert!(narrow.matches_all_of(&wide));
        assert!(!wide.matches_all_of(&narrow));
        assert!(BitMatch::anything().matches_all_of(&wide));
        assert!(wide.matches_all_of(&wide));
    }

    #[test]
    fn masked_fields_validate_their_width() {
        let field = byte_field(1);
        assert_eq!(
            BitMasked::of_bytes(field, &[0x00, 0x01], &[0xFF, 0x01]),
            Err(MatchError::ValueExceedsField {
                value_bits: 9,
                field_bits: 8
            })
        );
        assert_eq!(
            BitMasked::of_exact_bytes(field, &[0x00, 0x01]),
            Err(MatchError::InvalidValueMask),
            "全一掩码只覆盖字段宽度"
        );
        let exact = BitMasked::of_exact_bytes(field, &[0x80]).expect("合法字段");
        assert_eq!(exact.to_string(), "80/FF @[8, 16)");
        assert_eq!(BitMasked::of_wildcard(field).to_string(), "0/0 @[8, 16)");
    }

    #[test]
    fn builder_places_fields_at_absolute_offsets() {
        let first = BitMasked::of_exact_bytes(byte_field(0), &[0x11]).expect("字段 0");
        let third = BitMasked::of_bytes(byte_field(2), &[0x02], &[0x0F]).expect("字段 2");
        let pattern = BitMatch::builder()
            .add(&first)
            .add(&BitMasked::of_wildcard(byte_field(1)))
            .add(&third)
            .build()
            .expect("合并后的模式");

        assert_eq!(pattern.to_string(), "110002/FF000F");
        assert!(pattern.matches_packet(&[0x11, 0xAB, 0xF2, 0x00]));
        assert!(!pattern.matches_packet(&[0x11, 0xAB, 0xF3]));
        assert!(!pattern.matches_packet(&[0x12, 0xAB, 0x02]));
    }

    /// 后加入的字段覆盖同一区间；`to_builder` 从已有模式继续构建。
    #[test]
    fn builder_overwrites_and_resets() {
        let base = BitMatch::builder()
            .add(&BitMasked::of_exact_bytes(byte_field(0), &[0x11]).expect("字段"))
            .build()
            .expect("模式");

        let mut builder = base.to_builder();
        builder.add(&BitMasked::of_wildcard(byte_field(0)));
        assert_eq!(builder.build().expect("模式"), BitMatch::anything());

        builder
            .add(&BitMasked::of_exact_bytes(byte_field(3), &[0x01]).expect("字段"))
            .reset();
        assert_eq!(builder.build().expect("模式"), BitMatch::anything());
    }
}
