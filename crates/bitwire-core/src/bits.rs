//! 位向量 [`BitVector`] 及其只读包装 [`FrozenBits`]。
//!
//! # 模块定位（Why）
//! - 掩码匹配需要“逻辑上无限长、超出部分隐式为零”的位序列：值与掩码长度可以不同，
//!   比较时却必须按内容相等；
//! - 现成的位容器大多把长度作为值的一部分（`[0, 1]` 与 `[0, 1, 0]` 不相等），
//!   因此这里按 64 位字自行实现，长度定义为“最高置位 + 1”。
//!
//! # 设计概要（How）
//! - 位 `i` 存放在 `words[i / 64]` 的第 `i % 64` 位；字节转换按小端字节、字节内低位优先；
//! - 允许尾部存在全零字，`size()` 反映已分配容量，`length()` 只看内容，二者满足 `length <= size`；
//! - 相等、哈希、排序都忽略尾部零字，只比较位内容。
//!
//! # 契约说明（What）
//! - 所有索引参数均为非负 `usize`；区间 `[from, to)` 在 `from >= to` 时视为空区间；
//! - 修改操作按需扩容，读取越过已分配范围的位一律返回 `false`。

use core::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    ops::Deref,
};

const WORD_BITS: usize = 64;

#[inline]
fn word_index(bit: usize) -> usize {
    bit / WORD_BITS
}

/// `[lo, hi]`（闭区间，字内偏移）对应的掩码。
#[inline]
fn span_mask(lo: usize, hi: usize) -> u64 {
    (u64::MAX << lo) & (u64::MAX >> (WORD_BITS - 1 - hi))
}

/// 可变位向量，语义上为无限长、超出 `length()` 的位全部为零。
#[derive(Clone, Default)]
pub struct BitVector {
    words: Vec<u64>,
}

impl BitVector {
    /// 空向量，`length() == 0`。
    pub const fn new() -> Self {
        Self { words: Vec::new() }
    }

    /// 预分配至少 `bits` 位容量的空向量。
    pub fn with_capacity(bits: usize) -> Self {
        Self {
            words: vec![0; bits.div_ceil(WORD_BITS)],
        }
    }

    /// `[0, len)` 全为一的向量。
    pub fn ones(len: usize) -> Self {
        let mut bits = Self::with_capacity(len);
        bits.set_range(0, len);
        bits
    }

    /// 全零向量，等价于 [`BitVector::new`]。
    pub const fn zeros() -> Self {
        Self::new()
    }

    /// 从字节序列构造：字节 `k` 的第 `j` 位（最低位为 0）对应位 `8k + j`。
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let words = bytes
            .chunks(8)
            .map(|chunk| {
                let mut raw = [0u8; 8];
                raw[..chunk.len()].copy_from_slice(chunk);
                u64::from_le_bytes(raw)
            })
            .collect();
        Self { words }
    }

    /// 从 64 位字序列构造：字 `k` 的第 `j` 位对应位 `64k + j`。
    pub fn from_words(words: &[u64]) -> Self {
        Self {
            words: words.to_vec(),
        }
    }

    fn trimmed(&self) -> &[u64] {
        let used = self
            .words
            .iter()
            .rposition(|word| *word != 0)
            .map_or(0, |last| last + 1);
        &self.words[..used]
    }

    fn ensure_words(&mut self, count: usize) {
        if self.words.len() < count {
            self.words.resize(count, 0);
        }
    }

    /// 最小字节表示，长度为 `ceil(length() / 8)`。
    pub fn to_bytes(&self) -> Vec<u8> {
        let byte_len = self.length().div_ceil(8);
        let mut bytes: Vec<u8> = self
            .trimmed()
            .iter()
            .flat_map(|word| word.to_le_bytes())
            .collect();
        bytes.truncate(byte_len);
        bytes
    }

    /// 去除尾部零字后的字序列。
    pub fn to_words(&self) -> Vec<u64> {
        self.trimmed().to_vec()
    }

    /// 最高置位索引 + 1；空向量为 0。
    pub fn length(&self) -> usize {
        match self.trimmed().split_last() {
            None => 0,
            Some((last, rest)) => {
                rest.len() * WORD_BITS + (WORD_BITS - last.leading_zeros() as usize)
            }
        }
    }

    /// 已分配的位容量，总是 64 的倍数。
    pub fn size(&self) -> usize {
        self.words.len() * WORD_BITS
    }

    pub fn is_empty(&self) -> bool {
        self.trimmed().is_empty()
    }

    /// 置位数量。
    pub fn cardinality(&self) -> usize {
        self.words.iter().map(|word| word.count_ones() as usize).sum()
    }

    pub fn get(&self, index: usize) -> bool {
        self.words
            .get(word_index(index))
            .is_some_and(|word| word & (1u64 << (index % WORD_BITS)) != 0)
    }

    /// 读取从 `offset` 开始的 64 位，越界部分补零。
    fn word_at(&self, offset: usize) -> u64 {
        let index = word_index(offset);
        let shift = offset % WORD_BITS;
        let low = self.words.get(index).copied().unwrap_or(0);
        if shift == 0 {
            return low;
        }
        let high = self.words.get(index + 1).copied().unwrap_or(0);
        (low >> shift) | (high << (WORD_BITS - shift))
    }

    /// 复制 `[from, to)` 为新向量，位 `from` 成为新向量的位 0。
    pub fn get_range(&self, from: usize, to: usize) -> BitVector {
        let to = to.min(self.length());
        if from >= to {
            return Self::new();
        }
        let len = to - from;
        let mut words: Vec<u64> = (0..len.div_ceil(WORD_BITS))
            .map(|k| self.word_at(from + k * WORD_BITS))
            .collect();
        let tail = len % WORD_BITS;
        if tail != 0 {
            if let Some(last) = words.last_mut() {
                *last &= span_mask(0, tail - 1);
            }
        }
        Self { words }
    }

    pub fn set(&mut self, index: usize) {
        self.ensure_words(word_index(index) + 1);
        self.words[word_index(index)] |= 1u64 << (index % WORD_BITS);
    }

    pub fn set_to(&mut self, index: usize, value: bool) {
        if value {
            self.set(index);
        } else {
            self.clear(index);
        }
    }

    pub fn clear(&mut self, index: usize) {
        if let Some(word) = self.words.get_mut(word_index(index)) {
            *word &= !(1u64 << (index % WORD_BITS));
        }
    }

    pub fn flip(&mut self, index: usize) {
        self.ensure_words(word_index(index) + 1);
        self.words[word_index(index)] ^= 1u64 << (index % WORD_BITS);
    }

    /// 对 `[from, to)` 覆盖到的每个字调用 `f(word, mask)`。
    fn for_each_span(&mut self, from: usize, to: usize, mut f: impl FnMut(&mut u64, u64)) {
        if from >= to {
            return;
        }
        let (first, last) = (word_index(from), word_index(to - 1));
        for index in first..(last + 1).min(self.words.len()) {
            let lo = if index == first { from % WORD_BITS } else { 0 };
            let hi = if index == last {
                (to - 1) % WORD_BITS
            } else {
                WORD_BITS - 1
            };
            f(&mut self.words[index], span_mask(lo, hi));
        }
    }

    pub fn set_range(&mut self, from: usize, to: usize) {
        if from < to {
            self.ensure_words(word_index(to - 1) + 1);
        }
        self.for_each_span(from, to, |word, mask| *word |= mask);
    }

    pub fn clear_range(&mut self, from: usize, to: usize) {
        self.for_each_span(from, to, |word, mask| *word &= !mask);
    }

    pub fn flip_range(&mut self, from: usize, to: usize) {
        if from < to {
            self.ensure_words(word_index(to - 1) + 1);
        }
        self.for_each_span(from, to, |word, mask| *word ^= mask);
    }

    /// 清空全部位，保留已分配容量。
    pub fn clear_all(&mut self) {
        self.words.fill(0);
    }

    /// 不小于 `from` 的第一个置位索引。
    pub fn next_set_bit(&self, from: usize) -> Option<usize> {
        let mut index = word_index(from);
        let mut word = *self.words.get(index)? & (u64::MAX << (from % WORD_BITS));
        loop {
            if word != 0 {
                return Some(index * WORD_BITS + word.trailing_zeros() as usize);
            }
            index += 1;
            word = *self.words.get(index)?;
        }
    }

    /// 不小于 `from` 的第一个清零位索引；由于隐式零，总是存在。
    pub fn next_clear_bit(&self, from: usize) -> usize {
        let mut index = word_index(from);
        let Some(first) = self.words.get(index) else {
            return from;
        };
        let mut word = !first & (u64::MAX << (from % WORD_BITS));
        loop {
            if word != 0 {
                return index * WORD_BITS + word.trailing_zeros() as usize;
            }
            index += 1;
            match self.words.get(index) {
                Some(next) => word = !next,
                None => return index * WORD_BITS,
            }
        }
    }

    /// 不大于 `from` 的最后一个置位索引。
    pub fn previous_set_bit(&self, from: usize) -> Option<usize> {
        let mut index = word_index(from);
        if index >= self.words.len() {
            return self.length().checked_sub(1);
        }
        let mut word = self.words[index] & span_mask(0, from % WORD_BITS);
        loop {
            if word != 0 {
                return Some((index + 1) * WORD_BITS - 1 - word.leading_zeros() as usize);
            }
            index = index.checked_sub(1)?;
            word = self.words[index];
        }
    }

    /// 不大于 `from` 的最后一个清零位索引；`[0, from]` 全部置位时为 `None`。
    pub fn previous_clear_bit(&self, from: usize) -> Option<usize> {
        let mut index = word_index(from);
        if index >= self.words.len() {
            return Some(from);
        }
        let mut word = !self.words[index] & span_mask(0, from % WORD_BITS);
        loop {
            if word != 0 {
                return Some((index + 1) * WORD_BITS - 1 - word.leading_zeros() as usize);
            }
            index = index.checked_sub(1)?;
            word = !self.words[index];
        }
    }

    /// 按升序遍历所有置位索引。
    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        core::iter::successors(self.next_set_bit(0), move |&last| {
            last.checked_add(1).and_then(|next| self.next_set_bit(next))
        })
    }

    pub fn intersects(&self, other: &BitVector) -> bool {
        self.words
            .iter()
            .zip(&other.words)
            .any(|(a, b)| a & b != 0)
    }

    /// `self &= other`。
    pub fn and(&mut self, other: &BitVector) {
        for (index, word) in self.words.iter_mut().enumerate() {
            *word &= other.words.get(index).copied().unwrap_or(0);
        }
    }

    /// `self |= other`。
    pub fn or(&mut self, other: &BitVector) {
        self.ensure_words(other.trimmed().len());
        for (word, rhs) in self.words.iter_mut().zip(&other.words) {
            *word |= rhs;
        }
    }

    /// `self ^= other`。
    pub fn xor(&mut self, other: &BitVector) {
        self.ensure_words(other.trimmed().len());
        for (word, rhs) in self.words.iter_mut().zip(&other.words) {
            *word ^= rhs;
        }
    }

    /// `self &= !other`。
    pub fn and_not(&mut self, other: &BitVector) {
        for (word, rhs) in self.words.iter_mut().zip(&other.words) {
            *word &= !rhs;
        }
    }

    /// 把本向量的低 `length` 位复制到 `dest` 的 `[dest_offset, dest_offset + length)`，
    /// 目标区间先被清零。
    pub fn copy_into(&self, dest: &mut BitVector, dest_offset: usize, length: usize) {
        copy_bits(self, 0, dest, dest_offset, length);
    }

    /// 大写十六进制串（[`BitVector::to_bytes`] 逐字节渲染）；空向量为 `"0"`。
    pub fn to_hex_string(&self) -> String {
        if self.is_empty() {
            "0".to_owned()
        } else {
            hex::encode_upper(self.to_bytes())
        }
    }

    /// 位 0 在最左侧的二进制串，长度为 `length()`；空向量为 `"0"`。
    pub fn to_binary_string(&self) -> String {
        let len = self.length();
        if len == 0 {
            return "0".to_owned();
        }
        (0..len)
            .map(|index| if self.get(index) { '1' } else { '0' })
            .collect()
    }
}

/// 把 `src` 的 `[src_index, src_index + length)` 复制到 `dest` 的 `[dest_index, dest_index + length)`。
///
/// # 契约说明（What）
/// - 目标区间先被清零，再逐位写入源区间的置位；
/// - `src` 与 `dest` 由借用规则保证互不别名。
pub fn copy_bits(
    src: &BitVector,
    src_index: usize,
    dest: &mut BitVector,
    dest_index: usize,
    length: usize,
) {
    dest.clear_range(dest_index, dest_index.saturating_add(length));
    let src_end = src_index.saturating_add(length);
    let mut cursor = src.next_set_bit(src_index);
    while let Some(bit) = cursor.filter(|bit| *bit < src_end) {
        dest.set(dest_index + (bit - src_index));
        cursor = bit.checked_add(1).and_then(|next| src.next_set_bit(next));
    }
}

impl PartialEq for BitVector {
    fn eq(&self, other: &Self) -> bool {
        self.trimmed() == other.trimmed()
    }
}

impl Eq for BitVector {}

impl Hash for BitVector {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.trimmed().hash(state);
    }
}

impl Ord for BitVector {
    /// 把位向量视为无符号大整数比较。
    fn cmp(&self, other: &Self) -> Ordering {
        let (lhs, rhs) = (self.trimmed(), other.trimmed());
        lhs.len()
            .cmp(&rhs.len())
            .then_with(|| lhs.iter().rev().cmp(rhs.iter().rev()))
    }
}

impl PartialOrd for BitVector {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for BitVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (position, bit) in self.iter_ones().enumerate() {
            if position > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{bit}")?;
        }
        f.write_str("}")
    }
}

impl fmt::Debug for BitVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BitVector{self}")
    }
}

impl FromIterator<usize> for BitVector {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut bits = Self::new();
        for index in iter {
            bits.set(index);
        }
        bits
    }
}

/// 只读位向量。
///
/// # 设计背景（Why）
/// - 匹配模式在构建完成后应当不可变，但仍需作为操作数参与对草稿向量的批量变换；
/// - `FrozenBits` 通过 `Deref<Target = BitVector>` 暴露全部只读方法，
///   同时提供以自身为右操作数、修改参数的 `*_into` 系列方法。
///
/// # 契约说明（What）
/// - `a.and_into(&mut b)` 等价于 `b.and(&a)`，`a` 永不被修改；
/// - 借用规则保证参数与 `self` 不可能别名。
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrozenBits {
    bits: BitVector,
}

impl FrozenBits {
    pub fn empty() -> Self {
        Self::default()
    }

    /// `[0, len)` 全为一。
    pub fn full(len: usize) -> Self {
        Self {
            bits: BitVector::ones(len),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        BitVector::from_bytes(bytes).into()
    }

    pub fn from_words(words: &[u64]) -> Self {
        BitVector::from_words(words).into()
    }

    /// 复制出一份可变向量。
    pub fn to_mutable(&self) -> BitVector {
        self.bits.clone()
    }

    pub fn and_into(&self, other: &mut BitVector) {
        other.and(&self.bits);
    }

    pub fn or_into(&self, other: &mut BitVector) {
        other.or(&self.bits);
    }

    pub fn xor_into(&self, other: &mut BitVector) {
        other.xor(&self.bits);
    }

    pub fn and_not_into(&self, other: &mut BitVector) {
        other.and_not(&self.bits);
    }
}

impl Deref for FrozenBits {
    type Target = BitVector;

    fn deref(&self) -> &BitVector {
        &self.bits
    }
}

impl From<BitVector> for FrozenBits {
    fn from(bits: BitVector) -> Self {
        Self { bits }
    }
}

impl From<&BitVector> for FrozenBits {
    fn from(bits: &BitVector) -> Self {
        Self { bits: bits.clone() }
    }
}

impl fmt::Display for FrozenBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.bits, f)
    }
}

impl fmt::Debug for FrozenBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FrozenBits{}", self.bits)
    }
}
