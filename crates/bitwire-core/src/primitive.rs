//! 定长原语的字节序编解码。
//!
//! # 模块定位（Why）
//! - 缓冲、通道、流三种传输面都需要同一组原语（byte/char/short/medium/int/long/float/double），
//!   若逐类型逐传输手写会形成组合爆炸；
//! - 通过 [`Primitive`] trait 把“值 <-> 定长字节”的转换收敛到一处，传输层只需搬运字节。
//!
//! # 设计概要（How）
//! - 标准整数与浮点类型通过宏批量实现，直接复用 `to_be_bytes`/`from_le_bytes` 等标准转换；
//! - 24 位无符号整数没有原生类型，使用 [`U24`] 新类型手工拆装三个字节；
//! - 所有编码都在调用方提供的栈上暂存区完成，最大宽度为 [`MAX_PRIMITIVE_SIZE`]。

use core::fmt;

use crate::order::ByteOrder;

/// 最宽原语（`u64`/`i64`/`f64`）的字节数，也是传输层单值暂存区的容量。
pub const MAX_PRIMITIVE_SIZE: usize = 8;

/// 可按字节序编解码的定长值。
///
/// # 契约说明（What）
/// - `SIZE` 为编码后的精确字节数，且不超过 [`MAX_PRIMITIVE_SIZE`]；
/// - `encode`/`decode` 只访问切片的前 `SIZE` 个字节，切片长度不足属于调用方违约并会 panic，
///   库内所有调用点都先完成容量检查再调用；
/// - 实现必须是纯函数：同一输入总是产生同一字节序列。
pub trait Primitive: Copy + Sized {
    /// 编码宽度（字节）。
    const SIZE: usize;

    /// 按 `order` 将值写入 `dst[..SIZE]`。
    fn encode(self, order: ByteOrder, dst: &mut [u8]);

    /// 按 `order` 从 `src[..SIZE]` 还原值。
    fn decode(order: ByteOrder, src: &[u8]) -> Self;
}

macro_rules! impl_primitive {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Primitive for $ty {
                const SIZE: usize = core::mem::size_of::<$ty>();

                #[inline]
                fn encode(self, order: ByteOrder, dst: &mut [u8]) {
                    let raw = match order {
                        ByteOrder::BigEndian => self.to_be_bytes(),
                        ByteOrder::LittleEndian => self.to_le_bytes(),
                    };
                    dst[..Self::SIZE].copy_from_slice(&raw);
                }

                #[inline]
                fn decode(order: ByteOrder, src: &[u8]) -> Self {
                    let mut raw = [0u8; core::mem::size_of::<$ty>()];
                    raw.copy_from_slice(&src[..Self::SIZE]);
                    match order {
                        ByteOrder::BigEndian => <$ty>::from_be_bytes(raw),
                        ByteOrder::LittleEndian => <$ty>::from_le_bytes(raw),
                    }
                }
            }
        )*
    };
}

// `u16` 同时承担 16 位无符号字符（char）的角色。
impl_primitive!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

/// 24 位无符号整数（medium）。
///
/// # 设计背景（Why）
/// - 多种二进制协议使用 3 字节长度或标识字段，Rust 没有对应的原生类型；
/// - 新类型把“只保留低 24 位”的不变式固化在构造函数里，读取时永不做符号扩展。
///
/// # 契约说明（What）
/// - 取值范围 `0..=0x00FF_FFFF`；
/// - [`U24::truncate`] 丢弃高 8 位，[`U24::new`] 在越界时返回 `None`。
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct U24(u32);

impl U24 {
    pub const MAX: U24 = U24(0x00FF_FFFF);
    pub const MIN: U24 = U24(0);

    /// 校验后构造；高 8 位非零时返回 `None`。
    pub const fn new(value: u32) -> Option<Self> {
        if value <= Self::MAX.0 {
            Some(Self(value))
        } else {
            None
        }
    }

    /// 保留低 24 位构造。
    pub const fn truncate(value: u32) -> Self {
        Self(value & Self::MAX.0)
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl From<U24> for u32 {
    fn from(value: U24) -> Self {
        value.0
    }
}

impl TryFrom<u32> for U24 {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(value)
    }
}

impl fmt::Display for U24 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Primitive for U24 {
    const SIZE: usize = 3;

    #[inline]
    fn encode(self, order: ByteOrder, dst: &mut [u8]) {
        let v = self.0;
        let hi = (v >> 16) as u8;
        let mid = (v >> 8) as u8;
        let lo = v as u8;
        let raw = match order {
            ByteOrder::BigEndian => [hi, mid, lo],
            ByteOrder::LittleEndian => [lo, mid, hi],
        };
        dst[..3].copy_from_slice(&raw);
    }

    #[inline]
    fn decode(order: ByteOrder, src: &[u8]) -> Self {
        let (hi, mid, lo) = match order {
            ByteOrder::BigEndian => (src[0], src[1], src[2]),
            ByteOrder::LittleEndian => (src[2], src[1], src[0]),
        };
        Self((u32::from(hi) << 16) | (u32::from(mid) << 8) | u32::from(lo))
    }
}
