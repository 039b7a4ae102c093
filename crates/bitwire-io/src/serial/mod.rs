//! 可组合的序列化器。
//!
//! # 模块定位（Why）
//! - 高层值（布尔、字符串、枚举、时间、字节块、集合、映射）的线路格式全部由原语拼成，
//!   只依赖 [`ByteSource`]/[`ByteSink`]，因此对通道、流、缓冲三种传输天然通用；
//! - 序列化器是无状态的值对象：构造一次即可在任意多个线程、任意多次调用中共享。
//!
//! # 设计概要（How）
//! - [`Writer<T>`]/[`Reader<T>`] 以目标值类型为泛型参数，同一个序列化器可以服务多种类型，
//!   例如 [`PrimitiveCodec`] 只持有字节序，却能读写全部定长原语；
//! - 组合通过持有子序列化器完成：[`SeqCodec`] 持有元素序列化器，[`MapCodec`] 持有键值序列化器；
//! - 所有计数与长度前缀都是 4 字节大端有符号整数，负值在读取时被拒绝。
//!
//! # 线路格式（What）
//! | 值 | 格式 |
//! |---|---|
//! | bool | 1 字节，`0b0101_0101` 为假，其按位取反为真 |
//! | string | 4 字节长度 + 字符集编码字节 |
//! | enum | 4 字节序号 |
//! | instant | 8 字节秒 + 4 字节纳秒 |
//! | duration | 8 字节纳秒，非负 |
//! | 字节块 | 4 字节长度 + 原始字节 |
//! | 集合/映射 | 4 字节元素数 + 逐个元素（映射为先键后值） |

mod block;
mod boolean;
mod ordinal;
mod primitive;
mod seq;
mod string;
mod time;

pub use block::{LengthPrefixed, RawBytes};
pub use boolean::{BoolCodec, FALSE_BYTE, TRUE_BYTE};
pub use ordinal::{EnumCodec, Ordinal};
pub use primitive::PrimitiveCodec;
pub use seq::{MapCodec, MultiReader, SeqCodec};
pub use string::{Charset, StringCodec};
pub use time::{DurationCodec, InstantCodec};

use bitwire_core::{ByteOrder, DecodeLimits, MAX_WIRE_COUNT};

use crate::{
    error::{ReadError, WriteError},
    transport::{ByteSink, ByteSource},
};

/// 把 `T` 写入任意传输的序列化器。
pub trait Writer<T: ?Sized> {
    fn write<K: ByteSink>(&self, value: &T, sink: &mut K) -> Result<(), WriteError>;
}

/// 从任意传输读出 `T` 的反序列化器。
pub trait Reader<T> {
    fn read<K: ByteSource>(&self, source: &mut K) -> Result<T, ReadError>;
}

impl<T: ?Sized, W: Writer<T> + ?Sized> Writer<T> for &W {
    fn write<K: ByteSink>(&self, value: &T, sink: &mut K) -> Result<(), WriteError> {
        (**self).write(value, sink)
    }
}

impl<T, R: Reader<T> + ?Sized> Reader<T> for &R {
    fn read<K: ByteSource>(&self, source: &mut K) -> Result<T, ReadError> {
        (**self).read(source)
    }
}

/// 按线路声明长度读取字节块时一次预分配的字节数上限。
pub(crate) const PREALLOCATE_BYTES: usize = 8192;

/// 写出 4 字节大端长度/计数；超出 `i32` 正数范围时返回编码错误。
pub(crate) fn write_count<K: ByteSink>(
    sink: &mut K,
    count: usize,
    what: &str,
) -> Result<(), WriteError> {
    let wire = i32::try_from(count)
        .map_err(|_| WriteError::encode(format!("{what} {count} exceeds {MAX_WIRE_COUNT}")))?;
    sink.write_value(wire, ByteOrder::BigEndian)
}

/// 读取 4 字节大端长度前缀，拒绝负值与超过 `limits.max_length` 的声明。
pub(crate) fn read_length<K: ByteSource>(
    source: &mut K,
    limits: &DecodeLimits,
) -> Result<usize, ReadError> {
    let wire: i32 = source.read_value(ByteOrder::BigEndian)?;
    let len = usize::try_from(wire)
        .map_err(|_| ReadError::decode("read invalid negative length"))?;
    if !limits.allows_length(len) {
        return Err(limit_exceeded("length", len, limits.max_length));
    }
    Ok(len)
}

/// 读取线路声明的 `len` 个字节。
///
/// 预分配至多 [`PREALLOCATE_BYTES`]，之后随已读到的数据成倍增长，
/// 声明长度远大于实际输入时在输入结束处失败，而不会先按声明长度分配。
pub(crate) fn read_declared<K: ByteSource>(
    source: &mut K,
    len: usize,
) -> Result<Vec<u8>, ReadError> {
    let mut raw = Vec::with_capacity(len.min(PREALLOCATE_BYTES));
    while raw.len() < len {
        let start = raw.len();
        let step = (len - start).min(start.max(PREALLOCATE_BYTES));
        raw.resize(start + step, 0);
        source.read_exact_into(&mut raw[start..])?;
    }
    Ok(raw)
}

/// 读取 4 字节大端元素计数，拒绝负值与超过 `limits.max_elements` 的声明。
pub(crate) fn read_element_count<K: ByteSource>(
    source: &mut K,
    limits: &DecodeLimits,
) -> Result<usize, ReadError> {
    let wire: i32 = source.read_value(ByteOrder::BigEndian)?;
    let count = usize::try_from(wire)
        .map_err(|_| ReadError::decode("received negative size for reading multiple elements"))?;
    if !limits.allows_elements(count) {
        return Err(limit_exceeded("element count", count, limits.max_elements));
    }
    Ok(count)
}

fn limit_exceeded(what: &'static str, declared: usize, max: usize) -> ReadError {
    tracing::debug!(what, declared, max, "declared size exceeds decode limits");
    ReadError::LimitExceeded { what, declared, max }
}
