//! `bitwire-core` 提供二进制编解码的底层积木：定长游标缓冲与位向量。
//!
//! # 模块定位（Why）
//! - 上层的传输适配与序列化组合子只依赖这里的原语：按字节序读写定长值、切片、批量搬运、
//!   写零与十六进制转储；
//! - 位向量服务于掩码匹配，提供隐式零扩展语义与集合代数。
//!
//! # 设计概要（How）
//! - [`ByteBuffer`] 以存储类型参数化，自有缓冲基于 `bytes::BytesMut`，切片是借用视图；
//! - [`BufferOperation`] 描述批量操作成功后游标的去向，失败路径从不提交游标；
//! - [`with_cached`] 以闭包方式借出线程本地缓存，重入时返回错误而非覆盖；
//! - [`BitVector`]/[`FrozenBits`] 是可变/只读两种位向量视角。
//!
//! # 命名约定（Consistency）
//! - 相对操作使用 `get`/`put`，绝对操作附加 `_at` 后缀；
//! - 错误码统一位于 [`codes`]，遵循 `<领域>.<语义>`。

mod bits;
mod buffer;
mod cache;
pub mod error;
mod limits;
mod order;
mod primitive;

pub use bits::{BitVector, FrozenBits, copy_bits};
pub use buffer::{BufferOperation, ByteBuffer, MAX_HEX_BYTES, transfer};
pub use cache::{
    INITIAL_CACHED_BUFFER_CAPACITY, MAX_CACHED_BUFFER_CAPACITY, ZERO_CHUNK, ZERO_CHUNK_SIZE,
    cached_capacity, with_cached,
};
pub use error::{BufferError, Result, codes};
pub use limits::{DecodeLimits, MAX_WIRE_COUNT};
pub use order::{BufferKind, ByteOrder};
pub use primitive::{MAX_PRIMITIVE_SIZE, Primitive, U24};
