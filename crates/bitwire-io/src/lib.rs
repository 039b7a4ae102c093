//! `bitwire-io` 把 `bitwire-core` 的缓冲原语接到三种传输面上，并在其上提供可组合的序列化器。
//!
//! # 模块定位（Why）
//! - 阻塞通道、字节流、内存缓冲三种传输在“读满/写完 N 字节”上语义一致，
//!   统一为 [`ByteSource`]/[`ByteSink`] 后，高层序列化器只需编写一次；
//! - 序列化器不持有数据，只描述值与线路字节之间的变换，可在线程间自由共享。
//!
//! # 设计概要（How）
//! - [`Channel`]：包装只会“尽力搬运一部分”的通道，循环直到凑满或遇到输入结束；
//! - [`Stream`]：包装 `std::io::Read`/`Write`，依赖其 `read_exact`/`write_all`；
//! - [`ByteBuffer`](bitwire_core::ByteBuffer) 与 [`PositionedBuffer`]：相对/绝对偏移两种缓冲传输；
//! - `serial` 中的序列化器只调用 [`ByteSource`]/[`ByteSink`]，天然对三种传输通用。
//!
//! # 错误约定
//! - 读失败统一为 [`ReadError`]，写失败统一为 [`WriteError`]；
//! - 输入在凑满之前结束一律报告 [`ReadError::EndOfStream`]，与传输种类无关。

mod channel;
pub mod error;
mod indexed;
mod serial;
mod stream;
mod transport;

pub use channel::{
    Channel, IoChannel, ReadableChannel, TraceDirection, TracedChannel, Transfer,
    WritableChannel, hex_tracer,
};
pub use error::{ReadError, WriteError, codes};
pub use indexed::PositionedBuffer;
pub use serial::{
    BoolCodec, Charset, DurationCodec, EnumCodec, FALSE_BYTE, InstantCodec, LengthPrefixed,
    MapCodec, MultiReader, Ordinal, PrimitiveCodec, RawBytes, Reader, SeqCodec, StringCodec,
    TRUE_BYTE, Writer,
};
pub use stream::Stream;
pub use transport::{ByteSink, ByteSource};
