//! `bitwire-match` 在位向量之上提供报文位域布局与值/掩码匹配模式。
//!
//! # 模块定位（Why）
//! - 以“哪些位必须为何值、哪些位不关心”描述一类报文，再对任意字节序列做一次与运算加比较即可判定；
//! - 各协议字段可以独立描述，最后合并为覆盖整条报文的单一模式。
//!
//! # 设计概要（How）
//! - [`BitHeader`]/[`BitField`] 描述报文头与字段的绝对位区间，[`layouts`] 给出常见协议的常量布局；
//! - [`BitMasked`] 是绑定到字段的局部模式，[`BitMatchBuilder`] 把它们平移到绝对位置后合并成 [`BitMatch`]；
//! - [`BitMatchCodec`] 借助 `bitwire-io` 的长度前缀字节块读写模式，对三种传输通用。
//!
//! # 使用示例
//! ```
//! use bitwire_match::{BitMasked, BitMatch, layouts};
//!
//! let ipv4 = BitMatch::builder()
//!     .add(&BitMasked::of_exact_bytes(layouts::eth::TYPE, &[0x08, 0x00])?)
//!     .build()?;
//!
//! let mut frame = [0u8; 34];
//! frame[12] = 0x08;
//! assert!(ipv4.matches_packet(&frame));
//! frame[13] = 0x06;
//! assert!(!ipv4.matches_packet(&frame));
//! # Ok::<(), bitwire_match::MatchError>(())
//! ```

mod bitmatch;
mod codec;
pub mod error;
mod layout;
pub mod layouts;

pub use bitmatch::{BitMasked, BitMatch, BitMatchBuilder};
pub use codec::BitMatchCodec;
pub use error::{MatchError, codes};
pub use layout::{BitField, BitHeader};
