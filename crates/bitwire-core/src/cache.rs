//! 线程本地缓存缓冲与零填充块。
//!
//! # 模块定位（Why）
//! - 热路径上常需要一块“用完即弃”的临时缓冲（例如读出定长载荷后立即解析），
//!   每次分配会造成内存抖动；
//! - 每个线程为每种 [`BufferKind`] 保留一块只增不减的缓冲，按需借出前 `capacity` 个字节。
//!
//! # 设计概要（How）
//! - 借出以闭包形式完成：[`with_cached`] 在闭包返回后自动归还，引用无法逃逸出调用范围；
//! - 缓存放在 `RefCell` 中，同一线程在闭包内再次获取同类缓存时返回
//!   [`BufferError::CacheBusy`]，而不是悄悄覆盖仍在使用的内容；
//! - 每次借出都把视图重置为 `position = 0`、`limit = capacity`、大端字节序。
//!
//! # 风险提示（Trade-offs）
//! - 缓存只增不减，单个线程最多常驻 [`MAX_CACHED_BUFFER_CAPACITY`] 字节（每种类别一份）；
//! - 缓存不会清零，借出的内容可能残留上一次使用的数据，调用方必须先写后读。

use core::cell::RefCell;
use std::thread::LocalKey;

use bytes::BytesMut;

use crate::{
    buffer::ByteBuffer,
    error::{BufferError, Result},
    order::BufferKind,
};

/// 缓存缓冲允许的最大容量（字节）。
pub const MAX_CACHED_BUFFER_CAPACITY: usize = 65_536;

/// 每个线程首次使用时的缓存容量（字节）。
pub const INITIAL_CACHED_BUFFER_CAPACITY: usize = 256;

/// 批量写零时单批次的字节数。
pub const ZERO_CHUNK_SIZE: usize = 4096;

/// 全零只读块，供传输层分批写零使用。
///
/// 只读数据无需线程隔离，因此使用静态数组而不是线程本地缓冲。
pub static ZERO_CHUNK: [u8; ZERO_CHUNK_SIZE] = [0u8; ZERO_CHUNK_SIZE];

thread_local! {
    static HEAP_CACHE: RefCell<BytesMut> =
        RefCell::new(BytesMut::zeroed(INITIAL_CACHED_BUFFER_CAPACITY));
    static DIRECT_CACHE: RefCell<BytesMut> =
        RefCell::new(BytesMut::zeroed(INITIAL_CACHED_BUFFER_CAPACITY));
}

fn cache_slot(kind: BufferKind) -> &'static LocalKey<RefCell<BytesMut>> {
    match kind {
        BufferKind::Heap => &HEAP_CACHE,
        BufferKind::Direct => &DIRECT_CACHE,
    }
}

/// 借出当前线程的缓存缓冲，在闭包内使用前 `capacity` 个字节。
///
/// # 契约说明（What）
/// - `capacity > MAX_CACHED_BUFFER_CAPACITY` 时返回 `InvalidArgument`，闭包不会被调用；
/// - 缓存容量小于请求时按请求值重新分配，之后不再收缩；
/// - 闭包收到的视图：`position = 0`，`limit = capacity = 请求值`，字节序为大端，类别为 `kind`；
/// - 闭包内再次对同一 `kind` 调用本函数返回 `CacheBusy`。
///
/// # 使用示例（How）
/// ```
/// use bitwire_core::{BufferError, BufferKind, ByteOrder, with_cached};
///
/// let value = with_cached(4, BufferKind::Heap, |buf| {
///     buf.put(0x0A0B_0C0Du32, ByteOrder::BigEndian)?;
///     buf.flip();
///     buf.get::<u32>(ByteOrder::LittleEndian)
/// })?;
/// assert_eq!(value, 0x0D0C_0B0A);
/// # Ok::<(), BufferError>(())
/// ```
pub fn with_cached<R, E, F>(capacity: usize, kind: BufferKind, f: F) -> Result<R, E>
where
    E: From<BufferError>,
    F: FnOnce(&mut ByteBuffer<&mut [u8]>) -> Result<R, E>,
{
    if capacity > MAX_CACHED_BUFFER_CAPACITY {
        return Err(BufferError::invalid_argument(format!(
            "cached buffer capacity {capacity} exceeds maximum {MAX_CACHED_BUFFER_CAPACITY}"
        ))
        .into());
    }
    cache_slot(kind).with(|slot| {
        let mut storage = slot
            .try_borrow_mut()
            .map_err(|_| BufferError::CacheBusy { kind })?;
        if storage.len() < capacity {
            tracing::trace!(
                kind = ?kind,
                old_capacity = storage.len(),
                new_capacity = capacity,
                "growing thread-local cached buffer"
            );
            *storage = BytesMut::zeroed(capacity);
        }
        let mut view = ByteBuffer::wrap(&mut storage[..capacity], kind);
        f(&mut view)
    })
}

/// 当前线程上 `kind` 缓存的已分配容量。
///
/// 缓存正被借用时返回 `None`。
pub fn cached_capacity(kind: BufferKind) -> Option<usize> {
    cache_slot(kind).with(|slot| slot.try_borrow().ok().map(|storage| storage.len()))
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;
    use crate::order::ByteOrder;

    /// 每次借出都是大端、从零开始的视图，即便上一次调用修改了字节序与游标。
    #[test]
    fn each_acquisition_resets_view() {
        with_cached(16, BufferKind::Heap, |buf| {
            buf.set_order(ByteOrder::LittleEndian);
            buf.put(1u64, ByteOrder::LittleEndian)?;
            Ok::<_, BufferError>(())
        })
        .expect("首次借出");

        with_cached(8, BufferKind::Heap, |buf| {
            assert_eq!(buf.order(), ByteOrder::BigEndian);
            assert_eq!((buf.position(), buf.limit(), buf.capacity()), (0, 8, 8));
            Ok::<_, BufferError>(())
        })
        .expect("再次借出");
    }

    #[test]
    fn reentrant_acquisition_reports_busy() {
        let outcome = with_cached(4, BufferKind::Direct, |_outer| {
            with_cached(4, BufferKind::Direct, |_inner| Ok::<_, BufferError>(()))
        });
        assert_eq!(
            outcome,
            Err(BufferError::CacheBusy {
                kind: BufferKind::Direct
            })
        );

        let mixed = with_cached(4, BufferKind::Heap, |_heap| {
            with_cached(4, BufferKind::Direct, |_direct| Ok::<_, BufferError>(7))
        });
        assert_eq!(mixed, Ok(7), "不同类别的缓存互不干扰");
    }

    /// 扩容时应输出 trace 日志，便于观察线程常驻内存。
    #[traced_test]
    #[test]
    fn growth_is_traced() {
        with_cached(1024, BufferKind::Heap, |_| Ok::<_, BufferError>(()))
            .expect("1 KiB 在上限内");
        assert!(logs_contain("growing thread-local cached buffer"));
    }
}
