//! 定长游标缓冲 [`ByteBuffer`] 与操作后游标策略 [`BufferOperation`]。
//!
//! # 模块定位（Why）
//! - 二进制编解码需要一个“容量固定、读写游标显式”的字节区域：
//!   `position` 指向下一次读写的位置，`limit` 为可访问区域的开区间终点，`capacity` 为存储长度；
//! - 批量操作结束后游标的去向（前进、复位、翻转为可读）由调用方通过 [`BufferOperation`] 选择，
//!   避免每个调用点手写 `flip`/`set_position` 组合。
//!
//! # 设计概要（How）
//! - `ByteBuffer<S>` 对存储类型泛化：`BytesMut` 表示自有缓冲，`&[u8]`/`&mut [u8]` 表示借用视图。
//!   切片因此是编译期受借用检查保护的视图，而不是共享底层数组的别名对象；
//! - 所有会失败的操作都先完成容量检查，再触碰数据，最后才提交游标。
//!   失败路径上 `position`/`limit` 均保持调用前的值，无需额外的恢复代码；
//! - 字节序是每次调用的参数，缓冲记录的 `order` 只作为默认值并在切片、复制时继承。
//!
//! # 契约说明（What）
//! - 不变式：`0 <= position <= limit <= capacity`，`mark`（若存在）不大于 `position`；
//! - 相对读取不足时返回 `Underflow`，相对写入空间不足时返回 `Overflow`，
//!   绝对访问越界返回 `IndexOutOfBounds`。

use core::fmt;

use bytes::{Bytes, BytesMut};

use crate::{
    error::{BufferError, Result},
    order::{BufferKind, ByteOrder},
    primitive::Primitive,
};

/// 十六进制转储单次允许的最大字节数；每个字节占两个字符，结果长度需落在 `i32` 正数范围内。
pub const MAX_HEX_BYTES: usize = (i32::MAX / 2) as usize;

/// 批量操作成功完成后施加在缓冲游标上的策略。
///
/// # 契约说明（What）
/// - `AdvancePosition`：`position = end`，即消费/写入的字节被越过；
/// - `RestorePosition`：`position = start`，缓冲看起来像从未被访问；
/// - `FlipRelatively`：`limit = end` 后 `position = start`，刚写满的区域直接变为可读状态。
///
/// 策略只在操作成功后施加，失败路径不会调用 [`BufferOperation::apply`]。
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum BufferOperation {
    #[default]
    AdvancePosition,
    RestorePosition,
    FlipRelatively,
}

impl BufferOperation {
    /// 将策略施加到 `buf`，`[start, end)` 为刚完成操作所覆盖的区间。
    ///
    /// # 契约说明（What）
    /// - **前置条件**：`start <= end <= capacity`；前进与复位还要求目标位置不超过 `limit`；
    /// - **后置条件**：成功时游标按上文规则更新，超出新 `position`/`limit` 的 `mark` 被丢弃；
    /// - **错误**：前置条件不满足时返回 `IndexOutOfBounds`，缓冲保持原状。
    pub fn apply<S: AsRef<[u8]>>(
        self,
        buf: &mut ByteBuffer<S>,
        start: usize,
        end: usize,
    ) -> Result<()> {
        let out_of_bounds = |limit| BufferError::IndexOutOfBounds {
            index: start,
            length: end.saturating_sub(start),
            limit,
        };
        if start > end || end > buf.capacity() {
            return Err(out_of_bounds(buf.capacity()));
        }
        match self {
            Self::AdvancePosition => {
                if end > buf.limit {
                    return Err(out_of_bounds(buf.limit));
                }
                buf.position = end;
            }
            Self::RestorePosition => {
                if start > buf.limit {
                    return Err(out_of_bounds(buf.limit));
                }
                buf.position = start;
            }
            Self::FlipRelatively => {
                buf.limit = end;
                buf.position = start;
            }
        }
        buf.discard_stale_mark();
        Ok(())
    }
}

/// 容量固定、带 `position`/`limit`/`mark` 游标的字节缓冲。
///
/// # 设计背景（Why）
/// - 协议编解码经常需要“先写头部占位、再回填长度”或“切出一段交给子解析器”，
///   显式游标比 `Vec<u8>` 追加写更贴合这类访问模式；
/// - 存储类型参数化后，自有缓冲与借用视图共享同一套读写方法。
///
/// # 逻辑解析（How）
/// - 读方法要求 `S: AsRef<[u8]>`，写方法额外要求 `S: AsMut<[u8]>`；
/// - 相等性只比较 `[position, limit)` 内的剩余字节，与游标绝对位置、字节序、类别无关。
#[derive(Clone)]
pub struct ByteBuffer<S = BytesMut> {
    storage: S,
    position: usize,
    limit: usize,
    mark: Option<usize>,
    order: ByteOrder,
    kind: BufferKind,
}

impl ByteBuffer<BytesMut> {
    /// 分配容量为 `capacity` 的零初始化缓冲，`position = 0`、`limit = capacity`、字节序为大端。
    pub fn allocate(capacity: usize, kind: BufferKind) -> Self {
        Self::wrap(BytesMut::zeroed(capacity), kind)
    }

    /// 复制 `bytes` 到新分配的缓冲中，整个内容处于可读状态。
    pub fn copy_of(bytes: &[u8], kind: BufferKind) -> Self {
        Self::wrap(BytesMut::from(bytes), kind)
    }

    /// 冻结 `[position, limit)` 为只读 `Bytes`，不复制数据。
    pub fn into_bytes(self) -> Bytes {
        let mut storage = self.storage;
        storage.truncate(self.limit);
        bytes::Buf::advance(&mut storage, self.position);
        storage.freeze()
    }
}

impl<S: AsRef<[u8]>> ByteBuffer<S> {
    /// 以现有存储构造缓冲：`position = 0`，`limit = capacity = storage.len()`。
    pub fn wrap(storage: S, kind: BufferKind) -> Self {
        let limit = storage.as_ref().len();
        Self {
            storage,
            position: 0,
            limit,
            mark: None,
            order: ByteOrder::BigEndian,
            kind,
        }
    }

    fn view(storage: S, order: ByteOrder, kind: BufferKind) -> Self {
        Self {
            order,
            ..Self::wrap(storage, kind)
        }
    }

    /// 以构建器风格设置默认字节序。
    pub fn with_order(mut self, order: ByteOrder) -> Self {
        self.order = order;
        self
    }

    pub fn capacity(&self) -> usize {
        self.storage.as_ref().len()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// `limit - position`。
    pub fn remaining(&self) -> usize {
        self.limit - self.position
    }

    pub fn has_remaining(&self) -> bool {
        self.position < self.limit
    }

    pub fn order(&self) -> ByteOrder {
        self.order
    }

    pub fn set_order(&mut self, order: ByteOrder) {
        self.order = order;
    }

    pub fn kind(&self) -> BufferKind {
        self.kind
    }

    /// 底层存储的只读引用（包含 `limit` 之外的字节）。
    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_inner(self) -> S {
        self.storage
    }

    /// `[position, limit)` 区间的只读视图。
    pub fn remaining_slice(&self) -> &[u8] {
        &self.storage.as_ref()[self.position..self.limit]
    }

    /// 设置 `position`；超过 `limit` 返回 `IndexOutOfBounds`，大于新位置的 `mark` 被丢弃。
    pub fn set_position(&mut self, position: usize) -> Result<()> {
        if position > self.limit {
            return Err(BufferError::IndexOutOfBounds {
                index: position,
                length: 0,
                limit: self.limit,
            });
        }
        self.position = position;
        self.discard_stale_mark();
        Ok(())
    }

    /// 设置 `limit`；超过容量返回 `IndexOutOfBounds`，`position` 随之收缩到新 `limit`。
    pub fn set_limit(&mut self, limit: usize) -> Result<()> {
        if limit > self.capacity() {
            return Err(BufferError::IndexOutOfBounds {
                index: limit,
                length: 0,
                limit: self.capacity(),
            });
        }
        self.limit = limit;
        self.position = self.position.min(limit);
        self.discard_stale_mark();
        Ok(())
    }

    /// 在当前位置打标记，供 [`ByteBuffer::reset`] 回退。
    pub fn mark(&mut self) {
        self.mark = Some(self.position);
    }

    /// 回退到最近一次 [`ByteBuffer::mark`] 的位置；未打标记时返回 `InvalidArgument`。
    pub fn reset(&mut self) -> Result<()> {
        let mark = self
            .mark
            .ok_or_else(|| BufferError::invalid_argument("buffer mark is not set"))?;
        self.position = mark;
        Ok(())
    }

    /// `position = 0`，`limit = capacity`，丢弃标记；数据不被擦除。
    pub fn clear(&mut self) {
        self.position = 0;
        self.limit = self.capacity();
        self.mark = None;
    }

    /// 写完转读：`limit = position`，`position = 0`。
    pub fn flip(&mut self) {
        self.limit = self.position;
        self.position = 0;
        self.mark = None;
    }

    /// `position = 0`，`limit` 不变。
    pub fn rewind(&mut self) {
        self.position = 0;
        self.mark = None;
    }

    fn discard_stale_mark(&mut self) {
        if self.mark.is_some_and(|mark| mark > self.position || mark > self.limit) {
            self.mark = None;
        }
    }

    fn read_end(&self, size: usize) -> Result<usize> {
        let available = self.remaining();
        if size > available {
            return Err(BufferError::Underflow {
                requested: size,
                available,
            });
        }
        Ok(self.position + size)
    }

    fn write_end(&self, size: usize) -> Result<usize> {
        let available = self.remaining();
        if size > available {
            return Err(BufferError::Overflow {
                requested: size,
                available,
            });
        }
        Ok(self.position + size)
    }

    fn index_end(&self, index: usize, length: usize) -> Result<usize> {
        match index.checked_add(length) {
            Some(end) if end <= self.limit => Ok(end),
            _ => Err(BufferError::IndexOutOfBounds {
                index,
                length,
                limit: self.limit,
            }),
        }
    }

    /// 相对读取的统一入口：借出 `[position, position + count)`，闭包成功后施加 `op`。
    ///
    /// # 契约说明（What）
    /// - 剩余字节不足时返回 `Underflow`，闭包不会被调用；
    /// - 闭包失败时游标保持调用前的值；
    /// - 错误类型 `E` 只需能从 [`BufferError`] 转换，便于传输层直接复用。
    pub fn consume_with<R, E, F>(&mut self, count: usize, op: BufferOperation, f: F) -> Result<R, E>
    where
        E: From<BufferError>,
        F: FnOnce(&[u8]) -> Result<R, E>,
    {
        let start = self.position;
        let end = self.read_end(count)?;
        let value = f(&self.storage.as_ref()[start..end])?;
        op.apply(self, start, end)?;
        Ok(value)
    }

    /// 相对读取一个原语并前进游标。
    pub fn get<T: Primitive>(&mut self, order: ByteOrder) -> Result<T> {
        self.consume_with(T::SIZE, BufferOperation::AdvancePosition, |raw| {
            Ok(T::decode(order, raw))
        })
    }

    /// 以缓冲默认字节序相对读取。
    pub fn get_ordered<T: Primitive>(&mut self) -> Result<T> {
        self.get(self.order)
    }

    /// 在绝对索引处读取一个原语，游标不动。
    pub fn get_at<T: Primitive>(&self, index: usize, order: ByteOrder) -> Result<T> {
        let end = self.index_end(index, T::SIZE)?;
        Ok(T::decode(order, &self.storage.as_ref()[index..end]))
    }

    /// 相对读取 `dst.len()` 个字节到 `dst`，随后施加 `op`。
    pub fn get_bytes(&mut self, dst: &mut [u8], op: BufferOperation) -> Result<()> {
        self.consume_with(dst.len(), op, |raw| {
            dst.copy_from_slice(raw);
            Ok(())
        })
    }

    /// 在绝对索引处读取 `dst.len()` 个字节。
    pub fn get_bytes_at(&self, index: usize, dst: &mut [u8]) -> Result<()> {
        let end = self.index_end(index, dst.len())?;
        dst.copy_from_slice(&self.storage.as_ref()[index..end]);
        Ok(())
    }

    /// 切出 `[position, position + size)` 的只读视图，随后对本缓冲施加 `op`。
    ///
    /// 视图的 `position = 0`、`limit = capacity = size`，继承字节序与类别。
    pub fn slice(&mut self, size: usize, op: BufferOperation) -> Result<ByteBuffer<&[u8]>> {
        let start = self.position;
        let end = self.read_end(size)?;
        op.apply(self, start, end)?;
        let (order, kind) = (self.order, self.kind);
        Ok(ByteBuffer::view(&self.storage.as_ref()[start..end], order, kind))
    }

    /// 切出 `[index, index + size)` 的只读视图，游标不动。
    pub fn slice_at(&self, index: usize, size: usize) -> Result<ByteBuffer<&[u8]>> {
        let end = self.index_end(index, size)?;
        Ok(ByteBuffer::view(
            &self.storage.as_ref()[index..end],
            self.order,
            self.kind,
        ))
    }

    /// 深拷贝 `size` 个字节到同类别、同字节序的新缓冲。
    pub fn copy(&mut self, size: usize, op: BufferOperation) -> Result<ByteBuffer<BytesMut>> {
        let (order, kind) = (self.order, self.kind);
        self.consume_with(size, op, |raw| {
            Ok(ByteBuffer::copy_of(raw, kind).with_order(order))
        })
    }

    /// 深拷贝 `size` 个字节为 `Vec<u8>`。
    pub fn copy_to_vec(&mut self, size: usize, op: BufferOperation) -> Result<Vec<u8>> {
        self.consume_with(size, op, |raw| Ok(raw.to_vec()))
    }

    /// 将 `count` 个字节渲染为无分隔符的大写十六进制串。
    ///
    /// `count` 超过 [`MAX_HEX_BYTES`] 时返回 `InvalidArgument`。
    pub fn hex_string(&mut self, count: usize, op: BufferOperation) -> Result<String> {
        check_hex_count(count)?;
        self.consume_with(count, op, |raw| Ok(hex::encode_upper(raw)))
    }

    /// 在绝对索引处渲染 `count` 个字节的十六进制串，游标不动。
    pub fn hex_string_at(&self, index: usize, count: usize) -> Result<String> {
        check_hex_count(count)?;
        let end = self.index_end(index, count)?;
        Ok(hex::encode_upper(&self.storage.as_ref()[index..end]))
    }
}

fn check_hex_count(count: usize) -> Result<()> {
    if count > MAX_HEX_BYTES {
        return Err(BufferError::invalid_argument(format!(
            "cannot render {count} bytes as hex, at most {MAX_HEX_BYTES} are allowed"
        )));
    }
    Ok(())
}

impl<S: AsRef<[u8]> + AsMut<[u8]>> ByteBuffer<S> {
    /// `[position, limit)` 区间的可写视图。
    pub fn remaining_slice_mut(&mut self) -> &mut [u8] {
        let (start, end) = (self.position, self.limit);
        &mut self.storage.as_mut()[start..end]
    }

    /// 相对写入的统一入口：借出 `[position, position + count)` 的可写区域，闭包成功后施加 `op`。
    ///
    /// # 契约说明（What）
    /// - 剩余空间不足时返回 `Overflow`，闭包不会被调用；
    /// - 闭包失败时游标保持调用前的值，但闭包已写入的字节不会回滚。
    pub fn fill_with<R, E, F>(&mut self, count: usize, op: BufferOperation, f: F) -> Result<R, E>
    where
        E: From<BufferError>,
        F: FnOnce(&mut [u8]) -> Result<R, E>,
    {
        let start = self.position;
        let end = self.write_end(count)?;
        let value = f(&mut self.storage.as_mut()[start..end])?;
        op.apply(self, start, end)?;
        Ok(value)
    }

    /// 相对写入一个原语并前进游标。
    pub fn put<T: Primitive>(&mut self, value: T, order: ByteOrder) -> Result<()> {
        self.fill_with(T::SIZE, BufferOperation::AdvancePosition, |raw| {
            value.encode(order, raw);
            Ok(())
        })
    }

    /// 以缓冲默认字节序相对写入。
    pub fn put_ordered<T: Primitive>(&mut self, value: T) -> Result<()> {
        self.put(value, self.order)
    }

    /// 在绝对索引处写入一个原语，游标不动。
    pub fn put_at<T: Primitive>(&mut self, index: usize, value: T, order: ByteOrder) -> Result<()> {
        let end = self.index_end(index, T::SIZE)?;
        value.encode(order, &mut self.storage.as_mut()[index..end]);
        Ok(())
    }

    /// 相对写入 `src` 的全部字节，随后施加 `op`。
    pub fn put_bytes(&mut self, src: &[u8], op: BufferOperation) -> Result<()> {
        self.fill_with(src.len(), op, |raw| {
            raw.copy_from_slice(src);
            Ok(())
        })
    }

    /// 在绝对索引处写入 `src`，游标不动。
    pub fn put_bytes_at(&mut self, index: usize, src: &[u8]) -> Result<()> {
        let end = self.index_end(index, src.len())?;
        self.storage.as_mut()[index..end].copy_from_slice(src);
        Ok(())
    }

    /// 相对写入 `count` 个零字节，随后施加 `op`。
    pub fn put_zeros(&mut self, count: usize, op: BufferOperation) -> Result<()> {
        self.fill_with(count, op, |raw| {
            raw.fill(0);
            Ok::<_, BufferError>(())
        })
    }

    /// 在绝对索引处写入 `count` 个零字节，游标不动。
    pub fn put_zeros_at(&mut self, index: usize, count: usize) -> Result<()> {
        let end = self.index_end(index, count)?;
        self.storage.as_mut()[index..end].fill(0);
        Ok(())
    }

    /// 切出 `[position, position + size)` 的可写视图，随后对本缓冲施加 `op`。
    pub fn slice_mut(
        &mut self,
        size: usize,
        op: BufferOperation,
    ) -> Result<ByteBuffer<&mut [u8]>> {
        let start = self.position;
        let end = self.read_end(size)?;
        op.apply(self, start, end)?;
        let (order, kind) = (self.order, self.kind);
        Ok(ByteBuffer::view(
            &mut self.storage.as_mut()[start..end],
            order,
            kind,
        ))
    }
}

/// 在两块缓冲之间搬运恰好 `size` 个字节，两侧各自施加独立的游标策略。
///
/// # 契约说明（What）
/// - `src` 剩余字节不足返回 `Underflow`，`dst` 剩余空间不足返回 `Overflow`；
/// - 任一检查失败时两侧缓冲均未被修改；
/// - 成功时先对 `src` 施加 `src_op`，再对 `dst` 施加 `dst_op`。
pub fn transfer<S, D>(
    src: &mut ByteBuffer<S>,
    src_op: BufferOperation,
    dst: &mut ByteBuffer<D>,
    dst_op: BufferOperation,
    size: usize,
) -> Result<()>
where
    S: AsRef<[u8]>,
    D: AsRef<[u8]> + AsMut<[u8]>,
{
    let src_start = src.position;
    let src_end = src.read_end(size)?;
    let dst_start = dst.position;
    let dst_end = dst.write_end(size)?;
    dst.storage.as_mut()[dst_start..dst_end]
        .copy_from_slice(&src.storage.as_ref()[src_start..src_end]);
    src_op.apply(src, src_start, src_end)?;
    dst_op.apply(dst, dst_start, dst_end)
}

impl<S: AsRef<[u8]>> fmt::Debug for ByteBuffer<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteBuffer")
            .field("position", &self.position)
            .field("limit", &self.limit)
            .field("capacity", &self.capacity())
            .field("order", &self.order)
            .field("kind", &self.kind)
            .finish()
    }
}

impl<S: AsRef<[u8]>, T: AsRef<[u8]>> PartialEq<ByteBuffer<T>> for ByteBuffer<S> {
    fn eq(&self, other: &ByteBuffer<T>) -> bool {
        self.remaining_slice() == other.remaining_slice()
    }
}

impl<S: AsRef<[u8]>> Eq for ByteBuffer<S> {}
