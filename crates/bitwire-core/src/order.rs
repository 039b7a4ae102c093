//! 字节序与缓冲后端类别。

use crate::buffer::ByteBuffer;

/// 多字节原语在线路上的字节排列方式。
///
/// # 设计背景（Why）
/// - 字节序是每次调用的参数，而不是缓冲的永久属性：同一块缓冲可能先按大端写入头部，
///   再按小端写入载荷；
/// - 缓冲自身仍记录一个“默认字节序”，仅用于 [`ByteBuffer::get_ordered`](crate::ByteBuffer::get_ordered)
///   等便捷入口以及切片/复制时的继承。
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum ByteOrder {
    /// 网络字节序，所有线路格式的默认值。
    #[default]
    BigEndian,
    LittleEndian,
}

impl ByteOrder {
    /// 当前目标平台的本机字节序。
    pub const fn native() -> Self {
        if cfg!(target_endian = "big") {
            Self::BigEndian
        } else {
            Self::LittleEndian
        }
    }
}

/// 缓冲的后端类别。
///
/// # 契约说明（What）
/// - 类别在分配时确定，切片、复制均保持不变；
/// - 两种类别各自拥有独立的线程本地缓存；
/// - 在本实现中两者都由 `bytes::BytesMut` 承载，`Direct` 仅作为调用方可观测的标签，
///   便于与要求“堆外”语义的外部组件对齐。
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum BufferKind {
    #[default]
    Heap,
    Direct,
}

impl BufferKind {
    /// 返回按本类别分配缓冲的工厂，供只接受“容量 -> 缓冲”闭包的调用方使用。
    pub fn allocator(self) -> impl Fn(usize) -> ByteBuffer + Copy {
        move |capacity| ByteBuffer::allocate(capacity, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_matches_target() {
        let one = 1u16.to_ne_bytes();
        let expected = if one[0] == 1 {
            ByteOrder::LittleEndian
        } else {
            ByteOrder::BigEndian
        };
        assert_eq!(ByteOrder::native(), expected);
    }

    #[test]
    fn allocator_keeps_kind() {
        let alloc = BufferKind::Direct.allocator();
        let buf = alloc(12);
        assert_eq!(buf.kind(), BufferKind::Direct);
        assert_eq!(buf.capacity(), 12);
        assert_eq!(alloc(0).capacity(), 0);
    }
}
