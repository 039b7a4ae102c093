//! 集合与映射序列化器。
//!
//! # 设计概要（How）
//! - [`SeqCodec`] 持有元素序列化器，为常见容器直接实现 [`Writer`]/[`Reader`]；
//! - 不可变容器（`Arc<[T]>`、`Arc<BTreeSet<T>>`、`Arc<BTreeMap<K, V>>`）先累积到可变容器，
//!   读完全部元素后再一次性冻结；
//! - 调用方自选容器时使用 [`MultiReader`]：提供者、累加器、终结器三个闭包描述构建过程；
//! - [`MapCodec`] 持有键、值两个序列化器，映射在线路上是“元素数 + 逐条先键后值”。
//!
//! # 风险提示（Trade-offs）
//! - 预分配容量取 `min(声明元素数, PREALLOCATE_LIMIT)`，声明数再大也只随实际读到的元素增长；
//! - 读入重复键时后出现的值覆盖先出现的值，集合中重复元素只保留一个。

use core::{hash::BuildHasher, hash::Hash, marker::PhantomData};
use std::{
    collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque},
    sync::Arc,
};

use bitwire_core::DecodeLimits;

use super::{Reader, Writer, read_element_count, write_count};
use crate::{
    error::{ReadError, WriteError},
    transport::{ByteSink, ByteSource},
};

/// 读取时预分配的元素个数上限。
const PREALLOCATE_LIMIT: usize = 1024;

const COUNT_WHAT: &str = "element count";

fn write_all<'a, T, E, K, I>(
    element: &E,
    items: I,
    count: usize,
    sink: &mut K,
) -> Result<(), WriteError>
where
    T: 'a + ?Sized,
    E: Writer<T>,
    K: ByteSink,
    I: IntoIterator<Item = &'a T>,
{
    write_count(sink, count, COUNT_WHAT)?;
    for item in items {
        element.write(item, sink)?;
    }
    Ok(())
}

/// 同构序列序列化器：4 字节大端元素数 + 逐个元素。
///
/// # 契约说明（What）
/// - 写出顺序即容器的迭代顺序；
/// - 负元素数或超过 `limits.max_elements` 的声明在读取任何元素之前被拒绝。
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SeqCodec<E> {
    element: E,
    limits: DecodeLimits,
}

impl<E> SeqCodec<E> {
    pub const fn new(element: E) -> Self {
        Self {
            element,
            limits: DecodeLimits::UNBOUNDED,
        }
    }

    pub fn with_limits(mut self, limits: DecodeLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn element(&self) -> &E {
        &self.element
    }

    /// 读取元素数后逐个读出元素交给 `push`，返回声明的元素数。
    fn read_each<T, K, P>(&self, source: &mut K, mut push: P) -> Result<usize, ReadError>
    where
        E: Reader<T>,
        K: ByteSource,
        P: FnMut(T),
    {
        let count = read_element_count(source, &self.limits)?;
        for _ in 0..count {
            push(self.element.read(source)?);
        }
        Ok(count)
    }

    fn read_vec<T, K>(&self, source: &mut K) -> Result<Vec<T>, ReadError>
    where
        E: Reader<T>,
        K: ByteSource,
    {
        let count = read_element_count(source, &self.limits)?;
        let mut items = Vec::with_capacity(count.min(PREALLOCATE_LIMIT));
        for _ in 0..count {
            items.push(self.element.read(source)?);
        }
        Ok(items)
    }
}

impl<T, E: Writer<T>> Writer<[T]> for SeqCodec<E> {
    fn write<K: ByteSink>(&self, value: &[T], sink: &mut K) -> Result<(), WriteError> {
        write_all(&self.element, value, value.len(), sink)
    }
}

impl<T, E: Writer<T>> Writer<Vec<T>> for SeqCodec<E> {
    fn write<K: ByteSink>(&self, value: &Vec<T>, sink: &mut K) -> Result<(), WriteError> {
        write_all(&self.element, value, value.len(), sink)
    }
}

impl<T, E: Writer<T>> Writer<VecDeque<T>> for SeqCodec<E> {
    fn write<K: ByteSink>(&self, value: &VecDeque<T>, sink: &mut K) -> Result<(), WriteError> {
        write_all(&self.element, value, value.len(), sink)
    }
}

impl<T, E: Writer<T>> Writer<BTreeSet<T>> for SeqCodec<E> {
    fn write<K: ByteSink>(&self, value: &BTreeSet<T>, sink: &mut K) -> Result<(), WriteError> {
        write_all(&self.element, value, value.len(), sink)
    }
}

impl<T, H, E: Writer<T>> Writer<HashSet<T, H>> for SeqCodec<E> {
    fn write<K: ByteSink>(&self, value: &HashSet<T, H>, sink: &mut K) -> Result<(), WriteError> {
        write_all(&self.element, value, value.len(), sink)
    }
}

impl<T, E: Writer<T>> Writer<Arc<[T]>> for SeqCodec<E> {
    fn write<K: ByteSink>(&self, value: &Arc<[T]>, sink: &mut K) -> Result<(), WriteError> {
        write_all(&self.element, value.iter(), value.len(), sink)
    }
}

impl<T, E: Reader<T>> Reader<Vec<T>> for SeqCodec<E> {
    fn read<K: ByteSource>(&self, source: &mut K) -> Result<Vec<T>, ReadError> {
        self.read_vec(source)
    }
}

impl<T, E: Reader<T>> Reader<VecDeque<T>> for SeqCodec<E> {
    fn read<K: ByteSource>(&self, source: &mut K) -> Result<VecDeque<T>, ReadError> {
        self.read_vec(source).map(VecDeque::from)
    }
}

impl<T: Ord, E: Reader<T>> Reader<BTreeSet<T>> for SeqCodec<E> {
    fn read<K: ByteSource>(&self, source: &mut K) -> Result<BTreeSet<T>, ReadError> {
        let mut set = BTreeSet::new();
        self.read_each(source, |item| {
            set.insert(item);
        })?;
        Ok(set)
    }
}

impl<T, H, E> Reader<HashSet<T, H>> for SeqCodec<E>
where
    T: Eq + Hash,
    H: BuildHasher + Default,
    E: Reader<T>,
{
    fn read<K: ByteSource>(&self, source: &mut K) -> Result<HashSet<T, H>, ReadError> {
        let mut set = HashSet::with_hasher(H::default());
        self.read_each(source, |item| {
            set.insert(item);
        })?;
        Ok(set)
    }
}

impl<T, E: Reader<T>> Reader<Arc<[T]>> for SeqCodec<E> {
    fn read<K: ByteSource>(&self, source: &mut K) -> Result<Arc<[T]>, ReadError> {
        self.read_vec(source).map(Arc::from)
    }
}

impl<T: Ord, E: Reader<T>> Reader<Arc<BTreeSet<T>>> for SeqCodec<E> {
    fn read<K: ByteSource>(&self, source: &mut K) -> Result<Arc<BTreeSet<T>>, ReadError> {
        Reader::<BTreeSet<T>>::read(self, source).map(Arc::new)
    }
}

/// 由调用方描述构建过程的多元素读取器。
///
/// # 逻辑解析（How）
/// 1. 读取元素数 `n` 并按 [`DecodeLimits`] 校验；
/// 2. `supplier(min(n, 1024))` 创建累积器，参数仅作容量提示；
/// 3. 每读出一个元素调用一次 `accumulate`；
/// 4. 全部读完后 `finish` 把累积器转换成最终值。
///
/// # 使用示例
/// ```
/// use bitwire_core::{BufferKind, ByteBuffer, ByteOrder};
/// use bitwire_io::{MultiReader, PrimitiveCodec, Reader};
///
/// let mut wire = ByteBuffer::allocate(12, BufferKind::Heap);
/// for value in [2i32, 40, 2] {
///     wire.put(value, ByteOrder::BigEndian)?;
/// }
/// wire.flip();
///
/// let sum = MultiReader::new(
///     PrimitiveCodec::BIG_ENDIAN,
///     |_| 0i64,
///     |acc: &mut i64, item: i32| *acc += i64::from(item),
///     |acc: i64| acc,
/// );
/// assert_eq!(sum.read(&mut wire)?, 42);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct MultiReader<T, Acc, E, S, A, F> {
    element: E,
    limits: DecodeLimits,
    supplier: S,
    accumulate: A,
    finish: F,
    _marker: PhantomData<fn(T) -> Acc>,
}

impl<T, Acc, E, S, A, F> MultiReader<T, Acc, E, S, A, F>
where
    E: Reader<T>,
    S: Fn(usize) -> Acc,
    A: Fn(&mut Acc, T),
{
    pub fn new(element: E, supplier: S, accumulate: A, finish: F) -> Self {
        Self {
            element,
            limits: DecodeLimits::UNBOUNDED,
            supplier,
            accumulate,
            finish,
            _marker: PhantomData,
        }
    }

    pub fn with_limits(mut self, limits: DecodeLimits) -> Self {
        self.limits = limits;
        self
    }
}

impl<T, Acc, Out, E, S, A, F> Reader<Out> for MultiReader<T, Acc, E, S, A, F>
where
    E: Reader<T>,
    S: Fn(usize) -> Acc,
    A: Fn(&mut Acc, T),
    F: Fn(Acc) -> Out,
{
    fn read<K: ByteSource>(&self, source: &mut K) -> Result<Out, ReadError> {
        let count = read_element_count(source, &self.limits)?;
        let mut acc = (self.supplier)(count.min(PREALLOCATE_LIMIT));
        for _ in 0..count {
            let item = self.element.read(source)?;
            (self.accumulate)(&mut acc, item);
        }
        Ok((self.finish)(acc))
    }
}

impl<T, Acc, E: core::fmt::Debug, S, A, F> core::fmt::Debug for MultiReader<T, Acc, E, S, A, F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MultiReader")
            .field("element", &self.element)
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

/// 映射序列化器：4 字节大端条目数 + 逐条先键后值。
///
/// 单个 `(K, V)` 二元组也可直接读写，即不带计数的一条映射条目。
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct MapCodec<KC, VC> {
    key: KC,
    value: VC,
    limits: DecodeLimits,
}

impl<KC, VC> MapCodec<KC, VC> {
    pub const fn new(key: KC, value: VC) -> Self {
        Self {
            key,
            value,
            limits: DecodeLimits::UNBOUNDED,
        }
    }

    pub fn with_limits(mut self, limits: DecodeLimits) -> Self {
        self.limits = limits;
        self
    }

    fn write_entries<'a, K, V, S, I>(
        &self,
        sink: &mut S,
        count: usize,
        entries: I,
    ) -> Result<(), WriteError>
    where
        K: 'a,
        V: 'a,
        KC: Writer<K>,
        VC: Writer<V>,
        S: ByteSink,
        I: IntoIterator<Item = (&'a K, &'a V)>,
    {
        write_count(sink, count, COUNT_WHAT)?;
        for (key, value) in entries {
            self.key.write(key, sink)?;
            self.value.write(value, sink)?;
        }
        Ok(())
    }

    fn read_entries<K, V, S, P>(&self, source: &mut S, mut insert: P) -> Result<(), ReadError>
    where
        KC: Reader<K>,
        VC: Reader<V>,
        S: ByteSource,
        P: FnMut(K, V),
    {
        let count = read_element_count(source, &self.limits)?;
        for _ in 0..count {
            let key = self.key.read(source)?;
            let value = self.value.read(source)?;
            insert(key, value);
        }
        Ok(())
    }
}

impl<K, V, KC: Writer<K>, VC: Writer<V>> Writer<(K, V)> for MapCodec<KC, VC> {
    fn write<S: ByteSink>(&self, entry: &(K, V), sink: &mut S) -> Result<(), WriteError> {
        self.key.write(&entry.0, sink)?;
        self.value.write(&entry.1, sink)
    }
}

impl<K, V, KC: Reader<K>, VC: Reader<V>> Reader<(K, V)> for MapCodec<KC, VC> {
    fn read<S: ByteSource>(&self, source: &mut S) -> Result<(K, V), ReadError> {
        let key = self.key.read(source)?;
        let value = self.value.read(source)?;
        Ok((key, value))
    }
}

impl<K, V, KC: Writer<K>, VC: Writer<V>> Writer<BTreeMap<K, V>> for MapCodec<KC, VC> {
    fn write<S: ByteSink>(&self, map: &BTreeMap<K, V>, sink: &mut S) -> Result<(), WriteError> {
        self.write_entries(sink, map.len(), map)
    }
}

impl<K, V, H, KC: Writer<K>, VC: Writer<V>> Writer<HashMap<K, V, H>> for MapCodec<KC, VC> {
    fn write<S: ByteSink>(&self, map: &HashMap<K, V, H>, sink: &mut S) -> Result<(), WriteError> {
        self.write_entries(sink, map.len(), map)
    }
}

impl<K: Ord, V, KC: Reader<K>, VC: Reader<V>> Reader<BTreeMap<K, V>> for MapCodec<KC, VC> {
    fn read<S: ByteSource>(&self, source: &mut S) -> Result<BTreeMap<K, V>, ReadError> {
        let mut map = BTreeMap::new();
        self.read_entries(source, |key, value| {
            map.insert(key, value);
        })?;
        Ok(map)
    }
}

impl<K, V, H, KC, VC> Reader<HashMap<K, V, H>> for MapCodec<KC, VC>
where
    K: Eq + Hash,
    H: BuildHasher + Default,
    KC: Reader<K>,
    VC: Reader<V>,
{
    fn read<S: ByteSource>(&self, source: &mut S) -> Result<HashMap<K, V, H>, ReadError> {
        let mut map = HashMap::with_hasher(H::default());
        self.read_entries(source, |key, value| {
            map.insert(key, value);
        })?;
        Ok(map)
    }
}

impl<K: Ord, V, KC: Reader<K>, VC: Reader<V>> Reader<Arc<BTreeMap<K, V>>> for MapCodec<KC, VC> {
    fn read<S: ByteSource>(&self, source: &mut S) -> Result<Arc<BTreeMap<K, V>>, ReadError> {
        Reader::<BTreeMap<K, V>>::read(self, source).map(Arc::new)
    }
}

#[cfg(test)]
mod tests {
    use bitwire_core::{BufferKind, ByteBuffer, ByteOrder};

    use super::*;
    use crate::{
        serial::{BoolCodec, FALSE_BYTE, PrimitiveCodec, StringCodec},
        stream::Stream,
    };

    fn wire_of<T: ?Sized, W: Writer<T>>(codec: &W, value: &T) -> Vec<u8> {
        let mut out = Stream::new(Vec::new());
        codec.write(value, &mut out).expect("写入集合");
        out.into_inner()
    }

    #[test]
    fn empty_sequence_is_a_zero_count() {
        let codec = SeqCodec::new(StringCodec::utf8());
        assert_eq!(wire_of(&codec, &Vec::<String>::new()), [0, 0, 0, 0]);
        let back: Vec<String> = codec.read(&mut Stream::new(&[0u8; 4][..])).expect("读空序列");
        assert!(back.is_empty());
    }

    #[test]
    fn strings_round_trip_in_order() {
        let codec = SeqCodec::new(StringCodec::utf8());
        let words = vec!["甲".to_owned(), String::new(), "bit".to_owned()];
        let wire = wire_of(&codec, &words);
        assert_eq!(&wire[..4], &[0, 0, 0, 3]);

        let back: VecDeque<String> = codec.read(&mut Stream::new(&wire[..])).expect("读回");
        assert_eq!(back, VecDeque::from(words.clone()));
        let frozen: Arc<[String]> = codec.read(&mut Stream::new(&wire[..])).expect("读回");
        assert_eq!(&frozen[..], &words[..]);
    }

    #[test]
    fn sets_collapse_duplicates() {
        let codec = SeqCodec::new(PrimitiveCodec::LITTLE_ENDIAN);
        let wire = wire_of(&codec, &[3u16, 1, 3][..]);
        let set: BTreeSet<u16> = codec.read(&mut Stream::new(&wire[..])).expect("读集合");
        assert_eq!(set.into_iter().collect::<Vec<_>>(), [1, 3]);
        let hashed: HashSet<u16> = codec.read(&mut Stream::new(&wire[..])).expect("读集合");
        assert_eq!(hashed.len(), 2);
        let frozen: Arc<BTreeSet<u16>> = codec.read(&mut Stream::new(&wire[..])).expect("读集合");
        assert!(frozen.contains(&1));
    }

    #[test]
    fn negative_count_is_rejected() {
        let mut buf = ByteBuffer::allocate(4, BufferKind::Heap);
        buf.put_at(0, -3i32, ByteOrder::BigEndian).expect("写入负计数");
        let err = Reader::<Vec<bool>>::read(&SeqCodec::new(BoolCodec), &mut buf)
            .expect_err("负计数非法");
        assert_eq!(
            err.to_string(),
            "decode failed: received negative size for reading multiple elements"
        );
    }

    /// 声明的元素数很大时不会预先分配对应内存，读到输入结束即失败。
    #[test]
    fn huge_declared_count_fails_at_end_of_input() {
        let mut buf = ByteBuffer::allocate(5, BufferKind::Heap);
        buf.put(i32::MAX, ByteOrder::BigEndian).expect("写入计数");
        buf.put(FALSE_BYTE, ByteOrder::BigEndian).expect("写入元素");
        buf.flip();
        let err = Reader::<Vec<bool>>::read(&SeqCodec::new(BoolCodec), &mut buf)
            .expect_err("输入不足");
        assert!(matches!(err, ReadError::EndOfStream));
    }

    #[test]
    fn element_limit_applies_before_reading() {
        let codec = SeqCodec::new(BoolCodec).with_limits(DecodeLimits {
            max_elements: 1,
            ..DecodeLimits::UNBOUNDED
        });
        let wire = wire_of(&codec, &vec![true, false]);
        let err = Reader::<Vec<bool>>::read(&codec, &mut Stream::new(&wire[..]))
            .expect_err("超过元素上限");
        assert!(matches!(
            err,
            ReadError::LimitExceeded { declared: 2, max: 1, .. }
        ));
    }

    #[test]
    fn multi_reader_builds_custom_containers() {
        let codec = SeqCodec::new(StringCodec::utf8());
        let wire = wire_of(&codec, &vec!["ab".to_owned(), "cde".to_owned()]);
        let joined = MultiReader::new(
            StringCodec::utf8(),
            String::with_capacity,
            |acc: &mut String, item: String| acc.push_str(&item),
            |acc: String| acc.len(),
        );
        let len: usize = joined.read(&mut Stream::new(&wire[..])).expect("自定义容器");
        assert_eq!(len, 5);
    }

    #[test]
    fn maps_write_key_then_value() {
        let codec = MapCodec::new(StringCodec::utf8(), PrimitiveCodec::BIG_ENDIAN);
        let map = BTreeMap::from([("k".to_owned(), 7i32)]);
        let wire = wire_of(&codec, &map);
        assert_eq!(wire, [0, 0, 0, 1, 0, 0, 0, 1, b'k', 0, 0, 0, 7]);

        let back: HashMap<String, i32> = codec.read(&mut Stream::new(&wire[..])).expect("读映射");
        assert_eq!(back.get("k"), Some(&7));
        let frozen: Arc<BTreeMap<String, i32>> =
            codec.read(&mut Stream::new(&wire[..])).expect("读映射");
        assert_eq!(*frozen, map);

        let entry: (String, i32) = codec.read(&mut Stream::new(&wire[4..])).expect("读条目");
        assert_eq!(entry, ("k".to_owned(), 7));
    }
}
