//! 长度前缀字符串序列化器。

use bitwire_core::DecodeLimits;

use super::{Reader, Writer, read_declared, read_length, write_count};
use crate::{
    error::{ReadError, WriteError},
    transport::{ByteSink, ByteSource},
};

/// 字符串在线路上的字符集。
///
/// # 契约说明（What）
/// - 编码时无法映射的字符替换为 `?`；
/// - 解码时非法字节序列替换为 U+FFFD，不会因此失败。
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Charset {
    #[default]
    Utf8,
    /// ISO-8859-1：每个字节即一个 `U+0000..=U+00FF` 字符。
    Latin1,
    /// 7 位 US-ASCII。
    Ascii,
}

impl Charset {
    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            Self::Utf8 => text.as_bytes().to_vec(),
            Self::Latin1 => text
                .chars()
                .map(|ch| u8::try_from(u32::from(ch)).unwrap_or(b'?'))
                .collect(),
            Self::Ascii => text
                .chars()
                .map(|ch| if ch.is_ascii() { ch as u8 } else { b'?' })
                .collect(),
        }
    }

    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Self::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Self::Latin1 => bytes.iter().map(|b| char::from(*b)).collect(),
            Self::Ascii => bytes
                .iter()
                .map(|b| {
                    if b.is_ascii() {
                        char::from(*b)
                    } else {
                        char::REPLACEMENT_CHARACTER
                    }
                })
                .collect(),
        }
    }
}

/// 字符串序列化器：4 字节大端字节数 + 按字符集编码的字节。
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct StringCodec {
    charset: Charset,
    limits: DecodeLimits,
}

impl StringCodec {
    pub const fn new(charset: Charset) -> Self {
        Self {
            charset,
            limits: DecodeLimits::UNBOUNDED,
        }
    }

    pub const fn utf8() -> Self {
        Self::new(Charset::Utf8)
    }

    /// 读取时对声明长度施加上限。
    pub fn with_limits(mut self, limits: DecodeLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn charset(&self) -> Charset {
        self.charset
    }
}

impl Writer<str> for StringCodec {
    fn write<K: ByteSink>(&self, value: &str, sink: &mut K) -> Result<(), WriteError> {
        let encoded = match self.charset {
            Charset::Utf8 => std::borrow::Cow::Borrowed(value.as_bytes()),
            other => std::borrow::Cow::Owned(other.encode(value)),
        };
        write_count(sink, encoded.len(), "string length")?;
        sink.write_all_from(&encoded)
    }
}

impl Writer<String> for StringCodec {
    fn write<K: ByteSink>(&self, value: &String, sink: &mut K) -> Result<(), WriteError> {
        Writer::<str>::write(self, value.as_str(), sink)
    }
}

impl Reader<String> for StringCodec {
    fn read<K: ByteSource>(&self, source: &mut K) -> Result<String, ReadError> {
        let len = read_length(source, &self.limits)?;
        let raw = read_declared(source, len)?;
        Ok(match self.charset {
            Charset::Utf8 => String::from_utf8(raw)
                .unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned()),
            other => other.decode(&raw),
        })
    }
}

#[cfg(test)]
mod tests {
    use bitwire_core::{BufferKind, ByteBuffer, ByteOrder};

    use super::*;
    use crate::stream::Stream;

    #[test]
    fn empty_string_is_just_a_zero_prefix() {
        let mut out = Stream::new(Vec::new());
        StringCodec::utf8().write("", &mut out).expect("写空串");
        assert_eq!(out.get_ref(), &[0, 0, 0, 0]);
    }

    #[test]
    fn charsets_replace_unmappable_characters() {
        assert_eq!(Charset::Latin1.encode("é€"), [0xE9, b'?']);
        assert_eq!(Charset::Ascii.encode("aé"), [b'a', b'?']);
        assert_eq!(Charset::Latin1.decode(&[0xE9]), "é");
        assert_eq!(Charset::Ascii.decode(&[b'o', 0xFF]), "o\u{FFFD}");
        assert_eq!(Charset::Utf8.decode(&[0xF0, 0x28]), "\u{FFFD}(");
    }

    #[test]
    fn negative_length_is_rejected() {
        let mut buf = ByteBuffer::allocate(4, BufferKind::Heap);
        buf.put_at(0, -1i32, ByteOrder::BigEndian).expect("写入负长度");
        let err = StringCodec::utf8().read(&mut buf).expect_err("负长度非法");
        assert_eq!(err.to_string(), "decode failed: read invalid negative length");
    }

    #[test]
    fn oversized_declaration_fails_at_end_of_input() {
        let wire = [0x7F, 0xFF, 0xFF, 0xFF, b'h', b'i'];
        assert!(matches!(
            StringCodec::utf8().read(&mut Stream::new(&wire[..])),
            Err(ReadError::EndOfStream)
        ));
    }

    #[test]
    fn limits_reject_before_allocation() {
        let mut buf = ByteBuffer::allocate(4, BufferKind::Heap);
        buf.put_at(0, i32::MAX, ByteOrder::BigEndian).expect("写入巨大长度");
        let codec = StringCodec::utf8().with_limits(DecodeLimits {
            max_length: 64,
            ..DecodeLimits::UNBOUNDED
        });
        assert!(matches!(
            codec.read(&mut buf),
            Err(ReadError::LimitExceeded { declared, max: 64, .. }) if declared == i32::MAX as usize
        ));
    }
}
