//! 时间点与时长序列化器。
//!
//! - 时间点：8 字节大端纪元秒（可为负）+ 4 字节大端纳秒，纳秒总在 `[0, 1e9)`；
//! - 时长：8 字节大端纳秒，读取时必须非负。

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bitwire_core::ByteOrder;

use super::{Reader, Writer};
use crate::{
    error::{ReadError, WriteError},
    transport::{ByteSink, ByteSource},
};

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// `SystemTime` 序列化器。
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct InstantCodec;

impl InstantCodec {
    /// 拆分为相对纪元的（秒，纳秒），秒向负无穷取整。
    fn split(time: &SystemTime) -> Result<(i64, i32), WriteError> {
        let out_of_range = || WriteError::encode("instant seconds exceed the 64-bit range");
        match time.duration_since(UNIX_EPOCH) {
            Ok(after) => {
                let secs = i64::try_from(after.as_secs()).map_err(|_| out_of_range())?;
                Ok((secs, after.subsec_nanos() as i32))
            }
            Err(before) => {
                let before = before.duration();
                let secs = i64::try_from(before.as_secs()).map_err(|_| out_of_range())?;
                match before.subsec_nanos() {
                    0 => Ok((-secs, 0)),
                    nanos => {
                        let secs = (-secs).checked_sub(1).ok_or_else(out_of_range)?;
                        Ok((secs, (NANOS_PER_SEC - i64::from(nanos)) as i32))
                    }
                }
            }
        }
    }

    /// 由（秒，纳秒）还原，纳秒超出 `[0, 1e9)` 时先进位到秒。
    fn join(secs: i64, nanos: i32) -> Option<SystemTime> {
        let secs = secs.checked_add(i64::from(nanos).div_euclid(NANOS_PER_SEC))?;
        let nanos = i64::from(nanos).rem_euclid(NANOS_PER_SEC) as u64;
        let whole = if secs >= 0 {
            UNIX_EPOCH.checked_add(Duration::from_secs(secs.unsigned_abs()))?
        } else {
            UNIX_EPOCH.checked_sub(Duration::from_secs(secs.unsigned_abs()))?
        };
        whole.checked_add(Duration::from_nanos(nanos))
    }
}

impl Writer<SystemTime> for InstantCodec {
    fn write<K: ByteSink>(&self, value: &SystemTime, sink: &mut K) -> Result<(), WriteError> {
        let (secs, nanos) = Self::split(value)?;
        sink.write_value(secs, ByteOrder::BigEndian)?;
        sink.write_value(nanos, ByteOrder::BigEndian)
    }
}

impl Reader<SystemTime> for InstantCodec {
    fn read<K: ByteSource>(&self, source: &mut K) -> Result<SystemTime, ReadError> {
        let secs: i64 = source.read_value(ByteOrder::BigEndian)?;
        let nanos: i32 = source.read_value(ByteOrder::BigEndian)?;
        Self::join(secs, nanos).ok_or_else(|| {
            ReadError::decode(format!(
                "read instant is not representable: {secs}s {nanos}ns"
            ))
        })
    }
}

/// `Duration` 序列化器。
///
/// 写入超过 `i64::MAX` 纳秒（约 292 年）的时长返回编码错误。
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct DurationCodec;

impl Writer<Duration> for DurationCodec {
    fn write<K: ByteSink>(&self, value: &Duration, sink: &mut K) -> Result<(), WriteError> {
        let nanos = i64::try_from(value.as_nanos()).map_err(|_| {
            WriteError::encode(format!("duration {value:?} exceeds 64-bit nanoseconds"))
        })?;
        sink.write_value(nanos, ByteOrder::BigEndian)
    }
}

impl Reader<Duration> for DurationCodec {
    fn read<K: ByteSource>(&self, source: &mut K) -> Result<Duration, ReadError> {
        let nanos: i64 = source.read_value(ByteOrder::BigEndian)?;
        u64::try_from(nanos)
            .map(Duration::from_nanos)
            .map_err(|_| {
                ReadError::decode(format!(
                    "read invalid negative nanosecond duration: {nanos}"
                ))
            })
    }
}
