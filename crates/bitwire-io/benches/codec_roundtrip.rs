use bitwire_core::{BufferKind, ByteBuffer};
use bitwire_io::{
    BoolCodec, LengthPrefixed, PositionedBuffer, PrimitiveCodec, Reader, SeqCodec, Stream,
    StringCodec, Writer,
};
use criterion::{Criterion, black_box};
use std::{env, time::Duration};

/// 字符串序列经由内存缓冲的往返成本。
///
/// # 逻辑解析（How）
/// - 每轮把 64 个短字符串写入预分配的缓冲，翻转后逐个读回；
/// - 缓冲在轮次之间复用，测量只覆盖序列化器与传输本身。
fn bench_string_seq(c: &mut Criterion) {
    let codec = SeqCodec::new(StringCodec::utf8());
    let words: Vec<String> = (0..64).map(|i| format!("field-{i:04}")).collect();
    let mut buf = ByteBuffer::allocate(4096, BufferKind::Heap);

    c.bench_function("string_seq_roundtrip", |b| {
        b.iter(|| {
            buf.clear();
            codec.write(&words, &mut buf).expect("写入字符串序列");
            buf.flip();
            let back: Vec<String> = codec.read(&mut buf).expect("读回字符串序列");
            black_box(back)
        });
    });
}

/// 定长原语在绝对偏移处的读写成本。
fn bench_positioned_primitives(c: &mut Criterion) {
    let mut buf = ByteBuffer::allocate(1024, BufferKind::Direct);

    c.bench_function("positioned_i64_roundtrip", |b| {
        b.iter(|| {
            let mut at = PositionedBuffer::new(&mut buf, 0);
            for value in 0..128i64 {
                PrimitiveCodec::LITTLE_ENDIAN
                    .write(&value, &mut at)
                    .expect("写入 i64");
            }
            at.seek(0);
            let mut sum = 0i64;
            for _ in 0..128 {
                let value: i64 = PrimitiveCodec::LITTLE_ENDIAN.read(&mut at).expect("读回 i64");
                sum += value;
            }
            black_box(sum)
        });
    });
}

/// 经由 `Stream` 写出长度前缀块与布尔序列的成本。
fn bench_stream_blocks(c: &mut Criterion) {
    let payload = vec![0xA5u8; 1024];
    let flags = vec![true; 256];
    let blocks = LengthPrefixed::new(BufferKind::Heap);
    let bools = SeqCodec::new(BoolCodec);

    c.bench_function("stream_block_write", |b| {
        b.iter(|| {
            let mut out = Stream::new(Vec::with_capacity(2048));
            blocks.write(&payload, &mut out).expect("写入字节块");
            bools.write(&flags, &mut out).expect("写入布尔序列");
            black_box(out.into_inner())
        });
    });
}

fn main() {
    let mut quick_mode = false;
    for arg in env::args().skip(1) {
        if arg == "--quick" {
            quick_mode = true;
        }
    }

    let mut criterion = Criterion::default();
    if quick_mode {
        criterion = criterion
            .sample_size(10)
            .warm_up_time(Duration::from_millis(100))
            .measurement_time(Duration::from_millis(250));
    }

    bench_string_seq(&mut criterion);
    bench_positioned_primitives(&mut criterion);
    bench_stream_blocks(&mut criterion);
    criterion.final_summary();
}
