use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use spark_buffer::BufferPool;
use spark_codec_amqp::{
    AmqpMap, AmqpTypeRegistry, Binary, DecoderConfig, Header, Properties, SectionValue, Symbol,
    Value,
};

/// 构造一条典型消息：header + 注解 + 属性 + 应用属性 + 4 KiB data 消息体。
fn sample_message(pool: &BufferPool) -> Vec<u8> {
    let mut annotations = AmqpMap::new();
    annotations.insert(Symbol::from("x-opt-jms-msg-type"), 3u8);
    let mut application = AmqpMap::new();
    for i in 0..8 {
        application.insert(format!("key-{i}"), i64::from(i) * 1_000);
    }
    let sections = [
        SectionValue::Header(Header {
            durable: Some(true),
            ..Header::default()
        }),
        SectionValue::MessageAnnotations(annotations),
        SectionValue::Properties(Properties {
            message_id: Some(Value::from("id-1")),
            content_type: Some(Symbol::from("application/octet-stream")),
            ..Properties::default()
        }),
        SectionValue::ApplicationProperties(application),
        SectionValue::Data(Binary::from(vec![0x5a; 4096])),
    ];
    let mut wire = Vec::new();
    for section in sections {
        let section = section.into_section(pool).expect("编码失败");
        wire.extend(section.encoded().to_vec().expect("读取失败"));
    }
    wire
}

/// 度量节区解码的端到端开销（含池化复制与原始字节保留）。
///
/// # 执行逻辑（How）
/// - 单片输入走 `read_contiguous` 快路径；
/// - 对半切分的输入覆盖跨分片复制路径，两者对比可看出分片成本。
fn bench_section_decode(c: &mut Criterion) {
    let pool = BufferPool::new();
    let registry = AmqpTypeRegistry::standard();
    let config = DecoderConfig::default();
    let decoder = registry.section_decoder(&config);
    let wire = sample_message(&pool);

    c.bench_function("section_decode/contiguous", |b| {
        b.iter(|| {
            let message = decoder
                .decode_bytes(&pool, black_box(&wire))
                .expect("解码失败");
            black_box(message.body_kind())
        })
    });

    let (head, tail) = wire.split_at(wire.len() / 2);
    c.bench_function("section_decode/fragmented", |b| {
        b.iter(|| {
            let views = vec![
                pool.wrap(black_box(head)).expect("分配失败"),
                pool.wrap(black_box(tail)).expect("分配失败"),
            ];
            let message = decoder.decode(views).expect("解码失败");
            black_box(message.encoded_len())
        })
    });
}

criterion_group!(codec_benches, bench_section_decode);
criterion_main!(codec_benches);
