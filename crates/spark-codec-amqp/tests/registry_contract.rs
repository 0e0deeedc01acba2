//! 描述类型注册表与值处理器的契约测试。

use std::sync::Arc;

use spark_buffer::{BufferPool, ViewChain};
use spark_codec_amqp::{
    AmqpTypeRegistry, CodecError, DecoderConfig, Descriptor, Value,
    constructor::DescribedTypeConstructor,
};

fn read(
    registry: &AmqpTypeRegistry,
    config: &DecoderConfig,
    bytes: &[u8],
) -> Result<Value, CodecError> {
    let pool = BufferPool::new();
    let mut chain = ViewChain::from_view(pool.wrap(bytes).expect("分配失败"));
    registry.value_handler(config).read_value(&mut chain)
}

#[test]
fn both_aliases_yield_identical_values() {
    let registry = AmqpTypeRegistry::standard();
    let config = DecoderConfig::default();
    // accepted 投递状态：ulong 别名与 symbol 别名
    let numeric = read(&registry, &config, &[0x00, 0x53, 0x24, 0x45]).expect("数值别名");
    let mut symbolic_wire = vec![0x00, 0xa3, 0x12];
    symbolic_wire.extend_from_slice(b"amqp:accepted:list");
    symbolic_wire.push(0x45);
    let symbolic = read(&registry, &config, &symbolic_wire).expect("符号别名");
    assert_eq!(numeric, symbolic);
    assert_eq!(numeric.descriptor(), Some(&Descriptor::code(0x24)));
}

#[test]
fn shape_mismatch_is_decode_error() {
    let registry = AmqpTypeRegistry::standard();
    let config = DecoderConfig::default();
    // data 节区要求 binary，这里给出 string
    let err = read(&registry, &config, &[0x00, 0x53, 0x75, 0xa1, 0x00]).expect_err("应失败");
    assert!(matches!(err, CodecError::Decode(_)));
}

#[test]
fn array_count_is_bounded_by_content_bytes() {
    let registry = AmqpTypeRegistry::standard();
    let config = DecoderConfig::default();
    let cases: &[&[u8]] = &[
        // array32：size 5，count 10_000_000，元素构造器 null
        &[0xf0, 0x00, 0x00, 0x00, 0x05, 0x00, 0x98, 0x96, 0x80, 0x40],
        // array32：count 0x7fffffff，元素构造器 true
        &[0xf0, 0x00, 0x00, 0x00, 0x05, 0x7f, 0xff, 0xff, 0xff, 0x41],
        // array8：size 2，count 3，元素构造器 uint0
        &[0xe0, 0x02, 0x03, 0x43],
    ];
    for wire in cases {
        let err = read(&registry, &config, wire).expect_err("元素数超出内容应失败");
        assert!(
            matches!(&err, CodecError::Decode(message) if message.contains("cannot fit")),
            "{err:?}"
        );
    }

    // 单个零宽元素恰好占满内容
    let single = read(&registry, &config, &[0xe0, 0x02, 0x01, 0x40]).expect("合法数组");
    assert_eq!(single, Value::Array(vec![Value::Null]));
}

#[test]
fn descriptor_must_be_symbol_or_ulong() {
    let registry = AmqpTypeRegistry::standard();
    let config = DecoderConfig::default();
    let err = read(&registry, &config, &[0x00, 0xa1, 0x01, b'x', 0x40]).expect_err("应失败");
    assert!(matches!(err, CodecError::Decode(_)));
}

#[test]
fn unknown_descriptor_can_be_kept_opaque() {
    let registry = AmqpTypeRegistry::new();
    let strict = DecoderConfig::default();
    let wire = [0x00, 0x53, 0x99, 0x54, 0x01];
    assert_eq!(
        read(&registry, &strict, &wire).expect_err("默认配置应失败"),
        CodecError::UnknownDescriptor(Descriptor::code(0x99))
    );

    let lenient = DecoderConfig {
        allow_unknown_descriptors: true,
        ..DecoderConfig::default()
    };
    assert_eq!(
        read(&registry, &lenient, &wire).expect("宽松配置应保留"),
        Value::described(Descriptor::code(0x99), Value::Int(1))
    );
}

#[test]
fn nesting_depth_is_bounded() {
    let registry = AmqpTypeRegistry::new();
    let config = DecoderConfig {
        max_nesting_depth: 3,
        ..DecoderConfig::default()
    };
    // 四层嵌套 list：c0 size 01 ...
    let wire = [
        0xc0, 0x0b, 0x01, 0xc0, 0x08, 0x01, 0xc0, 0x05, 0x01, 0xc0, 0x02, 0x01, 0x45,
    ];
    let err = read(&registry, &config, &wire).expect_err("超出深度应失败");
    assert!(matches!(err, CodecError::Decode(message) if message.contains("nesting")));
}

struct Upper;

impl DescribedTypeConstructor for Upper {
    fn name(&self) -> &str {
        "example:upper"
    }

    fn construct_from(&self, descriptor: Descriptor, value: Value) -> Result<Value, CodecError> {
        match value {
            Value::String(text) => Ok(Value::String(text.to_uppercase())),
            other => Ok(Value::described(descriptor, other)),
        }
    }
}

#[test]
fn custom_constructor_applies_to_array_elements() {
    let mut registry = AmqpTypeRegistry::new();
    registry.register_value([Descriptor::code(0x0001_0000_0001)], Arc::new(Upper));
    let config = DecoderConfig::default();
    // array8: 描述元素构造器 + str8，两项 "a"、"b"
    let wire = [
        0xe0, 0x10, 0x02, 0x00, 0x80, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0xa1, 0x01,
        b'a', 0x01, b'b',
    ];
    let value = read(&registry, &config, &wire).expect("数组应解码");
    assert_eq!(
        value,
        Value::Array(vec![Value::from("A"), Value::from("B")])
    );
}
