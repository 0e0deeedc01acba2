//! 编码器与值解码器的性质测试。
//!
//! - **核心目标 (Why)**：编码器产出的任意值都必须能被解码器原样还原，且编码结果确定；
//! - **结构说明 (How)**：`proptest` 递归生成列表、映射、同构数组与描述类型，分片后交给 `ValueHandler`；
//! - **合同与边界 (What)**：浮点数只取有限值，避免 `NaN` 破坏相等比较。

use proptest::prelude::*;
use spark_buffer::{BufferPool, ViewChain};
use spark_codec_amqp::{
    AmqpMap, AmqpTypeRegistry, Binary, DecoderConfig, Descriptor, Symbol, Value, encode_to_vec,
};

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Boolean),
        any::<u8>().prop_map(Value::Ubyte),
        any::<u16>().prop_map(Value::Ushort),
        any::<u32>().prop_map(Value::Uint),
        any::<u64>().prop_map(Value::Ulong),
        any::<i8>().prop_map(Value::Byte),
        any::<i16>().prop_map(Value::Short),
        any::<i32>().prop_map(Value::Int),
        any::<i64>().prop_map(Value::Long),
        (-1.0e6f64..1.0e6).prop_map(Value::Double),
        any::<char>().prop_map(Value::Char),
        any::<i64>().prop_map(Value::Timestamp),
        any::<[u8; 16]>().prop_map(Value::Uuid),
        proptest::collection::vec(any::<u8>(), 0..300).prop_map(|b| Value::Binary(Binary::from(b))),
        ".{0,40}".prop_map(Value::String),
        "[a-z:\\-]{0,20}".prop_map(|s| Value::Symbol(Symbol::from(s))),
    ]
}

fn value() -> impl Strategy<Value = Value> {
    scalar().prop_recursive(4, 64, 8, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..8).prop_map(Value::List),
            proptest::collection::vec((inner.clone(), inner.clone()), 0..6)
                .prop_map(|entries| Value::Map(entries.into_iter().collect::<AmqpMap>())),
            proptest::collection::vec(any::<i32>(), 0..8)
                .prop_map(|ints| Value::Array(ints.into_iter().map(Value::Int).collect())),
            inner.prop_map(|value| Value::described(Descriptor::code(0x77), value)),
        ]
    })
}

fn decode(parts: Vec<Vec<u8>>) -> Value {
    let pool = BufferPool::new();
    let registry = AmqpTypeRegistry::standard();
    let config = DecoderConfig::default();
    let handler = registry.value_handler(&config);
    let mut chain = ViewChain::new(
        parts
            .iter()
            .map(|part| pool.wrap(part).expect("分配分片失败"))
            .collect(),
    );
    let value = handler.read_value(&mut chain).expect("编码器产出必须可解码");
    assert_eq!(chain.remaining(), 0, "解码必须恰好消费全部字节");
    value
}

proptest! {
    #[test]
    fn encoded_values_decode_back(value in value(), cut in any::<prop::sample::Index>()) {
        let bytes = encode_to_vec(&value).expect("生成的值必须可编码");
        let split = cut.index(bytes.len() + 1);
        let (head, tail) = bytes.split_at(split);
        let decoded = decode(vec![head.to_vec(), tail.to_vec()]);
        prop_assert_eq!(&decoded, &value);
        prop_assert_eq!(encode_to_vec(&decoded).expect("重编码失败"), bytes);
    }
}
