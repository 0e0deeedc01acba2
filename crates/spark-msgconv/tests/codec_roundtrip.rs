//! mime 内容编解码器的往返性质测试。
//!
//! # 教案级注释概览
//! - **核心目标 (Why)**：对 JMS 兼容的列表/映射，`decode(encode(v)) == v` 对 JMS 与 AMQP 两套编解码器都成立；
//!   对象流对字符串、字节与任意 AMQP 值同样成立；
//! - **结构说明 (How)**：`proptest` 生成值，浮点限定在有限范围内以保证相等性可比较；
//! - **合同与边界 (What)**：编码后的内容被完整消费，没有尾随字节。

use proptest::prelude::*;
use spark_buffer::ViewChain;
use spark_codec_amqp::{AmqpMap, Binary, Symbol, Value};
use spark_msgconv::{
    ConversionContext,
    content::{AMQP_LIST, AMQP_MAP, JMS_MAP, JMS_STREAM, MimeContentCodec, OBJECT_STREAM},
};

fn round_trip(codec: &dyn MimeContentCodec, value: &Value) -> Value {
    let ctx = ConversionContext::default();
    let bytes = codec.encode_to_bytes(value).expect("可编码");
    let mut chain = if bytes.is_empty() {
        ViewChain::new(Vec::new())
    } else {
        ViewChain::from_view(ctx.pool().wrap(&bytes).expect("分配失败"))
    };
    codec
        .decode(&mut chain, &ctx.value_handler())
        .expect("编码产物必须可解码")
}

fn jms_primitive() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Boolean),
        any::<i8>().prop_map(Value::Byte),
        any::<i16>().prop_map(Value::Short),
        any::<i32>().prop_map(Value::Int),
        any::<i64>().prop_map(Value::Long),
        (-1.0e6f32..1.0e6f32).prop_map(Value::Float),
        (-1.0e12f64..1.0e12f64).prop_map(Value::Double),
        proptest::char::range('\u{20}', '\u{d7ff}').prop_map(Value::Char),
        "[a-zA-Z0-9 _é]{0,16}".prop_map(Value::String),
        proptest::collection::vec(any::<u8>(), 0..32).prop_map(|b| Value::Binary(Binary::from(b))),
    ]
}

fn string_keyed(values: Vec<(String, Value)>) -> AmqpMap {
    let mut map = AmqpMap::new();
    for (key, value) in values {
        map.insert(key, value);
    }
    map
}

fn amqp_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        jms_primitive(),
        any::<u64>().prop_map(Value::Ulong),
        any::<u32>().prop_map(Value::Uint),
        any::<i64>().prop_map(Value::Timestamp),
        any::<[u8; 16]>().prop_map(Value::Uuid),
        "[a-z:.-]{1,12}".prop_map(|s| Value::Symbol(Symbol::from(s))),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..4).prop_map(Value::List),
            proptest::collection::vec(("[a-z]{1,6}", inner), 0..4)
                .prop_map(|entries| Value::Map(string_keyed(entries))),
        ]
    })
}

proptest! {
    #[test]
    fn jms_stream_round_trips(items in proptest::collection::vec(jms_primitive(), 0..12)) {
        let value = Value::List(items);
        prop_assert_eq!(round_trip(&JMS_STREAM, &value), value);
    }

    #[test]
    fn jms_map_round_trips(entries in proptest::collection::vec(("[a-z]{1,8}", jms_primitive()), 0..8)) {
        let value = Value::Map(string_keyed(entries));
        prop_assert_eq!(round_trip(&JMS_MAP, &value), value);
    }

    #[test]
    fn amqp_list_round_trips(items in proptest::collection::vec(amqp_value(), 0..6)) {
        let value = Value::List(items);
        prop_assert!(AMQP_LIST.accepts(&value));
        prop_assert_eq!(round_trip(&AMQP_LIST, &value), value);
    }

    #[test]
    fn amqp_map_round_trips(entries in proptest::collection::vec(("[a-z]{1,8}", amqp_value()), 0..6)) {
        let value = Value::Map(string_keyed(entries));
        prop_assert_eq!(round_trip(&AMQP_MAP, &value), value);
    }

    #[test]
    fn object_stream_round_trips_strings(text in any::<String>()) {
        let value = Value::String(text);
        prop_assert_eq!(round_trip(&OBJECT_STREAM, &value), value);
    }

    #[test]
    fn object_stream_round_trips_values(value in amqp_value()) {
        prop_assert_eq!(round_trip(&OBJECT_STREAM, &value), value);
    }
}
