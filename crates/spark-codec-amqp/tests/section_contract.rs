//! 节区解码契约测试。
//!
//! # 教案级注释概览
//! - **核心目标 (Why)**：锁定节区状态机对顺序、重复与消息体互斥的判定，以及原始字节的透传能力；
//! - **结构说明 (How)**：以 `hex` 书写线上字节夹具，必要时拆成多个分片，验证跨分片解码与单片一致；
//! - **合同与边界 (What)**：合法输入逐字节重现，非法输入返回 `Decode`/`UnknownDescriptor`，绝不部分成功。

use spark_buffer::{BufferPool, PooledView};
use spark_codec_amqp::{
    AmqpTypeRegistry, CodecError, DecoderConfig, Descriptor, SectionKind, SectionValue,
    StructuredMessage, Value,
};

fn fixture(text: &str) -> Vec<u8> {
    hex::decode(text.replace(' ', "")).expect("夹具必须是合法十六进制")
}

fn decode_fragments(parts: &[&[u8]]) -> Result<StructuredMessage, CodecError> {
    let pool = BufferPool::new();
    let registry = AmqpTypeRegistry::standard();
    let config = DecoderConfig::default();
    let views: Vec<PooledView> = parts
        .iter()
        .map(|part| pool.wrap(part).expect("分配分片失败"))
        .collect();
    registry.section_decoder(&config).decode(views)
}

fn decode(bytes: &[u8]) -> Result<StructuredMessage, CodecError> {
    decode_fragments(&[bytes])
}

// header(durable) + message-annotations{x-opt-jms-msg-type: 5} + properties(content-type) + amqp-value("hello")
const FULL_MESSAGE: &str = "\
    00 53 70 c0 02 01 41 \
    00 53 72 c1 17 02 a3 12 782d6f70742d6a6d732d6d73672d74797065 50 05 \
    00 53 73 c0 13 07 40 40 40 40 40 40 a3 0a 746578742f706c61696e \
    00 53 77 a1 05 68656c6c6f";

#[test]
fn full_message_decodes_into_typed_sections() {
    let wire = fixture(FULL_MESSAGE);
    let message = decode(&wire).expect("合法消息应解码成功");

    assert!(message.header().expect("应有 header").is_durable());
    let annotations = message.message_annotations().expect("应有注解");
    assert_eq!(
        annotations.get_symbol("x-opt-jms-msg-type"),
        Some(&Value::Ubyte(5))
    );
    assert_eq!(message.content_type(), Some("text/plain"));
    assert_eq!(message.body_kind(), Some(SectionKind::AmqpValue));
    match message.body_sections()[0].value() {
        SectionValue::AmqpValue(value) => assert_eq!(value, &Value::from("hello")),
        other => panic!("意外的消息体 {other:?}"),
    }
    assert_eq!(message.to_wire().expect("透传失败").as_ref(), wire.as_slice());
}

#[test]
fn fragmented_input_matches_contiguous_decode() {
    let wire = fixture(FULL_MESSAGE);
    for split in [1, 9, 20, wire.len() - 3] {
        let (head, tail) = wire.split_at(split);
        let message = decode_fragments(&[head, tail]).expect("分片输入应解码成功");
        assert_eq!(message.content_type(), Some("text/plain"));
        assert_eq!(
            message.to_wire().expect("透传失败").as_ref(),
            wire.as_slice(),
            "切分点 {split}"
        );
    }
}

#[test]
fn symbolic_descriptor_resolves_like_numeric() {
    // amqp-value 使用符号描述符
    let symbolic = fixture("00 a3 11 616d71703a616d71702d76616c75653a2a 54 07");
    let numeric = fixture("00 53 77 54 07");
    let a = decode(&symbolic).expect("符号描述符应解码");
    let b = decode(&numeric).expect("数值描述符应解码");
    assert_eq!(a.body_sections()[0].value(), b.body_sections()[0].value());
    assert_eq!(a.body_kind(), b.body_kind());
}

#[test]
fn repeated_data_sections_form_one_body() {
    let wire = fixture("00 53 75 a0 01 01  00 53 75 a0 02 02 03  00 53 78 c1 01 00");
    let message = decode(&wire).expect("重复 data 合法");
    assert_eq!(message.body_sections().len(), 2);
    assert!(message.footer().is_some_and(|footer| footer.is_empty()));
    let relay: usize = message
        .body_views()
        .expect("应能复制视图")
        .iter()
        .map(PooledView::len)
        .sum();
    assert_eq!(relay, 13);
}

#[test]
fn empty_input_is_an_empty_message() {
    let message = decode(&[]).expect("空输入合法");
    assert_eq!(message.body_kind(), None);
    assert_eq!(message.encoded_len(), 0);
}

#[test]
fn ordering_violations_are_decode_errors() {
    let cases = [
        // properties 之后出现 header
        "00 53 73 45  00 53 70 45",
        // data 与 amqp-sequence 混用
        "00 53 75 a0 00  00 53 76 45",
        // amqp-value 重复
        "00 53 77 40  00 53 77 40",
        // footer 之后还有 data
        "00 53 78 c1 01 00  00 53 75 a0 00",
        // 顶层出现非描述类型
        "a1 01 78",
    ];
    for case in cases {
        let err = decode(&fixture(case)).expect_err("乱序输入必须失败");
        assert!(matches!(err, CodecError::Decode(_)), "{case}: {err:?}");
    }
}

#[test]
fn unregistered_descriptor_is_never_skipped() {
    // open 帧体不是消息节区
    let err = decode(&fixture("00 53 10 45")).expect_err("非节区描述符必须失败");
    assert_eq!(err, CodecError::UnknownDescriptor(Descriptor::code(0x10)));
}

#[test]
fn truncated_section_reports_failure() {
    let err = decode(&fixture("00 53 77 a1 05 68 65")).expect_err("截断输入必须失败");
    assert!(matches!(
        err,
        CodecError::Decode(_) | CodecError::InsufficientData { .. }
    ));
}

#[test]
fn application_properties_require_string_keys() {
    let err = decode(&fixture("00 53 74 c1 05 02 a3 01 6b 40")).expect_err("符号键必须失败");
    assert!(matches!(err, CodecError::Decode(_)));
}

#[test]
fn nested_source_inside_value_stays_described() {
    // amqp-value 内的 list 中嵌套 source(address="q")
    let wire = fixture("00 53 77 c0 0a 01 00 53 28 c0 04 01 a1 01 71");
    let message = decode(&wire).expect("已注册的描述类型应解码");
    let SectionValue::AmqpValue(Value::List(items)) = message.body_sections()[0].value() else {
        panic!("消息体应为 list");
    };
    assert_eq!(items[0].descriptor(), Some(&Descriptor::code(0x28)));
}
