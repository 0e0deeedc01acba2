//! 0-8 / 0-10 → 1.0 转换契约测试。

use bytes::BytesMut;
use spark_codec_amqp::{AmqpMap, Binary, SectionValue, Value};
use spark_msgconv::{
    Amqp10MessageFactory, ConversionContext, ConversionError, ConvertedMessage, ConverterRegistry,
    JmsMessageKind, LegacyMessage, MessageProperties, Protocol, SourceMessage,
};

fn legacy(ctx: &ConversionContext, mime: Option<&str>, content: &[u8]) -> SourceMessage {
    LegacyMessage::legacy(
        ctx.pool(),
        Protocol::V0_8,
        mime,
        MessageProperties::default(),
        content,
    )
    .expect("分配失败")
    .into()
}

fn to_amqp10(
    ctx: &ConversionContext,
    mime: Option<&str>,
    content: &[u8],
) -> Result<ConvertedMessage, ConversionError> {
    ConverterRegistry::new().convert(&legacy(ctx, mime, content), Protocol::V1_0, ctx)
}

fn encoded(section: SectionValue) -> Vec<u8> {
    let mut out = BytesMut::new();
    section.encode(&mut out).expect("节区可编码");
    out.to_vec()
}

#[test]
fn text_family_becomes_amqp_value_string() {
    let ctx = ConversionContext::default();
    let converted = to_amqp10(&ctx, Some("text/html"), b"<p/>").expect("可转换");
    assert_eq!(
        converted.content.to_vec(),
        encoded(SectionValue::AmqpValue(Value::from("<p/>")))
    );
    assert_eq!(converted.mime_type(), Some("text/html"));
    assert_eq!(converted.message_kind, Some(JmsMessageKind::Text));
}

#[test]
fn malformed_utf8_text_is_invalid_content() {
    let ctx = ConversionContext::default();
    let err = to_amqp10(&ctx, Some("text/plain"), &[0xff, 0xfe]).expect_err("非法 UTF-8");
    assert!(matches!(
        err,
        ConversionError::InvalidContent {
            mime_type: "text/plain",
            ..
        }
    ));
}

#[test]
fn octet_stream_becomes_data() {
    let ctx = ConversionContext::default();
    let converted = to_amqp10(&ctx, Some("application/octet-stream"), b"\x00\x01").expect("可转换");
    assert_eq!(
        converted.content.to_vec(),
        encoded(SectionValue::Data(Binary::from(&b"\x00\x01"[..])))
    );
    assert_eq!(converted.mime_type(), Some("application/octet-stream"));
    assert_eq!(converted.message_kind, Some(JmsMessageKind::Bytes));
}

#[test]
fn jms_stream_becomes_sequence() {
    let ctx = ConversionContext::default();
    let content = hex::decode("0600000025").expect("夹具合法");
    let converted = to_amqp10(&ctx, Some("jms/stream-message"), &content).expect("可转换");
    assert_eq!(
        converted.content.to_vec(),
        encoded(SectionValue::AmqpSequence(vec![Value::Int(37)]))
    );
    assert_eq!(converted.mime_type(), None);
    assert_eq!(converted.message_kind, Some(JmsMessageKind::Stream));
}

#[test]
fn amqp_list_is_tagged_only_when_jms_compatible() {
    let ctx = ConversionContext::default();
    let nested = Value::List(vec![Value::from("x"), Value::List(vec![Value::from("y")])]);
    let content = spark_codec_amqp::encode_to_vec(&nested).expect("可编码");
    let converted = to_amqp10(&ctx, Some("amqp/list"), &content).expect("可转换");
    assert_eq!(converted.message_kind, None);
    let Value::List(items) = nested else {
        unreachable!()
    };
    assert_eq!(
        converted.content.to_vec(),
        encoded(SectionValue::AmqpSequence(items))
    );

    let flat = spark_codec_amqp::encode_to_vec(&Value::List(vec![Value::Int(1)])).expect("可编码");
    let converted = to_amqp10(&ctx, Some("amqp/list"), &flat).expect("可转换");
    assert_eq!(converted.message_kind, Some(JmsMessageKind::Stream));
}

#[test]
fn empty_jms_map_becomes_empty_amqp_map() {
    let ctx = ConversionContext::default();
    let converted = to_amqp10(&ctx, Some("jms/map-message"), b"").expect("可转换");
    assert_eq!(
        converted.content.to_vec(),
        encoded(SectionValue::AmqpValue(Value::Map(AmqpMap::new())))
    );
    assert_eq!(converted.message_kind, Some(JmsMessageKind::Map));
}

#[test]
fn corrupt_jms_map_is_invalid_content() {
    let ctx = ConversionContext::default();
    // 声明 2 个条目，只给出 1 个
    let content = hex::decode("00000002610006000000 01".replace(' ', "")).expect("夹具合法");
    let err = to_amqp10(&ctx, Some("jms/map-message"), &content).expect_err("内容截断");
    assert!(matches!(err, ConversionError::InvalidContent { .. }));
}

#[test]
fn object_stream_keeps_bytes_under_serialized_object_type() {
    let ctx = ConversionContext::default();
    for mime in ["application/java-object-stream", "application/x-java-serialized-object"] {
        let converted = to_amqp10(&ctx, Some(mime), b"").expect("可转换");
        assert_eq!(
            converted.content.to_vec(),
            encoded(SectionValue::Data(Binary::from(&[0xac, 0xed, 0x00, 0x05, 0x70][..])))
        );
        assert_eq!(
            converted.mime_type(),
            Some("application/x-java-serialized-object")
        );
        assert_eq!(converted.message_kind, Some(JmsMessageKind::Object));
    }
}

#[test]
fn untyped_and_unknown_content_stay_opaque() {
    let ctx = ConversionContext::default();
    let converted = to_amqp10(&ctx, None, b"raw").expect("可转换");
    assert_eq!(
        converted.content.to_vec(),
        encoded(SectionValue::Data(Binary::from(&b"raw"[..])))
    );
    assert_eq!(converted.mime_type(), None);
    assert_eq!(converted.message_kind, None);

    let converted = to_amqp10(&ctx, Some("image/png"), b"raw").expect("可转换");
    assert_eq!(converted.mime_type(), Some("image/png"));
    assert_eq!(converted.message_kind, None);

    let converted = to_amqp10(&ctx, None, b"").expect("可转换");
    assert_eq!(
        converted.content.to_vec(),
        encoded(SectionValue::AmqpValue(Value::Null))
    );
    assert_eq!(converted.message_kind, Some(JmsMessageKind::Generic));
}

#[test]
fn factory_builds_a_decodable_message() {
    let ctx = ConversionContext::default();
    let properties = MessageProperties {
        message_id: Some("id-1".into()),
        persistent: true,
        priority: Some(9),
        ..MessageProperties::default()
    };
    let source: SourceMessage =
        LegacyMessage::legacy(ctx.pool(), Protocol::V0_10, Some("text/plain"), properties, b"hi")
            .expect("分配失败")
            .into();
    let message = ConverterRegistry::new()
        .convert_with(&source, &Amqp10MessageFactory, &ctx)
        .expect("可转换");

    let envelope = message.metadata().envelope();
    assert_eq!(message.metadata().content_type(), Some("text/plain"));
    let header = envelope.header().expect("持久化消息带 header");
    assert_eq!(header.durable, Some(true));
    assert_eq!(header.priority, Some(9));
    assert_eq!(
        envelope.properties().and_then(|p| p.message_id.clone()),
        Some(Value::from("id-1"))
    );
    assert_eq!(
        message
            .metadata()
            .message_annotations()
            .and_then(|map| map.get_symbol("x-opt-jms-msg-type")),
        Some(&Value::Byte(5))
    );

    let wire = message.to_wire().expect("视图有效");
    let reparsed = spark_msgconv::Amqp10Message::decode(
        ctx.pool(),
        ctx.registry(),
        &ctx.config().decoder,
        &wire,
    )
    .expect("产物可重新解码");
    assert_eq!(reparsed.to_wire().expect("视图有效"), wire);
}
