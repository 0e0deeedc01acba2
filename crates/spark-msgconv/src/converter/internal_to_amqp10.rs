use spark_codec_amqp::{SectionValue, Value};

use super::{MessageConverter, encode_sections};
use crate::{
    body::{Body, is_jms_list, is_jms_map},
    error::ConversionError,
    kind::JmsMessageKind,
    message::{ConvertedMessage, InternalMessage, Protocol},
    mime,
    registry::ConversionContext,
};

/// 内部模型 → 1.0。
///
/// # 契约说明（What）
/// - 空值与文本转 `amqp-value`，字节转 `data`，列表转 `amqp-sequence`，映射与其他值转 `amqp-value`；
/// - 列表/映射仅在 JMS 兼容时带上 stream/map 种类注解，其他值不带注解；
/// - 字节消息体的 content-type 为自带 mime 类型或 `application/octet-stream`，文本沿用自带 mime 类型。
#[derive(Debug, Clone, Copy, Default)]
pub struct InternalToAmqp10;

impl MessageConverter for InternalToAmqp10 {
    type Source = InternalMessage;

    fn target(&self) -> Protocol {
        Protocol::V1_0
    }

    fn convert(
        &self,
        message: &InternalMessage,
        _ctx: &ConversionContext,
    ) -> Result<ConvertedMessage, ConversionError> {
        let own_mime = message.mime_type.as_deref();
        let (body, content_type, kind) = match Body::classify(message.body.clone()) {
            Body::Null => (
                SectionValue::AmqpValue(Value::Null),
                None,
                Some(JmsMessageKind::Generic),
            ),
            Body::Text(text) => (
                SectionValue::AmqpValue(Value::String(text)),
                own_mime,
                Some(JmsMessageKind::Text),
            ),
            Body::Bytes(bytes) => (
                SectionValue::Data(bytes.into()),
                Some(own_mime.unwrap_or(mime::OCTET_STREAM)),
                Some(JmsMessageKind::Bytes),
            ),
            Body::List(items) => {
                let kind = is_jms_list(&items).then_some(JmsMessageKind::Stream);
                (SectionValue::AmqpSequence(items), None, kind)
            }
            Body::Map(map) => {
                let kind = is_jms_map(&map).then_some(JmsMessageKind::Map);
                (SectionValue::AmqpValue(Value::Map(map)), None, kind)
            }
            Body::Other(value) => (SectionValue::AmqpValue(value), None, None),
        };
        let content = encode_sections(&[body])?;
        Ok(
            ConvertedMessage::new(Protocol::V1_0, content, message.properties.clone())
                .with_mime_type(content_type)
                .with_message_kind(kind),
        )
    }
}
