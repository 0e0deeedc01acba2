use spark_codec_amqp::{AmqpMap, Binary, SectionValue, Value};

use super::{MessageConverter, encode_sections, utf8_text};
use crate::{
    body::{is_jms_list, is_jms_map},
    content::{SERIALIZED_NULL, codec_for_mime},
    error::ConversionError,
    kind::JmsMessageKind,
    message::{ConvertedMessage, LegacyMessage, Protocol},
    mime,
    registry::ConversionContext,
};

/// 0-8 / 0-10 → 1.0。
///
/// # 教案式说明
/// - **意图 (Why)**：遗留消息只有 mime 类型与字节，1.0 消费者需要结构化的消息体节区与消息种类注解；
/// - **逻辑 (How)**：按 mime 类型分派：文本家族转 `amqp-value` 字符串，列表/映射编解码器解出值后
///   分别转 `amqp-sequence` 与 `amqp-value`，对象流与字节落在 `data` 节区；
/// - **契约 (What)**：产物内容只含消息体节区，其余节区由
///   [`Amqp10MessageFactory`](crate::Amqp10MessageFactory) 依据消息头生成。
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyToAmqp10;

/// 转换后的消息体与随之写出的 content-type、消息种类。
struct Outcome {
    body: SectionValue,
    content_type: Option<String>,
    kind: Option<JmsMessageKind>,
}

impl MessageConverter for LegacyToAmqp10 {
    type Source = LegacyMessage;

    fn target(&self) -> Protocol {
        Protocol::V1_0
    }

    fn convert(
        &self,
        message: &LegacyMessage,
        ctx: &ConversionContext,
    ) -> Result<ConvertedMessage, ConversionError> {
        let outcome = match message.mime_type() {
            None if message.content_size() == 0 => Outcome {
                body: SectionValue::AmqpValue(Value::Null),
                content_type: None,
                kind: Some(JmsMessageKind::Generic),
            },
            None => Outcome {
                body: SectionValue::Data(Binary::from(message.content_bytes()?)),
                content_type: None,
                kind: None,
            },
            Some(mime_type) => convert_typed(message, mime_type, ctx)?,
        };
        let content = encode_sections(&[outcome.body])?;
        Ok(
            ConvertedMessage::new(Protocol::V1_0, content, message.metadata().properties.clone())
                .with_mime_type(outcome.content_type.as_deref())
                .with_message_kind(outcome.kind),
        )
    }
}

fn convert_typed(
    message: &LegacyMessage,
    mime_type: &str,
    ctx: &ConversionContext,
) -> Result<Outcome, ConversionError> {
    if mime::is_textual(mime_type) {
        let text = utf8_text(message.content_bytes()?, mime::TEXT_PLAIN)?;
        return Ok(Outcome {
            body: SectionValue::AmqpValue(Value::String(text)),
            content_type: Some(mime_type.to_owned()),
            kind: Some(JmsMessageKind::Text),
        });
    }
    if mime::matches(mime_type, mime::OCTET_STREAM) {
        return Ok(Outcome {
            body: SectionValue::Data(Binary::from(message.content_bytes()?)),
            content_type: Some(mime_type.to_owned()),
            kind: Some(JmsMessageKind::Bytes),
        });
    }
    if mime::is_object_stream(mime_type) {
        let bytes = if message.content_size() == 0 {
            Binary::from(&SERIALIZED_NULL[..])
        } else {
            Binary::from(message.content_bytes()?)
        };
        return Ok(Outcome {
            body: SectionValue::Data(bytes),
            content_type: Some(mime::JAVA_SERIALIZED_OBJECT.to_owned()),
            kind: Some(JmsMessageKind::Object),
        });
    }
    let Some(codec) = codec_for_mime(mime_type) else {
        return Ok(Outcome {
            body: SectionValue::Data(Binary::from(message.content_bytes()?)),
            content_type: Some(mime_type.to_owned()),
            kind: None,
        });
    };
    let jms = matches!(codec.mime_type(), mime::JMS_STREAM_MESSAGE | mime::JMS_MAP_MESSAGE);
    let value = if message.content_size() == 0 {
        match codec.mime_type() {
            mime::JMS_MAP_MESSAGE | mime::AMQP_MAP => Value::Map(AmqpMap::new()),
            _ => Value::List(Vec::new()),
        }
    } else {
        let mut content = message.content_chain()?;
        codec.decode(&mut content, &ctx.value_handler())?
    };
    Ok(match value {
        Value::List(items) => Outcome {
            kind: (jms || is_jms_list(&items)).then_some(JmsMessageKind::Stream),
            body: SectionValue::AmqpSequence(items),
            content_type: None,
        },
        Value::Map(map) => Outcome {
            kind: (jms || is_jms_map(&map)).then_some(JmsMessageKind::Map),
            body: SectionValue::AmqpValue(Value::Map(map)),
            content_type: None,
        },
        other => {
            return Err(ConversionError::invalid_content(
                codec.mime_type(),
                format!("decoded {} instead of a collection", other.type_name()),
            ));
        }
    })
}
