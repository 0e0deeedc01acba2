use bytes::Bytes;
use spark_codec_amqp::{AmqpMap, Value};
use tracing::trace;

use super::{
    AssembledBody, MessageConverter, assemble_body, legacy_target, properties_from_amqp10,
};
use crate::{
    body::{Body, normalize},
    content::{
        AMQP_LIST, AMQP_MAP, JMS_MAP, JMS_STREAM, MimeContentCodec, SERIALIZED_NULL,
        codec_for_mime, list_codec, map_codec,
    },
    error::ConversionError,
    kind::JmsMessageKind,
    message::{Amqp10Message, ConvertedMessage, Protocol},
    mime,
    registry::ConversionContext,
};

/// 1.0 → 0-8 / 0-10。
///
/// # 教案式说明
/// - **意图 (Why)**：遗留客户端只认 mime 类型与不透明字节，1.0 的结构化消息体必须落到某个内容编码上；
/// - **逻辑 (How)**：
///   1. 消息种类注解优先，其次 content-type，得到内容提示 [`ContentHint`]；
///   2. 拼装消息体节区并归一化值；
///   3. 空消息体、字节、文本、集合分别按提示选择 mime 与编码；
/// - **契约 (What)**：无法表示的值（描述类型、decimal、非集合的其他顶层值）整体失败。
#[derive(Debug, Clone, Copy)]
pub struct Amqp10ToLegacy {
    target: Protocol,
}

impl Amqp10ToLegacy {
    pub fn new(target: Protocol) -> Result<Self, ConversionError> {
        Ok(Self {
            target: legacy_target(Protocol::V1_0, target)?,
        })
    }
}

impl MessageConverter for Amqp10ToLegacy {
    type Source = Amqp10Message;

    fn target(&self) -> Protocol {
        self.target
    }

    fn convert(
        &self,
        message: &Amqp10Message,
        ctx: &ConversionContext,
    ) -> Result<ConvertedMessage, ConversionError> {
        let metadata = message.metadata();
        let kind = JmsMessageKind::from_annotations(
            metadata.message_annotations(),
            ctx.config().strict_message_kind,
        )?;
        let hint = ContentHint::resolve(kind, metadata.content_type());
        trace!(?hint, content_type = ?metadata.content_type(), "resolved content hint");

        let sections = message.body_sections(ctx.registry(), &ctx.config().decoder)?;
        let (content, mime_type) = match assemble_body(sections)? {
            AssembledBody::Absent => hint.empty_content()?,
            AssembledBody::Data(bytes) => (bytes, Some(hint.bytes_mime())),
            AssembledBody::Value(value) => encode_value(normalize(value)?, &hint)?,
        };
        let properties = properties_from_amqp10(metadata.envelope(), ctx.address_space())?;
        Ok(ConvertedMessage::new(self.target, content, properties).with_mime_type(mime_type))
    }
}

/// 由注解与 content-type 推出的内容提示。
///
/// `codec` 仅在映射/列表种类下记录 content-type 点名的具体编解码器。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ContentHint {
    kind: Option<JmsMessageKind>,
    codec: Option<&'static str>,
}

impl ContentHint {
    /// 注解优先；注解缺失时按 content-type 推断，未知 content-type 不给出提示。
    pub(crate) fn resolve(kind: Option<JmsMessageKind>, content_type: Option<&str>) -> Self {
        let named_map = content_type.and_then(|ct| named_codec(ct, &[&JMS_MAP, &AMQP_MAP]));
        let named_list = content_type.and_then(|ct| named_codec(ct, &[&JMS_STREAM, &AMQP_LIST]));
        if let Some(kind) = kind {
            let codec = match kind {
                JmsMessageKind::Map => named_map,
                JmsMessageKind::Stream => named_list,
                _ => None,
            };
            return Self {
                kind: Some(kind),
                codec,
            };
        }
        let Some(content_type) = content_type else {
            return Self::none();
        };
        let kind = if mime::is_textual(content_type) {
            JmsMessageKind::Text
        } else if mime::matches(content_type, mime::OCTET_STREAM) {
            JmsMessageKind::Bytes
        } else if mime::is_object_stream(content_type) {
            JmsMessageKind::Object
        } else if named_map.is_some() {
            JmsMessageKind::Map
        } else if named_list.is_some() {
            JmsMessageKind::Stream
        } else {
            return Self::none();
        };
        Self {
            kind: Some(kind),
            codec: named_map.or(named_list),
        }
    }

    fn none() -> Self {
        Self {
            kind: None,
            codec: None,
        }
    }

    /// 空消息体：内容按提示给出该种类的“空”编码。
    fn empty_content(&self) -> Result<(Bytes, Option<&'static str>), ConversionError> {
        let empty_with = |mime_type: &'static str, empty: Value| {
            let codec = codec_for_mime(mime_type)
                .ok_or_else(|| ConversionError::InvalidBody(format!("no codec for {mime_type}")))?;
            Ok::<_, ConversionError>((codec.encode_to_bytes(&empty)?, Some(mime_type)))
        };
        match self.kind {
            Some(JmsMessageKind::Text) => Ok((Bytes::new(), Some(mime::TEXT_PLAIN))),
            Some(JmsMessageKind::Object) => Ok((
                Bytes::from_static(&SERIALIZED_NULL),
                Some(mime::JAVA_OBJECT_STREAM),
            )),
            Some(JmsMessageKind::Map) => empty_with(
                self.codec.unwrap_or(mime::JMS_MAP_MESSAGE),
                Value::Map(AmqpMap::new()),
            ),
            Some(JmsMessageKind::Stream) => empty_with(
                self.codec.unwrap_or(mime::JMS_STREAM_MESSAGE),
                Value::List(Vec::new()),
            ),
            Some(JmsMessageKind::Bytes) => Ok((Bytes::new(), Some(mime::OCTET_STREAM))),
            Some(JmsMessageKind::Generic) | None => Ok((Bytes::new(), None)),
        }
    }

    /// 字节消息体原样透传，只决定 mime 类型。
    fn bytes_mime(&self) -> &'static str {
        match (self.kind, self.codec) {
            (Some(JmsMessageKind::Text), _) => mime::TEXT_PLAIN,
            (Some(JmsMessageKind::Object), _) => mime::JAVA_OBJECT_STREAM,
            (Some(JmsMessageKind::Map | JmsMessageKind::Stream), Some(codec)) => codec,
            _ => mime::OCTET_STREAM,
        }
    }
}

fn named_codec(
    content_type: &str,
    candidates: &[&'static dyn MimeContentCodec],
) -> Option<&'static str> {
    candidates
        .iter()
        .map(|codec| codec.mime_type())
        .find(|name| mime::matches(content_type, name))
}

/// 值消息体：按形态选择编码。
fn encode_value(
    value: Value,
    hint: &ContentHint,
) -> Result<(Bytes, Option<&'static str>), ConversionError> {
    let (codec, value) = match Body::classify(value) {
        Body::Null => return hint.empty_content(),
        Body::Text(text) => return Ok((Bytes::from(text), Some(mime::TEXT_PLAIN))),
        Body::Bytes(bytes) => return Ok((bytes, Some(hint.bytes_mime()))),
        Body::List(items) => {
            let codec = match hint.codec {
                Some(mime::AMQP_LIST) => Some(&AMQP_LIST as &'static dyn MimeContentCodec),
                _ => list_codec(&items),
            };
            (codec, Value::List(items))
        }
        Body::Map(map) => {
            let codec = match hint.codec {
                Some(mime::AMQP_MAP) => Some(&AMQP_MAP as &'static dyn MimeContentCodec),
                _ => map_codec(&map),
            };
            (codec, Value::Map(map))
        }
        Body::Other(other) => (None, other),
    };
    let codec = codec
        .ok_or_else(|| ConversionError::unsupported(value.type_name(), "legacy message body"))?;
    Ok((codec.encode_to_bytes(&value)?, Some(codec.mime_type())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotation_overrides_content_type() {
        let hint = ContentHint::resolve(Some(JmsMessageKind::Text), Some(mime::OCTET_STREAM));
        assert_eq!(hint.bytes_mime(), mime::TEXT_PLAIN);
    }

    #[test]
    fn map_content_type_is_remembered() {
        let hint = ContentHint::resolve(None, Some("amqp/map"));
        assert_eq!(hint.kind, Some(JmsMessageKind::Map));
        assert_eq!(hint.codec, Some(mime::AMQP_MAP));
        assert_eq!(ContentHint::resolve(None, Some("foo/bar")), ContentHint::none());
    }
}
