use bytes::Bytes;
use spark_codec_amqp::Value;

use super::{MessageConverter, legacy_target};
use crate::{
    body::Body,
    content::{MimeContentCodec, OBJECT_STREAM, list_codec, map_codec},
    error::ConversionError,
    message::{ConvertedMessage, InternalMessage, Protocol},
    mime,
    registry::ConversionContext,
};

/// 内部模型 → 0-8 / 0-10。
///
/// 按消息体形态分派，消息自带的 mime 类型只对字节消息体生效。集合先尝试 JMS 编解码器，
/// 再尝试 AMQP 编解码器，两者都无法承载时整体退回对象流。
#[derive(Debug, Clone, Copy)]
pub struct InternalToLegacy {
    target: Protocol,
}

impl InternalToLegacy {
    pub fn new(target: Protocol) -> Result<Self, ConversionError> {
        Ok(Self {
            target: legacy_target(Protocol::Internal, target)?,
        })
    }
}

impl MessageConverter for InternalToLegacy {
    type Source = InternalMessage;

    fn target(&self) -> Protocol {
        self.target
    }

    fn convert(
        &self,
        message: &InternalMessage,
        _ctx: &ConversionContext,
    ) -> Result<ConvertedMessage, ConversionError> {
        let (content, mime_type) = match Body::classify(message.body.clone()) {
            Body::Null => (Bytes::new(), None),
            Body::Text(text) => (Bytes::from(text), Some(mime::TEXT_PLAIN)),
            Body::Bytes(bytes) => (
                bytes,
                Some(message.mime_type.as_deref().unwrap_or(mime::OCTET_STREAM)),
            ),
            Body::List(items) => {
                let codec = list_codec(&items);
                with_fallback(codec, Value::List(items))?
            }
            Body::Map(map) => {
                let codec = map_codec(&map);
                with_fallback(codec, Value::Map(map))?
            }
            Body::Other(value) => with_fallback(None, value)?,
        };
        Ok(
            ConvertedMessage::new(self.target, content, message.properties.clone())
                .with_mime_type(mime_type),
        )
    }
}

fn with_fallback(
    codec: Option<&'static dyn MimeContentCodec>,
    value: Value,
) -> Result<(Bytes, Option<&'static str>), ConversionError> {
    let codec = codec.unwrap_or(&OBJECT_STREAM);
    Ok((codec.encode_to_bytes(&value)?, Some(codec.mime_type())))
}
