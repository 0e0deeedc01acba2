use bytes::Bytes;
use spark_codec_amqp::{Binary, Value};

use super::{
    AssembledBody, MessageConverter, assemble_body, internal_content, properties_from_amqp10,
};
use crate::{
    error::ConversionError,
    message::{Amqp10Message, ConvertedMessage, Protocol},
    registry::ConversionContext,
};

/// 1.0 → 内部模型。
///
/// `amqp-value` 取其值，多个 `amqp-sequence` 拼成一个列表，多个 `data` 拼成一段二进制，
/// 没有消息体时为空值；content-type 成为内部消息的 mime 类型。
#[derive(Debug, Clone, Copy, Default)]
pub struct Amqp10ToInternal;

impl MessageConverter for Amqp10ToInternal {
    type Source = Amqp10Message;

    fn target(&self) -> Protocol {
        Protocol::Internal
    }

    fn convert(
        &self,
        message: &Amqp10Message,
        ctx: &ConversionContext,
    ) -> Result<ConvertedMessage, ConversionError> {
        let sections = message.body_sections(ctx.registry(), &ctx.config().decoder)?;
        let body = match assemble_body(sections)? {
            AssembledBody::Absent => Value::Null,
            AssembledBody::Value(value) => value,
            AssembledBody::Data(bytes) => Value::Binary(Binary::from(bytes)),
        };
        let metadata = message.metadata();
        let properties = properties_from_amqp10(metadata.envelope(), ctx.address_space())?;
        let content: Bytes = internal_content(&body)?;
        Ok(ConvertedMessage::new(Protocol::Internal, content, properties)
            .with_mime_type(metadata.content_type()))
    }
}
