use spark_codec_amqp::{AmqpMap, Binary, Value};

use super::{MessageConverter, internal_content, utf8_text};
use crate::{
    content::codec_for_mime,
    error::ConversionError,
    message::{ConvertedMessage, LegacyMessage, Protocol},
    mime,
    registry::ConversionContext,
};

/// 0-8 / 0-10 → 内部模型。
///
/// # 契约说明（What）
/// - 文本家族解为字符串，列表/映射/对象流按对应编解码器解码，其余内容保留为二进制；
/// - 空内容得到该形态的空值：列表 `[]`、映射 `{}`、对象流与无 mime 的内容为空值；
/// - mime 类型原样保留在内部消息上。
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyToInternal;

impl MessageConverter for LegacyToInternal {
    type Source = LegacyMessage;

    fn target(&self) -> Protocol {
        Protocol::Internal
    }

    fn convert(
        &self,
        message: &LegacyMessage,
        ctx: &ConversionContext,
    ) -> Result<ConvertedMessage, ConversionError> {
        let empty = message.content_size() == 0;
        let body = match message.mime_type() {
            None if empty => Value::Null,
            Some(mime_type) if mime::is_textual(mime_type) => {
                Value::String(utf8_text(message.content_bytes()?, mime::TEXT_PLAIN)?)
            }
            Some(mime_type) => match codec_for_mime(mime_type) {
                Some(codec) if empty => match codec.mime_type() {
                    mime::JMS_MAP_MESSAGE | mime::AMQP_MAP => Value::Map(AmqpMap::new()),
                    mime::JMS_STREAM_MESSAGE | mime::AMQP_LIST => Value::List(Vec::new()),
                    _ => Value::Null,
                },
                Some(codec) => {
                    let mut content = message.content_chain()?;
                    codec.decode(&mut content, &ctx.value_handler())?
                }
                None => Value::Binary(Binary::from(message.content_bytes()?)),
            },
            None => Value::Binary(Binary::from(message.content_bytes()?)),
        };
        let metadata = message.metadata();
        Ok(ConvertedMessage::new(
            Protocol::Internal,
            internal_content(&body)?,
            metadata.properties.clone(),
        )
        .with_mime_type(metadata.mime_type.as_deref()))
    }
}
