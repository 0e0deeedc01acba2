use super::{MessageConverter, legacy_target};
use crate::{
    error::ConversionError,
    message::{ConvertedMessage, LegacyMessage, Protocol},
    registry::ConversionContext,
};

/// 0-8 ↔ 0-10：两者共享 mime 类型加不透明字节的模型，内容与消息头原样透传。
#[derive(Debug, Clone, Copy)]
pub struct LegacyToLegacy {
    target: Protocol,
}

impl LegacyToLegacy {
    /// `from` 与 `target` 必须是两个不同的遗留协议。
    pub fn new(from: Protocol, target: Protocol) -> Result<Self, ConversionError> {
        if !from.is_legacy() {
            return Err(ConversionError::NoConverter { from, to: target });
        }
        Ok(Self {
            target: legacy_target(from, target)?,
        })
    }
}

impl MessageConverter for LegacyToLegacy {
    type Source = LegacyMessage;

    fn target(&self) -> Protocol {
        self.target
    }

    fn convert(
        &self,
        message: &LegacyMessage,
        _ctx: &ConversionContext,
    ) -> Result<ConvertedMessage, ConversionError> {
        let metadata = message.metadata();
        if metadata.protocol == self.target {
            return Err(ConversionError::NoConverter {
                from: metadata.protocol,
                to: self.target,
            });
        }
        Ok(ConvertedMessage::new(
            self.target,
            message.content_bytes()?,
            metadata.properties.clone(),
        )
        .with_mime_type(metadata.mime_type.as_deref()))
    }
}
