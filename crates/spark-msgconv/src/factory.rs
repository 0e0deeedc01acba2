//! 目标协议的消息工厂。
//!
//! # 模块定位（Why）
//! - 转换器只产出“内容 + mime + 种类 + 消息头”，目标协议各自决定如何把它们落成可投递的消息；
//! - 1.0 工厂负责生成消息体之外的节区，遗留与内部工厂只做装箱。
//!
//! # 契约说明（What）
//! - 工厂只接受 `target` 与自身协议一致的 [`ConvertedMessage`]，否则返回
//!   [`ConversionError::NoConverter`]；
//! - 产物内容复制进上下文的缓冲池，与转换产物不共享存储。

use spark_buffer::ViewChain;
use spark_codec_amqp::{AmqpMap, Binary, Header, Properties, SectionValue, StructuredMessage, Symbol, Value};

use crate::{
    content::{MimeContentCodec, OBJECT_STREAM},
    error::ConversionError,
    kind::MESSAGE_KIND_ANNOTATION,
    message::{Amqp10Message, ConvertedMessage, InternalMessage, LegacyMessage, Protocol},
    registry::ConversionContext,
};

/// 由转换产物构建目标协议的消息。
pub trait MessageFactory {
    type Message;

    fn protocol(&self) -> Protocol;

    fn create(
        &self,
        converted: ConvertedMessage,
        ctx: &ConversionContext,
    ) -> Result<Self::Message, ConversionError>;
}

fn expect_target(converted: &ConvertedMessage, protocol: Protocol) -> Result<(), ConversionError> {
    if converted.target == protocol {
        Ok(())
    } else {
        Err(ConversionError::NoConverter {
            from: converted.target,
            to: protocol,
        })
    }
}

/// 0-8 / 0-10 消息工厂。
#[derive(Debug, Clone, Copy)]
pub struct LegacyMessageFactory {
    protocol: Protocol,
}

impl LegacyMessageFactory {
    /// `protocol` 必须是遗留协议。
    pub fn new(protocol: Protocol) -> Result<Self, ConversionError> {
        if protocol.is_legacy() {
            Ok(Self { protocol })
        } else {
            Err(ConversionError::NoConverter {
                from: protocol,
                to: protocol,
            })
        }
    }
}

impl MessageFactory for LegacyMessageFactory {
    type Message = LegacyMessage;

    fn protocol(&self) -> Protocol {
        self.protocol
    }

    fn create(
        &self,
        converted: ConvertedMessage,
        ctx: &ConversionContext,
    ) -> Result<LegacyMessage, ConversionError> {
        expect_target(&converted, self.protocol)?;
        let message = LegacyMessage::legacy(
            ctx.pool(),
            self.protocol,
            converted.mime_type.as_deref(),
            converted.properties,
            &converted.content,
        )?;
        Ok(message)
    }
}

/// 1.0 消息工厂。
///
/// # 教案式说明
/// - **意图 (Why)**：1.0 的 content-type、消息种类与消息头都住在消息体之外的节区里；
/// - **逻辑 (How)**：依据消息头生成 header / message-annotations / properties /
///   application-properties 节区，再把转换产物重新解析为消息体节区，按顺序组装；
/// - **契约 (What)**：header 仅在持久化或设置了优先级时生成；消息种类写成字节型注解；
///   application-properties 仅在消息头非空时生成。
#[derive(Debug, Clone, Copy, Default)]
pub struct Amqp10MessageFactory;

impl Amqp10MessageFactory {
    fn envelope_sections(converted: &ConvertedMessage) -> Vec<SectionValue> {
        let source = &converted.properties;
        let mut sections = Vec::new();
        if source.persistent || source.priority.is_some() {
            sections.push(SectionValue::Header(Header {
                durable: source.persistent.then_some(true),
                priority: source.priority,
                ..Header::default()
            }));
        }
        if let Some(kind) = converted.message_kind {
            let mut annotations = AmqpMap::new();
            annotations.insert(Symbol::new(MESSAGE_KIND_ANNOTATION), kind.to_value());
            sections.push(SectionValue::MessageAnnotations(annotations));
        }
        let properties = Properties {
            message_id: source.message_id.clone().map(Value::String),
            user_id: source.user_id.clone().map(Binary::from),
            reply_to: source.reply_to.clone(),
            correlation_id: source.correlation_id.clone().map(Value::String),
            content_type: converted.mime_type.clone().map(Symbol::from),
            content_encoding: source.encoding.clone().map(Symbol::from),
            absolute_expiry_time: source.expiration,
            creation_time: source.timestamp,
            ..Properties::default()
        };
        if properties != Properties::default() {
            sections.push(SectionValue::Properties(properties));
        }
        if !source.headers.is_empty() {
            sections.push(SectionValue::ApplicationProperties(source.headers.clone()));
        }
        sections
    }
}

impl MessageFactory for Amqp10MessageFactory {
    type Message = Amqp10Message;

    fn protocol(&self) -> Protocol {
        Protocol::V1_0
    }

    fn create(
        &self,
        converted: ConvertedMessage,
        ctx: &ConversionContext,
    ) -> Result<Amqp10Message, ConversionError> {
        expect_target(&converted, Protocol::V1_0)?;
        let mut sections = Vec::new();
        for section in Self::envelope_sections(&converted) {
            sections.push(section.into_section(ctx.pool())?);
        }
        if !converted.content.is_empty() {
            let view = ctx.pool().wrap(&converted.content)?;
            sections.extend(ctx.section_decoder().parse_all(vec![view])?);
        }
        let message = StructuredMessage::from_sections(sections)?;
        Ok(Amqp10Message::from_structured(message)?)
    }
}

/// 内部对象消息工厂：内容按对象流解码回值。
#[derive(Debug, Clone, Copy, Default)]
pub struct InternalMessageFactory;

impl MessageFactory for InternalMessageFactory {
    type Message = InternalMessage;

    fn protocol(&self) -> Protocol {
        Protocol::Internal
    }

    fn create(
        &self,
        converted: ConvertedMessage,
        ctx: &ConversionContext,
    ) -> Result<InternalMessage, ConversionError> {
        expect_target(&converted, Protocol::Internal)?;
        let body = if converted.content.is_empty() {
            Value::Null
        } else {
            let mut input = ViewChain::from_view(ctx.pool().wrap(&converted.content)?);
            OBJECT_STREAM.decode(&mut input, &ctx.value_handler())?
        };
        Ok(InternalMessage {
            body,
            mime_type: converted.mime_type,
            properties: converted.properties,
        })
    }
}
