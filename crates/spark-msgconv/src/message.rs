//! 各协议的消息表示。
//!
//! # 模块定位（Why）
//! - 转换器的输入是“元数据 + 内容字节”：遗留协议的元数据是 mime 类型与消息头，
//!   1.0 的元数据是消息体之前的节区与 footer，内容则是消息体节区的原始编码；
//! - 统一成 [`StoredMessage`] 后，内容始终以共享存储的池化视图持有，转换器只读不改。
//!
//! # 契约说明（What）
//! - [`StoredMessage::content`] 每次返回新的兄弟视图，调用方读取它们不会移动存储中视图的游标；
//! - [`ConvertedMessage`] 每次转换新建，交给目标协议的 [`MessageFactory`](crate::MessageFactory) 后即不再修改。

use std::fmt;

use bytes::{Bytes, BytesMut};
use spark_buffer::{BufferError, BufferPool, PooledView, ViewChain};
use spark_codec_amqp::{
    AmqpMap, AmqpTypeRegistry, CodecError, DecoderConfig, Section, StructuredMessage, Value,
};

use crate::kind::JmsMessageKind;

/// 参与转换的协议。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    V0_8,
    V0_10,
    V1_0,
    /// 代理内部的对象消息模型。
    Internal,
}

impl Protocol {
    /// 0-8 与 0-10。
    pub fn is_legacy(self) -> bool {
        matches!(self, Self::V0_8 | Self::V0_10)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::V0_8 => "0-8",
            Self::V0_10 => "0-10",
            Self::V1_0 => "1.0",
            Self::Internal => "internal",
        })
    }
}

/// 与协议无关的消息头，在每次转换中随消息携带。
///
/// `headers` 是应用层消息头，值须为 JMS 标量；`expiration` 与 `timestamp` 为自纪元起的毫秒数。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageProperties {
    pub message_id: Option<String>,
    pub correlation_id: Option<String>,
    pub reply_to: Option<String>,
    pub user_id: Option<Bytes>,
    pub priority: Option<u8>,
    pub persistent: bool,
    pub timestamp: Option<i64>,
    pub expiration: Option<i64>,
    pub encoding: Option<String>,
    pub headers: AmqpMap,
}

/// 元数据加内容分片的存储消息。
#[derive(Debug)]
pub struct StoredMessage<M> {
    metadata: M,
    content: Vec<PooledView>,
}

impl<M> StoredMessage<M> {
    pub fn new(metadata: M, content: Vec<PooledView>) -> Self {
        Self { metadata, content }
    }

    /// 把连续字节复制进池中作为内容。
    pub fn from_bytes(metadata: M, pool: &BufferPool, content: &[u8]) -> Result<Self, BufferError> {
        let content = if content.is_empty() {
            Vec::new()
        } else {
            vec![pool.wrap(content)?]
        };
        Ok(Self::new(metadata, content))
    }

    pub fn metadata(&self) -> &M {
        &self.metadata
    }

    /// 内容总字节数。
    pub fn content_size(&self) -> usize {
        self.content.iter().map(PooledView::len).sum()
    }

    /// 截取 `[offset, offset + length)` 的内容，返回共享存储的新视图。
    pub fn content(&self, offset: usize, length: usize) -> Result<Vec<PooledView>, BufferError> {
        let size = self.content_size();
        let end = offset
            .checked_add(length)
            .filter(|end| *end <= size)
            .ok_or(BufferError::OutOfBounds {
                offset,
                length,
                limit: size,
            })?;
        let mut views = Vec::new();
        let mut base = 0;
        for view in &self.content {
            let len = view.len();
            let from = offset.max(base);
            let to = end.min(base + len);
            if from < to {
                views.push(view.view_range(from - base, to - base)?);
            }
            base += len;
        }
        Ok(views)
    }

    /// 全部内容组成的读取链。
    pub fn content_chain(&self) -> Result<ViewChain, BufferError> {
        Ok(ViewChain::new(self.content(0, self.content_size())?))
    }

    /// 复制出全部内容。
    pub fn content_bytes(&self) -> Result<Bytes, BufferError> {
        let mut out = BytesMut::with_capacity(self.content_size());
        for view in self.content(0, self.content_size())? {
            out.extend_from_slice(view.remaining_slice()?);
        }
        Ok(out.freeze())
    }

    pub fn into_parts(self) -> (M, Vec<PooledView>) {
        (self.metadata, self.content)
    }
}

/// 0-8 / 0-10 消息的元数据。
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyMetadata {
    pub protocol: Protocol,
    pub mime_type: Option<String>,
    pub properties: MessageProperties,
}

pub type LegacyMessage = StoredMessage<LegacyMetadata>;

impl StoredMessage<LegacyMetadata> {
    /// 便捷构造：内容复制进池中。
    pub fn legacy(
        pool: &BufferPool,
        protocol: Protocol,
        mime_type: Option<&str>,
        properties: MessageProperties,
        content: &[u8],
    ) -> Result<Self, BufferError> {
        let metadata = LegacyMetadata {
            protocol,
            mime_type: mime_type.map(str::to_owned),
            properties,
        };
        Self::from_bytes(metadata, pool, content)
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.metadata().mime_type.as_deref()
    }
}

/// 1.0 消息的元数据：消息体之外的节区与到达信息。
#[derive(Debug)]
pub struct Amqp10Metadata {
    envelope: StructuredMessage,
}

impl Amqp10Metadata {
    /// 不含消息体节区的结构化消息。
    pub fn envelope(&self) -> &StructuredMessage {
        &self.envelope
    }

    pub fn content_type(&self) -> Option<&str> {
        self.envelope.content_type()
    }

    pub fn message_annotations(&self) -> Option<&AmqpMap> {
        self.envelope.message_annotations()
    }
}

pub type Amqp10Message = StoredMessage<Amqp10Metadata>;

impl StoredMessage<Amqp10Metadata> {
    /// 由结构化消息零拷贝构建：消息体节区的原始编码成为内容。
    pub fn from_structured(message: StructuredMessage) -> Result<Self, BufferError> {
        let (envelope, body) = message.split_body();
        let mut content = Vec::new();
        for section in &body {
            content.extend(section.encoded().duplicate()?);
        }
        Ok(Self::new(Amqp10Metadata { envelope }, content))
    }

    /// 解码完整的线上字节。
    pub fn decode(
        pool: &BufferPool,
        registry: &AmqpTypeRegistry,
        config: &DecoderConfig,
        wire: &[u8],
    ) -> Result<Self, CodecError> {
        let message = registry.section_decoder(config).decode_bytes(pool, wire)?;
        Ok(Self::from_structured(message)?)
    }

    /// 重新解析内容中的消息体节区。
    pub fn body_sections(
        &self,
        registry: &AmqpTypeRegistry,
        config: &DecoderConfig,
    ) -> Result<Vec<Section>, CodecError> {
        let views = self.content(0, self.content_size())?;
        registry.section_decoder(config).parse_all(views)
    }

    /// 信封节区与内容拼接后的完整线上字节。
    pub fn to_wire(&self) -> Result<Bytes, BufferError> {
        let envelope = self.metadata().envelope.to_wire()?;
        let mut out = BytesMut::with_capacity(envelope.len() + self.content_size());
        out.extend_from_slice(&envelope);
        out.extend_from_slice(&self.content_bytes()?);
        Ok(out.freeze())
    }
}

/// 内部对象消息：消息体直接是值。
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InternalMessage {
    pub body: Value,
    pub mime_type: Option<String>,
    pub properties: MessageProperties,
}

impl InternalMessage {
    pub fn new(body: impl Into<Value>) -> Self {
        Self {
            body: body.into(),
            ..Self::default()
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn with_properties(mut self, properties: MessageProperties) -> Self {
        self.properties = properties;
        self
    }
}

/// 转换的输入：三种消息表示之一。
#[derive(Debug)]
pub enum SourceMessage {
    Legacy(LegacyMessage),
    Amqp10(Amqp10Message),
    Internal(InternalMessage),
}

impl SourceMessage {
    pub fn protocol(&self) -> Protocol {
        match self {
            Self::Legacy(message) => message.metadata().protocol,
            Self::Amqp10(_) => Protocol::V1_0,
            Self::Internal(_) => Protocol::Internal,
        }
    }
}

impl From<LegacyMessage> for SourceMessage {
    fn from(message: LegacyMessage) -> Self {
        Self::Legacy(message)
    }
}

impl From<Amqp10Message> for SourceMessage {
    fn from(message: Amqp10Message) -> Self {
        Self::Amqp10(message)
    }
}

impl From<InternalMessage> for SourceMessage {
    fn from(message: InternalMessage) -> Self {
        Self::Internal(message)
    }
}

/// 一次转换的产物。
///
/// # 契约说明（What）
/// - `content` 为目标协议的内容字节：遗留协议是消息体本身，1.0 是编码后的消息体节区，
///   内部模型是消息体值的对象流编码；
/// - `mime_type` 在 1.0 目标上写入 `properties.content-type`；
/// - `message_kind` 仅对 1.0 目标有意义，写成消息种类注解。
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedMessage {
    pub target: Protocol,
    pub content: Bytes,
    pub mime_type: Option<String>,
    pub message_kind: Option<JmsMessageKind>,
    pub properties: MessageProperties,
}

impl ConvertedMessage {
    pub fn new(target: Protocol, content: Bytes, properties: MessageProperties) -> Self {
        Self {
            target,
            content,
            mime_type: None,
            message_kind: None,
            properties,
        }
    }

    pub fn with_mime_type(mut self, mime_type: Option<&str>) -> Self {
        self.mime_type = mime_type.map(str::to_owned);
        self
    }

    pub fn with_message_kind(mut self, kind: Option<JmsMessageKind>) -> Self {
        self.message_kind = kind;
        self
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_ranges_span_fragments() {
        let pool = BufferPool::new();
        let message = StoredMessage::new(
            (),
            vec![
                pool.wrap(b"hello").expect("分配失败"),
                pool.wrap(b"world").expect("分配失败"),
            ],
        );
        assert_eq!(message.content_size(), 10);
        let views = message.content(3, 4).expect("范围合法");
        let bytes: Vec<u8> = views
            .iter()
            .flat_map(|view| view.copy_remaining().expect("视图有效"))
            .collect();
        assert_eq!(bytes, b"lowo");
        assert!(matches!(
            message.content(8, 3),
            Err(BufferError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn reading_content_leaves_stored_views_untouched() {
        let pool = BufferPool::new();
        let message = StoredMessage::from_bytes((), &pool, b"abc").expect("分配失败");
        let mut chain = message.content_chain().expect("视图有效");
        chain.advance(3).expect("可前进");
        assert_eq!(message.content_bytes().expect("视图有效").as_ref(), b"abc");
    }
}
