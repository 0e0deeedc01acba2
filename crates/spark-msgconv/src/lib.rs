//! `spark-msgconv`：内部模型、AMQP 0-8/0-10 与 AMQP 1.0 之间的消息转换引擎。
//!
//! # 模块定位（Why）
//! - 代理以一种协议接收消息，常常要以另一种协议投递；消息体、content-type 与
//!   JMS 消息种类必须跨协议保持语义；
//! - 遗留协议只有“mime 类型 + 字节”，1.0 有结构化的消息体节区，内部模型直接持有值，
//!   三者之间的映射集中在本 crate，协议层不必彼此了解。
//!
//! # 设计概要（How）
//! - [`message`]：各协议的消息表示，内容以共享存储的池化视图持有；
//! - [`content`]：按 mime 类型选择的内容编解码器（JMS stream/map、AMQP list/map、对象流）；
//! - [`converter`]：每个有序协议对一个无状态转换器；
//! - [`ConverterRegistry`]：按协议对分派，[`MessageFactory`] 把产物落成目标协议的消息。
//!
//! # 使用示例
//! ```
//! use spark_msgconv::{
//!     ConversionContext, ConverterRegistry, LegacyMessage, MessageProperties, Protocol,
//!     SourceMessage,
//! };
//!
//! let ctx = ConversionContext::default();
//! let message = LegacyMessage::legacy(
//!     ctx.pool(),
//!     Protocol::V0_8,
//!     Some("text/plain"),
//!     MessageProperties::default(),
//!     b"hello",
//! )
//! .expect("分配失败");
//! let converted = ConverterRegistry::new()
//!     .convert(&SourceMessage::from(message), Protocol::V1_0, &ctx)
//!     .expect("文本可转换");
//! // amqp-value 节区，内容为字符串 "hello"
//! assert_eq!(
//!     converted.content.as_ref(),
//!     &[0x00, 0x53, 0x77, 0xa1, 0x05, b'h', b'e', b'l', b'l', b'o']
//! );
//! assert_eq!(converted.mime_type(), Some("text/plain"));
//! ```

pub mod body;
mod config;
pub mod content;
pub mod converter;
pub mod error;
mod factory;
pub mod kind;
pub mod message;
pub mod mime;
mod registry;

pub use crate::{
    config::ConversionConfig,
    converter::{
        Amqp10ToInternal, Amqp10ToLegacy, InternalToAmqp10, InternalToLegacy, LegacyToAmqp10,
        LegacyToInternal, LegacyToLegacy, MessageConverter,
    },
    error::{ConfigError, ConversionError},
    factory::{Amqp10MessageFactory, InternalMessageFactory, LegacyMessageFactory, MessageFactory},
    kind::{JmsMessageKind, MESSAGE_KIND_ANNOTATION},
    message::{
        Amqp10Message, Amqp10Metadata, ConvertedMessage, InternalMessage, LegacyMessage,
        LegacyMetadata, MessageProperties, Protocol, SourceMessage, StoredMessage,
    },
    registry::{AddressSpace, ConversionContext, ConverterRegistry, SUPPORTED_PAIRS},
};
