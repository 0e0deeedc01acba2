use std::sync::Arc;

use spark_buffer::BufferPool;
use spark_codec_amqp::{AmqpTypeRegistry, SectionDecoder, ValueHandler};
use tracing::debug;

use crate::{
    config::ConversionConfig,
    converter::{
        Amqp10ToInternal, Amqp10ToLegacy, InternalToAmqp10, InternalToLegacy, LegacyToAmqp10,
        LegacyToInternal, LegacyToLegacy, MessageConverter,
    },
    error::ConversionError,
    factory::MessageFactory,
    message::{ConvertedMessage, Protocol, SourceMessage},
};

/// 目标地址空间：决定哪些 1.0 地址属于本地。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AddressSpace {
    name: String,
    local_prefix: Option<String>,
}

impl AddressSpace {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            local_prefix: None,
        }
    }

    pub fn with_local_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.local_prefix = Some(prefix.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 去掉本地前缀后的地址；非本地地址原样返回。
    pub fn local_address<'a>(&self, address: &'a str) -> &'a str {
        self.local_prefix
            .as_deref()
            .and_then(|prefix| address.strip_prefix(prefix))
            .filter(|rest| !rest.is_empty())
            .unwrap_or(address)
    }
}

/// 一次或多次转换共享的上下文。
///
/// # 契约说明（What）
/// - 缓冲池、类型注册表与配置只读共享，上下文可在多个线程上并发使用；
/// - [`value_handler`](Self::value_handler) 每次返回新的解码上下文，不跨调用共享。
#[derive(Debug, Clone)]
pub struct ConversionContext {
    pool: BufferPool,
    registry: Arc<AmqpTypeRegistry>,
    config: ConversionConfig,
    address_space: AddressSpace,
}

impl ConversionContext {
    /// 依据配置创建缓冲池、标准类型注册表与默认地址空间。
    pub fn new(config: ConversionConfig) -> Self {
        let mut address_space = AddressSpace::new("default");
        if let Some(prefix) = config.local_address_prefix.clone() {
            address_space = address_space.with_local_prefix(prefix);
        }
        Self {
            pool: BufferPool::with_config(config.pool.clone()),
            registry: Arc::new(AmqpTypeRegistry::standard()),
            config,
            address_space,
        }
    }

    pub fn with_address_space(mut self, address_space: AddressSpace) -> Self {
        self.address_space = address_space;
        self
    }

    pub fn with_registry(mut self, registry: Arc<AmqpTypeRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }

    pub fn registry(&self) -> &AmqpTypeRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    pub fn address_space(&self) -> &AddressSpace {
        &self.address_space
    }

    pub fn value_handler(&self) -> ValueHandler<'_> {
        self.registry.value_handler(&self.config.decoder)
    }

    pub fn section_decoder(&self) -> SectionDecoder<'_> {
        self.registry.section_decoder(&self.config.decoder)
    }
}

impl Default for ConversionContext {
    fn default() -> Self {
        Self::new(ConversionConfig::default())
    }
}

/// 支持的有序协议对。
pub const SUPPORTED_PAIRS: [(Protocol, Protocol); 12] = [
    (Protocol::V1_0, Protocol::V0_8),
    (Protocol::V1_0, Protocol::V0_10),
    (Protocol::V1_0, Protocol::Internal),
    (Protocol::V0_8, Protocol::V1_0),
    (Protocol::V0_10, Protocol::V1_0),
    (Protocol::V0_8, Protocol::Internal),
    (Protocol::V0_10, Protocol::Internal),
    (Protocol::V0_8, Protocol::V0_10),
    (Protocol::V0_10, Protocol::V0_8),
    (Protocol::Internal, Protocol::V0_8),
    (Protocol::Internal, Protocol::V0_10),
    (Protocol::Internal, Protocol::V1_0),
];

/// 转换入口：在封闭的协议对集合上分派到具体转换器。
///
/// # 教案式说明
/// - **意图 (Why)**：调用方只持有“某种源消息”与“目标协议”，不应关心具体转换器类型；
/// - **逻辑 (How)**：对 `(源消息, 目标协议)` 穷尽匹配，构造无状态转换器并调用；
/// - **契约 (What)**：源与目标相同或协议对不在 [`SUPPORTED_PAIRS`] 中时返回
///   [`ConversionError::NoConverter`]；每次成功转换输出一条 `debug!` 事件。
#[derive(Debug, Clone, Copy, Default)]
pub struct ConverterRegistry;

impl ConverterRegistry {
    pub fn new() -> Self {
        Self
    }

    pub fn supports(&self, from: Protocol, to: Protocol) -> bool {
        SUPPORTED_PAIRS.contains(&(from, to))
    }

    pub fn convert(
        &self,
        message: &SourceMessage,
        target: Protocol,
        ctx: &ConversionContext,
    ) -> Result<ConvertedMessage, ConversionError> {
        let from = message.protocol();
        if !self.supports(from, target) {
            return Err(ConversionError::NoConverter { from, to: target });
        }
        let converted = match (message, target) {
            (SourceMessage::Amqp10(message), Protocol::Internal) => {
                Amqp10ToInternal.convert(message, ctx)?
            }
            (SourceMessage::Amqp10(message), _) => Amqp10ToLegacy::new(target)?.convert(message, ctx)?,
            (SourceMessage::Legacy(message), Protocol::V1_0) => {
                LegacyToAmqp10.convert(message, ctx)?
            }
            (SourceMessage::Legacy(message), Protocol::Internal) => {
                LegacyToInternal.convert(message, ctx)?
            }
            (SourceMessage::Legacy(message), _) => {
                LegacyToLegacy::new(from, target)?.convert(message, ctx)?
            }
            (SourceMessage::Internal(message), Protocol::V1_0) => {
                InternalToAmqp10.convert(message, ctx)?
            }
            (SourceMessage::Internal(message), _) => {
                InternalToLegacy::new(target)?.convert(message, ctx)?
            }
        };
        debug!(
            source = %from,
            target = %target,
            mime_type = ?converted.mime_type(),
            kind = ?converted.message_kind,
            content_len = converted.content.len(),
            "message converted"
        );
        Ok(converted)
    }

    /// 转换后交给目标协议的消息工厂。
    pub fn convert_with<F: MessageFactory>(
        &self,
        message: &SourceMessage,
        factory: &F,
        ctx: &ConversionContext,
    ) -> Result<F::Message, ConversionError> {
        let converted = self.convert(message, factory.protocol(), ctx)?;
        factory.create(converted, ctx)
    }
}
