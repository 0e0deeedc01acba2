use std::{collections::HashMap, fmt, sync::Arc};

use crate::{
    config::DecoderConfig,
    constructor::{CompositeConstructor, CompositeShape, CompositeType, DescribedTypeConstructor},
    error::CodecError,
    handler::ValueHandler,
    section::{
        AmqpSequenceConstructor, AmqpValueConstructor, AnnotationsConstructor, DataConstructor,
        HeaderConstructor, PropertiesConstructor, SectionConstructor, SectionDecoder, SectionKind,
    },
    types::{Descriptor, Symbol},
};

/// 描述符到构造器的映射。
///
/// # 设计背景（Why）
/// - AMQP 1.0 复合类型可以用符号名或数值编码两种别名出现在线上，
///   解析结果必须与别名形式无关；
/// - 值构造器与节区构造器的查找规则完全相同，因此以泛型参数 `C` 复用同一实现。
///
/// # 契约说明（What）
/// - `register_aliases` 把同一个 `Arc<C>` 挂到多个别名上，查找任一别名得到同一实例；
/// - `lookup` 未命中返回 [`CodecError::UnknownDescriptor`]，从不回退或跳过。
pub struct DescribedTypeRegistry<C: ?Sized> {
    by_symbol: HashMap<Symbol, Arc<C>>,
    by_code: HashMap<u64, Arc<C>>,
}

/// 值层面的描述类型注册表。
pub type ValueRegistry = DescribedTypeRegistry<dyn DescribedTypeConstructor>;
/// 消息节区注册表。
pub type SectionRegistry = DescribedTypeRegistry<dyn SectionConstructor>;

impl<C: ?Sized> Default for DescribedTypeRegistry<C> {
    fn default() -> Self {
        Self {
            by_symbol: HashMap::new(),
            by_code: HashMap::new(),
        }
    }
}

impl<C: ?Sized> DescribedTypeRegistry<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册单个别名，返回被替换的旧构造器。
    pub fn register(&mut self, descriptor: Descriptor, constructor: Arc<C>) -> Option<Arc<C>> {
        match descriptor {
            Descriptor::Symbol(symbol) => self.by_symbol.insert(symbol, constructor),
            Descriptor::Code(code) => self.by_code.insert(code, constructor),
        }
    }

    /// 为同一构造器注册多个别名。
    pub fn register_aliases(
        &mut self,
        descriptors: impl IntoIterator<Item = Descriptor>,
        constructor: Arc<C>,
    ) {
        for descriptor in descriptors {
            self.register(descriptor, Arc::clone(&constructor));
        }
    }

    /// 查找构造器。
    pub fn lookup(&self, descriptor: &Descriptor) -> Result<&Arc<C>, CodecError> {
        let found = match descriptor {
            Descriptor::Symbol(symbol) => self.by_symbol.get(symbol),
            Descriptor::Code(code) => self.by_code.get(code),
        };
        found.ok_or_else(|| CodecError::UnknownDescriptor(descriptor.clone()))
    }

    pub fn contains(&self, descriptor: &Descriptor) -> bool {
        self.lookup(descriptor).is_ok()
    }

    /// 已注册的别名数量。
    pub fn len(&self) -> usize {
        self.by_symbol.len() + self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<C: ?Sized> fmt::Debug for DescribedTypeRegistry<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DescribedTypeRegistry")
            .field("symbols", &self.by_symbol.len())
            .field("codes", &self.by_code.len())
            .finish()
    }
}

const fn list(name: &'static str, code: u64) -> CompositeType {
    CompositeType::new(name, code, CompositeShape::List)
}

/// 传输层帧体与错误类型。
pub const TRANSPORT_TYPES: &[CompositeType] = &[
    list("amqp:open:list", 0x10),
    list("amqp:begin:list", 0x11),
    list("amqp:attach:list", 0x12),
    list("amqp:flow:list", 0x13),
    list("amqp:transfer:list", 0x14),
    list("amqp:disposition:list", 0x15),
    list("amqp:detach:list", 0x16),
    list("amqp:end:list", 0x17),
    list("amqp:close:list", 0x18),
    list("amqp:error:list", 0x1d),
];

/// 消息层：投递状态、端点描述与消息节区。
pub const MESSAGING_TYPES: &[CompositeType] = &[
    list("amqp:received:list", 0x23),
    list("amqp:accepted:list", 0x24),
    list("amqp:rejected:list", 0x25),
    list("amqp:released:list", 0x26),
    list("amqp:modified:list", 0x27),
    list("amqp:source:list", 0x28),
    list("amqp:target:list", 0x29),
    list("amqp:delete-on-close:list", 0x2b),
    list("amqp:delete-on-no-links:list", 0x2c),
    list("amqp:delete-on-no-messages:list", 0x2d),
    list("amqp:delete-on-no-links-or-messages:list", 0x2e),
    list("amqp:header:list", 0x70),
    CompositeType::new("amqp:delivery-annotations:map", 0x71, CompositeShape::Map),
    CompositeType::new("amqp:message-annotations:map", 0x72, CompositeShape::Map),
    list("amqp:properties:list", 0x73),
    CompositeType::new("amqp:application-properties:map", 0x74, CompositeShape::Map),
    CompositeType::new("amqp:data:binary", 0x75, CompositeShape::Binary),
    list("amqp:amqp-sequence:list", 0x76),
    CompositeType::new("amqp:amqp-value:*", 0x77, CompositeShape::Any),
    CompositeType::new("amqp:footer:map", 0x78, CompositeShape::Map),
];

/// 事务层。
pub const TRANSACTION_TYPES: &[CompositeType] = &[
    list("amqp:coordinator:list", 0x30),
    list("amqp:declare:list", 0x31),
    list("amqp:discharge:list", 0x32),
    list("amqp:declared:list", 0x33),
    list("amqp:transactional-state:list", 0x34),
];

/// 安全层（SASL 帧体）。
pub const SECURITY_TYPES: &[CompositeType] = &[
    list("amqp:sasl-mechanisms:list", 0x40),
    list("amqp:sasl-init:list", 0x41),
    list("amqp:sasl-challenge:list", 0x42),
    list("amqp:sasl-response:list", 0x43),
    list("amqp:sasl-outcome:list", 0x44),
];

/// 完整的 AMQP 类型注册表：值构造器 + 节区构造器。
///
/// 以构建器风格按层注册：
/// `AmqpTypeRegistry::new().register_transport_layer().register_messaging_layer()`。
#[derive(Debug, Default)]
pub struct AmqpTypeRegistry {
    values: ValueRegistry,
    sections: SectionRegistry,
}

impl AmqpTypeRegistry {
    /// 空注册表。
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册全部标准层。
    pub fn standard() -> Self {
        Self::new()
            .register_transport_layer()
            .register_messaging_layer()
            .register_transaction_layer()
            .register_security_layer()
    }

    pub fn register_transport_layer(mut self) -> Self {
        self.register_composites(TRANSPORT_TYPES);
        self
    }

    /// 注册消息层复合类型，以及九种消息节区的节区构造器。
    pub fn register_messaging_layer(mut self) -> Self {
        self.register_composites(MESSAGING_TYPES);
        self.register_section(Arc::new(HeaderConstructor));
        self.register_section(Arc::new(AnnotationsConstructor::new(
            SectionKind::DeliveryAnnotations,
        )));
        self.register_section(Arc::new(AnnotationsConstructor::new(
            SectionKind::MessageAnnotations,
        )));
        self.register_section(Arc::new(PropertiesConstructor));
        self.register_section(Arc::new(AnnotationsConstructor::new(
            SectionKind::ApplicationProperties,
        )));
        self.register_section(Arc::new(DataConstructor));
        self.register_section(Arc::new(AmqpSequenceConstructor));
        self.register_section(Arc::new(AmqpValueConstructor));
        self.register_section(Arc::new(AnnotationsConstructor::new(SectionKind::Footer)));
        self
    }

    pub fn register_transaction_layer(mut self) -> Self {
        self.register_composites(TRANSACTION_TYPES);
        self
    }

    pub fn register_security_layer(mut self) -> Self {
        self.register_composites(SECURITY_TYPES);
        self
    }

    /// 以两种别名注册一批复合类型。
    pub fn register_composites(&mut self, types: &[CompositeType]) {
        for ty in types {
            let constructor: Arc<dyn DescribedTypeConstructor> =
                Arc::new(CompositeConstructor::new(*ty));
            self.values.register_aliases(ty.descriptors(), constructor);
        }
    }

    /// 注册值构造器。
    pub fn register_value(
        &mut self,
        descriptors: impl IntoIterator<Item = Descriptor>,
        constructor: Arc<dyn DescribedTypeConstructor>,
    ) {
        self.values.register_aliases(descriptors, constructor);
    }

    /// 注册节区构造器，别名取自节区种类。
    pub fn register_section(&mut self, constructor: Arc<dyn SectionConstructor>) {
        let kind = constructor.kind();
        self.sections.register_aliases(
            [
                Descriptor::symbol(kind.symbolic_name()),
                Descriptor::code(kind.descriptor_code()),
            ],
            constructor,
        );
    }

    pub fn values(&self) -> &ValueRegistry {
        &self.values
    }

    pub fn sections(&self) -> &SectionRegistry {
        &self.sections
    }

    /// 创建一次解码调用的值处理器。
    pub fn value_handler<'a>(&'a self, config: &'a DecoderConfig) -> ValueHandler<'a> {
        ValueHandler::new(&self.values, config)
    }

    /// 创建节区解码器。
    pub fn section_decoder<'a>(&'a self, config: &'a DecoderConfig) -> SectionDecoder<'a> {
        SectionDecoder::new(self, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbolic_and_numeric_aliases_share_constructor() {
        let registry = AmqpTypeRegistry::standard();
        let by_symbol = registry
            .values()
            .lookup(&Descriptor::symbol("amqp:application-properties:map"))
            .expect("符号别名应已注册");
        let by_code = registry
            .values()
            .lookup(&Descriptor::code(0x74))
            .expect("数值别名应已注册");
        assert!(Arc::ptr_eq(by_symbol, by_code));

        let section_symbol = registry
            .sections()
            .lookup(&Descriptor::symbol("amqp:data:binary"))
            .expect("节区符号别名应已注册");
        let section_code = registry
            .sections()
            .lookup(&Descriptor::code(0x75))
            .expect("节区数值别名应已注册");
        assert!(Arc::ptr_eq(section_symbol, section_code));
    }

    #[test]
    fn unknown_descriptor_is_reported() {
        let registry = AmqpTypeRegistry::new().register_messaging_layer();
        let err = registry
            .values()
            .lookup(&Descriptor::code(0x10))
            .err().expect("未注册传输层时应失败");
        assert_eq!(err, CodecError::UnknownDescriptor(Descriptor::code(0x10)));
    }

    #[test]
    fn standard_registry_covers_every_layer() {
        let registry = AmqpTypeRegistry::standard();
        let total = TRANSPORT_TYPES.len()
            + MESSAGING_TYPES.len()
            + TRANSACTION_TYPES.len()
            + SECURITY_TYPES.len();
        assert_eq!(registry.values().len(), 2 * total);
        assert_eq!(registry.sections().len(), 18);
    }
}
