//! 消息节区模型。
//!
//! # 模块定位（Why）
//! - AMQP 1.0 消息由固定顺序的节区组成，每个节区既要以强类型供转换器读取，
//!   又要保留线上原始字节供透传转发；
//! - 节区构造器与值构造器共用描述符注册机制，但产出的是 [`SectionValue`] 而非通用 [`Value`]。
//!
//! # 设计概要（How）
//! - [`SectionKind`] 枚举九种节区及其顺序等级；
//! - [`Section`] = [`SectionValue`] + [`EncodedForm`]（共享存储的原始字节视图）；
//! - [`SectionConstructor`] 在描述符之后解码节区体，由 [`SectionDecoder`] 驱动。

mod decoder;
mod message;

use std::fmt;

use bytes::{BufMut, BytesMut};
use spark_buffer::{BufferError, BufferPool, PooledView, ViewChain};

use crate::{
    encoder::encode_value,
    error::CodecError,
    handler::ValueHandler,
    messaging::{Header, Properties},
    types::{AmqpMap, Binary, Descriptor, Value},
};

pub use self::{decoder::SectionDecoder, message::StructuredMessage};

/// 节区种类。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
    Header,
    DeliveryAnnotations,
    MessageAnnotations,
    Properties,
    ApplicationProperties,
    Data,
    AmqpSequence,
    AmqpValue,
    Footer,
}

impl SectionKind {
    /// 数值描述符。
    pub const fn descriptor_code(self) -> u64 {
        match self {
            Self::Header => 0x70,
            Self::DeliveryAnnotations => 0x71,
            Self::MessageAnnotations => 0x72,
            Self::Properties => 0x73,
            Self::ApplicationProperties => 0x74,
            Self::Data => 0x75,
            Self::AmqpSequence => 0x76,
            Self::AmqpValue => 0x77,
            Self::Footer => 0x78,
        }
    }

    /// 符号描述符。
    pub const fn symbolic_name(self) -> &'static str {
        match self {
            Self::Header => "amqp:header:list",
            Self::DeliveryAnnotations => "amqp:delivery-annotations:map",
            Self::MessageAnnotations => "amqp:message-annotations:map",
            Self::Properties => "amqp:properties:list",
            Self::ApplicationProperties => "amqp:application-properties:map",
            Self::Data => "amqp:data:binary",
            Self::AmqpSequence => "amqp:amqp-sequence:list",
            Self::AmqpValue => "amqp:amqp-value:*",
            Self::Footer => "amqp:footer:map",
        }
    }

    /// 在消息中的顺序等级；三种消息体共享同一等级。
    pub const fn rank(self) -> u8 {
        match self {
            Self::Header => 0,
            Self::DeliveryAnnotations => 1,
            Self::MessageAnnotations => 2,
            Self::Properties => 3,
            Self::ApplicationProperties => 4,
            Self::Data | Self::AmqpSequence | Self::AmqpValue => 5,
            Self::Footer => 6,
        }
    }

    pub const fn is_body(self) -> bool {
        matches!(self, Self::Data | Self::AmqpSequence | Self::AmqpValue)
    }

    pub fn descriptor(self) -> Descriptor {
        Descriptor::code(self.descriptor_code())
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbolic_name())
    }
}

/// 节区的强类型内容。
#[derive(Debug, Clone, PartialEq)]
pub enum SectionValue {
    Header(Header),
    DeliveryAnnotations(AmqpMap),
    MessageAnnotations(AmqpMap),
    Properties(Properties),
    ApplicationProperties(AmqpMap),
    Data(Binary),
    AmqpSequence(Vec<Value>),
    AmqpValue(Value),
    Footer(AmqpMap),
}

impl SectionValue {
    pub fn kind(&self) -> SectionKind {
        match self {
            Self::Header(_) => SectionKind::Header,
            Self::DeliveryAnnotations(_) => SectionKind::DeliveryAnnotations,
            Self::MessageAnnotations(_) => SectionKind::MessageAnnotations,
            Self::Properties(_) => SectionKind::Properties,
            Self::ApplicationProperties(_) => SectionKind::ApplicationProperties,
            Self::Data(_) => SectionKind::Data,
            Self::AmqpSequence(_) => SectionKind::AmqpSequence,
            Self::AmqpValue(_) => SectionKind::AmqpValue,
            Self::Footer(_) => SectionKind::Footer,
        }
    }

    /// 以数值描述符表示为描述类型值。
    pub fn to_value(&self) -> Value {
        let body = match self {
            Self::Header(header) => Value::List(header.to_fields()),
            Self::Properties(properties) => Value::List(properties.to_fields()),
            Self::DeliveryAnnotations(map)
            | Self::MessageAnnotations(map)
            | Self::ApplicationProperties(map)
            | Self::Footer(map) => Value::Map(map.clone()),
            Self::Data(binary) => Value::Binary(binary.clone()),
            Self::AmqpSequence(items) => Value::List(items.clone()),
            Self::AmqpValue(value) => value.clone(),
        };
        Value::described(self.kind().descriptor(), body)
    }

    /// 追加编码到 `buf`。
    pub fn encode(&self, buf: &mut BytesMut) -> Result<(), CodecError> {
        encode_value(&self.to_value(), buf)
    }

    /// 编码到池化存储，生成可透传的节区。
    pub fn into_section(self, pool: &BufferPool) -> Result<Section, CodecError> {
        let mut scratch = BytesMut::new();
        self.encode(&mut scratch)?;
        let mut lease = pool.allocate(scratch.len())?;
        lease.put_slice(&scratch);
        let encoded = EncodedForm::new(vec![lease.freeze()]);
        Ok(Section::new(self, encoded))
    }
}

/// 节区在线上的原始字节，可能跨越多个分片。
#[derive(Debug, Default)]
pub struct EncodedForm {
    views: Vec<PooledView>,
}

impl EncodedForm {
    pub fn new(views: Vec<PooledView>) -> Self {
        Self { views }
    }

    /// 原始编码的总字节数。
    pub fn len(&self) -> usize {
        self.views.iter().map(PooledView::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn views(&self) -> &[PooledView] {
        &self.views
    }

    /// 共享存储的副本，用于零拷贝转发。
    pub fn duplicate(&self) -> Result<Vec<PooledView>, BufferError> {
        self.views
            .iter()
            .map(|view| view.view_range(0, view.len()))
            .collect()
    }

    /// 把原始字节追加到 `buf`。
    pub fn write_to(&self, buf: &mut BytesMut) -> Result<(), BufferError> {
        for view in &self.views {
            let whole = view.view_range(0, view.len())?;
            buf.put_slice(whole.remaining_slice()?);
        }
        Ok(())
    }

    pub fn to_vec(&self) -> Result<Vec<u8>, BufferError> {
        let mut buf = BytesMut::with_capacity(self.len());
        self.write_to(&mut buf)?;
        Ok(buf.to_vec())
    }
}

/// 已解码节区：强类型内容 + 原始编码。
#[derive(Debug)]
pub struct Section {
    value: SectionValue,
    encoded: EncodedForm,
}

impl Section {
    pub fn new(value: SectionValue, encoded: EncodedForm) -> Self {
        Self { value, encoded }
    }

    pub fn kind(&self) -> SectionKind {
        self.value.kind()
    }

    pub fn value(&self) -> &SectionValue {
        &self.value
    }

    pub fn encoded(&self) -> &EncodedForm {
        &self.encoded
    }

    pub fn into_parts(self) -> (SectionValue, EncodedForm) {
        (self.value, self.encoded)
    }
}

/// 节区构造器：描述符已读出并查表命中后，解码节区体。
pub trait SectionConstructor: Send + Sync {
    fn kind(&self) -> SectionKind;

    fn construct(
        &self,
        input: &mut ViewChain,
        handler: &ValueHandler<'_>,
    ) -> Result<SectionValue, CodecError>;
}

fn unexpected(kind: SectionKind, found: &Value) -> CodecError {
    CodecError::decode(format!(
        "{kind} section cannot be encoded as {}",
        found.type_name()
    ))
}

/// `header` 节区构造器。
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderConstructor;

impl SectionConstructor for HeaderConstructor {
    fn kind(&self) -> SectionKind {
        SectionKind::Header
    }

    fn construct(
        &self,
        input: &mut ViewChain,
        handler: &ValueHandler<'_>,
    ) -> Result<SectionValue, CodecError> {
        match handler.read_value(input)? {
            Value::List(fields) => Header::from_fields(fields).map(SectionValue::Header),
            other => Err(unexpected(self.kind(), &other)),
        }
    }
}

/// `properties` 节区构造器。
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertiesConstructor;

impl SectionConstructor for PropertiesConstructor {
    fn kind(&self) -> SectionKind {
        SectionKind::Properties
    }

    fn construct(
        &self,
        input: &mut ViewChain,
        handler: &ValueHandler<'_>,
    ) -> Result<SectionValue, CodecError> {
        match handler.read_value(input)? {
            Value::List(fields) => Properties::from_fields(fields).map(SectionValue::Properties),
            other => Err(unexpected(self.kind(), &other)),
        }
    }
}

/// 四种映射节区共用的构造器。
///
/// 注解类映射的键为 `symbol`（或 `ulong`），应用属性的键必须为 `string`。
#[derive(Debug, Clone, Copy)]
pub struct AnnotationsConstructor {
    kind: SectionKind,
}

impl AnnotationsConstructor {
    pub const fn new(kind: SectionKind) -> Self {
        Self { kind }
    }

    fn check_keys(&self, map: &AmqpMap) -> Result<(), CodecError> {
        for key in map.keys() {
            let valid = match self.kind {
                SectionKind::ApplicationProperties => matches!(key, Value::String(_)),
                _ => matches!(key, Value::Symbol(_) | Value::Ulong(_)),
            };
            if !valid {
                return Err(CodecError::decode(format!(
                    "{} section has {} key",
                    self.kind,
                    key.type_name()
                )));
            }
        }
        Ok(())
    }
}

impl SectionConstructor for AnnotationsConstructor {
    fn kind(&self) -> SectionKind {
        self.kind
    }

    fn construct(
        &self,
        input: &mut ViewChain,
        handler: &ValueHandler<'_>,
    ) -> Result<SectionValue, CodecError> {
        let map = match handler.read_value(input)? {
            Value::Map(map) => map,
            other => return Err(unexpected(self.kind, &other)),
        };
        self.check_keys(&map)?;
        Ok(match self.kind {
            SectionKind::DeliveryAnnotations => SectionValue::DeliveryAnnotations(map),
            SectionKind::MessageAnnotations => SectionValue::MessageAnnotations(map),
            SectionKind::ApplicationProperties => SectionValue::ApplicationProperties(map),
            _ => SectionValue::Footer(map),
        })
    }
}

/// `data` 节区构造器。
#[derive(Debug, Clone, Copy, Default)]
pub struct DataConstructor;

impl SectionConstructor for DataConstructor {
    fn kind(&self) -> SectionKind {
        SectionKind::Data
    }

    fn construct(
        &self,
        input: &mut ViewChain,
        handler: &ValueHandler<'_>,
    ) -> Result<SectionValue, CodecError> {
        match handler.read_value(input)? {
            Value::Binary(binary) => Ok(SectionValue::Data(binary)),
            other => Err(unexpected(self.kind(), &other)),
        }
    }
}

/// `amqp-sequence` 节区构造器。
#[derive(Debug, Clone, Copy, Default)]
pub struct AmqpSequenceConstructor;

impl SectionConstructor for AmqpSequenceConstructor {
    fn kind(&self) -> SectionKind {
        SectionKind::AmqpSequence
    }

    fn construct(
        &self,
        input: &mut ViewChain,
        handler: &ValueHandler<'_>,
    ) -> Result<SectionValue, CodecError> {
        match handler.read_value(input)? {
            Value::List(items) => Ok(SectionValue::AmqpSequence(items)),
            other => Err(unexpected(self.kind(), &other)),
        }
    }
}

/// `amqp-value` 节区构造器：任意单值。
#[derive(Debug, Clone, Copy, Default)]
pub struct AmqpValueConstructor;

impl SectionConstructor for AmqpValueConstructor {
    fn kind(&self) -> SectionKind {
        SectionKind::AmqpValue
    }

    fn construct(
        &self,
        input: &mut ViewChain,
        handler: &ValueHandler<'_>,
    ) -> Result<SectionValue, CodecError> {
        handler.read_value(input).map(SectionValue::AmqpValue)
    }
}
