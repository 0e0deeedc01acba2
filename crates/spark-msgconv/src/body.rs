//! 消息体分类与值兼容性判定。
//!
//! # 模块定位（Why）
//! - 转换规则依赖消息体的结构形态（空、文本、字节、列表、映射、其他）；
//!   形态在每个消息体上只判定一次，之后以穷尽匹配驱动编码选择；
//! - JMS 编解码器只能承载标量，AMQP 集合编解码器只能承载不含描述类型的值，
//!   两类判定集中在此处，供所有转换器共用。

use bytes::Bytes;
use spark_codec_amqp::{AmqpMap, Value};

use crate::error::ConversionError;

/// 判定后的消息体形态。
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Null,
    Text(String),
    Bytes(Bytes),
    List(Vec<Value>),
    Map(AmqpMap),
    Other(Value),
}

impl Body {
    /// 按值的结构形态分类；`array` 视为列表。
    pub fn classify(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::String(text) => Self::Text(text),
            Value::Binary(binary) => Self::Bytes(binary.into_bytes()),
            Value::List(items) | Value::Array(items) => Self::List(items),
            Value::Map(map) => Self::Map(map),
            other => Self::Other(other),
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Text(text) => Value::String(text),
            Self::Bytes(bytes) => Value::Binary(bytes.into()),
            Self::List(items) => Value::List(items),
            Self::Map(map) => Value::Map(map),
            Self::Other(value) => value,
        }
    }

    pub fn shape(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Text(_) => "text",
            Self::Bytes(_) => "bytes",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Other(value) => value.type_name(),
        }
    }
}

/// JMS 标量：JMS map/stream 编解码器能直接承载的值。
pub fn is_jms_primitive(value: &Value) -> bool {
    matches!(
        value,
        Value::Null
            | Value::Boolean(_)
            | Value::Byte(_)
            | Value::Short(_)
            | Value::Int(_)
            | Value::Long(_)
            | Value::Float(_)
            | Value::Double(_)
            | Value::Char(_)
            | Value::String(_)
            | Value::Binary(_)
    )
}

/// 列表元素全部是 JMS 标量。
pub fn is_jms_list(items: &[Value]) -> bool {
    items.iter().all(is_jms_primitive)
}

/// 键全部是字符串、值全部是 JMS 标量。
pub fn is_jms_map(map: &AmqpMap) -> bool {
    map.iter()
        .all(|(key, value)| matches!(key, Value::String(_)) && is_jms_primitive(value))
}

/// 值可由 AMQP 集合编解码器承载：不含描述类型，映射键全部是字符串。
pub fn is_amqp_compatible(value: &Value) -> bool {
    match value {
        Value::Described(_) => false,
        Value::List(items) | Value::Array(items) => items.iter().all(is_amqp_compatible),
        Value::Map(map) => map.iter().all(|(key, value)| {
            matches!(key, Value::String(_)) && is_amqp_compatible(value)
        }),
        _ => true,
    }
}

/// 离开 1.0 时的值归一化。
///
/// # 契约说明（What）
/// - `symbol` → 字符串，`timestamp` → `long`，`array` → 列表；
/// - 无符号整数无损放宽到更宽的有符号类型，超过 `i64::MAX` 的 `ulong` 失败；
/// - `decimal*` 与描述类型没有遗留侧表示，返回 [`ConversionError::UnsupportedValue`]；
/// - 列表与映射递归处理，任何一个元素失败则整体失败。
pub fn normalize(value: Value) -> Result<Value, ConversionError> {
    Ok(match value {
        Value::Symbol(symbol) => Value::String(symbol.into_string()),
        Value::Timestamp(millis) => Value::Long(millis),
        Value::Ubyte(v) => Value::Short(i16::from(v)),
        Value::Ushort(v) => Value::Int(i32::from(v)),
        Value::Uint(v) => Value::Long(i64::from(v)),
        Value::Ulong(v) => Value::Long(
            i64::try_from(v).map_err(|_| ConversionError::unsupported("ulong", "signed long"))?,
        ),
        Value::List(items) | Value::Array(items) => Value::List(
            items
                .into_iter()
                .map(normalize)
                .collect::<Result<_, _>>()?,
        ),
        Value::Map(map) => Value::Map(
            map.into_iter()
                .map(|(key, value)| Ok((normalize(key)?, normalize(value)?)))
                .collect::<Result<AmqpMap, ConversionError>>()?,
        ),
        value @ (Value::Decimal32(_)
        | Value::Decimal64(_)
        | Value::Decimal128(_)
        | Value::Described(_)) => {
            return Err(ConversionError::unsupported(
                value.type_name(),
                "legacy message body",
            ));
        }
        other => other,
    })
}
