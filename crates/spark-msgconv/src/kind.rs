use std::fmt;

use spark_codec_amqp::{AmqpMap, Value};
use tracing::warn;

use crate::error::ConversionError;

/// 携带 JMS 消息种类的消息注解键。
pub const MESSAGE_KIND_ANNOTATION: &str = "x-opt-jms-msg-type";

/// JMS 层面的消息种类，以单字节注解在 1.0 消息上传递。
///
/// # 契约说明（What）
/// - 编码值固定：generic 0、object 1、map 2、bytes 3、stream 4、text 5；
/// - 写出时使用 `byte`，读取时接受任意整数类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JmsMessageKind {
    Generic,
    Object,
    Map,
    Bytes,
    Stream,
    Text,
}

impl JmsMessageKind {
    pub fn code(self) -> u8 {
        match self {
            Self::Generic => 0,
            Self::Object => 1,
            Self::Map => 2,
            Self::Bytes => 3,
            Self::Stream => 4,
            Self::Text => 5,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        Some(match code {
            0 => Self::Generic,
            1 => Self::Object,
            2 => Self::Map,
            3 => Self::Bytes,
            4 => Self::Stream,
            5 => Self::Text,
            _ => return None,
        })
    }

    /// 注解值。
    pub fn to_value(self) -> Value {
        Value::Byte(self.code() as i8)
    }

    /// 从消息注解读取种类。
    ///
    /// # 契约说明（What）
    /// - 注解缺失返回 `Ok(None)`；
    /// - 值无法识别（非整数或超出枚举范围）时记录 `warn!` 并按缺失处理；
    ///   `strict` 为 `true` 时改为返回 [`ConversionError::UnknownMessageKind`]。
    pub fn from_annotations(
        annotations: Option<&AmqpMap>,
        strict: bool,
    ) -> Result<Option<Self>, ConversionError> {
        let Some(raw) = annotations.and_then(|map| map.get_symbol(MESSAGE_KIND_ANNOTATION)) else {
            return Ok(None);
        };
        if let Some(kind) = integer(raw).and_then(Self::from_code) {
            return Ok(Some(kind));
        }
        let shown = match integer(raw) {
            Some(code) => code.to_string(),
            None => format!("of type {}", raw.type_name()),
        };
        if strict {
            return Err(ConversionError::UnknownMessageKind(shown));
        }
        warn!(
            annotation = MESSAGE_KIND_ANNOTATION,
            value = %shown,
            "ignoring unrecognized message kind annotation"
        );
        Ok(None)
    }
}

impl fmt::Display for JmsMessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Generic => "generic",
            Self::Object => "object",
            Self::Map => "map",
            Self::Bytes => "bytes",
            Self::Stream => "stream",
            Self::Text => "text",
        })
    }
}

fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Byte(v) => Some(i64::from(*v)),
        Value::Ubyte(v) => Some(i64::from(*v)),
        Value::Short(v) => Some(i64::from(*v)),
        Value::Ushort(v) => Some(i64::from(*v)),
        Value::Int(v) => Some(i64::from(*v)),
        Value::Uint(v) => Some(i64::from(*v)),
        Value::Long(v) => Some(*v),
        Value::Ulong(v) => i64::try_from(*v).ok(),
        _ => None,
    }
}
