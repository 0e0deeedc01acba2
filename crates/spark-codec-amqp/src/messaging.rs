//! 消息层复合类型 `header` 与 `properties` 的强类型表示。
//!
//! 两者都以列表编码：字段按位置排列，`null` 表示缺省；编码时省略尾部的 `null` 字段。

use crate::{
    error::CodecError,
    types::{Binary, Symbol, Value},
};

/// 按位置消费复合类型列表字段。
struct Fields {
    composite: &'static str,
    items: std::vec::IntoIter<Value>,
    index: usize,
}

impl Fields {
    fn new(composite: &'static str, items: Vec<Value>) -> Self {
        Self {
            composite,
            items: items.into_iter(),
            index: 0,
        }
    }

    fn next(&mut self) -> Option<Value> {
        self.index += 1;
        self.items.next().filter(|value| !value.is_null())
    }

    fn mismatch(&self, expected: &str, found: &Value) -> CodecError {
        CodecError::decode(format!(
            "{} field {} expects {expected}, found {}",
            self.composite,
            self.index - 1,
            found.type_name()
        ))
    }

    fn boolean(&mut self) -> Result<Option<bool>, CodecError> {
        match self.next() {
            None => Ok(None),
            Some(Value::Boolean(v)) => Ok(Some(v)),
            Some(other) => Err(self.mismatch("boolean", &other)),
        }
    }

    fn ubyte(&mut self) -> Result<Option<u8>, CodecError> {
        match self.next() {
            None => Ok(None),
            Some(Value::Ubyte(v)) => Ok(Some(v)),
            Some(other) => Err(self.mismatch("ubyte", &other)),
        }
    }

    fn uint(&mut self) -> Result<Option<u32>, CodecError> {
        match self.next() {
            None => Ok(None),
            Some(Value::Uint(v)) => Ok(Some(v)),
            Some(other) => Err(self.mismatch("uint", &other)),
        }
    }

    fn string(&mut self) -> Result<Option<String>, CodecError> {
        match self.next() {
            None => Ok(None),
            Some(Value::String(v)) => Ok(Some(v)),
            Some(other) => Err(self.mismatch("string", &other)),
        }
    }

    fn symbol(&mut self) -> Result<Option<Symbol>, CodecError> {
        match self.next() {
            None => Ok(None),
            Some(Value::Symbol(v)) => Ok(Some(v)),
            Some(other) => Err(self.mismatch("symbol", &other)),
        }
    }

    fn binary(&mut self) -> Result<Option<Binary>, CodecError> {
        match self.next() {
            None => Ok(None),
            Some(Value::Binary(v)) => Ok(Some(v)),
            Some(other) => Err(self.mismatch("binary", &other)),
        }
    }

    fn timestamp(&mut self) -> Result<Option<i64>, CodecError> {
        match self.next() {
            None => Ok(None),
            Some(Value::Timestamp(v)) => Ok(Some(v)),
            Some(other) => Err(self.mismatch("timestamp", &other)),
        }
    }

    /// 消息标识只允许 `ulong`/`uuid`/`binary`/`string`。
    fn message_id(&mut self) -> Result<Option<Value>, CodecError> {
        match self.next() {
            None => Ok(None),
            Some(
                value @ (Value::Ulong(_) | Value::Uuid(_) | Value::Binary(_) | Value::String(_)),
            ) => Ok(Some(value)),
            Some(other) => Err(self.mismatch("message-id", &other)),
        }
    }
}

fn trim_trailing_nulls(mut fields: Vec<Value>) -> Vec<Value> {
    while fields.last().is_some_and(Value::is_null) {
        fields.pop();
    }
    fields
}

/// `header` 节区：投递相关的传输语义。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header {
    pub durable: Option<bool>,
    pub priority: Option<u8>,
    pub ttl: Option<u32>,
    pub first_acquirer: Option<bool>,
    pub delivery_count: Option<u32>,
}

impl Header {
    /// 未显式设置优先级时的默认值。
    pub const DEFAULT_PRIORITY: u8 = 4;

    pub fn from_fields(fields: Vec<Value>) -> Result<Self, CodecError> {
        let mut fields = Fields::new("amqp:header:list", fields);
        Ok(Self {
            durable: fields.boolean()?,
            priority: fields.ubyte()?,
            ttl: fields.uint()?,
            first_acquirer: fields.boolean()?,
            delivery_count: fields.uint()?,
        })
    }

    pub fn to_fields(&self) -> Vec<Value> {
        trim_trailing_nulls(vec![
            self.durable.into(),
            self.priority.into(),
            self.ttl.into(),
            self.first_acquirer.into(),
            self.delivery_count.into(),
        ])
    }

    pub fn is_durable(&self) -> bool {
        self.durable.unwrap_or(false)
    }

    pub fn effective_priority(&self) -> u8 {
        self.priority.unwrap_or(Self::DEFAULT_PRIORITY)
    }
}

/// `properties` 节区：不可变的消息属性。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    pub message_id: Option<Value>,
    pub user_id: Option<Binary>,
    pub to: Option<String>,
    pub subject: Option<String>,
    pub reply_to: Option<String>,
    pub correlation_id: Option<Value>,
    pub content_type: Option<Symbol>,
    pub content_encoding: Option<Symbol>,
    pub absolute_expiry_time: Option<i64>,
    pub creation_time: Option<i64>,
    pub group_id: Option<String>,
    pub group_sequence: Option<u32>,
    pub reply_to_group_id: Option<String>,
}

impl Properties {
    pub fn from_fields(fields: Vec<Value>) -> Result<Self, CodecError> {
        let mut fields = Fields::new("amqp:properties:list", fields);
        // 尾部的扩展字段不做解析。
        Ok(Self {
            message_id: fields.message_id()?,
            user_id: fields.binary()?,
            to: fields.string()?,
            subject: fields.string()?,
            reply_to: fields.string()?,
            correlation_id: fields.message_id()?,
            content_type: fields.symbol()?,
            content_encoding: fields.symbol()?,
            absolute_expiry_time: fields.timestamp()?,
            creation_time: fields.timestamp()?,
            group_id: fields.string()?,
            group_sequence: fields.uint()?,
            reply_to_group_id: fields.string()?,
        })
    }

    pub fn to_fields(&self) -> Vec<Value> {
        let timestamp = |ts: Option<i64>| ts.map_or(Value::Null, Value::Timestamp);
        trim_trailing_nulls(vec![
            self.message_id.clone().into(),
            self.user_id.clone().into(),
            self.to.clone().into(),
            self.subject.clone().into(),
            self.reply_to.clone().into(),
            self.correlation_id.clone().into(),
            self.content_type.clone().into(),
            self.content_encoding.clone().into(),
            timestamp(self.absolute_expiry_time),
            timestamp(self.creation_time),
            self.group_id.clone().into(),
            self.group_sequence.into(),
            self.reply_to_group_id.clone().into(),
        ])
    }
}
