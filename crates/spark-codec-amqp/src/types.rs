use std::{borrow::Borrow, fmt};

use bytes::Bytes;

/// AMQP `symbol`：ASCII 受限的标识符字符串。
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(String);

impl Symbol {
    /// 构造符号。
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// 借出底层字符串。
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 取回底层字符串。
    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Symbol {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for Symbol {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// AMQP `binary`：不可变的字节序列，克隆为 O(1)。
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct Binary(Bytes);

impl Binary {
    /// 构造二进制值。
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    /// 借出字节切片。
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// 字节长度。
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 是否为空。
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 取回底层 `Bytes`。
    pub fn into_bytes(self) -> Bytes {
        self.0
    }
}

impl AsRef<[u8]> for Binary {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Binary {
    fn from(value: Vec<u8>) -> Self {
        Self(Bytes::from(value))
    }
}

impl From<&[u8]> for Binary {
    fn from(value: &[u8]) -> Self {
        Self(Bytes::copy_from_slice(value))
    }
}

impl From<Bytes> for Binary {
    fn from(value: Bytes) -> Self {
        Self(value)
    }
}

/// 描述符：复合类型的身份标识，可以是符号名，也可以是数值编码。
///
/// # 契约说明（What）
/// - 同一逻辑类型的符号形式与数值形式在注册表中必须解析到同一个构造器；
/// - 数值编码按 AMQP 约定为 `domain-id << 32 | descriptor-id`，标准类型的 domain 为 0。
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Descriptor {
    Symbol(Symbol),
    Code(u64),
}

impl Descriptor {
    /// 以符号名构造描述符。
    pub fn symbol(name: &str) -> Self {
        Self::Symbol(Symbol::from(name))
    }

    /// 以数值编码构造描述符。
    pub const fn code(code: u64) -> Self {
        Self::Code(code)
    }

    /// 从已解码值提取描述符；只有 `symbol` 与 `ulong` 合法。
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Symbol(symbol) => Some(Self::Symbol(symbol)),
            Value::Ulong(code) => Some(Self::Code(code)),
            _ => None,
        }
    }

    /// 转换为可编码的值。
    pub fn to_value(&self) -> Value {
        match self {
            Self::Symbol(symbol) => Value::Symbol(symbol.clone()),
            Self::Code(code) => Value::Ulong(*code),
        }
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Symbol(symbol) => write!(f, "{symbol}"),
            Self::Code(code) => write!(f, "0x{:08x}:0x{:08x}", code >> 32, code & 0xffff_ffff),
        }
    }
}

/// 描述类型的值：描述符 + 被描述的底层值。
#[derive(Clone, Debug, PartialEq)]
pub struct Described {
    pub descriptor: Descriptor,
    pub value: Value,
}

/// AMQP 1.0 类型系统中的任意值。
///
/// `decimal*` 与 `uuid` 以原始字节保存，`timestamp` 为自纪元起的毫秒数。
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Ubyte(u8),
    Ushort(u16),
    Uint(u32),
    Ulong(u64),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Decimal32([u8; 4]),
    Decimal64([u8; 8]),
    Decimal128([u8; 16]),
    Char(char),
    Timestamp(i64),
    Uuid([u8; 16]),
    Binary(Binary),
    String(String),
    Symbol(Symbol),
    List(Vec<Value>),
    Map(AmqpMap),
    Array(Vec<Value>),
    Described(Box<Described>),
}

impl Value {
    /// 构造描述类型值。
    pub fn described(descriptor: Descriptor, value: Value) -> Self {
        Self::Described(Box::new(Described { descriptor, value }))
    }

    /// 类型名，用于诊断信息。
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Boolean(_) => "boolean",
            Self::Ubyte(_) => "ubyte",
            Self::Ushort(_) => "ushort",
            Self::Uint(_) => "uint",
            Self::Ulong(_) => "ulong",
            Self::Byte(_) => "byte",
            Self::Short(_) => "short",
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::Float(_) => "float",
            Self::Double(_) => "double",
            Self::Decimal32(_) => "decimal32",
            Self::Decimal64(_) => "decimal64",
            Self::Decimal128(_) => "decimal128",
            Self::Char(_) => "char",
            Self::Timestamp(_) => "timestamp",
            Self::Uuid(_) => "uuid",
            Self::Binary(_) => "binary",
            Self::String(_) => "string",
            Self::Symbol(_) => "symbol",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Array(_) => "array",
            Self::Described(_) => "described",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// 仅 `string` 变体返回文本。
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(text) => Some(text),
            _ => None,
        }
    }

    /// 描述类型的描述符。
    pub fn descriptor(&self) -> Option<&Descriptor> {
        match self {
            Self::Described(described) => Some(&described.descriptor),
            _ => None,
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

value_from! {
    bool => Boolean,
    u8 => Ubyte,
    u16 => Ushort,
    u32 => Uint,
    u64 => Ulong,
    i8 => Byte,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    char => Char,
    String => String,
    Binary => Binary,
    Symbol => Symbol,
    Vec<Value> => List,
    AmqpMap => Map,
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// 保持插入顺序的 AMQP `map`。
///
/// # 契约说明（What）
/// - 键唯一：`insert` 遇到相同键时替换旧值并返回之；
/// - 编解码保持条目顺序，保证重编码结果确定。
#[derive(Clone, Debug, PartialEq, Default)]
pub struct AmqpMap(Vec<(Value, Value)>);

impl AmqpMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    /// 插入或替换条目。
    pub fn insert(&mut self, key: impl Into<Value>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.0.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.0
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    /// 按符号键查找，注解类映射的常用入口。
    pub fn get_symbol(&self, name: &str) -> Option<&Value> {
        self.0.iter().find_map(|(key, value)| match key {
            Value::Symbol(symbol) if symbol.as_str() == name => Some(value),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, (Value, Value)> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.0.iter().map(|(key, _)| key)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.0.iter().map(|(_, value)| value)
    }
}

impl FromIterator<(Value, Value)> for AmqpMap {
    fn from_iter<I: IntoIterator<Item = (Value, Value)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl IntoIterator for AmqpMap {
    type Item = (Value, Value);
    type IntoIter = std::vec::IntoIter<(Value, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a AmqpMap {
    type Item = &'a (Value, Value);
    type IntoIter = std::slice::Iter<'a, (Value, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
