use spark_buffer::ViewChain;

use crate::{error::CodecError, handler::ValueHandler, types::Value};

use super::TypeConstructor;

/// 定宽原语的种类；宽度由种类唯一确定。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixedKind {
    Null,
    True,
    False,
    Uint0,
    Ulong0,
    List0,
    Boolean,
    Ubyte,
    Byte,
    SmallUint,
    SmallUlong,
    SmallInt,
    SmallLong,
    Ushort,
    Short,
    Uint,
    Int,
    Float,
    Decimal32,
    Ulong,
    Long,
    Double,
    Timestamp,
    Decimal64,
    Decimal128,
    Uuid,
}

impl FixedKind {
    /// 编码宽度（字节）。
    pub const fn width(self) -> usize {
        match self {
            Self::Null | Self::True | Self::False | Self::Uint0 | Self::Ulong0 | Self::List0 => 0,
            Self::Boolean
            | Self::Ubyte
            | Self::Byte
            | Self::SmallUint
            | Self::SmallUlong
            | Self::SmallInt
            | Self::SmallLong => 1,
            Self::Ushort | Self::Short => 2,
            Self::Uint | Self::Int | Self::Float | Self::Decimal32 => 4,
            Self::Ulong | Self::Long | Self::Double | Self::Timestamp | Self::Decimal64 => 8,
            Self::Decimal128 | Self::Uuid => 16,
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::True | Self::False | Self::Boolean => "boolean",
            Self::Uint0 | Self::SmallUint | Self::Uint => "uint",
            Self::Ulong0 | Self::SmallUlong | Self::Ulong => "ulong",
            Self::List0 => "list",
            Self::Ubyte => "ubyte",
            Self::Byte => "byte",
            Self::SmallInt | Self::Int => "int",
            Self::SmallLong | Self::Long => "long",
            Self::Ushort => "ushort",
            Self::Short => "short",
            Self::Float => "float",
            Self::Decimal32 => "decimal32",
            Self::Double => "double",
            Self::Timestamp => "timestamp",
            Self::Decimal64 => "decimal64",
            Self::Decimal128 => "decimal128",
            Self::Uuid => "uuid",
        }
    }
}

/// 定宽原语构造器，按宽度参数化。
///
/// 剩余字节不足宽度时返回 `Decode`，而不是缓冲层的 `InsufficientData`。
#[derive(Debug, Clone, Copy)]
pub struct FixedWidthConstructor {
    kind: FixedKind,
}

impl FixedWidthConstructor {
    pub const fn new(kind: FixedKind) -> Self {
        Self { kind }
    }

    pub const fn kind(&self) -> FixedKind {
        self.kind
    }
}

impl TypeConstructor for FixedWidthConstructor {
    fn name(&self) -> &'static str {
        self.kind.name()
    }

    fn construct(
        &self,
        input: &mut ViewChain,
        _handler: &ValueHandler<'_>,
    ) -> Result<Value, CodecError> {
        if !input.has_remaining(self.kind.width()) {
            return Err(CodecError::decode(format!(
                "cannot construct {}: insufficient input data",
                self.name()
            )));
        }
        let value = match self.kind {
            FixedKind::Null => Value::Null,
            FixedKind::True => Value::Boolean(true),
            FixedKind::False => Value::Boolean(false),
            FixedKind::Uint0 => Value::Uint(0),
            FixedKind::Ulong0 => Value::Ulong(0),
            FixedKind::List0 => Value::List(Vec::new()),
            FixedKind::Boolean => match input.get()? {
                0 => Value::Boolean(false),
                1 => Value::Boolean(true),
                other => {
                    return Err(CodecError::decode(format!(
                        "invalid boolean encoding 0x{other:02x}"
                    )));
                }
            },
            FixedKind::Ubyte => Value::Ubyte(input.get()?),
            FixedKind::Byte => Value::Byte(input.get()? as i8),
            FixedKind::SmallUint => Value::Uint(u32::from(input.get()?)),
            FixedKind::SmallUlong => Value::Ulong(u64::from(input.get()?)),
            FixedKind::SmallInt => Value::Int(i32::from(input.get()? as i8)),
            FixedKind::SmallLong => Value::Long(i64::from(input.get()? as i8)),
            FixedKind::Ushort => Value::Ushort(input.get_u16()?),
            FixedKind::Short => Value::Short(input.get_u16()? as i16),
            FixedKind::Uint => Value::Uint(input.get_u32()?),
            FixedKind::Int => Value::Int(input.get_int()?),
            FixedKind::Float => Value::Float(f32::from_bits(input.get_u32()?)),
            FixedKind::Decimal32 => Value::Decimal32(input.get_array()?),
            FixedKind::Ulong => Value::Ulong(input.get_u64()?),
            FixedKind::Long => Value::Long(input.get_u64()? as i64),
            FixedKind::Double => Value::Double(f64::from_bits(input.get_u64()?)),
            FixedKind::Timestamp => Value::Timestamp(input.get_u64()? as i64),
            FixedKind::Decimal64 => Value::Decimal64(input.get_array()?),
            FixedKind::Decimal128 => Value::Decimal128(input.get_array()?),
            FixedKind::Uuid => Value::Uuid(input.get_array()?),
        };
        Ok(value)
    }
}

/// `char` 构造器：4 字节 UTF-32 码点。
#[derive(Debug, Clone, Copy, Default)]
pub struct CharConstructor;

impl TypeConstructor for CharConstructor {
    fn name(&self) -> &'static str {
        "char"
    }

    fn construct(
        &self,
        input: &mut ViewChain,
        _handler: &ValueHandler<'_>,
    ) -> Result<Value, CodecError> {
        if !input.has_remaining(4) {
            return Err(CodecError::decode(
                "cannot construct char: insufficient input data",
            ));
        }
        let code_point = input.get_u32()?;
        char::from_u32(code_point).map(Value::Char).ok_or_else(|| {
            CodecError::decode(format!("invalid char code point 0x{code_point:x}"))
        })
    }
}
