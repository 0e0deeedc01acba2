//! 类型构造器：把一段编码字节还原为 [`Value`]。
//!
//! - 定宽原语按宽度参数化（[`FixedWidthConstructor`]、[`CharConstructor`]）；
//! - 变长原语按长度字段宽度参数化（[`VariableWidthConstructor`]）；
//! - 复合编码（列表、映射、数组）递归委托给 [`ValueHandler`]；
//! - 描述类型由注册表中的 [`DescribedTypeConstructor`] 负责。

mod compound;
mod described;
mod fixed;
mod variable;

use spark_buffer::ViewChain;

use crate::{error::CodecError, format_code as fc, handler::ValueHandler, types::Value};

pub use self::{
    compound::{ArrayConstructor, ListConstructor, MapConstructor},
    described::{CompositeConstructor, CompositeShape, CompositeType, DescribedTypeConstructor},
    fixed::{CharConstructor, FixedKind, FixedWidthConstructor},
    variable::{SizeWidth, VariableKind, VariableWidthConstructor},
};

/// 原语类型构造器。
pub trait TypeConstructor: Send + Sync {
    /// 类型名，用于诊断。
    fn name(&self) -> &'static str;

    /// 在格式码之后解码一个值。
    fn construct(
        &self,
        input: &mut ViewChain,
        handler: &ValueHandler<'_>,
    ) -> Result<Value, CodecError>;
}

macro_rules! fixed_constructors {
    ($($name:ident => $kind:ident),* $(,)?) => {
        $(static $name: FixedWidthConstructor = FixedWidthConstructor::new(FixedKind::$kind);)*
    };
}

fixed_constructors! {
    NULL => Null,
    TRUE => True,
    FALSE => False,
    UINT0 => Uint0,
    ULONG0 => Ulong0,
    LIST0 => List0,
    BOOLEAN => Boolean,
    UBYTE => Ubyte,
    BYTE => Byte,
    SMALLUINT => SmallUint,
    SMALLULONG => SmallUlong,
    SMALLINT => SmallInt,
    SMALLLONG => SmallLong,
    USHORT => Ushort,
    SHORT => Short,
    UINT => Uint,
    INT => Int,
    FLOAT => Float,
    DECIMAL32 => Decimal32,
    ULONG => Ulong,
    LONG => Long,
    DOUBLE => Double,
    TIMESTAMP => Timestamp,
    DECIMAL64 => Decimal64,
    DECIMAL128 => Decimal128,
    UUID => Uuid,
}

static CHAR: CharConstructor = CharConstructor;
static VBIN8: VariableWidthConstructor =
    VariableWidthConstructor::new(SizeWidth::One, VariableKind::Binary);
static VBIN32: VariableWidthConstructor =
    VariableWidthConstructor::new(SizeWidth::Four, VariableKind::Binary);
static STR8: VariableWidthConstructor =
    VariableWidthConstructor::new(SizeWidth::One, VariableKind::String);
static STR32: VariableWidthConstructor =
    VariableWidthConstructor::new(SizeWidth::Four, VariableKind::String);
static SYM8: VariableWidthConstructor =
    VariableWidthConstructor::new(SizeWidth::One, VariableKind::Symbol);
static SYM32: VariableWidthConstructor =
    VariableWidthConstructor::new(SizeWidth::Four, VariableKind::Symbol);
static LIST8: ListConstructor = ListConstructor::new(SizeWidth::One);
static LIST32: ListConstructor = ListConstructor::new(SizeWidth::Four);
static MAP8: MapConstructor = MapConstructor::new(SizeWidth::One);
static MAP32: MapConstructor = MapConstructor::new(SizeWidth::Four);
static ARRAY8: ArrayConstructor = ArrayConstructor::new(SizeWidth::One);
static ARRAY32: ArrayConstructor = ArrayConstructor::new(SizeWidth::Four);

/// 按格式码查找原语构造器；`0x00`（描述类型）与未知格式码返回 `None`。
pub fn primitive_constructor(code: u8) -> Option<&'static dyn TypeConstructor> {
    let constructor: &'static dyn TypeConstructor = match code {
        fc::NULL => &NULL,
        fc::BOOLEAN_TRUE => &TRUE,
        fc::BOOLEAN_FALSE => &FALSE,
        fc::UINT0 => &UINT0,
        fc::ULONG0 => &ULONG0,
        fc::LIST0 => &LIST0,
        fc::BOOLEAN => &BOOLEAN,
        fc::UBYTE => &UBYTE,
        fc::BYTE => &BYTE,
        fc::SMALLUINT => &SMALLUINT,
        fc::SMALLULONG => &SMALLULONG,
        fc::SMALLINT => &SMALLINT,
        fc::SMALLLONG => &SMALLLONG,
        fc::USHORT => &USHORT,
        fc::SHORT => &SHORT,
        fc::UINT => &UINT,
        fc::INT => &INT,
        fc::FLOAT => &FLOAT,
        fc::CHAR => &CHAR,
        fc::DECIMAL32 => &DECIMAL32,
        fc::ULONG => &ULONG,
        fc::LONG => &LONG,
        fc::DOUBLE => &DOUBLE,
        fc::TIMESTAMP => &TIMESTAMP,
        fc::DECIMAL64 => &DECIMAL64,
        fc::DECIMAL128 => &DECIMAL128,
        fc::UUID => &UUID,
        fc::VBIN8 => &VBIN8,
        fc::VBIN32 => &VBIN32,
        fc::STR8 => &STR8,
        fc::STR32 => &STR32,
        fc::SYM8 => &SYM8,
        fc::SYM32 => &SYM32,
        fc::LIST8 => &LIST8,
        fc::LIST32 => &LIST32,
        fc::MAP8 => &MAP8,
        fc::MAP32 => &MAP32,
        fc::ARRAY8 => &ARRAY8,
        fc::ARRAY32 => &ARRAY32,
        _ => return None,
    };
    Some(constructor)
}
