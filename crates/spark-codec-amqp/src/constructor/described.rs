use spark_buffer::ViewChain;

use crate::{
    error::CodecError,
    handler::ValueHandler,
    types::{Descriptor, Value},
};

/// 描述类型构造器：在描述符之后接管剩余字节。
///
/// # 契约说明（What）
/// - 调用前 `ValueHandler` 已读出描述符并完成注册表查找；
/// - 默认实现读出紧随其后的一个值，再交给 [`construct_from`](Self::construct_from) 校验布局；
/// - 数组中的描述元素由数组构造器先解出底层值，同样经 `construct_from` 收尾。
pub trait DescribedTypeConstructor: Send + Sync {
    /// 类型名，用于诊断。
    fn name(&self) -> &str;

    /// 从输入流解码被描述的值。
    fn construct(
        &self,
        descriptor: Descriptor,
        input: &mut ViewChain,
        handler: &ValueHandler<'_>,
    ) -> Result<Value, CodecError> {
        let value = handler.read_value(input)?;
        self.construct_from(descriptor, value)
    }

    /// 校验已解码的底层值并生成最终结果。
    fn construct_from(&self, descriptor: Descriptor, value: Value) -> Result<Value, CodecError>;
}

/// 复合类型的编码形态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeShape {
    List,
    Map,
    Binary,
    Any,
}

impl CompositeShape {
    fn accepts(self, value: &Value) -> bool {
        match self {
            Self::List => matches!(value, Value::List(_)),
            Self::Map => matches!(value, Value::Map(_)),
            Self::Binary => matches!(value, Value::Binary(_)),
            Self::Any => true,
        }
    }
}

/// 复合类型元数据：符号名、数值编码与编码形态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositeType {
    pub name: &'static str,
    pub code: u64,
    pub shape: CompositeShape,
}

impl CompositeType {
    pub const fn new(name: &'static str, code: u64, shape: CompositeShape) -> Self {
        Self { name, code, shape }
    }

    /// 同一类型的两个描述符别名。
    pub fn descriptors(&self) -> [Descriptor; 2] {
        [Descriptor::symbol(self.name), Descriptor::code(self.code)]
    }
}

/// 表驱动的复合类型构造器。
///
/// 无论线上出现的是符号别名还是数值别名，产出的描述符统一规范为数值形式。
#[derive(Debug, Clone, Copy)]
pub struct CompositeConstructor {
    ty: CompositeType,
}

impl CompositeConstructor {
    pub const fn new(ty: CompositeType) -> Self {
        Self { ty }
    }

    pub fn composite_type(&self) -> &CompositeType {
        &self.ty
    }
}

impl DescribedTypeConstructor for CompositeConstructor {
    fn name(&self) -> &str {
        self.ty.name
    }

    fn construct_from(&self, _descriptor: Descriptor, value: Value) -> Result<Value, CodecError> {
        if !self.ty.shape.accepts(&value) {
            return Err(CodecError::decode(format!(
                "{} cannot be encoded as {}",
                self.ty.name,
                value.type_name()
            )));
        }
        Ok(Value::described(Descriptor::code(self.ty.code), value))
    }
}
