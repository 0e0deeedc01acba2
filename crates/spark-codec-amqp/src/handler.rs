use std::cell::Cell;

use spark_buffer::ViewChain;

use crate::{
    config::DecoderConfig,
    constructor::{DescribedTypeConstructor, TypeConstructor, primitive_constructor},
    error::CodecError,
    format_code as fc,
    registry::ValueRegistry,
    types::{Descriptor, Value},
};

/// `ValueHandler` 是一次解码调用的上下文：格式码分派、描述类型查找与嵌套深度控制。
///
/// # 设计背景（Why）
/// - AMQP 1.0 值自描述：每个值以格式码开头，`0x00` 表示其后紧跟描述符与被描述值；
/// - 递归结构（列表嵌套列表）需要统一的深度上限，防止恶意输入耗尽栈空间。
///
/// # 逻辑解析（How）
/// - 普通格式码查原语表（[`primitive_constructor`]）；
/// - `0x00` 先递归读出描述符（只接受 `symbol` 或 `ulong`），再查注册表并把剩余字节交给构造器；
/// - 深度以 `Cell` 计数，构造器持有 `&ValueHandler` 即可递归。
///
/// # 契约说明（What）
/// - 未注册的描述符返回 [`CodecError::UnknownDescriptor`]，除非配置允许保留为不透明值；
/// - 处理器不可跨线程共享（`Cell`），每次解码调用创建一个。
pub struct ValueHandler<'r> {
    registry: &'r ValueRegistry,
    config: &'r DecoderConfig,
    depth: Cell<usize>,
}

impl<'r> ValueHandler<'r> {
    pub fn new(registry: &'r ValueRegistry, config: &'r DecoderConfig) -> Self {
        Self {
            registry,
            config,
            depth: Cell::new(0),
        }
    }

    /// 解码下一个完整的值。
    pub fn read_value(&self, input: &mut ViewChain) -> Result<Value, CodecError> {
        let code = input.get()?;
        if code == fc::DESCRIBED {
            return self.nested(|| self.read_described(input));
        }
        let constructor = primitive_constructor(code)
            .ok_or_else(|| CodecError::decode(format!("unknown format code 0x{code:02x}")))?;
        constructor.construct(input, self)
    }

    /// 在 `0x00` 之后读取描述符。
    pub fn read_descriptor(&self, input: &mut ViewChain) -> Result<Descriptor, CodecError> {
        let value = self.read_value(input)?;
        let type_name = value.type_name();
        Descriptor::from_value(value).ok_or_else(|| {
            CodecError::decode(format!(
                "descriptor must be symbol or ulong, found {type_name}"
            ))
        })
    }

    fn read_described(&self, input: &mut ViewChain) -> Result<Value, CodecError> {
        let descriptor = self.read_descriptor(input)?;
        match self.registry.lookup(&descriptor) {
            Ok(constructor) => constructor.construct(descriptor, input, self),
            Err(CodecError::UnknownDescriptor(_)) if self.config.allow_unknown_descriptors => {
                let value = self.read_value(input)?;
                Ok(Value::described(descriptor, value))
            }
            Err(err) => Err(err),
        }
    }

    /// 读取数组的元素构造器（可带描述符）。
    pub(crate) fn read_array_element(
        &self,
        input: &mut ViewChain,
    ) -> Result<ArrayElement<'r>, CodecError> {
        let mut code = input.get()?;
        let mut described = None;
        if code == fc::DESCRIBED {
            let descriptor = self.read_descriptor(input)?;
            let constructor = match self.registry.lookup(&descriptor) {
                Ok(constructor) => Some(constructor.as_ref()),
                Err(CodecError::UnknownDescriptor(_)) if self.config.allow_unknown_descriptors => {
                    None
                }
                Err(err) => return Err(err),
            };
            described = Some((descriptor, constructor));
            code = input.get()?;
        }
        let constructor = primitive_constructor(code).ok_or_else(|| {
            CodecError::decode(format!("invalid array element constructor 0x{code:02x}"))
        })?;
        Ok(ArrayElement {
            described,
            constructor,
        })
    }

    /// 进入一层嵌套；超出配置深度返回 `Decode`。
    pub(crate) fn nested<R>(
        &self,
        f: impl FnOnce() -> Result<R, CodecError>,
    ) -> Result<R, CodecError> {
        let depth = self.depth.get() + 1;
        if depth > self.config.max_nesting_depth {
            return Err(CodecError::decode(format!(
                "nesting depth exceeds {}",
                self.config.max_nesting_depth
            )));
        }
        self.depth.set(depth);
        let result = f();
        self.depth.set(depth - 1);
        result
    }
}

/// 数组元素构造器。
pub(crate) struct ArrayElement<'r> {
    described: Option<(Descriptor, Option<&'r dyn DescribedTypeConstructor>)>,
    constructor: &'static dyn TypeConstructor,
}

impl ArrayElement<'_> {
    pub(crate) fn construct(
        &self,
        input: &mut ViewChain,
        handler: &ValueHandler<'_>,
    ) -> Result<Value, CodecError> {
        let value = self.constructor.construct(input, handler)?;
        match &self.described {
            None => Ok(value),
            Some((descriptor, Some(constructor))) => {
                constructor.construct_from(descriptor.clone(), value)
            }
            Some((descriptor, None)) => Ok(Value::described(descriptor.clone(), value)),
        }
    }
}
