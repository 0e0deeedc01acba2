use bytes::Bytes;
use spark_buffer::ViewChain;

use crate::{
    error::CodecError,
    handler::ValueHandler,
    types::{Binary, Symbol, Value},
};

use super::TypeConstructor;

/// 长度字段宽度：1 字节或 4 字节，均按无符号解释。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeWidth {
    One,
    Four,
}

impl SizeWidth {
    pub const fn bytes(self) -> usize {
        match self {
            Self::One => 1,
            Self::Four => 4,
        }
    }

    pub(crate) fn read(self, input: &mut ViewChain) -> Result<usize, CodecError> {
        Ok(match self {
            Self::One => usize::from(input.get()?),
            Self::Four => input.get_u32()? as usize,
        })
    }
}

/// 变长原语承载的内容类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    Binary,
    String,
    Symbol,
}

/// 变长原语构造器：长度前缀 + 内容。
///
/// # 逻辑解析（How）
/// 1. 确认长度字段完整后读出 `size`；
/// 2. 确认内容完整后经 [`ViewChain::read_contiguous`] 读取：单分片时直接借用，跨分片时先拷贝；
/// 3. 字符串按严格 UTF-8 校验，符号要求 ASCII，任何非法序列都返回 `Decode`。
#[derive(Debug, Clone, Copy)]
pub struct VariableWidthConstructor {
    size_width: SizeWidth,
    kind: VariableKind,
}

impl VariableWidthConstructor {
    pub const fn new(size_width: SizeWidth, kind: VariableKind) -> Self {
        Self { size_width, kind }
    }
}

impl TypeConstructor for VariableWidthConstructor {
    fn name(&self) -> &'static str {
        match self.kind {
            VariableKind::Binary => "binary",
            VariableKind::String => "string",
            VariableKind::Symbol => "symbol",
        }
    }

    fn construct(
        &self,
        input: &mut ViewChain,
        _handler: &ValueHandler<'_>,
    ) -> Result<Value, CodecError> {
        if !input.has_remaining(self.size_width.bytes()) {
            return Err(CodecError::decode(format!(
                "cannot construct {}: insufficient input data",
                self.name()
            )));
        }
        let size = self.size_width.read(input)?;
        if !input.has_remaining(size) {
            return Err(CodecError::decode(format!(
                "cannot construct {}: size {size} exceeds remaining {} bytes",
                self.name(),
                input.remaining()
            )));
        }
        match self.kind {
            VariableKind::Binary => {
                let bytes = input.read_contiguous(size, Bytes::copy_from_slice)?;
                Ok(Value::Binary(Binary::from(bytes)))
            }
            VariableKind::String => input
                .read_contiguous(size, |raw| std::str::from_utf8(raw).map(str::to_owned))?
                .map(Value::String)
                .map_err(|err| CodecError::decode(format!("malformed UTF-8 string: {err}"))),
            VariableKind::Symbol => input
                .read_contiguous(size, |raw| {
                    std::str::from_utf8(raw)
                        .ok()
                        .filter(|text| text.is_ascii())
                        .map(str::to_owned)
                })?
                .map(|text| Value::Symbol(Symbol::from(text)))
                .ok_or_else(|| CodecError::decode("symbol contains non-ASCII bytes")),
        }
    }
}
