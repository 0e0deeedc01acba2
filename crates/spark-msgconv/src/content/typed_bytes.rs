//! JMS 类型化字节流：map/stream 消息共用的标量编码。
//!
//! 每个值以一字节类型码开头，其后为大端负载；字符串与映射键以 NUL 结尾。

use bytes::{BufMut, BytesMut};
use spark_buffer::{BufferError, ViewChain};
use spark_codec_amqp::{Binary, Value};

use crate::error::ConversionError;

const BOOLEAN: u8 = 1;
const BYTE: u8 = 2;
const BYTE_ARRAY: u8 = 3;
const SHORT: u8 = 4;
const CHAR: u8 = 5;
const INT: u8 = 6;
const LONG: u8 = 7;
const FLOAT: u8 = 8;
const DOUBLE: u8 = 9;
const STRING: u8 = 10;
const NULL: u8 = 11;

const CONTEXT: &str = "JMS typed bytes";

/// 写出一个带类型码的标量。
pub(crate) fn write_value(value: &Value, out: &mut BytesMut) -> Result<(), ConversionError> {
    match value {
        Value::Null => out.put_u8(NULL),
        Value::Boolean(flag) => {
            out.put_u8(BOOLEAN);
            out.put_u8(u8::from(*flag));
        }
        Value::Byte(v) => {
            out.put_u8(BYTE);
            out.put_i8(*v);
        }
        Value::Short(v) => {
            out.put_u8(SHORT);
            out.put_i16(*v);
        }
        Value::Char(c) => {
            let mut units = [0u16; 2];
            let [unit] = *c.encode_utf16(&mut units) else {
                return Err(ConversionError::unsupported("char", CONTEXT));
            };
            out.put_u8(CHAR);
            out.put_u16(unit);
        }
        Value::Int(v) => {
            out.put_u8(INT);
            out.put_i32(*v);
        }
        Value::Long(v) => {
            out.put_u8(LONG);
            out.put_i64(*v);
        }
        Value::Float(v) => {
            out.put_u8(FLOAT);
            out.put_f32(*v);
        }
        Value::Double(v) => {
            out.put_u8(DOUBLE);
            out.put_f64(*v);
        }
        Value::String(text) => {
            out.put_u8(STRING);
            write_string(text, out)?;
        }
        Value::Binary(binary) => {
            let len = i32::try_from(binary.len())
                .map_err(|_| ConversionError::unsupported("binary", CONTEXT))?;
            out.put_u8(BYTE_ARRAY);
            out.put_i32(len);
            out.put_slice(binary.as_slice());
        }
        other => return Err(ConversionError::unsupported(other.type_name(), CONTEXT)),
    }
    Ok(())
}

/// 写出 NUL 结尾的 UTF-8 字符串；内嵌 NUL 无法表示。
pub(crate) fn write_string(text: &str, out: &mut BytesMut) -> Result<(), ConversionError> {
    if text.contains('\0') {
        return Err(ConversionError::unsupported("string with NUL", CONTEXT));
    }
    out.put_slice(text.as_bytes());
    out.put_u8(0);
    Ok(())
}

/// 按类型码读取标量。
pub(crate) struct TypedBytesReader<'c> {
    input: &'c mut ViewChain,
    mime_type: &'static str,
}

impl<'c> TypedBytesReader<'c> {
    pub(crate) fn new(input: &'c mut ViewChain, mime_type: &'static str) -> Self {
        Self { input, mime_type }
    }

    pub(crate) fn has_remaining(&self) -> bool {
        self.input.remaining() > 0
    }

    pub(crate) fn read_int(&mut self) -> Result<i32, ConversionError> {
        self.input.get_int().map_err(|error| self.truncated(error))
    }

    pub(crate) fn read_value(&mut self) -> Result<Value, ConversionError> {
        let code = self.input.get().map_err(|error| self.truncated(error))?;
        let value = match code {
            NULL => Value::Null,
            BOOLEAN => match self.byte()? {
                0 => Value::Boolean(false),
                1 => Value::Boolean(true),
                other => return Err(self.invalid(format!("boolean byte 0x{other:02x}"))),
            },
            BYTE => Value::Byte(self.byte()? as i8),
            SHORT => Value::Short(i16::from_be_bytes(self.array()?)),
            CHAR => {
                let unit = u16::from_be_bytes(self.array()?);
                let c = char::from_u32(u32::from(unit))
                    .ok_or_else(|| self.invalid(format!("unpaired surrogate 0x{unit:04x}")))?;
                Value::Char(c)
            }
            INT => Value::Int(self.read_int()?),
            LONG => Value::Long(i64::from_be_bytes(self.array()?)),
            FLOAT => Value::Float(f32::from_be_bytes(self.array()?)),
            DOUBLE => Value::Double(f64::from_be_bytes(self.array()?)),
            STRING => Value::String(self.read_string()?),
            BYTE_ARRAY => match self.read_int()? {
                -1 => Value::Null,
                len if len < 0 => return Err(self.invalid(format!("byte array length {len}"))),
                len => {
                    let len = len as usize;
                    if !self.input.has_remaining(len) {
                        return Err(self.invalid(format!(
                            "byte array of {len} bytes exceeds remaining {}",
                            self.input.remaining()
                        )));
                    }
                    let mut bytes = vec![0u8; len];
                    self.input
                        .copy_to_slice(&mut bytes)
                        .map_err(|error| self.truncated(error))?;
                    Value::Binary(Binary::from(bytes))
                }
            },
            other => return Err(self.invalid(format!("unknown type code {other}"))),
        };
        Ok(value)
    }

    /// 读取 NUL 结尾的 UTF-8 字符串。
    pub(crate) fn read_string(&mut self) -> Result<String, ConversionError> {
        let mut bytes = Vec::new();
        loop {
            match self.byte()? {
                0 => break,
                byte => bytes.push(byte),
            }
        }
        String::from_utf8(bytes).map_err(|error| self.invalid(error.to_string()))
    }

    fn byte(&mut self) -> Result<u8, ConversionError> {
        self.input.get().map_err(|error| self.truncated(error))
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], ConversionError> {
        self.input
            .get_array::<N>()
            .map_err(|error| self.truncated(error))
    }

    fn truncated(&self, error: BufferError) -> ConversionError {
        match error {
            BufferError::InsufficientData { .. } => {
                ConversionError::invalid_content(self.mime_type, error.to_string())
            }
            other => ConversionError::Buffer(other),
        }
    }

    fn invalid(&self, reason: String) -> ConversionError {
        ConversionError::invalid_content(self.mime_type, reason)
    }
}
