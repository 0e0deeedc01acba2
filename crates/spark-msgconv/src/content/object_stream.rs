//! 遗留协议约定的对象流编码。
//!
//! # 模块定位（Why）
//! - 结构化编解码器都无法承载的值，在遗留协议之间以“对象流”传递，mime 类型固定为
//!   `application/java-object-stream`；
//! - 这里只实现一个封闭的记录子集：空值、字符串、字节数组，以及承载任意 AMQP 1.0 值的数据块。
//!
//! # 线上格式（What）
//! - 流头 `AC ED 00 05`，其后恰好一条记录：
//!   - `70`：空值；
//!   - `74` + `u16` 长度 + modified UTF-8，超长字符串用 `7C` + `u64` 长度；
//!   - `75` + 固定的 `byte[]` 类描述 + `i32` 长度 + 原始字节；
//!   - `7A` + `i32` 长度 + 该值的 AMQP 1.0 编码；
//! - 记录之后不允许尾随字节。

use bytes::{BufMut, BytesMut};
use spark_buffer::{BufferError, ViewChain};
use spark_codec_amqp::{Binary, Value, ValueHandler, encode_to_vec};

use super::MimeContentCodec;
use crate::{error::ConversionError, mime};

/// 流头。
pub const STREAM_HEADER: [u8; 4] = [0xac, 0xed, 0x00, 0x05];
/// 序列化的空值。
pub const SERIALIZED_NULL: [u8; 5] = [0xac, 0xed, 0x00, 0x05, 0x70];

const TC_NULL: u8 = 0x70;
const TC_STRING: u8 = 0x74;
const TC_LONG_STRING: u8 = 0x7c;
const TC_ARRAY: u8 = 0x75;
const TC_BLOCK_DATA_LONG: u8 = 0x7a;

/// `byte[]` 的类描述：名称 `[B`、序列化 UID、标志位、零字段、描述结束、无父类。
const BYTE_ARRAY_CLASS: [u8; 18] = [
    0x72, 0x00, 0x02, 0x5b, 0x42, 0xac, 0xf3, 0x17, 0xf8, 0x06, 0x08, 0x54, 0xe0, 0x02, 0x00,
    0x00, 0x78, 0x70,
];

const MIME: &str = mime::JAVA_OBJECT_STREAM;

/// `application/java-object-stream`。
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectStreamCodec;

impl MimeContentCodec for ObjectStreamCodec {
    fn mime_type(&self) -> &'static str {
        MIME
    }

    fn accepts(&self, _value: &Value) -> bool {
        true
    }

    fn encode(&self, value: &Value, out: &mut BytesMut) -> Result<(), ConversionError> {
        out.put_slice(&STREAM_HEADER);
        match value {
            Value::Null => out.put_u8(TC_NULL),
            Value::String(text) => {
                let encoded = modified_utf8(text);
                match u16::try_from(encoded.len()) {
                    Ok(len) => {
                        out.put_u8(TC_STRING);
                        out.put_u16(len);
                    }
                    Err(_) => {
                        out.put_u8(TC_LONG_STRING);
                        out.put_u64(encoded.len() as u64);
                    }
                }
                out.put_slice(&encoded);
            }
            Value::Binary(binary) => {
                let len = i32::try_from(binary.len())
                    .map_err(|_| ConversionError::unsupported("binary", "object stream"))?;
                out.put_u8(TC_ARRAY);
                out.put_slice(&BYTE_ARRAY_CLASS);
                out.put_i32(len);
                out.put_slice(binary.as_slice());
            }
            other => {
                let encoded = encode_to_vec(other)?;
                let len = i32::try_from(encoded.len())
                    .map_err(|_| ConversionError::unsupported(other.type_name(), "object stream"))?;
                out.put_u8(TC_BLOCK_DATA_LONG);
                out.put_i32(len);
                out.put_slice(&encoded);
            }
        }
        Ok(())
    }

    fn decode(
        &self,
        content: &mut ViewChain,
        values: &ValueHandler<'_>,
    ) -> Result<Value, ConversionError> {
        if content.get_array::<4>().map_err(truncated)? != STREAM_HEADER {
            return Err(invalid("missing stream header"));
        }
        let value = match content.get().map_err(truncated)? {
            TC_NULL => Value::Null,
            TC_STRING => {
                let len = usize::from(content.get_u16().map_err(truncated)?);
                Value::String(read_modified_utf8(content, len)?)
            }
            TC_LONG_STRING => {
                let len = usize::try_from(content.get_u64().map_err(truncated)?)
                    .map_err(|_| invalid("string length overflows usize"))?;
                Value::String(read_modified_utf8(content, len)?)
            }
            TC_ARRAY => {
                if content.get_array::<18>().map_err(truncated)? != BYTE_ARRAY_CLASS {
                    return Err(invalid("array record is not byte[]"));
                }
                let len = read_length(content)?;
                if !content.has_remaining(len) {
                    return Err(invalid(format!("byte array of {len} bytes is truncated")));
                }
                let mut bytes = vec![0u8; len];
                content.copy_to_slice(&mut bytes).map_err(truncated)?;
                Value::Binary(Binary::from(bytes))
            }
            TC_BLOCK_DATA_LONG => {
                let len = read_length(content)?;
                if !content.has_remaining(len) {
                    return Err(invalid(format!("block of {len} bytes is truncated")));
                }
                let mark = content.mark();
                let value = values
                    .read_value(content)
                    .map_err(|error| invalid(error.to_string()))?;
                if content.consumed_since(&mark) != len {
                    return Err(invalid("block length disagrees with encoded value"));
                }
                value
            }
            other => return Err(invalid(format!("unsupported record tag 0x{other:02x}"))),
        };
        if content.remaining() > 0 {
            return Err(invalid("trailing bytes after record"));
        }
        Ok(value)
    }
}

fn read_length(content: &mut ViewChain) -> Result<usize, ConversionError> {
    let len = content.get_int().map_err(truncated)?;
    usize::try_from(len).map_err(|_| invalid(format!("negative length {len}")))
}

fn read_modified_utf8(content: &mut ViewChain, len: usize) -> Result<String, ConversionError> {
    content
        .read_contiguous(len, decode_modified_utf8)
        .map_err(truncated)?
        .ok_or_else(|| invalid("malformed modified UTF-8"))
}

/// modified UTF-8：按 UTF-16 码元编码，`U+0000` 写作 `C0 80`，增补字符写成两个三字节代理。
fn modified_utf8(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for unit in text.encode_utf16() {
        match unit {
            0x0001..=0x007f => out.push(unit as u8),
            0x0000 | 0x0080..=0x07ff => {
                out.push(0xc0 | (unit >> 6) as u8);
                out.push(0x80 | (unit & 0x3f) as u8);
            }
            _ => {
                out.push(0xe0 | (unit >> 12) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3f) as u8);
                out.push(0x80 | (unit & 0x3f) as u8);
            }
        }
    }
    out
}

fn decode_modified_utf8(bytes: &[u8]) -> Option<String> {
    fn continuation(byte: Option<u8>) -> Option<u16> {
        byte.filter(|byte| byte & 0xc0 == 0x80)
            .map(|byte| u16::from(byte & 0x3f))
    }

    let mut units = Vec::with_capacity(bytes.len());
    let mut iter = bytes.iter().copied();
    while let Some(lead) = iter.next() {
        let unit = match lead {
            0x01..=0x7f => u16::from(lead),
            0xc0..=0xdf => (u16::from(lead & 0x1f) << 6) | continuation(iter.next())?,
            0xe0..=0xef => {
                let high = continuation(iter.next())?;
                let low = continuation(iter.next())?;
                (u16::from(lead & 0x0f) << 12) | (high << 6) | low
            }
            _ => return None,
        };
        units.push(unit);
    }
    String::from_utf16(&units).ok()
}

fn truncated(error: BufferError) -> ConversionError {
    match error {
        BufferError::InsufficientData { .. } => invalid(error.to_string()),
        other => ConversionError::Buffer(other),
    }
}

fn invalid(reason: impl Into<String>) -> ConversionError {
    ConversionError::invalid_content(MIME, reason)
}
