//! AMQP 1.0 值编码器。
//!
//! # 设计要求（What）
//! - 总是选择最紧凑的编码：`uint0`/`smalluint`、`ulong0`/`smallulong`、`smallint`/`smalllong`、
//!   8 位长度的变长与复合编码，放不下时回退到 32 位形式；
//! - 相同输入得到逐字节相同的输出，节区透传与转换结果因此可复现；
//! - 数组要求元素同构（同一宽格式码，描述元素还需同一描述符），否则返回 `Encode`。

use bytes::{BufMut, BytesMut};

use crate::{
    error::CodecError,
    format_code as fc,
    types::{AmqpMap, Descriptor, Value},
};

/// 把值追加编码到 `buf`。
pub fn encode_value(value: &Value, buf: &mut BytesMut) -> Result<(), CodecError> {
    match value {
        Value::Null => buf.put_u8(fc::NULL),
        Value::Boolean(true) => buf.put_u8(fc::BOOLEAN_TRUE),
        Value::Boolean(false) => buf.put_u8(fc::BOOLEAN_FALSE),
        Value::Ubyte(v) => {
            buf.put_u8(fc::UBYTE);
            buf.put_u8(*v);
        }
        Value::Byte(v) => {
            buf.put_u8(fc::BYTE);
            buf.put_i8(*v);
        }
        Value::Ushort(v) => {
            buf.put_u8(fc::USHORT);
            buf.put_u16(*v);
        }
        Value::Short(v) => {
            buf.put_u8(fc::SHORT);
            buf.put_i16(*v);
        }
        Value::Uint(0) => buf.put_u8(fc::UINT0),
        Value::Uint(v) => match u8::try_from(*v) {
            Ok(small) => {
                buf.put_u8(fc::SMALLUINT);
                buf.put_u8(small);
            }
            Err(_) => {
                buf.put_u8(fc::UINT);
                buf.put_u32(*v);
            }
        },
        Value::Ulong(0) => buf.put_u8(fc::ULONG0),
        Value::Ulong(v) => match u8::try_from(*v) {
            Ok(small) => {
                buf.put_u8(fc::SMALLULONG);
                buf.put_u8(small);
            }
            Err(_) => {
                buf.put_u8(fc::ULONG);
                buf.put_u64(*v);
            }
        },
        Value::Int(v) => match i8::try_from(*v) {
            Ok(small) => {
                buf.put_u8(fc::SMALLINT);
                buf.put_i8(small);
            }
            Err(_) => {
                buf.put_u8(fc::INT);
                buf.put_i32(*v);
            }
        },
        Value::Long(v) => match i8::try_from(*v) {
            Ok(small) => {
                buf.put_u8(fc::SMALLLONG);
                buf.put_i8(small);
            }
            Err(_) => {
                buf.put_u8(fc::LONG);
                buf.put_i64(*v);
            }
        },
        Value::Described(described) => {
            buf.put_u8(fc::DESCRIBED);
            encode_value(&described.descriptor.to_value(), buf)?;
            encode_value(&described.value, buf)?;
        }
        Value::List(items) if items.is_empty() => buf.put_u8(fc::LIST0),
        Value::List(items) => {
            let mut body = BytesMut::new();
            for item in items {
                encode_value(item, &mut body)?;
            }
            put_compound(buf, fc::LIST8, fc::LIST32, items.len(), &body)?;
        }
        Value::Map(map) => {
            let body = encode_map_entries(map)?;
            put_compound(buf, fc::MAP8, fc::MAP32, map.len() * 2, &body)?;
        }
        Value::Array(items) => {
            let body = encode_array_body(items)?;
            put_compound(buf, fc::ARRAY8, fc::ARRAY32, items.len(), &body)?;
        }
        Value::Binary(bytes) => put_variable(buf, fc::VBIN8, fc::VBIN32, bytes.as_slice())?,
        Value::String(text) => put_variable(buf, fc::STR8, fc::STR32, text.as_bytes())?,
        Value::Symbol(symbol) => {
            check_symbol(symbol.as_str())?;
            put_variable(buf, fc::SYM8, fc::SYM32, symbol.as_str().as_bytes())?;
        }
        other => {
            let code = wide_code(other).ok_or_else(|| {
                CodecError::encode(format!("no encoding for {}", other.type_name()))
            })?;
            buf.put_u8(code);
            encode_wide_body(other, buf)?;
        }
    }
    Ok(())
}

/// 编码为独立的字节序列。
pub fn encode_to_vec(value: &Value) -> Result<Vec<u8>, CodecError> {
    let mut buf = BytesMut::new();
    encode_value(value, &mut buf)?;
    Ok(buf.to_vec())
}

fn check_symbol(symbol: &str) -> Result<(), CodecError> {
    if symbol.is_ascii() {
        Ok(())
    } else {
        Err(CodecError::encode(format!("symbol {symbol:?} is not ASCII")))
    }
}

fn length_u32(len: usize) -> Result<u32, CodecError> {
    u32::try_from(len).map_err(|_| CodecError::encode(format!("length {len} exceeds u32")))
}

fn put_variable(buf: &mut BytesMut, short: u8, wide: u8, data: &[u8]) -> Result<(), CodecError> {
    match u8::try_from(data.len()) {
        Ok(len) => {
            buf.put_u8(short);
            buf.put_u8(len);
        }
        Err(_) => {
            buf.put_u8(wide);
            buf.put_u32(length_u32(data.len())?);
        }
    }
    buf.put_slice(data);
    Ok(())
}

/// 复合编码：`size` 覆盖 `count` 字段与内容。
fn put_compound(
    buf: &mut BytesMut,
    short: u8,
    wide: u8,
    count: usize,
    body: &[u8],
) -> Result<(), CodecError> {
    match (u8::try_from(body.len() + 1), u8::try_from(count)) {
        (Ok(size), Ok(count)) => {
            buf.put_u8(short);
            buf.put_u8(size);
            buf.put_u8(count);
        }
        _ => {
            buf.put_u8(wide);
            buf.put_u32(length_u32(body.len() + 4)?);
            buf.put_u32(length_u32(count)?);
        }
    }
    buf.put_slice(body);
    Ok(())
}

fn encode_map_entries(map: &AmqpMap) -> Result<BytesMut, CodecError> {
    let mut body = BytesMut::new();
    for (key, value) in map {
        encode_value(key, &mut body)?;
        encode_value(value, &mut body)?;
    }
    Ok(body)
}

/// 数组元素使用的宽格式码；描述类型返回 `None`。
fn wide_code(value: &Value) -> Option<u8> {
    let code = match value {
        Value::Null => fc::NULL,
        Value::Boolean(_) => fc::BOOLEAN,
        Value::Ubyte(_) => fc::UBYTE,
        Value::Byte(_) => fc::BYTE,
        Value::Ushort(_) => fc::USHORT,
        Value::Short(_) => fc::SHORT,
        Value::Uint(_) => fc::UINT,
        Value::Int(_) => fc::INT,
        Value::Float(_) => fc::FLOAT,
        Value::Char(_) => fc::CHAR,
        Value::Decimal32(_) => fc::DECIMAL32,
        Value::Ulong(_) => fc::ULONG,
        Value::Long(_) => fc::LONG,
        Value::Double(_) => fc::DOUBLE,
        Value::Timestamp(_) => fc::TIMESTAMP,
        Value::Decimal64(_) => fc::DECIMAL64,
        Value::Decimal128(_) => fc::DECIMAL128,
        Value::Uuid(_) => fc::UUID,
        Value::Binary(_) => fc::VBIN32,
        Value::String(_) => fc::STR32,
        Value::Symbol(_) => fc::SYM32,
        Value::List(_) => fc::LIST32,
        Value::Map(_) => fc::MAP32,
        Value::Array(_) => fc::ARRAY32,
        Value::Described(_) => return None,
    };
    Some(code)
}

/// 以宽格式码对应的布局写出值体（不含格式码）。
fn encode_wide_body(value: &Value, buf: &mut BytesMut) -> Result<(), CodecError> {
    match value {
        Value::Null => {}
        Value::Boolean(v) => buf.put_u8(u8::from(*v)),
        Value::Ubyte(v) => buf.put_u8(*v),
        Value::Byte(v) => buf.put_i8(*v),
        Value::Ushort(v) => buf.put_u16(*v),
        Value::Short(v) => buf.put_i16(*v),
        Value::Uint(v) => buf.put_u32(*v),
        Value::Int(v) => buf.put_i32(*v),
        Value::Float(v) => buf.put_f32(*v),
        Value::Char(v) => buf.put_u32(u32::from(*v)),
        Value::Decimal32(raw) => buf.put_slice(raw),
        Value::Ulong(v) => buf.put_u64(*v),
        Value::Long(v) => buf.put_i64(*v),
        Value::Double(v) => buf.put_f64(*v),
        Value::Timestamp(v) => buf.put_i64(*v),
        Value::Decimal64(raw) => buf.put_slice(raw),
        Value::Decimal128(raw) | Value::Uuid(raw) => buf.put_slice(raw),
        Value::Binary(bytes) => put_wide_variable(buf, bytes.as_slice())?,
        Value::String(text) => put_wide_variable(buf, text.as_bytes())?,
        Value::Symbol(symbol) => {
            check_symbol(symbol.as_str())?;
            put_wide_variable(buf, symbol.as_str().as_bytes())?;
        }
        Value::List(items) => {
            let mut body = BytesMut::new();
            for item in items {
                encode_value(item, &mut body)?;
            }
            put_wide_compound(buf, items.len(), &body)?;
        }
        Value::Map(map) => {
            let body = encode_map_entries(map)?;
            put_wide_compound(buf, map.len() * 2, &body)?;
        }
        Value::Array(items) => {
            let body = encode_array_body(items)?;
            put_wide_compound(buf, items.len(), &body)?;
        }
        Value::Described(_) => {
            return Err(CodecError::encode(
                "described value has no primitive body encoding",
            ));
        }
    }
    Ok(())
}

fn put_wide_variable(buf: &mut BytesMut, data: &[u8]) -> Result<(), CodecError> {
    buf.put_u32(length_u32(data.len())?);
    buf.put_slice(data);
    Ok(())
}

fn put_wide_compound(buf: &mut BytesMut, count: usize, body: &[u8]) -> Result<(), CodecError> {
    buf.put_u32(length_u32(body.len() + 4)?);
    buf.put_u32(length_u32(count)?);
    buf.put_slice(body);
    Ok(())
}

/// 数组内容：元素构造器 + 逐个元素值体。空数组以 `null` 作为元素构造器。
fn encode_array_body(items: &[Value]) -> Result<BytesMut, CodecError> {
    let mut body = BytesMut::new();
    let Some(first) = items.first() else {
        body.put_u8(fc::NULL);
        return Ok(body);
    };
    match first {
        Value::Described(described) => {
            let descriptor = &described.descriptor;
            let inner: Vec<&Value> = items
                .iter()
                .map(|item| described_inner(item, descriptor))
                .collect::<Result<_, _>>()?;
            let code = homogeneous_code(inner.iter().copied())?;
            body.put_u8(fc::DESCRIBED);
            encode_value(&descriptor.to_value(), &mut body)?;
            body.put_u8(code);
            for item in inner {
                encode_wide_body(item, &mut body)?;
            }
        }
        _ => {
            let code = homogeneous_code(items.iter())?;
            body.put_u8(code);
            for item in items {
                encode_wide_body(item, &mut body)?;
            }
        }
    }
    if items.len() > body.len() {
        return Err(CodecError::encode(format!(
            "array of {} zero-width elements exceeds its {} content bytes",
            items.len(),
            body.len()
        )));
    }
    Ok(body)
}

fn described_inner<'v>(item: &'v Value, descriptor: &Descriptor) -> Result<&'v Value, CodecError> {
    match item {
        Value::Described(described) if described.descriptor == *descriptor => Ok(&described.value),
        other => Err(CodecError::encode(format!(
            "heterogeneous array: expected described {descriptor}, found {}",
            other.type_name()
        ))),
    }
}

fn homogeneous_code<'v>(mut items: impl Iterator<Item = &'v Value>) -> Result<u8, CodecError> {
    let Some(first) = items.next() else {
        return Ok(fc::NULL);
    };
    let code = wide_code(first)
        .ok_or_else(|| CodecError::encode("nested described values cannot form an array"))?;
    for item in items {
        if wide_code(item) != Some(code) {
            return Err(CodecError::encode(format!(
                "heterogeneous array: {} and {}",
                first.type_name(),
                item.type_name()
            )));
        }
    }
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Binary, Symbol};

    fn hex_of(value: &Value) -> String {
        let bytes = encode_to_vec(value).expect("编码应成功");
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }

    #[test]
    fn integers_use_smallest_form() {
        assert_eq!(hex_of(&Value::Uint(0)), "43");
        assert_eq!(hex_of(&Value::Uint(7)), "5207");
        assert_eq!(hex_of(&Value::Uint(256)), "7000000100");
        assert_eq!(hex_of(&Value::Ulong(0x70)), "5370");
        assert_eq!(hex_of(&Value::Int(-1)), "54ff");
        assert_eq!(hex_of(&Value::Long(1000)), "8100000000000003e8");
    }

    #[test]
    fn compound_forms() {
        assert_eq!(hex_of(&Value::List(Vec::new())), "45");
        assert_eq!(hex_of(&Value::Map(AmqpMap::new())), "c10100");
        assert_eq!(
            hex_of(&Value::List(vec![Value::Boolean(true), Value::Null])),
            "c003024140"
        );
        assert_eq!(hex_of(&Value::Array(Vec::new())), "e0020040");
    }

    #[test]
    fn large_string_switches_to_wide_size() {
        let text = "a".repeat(300);
        let bytes = encode_to_vec(&Value::String(text)).expect("编码应成功");
        assert_eq!(&bytes[..5], &[fc::STR32, 0, 0, 1, 44]);
        assert_eq!(bytes.len(), 305);
    }

    #[test]
    fn array_of_symbols_uses_wide_constructor() {
        let value = Value::Array(vec![
            Value::Symbol(Symbol::from("a")),
            Value::Symbol(Symbol::from("bc")),
        ]);
        assert_eq!(hex_of(&value), "e00d02b30000000161000000026263");
    }

    #[test]
    fn zero_width_array_must_fit_its_content() {
        assert_eq!(hex_of(&Value::Array(vec![Value::Null])), "e0020140");
        let err = encode_to_vec(&Value::Array(vec![Value::Null; 3])).expect_err("无法再解码");
        assert!(matches!(err, CodecError::Encode(_)));
    }

    #[test]
    fn heterogeneous_array_is_rejected() {
        let value = Value::Array(vec![Value::Int(1), Value::String("x".into())]);
        let err = encode_to_vec(&value).expect_err("异构数组应失败");
        assert!(matches!(err, CodecError::Encode(_)));
    }

    #[test]
    fn non_ascii_symbol_is_rejected() {
        let err = encode_to_vec(&Value::Symbol(Symbol::from("né"))).expect_err("应拒绝非 ASCII");
        assert!(matches!(err, CodecError::Encode(_)));
    }

    #[test]
    fn described_value_prefixes_descriptor() {
        let value = Value::described(
            Descriptor::code(0x75),
            Value::Binary(Binary::from(vec![1u8, 2])),
        );
        assert_eq!(hex_of(&value), "005375a0020102");
    }
}
