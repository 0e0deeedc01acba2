use bytes::BytesMut;
use spark_buffer::ViewChain;
use spark_codec_amqp::{Value, ValueHandler, encode_value};

use super::MimeContentCodec;
use crate::{body::is_amqp_compatible, error::ConversionError, mime};

/// `amqp/list` 与 `amqp/map` 的共同实现：内容即 AMQP 1.0 对集合值的编码。
///
/// # 契约说明（What）
/// - 只承载不含描述类型、映射键全为字符串的值；
/// - 解码要求内容恰好是一个对应形态的值，尾随字节视为损坏。
fn decode_collection(
    mime_type: &'static str,
    content: &mut ViewChain,
    values: &ValueHandler<'_>,
    expect_map: bool,
) -> Result<Value, ConversionError> {
    let value = values
        .read_value(content)
        .map_err(|error| ConversionError::invalid_content(mime_type, error.to_string()))?;
    if content.remaining() > 0 {
        return Err(ConversionError::invalid_content(
            mime_type,
            format!("{} trailing bytes", content.remaining()),
        ));
    }
    let value = match value {
        Value::Array(items) if !expect_map => Value::List(items),
        value => value,
    };
    let shape_matches = match &value {
        Value::Map(_) => expect_map,
        Value::List(_) => !expect_map,
        _ => false,
    };
    if !shape_matches || !is_amqp_compatible(&value) {
        return Err(ConversionError::invalid_content(
            mime_type,
            format!("unexpected {} value", value.type_name()),
        ));
    }
    Ok(value)
}

fn encode_collection(
    value: &Value,
    out: &mut BytesMut,
    context: &'static str,
) -> Result<(), ConversionError> {
    if !is_amqp_compatible(value) {
        return Err(ConversionError::unsupported(value.type_name(), context));
    }
    encode_value(value, out)?;
    Ok(())
}

/// `amqp/list`。
#[derive(Debug, Clone, Copy, Default)]
pub struct AmqpListCodec;

impl MimeContentCodec for AmqpListCodec {
    fn mime_type(&self) -> &'static str {
        mime::AMQP_LIST
    }

    fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::List(_)) && is_amqp_compatible(value)
    }

    fn encode(&self, value: &Value, out: &mut BytesMut) -> Result<(), ConversionError> {
        if !matches!(value, Value::List(_)) {
            return Err(ConversionError::unsupported(value.type_name(), "AMQP list"));
        }
        encode_collection(value, out, "AMQP list")
    }

    fn decode(
        &self,
        content: &mut ViewChain,
        values: &ValueHandler<'_>,
    ) -> Result<Value, ConversionError> {
        decode_collection(self.mime_type(), content, values, false)
    }
}

/// `amqp/map`。
#[derive(Debug, Clone, Copy, Default)]
pub struct AmqpMapCodec;

impl MimeContentCodec for AmqpMapCodec {
    fn mime_type(&self) -> &'static str {
        mime::AMQP_MAP
    }

    fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::Map(_)) && is_amqp_compatible(value)
    }

    fn encode(&self, value: &Value, out: &mut BytesMut) -> Result<(), ConversionError> {
        if !matches!(value, Value::Map(_)) {
            return Err(ConversionError::unsupported(value.type_name(), "AMQP map"));
        }
        encode_collection(value, out, "AMQP map")
    }

    fn decode(
        &self,
        content: &mut ViewChain,
        values: &ValueHandler<'_>,
    ) -> Result<Value, ConversionError> {
        decode_collection(self.mime_type(), content, values, true)
    }
}
