use bytes::{BufMut, BytesMut};
use spark_buffer::ViewChain;
use spark_codec_amqp::{AmqpMap, Value, ValueHandler};

use super::{
    MimeContentCodec,
    typed_bytes::{TypedBytesReader, write_string, write_value},
};
use crate::{
    body::{is_jms_list, is_jms_map},
    error::ConversionError,
    mime,
};

/// `jms/stream-message`：类型化标量首尾相接，没有计数前缀。
#[derive(Debug, Clone, Copy, Default)]
pub struct JmsStreamCodec;

impl MimeContentCodec for JmsStreamCodec {
    fn mime_type(&self) -> &'static str {
        mime::JMS_STREAM_MESSAGE
    }

    fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::List(items) if is_jms_list(items))
    }

    fn encode(&self, value: &Value, out: &mut BytesMut) -> Result<(), ConversionError> {
        let Value::List(items) = value else {
            return Err(ConversionError::unsupported(value.type_name(), "JMS stream"));
        };
        items.iter().try_for_each(|item| write_value(item, out))
    }

    fn decode(
        &self,
        content: &mut ViewChain,
        _values: &ValueHandler<'_>,
    ) -> Result<Value, ConversionError> {
        let mut reader = TypedBytesReader::new(content, self.mime_type());
        let mut items = Vec::new();
        while reader.has_remaining() {
            items.push(reader.read_value()?);
        }
        Ok(Value::List(items))
    }
}

/// `jms/map-message`：`i32` 条目数，随后每个条目为 NUL 结尾的键与类型化值。
#[derive(Debug, Clone, Copy, Default)]
pub struct JmsMapCodec;

impl MimeContentCodec for JmsMapCodec {
    fn mime_type(&self) -> &'static str {
        mime::JMS_MAP_MESSAGE
    }

    fn accepts(&self, value: &Value) -> bool {
        matches!(value, Value::Map(map) if is_jms_map(map))
    }

    fn encode(&self, value: &Value, out: &mut BytesMut) -> Result<(), ConversionError> {
        let Value::Map(map) = value else {
            return Err(ConversionError::unsupported(value.type_name(), "JMS map"));
        };
        let count =
            i32::try_from(map.len()).map_err(|_| ConversionError::unsupported("map", "JMS map"))?;
        out.put_i32(count);
        for (key, value) in map {
            let Value::String(key) = key else {
                return Err(ConversionError::unsupported(key.type_name(), "JMS map key"));
            };
            write_string(key, out)?;
            write_value(value, out)?;
        }
        Ok(())
    }

    fn decode(
        &self,
        content: &mut ViewChain,
        _values: &ValueHandler<'_>,
    ) -> Result<Value, ConversionError> {
        let mut reader = TypedBytesReader::new(content, self.mime_type());
        let count = reader.read_int()?;
        if count < 0 {
            return Err(ConversionError::invalid_content(
                mime::JMS_MAP_MESSAGE,
                format!("negative entry count {count}"),
            ));
        }
        let mut map = AmqpMap::new();
        for _ in 0..count {
            let key = reader.read_string()?;
            let value = reader.read_value()?;
            map.insert(key, value);
        }
        if reader.has_remaining() {
            return Err(ConversionError::invalid_content(
                mime::JMS_MAP_MESSAGE,
                "trailing bytes after last entry",
            ));
        }
        Ok(Value::Map(map))
    }
}
