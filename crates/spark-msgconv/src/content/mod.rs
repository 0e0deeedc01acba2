//! mime 内容编解码器。
//!
//! # 模块定位（Why）
//! - 遗留协议的消息体是不透明字节，结构化内容（列表、映射、对象）依靠 mime 类型约定编码；
//! - 转换器只关心“选哪个编解码器”，具体字节布局由本模块的实现负责。
//!
//! # 设计概要（How）
//! - [`MimeContentCodec`] 是统一接口：`accepts` 判定能否承载，`encode`/`decode` 负责字节；
//! - 编解码器均为无状态单元结构体，[`codec_for_mime`] 按 mime 类型查找，
//!   [`list_codec`]/[`map_codec`] 按 JMS 优先、AMQP 兜底的顺序为集合挑选编解码器。

mod amqp;
mod jms;
mod object_stream;
mod typed_bytes;

use bytes::{Bytes, BytesMut};
use spark_buffer::ViewChain;
use spark_codec_amqp::{AmqpMap, Value, ValueHandler};

pub use self::{
    amqp::{AmqpListCodec, AmqpMapCodec},
    jms::{JmsMapCodec, JmsStreamCodec},
    object_stream::{ObjectStreamCodec, SERIALIZED_NULL, STREAM_HEADER},
};
use crate::{
    body::{is_amqp_compatible, is_jms_list, is_jms_map},
    error::ConversionError,
    mime,
};

/// 按 mime 类型编解码消息内容。
///
/// # 契约说明（What）
/// - `accepts` 为 `true` 的值，`encode` 必须成功；
/// - `decode` 消费全部内容，格式不符返回 [`ConversionError::InvalidContent`]；
/// - 实现必须无状态且线程安全。
pub trait MimeContentCodec: Send + Sync {
    /// 写入消息头的 mime 类型。
    fn mime_type(&self) -> &'static str;

    /// 该值能否由本编解码器承载。
    fn accepts(&self, value: &Value) -> bool;

    fn encode(&self, value: &Value, out: &mut BytesMut) -> Result<(), ConversionError>;

    /// 解码整段内容；`values` 供需要 AMQP 1.0 值解码的实现使用。
    fn decode(
        &self,
        content: &mut ViewChain,
        values: &ValueHandler<'_>,
    ) -> Result<Value, ConversionError>;

    fn encode_to_bytes(&self, value: &Value) -> Result<Bytes, ConversionError> {
        let mut out = BytesMut::new();
        self.encode(value, &mut out)?;
        Ok(out.freeze())
    }
}

pub static JMS_STREAM: JmsStreamCodec = JmsStreamCodec;
pub static JMS_MAP: JmsMapCodec = JmsMapCodec;
pub static AMQP_LIST: AmqpListCodec = AmqpListCodec;
pub static AMQP_MAP: AmqpMapCodec = AmqpMapCodec;
pub static OBJECT_STREAM: ObjectStreamCodec = ObjectStreamCodec;

/// 按 mime 类型查找编解码器；对象流的两种写法都能命中。
pub fn codec_for_mime(mime_type: &str) -> Option<&'static dyn MimeContentCodec> {
    let codecs: [&'static dyn MimeContentCodec; 4] = [&JMS_STREAM, &JMS_MAP, &AMQP_LIST, &AMQP_MAP];
    if mime::is_object_stream(mime_type) {
        return Some(&OBJECT_STREAM);
    }
    codecs
        .into_iter()
        .find(|codec| mime::matches(mime_type, codec.mime_type()))
}

/// 列表：元素全为 JMS 标量时用 `jms/stream-message`，否则尝试 `amqp/list`。
pub fn list_codec(items: &[Value]) -> Option<&'static dyn MimeContentCodec> {
    if is_jms_list(items) {
        Some(&JMS_STREAM)
    } else if items.iter().all(is_amqp_compatible) {
        Some(&AMQP_LIST)
    } else {
        None
    }
}

/// 映射：键为字符串且值全为 JMS 标量时用 `jms/map-message`，否则尝试 `amqp/map`。
pub fn map_codec(map: &AmqpMap) -> Option<&'static dyn MimeContentCodec> {
    if is_jms_map(map) {
        Some(&JMS_MAP)
    } else if map
        .iter()
        .all(|(key, value)| matches!(key, Value::String(_)) && is_amqp_compatible(value))
    {
        Some(&AMQP_MAP)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_parameters() {
        let codec = codec_for_mime("jms/map-message; v=1").expect("应命中");
        assert_eq!(codec.mime_type(), mime::JMS_MAP_MESSAGE);
        assert_eq!(
            codec_for_mime(mime::JAVA_SERIALIZED_OBJECT).map(|codec| codec.mime_type()),
            Some(mime::JAVA_OBJECT_STREAM)
        );
        assert!(codec_for_mime("text/plain").is_none());
    }

    #[test]
    fn empty_jms_map_is_not_empty_content() {
        let bytes = JMS_MAP
            .encode_to_bytes(&Value::Map(AmqpMap::new()))
            .expect("空映射可编码");
        assert_eq!(bytes.as_ref(), &[0, 0, 0, 0]);
    }

    #[test]
    fn collections_fall_back_to_amqp_codecs() {
        let nested = [Value::from("x"), Value::List(vec![Value::from("nested")])];
        assert_eq!(
            list_codec(&nested).map(|codec| codec.mime_type()),
            Some(mime::AMQP_LIST)
        );
        assert_eq!(
            list_codec(&[Value::from("x"), Value::Int(1)]).map(|codec| codec.mime_type()),
            Some(mime::JMS_STREAM_MESSAGE)
        );
        let mut int_keyed = AmqpMap::new();
        int_keyed.insert(37i32, "v");
        assert!(map_codec(&int_keyed).is_none());
    }
}
