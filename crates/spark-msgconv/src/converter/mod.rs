//! 成对的协议转换器。
//!
//! # 模块定位（Why）
//! - 每个有序协议对一个转换器，各自是源消息内容、content-type 与消息种类注解的纯函数；
//! - 共用的部分（1.0 消息体拼装、消息头映射、节区编码）集中在本模块。
//!
//! # 契约说明（What）
//! - 转换器只读取源消息：内容通过新的兄弟视图读取，不移动源消息中视图的游标；
//! - 任一步骤失败即返回错误，不产生部分结果。

mod amqp10_to_internal;
mod amqp10_to_legacy;
mod internal_to_amqp10;
mod internal_to_legacy;
mod legacy_to_amqp10;
mod legacy_to_internal;
mod legacy_to_legacy;

use bytes::{Bytes, BytesMut};
use spark_codec_amqp::{Section, SectionValue, StructuredMessage, Value};

pub use self::{
    amqp10_to_internal::Amqp10ToInternal, amqp10_to_legacy::Amqp10ToLegacy,
    internal_to_amqp10::InternalToAmqp10, internal_to_legacy::InternalToLegacy,
    legacy_to_amqp10::LegacyToAmqp10, legacy_to_internal::LegacyToInternal,
    legacy_to_legacy::LegacyToLegacy,
};
use crate::content::MimeContentCodec;
use crate::{
    body::{is_jms_primitive, normalize},
    content::OBJECT_STREAM,
    error::ConversionError,
    message::{ConvertedMessage, MessageProperties, Protocol},
    registry::{AddressSpace, ConversionContext},
};

/// 一个有序协议对的转换器。
///
/// # 契约说明（What）
/// - `Source` 是源协议的消息表示，`target` 是产物的协议；
/// - `convert` 不修改源消息，失败时不产生任何产物。
pub trait MessageConverter {
    type Source;

    fn target(&self) -> Protocol;

    fn convert(
        &self,
        message: &Self::Source,
        ctx: &ConversionContext,
    ) -> Result<ConvertedMessage, ConversionError>;
}

pub(crate) fn legacy_target(from: Protocol, target: Protocol) -> Result<Protocol, ConversionError> {
    if target.is_legacy() && from != target {
        Ok(target)
    } else {
        Err(ConversionError::NoConverter { from, to: target })
    }
}

/// 1.0 消息体节区拼装后的对象。
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum AssembledBody {
    Absent,
    Value(Value),
    Data(Bytes),
}

/// 拼装消息体：多个 data 拼接为字节，多个 amqp-sequence 拼接为一个列表。
pub(crate) fn assemble_body(sections: Vec<Section>) -> Result<AssembledBody, ConversionError> {
    let mut data: Option<BytesMut> = None;
    let mut sequence: Option<Vec<Value>> = None;
    let mut single: Option<Value> = None;
    for section in sections {
        match section.into_parts().0 {
            SectionValue::Data(binary) => data
                .get_or_insert_with(BytesMut::new)
                .extend_from_slice(binary.as_slice()),
            SectionValue::AmqpSequence(items) => sequence.get_or_insert_with(Vec::new).extend(items),
            SectionValue::AmqpValue(value) => single = Some(value),
            other => {
                return Err(ConversionError::InvalidBody(format!(
                    "unexpected {} section in body",
                    other.kind()
                )));
            }
        }
    }
    Ok(match (data, sequence, single) {
        (Some(bytes), None, None) => AssembledBody::Data(bytes.freeze()),
        (None, Some(items), None) => AssembledBody::Value(Value::List(items)),
        (None, None, Some(value)) => AssembledBody::Value(value),
        (None, None, None) => AssembledBody::Absent,
        _ => return Err(ConversionError::InvalidBody("mixed body sections".into())),
    })
}

/// 把 1.0 的 header/properties/application-properties 映射为协议无关的消息头。
///
/// # 契约说明（What）
/// - `durable`/`priority` 来自 header；未设置绝对过期时间时，以到达时间加 `ttl` 推算；
/// - reply-to 经地址空间剥离本地前缀；
/// - 应用属性值先归一化，仍不是 JMS 标量（或是二进制）时返回 [`ConversionError::UnsupportedValue`]。
pub(crate) fn properties_from_amqp10(
    envelope: &StructuredMessage,
    address_space: &AddressSpace,
) -> Result<MessageProperties, ConversionError> {
    let mut properties = MessageProperties::default();
    if let Some(header) = envelope.header() {
        properties.persistent = header.is_durable();
        properties.priority = header.priority;
    }
    if let Some(source) = envelope.properties() {
        properties.message_id = source.message_id.as_ref().map(id_to_string).transpose()?;
        properties.correlation_id = source
            .correlation_id
            .as_ref()
            .map(id_to_string)
            .transpose()?;
        properties.reply_to = source
            .reply_to
            .as_deref()
            .map(|address| address_space.local_address(address).to_owned());
        properties.user_id = source.user_id.clone().map(|id| id.into_bytes());
        properties.timestamp = source.creation_time;
        properties.expiration = source.absolute_expiry_time;
        properties.encoding = source
            .content_encoding
            .as_ref()
            .map(|encoding| encoding.as_str().to_owned());
    }
    if properties.expiration.is_none() && envelope.arrival_time() > 0 {
        properties.expiration = envelope
            .header()
            .and_then(|header| header.ttl)
            .map(|ttl| envelope.arrival_time() + i64::from(ttl));
    }
    if let Some(application) = envelope.application_properties() {
        for (key, value) in application {
            let value = normalize(value.clone())?;
            if !is_jms_primitive(&value) || matches!(value, Value::Binary(_)) {
                return Err(ConversionError::unsupported(
                    value.type_name(),
                    "application property",
                ));
            }
            properties.headers.insert(key.clone(), value);
        }
    }
    Ok(properties)
}

/// 1.0 的消息标识（ulong/uuid/binary/string）转成文本。
fn id_to_string(id: &Value) -> Result<String, ConversionError> {
    match id {
        Value::String(text) => Ok(text.clone()),
        Value::Ulong(number) => Ok(number.to_string()),
        Value::Uuid(bytes) => Ok(format_uuid(bytes)),
        Value::Binary(binary) => Ok(binary.as_slice().iter().map(|b| format!("{b:02x}")).collect()),
        other => Err(ConversionError::unsupported(other.type_name(), "message id")),
    }
}

fn format_uuid(bytes: &[u8; 16]) -> String {
    let mut out = String::with_capacity(36);
    for (index, byte) in bytes.iter().enumerate() {
        if matches!(index, 4 | 6 | 8 | 10) {
            out.push('-');
        }
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

/// 编码新建的消息体节区。
pub(crate) fn encode_sections(sections: &[SectionValue]) -> Result<Bytes, ConversionError> {
    let mut out = BytesMut::new();
    for section in sections {
        section.encode(&mut out)?;
    }
    Ok(out.freeze())
}

/// 内部模型的内容：消息体值的对象流编码。
pub(crate) fn internal_content(body: &Value) -> Result<Bytes, ConversionError> {
    OBJECT_STREAM.encode_to_bytes(body)
}

/// 严格 UTF-8 解码文本内容。
pub(crate) fn utf8_text(bytes: Bytes, mime_type: &'static str) -> Result<String, ConversionError> {
    String::from_utf8(bytes.to_vec())
        .map_err(|error| ConversionError::invalid_content(mime_type, error.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_render_as_text() {
        assert_eq!(id_to_string(&Value::Ulong(42)).expect("ulong"), "42");
        assert_eq!(
            id_to_string(&Value::Uuid([
                0x12, 0x34, 0x56, 0x78, 0x9a, 0xbc, 0xde, 0xf0, 0x12, 0x34, 0x56, 0x78, 0x9a,
                0xbc, 0xde, 0xf0
            ]))
            .expect("uuid"),
            "12345678-9abc-def0-1234-56789abcdef0"
        );
        assert!(id_to_string(&Value::Int(1)).is_err());
    }
}
