use bytes::{Bytes, BytesMut};
use spark_buffer::{BufferError, PooledView};

use crate::{
    error::CodecError,
    messaging::{Header, Properties},
    types::AmqpMap,
};

use super::{Section, SectionKind, SectionValue, decoder::SectionOrder};

/// 结构化的 AMQP 1.0 消息。
///
/// # 契约说明（What）
/// - 前置节区各自可选，消息体由同种类的一个或多个节区组成，`footer` 可选；
/// - 所有节区都保留原始编码，[`to_wire`](Self::to_wire) 逐字节重现输入；
/// - 构造后不可变，转换器只读取。
#[derive(Debug, Default)]
pub struct StructuredMessage {
    header: Option<Section>,
    delivery_annotations: Option<Section>,
    message_annotations: Option<Section>,
    properties: Option<Section>,
    application_properties: Option<Section>,
    body: Vec<Section>,
    footer: Option<Section>,
    arrival_time: i64,
    message_format: u32,
}

impl StructuredMessage {
    /// 没有任何节区的消息。
    pub fn empty() -> Self {
        Self::default()
    }

    /// 由有序节区组装，顺序不合法时返回 `Decode`。
    pub fn from_sections(sections: Vec<Section>) -> Result<Self, CodecError> {
        let mut order = SectionOrder::default();
        let mut message = Self::default();
        for section in sections {
            let kind = section.kind();
            order.advance(kind)?;
            let slot = match kind {
                SectionKind::Header => &mut message.header,
                SectionKind::DeliveryAnnotations => &mut message.delivery_annotations,
                SectionKind::MessageAnnotations => &mut message.message_annotations,
                SectionKind::Properties => &mut message.properties,
                SectionKind::ApplicationProperties => &mut message.application_properties,
                SectionKind::Footer => &mut message.footer,
                SectionKind::Data | SectionKind::AmqpSequence | SectionKind::AmqpValue => {
                    message.body.push(section);
                    continue;
                }
            };
            *slot = Some(section);
        }
        Ok(message)
    }

    /// 附加到达时间（毫秒）与消息格式标记。
    pub fn with_arrival(mut self, arrival_time: i64, message_format: u32) -> Self {
        self.arrival_time = arrival_time;
        self.message_format = message_format;
        self
    }

    pub fn arrival_time(&self) -> i64 {
        self.arrival_time
    }

    pub fn message_format(&self) -> u32 {
        self.message_format
    }

    pub fn header(&self) -> Option<&Header> {
        match self.header.as_ref().map(Section::value) {
            Some(SectionValue::Header(header)) => Some(header),
            _ => None,
        }
    }

    pub fn delivery_annotations(&self) -> Option<&AmqpMap> {
        match self.delivery_annotations.as_ref().map(Section::value) {
            Some(SectionValue::DeliveryAnnotations(map)) => Some(map),
            _ => None,
        }
    }

    pub fn message_annotations(&self) -> Option<&AmqpMap> {
        match self.message_annotations.as_ref().map(Section::value) {
            Some(SectionValue::MessageAnnotations(map)) => Some(map),
            _ => None,
        }
    }

    pub fn properties(&self) -> Option<&Properties> {
        match self.properties.as_ref().map(Section::value) {
            Some(SectionValue::Properties(properties)) => Some(properties),
            _ => None,
        }
    }

    pub fn application_properties(&self) -> Option<&AmqpMap> {
        match self.application_properties.as_ref().map(Section::value) {
            Some(SectionValue::ApplicationProperties(map)) => Some(map),
            _ => None,
        }
    }

    pub fn footer(&self) -> Option<&AmqpMap> {
        match self.footer.as_ref().map(Section::value) {
            Some(SectionValue::Footer(map)) => Some(map),
            _ => None,
        }
    }

    /// 消息体种类；没有消息体时为 `None`。
    pub fn body_kind(&self) -> Option<SectionKind> {
        self.body.first().map(Section::kind)
    }

    pub fn body_sections(&self) -> &[Section] {
        &self.body
    }

    /// `properties.content-type`。
    pub fn content_type(&self) -> Option<&str> {
        self.properties()
            .and_then(|properties| properties.content_type.as_ref())
            .map(|symbol| symbol.as_str())
    }

    /// 按线上顺序遍历全部节区。
    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.header
            .iter()
            .chain(&self.delivery_annotations)
            .chain(&self.message_annotations)
            .chain(&self.properties)
            .chain(&self.application_properties)
            .chain(&self.body)
            .chain(&self.footer)
    }

    /// 原始编码总长度。
    pub fn encoded_len(&self) -> usize {
        self.sections().map(|section| section.encoded().len()).sum()
    }

    /// 以保留的原始字节重新拼出整条消息，不做任何重编码。
    pub fn to_wire(&self) -> Result<Bytes, BufferError> {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        for section in self.sections() {
            section.encoded().write_to(&mut buf)?;
        }
        Ok(buf.freeze())
    }

    /// 消息体节区原始字节的共享视图，供零拷贝转发。
    pub fn body_views(&self) -> Result<Vec<PooledView>, BufferError> {
        let mut views = Vec::new();
        for section in &self.body {
            views.extend(section.encoded().duplicate()?);
        }
        Ok(views)
    }

    /// 拆出消息体节区，其余节区与到达信息留在返回的消息中。
    pub fn split_body(mut self) -> (Self, Vec<Section>) {
        let body = std::mem::take(&mut self.body);
        (self, body)
    }
}
