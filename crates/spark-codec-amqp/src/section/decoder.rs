use spark_buffer::{BufferPool, PooledView, ViewChain};
use tracing::trace;

use crate::{
    config::DecoderConfig,
    error::CodecError,
    format_code as fc,
    registry::AmqpTypeRegistry,
};

use super::{EncodedForm, Section, SectionKind, StructuredMessage};

/// 节区顺序状态机。
///
/// - 前置节区各至多一次，且按等级严格递增；
/// - `data` 与 `amqp-sequence` 可重复，`amqp-value` 只能出现一次，不同种类的消息体互斥；
/// - `footer` 之后不允许任何节区。
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct SectionOrder {
    last: Option<SectionKind>,
}

impl SectionOrder {
    pub(crate) fn advance(&mut self, kind: SectionKind) -> Result<(), CodecError> {
        if let Some(last) = self.last {
            if last == SectionKind::Footer {
                return Err(CodecError::decode(format!("{kind} section after footer")));
            }
            if kind.is_body() && last.is_body() {
                if kind != last {
                    return Err(CodecError::decode(format!(
                        "message mixes {last} and {kind} body sections"
                    )));
                }
                if kind == SectionKind::AmqpValue {
                    return Err(CodecError::decode("repeated amqp-value body section"));
                }
            } else if kind.rank() <= last.rank() {
                return Err(CodecError::decode(format!(
                    "{kind} section out of order or duplicated after {last}"
                )));
            }
        }
        self.last = Some(kind);
        Ok(())
    }
}

/// 节区解码器：把一条消息的字节流拆成有序节区。
///
/// # 教案式说明
/// - **意图 (Why)**：转换器读强类型内容，透传路径转发原始字节，两者来自同一次解码；
/// - **逻辑 (How)**：逐节区读取 `0x00` 与描述符，查节区注册表，先推进顺序状态机，再解码节区体；
///   节区消费的字节区间通过 [`ViewChain::views_since`] 以共享视图保留；
/// - **契约 (What)**：顶层出现非描述类型、节区乱序或重复、消息体种类混用都返回 `Decode`；
///   未注册的描述符返回 `UnknownDescriptor`；空输入得到空消息；
/// - **设计权衡 (Trade-offs)**：保留视图会延长底层块的存活期，直到消息被丢弃。
#[derive(Debug, Clone, Copy)]
pub struct SectionDecoder<'r> {
    registry: &'r AmqpTypeRegistry,
    config: &'r DecoderConfig,
}

impl<'r> SectionDecoder<'r> {
    pub fn new(registry: &'r AmqpTypeRegistry, config: &'r DecoderConfig) -> Self {
        Self { registry, config }
    }

    /// 按线上顺序解析全部节区。
    pub fn parse_all(&self, views: Vec<PooledView>) -> Result<Vec<Section>, CodecError> {
        let mut input = ViewChain::new(views);
        let handler = self.registry.value_handler(self.config);
        let mut order = SectionOrder::default();
        let mut sections = Vec::new();

        while input.remaining() > 0 {
            let mark = input.mark();
            let code = input.get()?;
            if code != fc::DESCRIBED {
                return Err(CodecError::decode(format!(
                    "expected described section, found format code 0x{code:02x}"
                )));
            }
            let descriptor = handler.read_descriptor(&mut input)?;
            let constructor = self.registry.sections().lookup(&descriptor)?;
            let kind = constructor.kind();
            order.advance(kind)?;

            let value = constructor.construct(&mut input, &handler)?;
            let encoded = EncodedForm::new(input.views_since(&mark)?);
            trace!(
                section = %kind,
                encoded_len = encoded.len(),
                index = sections.len(),
                "decoded message section"
            );
            sections.push(Section::new(value, encoded));
        }
        Ok(sections)
    }

    /// 解码为结构化消息。
    pub fn decode(&self, views: Vec<PooledView>) -> Result<StructuredMessage, CodecError> {
        let sections = self.parse_all(views)?;
        StructuredMessage::from_sections(sections)
    }

    /// 复制连续字节到池中后解码。
    pub fn decode_bytes(
        &self,
        pool: &BufferPool,
        bytes: &[u8],
    ) -> Result<StructuredMessage, CodecError> {
        let view = pool.wrap(bytes)?;
        self.decode(vec![view])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_data_is_accepted() {
        let mut order = SectionOrder::default();
        for kind in [
            SectionKind::Header,
            SectionKind::Properties,
            SectionKind::Data,
            SectionKind::Data,
            SectionKind::Footer,
        ] {
            order.advance(kind).expect("合法顺序");
        }
    }

    #[test]
    #[tracing_test::traced_test]
    fn each_section_emits_a_trace_event() {
        let registry = AmqpTypeRegistry::standard();
        let config = DecoderConfig::default();
        let pool = BufferPool::new();
        let wire = [0x00, 0x53, 0x77, 0xa1, 0x02, b'h', b'i'];
        let message = SectionDecoder::new(&registry, &config)
            .decode_bytes(&pool, &wire)
            .expect("合法输入");
        assert_eq!(message.body_kind(), Some(SectionKind::AmqpValue));
        assert!(logs_contain("decoded message section"));
    }

    #[test]
    fn mixed_or_misordered_sections_are_rejected() {
        let cases: &[&[SectionKind]] = &[
            &[SectionKind::Data, SectionKind::AmqpSequence],
            &[SectionKind::AmqpValue, SectionKind::AmqpValue],
            &[SectionKind::Properties, SectionKind::Header],
            &[SectionKind::Header, SectionKind::Header],
            &[SectionKind::Footer, SectionKind::Data],
            &[SectionKind::Footer, SectionKind::Footer],
        ];
        for case in cases {
            let mut order = SectionOrder::default();
            let result = case.iter().try_for_each(|kind| order.advance(*kind));
            assert!(
                matches!(result, Err(CodecError::Decode(_))),
                "{case:?} 应被拒绝"
            );
        }
    }
}
