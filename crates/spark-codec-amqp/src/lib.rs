//! `spark-codec-amqp`：AMQP 1.0 类型系统、描述类型注册表与消息节区解码器。
//!
//! # 模块定位（Why）
//! - AMQP 1.0 的值自描述：格式码决定原语布局，描述符决定复合类型语义；
//! - 代理需要把入站字节拆成强类型节区供转换器使用，同时保留原始字节供透传。
//!
//! # 设计概要（How）
//! - [`constructor`]：按格式码分派的原语构造器，以及描述类型构造器接口；
//! - [`ValueHandler`]：一次解码调用的上下文，负责递归、描述符查找与嵌套深度控制；
//! - [`AmqpTypeRegistry`]：按层注册的描述符表，符号别名与数值别名指向同一构造器；
//! - [`section`]：节区模型、顺序状态机与 [`StructuredMessage`]；
//! - [`encoder`]：确定性的最紧凑编码，用于构造新节区与转换结果。
//!
//! # 使用示例
//! ```
//! use spark_buffer::BufferPool;
//! use spark_codec_amqp::{AmqpTypeRegistry, DecoderConfig, SectionKind};
//!
//! let registry = AmqpTypeRegistry::standard();
//! let config = DecoderConfig::default();
//! let pool = BufferPool::new();
//! // amqp-value 节区，内容为字符串 "hi"
//! let wire = [0x00, 0x53, 0x77, 0xa1, 0x02, b'h', b'i'];
//! let message = registry
//!     .section_decoder(&config)
//!     .decode_bytes(&pool, &wire)
//!     .expect("合法输入");
//! assert_eq!(message.body_kind(), Some(SectionKind::AmqpValue));
//! ```

mod config;
pub mod constructor;
pub mod encoder;
pub mod error;
pub mod format_code;
mod handler;
pub mod messaging;
mod registry;
pub mod section;
mod types;

pub use crate::{
    config::DecoderConfig,
    encoder::{encode_to_vec, encode_value},
    error::CodecError,
    handler::ValueHandler,
    messaging::{Header, Properties},
    registry::{
        AmqpTypeRegistry, DescribedTypeRegistry, MESSAGING_TYPES, SECURITY_TYPES,
        SectionRegistry, TRANSACTION_TYPES, TRANSPORT_TYPES, ValueRegistry,
    },
    section::{
        EncodedForm, Section, SectionConstructor, SectionDecoder, SectionKind, SectionValue,
        StructuredMessage,
    },
    types::{AmqpMap, Binary, Described, Descriptor, Symbol, Value},
};
