//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 转换失败必须整条消息失败：调用方据此拒绝单条投递，而不是输出残缺的目标消息；
//! - 编解码与缓冲层的错误原样向上传递，保留其错误码。
//!
//! ## 设计要求（What）
//! - [`ConversionError`] 的每个变体映射到稳定错误码（[`codes`]）；
//! - 配置解析错误独立为 [`ConfigError`]，不与运行期转换错误混用。

use spark_buffer::BufferError;
use spark_codec_amqp::CodecError;
use thiserror::Error;

use crate::message::Protocol;

/// 稳定错误码。
pub mod codes {
    /// 消息体包含目标协议无法表示的值。
    pub const CONVERSION_UNSUPPORTED_VALUE: &str = "conversion.unsupported_value";
    /// 源消息体结构不合法。
    pub const CONVERSION_INVALID_BODY: &str = "conversion.invalid_body";
    /// 内容字节与声明的 mime 类型不符。
    pub const CONVERSION_INVALID_CONTENT: &str = "conversion.invalid_content";
    /// 严格模式下遇到未识别的消息种类注解。
    pub const CONVERSION_UNKNOWN_MESSAGE_KIND: &str = "conversion.unknown_message_kind";
    /// 协议对没有对应的转换器。
    pub const CONVERSION_NO_CONVERTER: &str = "conversion.no_converter";
}

/// 消息转换错误。
///
/// # 教案式说明
/// - **意图 (Why)**：区分“值无法表示”“内容损坏”“协议对不支持”三类失败，便于运维定位；
/// - **契约 (What)**：任何变体返回时都不会产生目标消息；
/// - **设计权衡 (Trade-offs)**：上下文以字符串保存，诊断友好但不可做结构化匹配。
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    /// 值的类型在目标协议中没有表示。
    #[error("unsupported {type_name} value in {context}")]
    UnsupportedValue {
        type_name: &'static str,
        context: &'static str,
    },
    /// 源消息体结构不合法。
    #[error("invalid message body: {0}")]
    InvalidBody(String),
    /// 内容字节无法按 mime 类型解码。
    #[error("invalid {mime_type} content: {reason}")]
    InvalidContent {
        mime_type: &'static str,
        reason: String,
    },
    /// 未识别的消息种类注解（仅严格模式）。
    #[error("unrecognized message kind annotation {0}")]
    UnknownMessageKind(String),
    /// 协议对没有转换器。
    #[error("no converter from {from} to {to}")]
    NoConverter { from: Protocol, to: Protocol },
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Buffer(#[from] BufferError),
}

impl ConversionError {
    pub(crate) fn unsupported(type_name: &'static str, context: &'static str) -> Self {
        Self::UnsupportedValue { type_name, context }
    }

    pub(crate) fn invalid_content(mime_type: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidContent {
            mime_type,
            reason: reason.into(),
        }
    }

    /// 稳定错误码；编解码与缓冲错误沿用下层错误码。
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnsupportedValue { .. } => codes::CONVERSION_UNSUPPORTED_VALUE,
            Self::InvalidBody(_) => codes::CONVERSION_INVALID_BODY,
            Self::InvalidContent { .. } => codes::CONVERSION_INVALID_CONTENT,
            Self::UnknownMessageKind(_) => codes::CONVERSION_UNKNOWN_MESSAGE_KIND,
            Self::NoConverter { .. } => codes::CONVERSION_NO_CONVERTER,
            Self::Codec(error) => error.code(),
            Self::Buffer(_) => spark_codec_amqp::error::codes::BUFFER_LIFECYCLE,
        }
    }
}

/// 转换配置加载错误。
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse conversion config: {0}")]
    Parse(#[from] toml::de::Error),
}
