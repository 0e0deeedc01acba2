//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 集中定义 AMQP 1.0 编解码的失败语义：输入截断、编码非法、描述符未注册、编码失败；
//! - 所有错误都是本地同步失败，直接返回给调用方，编解码器内部从不重试。
//!
//! ## 设计要求（What）
//! - 每个变体映射到稳定的错误码（[`codes`]），以及 AMQP 规范定义的错误条件符号；
//! - 缓冲层错误经 `From` 转换：数据不足归入 [`CodecError::InsufficientData`]，其余保留原样。

use spark_buffer::BufferError;
use thiserror::Error;

use crate::types::Descriptor;

/// 稳定错误码。
pub mod codes {
    /// 输入数据不足。
    pub const PROTOCOL_INSUFFICIENT_DATA: &str = "protocol.insufficient_data";
    /// 编码格式非法。
    pub const PROTOCOL_DECODE: &str = "protocol.decode";
    /// 描述符未注册。
    pub const PROTOCOL_UNKNOWN_DESCRIPTOR: &str = "protocol.unknown_descriptor";
    /// 值无法编码。
    pub const PROTOCOL_ENCODE: &str = "protocol.encode";
    /// 缓冲生命周期违规。
    pub const BUFFER_LIFECYCLE: &str = "buffer.lifecycle";
}

/// AMQP 编解码错误。
///
/// # 教案式说明
/// - **意图 (Why)**：让传输层能够区分“拒绝这一条消息”（解码类错误）与“资源问题”（缓冲类错误）；
/// - **契约 (What)**：`Decode` 覆盖非法 UTF-8、节区乱序、长度字段超出剩余数据等；
///   `UnknownDescriptor` 永不被静默跳过；
/// - **设计权衡 (Trade-offs)**：上下文以 `String` 保存，便于日志直接输出。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// 原语解码过程中缓冲耗尽。
    #[error("insufficient data: requested {requested} bytes, {available} available")]
    InsufficientData { requested: usize, available: usize },
    /// 编码格式非法。
    #[error("decode error: {0}")]
    Decode(String),
    /// 描述类型未注册。
    #[error("unknown descriptor {0}")]
    UnknownDescriptor(Descriptor),
    /// 值无法按 AMQP 规则编码。
    #[error("encode error: {0}")]
    Encode(String),
    /// 缓冲视图生命周期违规或池资源不足。
    #[error(transparent)]
    Buffer(BufferError),
}

impl CodecError {
    pub(crate) fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    pub(crate) fn encode(message: impl Into<String>) -> Self {
        Self::Encode(message.into())
    }

    /// 稳定错误码。
    pub fn code(&self) -> &'static str {
        match self {
            Self::InsufficientData { .. } => codes::PROTOCOL_INSUFFICIENT_DATA,
            Self::Decode(_) => codes::PROTOCOL_DECODE,
            Self::UnknownDescriptor(_) => codes::PROTOCOL_UNKNOWN_DESCRIPTOR,
            Self::Encode(_) => codes::PROTOCOL_ENCODE,
            Self::Buffer(_) => codes::BUFFER_LIFECYCLE,
        }
    }

    /// 对端可见的 AMQP 错误条件。
    pub fn amqp_condition(&self) -> &'static str {
        match self {
            Self::InsufficientData { .. } | Self::Decode(_) | Self::UnknownDescriptor(_) => {
                "amqp:decode-error"
            }
            Self::Encode(_) | Self::Buffer(_) => "amqp:internal-error",
        }
    }
}

impl From<BufferError> for CodecError {
    fn from(error: BufferError) -> Self {
        match error {
            BufferError::InsufficientData {
                requested,
                available,
            } => Self::InsufficientData {
                requested,
                available,
            },
            other => Self::Buffer(other),
        }
    }
}
