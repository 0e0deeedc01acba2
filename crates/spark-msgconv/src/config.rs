use serde::Deserialize;
use spark_buffer::PoolConfig;
use spark_codec_amqp::DecoderConfig;

use crate::error::ConfigError;

/// 转换引擎的配置。
///
/// # 契约说明（What）
/// - `pool`：转换过程中使用的缓冲池参数；
/// - `decoder`：重新解析 1.0 消息体与 AMQP 集合内容时的解码参数；
/// - `strict_message_kind`：为 `true` 时未识别的消息种类注解返回错误，默认按缺失处理；
/// - `local_address_prefix`：1.0 地址中属于本地址空间的前缀，离开 1.0 时从 reply-to 中剥离。
///
/// # 示例
/// ```
/// use spark_msgconv::ConversionConfig;
///
/// let config = ConversionConfig::from_toml_str(
///     r#"
///     strict_message_kind = true
///
///     [decoder]
///     max_nesting_depth = 16
///     "#,
/// )
/// .expect("合法配置");
/// assert!(config.strict_message_kind);
/// assert_eq!(config.decoder.max_nesting_depth, 16);
/// assert!(!config.decoder.allow_unknown_descriptors);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    pub pool: PoolConfig,
    pub decoder: DecoderConfig,
    pub strict_message_kind: bool,
    pub local_address_prefix: Option<String>,
}

impl ConversionConfig {
    /// 从 TOML 文本解析，缺省字段取默认值。
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = ConversionConfig::from_toml_str("").expect("空文档合法");
        assert_eq!(config, ConversionConfig::default());
    }

    #[test]
    fn nested_pool_section_is_parsed() {
        let config = ConversionConfig::from_toml_str(
            "local_address_prefix = \"/vhost/\"\n[pool]\nmax_resident_bytes = 4096\n",
        )
        .expect("合法配置");
        assert_eq!(config.pool.max_resident_bytes, Some(4096));
        assert_eq!(config.pool.max_free_chunks, PoolConfig::default().max_free_chunks);
        assert_eq!(config.local_address_prefix.as_deref(), Some("/vhost/"));
    }

    #[test]
    fn type_mismatch_is_reported() {
        let err = ConversionConfig::from_toml_str("strict_message_kind = \"yes\"")
            .expect_err("类型不符必须失败");
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
