use serde::Deserialize;

/// 解码器的可调参数。
///
/// - `max_nesting_depth`：列表、映射、数组、描述类型的最大嵌套深度，超出返回 `Decode`；
/// - `allow_unknown_descriptors`：为 `true` 时未注册的描述类型以原始 [`Value::Described`](crate::Value::Described)
///   形式保留，默认 `false`，即返回 `UnknownDescriptor`。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    pub max_nesting_depth: usize,
    pub allow_unknown_descriptors: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_nesting_depth: 64,
            allow_unknown_descriptors: false,
        }
    }
}
