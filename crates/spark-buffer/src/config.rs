use serde::Deserialize;

/// 缓冲池的可调参数。
///
/// # 契约说明（What）
/// - `max_free_chunks`：自由链表最多缓存的块数量，超出部分在回收时直接归还分配器；
/// - `max_resident_bytes`：驻留内存上限，`None` 表示不限；超过上限的租借返回
///   [`BufferError::PoolExhausted`](crate::BufferError::PoolExhausted)；
/// - `min_chunk_capacity`：新分配块的最小容量，避免为极小请求反复分配。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub max_free_chunks: usize,
    pub max_resident_bytes: Option<usize>,
    pub min_chunk_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_free_chunks: 256,
            max_resident_bytes: None,
            min_chunk_capacity: 64,
        }
    }
}
