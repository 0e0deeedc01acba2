use std::sync::{
    Arc,
    atomic::{AtomicU64, AtomicUsize, Ordering},
};

use bytes::{BufMut, BytesMut};
use spin::Mutex;
use tracing::{debug, trace};

use crate::{
    config::PoolConfig,
    error::BufferError,
    pooled_buffer::{BufferRecycler, PooledBufMut, ReclaimedBuffer},
    view::PooledView,
};

/// `BufferPool` 以自由链表复用 `BytesMut`，为解码与转换提供池化存储。
///
/// # 模块角色（Why）
/// - 入站帧、转换产物、节区重编码都从同一个池租借内存，减少堆分配抖动；
/// - 视图归还由引用计数驱动，调用方无需关心何时把内存交还池。
///
/// # 核心机制（How）
/// - `spin::Mutex<Vec<BytesMut>>` 作为自由链表，租借时优先复用容量足够的块；
/// - `PoolMetrics` 用原子计数跟踪分配量、驻留量、可用量与活跃块数量；
/// - `BufferRecycler` 由 `PoolInner` 实现，最后一个视图释放时把块放回链表。
///
/// # 契约说明（What）
/// - **线程安全**：句柄可克隆并跨线程共享，并发租借与回收无需外部同步；
/// - **容量上限**：配置了 `max_resident_bytes` 时，超限租借返回 [`BufferError::PoolExhausted`]；
/// - **后置条件**：`allocate` 返回的租约容量不小于请求值，`wrap` 返回的视图内容与输入一致。
///
/// # 设计权衡（Trade-offs）
/// - 自旋锁临界区极短（一次查找与交换），换取无依赖的实现；
/// - 回收时未能夺回 `BytesMut`（仍有外部 `Bytes` 别名）只更新统计，下次租借重新分配。
#[derive(Clone)]
pub struct BufferPool {
    inner: Arc<PoolInner>,
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::with_config(PoolConfig::default())
    }
}

impl BufferPool {
    /// 以默认配置创建池。
    pub fn new() -> Self {
        Self::default()
    }

    /// 以指定配置创建池。
    pub fn with_config(config: PoolConfig) -> Self {
        Self {
            inner: Arc::new(PoolInner::new(config)),
        }
    }

    /// 租借一个至少能容纳 `min_capacity` 字节的可写缓冲。
    pub fn allocate(&self, min_capacity: usize) -> Result<PooledBufMut, BufferError> {
        let raw = self.inner.acquire_buffer(min_capacity)?;
        let recycler: Arc<dyn BufferRecycler> = self.inner.clone();
        Ok(PooledBufMut::new(raw, recycler))
    }

    /// 复制 `data` 到池化存储并冻结为只读视图。
    pub fn wrap(&self, data: &[u8]) -> Result<PooledView, BufferError> {
        let mut writable = self.allocate(data.len())?;
        writable.put_slice(data);
        Ok(writable.freeze())
    }

    /// 清空自由链表，返回释放的字节数。
    pub fn shrink_to_fit(&self) -> usize {
        self.inner.shrink_free_list()
    }

    /// 读取统计快照。
    pub fn statistics(&self) -> PoolStats {
        self.inner.snapshot()
    }
}

impl std::fmt::Debug for BufferPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BufferPool")
            .field("stats", &self.statistics())
            .finish()
    }
}

/// 池统计快照。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    pub allocated_bytes: usize,
    pub resident_bytes: usize,
    pub available_bytes: usize,
    pub active_chunks: usize,
    pub free_chunks: usize,
    pub failed_acquisitions: u64,
}

struct PoolInner {
    free_list: Mutex<Vec<BytesMut>>,
    metrics: PoolMetrics,
    config: PoolConfig,
}

impl PoolInner {
    fn new(config: PoolConfig) -> Self {
        Self {
            free_list: Mutex::new(Vec::new()),
            metrics: PoolMetrics::default(),
            config,
        }
    }

    /// 从自由链表或堆上获取一个满足容量的 `BytesMut`。
    fn acquire_buffer(&self, min_capacity: usize) -> Result<BytesMut, BufferError> {
        let reused = {
            let mut list = self.free_list.lock();
            let index = list.iter().position(|buf| buf.capacity() >= min_capacity);
            index.map(|index| list.swap_remove(index))
        };

        let mut buffer = match reused {
            Some(buf) => {
                self.metrics.decrease_available(buf.capacity());
                buf
            }
            None => {
                let capacity = min_capacity.max(self.config.min_chunk_capacity);
                if let Some(limit) = self.config.max_resident_bytes {
                    let resident = self.metrics.resident_bytes.load(Ordering::Relaxed);
                    if resident.saturating_add(capacity) > limit {
                        self.metrics
                            .failed_acquisitions
                            .fetch_add(1, Ordering::Relaxed);
                        debug!(requested = capacity, resident, limit, "buffer pool exhausted");
                        return Err(BufferError::PoolExhausted {
                            requested: capacity,
                            limit,
                        });
                    }
                }
                let buf = BytesMut::with_capacity(capacity);
                self.metrics.increase_on_new_allocation(buf.capacity());
                buf
            }
        };
        buffer.clear();
        self.metrics.active_chunks.fetch_add(1, Ordering::Relaxed);
        Ok(buffer)
    }

    fn shrink_free_list(&self) -> usize {
        let mut list = self.free_list.lock();
        let reclaimed: usize = list.iter().map(BytesMut::capacity).sum();
        list.clear();
        self.metrics.decrease_available(reclaimed);
        self.metrics.decrease_resident(reclaimed);
        trace!(reclaimed, "buffer pool free list cleared");
        reclaimed
    }

    fn snapshot(&self) -> PoolStats {
        let free_chunks = self.free_list.lock().len();
        PoolStats {
            allocated_bytes: self.metrics.allocated_bytes.load(Ordering::Relaxed),
            resident_bytes: self.metrics.resident_bytes.load(Ordering::Relaxed),
            available_bytes: self.metrics.available_bytes.load(Ordering::Relaxed),
            active_chunks: self.metrics.active_chunks.load(Ordering::Relaxed),
            free_chunks,
            failed_acquisitions: self.metrics.failed_acquisitions.load(Ordering::Relaxed),
        }
    }
}

impl BufferRecycler for PoolInner {
    fn reclaim(&self, reclaimed: ReclaimedBuffer) {
        saturating_sub(&self.metrics.active_chunks, 1);
        let leased = reclaimed.capacity();
        match reclaimed.into_buffer() {
            Some(mut buf) => {
                buf.clear();
                let actual = buf.capacity();
                if actual > leased {
                    self.metrics.increase_on_new_allocation(actual - leased);
                } else {
                    self.metrics.decrease_resident(leased - actual);
                }
                let mut list = self.free_list.lock();
                if list.len() < self.config.max_free_chunks {
                    list.push(buf);
                    self.metrics.increase_available(actual);
                } else {
                    self.metrics.decrease_resident(actual);
                }
            }
            None => self.metrics.decrease_resident(leased),
        }
    }
}

#[derive(Default)]
struct PoolMetrics {
    allocated_bytes: AtomicUsize,
    resident_bytes: AtomicUsize,
    available_bytes: AtomicUsize,
    active_chunks: AtomicUsize,
    failed_acquisitions: AtomicU64,
}

impl PoolMetrics {
    fn increase_on_new_allocation(&self, capacity: usize) {
        self.allocated_bytes.fetch_add(capacity, Ordering::Relaxed);
        self.resident_bytes.fetch_add(capacity, Ordering::Relaxed);
    }

    fn increase_available(&self, capacity: usize) {
        self.available_bytes.fetch_add(capacity, Ordering::Relaxed);
    }

    fn decrease_available(&self, capacity: usize) {
        saturating_sub(&self.available_bytes, capacity);
    }

    fn decrease_resident(&self, capacity: usize) {
        saturating_sub(&self.resident_bytes, capacity);
    }
}

fn saturating_sub(target: &AtomicUsize, value: usize) {
    let _ = target.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
        Some(current.saturating_sub(value))
    });
}
