use std::{
    fmt, mem,
    ops::{Deref, DerefMut},
    sync::Arc,
};

use bytes::{Bytes, BytesMut};

use crate::view::PooledView;

/// `BufferRecycler` 描述缓冲块在最后一个引用释放时的回收入口。
///
/// # 设计初衷（Why）
/// - 同一块内存可能同时被多个 [`PooledView`] 别名引用，只有最后一个引用消失时才能归还；
/// - 将回收动作抽象为 trait，可在测试中注入探针观察回收事件，生产环境则由池自身实现。
///
/// # 契约定义（What）
/// - 实现必须线程安全且不得 panic：回收发生在 `Drop` 路径上；
/// - 每个租借的块恰好触发一次 `reclaim`。
pub trait BufferRecycler: Send + Sync + 'static {
    /// 通知池回收一块内存。
    fn reclaim(&self, reclaimed: ReclaimedBuffer);
}

/// 一次回收动作携带的上下文。
///
/// - `capacity`：租借时记录的容量，保证池侧统计一致；
/// - `buffer`：若成功夺回 `BytesMut` 所有权则为 `Some`，否则池只更新统计。
#[derive(Debug)]
pub struct ReclaimedBuffer {
    capacity: usize,
    buffer: Option<BytesMut>,
}

impl ReclaimedBuffer {
    /// 创建回收上下文。
    pub fn new(capacity: usize, buffer: Option<BytesMut>) -> Self {
        Self { capacity, buffer }
    }

    /// 租借时登记的容量。
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// 消耗结构并返回可复用的 `BytesMut`。
    pub fn into_buffer(self) -> Option<BytesMut> {
        self.buffer
    }
}

/// 冻结后的共享底层存储。
///
/// 所有视图经由 `Arc<Chunk>` 共享它；`Arc` 强引用数即为存储的引用计数，
/// 归零时 `Drop` 尝试取回 `BytesMut` 并交还回收器。
pub(crate) struct Chunk {
    data: Bytes,
    capacity: usize,
    recycler: Arc<dyn BufferRecycler>,
}

impl Chunk {
    pub(crate) fn bytes(&self) -> &[u8] {
        &self.data
    }
}

impl Drop for Chunk {
    fn drop(&mut self) {
        let data = mem::take(&mut self.data);
        let buffer = data.try_into_mut().ok();
        self.recycler
            .reclaim(ReclaimedBuffer::new(self.capacity, buffer));
    }
}

impl fmt::Debug for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chunk")
            .field("len", &self.data.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

/// 可写租约：写入完成后通过 [`freeze`](Self::freeze) 转为只读视图。
///
/// # 契约说明（What）
/// - 通过 `Deref<Target = BytesMut>` 暴露 `bytes::BufMut` 全部写入能力；
/// - 未冻结即被丢弃时，底层 `BytesMut` 原样归还回收器；
/// - 冻结后租约所有权转移给共享块，由最后一个视图负责归还。
pub struct PooledBufMut {
    buffer: BytesMut,
    capacity: usize,
    recycler: Arc<dyn BufferRecycler>,
    released: bool,
}

impl PooledBufMut {
    /// 基于已有 `BytesMut` 与回收器构造租约。
    pub fn new(buffer: BytesMut, recycler: Arc<dyn BufferRecycler>) -> Self {
        let capacity = buffer.capacity();
        Self {
            buffer,
            capacity,
            recycler,
            released: false,
        }
    }

    /// 已写入的字节数。
    pub fn written(&self) -> usize {
        self.buffer.len()
    }

    /// 冻结为只读视图，窗口覆盖全部已写入字节。
    pub fn freeze(mut self) -> PooledView {
        self.released = true;
        let buffer = mem::take(&mut self.buffer);
        let chunk = Chunk {
            capacity: self.capacity,
            data: buffer.freeze(),
            recycler: Arc::clone(&self.recycler),
        };
        PooledView::from_chunk(Arc::new(chunk))
    }
}

impl Deref for PooledBufMut {
    type Target = BytesMut;

    fn deref(&self) -> &Self::Target {
        &self.buffer
    }
}

impl DerefMut for PooledBufMut {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buffer
    }
}

impl Drop for PooledBufMut {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let buffer = mem::take(&mut self.buffer);
        self.recycler
            .reclaim(ReclaimedBuffer::new(self.capacity, Some(buffer)));
    }
}

impl fmt::Debug for PooledBufMut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledBufMut")
            .field("written", &self.buffer.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}
