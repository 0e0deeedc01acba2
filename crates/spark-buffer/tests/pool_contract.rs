//! `pool_contract` 集成测试：验证 `BufferPool` 在公开 API 下的租借、回收与统计契约。
//!
//! # 测试目标（Why）
//! - 保障视图释放后存储可靠回到池中，统计字段与生命周期一致；
//! - 以外部 crate 视角调用，避免依赖内部实现细节。

use std::sync::{Arc, Mutex};

use bytes::{BufMut, BytesMut};
use spark_buffer::{BufferPool, BufferRecycler, PoolConfig, PooledBufMut, ReclaimedBuffer};

/// 记录每一次回收事件的探针实现。
#[derive(Default)]
struct RecordingRecycler {
    events: Mutex<Vec<usize>>,
}

impl RecordingRecycler {
    fn take_events(&self) -> Vec<usize> {
        self.events
            .lock()
            .expect("mutex poisoned")
            .drain(..)
            .collect()
    }
}

impl BufferRecycler for RecordingRecycler {
    fn reclaim(&self, reclaimed: ReclaimedBuffer) {
        self.events
            .lock()
            .expect("mutex poisoned")
            .push(reclaimed.capacity());
    }
}

/// 冻结后的块只有在所有兄弟视图释放后才回收，且只回收一次。
#[test]
fn chunk_is_reclaimed_once_after_last_view() {
    let recycler = Arc::new(RecordingRecycler::default());
    let mut writable = PooledBufMut::new(BytesMut::with_capacity(16), recycler.clone());
    writable.put_slice(b"abcdef");
    let expected_capacity = writable.capacity();
    let view = writable.freeze();
    let sibling = view.duplicate().expect("复制视图失败");
    let child = view.view(2, 2).expect("截取子视图失败");
    assert_eq!(view.ref_count(), 3);

    drop(view);
    drop(sibling);
    assert!(recycler.take_events().is_empty(), "仍有视图存活时不应回收");
    drop(child);
    assert_eq!(recycler.take_events(), vec![expected_capacity]);
}

/// 未冻结即丢弃的租约直接回收。
#[test]
fn dropped_writable_lease_is_reclaimed() {
    let recycler = Arc::new(RecordingRecycler::default());
    {
        let mut writable = PooledBufMut::new(BytesMut::with_capacity(8), recycler.clone());
        writable.put_u8(1);
        assert_eq!(writable.written(), 1);
    }
    assert_eq!(recycler.take_events().len(), 1);
}

/// 所有视图释放后池内不再有活跃块。
#[test]
fn stats_track_view_lifecycle() {
    let pool = BufferPool::new();
    let view = pool.wrap(b"payload").expect("分配视图失败");
    let during = pool.statistics();
    assert_eq!(during.active_chunks, 1);
    assert!(during.allocated_bytes >= 7);

    let mut sibling = view.duplicate().expect("复制视图失败");
    drop(view);
    assert_eq!(pool.statistics().active_chunks, 1);
    sibling.dispose().expect("释放视图失败");
    assert_eq!(pool.statistics().active_chunks, 0);
}

/// `shrink_to_fit` 清空自由链表并刷新统计。
#[test]
fn shrink_to_fit_releases_cached_buffers() {
    let pool = BufferPool::new();
    let cached_capacity = {
        let writable = pool.allocate(48).expect("初次租借失败");
        writable.capacity()
    };
    let reclaimed = pool.shrink_to_fit();
    assert!(reclaimed >= cached_capacity, "回收字节数至少应覆盖已缓存容量");
    let stats = pool.statistics();
    assert_eq!(stats.available_bytes, 0, "收缩后不应保留闲置容量");
    assert_eq!(stats.free_chunks, 0);
}

/// 自由链表容量受配置约束。
#[test]
fn free_list_respects_configured_bound() {
    let pool = BufferPool::with_config(PoolConfig {
        max_free_chunks: 1,
        ..PoolConfig::default()
    });
    let a = pool.allocate(16).expect("租借失败");
    let b = pool.allocate(16).expect("租借失败");
    drop(a);
    drop(b);
    assert_eq!(pool.statistics().free_chunks, 1);
}

/// 空负载同样可以包装为视图。
#[test]
fn wrap_accepts_empty_payload() {
    let pool = BufferPool::new();
    let mut view = pool.wrap(&[]).expect("空负载的包装应成功");
    assert_eq!(view.remaining(), 0);
    assert!(view.copy_to_slice(&mut []).is_ok(), "读取零字节应平稳返回");
}

/// 并发租借与释放不会破坏统计。
#[test]
fn concurrent_views_release_cleanly() {
    let pool = BufferPool::new();
    let shared = pool.wrap(&[7u8; 256]).expect("分配视图失败");
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let mut view = shared.view(i * 64, 64).expect("截取子视图失败");
            let pool = pool.clone();
            std::thread::spawn(move || {
                let local = pool.wrap(&[i as u8; 32]).expect("线程内分配失败");
                let sum: u32 = (0..64).map(|_| u32::from(view.get().expect("读取失败"))).sum();
                drop(local);
                sum
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().expect("线程异常退出"), 7 * 64);
    }
    drop(shared);
    assert_eq!(pool.statistics().active_chunks, 0);
}
