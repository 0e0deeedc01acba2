//! `view_contract` 集成测试：聚焦 `PooledView` 的游标独立性与释放安全。
//!
//! # 测试总览（Why）
//! - 兄弟视图共享存储但游标独立，是零拷贝切分的前提；
//! - 重复释放、释放后读取必须显式失败，不能返回陈旧数据。

use proptest::prelude::*;
use spark_buffer::{BufferError, BufferPool, ViewChain};

#[test]
fn duplicated_views_keep_independent_cursors() {
    let pool = BufferPool::new();
    let mut first = pool.wrap(&[1, 2, 3, 4]).expect("分配视图失败");
    let mut second = first.duplicate().expect("复制视图失败");

    assert_eq!(first.get().expect("读取失败"), 1);
    assert_eq!(first.get().expect("读取失败"), 2);
    assert_eq!(second.position(), 0);
    assert_eq!(second.get().expect("读取失败"), 1);
    assert_eq!(first.remaining(), 2);
    assert_eq!(second.remaining(), 3);
}

#[test]
fn double_dispose_is_rejected() {
    let pool = BufferPool::new();
    let mut view = pool.wrap(b"abc").expect("分配视图失败");
    view.dispose().expect("首次释放应成功");
    assert_eq!(view.dispose(), Err(BufferError::AlreadyDisposed));
}

#[test]
fn reads_after_dispose_are_rejected() {
    let pool = BufferPool::new();
    let mut view = pool.wrap(b"abc").expect("分配视图失败");
    let mut sibling = view.duplicate().expect("复制视图失败");
    view.dispose().expect("释放应成功");

    assert_eq!(view.get(), Err(BufferError::Disposed));
    assert_eq!(view.get_int(), Err(BufferError::Disposed));
    assert!(view.duplicate().is_err());
    assert!(view.view(0, 1).is_err());
    assert!(!view.has_remaining(1));
    assert_eq!(view.ref_count(), 0);

    assert_eq!(sibling.get().expect("兄弟视图不受影响"), b'a');
}

#[test]
fn reading_past_limit_reports_insufficient_data() {
    let pool = BufferPool::new();
    let mut view = pool.wrap(&[0, 0, 1]).expect("分配视图失败");
    let err = view.get_int().expect_err("越界读取应失败");
    assert_eq!(
        err,
        BufferError::InsufficientData {
            requested: 4,
            available: 3
        }
    );
    assert_eq!(view.position(), 0, "失败的读取不应推进游标");
}

#[test]
fn sub_view_shares_storage() {
    let pool = BufferPool::new();
    let mut view = pool.wrap(b"header:body").expect("分配视图失败");
    view.advance(7).expect("跳过头部");
    let body = view.view(0, 4).expect("截取正文");
    assert_eq!(body.copy_remaining().expect("复制正文"), b"body");
    assert_eq!(view.ref_count(), 2);
}

proptest! {
    /// 任意切分方式下，链式读取得到的字节与原始输入一致。
    #[test]
    fn chain_reassembles_any_fragmentation(
        payload in proptest::collection::vec(any::<u8>(), 0..256),
        cuts in proptest::collection::vec(any::<prop::sample::Index>(), 0..6),
    ) {
        let pool = BufferPool::new();
        let mut points: Vec<usize> = cuts.iter().map(|cut| cut.index(payload.len() + 1)).collect();
        points.push(0);
        points.push(payload.len());
        points.sort_unstable();
        let views = points
            .windows(2)
            .map(|w| pool.wrap(&payload[w[0]..w[1]]).expect("分配分片失败"))
            .collect();
        let mut chain = ViewChain::new(views);
        prop_assert_eq!(chain.remaining(), payload.len());
        let copied = chain
            .read_contiguous(payload.len(), |bytes| bytes.to_vec())
            .expect("读取全部字节");
        prop_assert_eq!(copied, payload);
    }
}
