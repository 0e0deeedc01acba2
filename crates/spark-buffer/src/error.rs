use thiserror::Error;

/// 缓冲视图与缓冲池的错误枚举。
///
/// # 设计背景（Why）
/// - 解码链路需要区分“数据不足”“视图已释放”“池容量耗尽”等语义，
///   上层据此决定拒绝单条消息还是整体降级。
/// - `InsufficientData` 与 `PoolExhausted` 必须可区分：前者是输入截断，后者是资源压力。
///
/// # 契约说明（What）
/// - 所有变体都是本地同步失败，缓冲层不做任何重试。
/// - `Display` 文本面向日志，字段保留原始数值便于诊断。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    /// 读取超过视图剩余字节。
    #[error("insufficient data: requested {requested} bytes, {available} available")]
    InsufficientData { requested: usize, available: usize },
    /// 子视图或游标越过窗口边界。
    #[error("range {offset}+{length} exceeds view limit {limit}")]
    OutOfBounds {
        offset: usize,
        length: usize,
        limit: usize,
    },
    /// 视图释放后仍被访问。
    #[error("buffer view used after dispose")]
    Disposed,
    /// 同一视图被重复释放。
    #[error("buffer view disposed twice")]
    AlreadyDisposed,
    /// 池驻留内存达到上限。
    #[error("buffer pool exhausted: requested {requested} bytes with limit {limit}")]
    PoolExhausted { requested: usize, limit: usize },
}

impl BufferError {
    /// 判断错误是否属于输入截断类问题。
    pub fn is_underrun(&self) -> bool {
        matches!(self, Self::InsufficientData { .. })
    }
}
