use smallvec::SmallVec;

use crate::{error::BufferError, view::PooledView};

/// 链上各视图在某一时刻的游标快照。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainMark {
    positions: SmallVec<[usize; 4]>,
}

/// `ViewChain` 将若干不连续的 [`PooledView`] 串成一条逻辑字节流。
///
/// # 设计背景（Why）
/// - 传输层交付的消息体通常是多个分片，解码器不应为了连续读取而先整体复制；
/// - 节区解码需要记录“本节区消费了哪些字节”，以便原样转发。
///
/// # 逻辑解析（How）
/// - 读取总是从第一个仍有剩余的分片开始，跨分片时逐片复制；
/// - [`read_contiguous`](Self::read_contiguous) 在所需字节落在单个分片内时直接借出切片，
///   否则复制到临时缓冲，再交给回调；
/// - [`mark`](Self::mark)/[`views_since`](Self::views_since) 基于游标快照生成共享存储的子视图。
///
/// # 契约说明（What）
/// - 链拥有其视图，`Drop` 时一并释放引用；
/// - 所有读取在数据不足时返回 [`BufferError::InsufficientData`]，且失败前不推进任何游标。
#[derive(Debug, Default)]
pub struct ViewChain {
    views: Vec<PooledView>,
}

impl ViewChain {
    /// 由分片序列构造。
    pub fn new(views: Vec<PooledView>) -> Self {
        Self { views }
    }

    /// 由单个视图构造。
    pub fn from_view(view: PooledView) -> Self {
        Self { views: vec![view] }
    }

    /// 全部分片的剩余字节之和。
    pub fn remaining(&self) -> usize {
        self.views.iter().map(PooledView::remaining).sum()
    }

    /// 是否至少还剩 `n` 个字节。
    pub fn has_remaining(&self, n: usize) -> bool {
        let mut total = 0usize;
        for view in &self.views {
            total += view.remaining();
            if total >= n {
                return true;
            }
        }
        n == 0
    }

    fn ensure(&self, requested: usize) -> Result<(), BufferError> {
        if self.has_remaining(requested) {
            return Ok(());
        }
        Err(BufferError::InsufficientData {
            requested,
            available: self.remaining(),
        })
    }

    /// 读取一个字节。
    pub fn get(&mut self) -> Result<u8, BufferError> {
        match self.views.iter_mut().find(|view| view.remaining() > 0) {
            Some(view) => view.get(),
            None => Err(BufferError::InsufficientData {
                requested: 1,
                available: 0,
            }),
        }
    }

    /// 查看下一个字节但不推进。
    pub fn peek(&self) -> Result<u8, BufferError> {
        match self.views.iter().find(|view| view.remaining() > 0) {
            Some(view) => view.peek(),
            None => Err(BufferError::InsufficientData {
                requested: 1,
                available: 0,
            }),
        }
    }

    /// 跨分片复制 `dst.len()` 个字节。
    pub fn copy_to_slice(&mut self, dst: &mut [u8]) -> Result<(), BufferError> {
        self.ensure(dst.len())?;
        let mut filled = 0;
        for view in &mut self.views {
            if filled == dst.len() {
                break;
            }
            let take = view.remaining().min(dst.len() - filled);
            if take == 0 {
                continue;
            }
            view.copy_to_slice(&mut dst[filled..filled + take])?;
            filled += take;
        }
        Ok(())
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], BufferError> {
        let mut out = [0u8; N];
        self.copy_to_slice(&mut out)?;
        Ok(out)
    }

    /// 读取大端 `u16`。
    pub fn get_u16(&mut self) -> Result<u16, BufferError> {
        self.read_array().map(u16::from_be_bytes)
    }

    /// 读取大端 `u32`。
    pub fn get_u32(&mut self) -> Result<u32, BufferError> {
        self.read_array().map(u32::from_be_bytes)
    }

    /// 读取大端有符号 32 位整数。
    pub fn get_int(&mut self) -> Result<i32, BufferError> {
        self.read_array().map(i32::from_be_bytes)
    }

    /// 读取大端 `u64`。
    pub fn get_u64(&mut self) -> Result<u64, BufferError> {
        self.read_array().map(u64::from_be_bytes)
    }

    /// 读取定长数组，宽度由调用方类型决定。
    pub fn get_array<const N: usize>(&mut self) -> Result<[u8; N], BufferError> {
        self.read_array()
    }

    /// 跳过 `n` 个字节。
    pub fn advance(&mut self, n: usize) -> Result<(), BufferError> {
        self.ensure(n)?;
        let mut left = n;
        for view in &mut self.views {
            if left == 0 {
                break;
            }
            let step = view.remaining().min(left);
            view.advance(step)?;
            left -= step;
        }
        Ok(())
    }

    /// 以连续切片的形式消费 `n` 个字节。
    ///
    /// # 契约说明（What）
    /// - 第一个非空分片足以容纳 `n` 字节时直接借出该分片内存（快路径）；
    /// - 否则将跨分片字节复制到临时缓冲后再调用 `f`；
    /// - 两条路径对 `f` 呈现完全相同的字节，且都会推进 `n` 字节。
    pub fn read_contiguous<R>(
        &mut self,
        n: usize,
        f: impl FnOnce(&[u8]) -> R,
    ) -> Result<R, BufferError> {
        self.ensure(n)?;
        if n == 0 {
            return Ok(f(&[]));
        }
        if let Some(view) = self.views.iter_mut().find(|view| view.remaining() > 0) {
            if view.remaining() >= n {
                let out = f(&view.remaining_slice()?[..n]);
                view.advance(n)?;
                return Ok(out);
            }
        }
        let mut scratch = vec![0u8; n];
        self.copy_to_slice(&mut scratch)?;
        Ok(f(&scratch))
    }

    /// 记录当前各分片游标。
    pub fn mark(&self) -> ChainMark {
        ChainMark {
            positions: self.views.iter().map(PooledView::position).collect(),
        }
    }

    /// 回退到快照位置。
    pub fn reset(&mut self, mark: &ChainMark) -> Result<(), BufferError> {
        for (view, &position) in self.views.iter_mut().zip(mark.positions.iter()) {
            view.set_position(position)?;
        }
        Ok(())
    }

    /// 自快照以来消费的字节数。
    pub fn consumed_since(&self, mark: &ChainMark) -> usize {
        self.views
            .iter()
            .zip(mark.positions.iter())
            .map(|(view, &from)| view.position().saturating_sub(from))
            .sum()
    }

    /// 为自快照以来消费的字节生成共享存储的子视图，按分片顺序排列。
    pub fn views_since(&self, mark: &ChainMark) -> Result<Vec<PooledView>, BufferError> {
        let mut out = Vec::new();
        for (view, &from) in self.views.iter().zip(mark.positions.iter()) {
            let to = view.position();
            if to > from {
                out.push(view.view_range(from, to)?);
            }
        }
        Ok(out)
    }

    /// 借出底层分片。
    pub fn views(&self) -> &[PooledView] {
        &self.views
    }

    /// 取回底层分片。
    pub fn into_views(self) -> Vec<PooledView> {
        self.views
    }

    /// 显式释放全部分片；遇到首个错误立即返回，其余分片随 `Drop` 释放。
    pub fn dispose(self) -> Result<(), BufferError> {
        for mut view in self.views {
            view.dispose()?;
        }
        Ok(())
    }
}
