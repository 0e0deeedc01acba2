use std::{fmt, sync::Arc};

use crate::{error::BufferError, pooled_buffer::Chunk};

/// `PooledView` 是共享池化存储上的 `[start, limit)` 只读窗口，携带独立游标。
///
/// # 设计背景（Why）
/// - 解码器需要在不复制字节的前提下对同一帧做多次切分：节区保留原始编码、
///   子解码器读取嵌套值、转换器按偏移截取内容；
/// - 手工引用计数容易出现重复释放或释放后读取，此处把两者都变成显式错误。
///
/// # 逻辑解析（How）
/// - `chunk: Option<Arc<Chunk>>`：`Some` 表示仍持有一份引用；`dispose` 将其置为 `None`；
/// - `duplicate`/`view`/`view_range` 克隆 `Arc`，得到共享存储、游标独立的兄弟视图；
/// - 最后一份引用消失时 `Chunk::drop` 把内存交还池，所有路径都基于原子计数，跨线程安全。
///
/// # 契约说明（What）
/// - 读操作只推进本视图游标，绝不影响兄弟视图；
/// - 越界读取返回 [`BufferError::InsufficientData`]；
/// - 释放后的任何访问返回 [`BufferError::Disposed`]，二次释放返回 [`BufferError::AlreadyDisposed`]；
/// - 未显式释放的视图在 `Drop` 时自动归还引用，保证每个引用恰好释放一次。
pub struct PooledView {
    chunk: Option<Arc<Chunk>>,
    start: usize,
    len: usize,
    position: usize,
}

impl PooledView {
    pub(crate) fn from_chunk(chunk: Arc<Chunk>) -> Self {
        let len = chunk.bytes().len();
        Self {
            chunk: Some(chunk),
            start: 0,
            len,
            position: 0,
        }
    }

    fn chunk(&self) -> Result<&Arc<Chunk>, BufferError> {
        self.chunk.as_ref().ok_or(BufferError::Disposed)
    }

    fn window(&self) -> Result<&[u8], BufferError> {
        let chunk = self.chunk()?;
        Ok(&chunk.bytes()[self.start..self.start + self.len])
    }

    fn ensure(&self, requested: usize) -> Result<(), BufferError> {
        self.chunk()?;
        let available = self.len - self.position;
        if available < requested {
            return Err(BufferError::InsufficientData {
                requested,
                available,
            });
        }
        Ok(())
    }

    /// 窗口长度（即 limit）。
    pub fn len(&self) -> usize {
        self.len
    }

    /// 窗口是否为空。
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// 当前游标，相对窗口起点。
    pub fn position(&self) -> usize {
        self.position
    }

    /// 重置游标；允许等于窗口长度（表示读尽）。
    pub fn set_position(&mut self, position: usize) -> Result<(), BufferError> {
        self.chunk()?;
        if position > self.len {
            return Err(BufferError::OutOfBounds {
                offset: position,
                length: 0,
                limit: self.len,
            });
        }
        self.position = position;
        Ok(())
    }

    /// 游标之后的剩余字节；已释放视图视为 0。
    pub fn remaining(&self) -> usize {
        if self.chunk.is_none() {
            return 0;
        }
        self.len - self.position
    }

    /// 是否至少还剩 `n` 个字节可读。
    pub fn has_remaining(&self, n: usize) -> bool {
        self.remaining() >= n
    }

    /// 读取一个字节并推进游标。
    pub fn get(&mut self) -> Result<u8, BufferError> {
        self.ensure(1)?;
        let byte = self.window()?[self.position];
        self.position += 1;
        Ok(byte)
    }

    /// 查看下一个字节但不推进游标。
    pub fn peek(&self) -> Result<u8, BufferError> {
        self.ensure(1)?;
        Ok(self.window()?[self.position])
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], BufferError> {
        self.ensure(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(&self.window()?[self.position..self.position + N]);
        self.position += N;
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

    /// 将 `dst.len()` 个字节复制到目标切片。
    pub fn copy_to_slice(&mut self, dst: &mut [u8]) -> Result<(), BufferError> {
        self.ensure(dst.len())?;
        dst.copy_from_slice(&self.window()?[self.position..self.position + dst.len()]);
        self.position += dst.len();
        Ok(())
    }

    /// 跳过 `n` 个字节。
    pub fn advance(&mut self, n: usize) -> Result<(), BufferError> {
        self.ensure(n)?;
        self.position += n;
        Ok(())
    }

    /// 借出游标之后的全部字节，不推进游标。
    pub fn remaining_slice(&self) -> Result<&[u8], BufferError> {
        Ok(&self.window()?[self.position..])
    }

    /// 复制游标之后的全部字节。
    pub fn copy_remaining(&self) -> Result<Vec<u8>, BufferError> {
        self.remaining_slice().map(<[u8]>::to_vec)
    }

    /// 创建共享存储的兄弟视图，窗口与游标与当前一致，之后各自独立。
    pub fn duplicate(&self) -> Result<PooledView, BufferError> {
        let chunk = Arc::clone(self.chunk()?);
        Ok(Self {
            chunk: Some(chunk),
            start: self.start,
            len: self.len,
            position: self.position,
        })
    }

    /// 以当前游标为基准截取 `[offset, offset + length)` 子视图，新视图游标归零。
    pub fn view(&self, offset: usize, length: usize) -> Result<PooledView, BufferError> {
        self.chunk()?;
        let from = self.position.checked_add(offset);
        let to = from.and_then(|from| from.checked_add(length));
        match (from, to) {
            (Some(from), Some(to)) if to <= self.len => self.view_range(from, to),
            _ => Err(BufferError::OutOfBounds {
                offset,
                length,
                limit: self.remaining(),
            }),
        }
    }

    /// 以窗口起点为基准截取 `[from, to)` 子视图，与游标无关。
    pub fn view_range(&self, from: usize, to: usize) -> Result<PooledView, BufferError> {
        let chunk = self.chunk()?;
        if from > to || to > self.len {
            return Err(BufferError::OutOfBounds {
                offset: from,
                length: to.saturating_sub(from),
                limit: self.len,
            });
        }
        Ok(Self {
            chunk: Some(Arc::clone(chunk)),
            start: self.start + from,
            len: to - from,
            position: 0,
        })
    }

    /// 释放本视图持有的引用。
    pub fn dispose(&mut self) -> Result<(), BufferError> {
        match self.chunk.take() {
            Some(_) => Ok(()),
            None => Err(BufferError::AlreadyDisposed),
        }
    }

    /// 视图是否已释放。
    pub fn is_disposed(&self) -> bool {
        self.chunk.is_none()
    }

    /// 底层存储当前的引用计数；已释放视图返回 0。
    pub fn ref_count(&self) -> usize {
        self.chunk.as_ref().map_or(0, Arc::strong_count)
    }
}

impl fmt::Debug for PooledView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledView")
            .field("start", &self.start)
            .field("len", &self.len)
            .field("position", &self.position)
            .field("disposed", &self.chunk.is_none())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::BufferPool;

    #[test]
    fn view_is_relative_to_cursor() {
        let pool = BufferPool::new();
        let mut view = pool.wrap(&[1, 2, 3, 4, 5, 6]).expect("分配视图失败");
        view.advance(2).expect("跳过前缀");
        let mut child = view.view(1, 2).expect("截取子视图");
        assert_eq!(child.len(), 2);
        assert_eq!(child.get().expect("读取首字节"), 4);
        assert_eq!(child.get().expect("读取次字节"), 5);
        assert!(child.get().is_err());
        assert_eq!(view.position(), 2);
    }

    #[test]
    fn view_outside_window_is_rejected() {
        let pool = BufferPool::new();
        let view = pool.wrap(&[0; 4]).expect("分配视图失败");
        assert!(view.view(3, 2).is_err());
        assert!(view.view_range(3, 2).is_err());
        assert!(view.view(usize::MAX, 1).is_err());
    }

    #[test]
    fn big_endian_reads() {
        let pool = BufferPool::new();
        let mut view = pool
            .wrap(&[0xff, 0xff, 0xff, 0xfe, 0x01, 0x02])
            .expect("分配视图失败");
        assert_eq!(view.get_int().expect("读取 i32"), -2);
        assert_eq!(view.get_u16().expect("读取 u16"), 0x0102);
        assert!(!view.has_remaining(1));
    }
}
