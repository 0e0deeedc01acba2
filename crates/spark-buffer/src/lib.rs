//! `spark-buffer` 提供引用计数的池化零拷贝缓冲视图。
//!
//! # 模块定位（Why）
//! - AMQP 解码与跨协议转换都以“字节区间视图”为基本输入单位，
//!   需要在不复制的前提下切分、复制游标、保留原始编码。
//! - 解码结束后存储必须可靠地回到池中，且重复释放、释放后读取都要显式失败。
//!
//! # 设计概要（How）
//! - [`BufferPool`] 以自由链表复用 `BytesMut`，租借得到 [`PooledBufMut`]；
//! - 冻结后生成 [`PooledView`]，兄弟视图通过 `Arc` 共享底层块，引用归零时自动回收；
//! - [`ViewChain`] 把多段不连续视图串成一条逻辑字节流，供解码器跨分片读取。
//!
//! # 命名约定（Consistency）
//! - `get`/`get_int`/`has_remaining` 等读取接口沿用游标式缓冲的常见命名。

mod chain;
mod config;
mod error;
mod pool;
mod pooled_buffer;
mod view;

pub use crate::{
    chain::{ChainMark, ViewChain},
    config::PoolConfig,
    error::BufferError,
    pool::{BufferPool, PoolStats},
    pooled_buffer::{BufferRecycler, PooledBufMut, ReclaimedBuffer},
    view::PooledView,
};
