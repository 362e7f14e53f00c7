//! ### English
//! Producer fences attached to escrowed items.
//!
//! ### 中文
//! 附加在 escrow 条目上的生产者 fence。

/// ### English
/// Opaque GPU fence handle (`GLsync` cast to `u64`).
///
/// ### 中文
/// 不透明的 GPU fence 句柄（`GLsync` 转为 `u64`）。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GpuFence(pub u64);

/// ### English
/// Fence operations the consumer needs while fetching from an escrow.
///
/// All methods run on the thread that currently owns the GPU context.
///
/// ### 中文
/// 消费者从 escrow 获取时所需的 fence 操作。
///
/// 所有方法都在当前持有 GPU 上下文的线程上执行。
pub trait FenceSync {
    /// ### English
    /// Non-blocking poll: returns `true` once the work preceding `fence` has completed.
    ///
    /// ### 中文
    /// 非阻塞轮询：`fence` 之前的工作完成后返回 `true`。
    fn poll_fence(&mut self, fence: GpuFence) -> bool;

    /// ### English
    /// Inserts a GPU-side wait on `fence` into the command stream (does not block the CPU).
    ///
    /// ### 中文
    /// 在命令流中插入对 `fence` 的 GPU 侧等待（不阻塞 CPU）。
    fn wait_fence(&mut self, fence: GpuFence);

    /// ### English
    /// Deletes `fence`.
    ///
    /// ### 中文
    /// 删除 `fence`。
    fn delete_fence(&mut self, fence: GpuFence);
}

/// ### English
/// How a fetch treats the producer fence of the pending item.
///
/// ### 中文
/// 获取时如何处理待取条目的生产者 fence。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum FenceWait {
    /// ### English
    /// Ignore the fence (retired for later deletion).
    ///
    /// ### 中文
    /// 忽略 fence（留待之后删除）。
    Skip,
    /// ### English
    /// Exchange only once the fence reports signaled.
    ///
    /// ### 中文
    /// 仅在 fence 已 signal 时交换。
    Poll,
    /// ### English
    /// Exchange immediately and insert a GPU-side wait.
    ///
    /// ### 中文
    /// 立即交换并插入 GPU 侧等待。
    GpuWait,
}

/// ### English
/// `FenceSync` that treats every fence as signaled and does nothing; used by unfenced fetches.
///
/// ### 中文
/// 将所有 fence 视为已 signal 且不做任何事的 `FenceSync`；供无 fence 的获取使用。
pub(super) struct NoFences;

impl FenceSync for NoFences {
    fn poll_fence(&mut self, _fence: GpuFence) -> bool {
        true
    }

    fn wait_fence(&mut self, _fence: GpuFence) {}

    fn delete_fence(&mut self, _fence: GpuFence) {}
}
