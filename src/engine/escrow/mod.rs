//! ### English
//! Texture escrow: latest-wins ownership hand-off from a producer thread to a consumer thread.
//!
//! The producer `submit`s; the consumer fetches without blocking. An item that is superseded before
//! it was ever fetched, or that stops being current, goes to the recycler exactly once.
//!
//! ### 中文
//! 纹理 escrow：从生产者线程到消费者线程、只保留最新值（latest-wins）的所有权交接。
//!
//! 生产者调用 `submit`；消费者非阻塞地获取。尚未被获取就被取代的条目，
//! 或不再是 current 的条目，会被恰好一次地交给回收器。

use std::mem;
use std::sync::{Mutex, MutexGuard, PoisonError};

mod fences;
#[cfg(test)]
mod tests;

pub use fences::{FenceSync, GpuFence};

use fences::{FenceWait, NoFences};

/// ### English
/// Recycler strategy injected at construction. Receives exclusive ownership of an item the escrow
/// no longer references; must be safe to call from the consumer thread.
///
/// ### 中文
/// 构造时注入的回收策略。接收 escrow 不再引用的条目的独占所有权；必须可在消费者线程上安全调用。
pub type Recycler<T> = Box<dyn Fn(T) + Send + Sync>;

/// ### English
/// One submitted item plus the producer fence guarding its GPU work (if any).
///
/// ### 中文
/// 一个已提交条目及保护其 GPU 工作的生产者 fence（若有）。
struct Submitted<T> {
    item: T,
    fence: Option<GpuFence>,
}

struct EscrowState<T> {
    /// ### English
    /// Latest submission not yet fetched.
    ///
    /// ### 中文
    /// 尚未被获取的最新提交。
    pending: Option<Submitted<T>>,
    /// ### English
    /// Item last handed to the consumer.
    ///
    /// ### 中文
    /// 最近一次交给消费者的条目。
    current: Option<T>,
    /// ### English
    /// Fences of superseded or consumed submissions, deleted by the consumer on its next fenced
    /// fetch (only the context owner may delete them).
    ///
    /// ### 中文
    /// 已被取代或已消费提交的 fence；由消费者在下一次带 fence 的获取中删除
    ///（只有上下文持有者可以删除）。
    retired_fences: Vec<GpuFence>,
}

/// ### English
/// Single-producer / single-consumer texture hand-off slot.
///
/// ### 中文
/// 单生产者 / 单消费者的纹理交接槽。
pub struct TextureEscrow<T> {
    state: Mutex<EscrowState<T>>,
    recycler: Recycler<T>,
}

impl<T> TextureEscrow<T>
where
    T: Clone + PartialEq,
{
    /// ### English
    /// Creates an empty escrow that hands released items to `recycler`.
    ///
    /// ### 中文
    /// 创建一个空 escrow，释放的条目交给 `recycler`。
    pub fn new(recycler: impl Fn(T) + Send + Sync + 'static) -> Self {
        Self {
            state: Mutex::new(EscrowState {
                pending: None,
                current: None,
                retired_fences: Vec::new(),
            }),
            recycler: Box::new(recycler),
        }
    }

    #[inline]
    fn lock(&self) -> MutexGuard<'_, EscrowState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// ### English
    /// Stores `item` as the new pending item (producer side).
    ///
    /// A previous pending item that was never fetched is recycled.
    ///
    /// ### 中文
    /// 将 `item` 存为新的待取条目（生产者侧）。
    ///
    /// 从未被获取过的上一个待取条目会被回收。
    pub fn submit(&self, item: T) {
        self.submit_inner(Submitted { item, fence: None });
    }

    /// ### English
    /// Like [`Self::submit`], with a producer fence that the consumer can poll or wait on.
    ///
    /// ### 中文
    /// 同 [`Self::submit`]，但附带消费者可轮询或等待的生产者 fence。
    pub fn submit_with_fence(&self, item: T, fence: GpuFence) {
        self.submit_inner(Submitted {
            item,
            fence: Some(fence),
        });
    }

    fn submit_inner(&self, submitted: Submitted<T>) {
        let superseded = {
            let mut state = self.lock();
            let previous = state.pending.replace(submitted);
            match previous {
                Some(previous) => {
                    if let Some(fence) = previous.fence {
                        state.retired_fences.push(fence);
                    }
                    let still_referenced = state
                        .pending
                        .as_ref()
                        .is_some_and(|pending| pending.item == previous.item)
                        || state.current.as_ref() == Some(&previous.item);
                    (!still_referenced).then_some(previous.item)
                }
                None => None,
            }
        };

        if let Some(item) = superseded {
            log::trace!("escrow: recycling superseded submission");
            (self.recycler)(item);
        }
    }

    /// ### English
    /// Non-blocking fetch ignoring producer fences.
    ///
    /// Returns `true` and writes the new item to `out` if a submission arrived since the last
    /// successful fetch; otherwise returns `false` and leaves `out` unchanged.
    ///
    /// ### 中文
    /// 忽略生产者 fence 的非阻塞获取。
    ///
    /// 若自上次成功获取以来有新提交，则写入 `out` 并返回 `true`；否则返回 `false` 且不修改 `out`。
    pub fn fetch_and_release(&self, out: &mut Option<T>) -> bool {
        self.fetch(out, &mut NoFences, FenceWait::Skip)
    }

    /// ### English
    /// Non-blocking fetch that exchanges only once the pending item's producer fence is signaled.
    ///
    /// Used when producer and consumer run on independent GPU command streams.
    ///
    /// ### 中文
    /// 仅在待取条目的生产者 fence 已 signal 时才交换的非阻塞获取。
    ///
    /// 用于生产者与消费者位于独立 GPU 命令流的情况。
    pub fn fetch_signaled_and_release<F>(&self, out: &mut Option<T>, fences: &mut F) -> bool
    where
        F: FenceSync + ?Sized,
    {
        self.fetch(out, fences, FenceWait::Poll)
    }

    /// ### English
    /// Fetch that inserts a GPU-side wait on the producer fence instead of polling it.
    ///
    /// Used when producer and consumer share one command stream (inline presentation).
    ///
    /// ### 中文
    /// 对生产者 fence 插入 GPU 侧等待而非轮询的获取。
    ///
    /// 用于生产者与消费者共享同一命令流的情况（内联呈现）。
    pub fn fetch_and_release_with_gpu_wait<F>(&self, out: &mut Option<T>, fences: &mut F) -> bool
    where
        F: FenceSync + ?Sized,
    {
        self.fetch(out, fences, FenceWait::GpuWait)
    }

    fn fetch<F>(&self, out: &mut Option<T>, fences: &mut F, wait: FenceWait) -> bool
    where
        F: FenceSync + ?Sized,
    {
        let (released, expired_fences, fetched) = {
            let mut state = self.lock();
            let expired_fences = if wait == FenceWait::Skip {
                Vec::new()
            } else {
                mem::take(&mut state.retired_fences)
            };

            let ready = match state.pending.as_ref().map(|pending| pending.fence) {
                None => false,
                Some(None) => true,
                Some(Some(fence)) => match wait {
                    FenceWait::Skip => true,
                    FenceWait::Poll => fences.poll_fence(fence),
                    FenceWait::GpuWait => {
                        fences.wait_fence(fence);
                        true
                    }
                },
            };

            match ready.then(|| state.pending.take()).flatten() {
                Some(Submitted { item, fence }) => {
                    let mut expired_fences = expired_fences;
                    if let Some(fence) = fence {
                        if wait == FenceWait::Skip {
                            state.retired_fences.push(fence);
                        } else {
                            expired_fences.push(fence);
                        }
                    }
                    let previous = state.current.replace(item.clone());
                    *out = Some(item.clone());
                    let released = previous.filter(|previous| *previous != item);
                    (released, expired_fences, true)
                }
                None => (None, expired_fences, false),
            }
        };

        for fence in expired_fences {
            fences.delete_fence(fence);
        }
        if let Some(item) = released {
            log::trace!("escrow: recycling released current item");
            (self.recycler)(item);
        }
        fetched
    }

    /// ### English
    /// Deletes fences retired by superseded submissions or unfenced fetches.
    ///
    /// ### 中文
    /// 删除因提交被取代或无 fence 获取而退役的 fence。
    pub fn delete_retired_fences<F>(&self, fences: &mut F)
    where
        F: FenceSync + ?Sized,
    {
        let retired = mem::take(&mut self.lock().retired_fences);
        for fence in retired {
            fences.delete_fence(fence);
        }
    }

    /// ### English
    /// Recycles both the pending and the current item, leaving the escrow empty.
    ///
    /// Fences of drained submissions are retired (see [`Self::delete_retired_fences`]).
    ///
    /// ### 中文
    /// 回收待取条目与 current 条目，使 escrow 变空。
    ///
    /// 被清空提交的 fence 会进入退役列表（见 [`Self::delete_retired_fences`]）。
    pub fn drain(&self) {
        let (pending, current) = {
            let mut state = self.lock();
            let pending = state.pending.take().map(|Submitted { item, fence }| {
                if let Some(fence) = fence {
                    state.retired_fences.push(fence);
                }
                item
            });
            (pending, state.current.take())
        };

        match (pending, current) {
            (Some(pending), Some(current)) if pending == current => (self.recycler)(pending),
            (pending, current) => {
                for item in pending.into_iter().chain(current) {
                    (self.recycler)(item);
                }
            }
        }
    }

    /// ### English
    /// Returns `true` if a submission is waiting to be fetched.
    ///
    /// ### 中文
    /// 若有提交等待被获取则返回 `true`。
    pub fn has_pending(&self) -> bool {
        self.lock().pending.is_some()
    }

    /// ### English
    /// Returns a copy of the item last handed to the consumer.
    ///
    /// ### 中文
    /// 返回最近一次交给消费者的条目的副本。
    pub fn current(&self) -> Option<T> {
        self.lock().current.clone()
    }
}
