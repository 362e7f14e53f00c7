//! ### English
//! Present thread lifecycle state, stored as an `AtomicU8` so any thread can observe it.
//!
//! ### 中文
//! present 线程的生命周期状态，以 `AtomicU8` 存储，任何线程都可观察。

use std::sync::atomic::{AtomicU8, Ordering};

pub(super) const STATE_IDLE: u8 = 0;
pub(super) const STATE_ACTIVE: u8 = 1;
pub(super) const STATE_SWITCHING_PLUGIN: u8 = 2;
pub(super) const STATE_MAIN_THREAD_RENDEZVOUS: u8 = 3;
pub(super) const STATE_SHUTTING_DOWN: u8 = 4;

/// ### English
/// Observable present thread state.
///
/// ### 中文
/// 可观察的 present 线程状态。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PresentState {
    /// ### English
    /// No plugin bound; the loop waits on its request channel.
    ///
    /// ### 中文
    /// 未绑定插件；循环在请求 channel 上等待。
    Idle,
    /// ### English
    /// A plugin is bound and presented every iteration.
    ///
    /// ### 中文
    /// 已绑定插件，每次迭代都会呈现。
    Active,
    SwitchingPlugin,
    /// ### English
    /// The context is lent to another thread.
    ///
    /// ### 中文
    /// 上下文已借给其它线程。
    MainThreadRendezvous,
    ShuttingDown,
}

impl PresentState {
    #[inline]
    fn from_raw(raw: u8) -> Self {
        match raw {
            STATE_IDLE => Self::Idle,
            STATE_ACTIVE => Self::Active,
            STATE_SWITCHING_PLUGIN => Self::SwitchingPlugin,
            STATE_MAIN_THREAD_RENDEZVOUS => Self::MainThreadRendezvous,
            _ => Self::ShuttingDown,
        }
    }
}

/// ### English
/// Shared state cell written by the present thread (and by `shutdown`).
///
/// ### 中文
/// 由 present 线程（以及 `shutdown`）写入的共享状态单元。
#[derive(Debug)]
pub(super) struct StateCell(AtomicU8);

impl StateCell {
    pub(super) fn new() -> Self {
        Self(AtomicU8::new(STATE_IDLE))
    }

    #[inline]
    pub(super) fn load(&self) -> PresentState {
        PresentState::from_raw(self.0.load(Ordering::Acquire))
    }

    #[inline]
    pub(super) fn store(&self, state: u8) {
        self.0.store(state, Ordering::Release);
    }

    /// ### English
    /// `Active` when a plugin is bound, `Idle` otherwise. Never leaves `ShuttingDown`.
    ///
    /// ### 中文
    /// 已绑定插件时为 `Active`，否则为 `Idle`。不会离开 `ShuttingDown`。
    pub(super) fn settle(&self, has_plugin: bool) {
        let next = if has_plugin { STATE_ACTIVE } else { STATE_IDLE };
        let mut current = self.0.load(Ordering::Acquire);
        while current != STATE_SHUTTING_DOWN {
            match self
                .0
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }

    /// ### English
    /// Enters a transient state unless shutting down.
    ///
    /// ### 中文
    /// 进入一个暂时状态（除非正在关闭）。
    pub(super) fn enter(&self, state: u8) {
        let mut current = self.0.load(Ordering::Acquire);
        while current != STATE_SHUTTING_DOWN {
            match self
                .0
                .compare_exchange_weak(current, state, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }
}
