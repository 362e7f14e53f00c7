//! ### English
//! Present thread body.
//!
//! ### 中文
//! present 线程主体。

use std::sync::Arc;
use std::thread;

use crossbeam_channel::{self as channel, RecvTimeoutError, TryRecvError};

use crate::engine::config::PresentConfig;
use crate::engine::error::GpuResult;
use crate::engine::surface::DisplaySurface;

use super::PresentPlugin;
use super::command::Request;
use super::state::{
    STATE_MAIN_THREAD_RENDEZVOUS, STATE_SHUTTING_DOWN, STATE_SWITCHING_PLUGIN, StateCell,
};

/// ### English
/// Whether the loop keeps running after a request.
///
/// ### 中文
/// 处理请求后循环是否继续。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

#[inline]
fn same_plugin(a: &Option<Arc<dyn PresentPlugin>>, b: &Option<Arc<dyn PresentPlugin>>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => {
            std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
        }
        _ => false,
    }
}

struct PresentLoop {
    surface: Arc<dyn DisplaySurface>,
    state: Arc<StateCell>,
    plugin: Option<Arc<dyn PresentPlugin>>,
}

impl PresentLoop {
    fn handle(&mut self, request: Request) -> Flow {
        match request {
            Request::SetPlugin { plugin, done } => {
                self.switch_plugin(plugin);
                let _ = done.send(());
                Flow::Continue
            }
            Request::MainThreadContext { released, finished } => {
                self.state.enter(STATE_MAIN_THREAD_RENDEZVOUS);
                self.surface.done_current();
                if released.send(()).is_ok() {
                    // A disconnected channel means the requester is gone; resume either way.
                    let _ = finished.recv();
                }
                log::debug!("present thread resumed after main-thread rendezvous");
                self.state.settle(self.plugin.is_some());
                Flow::Continue
            }
            Request::Shutdown { done } => {
                self.state.store(STATE_SHUTTING_DOWN);
                self.switch_plugin(None);
                let _ = done.send(());
                Flow::Exit
            }
        }
    }

    /// ### English
    /// Uncustomizes the bound plugin and customizes `next`, with the context current.
    ///
    /// ### 中文
    /// 在上下文为 current 时 uncustomize 已绑定插件并 customize `next`。
    fn switch_plugin(&mut self, next: Option<Arc<dyn PresentPlugin>>) {
        if same_plugin(&self.plugin, &next) {
            return;
        }
        self.state.enter(STATE_SWITCHING_PLUGIN);

        if let Err(err) = self.surface.make_current() {
            log::warn!("plugin switch: failed to make context current: {err}");
        }
        if let Some(old) = self.plugin.take() {
            old.uncustomize_context();
            log::info!("uncustomized display plugin {}", old.name());
        }
        if let Some(new) = next.as_ref() {
            match new.customize_context() {
                Ok(()) => log::info!("customized display plugin {}", new.name()),
                Err(err) => log::warn!("failed to customize display plugin {}: {err}", new.name()),
            }
        }
        self.surface.done_current();

        self.plugin = next;
        self.state.settle(self.plugin.is_some());
    }

    fn present(&self, plugin: &dyn PresentPlugin, idle_poll: std::time::Duration) {
        if let Err(err) = self.surface.make_current() {
            log::warn!("present: failed to make context current: {err}");
            thread::sleep(idle_poll);
            return;
        }
        if !self.surface.is_current() {
            log::warn!("present: context is not current after make_current");
            self.surface.done_current();
            thread::sleep(idle_poll);
            return;
        }
        if let Err(err) = plugin.present() {
            log::warn!("present failed for display plugin {}: {err}", plugin.name());
        }
        self.surface.done_current();
    }
}

/// ### English
/// Present thread entry point. Returns after `Shutdown`, when every handle is gone, or when the
/// context cannot be acquired at start.
///
/// #### Parameters
/// - `surface`: Surface (and context) to present to.
/// - `requests`: Request channel from the owning [`super::PresentThread`].
/// - `state`: Shared observable state.
/// - `config`: Idle poll interval.
/// - `init`: Start handshake, reporting whether the context could be made current.
///
/// ### 中文
/// present 线程入口。收到 `Shutdown`、所有句柄都已消失，或启动时无法获取上下文时返回。
///
/// #### 参数
/// - `surface`：呈现到的表面（及上下文）。
/// - `requests`：来自所属 [`super::PresentThread`] 的请求 channel。
/// - `state`：共享的可观察状态。
/// - `config`：空闲轮询间隔。
/// - `init`：启动握手，报告上下文能否成为 current。
pub(super) fn run_present_thread(
    surface: Arc<dyn DisplaySurface>,
    requests: channel::Receiver<Request>,
    state: Arc<StateCell>,
    config: PresentConfig,
    init: channel::Sender<GpuResult<()>>,
) {
    if let Err(err) = surface.make_current() {
        log::warn!("present thread could not acquire the context: {err}");
        let _ = init.send(Err(err));
        return;
    }
    surface.done_current();
    let _ = init.send(Ok(()));
    drop(init);
    log::info!("present thread started");

    let mut present_loop = PresentLoop {
        surface,
        state,
        plugin: None,
    };

    loop {
        // 1) Drain requests.
        loop {
            match requests.try_recv() {
                Ok(request) => {
                    if present_loop.handle(request) == Flow::Exit {
                        return;
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    present_loop.switch_plugin(None);
                    return;
                }
            }
        }

        // 2) Present, or wait for the next request while idle.
        match present_loop.plugin.clone() {
            Some(plugin) => present_loop.present(&*plugin, config.idle_poll),
            None => match requests.recv_timeout(config.idle_poll) {
                Ok(request) => {
                    if present_loop.handle(request) == Flow::Exit {
                        return;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return,
            },
        }
    }
}
