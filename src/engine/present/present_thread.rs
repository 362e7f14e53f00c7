//! ### English
//! Present thread handle: spawning, plugin switching, context rendezvous and shutdown.
//!
//! ### 中文
//! present 线程句柄：创建、插件切换、上下文会合与关闭。

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;

use crossbeam_channel as channel;

use crate::engine::config::PresentConfig;
use crate::engine::error::{GpuResult, PresentError};
use crate::engine::surface::DisplaySurface;

use super::PresentPlugin;
use super::command::Request;
use super::state::{PresentState, STATE_SHUTTING_DOWN, StateCell};
use super::thread_loop;

/// ### English
/// Handle to a running present thread.
///
/// Shared (`Arc`) between the application and the plugins bound to it; every method takes `&self`.
///
/// ### 中文
/// 运行中的 present 线程句柄。
///
/// 在应用与绑定到它的插件之间共享（`Arc`）；所有方法都接收 `&self`。
pub struct PresentThread {
    /// ### English
    /// Request channel into the present thread (unbounded, FIFO).
    ///
    /// ### 中文
    /// 发往 present 线程的请求 channel（无界、FIFO）。
    requests: channel::Sender<Request>,
    state: Arc<StateCell>,
    /// ### English
    /// Surface whose context is lent to rendezvous callers.
    ///
    /// ### 中文
    /// 在会合时借给调用方的上下文所属表面。
    surface: Arc<dyn DisplaySurface>,
    /// ### English
    /// Join handle; `None` once shut down.
    ///
    /// ### 中文
    /// join handle；关闭后为 `None`。
    thread: Mutex<Option<thread::JoinHandle<()>>>,
    /// ### English
    /// Serializes rendezvous callers: a second caller waits until the first one resolved.
    ///
    /// ### 中文
    /// 串行化会合调用方：第二个调用方等待第一个完成。
    rendezvous: Mutex<()>,
}

impl PresentThread {
    /// ### English
    /// Spawns the present thread and waits until it acquired the context once.
    ///
    /// #### Parameters
    /// - `surface`: Surface (and context) the thread presents to.
    /// - `config`: Thread name, idle poll interval and start timeout.
    ///
    /// ### 中文
    /// 创建 present 线程，并等待其成功获取一次上下文。
    ///
    /// #### 参数
    /// - `surface`：线程呈现到的表面（及上下文）。
    /// - `config`：线程名、空闲轮询间隔与启动超时。
    pub fn start(
        surface: Arc<dyn DisplaySurface>,
        config: PresentConfig,
    ) -> Result<Self, PresentError> {
        let (requests, requests_rx) = channel::unbounded();
        let state = Arc::new(StateCell::new());
        let (init, init_rx) = channel::bounded::<GpuResult<()>>(1);

        let surface_for_thread = surface.clone();
        let state_for_thread = state.clone();
        let start_timeout = config.start_timeout;
        let thread = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || {
                thread_loop::run_present_thread(
                    surface_for_thread,
                    requests_rx,
                    state_for_thread,
                    config,
                    init,
                );
            })?;

        match init_rx.recv_timeout(start_timeout) {
            Ok(Ok(())) => Ok(Self {
                requests,
                state,
                surface,
                thread: Mutex::new(Some(thread)),
                rendezvous: Mutex::new(()),
            }),
            Ok(Err(err)) => {
                let _ = thread.join();
                Err(PresentError::Init(err))
            }
            Err(channel::RecvTimeoutError::Disconnected) => {
                // The thread exited without reporting, i.e. it panicked during start.
                let _ = thread.join();
                Err(PresentError::ThreadGone)
            }
            Err(channel::RecvTimeoutError::Timeout) => {
                // The thread may still be stuck acquiring the context; it exits on its own once
                // it sees the shutdown request, so it is detached instead of joined.
                let (done, _) = channel::bounded(1);
                let _ = requests.send(Request::Shutdown { done });
                log::warn!("present thread did not start within {start_timeout:?}");
                Err(PresentError::StartTimeout(start_timeout))
            }
        }
    }

    #[inline]
    pub fn state(&self) -> PresentState {
        self.state.load()
    }

    #[inline]
    fn lock_thread(&self) -> MutexGuard<'_, Option<thread::JoinHandle<()>>> {
        self.thread.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_running(&self) -> Result<(), PresentError> {
        if self.state.load() == PresentState::ShuttingDown {
            Err(PresentError::ShutDown)
        } else {
            Ok(())
        }
    }

    /// ### English
    /// Binds `plugin` (or unbinds with `None`).
    ///
    /// Blocks until the present thread uncustomized the previous plugin and customized the new one.
    /// Binding the plugin that is already bound is a no-op. Must not be called from the present
    /// thread itself.
    ///
    /// ### 中文
    /// 绑定 `plugin`（`None` 表示解绑）。
    ///
    /// 阻塞直到 present 线程完成旧插件的 uncustomize 与新插件的 customize。
    /// 绑定已绑定的插件是空操作。不得在 present 线程自身上调用。
    pub fn set_display_plugin(
        &self,
        plugin: Option<Arc<dyn PresentPlugin>>,
    ) -> Result<(), PresentError> {
        self.ensure_running()?;
        self.switch_plugin(plugin)
    }

    fn switch_plugin(&self, plugin: Option<Arc<dyn PresentPlugin>>) -> Result<(), PresentError> {
        let (done, done_rx) = channel::bounded(1);
        self.requests
            .send(Request::SetPlugin { plugin, done })
            .map_err(|_| PresentError::ThreadGone)?;
        done_rx.recv().map_err(|_| PresentError::ThreadGone)
    }

    /// ### English
    /// Runs `f` on the calling thread with the presentation context current.
    ///
    /// The present thread releases the context and parks until `f` returned and the context was
    /// released again. Only one rendezvous is in flight at a time.
    ///
    /// ### 中文
    /// 在调用线程上、呈现上下文为 current 时执行 `f`。
    ///
    /// present 线程释放上下文并 park，直到 `f` 返回且上下文再次被释放。同一时刻只有一个会合在进行。
    pub fn with_main_thread_context<R>(&self, f: impl FnOnce() -> R) -> Result<R, PresentError> {
        let _serial = self
            .rendezvous
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        self.ensure_running()?;

        let (released, released_rx) = channel::bounded(1);
        let (finished_tx, finished) = channel::bounded(1);
        self.requests
            .send(Request::MainThreadContext { released, finished })
            .map_err(|_| PresentError::ThreadGone)?;
        released_rx.recv().map_err(|_| PresentError::ThreadGone)?;
        log::debug!("present thread parked for main-thread rendezvous");

        let resume = ResumeOnDrop {
            surface: &*self.surface,
            finished: finished_tx,
        };
        self.surface.make_current()?;
        let result = f();
        drop(resume);
        Ok(result)
    }

    /// ### English
    /// Unbinds the current plugin, stops the thread and joins it. Idempotent.
    ///
    /// ### 中文
    /// 解绑当前插件、停止线程并 join。幂等。
    pub fn shutdown(&self) {
        let Some(thread) = self.lock_thread().take() else {
            return;
        };

        if thread.thread().id() == thread::current().id() {
            // Last handle dropped by a plugin released on the present thread: it cannot wait for
            // itself, so it only asks the loop to exit.
            self.state.store(STATE_SHUTTING_DOWN);
            let (done, _) = channel::bounded(1);
            let _ = self.requests.send(Request::Shutdown { done });
            return;
        }

        if let Err(err) = self.switch_plugin(None) {
            log::warn!("failed to unbind display plugin during shutdown: {err}");
        }
        self.state.store(STATE_SHUTTING_DOWN);

        let (done, done_rx) = channel::bounded(1);
        if self.requests.send(Request::Shutdown { done }).is_ok() {
            let _ = done_rx.recv();
        }
        if thread.join().is_err() {
            log::error!("present thread panicked");
        }
        log::info!("present thread stopped");
    }
}

impl Drop for PresentThread {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// ### English
/// Releases the borrowed context and resumes the present thread, also on unwind.
///
/// ### 中文
/// 释放借用的上下文并恢复 present 线程；展开栈时同样生效。
struct ResumeOnDrop<'a> {
    surface: &'a dyn DisplaySurface,
    finished: channel::Sender<()>,
}

impl Drop for ResumeOnDrop<'_> {
    fn drop(&mut self) {
        self.surface.done_current();
        let _ = self.finished.send(());
    }
}
