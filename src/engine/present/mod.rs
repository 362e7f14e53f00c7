//! ### English
//! Present thread: a dedicated thread that owns the presentation context and drives the bound
//! display plugin every iteration.
//!
//! ### 中文
//! present 线程：持有呈现上下文、每次迭代驱动已绑定显示插件的独立线程。

use crate::engine::error::GpuResult;

mod command;
mod present_thread;
mod state;
mod thread_loop;

pub use present_thread::PresentThread;
pub use state::PresentState;

/// ### English
/// Plugin driven by the present thread. Every method runs on the present thread with the
/// presentation context current.
///
/// ### 中文
/// 由 present 线程驱动的插件。所有方法都在 present 线程上、呈现上下文为 current 时执行。
pub trait PresentPlugin: Send + Sync {
    fn name(&self) -> &str;

    /// ### English
    /// Creates the plugin's GPU resources after it was bound.
    ///
    /// ### 中文
    /// 插件绑定后创建其 GPU 资源。
    fn customize_context(&self) -> GpuResult<()>;

    /// ### English
    /// Releases the plugin's GPU resources before it is unbound.
    ///
    /// ### 中文
    /// 插件解绑前释放其 GPU 资源。
    fn uncustomize_context(&self);

    /// ### English
    /// Presents one frame.
    ///
    /// ### 中文
    /// 呈现一帧。
    fn present(&self) -> GpuResult<()>;
}
