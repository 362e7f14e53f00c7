//! ### English
//! Request protocol between application threads and the present thread.
//!
//! Every request carries its own completion token, so callers block on exactly their own request.
//!
//! ### 中文
//! 应用线程与 present 线程之间的请求协议。
//!
//! 每个请求都携带自己的完成令牌，调用方只会阻塞在自己的请求上。

use std::sync::Arc;

use crossbeam_channel as channel;

use super::PresentPlugin;

pub(super) enum Request {
    /// ### English
    /// Replaces the bound plugin (`None` unbinds).
    ///
    /// ### 中文
    /// 替换已绑定的插件（`None` 表示解绑）。
    SetPlugin {
        plugin: Option<Arc<dyn PresentPlugin>>,
        /// ### English
        /// Signaled after the old plugin was uncustomized and the new one customized.
        ///
        /// ### 中文
        /// 在旧插件 uncustomize、新插件 customize 完成之后发出信号。
        done: channel::Sender<()>,
    },
    /// ### English
    /// Lends the context to the requesting thread.
    ///
    /// ### 中文
    /// 将上下文借给请求线程。
    MainThreadContext {
        /// ### English
        /// Signaled by the present thread once it released the context.
        ///
        /// ### 中文
        /// present 线程释放上下文后发出信号。
        released: channel::Sender<()>,
        /// ### English
        /// Signaled (or dropped) by the requester once it released the context again.
        ///
        /// ### 中文
        /// 请求方再次释放上下文后发出信号（或被 drop）。
        finished: channel::Receiver<()>,
    },
    /// ### English
    /// Stops the loop; acknowledged right before the thread exits.
    ///
    /// ### 中文
    /// 停止循环；在线程退出前确认。
    Shutdown { done: channel::Sender<()> },
}
