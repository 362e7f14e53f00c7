/// ### English
/// Presentation core modules (escrow hand-off, present thread, display plugin, GPU boundary).
///
/// ### 中文
/// 呈现核心模块（escrow 交接、present 线程、显示插件、GPU 边界）。
pub mod compositor;
pub mod config;
pub mod cursor;
pub mod error;
pub mod escrow;
pub mod flags;
pub mod frame;
pub mod gpu;
pub mod plugin;
pub mod present;
pub mod surface;
pub mod timing;
