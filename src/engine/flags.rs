//! ### English
//! Bitflags controlling optional display plugin behaviors.
//!
//! Hosts that configure plugins from a single integer (command line, settings file) pass these as
//! a `u32` bitmask to [`DisplayPluginConfig::from_flags`](crate::engine::config::DisplayPluginConfig::from_flags).
//!
//! ### 中文
//! 控制显示插件可选行为的位标志（bitflags）。
//!
//! 以单个整数配置插件的宿主（命令行、配置文件）可将其作为 `u32` 位掩码传给
//! [`DisplayPluginConfig::from_flags`](crate::engine::config::DisplayPluginConfig::from_flags)。

/// ### English
/// Split-viewport stereo: overlay and cursor are composited once per eye.
///
/// ### 中文
/// 分屏立体模式：overlay 与光标按每只眼各合成一次。
pub const DISPLAY_PLUGIN_FLAG_STEREO: u32 = 1 << 0;

/// ### English
/// Do not enable vsync in `customize_context` even when the surface supports it.
///
/// ### 中文
/// 即使表面支持，也不在 `customize_context` 中启用 vsync。
pub const DISPLAY_PLUGIN_FLAG_DISABLE_VSYNC: u32 = 1 << 1;

/// ### English
/// Unsafe mode: ignore producer fences when fetching scene/overlay textures (lower overhead).
///
/// In this mode the host must ensure submitted textures are fully rendered before submission
/// (e.g. by using other synchronization).
///
/// ### 中文
/// 不安全模式：获取 scene/overlay 纹理时忽略生产者 fence（开销更低）。
///
/// 该模式下宿主需保证提交前纹理已完成渲染（例如使用其它同步机制）。
pub const DISPLAY_PLUGIN_FLAG_UNSAFE_NO_PRODUCER_FENCE: u32 = 1 << 2;

/// ### English
/// Force inline (non-threaded) presentation regardless of the build default.
///
/// ### 中文
/// 强制内联（非线程化）呈现，忽略构建默认值。
pub const DISPLAY_PLUGIN_FLAG_INLINE_PRESENT: u32 = 1 << 3;
