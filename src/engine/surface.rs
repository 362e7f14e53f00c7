//! ### English
//! Display surface boundary: the window/drawable the presentation context renders into.
//!
//! ### 中文
//! 显示表面边界：呈现上下文绘制到的窗口/可绘制对象。

use dpi::{LogicalSize, PhysicalSize};

use crate::engine::error::GpuResult;

/// ### English
/// Window surface plus the GPU context bound to it.
///
/// Context ownership is per thread: `make_current` binds the context to the calling thread,
/// `done_current` releases it. The present thread and the application thread hand it back and
/// forth, so implementations must be shareable across threads.
///
/// ### 中文
/// 窗口表面及绑定在其上的 GPU 上下文。
///
/// 上下文所有权按线程划分：`make_current` 将上下文绑定到调用线程，`done_current` 释放之。
/// present 线程与应用线程会来回交接，因此实现必须可跨线程共享。
pub trait DisplaySurface: Send + Sync {
    /// ### English
    /// Size in logical (device-independent) pixels.
    ///
    /// ### 中文
    /// 逻辑（设备无关）像素尺寸。
    fn logical_size(&self) -> LogicalSize<u32>;

    /// ### English
    /// Device pixel ratio.
    ///
    /// ### 中文
    /// 设备像素比。
    fn scale_factor(&self) -> f64;

    /// ### English
    /// Size in physical pixels (`logical_size * scale_factor`).
    ///
    /// ### 中文
    /// 物理像素尺寸（`logical_size * scale_factor`）。
    fn physical_size(&self) -> PhysicalSize<u32> {
        self.logical_size().to_physical(self.scale_factor())
    }

    fn make_current(&self) -> GpuResult<()>;
    fn done_current(&self);
    /// ### English
    /// Whether the context is current on the calling thread.
    ///
    /// ### 中文
    /// 上下文是否在调用线程上为 current。
    fn is_current(&self) -> bool;
    fn swap_buffers(&self) -> GpuResult<()>;

    fn is_vsync_supported(&self) -> bool;
    /// ### English
    /// Sets the swap interval. Requires the context to be current.
    ///
    /// ### 中文
    /// 设置交换间隔。要求上下文为 current。
    fn set_vsync(&self, enabled: bool);
    fn is_vsync_enabled(&self) -> bool;

    fn has_focus(&self) -> bool;

    /// ### English
    /// Reads back the surface's front buffer. Requires the context to be current.
    ///
    /// ### 中文
    /// 回读表面的前缓冲。要求上下文为 current。
    fn grab_framebuffer(&self) -> GpuResult<image::RgbaImage>;
}
