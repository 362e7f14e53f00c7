//! ### English
//! Read-only queries, surface delegations, vsync control and main-thread context access.
//!
//! ### 中文
//! 只读查询、表面委托、vsync 控制与主线程上下文访问。

use std::sync::atomic::Ordering;

use dpi::{LogicalSize, PhysicalSize};

use crate::engine::error::PresentError;

use super::{OpenGlDisplayPlugin, PresentBinding};

const USECS_PER_SECOND: f64 = 1_000_000.0;

impl OpenGlDisplayPlugin {
    /// ### English
    /// Presents per second from the moving average of frame intervals; `None` before two
    /// presents completed.
    ///
    /// ### 中文
    /// 由帧间隔滑动平均计算的每秒 present 次数；完成两次 present 之前为 `None`。
    pub fn present_rate(&self) -> Option<f32> {
        self.lock_bookkeeping()
            .usecs_per_frame
            .average()
            .filter(|average| *average > 0.0)
            .map(|average| (USECS_PER_SECOND / average) as f32)
    }

    /// ### English
    /// Number of present passes started (including passes that had nothing to draw).
    ///
    /// ### 中文
    /// 已开始的 present 次数（包括没有内容可绘制的轮次）。
    #[inline]
    pub fn present_count(&self) -> u64 {
        self.present_count.load(Ordering::Relaxed)
    }

    /// ### English
    /// Frame index of the scene texture currently on screen.
    ///
    /// ### 中文
    /// 当前显示的场景纹理对应的帧序号。
    pub fn current_render_frame_index(&self) -> u32 {
        self.lock_bookkeeping().current_render_frame_index
    }

    /// ### English
    /// Number of submitted scene textures whose frame index is still tracked (pending or on
    /// screen). Entries leave the map when their texture is recycled.
    ///
    /// ### 中文
    /// 仍在跟踪帧序号的已提交场景纹理数量（待取或正在显示）。纹理被回收时条目移除。
    pub fn tracked_frame_count(&self) -> usize {
        self.lock_bookkeeping().frame_indices.len()
    }

    /// ### English
    /// Whether the GPU resources created by customization are alive.
    ///
    /// ### 中文
    /// customize 创建的 GPU 资源是否存在。
    pub fn is_customized(&self) -> bool {
        self.lock_presenter().is_customized()
    }

    /// ### English
    /// Runs `f` on the calling thread with the presentation context current.
    ///
    /// Threaded: rendezvous with the present thread; must not be called from the present thread.
    /// Either way the container's rendering context is restored afterwards.
    ///
    /// ### 中文
    /// 在调用线程上、呈现上下文为 current 时执行 `f`。
    ///
    /// 线程化：与 present 线程会合；不得在 present 线程上调用。
    /// 两种方式之后都会恢复容器的渲染上下文。
    pub fn with_main_thread_context<R>(&self, f: impl FnOnce() -> R) -> Result<R, PresentError> {
        match &self.binding {
            PresentBinding::Threaded(thread) => {
                let result = thread.with_main_thread_context(f)?;
                self.container.make_rendering_context_current();
                Ok(result)
            }
            PresentBinding::Inline => {
                self.surface.make_current()?;
                let result = f();
                self.surface.done_current();
                self.container.make_rendering_context_current();
                Ok(result)
            }
        }
    }

    /// ### English
    /// Reads back the surface contents.
    ///
    /// ### 中文
    /// 回读表面内容。
    pub fn screenshot(&self) -> Result<image::RgbaImage, PresentError> {
        self.with_main_thread_context(|| self.surface.grab_framebuffer())?
            .map_err(PresentError::from)
    }

    /// ### English
    /// Surface size in physical pixels.
    ///
    /// ### 中文
    /// 表面的物理像素尺寸。
    #[inline]
    pub fn surface_pixels(&self) -> PhysicalSize<u32> {
        self.surface.physical_size()
    }

    #[inline]
    pub fn surface_size(&self) -> LogicalSize<u32> {
        self.surface.logical_size()
    }

    #[inline]
    pub fn has_focus(&self) -> bool {
        self.surface.has_focus()
    }

    /// ### English
    /// Turns vsync on or off. No-op when the surface does not support it.
    ///
    /// ### 中文
    /// 开启或关闭 vsync。表面不支持时为空操作。
    pub fn enable_vsync(&self, enable: bool) -> Result<(), PresentError> {
        if !self.vsync_supported.load(Ordering::Acquire) {
            return Ok(());
        }
        self.with_main_thread_context(|| self.surface.set_vsync(enable))
    }

    /// ### English
    /// Current vsync setting; `true` when the surface does not support toggling it.
    ///
    /// ### 中文
    /// 当前 vsync 设置；表面不支持切换时为 `true`。
    pub fn is_vsync_enabled(&self) -> bool {
        if !self.vsync_supported.load(Ordering::Acquire) {
            return true;
        }
        self.surface.is_vsync_enabled()
    }
}
