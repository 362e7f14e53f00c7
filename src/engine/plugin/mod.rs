//! ### English
//! OpenGL display plugin: receives scene/overlay textures from the application and composites
//! them onto the display surface, either on the present thread or inline.
//!
//! ### 中文
//! OpenGL 显示插件：接收应用提交的场景/overlay 纹理，并在 present 线程上或以内联方式
//! 将其合成到显示表面。

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dpi::PhysicalSize;

use crate::engine::compositor::CompositorState;
use crate::engine::config::{DisplayPluginConfig, PresentMode};
use crate::engine::cursor::CursorSource;
use crate::engine::error::{GpuResult, PresentError};
use crate::engine::escrow::TextureEscrow;
use crate::engine::frame::{FrameIndexMap, FrameTexture};
use crate::engine::gpu::GpuBackend;
use crate::engine::present::{PresentPlugin, PresentThread};
use crate::engine::surface::DisplaySurface;
use crate::engine::timing::{Clock, MovingAverage};

mod frames;
mod health;
mod lifecycle;
mod presenter;
mod queries;
mod texture_pool;

pub use presenter::{Eye, eye_viewport};
pub use texture_pool::TexturePool;

use health::Health;
use presenter::Presenter;

/// ### English
/// Host services a display plugin relies on.
///
/// ### 中文
/// 显示插件依赖的宿主服务。
pub trait PluginContainer: Send + Sync {
    /// ### English
    /// Takes back a scene texture the plugin no longer references. Called from the consuming
    /// thread (present thread or the inline presenter).
    ///
    /// ### 中文
    /// 收回插件不再引用的场景纹理。在消费线程（present 线程或内联呈现方）上调用。
    fn release_scene_texture(&self, texture: FrameTexture);

    fn release_overlay_texture(&self, texture: FrameTexture);

    /// ### English
    /// Makes the application's own rendering context current again (after an inline present).
    ///
    /// ### 中文
    /// 让应用自身的渲染上下文重新成为 current（内联呈现之后）。
    fn make_rendering_context_current(&self);
}

/// ### English
/// Where `present` runs.
///
/// ### 中文
/// `present` 的执行位置。
enum PresentBinding {
    Threaded(Arc<PresentThread>),
    Inline,
}

/// ### English
/// Bookkeeping shared with the scene recycler, guarded by one mutex.
///
/// ### 中文
/// 与场景回收器共享的簿记数据，由同一把互斥锁保护。
struct FrameBookkeeping {
    frame_indices: FrameIndexMap,
    current_render_frame_index: u32,
    usecs_per_frame: MovingAverage,
    last_present_micros: Option<u64>,
}

/// ### English
/// Everything needed to construct an [`OpenGlDisplayPlugin`].
///
/// ### 中文
/// 构造 [`OpenGlDisplayPlugin`] 所需的全部内容。
pub struct OpenGlDisplayPluginInit {
    /// ### English
    /// Plugin name used in logs.
    ///
    /// ### 中文
    /// 日志中使用的插件名。
    pub name: String,
    pub config: DisplayPluginConfig,
    /// ### English
    /// GPU backend for the presentation context.
    ///
    /// ### 中文
    /// 呈现上下文的 GPU 后端。
    pub gpu: Box<dyn GpuBackend>,
    pub surface: Arc<dyn DisplaySurface>,
    pub compositor: Arc<dyn CompositorState>,
    pub cursor_source: Arc<dyn CursorSource>,
    pub container: Arc<dyn PluginContainer>,
    /// ### English
    /// Required for [`PresentMode::Threaded`]; ignored inline.
    ///
    /// ### 中文
    /// [`PresentMode::Threaded`] 下必需；内联模式下忽略。
    pub present_thread: Option<Arc<PresentThread>>,
    pub clock: Arc<dyn Clock>,
}

/// ### English
/// OpenGL display plugin.
///
/// Shared as `Arc<Self>`: the application submits from its thread while the present thread calls
/// [`PresentPlugin::present`].
///
/// ### 中文
/// OpenGL 显示插件。
///
/// 以 `Arc<Self>` 共享：应用在自己的线程上提交，present 线程调用 [`PresentPlugin::present`]。
pub struct OpenGlDisplayPlugin {
    name: String,
    config: DisplayPluginConfig,
    binding: PresentBinding,
    surface: Arc<dyn DisplaySurface>,
    compositor: Arc<dyn CompositorState>,
    cursor_source: Arc<dyn CursorSource>,
    container: Arc<dyn PluginContainer>,
    clock: Arc<dyn Clock>,
    scene: TextureEscrow<FrameTexture>,
    overlay: TextureEscrow<FrameTexture>,
    bookkeeping: Arc<Mutex<FrameBookkeeping>>,
    presenter: Mutex<Presenter>,
    present_count: AtomicU64,
    active: AtomicBool,
    vsync_supported: AtomicBool,
    health: Health,
}

#[inline]
fn lock_bookkeeping(bookkeeping: &Mutex<FrameBookkeeping>) -> MutexGuard<'_, FrameBookkeeping> {
    bookkeeping.lock().unwrap_or_else(PoisonError::into_inner)
}

impl OpenGlDisplayPlugin {
    /// ### English
    /// Creates an inactive plugin. Call [`Self::activate`] to start presenting.
    ///
    /// ### 中文
    /// 创建一个未激活的插件。调用 [`Self::activate`] 开始呈现。
    pub fn new(init: OpenGlDisplayPluginInit) -> Result<Arc<Self>, PresentError> {
        let OpenGlDisplayPluginInit {
            name,
            config,
            gpu,
            surface,
            compositor,
            cursor_source,
            container,
            present_thread,
            clock,
        } = init;

        let binding = match (config.mode, present_thread) {
            (PresentMode::Threaded, Some(thread)) => PresentBinding::Threaded(thread),
            (PresentMode::Threaded, None) => return Err(PresentError::NoPresentThread),
            (PresentMode::Inline, _) => PresentBinding::Inline,
        };

        let bookkeeping = Arc::new(Mutex::new(FrameBookkeeping {
            frame_indices: FrameIndexMap::default(),
            current_render_frame_index: 0,
            usecs_per_frame: MovingAverage::new(config.frame_rate_samples),
            last_present_micros: None,
        }));

        let scene = {
            let bookkeeping = bookkeeping.clone();
            let container = container.clone();
            TextureEscrow::new(move |texture: FrameTexture| {
                lock_bookkeeping(&bookkeeping)
                    .frame_indices
                    .remove(texture.id);
                container.release_scene_texture(texture);
            })
        };
        let overlay = {
            let container = container.clone();
            TextureEscrow::new(move |texture: FrameTexture| {
                container.release_overlay_texture(texture);
            })
        };

        let health = Health::new(config.degraded_after_failures);
        Ok(Arc::new(Self {
            name,
            config,
            binding,
            surface,
            compositor,
            cursor_source,
            container,
            clock,
            scene,
            overlay,
            bookkeeping,
            presenter: Mutex::new(Presenter::new(gpu)),
            present_count: AtomicU64::new(0),
            active: AtomicBool::new(false),
            vsync_supported: AtomicBool::new(false),
            health,
        }))
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn config(&self) -> &DisplayPluginConfig {
        &self.config
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    #[inline]
    fn lock_presenter(&self) -> MutexGuard<'_, Presenter> {
        self.presenter.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[inline]
    fn lock_bookkeeping(&self) -> MutexGuard<'_, FrameBookkeeping> {
        lock_bookkeeping(&self.bookkeeping)
    }

    /// ### English
    /// Size of the composite framebuffer: the configured override, else the surface's logical size.
    /// Never smaller than 1x1 (a minimized surface reports 0x0).
    ///
    /// ### 中文
    /// 合成 framebuffer 的尺寸：配置的覆盖值，否则为表面的逻辑尺寸。
    /// 最小为 1x1（最小化的表面会报告 0x0）。
    pub fn recommended_render_size(&self) -> PhysicalSize<u32> {
        let size = self.config.render_size.unwrap_or_else(|| {
            let logical = self.surface.logical_size();
            PhysicalSize::new(logical.width, logical.height)
        });
        PhysicalSize::new(size.width.max(1), size.height.max(1))
    }

    /// ### English
    /// Whether the plugin is degraded (failed customization, or repeated failed presents).
    ///
    /// ### 中文
    /// 插件是否处于降级状态（customize 失败，或 present 连续失败）。
    #[inline]
    pub fn is_degraded(&self) -> bool {
        self.health.is_degraded()
    }
}

impl PresentPlugin for OpenGlDisplayPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn customize_context(&self) -> GpuResult<()> {
        self.customize()
    }

    fn uncustomize_context(&self) {
        self.uncustomize();
    }

    fn present(&self) -> GpuResult<()> {
        self.present_frame()
    }
}
