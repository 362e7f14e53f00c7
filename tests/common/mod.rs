//! Recording fakes shared by the integration tests.
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use dpi::{LogicalSize, PhysicalSize};
use gl_display_present::engine::compositor::CompositorState;
use gl_display_present::engine::cursor::{CursorIcon, CursorSource};
use gl_display_present::engine::escrow::{FenceSync, GpuFence};
use gl_display_present::engine::gpu::{
    FramebufferId, GpuBackend, Mat4, MeshId, ProgramId, RenderTarget, UniformLocation, Viewport,
};
use gl_display_present::engine::plugin::OpenGlDisplayPluginInit;
use gl_display_present::engine::surface::DisplaySurface;
use gl_display_present::engine::timing::ManualClock;
use gl_display_present::{
    DisplayPluginConfig, FrameTexture, GpuError, GpuResult, OpenGlDisplayPlugin, PluginContainer,
    PresentConfig, PresentMode, PresentPlugin, PresentThread, TextureId,
};
use image::{Rgba, RgbaImage};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub fn texture(raw: u32) -> FrameTexture {
    FrameTexture::new(
        TextureId::new(raw).expect("non-zero texture name"),
        PhysicalSize::new(64, 32),
    )
}

/// Polls `condition` until it holds or `timeout` elapses.
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    condition()
}

// ---------------------------------------------------------------------------------------------
// GPU backend
// ---------------------------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
pub enum GpuCall {
    CreateTexture(TextureId),
    DeleteTexture(TextureId),
    CreateTarget(PhysicalSize<u32>),
    DeleteTarget(PhysicalSize<u32>),
    BindDrawFramebuffer(Option<FramebufferId>),
    Blit {
        source_size: PhysicalSize<u32>,
        surface_size: PhysicalSize<u32>,
    },
    Viewport(Viewport),
    ClearDepth,
    Blending(bool),
    ResetState,
    CreateProgram(ProgramId),
    DeleteProgram(ProgramId),
    CreateQuad(MeshId),
    DeleteMesh(MeshId),
    /// Draw with the texture bound at the time and the last `alpha` uniform value.
    Draw {
        texture: Option<TextureId>,
        alpha: f32,
    },
    WaitFence(GpuFence),
    DeleteFence(GpuFence),
}

#[derive(Default)]
struct GpuRecord {
    calls: Vec<GpuCall>,
    bound_texture: Option<TextureId>,
    alpha: f32,
    next_name: u32,
    signaled: HashSet<u64>,
    all_signaled: bool,
    fail_program: bool,
    pending_error: Option<GpuError>,
}

const ALPHA_LOCATION: UniformLocation = UniformLocation(1);
const MVP_LOCATION: UniformLocation = UniformLocation(2);

/// Recording `GpuBackend`; inspect it through the paired [`GpuProbe`].
pub struct FakeGpu {
    record: Arc<Mutex<GpuRecord>>,
}

/// Test-side view of a [`FakeGpu`].
#[derive(Clone)]
pub struct GpuProbe {
    record: Arc<Mutex<GpuRecord>>,
}

pub fn fake_gpu() -> (FakeGpu, GpuProbe) {
    let record = Arc::new(Mutex::new(GpuRecord {
        next_name: 1000,
        all_signaled: true,
        alpha: 1.0,
        ..GpuRecord::default()
    }));
    (
        FakeGpu {
            record: record.clone(),
        },
        GpuProbe { record },
    )
}

impl GpuProbe {
    pub fn calls(&self) -> Vec<GpuCall> {
        lock(&self.record).calls.clone()
    }

    pub fn clear(&self) {
        lock(&self.record).calls.clear();
    }

    pub fn count(&self, mut predicate: impl FnMut(&GpuCall) -> bool) -> usize {
        lock(&self.record)
            .calls
            .iter()
            .filter(|call| predicate(call))
            .count()
    }

    pub fn draws_with(&self, texture: TextureId) -> usize {
        self.count(|call| matches!(call, GpuCall::Draw { texture: Some(t), .. } if *t == texture))
    }

    pub fn draws(&self) -> usize {
        self.count(|call| matches!(call, GpuCall::Draw { .. }))
    }

    pub fn blits(&self) -> usize {
        self.count(|call| matches!(call, GpuCall::Blit { .. }))
    }

    /// Textures created by the backend itself (cursor glyphs).
    pub fn created_textures(&self) -> Vec<TextureId> {
        lock(&self.record)
            .calls
            .iter()
            .filter_map(|call| match call {
                GpuCall::CreateTexture(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    /// Fences report signaled only once listed with [`Self::signal`].
    pub fn hold_fences(&self) {
        lock(&self.record).all_signaled = false;
    }

    pub fn signal(&self, fence: GpuFence) {
        lock(&self.record).signaled.insert(fence.0);
    }

    pub fn fail_program_creation(&self, fail: bool) {
        lock(&self.record).fail_program = fail;
    }

    /// Every `check_error` reports `error` until cleared with `None`.
    pub fn set_error(&self, error: Option<GpuError>) {
        lock(&self.record).pending_error = error;
    }
}

impl FakeGpu {
    fn record(&self) -> MutexGuard<'_, GpuRecord> {
        lock(&self.record)
    }

    fn next_name(&self) -> std::num::NonZeroU32 {
        let mut record = self.record();
        record.next_name += 1;
        std::num::NonZeroU32::new(record.next_name).expect("non-zero")
    }

    fn push(&self, call: GpuCall) {
        self.record().calls.push(call);
    }
}

impl FenceSync for FakeGpu {
    fn poll_fence(&mut self, fence: GpuFence) -> bool {
        let record = self.record();
        record.all_signaled || record.signaled.contains(&fence.0)
    }

    fn wait_fence(&mut self, fence: GpuFence) {
        self.push(GpuCall::WaitFence(fence));
    }

    fn delete_fence(&mut self, fence: GpuFence) {
        self.push(GpuCall::DeleteFence(fence));
    }
}

impl GpuBackend for FakeGpu {
    fn create_texture_rgba8(
        &mut self,
        size: PhysicalSize<u32>,
        pixels: &[u8],
    ) -> GpuResult<TextureId> {
        assert_eq!(pixels.len(), (size.width * size.height * 4) as usize);
        let id = TextureId(self.next_name());
        self.push(GpuCall::CreateTexture(id));
        Ok(id)
    }

    fn delete_texture(&mut self, texture: TextureId) {
        self.push(GpuCall::DeleteTexture(texture));
    }

    fn bind_texture(&mut self, texture: Option<TextureId>) {
        self.record().bound_texture = texture;
    }

    fn create_render_target(&mut self, size: PhysicalSize<u32>) -> GpuResult<RenderTarget> {
        let framebuffer = FramebufferId(self.next_name());
        let color = TextureId(self.next_name());
        self.push(GpuCall::CreateTarget(size));
        Ok(RenderTarget {
            framebuffer,
            color,
            size,
        })
    }

    fn delete_render_target(&mut self, target: RenderTarget) {
        self.push(GpuCall::DeleteTarget(target.size));
    }

    fn bind_draw_framebuffer(&mut self, framebuffer: Option<FramebufferId>) {
        self.push(GpuCall::BindDrawFramebuffer(framebuffer));
    }

    fn blit_to_surface(
        &mut self,
        _source: FramebufferId,
        source_size: PhysicalSize<u32>,
        surface_size: PhysicalSize<u32>,
    ) {
        self.push(GpuCall::Blit {
            source_size,
            surface_size,
        });
    }

    fn viewport(&mut self, viewport: Viewport) {
        self.push(GpuCall::Viewport(viewport));
    }

    fn clear_depth(&mut self) {
        self.push(GpuCall::ClearDepth);
    }

    fn set_blending(&mut self, enabled: bool) {
        self.push(GpuCall::Blending(enabled));
    }

    fn reset_composite_state(&mut self) {
        self.push(GpuCall::ResetState);
    }

    fn create_program(&mut self, vertex: &str, fragment: &str) -> GpuResult<ProgramId> {
        assert!(vertex.contains("mvp"));
        assert!(fragment.contains("alpha"));
        if self.record().fail_program {
            return Err(GpuError::Shader("forced link failure".to_string()));
        }
        let id = ProgramId(self.next_name());
        self.push(GpuCall::CreateProgram(id));
        Ok(id)
    }

    fn delete_program(&mut self, program: ProgramId) {
        self.push(GpuCall::DeleteProgram(program));
    }

    fn use_program(&mut self, _program: Option<ProgramId>) {}

    fn uniform_location(&mut self, _program: ProgramId, name: &str) -> Option<UniformLocation> {
        match name {
            "alpha" => Some(ALPHA_LOCATION),
            "mvp" => Some(MVP_LOCATION),
            _ => None,
        }
    }

    fn set_uniform_f32(&mut self, location: UniformLocation, value: f32) {
        if location == ALPHA_LOCATION {
            self.record().alpha = value;
        }
    }

    fn set_uniform_mat4(&mut self, _location: UniformLocation, _value: &Mat4) {}

    fn create_unit_quad(&mut self) -> GpuResult<MeshId> {
        let id = MeshId(self.next_name());
        self.push(GpuCall::CreateQuad(id));
        Ok(id)
    }

    fn delete_mesh(&mut self, mesh: MeshId) {
        self.push(GpuCall::DeleteMesh(mesh));
    }

    fn draw_unit_quad(&mut self, _mesh: MeshId) {
        let mut record = self.record();
        let call = GpuCall::Draw {
            texture: record.bound_texture,
            alpha: record.alpha,
        };
        record.calls.push(call);
    }

    fn insert_fence(&mut self) -> GpuResult<GpuFence> {
        Ok(GpuFence(u64::from(self.next_name().get())))
    }

    fn check_error(&mut self, _operation: &'static str) -> GpuResult<()> {
        match self.record().pending_error.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------------------------
// Display surface
// ---------------------------------------------------------------------------------------------

/// Surface whose "context" tracks the owning thread, like a real GL context.
pub struct FakeSurface {
    logical: Mutex<LogicalSize<u32>>,
    scale_factor: f64,
    holder: Mutex<Option<ThreadId>>,
    /// `make_current` while another thread held the context.
    pub conflicts: AtomicUsize,
    pub make_current_calls: AtomicUsize,
    pub swaps: AtomicUsize,
    pub fail_make_current: AtomicBool,
    pub vsync_supported: bool,
    pub vsync_enabled: AtomicBool,
    pub focused: AtomicBool,
}

impl FakeSurface {
    pub fn new(width: u32, height: u32, scale_factor: f64) -> Self {
        Self {
            logical: Mutex::new(LogicalSize::new(width, height)),
            scale_factor,
            holder: Mutex::new(None),
            conflicts: AtomicUsize::new(0),
            make_current_calls: AtomicUsize::new(0),
            swaps: AtomicUsize::new(0),
            fail_make_current: AtomicBool::new(false),
            vsync_supported: true,
            vsync_enabled: AtomicBool::new(false),
            focused: AtomicBool::new(true),
        }
    }

    pub fn without_vsync(mut self) -> Self {
        self.vsync_supported = false;
        self
    }

    pub fn resize(&self, width: u32, height: u32) {
        *lock(&self.logical) = LogicalSize::new(width, height);
    }

    pub fn swaps(&self) -> usize {
        self.swaps.load(Ordering::SeqCst)
    }
}

impl DisplaySurface for FakeSurface {
    fn logical_size(&self) -> LogicalSize<u32> {
        *lock(&self.logical)
    }

    fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    fn make_current(&self) -> GpuResult<()> {
        self.make_current_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_make_current.load(Ordering::SeqCst) {
            return Err(GpuError::MakeCurrent("surface lost".to_string()));
        }
        let me = thread::current().id();
        let mut holder = lock(&self.holder);
        if holder.is_some_and(|other| other != me) {
            self.conflicts.fetch_add(1, Ordering::SeqCst);
        }
        *holder = Some(me);
        Ok(())
    }

    fn done_current(&self) {
        let me = thread::current().id();
        let mut holder = lock(&self.holder);
        if *holder == Some(me) {
            *holder = None;
        }
    }

    fn is_current(&self) -> bool {
        *lock(&self.holder) == Some(thread::current().id())
    }

    fn swap_buffers(&self) -> GpuResult<()> {
        self.swaps.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn is_vsync_supported(&self) -> bool {
        self.vsync_supported
    }

    fn set_vsync(&self, enabled: bool) {
        self.vsync_enabled.store(enabled, Ordering::SeqCst);
    }

    fn is_vsync_enabled(&self) -> bool {
        self.vsync_enabled.load(Ordering::SeqCst)
    }

    fn has_focus(&self) -> bool {
        self.focused.load(Ordering::SeqCst)
    }

    fn grab_framebuffer(&self) -> GpuResult<RgbaImage> {
        if !self.is_current() {
            return Err(GpuError::Other("grab without a current context".to_string()));
        }
        let size = self.physical_size();
        Ok(RgbaImage::from_pixel(
            size.width,
            size.height,
            Rgba([1, 2, 3, 255]),
        ))
    }
}

// ---------------------------------------------------------------------------------------------
// Compositor state, cursor source, container
// ---------------------------------------------------------------------------------------------

pub struct FakeCompositor {
    alpha_bits: AtomicU32,
    pub reticle_visible: AtomicBool,
}

impl FakeCompositor {
    pub fn new(alpha: f32, reticle_visible: bool) -> Self {
        Self {
            alpha_bits: AtomicU32::new(alpha.to_bits()),
            reticle_visible: AtomicBool::new(reticle_visible),
        }
    }

    pub fn set_alpha(&self, alpha: f32) {
        self.alpha_bits.store(alpha.to_bits(), Ordering::SeqCst);
    }
}

impl CompositorState for FakeCompositor {
    fn overlay_alpha(&self) -> f32 {
        f32::from_bits(self.alpha_bits.load(Ordering::SeqCst))
    }

    fn reticle_visible(&self) -> bool {
        self.reticle_visible.load(Ordering::SeqCst)
    }

    fn reticle_transform(&self, eye_transform: &Mat4) -> Mat4 {
        let mut transform = *eye_transform;
        transform[0] *= 0.05;
        transform[5] *= 0.05;
        transform
    }

    fn current_cursor_icon(&self) -> CursorIcon {
        CursorIcon::DEFAULT
    }
}

/// One 2x2 glyph for [`CursorIcon::DEFAULT`].
pub struct SingleCursor;

impl CursorSource for SingleCursor {
    fn registered_icons(&self) -> Vec<CursorIcon> {
        vec![CursorIcon::DEFAULT]
    }

    fn icon_image(&self, icon: CursorIcon) -> Option<RgbaImage> {
        (icon == CursorIcon::DEFAULT).then(|| RgbaImage::from_pixel(2, 2, Rgba([255; 4])))
    }
}

#[derive(Default)]
pub struct RecordingContainer {
    pub scene_released: Mutex<Vec<FrameTexture>>,
    pub overlay_released: Mutex<Vec<FrameTexture>>,
    pub restores: AtomicUsize,
}

impl RecordingContainer {
    pub fn scene_released(&self) -> Vec<u32> {
        lock(&self.scene_released)
            .iter()
            .map(|texture| texture.id.get())
            .collect()
    }

    pub fn overlay_released(&self) -> Vec<u32> {
        lock(&self.overlay_released)
            .iter()
            .map(|texture| texture.id.get())
            .collect()
    }
}

impl PluginContainer for RecordingContainer {
    fn release_scene_texture(&self, texture: FrameTexture) {
        lock(&self.scene_released).push(texture);
    }

    fn release_overlay_texture(&self, texture: FrameTexture) {
        lock(&self.overlay_released).push(texture);
    }

    fn make_rendering_context_current(&self) {
        self.restores.fetch_add(1, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------------------------
// Present-thread plugin
// ---------------------------------------------------------------------------------------------

/// Present plugin that logs its lifecycle into a shared event list.
pub struct RecordingPlugin {
    name: String,
    events: Arc<Mutex<Vec<String>>>,
    pub presents: AtomicUsize,
    pub hook_delay: Duration,
    pub fail_customize: bool,
    surface: Arc<FakeSurface>,
    /// Hooks that ran without the context current on their thread.
    pub hooks_without_context: AtomicUsize,
}

impl RecordingPlugin {
    pub fn new(name: &str, events: Arc<Mutex<Vec<String>>>, surface: Arc<FakeSurface>) -> Self {
        Self {
            name: name.to_string(),
            events,
            presents: AtomicUsize::new(0),
            hook_delay: Duration::ZERO,
            fail_customize: false,
            surface,
            hooks_without_context: AtomicUsize::new(0),
        }
    }

    pub fn presents(&self) -> usize {
        self.presents.load(Ordering::SeqCst)
    }

    fn log(&self, event: &str) {
        if !self.surface.is_current() {
            self.hooks_without_context.fetch_add(1, Ordering::SeqCst);
        }
        lock(&self.events).push(format!("{}:{event}", self.name));
    }
}

pub fn events(events: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
    lock(events).clone()
}

impl PresentPlugin for RecordingPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn customize_context(&self) -> GpuResult<()> {
        thread::sleep(self.hook_delay);
        self.log("customize");
        if self.fail_customize {
            Err(GpuError::Shader("forced".to_string()))
        } else {
            Ok(())
        }
    }

    fn uncustomize_context(&self) {
        thread::sleep(self.hook_delay);
        self.log("uncustomize");
    }

    fn present(&self) -> GpuResult<()> {
        if !self.surface.is_current() {
            self.hooks_without_context.fetch_add(1, Ordering::SeqCst);
        }
        self.presents.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub fn present_config() -> PresentConfig {
    PresentConfig {
        idle_poll: Duration::from_millis(1),
        start_timeout: Duration::from_secs(5),
        thread_name: "Test Present Thread".to_string(),
    }
}

// ---------------------------------------------------------------------------------------------
// Display plugin harness
// ---------------------------------------------------------------------------------------------

pub struct Harness {
    pub plugin: Arc<OpenGlDisplayPlugin>,
    pub gpu: GpuProbe,
    pub surface: Arc<FakeSurface>,
    pub compositor: Arc<FakeCompositor>,
    pub container: Arc<RecordingContainer>,
    pub clock: Arc<ManualClock>,
    pub present_thread: Option<Arc<PresentThread>>,
}

impl Harness {
    pub fn inline(config: DisplayPluginConfig) -> Self {
        Self::build(
            DisplayPluginConfig {
                mode: PresentMode::Inline,
                ..config
            },
            Arc::new(FakeSurface::new(320, 240, 2.0)),
            None,
        )
    }

    pub fn threaded(config: DisplayPluginConfig) -> Self {
        let surface = Arc::new(FakeSurface::new(320, 240, 2.0));
        let thread = Arc::new(
            PresentThread::start(surface.clone(), present_config()).expect("present thread"),
        );
        Self::build(
            DisplayPluginConfig {
                mode: PresentMode::Threaded,
                ..config
            },
            surface,
            Some(thread),
        )
    }

    pub fn build(
        config: DisplayPluginConfig,
        surface: Arc<FakeSurface>,
        present_thread: Option<Arc<PresentThread>>,
    ) -> Self {
        init_logger();
        let (gpu, probe) = fake_gpu();
        let compositor = Arc::new(FakeCompositor::new(0.0, false));
        let container = Arc::new(RecordingContainer::default());
        let clock = Arc::new(ManualClock::new(0));
        let plugin = OpenGlDisplayPlugin::new(OpenGlDisplayPluginInit {
            name: "test-display".to_string(),
            config,
            gpu: Box::new(gpu),
            surface: surface.clone(),
            compositor: compositor.clone(),
            cursor_source: Arc::new(SingleCursor),
            container: container.clone(),
            present_thread: present_thread.clone(),
            clock: clock.clone(),
        })
        .expect("plugin");
        Self {
            plugin,
            gpu: probe,
            surface,
            compositor,
            container,
            clock,
            present_thread,
        }
    }

    /// Runs one present pass directly, with the surface current on the calling thread.
    pub fn present(&self) -> GpuResult<()> {
        self.surface.make_current()?;
        let result = PresentPlugin::present(&*self.plugin);
        self.surface.done_current();
        result
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        let _ = self.plugin.deactivate();
        if let Some(thread) = &self.present_thread {
            thread.shutdown();
        }
    }
}
