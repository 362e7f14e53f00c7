//! ### English
//! GPU-side state of a display plugin and the composite pass.
//!
//! Everything here runs with the presentation context current, under the plugin's presenter lock.
//!
//! ### 中文
//! 显示插件的 GPU 侧状态与合成流程。
//!
//! 此处所有代码都在呈现上下文为 current、且持有插件 presenter 锁时执行。

use dpi::PhysicalSize;

use crate::engine::compositor::CompositorState;
use crate::engine::cursor::CursorGlyphCache;
use crate::engine::error::{GpuError, GpuResult};
use crate::engine::frame::FrameTexture;
use crate::engine::gpu::{
    ALPHA_UNIFORM, GpuBackend, MAT4_IDENTITY, MVP_UNIFORM, Mat4, MeshId, ProgramId,
    QUAD_FRAGMENT_SHADER, QUAD_VERTEX_SHADER, RenderTarget, UniformLocation, Viewport,
};

/// ### English
/// Stereo eye.
///
/// ### 中文
/// 立体渲染中的眼睛。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Eye {
    Left,
    Right,
}

impl Eye {
    pub const BOTH: [Eye; 2] = [Eye::Left, Eye::Right];
}

/// ### English
/// Half of `size` covered by `eye`: the left half, or the right half offset by the same width.
///
/// ### 中文
/// `eye` 覆盖的 `size` 的一半：左半边，或偏移同样宽度的右半边。
pub fn eye_viewport(size: PhysicalSize<u32>, eye: Eye) -> Viewport {
    let width = size.width / 2;
    Viewport {
        x: if eye == Eye::Right { width } else { 0 },
        y: 0,
        width,
        height: size.height,
    }
}

/// ### English
/// Linked quad program and its uniform locations.
///
/// ### 中文
/// 已链接的四边形 program 及其 uniform 位置。
#[derive(Clone, Copy, Debug)]
struct QuadProgram {
    id: ProgramId,
    mvp: Option<UniformLocation>,
    alpha: Option<UniformLocation>,
}

/// ### English
/// Per-frame compositing inputs read from the UI state once per pass.
///
/// ### 中文
/// 每轮合成时从 UI 状态读取一次的输入。
pub(super) struct CompositeInputs<'a> {
    pub(super) compositor: &'a dyn CompositorState,
    pub(super) stereo: bool,
    pub(super) render_size: PhysicalSize<u32>,
}

pub(super) struct Presenter {
    pub(super) gpu: Box<dyn GpuBackend>,
    program: Option<QuadProgram>,
    quad: Option<MeshId>,
    composite: Option<RenderTarget>,
    pub(super) cursors: CursorGlyphCache,
    /// ### English
    /// Scene texture last fetched from the scene escrow.
    ///
    /// ### 中文
    /// 最近一次从场景 escrow 获取的场景纹理。
    pub(super) current_scene: Option<FrameTexture>,
    pub(super) current_overlay: Option<FrameTexture>,
}

impl Presenter {
    pub(super) fn new(gpu: Box<dyn GpuBackend>) -> Self {
        Self {
            gpu,
            program: None,
            quad: None,
            composite: None,
            cursors: CursorGlyphCache::default(),
            current_scene: None,
            current_overlay: None,
        }
    }

    #[inline]
    pub(super) fn is_customized(&self) -> bool {
        self.program.is_some() && self.quad.is_some() && self.composite.is_some()
    }

    /// ### English
    /// Creates blend state, cursor textures, the quad program, the unit quad and the composite
    /// framebuffer. Partially created resources are released on failure.
    ///
    /// ### 中文
    /// 创建混合状态、光标纹理、四边形 program、单位四边形与合成 framebuffer。失败时释放已部分创建的资源。
    pub(super) fn customize(&mut self, render_size: PhysicalSize<u32>) -> GpuResult<()> {
        self.release();
        let result = self.create_resources(render_size);
        if result.is_err() {
            self.release();
        }
        result
    }

    fn create_resources(&mut self, render_size: PhysicalSize<u32>) -> GpuResult<()> {
        self.cursors.upload(self.gpu.as_mut());
        self.gpu.reset_composite_state();

        let id = self
            .gpu
            .create_program(QUAD_VERTEX_SHADER, QUAD_FRAGMENT_SHADER)?;
        self.program = Some(QuadProgram {
            id,
            mvp: self.gpu.uniform_location(id, MVP_UNIFORM),
            alpha: self.gpu.uniform_location(id, ALPHA_UNIFORM),
        });
        self.quad = Some(self.gpu.create_unit_quad()?);
        self.composite = Some(self.gpu.create_render_target(render_size)?);
        self.gpu.check_error("customize context")
    }

    /// ### English
    /// Releases everything `customize` created. Safe to call when nothing was created.
    ///
    /// ### 中文
    /// 释放 `customize` 创建的全部资源。未创建时调用也是安全的。
    pub(super) fn release(&mut self) {
        if let Some(target) = self.composite.take() {
            self.gpu.delete_render_target(target);
        }
        if let Some(quad) = self.quad.take() {
            self.gpu.delete_mesh(quad);
        }
        if let Some(program) = self.program.take() {
            self.gpu.delete_program(program.id);
        }
        self.cursors.release(self.gpu.as_mut());
    }

    fn set_mvp(&mut self, program: QuadProgram, mvp: &Mat4) {
        if let Some(location) = program.mvp {
            self.gpu.set_uniform_mat4(location, mvp);
        }
    }

    fn set_alpha(&mut self, program: QuadProgram, alpha: f32) {
        if let Some(location) = program.alpha {
            self.gpu.set_uniform_f32(location, alpha);
        }
    }

    /// ### English
    /// Draws the quad once (mono) or once per eye viewport (stereo).
    ///
    /// ### 中文
    /// 绘制一次四边形（单目），或在每个眼睛视口各绘制一次（立体）。
    fn draw_per_eye(&mut self, quad: MeshId, stereo: bool, size: PhysicalSize<u32>) {
        if stereo {
            for eye in Eye::BOTH {
                self.gpu.viewport(eye_viewport(size, eye));
                self.gpu.draw_unit_quad(quad);
            }
            self.gpu.viewport(Viewport::full(size));
        } else {
            self.gpu.draw_unit_quad(quad);
        }
    }

    /// ### English
    /// Composites scene, overlay and cursor into the composite framebuffer, reallocating it when
    /// the render size changed. Returns the target to blit from.
    ///
    /// ### 中文
    /// 将场景、overlay 与光标合成到合成 framebuffer；渲染尺寸变化时重新分配。返回用于 blit 的目标。
    pub(super) fn composite_layers(
        &mut self,
        scene: FrameTexture,
        inputs: &CompositeInputs<'_>,
    ) -> GpuResult<RenderTarget> {
        let (Some(program), Some(quad)) = (self.program, self.quad) else {
            return Err(GpuError::Other(
                "presentation context is not customized".to_string(),
            ));
        };

        let target = match self.composite {
            Some(target) if target.size == inputs.render_size => target,
            stale => {
                if let Some(stale) = stale {
                    self.composite = None;
                    self.gpu.delete_render_target(stale);
                }
                let target = self.gpu.create_render_target(inputs.render_size)?;
                self.composite = Some(target);
                target
            }
        };

        self.gpu.bind_draw_framebuffer(Some(target.framebuffer));
        self.gpu.viewport(Viewport::full(target.size));
        self.gpu.clear_depth();
        self.gpu.use_program(Some(program.id));
        self.set_mvp(program, &MAT4_IDENTITY);
        self.set_alpha(program, 1.0);
        self.gpu.bind_texture(Some(scene.id));
        self.gpu.draw_unit_quad(quad);

        if let Some(overlay) = self.current_overlay {
            let alpha = inputs.compositor.overlay_alpha();
            if alpha > 0.0 {
                self.gpu.set_blending(true);
                self.gpu.bind_texture(Some(overlay.id));
                self.composite_overlay(program, quad, alpha, inputs.stereo, target.size);
                if inputs.compositor.reticle_visible() {
                    let icon = inputs.compositor.current_cursor_icon();
                    if let Some(cursor) = self.cursors.texture(icon) {
                        self.gpu.bind_texture(Some(cursor));
                        let mvp = inputs.compositor.reticle_transform(&MAT4_IDENTITY);
                        self.composite_pointer(program, quad, alpha, &mvp, inputs.stereo, target.size);
                    }
                }
                self.gpu.bind_texture(None);
                self.gpu.set_blending(false);
            }
        }

        self.gpu.bind_texture(None);
        self.gpu.use_program(None);
        self.gpu.bind_draw_framebuffer(None);
        self.gpu.check_error("composite layers")?;
        Ok(target)
    }

    fn composite_overlay(
        &mut self,
        program: QuadProgram,
        quad: MeshId,
        alpha: f32,
        stereo: bool,
        size: PhysicalSize<u32>,
    ) {
        self.set_alpha(program, alpha);
        self.set_mvp(program, &MAT4_IDENTITY);
        self.draw_per_eye(quad, stereo, size);
        self.set_alpha(program, 1.0);
    }

    fn composite_pointer(
        &mut self,
        program: QuadProgram,
        quad: MeshId,
        alpha: f32,
        mvp: &Mat4,
        stereo: bool,
        size: PhysicalSize<u32>,
    ) {
        self.set_alpha(program, alpha);
        self.set_mvp(program, mvp);
        self.draw_per_eye(quad, stereo, size);
        self.set_mvp(program, &MAT4_IDENTITY);
        self.set_alpha(program, 1.0);
    }

    /// ### English
    /// Copies the composite framebuffer onto the surface (nearest filter; sizes may differ).
    ///
    /// ### 中文
    /// 将合成 framebuffer 复制到表面（nearest 过滤；尺寸可不同）。
    pub(super) fn blit_to_surface(
        &mut self,
        target: RenderTarget,
        surface_pixels: PhysicalSize<u32>,
    ) -> GpuResult<()> {
        self.gpu
            .blit_to_surface(target.framebuffer, target.size, surface_pixels);
        self.gpu.check_error("blit to surface")
    }
}
