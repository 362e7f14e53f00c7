//! ### English
//! `GpuBackend` implementation over `glow` (OpenGL 3.2+ / OpenGL ES 3.0+).
//!
//! ### 中文
//! 基于 `glow` 的 `GpuBackend` 实现（OpenGL 3.2+ / OpenGL ES 3.0+）。

use std::collections::HashMap;
use std::ffi::{CStr, CString, c_void};

use dpi::PhysicalSize;
use glow::HasContext as _;

use crate::engine::error::{GpuError, GpuResult};
use crate::engine::escrow::{FenceSync, GpuFence};
use crate::engine::frame::TextureId;

use super::{
    FramebufferId, GpuBackend, Mat4, MeshId, ProgramId, RenderTarget, UniformLocation, Viewport,
};

mod fences;
mod program;
mod targets;
mod version;

use version::GlVersion;

/// ### English
/// glow-backed GPU backend.
///
/// ### 中文
/// 基于 glow 的 GPU 后端。
pub struct GlowBackend {
    /// ### English
    /// Loaded GL entry points for the presentation context.
    ///
    /// ### 中文
    /// 呈现上下文已加载的 GL 函数入口。
    gl: glow::Context,
    /// ### English
    /// Parsed `GL_VERSION` of the context (GLSL header selection).
    ///
    /// ### 中文
    /// 上下文的 `GL_VERSION` 解析结果（用于选择 GLSL 头）。
    version: GlVersion,
    /// ### English
    /// Depth renderbuffer attached to each render target, keyed by framebuffer.
    ///
    /// ### 中文
    /// 每个渲染目标附带的深度 renderbuffer，以 framebuffer 为键。
    depth_attachments: HashMap<FramebufferId, glow::NativeRenderbuffer>,
    /// ### English
    /// Vertex buffer backing each mesh, keyed by vertex array.
    ///
    /// ### 中文
    /// 每个网格对应的顶点缓冲，以 VAO 为键。
    mesh_buffers: HashMap<MeshId, glow::NativeBuffer>,
}

// SAFETY: the GL entry points are plain function pointers. GL calls are only issued by the
// thread that currently holds the context; the present thread protocol hands the backend over
// together with the context and never lets two threads use it at once.
unsafe impl Send for GlowBackend {}

impl GlowBackend {
    /// ### English
    /// Loads GL entry points through `loader` (e.g. a windowing library's `get_proc_address`).
    ///
    /// The context must be current on the calling thread.
    ///
    /// ### 中文
    /// 通过 `loader`（例如窗口库的 `get_proc_address`）加载 GL 函数入口。
    ///
    /// 调用线程上必须已有 current 上下文。
    ///
    /// # Safety
    /// `loader` must return valid function pointers for the context current on this thread.
    pub unsafe fn from_loader_function(
        mut loader: impl FnMut(&CStr) -> *const c_void,
    ) -> GpuResult<Self> {
        let gl = unsafe {
            glow::Context::from_loader_function(|name| {
                CString::new(name)
                    .map(|name| loader(name.as_c_str()))
                    .unwrap_or(std::ptr::null())
            })
        };
        Self::from_context(gl)
    }

    /// ### English
    /// Wraps an already loaded glow context. Fails on contexts older than GL 3.2 / GLES 3.0.
    ///
    /// ### 中文
    /// 封装已加载的 glow 上下文。早于 GL 3.2 / GLES 3.0 的上下文会失败。
    pub fn from_context(gl: glow::Context) -> GpuResult<Self> {
        let version_string = unsafe { gl.get_parameter_string(glow::VERSION) };
        let version = GlVersion::parse(&version_string);
        if !version.supports_presentation() {
            return Err(GpuError::Other(format!(
                "OpenGL 3.2 / ES 3.0 required, context reports {version_string:?}"
            )));
        }
        log::debug!("GL backend on {version_string}");

        Ok(Self {
            gl,
            version,
            depth_attachments: HashMap::new(),
            mesh_buffers: HashMap::new(),
        })
    }

    /// ### English
    /// Raw glow context for host-side GL work done under the same context.
    ///
    /// ### 中文
    /// 原始 glow 上下文，供宿主在同一上下文下执行 GL 工作。
    pub fn gl(&self) -> &glow::Context {
        &self.gl
    }
}

#[inline]
fn native_texture(texture: TextureId) -> glow::NativeTexture {
    glow::NativeTexture(texture.0)
}

#[inline]
fn texture_id(texture: glow::NativeTexture) -> TextureId {
    TextureId(texture.0)
}

#[inline]
fn create_error(object: &'static str) -> impl FnOnce(String) -> GpuError {
    move |reason| GpuError::Create { object, reason }
}

#[inline]
fn gl_size(size: PhysicalSize<u32>) -> (i32, i32) {
    (
        size.width.min(i32::MAX as u32) as i32,
        size.height.min(i32::MAX as u32) as i32,
    )
}

impl FenceSync for GlowBackend {
    fn poll_fence(&mut self, fence: GpuFence) -> bool {
        self.poll_sync(fence)
    }

    fn wait_fence(&mut self, fence: GpuFence) {
        self.wait_sync(fence);
    }

    fn delete_fence(&mut self, fence: GpuFence) {
        self.delete_sync(fence);
    }
}

impl GpuBackend for GlowBackend {
    fn create_texture_rgba8(
        &mut self,
        size: PhysicalSize<u32>,
        pixels: &[u8],
    ) -> GpuResult<TextureId> {
        self.upload_rgba8(size, pixels)
    }

    fn delete_texture(&mut self, texture: TextureId) {
        unsafe { self.gl.delete_texture(native_texture(texture)) };
    }

    fn bind_texture(&mut self, texture: Option<TextureId>) {
        unsafe {
            self.gl
                .bind_texture(glow::TEXTURE_2D, texture.map(native_texture))
        };
    }

    fn create_render_target(&mut self, size: PhysicalSize<u32>) -> GpuResult<RenderTarget> {
        self.allocate_render_target(size)
    }

    fn delete_render_target(&mut self, target: RenderTarget) {
        self.release_render_target(target);
    }

    fn bind_draw_framebuffer(&mut self, framebuffer: Option<FramebufferId>) {
        unsafe {
            self.gl.bind_framebuffer(
                glow::DRAW_FRAMEBUFFER,
                framebuffer.map(|fb| glow::NativeFramebuffer(fb.0)),
            )
        };
    }

    fn blit_to_surface(
        &mut self,
        source: FramebufferId,
        source_size: PhysicalSize<u32>,
        surface_size: PhysicalSize<u32>,
    ) {
        self.blit_nearest(source, source_size, surface_size);
    }

    fn viewport(&mut self, viewport: Viewport) {
        let (x, y) = gl_size(PhysicalSize::new(viewport.x, viewport.y));
        let (width, height) = gl_size(PhysicalSize::new(viewport.width, viewport.height));
        unsafe { self.gl.viewport(x, y, width, height) };
    }

    fn clear_depth(&mut self) {
        unsafe { self.gl.clear(glow::DEPTH_BUFFER_BIT) };
    }

    fn set_blending(&mut self, enabled: bool) {
        unsafe {
            if enabled {
                self.gl.enable(glow::BLEND);
                self.gl.blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA);
            } else {
                self.gl.disable(glow::BLEND);
            }
        }
    }

    fn reset_composite_state(&mut self) {
        unsafe {
            self.gl.blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA);
            self.gl.disable(glow::BLEND);
            self.gl.disable(glow::DEPTH_TEST);
            self.gl.disable(glow::CULL_FACE);
        }
    }

    fn create_program(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> GpuResult<ProgramId> {
        self.link_program(vertex_source, fragment_source)
    }

    fn delete_program(&mut self, program: ProgramId) {
        unsafe { self.gl.delete_program(glow::NativeProgram(program.0)) };
    }

    fn use_program(&mut self, program: Option<ProgramId>) {
        unsafe {
            self.gl
                .use_program(program.map(|program| glow::NativeProgram(program.0)))
        };
    }

    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation> {
        unsafe {
            self.gl
                .get_uniform_location(glow::NativeProgram(program.0), name)
                .map(|location| UniformLocation(location.0))
        }
    }

    fn set_uniform_f32(&mut self, location: UniformLocation, value: f32) {
        let location = glow::NativeUniformLocation(location.0);
        unsafe { self.gl.uniform_1_f32(Some(&location), value) };
    }

    fn set_uniform_mat4(&mut self, location: UniformLocation, value: &Mat4) {
        let location = glow::NativeUniformLocation(location.0);
        unsafe {
            self.gl
                .uniform_matrix_4_f32_slice(Some(&location), false, value)
        };
    }

    fn create_unit_quad(&mut self) -> GpuResult<MeshId> {
        self.build_unit_quad()
    }

    fn delete_mesh(&mut self, mesh: MeshId) {
        self.release_mesh(mesh);
    }

    fn draw_unit_quad(&mut self, mesh: MeshId) {
        unsafe {
            self.gl
                .bind_vertex_array(Some(glow::NativeVertexArray(mesh.0)));
            self.gl.draw_arrays(glow::TRIANGLE_STRIP, 0, 4);
            self.gl.bind_vertex_array(None);
        }
    }

    fn insert_fence(&mut self) -> GpuResult<GpuFence> {
        self.fence_sync()
    }

    fn check_error(&mut self, operation: &'static str) -> GpuResult<()> {
        let code = unsafe { self.gl.get_error() };
        if code == glow::NO_ERROR {
            Ok(())
        } else {
            Err(GpuError::Api { operation, code })
        }
    }
}
