//! ### English
//! GPU boundary: the opaque capabilities the presentation core needs from a graphics API.
//!
//! Object creation is fallible and returns [`GpuResult`]; state changes and draws are fire-and-forget
//! (as in GL) and failures surface through [`GpuBackend::check_error`] at the end of a pass.
//!
//! ### 中文
//! GPU 边界：呈现核心对图形 API 所需的不透明能力。
//!
//! 对象创建可失败并返回 [`GpuResult`]；状态切换与绘制为“发出即忘”（与 GL 一致），
//! 失败通过一轮结束时的 [`GpuBackend::check_error`] 暴露。

use std::num::NonZeroU32;

use dpi::PhysicalSize;

use crate::engine::error::GpuResult;
use crate::engine::escrow::{FenceSync, GpuFence};
use crate::engine::frame::TextureId;

mod glow_backend;
mod shaders;

pub use glow_backend::GlowBackend;
pub use shaders::{ALPHA_UNIFORM, MVP_UNIFORM, QUAD_FRAGMENT_SHADER, QUAD_VERTEX_SHADER};

/// ### English
/// Column-major 4x4 matrix.
///
/// ### 中文
/// 列主序 4x4 矩阵。
pub type Mat4 = [f32; 16];

pub const MAT4_IDENTITY: Mat4 = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FramebufferId(pub NonZeroU32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ProgramId(pub NonZeroU32);

/// ### English
/// Vertex input bound for one mesh (a vertex array object in GL).
///
/// ### 中文
/// 单个网格的顶点输入绑定（GL 中为 VAO）。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshId(pub NonZeroU32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UniformLocation(pub u32);

/// ### English
/// Off-screen render target: framebuffer with a color texture and a depth attachment.
///
/// ### 中文
/// 离屏渲染目标：带颜色纹理与深度附件的 framebuffer。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderTarget {
    pub framebuffer: FramebufferId,
    pub color: TextureId,
    pub size: PhysicalSize<u32>,
}

/// ### English
/// Viewport rectangle in framebuffer pixels.
///
/// ### 中文
/// framebuffer 像素坐标下的视口矩形。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// ### English
    /// Viewport covering the whole target.
    ///
    /// ### 中文
    /// 覆盖整个目标的视口。
    pub fn full(size: PhysicalSize<u32>) -> Self {
        Self {
            x: 0,
            y: 0,
            width: size.width,
            height: size.height,
        }
    }
}

/// ### English
/// GPU operations used by the display plugin. Every call runs on the thread that currently owns
/// the GPU context (present thread, or the application thread inside a rendezvous / inline mode).
///
/// `Send` because ownership of the backend migrates with the context between those threads.
///
/// ### 中文
/// 显示插件使用的 GPU 操作。所有调用都在当前持有 GPU 上下文的线程上执行
/// （present 线程，或会合期间/内联模式下的应用线程）。
///
/// 需要 `Send`，因为后端的所有权会随上下文在这些线程之间迁移。
pub trait GpuBackend: FenceSync + Send {
    /// ### English
    /// Uploads an RGBA8 image as a mipmapped texture (nearest magnification, trilinear minification).
    ///
    /// ### 中文
    /// 将 RGBA8 图像上传为带 mipmap 的纹理（放大 nearest，缩小三线性）。
    fn create_texture_rgba8(
        &mut self,
        size: PhysicalSize<u32>,
        pixels: &[u8],
    ) -> GpuResult<TextureId>;
    fn delete_texture(&mut self, texture: TextureId);
    fn bind_texture(&mut self, texture: Option<TextureId>);

    /// ### English
    /// Allocates an off-screen render target of `size`.
    ///
    /// ### 中文
    /// 分配尺寸为 `size` 的离屏渲染目标。
    fn create_render_target(&mut self, size: PhysicalSize<u32>) -> GpuResult<RenderTarget>;
    fn delete_render_target(&mut self, target: RenderTarget);
    /// ### English
    /// Binds `framebuffer` as draw target; `None` selects the display surface.
    ///
    /// ### 中文
    /// 将 `framebuffer` 绑定为绘制目标；`None` 表示显示表面。
    fn bind_draw_framebuffer(&mut self, framebuffer: Option<FramebufferId>);
    /// ### English
    /// Copies the color buffer of `source` onto the display surface with nearest filtering,
    /// scaling `source_size` to `surface_size`.
    ///
    /// ### 中文
    /// 以 nearest 过滤将 `source` 的颜色缓冲复制到显示表面，并从 `source_size` 缩放到 `surface_size`。
    fn blit_to_surface(
        &mut self,
        source: FramebufferId,
        source_size: PhysicalSize<u32>,
        surface_size: PhysicalSize<u32>,
    );

    fn viewport(&mut self, viewport: Viewport);
    fn clear_depth(&mut self);
    /// ### English
    /// Enables or disables source-alpha blending.
    ///
    /// ### 中文
    /// 启用或关闭 source-alpha 混合。
    fn set_blending(&mut self, enabled: bool);
    /// ### English
    /// Resets fixed-function state for compositing (blend func set, blend/depth/cull disabled).
    ///
    /// ### 中文
    /// 为合成重置固定管线状态（设置混合函数，关闭混合/深度/剔除）。
    fn reset_composite_state(&mut self);

    /// ### English
    /// Compiles and links a program. Sources carry no `#version` line; the backend adds one.
    ///
    /// ### 中文
    /// 编译并链接 program。源码不含 `#version` 行，由后端补充。
    fn create_program(&mut self, vertex_source: &str, fragment_source: &str)
    -> GpuResult<ProgramId>;
    fn delete_program(&mut self, program: ProgramId);
    fn use_program(&mut self, program: Option<ProgramId>);
    fn uniform_location(&mut self, program: ProgramId, name: &str) -> Option<UniformLocation>;
    fn set_uniform_f32(&mut self, location: UniformLocation, value: f32);
    fn set_uniform_mat4(&mut self, location: UniformLocation, value: &Mat4);

    /// ### English
    /// Creates the unit quad (two triangles covering clip space, with texture coordinates).
    ///
    /// ### 中文
    /// 创建单位四边形（覆盖裁剪空间的两个三角形，带纹理坐标）。
    fn create_unit_quad(&mut self) -> GpuResult<MeshId>;
    fn delete_mesh(&mut self, mesh: MeshId);
    fn draw_unit_quad(&mut self, mesh: MeshId);

    /// ### English
    /// Inserts a fence after all commands issued so far (producer side).
    ///
    /// ### 中文
    /// 在目前已发出的所有命令之后插入 fence（生产者侧）。
    fn insert_fence(&mut self) -> GpuResult<GpuFence>;

    /// ### English
    /// Returns the first pending API error, attributing it to `operation`.
    ///
    /// ### 中文
    /// 返回第一个待处理的 API 错误，并归因到 `operation`。
    fn check_error(&mut self, operation: &'static str) -> GpuResult<()>;
}
