//! ### English
//! Textures, off-screen render targets and the final blit.
//!
//! ### 中文
//! 纹理、离屏渲染目标与最终 blit。

use dpi::PhysicalSize;
use glow::HasContext as _;

use crate::engine::error::{GpuError, GpuResult};
use crate::engine::frame::TextureId;
use crate::engine::gpu::{FramebufferId, RenderTarget};

use super::{GlowBackend, create_error, gl_size, native_texture, texture_id};

impl GlowBackend {
    /// ### English
    /// Uploads an RGBA8 image with mipmaps (cursor glyphs).
    ///
    /// #### Parameters
    /// - `size`: Image size in pixels.
    /// - `pixels`: Tightly packed RGBA8 rows, bottom row first.
    ///
    /// ### 中文
    /// 上传带 mipmap 的 RGBA8 图像（光标字形）。
    ///
    /// #### 参数
    /// - `size`：图像尺寸（像素）。
    /// - `pixels`：紧密排列的 RGBA8 行数据，最底行在前。
    pub(super) fn upload_rgba8(
        &mut self,
        size: PhysicalSize<u32>,
        pixels: &[u8],
    ) -> GpuResult<TextureId> {
        let expected = size.width as usize * size.height as usize * 4;
        if pixels.len() != expected {
            return Err(GpuError::Create {
                object: "texture",
                reason: format!("expected {expected} bytes of RGBA8, got {}", pixels.len()),
            });
        }

        let (width, height) = gl_size(size);
        let gl = &self.gl;
        unsafe {
            let texture = gl.create_texture().map_err(create_error("texture"))?;
            gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA8 as i32,
                width,
                height,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(Some(pixels)),
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MAG_FILTER,
                glow::NEAREST as i32,
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                glow::LINEAR_MIPMAP_LINEAR as i32,
            );
            gl.generate_mipmap(glow::TEXTURE_2D);
            gl.bind_texture(glow::TEXTURE_2D, None);
            Ok(texture_id(texture))
        }
    }

    /// ### English
    /// Creates a framebuffer with an RGBA8 color texture and a 24-bit depth renderbuffer.
    ///
    /// ### 中文
    /// 创建带 RGBA8 颜色纹理与 24 位深度 renderbuffer 的 framebuffer。
    pub(super) fn allocate_render_target(
        &mut self,
        size: PhysicalSize<u32>,
    ) -> GpuResult<RenderTarget> {
        let size = PhysicalSize::new(size.width.max(1), size.height.max(1));
        let (width, height) = gl_size(size);
        let gl = &self.gl;

        unsafe {
            let framebuffer = gl
                .create_framebuffer()
                .map_err(create_error("framebuffer"))?;
            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(framebuffer));

            let color = match gl.create_texture() {
                Ok(color) => color,
                Err(reason) => {
                    gl.bind_framebuffer(glow::FRAMEBUFFER, None);
                    gl.delete_framebuffer(framebuffer);
                    return Err(create_error("color attachment")(reason));
                }
            };
            gl.bind_texture(glow::TEXTURE_2D, Some(color));
            gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA8 as i32,
                width,
                height,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(None),
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MAG_FILTER,
                glow::LINEAR as i32,
            );
            gl.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                glow::LINEAR as i32,
            );
            gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                glow::TEXTURE_2D,
                Some(color),
                0,
            );
            gl.bind_texture(glow::TEXTURE_2D, None);

            let depth = match gl.create_renderbuffer() {
                Ok(depth) => depth,
                Err(reason) => {
                    gl.bind_framebuffer(glow::FRAMEBUFFER, None);
                    gl.delete_texture(color);
                    gl.delete_framebuffer(framebuffer);
                    return Err(create_error("depth attachment")(reason));
                }
            };
            gl.bind_renderbuffer(glow::RENDERBUFFER, Some(depth));
            gl.renderbuffer_storage(glow::RENDERBUFFER, glow::DEPTH_COMPONENT24, width, height);
            gl.bind_renderbuffer(glow::RENDERBUFFER, None);
            gl.framebuffer_renderbuffer(
                glow::FRAMEBUFFER,
                glow::DEPTH_ATTACHMENT,
                glow::RENDERBUFFER,
                Some(depth),
            );

            let status = gl.check_framebuffer_status(glow::FRAMEBUFFER);
            gl.bind_framebuffer(glow::FRAMEBUFFER, None);
            if status != glow::FRAMEBUFFER_COMPLETE {
                gl.delete_renderbuffer(depth);
                gl.delete_texture(color);
                gl.delete_framebuffer(framebuffer);
                return Err(GpuError::IncompleteFramebuffer(status));
            }

            let id = FramebufferId(framebuffer.0);
            self.depth_attachments.insert(id, depth);
            Ok(RenderTarget {
                framebuffer: id,
                color: texture_id(color),
                size,
            })
        }
    }

    /// ### English
    /// Deletes a render target and its attachments.
    ///
    /// ### 中文
    /// 删除渲染目标及其附件。
    pub(super) fn release_render_target(&mut self, target: RenderTarget) {
        let depth = self.depth_attachments.remove(&target.framebuffer);
        let gl = &self.gl;
        unsafe {
            if let Some(depth) = depth {
                gl.delete_renderbuffer(depth);
            }
            gl.delete_texture(native_texture(target.color));
            gl.delete_framebuffer(glow::NativeFramebuffer(target.framebuffer.0));
        }
    }

    /// ### English
    /// Blits `source` onto the default framebuffer (the display surface) with nearest filtering.
    ///
    /// ### 中文
    /// 以 nearest 过滤将 `source` blit 到默认 framebuffer（显示表面）。
    pub(super) fn blit_nearest(
        &mut self,
        source: FramebufferId,
        source_size: PhysicalSize<u32>,
        surface_size: PhysicalSize<u32>,
    ) {
        let (src_width, src_height) = gl_size(source_size);
        let (dst_width, dst_height) = gl_size(surface_size);
        let gl = &self.gl;
        unsafe {
            gl.bind_framebuffer(
                glow::READ_FRAMEBUFFER,
                Some(glow::NativeFramebuffer(source.0)),
            );
            gl.bind_framebuffer(glow::DRAW_FRAMEBUFFER, None);
            gl.blit_framebuffer(
                0,
                0,
                src_width,
                src_height,
                0,
                0,
                dst_width,
                dst_height,
                glow::COLOR_BUFFER_BIT,
                glow::NEAREST,
            );
            gl.bind_framebuffer(glow::READ_FRAMEBUFFER, None);
        }
    }
}
