//! ### English
//! Cursor glyphs: source images per cursor icon and their GPU textures.
//!
//! Images are flipped vertically on load so row 0 is the bottom row, matching GL texture space.
//!
//! ### 中文
//! 光标字形：每个光标图标的源图像及其 GPU 纹理。
//!
//! 图像在加载时做垂直翻转，使第 0 行为最底行，与 GL 纹理空间一致。

use std::collections::HashMap;

use dpi::PhysicalSize;
use image::RgbaImage;

use crate::engine::frame::TextureId;
use crate::engine::gpu::GpuBackend;

mod file_source;

pub use file_source::FileCursorSource;

/// ### English
/// Cursor icon identifier as understood by the UI layer.
///
/// ### 中文
/// UI 层所理解的光标图标标识。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CursorIcon(pub u32);

impl CursorIcon {
    pub const SYSTEM: Self = Self(0);
    pub const DEFAULT: Self = Self(1);
    pub const LINK: Self = Self(2);
}

/// ### English
/// Provider of cursor icons and their images.
///
/// ### 中文
/// 光标图标及其图像的提供者。
pub trait CursorSource: Send + Sync {
    fn registered_icons(&self) -> Vec<CursorIcon>;

    /// ### English
    /// Top-row-first RGBA image for `icon`, or `None` if it cannot be produced.
    ///
    /// ### 中文
    /// `icon` 对应的 RGBA 图像（首行为最顶行）；无法提供时返回 `None`。
    fn icon_image(&self, icon: CursorIcon) -> Option<RgbaImage>;
}

/// ### English
/// One cached cursor glyph.
///
/// ### 中文
/// 一个缓存的光标字形。
#[derive(Clone, Debug)]
pub struct CursorGlyph {
    /// ### English
    /// Mirrored (bottom-row-first) RGBA pixels.
    ///
    /// ### 中文
    /// 已镜像（最底行在前）的 RGBA 像素。
    pub image: RgbaImage,
    /// ### English
    /// Hot spot in normalized glyph coordinates.
    ///
    /// ### 中文
    /// 归一化字形坐标下的热点。
    pub hot_spot: [f32; 2],
    /// ### English
    /// GPU texture while the presentation context is customized.
    ///
    /// ### 中文
    /// presentation 上下文处于 customize 状态时的 GPU 纹理。
    pub texture: Option<TextureId>,
}

impl CursorGlyph {
    pub fn size(&self) -> PhysicalSize<u32> {
        PhysicalSize::new(self.image.width(), self.image.height())
    }
}

/// ### English
/// Cursor icon → glyph map built at activation.
///
/// ### 中文
/// 在激活时构建的 光标图标 → 字形 映射。
#[derive(Debug, Default)]
pub struct CursorGlyphCache {
    glyphs: HashMap<CursorIcon, CursorGlyph>,
}

impl CursorGlyphCache {
    /// ### English
    /// Loads every registered icon; icons without an image are skipped.
    ///
    /// ### 中文
    /// 加载所有已注册图标；没有图像的图标会被跳过。
    pub fn load(source: &dyn CursorSource) -> Self {
        let mut glyphs = HashMap::new();
        for icon in source.registered_icons() {
            let Some(image) = source.icon_image(icon) else {
                log::warn!("cursor icon {icon:?} has no image; skipped");
                continue;
            };
            glyphs.insert(
                icon,
                CursorGlyph {
                    image: image::imageops::flip_vertical(&image),
                    hot_spot: [0.5, 0.5],
                    texture: None,
                },
            );
        }
        Self { glyphs }
    }

    /// ### English
    /// Uploads a mipmapped texture for every glyph that has none. Failures are logged and the
    /// glyph stays texture-less (its cursor is then not drawn).
    ///
    /// ### 中文
    /// 为每个尚无纹理的字形上传带 mipmap 的纹理。失败会被记录，字形保持无纹理（对应光标不绘制）。
    pub fn upload(&mut self, gpu: &mut dyn GpuBackend) {
        for (icon, glyph) in &mut self.glyphs {
            if glyph.texture.is_some() {
                continue;
            }
            match gpu.create_texture_rgba8(glyph.size(), glyph.image.as_raw()) {
                Ok(texture) => glyph.texture = Some(texture),
                Err(err) => log::warn!("cursor icon {icon:?}: texture upload failed: {err}"),
            }
        }
    }

    /// ### English
    /// Deletes all glyph textures; the images stay cached for the next upload.
    ///
    /// ### 中文
    /// 删除所有字形纹理；图像仍缓存以便下次上传。
    pub fn release(&mut self, gpu: &mut dyn GpuBackend) {
        for glyph in self.glyphs.values_mut() {
            if let Some(texture) = glyph.texture.take() {
                gpu.delete_texture(texture);
            }
        }
    }

    #[inline]
    pub fn texture(&self, icon: CursorIcon) -> Option<TextureId> {
        self.glyphs.get(&icon).and_then(|glyph| glyph.texture)
    }

    #[inline]
    pub fn glyph(&self, icon: CursorIcon) -> Option<&CursorGlyph> {
        self.glyphs.get(&icon)
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use image::Rgba;

    use super::*;

    struct TwoRowSource;

    impl CursorSource for TwoRowSource {
        fn registered_icons(&self) -> Vec<CursorIcon> {
            vec![CursorIcon::DEFAULT, CursorIcon::LINK]
        }

        fn icon_image(&self, icon: CursorIcon) -> Option<RgbaImage> {
            (icon == CursorIcon::DEFAULT).then(|| {
                RgbaImage::from_fn(1, 2, |_, y| {
                    if y == 0 {
                        Rgba([255, 0, 0, 255])
                    } else {
                        Rgba([0, 0, 255, 255])
                    }
                })
            })
        }
    }

    #[test]
    fn load_mirrors_and_skips_missing_images() {
        let cache = CursorGlyphCache::load(&TwoRowSource);
        assert_eq!(cache.len(), 1);
        assert!(cache.glyph(CursorIcon::LINK).is_none());

        let glyph = cache.glyph(CursorIcon::DEFAULT).expect("default glyph");
        assert_eq!(glyph.size(), PhysicalSize::new(1, 2));
        assert_eq!(glyph.hot_spot, [0.5, 0.5]);
        assert_eq!(glyph.image.get_pixel(0, 0), &Rgba([0, 0, 255, 255]));
        assert_eq!(glyph.image.get_pixel(0, 1), &Rgba([255, 0, 0, 255]));
        assert_eq!(cache.texture(CursorIcon::DEFAULT), None);
    }
}
