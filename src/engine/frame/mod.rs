//! ### English
//! Frame textures exchanged between the submitting thread and the presenter.
//!
//! ### 中文
//! 在提交线程与呈现方之间交换的帧纹理。

use std::num::NonZeroU32;

use dpi::PhysicalSize;

mod index_map;

pub use index_map::FrameIndexMap;

/// ### English
/// Opaque GPU texture name (non-zero GL texture ID).
///
/// ### 中文
/// 不透明的 GPU 纹理名（非 0 的 GL 纹理 ID）。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub NonZeroU32);

impl TextureId {
    /// ### English
    /// Wraps a raw GL texture name; returns `None` for 0 (the GL "no texture" name).
    ///
    /// ### 中文
    /// 封装原始 GL 纹理名；0（GL 的“无纹理”）返回 `None`。
    #[inline]
    pub fn new(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Self)
    }

    #[inline]
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

/// ### English
/// One GPU-resident texture handed through an escrow.
///
/// Identity is the texture name: two `FrameTexture`s with the same `id` are the same instance.
///
/// ### 中文
/// 经由 escrow 传递的一张 GPU 常驻纹理。
///
/// 身份由纹理名决定：`id` 相同的两个 `FrameTexture` 视为同一实例。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameTexture {
    /// ### English
    /// GL texture name.
    ///
    /// ### 中文
    /// GL 纹理名。
    pub id: TextureId,
    /// ### English
    /// Texture size in pixels.
    ///
    /// ### 中文
    /// 纹理尺寸（像素）。
    pub size: PhysicalSize<u32>,
}

impl FrameTexture {
    #[inline]
    pub fn new(id: TextureId, size: PhysicalSize<u32>) -> Self {
        Self { id, size }
    }
}
