use std::sync::{Mutex, MutexGuard, PoisonError};

use dpi::PhysicalSize;

use crate::engine::frame::FrameTexture;

use super::PluginContainer;

/// ### English
/// Free list of released frame textures, reusable by size. A minimal [`PluginContainer`] for
/// hosts that have no texture management of their own.
///
/// ### 中文
/// 已释放帧纹理的空闲列表，按尺寸复用。为没有自有纹理管理的宿主提供的最简 [`PluginContainer`]。
pub struct TexturePool {
    free: Mutex<Vec<FrameTexture>>,
    /// ### English
    /// Restores the host's own rendering context after an inline present.
    ///
    /// ### 中文
    /// 内联呈现后恢复宿主自身的渲染上下文。
    restore_context: Option<Box<dyn Fn() + Send + Sync>>,
}

impl TexturePool {
    pub fn new() -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            restore_context: None,
        }
    }

    pub fn with_context_restorer(restore: impl Fn() + Send + Sync + 'static) -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            restore_context: Some(Box::new(restore)),
        }
    }

    #[inline]
    fn lock(&self) -> MutexGuard<'_, Vec<FrameTexture>> {
        self.free.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// ### English
    /// Takes a released texture of exactly `size`, if any.
    ///
    /// ### 中文
    /// 取出一个尺寸恰为 `size` 的已释放纹理（若有）。
    pub fn acquire(&self, size: PhysicalSize<u32>) -> Option<FrameTexture> {
        let mut free = self.lock();
        let position = free.iter().position(|texture| texture.size == size)?;
        Some(free.swap_remove(position))
    }

    pub fn release(&self, texture: FrameTexture) {
        let mut free = self.lock();
        if free.contains(&texture) {
            log::warn!("texture {:?} released twice", texture.id);
            return;
        }
        free.push(texture);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl Default for TexturePool {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginContainer for TexturePool {
    fn release_scene_texture(&self, texture: FrameTexture) {
        self.release(texture);
    }

    fn release_overlay_texture(&self, texture: FrameTexture) {
        self.release(texture);
    }

    fn make_rendering_context_current(&self) {
        if let Some(restore) = &self.restore_context {
            restore();
        }
    }
}
