//! ### English
//! Texture → frame index bookkeeping for scene textures in flight.
//!
//! ### 中文
//! 在途 scene 纹理的 纹理 → 帧序号 记录。

use std::collections::HashMap;

use super::TextureId;

/// ### English
/// Maps a scene texture to the simulation frame that produced it.
///
/// An entry lives from submission until the scene recycler fires for that texture. Not
/// synchronized by itself; the display plugin keeps it behind its bookkeeping mutex.
///
/// ### 中文
/// 将 scene 纹理映射到产生它的模拟帧。
///
/// 条目从提交开始存在，直到该纹理的 scene 回收回调触发为止。自身不做同步；
/// 显示插件将其放在记账互斥锁之后。
#[derive(Debug, Default)]
pub struct FrameIndexMap {
    entries: HashMap<TextureId, u32>,
}

impl FrameIndexMap {
    /// ### English
    /// Records `frame_index` for `texture`, replacing a stale entry for a reused texture name.
    ///
    /// ### 中文
    /// 为 `texture` 记录 `frame_index`；若纹理名被复用则覆盖旧条目。
    pub fn insert(&mut self, texture: TextureId, frame_index: u32) {
        self.entries.insert(texture, frame_index);
    }

    pub fn get(&self, texture: TextureId) -> Option<u32> {
        self.entries.get(&texture).copied()
    }

    /// ### English
    /// Removes the entry for a recycled texture. Returns the removed index, if any.
    ///
    /// ### 中文
    /// 移除已回收纹理的条目，返回被移除的帧序号（若存在）。
    pub fn remove(&mut self, texture: TextureId) -> Option<u32> {
        self.entries.remove(&texture)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
