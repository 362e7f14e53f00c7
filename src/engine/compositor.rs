//! ### English
//! UI-state collaborator consulted while compositing the overlay and cursor.
//!
//! ### 中文
//! 合成 overlay 与光标时查询的 UI 状态协作者。

use crate::engine::cursor::CursorIcon;
use crate::engine::gpu::Mat4;

/// ### English
/// Read-only view of the UI compositor state. Queried from the present thread once per frame.
///
/// ### 中文
/// UI 合成器状态的只读视图。每帧由 present 线程查询一次。
pub trait CompositorState: Send + Sync {
    /// ### English
    /// Overlay opacity in `[0, 1]`. `<= 0` skips overlay and cursor entirely.
    ///
    /// ### 中文
    /// overlay 不透明度，范围 `[0, 1]`。`<= 0` 时完全跳过 overlay 与光标。
    fn overlay_alpha(&self) -> f32;

    fn reticle_visible(&self) -> bool;

    /// ### English
    /// Cursor sprite transform, derived from `eye_transform` (identity for the mono pass).
    ///
    /// ### 中文
    /// 光标精灵变换，由 `eye_transform` 推导（单目时为单位矩阵）。
    fn reticle_transform(&self, eye_transform: &Mat4) -> Mat4;

    fn current_cursor_icon(&self) -> CursorIcon;
}
