/// ### English
/// `gl_display_present` crate root.
/// Exposes the presentation core via `engine`; frequently used types are re-exported here.
///
/// ### 中文
/// `gl_display_present` 的 crate 根。
/// 通过 `engine` 暴露呈现核心；常用类型在此重新导出。
pub mod engine;

pub use engine::config::{DisplayPluginConfig, PresentConfig, PresentMode};
pub use engine::error::{GpuError, GpuResult, PresentError};
pub use engine::escrow::TextureEscrow;
pub use engine::frame::{FrameTexture, TextureId};
pub use engine::plugin::{OpenGlDisplayPlugin, OpenGlDisplayPluginInit, PluginContainer, TexturePool};
pub use engine::present::{PresentPlugin, PresentState, PresentThread};
