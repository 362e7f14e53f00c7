//! ### English
//! Configuration for the present thread and display plugins.
//!
//! ### 中文
//! present 线程与显示插件的配置。

use std::time::Duration;

use dpi::PhysicalSize;

use crate::engine::flags;

/// ### English
/// Environment variable overriding the presentation mode (`threaded` or `inline`).
///
/// ### 中文
/// 覆盖呈现模式的环境变量（`threaded` 或 `inline`）。
pub const PRESENT_MODE_ENV: &str = "GL_PRESENT_MODE";

/// ### English
/// Environment variable overriding the idle poll interval in milliseconds.
///
/// ### 中文
/// 覆盖空闲轮询间隔（毫秒）的环境变量。
pub const PRESENT_IDLE_MS_ENV: &str = "GL_PRESENT_IDLE_MS";

/// ### English
/// How frames travel from submission to the display surface.
///
/// - `Threaded`: a dedicated present thread owns the context; submission returns immediately and
///   the frame becomes visible on a later loop iteration (eventually consistent).
/// - `Inline`: the submitting thread presents synchronously inside `submit_scene_texture`; the
///   frame is visible when the call returns.
///
/// The two modes intentionally keep different latency characteristics.
///
/// ### 中文
/// 帧从提交到显示表面的传递方式。
///
/// - `Threaded`：独立 present 线程持有上下文；提交立即返回，帧在之后的循环迭代中可见（最终一致）。
/// - `Inline`：提交线程在 `submit_scene_texture` 内同步呈现；调用返回时帧已可见。
///
/// 两种模式刻意保留不同的延迟特性。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PresentMode {
    Threaded,
    Inline,
}

impl PresentMode {
    /// ### English
    /// Build default: `Threaded` when the `threaded-present` feature is enabled.
    ///
    /// ### 中文
    /// 构建默认值：启用 `threaded-present` feature 时为 `Threaded`。
    pub const fn build_default() -> Self {
        if cfg!(feature = "threaded-present") {
            Self::Threaded
        } else {
            Self::Inline
        }
    }

    /// ### English
    /// Parses a mode name (`threaded` / `inline`, case-insensitive).
    ///
    /// ### 中文
    /// 解析模式名（`threaded` / `inline`，不区分大小写）。
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "threaded" | "thread" => Some(Self::Threaded),
            "inline" | "sync" => Some(Self::Inline),
            _ => None,
        }
    }

    /// ### English
    /// Reads [`PRESENT_MODE_ENV`], falling back to the build default.
    ///
    /// ### 中文
    /// 读取 [`PRESENT_MODE_ENV`]，失败时回退到构建默认值。
    pub fn from_env() -> Self {
        std::env::var(PRESENT_MODE_ENV)
            .ok()
            .and_then(|value| Self::parse(&value))
            .unwrap_or_else(Self::build_default)
    }
}

impl Default for PresentMode {
    fn default() -> Self {
        Self::build_default()
    }
}

/// ### English
/// Present thread configuration.
///
/// ### 中文
/// present 线程配置。
#[derive(Clone, Debug)]
pub struct PresentConfig {
    /// ### English
    /// How long the loop waits for a request when no plugin is bound (coalesced idle polling).
    ///
    /// ### 中文
    /// 未绑定插件时循环等待请求的时长（合并的空闲轮询）。
    pub idle_poll: Duration,
    /// ### English
    /// Upper bound for the start handshake (the thread must acquire the context in time).
    ///
    /// ### 中文
    /// 启动握手的上限（线程须在此时间内获取上下文）。
    pub start_timeout: Duration,
    /// ### English
    /// OS thread name.
    ///
    /// ### 中文
    /// 操作系统线程名。
    pub thread_name: String,
}

impl Default for PresentConfig {
    fn default() -> Self {
        Self {
            idle_poll: Duration::from_millis(1),
            start_timeout: Duration::from_secs(30),
            thread_name: "Presentation Thread".to_string(),
        }
    }
}

impl PresentConfig {
    /// ### English
    /// Default configuration with [`PRESENT_IDLE_MS_ENV`] applied when set and valid.
    ///
    /// ### 中文
    /// 默认配置；若设置了有效的 [`PRESENT_IDLE_MS_ENV`] 则应用之。
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(ms) = std::env::var(PRESENT_IDLE_MS_ENV)
            .ok()
            .and_then(|value| value.trim().parse::<u64>().ok())
        {
            config.idle_poll = Duration::from_millis(ms.max(1));
        }
        config
    }
}

/// ### English
/// Per-plugin configuration.
///
/// ### 中文
/// 每插件配置。
#[derive(Clone, Debug)]
pub struct DisplayPluginConfig {
    /// ### English
    /// Threaded or inline presentation.
    ///
    /// ### 中文
    /// 线程化或内联呈现。
    pub mode: PresentMode,
    /// ### English
    /// Split-viewport stereo compositing.
    ///
    /// ### 中文
    /// 分屏立体合成。
    pub stereo: bool,
    /// ### English
    /// Recommended render size override. `None` uses the surface's logical size.
    ///
    /// ### 中文
    /// 推荐渲染尺寸覆盖值。`None` 表示使用表面的逻辑尺寸。
    pub render_size: Option<PhysicalSize<u32>>,
    /// ### English
    /// Enable vsync during customization when the surface supports it.
    ///
    /// ### 中文
    /// 表面支持时在 customize 阶段启用 vsync。
    pub vsync: bool,
    /// ### English
    /// Unsafe mode: ignore producer fences on fetch.
    ///
    /// ### 中文
    /// 不安全模式：获取时忽略生产者 fence。
    pub unsafe_no_producer_fence: bool,
    /// ### English
    /// Sample window of the present-rate moving average.
    ///
    /// ### 中文
    /// present 速率滑动平均的样本窗口。
    pub frame_rate_samples: u32,
    /// ### English
    /// Consecutive failed presents after which the plugin reports itself degraded.
    ///
    /// ### 中文
    /// 连续失败多少次 present 后插件报告为降级状态。
    pub degraded_after_failures: u32,
}

impl Default for DisplayPluginConfig {
    fn default() -> Self {
        Self {
            mode: PresentMode::default(),
            stereo: false,
            render_size: None,
            vsync: true,
            unsafe_no_producer_fence: false,
            frame_rate_samples: 10,
            degraded_after_failures: 30,
        }
    }
}

impl DisplayPluginConfig {
    /// ### English
    /// Decodes a `DISPLAY_PLUGIN_FLAG_*` bitmask on top of the defaults.
    ///
    /// ### 中文
    /// 在默认值基础上解码 `DISPLAY_PLUGIN_FLAG_*` 位掩码。
    pub fn from_flags(plugin_flags: u32) -> Self {
        let mut config = Self {
            stereo: (plugin_flags & flags::DISPLAY_PLUGIN_FLAG_STEREO) != 0,
            vsync: (plugin_flags & flags::DISPLAY_PLUGIN_FLAG_DISABLE_VSYNC) == 0,
            unsafe_no_producer_fence: (plugin_flags
                & flags::DISPLAY_PLUGIN_FLAG_UNSAFE_NO_PRODUCER_FENCE)
                != 0,
            ..Self::default()
        };
        if (plugin_flags & flags::DISPLAY_PLUGIN_FLAG_INLINE_PRESENT) != 0 {
            config.mode = PresentMode::Inline;
        }
        config
    }
}
