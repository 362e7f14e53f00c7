//! ### English
//! Error types for the GPU boundary and the presentation service.
//!
//! GPU failures are per-call status values; the present loop branches on them and logs instead of
//! unwinding, so one bad frame never wedges presentation.
//!
//! ### 中文
//! GPU 边界与呈现服务的错误类型。
//!
//! GPU 失败以逐调用的状态值返回；present 循环据此分支并记录日志，而非展开栈，
//! 因此单个坏帧不会卡死呈现管线。

use std::time::Duration;

use thiserror::Error;

/// ### English
/// Result alias used at the GPU-backend boundary.
///
/// ### 中文
/// GPU 后端边界使用的 Result 别名。
pub type GpuResult<T> = Result<T, GpuError>;

/// ### English
/// Failure reported by a GPU backend or display surface call.
///
/// ### 中文
/// GPU 后端或显示表面调用报告的失败。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GpuError {
    /// ### English
    /// Object creation failed (texture, framebuffer, program, fence...).
    ///
    /// ### 中文
    /// 对象创建失败（纹理、framebuffer、program、fence 等）。
    #[error("failed to create {object}: {reason}")]
    Create {
        object: &'static str,
        reason: String,
    },
    /// ### English
    /// Shader compilation or program linking failed.
    ///
    /// ### 中文
    /// 着色器编译或 program 链接失败。
    #[error("shader program error: {0}")]
    Shader(String),
    /// ### English
    /// Framebuffer is incomplete after attaching storage.
    ///
    /// ### 中文
    /// 绑定存储后 framebuffer 不完整。
    #[error("framebuffer incomplete (status 0x{0:04x})")]
    IncompleteFramebuffer(u32),
    /// ### English
    /// The API error flag was raised by a preceding call.
    ///
    /// ### 中文
    /// 之前的调用触发了 API 错误标记。
    #[error("GL error 0x{code:04x} during {operation}")]
    Api { operation: &'static str, code: u32 },
    /// ### English
    /// The GPU context could not be made current on the calling thread.
    ///
    /// ### 中文
    /// 无法在调用线程上使 GPU 上下文成为 current。
    #[error("failed to make context current: {0}")]
    MakeCurrent(String),
    /// ### English
    /// Anything else reported by a surface or backend implementation.
    ///
    /// ### 中文
    /// surface 或后端实现报告的其它错误。
    #[error("{0}")]
    Other(String),
}

/// ### English
/// Failure of the presentation service itself (thread lifecycle, rendezvous).
///
/// ### 中文
/// 呈现服务本身的失败（线程生命周期、会合）。
#[derive(Debug, Error)]
pub enum PresentError {
    #[error("failed to spawn present thread: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("present thread failed to initialize: {0}")]
    Init(GpuError),
    #[error("timed out after {0:?} waiting for the present thread")]
    StartTimeout(Duration),
    /// ### English
    /// The present thread exited (or panicked) while a request was outstanding.
    ///
    /// ### 中文
    /// 在请求未完成时 present 线程已退出（或 panic）。
    #[error("present thread is gone")]
    ThreadGone,
    #[error("present thread is shut down")]
    ShutDown,
    /// ### English
    /// Threaded presentation was configured without a present thread.
    ///
    /// ### 中文
    /// 配置了线程化呈现却未提供 present 线程。
    #[error("threaded presentation requires a present thread")]
    NoPresentThread,
    /// ### English
    /// A GPU call made on behalf of the caller failed.
    ///
    /// ### 中文
    /// 代表调用方执行的 GPU 调用失败。
    #[error(transparent)]
    Gpu(#[from] GpuError),
}
