//! ### English
//! `GLsync` fences represented as `u64` handles.
//!
//! ### 中文
//! 以 `u64` 句柄表示的 `GLsync` fence。

use glow::HasContext as _;

use crate::engine::error::GpuResult;
use crate::engine::escrow::GpuFence;

use super::{GlowBackend, create_error};

#[inline]
fn native_fence(fence: GpuFence) -> glow::NativeFence {
    glow::NativeFence(fence.0 as usize as *mut _)
}

impl GlowBackend {
    /// ### English
    /// Inserts `GL_SYNC_GPU_COMMANDS_COMPLETE` and flushes so other contexts can observe it.
    ///
    /// ### 中文
    /// 插入 `GL_SYNC_GPU_COMMANDS_COMPLETE` 并 flush，使其它上下文可观察到。
    pub(super) fn fence_sync(&mut self) -> GpuResult<GpuFence> {
        unsafe {
            let sync = self
                .gl
                .fence_sync(glow::SYNC_GPU_COMMANDS_COMPLETE, 0)
                .map_err(create_error("fence"))?;
            self.gl.flush();
            Ok(GpuFence(sync.0 as usize as u64))
        }
    }

    /// ### English
    /// Zero-timeout client wait: `true` once the fence is signaled.
    ///
    /// ### 中文
    /// 零超时的客户端等待：fence 已 signal 时返回 `true`。
    pub(super) fn poll_sync(&mut self, fence: GpuFence) -> bool {
        if fence.0 == 0 {
            return true;
        }
        let status = unsafe { self.gl.client_wait_sync(native_fence(fence), 0, 0) };
        status == glow::ALREADY_SIGNALED || status == glow::CONDITION_SATISFIED
    }

    /// ### English
    /// Server-side wait: later commands on this context wait for the fence on the GPU.
    ///
    /// ### 中文
    /// 服务端等待：该上下文之后的命令在 GPU 上等待 fence。
    pub(super) fn wait_sync(&mut self, fence: GpuFence) {
        if fence.0 == 0 {
            return;
        }
        unsafe {
            self.gl
                .wait_sync(native_fence(fence), 0, glow::TIMEOUT_IGNORED)
        };
    }

    pub(super) fn delete_sync(&mut self, fence: GpuFence) {
        if fence.0 == 0 {
            return;
        }
        unsafe { self.gl.delete_sync(native_fence(fence)) };
    }
}
