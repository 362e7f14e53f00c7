//! ### English
//! Texture submission, texture updates and the present pass.
//!
//! ### 中文
//! 纹理提交、纹理更新与 present 流程。

use std::sync::atomic::Ordering;

use crate::engine::error::GpuResult;
use crate::engine::escrow::{GpuFence, TextureEscrow};
use crate::engine::frame::FrameTexture;
use crate::engine::surface::DisplaySurface;

use super::presenter::{CompositeInputs, Presenter};
use super::{OpenGlDisplayPlugin, PresentBinding};

impl OpenGlDisplayPlugin {
    /// ### English
    /// Submits a finished scene texture produced for `frame_index`.
    ///
    /// Threaded: returns immediately; the present thread picks up the latest submission.
    /// Inline: presents synchronously before returning and restores the container's context.
    ///
    /// ### 中文
    /// 提交为 `frame_index` 生成的场景纹理。
    ///
    /// 线程化：立即返回；present 线程会取走最新的提交。
    /// 内联：返回前同步呈现，并恢复容器的上下文。
    pub fn submit_scene_texture(&self, frame_index: u32, texture: FrameTexture) -> GpuResult<()> {
        self.lock_bookkeeping()
            .frame_indices
            .insert(texture.id, frame_index);
        self.scene.submit(texture);
        self.present_inline()
    }

    /// ### English
    /// Like [`Self::submit_scene_texture`], with a producer fence guarding the texture's rendering.
    ///
    /// ### 中文
    /// 同 [`Self::submit_scene_texture`]，并附带保护该纹理渲染的生产者 fence。
    pub fn submit_scene_texture_with_fence(
        &self,
        frame_index: u32,
        texture: FrameTexture,
        fence: GpuFence,
    ) -> GpuResult<()> {
        self.lock_bookkeeping()
            .frame_indices
            .insert(texture.id, frame_index);
        self.scene.submit_with_fence(texture, fence);
        self.present_inline()
    }

    /// ### English
    /// Submits the UI overlay texture. Never presents by itself.
    ///
    /// ### 中文
    /// 提交 UI overlay 纹理。自身从不触发呈现。
    pub fn submit_overlay_texture(&self, texture: FrameTexture) {
        self.overlay.submit(texture);
    }

    pub fn submit_overlay_texture_with_fence(&self, texture: FrameTexture, fence: GpuFence) {
        self.overlay.submit_with_fence(texture, fence);
    }

    fn present_inline(&self) -> GpuResult<()> {
        if !matches!(self.binding, PresentBinding::Inline) || !self.is_active() {
            return Ok(());
        }
        self.surface.make_current()?;
        let result = self.present_frame();
        self.surface.done_current();
        self.container.make_rendering_context_current();
        result
    }

    /// ### English
    /// Fetches the latest scene and overlay textures.
    ///
    /// The scene is polled on its producer fence when presenting threaded, or waited on GPU-side
    /// when inline (same command stream). The overlay is always polled.
    ///
    /// ### 中文
    /// 获取最新的场景与 overlay 纹理。
    ///
    /// 线程化呈现时轮询场景的生产者 fence；内联时（同一命令流）在 GPU 侧等待。overlay 始终轮询。
    fn update_textures(&self, presenter: &mut Presenter) {
        let skip_fences = self.config.unsafe_no_producer_fence;

        let mut scene = presenter.current_scene;
        let fetched = if skip_fences {
            self.scene.fetch_and_release(&mut scene)
        } else {
            match self.binding {
                PresentBinding::Threaded(_) => self
                    .scene
                    .fetch_signaled_and_release(&mut scene, presenter.gpu.as_mut()),
                PresentBinding::Inline => self
                    .scene
                    .fetch_and_release_with_gpu_wait(&mut scene, presenter.gpu.as_mut()),
            }
        };
        if let Some(texture) = scene.filter(|_| fetched) {
            presenter.current_scene = Some(texture);
            let mut bookkeeping = self.lock_bookkeeping();
            if let Some(frame_index) = bookkeeping.frame_indices.get(texture.id) {
                bookkeeping.current_render_frame_index = frame_index;
            }
        }

        let mut overlay = presenter.current_overlay;
        let fetched = if skip_fences {
            self.overlay.fetch_and_release(&mut overlay)
        } else {
            self.overlay
                .fetch_signaled_and_release(&mut overlay, presenter.gpu.as_mut())
        };
        if fetched {
            presenter.current_overlay = overlay;
        }

        if skip_fences {
            delete_retired(&self.scene, presenter);
            delete_retired(&self.overlay, presenter);
        }
    }

    /// ### English
    /// One present pass: update textures; without a scene texture nothing is drawn; otherwise
    /// composite, blit to the surface, swap and update the frame-rate average.
    ///
    /// ### 中文
    /// 一次 present：更新纹理；没有场景纹理则不绘制；否则合成、blit 到表面、交换缓冲并更新帧率平均值。
    pub(super) fn present_frame(&self) -> GpuResult<()> {
        self.present_count.fetch_add(1, Ordering::Relaxed);

        let mut presenter = self.lock_presenter();
        self.update_textures(&mut presenter);
        let Some(scene) = presenter.current_scene else {
            return Ok(());
        };

        let inputs = CompositeInputs {
            compositor: &*self.compositor,
            stereo: self.config.stereo,
            render_size: self.recommended_render_size(),
        };
        let result = composite_and_swap(&mut presenter, scene, &inputs, &*self.surface);
        drop(presenter);

        match result {
            Ok(()) => {
                self.update_framerate();
                self.health.record_success(&self.name);
                Ok(())
            }
            Err(err) => {
                self.health.record_failure(&self.name);
                Err(err)
            }
        }
    }

    fn update_framerate(&self) {
        let now = self.clock.now_micros();
        let mut bookkeeping = self.lock_bookkeeping();
        if let Some(last) = bookkeeping.last_present_micros.replace(now) {
            let elapsed = now.saturating_sub(last);
            if elapsed != 0 {
                bookkeeping.usecs_per_frame.update(elapsed as f64);
            }
        }
    }
}

fn delete_retired(escrow: &TextureEscrow<FrameTexture>, presenter: &mut Presenter) {
    escrow.delete_retired_fences(presenter.gpu.as_mut());
}

fn composite_and_swap(
    presenter: &mut Presenter,
    scene: FrameTexture,
    inputs: &CompositeInputs<'_>,
    surface: &dyn DisplaySurface,
) -> GpuResult<()> {
    let target = presenter.composite_layers(scene, inputs)?;
    presenter.blit_to_surface(target, surface.physical_size())?;
    surface.swap_buffers()
}
