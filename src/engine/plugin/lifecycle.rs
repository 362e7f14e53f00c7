//! ### English
//! Activation and context customization.
//!
//! ### 中文
//! 激活与上下文 customize。

use std::sync::Arc;
use std::sync::atomic::Ordering;

use crate::engine::cursor::CursorGlyphCache;
use crate::engine::error::{GpuResult, PresentError};
use crate::engine::present::PresentPlugin;

use super::{OpenGlDisplayPlugin, PresentBinding};

impl OpenGlDisplayPlugin {
    /// ### English
    /// Loads cursor glyphs, queries vsync support, then binds the plugin to the present thread
    /// (threaded) or customizes the context on the calling thread (inline).
    ///
    /// Activating an active plugin is a no-op. A failed customization does not fail activation;
    /// the plugin reports itself degraded instead (see [`Self::is_degraded`]).
    ///
    /// ### 中文
    /// 加载光标字形、查询 vsync 支持，然后将插件绑定到 present 线程（线程化），
    /// 或在调用线程上 customize 上下文（内联）。
    ///
    /// 对已激活插件再次激活为空操作。customize 失败不会导致激活失败；
    /// 插件会报告降级状态（见 [`Self::is_degraded`]）。
    pub fn activate(self: &Arc<Self>) -> Result<(), PresentError> {
        if self.active.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        self.lock_presenter().cursors = CursorGlyphCache::load(&*self.cursor_source);
        self.vsync_supported
            .store(self.surface.is_vsync_supported(), Ordering::Release);

        let result = match &self.binding {
            PresentBinding::Threaded(thread) => {
                let plugin: Arc<dyn PresentPlugin> = self.clone();
                thread.set_display_plugin(Some(plugin))
            }
            PresentBinding::Inline => self.customize_inline(),
        };
        match result {
            Ok(()) => {
                log::info!("activated display plugin {}", self.name);
                Ok(())
            }
            Err(err) => {
                self.active.store(false, Ordering::Release);
                Err(err)
            }
        }
    }

    fn customize_inline(&self) -> Result<(), PresentError> {
        self.surface.make_current()?;
        if let Err(err) = self.customize() {
            log::warn!("failed to customize display plugin {}: {err}", self.name);
        }
        self.surface.done_current();
        self.container.make_rendering_context_current();
        Ok(())
    }

    /// ### English
    /// Unbinds the plugin (threaded: the present thread switches to no plugin) or uncustomizes
    /// inline. Pending and current textures go back to the container.
    ///
    /// ### 中文
    /// 解绑插件（线程化：present 线程切换为无插件）或以内联方式 uncustomize。
    /// 待取与当前纹理归还给容器。
    pub fn deactivate(&self) -> Result<(), PresentError> {
        if !self.active.swap(false, Ordering::AcqRel) {
            return Ok(());
        }

        let result = match &self.binding {
            PresentBinding::Threaded(thread) => thread.set_display_plugin(None),
            PresentBinding::Inline => match self.surface.make_current() {
                Ok(()) => {
                    self.uncustomize();
                    self.surface.done_current();
                    self.container.make_rendering_context_current();
                    Ok(())
                }
                Err(err) => {
                    // Without the context GPU objects cannot be deleted; textures still go back.
                    self.scene.drain();
                    self.overlay.drain();
                    Err(err.into())
                }
            },
        };
        log::info!("deactivated display plugin {}", self.name);
        result
    }

    /// ### English
    /// Creates the plugin's GPU resources. Requires the presentation context to be current.
    ///
    /// ### 中文
    /// 创建插件的 GPU 资源。要求呈现上下文为 current。
    pub(super) fn customize(&self) -> GpuResult<()> {
        if self.config.vsync && self.vsync_supported.load(Ordering::Acquire) {
            self.surface.set_vsync(true);
        }
        let render_size = self.recommended_render_size();
        let result = self.lock_presenter().customize(render_size);
        if let Err(err) = &result {
            self.health
                .mark_degraded(&self.name, &format!("customize failed: {err}"));
        }
        result
    }

    /// ### English
    /// Releases GPU resources and returns every held texture to the container. Requires the
    /// presentation context to be current.
    ///
    /// Also runs when the present thread swaps this plugin out for another one, so the plugin
    /// is marked inactive here and a later [`Self::activate`] binds it again.
    ///
    /// ### 中文
    /// 释放 GPU 资源并将持有的所有纹理归还容器。要求呈现上下文为 current。
    ///
    /// present 线程将本插件换成其它插件时也会调用，因此在此标记为未激活，
    /// 之后的 [`Self::activate`] 会重新绑定。
    pub(super) fn uncustomize(&self) {
        self.active.store(false, Ordering::Release);
        let mut presenter = self.lock_presenter();
        presenter.release();
        presenter.current_scene = None;
        presenter.current_overlay = None;

        self.scene.drain();
        self.overlay.drain();
        self.scene.delete_retired_fences(presenter.gpu.as_mut());
        self.overlay.delete_retired_fences(presenter.gpu.as_mut());
    }
}
