use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// ### English
/// Degraded-health tracking. GPU failures never stop presentation, but a failed customization
/// or a run of failed presents is surfaced here and logged once per transition.
///
/// ### 中文
/// 降级健康状态跟踪。GPU 失败不会停止呈现，但 customize 失败或连续的 present 失败会在此暴露，
/// 并在每次状态转换时记录一次日志。
#[derive(Debug)]
pub(super) struct Health {
    consecutive_failures: AtomicU32,
    degraded: AtomicBool,
    threshold: u32,
}

impl Health {
    pub(super) fn new(threshold: u32) -> Self {
        Self {
            consecutive_failures: AtomicU32::new(0),
            degraded: AtomicBool::new(false),
            threshold: threshold.max(1),
        }
    }

    #[inline]
    pub(super) fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Acquire)
    }

    pub(super) fn record_success(&self, plugin: &str) {
        self.consecutive_failures.store(0, Ordering::Relaxed);
        if self.degraded.swap(false, Ordering::AcqRel) {
            log::info!("display plugin {plugin} recovered");
        }
    }

    pub(super) fn record_failure(&self, plugin: &str) {
        let failures = self
            .consecutive_failures
            .fetch_add(1, Ordering::Relaxed)
            .saturating_add(1);
        if failures >= self.threshold {
            self.mark_degraded(plugin, "repeated present failures");
        }
    }

    pub(super) fn mark_degraded(&self, plugin: &str, reason: &str) {
        if !self.degraded.swap(true, Ordering::AcqRel) {
            log::warn!("display plugin {plugin} degraded: {reason}");
        }
    }
}
