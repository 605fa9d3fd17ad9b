// ============================================================================
// ezbuild - Spinner 加载动画组件
// ============================================================================
//
// 文件: src/utils/spinner.rs
// 职责: 终端加载动画显示组件
// 边界:
//   - ✅ 加载动画显示和控制
//   - ✅ 非终端环境下静默
//   - ❌ 不应包含业务逻辑
//
// ============================================================================

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::utils::constants::spinner_chars;

/// Spinner 加载动画组件
pub struct Spinner {
    message: String,
    enabled: bool,
    bar: Option<ProgressBar>,
}

impl Spinner {
    /// 创建新的 Spinner；`enabled` 为 false 或 stdout 不是终端时不显示
    pub fn new(message: impl Into<String>, enabled: bool) -> Self {
        Self {
            message: message.into(),
            enabled: enabled && atty::is(atty::Stream::Stdout),
            bar: None,
        }
    }

    /// 启动 Spinner
    pub fn start(&mut self) {
        if !self.enabled || self.bar.is_some() {
            return;
        }

        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars(spinner_chars::TICKS);
        let bar = ProgressBar::new_spinner().with_style(style);
        bar.set_message(self.message.clone());
        bar.enable_steady_tick(Duration::from_millis(100));
        self.bar = Some(bar);
    }

    /// 停止 Spinner
    pub fn stop(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.stop();
    }
}
