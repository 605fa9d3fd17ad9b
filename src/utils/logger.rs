// ============================================================================
// ezbuild - 日志工具
// ============================================================================
//
// 文件: src/utils/logger.rs
// 职责: 面向用户的日志输出和格式化工具
// 边界:
//   - ✅ 日志级别标签与颜色
//   - ✅ 控制台输出控制
//   - ✅ 诊断日志（tracing）初始化
//   - ❌ 不应包含业务逻辑
//   - ❌ 不应包含文件日志写入
//
// ============================================================================

use colored::Colorize;
use tracing_subscriber::EnvFilter;

use super::constants::{icons, APP_TAG};

/// 简单的日志工具
pub struct Logger;

impl Logger {
    /// 初始化颜色输出与诊断日志
    pub fn init(verbose: bool, colored: bool) {
        let colored = colored && atty::is(atty::Stream::Stdout);
        colored::control::set_override(colored);

        let default_level = if verbose { "ezbuild=debug" } else { "warn" };
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_level));
        // 重复初始化（例如测试中）时忽略
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_ansi(colored)
            .try_init();
    }

    pub fn info<S: AsRef<str>>(msg: S) {
        println!("{} {}", APP_TAG.cyan(), msg.as_ref());
    }

    pub fn warn<S: AsRef<str>>(msg: S) {
        println!("{} {}", "[WARN]".yellow(), msg.as_ref());
    }

    pub fn error<S: AsRef<str>>(msg: S) {
        eprintln!("{} {}", "[ERROR]".red(), msg.as_ref());
    }

    pub fn success<S: AsRef<str>>(msg: S) {
        println!("{} {}", icons::SUCCESS.green(), msg.as_ref());
    }

    pub fn failure<S: AsRef<str>>(msg: S) {
        eprintln!("{} {}", icons::ERROR.red(), msg.as_ref());
    }

    pub fn skip<S: AsRef<str>>(msg: S) {
        println!("{} {}", icons::SKIP.dimmed(), msg.as_ref());
    }
}
