// ============================================================================
// ezbuild - 构建命令处理
// ============================================================================
//
// 文件: src/cli/build.rs
// 职责: 处理 build 与 watch 命令
// 边界:
//   - ✅ 构建命令参数解析
//   - ✅ 轮询监听循环与 Ctrl-C 退出
//   - ✅ 构建结果输出
//   - ❌ 不应包含打包命令拼装
//
// ============================================================================

use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use tracing::debug;

use crate::core::{build, BuildReport, BundleCache};
use crate::models::Config;
use crate::ops::{CommandRunner, ProcessRunner};
use crate::utils::logger::Logger;
use crate::utils::spinner::Spinner;

/// 构建命令参数
#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Library entry file, e.g. src/index.js
    pub entry: PathBuf,
}

/// 处理构建命令
pub async fn handle_build(args: BuildArgs, config: &Config) -> Result<()> {
    let runner: Rc<dyn CommandRunner> = Rc::new(ProcessRunner);
    let mut cache = BundleCache::default();
    let report = build_once(&args.entry, config, runner, &mut cache).await?;
    print_report(&report);
    Ok(())
}

/// 处理监听命令：先构建一次，之后按间隔轮询，直到 Ctrl-C
pub async fn handle_watch(args: BuildArgs, config: &Config) -> Result<()> {
    let runner: Rc<dyn CommandRunner> = Rc::new(ProcessRunner);
    let mut cache = BundleCache::default();
    let interval = Duration::from_millis(config.watch.interval_ms.max(50));

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    Logger::info(format!("Watching {} (press Ctrl-C to stop)", args.entry.display()));
    loop {
        match build(args.entry.clone(), config, Rc::clone(&runner), &mut cache).await {
            Ok(report) if report.built.is_empty() => debug!("nothing to rebuild"),
            Ok(report) => print_report(&report),
            // 构建失败不终止监听
            Err(e) => Logger::error(format!("{:#}", e)),
        }

        tokio::select! {
            _ = &mut ctrl_c => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    Logger::info("Stopped watching");
    Ok(())
}

async fn build_once(
    entry: &Path,
    config: &Config,
    runner: Rc<dyn CommandRunner>,
    cache: &mut BundleCache,
) -> Result<BuildReport> {
    let message = format!("Building {}", entry.display());
    let mut spinner = Spinner::new(message, config.output.show_progress);
    spinner.start();
    let result = build(entry.to_path_buf(), config, runner, cache).await;
    spinner.stop();
    result
}

fn print_report(report: &BuildReport) {
    for format in &report.built {
        Logger::success(format!("Built {} bundle", format));
    }
    for format in &report.skipped {
        Logger::skip(format!("{} bundle is up to date", format));
    }
}
