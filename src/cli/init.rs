// ============================================================================
// ezbuild - 初始化命令处理
// ============================================================================
//
// 文件: src/cli/init.rs
// 职责: 处理 init 命令
// 边界:
//   - ✅ 初始化命令参数解析
//   - ✅ 结果输出
//   - ❌ 不应包含清单修改逻辑
//
// ============================================================================

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use crate::core::init_project;
use crate::models::Config;
use crate::utils::constants::{BOWER_JSON, GITIGNORE};
use crate::utils::logger::Logger;

/// 初始化命令参数
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Library entry file, e.g. src/index.js
    pub entry: PathBuf,
}

/// 处理初始化命令
pub async fn handle_init(args: InitArgs, config: &Config) -> Result<()> {
    Logger::info(format!("Initializing package for {}", args.entry.display()));

    let report = init_project(args.entry, config).await?;
    Logger::success(format!("Updated {}", report.manifest_path.display()));

    if report.bower_updated {
        Logger::success(format!("Updated {}", BOWER_JSON));
    } else {
        Logger::warn(format!("You did not specify a {} file.", BOWER_JSON));
    }
    if report.gitignore_updated {
        Logger::success(format!("Added {} to {}", config.bundle.dist_dir, GITIGNORE));
    }

    Ok(())
}
