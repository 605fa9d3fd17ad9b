// ============================================================================
// ezbuild - 配置文件初始化命令处理
// ============================================================================
//
// 文件: src/cli/init_config.rs
// 职责: 处理配置文件初始化命令
// 边界:
//   - ✅ 默认配置文件生成
//   - ✅ 配置文件存在性检查
//   - ❌ 不应包含配置文件格式定义
//
// ============================================================================

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use crate::models::config::{Config, CONFIG_FILE_NAME};
use crate::utils::logger::Logger;

/// 配置文件初始化命令参数
#[derive(Debug, Args)]
pub struct InitConfigArgs {
    /// Where to write the config file
    #[arg(default_value = CONFIG_FILE_NAME)]
    pub path: PathBuf,

    /// Overwrite an existing config file
    #[arg(short, long)]
    pub force: bool,
}

/// 处理配置文件初始化命令
pub fn handle_init_config(args: InitConfigArgs) -> Result<()> {
    // 检查配置文件是否已存在
    if args.path.exists() && !args.force {
        Logger::warn(format!("{} already exists", args.path.display()));
        Logger::info("Use --force to overwrite it");
        return Ok(());
    }

    if let Err(e) = Config::create_default_config_file(&args.path) {
        Logger::error(format!("Failed to create config file: {}", e));
        return Err(e);
    }
    Logger::success(format!("Created {}", args.path.display()));

    Ok(())
}
