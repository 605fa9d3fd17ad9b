// ============================================================================
// ezbuild - 发布命令处理
// ============================================================================
//
// 文件: src/cli/publish.rs
// 职责: 处理 publish 命令
// 边界:
//   - ✅ 发布命令参数解析
//   - ✅ 注入真实的进程执行器与终端提问器
//   - ❌ 不应包含 git 命令序列
//
// ============================================================================

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;
use std::rc::Rc;

use crate::core::Publisher;
use crate::models::Config;
use crate::ops::{ProcessRunner, StdinPrompter};
use crate::utils::logger::Logger;

/// 发布命令参数
#[derive(Debug, Args)]
pub struct PublishArgs {
    /// Package directory containing package.json
    #[arg(default_value = ".")]
    pub dir: PathBuf,
}

/// 处理发布命令
pub async fn handle_publish(args: PublishArgs, config: Config) -> Result<()> {
    let publisher = Publisher::new(config, Rc::new(ProcessRunner), Rc::new(StdinPrompter));
    let report = publisher.publish(args.dir).await?;

    Logger::success(format!("Released v{}", report.version));
    if !report.registry_published {
        Logger::warn("The git release is done but the registry publish failed");
    }
    Ok(())
}
