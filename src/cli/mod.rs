// ============================================================================
// ezbuild - CLI 模块
// ============================================================================
//
// 文件: src/cli/mod.rs
// 职责: CLI 命令行接口模块入口和路由
// 边界:
//   - ✅ CLI 结构定义和命令枚举
//   - ✅ 命令行参数解析配置
//   - ✅ 命令路由分发
//   - ❌ 不应包含具体命令实现逻辑
//   - ❌ 不应包含数据模型定义
//
// ============================================================================

pub mod build;
pub mod init;
pub mod init_config;
pub mod publish;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::models::{Config, PackageManager, RuntimeArgs};
use crate::utils::logger::Logger;
use build::{handle_build, handle_watch, BuildArgs};
use init::{handle_init, InitArgs};
use init_config::{handle_init_config, InitConfigArgs};
use publish::{handle_publish, PublishArgs};

/// ezbuild - Build and publish JavaScript libraries
#[derive(Debug, Parser)]
#[command(name = "ezbuild")]
#[command(about = "Build, watch and publish JavaScript libraries")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Global verbose mode
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file (defaults to ezbuild.toml in the package directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Branch to return to after publishing
    #[arg(long, global = true)]
    pub branch: Option<String>,

    /// Package manager used to publish
    #[arg(long, global = true, value_enum)]
    pub package_manager: Option<PackageManager>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Disable progress spinner
    #[arg(long, global = true)]
    pub no_progress: bool,

    /// Commands
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Point package.json at the build outputs of an entry file
    Init(InitArgs),
    /// Bundle an entry file as CommonJS and UMD
    Build(BuildArgs),
    /// Rebuild an entry file whenever its package changes
    Watch(BuildArgs),
    /// Bump the version, tag it and publish the package
    Publish(PublishArgs),
    /// Write a default ezbuild.toml
    InitConfig(InitConfigArgs),
}

pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    let package_dir = match &cli.command {
        Commands::Publish(args) => args.dir.clone(),
        _ => std::env::current_dir()?,
    };
    let config = match &cli.command {
        Commands::InitConfig(_) => Config::default(),
        _ => load_config(&cli, &package_dir)?,
    }
    .merge_runtime_args(build_runtime_args(&cli));
    Logger::init(config.output.verbose, config.output.colored);

    match cli.command {
        Commands::Init(args) => handle_init(args, &config).await,
        Commands::Build(args) => handle_build(args, &config).await,
        Commands::Watch(args) => handle_watch(args, &config).await,
        Commands::Publish(args) => handle_publish(args, config).await,
        Commands::InitConfig(args) => handle_init_config(args),
    }
}

fn load_config(cli: &Cli, package_dir: &Path) -> Result<Config> {
    Config::load(cli.config.as_deref(), package_dir)
}

/// Build runtime args from CLI arguments
fn build_runtime_args(cli: &Cli) -> RuntimeArgs {
    RuntimeArgs {
        verbose: if cli.verbose { Some(true) } else { None },
        colored: if cli.no_color { Some(false) } else { None },
        show_progress: if cli.no_progress { Some(false) } else { None },
        branch: cli.branch.clone(),
        package_manager: cli.package_manager,
    }
}
