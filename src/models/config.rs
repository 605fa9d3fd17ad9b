// ============================================================================
// ezbuild - 配置数据模型
// ============================================================================
//
// 文件: src/models/config.rs
// 职责: 配置文件数据结构定义和操作
// 边界:
//   - ✅ 配置文件数据结构定义
//   - ✅ 配置序列化/反序列化
//   - ✅ 配置默认值
//   - ✅ 配置文件读写操作
//   - ✅ 运行时参数合并
//   - ❌ 不应包含配置应用逻辑
//   - ❌ 不应包含 CLI 参数解析
//
// ============================================================================

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 默认配置文件名
pub const CONFIG_FILE_NAME: &str = "ezbuild.toml";

/// ezbuild 配置文件结构
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 打包配置
    pub bundle: BundleConfig,
    /// 发布配置
    pub release: ReleaseConfig,
    /// 监听配置
    pub watch: WatchConfig,
    /// 输出配置
    pub output: OutputConfig,
}

/// 打包配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BundleConfig {
    /// 打包器命令（程序及其前置参数）
    pub command: Vec<String>,
    /// 产物目录
    pub dist_dir: String,
    /// UMD 构建使用的打包器插件
    pub umd_plugins: Vec<String>,
    /// 是否生成 sourcemap
    pub sourcemap: bool,
}

/// 发布配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseConfig {
    /// 预发布标识
    pub prerelease_id: String,
    /// git 远端
    pub remote: String,
    /// 发布完成后切回的分支
    pub branch: String,
    /// 包管理器类型
    pub package_manager: PackageManager,
}

/// 监听配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// 轮询间隔（毫秒）
    pub interval_ms: u64,
}

/// 输出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// 是否详细输出
    pub verbose: bool,
    /// 是否彩色输出
    pub colored: bool,
    /// 是否显示进度动画
    pub show_progress: bool,
}

/// CLI 运行时参数（用于覆盖配置文件）
#[derive(Debug, Clone, Default)]
pub struct RuntimeArgs {
    pub verbose: Option<bool>,
    pub colored: Option<bool>,
    pub show_progress: Option<bool>,
    pub branch: Option<String>,
    pub package_manager: Option<PackageManager>,
}

/// 包管理器类型枚举
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    /// npm 包管理器
    Npm,
    /// pnpm 包管理器
    Pnpm,
    /// yarn 包管理器
    Yarn,
}

impl PackageManager {
    /// 获取包管理器命令字符串
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageManager::Npm => "npm",
            PackageManager::Pnpm => "pnpm",
            PackageManager::Yarn => "yarn",
        }
    }
}

impl Default for PackageManager {
    fn default() -> Self {
        PackageManager::Npm
    }
}

impl std::fmt::Display for PackageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 配置默认值 trait
pub trait ConfigDefaults {
    /// 默认打包器命令
    fn default_bundle_command() -> Vec<String> {
        vec!["npx".to_string(), "rollup".to_string()]
    }

    /// 默认产物目录
    fn default_dist_dir() -> String {
        "dist".to_string()
    }

    /// 默认 UMD 插件
    fn default_umd_plugins() -> Vec<String> {
        ["node-resolve", "commonjs", "json", "terser"]
            .iter()
            .map(|p| p.to_string())
            .collect()
    }

    /// 默认预发布标识
    fn default_prerelease_id() -> String {
        "alpha".to_string()
    }

    /// 默认 git 远端
    fn default_remote() -> String {
        "origin".to_string()
    }

    /// 默认分支
    fn default_branch() -> String {
        "master".to_string()
    }

    /// 默认轮询间隔
    fn default_watch_interval_ms() -> u64 {
        500
    }

    /// 默认是否彩色输出
    fn default_colored() -> bool {
        true
    }
}

impl ConfigDefaults for Config {}

impl Config {
    /// 加载配置文件：优先使用显式路径，其次是包目录下的 ezbuild.toml
    pub fn load(explicit: Option<&Path>, package_dir: &Path) -> anyhow::Result<Self> {
        let config_path = match explicit {
            Some(path) => path.to_path_buf(),
            None => package_dir.join(CONFIG_FILE_NAME),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            let config = toml::from_str(&content)
                .with_context(|| format!("Failed to parse {}", config_path.display()))?;
            tracing::debug!(path = %config_path.display(), "loaded config");
            Ok(config)
        } else if explicit.is_some() {
            anyhow::bail!("Config file not found: {}", config_path.display())
        } else {
            // 如果配置文件不存在，使用默认配置
            Ok(Self::default())
        }
    }

    /// 合并运行时参数
    pub fn merge_runtime_args(mut self, args: RuntimeArgs) -> Self {
        if let Some(verbose) = args.verbose {
            self.output.verbose = verbose;
        }
        if let Some(colored) = args.colored {
            self.output.colored = colored;
        }
        if let Some(show_progress) = args.show_progress {
            self.output.show_progress = show_progress;
        }
        if let Some(branch) = args.branch {
            self.release.branch = branch;
        }
        if let Some(package_manager) = args.package_manager {
            self.release.package_manager = package_manager;
        }
        self
    }

    /// 保存配置到文件
    pub fn save_to_file(&self, config_path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    /// 生成默认配置模板并保存到文件
    pub fn create_default_config_file(config_path: &PathBuf) -> anyhow::Result<()> {
        Self::default().save_to_file(config_path)
    }

    /// 打包器程序名与前置参数
    pub fn bundler_program(&self) -> anyhow::Result<(&str, &[String])> {
        match self.bundle.command.split_first() {
            Some((program, prefix)) => Ok((program.as_str(), prefix)),
            None => anyhow::bail!("bundle.command must not be empty"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bundle: BundleConfig::default(),
            release: ReleaseConfig::default(),
            watch: WatchConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            command: Config::default_bundle_command(),
            dist_dir: Config::default_dist_dir(),
            umd_plugins: Config::default_umd_plugins(),
            sourcemap: true,
        }
    }
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            prerelease_id: Config::default_prerelease_id(),
            remote: Config::default_remote(),
            branch: Config::default_branch(),
            package_manager: PackageManager::default(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { interval_ms: Config::default_watch_interval_ms() }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { verbose: false, colored: Config::default_colored(), show_progress: true }
    }
}
