// ============================================================================
// ezbuild - Core 核心模块
// ============================================================================
//
// 文件: src/core/mod.rs
// 职责: 构建、初始化与发布流程的模块入口和导出
// 边界:
//   - ✅ 核心子模块导出
//   - ✅ 常用类型重新导出
//   - ❌ 不应包含具体业务实现
//   - ❌ 不应包含 CLI 相关逻辑
//
// ============================================================================

pub mod bundler;
pub mod init;
pub mod locator;
pub mod publish;

// 重新导出常用类型
pub use bundler::{build, compute_config, BuildConfig, BuildReport, BundleCache, Format};
pub use init::{init_project, InitReport};
pub use locator::{locate_package, Located};
pub use publish::{PublishReport, Publisher};
