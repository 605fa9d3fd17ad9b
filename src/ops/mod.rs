// ============================================================================
// ezbuild - 外部操作模块
// ============================================================================
//
// 文件: src/ops/mod.rs
// 职责: 协程所协调的外部异步操作
// 边界:
//   - ✅ 回调式操作（文件、命令、交互）
//   - ✅ 可等待操作（JSON 清单读写）
//   - ❌ 不应包含构建/发布流程
//
// ============================================================================

pub mod fs;
pub mod manifest;
pub mod process;
pub mod prompt;

#[cfg(test)]
pub mod testing;

pub use process::{CommandRunner, CommandSpec, ProcessRunner};
pub use prompt::{Prompter, StdinPrompter};
