// ============================================================================
// ezbuild - 库入口
// ============================================================================
//
// 文件: src/lib.rs
// 职责: 模块声明
// 边界:
//   - ✅ 模块导出
//   - ❌ 不应包含业务逻辑
//
// ============================================================================

pub mod cli;
pub mod core;
pub mod coroutine;
pub mod models;
pub mod ops;
pub mod utils;
