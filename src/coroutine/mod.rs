// ============================================================================
// ezbuild - 协程模块
// ============================================================================
//
// 文件: src/coroutine/mod.rs
// 职责: 回调式异步操作到线性挂起流程的适配层入口
// 边界:
//   - ✅ 子模块导出
//   - ✅ 常用类型重新导出
//   - ❌ 不应包含具体业务流程
//   - ❌ 不应包含外部操作实现
//
// ============================================================================

pub mod broker;
pub mod driver;
pub mod error;
pub mod generator;

// 重新导出常用类型
pub use broker::{Callback, CallbackBroker, Payload, Reply, Slot};
pub use driver::{Awaitable, Computation, Coroutine, Resume, Step};
pub use error::ProtocolError;
pub use generator::{from_fn, Co, Gen};
