// ============================================================================
// ezbuild - 协程协议错误
// ============================================================================
//
// 文件: src/coroutine/error.rs
// 职责: 协程调度器误用（协议违规）的类型化错误
// 边界:
//   - ✅ 协议违规错误定义
//   - ❌ 不应包含外部操作失败（由 anyhow 承载）
//   - ❌ 不应包含调度逻辑
//
// ============================================================================

use thiserror::Error;

/// 协程协议违规
///
/// 这些错误都会作为失败注入到被挂起的计算中，而不是直接抛给驱动器的调用者。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// 同一挂起点内请求了多个未命名回调，或混用了命名与未命名回调
    #[error("you may either request several named callbacks or exactly one unnamed callback")]
    UnnamedNotAlone,

    /// 命名回调在触发之前被重复使用
    #[error("callback name `{0}` is already in use; yield before reusing it")]
    NameInUse(String),

    /// 挂起时既没有等待 future，也没有请求任何回调
    #[error("non-yieldable value: the computation suspended without awaiting a future or requesting any callbacks")]
    NonYieldable,

    /// 等待 future 时仍有未触发的回调
    #[error("cannot await a future while {0} callback(s) are still outstanding")]
    AwaitWithPendingCallbacks(usize),

    /// 同一回调槽位收到了第二次结果
    #[error("callback `{0}` fired more than once")]
    DuplicateDelivery(String),

    /// 回调句柄在触发前被丢弃
    #[error("callback `{0}` was dropped without firing")]
    CallbackDropped(String),

    /// 计算在没有挂起的情况下停滞（在生成器体内等待了外部 future）
    #[error("the computation stalled without yielding a suspension point")]
    Stalled,

    /// 恢复值与挂起类型不匹配
    #[error("unexpected resumption: expected {expected}, got {got}")]
    UnexpectedResume {
        expected: &'static str,
        got: &'static str,
    },
}
