// ============================================================================
// ezbuild - 协程驱动器
// ============================================================================
//
// 文件: src/coroutine/driver.rs
// 职责: 将可挂起的计算包装为普通异步操作，并逐步驱动其执行
// 边界:
//   - ✅ 可挂起计算的单步推进
//   - ✅ 挂起类型分类（等待 future / 回调屏障 / 非法挂起）
//   - ✅ 结果的一次性结算
//   - ❌ 不应包含回调账本细节
//   - ❌ 不应包含具体业务流程
//
// ============================================================================

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use anyhow::Result;
use serde_json::Value;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, warn};

use super::broker::{CallbackBroker, Delivery, Payload};
use super::error::ProtocolError;

/// 计算可以直接等待的异步结果
pub type Awaitable = Pin<Box<dyn Future<Output = Result<Value>>>>;

/// 计算每一步的产出
pub enum Step<T> {
    /// 等待一个异步结果，完成后以 [`Resume::Settled`] 恢复
    Await(Awaitable),
    /// 等待本步请求的全部回调，完成后以 [`Resume::Joined`] 恢复
    Join,
    /// 计算结束
    Done(Result<T>),
}

impl<T> fmt::Debug for Step<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Await(_) => write!(f, "Await"),
            Step::Join => write!(f, "Join"),
            Step::Done(outcome) => write!(f, "Done(ok = {})", outcome.is_ok()),
        }
    }
}

/// 交回给计算的恢复值
#[derive(Debug)]
pub enum Resume {
    /// 第一步，没有输入
    Start,
    /// 等待的异步结果：`Err` 为失败槽位，`Ok` 为结果槽位
    Settled(Result<Value>),
    /// 回调屏障完成后的载荷
    Joined(Payload),
    /// 注入到挂起点的失败
    Throw(anyhow::Error),
}

impl Resume {
    pub fn kind(&self) -> &'static str {
        match self {
            Resume::Start => "start",
            Resume::Settled(_) => "settled future",
            Resume::Joined(_) => "joined callbacks",
            Resume::Throw(_) => "injected failure",
        }
    }
}

/// 可挂起的计算
pub trait Computation {
    type Output;

    /// 以恢复值推进一步
    fn resume(&mut self, input: Resume) -> Step<Self::Output>;
}

/// 协程驱动器
///
/// 每次 [`Coroutine::call`] 都会通过工厂创建新的代理与计算，调用之间互不共享状态。
pub struct Coroutine<F> {
    factory: F,
}

impl<F> Coroutine<F> {
    pub fn new(factory: F) -> Self {
        Self { factory }
    }

    /// 调用被包装的计算，返回其最终结果
    pub async fn call<A, C>(&self, args: A) -> Result<C::Output>
    where
        F: Fn(CallbackBroker, A) -> C,
        C: Computation,
    {
        let (broker, inbox) = CallbackBroker::channel();
        let computation = (self.factory)(broker.clone(), args);
        drive(computation, broker, inbox).await
    }
}

/// 驱动计算直到结束；返回即结算，之后到达的回调都会被丢弃
async fn drive<C: Computation>(
    mut computation: C,
    broker: CallbackBroker,
    mut inbox: UnboundedReceiver<Delivery>,
) -> Result<C::Output> {
    let mut input = Resume::Start;
    let mut steps = 0usize;

    loop {
        steps += 1;
        input = match computation.resume(input) {
            Step::Done(outcome) => {
                debug!(steps, ok = outcome.is_ok(), "coroutine settled");
                return outcome;
            }
            Step::Await(awaitable) => {
                let outstanding = broker.pending();
                if outstanding > 0 {
                    warn!(outstanding, "future awaited with callbacks outstanding");
                    broker.abandon();
                    Resume::Throw(ProtocolError::AwaitWithPendingCallbacks(outstanding).into())
                } else {
                    Resume::Settled(awaitable.await)
                }
            }
            Step::Join => {
                if broker.pending() == 0 {
                    warn!("suspended without requesting callbacks");
                    Resume::Throw(ProtocolError::NonYieldable.into())
                } else {
                    match join(&broker, &mut inbox).await {
                        Ok(payload) => Resume::Joined(payload),
                        Err(err) => {
                            broker.abandon();
                            Resume::Throw(err.into())
                        }
                    }
                }
            }
        };
    }
}

/// 等待当前挂起点的全部回调
async fn join(
    broker: &CallbackBroker,
    inbox: &mut UnboundedReceiver<Delivery>,
) -> Result<Payload, ProtocolError> {
    debug!(pending = broker.pending(), "waiting on callbacks");
    loop {
        // 代理自身持有发送端，通道不会在调用期间关闭
        let Some(delivery) = inbox.recv().await else {
            return Err(ProtocolError::Stalled);
        };
        if let Some(payload) = broker.accept(delivery)? {
            return Ok(payload);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// 显式状态机：请求一个未命名回调并立即触发
    struct Echo {
        broker: CallbackBroker,
        value: Value,
    }

    impl Computation for Echo {
        type Output = Value;

        fn resume(&mut self, input: Resume) -> Step<Value> {
            match input {
                Resume::Start => match self.broker.callback() {
                    Ok(cb) => {
                        cb.ok(vec![self.value.clone()]);
                        Step::Join
                    }
                    Err(err) => Step::Done(Err(err.into())),
                },
                Resume::Joined(payload) => Step::Done(payload.into_value()),
                Resume::Throw(err) => Step::Done(Err(err)),
                other => Step::Done(Err(ProtocolError::UnexpectedResume {
                    expected: "joined callbacks",
                    got: other.kind(),
                }
                .into())),
            }
        }
    }

    #[tokio::test]
    async fn state_machine_round_trip() {
        let echo = Coroutine::new(|broker, value| Echo { broker, value });
        assert_eq!(echo.call(json!(42)).await.unwrap(), json!(42));
        assert_eq!(echo.call(json!("again")).await.unwrap(), json!("again"));
    }

    /// 先请求回调，再等待 future
    struct AwaitWhilePending {
        broker: CallbackBroker,
        held: Option<crate::coroutine::Callback>,
    }

    impl Computation for AwaitWhilePending {
        type Output = ();

        fn resume(&mut self, input: Resume) -> Step<()> {
            match input {
                Resume::Start => {
                    self.held = self.broker.callback().ok();
                    Step::Await(Box::pin(async { Ok(Value::Null) }))
                }
                Resume::Throw(err) => Step::Done(Err(err)),
                _ => Step::Done(Ok(())),
            }
        }
    }

    #[tokio::test]
    async fn awaiting_with_outstanding_callbacks_is_a_violation() {
        let co = Coroutine::new(|broker, ()| AwaitWhilePending { broker, held: None });
        let err = co.call(()).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<ProtocolError>(),
            Some(&ProtocolError::AwaitWithPendingCallbacks(1))
        );
    }
}
