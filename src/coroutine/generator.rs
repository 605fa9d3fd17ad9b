// ============================================================================
// ezbuild - 生成器适配
// ============================================================================
//
// 文件: src/coroutine/generator.rs
// 职责: 把 async 函数体适配为可逐步推进的计算（生成器风格）
// 边界:
//   - ✅ 函数体的单步轮询
//   - ✅ 挂起点与恢复值的交接
//   - ✅ 函数体内可用的挂起原语（wait / join / callback）
//   - ❌ 不应包含驱动循环
//   - ❌ 不应包含回调账本逻辑
//
// ============================================================================

use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

use anyhow::{anyhow, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::trace;

use super::broker::{Callback, CallbackBroker, Payload, Reply};
use super::driver::{Awaitable, Computation, Coroutine, Resume, Step};
use super::error::ProtocolError;

type Body<T> = Pin<Box<dyn Future<Output = Result<T>>>>;

enum Suspension {
    Await(Awaitable),
    Join,
}

/// 函数体与驱动器之间的交接区
#[derive(Default)]
enum Airlock {
    #[default]
    Empty,
    Resumed(Resume),
    Yielded(Suspension),
}

/// 生成器风格的计算
///
/// 函数体只能通过 [`Co`] 上的原语挂起；在函数体里直接 `.await` 其他 future
/// 会使计算停滞，并以 [`ProtocolError::Stalled`] 结束。
pub struct Gen<T> {
    airlock: Rc<RefCell<Airlock>>,
    body: Option<Body<T>>,
}

impl<T> Gen<T> {
    pub fn new<F, Fut>(broker: CallbackBroker, body: F) -> Self
    where
        F: FnOnce(Co) -> Fut,
        Fut: Future<Output = Result<T>> + 'static,
    {
        let airlock = Rc::new(RefCell::new(Airlock::Empty));
        let co = Co { airlock: Rc::clone(&airlock), broker };
        Self { airlock, body: Some(Box::pin(body(co))) }
    }
}

impl<T> Computation for Gen<T> {
    type Output = T;

    fn resume(&mut self, input: Resume) -> Step<T> {
        let Some(body) = self.body.as_mut() else {
            return Step::Done(Err(anyhow!("generator resumed after completion")));
        };

        if !matches!(input, Resume::Start) {
            *self.airlock.borrow_mut() = Airlock::Resumed(input);
        }

        let mut cx = Context::from_waker(Waker::noop());
        let polled = body.as_mut().poll(&mut cx);
        match polled {
            Poll::Ready(outcome) => {
                self.body = None;
                Step::Done(outcome)
            }
            Poll::Pending => match self.airlock.take() {
                Airlock::Yielded(Suspension::Await(awaitable)) => Step::Await(awaitable),
                Airlock::Yielded(Suspension::Join) => Step::Join,
                _ => {
                    self.body = None;
                    Step::Done(Err(ProtocolError::Stalled.into()))
                }
            },
        }
    }
}

/// 以 `(Co, 参数)` 形式的 async 函数体构建协程
pub fn from_fn<A, T, F, Fut>(body: F) -> Coroutine<impl Fn(CallbackBroker, A) -> Gen<T>>
where
    F: Fn(Co, A) -> Fut,
    Fut: Future<Output = Result<T>> + 'static,
{
    Coroutine::new(move |broker, args| Gen::new(broker, |co| body(co, args)))
}

/// 函数体内的协程上下文
pub struct Co {
    airlock: Rc<RefCell<Airlock>>,
    broker: CallbackBroker,
}

impl Co {
    /// 请求唯一的未命名回调
    pub fn callback(&self) -> Result<Callback, ProtocolError> {
        self.broker.callback()
    }

    /// 请求命名回调
    pub fn named(&self, name: impl Into<String>) -> Result<Callback, ProtocolError> {
        self.broker.named(name)
    }

    /// 等待一个异步结果
    pub async fn wait<Fut>(&self, future: Fut) -> Result<Value>
    where
        Fut: Future<Output = Result<Value>> + 'static,
    {
        match self.suspend(Suspension::Await(Box::pin(future))).await {
            Resume::Settled(outcome) => outcome,
            Resume::Throw(err) => Err(err),
            other => Err(unexpected("settled future", &other)),
        }
    }

    /// 等待一个异步结果，并经由 JSON 还原为具体类型
    pub async fn wait_as<T, Fut>(&self, future: Fut) -> Result<T>
    where
        T: Serialize + DeserializeOwned + 'static,
        Fut: Future<Output = Result<T>> + 'static,
    {
        let value = self
            .wait(async move {
                let typed = future.await?;
                Ok(serde_json::to_value(typed)?)
            })
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// 挂起直到本步请求的全部回调都已触发
    pub async fn join(&self) -> Result<Payload> {
        match self.suspend(Suspension::Join).await {
            Resume::Joined(payload) => Ok(payload),
            Resume::Throw(err) => Err(err),
            other => Err(unexpected("joined callbacks", &other)),
        }
    }

    /// 挂起直到唯一的未命名回调触发，返回其原始结果
    pub async fn join_one(&self) -> Result<Reply> {
        self.join().await?.into_single()
    }

    fn suspend(&self, suspension: Suspension) -> Suspend {
        Suspend { airlock: Rc::clone(&self.airlock), outgoing: Some(suspension) }
    }
}

fn unexpected(expected: &'static str, got: &Resume) -> anyhow::Error {
    ProtocolError::UnexpectedResume { expected, got: got.kind() }.into()
}

/// 单个挂起点：首次轮询交出挂起请求，下次轮询取回恢复值
struct Suspend {
    airlock: Rc<RefCell<Airlock>>,
    outgoing: Option<Suspension>,
}

impl Future for Suspend {
    type Output = Resume;

    fn poll(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Resume> {
        if let Some(suspension) = self.outgoing.take() {
            trace!("generator yielded");
            *self.airlock.borrow_mut() = Airlock::Yielded(suspension);
            return Poll::Pending;
        }

        let current = std::mem::take(&mut *self.airlock.borrow_mut());
        match current {
            Airlock::Resumed(input) => Poll::Ready(input),
            other => {
                *self.airlock.borrow_mut() = other;
                Poll::Pending
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn body_without_suspension_completes_immediately() {
        let co = from_fn(|_co, x: i64| async move { Ok(x * 2) });
        assert_eq!(co.call(21).await.unwrap(), 42);
    }

    #[tokio::test]
    async fn awaiting_a_foreign_future_stalls() {
        let co = from_fn(|_co, ()| async move {
            tokio::task::yield_now().await;
            Ok(())
        });
        let err = co.call(()).await.unwrap_err();
        assert_eq!(err.downcast_ref::<ProtocolError>(), Some(&ProtocolError::Stalled));
    }

    #[tokio::test]
    async fn wait_as_restores_typed_values() {
        let co = from_fn(|co, ()| async move {
            let pair: (String, u32) = co.wait_as(async { Ok(("dist".to_string(), 2)) }).await?;
            Ok(pair)
        });
        assert_eq!(co.call(()).await.unwrap(), ("dist".to_string(), 2));
    }

    #[tokio::test]
    async fn callbacks_fired_inside_the_step_are_collected_after_join() {
        let co = from_fn(|co, ()| async move {
            co.callback()?.ok(vec![json!("early")]);
            let reply = co.join_one().await?;
            reply.into_result()
        });
        assert_eq!(co.call(()).await.unwrap(), json!("early"));
    }
}
