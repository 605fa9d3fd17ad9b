// ============================================================================
// ezbuild - 回调代理
// ============================================================================
//
// 文件: src/coroutine/broker.rs
// 职责: 为挂起的计算发放一次性回调句柄，并汇聚回调结果
// 边界:
//   - ✅ 回调句柄发放与误用检测
//   - ✅ 未完成回调计数（pending）
//   - ✅ 汇聚屏障（fan-in）结果编排
//   - ❌ 不应包含计算驱动逻辑
//   - ❌ 不应包含具体外部操作
//
// ============================================================================

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::rc::Rc;

use anyhow::Result;
use serde_json::Value;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, trace};

use super::error::ProtocolError;

/// 回调槽位
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    /// 唯一的未命名回调
    Unnamed,
    /// 命名回调
    Named(String),
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Unnamed => write!(f, "<unnamed>"),
            Slot::Named(name) => write!(f, "{}", name),
        }
    }
}

/// 回调结果：错误在前，随后是零个或多个结果值
#[derive(Debug)]
pub struct Reply {
    pub error: Option<anyhow::Error>,
    pub values: Vec<Value>,
}

impl Reply {
    pub fn ok(values: Vec<Value>) -> Self {
        Self { error: None, values }
    }

    pub fn err(error: impl Into<anyhow::Error>) -> Self {
        Self { error: Some(error.into()), values: Vec::new() }
    }

    /// 错误与结果值同时存在（例如命令失败时仍带有 stdout/stderr）
    pub fn with(error: Option<anyhow::Error>, values: Vec<Value>) -> Self {
        Self { error, values }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// 第 `index` 个结果值，不存在时为 `Value::Null`
    pub fn value(&self, index: usize) -> &Value {
        self.values.get(index).unwrap_or(&Value::Null)
    }

    /// 第 `index` 个结果值的字符串形式
    pub fn text(&self, index: usize) -> &str {
        self.value(index).as_str().unwrap_or_default()
    }

    /// 转为 Result，成功时返回第一个结果值
    pub fn into_result(self) -> Result<Value> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.values.into_iter().next().unwrap_or(Value::Null)),
        }
    }
}

/// 汇聚屏障完成后交给计算的恢复载荷
#[derive(Debug)]
pub enum Payload {
    /// 单个未命名回调的原始结果
    Single(Reply),
    /// 命名回调：名称 -> 结果
    Named(BTreeMap<String, Reply>),
}

impl Payload {
    pub fn into_single(self) -> Result<Reply> {
        match self {
            Payload::Single(reply) => Ok(reply),
            Payload::Named(_) => Err(ProtocolError::UnexpectedResume {
                expected: "a single unnamed reply",
                got: "named replies",
            }
            .into()),
        }
    }

    pub fn into_named(self) -> Result<BTreeMap<String, Reply>> {
        match self {
            Payload::Named(replies) => Ok(replies),
            Payload::Single(_) => Err(ProtocolError::UnexpectedResume {
                expected: "named replies",
                got: "a single unnamed reply",
            }
            .into()),
        }
    }

    /// 单个回调的第一个结果值；回调带错误时返回该错误
    pub fn into_value(self) -> Result<Value> {
        self.into_single()?.into_result()
    }
}

/// 回调触发后发往驱动器的投递
#[derive(Debug)]
pub struct Delivery {
    epoch: u64,
    slot: Slot,
    reply: Reply,
}

/// 单次调用的回调账本，只由所属调用修改
#[derive(Debug, Default)]
struct Ledger {
    /// 当前挂起点编号，屏障完成或被放弃后递增
    epoch: u64,
    /// 已请求但尚未投递的回调数
    pending: usize,
    unnamed: bool,
    names: BTreeSet<String>,
    single: Option<Reply>,
    named_results: BTreeMap<String, Reply>,
}

impl Ledger {
    fn reset(&mut self) {
        self.epoch += 1;
        self.pending = 0;
        self.unnamed = false;
        self.names.clear();
        self.single = None;
        self.named_results.clear();
    }
}

/// 回调代理
///
/// 由驱动器为每次调用创建，克隆后交给计算使用。账本只在单一控制线程上
/// 被修改：计算在自己的步骤内请求句柄，驱动器在挂起后处理投递。
#[derive(Clone)]
pub struct CallbackBroker {
    ledger: Rc<RefCell<Ledger>>,
    sender: UnboundedSender<Delivery>,
}

impl fmt::Debug for CallbackBroker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackBroker")
            .field("pending", &self.pending())
            .finish()
    }
}

impl CallbackBroker {
    /// 创建代理及其投递接收端
    pub(crate) fn channel() -> (Self, UnboundedReceiver<Delivery>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let broker = Self { ledger: Rc::new(RefCell::new(Ledger::default())), sender };
        (broker, receiver)
    }

    /// 请求唯一的未命名回调
    pub fn callback(&self) -> Result<Callback, ProtocolError> {
        let mut ledger = self.ledger.borrow_mut();
        if ledger.pending > 0 {
            return Err(ProtocolError::UnnamedNotAlone);
        }
        ledger.pending += 1;
        ledger.unnamed = true;
        trace!(epoch = ledger.epoch, "unnamed callback requested");
        Ok(self.mint(ledger.epoch, Slot::Unnamed))
    }

    /// 请求命名回调，同一挂起点内名称不可重复
    pub fn named(&self, name: impl Into<String>) -> Result<Callback, ProtocolError> {
        let name = name.into();
        let mut ledger = self.ledger.borrow_mut();
        if ledger.unnamed {
            return Err(ProtocolError::UnnamedNotAlone);
        }
        if !ledger.names.insert(name.clone()) {
            return Err(ProtocolError::NameInUse(name));
        }
        ledger.pending += 1;
        trace!(epoch = ledger.epoch, name = %name, "named callback requested");
        Ok(self.mint(ledger.epoch, Slot::Named(name)))
    }

    /// 当前挂起点未完成的回调数
    pub fn pending(&self) -> usize {
        self.ledger.borrow().pending
    }

    fn mint(&self, epoch: u64, slot: Slot) -> Callback {
        Callback { sender: Some(self.sender.clone()), epoch, slot }
    }

    /// 放弃当前挂起点的所有回调，之后到达的投递都会被忽略
    pub(crate) fn abandon(&self) {
        let mut ledger = self.ledger.borrow_mut();
        debug!(epoch = ledger.epoch, pending = ledger.pending, "abandoning outstanding callbacks");
        ledger.reset();
    }

    /// 记录一次投递；当 pending 归零时返回编排好的载荷
    pub(crate) fn accept(&self, delivery: Delivery) -> Result<Option<Payload>, ProtocolError> {
        let mut ledger = self.ledger.borrow_mut();
        if delivery.epoch != ledger.epoch {
            debug!(
                slot = %delivery.slot,
                epoch = delivery.epoch,
                current = ledger.epoch,
                "ignoring stale callback"
            );
            return Ok(None);
        }

        match delivery.slot {
            Slot::Unnamed => {
                if !ledger.unnamed || ledger.single.is_some() {
                    return Err(ProtocolError::DuplicateDelivery(Slot::Unnamed.to_string()));
                }
                ledger.single = Some(delivery.reply);
            }
            Slot::Named(name) => {
                if !ledger.names.contains(&name) || ledger.named_results.contains_key(&name) {
                    return Err(ProtocolError::DuplicateDelivery(name));
                }
                ledger.named_results.insert(name, delivery.reply);
            }
        }
        ledger.pending -= 1;

        if ledger.pending > 0 {
            return Ok(None);
        }

        let payload = match ledger.single.take() {
            Some(reply) => Payload::Single(reply),
            None => Payload::Named(std::mem::take(&mut ledger.named_results)),
        };
        ledger.reset();
        Ok(Some(payload))
    }
}

/// 一次性回调句柄
///
/// `fire` 消耗句柄，因此同一句柄不可能触发两次。未触发就被丢弃的句柄会以
/// [`ProtocolError::CallbackDropped`] 作为结果投递，避免计算永远挂起。
#[must_use = "a callback that is never fired resolves with a CallbackDropped error"]
pub struct Callback {
    sender: Option<UnboundedSender<Delivery>>,
    epoch: u64,
    slot: Slot,
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback")
            .field("slot", &self.slot)
            .field("epoch", &self.epoch)
            .finish()
    }
}

impl Callback {
    pub fn slot(&self) -> &Slot {
        &self.slot
    }

    /// 以结果触发回调
    pub fn fire(mut self, reply: Reply) {
        self.send(reply);
    }

    /// 以成功结果触发
    pub fn ok(self, values: Vec<Value>) {
        self.fire(Reply::ok(values));
    }

    /// 以错误触发
    pub fn fail(self, error: impl Into<anyhow::Error>) {
        self.fire(Reply::err(error));
    }

    fn send(&mut self, reply: Reply) {
        let Some(sender) = self.sender.take() else {
            return;
        };
        let delivery = Delivery { epoch: self.epoch, slot: self.slot.clone(), reply };
        // 调用已结算时接收端已关闭，投递直接丢弃
        if sender.send(delivery).is_err() {
            trace!(slot = %self.slot, "callback fired after settlement");
        }
    }
}

impl Drop for Callback {
    fn drop(&mut self) {
        if self.sender.is_some() {
            let error = ProtocolError::CallbackDropped(self.slot.to_string());
            self.send(Reply::err(error));
        }
    }
}
