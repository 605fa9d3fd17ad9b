// ============================================================================
// ezbuild - 测试替身
// ============================================================================
//
// 文件: src/ops/testing.rs
// 职责: 单元测试使用的执行器与提问器替身
// 边界:
//   - ✅ 记录命令并按脚本回复
//   - ✅ 按脚本回答问题
//   - ❌ 不应出现在非测试构建中
//
// ============================================================================

use std::cell::RefCell;
use std::collections::VecDeque;

use anyhow::anyhow;
use serde_json::Value;

use super::process::{CommandRunner, CommandSpec};
use super::prompt::Prompter;
use crate::coroutine::{Callback, Reply};

/// 记录所有命令；命令行以某个前缀开头时以失败回复
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    pub commands: RefCell<Vec<CommandSpec>>,
    failing: Vec<String>,
}

impl ScriptedRunner {
    pub fn failing_on(mut self, prefix: &str) -> Self {
        self.failing.push(prefix.to_string());
        self
    }

    pub fn command_lines(&self) -> Vec<String> {
        self.commands.borrow().iter().map(ToString::to_string).collect()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, spec: CommandSpec, cb: Callback) {
        let line = spec.to_string();
        self.commands.borrow_mut().push(spec);
        let error = self
            .failing
            .iter()
            .any(|prefix| line.starts_with(prefix.as_str()))
            .then(|| anyhow!("`{}` exited with status 1", line));
        let stderr = if error.is_some() { "scripted failure" } else { "" };
        cb.fire(Reply::with(error, vec![Value::String(line.clone()), Value::String(stderr.into())]));
    }
}

/// 按顺序给出预设回答，并记录问题
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: RefCell<VecDeque<String>>,
    pub asked: RefCell<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: RefCell::new(answers.into_iter().map(Into::into).collect()),
            asked: RefCell::new(Vec::new()),
        }
    }
}

impl Prompter for ScriptedPrompter {
    fn question(&self, query: &str, cb: Callback) {
        self.asked.borrow_mut().push(query.to_string());
        match self.answers.borrow_mut().pop_front() {
            Some(answer) => cb.ok(vec![Value::String(answer)]),
            None => cb.fail(anyhow!("no scripted answer for {:?}", query)),
        }
    }
}
