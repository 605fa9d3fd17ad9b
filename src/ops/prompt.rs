// ============================================================================
// ezbuild - 用户交互
// ============================================================================
//
// 文件: src/ops/prompt.rs
// 职责: 以回调句柄交付用户输入
// 边界:
//   - ✅ 问题输出与单行输入读取
//   - ❌ 不应包含输入校验
//
// ============================================================================

use std::io::{self, BufRead, Write};

use serde_json::Value;

use crate::coroutine::Callback;

/// 提问器：回调结果为 `[answer]`，不含换行
pub trait Prompter {
    fn question(&self, query: &str, cb: Callback);
}

/// 从标准输入读取回答
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn question(&self, query: &str, cb: Callback) {
        print!("{}", query);
        let _ = io::stdout().flush();

        tokio::task::spawn_blocking(move || {
            let mut line = String::new();
            match io::stdin().lock().read_line(&mut line) {
                Ok(0) => cb.fail(anyhow::anyhow!("stdin closed")),
                Ok(_) => cb.ok(vec![Value::String(trim_newline(&line).to_string())]),
                Err(err) => cb.fail(err),
            }
        });
    }
}

fn trim_newline(line: &str) -> &str {
    line.trim_end_matches(['\r', '\n'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_line_endings_only() {
        assert_eq!(trim_newline("  yes \r\n"), "  yes ");
        assert_eq!(trim_newline(""), "");
    }
}
