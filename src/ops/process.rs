// ============================================================================
// ezbuild - 外部命令执行
// ============================================================================
//
// 文件: src/ops/process.rs
// 职责: 以回调句柄交付结果的外部命令执行
// 边界:
//   - ✅ 命令描述定义
//   - ✅ 命令执行和输出捕获
//   - ✅ 执行器抽象（便于替换为测试替身）
//   - ❌ 不应包含 git/npm 发布流程
//   - ❌ 不应包含打包参数拼装
//
// ============================================================================

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;

use anyhow::anyhow;
use serde_json::Value;
use tokio::process::Command;
use tracing::debug;

use crate::coroutine::{Callback, Reply};

/// 待执行的外部命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, cwd: &Path) -> Self {
        Self { program: program.into(), args: Vec::new(), cwd: cwd.to_path_buf() }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.contains(char::is_whitespace) {
                write!(f, " {:?}", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// 命令执行器
///
/// 回调结果约定为 `[stdout, stderr]`；命令失败时错误槽位非空，但输出仍然保留。
pub trait CommandRunner {
    fn run(&self, spec: CommandSpec, cb: Callback);
}

/// 基于 tokio::process 的执行器
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&self, spec: CommandSpec, cb: Callback) {
        tokio::spawn(async move {
            let start_time = Instant::now();
            let output = Command::new(&spec.program)
                .args(&spec.args)
                .current_dir(&spec.cwd)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .output()
                .await;

            match output {
                Ok(output) => {
                    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
                    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
                    debug!(
                        command = %spec,
                        status = ?output.status.code(),
                        elapsed_ms = start_time.elapsed().as_millis() as u64,
                        "command finished"
                    );
                    let error = if output.status.success() {
                        None
                    } else {
                        let exit_code = output.status.code().unwrap_or(-1);
                        Some(anyhow!("`{}` exited with status {}", spec, exit_code))
                    };
                    cb.fire(Reply::with(error, vec![Value::String(stdout), Value::String(stderr)]));
                }
                Err(err) => {
                    cb.fail(anyhow::Error::new(err).context(format!("Failed to run `{}`", spec)));
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_quotes_arguments_with_spaces() {
        let spec = CommandSpec::new("git", Path::new("."))
            .arg("commit")
            .args(["-am", "Publish v1.0.0"]);
        assert_eq!(spec.to_string(), "git commit -am \"Publish v1.0.0\"");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_commands_keep_their_output() {
        let dir = tempfile::tempdir().unwrap();
        let co = crate::coroutine::from_fn(|co, dir: PathBuf| async move {
            let spec = CommandSpec::new("sh", &dir).args(["-c", "echo out; echo err >&2; exit 3"]);
            ProcessRunner.run(spec, co.callback()?);
            co.join_one().await
        });

        let reply = co.call(dir.path().to_path_buf()).await.unwrap();
        assert!(reply.error.unwrap().to_string().contains("status 3"));
        assert_eq!(reply.values[0], Value::String("out\n".into()));
        assert_eq!(reply.values[1], Value::String("err\n".into()));
    }
}
