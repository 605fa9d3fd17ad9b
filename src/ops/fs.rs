// ============================================================================
// ezbuild - 回调式文件操作
// ============================================================================
//
// 文件: src/ops/fs.rs
// 职责: 以回调句柄交付结果的文件系统操作
// 边界:
//   - ✅ 文件存在性/可写性检查
//   - ✅ 文本文件读写
//   - ❌ 不应包含 JSON 解析（由 ops::manifest 负责）
//   - ❌ 不应包含业务规则
//
// ============================================================================

use std::path::PathBuf;

use anyhow::Context;
use serde_json::Value;
use tracing::trace;

use crate::coroutine::Callback;

/// 检查路径是否存在；存在时以空结果触发，否则以错误触发
pub fn access(path: impl Into<PathBuf>, cb: Callback) {
    let path = path.into();
    tokio::spawn(async move {
        trace!(path = %path.display(), "access");
        match tokio::fs::metadata(&path).await {
            Ok(_) => cb.ok(Vec::new()),
            Err(err) => cb.fail(
                anyhow::Error::new(err).context(format!("Cannot access {}", path.display())),
            ),
        }
    });
}

/// 检查路径是否存在且可写
pub fn access_writable(path: impl Into<PathBuf>, cb: Callback) {
    let path = path.into();
    tokio::spawn(async move {
        let outcome = tokio::fs::metadata(&path)
            .await
            .with_context(|| format!("Cannot access {}", path.display()))
            .and_then(|meta| {
                if meta.permissions().readonly() {
                    anyhow::bail!("{} is read-only", path.display())
                }
                Ok(())
            });
        match outcome {
            Ok(()) => cb.ok(Vec::new()),
            Err(err) => cb.fail(err),
        }
    });
}

/// 读取文本文件，结果为文件内容
pub fn read_to_string(path: impl Into<PathBuf>, cb: Callback) {
    let path = path.into();
    tokio::spawn(async move {
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => cb.ok(vec![Value::String(content)]),
            Err(err) => cb.fail(
                anyhow::Error::new(err).context(format!("Failed to read {}", path.display())),
            ),
        }
    });
}

/// 写入文本文件
pub fn write(path: impl Into<PathBuf>, contents: String, cb: Callback) {
    let path = path.into();
    tokio::spawn(async move {
        match tokio::fs::write(&path, contents).await {
            Ok(()) => cb.ok(Vec::new()),
            Err(err) => cb.fail(
                anyhow::Error::new(err).context(format!("Failed to write {}", path.display())),
            ),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coroutine::from_fn;

    #[tokio::test]
    async fn reads_and_probes_files_through_callbacks() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notes.txt");

        let co = from_fn(|co, file: PathBuf| async move {
            write(file.clone(), "hello".to_string(), co.callback()?);
            co.join_one().await?.into_result()?;

            access(file.clone(), co.named("present")?);
            access(file.with_extension("missing"), co.named("absent")?);
            read_to_string(file, co.named("content")?);
            let replies = co.join().await?.into_named()?;

            Ok((
                replies["present"].is_ok(),
                replies["absent"].is_ok(),
                replies["content"].text(0).to_string(),
            ))
        });

        let (present, absent, content) = co.call(file).await.unwrap();
        assert!(present);
        assert!(!absent);
        assert_eq!(content, "hello");
    }
}
