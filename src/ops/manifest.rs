// ============================================================================
// ezbuild - JSON 清单读写
// ============================================================================
//
// 文件: src/ops/manifest.rs
// 职责: 以可等待 future 形式读写 JSON 文件
// 边界:
//   - ✅ JSON 文件加载与解析
//   - ✅ JSON 文件格式化写入（2 空格缩进，末尾换行）
//   - ❌ 不应包含字段级修改逻辑
//
// ============================================================================

use std::future::Future;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde_json::Value;

/// 加载 JSON 文件
pub fn load_json(path: impl Into<PathBuf>) -> impl Future<Output = Result<Value>> + 'static {
    let path = path.into();
    async move {
        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }
}

/// 写入 JSON 文件，完成时结果为 `null`
pub fn write_json(path: impl Into<PathBuf>, value: Value) -> impl Future<Output = Result<Value>> + 'static {
    let path = path.into();
    async move {
        let mut content = serde_json::to_string_pretty(&value)?;
        content.push('\n');
        tokio::fs::write(&path, content)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(Value::Null)
    }
}
