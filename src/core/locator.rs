// ============================================================================
// ezbuild - 包定位器
// ============================================================================
//
// 文件: src/core/locator.rs
// 职责: 从入口文件向上查找所属包的 package.json
// 边界:
//   - ✅ 目录逐级向上查找
//   - ✅ 路径规范化与相对路径计算
//   - ❌ 不应修改清单内容
//
// ============================================================================

use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::coroutine::from_fn;
use crate::models::PackageJson;
use crate::ops;
use crate::utils::constants::PACKAGE_JSON;

/// 找到的包
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Located {
    /// package.json 所在目录
    pub dir: PathBuf,
    /// package.json 内容
    pub manifest: PackageJson,
}

/// 从入口文件所在目录开始向上查找 package.json
pub async fn locate_package(entry: PathBuf) -> Result<Located> {
    let start = resolve(&entry)?
        .parent()
        .map(Path::to_path_buf)
        .context("entry has no parent directory")?;

    let locate = from_fn(|co, start: PathBuf| async move {
        let mut dir = start;
        loop {
            ops::fs::access(dir.clone(), co.callback()?);
            if !co.join_one().await?.is_ok() {
                bail!("You need to specify a package.json file!");
            }

            let candidate = dir.join(PACKAGE_JSON);
            ops::fs::access(candidate.clone(), co.callback()?);
            if co.join_one().await?.is_ok() {
                debug!(path = %candidate.display(), "found package.json");
                let value = co.wait(ops::manifest::load_json(candidate)).await?;
                let manifest = PackageJson::from_value(value)?;
                return Ok(Located { dir, manifest });
            }

            dir = match dir.parent() {
                Some(parent) => parent.to_path_buf(),
                None => bail!("No package.json found in any parent directory"),
            };
        }
    });

    locate.call(start).await
}

/// 转为规范化的绝对路径
pub fn resolve(path: &Path) -> Result<PathBuf> {
    let absolute = std::path::absolute(path)
        .with_context(|| format!("Failed to resolve {}", path.display()))?;
    Ok(normalize(&absolute))
}

/// 按字面消除 `.` 与 `..`
pub fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// `to` 相对于目录 `from` 的路径，使用 `/` 分隔
pub fn relative_path(from: &Path, to: &Path) -> String {
    let from: Vec<_> = from.components().collect();
    let to: Vec<_> = to.components().collect();
    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();

    let mut parts: Vec<String> = std::iter::repeat("..".to_string())
        .take(from.len() - common)
        .collect();
    parts.extend(to[common..].iter().map(|c| c.as_os_str().to_string_lossy().into_owned()));
    parts.join("/")
}
