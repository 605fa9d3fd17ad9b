// ============================================================================
// ezbuild - 项目初始化
// ============================================================================
//
// 文件: src/core/init.rs
// 职责: 为入口文件所属的包写入构建相关字段
// 边界:
//   - ✅ package.json 字段与脚本更新
//   - ✅ bower.json 与 .gitignore 同步
//   - ❌ 不应执行构建
//
// ============================================================================

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use tracing::debug;

use crate::core::locator::{locate_package, relative_path, resolve, Located};
use crate::coroutine::{from_fn, Reply};
use crate::models::{Config, PackageJson};
use crate::ops;
use crate::utils::constants::{BOWER_JSON, GITIGNORE, PACKAGE_JSON};

/// 初始化结果
#[derive(Debug, Clone, PartialEq)]
pub struct InitReport {
    pub manifest_path: PathBuf,
    /// 是否找到并更新了 bower.json
    pub bower_updated: bool,
    /// 是否向 .gitignore 添加了产物目录
    pub gitignore_updated: bool,
}

/// 初始化入口文件所属的包
pub async fn init_project(entry: PathBuf, config: &Config) -> Result<InitReport> {
    let entry = resolve(&entry)?;
    let dist_dir = config.bundle.dist_dir.clone();

    let init = from_fn(|co, (entry, dist_dir): (PathBuf, String)| async move {
        let Located { dir, manifest } = co.wait_as(locate_package(entry.clone())).await?;
        let mut manifest = manifest;
        let name = manifest
            .name()
            .context("You must specify the `name` property in your package.json!")?
            .to_string();
        let entry = relative_path(&dir, &entry);

        let browser = format!("./{}/{}.umd.js", dist_dir, name);
        manifest.set_str("main", format!("./{}/{}.cjs.js", dist_dir, name));
        manifest.set_str("jsnext:main", entry.as_str());
        manifest.set_str("browser", browser.as_str());
        manifest.set_script("build", format!("ezbuild build {}", entry));
        manifest.set_script("build:watch", format!("ezbuild watch {}", entry));
        manifest.set_script("publish", "npm run lint && npm run build && ezbuild publish .");

        let manifest_path = dir.join(PACKAGE_JSON);
        co.wait(ops::manifest::write_json(manifest_path.clone(), manifest.into_value()))
            .await?;
        debug!(path = %manifest_path.display(), "package.json updated");

        let bower_path = dir.join(BOWER_JSON);
        let gitignore_path = dir.join(GITIGNORE);
        ops::fs::access(bower_path.clone(), co.named("bower")?);
        ops::fs::read_to_string(gitignore_path.clone(), co.named("gitignore")?);
        let mut probes = co.join().await?.into_named()?;
        let bower = take(&mut probes, "bower")?;
        let gitignore = take(&mut probes, "gitignore")?;

        let bower_updated = bower.is_ok();
        if bower_updated {
            let value = co.wait(ops::manifest::load_json(bower_path.clone())).await?;
            let mut bower = PackageJson::from_value(value)?;
            bower.set_str("main", browser.as_str());
            co.wait(ops::manifest::write_json(bower_path, bower.into_value())).await?;
        }

        let existing = if gitignore.is_ok() { gitignore.text(0).to_string() } else { String::new() };
        let gitignore_updated = !ignores_dir(&existing, &dist_dir);
        if gitignore_updated {
            ops::fs::write(gitignore_path, format!("{}\n{}", dist_dir, existing), co.callback()?);
            co.join_one().await?.into_result()?;
        }

        Ok(InitReport { manifest_path, bower_updated, gitignore_updated })
    });

    init.call((entry, dist_dir)).await
}

fn take(replies: &mut BTreeMap<String, Reply>, name: &str) -> Result<Reply> {
    replies.remove(name).ok_or_else(|| anyhow!("missing `{}` reply", name))
}

/// .gitignore 是否已有忽略产物目录的行
fn ignores_dir(gitignore: &str, dir: &str) -> bool {
    gitignore.lines().map(str::trim).any(|line| {
        let line = line.strip_prefix("./").or_else(|| line.strip_prefix('/')).unwrap_or(line);
        line.trim_end_matches('/') == dir
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::path::Path;

    fn read_json(path: &Path) -> Value {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    fn setup() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(PACKAGE_JSON),
            json!({ "name": "lib0", "version": "1.0.0", "scripts": { "lint": "eslint src" } }).to_string(),
        )
        .unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        dir
    }

    #[tokio::test]
    async fn writes_build_fields_and_ignores_dist() {
        let dir = setup();

        let report = init_project(dir.path().join("src/index.js"), &Config::default())
            .await
            .unwrap();
        assert!(!report.bower_updated);
        assert!(report.gitignore_updated);

        let manifest = read_json(&dir.path().join(PACKAGE_JSON));
        assert_eq!(manifest["main"], "./dist/lib0.cjs.js");
        assert_eq!(manifest["jsnext:main"], "src/index.js");
        assert_eq!(manifest["browser"], "./dist/lib0.umd.js");
        assert_eq!(manifest["scripts"]["lint"], "eslint src");
        assert_eq!(manifest["scripts"]["build"], "ezbuild build src/index.js");
        assert_eq!(manifest["scripts"]["build:watch"], "ezbuild watch src/index.js");

        let gitignore = std::fs::read_to_string(dir.path().join(GITIGNORE)).unwrap();
        assert_eq!(gitignore, "dist\n");
    }

    #[tokio::test]
    async fn updates_bower_and_keeps_existing_ignore_entry() {
        let dir = setup();
        std::fs::write(dir.path().join(BOWER_JSON), json!({ "name": "lib0" }).to_string()).unwrap();
        std::fs::write(dir.path().join(GITIGNORE), "node_modules\n./dist\n").unwrap();

        let report = init_project(dir.path().join("src/index.js"), &Config::default())
            .await
            .unwrap();
        assert!(report.bower_updated);
        assert!(!report.gitignore_updated);

        assert_eq!(read_json(&dir.path().join(BOWER_JSON))["main"], "./dist/lib0.umd.js");
        let gitignore = std::fs::read_to_string(dir.path().join(GITIGNORE)).unwrap();
        assert_eq!(gitignore, "node_modules\n./dist\n");
    }

    #[test]
    fn recognizes_dist_ignore_spellings() {
        assert!(ignores_dir("dist", "dist"));
        assert!(ignores_dir("./dist\n", "dist"));
        assert!(ignores_dir("/dist/\n", "dist"));
        assert!(!ignores_dir("distribution\n", "dist"));
    }
}
