// ============================================================================
// ezbuild - 打包器
// ============================================================================
//
// 文件: src/core/bundler.rs
// 职责: 计算构建配置，并行执行 CJS 与 UMD 两种格式的打包
// 边界:
//   - ✅ 构建配置推导
//   - ✅ 打包命令拼装
//   - ✅ 基于文件指纹的增量跳过
//   - ❌ 不应包含终端输出
//   - ❌ 不应包含监听循环
//
// ============================================================================

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::UNIX_EPOCH;

use anyhow::{bail, Context, Result};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::core::locator::{locate_package, resolve};
use crate::coroutine::from_fn;
use crate::models::Config;
use crate::ops::{CommandRunner, CommandSpec};

/// 输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Format {
    Cjs,
    Umd,
}

impl Format {
    pub const ALL: [Format; 2] = [Format::Cjs, Format::Umd];

    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Cjs => "cjs",
            Format::Umd => "umd",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|format| format.as_str() == name)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 从 package.json 推导出的构建配置
#[derive(Debug, Clone, PartialEq)]
pub struct BuildConfig {
    pub name: String,
    /// 包目录
    pub dir: PathBuf,
    pub entry: PathBuf,
    pub cjs: PathBuf,
    pub umd: PathBuf,
    /// CJS 构建中保持外部引用的依赖
    pub external: Vec<String>,
}

impl BuildConfig {
    pub fn destination(&self, format: Format) -> &Path {
        match format {
            Format::Cjs => &self.cjs,
            Format::Umd => &self.umd,
        }
    }

    /// 拼装某个格式的打包命令
    pub fn command(&self, format: Format, config: &Config) -> Result<CommandSpec> {
        let (program, prefix) = config.bundler_program()?;
        let mut spec = CommandSpec::new(program, &self.dir)
            .args(prefix.iter().cloned())
            .arg(self.entry.to_string_lossy())
            .args(["--format", format.as_str(), "--name", self.name.as_str()])
            .arg("--file")
            .arg(self.destination(format).to_string_lossy());

        if config.bundle.sourcemap {
            spec = spec.arg("--sourcemap");
        }

        match format {
            Format::Cjs if !self.external.is_empty() => {
                spec = spec.arg("--external").arg(self.external.join(","));
            }
            Format::Cjs => {}
            Format::Umd => {
                for plugin in &config.bundle.umd_plugins {
                    spec = spec.arg("--plugin").arg(plugin.as_str());
                }
            }
        }

        Ok(spec)
    }
}

/// 定位入口所属的包并推导构建配置
pub async fn compute_config(entry: PathBuf) -> Result<BuildConfig> {
    let entry = resolve(&entry)?;
    let located = locate_package(entry.clone()).await?;
    let manifest = &located.manifest;

    let name = manifest.name().context("You must specify the `name` property in your package.json!")?;
    let main = manifest.main().context("You must specify the `main` property in your package.json!")?;
    let browser = manifest
        .browser()
        .context("You must specify the `browser` property in your package.json!")?;

    Ok(BuildConfig {
        name: name.to_string(),
        cjs: located.dir.join(main),
        umd: located.dir.join(browser),
        external: manifest.dependency_names(),
        entry,
        dir: located.dir.clone(),
    })
}

/// 每种格式上次成功构建时的源文件指纹
#[derive(Debug, Default)]
pub struct BundleCache {
    fingerprints: HashMap<Format, u64>,
}

impl BundleCache {
    pub fn is_fresh(&self, format: Format, fingerprint: u64) -> bool {
        self.fingerprints.get(&format) == Some(&fingerprint)
    }

    pub fn record(&mut self, format: Format, fingerprint: u64) {
        self.fingerprints.insert(format, fingerprint);
    }

    pub fn invalidate(&mut self, format: Format) {
        self.fingerprints.remove(&format);
    }
}

/// 包目录的指纹：相对路径、大小与修改时间
///
/// 跳过 `node_modules`、`.git` 与产物目录。
pub fn fingerprint(dir: &Path, dist_dir: &str) -> Result<u64> {
    let mut entries = Vec::new();
    let walker = WalkDir::new(dir).sort_by_file_name().into_iter().filter_entry(|entry| {
        let name = entry.file_name().to_string_lossy();
        entry.depth() == 0 || !(name == "node_modules" || name == ".git" || name == dist_dir)
    });

    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to scan {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let metadata = entry.metadata()?;
        let modified = metadata
            .modified()
            .ok()
            .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
            .map(|elapsed| elapsed.as_nanos())
            .unwrap_or_default();
        let relative = entry.path().strip_prefix(dir).unwrap_or(entry.path()).to_path_buf();
        entries.push((relative, metadata.len(), modified));
    }

    let mut hasher = DefaultHasher::new();
    entries.hash(&mut hasher);
    Ok(hasher.finish())
}

/// 一次构建的结果
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BuildReport {
    pub built: Vec<Format>,
    pub skipped: Vec<Format>,
}

/// 构建入口：两种格式并行执行，全部结束后汇总
pub async fn build(
    entry: PathBuf,
    config: &Config,
    runner: Rc<dyn CommandRunner>,
    cache: &mut BundleCache,
) -> Result<BuildReport> {
    let build_config = compute_config(entry).await?;
    let fingerprint = fingerprint(&build_config.dir, &config.bundle.dist_dir)?;

    let (skipped, stale): (Vec<Format>, Vec<Format>) =
        Format::ALL.into_iter().partition(|format| cache.is_fresh(*format, fingerprint));
    if stale.is_empty() {
        debug!("sources unchanged, skipping build");
        return Ok(BuildReport { built: Vec::new(), skipped });
    }

    let mut commands = Vec::with_capacity(stale.len());
    for format in &stale {
        commands.push((*format, build_config.command(*format, config)?));
    }

    let bundle = from_fn(|co, (commands, runner): (Vec<(Format, CommandSpec)>, Rc<dyn CommandRunner>)| async move {
        for (format, spec) in commands {
            info!(format = %format, command = %spec, "bundling");
            runner.run(spec, co.named(format.as_str())?);
        }
        co.join().await?.into_named()
    });
    let replies = bundle.call((commands, runner)).await?;

    let mut built = Vec::new();
    let mut failures = Vec::new();
    for (name, reply) in replies {
        let format = Format::from_name(&name).with_context(|| format!("unexpected bundle slot `{}`", name))?;
        match reply.error {
            None => {
                cache.record(format, fingerprint);
                built.push(format);
            }
            Some(err) => {
                cache.invalidate(format);
                let stderr = reply.values.get(1).and_then(|v| v.as_str()).unwrap_or_default();
                failures.push(format!("{} build failed: {:#}\n{}", format, err, stderr));
            }
        }
    }

    if !failures.is_empty() {
        bail!(failures.join("\n"));
    }
    Ok(BuildReport { built, skipped })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::testing::ScriptedRunner;
    use crate::utils::constants::PACKAGE_JSON;
    use serde_json::json;

    fn write_package(dir: &Path) {
        let manifest = json!({
            "name": "lib0",
            "main": "./dist/lib0.cjs.js",
            "browser": "./dist/lib0.umd.js",
            "dependencies": { "lodash": "^4.0.0", "tslib": "^2.0.0" }
        });
        std::fs::write(dir.join(PACKAGE_JSON), manifest.to_string()).unwrap();
        std::fs::create_dir_all(dir.join("src")).unwrap();
        std::fs::write(dir.join("src/index.js"), "export default 1;").unwrap();
    }

    #[tokio::test]
    async fn computes_config_from_package_json() {
        let dir = tempfile::tempdir().unwrap();
        write_package(dir.path());
        let root = resolve(dir.path()).unwrap();

        let config = compute_config(root.join("src/index.js")).await.unwrap();
        assert_eq!(config.name, "lib0");
        assert_eq!(config.dir, root);
        assert_eq!(config.cjs, root.join("dist/lib0.cjs.js"));
        assert_eq!(config.external, vec!["lodash", "tslib"]);
    }

    #[tokio::test]
    async fn missing_main_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(PACKAGE_JSON), json!({ "name": "lib0" }).to_string()).unwrap();

        let err = compute_config(dir.path().join("index.js")).await.unwrap_err();
        assert_eq!(err.to_string(), "You must specify the `main` property in your package.json!");
    }

    #[tokio::test]
    async fn builds_both_formats_then_skips_unchanged_sources() {
        let dir = tempfile::tempdir().unwrap();
        write_package(dir.path());
        let config = Config::default();
        let runner = Rc::new(ScriptedRunner::default());
        let mut cache = BundleCache::default();

        let report = build(dir.path().join("src/index.js"), &config, runner.clone(), &mut cache)
            .await
            .unwrap();
        assert_eq!(report.built, vec![Format::Cjs, Format::Umd]);

        let lines = runner.command_lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("--format cjs") && lines[0].contains("--external lodash,tslib"));
        assert!(lines[1].contains("--format umd") && lines[1].contains("--plugin commonjs"));

        let again = build(dir.path().join("src/index.js"), &config, runner.clone(), &mut cache)
            .await
            .unwrap();
        assert!(again.built.is_empty());
        assert_eq!(again.skipped, vec![Format::Cjs, Format::Umd]);
        assert_eq!(runner.command_lines().len(), 2);
    }

    #[tokio::test]
    async fn failed_format_is_reported_and_rebuilt_next_time() {
        let dir = tempfile::tempdir().unwrap();
        write_package(dir.path());
        let config = Config::default();
        let runner = Rc::new(ScriptedRunner::default().failing_on("npx rollup"));
        let mut cache = BundleCache::default();

        let err = build(dir.path().join("src/index.js"), &config, runner.clone(), &mut cache)
            .await
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("cjs build failed"));
        assert!(message.contains("umd build failed"));
        assert!(!cache.is_fresh(Format::Cjs, fingerprint(dir.path(), "dist").unwrap()));
    }

    #[test]
    fn fingerprint_ignores_dist_and_tracks_sources() {
        let dir = tempfile::tempdir().unwrap();
        write_package(dir.path());
        let before = fingerprint(dir.path(), "dist").unwrap();

        std::fs::create_dir_all(dir.path().join("dist")).unwrap();
        std::fs::write(dir.path().join("dist/lib0.cjs.js"), "built").unwrap();
        assert_eq!(fingerprint(dir.path(), "dist").unwrap(), before);

        std::fs::write(dir.path().join("src/extra.js"), "export const x = 1;").unwrap();
        assert_ne!(fingerprint(dir.path(), "dist").unwrap(), before);
    }
}
