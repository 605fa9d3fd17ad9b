// ============================================================================
// ezbuild - 发布流程
// ============================================================================
//
// 文件: src/core/publish.rs
// 职责: 交互式版本发布：升级版本号、提交、打标签、推送并发布到 npm
// 边界:
//   - ✅ 交互问答与确认
//   - ✅ package.json 与 bower.json 版本同步
//   - ✅ git 与包管理器命令序列
//   - ❌ 不应直接读取标准输入或启动进程（通过注入的执行器与提问器）
//
// ============================================================================

use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{anyhow, bail, Context, Result};
use tracing::{debug, warn};

use crate::coroutine::{from_fn, Co, Reply};
use crate::models::{bump, Config, PackageJson, ReleaseError, ReleaseType};
use crate::ops::{self, CommandRunner, CommandSpec, Prompter};
use crate::utils::constants::{BOWER_JSON, PACKAGE_JSON};
use crate::utils::logger::Logger;
use crate::utils::spinner::Spinner;

/// 发布结果
#[derive(Debug, Clone, PartialEq)]
pub struct PublishReport {
    pub version: String,
    pub message: String,
    /// 包管理器发布是否成功
    pub registry_published: bool,
}

/// 发布器
#[derive(Clone)]
pub struct Publisher {
    config: Config,
    runner: Rc<dyn CommandRunner>,
    prompter: Rc<dyn Prompter>,
}

impl Publisher {
    pub fn new(config: Config, runner: Rc<dyn CommandRunner>, prompter: Rc<dyn Prompter>) -> Self {
        Self { config, runner, prompter }
    }

    /// 发布 `dir` 下的包
    pub async fn publish(&self, dir: PathBuf) -> Result<PublishReport> {
        let release = from_fn(|co, (publisher, dir): (Publisher, PathBuf)| publisher.run(co, dir));
        release.call((self.clone(), dir)).await
    }

    async fn run(self, co: Co, dir: PathBuf) -> Result<PublishReport> {
        let manifest_path = dir.join(PACKAGE_JSON);
        let value = co
            .wait(ops::manifest::load_json(manifest_path.clone()))
            .await
            .context("package.json does not exist in this directory!")?;
        let mut manifest = PackageJson::from_value(value)?;
        let current = manifest
            .version()
            .ok_or_else(|| ReleaseError::InvalidVersion("<missing>".to_string()))?
            .to_string();

        let query = format!(
            "How do you want to increment the version? [{}]\n=> ",
            ReleaseType::names().join("|")
        );
        let kind: ReleaseType = self.ask(&co, &query).await?.parse()?;
        let version = bump(&current, kind, &self.config.release.prerelease_id)?.to_string();
        debug!(from = %current, to = %version, "version bumped");
        manifest.set_str("version", version.as_str());

        let message = self.read_message(&co).await?;
        let confirm = format!("Publishing version {}. Message: {}. Okay? [y|N]\n=> ", version, message);
        if !matches!(self.ask(&co, &confirm).await?.trim(), "y" | "Y" | "yes") {
            bail!("Interrupt publish");
        }

        co.wait(ops::manifest::write_json(manifest_path, manifest.into_value()))
            .await?;
        self.sync_bower(&co, &dir, &version).await?;

        let tag = format!("v{}", version);
        let git = |args: &[&str]| CommandSpec::new("git", &dir).args(args.iter().copied());

        self.step(
            &co,
            git(&["commit", "-am"]).arg(format!("Publish {}\n\n{}", tag, message)),
            "Unable to commit remaining changes",
            "Committed remaining changes",
        )
        .await?;
        self.step(&co, git(&["push"]), "Unable to push changes", "Pushed changes").await?;
        self.step(&co, git(&["checkout", "--detach"]), "Unable to detach head", "Detached head")
            .await?;

        let dist_dir = self.config.bundle.dist_dir.as_str();
        ops::fs::access(dir.join(dist_dir), co.callback()?);
        if co.join_one().await?.is_ok() {
            self.step(
                &co,
                git(&["add", "-f"]).arg(format!("./{}", dist_dir)),
                "Unable to add dist files",
                "Added dist files",
            )
            .await?;
            self.step(
                &co,
                git(&["commit", "-am"]).arg(format!("Publish {} -- added dist files", tag)),
                "Unable to commit dist files",
                "Committed dist files",
            )
            .await?;
        }

        self.step(
            &co,
            git(&["tag", tag.as_str(), "-m"]).arg(message.as_str()),
            "Unable to tag version",
            "Tagged version",
        )
        .await?;
        self.step(
            &co,
            git(&["push", self.config.release.remote.as_str(), tag.as_str()]),
            "Unable to push tag",
            "Pushed tag",
        )
        .await?;

        let package_manager = self.config.release.package_manager;
        let publish = CommandSpec::new(package_manager.as_str(), &dir).arg("publish");
        let published = self.exec(&co, publish).await?;
        let registry_published = published.is_ok();
        if registry_published {
            Logger::success(format!("Published to {}", package_manager));
        } else {
            warn!(error = ?published.error, "registry publish failed");
            Logger::failure(format!(
                "Failed to publish to {pm}. Please call `{pm} publish` yourself",
                pm = package_manager
            ));
        }

        let branch = self.config.release.branch.as_str();
        self.step(
            &co,
            git(&["checkout", branch]),
            &format!("Unable to checkout {}", branch),
            &format!("Checked out {}", branch),
        )
        .await?;

        Ok(PublishReport { version, message, registry_published })
    }

    async fn ask(&self, co: &Co, query: &str) -> Result<String> {
        self.prompter.question(query, co.callback()?);
        let reply = co.join_one().await?.into_result()?;
        reply
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("prompter replied with a non-string answer"))
    }

    /// 多行发布说明，空行结束
    async fn read_message(&self, co: &Co) -> Result<String> {
        let mut message =
            self.ask(co, "Insert the release message (press double enter to continue)\n=> ").await?;
        let mut line = message.clone();
        while !line.is_empty() {
            line = self.ask(co, "").await?;
            if !line.is_empty() {
                message.push('\n');
                message.push_str(&line);
            }
        }
        Ok(message)
    }

    async fn sync_bower(&self, co: &Co, dir: &Path, version: &str) -> Result<()> {
        let bower_path = dir.join(BOWER_JSON);
        ops::fs::access_writable(bower_path.clone(), co.callback()?);
        if !co.join_one().await?.is_ok() {
            debug!("no writable bower.json");
            return Ok(());
        }

        let value = co.wait(ops::manifest::load_json(bower_path.clone())).await?;
        let mut bower = PackageJson::from_value(value)?;
        bower.set_str("version", version);
        co.wait(ops::manifest::write_json(bower_path, bower.into_value())).await?;
        Ok(())
    }

    async fn exec(&self, co: &Co, spec: CommandSpec) -> Result<Reply> {
        let mut spinner = Spinner::new(spec.to_string(), self.config.output.show_progress);
        spinner.start();
        debug!(command = %spec, "running");
        self.runner.run(spec, co.callback()?);
        let reply = co.join_one().await;
        spinner.stop();
        reply
    }

    async fn step(&self, co: &Co, spec: CommandSpec, failure: &str, success: &str) -> Result<()> {
        let reply = self.exec(co, spec).await?;
        if let Some(err) = &reply.error {
            bail!("{}: {:#}\n\n{}\n\n{}", failure, err, reply.text(0), reply.text(1));
        }
        Logger::success(success);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::testing::{ScriptedPrompter, ScriptedRunner};
    use serde_json::{json, Value};

    fn setup(with_bower: bool) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let manifest = json!({ "name": "lib0", "version": "1.0.0" });
        std::fs::write(dir.path().join(PACKAGE_JSON), manifest.to_string()).unwrap();
        if with_bower {
            std::fs::write(dir.path().join(BOWER_JSON), manifest.to_string()).unwrap();
        }
        std::fs::create_dir_all(dir.path().join("dist")).unwrap();
        dir
    }

    fn quiet_config() -> Config {
        let mut config = Config::default();
        config.output.show_progress = false;
        config
    }

    fn read_version(path: &Path) -> Value {
        let value: Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        value["version"].clone()
    }

    #[tokio::test]
    async fn publishes_a_minor_release() {
        let dir = setup(true);
        let runner = Rc::new(ScriptedRunner::default());
        let prompter = Rc::new(ScriptedPrompter::new(["minor", "First line", "second line", "", "y"]));
        let publisher = Publisher::new(quiet_config(), runner.clone(), prompter.clone());

        let report = publisher.publish(dir.path().to_path_buf()).await.unwrap();
        assert_eq!(report.version, "1.1.0");
        assert_eq!(report.message, "First line\nsecond line");
        assert!(report.registry_published);

        assert_eq!(read_version(&dir.path().join(PACKAGE_JSON)), "1.1.0");
        assert_eq!(read_version(&dir.path().join(BOWER_JSON)), "1.1.0");
        assert_eq!(prompter.asked.borrow().len(), 5);
        assert_eq!(
            runner.command_lines(),
            vec![
                "git commit -am \"Publish v1.1.0\\n\\nFirst line\\nsecond line\"",
                "git push",
                "git checkout --detach",
                "git add -f ./dist",
                "git commit -am \"Publish v1.1.0 -- added dist files\"",
                "git tag v1.1.0 -m \"First line\\nsecond line\"",
                "git push origin v1.1.0",
                "npm publish",
                "git checkout master",
            ]
        );
    }

    #[tokio::test]
    async fn declined_confirmation_leaves_files_untouched() {
        let dir = setup(false);
        let runner = Rc::new(ScriptedRunner::default());
        let prompter = Rc::new(ScriptedPrompter::new(["patch", "", "n"]));
        let publisher = Publisher::new(quiet_config(), runner.clone(), prompter);

        let err = publisher.publish(dir.path().to_path_buf()).await.unwrap_err();
        assert_eq!(err.to_string(), "Interrupt publish");
        assert_eq!(read_version(&dir.path().join(PACKAGE_JSON)), "1.0.0");
        assert!(runner.command_lines().is_empty());
    }

    #[tokio::test]
    async fn unknown_release_type_is_rejected() {
        let dir = setup(false);
        let runner = Rc::new(ScriptedRunner::default());
        let prompter = Rc::new(ScriptedPrompter::new(["huge"]));
        let publisher = Publisher::new(quiet_config(), runner, prompter);

        let err = publisher.publish(dir.path().to_path_buf()).await.unwrap_err();
        assert!(err.to_string().starts_with("You must choose one of these"));
    }

    #[tokio::test]
    async fn failed_push_stops_the_sequence() {
        let dir = setup(false);
        let runner = Rc::new(ScriptedRunner::default().failing_on("git push"));
        let prompter = Rc::new(ScriptedPrompter::new(["major", "", "yes"]));
        let publisher = Publisher::new(quiet_config(), runner.clone(), prompter);

        let err = publisher.publish(dir.path().to_path_buf()).await.unwrap_err();
        assert!(err.to_string().starts_with("Unable to push changes"));
        assert_eq!(runner.command_lines().len(), 2);
    }

    #[tokio::test]
    async fn registry_failure_is_not_fatal() {
        let dir = setup(false);
        let runner = Rc::new(ScriptedRunner::default().failing_on("npm publish"));
        let prompter = Rc::new(ScriptedPrompter::new(["prerelease", "", "Y"]));
        let publisher = Publisher::new(quiet_config(), runner.clone(), prompter);

        let report = publisher.publish(dir.path().to_path_buf()).await.unwrap();
        assert_eq!(report.version, "1.0.1-alpha.0");
        assert!(!report.registry_published);
        assert_eq!(runner.command_lines().last().map(String::as_str), Some("git checkout master"));
    }
}
