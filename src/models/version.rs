// ============================================================================
// ezbuild - 版本号模型
// ============================================================================
//
// 文件: src/models/version.rs
// 职责: 发布类型定义与语义化版本递增
// 边界:
//   - ✅ 发布类型解析
//   - ✅ 版本递增规则（与 npm semver.inc 一致）
//   - ❌ 不应包含清单读写
//   - ❌ 不应包含用户交互
//
// ============================================================================

use std::fmt;
use std::str::FromStr;

use semver::{BuildMetadata, Prerelease, Version};
use thiserror::Error;

/// 版本递增错误
#[derive(Debug, Error)]
pub enum ReleaseError {
    #[error("Invalid semver version in package.json: {0}")]
    InvalidVersion(String),

    #[error("You must choose one of these: {}", ReleaseType::names().join(" | "))]
    UnknownReleaseType(String),

    #[error("Invalid prerelease identifier `{0}`")]
    InvalidPrerelease(String),
}

/// 发布类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseType {
    Major,
    Minor,
    Patch,
    Premajor,
    Preminor,
    Prepatch,
    Prerelease,
}

impl ReleaseType {
    pub const ALL: [ReleaseType; 7] = [
        ReleaseType::Major,
        ReleaseType::Minor,
        ReleaseType::Patch,
        ReleaseType::Premajor,
        ReleaseType::Preminor,
        ReleaseType::Prepatch,
        ReleaseType::Prerelease,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseType::Major => "major",
            ReleaseType::Minor => "minor",
            ReleaseType::Patch => "patch",
            ReleaseType::Premajor => "premajor",
            ReleaseType::Preminor => "preminor",
            ReleaseType::Prepatch => "prepatch",
            ReleaseType::Prerelease => "prerelease",
        }
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(ReleaseType::as_str).collect()
    }
}

impl fmt::Display for ReleaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReleaseType {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s.trim())
            .ok_or_else(|| ReleaseError::UnknownReleaseType(s.to_string()))
    }
}

/// 按发布类型递增版本号
pub fn bump(version: &str, kind: ReleaseType, prerelease_id: &str) -> Result<Version, ReleaseError> {
    let mut next = Version::parse(version.trim())
        .map_err(|_| ReleaseError::InvalidVersion(version.to_string()))?;
    next.build = BuildMetadata::EMPTY;
    let was_prerelease = !next.pre.is_empty();

    match kind {
        ReleaseType::Major => {
            // 1.0.0-alpha.1 -> 1.0.0
            if !(was_prerelease && next.minor == 0 && next.patch == 0) {
                next.major += 1;
            }
            next.minor = 0;
            next.patch = 0;
            next.pre = Prerelease::EMPTY;
        }
        ReleaseType::Minor => {
            if !(was_prerelease && next.patch == 0) {
                next.minor += 1;
            }
            next.patch = 0;
            next.pre = Prerelease::EMPTY;
        }
        ReleaseType::Patch => {
            if !was_prerelease {
                next.patch += 1;
            }
            next.pre = Prerelease::EMPTY;
        }
        ReleaseType::Premajor => {
            next.major += 1;
            next.minor = 0;
            next.patch = 0;
            next.pre = first_prerelease(prerelease_id)?;
        }
        ReleaseType::Preminor => {
            next.minor += 1;
            next.patch = 0;
            next.pre = first_prerelease(prerelease_id)?;
        }
        ReleaseType::Prepatch => {
            next.patch += 1;
            next.pre = first_prerelease(prerelease_id)?;
        }
        ReleaseType::Prerelease => {
            if was_prerelease {
                next.pre = next_prerelease(&next.pre, prerelease_id)?;
            } else {
                next.patch += 1;
                next.pre = first_prerelease(prerelease_id)?;
            }
        }
    }

    Ok(next)
}

fn first_prerelease(id: &str) -> Result<Prerelease, ReleaseError> {
    parse_prerelease(&format!("{}.0", id))
}

/// alpha.1 -> alpha.2，alpha -> alpha.0，beta.3 -> alpha.0
fn next_prerelease(current: &Prerelease, id: &str) -> Result<Prerelease, ReleaseError> {
    let mut parts: Vec<String> = current.as_str().split('.').map(str::to_string).collect();
    if parts.first().map(String::as_str) != Some(id) {
        return first_prerelease(id);
    }

    match parts.last().and_then(|last| last.parse::<u64>().ok()) {
        Some(n) if parts.len() > 1 => {
            let last = parts.len() - 1;
            parts[last] = (n + 1).to_string();
        }
        _ => parts.push("0".to_string()),
    }
    parse_prerelease(&parts.join("."))
}

fn parse_prerelease(text: &str) -> Result<Prerelease, ReleaseError> {
    Prerelease::new(text).map_err(|_| ReleaseError::InvalidPrerelease(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inc(version: &str, kind: ReleaseType) -> String {
        bump(version, kind, "alpha").unwrap().to_string()
    }

    #[test]
    fn release_increments() {
        assert_eq!(inc("1.2.3", ReleaseType::Major), "2.0.0");
        assert_eq!(inc("1.2.3", ReleaseType::Minor), "1.3.0");
        assert_eq!(inc("1.2.3", ReleaseType::Patch), "1.2.4");
    }

    #[test]
    fn release_from_prerelease_drops_the_tag() {
        assert_eq!(inc("2.0.0-alpha.3", ReleaseType::Major), "2.0.0");
        assert_eq!(inc("1.3.0-alpha.0", ReleaseType::Minor), "1.3.0");
        assert_eq!(inc("1.2.4-alpha.1", ReleaseType::Patch), "1.2.4");
        assert_eq!(inc("1.2.4-alpha.1", ReleaseType::Major), "2.0.0");
    }

    #[test]
    fn prerelease_increments() {
        assert_eq!(inc("1.2.3", ReleaseType::Premajor), "2.0.0-alpha.0");
        assert_eq!(inc("1.2.3", ReleaseType::Preminor), "1.3.0-alpha.0");
        assert_eq!(inc("1.2.3", ReleaseType::Prepatch), "1.2.4-alpha.0");
        assert_eq!(inc("1.2.3", ReleaseType::Prerelease), "1.2.4-alpha.0");
        assert_eq!(inc("1.2.4-alpha.0", ReleaseType::Prerelease), "1.2.4-alpha.1");
        assert_eq!(inc("1.2.4-alpha", ReleaseType::Prerelease), "1.2.4-alpha.0");
        assert_eq!(inc("1.2.4-beta.5", ReleaseType::Prerelease), "1.2.4-alpha.0");
    }

    #[test]
    fn build_metadata_is_dropped() {
        assert_eq!(inc("1.0.0+build.7", ReleaseType::Patch), "1.0.1");
    }

    #[test]
    fn parses_release_types() {
        assert_eq!("prepatch".parse::<ReleaseType>().unwrap(), ReleaseType::Prepatch);
        assert_eq!(" minor\n".parse::<ReleaseType>().unwrap(), ReleaseType::Minor);
        let err = "huge".parse::<ReleaseType>().unwrap_err();
        assert!(err.to_string().contains("major | minor | patch"));
    }

    #[test]
    fn invalid_versions_are_rejected() {
        assert!(matches!(
            bump("one.two", ReleaseType::Patch, "alpha"),
            Err(ReleaseError::InvalidVersion(_))
        ));
    }
}
