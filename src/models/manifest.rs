// ============================================================================
// ezbuild - 包清单数据模型
// ============================================================================
//
// 文件: src/models/manifest.rs
// 职责: package.json / bower.json 数据结构定义
// 边界:
//   - ✅ 清单字段访问与修改
//   - ✅ 保留未知字段与字段顺序
//   - ✅ 数据序列化/反序列化
//   - ❌ 不应包含文件读写（由 ops::manifest 负责）
//   - ❌ 不应包含构建或发布逻辑
//
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// package.json 文件结构
///
/// 以完整的 JSON 对象保存，写回时不会丢失任何字段。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageJson {
    fields: Map<String, Value>,
}

impl PackageJson {
    pub fn from_value(value: Value) -> anyhow::Result<Self> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => anyhow::bail!("manifest must be a JSON object, found {}", type_name(&other)),
        }
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }

    /// 读取字符串字段
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// 设置字符串字段
    pub fn set_str(&mut self, key: &str, value: impl Into<String>) {
        self.fields.insert(key.to_string(), Value::String(value.into()));
    }

    pub fn name(&self) -> Option<&str> {
        self.get_str("name")
    }

    pub fn version(&self) -> Option<&str> {
        self.get_str("version")
    }

    pub fn main(&self) -> Option<&str> {
        self.get_str("main")
    }

    pub fn browser(&self) -> Option<&str> {
        self.get_str("browser")
    }

    /// 所有运行时依赖名
    pub fn dependency_names(&self) -> Vec<String> {
        self.fields
            .get("dependencies")
            .and_then(Value::as_object)
            .map(|deps| deps.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// 设置 scripts 中的脚本，scripts 不存在或不是对象时重建
    pub fn set_script(&mut self, name: &str, command: impl Into<String>) {
        let scripts = self
            .fields
            .entry("scripts")
            .or_insert_with(|| Value::Object(Map::new()));
        if !scripts.is_object() {
            *scripts = Value::Object(Map::new());
        }
        if let Value::Object(scripts) = scripts {
            scripts.insert(name.to_string(), Value::String(command.into()));
        }
    }

    pub fn script(&self, name: &str) -> Option<&str> {
        self.fields
            .get("scripts")
            .and_then(|scripts| scripts.get(name))
            .and_then(Value::as_str)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
