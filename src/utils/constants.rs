// ============================================================================
// ezbuild - 常量定义
// ============================================================================
//
// 文件: src/utils/constants.rs
// 职责: 应用程序常量定义
// 边界:
//   - ✅ 应用程序常量定义
//   - ✅ 图标字符定义
//   - ❌ 不应包含动态配置
//   - ❌ 不应包含业务逻辑
//
// ============================================================================

/// 日志标签
pub const APP_TAG: &str = "[EZBUILD]";

/// package.json 文件名
pub const PACKAGE_JSON: &str = "package.json";

/// bower.json 文件名
pub const BOWER_JSON: &str = "bower.json";

/// .gitignore 文件名
pub const GITIGNORE: &str = ".gitignore";

/// 图标
pub mod icons {
    /// 成功图标
    pub const SUCCESS: &str = "✓";
    /// 错误图标
    pub const ERROR: &str = "✗";
    /// 跳过图标
    pub const SKIP: &str = "○";
}

/// 加载 spinner 字符（最后一个为结束帧）
pub mod spinner_chars {
    pub const TICKS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧ ";
}
