//! 配置管理模块
//!
//! 提供 UI 层配置的加载、解析和管理功能。
//! 支持从 TOML 配置文件加载，也支持命令行参数覆盖。
//!
//! # 配置文件格式 (config.toml)
//!
//! ```toml
//! [window]
//! width = 800
//! height = 600
//! title = "DistUi"
//! resizable = true
//!
//! [graphics]
//! vsync = true
//! clear_color = [0.1, 0.1, 0.12, 1.0]
//!
//! [logging]
//! level = "info"      # trace, debug, info, warn, error
//! file_output = false
//!
//! [ui]
//! vertex_buffer_policy = "rebuild"   # 或 "keep-first"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::error::{ConfigError, Result};
use crate::geometry::VertexBufferPolicy;

/// UI 层配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// 窗口配置
    #[serde(default)]
    pub window: WindowConfig,

    /// 图形配置
    #[serde(default)]
    pub graphics: GraphicsConfig,

    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,

    /// UI 元素配置
    #[serde(default)]
    pub ui: UiConfig,
}

/// 窗口配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// 窗口宽度
    #[serde(default = "default_width")]
    pub width: u32,

    /// 窗口高度
    #[serde(default = "default_height")]
    pub height: u32,

    /// 窗口标题
    #[serde(default = "default_title")]
    pub title: String,

    /// 是否可调整大小
    #[serde(default = "default_resizable")]
    pub resizable: bool,
}

/// 图形配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphicsConfig {
    /// 垂直同步
    #[serde(default = "default_vsync")]
    pub vsync: bool,

    /// 清屏颜色（RGBA）
    #[serde(default = "default_clear_color")]
    pub clear_color: [f32; 4],
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// 是否输出到文件
    #[serde(default = "default_file_output")]
    pub file_output: bool,

    /// 日志文件路径
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

/// UI 元素配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// 顶点缓冲格式与当前材质不一致时的处理策略
    #[serde(default)]
    pub vertex_buffer_policy: VertexBufferPolicy,

    /// 可选的纹理文件路径（演示程序使用，缺省时生成棋盘格）
    #[serde(default)]
    pub texture: Option<String>,
}

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

// 默认值函数
fn default_width() -> u32 { 800 }
fn default_height() -> u32 { 600 }
fn default_title() -> String { "DistUi".to_string() }
fn default_resizable() -> bool { true }
fn default_vsync() -> bool { true }
fn default_clear_color() -> [f32; 4] { [0.1, 0.1, 0.12, 1.0] }
fn default_log_level() -> LogLevel { LogLevel::Info }
fn default_file_output() -> bool { false }
fn default_log_file() -> String { "dist_ui.log".to_string() }

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            title: default_title(),
            resizable: default_resizable(),
        }
    }
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            vsync: default_vsync(),
            clear_color: default_clear_color(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_output: default_file_output(),
            log_file: default_log_file(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            vertex_buffer_policy: VertexBufferPolicy::default(),
            texture: None,
        }
    }
}

impl Config {
    /// 从配置文件加载
    ///
    /// ```no_run
    /// use dist_ui::core::Config;
    ///
    /// let config = Config::from_file("config.toml")?;
    /// # Ok::<(), dist_ui::core::DistUiError>(())
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let contents = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path_str.clone()))?;

        Self::from_toml_str(&contents)
    }

    /// 从 TOML 字符串解析
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()).into())
    }

    /// 从配置文件加载，如果文件不存在则使用默认配置
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Self {
        Self::from_file(path).unwrap_or_default()
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, contents)?;
        Ok(())
    }

    /// 从命令行参数覆盖配置
    ///
    /// 支持的参数：
    /// - `--width <value>`: 设置窗口宽度
    /// - `--height <value>`: 设置窗口高度
    /// - `--keep-first`: 顶点缓冲格式不一致时保留首次创建的缓冲
    /// - `--texture <path>`: 演示程序使用的纹理文件
    pub fn apply_args<I>(&mut self, args: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();

        if args.iter().any(|a| a == "--keep-first") {
            self.ui.vertex_buffer_policy = VertexBufferPolicy::KeepFirst;
        }

        if let Some(width) = arg_value(&args, "--width").and_then(|v| v.parse().ok()) {
            self.window.width = width;
        }

        if let Some(height) = arg_value(&args, "--height").and_then(|v| v.parse().ok()) {
            self.window.height = height;
        }

        if let Some(texture) = arg_value(&args, "--texture") {
            self.ui.texture = Some(texture.to_string());
        }
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::InvalidValue {
                field: "window.width/height".to_string(),
                reason: "Window dimensions must be greater than 0".to_string(),
            }.into());
        }

        if self.graphics.clear_color.iter().any(|c| !(0.0..=1.0).contains(c)) {
            return Err(ConfigError::InvalidValue {
                field: "graphics.clear_color".to_string(),
                reason: "Color channels must be within [0, 1]".to_string(),
            }.into());
        }

        Ok(())
    }
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    let idx = args.iter().position(|a| a == flag)?;
    args.get(idx + 1).map(String::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.height, 600);
        assert_eq!(config.ui.vertex_buffer_policy, VertexBufferPolicy::Rebuild);
        assert!(config.ui.texture.is_none());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.window.width = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.graphics.clear_color = [1.5, 0.0, 0.0, 1.0];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml() {
        let config = Config::from_toml_str(
            r#"
            [window]
            width = 1280

            [ui]
            vertex_buffer_policy = "keep-first"
            "#,
        )
        .unwrap();

        assert_eq!(config.window.width, 1280);
        assert_eq!(config.window.height, 600);
        assert_eq!(config.logging.level, LogLevel::Info);
        assert_eq!(config.ui.vertex_buffer_policy, VertexBufferPolicy::KeepFirst);
    }

    #[test]
    fn test_invalid_toml() {
        let err = Config::from_toml_str("[window]\nwidth = \"wide\"").unwrap_err();
        assert!(matches!(err, crate::core::DistUiError::Config(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_apply_args() {
        let mut config = Config::default();
        config.apply_args(["dist_ui", "--width", "1024", "--keep-first", "--texture", "logo.png"]);

        assert_eq!(config.window.width, 1024);
        assert_eq!(config.window.height, 600);
        assert_eq!(config.ui.vertex_buffer_policy, VertexBufferPolicy::KeepFirst);
        assert_eq!(config.ui.texture.as_deref(), Some("logo.png"));
    }

    #[test]
    fn test_missing_file() {
        let err = Config::from_file("definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, crate::core::DistUiError::Config(ConfigError::FileNotFound(_))));
    }
}
