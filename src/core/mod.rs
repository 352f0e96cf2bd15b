//! 核心功能模块
//!
//! 本模块提供了 UI 层的基础功能，包括数学库、日志系统、配置管理和错误处理。
//! 这些模块独立于具体的图形 API，可以在任何渲染后端中使用。
//!
//! # 模块组织
//!
//! - `math`：数学库，提供向量、矩阵、颜色等常用类型
//! - `log`：日志系统，基于 tracing 的结构化日志
//! - `config`：配置管理，支持从 TOML 文件加载设置
//! - `error`：错误处理，定义统一的错误类型

pub mod math;
pub mod log;
pub mod config;
pub mod error;

// 重新导出常用类型，方便使用
pub use math::{Vector2, Vector3, Vector4, Matrix4, Quaternion, Color};
pub use error::{Result, DistUiError, GraphicsError, StateError, ConfigError};
pub use config::Config;
