//! 错误处理模块
//!
//! 定义了 UI 层中使用的统一错误类型。
//!
//! # 错误分类
//!
//! - `Graphics`：设备资源创建失败、命令执行失败，对当前元素是致命的，不会自动重试
//! - `State`：前置条件被破坏（未启用就渲染、没有顶点缓冲就绘制），属于编程错误
//! - `Config` / `Io` / `Log` / `Initialization`：外围错误

use std::fmt;

/// UI 层统一的 Result 类型
pub type Result<T> = std::result::Result<T, DistUiError>;

/// DistUi 的错误类型
#[derive(Debug)]
pub enum DistUiError {
    /// 配置错误
    Config(ConfigError),

    /// 图形 API 错误
    Graphics(GraphicsError),

    /// 状态（前置条件）错误
    State(StateError),

    /// IO 错误
    Io(std::io::Error),

    /// 日志系统错误
    Log(String),

    /// 初始化错误
    Initialization(String),
}

/// 配置相关的错误
#[derive(Debug)]
pub enum ConfigError {
    /// 配置文件未找到
    FileNotFound(String),

    /// 配置文件解析失败
    ParseError(String),

    /// 配置值无效
    InvalidValue { field: String, reason: String },
}

/// 图形 API 相关的错误
#[derive(Debug)]
pub enum GraphicsError {
    /// 设备创建失败
    DeviceCreation(String),

    /// 着色器编译失败
    ShaderCompilation(String),

    /// 资源创建失败（缓冲区、纹理等）
    ResourceCreation(String),

    /// 渲染命令执行失败
    CommandExecution(String),

    /// 纹理加载失败
    TextureLoad(String),
}

/// 前置条件被破坏
///
/// 这些都是调用方的编程错误，渲染路径会直接返回错误而不是静默跳过绘制。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    /// 元素未启用（没有常量缓冲区）就调用了渲染
    NotEnabled(String),

    /// 几何缓冲没有顶点缓冲就调用了绘制
    NoVertexBuffer,

    /// 所属的 Canvas 已经被释放，无法解析默认材质
    OwnerDropped(String),
}

impl fmt::Display for DistUiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistUiError::Config(e) => write!(f, "Configuration error: {}", e),
            DistUiError::Graphics(e) => write!(f, "Graphics error: {}", e),
            DistUiError::State(e) => write!(f, "Invalid state: {}", e),
            DistUiError::Io(e) => write!(f, "IO error: {}", e),
            DistUiError::Log(msg) => write!(f, "Log error: {}", msg),
            DistUiError::Initialization(msg) => write!(f, "Initialization error: {}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {}", path),
            ConfigError::ParseError(msg) => write!(f, "Failed to parse config: {}", msg),
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "Invalid value for '{}': {}", field, reason)
            }
        }
    }
}

impl fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphicsError::DeviceCreation(msg) => write!(f, "Device creation failed: {}", msg),
            GraphicsError::ShaderCompilation(msg) => write!(f, "Shader compilation failed: {}", msg),
            GraphicsError::ResourceCreation(msg) => write!(f, "Resource creation failed: {}", msg),
            GraphicsError::CommandExecution(msg) => write!(f, "Command execution failed: {}", msg),
            GraphicsError::TextureLoad(msg) => write!(f, "Texture load failed: {}", msg),
        }
    }
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateError::NotEnabled(name) => {
                write!(f, "'{}' rendered before on_enable allocated its constant buffer", name)
            }
            StateError::NoVertexBuffer => write!(f, "Geometry drawn before a vertex buffer exists"),
            StateError::OwnerDropped(name) => {
                write!(f, "'{}' has no owning canvas to resolve materials from", name)
            }
        }
    }
}

impl std::error::Error for DistUiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DistUiError::Config(e) => Some(e),
            DistUiError::Graphics(e) => Some(e),
            DistUiError::State(e) => Some(e),
            DistUiError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for ConfigError {}
impl std::error::Error for GraphicsError {}
impl std::error::Error for StateError {}

// 实现 From trait 以便于错误转换
impl From<std::io::Error> for DistUiError {
    fn from(err: std::io::Error) -> Self {
        DistUiError::Io(err)
    }
}

impl From<ConfigError> for DistUiError {
    fn from(err: ConfigError) -> Self {
        DistUiError::Config(err)
    }
}

impl From<GraphicsError> for DistUiError {
    fn from(err: GraphicsError) -> Self {
        DistUiError::Graphics(err)
    }
}

impl From<StateError> for DistUiError {
    fn from(err: StateError) -> Self {
        DistUiError::State(err)
    }
}

impl DistUiError {
    /// 是否为前置条件错误
    pub fn is_state(&self) -> bool {
        matches!(self, DistUiError::State(_))
    }

    /// 是否为图形资源错误
    pub fn is_graphics(&self) -> bool {
        matches!(self, DistUiError::Graphics(_))
    }
}
