//! 图形后端模块
//!
//! 提供 `GraphicsDevice` 的两种实现：
//! - `wgpu`：跨平台的 GPU 后端（支持 Vulkan、Metal、DX12、OpenGL）
//! - `recording`：无头记录设备，不触碰 GPU

pub mod recording;
pub mod wgpu;

pub use self::recording::RecordingDevice;
pub use self::wgpu::{WgpuContext, WgpuDevice};
