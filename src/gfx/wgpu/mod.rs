//! wgpu 图形后端实现
//!
//! wgpu 可以在 Vulkan、Metal、DirectX 12、OpenGL 等多种后端上运行。
//!
//! # 模块结构
//!
//! - `context` - WgpuContext（实例、表面、设备、队列）
//! - `pipeline` - UI 管线、顶点布局和绑定组布局
//! - `device` - WgpuDevice，实现 `GraphicsDevice`

mod context;
mod device;
mod pipeline;

pub use context::WgpuContext;
pub use device::{WgpuBuffer, WgpuDevice, WgpuTexture};
pub use pipeline::{vertex_layout, WgpuPipeline};
