//! 渲染器模块
//!
//! 与具体图形 API 无关的渲染契约：
//!
//! - `backend_trait`：`GraphicsDevice`，UI 元素消费的设备接口
//! - `resource`：缓冲区描述、图元拓扑、裁剪矩形
//! - `vertex`：两种 UI 顶点格式
//! - `constants`：每次绘制的 world/view/projection 常量块
//! - `material`：材质与默认材质提供者
//!
//! 具体实现在 `gfx` 模块中。

pub mod backend_trait;
pub mod resource;
pub mod vertex;
pub mod constants;
pub mod material;

pub use backend_trait::GraphicsDevice;
pub use resource::{BufferDescriptor, BufferUsageType, ClipRect, MemoryType, PrimitiveTopology};
pub use vertex::{VertexFormat, VertexPC, VertexPTC};
pub use constants::ConstantBlock;
pub use material::{Material, MaterialKind, MaterialProvider};
