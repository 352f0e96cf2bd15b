//! 资源描述模块
//!
//! 为不同图形后端提供统一的缓冲区描述、图元拓扑和裁剪矩形定义。

/// 缓冲区使用类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsageType {
    /// 顶点缓冲区
    Vertex,
    /// 常量缓冲区（Uniform Buffer）
    Constant,
}

/// 缓冲区内存类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryType {
    /// 设备默认内存（GPU 读写，CPU 不映射，通过 update_buffer 更新）
    DeviceDefault,
}

/// 缓冲区描述信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferDescriptor {
    /// 缓冲区大小（字节）
    pub size: u64,
    /// 使用类型
    pub usage: BufferUsageType,
    /// 内存类型
    pub memory_type: MemoryType,
    /// 调试名称（可选）
    pub name: Option<String>,
}

impl BufferDescriptor {
    /// 创建新的缓冲区描述符
    pub fn new(size: u64, usage: BufferUsageType, memory_type: MemoryType) -> Self {
        Self {
            size,
            usage,
            memory_type,
            name: None,
        }
    }

    /// 大小恰好为 `T` 的常量缓冲区，设备默认内存，无 CPU 映射
    pub fn constant<T>() -> Self {
        Self::new(
            std::mem::size_of::<T>() as u64,
            BufferUsageType::Constant,
            MemoryType::DeviceDefault,
        )
    }

    /// 顶点缓冲区
    pub fn vertex(size: u64) -> Self {
        Self::new(size, BufferUsageType::Vertex, MemoryType::DeviceDefault)
    }

    /// 设置调试名称
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// 图元拓扑
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveTopology {
    /// 三角形列表，每 3 个顶点一个三角形
    TriangleList,
    /// 三角形带，N 个顶点构成 N-2 个三角形
    TriangleStrip,
}

impl PrimitiveTopology {
    /// 给定顶点数时的三角形数量
    pub fn triangle_count(&self, vertex_count: u32) -> u32 {
        match self {
            PrimitiveTopology::TriangleList => vertex_count / 3,
            PrimitiveTopology::TriangleStrip => vertex_count.saturating_sub(2),
        }
    }
}

/// 裁剪矩形（像素）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl ClipRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_descriptor_size() {
        #[allow(dead_code)]
        struct ThreeMatrices([[f32; 16]; 3]);

        let desc = BufferDescriptor::constant::<ThreeMatrices>().with_name("cb0");
        assert_eq!(desc.size, 192);
        assert_eq!(desc.usage, BufferUsageType::Constant);
        assert_eq!(desc.memory_type, MemoryType::DeviceDefault);
        assert_eq!(desc.name.as_deref(), Some("cb0"));
    }

    #[test]
    fn test_triangle_count() {
        assert_eq!(PrimitiveTopology::TriangleStrip.triangle_count(4), 2);
        assert_eq!(PrimitiveTopology::TriangleList.triangle_count(6), 2);
        assert_eq!(PrimitiveTopology::TriangleStrip.triangle_count(1), 0);
    }
}
