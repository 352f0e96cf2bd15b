/// 几何模块
///
/// UI 四边形的固定几何数据，以及持有顶点属性和 GPU 顶点缓冲的几何缓冲。
///
/// # 模块结构
///
/// - `quad`: 所有 Image 共享的四边形位置、纹理坐标和拓扑
/// - `mesh`: `GeometryBuffer`，按顶点格式懒创建顶点缓冲

pub mod quad;
pub mod mesh;

// 重新导出常用类型
pub use mesh::{EnsureOutcome, GeometryBuffer, VertexBufferPolicy, VertexBufferState};
pub use quad::{QUAD_POSITIONS, QUAD_TOPOLOGY, QUAD_UVS, QUAD_VERTEX_COUNT};
