//! UI 四边形的固定几何数据
//!
//! 所有 Image 实例共享这份数据，几何缓冲只借用它，从不复制或修改。

use crate::renderer::PrimitiveTopology;

/// 四个角的位置，顺序：左下、左上、右下、右上
pub static QUAD_POSITIONS: [[f32; 3]; 4] = [
    [-0.5, -0.5, 0.0],
    [-0.5, 0.5, -0.5],
    [0.5, -0.5, 0.0],
    [0.5, 0.5, -0.5],
];

/// 与 `QUAD_POSITIONS` 一一对应的纹理坐标
pub static QUAD_UVS: [[f32; 2]; 4] = [
    [0.0, 1.0],
    [0.0, 0.0],
    [1.0, 1.0],
    [1.0, 0.0],
];

/// 4 个顶点的三角形带构成两个三角形
pub const QUAD_TOPOLOGY: PrimitiveTopology = PrimitiveTopology::TriangleStrip;

pub const QUAD_VERTEX_COUNT: usize = 4;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quad_is_two_triangles() {
        assert_eq!(QUAD_POSITIONS.len(), QUAD_VERTEX_COUNT);
        assert_eq!(QUAD_UVS.len(), QUAD_VERTEX_COUNT);
        assert_eq!(QUAD_TOPOLOGY.triangle_count(QUAD_VERTEX_COUNT as u32), 2);
    }

    #[test]
    fn test_corner_positions() {
        // 上边的两个角 z 为 -0.5
        assert_eq!(
            QUAD_POSITIONS,
            [
                [-0.5, -0.5, 0.0],
                [-0.5, 0.5, -0.5],
                [0.5, -0.5, 0.0],
                [0.5, 0.5, -0.5],
            ]
        );
    }

    #[test]
    fn test_corner_uvs() {
        // v 轴向下：左下角采样纹理的左下
        assert_eq!(QUAD_UVS, [[0.0, 1.0], [0.0, 0.0], [1.0, 1.0], [1.0, 0.0]]);
    }
}
