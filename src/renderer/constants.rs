//! 每次绘制的常量块
//!
//! 与顶点着色器共享的世界/视图/投影矩阵。所有 UI 着色器都在槽位 0 读取它。

use bytemuck::{Pod, Zeroable};
use crate::core::math::Matrix4;

/// 顶点阶段常量块
///
/// 字段顺序固定为 world、view、projection，与着色器中的声明一致。
/// 矩阵按列主序存储（nalgebra 与 WGSL 的约定相同）。
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ConstantBlock {
    pub world: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
}

impl ConstantBlock {
    /// 常量块在顶点阶段的绑定槽位
    pub const SLOT: u32 = 0;

    pub fn new(world: &Matrix4, view: &Matrix4, projection: &Matrix4) -> Self {
        Self {
            world: *world.as_ref(),
            view: *view.as_ref(),
            projection: *projection.as_ref(),
        }
    }

    pub fn world_matrix(&self) -> Matrix4 {
        Matrix4::from(self.world)
    }

    pub fn view_matrix(&self) -> Matrix4 {
        Matrix4::from(self.view)
    }

    pub fn projection_matrix(&self) -> Matrix4 {
        Matrix4::from(self.projection)
    }

    /// 从上传的字节还原，长度不符时返回 `None`
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        bytemuck::try_pod_read_unaligned(bytes).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::math::matrix;

    #[test]
    fn test_block_size() {
        assert_eq!(std::mem::size_of::<ConstantBlock>(), 3 * 16 * 4);
    }

    #[test]
    fn test_matrix_round_trip() {
        let world = matrix::translation(10.0, 20.0, 0.0);
        let proj = matrix::ui_orthographic(640.0, 480.0);
        let block = ConstantBlock::new(&world, &Matrix4::identity(), &proj);

        let restored = ConstantBlock::from_bytes(bytemuck::bytes_of(&block)).unwrap();
        assert_eq!(restored.world_matrix(), world);
        assert_eq!(restored.view_matrix(), Matrix4::identity());
        assert_eq!(restored.projection_matrix(), proj);
        // 列主序：平移分量位于第 4 列
        assert_eq!(block.world[3][0], 10.0);
    }

    #[test]
    fn test_from_bytes_rejects_short_input() {
        assert!(ConstantBlock::from_bytes(&[0u8; 64]).is_none());
    }
}
