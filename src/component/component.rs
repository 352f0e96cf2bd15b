//! UI 组件基础
//!
//! `UiBehaviour` 描述所有 UI 元素共有的能力（启用、禁用、渲染），
//! `UiElement` 保存共享的基础状态并提供基础钩子。
//! 具体元素组合一个 `UiElement`，在自己的实现里先调用基础钩子再做扩展。

use tracing::debug;

use crate::core::error::Result;
use crate::core::math::Matrix4;
use crate::renderer::{ClipRect, GraphicsDevice};

/// UI 元素能力接口
pub trait UiBehaviour<D: GraphicsDevice> {
    /// 基础状态
    fn element(&self) -> &UiElement;

    /// 基础状态（可变）
    fn element_mut(&mut self) -> &mut UiElement;

    /// 启用元素，分配渲染所需的 GPU 资源
    fn on_enable(&mut self, device: &mut D) -> Result<()>;

    /// 禁用元素，释放 GPU 资源
    fn on_disable(&mut self);

    /// 绘制元素
    fn render(&mut self, device: &mut D, projection: &Matrix4) -> Result<()>;

    fn name(&self) -> &str {
        self.element().name()
    }

    fn is_enabled(&self) -> bool {
        self.element().is_enabled()
    }
}

/// UI 元素的基础状态
#[derive(Debug, Clone)]
pub struct UiElement {
    name: String,
    enabled: bool,
    clip_rect: Option<ClipRect>,
}

impl UiElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: false,
            clip_rect: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn clip_rect(&self) -> Option<ClipRect> {
        self.clip_rect
    }

    /// 设置裁剪矩形，`None` 表示不裁剪
    pub fn set_clip_rect(&mut self, clip_rect: Option<ClipRect>) {
        self.clip_rect = clip_rect;
    }

    /// 基础启用钩子
    pub fn on_enable(&mut self) {
        debug!(element = %self.name, "Enabling UI element");
        self.enabled = true;
    }

    /// 基础禁用钩子
    pub fn on_disable(&mut self) {
        debug!(element = %self.name, "Disabling UI element");
        self.enabled = false;
    }

    /// 基础渲染钩子：建立共享的渲染状态（裁剪）
    pub fn render<D: GraphicsDevice>(&self, device: &mut D) -> Result<()> {
        device.set_clip_rect(self.clip_rect)
    }
}
