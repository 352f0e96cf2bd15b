//! UI 渲染管线
//!
//! 两条管线共用一个着色器模块：
//! - 纯色：`VertexPC`，只有常量块绑定组
//! - 纹理：`VertexPTC`，常量块 + 纹理绑定组
//!
//! 两者都使用三角形带、alpha 混合、不剔除、不写深度。

use std::sync::Arc;

use tracing::debug;

use crate::core::error::{GraphicsError, Result};
use crate::renderer::{MaterialKind, PrimitiveTopology, VertexFormat};

const UI_SHADER: &str = include_str!("shaders/ui.wgsl");

const PC_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 2 => Float32x4];

const PTC_ATTRIBUTES: [wgpu::VertexAttribute; 3] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2, 2 => Float32x4];

/// 顶点格式对应的 wgpu 顶点缓冲布局
pub fn vertex_layout(format: VertexFormat) -> wgpu::VertexBufferLayout<'static> {
    let attributes: &'static [wgpu::VertexAttribute] = match format {
        VertexFormat::PositionColor => &PC_ATTRIBUTES,
        VertexFormat::PositionTexcoordColor => &PTC_ATTRIBUTES,
    };
    wgpu::VertexBufferLayout {
        array_stride: format.stride() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes,
    }
}

pub fn to_wgpu_topology(topology: PrimitiveTopology) -> wgpu::PrimitiveTopology {
    match topology {
        PrimitiveTopology::TriangleList => wgpu::PrimitiveTopology::TriangleList,
        PrimitiveTopology::TriangleStrip => wgpu::PrimitiveTopology::TriangleStrip,
    }
}

/// wgpu 管线句柄
///
/// 除了 wgpu 管线本身，还记录它期望的拓扑和顶点格式，
/// 设备在记录绘制时据此校验绑定的顶点缓冲。
#[derive(Clone)]
pub struct WgpuPipeline {
    pub(crate) name: String,
    pub(crate) pipeline: Arc<wgpu::RenderPipeline>,
    pub(crate) topology: PrimitiveTopology,
    pub(crate) kind: MaterialKind,
}

impl WgpuPipeline {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn topology(&self) -> PrimitiveTopology {
        self.topology
    }

    pub fn kind(&self) -> MaterialKind {
        self.kind
    }

    pub fn vertex_format(&self) -> VertexFormat {
        self.kind.vertex_format()
    }
}

impl std::fmt::Debug for WgpuPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WgpuPipeline")
            .field("name", &self.name)
            .field("topology", &self.topology)
            .field("kind", &self.kind)
            .finish()
    }
}

/// 所有 UI 管线共享的绑定组布局和采样器
pub struct UiLayouts {
    pub constants: wgpu::BindGroupLayout,
    pub texture: wgpu::BindGroupLayout,
    pub sampler: wgpu::Sampler,
    shader: wgpu::ShaderModule,
}

impl UiLayouts {
    pub fn new(device: &wgpu::Device) -> Result<Self> {
        debug!("Creating UI bind group layouts");
        let constants = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("UI Constants Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let texture = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("UI Texture Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("UI Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        debug!("Compiling UI shader");
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("UI Shader"),
            source: wgpu::ShaderSource::Wgsl(UI_SHADER.into()),
        });
        if let Some(e) = pollster::block_on(device.pop_error_scope()) {
            return Err(GraphicsError::ShaderCompilation(e.to_string()).into());
        }

        Ok(Self {
            constants,
            texture,
            sampler,
            shader,
        })
    }

    /// 创建某种材质的管线
    pub fn create_pipeline(
        &self,
        device: &wgpu::Device,
        target_format: wgpu::TextureFormat,
        name: &str,
        kind: MaterialKind,
    ) -> Result<WgpuPipeline> {
        let (vs_entry, fs_entry, bind_group_layouts): (&str, &str, Vec<&wgpu::BindGroupLayout>) =
            match kind {
                MaterialKind::Flat => ("vs_flat", "fs_flat", vec![&self.constants]),
                MaterialKind::Textured => (
                    "vs_textured",
                    "fs_textured",
                    vec![&self.constants, &self.texture],
                ),
            };
        let topology = PrimitiveTopology::TriangleStrip;

        debug!(pipeline = name, ?kind, "Creating UI pipeline");
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(name),
            bind_group_layouts: &bind_group_layouts,
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(name),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &self.shader,
                entry_point: vs_entry,
                buffers: &[vertex_layout(kind.vertex_format())],
            },
            fragment: Some(wgpu::FragmentState {
                module: &self.shader,
                entry_point: fs_entry,
                targets: &[Some(wgpu::ColorTargetState {
                    format: target_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: to_wgpu_topology(topology),
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: 1,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            multiview: None,
        });

        if let Some(e) = pollster::block_on(device.pop_error_scope()) {
            return Err(GraphicsError::ShaderCompilation(format!("{}: {}", name, e)).into());
        }

        Ok(WgpuPipeline {
            name: name.to_string(),
            pipeline: Arc::new(pipeline),
            topology,
            kind,
        })
    }
}
