//! wgpu 图形设备
//!
//! UI 元素在渲染时调用 `GraphicsDevice` 方法，`WgpuDevice` 把这些调用记录成命令列表，
//! 由 `flush` 一次性回放到目标纹理上。
//!
//! # 缓冲区更新
//!
//! 更新内容先写入临时的暂存缓冲区，回放时在 render pass 之外复制到目标缓冲区。
//! 遇到更新命令时结束当前 pass，复制完成后以 `LoadOp::Load` 开启新 pass，
//! 所以每次绘制看到的都是它之前最近一次写入的数据。
//!
//! # 校验
//!
//! `draw` 记录前检查绑定状态：管线、常量块、纹理（纹理材质）、顶点缓冲，
//! 以及顶点跨度和拓扑是否与管线一致。不一致时返回 `GraphicsError::CommandExecution`。

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, error, info, trace};
use wgpu::util::DeviceExt;

use crate::core::error::{GraphicsError, Result};
use crate::core::math::Color;
use crate::renderer::{
    BufferDescriptor, BufferUsageType, ClipRect, GraphicsDevice, Material, MaterialKind,
    PrimitiveTopology,
};

use super::context::WgpuContext;
use super::pipeline::{UiLayouts, WgpuPipeline};

/// wgpu 缓冲区句柄
pub struct WgpuBuffer {
    buffer: Arc<wgpu::Buffer>,
    size: u64,
    usage: BufferUsageType,
    /// 常量缓冲区的绑定组
    bind_group: Option<Arc<wgpu::BindGroup>>,
}

impl WgpuBuffer {
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn usage(&self) -> BufferUsageType {
        self.usage
    }
}

/// wgpu 纹理句柄
pub struct WgpuTexture {
    name: String,
    width: u32,
    height: u32,
    _texture: wgpu::Texture,
    _view: wgpu::TextureView,
    bind_group: Arc<wgpu::BindGroup>,
}

impl WgpuTexture {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// 记录下来的命令
enum Command {
    Upload {
        staging: wgpu::Buffer,
        target: Arc<wgpu::Buffer>,
        size: u64,
    },
    SetPipeline(Arc<wgpu::RenderPipeline>),
    SetConstants(Arc<wgpu::BindGroup>),
    SetTexture(Arc<wgpu::BindGroup>),
    SetClip(Option<ClipRect>),
    SetVertexBuffer(Arc<wgpu::Buffer>),
    Draw(u32),
}

/// 记录阶段的绑定状态，用于校验绘制
#[derive(Default)]
struct Bindings {
    pipeline: Option<(String, PrimitiveTopology, MaterialKind)>,
    constants: bool,
    texture: bool,
    vertex_stride: Option<u32>,
}

impl Bindings {
    /// 检查当前绑定能否以 `topology` 绘制
    fn check_draw(&self, topology: PrimitiveTopology) -> Result<()> {
        let (name, expected_topology, kind) = self.pipeline.as_ref().ok_or_else(|| {
            GraphicsError::CommandExecution("Draw without a pipeline".to_string())
        })?;

        if !self.constants {
            return Err(GraphicsError::CommandExecution(format!(
                "Draw with pipeline '{}' but no constant buffer bound",
                name
            ))
            .into());
        }
        if *kind == MaterialKind::Textured && !self.texture {
            return Err(GraphicsError::CommandExecution(format!(
                "Pipeline '{}' requires a texture",
                name
            ))
            .into());
        }

        let stride = self.vertex_stride.ok_or_else(|| {
            GraphicsError::CommandExecution("Draw without a vertex buffer".to_string())
        })?;
        let expected_stride = kind.vertex_format().stride();
        if stride != expected_stride {
            return Err(GraphicsError::CommandExecution(format!(
                "Vertex stride {} does not match pipeline '{}' ({} expects {})",
                stride,
                name,
                kind.vertex_format().name(),
                expected_stride
            ))
            .into());
        }

        if topology != *expected_topology {
            return Err(GraphicsError::CommandExecution(format!(
                "Topology {:?} does not match pipeline '{}' ({:?})",
                topology, name, expected_topology
            ))
            .into());
        }
        Ok(())
    }
}

/// 回放阶段的绑定状态，新开 pass 时重新应用
#[derive(Default)]
struct PassState<'a> {
    pipeline: Option<&'a wgpu::RenderPipeline>,
    constants: Option<&'a wgpu::BindGroup>,
    texture: Option<&'a wgpu::BindGroup>,
    vertex_buffer: Option<&'a wgpu::Buffer>,
    clip: Option<ClipRect>,
}

impl<'a> PassState<'a> {
    fn apply(&self, pass: &mut wgpu::RenderPass<'a>, target_size: (u32, u32)) {
        if let Some(pipeline) = self.pipeline {
            pass.set_pipeline(pipeline);
        }
        if let Some(group) = self.constants {
            pass.set_bind_group(0, group, &[]);
        }
        if let Some(group) = self.texture {
            pass.set_bind_group(1, group, &[]);
        }
        if let Some(buffer) = self.vertex_buffer {
            pass.set_vertex_buffer(0, buffer.slice(..));
        }
        let (x, y, w, h) = scissor(self.clip, target_size);
        pass.set_scissor_rect(x, y, w, h);
    }
}

/// 把裁剪矩形限制在目标范围内，`None` 表示整个目标
fn scissor(clip: Option<ClipRect>, (width, height): (u32, u32)) -> (u32, u32, u32, u32) {
    match clip {
        None => (0, 0, width, height),
        Some(rect) => {
            let x = rect.x.min(width);
            let y = rect.y.min(height);
            let w = rect.width.min(width - x);
            let h = rect.height.min(height - y);
            (x, y, w, h)
        }
    }
}

pub struct WgpuDevice {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    target_format: wgpu::TextureFormat,
    layouts: UiLayouts,
    commands: Vec<Command>,
    bindings: Bindings,
}

impl WgpuDevice {
    pub fn new(context: &WgpuContext) -> Result<Self> {
        let layouts = UiLayouts::new(&context.device)?;
        info!(format = ?context.surface_format(), "wgpu UI device created");
        Ok(Self {
            device: Arc::clone(&context.device),
            queue: Arc::clone(&context.queue),
            target_format: context.surface_format(),
            layouts,
            commands: Vec::new(),
            bindings: Bindings::default(),
        })
    }

    /// 创建某种材质的管线
    pub fn create_pipeline(&self, name: &str, kind: MaterialKind) -> Result<WgpuPipeline> {
        self.layouts
            .create_pipeline(&self.device, self.target_format, name, kind)
    }

    /// 创建 Canvas 使用的两种默认材质：(纯色, 纹理)
    pub fn create_default_materials(&self) -> Result<(Material<Self>, Material<Self>)> {
        let flat = Material::new(
            "ui-flat",
            MaterialKind::Flat,
            self.create_pipeline("ui-flat", MaterialKind::Flat)?,
        );
        let textured = Material::new(
            "ui-textured",
            MaterialKind::Textured,
            self.create_pipeline("ui-textured", MaterialKind::Textured)?,
        );
        Ok((flat, textured))
    }

    /// 从 RGBA 图像创建纹理
    pub fn create_texture(&self, name: &str, image: &image::RgbaImage) -> Result<WgpuTexture> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(GraphicsError::TextureLoad(format!("Texture '{}' is empty", name)).into());
        }

        debug!(texture = name, width, height, "Creating texture");
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(name),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        self.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            image.as_raw(),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(name),
            layout: &self.layouts.texture,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.layouts.sampler),
                },
            ],
        });

        Ok(WgpuTexture {
            name: name.to_string(),
            width,
            height,
            _texture: texture,
            _view: view,
            bind_group: Arc::new(bind_group),
        })
    }

    /// 从图片文件加载纹理
    pub fn load_texture<P: AsRef<Path>>(&self, path: P) -> Result<WgpuTexture> {
        let path = path.as_ref();
        info!("Loading texture from: {}", path.display());
        let image = image::open(path)
            .map_err(|e| {
                GraphicsError::TextureLoad(format!("Failed to load {}: {}", path.display(), e))
            })?
            .to_rgba8();
        self.create_texture(&path.display().to_string(), &image)
    }

    /// 回放本帧记录的命令到 `target`
    ///
    /// `clear` 为 `Some` 时先清屏。回放后命令列表和绑定状态清空。
    pub fn flush(
        &mut self,
        target: &wgpu::TextureView,
        target_size: (u32, u32),
        clear: Option<Color>,
    ) -> Result<()> {
        let commands = std::mem::take(&mut self.commands);
        self.bindings = Bindings::default();
        trace!(commands = commands.len(), "Flushing UI commands");

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("UI Encoder"),
            });

        let mut load = match clear {
            Some(c) => wgpu::LoadOp::Clear(wgpu::Color {
                r: c.r as f64,
                g: c.g as f64,
                b: c.b as f64,
                a: c.a as f64,
            }),
            None => wgpu::LoadOp::Load,
        };

        let mut state = PassState::default();
        let mut index = 0;
        let mut passes = 0;
        loop {
            while let Some(Command::Upload {
                staging,
                target,
                size,
            }) = commands.get(index)
            {
                encoder.copy_buffer_to_buffer(staging, 0, target, 0, *size);
                index += 1;
            }

            let end = commands[index..]
                .iter()
                .position(|c| matches!(c, Command::Upload { .. }))
                .map_or(commands.len(), |offset| index + offset);

            if index < end || passes == 0 {
                let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("UI Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: target,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });
                state.apply(&mut pass, target_size);

                for command in &commands[index..end] {
                    match command {
                        Command::SetPipeline(pipeline) => {
                            state.pipeline = Some(&**pipeline);
                            pass.set_pipeline(pipeline);
                        }
                        Command::SetConstants(group) => {
                            state.constants = Some(&**group);
                            pass.set_bind_group(0, group, &[]);
                        }
                        Command::SetTexture(group) => {
                            state.texture = Some(&**group);
                            pass.set_bind_group(1, group, &[]);
                        }
                        Command::SetClip(clip) => {
                            state.clip = *clip;
                            let (x, y, w, h) = scissor(*clip, target_size);
                            pass.set_scissor_rect(x, y, w, h);
                        }
                        Command::SetVertexBuffer(buffer) => {
                            state.vertex_buffer = Some(&**buffer);
                            pass.set_vertex_buffer(0, buffer.slice(..));
                        }
                        Command::Draw(count) => pass.draw(0..*count, 0..1),
                        Command::Upload { .. } => {}
                    }
                }
                passes += 1;
                load = wgpu::LoadOp::Load;
            }

            index = end;
            if index >= commands.len() {
                break;
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        trace!(passes, "UI commands submitted");
        Ok(())
    }
}

impl GraphicsDevice for WgpuDevice {
    type Buffer = WgpuBuffer;
    type Pipeline = WgpuPipeline;
    type Texture = WgpuTexture;

    fn create_buffer(
        &mut self,
        desc: &BufferDescriptor,
        contents: Option<&[u8]>,
    ) -> Result<Self::Buffer> {
        if desc.size == 0 {
            return Err(GraphicsError::ResourceCreation("Buffer size must be non-zero".to_string()).into());
        }
        let label = desc.name.as_deref();
        let usage = match desc.usage {
            BufferUsageType::Vertex => wgpu::BufferUsages::VERTEX,
            BufferUsageType::Constant => wgpu::BufferUsages::UNIFORM,
        } | wgpu::BufferUsages::COPY_DST;

        let buffer = match contents {
            Some(data) => {
                if data.len() as u64 > desc.size {
                    return Err(GraphicsError::ResourceCreation(format!(
                        "Initial data of {} bytes exceeds buffer size {}",
                        data.len(),
                        desc.size
                    ))
                    .into());
                }
                let mut padded = data.to_vec();
                padded.resize(desc.size as usize, 0);
                self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label,
                    contents: &padded,
                    usage,
                })
            }
            None => self.device.create_buffer(&wgpu::BufferDescriptor {
                label,
                size: desc.size,
                usage,
                mapped_at_creation: false,
            }),
        };
        let buffer = Arc::new(buffer);

        let bind_group = match desc.usage {
            BufferUsageType::Constant => Some(Arc::new(self.device.create_bind_group(
                &wgpu::BindGroupDescriptor {
                    label,
                    layout: &self.layouts.constants,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: buffer.as_entire_binding(),
                    }],
                },
            ))),
            BufferUsageType::Vertex => None,
        };

        trace!(size = desc.size, usage = ?desc.usage, "Buffer created");
        Ok(WgpuBuffer {
            buffer,
            size: desc.size,
            usage: desc.usage,
            bind_group,
        })
    }

    fn update_buffer(&mut self, buffer: &Self::Buffer, data: &[u8]) -> Result<()> {
        if data.len() as u64 > buffer.size {
            return Err(GraphicsError::CommandExecution(format!(
                "Update of {} bytes overflows buffer of {} bytes",
                data.len(),
                buffer.size
            ))
            .into());
        }
        if data.len() as u64 % wgpu::COPY_BUFFER_ALIGNMENT != 0 {
            return Err(GraphicsError::CommandExecution(format!(
                "Update size {} is not a multiple of {}",
                data.len(),
                wgpu::COPY_BUFFER_ALIGNMENT
            ))
            .into());
        }
        if data.is_empty() {
            return Ok(());
        }

        let staging = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("UI Staging"),
            contents: data,
            usage: wgpu::BufferUsages::COPY_SRC,
        });
        self.commands.push(Command::Upload {
            staging,
            target: Arc::clone(&buffer.buffer),
            size: data.len() as u64,
        });
        Ok(())
    }

    fn bind_vertex_stage_constant(&mut self, slot: u32, buffer: &Self::Buffer) -> Result<()> {
        if slot != 0 {
            return Err(GraphicsError::CommandExecution(format!(
                "Unsupported constant slot {}",
                slot
            ))
            .into());
        }
        let group = buffer.bind_group.as_ref().ok_or_else(|| {
            GraphicsError::CommandExecution("Bound a non-constant buffer as constants".to_string())
        })?;
        self.commands.push(Command::SetConstants(Arc::clone(group)));
        self.bindings.constants = true;
        Ok(())
    }

    fn bind_pixel_stage_texture(&mut self, slot: u32, texture: &Self::Texture) -> Result<()> {
        if slot != 0 {
            return Err(GraphicsError::CommandExecution(format!(
                "Unsupported texture slot {}",
                slot
            ))
            .into());
        }
        self.commands
            .push(Command::SetTexture(Arc::clone(&texture.bind_group)));
        self.bindings.texture = true;
        Ok(())
    }

    fn set_pipeline(&mut self, pipeline: &Self::Pipeline) -> Result<()> {
        self.commands
            .push(Command::SetPipeline(Arc::clone(&pipeline.pipeline)));
        self.bindings.pipeline = Some((pipeline.name.clone(), pipeline.topology, pipeline.kind));
        Ok(())
    }

    fn set_clip_rect(&mut self, clip: Option<ClipRect>) -> Result<()> {
        self.commands.push(Command::SetClip(clip));
        Ok(())
    }

    fn set_vertex_buffer(&mut self, buffer: &Self::Buffer, stride: u32) -> Result<()> {
        if buffer.usage != BufferUsageType::Vertex {
            return Err(GraphicsError::CommandExecution(
                "Bound a non-vertex buffer as vertex input".to_string(),
            )
            .into());
        }
        self.commands
            .push(Command::SetVertexBuffer(Arc::clone(&buffer.buffer)));
        self.bindings.vertex_stride = Some(stride);
        Ok(())
    }

    fn draw(&mut self, topology: PrimitiveTopology, vertex_count: u32) -> Result<()> {
        if let Err(e) = self.bindings.check_draw(topology) {
            error!(error = %e, "Rejected draw");
            return Err(e);
        }
        self.commands.push(Command::Draw(vertex_count));
        Ok(())
    }
}
