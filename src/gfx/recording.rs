//! 无头记录设备
//!
//! 把每一次设备调用记录为 `DeviceCall`，不触碰 GPU。
//! 用于单元测试，也可以用来捕获一帧的完整命令流。
//!
//! 缓冲区句柄 drop 时会从存活集合中移除，因此可以检查资源是否被正确释放。

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use tracing::trace;

use crate::core::error::{GraphicsError, Result};
use crate::renderer::{BufferDescriptor, ClipRect, GraphicsDevice, PrimitiveTopology};

/// 一次设备调用
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    CreateBuffer {
        id: u64,
        desc: BufferDescriptor,
        contents: Option<Vec<u8>>,
    },
    UpdateBuffer {
        id: u64,
        data: Vec<u8>,
    },
    BindVertexStageConstant {
        slot: u32,
        id: u64,
    },
    BindPixelStageTexture {
        slot: u32,
        texture: String,
    },
    SetPipeline {
        name: String,
    },
    SetClipRect(Option<ClipRect>),
    SetVertexBuffer {
        id: u64,
        stride: u32,
    },
    Draw {
        topology: PrimitiveTopology,
        vertex_count: u32,
    },
}

/// 记录设备的缓冲区句柄
#[derive(Debug)]
pub struct RecordedBuffer {
    id: u64,
    size: u64,
    live: Rc<RefCell<BTreeSet<u64>>>,
}

impl RecordedBuffer {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

impl Drop for RecordedBuffer {
    fn drop(&mut self) {
        trace!(id = self.id, "Releasing recorded buffer");
        self.live.borrow_mut().remove(&self.id);
    }
}

/// 记录设备的管线句柄，只携带名称
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedPipeline {
    pub name: String,
}

impl RecordedPipeline {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// 记录设备的纹理句柄
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedTexture {
    pub name: String,
    pub width: u32,
    pub height: u32,
}

impl RecordedTexture {
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            name: name.into(),
            width,
            height,
        }
    }
}

/// 无头记录设备
#[derive(Debug, Default)]
pub struct RecordingDevice {
    calls: Vec<DeviceCall>,
    next_id: u64,
    live: Rc<RefCell<BTreeSet<u64>>>,
    fail_next_buffer: bool,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// 让下一次 `create_buffer` 失败，模拟资源耗尽
    pub fn fail_next_buffer_creation(&mut self) {
        self.fail_next_buffer = true;
    }

    /// 按顺序记录的全部调用
    pub fn calls(&self) -> &[DeviceCall] {
        &self.calls
    }

    /// 取走已记录的调用并清空
    pub fn take_calls(&mut self) -> Vec<DeviceCall> {
        std::mem::take(&mut self.calls)
    }

    /// 当前未被释放的缓冲区数量
    pub fn live_buffer_count(&self) -> usize {
        self.live.borrow().len()
    }

    pub fn is_live(&self, id: u64) -> bool {
        self.live.borrow().contains(&id)
    }

    /// 所有缓冲区创建记录
    pub fn created_buffers(&self) -> Vec<(u64, &BufferDescriptor)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DeviceCall::CreateBuffer { id, desc, .. } => Some((*id, desc)),
                _ => None,
            })
            .collect()
    }

    /// 写入某个缓冲区的所有数据，按时间顺序
    pub fn uploads_to(&self, buffer_id: u64) -> Vec<&[u8]> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DeviceCall::UpdateBuffer { id, data } if *id == buffer_id => Some(data.as_slice()),
                _ => None,
            })
            .collect()
    }

    /// 绑定过的管线名称，按时间顺序
    pub fn pipelines_set(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                DeviceCall::SetPipeline { name } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn draw_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, DeviceCall::Draw { .. }))
            .count()
    }

    fn record(&mut self, call: DeviceCall) {
        trace!(?call, "Recorded device call");
        self.calls.push(call);
    }
}

impl GraphicsDevice for RecordingDevice {
    type Buffer = RecordedBuffer;
    type Pipeline = RecordedPipeline;
    type Texture = RecordedTexture;

    fn create_buffer(
        &mut self,
        desc: &BufferDescriptor,
        contents: Option<&[u8]>,
    ) -> Result<Self::Buffer> {
        if std::mem::take(&mut self.fail_next_buffer) {
            return Err(GraphicsError::ResourceCreation(format!(
                "Injected failure creating {:?} buffer of {} bytes",
                desc.usage, desc.size
            ))
            .into());
        }

        if desc.size == 0 {
            return Err(GraphicsError::ResourceCreation("Buffer size must be non-zero".to_string()).into());
        }

        if let Some(data) = contents {
            if data.len() as u64 > desc.size {
                return Err(GraphicsError::ResourceCreation(format!(
                    "Initial data of {} bytes exceeds buffer size {}",
                    data.len(),
                    desc.size
                ))
                .into());
            }
        }

        self.next_id += 1;
        let id = self.next_id;
        self.live.borrow_mut().insert(id);
        self.record(DeviceCall::CreateBuffer {
            id,
            desc: desc.clone(),
            contents: contents.map(<[u8]>::to_vec),
        });

        Ok(RecordedBuffer {
            id,
            size: desc.size,
            live: Rc::clone(&self.live),
        })
    }

    fn update_buffer(&mut self, buffer: &Self::Buffer, data: &[u8]) -> Result<()> {
        if data.len() as u64 > buffer.size {
            return Err(GraphicsError::CommandExecution(format!(
                "Update of {} bytes overflows buffer {} ({} bytes)",
                data.len(),
                buffer.id,
                buffer.size
            ))
            .into());
        }
        self.record(DeviceCall::UpdateBuffer {
            id: buffer.id,
            data: data.to_vec(),
        });
        Ok(())
    }

    fn bind_vertex_stage_constant(&mut self, slot: u32, buffer: &Self::Buffer) -> Result<()> {
        self.record(DeviceCall::BindVertexStageConstant { slot, id: buffer.id });
        Ok(())
    }

    fn bind_pixel_stage_texture(&mut self, slot: u32, texture: &Self::Texture) -> Result<()> {
        self.record(DeviceCall::BindPixelStageTexture {
            slot,
            texture: texture.name.clone(),
        });
        Ok(())
    }

    fn set_pipeline(&mut self, pipeline: &Self::Pipeline) -> Result<()> {
        self.record(DeviceCall::SetPipeline {
            name: pipeline.name.clone(),
        });
        Ok(())
    }

    fn set_clip_rect(&mut self, clip: Option<ClipRect>) -> Result<()> {
        self.record(DeviceCall::SetClipRect(clip));
        Ok(())
    }

    fn set_vertex_buffer(&mut self, buffer: &Self::Buffer, stride: u32) -> Result<()> {
        self.record(DeviceCall::SetVertexBuffer { id: buffer.id, stride });
        Ok(())
    }

    fn draw(&mut self, topology: PrimitiveTopology, vertex_count: u32) -> Result<()> {
        self.record(DeviceCall::Draw { topology, vertex_count });
        Ok(())
    }
}
