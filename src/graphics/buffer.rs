use crate::graphics::command::GraphicsCommandList;
use crate::graphics::device::Device;
use crate::graphics::resource::{Error, GpuResource};
use crate::mesh::IndexData;
use crate::object_constants::constant_buffer_byte_size;

use bytemuck::Pod;
use log::trace;

use winapi::shared::{dxgiformat, dxgitype};
use winapi::um::d3d12;

use std::marker::PhantomData;
use std::mem;
use std::ptr;

fn buffer_desc(size: u64) -> d3d12::D3D12_RESOURCE_DESC {
    d3d12::D3D12_RESOURCE_DESC {
        Dimension: d3d12::D3D12_RESOURCE_DIMENSION_BUFFER,
        Alignment: 0,
        Width: size,
        Height: 1,
        DepthOrArraySize: 1,
        MipLevels: 1,
        Format: dxgiformat::DXGI_FORMAT_UNKNOWN,
        SampleDesc: dxgitype::DXGI_SAMPLE_DESC {
            Count: 1,
            Quality: 0,
        },
        Layout: d3d12::D3D12_TEXTURE_LAYOUT_ROW_MAJOR,
        Flags: d3d12::D3D12_RESOURCE_FLAG_NONE,
    }
}

pub fn create_buffer(
    device: &Device,
    heap_type: d3d12::D3D12_HEAP_TYPE,
    size: u64,
    initial_state: d3d12::D3D12_RESOURCE_STATES,
    debug_name: &str,
) -> Result<GpuResource, Error> {
    GpuResource::new_committed(
        device,
        heap_type,
        &buffer_desc(size),
        initial_state,
        None,
        debug_name,
    )
}

/// Default-heap buffer filled through an upload-heap staging copy.
///
/// The staging buffer must stay alive until the recorded copy has executed.
pub struct StagedBuffer {
    resource: GpuResource,
    staging: Option<GpuResource>,
    size: u64,
}

impl StagedBuffer {
    pub fn new(
        device: &Device,
        command_list: &GraphicsCommandList,
        data: &[u8],
        debug_name: &str,
    ) -> Result<Self, Error> {
        let size = data.len() as u64;
        trace!("Uploading {} bytes to '{}'.", size, debug_name);

        let mut resource = create_buffer(
            device,
            d3d12::D3D12_HEAP_TYPE_DEFAULT,
            size,
            d3d12::D3D12_RESOURCE_STATE_COMMON,
            debug_name,
        )?;
        let staging = create_buffer(
            device,
            d3d12::D3D12_HEAP_TYPE_UPLOAD,
            size,
            d3d12::D3D12_RESOURCE_STATE_GENERIC_READ,
            &format!("{}::Staging", debug_name),
        )?;

        let mapping = staging.map()?;
        unsafe {
            ptr::copy_nonoverlapping(data.as_ptr(), mapping, data.len());
        }
        staging.unmap();

        command_list.transition(&mut resource, d3d12::D3D12_RESOURCE_STATE_COPY_DEST);
        command_list.copy_buffer_region(&resource, 0, &staging, 0, size);
        command_list.transition(&mut resource, d3d12::D3D12_RESOURCE_STATE_GENERIC_READ);

        Ok(StagedBuffer {
            resource,
            staging: Some(staging),
            size,
        })
    }

    /// Drops the staging copy. Call only after the upload has been flushed.
    pub fn release_staging(&mut self) {
        self.staging = None;
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

pub struct VertexBuffer {
    buffer: StagedBuffer,
    view: d3d12::D3D12_VERTEX_BUFFER_VIEW,
}

impl VertexBuffer {
    pub fn new(
        device: &Device,
        command_list: &GraphicsCommandList,
        data: &[u8],
        stride: u32,
        debug_name: &str,
    ) -> Result<Self, Error> {
        let buffer = StagedBuffer::new(device, command_list, data, debug_name)?;
        let view = d3d12::D3D12_VERTEX_BUFFER_VIEW {
            BufferLocation: buffer.resource.gpu_virtual_address(),
            SizeInBytes: buffer.size() as u32,
            StrideInBytes: stride,
        };
        Ok(VertexBuffer { buffer, view })
    }

    pub fn view(&self) -> &d3d12::D3D12_VERTEX_BUFFER_VIEW {
        &self.view
    }

    pub fn release_staging(&mut self) {
        self.buffer.release_staging();
    }
}

pub struct IndexBuffer {
    buffer: StagedBuffer,
    view: d3d12::D3D12_INDEX_BUFFER_VIEW,
    index_count: u32,
}

impl IndexBuffer {
    pub fn new(
        device: &Device,
        command_list: &GraphicsCommandList,
        indices: &IndexData,
        debug_name: &str,
    ) -> Result<Self, Error> {
        let buffer = StagedBuffer::new(device, command_list, indices.as_bytes(), debug_name)?;
        let format = match indices.index_size() {
            2 => dxgiformat::DXGI_FORMAT_R16_UINT,
            _ => dxgiformat::DXGI_FORMAT_R32_UINT,
        };
        let view = d3d12::D3D12_INDEX_BUFFER_VIEW {
            BufferLocation: buffer.resource.gpu_virtual_address(),
            SizeInBytes: buffer.size() as u32,
            Format: format,
        };
        Ok(IndexBuffer {
            buffer,
            view,
            index_count: indices.len() as u32,
        })
    }

    pub fn view(&self) -> &d3d12::D3D12_INDEX_BUFFER_VIEW {
        &self.view
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    pub fn release_staging(&mut self) {
        self.buffer.release_staging();
    }
}

/// Persistently mapped upload-heap array of `T`.
///
/// Constant buffer elements are padded to 256 bytes so each one can back its own view.
pub struct UploadBuffer<T> {
    resource: GpuResource,
    mapping: *mut u8,
    element_size: usize,
    element_count: u32,
    _marker: PhantomData<T>,
}

impl<T: Pod> UploadBuffer<T> {
    pub fn new(
        device: &Device,
        element_count: u32,
        is_constant_buffer: bool,
        debug_name: &str,
    ) -> Result<Self, Error> {
        let element_size = if is_constant_buffer {
            constant_buffer_byte_size(mem::size_of::<T>())
        } else {
            mem::size_of::<T>()
        };
        let resource = create_buffer(
            device,
            d3d12::D3D12_HEAP_TYPE_UPLOAD,
            (element_size * element_count as usize) as u64,
            d3d12::D3D12_RESOURCE_STATE_GENERIC_READ,
            debug_name,
        )?;
        let mapping = resource.map()?;

        Ok(UploadBuffer {
            resource,
            mapping,
            element_size,
            element_count,
            _marker: PhantomData,
        })
    }

    /// Writes element `index`. The GPU must not be reading it.
    pub fn copy_data(&mut self, index: u32, data: &T) {
        assert!(index < self.element_count);
        let bytes = bytemuck::bytes_of(data);
        unsafe {
            ptr::copy_nonoverlapping(
                bytes.as_ptr(),
                self.mapping.add(index as usize * self.element_size),
                bytes.len(),
            );
        }
    }

    pub fn element_size(&self) -> usize {
        self.element_size
    }

    pub fn gpu_virtual_address(&self, index: u32) -> d3d12::D3D12_GPU_VIRTUAL_ADDRESS {
        self.resource.gpu_virtual_address() + (index as usize * self.element_size) as u64
    }
}

impl<T> Drop for UploadBuffer<T> {
    fn drop(&mut self) {
        self.resource.unmap();
    }
}
