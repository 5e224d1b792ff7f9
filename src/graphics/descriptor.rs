use crate::graphics::com::ComPtr;
use crate::graphics::device::Device;
use crate::graphics::set_debug_name;

use thiserror::Error;

use winapi::shared::winerror::{HRESULT, SUCCEEDED};
use winapi::um::d3d12;
use winapi::Interface;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to create descriptor heap '{name}' (hr = {hr:#010x})")]
    DescriptorHeapCreateFailed { name: String, hr: HRESULT },
}

pub type CpuDescriptor = d3d12::D3D12_CPU_DESCRIPTOR_HANDLE;
pub type GpuDescriptor = d3d12::D3D12_GPU_DESCRIPTOR_HANDLE;

/// Fixed-size descriptor heap addressed by slot index.
pub struct DescriptorHeap {
    pub(crate) native: ComPtr<d3d12::ID3D12DescriptorHeap>,
    descriptor_size: u32,
    count: u32,
    cpu_start: CpuDescriptor,
    gpu_start: Option<GpuDescriptor>,
}

impl DescriptorHeap {
    pub fn new(
        device: &Device,
        heap_type: d3d12::D3D12_DESCRIPTOR_HEAP_TYPE,
        count: u32,
        shader_visible: bool,
        debug_name: &str,
    ) -> Result<Self, Error> {
        let desc = d3d12::D3D12_DESCRIPTOR_HEAP_DESC {
            Type: heap_type,
            NumDescriptors: count,
            Flags: if shader_visible {
                d3d12::D3D12_DESCRIPTOR_HEAP_FLAG_SHADER_VISIBLE
            } else {
                d3d12::D3D12_DESCRIPTOR_HEAP_FLAG_NONE
            },
            NodeMask: 0,
        };
        let mut heap = ComPtr::<d3d12::ID3D12DescriptorHeap>::null();
        let hr = unsafe {
            device.native.CreateDescriptorHeap(
                &desc,
                &d3d12::ID3D12DescriptorHeap::uuidof(),
                heap.as_mut_void(),
            )
        };
        if !SUCCEEDED(hr) {
            return Err(Error::DescriptorHeapCreateFailed {
                name: debug_name.to_owned(),
                hr,
            });
        }
        set_debug_name(&heap, debug_name);

        let cpu_start = unsafe { heap.GetCPUDescriptorHandleForHeapStart() };
        let gpu_start = if shader_visible {
            Some(unsafe { heap.GetGPUDescriptorHandleForHeapStart() })
        } else {
            None
        };

        Ok(DescriptorHeap {
            native: heap,
            descriptor_size: device.descriptor_size(heap_type),
            count,
            cpu_start,
            gpu_start,
        })
    }

    pub fn cpu_handle(&self, index: u32) -> CpuDescriptor {
        debug_assert!(index < self.count);
        CpuDescriptor {
            ptr: self.cpu_start.ptr + (index * self.descriptor_size) as usize,
        }
    }

    /// Panics in debug builds if the heap is not shader visible.
    pub fn gpu_handle(&self, index: u32) -> GpuDescriptor {
        debug_assert!(index < self.count);
        debug_assert!(self.gpu_start.is_some());
        let start = self.gpu_start.map_or(0, |handle| handle.ptr);
        GpuDescriptor {
            ptr: start + u64::from(index * self.descriptor_size),
        }
    }
}
