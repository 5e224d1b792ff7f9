use crate::graphics::com::ComPtr;
use crate::graphics::device::Device;
use crate::graphics::set_debug_name;

use thiserror::Error;

use winapi::shared::winerror::{HRESULT, SUCCEEDED};
use winapi::um::d3d12;
use winapi::Interface;

use std::mem;
use std::ptr;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to create committed resource '{name}' (hr = {hr:#010x})")]
    CreateFailed { name: String, hr: HRESULT },
    #[error("failed to map resource (hr = {0:#010x})")]
    MapFailed(HRESULT),
}

/// A D3D12 resource together with the state it was last transitioned to.
pub struct GpuResource {
    pub(crate) native: ComPtr<d3d12::ID3D12Resource>,
    pub(crate) usage_state: d3d12::D3D12_RESOURCE_STATES,
}

impl GpuResource {
    pub fn new(
        resource: ComPtr<d3d12::ID3D12Resource>,
        state: d3d12::D3D12_RESOURCE_STATES,
    ) -> Self {
        GpuResource {
            native: resource,
            usage_state: state,
        }
    }

    pub fn new_committed(
        device: &Device,
        heap_type: d3d12::D3D12_HEAP_TYPE,
        desc: &d3d12::D3D12_RESOURCE_DESC,
        initial_state: d3d12::D3D12_RESOURCE_STATES,
        clear_value: Option<&d3d12::D3D12_CLEAR_VALUE>,
        debug_name: &str,
    ) -> Result<Self, Error> {
        let heap_properties = d3d12::D3D12_HEAP_PROPERTIES {
            Type: heap_type,
            CPUPageProperty: d3d12::D3D12_CPU_PAGE_PROPERTY_UNKNOWN,
            MemoryPoolPreference: d3d12::D3D12_MEMORY_POOL_UNKNOWN,
            CreationNodeMask: 1,
            VisibleNodeMask: 1,
        };
        let mut resource = ComPtr::<d3d12::ID3D12Resource>::null();
        let hr = unsafe {
            device.native.CreateCommittedResource(
                &heap_properties,
                d3d12::D3D12_HEAP_FLAG_NONE,
                desc,
                initial_state,
                clear_value.map_or(ptr::null(), |value| value as *const _),
                &d3d12::ID3D12Resource::uuidof(),
                resource.as_mut_void(),
            )
        };
        if !SUCCEEDED(hr) {
            return Err(Error::CreateFailed {
                name: debug_name.to_owned(),
                hr,
            });
        }
        set_debug_name(&resource, debug_name);

        Ok(GpuResource::new(resource, initial_state))
    }

    pub fn gpu_virtual_address(&self) -> d3d12::D3D12_GPU_VIRTUAL_ADDRESS {
        unsafe { self.native.GetGPUVirtualAddress() }
    }

    /// Returns the barrier moving this resource to `new_state`, or `None` if it is already there.
    pub fn transition_to(
        &mut self,
        new_state: d3d12::D3D12_RESOURCE_STATES,
    ) -> Option<d3d12::D3D12_RESOURCE_BARRIER> {
        let old_state = self.usage_state;
        if old_state == new_state {
            return None;
        }
        self.usage_state = new_state;
        Some(transition_barrier(&self.native, old_state, new_state))
    }

    /// Maps subresource 0 for CPU writes.
    pub fn map(&self) -> Result<*mut u8, Error> {
        let mut data = ptr::null_mut();
        // The CPU does not read back from these resources.
        let read_range = d3d12::D3D12_RANGE { Begin: 0, End: 0 };
        let hr = unsafe { self.native.Map(0, &read_range, &mut data) };
        if SUCCEEDED(hr) {
            Ok(data as *mut u8)
        } else {
            Err(Error::MapFailed(hr))
        }
    }

    pub fn unmap(&self) {
        unsafe { self.native.Unmap(0, ptr::null()) }
    }
}

pub fn transition_barrier(
    resource: &ComPtr<d3d12::ID3D12Resource>,
    state_before: d3d12::D3D12_RESOURCE_STATES,
    state_after: d3d12::D3D12_RESOURCE_STATES,
) -> d3d12::D3D12_RESOURCE_BARRIER {
    let mut barrier = d3d12::D3D12_RESOURCE_BARRIER {
        Type: d3d12::D3D12_RESOURCE_BARRIER_TYPE_TRANSITION,
        Flags: d3d12::D3D12_RESOURCE_BARRIER_FLAG_NONE,
        u: unsafe { mem::zeroed() },
    };
    *unsafe { barrier.u.Transition_mut() } = d3d12::D3D12_RESOURCE_TRANSITION_BARRIER {
        pResource: resource.as_raw(),
        Subresource: d3d12::D3D12_RESOURCE_BARRIER_ALL_SUBRESOURCES,
        StateBefore: state_before,
        StateAfter: state_after,
    };
    barrier
}
