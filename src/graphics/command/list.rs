use crate::graphics::com::ComPtr;
use crate::graphics::command::{CommandAllocator, CommandListType, Error};
use crate::graphics::descriptor::DescriptorHeap;
use crate::graphics::device::Device;
use crate::graphics::pso::PipelineState;
use crate::graphics::resource::GpuResource;
use crate::graphics::root_signature::RootSignature;
use crate::graphics::set_debug_name;

use winapi::shared::{minwindef, winerror::SUCCEEDED};
use winapi::um::{d3d12, d3dcommon};
use winapi::Interface;

use std::ptr;

pub struct GraphicsCommandList {
    pub(crate) native: ComPtr<d3d12::ID3D12GraphicsCommandList>,
}

impl GraphicsCommandList {
    /// Creates a command list in the closed state, ready for `reset`.
    pub fn new(
        device: &Device,
        allocator: &CommandAllocator,
        command_list_type: CommandListType,
        debug_name: &str,
    ) -> Result<Self, Error> {
        let mut command_list = ComPtr::<d3d12::ID3D12GraphicsCommandList>::null();
        let hr = unsafe {
            device.native.CreateCommandList(
                0,
                command_list_type as _,
                allocator.0.as_raw(),
                ptr::null_mut(),
                &d3d12::ID3D12GraphicsCommandList::uuidof(),
                command_list.as_mut_void(),
            )
        };
        if !SUCCEEDED(hr) {
            return Err(Error::CommandListCreateFailed(hr));
        }
        set_debug_name(&command_list, debug_name);

        let command_list = GraphicsCommandList {
            native: command_list,
        };
        command_list.close()?;
        Ok(command_list)
    }

    pub fn reset(
        &self,
        allocator: &CommandAllocator,
        initial_state: Option<&PipelineState>,
    ) -> Result<(), Error> {
        let pso = initial_state.map_or(ptr::null_mut(), |pso| pso.native.as_raw());
        let hr = unsafe { self.native.Reset(allocator.0.as_raw(), pso) };
        if SUCCEEDED(hr) {
            Ok(())
        } else {
            Err(Error::CommandListResetFailed(hr))
        }
    }

    pub fn close(&self) -> Result<(), Error> {
        let hr = unsafe { self.native.Close() };
        if SUCCEEDED(hr) {
            Ok(())
        } else {
            Err(Error::CommandListCloseFailed(hr))
        }
    }

    pub fn resource_barriers(&self, barriers: &[d3d12::D3D12_RESOURCE_BARRIER]) {
        if barriers.is_empty() {
            return;
        }
        unsafe {
            self.native
                .ResourceBarrier(barriers.len() as _, barriers.as_ptr());
        }
    }

    /// Records a transition of `resource` to `new_state` if it is not already there.
    pub fn transition(&self, resource: &mut GpuResource, new_state: d3d12::D3D12_RESOURCE_STATES) {
        if let Some(barrier) = resource.transition_to(new_state) {
            self.resource_barriers(&[barrier]);
        }
    }

    pub fn copy_buffer_region(
        &self,
        dest: &GpuResource,
        dest_offset: u64,
        source: &GpuResource,
        source_offset: u64,
        size: u64,
    ) {
        unsafe {
            self.native.CopyBufferRegion(
                dest.native.as_raw(),
                dest_offset,
                source.native.as_raw(),
                source_offset,
                size,
            );
        }
    }

    pub fn clear_render_target_view(
        &self,
        handle: d3d12::D3D12_CPU_DESCRIPTOR_HANDLE,
        color: [f32; 4],
    ) {
        unsafe {
            self.native
                .ClearRenderTargetView(handle, &color, 0, ptr::null());
        }
    }

    pub fn clear_depth_stencil_view(
        &self,
        handle: d3d12::D3D12_CPU_DESCRIPTOR_HANDLE,
        depth: f32,
        stencil: u8,
    ) {
        unsafe {
            self.native.ClearDepthStencilView(
                handle,
                d3d12::D3D12_CLEAR_FLAG_DEPTH | d3d12::D3D12_CLEAR_FLAG_STENCIL,
                depth,
                stencil,
                0,
                ptr::null(),
            );
        }
    }

    pub fn set_viewport(&self, viewport: &d3d12::D3D12_VIEWPORT) {
        unsafe { self.native.RSSetViewports(1, viewport) }
    }

    pub fn set_scissor_rect(&self, rect: &d3d12::D3D12_RECT) {
        unsafe { self.native.RSSetScissorRects(1, rect) }
    }

    pub fn set_render_target(
        &self,
        render_target: d3d12::D3D12_CPU_DESCRIPTOR_HANDLE,
        depth_stencil: d3d12::D3D12_CPU_DESCRIPTOR_HANDLE,
    ) {
        unsafe {
            self.native
                .OMSetRenderTargets(1, &render_target, minwindef::FALSE, &depth_stencil);
        }
    }

    pub fn set_pipeline_state(&self, pso: &PipelineState) {
        unsafe { self.native.SetPipelineState(pso.native.as_raw()) }
    }

    pub fn set_graphics_root_signature(&self, root_signature: &RootSignature) {
        unsafe {
            self.native
                .SetGraphicsRootSignature(root_signature.native.as_raw());
        }
    }

    pub fn set_descriptor_heaps(&self, heaps: &[&DescriptorHeap]) {
        let mut raw: Vec<_> = heaps.iter().map(|heap| heap.native.as_raw()).collect();
        unsafe {
            self.native
                .SetDescriptorHeaps(raw.len() as _, raw.as_mut_ptr());
        }
    }

    pub fn set_graphics_root_descriptor_table(
        &self,
        root_parameter_index: u32,
        base_descriptor: d3d12::D3D12_GPU_DESCRIPTOR_HANDLE,
    ) {
        unsafe {
            self.native
                .SetGraphicsRootDescriptorTable(root_parameter_index, base_descriptor);
        }
    }

    pub fn set_vertex_buffer(&self, slot: u32, view: &d3d12::D3D12_VERTEX_BUFFER_VIEW) {
        unsafe { self.native.IASetVertexBuffers(slot, 1, view) }
    }

    pub fn set_index_buffer(&self, view: &d3d12::D3D12_INDEX_BUFFER_VIEW) {
        unsafe { self.native.IASetIndexBuffer(view) }
    }

    pub fn set_primitive_topology(&self, topology: d3dcommon::D3D_PRIMITIVE_TOPOLOGY) {
        unsafe { self.native.IASetPrimitiveTopology(topology) }
    }

    pub fn draw_indexed(&self, index_count: u32, start_index: u32, base_vertex: i32) {
        unsafe {
            self.native
                .DrawIndexedInstanced(index_count, 1, start_index, base_vertex, 0);
        }
    }
}
