use crate::graphics::com::ComPtr;
use crate::graphics::command::{CommandListType, Error};
use crate::graphics::device::Device;
use crate::graphics::set_debug_name;

use winapi::shared::winerror::SUCCEEDED;
use winapi::um::d3d12;
use winapi::Interface;

pub struct CommandAllocator(pub(crate) ComPtr<d3d12::ID3D12CommandAllocator>);

impl CommandAllocator {
    pub fn new(
        device: &Device,
        command_list_type: CommandListType,
        debug_name: &str,
    ) -> Result<Self, Error> {
        let mut command_allocator = ComPtr::<d3d12::ID3D12CommandAllocator>::null();
        let hr = unsafe {
            device.native.CreateCommandAllocator(
                command_list_type as _,
                &d3d12::ID3D12CommandAllocator::uuidof(),
                command_allocator.as_mut_void(),
            )
        };
        if !SUCCEEDED(hr) {
            return Err(Error::CommandAllocatorCreateFailed(hr));
        }
        set_debug_name(&command_allocator, debug_name);

        Ok(CommandAllocator(command_allocator))
    }

    /// Only valid once the GPU has finished every list recorded from this allocator.
    pub fn reset(&self) -> Result<(), Error> {
        let hr = unsafe { self.0.Reset() };
        if SUCCEEDED(hr) {
            Ok(())
        } else {
            Err(Error::CommandAllocatorResetFailed(hr))
        }
    }
}
