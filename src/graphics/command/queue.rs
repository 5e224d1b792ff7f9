use crate::graphics::com::ComPtr;
use crate::graphics::command::{CommandListType, Error, GraphicsCommandList};
use crate::graphics::device::Device;
use crate::graphics::set_debug_name;
use crate::graphics::sync::{Event, Fence};

use log::trace;

use winapi::shared::winerror::SUCCEEDED;
use winapi::um::d3d12;
use winapi::Interface;

/// A command queue paired with the fence used to wait for its work.
pub struct CommandQueue {
    pub(crate) native: ComPtr<d3d12::ID3D12CommandQueue>,
    fence: Fence,
    fence_event: Event,
    fence_value: u64,
}

impl CommandQueue {
    pub fn new(
        device: &Device,
        command_list_type: CommandListType,
        debug_name: &str,
    ) -> Result<Self, crate::graphics::Error> {
        let mut queue = ComPtr::<d3d12::ID3D12CommandQueue>::null();
        let desc = d3d12::D3D12_COMMAND_QUEUE_DESC {
            Type: command_list_type as _,
            Priority: d3d12::D3D12_COMMAND_QUEUE_PRIORITY_NORMAL as _,
            Flags: d3d12::D3D12_COMMAND_QUEUE_FLAG_NONE,
            NodeMask: 0,
        };
        let hr = unsafe {
            device.native.CreateCommandQueue(
                &desc,
                &d3d12::ID3D12CommandQueue::uuidof(),
                queue.as_mut_void(),
            )
        };
        if !SUCCEEDED(hr) {
            return Err(Error::CommandQueueCreateFailed(hr).into());
        }
        set_debug_name(&queue, debug_name);

        Ok(CommandQueue {
            native: queue,
            fence: Fence::new(device, 0)?,
            fence_event: Event::new()?,
            fence_value: 0,
        })
    }

    /// Submits a closed command list.
    pub fn execute(&self, command_list: &GraphicsCommandList) {
        let lists = [command_list.native.as_raw() as *mut d3d12::ID3D12CommandList];
        unsafe {
            self.native
                .ExecuteCommandLists(lists.len() as _, lists.as_ptr());
        }
    }

    /// Enqueues a signal of the next fence value and returns it.
    pub fn signal(&mut self) -> Result<u64, Error> {
        self.fence_value += 1;
        let hr = unsafe {
            self.native
                .Signal(self.fence.0.as_raw(), self.fence_value)
        };
        if SUCCEEDED(hr) {
            Ok(self.fence_value)
        } else {
            Err(Error::CommandQueueSignalFailed(hr))
        }
    }

    /// Blocks until every command submitted so far has completed on the GPU.
    pub fn flush(&mut self) -> Result<(), Error> {
        let value = self.signal()?;
        trace!("Waiting for fence value {}.", value);
        self.fence
            .wait(&self.fence_event, value)
            .map_err(Error::CommandQueueWaitFailed)
    }
}

