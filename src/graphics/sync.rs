use crate::graphics::com::ComPtr;
use crate::graphics::device::Device;

use thiserror::Error;

use winapi::shared::winerror::{self, HRESULT, SUCCEEDED};
use winapi::um::{d3d12, handleapi, synchapi, winbase, winnt};
use winapi::Interface;

use std::ptr;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to create fence event")]
    EventCreateFailed,
    #[error("waiting on fence event failed with code {0:#x}")]
    EventWaitFailed(u32),
    #[error("failed to create fence (hr = {0:#010x})")]
    FenceCreateFailed(HRESULT),
    #[error("failed to set fence completion event (hr = {0:#010x})")]
    FenceSetCompletionEventFailed(HRESULT),
}

pub struct Event {
    handle: winnt::HANDLE,
}

impl Event {
    pub fn new() -> Result<Self, Error> {
        let handle = unsafe {
            synchapi::CreateEventExW(
                ptr::null_mut(),
                ptr::null(),
                0,
                winnt::EVENT_MODIFY_STATE | winnt::SYNCHRONIZE,
            )
        };
        if handle.is_null() {
            Err(Error::EventCreateFailed)
        } else {
            Ok(Event { handle })
        }
    }

    /// Returns `false` if the timeout elapsed before the event was signaled.
    pub fn wait(&self, timeout_ms: u32) -> Result<bool, Error> {
        let result = unsafe { synchapi::WaitForSingleObject(self.handle, timeout_ms) };
        match result {
            winbase::WAIT_OBJECT_0 | winbase::WAIT_ABANDONED => Ok(true),
            winerror::WAIT_TIMEOUT => Ok(false),
            code => Err(Error::EventWaitFailed(code)),
        }
    }
}

impl Drop for Event {
    fn drop(&mut self) {
        unsafe {
            handleapi::CloseHandle(self.handle);
        }
    }
}

pub struct Fence(pub(crate) ComPtr<d3d12::ID3D12Fence>);

impl Fence {
    pub fn new(device: &Device, initial_value: u64) -> Result<Self, Error> {
        let mut fence = ComPtr::<d3d12::ID3D12Fence>::null();
        let hr = unsafe {
            device.native.CreateFence(
                initial_value,
                d3d12::D3D12_FENCE_FLAG_NONE,
                &d3d12::ID3D12Fence::uuidof(),
                fence.as_mut_void(),
            )
        };
        if SUCCEEDED(hr) {
            Ok(Fence(fence))
        } else {
            Err(Error::FenceCreateFailed(hr))
        }
    }

    pub fn completed_value(&self) -> u64 {
        unsafe { self.0.GetCompletedValue() }
    }

    pub fn set_event_on_completion(&self, event: &Event, value: u64) -> Result<(), Error> {
        let hr = unsafe { self.0.SetEventOnCompletion(value, event.handle) };
        if SUCCEEDED(hr) {
            Ok(())
        } else {
            Err(Error::FenceSetCompletionEventFailed(hr))
        }
    }

    /// Blocks until the GPU has reached `value`.
    pub fn wait(&self, event: &Event, value: u64) -> Result<(), Error> {
        if self.completed_value() >= value {
            return Ok(());
        }

        self.set_event_on_completion(event, value)?;
        event.wait(winbase::INFINITE).map(|_| ())
    }
}
