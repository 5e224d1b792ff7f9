mod allocator;
mod list;
mod queue;

use crate::graphics::dxgi;

use winapi::shared::winerror::HRESULT;
use winapi::um::d3d12;

use thiserror::Error;

pub use allocator::CommandAllocator;
pub use list::GraphicsCommandList;
pub use queue::CommandQueue;

#[repr(u32)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum CommandListType {
    Direct = d3d12::D3D12_COMMAND_LIST_TYPE_DIRECT,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to create command queue (hr = {0:#010x})")]
    CommandQueueCreateFailed(HRESULT),
    #[error("failed to signal command queue fence (hr = {0:#010x})")]
    CommandQueueSignalFailed(HRESULT),
    #[error("failed to wait for command queue fence: {0}")]
    CommandQueueWaitFailed(#[source] crate::graphics::sync::Error),
    #[error("failed to create command allocator (hr = {0:#010x})")]
    CommandAllocatorCreateFailed(HRESULT),
    #[error("failed to reset command allocator (hr = {0:#010x})")]
    CommandAllocatorResetFailed(HRESULT),
    #[error("failed to create command list (hr = {0:#010x})")]
    CommandListCreateFailed(HRESULT),
    #[error("failed to reset command list (hr = {0:#010x})")]
    CommandListResetFailed(HRESULT),
    #[error("failed to close command list (hr = {0:#010x})")]
    CommandListCloseFailed(HRESULT),
}

impl Error {
    /// The device removal code behind a failed fence signal.
    pub fn device_lost_hresult(&self) -> Option<HRESULT> {
        match *self {
            Error::CommandQueueSignalFailed(hr) if dxgi::is_device_lost(hr) => Some(hr),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use winapi::shared::winerror;

    #[test]
    fn removed_device_during_signal_is_device_loss() {
        let removed = Error::CommandQueueSignalFailed(winerror::DXGI_ERROR_DEVICE_REMOVED);
        assert_eq!(
            removed.device_lost_hresult(),
            Some(winerror::DXGI_ERROR_DEVICE_REMOVED)
        );
        let reset = Error::CommandQueueSignalFailed(winerror::DXGI_ERROR_DEVICE_RESET);
        assert_eq!(
            reset.device_lost_hresult(),
            Some(winerror::DXGI_ERROR_DEVICE_RESET)
        );
    }

    #[test]
    fn other_command_failures_are_not_device_loss() {
        let signal = Error::CommandQueueSignalFailed(winerror::E_FAIL);
        assert_eq!(signal.device_lost_hresult(), None);
        let close = Error::CommandListCloseFailed(winerror::DXGI_ERROR_DEVICE_REMOVED);
        assert_eq!(close.device_lost_hresult(), None);
    }
}
