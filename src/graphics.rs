mod buffer;
mod com;
mod command;
mod descriptor;
mod device;
mod dxgi;
mod resource;
mod sync;

pub mod context;
pub mod pso;
pub mod renderer;
pub mod root_signature;

use thiserror::Error;

use winapi::shared::winerror::HRESULT;
use winapi::um::{d3d12, d3dcommon};
use wio::wide::ToWide;

use std::slice;

pub use context::Context;
pub use pso::ShaderSource;
pub use renderer::Renderer;

pub type Blob = self::com::ComPtr<d3dcommon::ID3DBlob>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Dxgi(#[from] dxgi::Error),
    #[error(transparent)]
    Device(#[from] device::Error),
    #[error(transparent)]
    Sync(#[from] sync::Error),
    #[error(transparent)]
    Command(#[from] command::Error),
    #[error(transparent)]
    Descriptor(#[from] descriptor::Error),
    #[error(transparent)]
    Resource(#[from] resource::Error),
    #[error(transparent)]
    RootSignature(#[from] root_signature::Error),
    #[error(transparent)]
    PipelineState(#[from] pso::Error),
    #[error("device lost during {operation} (reason {reason:#010x})")]
    DeviceLost {
        operation: &'static str,
        reason: HRESULT,
    },
}

/// Names a D3D12 object for debuggers and the debug layer. Only done in debug builds.
pub(crate) fn set_debug_name(object: &d3d12::ID3D12Object, name: &str) {
    if cfg!(debug_assertions) {
        let name = name.to_wide_null();
        unsafe {
            object.SetName(name.as_ptr());
        }
    }
}

pub(crate) fn blob_to_string(blob: &Blob) -> String {
    if blob.is_null() {
        return String::new();
    }
    unsafe {
        let bytes = slice::from_raw_parts(
            blob.GetBufferPointer() as *const u8,
            blob.GetBufferSize() as usize,
        );
        String::from_utf8_lossy(bytes)
            .trim_end_matches('\0')
            .trim_end()
            .to_string()
    }
}
