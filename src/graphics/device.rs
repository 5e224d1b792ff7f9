use crate::graphics::com::ComPtr;
use crate::graphics::dxgi::Adapter;
use crate::graphics::set_debug_name;

use log::{info, trace};
use thiserror::Error;

use winapi::shared::{
    dxgi1_3, minwindef,
    winerror::{HRESULT, SUCCEEDED},
};
use winapi::um::{d3d12, d3d12sdklayers, d3dcommon, dxgidebug};
use winapi::Interface;

use std::mem;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to create D3D12 device (hr = {0:#010x})")]
    DeviceCreateFailed(HRESULT),
}

pub struct Device {
    pub(crate) native: ComPtr<d3d12::ID3D12Device>,
}

impl Device {
    pub fn new(
        adapter: &Adapter,
        min_feature_level: d3dcommon::D3D_FEATURE_LEVEL,
        debug: bool,
    ) -> Result<Self, Error> {
        trace!("Creating D3D12 device.");
        let mut device = ComPtr::<d3d12::ID3D12Device>::null();
        let hr = unsafe {
            d3d12::D3D12CreateDevice(
                adapter.native.as_raw() as *mut _,
                min_feature_level,
                &d3d12::ID3D12Device::uuidof(),
                device.as_mut_void(),
            )
        };
        if !SUCCEEDED(hr) {
            return Err(Error::DeviceCreateFailed(hr));
        }

        // Determine maximum feature level supported for the obtained device.
        let levels: [d3dcommon::D3D_FEATURE_LEVEL; 4] = [
            d3dcommon::D3D_FEATURE_LEVEL_12_1,
            d3dcommon::D3D_FEATURE_LEVEL_12_0,
            d3dcommon::D3D_FEATURE_LEVEL_11_1,
            d3dcommon::D3D_FEATURE_LEVEL_11_0,
        ];
        let mut feature_levels = d3d12::D3D12_FEATURE_DATA_FEATURE_LEVELS {
            NumFeatureLevels: levels.len() as _,
            pFeatureLevelsRequested: levels.as_ptr(),
            MaxSupportedFeatureLevel: min_feature_level,
        };
        let feature_level = unsafe {
            if SUCCEEDED(device.CheckFeatureSupport(
                d3d12::D3D12_FEATURE_FEATURE_LEVELS,
                &mut feature_levels as *mut _ as *mut _,
                mem::size_of::<d3d12::D3D12_FEATURE_DATA_FEATURE_LEVELS>() as _,
            )) {
                feature_levels.MaxSupportedFeatureLevel
            } else {
                min_feature_level
            }
        };
        info!("D3D12 device supports feature level {:#x}.", feature_level);

        if debug {
            Self::configure_debug_device(&device);
        }
        set_debug_name(&device, "Cubelab::Device");

        Ok(Device { native: device })
    }

    pub fn descriptor_size(&self, heap_type: d3d12::D3D12_DESCRIPTOR_HEAP_TYPE) -> u32 {
        unsafe { self.native.GetDescriptorHandleIncrementSize(heap_type) }
    }

    pub fn removed_reason(&self) -> HRESULT {
        unsafe { self.native.GetDeviceRemovedReason() }
    }

    fn configure_debug_device(device: &ComPtr<d3d12::ID3D12Device>) {
        if let Ok(info_queue) = device.cast::<d3d12sdklayers::ID3D12InfoQueue>() {
            unsafe {
                info_queue.SetBreakOnSeverity(
                    d3d12sdklayers::D3D12_MESSAGE_SEVERITY_CORRUPTION,
                    minwindef::TRUE,
                );
                info_queue.SetBreakOnSeverity(
                    d3d12sdklayers::D3D12_MESSAGE_SEVERITY_ERROR,
                    minwindef::TRUE,
                );

                let mut severities: Vec<d3d12sdklayers::D3D12_MESSAGE_SEVERITY> =
                    vec![d3d12sdklayers::D3D12_MESSAGE_SEVERITY_INFO];
                let mut deny_ids: Vec<d3d12sdklayers::D3D12_MESSAGE_ID> = vec![
                    d3d12sdklayers::D3D12_MESSAGE_ID_CLEARRENDERTARGETVIEW_MISMATCHINGCLEARVALUE,
                    d3d12sdklayers::D3D12_MESSAGE_ID_MAP_INVALID_NULLRANGE,
                    d3d12sdklayers::D3D12_MESSAGE_ID_UNMAP_INVALID_NULLRANGE,
                ];
                let mut filter = d3d12sdklayers::D3D12_INFO_QUEUE_FILTER {
                    DenyList: d3d12sdklayers::D3D12_INFO_QUEUE_FILTER_DESC {
                        NumSeverities: severities.len() as _,
                        pSeverityList: severities.as_mut_ptr(),
                        NumIDs: deny_ids.len() as _,
                        pIDList: deny_ids.as_mut_ptr(),
                        ..mem::zeroed()
                    },
                    ..mem::zeroed()
                };
                info_queue.AddStorageFilterEntries(&mut filter);
            }
        }
    }
}

/// Turns on the D3D12 debug layer and DXGI message breaks.
///
/// Returns the flags to create the DXGI factory with.
pub fn enable_debug_layer() -> u32 {
    trace!("Enabling D3D12 debug layer.");
    let mut dxgi_factory_flags = 0;

    let mut debug_controller = ComPtr::<d3d12sdklayers::ID3D12Debug>::null();
    unsafe {
        if SUCCEEDED(d3d12::D3D12GetDebugInterface(
            &d3d12sdklayers::ID3D12Debug::uuidof(),
            debug_controller.as_mut_void(),
        )) {
            debug_controller.EnableDebugLayer();
        }
    }

    let mut info_queue = ComPtr::<dxgidebug::IDXGIInfoQueue>::null();
    unsafe {
        if SUCCEEDED(dxgi1_3::DXGIGetDebugInterface1(
            0,
            &dxgidebug::IDXGIInfoQueue::uuidof(),
            info_queue.as_mut_void(),
        )) {
            dxgi_factory_flags = dxgi1_3::DXGI_CREATE_FACTORY_DEBUG;
            info_queue.SetBreakOnSeverity(
                dxgidebug::DXGI_DEBUG_ALL,
                dxgidebug::DXGI_INFO_QUEUE_MESSAGE_SEVERITY_CORRUPTION,
                minwindef::TRUE,
            );
            info_queue.SetBreakOnSeverity(
                dxgidebug::DXGI_DEBUG_ALL,
                dxgidebug::DXGI_INFO_QUEUE_MESSAGE_SEVERITY_ERROR,
                minwindef::TRUE,
            );
        }
    }

    dxgi_factory_flags
}
