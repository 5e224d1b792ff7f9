use crate::graphics::com::ComPtr;
use crate::graphics::command::CommandQueue;

use log::{info, trace, warn};
use thiserror::Error;

use winapi::shared::{
    dxgi, dxgi1_2, dxgi1_3, dxgi1_4, dxgi1_5, dxgi1_6, dxgiformat, dxgitype, minwindef,
    windef::HWND,
    winerror::{self, HRESULT, SUCCEEDED},
};
use winapi::um::{d3d12, d3dcommon};
use winapi::Interface;
use wio::wide::FromWide;

use std::ffi::OsString;
use std::mem;
use std::ptr;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to create DXGI factory (hr = {0:#010x})")]
    FactoryCreateFailed(HRESULT),
    #[error("failed to associate DXGI factory with window (hr = {0:#010x})")]
    FactoryWindowAssociationFailed(HRESULT),
    #[error("no hardware adapter supports the required feature level")]
    HardwareAdapterNotFound,
    #[error("failed to find WARP adapter (hr = {0:#010x})")]
    WarpAdapterNotFound(HRESULT),
    #[error("failed to query adapter description (hr = {0:#010x})")]
    AdapterDescriptionFailed(HRESULT),
    #[error("failed to create swap chain (hr = {0:#010x})")]
    SwapchainCreateFailed(HRESULT),
    #[error("swap chain does not implement IDXGISwapChain3 (hr = {0:#010x})")]
    SwapchainCastFailed(HRESULT),
    #[error("failed to get swap chain buffer {index} (hr = {hr:#010x})")]
    SwapchainGetBufferFailed { index: u32, hr: HRESULT },
    #[error("failed to resize swap chain buffers (hr = {0:#010x})")]
    SwapchainResizeFailed(HRESULT),
    #[error("failed to present (hr = {0:#010x})")]
    PresentFailed(HRESULT),
}

pub struct Factory {
    pub(crate) native: ComPtr<dxgi1_4::IDXGIFactory4>,
}

impl Factory {
    pub fn new(flags: u32) -> Result<Self, Error> {
        trace!("Creating DXGI factory.");
        let mut factory = ComPtr::<dxgi1_4::IDXGIFactory4>::null();
        let hr = unsafe {
            dxgi1_3::CreateDXGIFactory2(
                flags,
                &dxgi1_4::IDXGIFactory4::uuidof(),
                factory.as_mut_void(),
            )
        };
        if SUCCEEDED(hr) {
            Ok(Factory { native: factory })
        } else {
            Err(Error::FactoryCreateFailed(hr))
        }
    }

    /// Stops DXGI from responding to ALT+ENTER; exclusive fullscreen is not supported.
    pub fn disable_alt_enter(&self, window_handle: HWND) -> Result<(), Error> {
        // DXGI_MWA_NO_ALT_ENTER is missing from winapi.
        const DXGI_MWA_NO_ALT_ENTER: u32 = 1 << 1;
        let hr = unsafe {
            self.native
                .MakeWindowAssociation(window_handle, DXGI_MWA_NO_ALT_ENTER)
        };
        if SUCCEEDED(hr) {
            Ok(())
        } else {
            Err(Error::FactoryWindowAssociationFailed(hr))
        }
    }

    /// Whether variable refresh rate displays can be presented to with tearing.
    pub fn is_tearing_supported(&self) -> bool {
        match self.native.cast::<dxgi1_5::IDXGIFactory5>() {
            Ok(factory5) => {
                let mut allow_tearing = minwindef::FALSE;
                let hr = unsafe {
                    factory5.CheckFeatureSupport(
                        dxgi1_5::DXGI_FEATURE_PRESENT_ALLOW_TEARING,
                        &mut allow_tearing as *mut _ as *mut _,
                        mem::size_of::<minwindef::BOOL>() as _,
                    )
                };
                SUCCEEDED(hr) && allow_tearing != minwindef::FALSE
            }
            Err(_) => false,
        }
    }

    fn enum_adapter(&self, index: u32) -> Option<ComPtr<dxgi::IDXGIAdapter1>> {
        let mut adapter = ComPtr::<dxgi::IDXGIAdapter1>::null();
        let hr = unsafe {
            match self.native.cast::<dxgi1_6::IDXGIFactory6>() {
                Ok(factory6) => factory6.EnumAdapterByGpuPreference(
                    index,
                    dxgi1_6::DXGI_GPU_PREFERENCE_HIGH_PERFORMANCE,
                    &dxgi::IDXGIAdapter1::uuidof(),
                    adapter.as_mut_void(),
                ),
                Err(_) => self
                    .native
                    .EnumAdapters1(index, adapter.as_mut_void() as *mut *mut _),
            }
        };
        if SUCCEEDED(hr) {
            Some(adapter)
        } else {
            None
        }
    }

    /// First hardware adapter, in GPU preference order, that can create a device.
    pub fn enum_hardware_adapter(
        &self,
        min_feature_level: d3dcommon::D3D_FEATURE_LEVEL,
    ) -> Result<ComPtr<dxgi::IDXGIAdapter1>, Error> {
        let mut index = 0;
        while let Some(adapter) = self.enum_adapter(index) {
            index += 1;

            let info = match AdapterInfo::query(&adapter) {
                Ok(info) => info,
                Err(_) => continue,
            };

            // Skip the Basic Render Driver adapter.
            if info.is_software {
                continue;
            }

            let hr = unsafe {
                d3d12::D3D12CreateDevice(
                    adapter.as_raw() as *mut _,
                    min_feature_level,
                    &d3d12::ID3D12Device::uuidof(),
                    ptr::null_mut(),
                )
            };
            // Probing with a null device pointer reports success as S_FALSE.
            if SUCCEEDED(hr) {
                return Ok(adapter);
            }
            trace!("Adapter '{}' rejected (hr = {:#010x}).", info.description, hr);
        }
        Err(Error::HardwareAdapterNotFound)
    }

    pub fn enum_warp_adapter(&self) -> Result<ComPtr<dxgi::IDXGIAdapter1>, Error> {
        let mut adapter = ComPtr::<dxgi::IDXGIAdapter1>::null();
        let hr = unsafe {
            self.native
                .EnumWarpAdapter(&dxgi::IDXGIAdapter1::uuidof(), adapter.as_mut_void())
        };
        if SUCCEEDED(hr) {
            Ok(adapter)
        } else {
            Err(Error::WarpAdapterNotFound(hr))
        }
    }
}

#[derive(Clone, Debug)]
pub struct AdapterInfo {
    pub description: String,
    pub dedicated_video_memory: usize,
    pub is_software: bool,
}

impl AdapterInfo {
    fn query(adapter: &ComPtr<dxgi::IDXGIAdapter1>) -> Result<Self, Error> {
        let mut desc: dxgi::DXGI_ADAPTER_DESC1 = unsafe { mem::zeroed() };
        let hr = unsafe { adapter.GetDesc1(&mut desc) };
        if !SUCCEEDED(hr) {
            return Err(Error::AdapterDescriptionFailed(hr));
        }

        let len = desc.Description.iter().take_while(|&&c| c != 0).count();
        let description = OsString::from_wide(&desc.Description[..len])
            .to_string_lossy()
            .into_owned();
        Ok(AdapterInfo {
            description,
            dedicated_video_memory: desc.DedicatedVideoMemory,
            is_software: (desc.Flags & dxgi::DXGI_ADAPTER_FLAG_SOFTWARE) != 0,
        })
    }
}

pub struct Adapter {
    pub(crate) native: ComPtr<dxgi::IDXGIAdapter1>,
    info: AdapterInfo,
}

impl Adapter {
    /// Picks a hardware adapter, falling back to WARP when none qualifies.
    pub fn new(
        factory: &Factory,
        min_feature_level: d3dcommon::D3D_FEATURE_LEVEL,
        force_warp: bool,
    ) -> Result<Self, Error> {
        let adapter = if force_warp {
            info!("Using WARP adapter as requested.");
            factory.enum_warp_adapter()?
        } else {
            match factory.enum_hardware_adapter(min_feature_level) {
                Ok(adapter) => adapter,
                Err(_) => {
                    warn!("No suitable hardware adapter found, falling back to WARP.");
                    factory.enum_warp_adapter()?
                }
            }
        };

        let info = AdapterInfo::query(&adapter)?;
        info!(
            "Found D3D12 adapter '{}' with {}MB of dedicated video memory.",
            info.description,
            info.dedicated_video_memory / 1000 / 1000
        );

        Ok(Adapter {
            native: adapter,
            info,
        })
    }

    pub fn info(&self) -> &AdapterInfo {
        &self.info
    }
}

pub struct SwapchainProperties {
    pub window_handle: HWND,
    pub back_buffer_count: u32,
    pub back_buffer_width: u32,
    pub back_buffer_height: u32,
    pub back_buffer_format: dxgiformat::DXGI_FORMAT,
    pub allow_tearing: bool,
}

pub struct Swapchain {
    pub(crate) native: ComPtr<dxgi1_4::IDXGISwapChain3>,
    flags: u32,
}

impl Swapchain {
    pub fn new(
        factory: &Factory,
        command_queue: &CommandQueue,
        properties: &SwapchainProperties,
    ) -> Result<Self, Error> {
        trace!("Creating swap chain.");
        let flags = if properties.allow_tearing {
            dxgi::DXGI_SWAP_CHAIN_FLAG_ALLOW_TEARING
        } else {
            0
        };
        let desc = dxgi1_2::DXGI_SWAP_CHAIN_DESC1 {
            Width: properties.back_buffer_width,
            Height: properties.back_buffer_height,
            Format: properties.back_buffer_format,
            Stereo: minwindef::FALSE,
            SampleDesc: dxgitype::DXGI_SAMPLE_DESC {
                Count: 1,
                Quality: 0,
            },
            BufferUsage: dxgitype::DXGI_USAGE_RENDER_TARGET_OUTPUT,
            BufferCount: properties.back_buffer_count,
            Scaling: dxgi1_2::DXGI_SCALING_STRETCH,
            SwapEffect: dxgi::DXGI_SWAP_EFFECT_FLIP_DISCARD,
            AlphaMode: dxgi1_2::DXGI_ALPHA_MODE_UNSPECIFIED,
            Flags: flags,
        };

        let mut swapchain = ComPtr::<dxgi1_2::IDXGISwapChain1>::null();
        let hr = unsafe {
            factory.native.CreateSwapChainForHwnd(
                command_queue.native.as_raw() as *mut _,
                properties.window_handle,
                &desc,
                ptr::null(),
                ptr::null_mut(),
                swapchain.as_mut_void() as *mut *mut _,
            )
        };
        if !SUCCEEDED(hr) {
            return Err(Error::SwapchainCreateFailed(hr));
        }

        let swapchain3 = swapchain
            .cast::<dxgi1_4::IDXGISwapChain3>()
            .map_err(Error::SwapchainCastFailed)?;
        Ok(Swapchain {
            native: swapchain3,
            flags,
        })
    }

    pub fn current_back_buffer_index(&self) -> u32 {
        unsafe { self.native.GetCurrentBackBufferIndex() }
    }

    pub fn buffer(&self, index: u32) -> Result<ComPtr<d3d12::ID3D12Resource>, Error> {
        let mut buffer = ComPtr::<d3d12::ID3D12Resource>::null();
        let hr = unsafe {
            self.native.GetBuffer(
                index,
                &d3d12::ID3D12Resource::uuidof(),
                buffer.as_mut_void(),
            )
        };
        if SUCCEEDED(hr) {
            Ok(buffer)
        } else {
            Err(Error::SwapchainGetBufferFailed { index, hr })
        }
    }

    /// Presents with vsync, or immediately with tearing when the swap chain allows it.
    ///
    /// Device removal is returned as the raw `HRESULT` so the caller can query the reason.
    pub fn present(&self) -> Result<(), HRESULT> {
        let hr = unsafe {
            if self.flags & dxgi::DXGI_SWAP_CHAIN_FLAG_ALLOW_TEARING != 0 {
                self.native.Present(0, dxgi::DXGI_PRESENT_ALLOW_TEARING)
            } else {
                self.native.Present(1, 0)
            }
        };
        if SUCCEEDED(hr) {
            Ok(())
        } else {
            Err(hr)
        }
    }

    pub fn resize_buffers(
        &self,
        back_buffer_count: u32,
        width: u32,
        height: u32,
        format: dxgiformat::DXGI_FORMAT,
    ) -> Result<(), HRESULT> {
        let hr = unsafe {
            self.native
                .ResizeBuffers(back_buffer_count, width, height, format, self.flags)
        };
        if SUCCEEDED(hr) {
            Ok(())
        } else {
            Err(hr)
        }
    }
}

pub fn is_device_lost(hr: HRESULT) -> bool {
    hr == winerror::DXGI_ERROR_DEVICE_REMOVED || hr == winerror::DXGI_ERROR_DEVICE_RESET
}
