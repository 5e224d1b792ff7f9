use crate::graphics::command::{
    CommandAllocator, CommandListType, CommandQueue, GraphicsCommandList,
};
use crate::graphics::descriptor::{CpuDescriptor, DescriptorHeap};
use crate::graphics::device::{self, Device};
use crate::graphics::dxgi::{self, Adapter, AdapterInfo, Factory, Swapchain, SwapchainProperties};
use crate::graphics::resource::GpuResource;
use crate::graphics::{set_debug_name, Error};
use crate::{ContextFlags, ContextParams};

use log::{error, info, trace, warn};

use winapi::shared::{dxgiformat, dxgitype, winerror};
use winapi::um::{d3d12, d3dcommon};

use winit::platform::windows::WindowExtWindows;
use winit::window::Window;

use std::mem;

pub const MIN_FEATURE_LEVEL: d3dcommon::D3D_FEATURE_LEVEL = d3dcommon::D3D_FEATURE_LEVEL_12_0;
pub const BACK_BUFFER_FORMAT: dxgiformat::DXGI_FORMAT = dxgiformat::DXGI_FORMAT_R8G8B8A8_UNORM;
pub const DEPTH_STENCIL_FORMAT: dxgiformat::DXGI_FORMAT =
    dxgiformat::DXGI_FORMAT_D24_UNORM_S8_UINT;

/// Device, swap chain and the per-frame command recording state.
///
/// Every submission is followed by a full flush, so a single allocator is enough.
pub struct Context {
    // Fields drop in declaration order, so views and resources go before the device.
    depth_stencil: GpuResource,
    render_targets: Vec<GpuResource>,
    dsv_heap: DescriptorHeap,
    rtv_heap: DescriptorHeap,
    swapchain: Swapchain,
    command_list: GraphicsCommandList,
    command_allocator: CommandAllocator,
    command_queue: CommandQueue,
    device: Device,
    adapter: Adapter,
    _factory: Factory,
    screen_viewport: d3d12::D3D12_VIEWPORT,
    scissor_rect: d3d12::D3D12_RECT,
    clear_color: [f32; 4],
    back_buffer_count: u32,
    back_buffer_width: u32,
    back_buffer_height: u32,
    back_buffer_index: u32,
}

impl Context {
    pub fn new(window: &Window, params: &ContextParams) -> Result<Self, Error> {
        let window_handle = window.hwnd() as *mut _;
        let size = window.inner_size();
        let back_buffer_width = size.width.max(1);
        let back_buffer_height = size.height.max(1);
        let mut flags = params.flags;

        // Enable debug layer.
        let factory_flags = if flags.contains(ContextFlags::DEBUG_LAYER) {
            device::enable_debug_layer()
        } else {
            0
        };

        // Create DXGI factory.
        let factory = Factory::new(factory_flags)?;
        factory.disable_alt_enter(window_handle)?;

        // Determine if tearing is supported for fullscreen borderless windows.
        if flags.contains(ContextFlags::ALLOW_TEARING) && !factory.is_tearing_supported() {
            warn!("Tearing requested but not supported, presenting with vsync.");
            flags.remove(ContextFlags::ALLOW_TEARING);
        }

        // Get adapter.
        let adapter = Adapter::new(
            &factory,
            MIN_FEATURE_LEVEL,
            flags.contains(ContextFlags::FORCE_WARP),
        )?;

        // Create D3D12 API device.
        let device = Device::new(
            &adapter,
            MIN_FEATURE_LEVEL,
            flags.contains(ContextFlags::DEBUG_LAYER),
        )?;

        // Create command objects. The list starts closed and is reset before each use.
        trace!("Creating command objects.");
        let command_queue =
            CommandQueue::new(&device, CommandListType::Direct, "Cubelab::CommandQueue")?;
        let command_allocator = CommandAllocator::new(
            &device,
            CommandListType::Direct,
            "Cubelab::CommandAllocator",
        )?;
        let command_list = GraphicsCommandList::new(
            &device,
            &command_allocator,
            CommandListType::Direct,
            "Cubelab::CommandList",
        )?;

        // Create swapchain.
        let swapchain = Swapchain::new(
            &factory,
            &command_queue,
            &SwapchainProperties {
                window_handle,
                back_buffer_count: params.back_buffer_count,
                back_buffer_width,
                back_buffer_height,
                back_buffer_format: BACK_BUFFER_FORMAT,
                allow_tearing: flags.contains(ContextFlags::ALLOW_TEARING),
            },
        )?;
        let back_buffer_index = swapchain.current_back_buffer_index();

        // Create descriptor heaps for the render target and depth stencil views.
        trace!("Creating RTV and DSV descriptor heaps.");
        let rtv_heap = DescriptorHeap::new(
            &device,
            d3d12::D3D12_DESCRIPTOR_HEAP_TYPE_RTV,
            params.back_buffer_count,
            false,
            "Cubelab::RtvHeap",
        )?;
        let dsv_heap = DescriptorHeap::new(
            &device,
            d3d12::D3D12_DESCRIPTOR_HEAP_TYPE_DSV,
            1,
            false,
            "Cubelab::DsvHeap",
        )?;

        let render_targets =
            Self::create_render_targets(&device, &swapchain, &rtv_heap, params.back_buffer_count)?;
        let depth_stencil = Self::create_depth_stencil(
            &device,
            &dsv_heap,
            back_buffer_width,
            back_buffer_height,
        )?;

        info!(
            "Context ready: {}x{} with {} back buffers.",
            back_buffer_width, back_buffer_height, params.back_buffer_count
        );

        Ok(Context {
            depth_stencil,
            render_targets,
            dsv_heap,
            rtv_heap,
            swapchain,
            command_list,
            command_allocator,
            command_queue,
            device,
            adapter,
            _factory: factory,
            screen_viewport: Self::viewport(back_buffer_width, back_buffer_height),
            scissor_rect: Self::scissor_rect(back_buffer_width, back_buffer_height),
            clear_color: params.clear_color,
            back_buffer_count: params.back_buffer_count,
            back_buffer_width,
            back_buffer_height,
            back_buffer_index,
        })
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn adapter_info(&self) -> &AdapterInfo {
        self.adapter.info()
    }

    pub fn command_list(&self) -> &GraphicsCommandList {
        &self.command_list
    }

    pub fn back_buffer_format(&self) -> dxgiformat::DXGI_FORMAT {
        BACK_BUFFER_FORMAT
    }

    pub fn depth_stencil_format(&self) -> dxgiformat::DXGI_FORMAT {
        DEPTH_STENCIL_FORMAT
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.back_buffer_width as f32 / self.back_buffer_height as f32
    }

    /// Records commands with `record`, submits them and waits for the GPU to finish.
    pub fn execute_immediate<F, R>(&mut self, record: F) -> Result<R, Error>
    where
        F: FnOnce(&Device, &GraphicsCommandList) -> Result<R, Error>,
    {
        self.command_allocator.reset()?;
        self.command_list.reset(&self.command_allocator, None)?;

        let result = record(&self.device, &self.command_list);

        // Close even on failure so the list can be reset next time.
        self.command_list.close()?;
        let value = result?;
        self.command_queue.execute(&self.command_list);
        self.flush("ExecuteCommandLists")?;
        Ok(value)
    }

    /// Opens the command list for the frame and makes the back buffer a render target.
    pub fn prepare(&mut self) -> Result<(), Error> {
        // The previous frame was flushed, so the allocator is free to reuse.
        self.command_allocator.reset()?;
        self.command_list.reset(&self.command_allocator, None)?;

        let render_target = &mut self.render_targets[self.back_buffer_index as usize];
        self.command_list
            .transition(render_target, d3d12::D3D12_RESOURCE_STATE_RENDER_TARGET);
        Ok(())
    }

    pub fn clear(&self) {
        let rtv = self.rtv_heap.cpu_handle(self.back_buffer_index);
        let dsv = self.dsv_heap.cpu_handle(0);
        self.command_list.set_viewport(&self.screen_viewport);
        self.command_list.set_scissor_rect(&self.scissor_rect);
        self.command_list.clear_render_target_view(rtv, self.clear_color);
        self.command_list.clear_depth_stencil_view(dsv, 1.0, 0);
        self.command_list.set_render_target(rtv, dsv);
    }

    /// Submits the frame, presents it and waits for the GPU to finish.
    pub fn present(&mut self) -> Result<(), Error> {
        let render_target = &mut self.render_targets[self.back_buffer_index as usize];
        self.command_list
            .transition(render_target, d3d12::D3D12_RESOURCE_STATE_PRESENT);

        self.command_list.close()?;
        self.command_queue.execute(&self.command_list);

        if let Err(hr) = self.swapchain.present() {
            return Err(self.present_error("Present", hr));
        }

        self.flush("Present")?;
        self.back_buffer_index = self.swapchain.current_back_buffer_index();
        Ok(())
    }

    /// Rebuilds the swap chain buffers and the depth buffer for a new client size.
    ///
    /// Zero-sized requests (minimized window) are ignored.
    pub fn on_window_resized(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        if width == self.back_buffer_width && height == self.back_buffer_height {
            return Ok(());
        }
        trace!("Resizing back buffers to {}x{}.", width, height);

        // Wait until all previous GPU work is complete.
        self.flush("ResizeBuffers")?;

        // Back buffer references must be released before ResizeBuffers.
        self.render_targets.clear();

        if let Err(hr) =
            self.swapchain
                .resize_buffers(self.back_buffer_count, width, height, BACK_BUFFER_FORMAT)
        {
            if dxgi::is_device_lost(hr) {
                return Err(self.present_error("ResizeBuffers", hr));
            }
            return Err(dxgi::Error::SwapchainResizeFailed(hr).into());
        }

        self.back_buffer_width = width;
        self.back_buffer_height = height;
        self.back_buffer_index = self.swapchain.current_back_buffer_index();

        self.render_targets = Self::create_render_targets(
            &self.device,
            &self.swapchain,
            &self.rtv_heap,
            self.back_buffer_count,
        )?;
        self.depth_stencil = Self::create_depth_stencil(&self.device, &self.dsv_heap, width, height)?;

        self.screen_viewport = Self::viewport(width, height);
        self.scissor_rect = Self::scissor_rect(width, height);
        Ok(())
    }

    /// Waits for the queue to drain, reporting a removed device as `DeviceLost`.
    fn flush(&mut self, operation: &'static str) -> Result<(), Error> {
        match self.command_queue.flush() {
            Ok(()) => Ok(()),
            Err(e) => match e.device_lost_hresult() {
                Some(hr) => Err(self.present_error(operation, hr)),
                None => Err(e.into()),
            },
        }
    }

    fn present_error(&self, operation: &'static str, hr: winerror::HRESULT) -> Error {
        if hr == winerror::DXGI_ERROR_DEVICE_REMOVED {
            Error::DeviceLost {
                operation,
                reason: self.device.removed_reason(),
            }
        } else if hr == winerror::DXGI_ERROR_DEVICE_RESET {
            Error::DeviceLost {
                operation,
                reason: hr,
            }
        } else {
            dxgi::Error::PresentFailed(hr).into()
        }
    }

    fn viewport(width: u32, height: u32) -> d3d12::D3D12_VIEWPORT {
        d3d12::D3D12_VIEWPORT {
            TopLeftX: 0.0,
            TopLeftY: 0.0,
            Width: width as _,
            Height: height as _,
            MinDepth: d3d12::D3D12_MIN_DEPTH,
            MaxDepth: d3d12::D3D12_MAX_DEPTH,
        }
    }

    fn scissor_rect(width: u32, height: u32) -> d3d12::D3D12_RECT {
        d3d12::D3D12_RECT {
            left: 0,
            top: 0,
            right: width as _,
            bottom: height as _,
        }
    }

    fn create_render_targets(
        device: &Device,
        swapchain: &Swapchain,
        rtv_heap: &DescriptorHeap,
        back_buffer_count: u32,
    ) -> Result<Vec<GpuResource>, Error> {
        trace!("Creating render target views.");
        let mut render_targets = Vec::with_capacity(back_buffer_count as _);
        for n in 0..back_buffer_count {
            let buffer = swapchain.buffer(n)?;
            set_debug_name(&buffer, &format!("Cubelab::RenderTarget{}", n));

            let rtv_desc = d3d12::D3D12_RENDER_TARGET_VIEW_DESC {
                Format: BACK_BUFFER_FORMAT,
                ViewDimension: d3d12::D3D12_RTV_DIMENSION_TEXTURE2D,
                ..unsafe { mem::zeroed() }
            };
            let rtv: CpuDescriptor = rtv_heap.cpu_handle(n);
            unsafe {
                device
                    .native
                    .CreateRenderTargetView(buffer.as_raw(), &rtv_desc, rtv);
            }
            render_targets.push(GpuResource::new(
                buffer,
                d3d12::D3D12_RESOURCE_STATE_PRESENT,
            ));
        }
        Ok(render_targets)
    }

    fn create_depth_stencil(
        device: &Device,
        dsv_heap: &DescriptorHeap,
        width: u32,
        height: u32,
    ) -> Result<GpuResource, Error> {
        trace!("Creating depth stencil buffer.");
        let desc = d3d12::D3D12_RESOURCE_DESC {
            Dimension: d3d12::D3D12_RESOURCE_DIMENSION_TEXTURE2D,
            Alignment: 0,
            Width: u64::from(width),
            Height: height,
            DepthOrArraySize: 1,
            MipLevels: 1,
            Format: DEPTH_STENCIL_FORMAT,
            SampleDesc: dxgitype::DXGI_SAMPLE_DESC {
                Count: 1,
                Quality: 0,
            },
            Layout: d3d12::D3D12_TEXTURE_LAYOUT_UNKNOWN,
            Flags: d3d12::D3D12_RESOURCE_FLAG_ALLOW_DEPTH_STENCIL,
        };
        let mut clear_value = d3d12::D3D12_CLEAR_VALUE {
            Format: DEPTH_STENCIL_FORMAT,
            u: unsafe { mem::zeroed() },
        };
        *unsafe { clear_value.u.DepthStencil_mut() } = d3d12::D3D12_DEPTH_STENCIL_VALUE {
            Depth: 1.0,
            Stencil: 0,
        };

        let depth_stencil = GpuResource::new_committed(
            device,
            d3d12::D3D12_HEAP_TYPE_DEFAULT,
            &desc,
            d3d12::D3D12_RESOURCE_STATE_DEPTH_WRITE,
            Some(&clear_value),
            "Cubelab::DepthStencil",
        )?;

        let dsv_desc = d3d12::D3D12_DEPTH_STENCIL_VIEW_DESC {
            Format: DEPTH_STENCIL_FORMAT,
            ViewDimension: d3d12::D3D12_DSV_DIMENSION_TEXTURE2D,
            ..unsafe { mem::zeroed() }
        };
        unsafe {
            device.native.CreateDepthStencilView(
                depth_stencil.native.as_raw(),
                &dsv_desc,
                dsv_heap.cpu_handle(0),
            );
        }
        Ok(depth_stencil)
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        // Wait for GPU to finish all work before releasing anything it may still use.
        if let Err(e) = self.command_queue.flush() {
            error!("Failed to flush command queue on shutdown: {}", e);
        }
    }
}
