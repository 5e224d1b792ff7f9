use crate::graphics::com::ComPtr;
use crate::graphics::device::Device;
use crate::graphics::root_signature::RootSignature;
use crate::graphics::{blob_to_string, set_debug_name, Blob};
use crate::scene::FillMode;

use bitflags::bitflags;
use log::{debug, info};
use thiserror::Error;

use winapi::shared::{
    dxgiformat, dxgitype, minwindef,
    winerror::{HRESULT, SUCCEEDED},
};
use winapi::um::{d3d12, d3dcompiler};
use winapi::Interface;

use std::ffi::CString;
use std::fs;
use std::io;
use std::marker::PhantomData;
use std::mem;
use std::path::{Path, PathBuf};
use std::ptr;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to compile shader entry point '{entry}' (hr = {hr:#010x}):\n{message}")]
    CompileFailed {
        entry: String,
        hr: HRESULT,
        message: String,
    },
    #[error("invalid shader entry point or source name '{0}'")]
    InvalidName(String),
    #[error("failed to read shader bytecode from {}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to create pipeline state '{name}' (hr = {hr:#010x})")]
    CreateFailed { name: String, hr: HRESULT },
}

bitflags! {
    pub struct ShaderCompilerFlags: u32 {
        const DEBUG = d3dcompiler::D3DCOMPILE_DEBUG;
        const SKIP_OPTIMIZATION = d3dcompiler::D3DCOMPILE_SKIP_OPTIMIZATION;
        const ENABLE_STRICTNESS = d3dcompiler::D3DCOMPILE_ENABLE_STRICTNESS;
    }
}

impl Default for ShaderCompilerFlags {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            ShaderCompilerFlags::DEBUG | ShaderCompilerFlags::SKIP_OPTIMIZATION
        } else {
            ShaderCompilerFlags::ENABLE_STRICTNESS
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub enum PipelineStage {
    Vertex,
    Pixel,
}

#[derive(Copy, Clone, Debug)]
pub enum ShaderModel {
    V5_0,
}

fn compile_target(stage: PipelineStage, model: ShaderModel) -> &'static str {
    match (stage, model) {
        (PipelineStage::Vertex, ShaderModel::V5_0) => "vs_5_0",
        (PipelineStage::Pixel, ShaderModel::V5_0) => "ps_5_0",
    }
}

/// Where the vertex and pixel shaders come from.
#[derive(Clone, Debug, PartialEq)]
pub enum ShaderSource {
    /// HLSL built into the binary, compiled at startup.
    Embedded,
    /// A directory holding precompiled `.cso` files.
    Precompiled(PathBuf),
}

enum Bytecode {
    Compiled(Blob),
    Loaded(Vec<u8>),
}

pub struct Shader {
    bytecode: Bytecode,
}

impl Shader {
    pub fn compile(
        source: &str,
        source_name: &str,
        entry: &str,
        stage: PipelineStage,
        model: ShaderModel,
        flags: ShaderCompilerFlags,
    ) -> Result<Self, Error> {
        let source_name_c =
            CString::new(source_name).map_err(|_| Error::InvalidName(source_name.to_owned()))?;
        let entry_c = CString::new(entry).map_err(|_| Error::InvalidName(entry.to_owned()))?;
        let target = CString::new(compile_target(stage, model))
            .map_err(|_| Error::InvalidName(entry.to_owned()))?;

        let mut shader = Blob::null();
        let mut error = Blob::null();
        let hr = unsafe {
            d3dcompiler::D3DCompile(
                source.as_ptr() as *const _,
                source.len(),
                source_name_c.as_ptr(),
                ptr::null(),
                ptr::null_mut(),
                entry_c.as_ptr(),
                target.as_ptr(),
                flags.bits(),
                0,
                shader.as_mut_void() as *mut *mut _,
                error.as_mut_void() as *mut *mut _,
            )
        };
        if !SUCCEEDED(hr) {
            return Err(Error::CompileFailed {
                entry: entry.to_owned(),
                hr,
                message: blob_to_string(&error),
            });
        }
        if !error.is_null() {
            debug!("Shader '{}' compiled with warnings:\n{}", entry, blob_to_string(&error));
        }

        Ok(Shader {
            bytecode: Bytecode::Compiled(shader),
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let bytes = fs::read(path).map_err(|source| Error::ReadFailed {
            path: path.to_owned(),
            source,
        })?;
        info!("Loaded {} bytes of shader bytecode from {}.", bytes.len(), path.display());
        Ok(Shader {
            bytecode: Bytecode::Loaded(bytes),
        })
    }

    fn native(&self) -> d3d12::D3D12_SHADER_BYTECODE {
        match &self.bytecode {
            Bytecode::Compiled(blob) => unsafe {
                d3d12::D3D12_SHADER_BYTECODE {
                    pShaderBytecode: blob.GetBufferPointer(),
                    BytecodeLength: blob.GetBufferSize(),
                }
            },
            Bytecode::Loaded(bytes) => d3d12::D3D12_SHADER_BYTECODE {
                pShaderBytecode: bytes.as_ptr() as *const _,
                BytecodeLength: bytes.len(),
            },
        }
    }
}

fn default_rasterizer_state() -> d3d12::D3D12_RASTERIZER_DESC {
    d3d12::D3D12_RASTERIZER_DESC {
        FillMode: d3d12::D3D12_FILL_MODE_SOLID,
        CullMode: d3d12::D3D12_CULL_MODE_BACK,
        FrontCounterClockwise: minwindef::FALSE,
        DepthBias: 0,
        DepthBiasClamp: 0.0,
        SlopeScaledDepthBias: 0.0,
        DepthClipEnable: minwindef::TRUE,
        MultisampleEnable: minwindef::FALSE,
        AntialiasedLineEnable: minwindef::FALSE,
        ForcedSampleCount: 0,
        ConservativeRaster: d3d12::D3D12_CONSERVATIVE_RASTERIZATION_MODE_OFF,
    }
}

fn default_blend_state() -> d3d12::D3D12_BLEND_DESC {
    let render_target = d3d12::D3D12_RENDER_TARGET_BLEND_DESC {
        BlendEnable: minwindef::FALSE,
        LogicOpEnable: minwindef::FALSE,
        SrcBlend: d3d12::D3D12_BLEND_ONE,
        DestBlend: d3d12::D3D12_BLEND_ZERO,
        BlendOp: d3d12::D3D12_BLEND_OP_ADD,
        SrcBlendAlpha: d3d12::D3D12_BLEND_ONE,
        DestBlendAlpha: d3d12::D3D12_BLEND_ZERO,
        BlendOpAlpha: d3d12::D3D12_BLEND_OP_ADD,
        LogicOp: d3d12::D3D12_LOGIC_OP_NOOP,
        RenderTargetWriteMask: d3d12::D3D12_COLOR_WRITE_ENABLE_ALL as u8,
    };
    d3d12::D3D12_BLEND_DESC {
        AlphaToCoverageEnable: minwindef::FALSE,
        IndependentBlendEnable: minwindef::FALSE,
        RenderTarget: [render_target; 8],
    }
}

fn default_depth_stencil_state() -> d3d12::D3D12_DEPTH_STENCIL_DESC {
    let stencil_op = d3d12::D3D12_DEPTH_STENCILOP_DESC {
        StencilFailOp: d3d12::D3D12_STENCIL_OP_KEEP,
        StencilDepthFailOp: d3d12::D3D12_STENCIL_OP_KEEP,
        StencilPassOp: d3d12::D3D12_STENCIL_OP_KEEP,
        StencilFunc: d3d12::D3D12_COMPARISON_FUNC_ALWAYS,
    };
    d3d12::D3D12_DEPTH_STENCIL_DESC {
        DepthEnable: minwindef::TRUE,
        DepthWriteMask: d3d12::D3D12_DEPTH_WRITE_MASK_ALL,
        DepthFunc: d3d12::D3D12_COMPARISON_FUNC_LESS,
        StencilEnable: minwindef::FALSE,
        StencilReadMask: d3d12::D3D12_DEFAULT_STENCIL_READ_MASK as u8,
        StencilWriteMask: d3d12::D3D12_DEFAULT_STENCIL_WRITE_MASK as u8,
        FrontFace: stencil_op,
        BackFace: stencil_op,
    }
}

/// Graphics pipeline description, starting from the D3D12 default states.
///
/// Borrows the shaders, input layout and root signature it points at until `build`.
pub struct PipelineStateBuilder<'a> {
    desc: d3d12::D3D12_GRAPHICS_PIPELINE_STATE_DESC,
    _borrows: PhantomData<&'a ()>,
}

impl<'a> PipelineStateBuilder<'a> {
    pub fn with_fill_mode(mut self, fill_mode: FillMode) -> Self {
        self.desc.RasterizerState.FillMode = match fill_mode {
            FillMode::Solid => d3d12::D3D12_FILL_MODE_SOLID,
            FillMode::Wireframe => d3d12::D3D12_FILL_MODE_WIREFRAME,
        };
        self
    }

    pub fn with_primitive_topology_type(
        mut self,
        topology: d3d12::D3D12_PRIMITIVE_TOPOLOGY_TYPE,
    ) -> Self {
        self.desc.PrimitiveTopologyType = topology;
        self
    }

    pub fn with_render_target_format(
        mut self,
        rtv_format: dxgiformat::DXGI_FORMAT,
        dsv_format: dxgiformat::DXGI_FORMAT,
    ) -> Self {
        self.desc.RTVFormats = [dxgiformat::DXGI_FORMAT_UNKNOWN; 8];
        self.desc.RTVFormats[0] = rtv_format;
        self.desc.NumRenderTargets = 1;
        self.desc.DSVFormat = dsv_format;
        self.desc.SampleDesc = dxgitype::DXGI_SAMPLE_DESC {
            Count: 1,
            Quality: 0,
        };
        self
    }

    pub fn with_input_layout(mut self, elements: &'a [d3d12::D3D12_INPUT_ELEMENT_DESC]) -> Self {
        self.desc.InputLayout = d3d12::D3D12_INPUT_LAYOUT_DESC {
            pInputElementDescs: elements.as_ptr(),
            NumElements: elements.len() as _,
        };
        self
    }

    pub fn with_vertex_shader(mut self, shader: &'a Shader) -> Self {
        self.desc.VS = shader.native();
        self
    }

    pub fn with_pixel_shader(mut self, shader: &'a Shader) -> Self {
        self.desc.PS = shader.native();
        self
    }

    pub fn with_root_signature(mut self, root_signature: &'a RootSignature) -> Self {
        self.desc.pRootSignature = root_signature.native.as_raw();
        self
    }

    pub fn build(self, device: &Device, debug_name: &str) -> Result<PipelineState, Error> {
        let mut pso = ComPtr::<d3d12::ID3D12PipelineState>::null();
        let hr = unsafe {
            device.native.CreateGraphicsPipelineState(
                &self.desc,
                &d3d12::ID3D12PipelineState::uuidof(),
                pso.as_mut_void(),
            )
        };
        if !SUCCEEDED(hr) {
            return Err(Error::CreateFailed {
                name: debug_name.to_owned(),
                hr,
            });
        }
        set_debug_name(&pso, debug_name);
        info!("Graphics pipeline state '{}' created.", debug_name);

        Ok(PipelineState { native: pso })
    }
}

impl<'a> Default for PipelineStateBuilder<'a> {
    fn default() -> Self {
        let mut desc: d3d12::D3D12_GRAPHICS_PIPELINE_STATE_DESC = unsafe { mem::zeroed() };
        desc.RasterizerState = default_rasterizer_state();
        desc.BlendState = default_blend_state();
        desc.DepthStencilState = default_depth_stencil_state();
        desc.SampleMask = u32::max_value();
        desc.PrimitiveTopologyType = d3d12::D3D12_PRIMITIVE_TOPOLOGY_TYPE_TRIANGLE;
        desc.SampleDesc = dxgitype::DXGI_SAMPLE_DESC {
            Count: 1,
            Quality: 0,
        };
        PipelineStateBuilder {
            desc,
            _borrows: PhantomData,
        }
    }
}

pub struct PipelineState {
    pub(crate) native: ComPtr<d3d12::ID3D12PipelineState>,
}
