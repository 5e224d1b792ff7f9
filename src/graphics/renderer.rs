use crate::graphics::buffer::{IndexBuffer, UploadBuffer, VertexBuffer};
use crate::graphics::command::GraphicsCommandList;
use crate::graphics::descriptor::DescriptorHeap;
use crate::graphics::pso::{
    PipelineStage, PipelineState, PipelineStateBuilder, Shader, ShaderCompilerFlags, ShaderModel,
    ShaderSource,
};
use crate::graphics::root_signature::{DescriptorRange, RootSignature, RootSignatureBuilder};
use crate::graphics::{Context, Error};
use crate::mesh::{MeshData, Vertex};
use crate::object_constants::ObjectConstants;
use crate::scene::FillMode;

use log::{info, trace};

use winapi::shared::dxgiformat;
use winapi::um::{d3d12, d3dcommon};

const COLOR_SHADER: &str = include_str!("../../shaders/color.hlsl");
const VERTEX_SHADER_FILE: &str = "color_vs.cso";
const PIXEL_SHADER_FILE: &str = "color_ps.cso";

fn input_layout() -> [d3d12::D3D12_INPUT_ELEMENT_DESC; 2] {
    [
        d3d12::D3D12_INPUT_ELEMENT_DESC {
            SemanticName: b"POSITION\0".as_ptr() as *const _,
            SemanticIndex: 0,
            Format: dxgiformat::DXGI_FORMAT_R32G32B32_FLOAT,
            InputSlot: 0,
            AlignedByteOffset: Vertex::POSITION_OFFSET as u32,
            InputSlotClass: d3d12::D3D12_INPUT_CLASSIFICATION_PER_VERTEX_DATA,
            InstanceDataStepRate: 0,
        },
        d3d12::D3D12_INPUT_ELEMENT_DESC {
            SemanticName: b"COLOR\0".as_ptr() as *const _,
            SemanticIndex: 0,
            Format: dxgiformat::DXGI_FORMAT_R32G32B32A32_FLOAT,
            InputSlot: 0,
            AlignedByteOffset: Vertex::COLOR_OFFSET as u32,
            InputSlotClass: d3d12::D3D12_INPUT_CLASSIFICATION_PER_VERTEX_DATA,
            InstanceDataStepRate: 0,
        },
    ]
}

fn load_shaders(source: &ShaderSource) -> Result<(Shader, Shader), Error> {
    match source {
        ShaderSource::Embedded => {
            trace!("Compiling embedded shaders.");
            let flags = ShaderCompilerFlags::default();
            let vs = Shader::compile(
                COLOR_SHADER,
                "color.hlsl",
                "VS",
                PipelineStage::Vertex,
                ShaderModel::V5_0,
                flags,
            )?;
            let ps = Shader::compile(
                COLOR_SHADER,
                "color.hlsl",
                "PS",
                PipelineStage::Pixel,
                ShaderModel::V5_0,
                flags,
            )?;
            Ok((vs, ps))
        }
        ShaderSource::Precompiled(dir) => {
            let vs = Shader::from_file(&dir.join(VERTEX_SHADER_FILE))?;
            let ps = Shader::from_file(&dir.join(PIXEL_SHADER_FILE))?;
            Ok((vs, ps))
        }
    }
}

/// GPU state for drawing one mesh with a single per-object constant buffer.
pub struct Renderer {
    solid_pso: PipelineState,
    wireframe_pso: PipelineState,
    root_signature: RootSignature,
    cbv_heap: DescriptorHeap,
    object_constants: UploadBuffer<ObjectConstants>,
    vertex_buffer: VertexBuffer,
    index_buffer: IndexBuffer,
}

impl Renderer {
    pub fn new(
        context: &mut Context,
        mesh: &MeshData,
        shader_source: &ShaderSource,
    ) -> Result<Self, Error> {
        // Upload geometry and wait for the copy so the staging buffers can go.
        trace!("Uploading mesh geometry.");
        let (mut vertex_buffer, mut index_buffer) =
            context.execute_immediate(|device, command_list| {
                let vertex_buffer = VertexBuffer::new(
                    device,
                    command_list,
                    mesh.vertex_bytes(),
                    Vertex::STRIDE as u32,
                    "Cubelab::VertexBuffer",
                )?;
                let index_buffer = IndexBuffer::new(
                    device,
                    command_list,
                    &mesh.indices,
                    "Cubelab::IndexBuffer",
                )?;
                Ok((vertex_buffer, index_buffer))
            })?;
        vertex_buffer.release_staging();
        index_buffer.release_staging();

        let device = context.device();

        // Constant buffer and its view in a shader-visible heap.
        trace!("Creating constant buffer.");
        let cbv_heap = DescriptorHeap::new(
            device,
            d3d12::D3D12_DESCRIPTOR_HEAP_TYPE_CBV_SRV_UAV,
            1,
            true,
            "Cubelab::CbvHeap",
        )?;
        let mut object_constants =
            UploadBuffer::<ObjectConstants>::new(device, 1, true, "Cubelab::ObjectConstants")?;
        object_constants.copy_data(0, &ObjectConstants::default());
        let cbv_desc = d3d12::D3D12_CONSTANT_BUFFER_VIEW_DESC {
            BufferLocation: object_constants.gpu_virtual_address(0),
            SizeInBytes: object_constants.element_size() as u32,
        };
        unsafe {
            device
                .native
                .CreateConstantBufferView(&cbv_desc, cbv_heap.cpu_handle(0));
        }

        // One descriptor table holding the CBV at b0.
        trace!("Creating root signature.");
        let root_signature = RootSignatureBuilder::default()
            .with_descriptor_table(
                d3d12::D3D12_SHADER_VISIBILITY_ALL,
                &[DescriptorRange::cbv(1, 0)],
            )
            .with_flags(d3d12::D3D12_ROOT_SIGNATURE_FLAG_ALLOW_INPUT_ASSEMBLER_INPUT_LAYOUT)
            .build(device, "Cubelab::RootSignature")?;

        let (vs, ps) = load_shaders(shader_source)?;
        let layout = input_layout();
        let pipeline = |fill_mode: FillMode, name: &str| {
            PipelineStateBuilder::default()
                .with_input_layout(&layout)
                .with_root_signature(&root_signature)
                .with_vertex_shader(&vs)
                .with_pixel_shader(&ps)
                .with_fill_mode(fill_mode)
                .with_primitive_topology_type(d3d12::D3D12_PRIMITIVE_TOPOLOGY_TYPE_TRIANGLE)
                .with_render_target_format(
                    context.back_buffer_format(),
                    context.depth_stencil_format(),
                )
                .build(device, name)
        };
        let solid_pso = pipeline(FillMode::Solid, "Cubelab::SolidPso")?;
        let wireframe_pso = pipeline(FillMode::Wireframe, "Cubelab::WireframePso")?;

        info!(
            "Renderer ready with {} vertices and {} indices.",
            mesh.vertices.len(),
            index_buffer.index_count()
        );

        Ok(Renderer {
            solid_pso,
            wireframe_pso,
            root_signature,
            cbv_heap,
            object_constants,
            vertex_buffer,
            index_buffer,
        })
    }

    /// Writes the per-object constants. Only call while the GPU is idle.
    pub fn update(&mut self, constants: &ObjectConstants) {
        self.object_constants.copy_data(0, constants);
    }

    pub fn draw(&self, command_list: &GraphicsCommandList, fill_mode: FillMode) {
        let pso = match fill_mode {
            FillMode::Solid => &self.solid_pso,
            FillMode::Wireframe => &self.wireframe_pso,
        };
        command_list.set_pipeline_state(pso);
        command_list.set_graphics_root_signature(&self.root_signature);
        command_list.set_descriptor_heaps(&[&self.cbv_heap]);
        command_list.set_graphics_root_descriptor_table(0, self.cbv_heap.gpu_handle(0));

        command_list.set_vertex_buffer(0, self.vertex_buffer.view());
        command_list.set_index_buffer(self.index_buffer.view());
        command_list.set_primitive_topology(d3dcommon::D3D_PRIMITIVE_TOPOLOGY_TRIANGLELIST);
        command_list.draw_indexed(self.index_buffer.index_count(), 0, 0);
    }
}
