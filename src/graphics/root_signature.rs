use crate::graphics::com::ComPtr;
use crate::graphics::device::Device;
use crate::graphics::{blob_to_string, set_debug_name, Blob};

use thiserror::Error;

use winapi::shared::winerror::{HRESULT, SUCCEEDED};
use winapi::um::d3d12;
use winapi::Interface;

use std::mem;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to serialize root signature (hr = {hr:#010x}): {message}")]
    SerializeFailed { hr: HRESULT, message: String },
    #[error("failed to create root signature (hr = {0:#010x})")]
    CreateFailed(HRESULT),
}

/// A descriptor range of `count` descriptors starting at shader register `base_register`.
#[derive(Copy, Clone, Debug)]
pub struct DescriptorRange {
    pub range_type: d3d12::D3D12_DESCRIPTOR_RANGE_TYPE,
    pub count: u32,
    pub base_register: u32,
}

impl DescriptorRange {
    pub fn cbv(count: u32, base_register: u32) -> Self {
        DescriptorRange {
            range_type: d3d12::D3D12_DESCRIPTOR_RANGE_TYPE_CBV,
            count,
            base_register,
        }
    }

    fn to_native(self) -> d3d12::D3D12_DESCRIPTOR_RANGE {
        d3d12::D3D12_DESCRIPTOR_RANGE {
            RangeType: self.range_type,
            NumDescriptors: self.count,
            BaseShaderRegister: self.base_register,
            RegisterSpace: 0,
            OffsetInDescriptorsFromTableStart: d3d12::D3D12_DESCRIPTOR_RANGE_OFFSET_APPEND,
        }
    }
}

struct DescriptorTable {
    visibility: d3d12::D3D12_SHADER_VISIBILITY,
    ranges: Vec<d3d12::D3D12_DESCRIPTOR_RANGE>,
}

// Maximum 64 DWORDS divided up amongst all root parameters.
// Descriptor table pointer = 1 DWORD
pub struct RootSignatureBuilder {
    tables: Vec<DescriptorTable>,
    flags: d3d12::D3D12_ROOT_SIGNATURE_FLAGS,
}

impl RootSignatureBuilder {
    /// Appends a descriptor table parameter; its root index is the number of tables added before it.
    pub fn with_descriptor_table(
        mut self,
        visibility: d3d12::D3D12_SHADER_VISIBILITY,
        ranges: &[DescriptorRange],
    ) -> Self {
        self.tables.push(DescriptorTable {
            visibility,
            ranges: ranges.iter().map(|range| range.to_native()).collect(),
        });
        self
    }

    pub fn with_flags(mut self, flags: d3d12::D3D12_ROOT_SIGNATURE_FLAGS) -> Self {
        self.flags = flags;
        self
    }

    pub fn build(self, device: &Device, debug_name: &str) -> Result<RootSignature, Error> {
        // Parameters borrow the range vectors, which outlive serialization.
        let parameters: Vec<d3d12::D3D12_ROOT_PARAMETER> = self
            .tables
            .iter()
            .map(|table| {
                let mut parameter = d3d12::D3D12_ROOT_PARAMETER {
                    ParameterType: d3d12::D3D12_ROOT_PARAMETER_TYPE_DESCRIPTOR_TABLE,
                    u: unsafe { mem::zeroed() },
                    ShaderVisibility: table.visibility,
                };
                *unsafe { parameter.u.DescriptorTable_mut() } =
                    d3d12::D3D12_ROOT_DESCRIPTOR_TABLE {
                        NumDescriptorRanges: table.ranges.len() as _,
                        pDescriptorRanges: table.ranges.as_ptr(),
                    };
                parameter
            })
            .collect();

        let desc = d3d12::D3D12_ROOT_SIGNATURE_DESC {
            NumParameters: parameters.len() as _,
            pParameters: parameters.as_ptr(),
            NumStaticSamplers: 0,
            pStaticSamplers: std::ptr::null(),
            Flags: self.flags,
        };

        let mut serialized = Blob::null();
        let mut error = Blob::null();
        let hr = unsafe {
            d3d12::D3D12SerializeRootSignature(
                &desc,
                d3d12::D3D_ROOT_SIGNATURE_VERSION_1,
                serialized.as_mut_void() as *mut *mut _,
                error.as_mut_void() as *mut *mut _,
            )
        };
        if !SUCCEEDED(hr) {
            return Err(Error::SerializeFailed {
                hr,
                message: blob_to_string(&error),
            });
        }

        let mut signature = ComPtr::<d3d12::ID3D12RootSignature>::null();
        let hr = unsafe {
            device.native.CreateRootSignature(
                0,
                serialized.GetBufferPointer(),
                serialized.GetBufferSize(),
                &d3d12::ID3D12RootSignature::uuidof(),
                signature.as_mut_void(),
            )
        };
        if !SUCCEEDED(hr) {
            return Err(Error::CreateFailed(hr));
        }
        set_debug_name(&signature, debug_name);

        Ok(RootSignature { native: signature })
    }
}

impl Default for RootSignatureBuilder {
    fn default() -> Self {
        RootSignatureBuilder {
            tables: Vec::new(),
            flags: d3d12::D3D12_ROOT_SIGNATURE_FLAG_NONE,
        }
    }
}

pub struct RootSignature {
    pub(crate) native: ComPtr<d3d12::ID3D12RootSignature>,
}
