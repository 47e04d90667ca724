/// Effect parameters
///
/// A parameter is a named slot of an effect. Numeric parameters live
/// inside a constant buffer (their placement is described by a
/// [`CbufferBind`] attached after program reflection); texture, sampler
/// and buffer parameters carry opaque native handles that the backend
/// binds directly.

use glam::{Vec2, Vec3, Vec4, Mat4};
use crate::effect::constant_buffer::ConstantBuffer;

/// Native view over a shader-visible resource (texture or buffer)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceView {
    /// Native binding target (e.g. a GL texture target)
    pub native_target: u32,
    /// Native object handle
    pub native_handle: u32,
}

/// Native sampler state object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerState {
    /// Native sampler object handle
    pub native_sampler: u32,
}

/// Current value of an effect parameter
#[derive(Debug, Clone, Default)]
pub enum ParamValue {
    #[default]
    None,
    Float(f32),
    Float2(Vec2),
    Float3(Vec3),
    Float4(Vec4),
    Int(i32),
    UInt(u32),
    Float4x4(Mat4),
    FloatArray(Vec<f32>),
    Float4Array(Vec<Vec4>),
    Float4x4Array(Vec<Mat4>),
    /// Pre-packed bytes, copied verbatim (struct parameters)
    Raw(Vec<u8>),
    Resource(Option<ResourceView>),
    Sampler(Option<SamplerState>),
}

impl ParamValue {
    /// Copy the value into `cb` at the placement described by `bind`
    ///
    /// Matrices are laid out one column (or one row, when the program
    /// declared the uniform row-major) every `bind.stride` bytes.
    /// Array elements are laid out every `bind.stride` bytes.
    pub(crate) fn write_into(&self, cb: &mut ConstantBuffer, bind: &CbufferBind) {
        match self {
            ParamValue::None => {}
            ParamValue::Float(v) => cb.write(bind.offset, bytemuck::bytes_of(v)),
            ParamValue::Float2(v) => cb.write(bind.offset, bytemuck::bytes_of(v)),
            ParamValue::Float3(v) => cb.write(bind.offset, bytemuck::bytes_of(v)),
            ParamValue::Float4(v) => cb.write(bind.offset, bytemuck::bytes_of(v)),
            ParamValue::Int(v) => cb.write(bind.offset, bytemuck::bytes_of(v)),
            ParamValue::UInt(v) => cb.write(bind.offset, bytemuck::bytes_of(v)),
            ParamValue::Float4x4(m) => {
                Self::write_matrix(cb, bind.offset, bind.stride, bind.row_major, m);
            }
            ParamValue::FloatArray(values) => {
                for (i, v) in values.iter().enumerate() {
                    cb.write(bind.offset + i * bind.stride, bytemuck::bytes_of(v));
                }
            }
            ParamValue::Float4Array(values) => {
                for (i, v) in values.iter().enumerate() {
                    cb.write(bind.offset + i * bind.stride, bytemuck::bytes_of(v));
                }
            }
            ParamValue::Float4x4Array(values) => {
                for (i, m) in values.iter().enumerate() {
                    Self::write_matrix(cb, bind.offset + i * bind.stride, 16, bind.row_major, m);
                }
            }
            ParamValue::Raw(bytes) => cb.write(bind.offset, bytes),
            // Resource handles never live inside constant buffers
            ParamValue::Resource(_) | ParamValue::Sampler(_) => {}
        }
    }

    fn write_matrix(cb: &mut ConstantBuffer, offset: usize, stride: usize, row_major: bool, m: &Mat4) {
        let m = if row_major { m.transpose() } else { *m };
        let cols = m.to_cols_array_2d();
        for (i, col) in cols.iter().enumerate() {
            cb.write(offset + i * stride, bytemuck::cast_slice(col));
        }
    }
}

/// Declared type of an effect parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    Float,
    Float2,
    Float3,
    Float4,
    Int,
    UInt,
    Float4x4,
    Struct,
    Buffer,
    Texture,
    Sampler,
}

/// Placement of a numeric parameter inside a constant buffer, as
/// reported by program reflection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CbufferBind {
    /// Index of the owning buffer in the effect's cbuffer list
    pub cbuffer_index: usize,
    /// Byte offset of the first element
    pub offset: usize,
    /// Array stride for arrays, matrix stride for a single matrix,
    /// element size otherwise
    pub stride: usize,
    /// Program declared the uniform row-major
    pub row_major: bool,
}

/// One named parameter of an effect
#[derive(Debug, Clone)]
pub struct EffectParameter {
    name: String,
    kind: ParameterKind,
    /// Declared element count for array parameters, None for scalars
    array_size: Option<u32>,
    value: ParamValue,
    cbuffer_bind: Option<CbufferBind>,
    dirty: bool,
}

impl EffectParameter {
    pub fn new(name: &str, kind: ParameterKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            array_size: None,
            value: ParamValue::None,
            cbuffer_bind: None,
            dirty: false,
        }
    }

    /// Builder-style array declaration
    pub fn with_array_size(mut self, array_size: u32) -> Self {
        self.array_size = Some(array_size);
        self
    }

    pub fn array_size(&self) -> Option<u32> {
        self.array_size
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ParameterKind {
        self.kind
    }

    pub fn value(&self) -> &ParamValue {
        &self.value
    }

    /// Set the value and mark the parameter dirty so the next
    /// constant-buffer refresh picks it up
    pub fn set_value(&mut self, value: ParamValue) {
        self.value = value;
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Attach the constant-buffer placement discovered by reflection.
    /// Marks the parameter dirty so its current value is flushed into
    /// the buffer on the next refresh.
    pub fn bind_to_cbuffer(&mut self, bind: CbufferBind) {
        self.cbuffer_bind = Some(bind);
        self.dirty = true;
    }

    pub fn cbuffer_bind(&self) -> Option<&CbufferBind> {
        self.cbuffer_bind.as_ref()
    }

    /// Flush a dirty value into its constant buffer
    pub(crate) fn flush_into(&mut self, cbuffers: &mut [ConstantBuffer]) {
        if !self.dirty {
            return;
        }
        if let Some(bind) = &self.cbuffer_bind {
            if let Some(cb) = cbuffers.get_mut(bind.cbuffer_index) {
                self.value.write_into(cb, bind);
            }
        }
        self.dirty = false;
    }
}

#[cfg(test)]
#[path = "parameter_tests.rs"]
mod tests;
