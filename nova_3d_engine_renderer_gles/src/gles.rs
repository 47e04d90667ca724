/// OpenGL ES driver boundary
///
/// The shader pipeline never calls the driver directly; everything goes
/// through [`GlContext`]. A context is single-threaded (one per device
/// thread, held behind `Rc`), so implementations may cache driver state
/// internally without locking. Tests run the whole pipeline against the
/// mock implementation in `mock_gl`.

use std::rc::Rc;
use nova_3d_engine::nova3d::shader::ShaderStage;

// ===== NATIVE CONSTANTS =====

pub const GL_TEXTURE_2D: u32 = 0x0DE1;
pub const GL_TEXTURE_3D: u32 = 0x806F;
pub const GL_TEXTURE_CUBE_MAP: u32 = 0x8513;
pub const GL_TEXTURE_BUFFER: u32 = 0x8C2A;
pub const GL_UNIFORM_BUFFER: u32 = 0x8A11;

// ===== REFLECTION RESULTS =====

/// Cached result of a successful link, restorable on another program
/// object to skip the relink
#[derive(Debug, Clone)]
pub struct ProgramBinary {
    pub format: u32,
    pub data: Vec<u8>,
}

/// One active uniform inside a uniform block, as reported by the driver
#[derive(Debug, Clone)]
pub struct ActiveUniform {
    /// Full name, possibly with `[0]` and struct-member suffixes
    pub name: String,
    pub offset: i32,
    pub array_stride: i32,
    pub matrix_stride: i32,
    pub row_major: bool,
}

/// One active uniform block of a linked program
#[derive(Debug, Clone)]
pub struct UniformBlockInfo {
    pub name: String,
    pub data_size: usize,
    pub uniforms: Vec<ActiveUniform>,
}

// ===== DRIVER SURFACE =====

/// The slice of the OpenGL ES API the shader pipeline touches
pub trait GlContext {
    // Shader objects
    fn create_shader(&self, stage: ShaderStage) -> u32;
    fn shader_source(&self, shader: u32, source: &str);
    /// Compile; returns the compile status
    fn compile_shader(&self, shader: u32) -> bool;
    fn shader_info_log(&self, shader: u32) -> String;
    fn delete_shader(&self, shader: u32);

    // Program objects
    fn create_program(&self) -> u32;
    fn attach_shader(&self, program: u32, shader: u32);
    /// Register transform feedback varyings; must be called before link
    fn transform_feedback_varyings(&self, program: u32, varyings: &[String], separate: bool);
    /// Link; returns the link status
    fn link_program(&self, program: u32) -> bool;
    fn program_info_log(&self, program: u32) -> String;
    fn use_program(&self, program: u32);
    fn delete_program(&self, program: u32);

    // Program binaries
    fn program_binary_retrievable_hint(&self, program: u32);
    /// None when the driver exposes no binary formats
    fn get_program_binary(&self, program: u32) -> Option<ProgramBinary>;
    /// Restore a previously captured binary; returns the link status
    fn program_binary(&self, program: u32, binary: &ProgramBinary) -> bool;

    // Reflection
    fn uniform_location(&self, program: u32, name: &str) -> Option<i32>;
    fn attrib_location(&self, program: u32, name: &str) -> Option<i32>;
    fn active_uniform_blocks(&self, program: u32) -> Vec<UniformBlockInfo>;
    fn uniform_block_binding(&self, program: u32, block_index: u32, binding: u32);

    // Draw-time state
    /// glUniform1i on a sampler location (texture unit assignment)
    fn set_uniform_sampler(&self, location: i32, unit: u32);
    fn set_rasterizer_discard(&self, enabled: bool);

    // Buffer objects
    fn create_buffer(&self) -> u32;
    fn buffer_data(&self, buffer: u32, data: &[u8]);
    fn delete_buffer(&self, buffer: u32);

    // Batched binding
    fn bind_buffers_base(&self, target: u32, first: u32, buffers: &[u32]);
    fn bind_textures(&self, first: u32, targets: &[u32], textures: &[u32]);
    fn bind_samplers(&self, first: u32, samplers: &[u32]);

    /// Whether this driver reports shader errors as "1:<line>:" without a
    /// usable source dump (Mali). Changes how compile diagnostics print.
    fn quirk_numbered_log(&self) -> bool {
        false
    }
}

// ===== SCOPED HANDLES =====

/// Shader handle released on drop
pub struct GlShader {
    gl: Rc<dyn GlContext>,
    handle: u32,
}

impl GlShader {
    pub fn new(gl: Rc<dyn GlContext>, stage: ShaderStage) -> Self {
        let handle = gl.create_shader(stage);
        Self { gl, handle }
    }

    pub fn handle(&self) -> u32 {
        self.handle
    }
}

impl Drop for GlShader {
    fn drop(&mut self) {
        if self.handle != 0 {
            self.gl.delete_shader(self.handle);
        }
    }
}

/// Program handle released on drop
pub struct GlProgram {
    gl: Rc<dyn GlContext>,
    handle: u32,
}

impl GlProgram {
    pub fn new(gl: Rc<dyn GlContext>) -> Self {
        let handle = gl.create_program();
        Self { gl, handle }
    }

    pub fn handle(&self) -> u32 {
        self.handle
    }
}

impl Drop for GlProgram {
    fn drop(&mut self) {
        if self.handle != 0 {
            self.gl.delete_program(self.handle);
        }
    }
}

/// Buffer handle released on drop
pub struct GlBuffer {
    gl: Rc<dyn GlContext>,
    handle: u32,
}

impl GlBuffer {
    pub fn new(gl: Rc<dyn GlContext>) -> Self {
        let handle = gl.create_buffer();
        Self { gl, handle }
    }

    pub fn handle(&self) -> u32 {
        self.handle
    }
}

impl Drop for GlBuffer {
    fn drop(&mut self) {
        if self.handle != 0 {
            self.gl.delete_buffer(self.handle);
        }
    }
}

#[cfg(test)]
#[path = "gles_tests.rs"]
mod tests;
