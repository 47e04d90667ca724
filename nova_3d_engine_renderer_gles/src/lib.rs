/*!
# Nova3D Engine - OpenGL ES Renderer Backend

OpenGL ES implementation of the Nova3D shader pipeline.

This crate builds the translate → compile → link → reflect → bind
pipeline on top of the `nova_3d_engine` effect model: per-stage objects
that turn device-independent bytecode into ES shading language source,
a byte-stream codec that caches the translated artifact, and a program
object that reflects uniform blocks and resources back onto effect
parameters and serves draw-call binding.

The driver is reached exclusively through the [`GlContext`] trait, so
the whole pipeline runs against a mock context in tests.
*/

// GLES implementation modules
mod gles;
mod gles_shader_stage;
mod gles_shader_stream;
mod gles_shader_object;

#[cfg(test)]
pub(crate) mod mock_gl;

pub use gles::{GlContext, GlShader, GlProgram, GlBuffer, ProgramBinary, ActiveUniform, UniformBlockInfo};
pub use gles::{GL_TEXTURE_2D, GL_TEXTURE_3D, GL_TEXTURE_CUBE_MAP, GL_TEXTURE_BUFFER, GL_UNIFORM_BUFFER};
pub use gles_shader_stage::{ShaderStageObject, StageExt, TessMetadata};
pub use gles_shader_stream::{ByteReader, ByteWriter};
pub use gles_shader_object::ShaderObject;
