/*!
# Nova3D Engine

Core traits and types for the Nova3D shader pipeline.

This crate provides the platform-agnostic half of the shader
cross-compilation and binding cache: the effect-side object model
(parameters, constant buffers, shader descriptors), the device
capability surface, and the seam to the offline bytecode
cross-compiler. Driver backends (OpenGL ES, ...) build the
translate → compile → link → reflect → bind pipeline on top of it.

## Architecture

- **RenderEffect**: named parameters, constant buffers and shader
  descriptors as produced by the (external) effect-file parser
- **EffectParameter** / **ConstantBuffer**: per-instance parameter
  values and CPU-side constant-buffer backing stores
- **BytecodeTranslator**: trait implemented by the external
  intermediate-bytecode cross-compiler
- **DeviceCaps**: capability flags that drive macro selection and
  stage availability in the backends

Backend implementations provide the concrete stage/program objects.
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod effect;
pub mod shader;

// Main nova3d namespace module
pub mod nova3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Engine facade (global logger management)
    pub use crate::engine::Engine;

    // Logging sub-module (types only, NOT macros)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
        // Note: engine_* macros are NOT re-exported here - they live at the crate root
    }

    // Effect sub-module: the effect-system input surface
    pub mod effect {
        pub use crate::effect::*;
    }

    // Shader sub-module: stages, capabilities, bytecode seam
    pub mod shader {
        pub use crate::shader::*;
    }
}

// Re-export math library at crate root
pub use glam;
