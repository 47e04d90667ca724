/// Effect module - parameters, constant buffers, shader descriptors

// Module declarations
pub mod parameter;
pub mod constant_buffer;
pub mod render_effect;

// Re-export everything
pub use parameter::*;
pub use constant_buffer::*;
pub use render_effect::*;
