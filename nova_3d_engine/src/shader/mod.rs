/// Shader module - stage enums, device capabilities, bytecode translator seam

// Module declarations
pub mod stage;
pub mod caps;
pub mod bytecode;

// Re-export everything
pub use stage::*;
pub use caps::*;
pub use bytecode::*;
