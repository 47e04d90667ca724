/// Intermediate-bytecode translator seam
///
/// The device-independent shader bytecode is produced offline by the
/// high-level shader compiler, and per-instruction translation to native
/// source is performed by an external cross-compiler. This module defines
/// the boundary to that collaborator: the options the pipeline feeds it
/// and the reflection tables it must return alongside the translated
/// source text.

use bitflags::bitflags;
use crate::error::Result;
use crate::shader::stage::{TessPartitioning, TessOutputPrimitive};

/// Native shading language versions a context can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum GlslVersion {
    /// OpenGL ES 3.0
    Es300,
    /// OpenGL ES 3.1
    Es310,
    /// OpenGL ES 3.2
    Es320,
}

bitflags! {
    /// Source-generation rules understood by the cross-compiler
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TranslateRules: u32 {
        /// Emit explicit `binding = N` layout qualifiers on uniform blocks
        const UNIFORM_BLOCK_BINDING   = 1 << 0;
        /// Emit native matrix types instead of vector arrays
        const MATRIX_TYPE             = 1 << 1;
        /// Emit native unsigned integer types
        const UINT_TYPE               = 1 << 2;
        /// Emit gl_FragData-style multiple render target outputs
        const DRAW_BUFFERS            = 1 << 3;
        /// Emit tessellation stages through the EXT extension
        const EXT_TESSELLATION_SHADER = 1 << 4;
    }
}

impl GlslVersion {
    /// Baseline rule set for a language version; callers strip or add
    /// rules from here before translation
    pub fn default_rules(self) -> TranslateRules {
        TranslateRules::UNIFORM_BLOCK_BINDING
            | TranslateRules::MATRIX_TYPE
            | TranslateRules::UINT_TYPE
    }
}

/// Options for one translation run
#[derive(Debug, Clone)]
pub struct TranslateOptions {
    /// Target language version
    pub glsl_version: GlslVersion,
    /// Source-generation rules
    pub rules: TranslateRules,
    /// Preprocessor defines, derived from device capabilities
    pub macros: Vec<(String, String)>,
    /// Whether the program this stage belongs to has a pixel stage
    pub has_pixel_stage: bool,
    /// Tessellator partitioning inherited from the hull stage
    /// (meaningful for the domain stage only)
    pub tess_partitioning: TessPartitioning,
    /// Tessellator output primitive inherited from the hull stage
    pub tess_output_primitive: TessOutputPrimitive,
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self {
            glsl_version: GlslVersion::Es300,
            rules: GlslVersion::Es300.default_rules(),
            macros: Vec::new(),
            has_pixel_stage: true,
            tess_partitioning: TessPartitioning::Undefined,
            tess_output_primitive: TessOutputPrimitive::Undefined,
        }
    }
}

// ===== REFLECTION TABLES =====

/// One variable inside a constant buffer
#[derive(Debug, Clone)]
pub struct CbufferVariable {
    pub name: String,
    /// Whether the translated source actually references the variable
    pub used: bool,
}

/// One constant buffer of the bytecode
#[derive(Debug, Clone)]
pub struct CbufferReflection {
    pub name: String,
    pub variables: Vec<CbufferVariable>,
}

/// Resource classification as seen by the bytecode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Texture,
    Sampler,
}

/// Shape of a texture-kind resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceDimension {
    /// Buffer-backed resource; bound as a plain named resource,
    /// never paired with a sampler
    Buffer,
    Texture1D,
    Texture2D,
    Texture3D,
    TextureCube,
}

/// One bound resource of the bytecode
#[derive(Debug, Clone)]
pub struct ResourceReflection {
    pub name: String,
    pub kind: ResourceKind,
    pub dimension: ResourceDimension,
    /// Whether the translated source actually references the resource
    pub used: bool,
}

/// One vertex input parameter of the bytecode
#[derive(Debug, Clone)]
pub struct InputParamReflection {
    /// Semantic name as written in the high-level source (e.g. "TEXCOORD")
    pub semantic_name: String,
    pub semantic_index: u32,
    /// Component mask; zero means the input is declared but unread
    pub mask: u32,
}

/// Result of one translation run: native source plus the reflection the
/// binder needs to map effect parameters onto program resources
#[derive(Debug, Clone)]
pub struct TranslatedModule {
    /// Native-language source text
    pub source: String,
    pub cbuffers: Vec<CbufferReflection>,
    pub resources: Vec<ResourceReflection>,
    /// Vertex stage inputs (empty for other stages)
    pub input_params: Vec<InputParamReflection>,
    /// Tessellator layout discovered in a hull stage
    pub tess_partitioning: TessPartitioning,
    pub tess_output_primitive: TessOutputPrimitive,
}

impl Default for TranslatedModule {
    fn default() -> Self {
        Self {
            source: String::new(),
            cbuffers: Vec::new(),
            resources: Vec::new(),
            input_params: Vec::new(),
            tess_partitioning: TessPartitioning::Undefined,
            tess_output_primitive: TessOutputPrimitive::Undefined,
        }
    }
}

/// External cross-compiler boundary
///
/// Implementations convert one stage's intermediate bytecode into native
/// source. Errors are recoverable at the stage level: the caller degrades
/// the stage to invalid and keeps building the remaining stages.
pub trait BytecodeTranslator {
    fn translate(&self, bytecode: &[u8], options: &TranslateOptions) -> Result<TranslatedModule>;
}

#[cfg(test)]
#[path = "bytecode_tests.rs"]
mod tests;
