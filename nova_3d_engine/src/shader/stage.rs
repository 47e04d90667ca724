/// Shader stage enums and related fixed tables

use bitflags::bitflags;

/// Number of programmable pipeline stages
pub const NUM_SHADER_STAGES: usize = 6;

/// One programmable unit in the graphics pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex shader
    Vertex,
    /// Pixel/Fragment shader
    Pixel,
    /// Geometry shader
    Geometry,
    /// Compute shader
    Compute,
    /// Hull/Tessellation-control shader
    Hull,
    /// Domain/Tessellation-evaluation shader
    Domain,
}

impl ShaderStage {
    /// All stages in pipeline order (hull before domain - the domain stage
    /// consumes metadata discovered while translating the hull stage)
    pub const ALL: [ShaderStage; NUM_SHADER_STAGES] = [
        ShaderStage::Vertex,
        ShaderStage::Pixel,
        ShaderStage::Geometry,
        ShaderStage::Compute,
        ShaderStage::Hull,
        ShaderStage::Domain,
    ];

    /// Stable index into per-stage arrays
    pub fn index(self) -> usize {
        match self {
            ShaderStage::Vertex => 0,
            ShaderStage::Pixel => 1,
            ShaderStage::Geometry => 2,
            ShaderStage::Compute => 3,
            ShaderStage::Hull => 4,
            ShaderStage::Domain => 5,
        }
    }

    /// Inverse of [`ShaderStage::index`]
    pub fn from_index(index: usize) -> Option<ShaderStage> {
        Self::ALL.get(index).copied()
    }

    /// Default target profile substituted for the `"auto"` sentinel
    pub fn default_profile(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vs_5_0",
            ShaderStage::Pixel => "ps_5_0",
            ShaderStage::Geometry => "gs_5_0",
            ShaderStage::Compute => "cs_5_0",
            ShaderStage::Hull => "hs_5_0",
            ShaderStage::Domain => "ds_5_0",
        }
    }
}

/// Vertex input semantic usage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexElementUsage {
    Position,
    Normal,
    Diffuse,
    Specular,
    BlendWeight,
    BlendIndex,
    TextureCoord,
    Tangent,
    Binormal,
}

impl VertexElementUsage {
    /// Stable wire value used by the stage cache stream
    pub fn to_u8(self) -> u8 {
        match self {
            VertexElementUsage::Position => 0,
            VertexElementUsage::Normal => 1,
            VertexElementUsage::Diffuse => 2,
            VertexElementUsage::Specular => 3,
            VertexElementUsage::BlendWeight => 4,
            VertexElementUsage::BlendIndex => 5,
            VertexElementUsage::TextureCoord => 6,
            VertexElementUsage::Tangent => 7,
            VertexElementUsage::Binormal => 8,
        }
    }

    /// Inverse of [`VertexElementUsage::to_u8`]
    pub fn from_u8(value: u8) -> Option<VertexElementUsage> {
        match value {
            0 => Some(VertexElementUsage::Position),
            1 => Some(VertexElementUsage::Normal),
            2 => Some(VertexElementUsage::Diffuse),
            3 => Some(VertexElementUsage::Specular),
            4 => Some(VertexElementUsage::BlendWeight),
            5 => Some(VertexElementUsage::BlendIndex),
            6 => Some(VertexElementUsage::TextureCoord),
            7 => Some(VertexElementUsage::Tangent),
            8 => Some(VertexElementUsage::Binormal),
            _ => None,
        }
    }
}

/// Tessellator partitioning scheme, discovered while translating the hull
/// stage and handed to the domain stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TessPartitioning {
    #[default]
    Undefined,
    Integer,
    Pow2,
    FractionalOdd,
    FractionalEven,
}

/// Tessellator output primitive, discovered alongside [`TessPartitioning`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TessOutputPrimitive {
    #[default]
    Undefined,
    Point,
    Line,
    TriangleCw,
    TriangleCcw,
}

bitflags! {
    /// Set of pipeline stages, used to record which stages reference a
    /// combined texture/sampler binding (informational only)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StageMask: u32 {
        const VERTEX   = 1 << 0;
        const PIXEL    = 1 << 1;
        const GEOMETRY = 1 << 2;
        const COMPUTE  = 1 << 3;
        const HULL     = 1 << 4;
        const DOMAIN   = 1 << 5;
    }
}

impl StageMask {
    /// Single-stage mask
    pub fn from_stage(stage: ShaderStage) -> StageMask {
        StageMask::from_bits_truncate(1 << stage.index() as u32)
    }
}

#[cfg(test)]
#[path = "stage_tests.rs"]
mod tests;
