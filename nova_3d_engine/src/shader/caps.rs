/// Device capability surface consumed by the shader pipeline
///
/// Backends fill a DeviceCaps once per context; stage translation uses it
/// to decide macro defines, translation rules and stage availability.

use rustc_hash::FxHashSet;
use crate::shader::bytecode::GlslVersion;

/// Block-compressed texture formats relevant to shader-side swizzling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressedFormat {
    Bc1,
    Bc2,
    Bc3,
    Bc4,
    Bc5,
    Bc1Srgb,
    Bc2Srgb,
    Bc3Srgb,
    Bc4Srgb,
    Bc5Srgb,
}

/// Capability flags of the device a program is being built for
#[derive(Debug, Clone)]
pub struct DeviceCaps {
    /// Native shading language version of the context
    pub glsl_version: GlslVersion,
    /// Maximum number of simultaneous render targets
    pub max_simultaneous_rts: u32,
    /// Hull/tessellation-control stage available
    pub hull_shader_support: bool,
    /// Domain/tessellation-evaluation stage available
    pub domain_shader_support: bool,
    /// Compressed formats the device can sample natively
    texture_formats: FxHashSet<CompressedFormat>,
    /// Driver extensions present on the context
    extensions: FxHashSet<String>,
}

impl Default for DeviceCaps {
    fn default() -> Self {
        Self {
            glsl_version: GlslVersion::Es300,
            max_simultaneous_rts: 1,
            hull_shader_support: false,
            domain_shader_support: false,
            texture_formats: FxHashSet::default(),
            extensions: FxHashSet::default(),
        }
    }
}

impl DeviceCaps {
    /// Record a natively supported compressed format
    pub fn support_texture_format(&mut self, format: CompressedFormat) {
        self.texture_formats.insert(format);
    }

    /// Record a present driver extension
    pub fn support_extension(&mut self, name: &str) {
        self.extensions.insert(name.to_string());
    }

    /// Whether the device samples `format` natively
    pub fn texture_format_supported(&self, format: CompressedFormat) -> bool {
        self.texture_formats.contains(&format)
    }

    /// Whether the driver exposes the named extension
    pub fn extension_supported(&self, name: &str) -> bool {
        self.extensions.contains(name)
    }
}

#[cfg(test)]
#[path = "caps_tests.rs"]
mod tests;
