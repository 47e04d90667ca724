/// Per-stage shader objects
///
/// A `ShaderStageObject` owns one pipeline stage of a program: it turns
/// the stage's device-independent bytecode into ES shading language
/// source (or restores that source from the cache stream), records the
/// reflection the binder needs later, and compiles the source into a
/// driver shader handle.
///
/// Geometry and compute stages exist as slots but are unavailable on
/// this backend; compiling one degrades it to invalid.

use std::rc::Rc;
use nova_3d_engine::engine_error;
use nova_3d_engine::nova3d::effect::{RenderEffect, ShaderDescriptor, StreamOutputDecl};
use nova_3d_engine::nova3d::shader::{
    BytecodeTranslator, CompressedFormat, DeviceCaps, ResourceDimension, ResourceKind,
    ShaderStage, TessOutputPrimitive, TessPartitioning, TranslateOptions, TranslateRules,
    TranslatedModule, VertexElementUsage,
};
use crate::gles::{GlContext, GlShader};

const LOG_SOURCE: &str = "nova3d::gles::ShaderStageObject";

/// Tessellator layout handed from the hull stage to the domain stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TessMetadata {
    pub partitioning: TessPartitioning,
    pub output_primitive: TessOutputPrimitive,
}

/// Stage-specific state
#[derive(Debug, Clone)]
pub enum StageExt {
    None,
    Vertex {
        /// Parallel arrays: usage/usage_index/attribute name per vertex input
        usages: Vec<VertexElementUsage>,
        usage_indices: Vec<u8>,
        attrib_names: Vec<String>,
        tfb_varyings: Vec<String>,
        tfb_separate_attribs: bool,
    },
    Hull {
        /// Discovered while translating, consumed by the domain stage
        tess: TessMetadata,
    },
    Domain {
        /// Inherited from the hull stage at translate time
        tess: TessMetadata,
        tfb_varyings: Vec<String>,
        tfb_separate_attribs: bool,
    },
}

// ===== CAPABILITY MACRO TABLE =====

/// One row of the preprocessor-define table; `value` yields `None` when
/// the macro is not emitted for the given capability set
struct CapabilityMacro {
    name: &'static str,
    value: fn(&DeviceCaps) -> Option<&'static str>,
}

fn bc5_native(caps: &DeviceCaps) -> bool {
    caps.texture_format_supported(CompressedFormat::Bc5)
        && caps.texture_format_supported(CompressedFormat::Bc5Srgb)
}

fn bc4_native(caps: &DeviceCaps) -> bool {
    caps.texture_format_supported(CompressedFormat::Bc4)
        && caps.texture_format_supported(CompressedFormat::Bc4Srgb)
}

const CAPABILITY_MACROS: &[CapabilityMacro] = &[
    CapabilityMacro { name: "NOVA3D_BYTECODE_GLSL", value: |_| Some("1") },
    CapabilityMacro { name: "NOVA3D_GLES", value: |_| Some("1") },
    CapabilityMacro {
        name: "NOVA3D_BC5_AS_AG",
        value: |caps| if bc5_native(caps) { None } else { Some("1") },
    },
    CapabilityMacro {
        name: "NOVA3D_BC5_AS_GA",
        value: |caps| if bc5_native(caps) { Some("1") } else { None },
    },
    CapabilityMacro {
        name: "NOVA3D_BC4_AS_G",
        value: |caps| if bc4_native(caps) { None } else { Some("1") },
    },
    CapabilityMacro {
        name: "NOVA3D_FRAG_DEPTH",
        value: |caps| Some(if caps.extension_supported("GL_EXT_frag_depth") { "1" } else { "0" }),
    },
];

// ===== STAGE OBJECT =====

pub struct ShaderStageObject {
    pub(crate) stage: ShaderStage,
    pub(crate) available: bool,
    pub(crate) valid: bool,
    pub(crate) hw_res_ready: bool,
    pub(crate) glsl_src: String,
    pub(crate) func_name: String,
    /// Parallel arrays: effect parameter name / program resource name
    pub(crate) param_names: Vec<String>,
    pub(crate) res_names: Vec<String>,
    pub(crate) tex_sampler_pairs: Vec<(String, String)>,
    pub(crate) ext: StageExt,
    pub(crate) gl_shader: Option<GlShader>,
}

impl ShaderStageObject {
    pub fn new(stage: ShaderStage, caps: &DeviceCaps) -> Self {
        let available = match stage {
            ShaderStage::Vertex | ShaderStage::Pixel => true,
            ShaderStage::Geometry | ShaderStage::Compute => false,
            ShaderStage::Hull => caps.hull_shader_support,
            ShaderStage::Domain => caps.domain_shader_support,
        };
        let ext = match stage {
            ShaderStage::Vertex => StageExt::Vertex {
                usages: Vec::new(),
                usage_indices: Vec::new(),
                attrib_names: Vec::new(),
                tfb_varyings: Vec::new(),
                tfb_separate_attribs: false,
            },
            ShaderStage::Hull => StageExt::Hull { tess: TessMetadata::default() },
            ShaderStage::Domain => StageExt::Domain {
                tess: TessMetadata::default(),
                tfb_varyings: Vec::new(),
                tfb_separate_attribs: false,
            },
            _ => StageExt::None,
        };
        Self {
            stage,
            available,
            valid: false,
            hw_res_ready: false,
            glsl_src: String::new(),
            func_name: String::new(),
            param_names: Vec::new(),
            res_names: Vec::new(),
            tex_sampler_pairs: Vec::new(),
            ext,
            gl_shader: None,
        }
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn glsl_source(&self) -> &str {
        &self.glsl_src
    }

    pub fn func_name(&self) -> &str {
        &self.func_name
    }

    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    pub fn res_names(&self) -> &[String] {
        &self.res_names
    }

    pub fn tex_sampler_pairs(&self) -> &[(String, String)] {
        &self.tex_sampler_pairs
    }

    pub fn gl_shader_handle(&self) -> u32 {
        self.gl_shader.as_ref().map(|s| s.handle()).unwrap_or(0)
    }

    /// Tessellator metadata discovered by a hull stage
    pub fn hull_metadata(&self) -> Option<TessMetadata> {
        match &self.ext {
            StageExt::Hull { tess } => Some(*tess),
            _ => None,
        }
    }

    /// Transform feedback varyings of a vertex or domain stage
    pub fn tfb_varyings(&self) -> Option<(&[String], bool)> {
        match &self.ext {
            StageExt::Vertex { tfb_varyings, tfb_separate_attribs, .. }
            | StageExt::Domain { tfb_varyings, tfb_separate_attribs, .. } => {
                Some((tfb_varyings.as_slice(), *tfb_separate_attribs))
            }
            _ => None,
        }
    }

    /// Vertex input triples (usage, usage index, attribute name)
    pub fn vertex_attribs(&self) -> Option<(&[VertexElementUsage], &[u8], &[String])> {
        match &self.ext {
            StageExt::Vertex { usages, usage_indices, attrib_names, .. } => {
                Some((usages, usage_indices, attrib_names))
            }
            _ => None,
        }
    }

    /// Target profile with `"auto"` resolved; empty when the stage is
    /// unavailable on this device (which forces the stage invalid)
    pub fn shader_profile<'a>(&self, desc: &'a ShaderDescriptor) -> &'a str {
        if self.available {
            desc.resolved_profile(self.stage)
        } else {
            ""
        }
    }

    /// Translate the stage's bytecode into ES shading language source
    /// and capture the reflection tables.
    ///
    /// The domain stage needs the hull stage's tessellator layout;
    /// without it the stage degrades to invalid.
    pub fn compile(
        &mut self,
        translator: &dyn BytecodeTranslator,
        caps: &DeviceCaps,
        effect: &RenderEffect,
        technique_index: usize,
        pass_index: usize,
        hull_metadata: Option<TessMetadata>,
    ) {
        let Some(desc) = effect.shader_descriptor(technique_index, pass_index, self.stage) else {
            self.valid = false;
            return;
        };
        self.func_name = desc.function_name.clone();

        let has_pixel_stage = effect
            .shader_descriptor(technique_index, pass_index, ShaderStage::Pixel)
            .map(|d| !d.function_name.is_empty())
            .unwrap_or(false);

        self.valid = true;
        let mut inherited_tess = TessMetadata::default();
        match self.stage {
            ShaderStage::Vertex | ShaderStage::Pixel | ShaderStage::Hull => {}
            ShaderStage::Domain => match hull_metadata {
                Some(tess) => inherited_tess = tess,
                None => {
                    engine_error!(
                        LOG_SOURCE,
                        "Domain stage without a hull stage: {}/{}/{}",
                        technique_name(effect, technique_index),
                        pass_name(effect, technique_index, pass_index),
                        self.func_name
                    );
                    self.valid = false;
                }
            },
            ShaderStage::Geometry | ShaderStage::Compute => {
                self.valid = false;
            }
        }
        if !self.valid {
            return;
        }

        let profile = self.shader_profile(desc);
        if profile.is_empty() {
            self.valid = false;
            return;
        }

        let macros: Vec<(String, String)> = CAPABILITY_MACROS
            .iter()
            .filter_map(|m| (m.value)(caps).map(|v| (m.name.to_string(), v.to_string())))
            .collect();

        let mut rules = caps.glsl_version.default_rules();
        rules.remove(
            TranslateRules::UNIFORM_BLOCK_BINDING
                | TranslateRules::MATRIX_TYPE
                | TranslateRules::UINT_TYPE,
        );
        if caps.max_simultaneous_rts > 1 {
            rules |= TranslateRules::DRAW_BUFFERS;
        }
        if matches!(self.stage, ShaderStage::Hull | ShaderStage::Domain) {
            rules |= TranslateRules::EXT_TESSELLATION_SHADER;
        }

        let options = TranslateOptions {
            glsl_version: caps.glsl_version,
            rules,
            macros,
            has_pixel_stage,
            tess_partitioning: inherited_tess.partitioning,
            tess_output_primitive: inherited_tess.output_primitive,
        };

        match translator.translate(&desc.bytecode, &options) {
            Ok(module) => self.apply_translation(module, inherited_tess),
            Err(err) => {
                self.valid = false;
                engine_error!(
                    LOG_SOURCE,
                    "Error(s) in conversion: {}/{}/{}: {}",
                    technique_name(effect, technique_index),
                    pass_name(effect, technique_index, pass_index),
                    self.func_name,
                    err
                );
            }
        }
    }

    fn apply_translation(&mut self, module: TranslatedModule, inherited_tess: TessMetadata) {
        self.glsl_src = module.source;
        self.param_names.clear();
        self.res_names.clear();
        self.tex_sampler_pairs.clear();

        for cbuffer in &module.cbuffers {
            for var in &cbuffer.variables {
                if var.used {
                    self.param_names.push(var.name.clone());
                    self.res_names.push(var.name.clone());
                }
            }
        }

        let mut tex_names: Vec<&str> = Vec::new();
        let mut sampler_names: Vec<&str> = Vec::new();
        for res in &module.resources {
            if !res.used {
                continue;
            }
            match res.kind {
                ResourceKind::Texture => {
                    if res.dimension == ResourceDimension::Buffer {
                        // Buffer-backed resources bind as plain named uniforms
                        self.param_names.push(res.name.clone());
                        self.res_names.push(res.name.clone());
                    } else {
                        tex_names.push(&res.name);
                    }
                }
                ResourceKind::Sampler => sampler_names.push(&res.name),
            }
        }

        // Full cross product: the program sees one combined sampler
        // uniform per (texture, sampler) pair
        for tex in &tex_names {
            for sampler in &sampler_names {
                let combined = format!("{}_{}", tex, sampler);
                self.tex_sampler_pairs.push((tex.to_string(), sampler.to_string()));
                self.param_names.push(combined.clone());
                self.res_names.push(combined);
            }
        }

        match &mut self.ext {
            StageExt::Vertex { usages, usage_indices, attrib_names, .. } => {
                usages.clear();
                usage_indices.clear();
                attrib_names.clear();
                for input in &module.input_params {
                    if input.mask == 0 {
                        continue;
                    }
                    let semantic = input.semantic_name.as_str();
                    if semantic == "SV_VertexID" || semantic == "SV_InstanceID" {
                        continue;
                    }

                    let (usage, usage_index, attrib_name) = match semantic {
                        "POSITION" => (VertexElementUsage::Position, 0, "POSITION0".to_string()),
                        "NORMAL" => (VertexElementUsage::Normal, 0, "NORMAL0".to_string()),
                        "COLOR" => {
                            if input.semantic_index == 0 {
                                (VertexElementUsage::Diffuse, 0, "COLOR0".to_string())
                            } else {
                                (VertexElementUsage::Specular, 0, "COLOR1".to_string())
                            }
                        }
                        "BLENDWEIGHT" => {
                            (VertexElementUsage::BlendWeight, 0, "BLENDWEIGHT0".to_string())
                        }
                        "BLENDINDICES" => {
                            (VertexElementUsage::BlendIndex, 0, "BLENDINDICES0".to_string())
                        }
                        _ if semantic.starts_with("TEXCOORD") => (
                            VertexElementUsage::TextureCoord,
                            input.semantic_index as u8,
                            format!("TEXCOORD{}", input.semantic_index),
                        ),
                        "TANGENT" => (VertexElementUsage::Tangent, 0, "TANGENT0".to_string()),
                        "BINORMAL" => (VertexElementUsage::Binormal, 0, "BINORMAL0".to_string()),
                        _ => unreachable!("Invalid semantic"),
                    };

                    usages.push(usage);
                    usage_indices.push(usage_index);
                    attrib_names.push(attrib_name);
                }
            }
            StageExt::Hull { tess } => {
                *tess = TessMetadata {
                    partitioning: module.tess_partitioning,
                    output_primitive: module.tess_output_primitive,
                };
            }
            StageExt::Domain { tess, .. } => {
                *tess = inherited_tess;
            }
            StageExt::None => {}
        }
    }

    /// Compile the translated source into a driver shader handle and
    /// resolve the stage's transform feedback varyings.
    pub fn create_hw_shader(
        &mut self,
        gl: &Rc<dyn GlContext>,
        effect: &RenderEffect,
        technique_index: usize,
        pass_index: usize,
    ) {
        if self.hw_res_ready {
            return;
        }
        if !self.glsl_src.is_empty() {
            let shader = GlShader::new(gl.clone(), self.stage);
            if shader.handle() == 0 {
                self.valid = false;
            } else {
                gl.shader_source(shader.handle(), &self.glsl_src);
                if !gl.compile_shader(shader.handle()) {
                    engine_error!(LOG_SOURCE, "Error when compiling ESSL {}:", self.func_name);
                    let info = gl.shader_info_log(shader.handle());
                    if !info.is_empty() {
                        log_compile_diagnostics(gl.quirk_numbered_log(), &self.glsl_src, &info);
                    }
                    self.valid = false;
                }
                self.gl_shader = Some(shader);
            }

            if matches!(self.ext, StageExt::Vertex { .. } | StageExt::Domain { .. }) {
                if let Some(desc) =
                    effect.shader_descriptor(technique_index, pass_index, self.stage)
                {
                    let (varyings, separate) = retrieve_tfb_varyings(&desc.stream_output);
                    match &mut self.ext {
                        StageExt::Vertex { tfb_varyings, tfb_separate_attribs, .. }
                        | StageExt::Domain { tfb_varyings, tfb_separate_attribs, .. } => {
                            *tfb_varyings = varyings;
                            *tfb_separate_attribs = separate;
                        }
                        _ => {}
                    }
                }
            }
        }

        self.hw_res_ready = true;
    }
}

/// Map stream-output declarations to ES varying names and detect
/// whether capture needs separate-attribs mode (declarations spread
/// over more than one buffer slot).
fn retrieve_tfb_varyings(decls: &[StreamOutputDecl]) -> (Vec<String>, bool) {
    let mut varyings = Vec::with_capacity(decls.len());
    let mut slot: Option<u8> = None;
    let mut separate = false;

    for decl in decls {
        match slot {
            None => slot = Some(decl.slot),
            Some(s) if s != decl.slot => separate = true,
            _ => {}
        }

        let name = match decl.usage {
            VertexElementUsage::Position => "gl_Position".to_string(),
            VertexElementUsage::Normal => "v_NORMAL0".to_string(),
            VertexElementUsage::Diffuse => "v_COLOR0".to_string(),
            VertexElementUsage::Specular => "v_COLOR1".to_string(),
            VertexElementUsage::BlendWeight => "v_BLENDWEIGHT0".to_string(),
            VertexElementUsage::BlendIndex => "v_BLENDINDICES0".to_string(),
            VertexElementUsage::TextureCoord => format!("v_TEXCOORD{}", decl.usage_index),
            VertexElementUsage::Tangent => "v_TANGENT0".to_string(),
            VertexElementUsage::Binormal => "v_BINORMAL0".to_string(),
        };
        varyings.push(name);
    }

    (varyings, separate)
}

/// Dump compile diagnostics. Some drivers report errors as
/// "1:<line>:" without a usable source reference; for those, print a
/// two-line window of the source around every reported line instead of
/// the whole numbered dump.
fn log_compile_diagnostics(quirk_numbered: bool, glsl: &str, info: &str) {
    let mut out = String::new();
    if quirk_numbered {
        for err_line_str in info.lines().filter(|l| !l.is_empty()) {
            if let Some(pos) = err_line_str.find("1:") {
                let rest = &err_line_str[pos + 2..];
                if let Some(end) = rest.find(':') {
                    if let Ok(err_line) = rest[..end].parse::<i64>() {
                        out.push_str("...\n");
                        for (idx, src_line) in glsl.lines().enumerate() {
                            let line = idx as i64 + 1;
                            if (line - err_line) > -3 && (line - err_line) < 3 {
                                out.push_str(&format!("{} {}\n", line, src_line));
                            }
                        }
                        out.push_str("...\n");
                    }
                }
            }
            out.push_str(err_line_str);
            out.push('\n');
        }
    } else {
        for (idx, src_line) in glsl.lines().enumerate() {
            out.push_str(&format!("{} {}\n", idx + 1, src_line));
        }
        out.push_str(info);
    }
    engine_error!(LOG_SOURCE, "{}", out);
}

fn technique_name(effect: &RenderEffect, technique_index: usize) -> &str {
    effect
        .technique(technique_index)
        .map(|t| t.name())
        .unwrap_or("<unknown>")
}

fn pass_name(effect: &RenderEffect, technique_index: usize, pass_index: usize) -> &str {
    effect
        .technique(technique_index)
        .and_then(|t| t.pass(pass_index))
        .map(|p| p.name())
        .unwrap_or("<unknown>")
}

#[cfg(test)]
#[path = "gles_shader_stage_tests.rs"]
mod tests;
