/// Render effect - the input surface of the shader pipeline
///
/// An effect is the parsed form of an effect file: named parameters,
/// constant buffers, and techniques whose passes carry per-stage shader
/// descriptors (profile, entry point, device-independent bytecode and
/// optional stream-output declarations). Backends consume descriptors
/// to build native programs and attach reflection results back onto the
/// parameters and buffers.

use std::sync::Arc;
use crate::effect::constant_buffer::ConstantBuffer;
use crate::effect::parameter::EffectParameter;
use crate::shader::stage::{ShaderStage, VertexElementUsage, NUM_SHADER_STAGES};

/// One output element of a stream-output (transform feedback) signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamOutputDecl {
    pub usage: VertexElementUsage,
    pub usage_index: u8,
    /// Output buffer slot; distinct slots select separate-attribs capture
    pub slot: u8,
}

/// Per-stage shader description inside a pass
#[derive(Debug, Clone)]
pub struct ShaderDescriptor {
    /// Target profile, or `"auto"` to use the stage default
    pub profile: String,
    /// Entry point name in the original high-level source
    pub function_name: String,
    /// Device-independent bytecode, shared between effect clones
    pub bytecode: Arc<Vec<u8>>,
    /// Stream-output signature (vertex or geometry stages)
    pub stream_output: Vec<StreamOutputDecl>,
}

impl ShaderDescriptor {
    pub fn new(profile: &str, function_name: &str, bytecode: Vec<u8>) -> Self {
        Self {
            profile: profile.to_string(),
            function_name: function_name.to_string(),
            bytecode: Arc::new(bytecode),
            stream_output: Vec::new(),
        }
    }

    /// Profile with the `"auto"` sentinel resolved to the stage default
    pub fn resolved_profile(&self, stage: ShaderStage) -> &str {
        if self.profile == "auto" {
            stage.default_profile()
        } else {
            &self.profile
        }
    }
}

/// One pass of a technique
#[derive(Debug, Clone)]
pub struct Pass {
    name: String,
    shader_descriptors: [Option<ShaderDescriptor>; NUM_SHADER_STAGES],
}

impl Pass {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            shader_descriptors: Default::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_shader_descriptor(&mut self, stage: ShaderStage, desc: ShaderDescriptor) {
        self.shader_descriptors[stage.index()] = Some(desc);
    }

    pub fn shader_descriptor(&self, stage: ShaderStage) -> Option<&ShaderDescriptor> {
        self.shader_descriptors[stage.index()].as_ref()
    }
}

/// One technique of an effect
#[derive(Debug, Clone)]
pub struct Technique {
    name: String,
    passes: Vec<Pass>,
}

impl Technique {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            passes: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_pass(&mut self, pass: Pass) -> usize {
        self.passes.push(pass);
        self.passes.len() - 1
    }

    pub fn pass(&self, index: usize) -> Option<&Pass> {
        self.passes.get(index)
    }

    pub fn num_passes(&self) -> usize {
        self.passes.len()
    }
}

// ===== RENDER EFFECT =====

/// A parsed effect: parameters, constant buffers and techniques
#[derive(Debug, Clone)]
pub struct RenderEffect {
    name: String,
    parameters: Vec<EffectParameter>,
    cbuffers: Vec<ConstantBuffer>,
    techniques: Vec<Technique>,
}

impl RenderEffect {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parameters: Vec::new(),
            cbuffers: Vec::new(),
            techniques: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // ===== PARAMETERS =====

    pub fn add_parameter(&mut self, param: EffectParameter) -> usize {
        self.parameters.push(param);
        self.parameters.len() - 1
    }

    /// Index of the parameter with the given name
    pub fn parameter_by_name(&self, name: &str) -> Option<usize> {
        self.parameters.iter().position(|p| p.name() == name)
    }

    pub fn parameter(&self, index: usize) -> Option<&EffectParameter> {
        self.parameters.get(index)
    }

    pub fn parameter_mut(&mut self, index: usize) -> Option<&mut EffectParameter> {
        self.parameters.get_mut(index)
    }

    pub fn parameters(&self) -> &[EffectParameter] {
        &self.parameters
    }

    pub fn num_parameters(&self) -> usize {
        self.parameters.len()
    }

    // ===== CONSTANT BUFFERS =====

    pub fn add_cbuffer(&mut self, cbuffer: ConstantBuffer) -> usize {
        self.cbuffers.push(cbuffer);
        self.cbuffers.len() - 1
    }

    /// Index of the constant buffer with the given name
    pub fn cbuffer_by_name(&self, name: &str) -> Option<usize> {
        self.cbuffers.iter().position(|cb| cb.name() == name)
    }

    pub fn cbuffer(&self, index: usize) -> Option<&ConstantBuffer> {
        self.cbuffers.get(index)
    }

    pub fn cbuffer_mut(&mut self, index: usize) -> Option<&mut ConstantBuffer> {
        self.cbuffers.get_mut(index)
    }

    pub fn num_cbuffers(&self) -> usize {
        self.cbuffers.len()
    }

    /// Flush every dirty parameter into its constant buffer
    pub fn update_cbuffers(&mut self) {
        let Self { parameters, cbuffers, .. } = self;
        for param in parameters.iter_mut() {
            param.flush_into(cbuffers);
        }
    }

    // ===== TECHNIQUES =====

    pub fn add_technique(&mut self, technique: Technique) -> usize {
        self.techniques.push(technique);
        self.techniques.len() - 1
    }

    pub fn technique_by_name(&self, name: &str) -> Option<usize> {
        self.techniques.iter().position(|t| t.name() == name)
    }

    pub fn technique(&self, index: usize) -> Option<&Technique> {
        self.techniques.get(index)
    }

    /// Shader descriptor of one stage of one pass, if the pass uses
    /// that stage
    pub fn shader_descriptor(
        &self,
        technique_index: usize,
        pass_index: usize,
        stage: ShaderStage,
    ) -> Option<&ShaderDescriptor> {
        self.techniques
            .get(technique_index)?
            .pass(pass_index)?
            .shader_descriptor(stage)
    }
}

#[cfg(test)]
#[path = "render_effect_tests.rs"]
mod tests;
