/// Linked shader programs
///
/// A `ShaderObject` owns one driver program object plus the binding
/// state that maps effect parameters onto the program's slots. The
/// stage objects and the cached program binary live in a shared
/// template so that clones reuse the compiled units.
///
/// Bind order per draw: use-program, parameter applies, constant-buffer
/// refresh and base binding, then one batched texture bind and one
/// batched sampler bind. Constant buffers must be refreshed after the
/// applies, and the batches after any apply that resolved new handles.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use rustc_hash::FxHashMap;
use nova_3d_engine::{engine_bail, engine_error};
use nova_3d_engine::nova3d::Result;
use nova_3d_engine::nova3d::effect::{CbufferBind, ParamValue, ParameterKind, RenderEffect};
use nova_3d_engine::nova3d::shader::{
    BytecodeTranslator, DeviceCaps, ShaderStage, StageMask, VertexElementUsage, NUM_SHADER_STAGES,
};
use crate::gles::{
    GlBuffer, GlContext, GlProgram, ProgramBinary, GL_TEXTURE_2D, GL_UNIFORM_BUFFER,
};
use crate::gles_shader_stage::ShaderStageObject;
use crate::gles_shader_stream::{decode_stage_block, encode_stage_block, ByteReader, ByteWriter};

const LOG_SOURCE: &str = "nova3d::gles::ShaderObject";

/// State shared between a program and its clones
pub(crate) struct ProgramTemplate {
    pub(crate) stages: [Option<Rc<ShaderStageObject>>; NUM_SHADER_STAGES],
    /// Captured after the first successful link; restored on clones to
    /// skip the relink
    pub(crate) binary: RefCell<Option<ProgramBinary>>,
}

/// One combined texture/sampler pair, deduplicated across stages
#[derive(Debug, Clone)]
pub(crate) struct TexSamplerBind {
    pub(crate) combined_name: String,
    pub(crate) tex_name: String,
    pub(crate) sampler_name: String,
    /// Resolved against this instance's effect; re-resolved on clone
    pub(crate) tex_param_index: Option<usize>,
    pub(crate) sampler_param_index: Option<usize>,
    /// Stages referencing the pair (informational)
    pub(crate) stage_mask: StageMask,
}

#[derive(Debug, Clone)]
enum BindKind {
    /// Buffer-backed resource parameter looked up directly by name
    Resource { param_index: usize },
    /// Combined texture/sampler resolved through the pair table
    TexSampler { pair_index: usize },
}

/// One resolved uniform slot of the program
#[derive(Debug, Clone)]
struct ParameterBind {
    /// Effect parameter name, or the combined pair name
    name: String,
    location: i32,
    /// Index into the bind-target/texture/sampler arrays; stable for
    /// the program's lifetime
    slot: usize,
    kind: BindKind,
}

/// Native buffer backing one reflected uniform block
struct CbufferSlot {
    cbuffer_index: usize,
    buffer: GlBuffer,
    uploaded: bool,
}

// ===== SHADER OBJECT =====

pub struct ShaderObject {
    gl: Rc<dyn GlContext>,
    program: GlProgram,
    template: Rc<ProgramTemplate>,
    valid: bool,
    param_binds: Vec<ParameterBind>,
    tex_sampler_binds: Vec<TexSamplerBind>,
    bind_targets: Vec<u32>,
    bind_textures: Vec<u32>,
    bind_samplers: Vec<u32>,
    cbuffer_slots: Vec<CbufferSlot>,
    attrib_locs: FxHashMap<(VertexElementUsage, u8), i32>,
}

impl ShaderObject {
    /// Build a program from the pass's bytecode: translate and compile
    /// every present stage, then link and reflect.
    ///
    /// Never fails outright; stages that cannot be built degrade the
    /// program to invalid.
    pub fn compile(
        gl: Rc<dyn GlContext>,
        translator: &dyn BytecodeTranslator,
        caps: &DeviceCaps,
        effect: &mut RenderEffect,
        technique_index: usize,
        pass_index: usize,
    ) -> ShaderObject {
        let mut stages: [Option<ShaderStageObject>; NUM_SHADER_STAGES] = Default::default();
        // Pipeline order matters: the hull stage must be translated
        // before the domain stage that consumes its metadata
        for stage in ShaderStage::ALL {
            let Some(desc) = effect.shader_descriptor(technique_index, pass_index, stage) else {
                continue;
            };
            if desc.function_name.is_empty() {
                continue;
            }
            let hull_metadata = if stage == ShaderStage::Domain {
                stages[ShaderStage::Hull.index()]
                    .as_ref()
                    .and_then(|h| h.hull_metadata())
            } else {
                None
            };
            let mut stage_obj = ShaderStageObject::new(stage, caps);
            stage_obj.compile(translator, caps, effect, technique_index, pass_index, hull_metadata);
            stages[stage.index()] = Some(stage_obj);
        }
        Self::finish(gl, effect, technique_index, pass_index, stages)
    }

    /// Rebuild a program from a cache stream written by [`stream_out`],
    /// skipping translation entirely.
    ///
    /// [`stream_out`]: ShaderObject::stream_out
    pub fn stream_in(
        gl: Rc<dyn GlContext>,
        caps: &DeviceCaps,
        effect: &mut RenderEffect,
        technique_index: usize,
        pass_index: usize,
        data: &[u8],
    ) -> Result<ShaderObject> {
        let mut r = ByteReader::new(data);
        let mut stages: [Option<ShaderStageObject>; NUM_SHADER_STAGES] = Default::default();
        for stage in ShaderStage::ALL {
            let mut decoded = decode_stage_block(stage, caps, &mut r)?;
            // The stream carries no entry-point names; resolve them from
            // the effect so restored stages log the same context as
            // freshly compiled ones
            if let Some(stage_obj) = decoded.as_mut() {
                if let Some(desc) = effect.shader_descriptor(technique_index, pass_index, stage) {
                    stage_obj.func_name = desc.function_name.clone();
                }
            }
            stages[stage.index()] = decoded;
        }
        if r.remaining() != 0 {
            engine_bail!(
                LOG_SOURCE,
                "Trailing bytes in shader cache stream: {}",
                r.remaining()
            );
        }
        Ok(Self::finish(gl, effect, technique_index, pass_index, stages))
    }

    /// Serialize every stage slot in order (absent stages write a zero
    /// block length)
    pub fn stream_out(&self) -> Vec<u8> {
        let mut w = ByteWriter::new();
        for stage in ShaderStage::ALL {
            encode_stage_block(self.template.stages[stage.index()].as_deref(), &mut w);
        }
        w.into_bytes()
    }

    fn finish(
        gl: Rc<dyn GlContext>,
        effect: &mut RenderEffect,
        technique_index: usize,
        pass_index: usize,
        mut stages: [Option<ShaderStageObject>; NUM_SHADER_STAGES],
    ) -> ShaderObject {
        let mut valid = false;
        for slot in stages.iter_mut() {
            if let Some(stage_obj) = slot {
                stage_obj.create_hw_shader(&gl, effect, technique_index, pass_index);
                valid = true;
            }
        }
        valid = valid && stages.iter().flatten().all(|s| s.is_valid());

        let template = Rc::new(ProgramTemplate {
            stages: stages.map(|s| s.map(Rc::new)),
            binary: RefCell::new(None),
        });

        let mut obj = ShaderObject {
            program: GlProgram::new(gl.clone()),
            gl,
            template,
            valid,
            param_binds: Vec::new(),
            tex_sampler_binds: Vec::new(),
            bind_targets: Vec::new(),
            bind_textures: Vec::new(),
            bind_samplers: Vec::new(),
            cbuffer_slots: Vec::new(),
            attrib_locs: FxHashMap::default(),
        };

        for stage in ShaderStage::ALL {
            if let Some(stage_obj) = obj.template.stages[stage.index()].clone() {
                obj.append_tex_sampler_binds(stage, effect, &stage_obj.tex_sampler_pairs);
            }
        }

        obj.link(effect);
        obj
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn program_handle(&self) -> u32 {
        self.program.handle()
    }

    pub fn stage(&self, stage: ShaderStage) -> Option<&ShaderStageObject> {
        self.template.stages[stage.index()].as_deref()
    }

    /// Attribute location for a vertex usage; `None` when the linked
    /// program does not consume it (never an error)
    pub fn attrib_location(&self, usage: VertexElementUsage, usage_index: u8) -> Option<i32> {
        self.attrib_locs.get(&(usage, usage_index)).copied()
    }

    fn append_tex_sampler_binds(
        &mut self,
        stage: ShaderStage,
        effect: &RenderEffect,
        pairs: &[(String, String)],
    ) {
        let mask = StageMask::from_stage(stage);
        for (tex, sampler) in pairs {
            let combined_name = format!("{}_{}", tex, sampler);
            if let Some(existing) = self
                .tex_sampler_binds
                .iter_mut()
                .find(|b| b.combined_name == combined_name)
            {
                existing.stage_mask |= mask;
            } else {
                self.tex_sampler_binds.push(TexSamplerBind {
                    tex_param_index: effect.parameter_by_name(tex),
                    sampler_param_index: effect.parameter_by_name(sampler),
                    tex_name: tex.clone(),
                    sampler_name: sampler.clone(),
                    combined_name,
                    stage_mask: mask,
                });
            }
        }
    }

    // ===== LINK AND REFLECT =====

    fn link(&mut self, effect: &mut RenderEffect) {
        if !self.valid {
            return;
        }

        self.gl.program_binary_retrievable_hint(self.program.handle());
        self.link_glsl();
        self.attach_ubos(effect);

        if self.valid {
            if let Some(binary) = self.gl.get_program_binary(self.program.handle()) {
                *self.template.binary.borrow_mut() = Some(binary);
            }
        }

        for stage in ShaderStage::ALL {
            let Some(stage_obj) = self.template.stages[stage.index()].clone() else {
                continue;
            };
            for pi in 0..stage_obj.param_names.len() {
                let Some(location) =
                    self.gl.uniform_location(self.program.handle(), &stage_obj.res_names[pi])
                else {
                    continue;
                };
                let pname = &stage_obj.param_names[pi];
                if let Some(param_index) = effect.parameter_by_name(pname) {
                    debug_assert_eq!(
                        effect.parameter(param_index).map(|p| p.kind()),
                        Some(ParameterKind::Buffer)
                    );
                    self.push_resource_bind(pname.clone(), location, param_index);
                } else if let Some(pair_index) = self
                    .tex_sampler_binds
                    .iter()
                    .position(|b| &b.combined_name == pname)
                {
                    self.push_tex_sampler_bind(pname.clone(), location, pair_index);
                }
            }
        }

        if let Some(vs) = self.template.stages[ShaderStage::Vertex.index()].clone() {
            if let Some((usages, usage_indices, attrib_names)) = vs.vertex_attribs() {
                for i in 0..attrib_names.len() {
                    if let Some(location) =
                        self.gl.attrib_location(self.program.handle(), &attrib_names[i])
                    {
                        self.attrib_locs.insert((usages[i], usage_indices[i]), location);
                    }
                }
            }
        }
    }

    fn link_glsl(&mut self) {
        for stage_obj in self.template.stages.iter().flatten() {
            let handle = stage_obj.gl_shader_handle();
            if handle != 0 {
                self.gl.attach_shader(self.program.handle(), handle);
            }
        }

        // Domain-stage varyings win over vertex-stage ones: with
        // tessellation active, capture happens after the domain stage
        let tfb = [ShaderStage::Domain, ShaderStage::Vertex]
            .iter()
            .filter_map(|s| self.template.stages[s.index()].as_deref())
            .filter_map(|s| s.tfb_varyings())
            .find(|(varyings, _)| !varyings.is_empty());
        if let Some((varyings, separate)) = tfb {
            self.gl
                .transform_feedback_varyings(self.program.handle(), varyings, separate);
        }

        let linked = self.gl.link_program(self.program.handle());
        if !linked {
            let names: Vec<&str> = self
                .template
                .stages
                .iter()
                .flatten()
                .filter(|s| !s.func_name.is_empty())
                .map(|s| s.func_name.as_str())
                .collect();
            engine_error!(LOG_SOURCE, "Error when linking ESSLs {}:", names.join("/"));
            let info = self.gl.program_info_log(self.program.handle());
            if !info.is_empty() {
                engine_error!(LOG_SOURCE, "{}", info);
            }
        }
        self.valid = self.valid && linked;
    }

    /// Walk the program's active uniform blocks, wire each one to the
    /// effect constant buffer of the same name, and write member
    /// placements back onto the effect parameters.
    ///
    /// A block with no matching constant buffer means the translator
    /// and the effect disagree about the shader; that is a build bug,
    /// not a runtime condition.
    fn attach_ubos(&mut self, effect: &mut RenderEffect) {
        let blocks = self.gl.active_uniform_blocks(self.program.handle());
        self.cbuffer_slots.clear();

        for (block_index, block) in blocks.iter().enumerate() {
            let cb_index = effect.cbuffer_by_name(&block.name).unwrap_or_else(|| {
                panic!("Uniform block '{}' has no matching effect constant buffer", block.name)
            });

            self.cbuffer_slots.push(CbufferSlot {
                cbuffer_index: cb_index,
                buffer: GlBuffer::new(self.gl.clone()),
                uploaded: false,
            });
            self.gl
                .uniform_block_binding(self.program.handle(), block_index as u32, block_index as u32);
            if let Some(cb) = effect.cbuffer_mut(cb_index) {
                cb.resize(block.data_size);
            }

            // The driver reports only leaf uniforms; a struct parameter
            // is located at the minimum offset over its members
            let mut struct_offsets: BTreeMap<String, i32> = BTreeMap::new();
            for uniform in &block.uniforms {
                let mut name = uniform.name.as_str();
                if let Some(p) = name.find('[') {
                    name = &name[..p];
                }
                if let Some(p) = name.find('.') {
                    let struct_name = name[..p].to_string();
                    struct_offsets
                        .entry(struct_name)
                        .and_modify(|o| *o = (*o).min(uniform.offset))
                        .or_insert(uniform.offset);
                    continue;
                }

                let param_index = effect.parameter_by_name(name).unwrap_or_else(|| {
                    panic!("Uniform '{}' has no matching effect parameter", name)
                });
                let param = effect.parameter_mut(param_index).unwrap();
                let stride = if param.array_size().is_some() {
                    uniform.array_stride
                } else if param.kind() != ParameterKind::Float4x4 {
                    4
                } else {
                    uniform.matrix_stride
                };
                param.bind_to_cbuffer(CbufferBind {
                    cbuffer_index: cb_index,
                    offset: uniform.offset as usize,
                    stride: stride.max(0) as usize,
                    row_major: uniform.row_major,
                });
            }

            for (struct_name, offset) in struct_offsets {
                let param_index = effect.parameter_by_name(&struct_name).unwrap_or_else(|| {
                    panic!("Uniform '{}' has no matching effect parameter", struct_name)
                });
                let param = effect.parameter_mut(param_index).unwrap();
                debug_assert_eq!(param.kind(), ParameterKind::Struct);
                param.bind_to_cbuffer(CbufferBind {
                    cbuffer_index: cb_index,
                    offset: offset.max(0) as usize,
                    stride: 1,
                    row_major: false,
                });
            }
        }
    }

    fn push_resource_bind(&mut self, name: String, location: i32, param_index: usize) {
        let slot = self.grow_bind_arrays();
        self.param_binds.push(ParameterBind {
            name,
            location,
            slot,
            kind: BindKind::Resource { param_index },
        });
    }

    fn push_tex_sampler_bind(&mut self, name: String, location: i32, pair_index: usize) {
        let slot = self.grow_bind_arrays();
        self.param_binds.push(ParameterBind {
            name,
            location,
            slot,
            kind: BindKind::TexSampler { pair_index },
        });
    }

    fn grow_bind_arrays(&mut self) -> usize {
        let slot = self.bind_targets.len();
        self.bind_targets.push(GL_TEXTURE_2D);
        self.bind_textures.push(0);
        self.bind_samplers.push(0);
        slot
    }

    // ===== CLONE =====

    /// Second program instance over the same compiled stages, with its
    /// own bindings resolved by name against `effect`.
    ///
    /// Restores the cached program binary when the driver provided one;
    /// falls back to a full relink otherwise.
    pub fn clone_for_effect(&self, effect: &mut RenderEffect) -> ShaderObject {
        let mut ret = ShaderObject {
            gl: self.gl.clone(),
            program: GlProgram::new(self.gl.clone()),
            template: self.template.clone(),
            valid: self.valid,
            param_binds: Vec::new(),
            tex_sampler_binds: self
                .tex_sampler_binds
                .iter()
                .map(|b| TexSamplerBind {
                    combined_name: b.combined_name.clone(),
                    tex_name: b.tex_name.clone(),
                    sampler_name: b.sampler_name.clone(),
                    tex_param_index: effect.parameter_by_name(&b.tex_name),
                    sampler_param_index: effect.parameter_by_name(&b.sampler_name),
                    stage_mask: b.stage_mask,
                })
                .collect(),
            bind_targets: Vec::new(),
            bind_textures: Vec::new(),
            bind_samplers: Vec::new(),
            cbuffer_slots: Vec::new(),
            attrib_locs: FxHashMap::default(),
        };

        if ret.valid {
            let restored = {
                let binary = self.template.binary.borrow();
                if let Some(binary) = binary.as_ref() {
                    self.gl.program_binary_retrievable_hint(ret.program.handle());
                    let linked = self.gl.program_binary(ret.program.handle(), binary);
                    if cfg!(debug_assertions) && !linked {
                        let info = self.gl.program_info_log(ret.program.handle());
                        engine_error!(LOG_SOURCE, "{}", info);
                    }
                    true
                } else {
                    false
                }
            };
            if !restored {
                ret.link_glsl();
            }

            ret.attach_ubos(effect);
            ret.attrib_locs = self.attrib_locs.clone();

            for pb in &self.param_binds {
                match &pb.kind {
                    BindKind::Resource { .. } => {
                        let param_index = effect.parameter_by_name(&pb.name).unwrap_or_else(|| {
                            panic!("Parameter '{}' missing from the cloned effect", pb.name)
                        });
                        ret.push_resource_bind(pb.name.clone(), pb.location, param_index);
                    }
                    BindKind::TexSampler { pair_index } => {
                        ret.push_tex_sampler_bind(pb.name.clone(), pb.location, *pair_index);
                    }
                }
            }
        }

        ret
    }

    // ===== RUNTIME BIND =====

    /// Requires a successfully linked program; binding an invalid one
    /// is a caller error.
    pub fn bind(&mut self, effect: &mut RenderEffect) {
        debug_assert!(self.valid);

        if self.in_discard_mode() {
            self.gl.set_rasterizer_discard(true);
        }

        self.gl.use_program(self.program.handle());

        for pb in &self.param_binds {
            match &pb.kind {
                BindKind::Resource { param_index } => {
                    let view = match effect.parameter(*param_index).map(|p| p.value()) {
                        Some(ParamValue::Resource(view)) => *view,
                        _ => None,
                    };
                    match view {
                        Some(view) => {
                            self.bind_targets[pb.slot] = view.native_target;
                            self.bind_textures[pb.slot] = view.native_handle;
                        }
                        None => {
                            self.bind_targets[pb.slot] = GL_TEXTURE_2D;
                            self.bind_textures[pb.slot] = 0;
                        }
                    }
                    self.bind_samplers[pb.slot] = 0;
                    self.gl.set_uniform_sampler(pb.location, pb.slot as u32);
                }
                BindKind::TexSampler { pair_index } => {
                    let pair = &self.tex_sampler_binds[*pair_index];
                    let view = pair
                        .tex_param_index
                        .and_then(|i| effect.parameter(i))
                        .and_then(|p| match p.value() {
                            ParamValue::Resource(view) => *view,
                            _ => None,
                        });
                    match view {
                        Some(view) => {
                            let sampler = pair
                                .sampler_param_index
                                .and_then(|i| effect.parameter(i))
                                .and_then(|p| match p.value() {
                                    ParamValue::Sampler(state) => *state,
                                    _ => None,
                                });
                            self.bind_targets[pb.slot] = view.native_target;
                            self.bind_textures[pb.slot] = view.native_handle;
                            self.bind_samplers[pb.slot] =
                                sampler.map(|s| s.native_sampler).unwrap_or(0);
                        }
                        None => {
                            self.bind_targets[pb.slot] = GL_TEXTURE_2D;
                            self.bind_textures[pb.slot] = 0;
                            self.bind_samplers[pb.slot] = 0;
                        }
                    }
                    self.gl.set_uniform_sampler(pb.location, pb.slot as u32);
                }
            }
        }

        if !self.cbuffer_slots.is_empty() {
            effect.update_cbuffers();
            let mut handles = Vec::with_capacity(self.cbuffer_slots.len());
            for slot in self.cbuffer_slots.iter_mut() {
                if let Some(cb) = effect.cbuffer_mut(slot.cbuffer_index) {
                    if cb.is_dirty() || !slot.uploaded {
                        self.gl.buffer_data(slot.buffer.handle(), cb.data());
                        cb.mark_clean();
                        slot.uploaded = true;
                    }
                }
                handles.push(slot.buffer.handle());
            }
            self.gl.bind_buffers_base(GL_UNIFORM_BUFFER, 0, &handles);
        }

        if !self.bind_textures.is_empty() {
            self.gl.bind_textures(0, &self.bind_targets, &self.bind_textures);
        }
        if !self.bind_samplers.is_empty() {
            self.gl.bind_samplers(0, &self.bind_samplers);
        }
    }

    /// Always restores normal rasterization, whatever mode `bind`
    /// entered
    pub fn unbind(&self) {
        self.gl.set_rasterizer_discard(false);
    }

    fn in_discard_mode(&self) -> bool {
        match self.stage(ShaderStage::Pixel) {
            None => true,
            Some(ps) => ps.glsl_source().is_empty(),
        }
    }
}

#[cfg(test)]
#[path = "gles_shader_object_tests.rs"]
mod tests;
