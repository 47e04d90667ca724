/// Mock driver context and translator for unit tests (no GPU required)
///
/// The mock context records every driver call as a command string so
/// tests can assert call ordering, and serves canned reflection data.
/// Failure switches let tests drive the compile/link error paths. The
/// mock translator serves canned modules keyed by bytecode contents.

use std::cell::RefCell;
use std::rc::Rc;
use rustc_hash::FxHashMap;
use nova_3d_engine::nova3d::{Error, Result};
use nova_3d_engine::nova3d::shader::{
    BytecodeTranslator, ShaderStage, TranslateOptions, TranslatedModule,
};
use crate::gles::{ActiveUniform, GlContext, ProgramBinary, UniformBlockInfo};

#[derive(Default)]
pub struct MockState {
    pub commands: Vec<String>,
    next_handle: u32,
    pub live_shaders: Vec<u32>,
    pub live_programs: Vec<u32>,
    pub live_buffers: Vec<u32>,
    pub buffer_contents: FxHashMap<u32, Vec<u8>>,
}

pub struct MockGl {
    state: RefCell<MockState>,
    /// Compile status handed back for every shader
    pub fail_compile: RefCell<bool>,
    /// Link status handed back for every program
    pub fail_link: RefCell<bool>,
    /// Whether `get_program_binary` yields a binary
    pub support_binary: RefCell<bool>,
    pub info_log: RefCell<String>,
    pub quirk_numbered: RefCell<bool>,
    /// Name -> location maps served by reflection queries
    pub uniform_locations: RefCell<FxHashMap<String, i32>>,
    pub attrib_locations: RefCell<FxHashMap<String, i32>>,
    pub uniform_blocks: RefCell<Vec<UniformBlockInfo>>,
}

impl MockGl {
    pub fn new() -> Rc<MockGl> {
        Rc::new(MockGl {
            state: RefCell::new(MockState::default()),
            fail_compile: RefCell::new(false),
            fail_link: RefCell::new(false),
            support_binary: RefCell::new(false),
            info_log: RefCell::new(String::new()),
            quirk_numbered: RefCell::new(false),
            uniform_locations: RefCell::new(FxHashMap::default()),
            attrib_locations: RefCell::new(FxHashMap::default()),
            uniform_blocks: RefCell::new(Vec::new()),
        })
    }

    pub fn commands(&self) -> Vec<String> {
        self.state.borrow().commands.clone()
    }

    pub fn clear_commands(&self) {
        self.state.borrow_mut().commands.clear();
    }

    /// Index of the first command equal to `cmd`, for ordering asserts
    pub fn command_index(&self, cmd: &str) -> Option<usize> {
        self.state.borrow().commands.iter().position(|c| c == cmd)
    }

    pub fn has_command(&self, cmd: &str) -> bool {
        self.command_index(cmd).is_some()
    }

    pub fn live_shader_count(&self) -> usize {
        self.state.borrow().live_shaders.len()
    }

    pub fn live_program_count(&self) -> usize {
        self.state.borrow().live_programs.len()
    }

    pub fn live_buffer_count(&self) -> usize {
        self.state.borrow().live_buffers.len()
    }

    pub fn buffer_contents(&self, buffer: u32) -> Option<Vec<u8>> {
        self.state.borrow().buffer_contents.get(&buffer).cloned()
    }

    pub fn add_uniform_location(&self, name: &str, location: i32) {
        self.uniform_locations.borrow_mut().insert(name.to_string(), location);
    }

    pub fn add_attrib_location(&self, name: &str, location: i32) {
        self.attrib_locations.borrow_mut().insert(name.to_string(), location);
    }

    pub fn add_uniform_block(&self, block: UniformBlockInfo) {
        self.uniform_blocks.borrow_mut().push(block);
    }

    fn log(&self, cmd: String) {
        self.state.borrow_mut().commands.push(cmd);
    }

    fn alloc(&self) -> u32 {
        let mut state = self.state.borrow_mut();
        state.next_handle += 1;
        state.next_handle
    }
}

/// Shorthand for one reflected uniform (non-array, column-major)
pub fn uniform(name: &str, offset: i32) -> ActiveUniform {
    ActiveUniform {
        name: name.to_string(),
        offset,
        array_stride: 0,
        matrix_stride: 0,
        row_major: false,
    }
}

pub fn block(name: &str, data_size: usize, uniforms: Vec<ActiveUniform>) -> UniformBlockInfo {
    UniformBlockInfo {
        name: name.to_string(),
        data_size,
        uniforms,
    }
}

impl GlContext for MockGl {
    fn create_shader(&self, stage: ShaderStage) -> u32 {
        let handle = self.alloc();
        self.state.borrow_mut().live_shaders.push(handle);
        self.log(format!("create_shader({:?})={}", stage, handle));
        handle
    }

    fn shader_source(&self, shader: u32, source: &str) {
        self.log(format!("shader_source({}, {} bytes)", shader, source.len()));
    }

    fn compile_shader(&self, shader: u32) -> bool {
        self.log(format!("compile_shader({})", shader));
        !*self.fail_compile.borrow()
    }

    fn shader_info_log(&self, _shader: u32) -> String {
        self.info_log.borrow().clone()
    }

    fn delete_shader(&self, shader: u32) {
        self.state.borrow_mut().live_shaders.retain(|&h| h != shader);
        self.log(format!("delete_shader({})", shader));
    }

    fn create_program(&self) -> u32 {
        let handle = self.alloc();
        self.state.borrow_mut().live_programs.push(handle);
        self.log(format!("create_program()={}", handle));
        handle
    }

    fn attach_shader(&self, program: u32, shader: u32) {
        self.log(format!("attach_shader({}, {})", program, shader));
    }

    fn transform_feedback_varyings(&self, program: u32, varyings: &[String], separate: bool) {
        self.log(format!(
            "transform_feedback_varyings({}, [{}], separate={})",
            program,
            varyings.join(","),
            separate
        ));
    }

    fn link_program(&self, program: u32) -> bool {
        self.log(format!("link_program({})", program));
        !*self.fail_link.borrow()
    }

    fn program_info_log(&self, _program: u32) -> String {
        self.info_log.borrow().clone()
    }

    fn use_program(&self, program: u32) {
        self.log(format!("use_program({})", program));
    }

    fn delete_program(&self, program: u32) {
        self.state.borrow_mut().live_programs.retain(|&h| h != program);
        self.log(format!("delete_program({})", program));
    }

    fn program_binary_retrievable_hint(&self, program: u32) {
        self.log(format!("program_binary_retrievable_hint({})", program));
    }

    fn get_program_binary(&self, program: u32) -> Option<ProgramBinary> {
        self.log(format!("get_program_binary({})", program));
        if *self.support_binary.borrow() {
            Some(ProgramBinary {
                format: 0xBEEF,
                data: vec![1, 2, 3, 4],
            })
        } else {
            None
        }
    }

    fn program_binary(&self, program: u32, binary: &ProgramBinary) -> bool {
        self.log(format!(
            "program_binary({}, format={:#x}, {} bytes)",
            program,
            binary.format,
            binary.data.len()
        ));
        !*self.fail_link.borrow()
    }

    fn uniform_location(&self, _program: u32, name: &str) -> Option<i32> {
        self.uniform_locations.borrow().get(name).copied()
    }

    fn attrib_location(&self, _program: u32, name: &str) -> Option<i32> {
        self.attrib_locations.borrow().get(name).copied()
    }

    fn active_uniform_blocks(&self, program: u32) -> Vec<UniformBlockInfo> {
        self.log(format!("active_uniform_blocks({})", program));
        self.uniform_blocks.borrow().clone()
    }

    fn uniform_block_binding(&self, program: u32, block_index: u32, binding: u32) {
        self.log(format!("uniform_block_binding({}, {}, {})", program, block_index, binding));
    }

    fn set_uniform_sampler(&self, location: i32, unit: u32) {
        self.log(format!("set_uniform_sampler({}, {})", location, unit));
    }

    fn set_rasterizer_discard(&self, enabled: bool) {
        self.log(format!("set_rasterizer_discard({})", enabled));
    }

    fn create_buffer(&self) -> u32 {
        let handle = self.alloc();
        self.state.borrow_mut().live_buffers.push(handle);
        self.log(format!("create_buffer()={}", handle));
        handle
    }

    fn buffer_data(&self, buffer: u32, data: &[u8]) {
        self.state.borrow_mut().buffer_contents.insert(buffer, data.to_vec());
        self.log(format!("buffer_data({}, {} bytes)", buffer, data.len()));
    }

    fn delete_buffer(&self, buffer: u32) {
        self.state.borrow_mut().live_buffers.retain(|&h| h != buffer);
        self.log(format!("delete_buffer({})", buffer));
    }

    fn bind_buffers_base(&self, target: u32, first: u32, buffers: &[u32]) {
        self.log(format!(
            "bind_buffers_base({:#x}, {}, [{}])",
            target,
            first,
            buffers.iter().map(|b| b.to_string()).collect::<Vec<_>>().join(",")
        ));
    }

    fn bind_textures(&self, first: u32, targets: &[u32], textures: &[u32]) {
        self.log(format!(
            "bind_textures({}, [{}], [{}])",
            first,
            targets.iter().map(|t| format!("{:#x}", t)).collect::<Vec<_>>().join(","),
            textures.iter().map(|t| t.to_string()).collect::<Vec<_>>().join(",")
        ));
    }

    fn bind_samplers(&self, first: u32, samplers: &[u32]) {
        self.log(format!(
            "bind_samplers({}, [{}])",
            first,
            samplers.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(",")
        ));
    }

    fn quirk_numbered_log(&self) -> bool {
        *self.quirk_numbered.borrow()
    }
}

// ===== MOCK TRANSLATOR =====

/// Cross-compiler stand-in serving canned modules keyed by the exact
/// bytecode bytes
#[derive(Default)]
pub struct MockTranslator {
    modules: RefCell<FxHashMap<Vec<u8>, TranslatedModule>>,
    /// When set, every translation fails with this message
    pub fail_with: RefCell<Option<String>>,
    /// Options of the most recent translation, for policy asserts
    pub last_options: RefCell<Option<TranslateOptions>>,
}

impl MockTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_module(&self, bytecode: &[u8], module: TranslatedModule) {
        self.modules.borrow_mut().insert(bytecode.to_vec(), module);
    }

    pub fn last_options(&self) -> Option<TranslateOptions> {
        self.last_options.borrow().clone()
    }
}

impl BytecodeTranslator for MockTranslator {
    fn translate(&self, bytecode: &[u8], options: &TranslateOptions) -> Result<TranslatedModule> {
        *self.last_options.borrow_mut() = Some(options.clone());
        if let Some(msg) = self.fail_with.borrow().as_ref() {
            return Err(Error::TranslationFailed(msg.clone()));
        }
        Ok(self
            .modules
            .borrow()
            .get(bytecode)
            .cloned()
            .unwrap_or_else(|| TranslatedModule {
                source: "void main() {}".to_string(),
                ..Default::default()
            }))
    }
}
