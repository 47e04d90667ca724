//! Unit tests for the driver handle wrappers

use nova_3d_engine::nova3d::shader::ShaderStage;
use crate::gles::{GlBuffer, GlContext, GlProgram, GlShader};
use crate::mock_gl::MockGl;

// ============================================================================
// SCOPED HANDLE TESTS
// ============================================================================

#[test]
fn test_shader_handle_released_on_drop() {
    let gl = MockGl::new();
    {
        let shader = GlShader::new(gl.clone(), ShaderStage::Vertex);
        assert_ne!(shader.handle(), 0);
        assert_eq!(gl.live_shader_count(), 1);
    }
    assert_eq!(gl.live_shader_count(), 0);
    assert!(gl.has_command("create_shader(Vertex)=1"));
    assert!(gl.has_command("delete_shader(1)"));
}

#[test]
fn test_program_handle_released_on_drop() {
    let gl = MockGl::new();
    {
        let program = GlProgram::new(gl.clone());
        assert_ne!(program.handle(), 0);
        assert_eq!(gl.live_program_count(), 1);
    }
    assert_eq!(gl.live_program_count(), 0);
}

#[test]
fn test_buffer_handle_released_on_drop() {
    let gl = MockGl::new();
    {
        let buffer = GlBuffer::new(gl.clone());
        assert_ne!(buffer.handle(), 0);
        assert_eq!(gl.live_buffer_count(), 1);
    }
    assert_eq!(gl.live_buffer_count(), 0);
}

#[test]
fn test_handles_are_distinct() {
    let gl = MockGl::new();
    let a = GlShader::new(gl.clone(), ShaderStage::Vertex);
    let b = GlShader::new(gl.clone(), ShaderStage::Pixel);
    let c = GlProgram::new(gl.clone());
    assert_ne!(a.handle(), b.handle());
    assert_ne!(b.handle(), c.handle());
}

#[test]
fn test_mock_records_call_order() {
    let gl = MockGl::new();
    let shader = GlShader::new(gl.clone(), ShaderStage::Pixel);
    let program = GlProgram::new(gl.clone());
    gl.attach_shader(program.handle(), shader.handle());
    gl.link_program(program.handle());

    let create = gl
        .command_index(&format!("create_shader(Pixel)={}", shader.handle()))
        .unwrap();
    let attach = gl
        .command_index(&format!("attach_shader({}, {})", program.handle(), shader.handle()))
        .unwrap();
    let link = gl
        .command_index(&format!("link_program({})", program.handle()))
        .unwrap();
    assert!(create < attach);
    assert!(attach < link);
}

#[test]
fn test_quirk_default_follows_mock_switch() {
    let gl = MockGl::new();
    assert!(!gl.quirk_numbered_log());
    *gl.quirk_numbered.borrow_mut() = true;
    assert!(gl.quirk_numbered_log());
}
