//! Unit tests for the shared error type

use crate::error::{Error, Result};

// ============================================================================
// DISPLAY FORMATTING TESTS
// ============================================================================

#[test]
fn test_backend_error_display() {
    let err = Error::BackendError("glLinkProgram failed".to_string());
    assert_eq!(err.to_string(), "Backend error: glLinkProgram failed");
}

#[test]
fn test_invalid_resource_display() {
    let err = Error::InvalidResource("truncated stage block".to_string());
    assert_eq!(err.to_string(), "Invalid resource: truncated stage block");
}

#[test]
fn test_initialization_failed_display() {
    let err = Error::InitializationFailed("no context".to_string());
    assert_eq!(err.to_string(), "Initialization failed: no context");
}

#[test]
fn test_translation_failed_display() {
    let err = Error::TranslationFailed("unknown opcode 0x42".to_string());
    assert_eq!(err.to_string(), "Translation failed: unknown opcode 0x42");
}

// ============================================================================
// TRAIT AND USAGE TESTS
// ============================================================================

#[test]
fn test_error_implements_std_error() {
    let err = Error::BackendError("x".to_string());
    let as_std: &dyn std::error::Error = &err;
    assert!(as_std.source().is_none());
}

#[test]
fn test_result_question_mark_propagation() {
    fn inner() -> Result<u32> {
        Err(Error::InvalidResource("bad".to_string()))
    }
    fn outer() -> Result<u32> {
        let v = inner()?;
        Ok(v + 1)
    }
    match outer() {
        Err(Error::InvalidResource(msg)) => assert_eq!(msg, "bad"),
        other => panic!("Expected InvalidResource, got {:?}", other),
    }
}

#[test]
fn test_error_is_cloneable() {
    let err = Error::TranslationFailed("stage".to_string());
    let cloned = err.clone();
    assert_eq!(err.to_string(), cloned.to_string());
}
