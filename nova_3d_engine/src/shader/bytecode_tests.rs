//! Unit tests for the translator boundary types

use crate::shader::bytecode::*;
use crate::shader::stage::{TessPartitioning, TessOutputPrimitive};
use crate::error::{Error, Result};

#[test]
fn test_default_rules_contents() {
    let rules = GlslVersion::Es300.default_rules();
    assert!(rules.contains(TranslateRules::UNIFORM_BLOCK_BINDING));
    assert!(rules.contains(TranslateRules::MATRIX_TYPE));
    assert!(rules.contains(TranslateRules::UINT_TYPE));
    assert!(!rules.contains(TranslateRules::DRAW_BUFFERS));
    assert!(!rules.contains(TranslateRules::EXT_TESSELLATION_SHADER));
}

#[test]
fn test_translate_options_default() {
    let options = TranslateOptions::default();
    assert_eq!(options.glsl_version, GlslVersion::Es300);
    assert!(options.macros.is_empty());
    assert!(options.has_pixel_stage);
    assert_eq!(options.tess_partitioning, TessPartitioning::Undefined);
    assert_eq!(options.tess_output_primitive, TessOutputPrimitive::Undefined);
}

#[test]
fn test_translated_module_default_is_empty() {
    let module = TranslatedModule::default();
    assert!(module.source.is_empty());
    assert!(module.cbuffers.is_empty());
    assert!(module.resources.is_empty());
    assert!(module.input_params.is_empty());
}

#[test]
fn test_translator_trait_is_object_safe() {
    struct FailingTranslator;
    impl BytecodeTranslator for FailingTranslator {
        fn translate(&self, _bytecode: &[u8], _options: &TranslateOptions) -> Result<TranslatedModule> {
            Err(Error::TranslationFailed("always fails".to_string()))
        }
    }

    let translator: Box<dyn BytecodeTranslator> = Box::new(FailingTranslator);
    let result = translator.translate(&[0u8; 4], &TranslateOptions::default());
    assert!(matches!(result, Err(Error::TranslationFailed(_))));
}
