//! Unit tests for request validation

use std::sync::Arc;

use text2img_gateway::model::{ModelRegistry, Text2ImgRequest};
use text2img_gateway::validation::{RequestValidator, ValidationErrors};
use text2img_gateway::AppError;
use tokio_test::{assert_err, assert_ok};

fn validator() -> RequestValidator {
    RequestValidator::new(Arc::new(ModelRegistry::with_builtin_models().unwrap()))
}

fn request(model_id: &str) -> Text2ImgRequest {
    Text2ImgRequest {
        model_id: model_id.to_string(),
        prompt: "a cat".to_string(),
        width: Some(512),
        height: Some(512),
        samples: Some(1),
        num_inference_steps: Some(10),
        guidance_scale: Some(7.5),
        ..Default::default()
    }
}

fn violations(err: AppError) -> ValidationErrors {
    match err {
        AppError::Validation(errors) => errors,
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[test]
fn test_valid_request_passes() {
    let parsed = assert_ok!(validator().validate(&request("flux")));
    assert_eq!(parsed.width, 512);
    assert_eq!(parsed.guidance_scale, Some(7.5));
}

#[test]
fn test_oversized_area_always_rejected() {
    let validator = validator();
    for (width, height) in [(1025, 1024), (1024, 1025), (2048, 600), (1100, 1100)] {
        for model in ["flux", "midjourney"] {
            let mut req = request(model);
            req.width = Some(width);
            req.height = Some(height);
            let err = assert_err!(validator.validate(&req));
            assert_eq!(err.code().as_str(), "INVALID_REQUEST", "{}x{}", width, height);
        }
    }
}

#[test]
fn test_structural_violations_reported_together() {
    let mut req = request("flux");
    req.prompt = String::new();
    req.width = Some(32);
    req.samples = Some(9);
    req.guidance_scale = Some(25.0);
    req.safety_checker = "maybe".to_string();
    req.upscale = "4".to_string();

    let errors = violations(validator().validate(&req).unwrap_err());
    for field in [
        "prompt",
        "width",
        "samples",
        "guidance_scale",
        "safety_checker",
        "upscale",
    ] {
        assert!(errors.has_field(field), "missing violation for {}", field);
    }
    assert_eq!(errors.len(), 6);
}

#[test]
fn test_structural_failure_skips_capability_checks() {
    // 1024 wide is structurally fine but exceeds flux; the empty prompt wins.
    let mut req = request("flux");
    req.prompt = "  ".to_string();
    req.width = Some(1024);

    let errors = violations(validator().validate(&req).unwrap_err());
    assert!(errors.has_field("prompt"));
    assert!(!errors.has_field("width"));
}

#[test]
fn test_capability_violations_reported_together() {
    let mut req = request("flux");
    req.width = Some(1024);
    req.height = Some(1024);
    req.scheduler = Some("DDIMScheduler".to_string());
    req.upscale = "2".to_string();

    let errors = violations(validator().validate(&req).unwrap_err());
    assert!(errors.has_field("width"));
    assert!(errors.has_field("height"));
    assert!(errors.has_field("scheduler"));
    assert!(errors.has_field("upscale"));
    assert_eq!(errors.len(), 4);
}

#[test]
fn test_same_request_fits_midjourney() {
    let mut req = request("midjourney");
    req.width = Some(1024);
    req.height = Some(1024);
    req.scheduler = Some("DDIMScheduler".to_string());
    req.upscale = "2".to_string();
    req.tomesd = "yes".to_string();
    req.use_karras_sigmas = "yes".to_string();

    assert_ok!(validator().validate(&req));
}

#[test]
fn test_unknown_scheduler_is_structural() {
    let mut req = request("midjourney");
    req.scheduler = Some("MagicScheduler".to_string());

    let errors = violations(validator().validate(&req).unwrap_err());
    assert!(errors.has_field("scheduler"));
}

#[test]
fn test_unknown_model() {
    let err = validator().validate(&request("dall-e")).unwrap_err();
    assert!(matches!(err, AppError::UnknownModel(ref id) if id == "dall-e"));
}

#[test]
fn test_missing_guidance_scale_is_allowed() {
    let mut req = request("flux");
    req.guidance_scale = None;
    let parsed = assert_ok!(validator().validate(&req));
    assert_eq!(parsed.guidance_scale, None);
}

#[test]
fn test_validation_message_lists_fields() {
    let mut req = request("flux");
    req.model_id = String::new();
    req.num_inference_steps = Some(50);

    let err = validator().validate(&req).unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("Validation failed:"));
    assert!(message.contains("model_id: is required"));
    assert!(message.contains("num_inference_steps: must be between 1 and 20"));
}
