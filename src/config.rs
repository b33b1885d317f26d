use std::env;
use std::path::PathBuf;

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub gemini_api_key: String,
    pub gemini_base_url: String,
    pub gemini_image_model: String,
    pub gemini_analysis_model: String,
    pub gemini_image_size: String,
    pub gemini_timeout_seconds: u64,
    pub default_aspect_ratio: String,
    pub max_reference_images: usize,
    pub max_references_per_person: usize,
    pub credential_file_path: PathBuf,
}

pub static CONFIG: Lazy<Config> =
    Lazy::new(|| Config::load().expect("Failed to load configuration"));

static RATIO_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,2}:\d{1,2}$").expect("valid ratio pattern"));

pub const FALLBACK_ASPECT_RATIO: &str = "3:4";

fn env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(default)
}

pub fn is_aspect_ratio(value: &str) -> bool {
    RATIO_PATTERN.is_match(value.trim())
}

fn normalize_default_aspect_ratio(value: String) -> String {
    let trimmed = value.trim();
    if is_aspect_ratio(trimmed) {
        return trimmed.to_string();
    }
    warn!(
        "Unknown DEFAULT_ASPECT_RATIO value '{}'; defaulting to {}.",
        value, FALLBACK_ASPECT_RATIO
    );
    FALLBACK_ASPECT_RATIO.to_string()
}

fn normalize_base_url(value: String) -> String {
    value.trim().trim_end_matches('/').to_string()
}

impl Config {
    pub fn load() -> Result<Self> {
        let max_reference_images = env_usize("MAX_REFERENCE_IMAGES", 24);
        if max_reference_images == 0 {
            return Err(anyhow::anyhow!("MAX_REFERENCE_IMAGES must be at least 1"));
        }

        Ok(Config {
            log_level: env_string("LOG_LEVEL", "info").to_lowercase(),
            gemini_api_key: env_string("GEMINI_API_KEY", "").trim().to_string(),
            gemini_base_url: normalize_base_url(env_string(
                "GEMINI_BASE_URL",
                "https://generativelanguage.googleapis.com/v1beta",
            )),
            gemini_image_model: env_string("GEMINI_IMAGE_MODEL", "gemini-3-pro-image-preview"),
            gemini_analysis_model: env_string("GEMINI_ANALYSIS_MODEL", "gemini-2.5-flash"),
            gemini_image_size: env_string("GEMINI_IMAGE_SIZE", "1K"),
            gemini_timeout_seconds: env_u64("GEMINI_TIMEOUT_SECONDS", 120),
            default_aspect_ratio: normalize_default_aspect_ratio(env_string(
                "DEFAULT_ASPECT_RATIO",
                FALLBACK_ASPECT_RATIO,
            )),
            max_reference_images,
            max_references_per_person: env_usize("MAX_REFERENCES_PER_PERSON", 3).max(1),
            credential_file_path: PathBuf::from(env_string(
                "CREDENTIAL_FILE_PATH",
                ".studio_credential",
            )),
        })
    }
}

pub const GENERATE_FAILURE_MESSAGE: &str =
    "Failed to generate image. Please check your prompt or reference images and try again.";
pub const EDIT_FAILURE_MESSAGE: &str = "Failed to edit image.";
pub const ANALYZE_FAILURE_MESSAGE: &str = "Failed to analyze image.";

pub const CAST_LIST_LABEL: &str = "CAST LIST (REFERENCE IMAGES):";

pub const EDIT_INSTRUCTION_PREFIX: &str = "Edit this image based on the following instructions:";

pub const EDIT_IDENTITY_INSTRUCTION: &str =
    "Maintain the identity of the following reference subjects in the edited image:";

pub const ANALYZE_INSTRUCTION: &str = "Analyze this image and provide a detailed visual description that can be used as a prompt to recreate it or edit it. Focus on style, lighting, setting, clothing, and subject pose.";

pub const EMPTY_ANALYSIS_TEXT: &str = "No description generated.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_colon_separated_ratios() {
        assert!(is_aspect_ratio("16:9"));
        assert!(is_aspect_ratio(" 3:4 "));
        assert!(!is_aspect_ratio("Let AI Decide"));
        assert!(!is_aspect_ratio("16x9"));
    }

    #[test]
    fn invalid_default_ratio_falls_back() {
        assert_eq!(normalize_default_aspect_ratio("wide".to_string()), "3:4");
        assert_eq!(normalize_default_aspect_ratio("1:1".to_string()), "1:1");
    }

    #[test]
    fn base_url_drops_trailing_slash() {
        assert_eq!(
            normalize_base_url("https://example.test/v1beta/ ".to_string()),
            "https://example.test/v1beta"
        );
    }
}
