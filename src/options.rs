use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::CONFIG;

pub const NOT_APPLICABLE: &str = "N/A";
pub const LET_AI_DECIDE: &str = "Let AI Decide";

/// Drops the "no opinion" placeholders a dropdown can hold.
pub fn clean(value: Option<&str>) -> Option<&str> {
    match value {
        None | Some("") | Some(NOT_APPLICABLE) | Some(LET_AI_DECIDE) => None,
        Some(value) => Some(value),
    }
}

/// A single option field. Both placeholder strings collapse into `NoPreference`
/// when parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum Choice {
    #[default]
    NoPreference,
    Value(String),
}

impl Choice {
    pub fn parse(raw: &str) -> Self {
        match clean(Some(raw)) {
            Some(value) => Choice::Value(value.to_string()),
            None => Choice::NoPreference,
        }
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            Choice::NoPreference => None,
            Choice::Value(value) => Some(value.as_str()),
        }
    }
}

impl From<Option<String>> for Choice {
    fn from(raw: Option<String>) -> Self {
        raw.as_deref().map(Choice::parse).unwrap_or_default()
    }
}

impl From<Choice> for Option<String> {
    fn from(choice: Choice) -> Self {
        match choice {
            Choice::NoPreference => None,
            Choice::Value(value) => Some(value),
        }
    }
}

impl From<&str> for Choice {
    fn from(raw: &str) -> Self {
        Choice::parse(raw)
    }
}

/// Everything the user picked for one generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationOptions {
    pub theme: String,
    pub style: String,
    pub creative_notes: String,
    pub art_style: Choice,
    pub vibe: Choice,
    pub aspect_ratio: Choice,
    pub pose: Choice,
    pub background_intensity: Choice,
    pub lighting_tone: Choice,
    pub color_palette: Choice,
    pub people_count: Choice,
    pub pet_count: Choice,
    pub strict_likeness: bool,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            theme: "All Holiday Styles".to_string(),
            style: String::new(),
            creative_notes: String::new(),
            art_style: Choice::NoPreference,
            vibe: Choice::NoPreference,
            aspect_ratio: Choice::NoPreference,
            pose: Choice::NoPreference,
            background_intensity: Choice::NoPreference,
            lighting_tone: Choice::NoPreference,
            color_palette: Choice::NoPreference,
            people_count: Choice::NoPreference,
            pet_count: Choice::NoPreference,
            strict_likeness: false,
        }
    }
}

/// Read-only view of the options with every placeholder removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedOptions<'a> {
    pub theme: &'a str,
    pub style: &'a str,
    pub creative_notes: &'a str,
    pub art_style: Option<&'a str>,
    pub mood: Option<&'a str>,
    pub pose: Option<&'a str>,
    pub background: Option<&'a str>,
    pub lighting: Option<&'a str>,
    pub color_palette: Option<&'a str>,
    pub people_count: Option<&'a str>,
    pub pet_count: Option<&'a str>,
    pub strict_likeness: bool,
}

impl GenerationOptions {
    pub fn normalized(&self) -> NormalizedOptions<'_> {
        NormalizedOptions {
            theme: &self.theme,
            style: &self.style,
            creative_notes: &self.creative_notes,
            art_style: self.art_style.value(),
            mood: self.vibe.value(),
            pose: self.pose.value(),
            background: self.background_intensity.value(),
            lighting: self.lighting_tone.value(),
            color_palette: self.color_palette.value(),
            people_count: self.people_count.value(),
            pet_count: self.pet_count.value(),
            strict_likeness: self.strict_likeness,
        }
    }

    pub fn resolved_aspect_ratio(&self) -> String {
        resolve_ratio(&self.aspect_ratio)
    }
}

pub fn resolve_ratio_with(value: &Choice, default_ratio: &str) -> String {
    value.value().unwrap_or(default_ratio).to_string()
}

/// Explicit ratios pass through; no preference becomes the configured default.
pub fn resolve_ratio(value: &Choice) -> String {
    resolve_ratio_with(value, &CONFIG.default_aspect_ratio)
}

/// Loads options from a `.yaml`/`.yml` or JSON file.
pub fn load_options_file(path: &Path) -> Result<GenerationOptions> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read options file {}", path.display()))?;
    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
        .unwrap_or(false);

    let options = if is_yaml {
        serde_yaml::from_str(&raw)
            .with_context(|| format!("Invalid YAML options in {}", path.display()))?
    } else {
        serde_json::from_str(&raw)
            .with_context(|| format!("Invalid JSON options in {}", path.display()))?
    };
    Ok(options)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn placeholders_and_empty_values_are_absent() {
        assert_eq!(clean(Some("N/A")), None);
        assert_eq!(clean(Some("Let AI Decide")), None);
        assert_eq!(clean(Some("")), None);
        assert_eq!(clean(None), None);
    }

    #[test]
    fn other_values_pass_through_unchanged() {
        assert_eq!(clean(Some("Romantic")), Some("Romantic"));
        assert_eq!(clean(Some(" n/a ")), Some(" n/a "));
        assert_eq!(clean(Some("6+")), Some("6+"));
    }

    #[test]
    fn both_placeholders_collapse_to_one_variant() {
        assert_eq!(Choice::parse("N/A"), Choice::NoPreference);
        assert_eq!(Choice::parse("Let AI Decide"), Choice::NoPreference);
        assert_eq!(Choice::parse("Warm"), Choice::Value("Warm".to_string()));
    }

    #[test]
    fn deserializes_original_option_record() {
        let raw = r#"{
            "theme": "Festival of Lights",
            "style": "Candlelit Portraits",
            "creativeNotes": "",
            "artStyle": "N/A",
            "vibe": "Romantic",
            "aspectRatio": "Let AI Decide",
            "pose": "N/A",
            "backgroundIntensity": "N/A",
            "lightingTone": "N/A",
            "colorPalette": "N/A",
            "peopleCount": "Let AI Decide",
            "petCount": "N/A",
            "personalEcho": true,
            "strictLikeness": false,
            "whoInPhoto": "N/A"
        }"#;
        let options: GenerationOptions = serde_json::from_str(raw).unwrap();
        assert_eq!(options.vibe, Choice::Value("Romantic".to_string()));
        assert_eq!(options.people_count, Choice::NoPreference);
        assert_eq!(options.aspect_ratio, Choice::NoPreference);

        let normalized = options.normalized();
        assert_eq!(normalized.mood, Some("Romantic"));
        assert_eq!(normalized.art_style, None);
        assert_eq!(normalized.people_count, None);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let options: GenerationOptions = serde_json::from_str(r#"{"vibe": null}"#).unwrap();
        assert_eq!(options, GenerationOptions::default());
    }

    #[test]
    fn normalizing_leaves_options_untouched() {
        let options = GenerationOptions {
            art_style: Choice::from("Cinematic"),
            ..GenerationOptions::default()
        };
        let before = options.clone();
        let _ = options.normalized();
        assert_eq!(options, before);
    }

    #[test]
    fn ratio_falls_back_only_without_preference() {
        assert_eq!(resolve_ratio_with(&Choice::NoPreference, "3:4"), "3:4");
        assert_eq!(resolve_ratio_with(&Choice::from("Let AI Decide"), "3:4"), "3:4");
        assert_eq!(resolve_ratio_with(&Choice::from("16:9"), "3:4"), "16:9");
    }

    #[test]
    fn loads_yaml_options_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "theme: Christmas Magic\nstyle: Holiday Gala\nstrictLikeness: true\nartStyle: Cinematic"
        )
        .unwrap();
        let options = load_options_file(file.path()).unwrap();
        assert_eq!(options.theme, "Christmas Magic");
        assert_eq!(options.style, "Holiday Gala");
        assert!(options.strict_likeness);
        assert_eq!(options.art_style.value(), Some("Cinematic"));
    }
}
