use crate::options::NormalizedOptions;

pub const PHOTOREALISTIC: &str = "Photorealistic";

/// Applies mode switches to the cleaned options. Strict likeness replaces the art
/// style with photorealism no matter what was selected.
pub fn apply_overrides(options: NormalizedOptions<'_>) -> NormalizedOptions<'_> {
    if options.strict_likeness {
        NormalizedOptions {
            art_style: Some(PHOTOREALISTIC),
            ..options
        }
    } else {
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{Choice, GenerationOptions};

    #[test]
    fn strict_likeness_forces_photorealism() {
        let options = GenerationOptions {
            art_style: Choice::from("Storybook / Illustrated"),
            strict_likeness: true,
            ..GenerationOptions::default()
        };
        let effective = apply_overrides(options.normalized());
        assert_eq!(effective.art_style, Some(PHOTOREALISTIC));
        assert_eq!(
            options.art_style,
            Choice::Value("Storybook / Illustrated".to_string())
        );
    }

    #[test]
    fn strict_likeness_fills_missing_art_style() {
        let options = GenerationOptions {
            strict_likeness: true,
            ..GenerationOptions::default()
        };
        assert_eq!(
            apply_overrides(options.normalized()).art_style,
            Some(PHOTOREALISTIC)
        );
    }

    #[test]
    fn without_strict_likeness_selection_is_kept() {
        let options = GenerationOptions {
            art_style: Choice::from("Editorial"),
            ..GenerationOptions::default()
        };
        let normalized = options.normalized();
        assert_eq!(apply_overrides(normalized), normalized);
    }
}
