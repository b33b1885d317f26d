//! Choices offered for each generation option.

use crate::options::{LET_AI_DECIDE, NOT_APPLICABLE};

pub const ART_STYLES: &[&str] = &[
    NOT_APPLICABLE,
    LET_AI_DECIDE,
    "Cinematic",
    "Editorial",
    "Lifestyle",
    "Photorealistic",
    "Storybook / Illustrated",
];

pub const VIBES: &[&str] = &[
    NOT_APPLICABLE,
    LET_AI_DECIDE,
    "Cozy",
    "Cinematic",
    "Dramatic",
    "Dreamy",
    "Elegant",
    "Glam",
    "Joyful",
    "Romantic",
    "Sophisticated",
    "Wholesome",
];

pub const POSES: &[&str] = &[
    NOT_APPLICABLE,
    LET_AI_DECIDE,
    "Close-Up",
    "Formal",
    "Full Body",
    "Natural",
];

pub const BACKGROUND_INTENSITIES: &[&str] =
    &[NOT_APPLICABLE, LET_AI_DECIDE, "Bold", "Moderate", "Soft"];

pub const LIGHTING_TONES: &[&str] = &[
    NOT_APPLICABLE,
    LET_AI_DECIDE,
    "Cinematic Glow",
    "Cool",
    "Neutral",
    "Warm",
];

pub const COLOR_PALETTES: &[&str] = &[
    NOT_APPLICABLE,
    LET_AI_DECIDE,
    "Bold & Vibrant",
    "Classic Black & White",
    "Deep Cinematic Tones",
    "Earthy Naturals",
    "Frosted Whites",
    "Holiday Gold",
    "Soft Pastels",
];

pub const PEOPLE_COUNTS: &[&str] = &[LET_AI_DECIDE, "1", "2", "3", "4", "5", "6+"];

pub const PET_COUNTS: &[&str] = &[NOT_APPLICABLE, LET_AI_DECIDE, "0", "1", "2"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AspectRatioChoice {
    pub label: &'static str,
    pub value: &'static str,
}

pub const ASPECT_RATIOS: &[AspectRatioChoice] = &[
    AspectRatioChoice {
        label: "N/A",
        value: NOT_APPLICABLE,
    },
    AspectRatioChoice {
        label: "Let AI Decide (5:7)",
        value: LET_AI_DECIDE,
    },
    AspectRatioChoice {
        label: "Landscape (4:3)",
        value: "4:3",
    },
    AspectRatioChoice {
        label: "Post (3:4)",
        value: "3:4",
    },
    AspectRatioChoice {
        label: "IG/FB (1:1)",
        value: "1:1",
    },
    AspectRatioChoice {
        label: "Cinematic (16:9)",
        value: "16:9",
    },
    AspectRatioChoice {
        label: "Story (9:16)",
        value: "9:16",
    },
];

/// Named option lists in display order, for listings.
pub fn option_catalogs() -> [(&'static str, &'static [&'static str]); 8] {
    [
        ("artStyle", ART_STYLES),
        ("vibe", VIBES),
        ("pose", POSES),
        ("backgroundIntensity", BACKGROUND_INTENSITIES),
        ("lightingTone", LIGHTING_TONES),
        ("colorPalette", COLOR_PALETTES),
        ("peopleCount", PEOPLE_COUNTS),
        ("petCount", PET_COUNTS),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::is_aspect_ratio;
    use crate::options::{resolve_ratio_with, Choice};

    #[test]
    fn every_concrete_ratio_resolves_to_itself() {
        for choice in ASPECT_RATIOS {
            let resolved = resolve_ratio_with(&Choice::parse(choice.value), "3:4");
            assert!(is_aspect_ratio(&resolved), "{} -> {}", choice.label, resolved);
            if is_aspect_ratio(choice.value) {
                assert_eq!(resolved, choice.value);
            }
        }
    }

    #[test]
    fn sentinel_entries_lead_each_list() {
        for (name, values) in option_catalogs() {
            assert!(
                values.contains(&LET_AI_DECIDE),
                "{name} is missing the no-preference entry"
            );
            assert!(Choice::parse(values[0]).value().is_none());
        }
    }
}
