//! Holiday themes, their style variants, and the scene description each variant
//! resolves to.
//!
//! The registry is built once per process from the static tables below. Loading
//! checks that every variant named by a theme has a description, so lookups at
//! prompt-build time never need to fail.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Theme that carries no styles.
pub const NO_THEME: &str = "none";

pub const FALLBACK_DESCRIPTION: &str = "Theme: Holiday Portrait. Festive, warm, and magical.";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TaxonomyError {
    #[error("theme '{theme}' lists style '{style}' which has no scene description")]
    UnresolvedStyle { theme: String, style: String },
    #[error("theme '{0}' has no styles")]
    EmptyTheme(String),
    #[error("theme '{0}' is declared more than once")]
    DuplicateTheme(String),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("style '{style}' is not part of theme '{theme}'")]
    StyleNotInTheme { theme: String, style: String },
}

const THEMES: &[(&str, &[&str])] = &[
    (NO_THEME, &[]),
    (
        "All Holiday Styles",
        &[
            "Baby Snow Globe",
            "Black Velvet Couture",
            "Candlelit Portraits",
            "Caught Being Naughty",
            "Celebration Candle Wall",
            "Champagne Bokeh",
            "Checking the List",
            "Christmas & Cocoa",
            "Cozy Cabin",
            "Cozy Knit Pod Ornament",
            "Elegant Gold Studio",
            "Gold + Blue Glow",
            "Holiday Gala",
            "Ice Palace",
            "Indoor Traditional",
            "Ivory Elegance",
            "Keepsake Frame Ornament",
            "Lux Christmas Couture",
            "Luxe Editorial Look",
            "Minimalist Festive Glow",
            "Moon & Stars Ornament",
            "Neutral Winter Studio",
            "Outdoor Traditional",
            "Pastel Wreath Ornament",
            "Proudly Nice",
            "Santa’s Workshop",
            "Snowy Outdoor",
            "Sparkling Lights Studio",
            "The List Keeper",
            "Vintage Swing Ornament",
            "Warm Lantern Scene",
            "Winter Royalty",
        ],
    ),
    (
        "Naughty or Nice",
        &[
            "Checking the List",
            "Caught Being Naughty",
            "Proudly Nice",
            "The List Keeper",
        ],
    ),
    (
        "Baby's First Christmas (0-1 Year)",
        &[
            "Baby Snow Globe",
            "Classic First Christmas Ornament",
            "Cozy Knit Pod Ornament",
            "Keepsake Frame Ornament",
            "Moon & Stars Ornament",
            "Pastel Wreath Ornament",
            "Vintage Swing Ornament",
        ],
    ),
    (
        "Christmas Ornament",
        &[
            "Baby's First Christmas",
            "Ceramic Bulb (Face Only)",
            "Glass Bauble (Full Body)",
            "Snow Globe Scene",
            "Snowflake (Face Only)",
            "Vintage Glass Ornament",
        ],
    ),
    (
        "Celebration Glow (Universal)",
        &[
            "Champagne Bokeh",
            "Elegant Gold Studio",
            "Ivory Elegance",
            "Luxe Editorial Look",
            "Minimalist Festive Glow",
        ],
    ),
    (
        "Christmas Magic",
        &[
            "Black Velvet Couture",
            "Christmas & Cocoa",
            "Holiday Gala",
            "Indoor Traditional",
            "Ivory Elegance",
            "Lux Christmas Couture",
            "Outdoor Traditional",
            "Santa’s Workshop",
        ],
    ),
    (
        "Festival of Lights",
        &[
            "Candlelit Portraits",
            "Celebration Candle Wall",
            "Gold + Blue Glow",
            "Sparkling Lights Studio",
            "Warm Lantern Scene",
        ],
    ),
    (
        "The Festive Gentleman",
        &[
            "Classic Dad Christmas",
            "Dapper Holiday Suit",
            "Midnight Velvet",
            "Modern Minimalist Man",
            "Rugged Winter Cabin",
        ],
    ),
    (
        "Winter Magic (Non-Religious)",
        &[
            "Cozy Cabin",
            "Ice Palace",
            "Neutral Winter Studio",
            "Snowy Outdoor",
            "Winter Royalty",
        ],
    ),
];

// Descriptions marked CRITICAL or FORENSIC NOTE keep the stylistic treatment off
// the subject's facial geometry.
const SCENES: &[(&str, &str)] = &[
    // Naughty or Nice
    ("Checking the List", "Theme: Naughty or Nice - Checking the List. The subject is holding a long, vintage parchment scroll (Santa's List). They are pointing at a name with a shocked, laughing, or triumphant expression. Background: North Pole office. (CRITICAL: Apply expression WITHOUT changing the subject's facial identity or bone structure)."),
    ("Caught Being Naughty", "Theme: Naughty or Nice - Caught! The subject is humorously \"caught\" in the act (e.g. wrapped in lights). Fun, playful, slightly mischievous vibe. (CRITICAL: Maintain forensic likeness despite the playful expression)."),
    ("Proudly Nice", "Theme: Naughty or Nice - Angelic. The subject is wearing a subtle halo prop or holding a \"Nice List\" certificate. Soft, glowing, ethereal lighting."),
    ("The List Keeper", "Theme: Naughty or Nice - The Judge. The subject is dressed as a modernized \"List Keeper\", holding a feather quill. Assessing the viewer with a knowing look. Cinematic, rich textures."),
    // The Festive Gentleman
    ("Dapper Holiday Suit", "Theme: Dapper Gentleman. High-end formal holiday party. ATTIRE: Tailored three-piece suit in velvet or wool. BACKGROUND: Upscale lounge, warm bokeh. VIBE: Sophisticated. (FORENSIC NOTE: Apply \"GQ\" lighting, but do NOT \"beautify\" or \"yassify\" the face. Keep rugged/real skin texture and original bone structure)."),
    ("Rugged Winter Cabin", "Theme: Rugged Winter Man. Outdoors or Rustic Cabin. ATTIRE: Heavy cable-knit sweater or flannel. BACKGROUND: Snowy forest. VIBE: Masculine, cozy."),
    ("Midnight Velvet", "Theme: Midnight Velvet. Moody, dark aesthetic. ATTIRE: Black velvet blazer, dark tones. BACKGROUND: Shadowy, dramatic lighting. VIBE: Mysterious."),
    ("Modern Minimalist Man", "Theme: Modern Minimalist Menswear. Clean, architectural. ATTIRE: High-quality cashmere, tailored coat. BACKGROUND: Modern winter city."),
    ("Classic Dad Christmas", "Theme: Classic Wholesome Holiday. Family man aesthetic. ATTIRE: Premium quarter-zip sweater. BACKGROUND: Living room with tree. VIBE: Warm, happy."),
    // Christmas Magic
    ("Santa’s Workshop", "Theme: Santa Storybook Workshop. Inside Santa’s Workshop. Warm, storybook-style scene. Santa sitting in a large wooden chair."),
    ("Ivory Elegance", "Theme: Ivory Elegance. Soft, elegant, neutral-toned décor. Cream and gold tree. Dreamy, editorial. (FORENSIC NOTE: Maintain natural skin tones and HAIR colors. Do NOT darken blonde hair to match the cream palette. Keep individual features distinct)."),
    ("Black Velvet Couture", "Theme: Black Velvet Couture (Vogue Editorial). Family styled in coordinated BLACK VELVET couture. (FORENSIC NOTE: High-fashion styling, but keep the FACES 100% authentic to reference)."),
    ("Lux Christmas Couture", "Theme: Lux Christmas Couture. Avant-garde, expensive holiday fashion. Rich fabrics, jewelry, dramatic flair. (FORENSIC NOTE: Do not allow the high-fashion aesthetic to alter facial geometry. The subject must look exactly like the reference)."),
    ("Holiday Gala", "Theme: Holiday Gala. Formal Black Tie. Elegant, sophisticated, warm lighting."),
    ("Christmas & Cocoa", "Theme: Cozy Christmas & Cocoa. Warm indoor scene, knitwear, sweaters. Intimate, joyful."),
    ("Indoor Traditional", "Theme: Indoor Family Traditional. Rich textures (velvet, knit). Green, red, cream solid colors. Picture-perfect harmony."),
    ("Outdoor Traditional", "Theme: Traditional Outdoor Christmas. Tartan flannel, brown leather, denim, snow jackets. Wholesome, snowy background."),
    // Winter Magic
    ("Ice Palace", "Theme: Ice Palace. Grand, opulent hall enclosed by glass/mirrors. Blue sky visible. Shimmering crystal."),
    ("Winter Royalty", "Theme: Winter Royalty. Ice Kings and Queens. Silver/blue ornate suits, faux fur cloaks. (FORENSIC NOTE: Costume is fantasy, FACE must remain realistic and true to reference)."),
    ("Snowy Outdoor", "Theme: Snowy Outdoor Landscape. Pristine nature, snow-covered pine trees. Subjects in warm, stylish winter gear."),
    ("Cozy Cabin", "Theme: Cozy Winter Cabin. Rustic wooden interior, roaring fire. Hygge atmosphere."),
    ("Neutral Winter Studio", "Theme: Neutral Winter Studio. Minimalist, high-key photography. White/Grey background. Focus on subjects."),
    // Festival of Lights
    ("Candlelit Portraits", "Theme: Candlelit Portrait. Dark, moody background illuminated by dozens of warm candles. Soft, golden glow."),
    ("Gold + Blue Glow", "Theme: Gold & Blue Celebration. Decor features rich royal blues and shimmering golds. Elegant, regal."),
    ("Warm Lantern Scene", "Theme: Festival of Lanterns. Background of glowing paper lanterns. Warm orange/gold color palette."),
    ("Sparkling Lights Studio", "Theme: Sparkling Lights. Bokeh-heavy background with thousands of tiny fairy lights. Joyful, bright."),
    ("Celebration Candle Wall", "Theme: Wall of Candles. Background of structural niches holding flickering candles. Architectural."),
    // Celebration Glow
    ("Elegant Gold Studio", "Theme: Elegant Gold Studio. Background of textured gold leaf or golden drapes. High-fashion lighting."),
    ("Champagne Bokeh", "Theme: Champagne Bokeh. Soft, out-of-focus champagne and silver lights. Abstract festive background."),
    ("Luxe Editorial Look", "Theme: Luxe Editorial. Studio photography, stark or dramatic lighting."),
    ("Minimalist Festive Glow", "Theme: Minimalist Glow. Clean background, single light source creating a halo effect."),
    // Baby and ornaments
    ("Baby Snow Globe", "Theme: Baby Snow Globe Ornament. SURREAL MINIATURE. Subject inside a glass snow globe."),
    ("Classic First Christmas Ornament", "Theme: Classic Baby's First Christmas Ornament. CLOSE-UP ORNAMENT. Pastel/gold ornament."),
    ("Cozy Knit Pod Ornament", "Theme: Cozy Knit Pod Ornament. Baby inside a hanging knit pod."),
    ("Keepsake Frame Ornament", "Theme: Keepsake Frame Ornament. Square photo frame ornament labeled '2025'."),
    ("Moon & Stars Ornament", "Theme: Moon & Stars Ornament. Baby on a crescent moon ornament."),
    ("Pastel Wreath Ornament", "Theme: Pastel Wreath Ornament. Soft, fluffy wreath framing the face."),
    ("Vintage Swing Ornament", "Theme: Vintage Swing Ornament. Baby on a tiny wooden swing ornament."),
    ("Baby's First Christmas", "Theme: Baby's First Christmas Ornament. CLOSE-UP."),
    ("Glass Bauble (Full Body)", "Theme: Glass Bauble (Full Body). SURREAL MINIATURE inside glass."),
    ("Snowflake (Face Only)", "Theme: Snowflake Ornament. CLOSE-UP. Physical crystal snowflake framing face."),
    ("Ceramic Bulb (Face Only)", "Theme: Flat Ceramic Ornament. CLOSE-UP. Flat white ceramic disc."),
    ("Vintage Glass Ornament", "Theme: Vintage Glass Ornament. Reflection or Inside vintage mercury glass."),
    ("Snow Globe Scene", "Theme: Snow Globe. SURREAL MINIATURE inside glass."),
];

pub static REGISTRY: Lazy<TaxonomyRegistry> =
    Lazy::new(|| TaxonomyRegistry::load().expect("Failed to load theme taxonomy"));

#[derive(Debug, Clone)]
pub struct TaxonomyRegistry {
    themes: Vec<(&'static str, &'static [&'static str])>,
    scenes: HashMap<&'static str, &'static str>,
}

impl TaxonomyRegistry {
    pub fn load() -> Result<Self, TaxonomyError> {
        Self::from_tables(THEMES, SCENES)
    }

    fn from_tables(
        themes: &[(&'static str, &'static [&'static str])],
        scenes: &[(&'static str, &'static str)],
    ) -> Result<Self, TaxonomyError> {
        let scenes: HashMap<_, _> = scenes.iter().copied().collect();
        let mut seen = Vec::with_capacity(themes.len());

        for (theme, styles) in themes {
            if seen.contains(theme) {
                return Err(TaxonomyError::DuplicateTheme(theme.to_string()));
            }
            seen.push(*theme);

            if styles.is_empty() && *theme != NO_THEME {
                return Err(TaxonomyError::EmptyTheme(theme.to_string()));
            }
            if let Some(style) = styles.iter().find(|style| !scenes.contains_key(*style)) {
                return Err(TaxonomyError::UnresolvedStyle {
                    theme: theme.to_string(),
                    style: style.to_string(),
                });
            }
        }

        Ok(Self {
            themes: themes.to_vec(),
            scenes,
        })
    }

    /// Selectable themes in display order. The style-less sentinel is omitted.
    pub fn themes(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.themes
            .iter()
            .map(|(theme, _)| *theme)
            .filter(|theme| *theme != NO_THEME)
    }

    /// Styles for `theme` in display order; empty for the sentinel and for
    /// unknown themes.
    pub fn variants_for(&self, theme: &str) -> &'static [&'static str] {
        self.themes
            .iter()
            .find(|(name, _)| *name == theme)
            .map(|(_, styles)| *styles)
            .unwrap_or(&[])
    }

    pub fn describe(&self, style: &str) -> &'static str {
        self.scenes.get(style).copied().unwrap_or(FALLBACK_DESCRIPTION)
    }

    /// Rejects a style that does not belong to the chosen theme. An empty style
    /// is always accepted and renders with the fallback description, whatever
    /// the theme; an unknown theme simply has no styles.
    pub fn validate_selection(&self, theme: &str, style: &str) -> Result<(), SelectionError> {
        let style = style.trim();
        if style.is_empty() || self.variants_for(theme).iter().any(|known| *known == style) {
            return Ok(());
        }
        Err(SelectionError::StyleNotInTheme {
            theme: theme.to_string(),
            style: style.to_string(),
        })
    }
}

pub fn variants_for(theme: &str) -> &'static [&'static str] {
    REGISTRY.variants_for(theme)
}

pub fn describe(style: &str) -> &'static str {
    REGISTRY.describe(style)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_theme_but_sentinel_has_described_styles() {
        let registry = TaxonomyRegistry::load().unwrap();
        let mut count = 0;
        for theme in registry.themes() {
            count += 1;
            let styles = registry.variants_for(theme);
            assert!(!styles.is_empty(), "{theme} has no styles");
            for style in styles {
                let description = registry.describe(style);
                assert!(!description.is_empty());
                assert_ne!(description, FALLBACK_DESCRIPTION, "{style} is unresolved");
            }
        }
        assert_eq!(count, 9);
    }

    #[test]
    fn sentinel_theme_has_no_styles() {
        assert!(variants_for(NO_THEME).is_empty());
        assert!(!REGISTRY.themes().any(|theme| theme == NO_THEME));
    }

    #[test]
    fn themes_keep_display_order() {
        let themes: Vec<_> = REGISTRY.themes().take(3).collect();
        assert_eq!(
            themes,
            vec![
                "All Holiday Styles",
                "Naughty or Nice",
                "Baby's First Christmas (0-1 Year)"
            ]
        );
    }

    #[test]
    fn unknown_style_degrades_to_fallback() {
        assert_eq!(describe("Candlelit Portrait"), FALLBACK_DESCRIPTION);
        assert_eq!(describe(""), FALLBACK_DESCRIPTION);
    }

    #[test]
    fn load_rejects_unresolved_style() {
        let themes: &[(&'static str, &'static [&'static str])] =
            &[("Broken", &["Candlelit Portraits", "Missing Scene"])];
        let err = TaxonomyRegistry::from_tables(themes, SCENES).unwrap_err();
        assert_eq!(
            err,
            TaxonomyError::UnresolvedStyle {
                theme: "Broken".to_string(),
                style: "Missing Scene".to_string(),
            }
        );
    }

    #[test]
    fn load_rejects_empty_non_sentinel_theme() {
        let themes: &[(&'static str, &'static [&'static str])] = &[("Hollow", &[])];
        let err = TaxonomyRegistry::from_tables(themes, SCENES).unwrap_err();
        assert_eq!(err, TaxonomyError::EmptyTheme("Hollow".to_string()));
    }

    #[test]
    fn selection_must_stay_inside_theme() {
        assert!(REGISTRY
            .validate_selection("Festival of Lights", "Candlelit Portraits")
            .is_ok());
        assert!(REGISTRY.validate_selection("Festival of Lights", "").is_ok());
        assert_eq!(
            REGISTRY.validate_selection("Festival of Lights", "Ice Palace"),
            Err(SelectionError::StyleNotInTheme {
                theme: "Festival of Lights".to_string(),
                style: "Ice Palace".to_string(),
            })
        );
        assert!(REGISTRY.validate_selection("Easter", "").is_ok());
        assert_eq!(
            REGISTRY.validate_selection("Easter", "Ice Palace"),
            Err(SelectionError::StyleNotInTheme {
                theme: "Easter".to_string(),
                style: "Ice Palace".to_string(),
            })
        );
    }
}
