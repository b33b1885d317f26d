use std::fmt;

use crate::cast::{cast_list, effective_people_count, CastMember};
use crate::options::{GenerationOptions, NormalizedOptions};
use crate::prompt::overrides::{apply_overrides, PHOTOREALISTIC};
use crate::taxonomy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    CastHeader,
    SpatialMapping,
    IdentityLock,
    StrictLikeness,
    Scene,
    UserNotes,
    ArtStyle,
    Checklist,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSection {
    pub kind: SectionKind,
    pub text: String,
}

/// The instruction handed to the image model, kept as ordered sections until it
/// is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptDocument {
    sections: Vec<PromptSection>,
}

impl PromptDocument {
    pub fn sections(&self) -> &[PromptSection] {
        &self.sections
    }

    pub fn section(&self, kind: SectionKind) -> Option<&PromptSection> {
        self.sections.iter().find(|section| section.kind == kind)
    }

    pub fn render(&self) -> String {
        self.sections
            .iter()
            .map(|section| section.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for PromptDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

fn section(title: &str, body: &str) -> String {
    format!("{}\n{}\n", title, body)
}

fn cast_header(reference_count: usize, expected: Option<&str>) -> String {
    let mut body = String::new();
    if reference_count > 0 {
        body.push_str("You are generating a scene with a SPECIFIC CAST of characters based on the attached reference images.\n\n");
    } else {
        body.push_str("You are generating a scene with a SPECIFIC CAST of characters.\n\n");
    }

    body.push_str("**CAST LIST (MANDATORY):**\n");
    if reference_count > 0 {
        body.push_str(&format!(
            "You have received {reference_count} distinct reference images.\n"
        ));
    } else {
        body.push_str("No reference images were provided.\n");
    }
    match expected {
        Some(count) => body.push_str(&format!(
            "You must generate a scene containing **EXACTLY {count} HUMAN FIGURES**.\n"
        )),
        None => body.push_str(
            "Include only the people the scene calls for. Do not pad it with additional figures.\n",
        ),
    }

    body.push_str("\n**ANTI-CLONING PROTOCOL:**\n");
    body.push_str("- Do **NOT** generate duplicates of the same person.\n");
    body.push_str("- Do **NOT** generate \"extras\" or random background people.\n");
    match expected {
        Some(count) => {
            body.push_str(&format!(
                "- The scene must contain ONLY the {count} cast members (plus any pets if requested).\n"
            ));
            body.push_str(&format!(
                "- If you generate more than {count} people, you have FAILED. If you generate copies of the same subject, you have FAILED."
            ));
        }
        None => body.push_str(
            "- If you generate copies of the same person, you have FAILED.",
        ),
    }

    section(
        "CRITICAL SYSTEM INSTRUCTION - CAST LIST & IDENTITY MAPPING:",
        &body,
    )
}

fn spatial_mapping(cast: &[CastMember]) -> String {
    let lines = cast
        .iter()
        .map(CastMember::directive)
        .collect::<Vec<_>>()
        .join("\n");
    section(
        "**SPATIAL MAPPING (LEFT-TO-RIGHT):**",
        &format!("Assign the identities in this specific order:\n{lines}"),
    )
}

fn identity_lock() -> String {
    section(
        "**IDENTITY & APPEARANCE LOCK:**",
        "1. **Hair**: If Subject 1 is Blonde, Figure 1 is Blonde. If Subject 2 is Dark-haired, Figure 2 is Dark-haired.\n\
         2. **Face**: Perform a virtual \"Face Swap\" to graft the reference face onto the generated body.\n\
         3. **Age**: Maintain the age relative to the photo. Do not make adults into children or vice versa.",
    )
}

fn strict_likeness() -> String {
    section(
        "*** STRICT LIKENESS MODE ACTIVE ***",
        "- PRIORITY: FACE INTEGRITY > ARTISTIC STYLE.\n\
         - ART STYLE OVERRIDE: Force PHOTOREALISTIC rendering (Canon EOS R5).\n\
         - LIGHTING: Use standard neutral studio lighting on the faces.\n\
         - DO NOT Apply heavy filters that obscure facial features.",
    )
}

fn scene(options: &NormalizedOptions<'_>) -> String {
    let mut lines = vec![format!("- Concept: {}", taxonomy::describe(options.style))];
    let clauses = [
        ("Mood/Vibe", options.mood),
        ("Lighting", options.lighting),
        ("Background", options.background),
        ("Color Palette", options.color_palette),
        ("Pose", options.pose),
        ("REQUIRED PETS", options.pet_count),
    ];
    for (label, value) in clauses {
        if let Some(value) = value {
            lines.push(format!("- {label}: {value}"));
        }
    }
    section("**SCENE SPECIFICATION:**", &lines.join("\n"))
}

fn user_notes(notes: &str) -> String {
    let body = if notes.is_empty() { "None" } else { notes };
    section("**USER NOTES:**", body)
}

fn art_style(style: &str) -> String {
    let mut body = style.to_string();
    if style == PHOTOREALISTIC {
        body.push_str("\n- Output must be indistinguishable from a real photograph. Focus on realistic skin texture.");
    }
    section("**ART STYLE:**", &body)
}

fn checklist(reference_count: usize, expected: Option<&str>, cast: &[CastMember]) -> String {
    let count_check = match expected {
        Some(count) => format!("1. Count the humans. Are there exactly {count}? (If no, REJECT)."),
        None => "1. Count the humans. Does every figure belong in the requested scene? (If no, REJECT).".to_string(),
    };

    let (first_check, last_check) = match (cast.first(), cast.last()) {
        (Some(first), Some(last)) if reference_count > 1 => (
            format!(
                "2. Check Figure {} ({}). Does it look like Subject {}?",
                first.index, first.label, first.index
            ),
            format!(
                "3. Check Figure {} ({}). Does it look like Subject {}?",
                last.index, last.label, last.index
            ),
        ),
        (Some(only), _) => (
            format!(
                "2. Check Figure {} ({}). Does it look like Subject {}?",
                only.index, only.label, only.index
            ),
            format!(
                "3. Check skin texture and bone structure. Are they unchanged from Subject {}?",
                only.index
            ),
        ),
        _ => (
            "2. Check every face. Is each one a distinct, natural individual?".to_string(),
            "3. Check the setting. Does it match the scene specification?".to_string(),
        ),
    };

    section(
        "**FINAL CHECKLIST:**",
        &[
            count_check,
            first_check,
            last_check,
            "4. Are there any clones? (If yes, REJECT).".to_string(),
        ]
        .join("\n"),
    )
}

/// Builds the instruction document for `options` and `reference_count` reference
/// photos. Identical inputs always produce identical output.
pub fn build(options: &GenerationOptions, reference_count: usize) -> PromptDocument {
    let effective = apply_overrides(options.normalized());
    let expected = effective_people_count(effective.people_count, reference_count);
    let cast = cast_list(reference_count);

    let mut sections = vec![PromptSection {
        kind: SectionKind::CastHeader,
        text: cast_header(reference_count, expected.as_deref()),
    }];

    if !cast.is_empty() {
        sections.push(PromptSection {
            kind: SectionKind::SpatialMapping,
            text: spatial_mapping(&cast),
        });
    }

    sections.push(PromptSection {
        kind: SectionKind::IdentityLock,
        text: identity_lock(),
    });

    if effective.strict_likeness {
        sections.push(PromptSection {
            kind: SectionKind::StrictLikeness,
            text: strict_likeness(),
        });
    }

    sections.push(PromptSection {
        kind: SectionKind::Scene,
        text: scene(&effective),
    });
    sections.push(PromptSection {
        kind: SectionKind::UserNotes,
        text: user_notes(effective.creative_notes),
    });

    if let Some(style) = effective.art_style {
        sections.push(PromptSection {
            kind: SectionKind::ArtStyle,
            text: art_style(style),
        });
    }

    sections.push(PromptSection {
        kind: SectionKind::Checklist,
        text: checklist(reference_count, expected.as_deref(), &cast),
    });

    PromptDocument { sections }
}
