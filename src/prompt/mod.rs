pub mod builder;
pub mod overrides;

pub use builder::{build, PromptDocument, PromptSection, SectionKind};
pub use overrides::{apply_overrides, PHOTOREALISTIC};
