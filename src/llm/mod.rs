pub mod gemini;
pub mod media;

use base64::{engine::general_purpose, Engine as _};

use crate::reference::ReferenceImage;

pub use gemini::{
    analyze_image_with_gemini, edit_image_with_gemini, generate_image_with_gemini,
    GeminiImageConfig,
};

/// Raw failure from the model service. The text is kept verbatim so the
/// caller can classify it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Model call failed: {0}")]
pub struct ModelCallError(pub String);

/// The first inline image the model returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub mime_type: String,
    pub data: String,
}

impl GeneratedImage {
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        general_purpose::STANDARD.decode(self.data.trim())
    }

    /// The image as a reference for the next step (editing, or as an identity).
    pub fn to_reference(&self) -> ReferenceImage {
        ReferenceImage::new(self.data.clone(), self.mime_type.clone())
    }
}

#[allow(async_fn_in_trait)]
pub trait ImageBackend {
    async fn generate(
        &self,
        api_key: &str,
        prompt: &str,
        references: &[ReferenceImage],
        aspect_ratio: &str,
    ) -> Result<GeneratedImage, ModelCallError>;

    async fn edit(
        &self,
        api_key: &str,
        source: &ReferenceImage,
        instructions: &str,
        references: &[ReferenceImage],
    ) -> Result<GeneratedImage, ModelCallError>;

    async fn analyze(&self, api_key: &str, image: &ReferenceImage)
        -> Result<String, ModelCallError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GeminiBackend;

impl ImageBackend for GeminiBackend {
    async fn generate(
        &self,
        api_key: &str,
        prompt: &str,
        references: &[ReferenceImage],
        aspect_ratio: &str,
    ) -> Result<GeneratedImage, ModelCallError> {
        generate_image_with_gemini(api_key, prompt, references, aspect_ratio).await
    }

    async fn edit(
        &self,
        api_key: &str,
        source: &ReferenceImage,
        instructions: &str,
        references: &[ReferenceImage],
    ) -> Result<GeneratedImage, ModelCallError> {
        edit_image_with_gemini(api_key, source, instructions, references).await
    }

    async fn analyze(
        &self,
        api_key: &str,
        image: &ReferenceImage,
    ) -> Result<String, ModelCallError> {
        analyze_image_with_gemini(api_key, image).await
    }
}
