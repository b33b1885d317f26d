//! Generator and editor sessions, and the glue that sends them to the model.
//!
//! A `Studio` owns the image backend and the credential store. The credential is
//! resolved once when the studio is opened. A failure that looks like a stale
//! key clears both the store and the session copy, so later calls fail with
//! `MissingCredential` until a new key is signed in.

use parking_lot::Mutex;
use tracing::{error, info, warn};

use crate::classify::{classify_failure, FailureKind};
use crate::config::{
    ANALYZE_FAILURE_MESSAGE, CONFIG, EDIT_FAILURE_MESSAGE, GENERATE_FAILURE_MESSAGE,
};
use crate::credentials::{resolve_session_credential_with, CredentialError, CredentialStore};
use crate::llm::{GeneratedImage, ImageBackend, ModelCallError};
use crate::options::GenerationOptions;
use crate::prompt::{self, PromptDocument};
use crate::reference::{ReferenceError, ReferenceImage, ReferenceList};
use crate::taxonomy::{SelectionError, NO_THEME, REGISTRY};

pub const PERSON_SLOTS: usize = 6;

#[derive(Debug, thiserror::Error)]
pub enum StudioError {
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error(transparent)]
    Reference(#[from] ReferenceError),
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error("No API key is set. Run `studio login <key>` or set GEMINI_API_KEY.")]
    MissingCredential,
    #[error("Pick a theme or write some creative notes first.")]
    NothingToGenerate,
    #[error("No image loaded for editing.")]
    MissingSource,
    #[error("Edit instructions are empty.")]
    EmptyInstructions,
    #[error("There is no Person {0}; choose 1 to 6.")]
    UnknownPerson(usize),
    #[error("{user_message}")]
    Model {
        kind: FailureKind,
        user_message: &'static str,
        detail: String,
    },
}

impl StudioError {
    pub fn is_auth_stale(&self) -> bool {
        matches!(
            self,
            StudioError::Model {
                kind: FailureKind::AuthStale,
                ..
            }
        )
    }
}

pub fn person_label(person: usize) -> String {
    format!("Person {person}")
}

#[derive(Debug, Clone, Default)]
pub struct GeneratorSession {
    pub options: GenerationOptions,
    pub references: ReferenceList,
}

impl GeneratorSession {
    pub fn new(options: GenerationOptions) -> Self {
        Self {
            options,
            references: ReferenceList::default(),
        }
    }

    pub fn with_references(options: GenerationOptions, references: ReferenceList) -> Self {
        Self {
            options,
            references,
        }
    }

    pub fn prompt(&self) -> PromptDocument {
        prompt::build(&self.options, self.references.len())
    }

    pub fn validate(&self) -> Result<(), SelectionError> {
        REGISTRY.validate_selection(&self.options.theme, &self.options.style)
    }
}

/// Source image, edit instructions and identity references grouped by person.
#[derive(Debug, Clone)]
pub struct EditorSession {
    source: Option<ReferenceImage>,
    instructions: String,
    people: Vec<Vec<ReferenceImage>>,
    per_person: usize,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(CONFIG.max_references_per_person)
    }
}

impl EditorSession {
    pub fn new(per_person: usize) -> Self {
        Self {
            source: None,
            instructions: String::new(),
            people: vec![Vec::new(); PERSON_SLOTS],
            per_person,
        }
    }

    pub fn source(&self) -> Option<&ReferenceImage> {
        self.source.as_ref()
    }

    /// Loads a new source image. A previous edit result is not kept.
    pub fn set_source(&mut self, image: ReferenceImage) {
        self.source = Some(image);
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    pub fn set_instructions(&mut self, instructions: impl Into<String>) {
        self.instructions = instructions.into();
    }

    fn slot(&self, person: usize) -> Result<usize, StudioError> {
        if (1..=PERSON_SLOTS).contains(&person) {
            Ok(person - 1)
        } else {
            Err(StudioError::UnknownPerson(person))
        }
    }

    pub fn references_for(&self, person: usize) -> Result<&[ReferenceImage], StudioError> {
        let slot = self.slot(person)?;
        Ok(&self.people[slot])
    }

    pub fn add_reference(&mut self, person: usize, image: ReferenceImage) -> Result<(), StudioError> {
        let slot = self.slot(person)?;
        if self.people[slot].len() >= self.per_person {
            return Err(ReferenceError::Full(self.per_person).into());
        }
        self.people[slot].push(image);
        Ok(())
    }

    pub fn remove_reference(
        &mut self,
        person: usize,
        index: usize,
    ) -> Result<Option<ReferenceImage>, StudioError> {
        let slot = self.slot(person)?;
        let references = &mut self.people[slot];
        if index < references.len() {
            Ok(Some(references.remove(index)))
        } else {
            Ok(None)
        }
    }

    /// All references, Person 1 first, each person's in the order they were added.
    pub fn flattened_references(&self) -> Vec<ReferenceImage> {
        self.people.iter().flatten().cloned().collect()
    }
}

pub struct Studio<B, C> {
    backend: B,
    credentials: C,
    api_key: Mutex<Option<String>>,
    pub generator: GeneratorSession,
    pub editor: EditorSession,
}

impl<B: ImageBackend, C: CredentialStore> Studio<B, C> {
    pub fn new(backend: B, credentials: C) -> Self {
        Self::with_env_key(backend, credentials, &CONFIG.gemini_api_key)
    }

    /// Opens a session, seeding an empty store from `env_key`.
    pub fn with_env_key(backend: B, credentials: C, env_key: &str) -> Self {
        let api_key = resolve_session_credential_with(&credentials, env_key);
        Self {
            backend,
            credentials,
            api_key: Mutex::new(api_key),
            generator: GeneratorSession::default(),
            editor: EditorSession::default(),
        }
    }

    pub fn credentials(&self) -> &C {
        &self.credentials
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.lock().is_some()
    }

    /// Stores a new key and uses it for the rest of the session.
    pub fn sign_in(&self, key: &str) -> Result<(), StudioError> {
        self.credentials.set(key)?;
        *self.api_key.lock() = self.credentials.get();
        Ok(())
    }

    fn credential(&self) -> Result<String, StudioError> {
        self.api_key
            .lock()
            .clone()
            .ok_or(StudioError::MissingCredential)
    }

    fn model_failure(
        &self,
        operation: &str,
        user_message: &'static str,
        err: ModelCallError,
    ) -> StudioError {
        let detail = err.0;
        let kind = classify_failure(&detail);
        error!("{} failed: {}", operation, detail);
        if kind == FailureKind::AuthStale {
            *self.api_key.lock() = None;
            match self.credentials.clear() {
                Ok(()) => warn!("Stored API key rejected; cleared it"),
                Err(clear_err) => warn!("Failed to clear rejected API key: {}", clear_err),
            }
        }
        StudioError::Model {
            kind,
            user_message,
            detail,
        }
    }

    pub async fn generate(&self) -> Result<GeneratedImage, StudioError> {
        self.generator.validate()?;
        let options = &self.generator.options;
        if options.theme == NO_THEME && options.creative_notes.is_empty() {
            return Err(StudioError::NothingToGenerate);
        }
        let api_key = self.credential()?;
        let prompt = self.generator.prompt().render();
        let aspect_ratio = self.generator.options.resolved_aspect_ratio();
        let references = self.generator.references.images();
        info!(
            theme = %self.generator.options.theme,
            style = %self.generator.options.style,
            references = references.len(),
            aspect_ratio = %aspect_ratio,
            "Generating portrait"
        );

        self.backend
            .generate(&api_key, &prompt, references, &aspect_ratio)
            .await
            .map_err(|err| self.model_failure("generate", GENERATE_FAILURE_MESSAGE, err))
    }

    pub async fn edit(&self) -> Result<GeneratedImage, StudioError> {
        let source = self.editor.source().ok_or(StudioError::MissingSource)?;
        let instructions = self.editor.instructions().trim();
        if instructions.is_empty() {
            return Err(StudioError::EmptyInstructions);
        }
        let api_key = self.credential()?;
        let references = self.editor.flattened_references();
        info!(references = references.len(), "Editing image");

        self.backend
            .edit(&api_key, source, instructions, &references)
            .await
            .map_err(|err| self.model_failure("edit", EDIT_FAILURE_MESSAGE, err))
    }

    /// Describes the editor's source image and uses the description as the new
    /// edit instructions.
    pub async fn analyze(&mut self) -> Result<String, StudioError> {
        let source = self.editor.source().ok_or(StudioError::MissingSource)?;
        let api_key = self.credential()?;
        let description = self
            .backend
            .analyze(&api_key, source)
            .await
            .map_err(|err| self.model_failure("analyze", ANALYZE_FAILURE_MESSAGE, err))?;
        self.editor.set_instructions(description.clone());
        Ok(description)
    }

    /// Hands the editor's instructions and references to the generator.
    pub fn transfer_prompt(&mut self) {
        self.generator.options.creative_notes = self.editor.instructions().to_string();
        self.generator
            .references
            .replace(self.editor.flattened_references());
    }

    /// Opens a generated image in the editor.
    pub fn transfer_image(&mut self, image: &GeneratedImage) {
        self.editor.set_source(image.to_reference());
    }
}
