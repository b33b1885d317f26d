//! Reference photos and the ordered list a session keeps them in.
//!
//! Position in the list is identity: reference `i` is Subject `i`. Batches are
//! encoded concurrently, but each result is written into the slot reserved for it
//! when the batch was submitted, so the list always follows selection order.

use std::future::Future;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose, Engine as _};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::config::CONFIG;
use crate::llm::media::image_mime_for_file;

static DATA_URL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^data:([A-Za-z0-9.+-]+/[A-Za-z0-9.+-]+);base64,(.+)$")
        .expect("valid data url pattern")
});

#[derive(Debug, thiserror::Error)]
pub enum ReferenceError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0} is empty")]
    Empty(PathBuf),
    #[error("{0} is not a supported image type")]
    UnsupportedType(PathBuf),
    #[error("malformed data URL")]
    InvalidDataUrl,
    #[error("encoding task failed: {0}")]
    Task(String),
    #[error("reference list is full ({0} images)")]
    Full(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceImage {
    pub data: String,
    pub mime_type: String,
}

impl ReferenceImage {
    pub fn new(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn from_bytes(bytes: &[u8], mime_type: &str) -> Self {
        Self::new(general_purpose::STANDARD.encode(bytes), mime_type)
    }

    pub fn from_data_url(url: &str) -> Result<Self, ReferenceError> {
        let captures = DATA_URL_PATTERN
            .captures(url.trim())
            .ok_or(ReferenceError::InvalidDataUrl)?;
        Ok(Self::new(&captures[2], &captures[1]))
    }

    /// Base64 payload without any `data:` prefix.
    pub fn payload(&self) -> &str {
        match self.data.split_once(',') {
            Some((_, payload)) => payload,
            None => &self.data,
        }
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.payload())
    }
}

pub async fn encode_file(path: PathBuf) -> Result<ReferenceImage, ReferenceError> {
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|source| ReferenceError::Read {
            path: path.clone(),
            source,
        })?;
    if bytes.is_empty() {
        return Err(ReferenceError::Empty(path));
    }
    let mime_type =
        image_mime_for_file(&path, &bytes).ok_or_else(|| ReferenceError::UnsupportedType(path.clone()))?;
    debug!(path = %path.display(), mime_type = %mime_type, bytes = bytes.len(), "encoded reference");
    Ok(ReferenceImage::from_bytes(&bytes, &mime_type))
}

/// Encodes every item concurrently and returns the results in input order,
/// whatever order the encodes finish in.
pub async fn collect_in_order<T, F, Fut>(
    items: Vec<T>,
    encode: F,
) -> Vec<Result<ReferenceImage, ReferenceError>>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = Result<ReferenceImage, ReferenceError>> + Send + 'static,
{
    let mut slots: Vec<Option<Result<ReferenceImage, ReferenceError>>> =
        (0..items.len()).map(|_| None).collect();
    let mut tasks = JoinSet::new();
    for (slot, item) in items.into_iter().enumerate() {
        let pending = encode(item);
        tasks.spawn(async move { (slot, pending.await) });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((slot, result)) => slots[slot] = Some(result),
            Err(err) => warn!("Reference encoding task failed: {}", err),
        }
    }

    slots
        .into_iter()
        .map(|slot| {
            slot.unwrap_or_else(|| Err(ReferenceError::Task("task did not complete".to_string())))
        })
        .collect()
}

/// The references held by one generator session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceList {
    images: Vec<ReferenceImage>,
    capacity: usize,
}

impl Default for ReferenceList {
    fn default() -> Self {
        Self::new(CONFIG.max_reference_images)
    }
}

impl ReferenceList {
    pub fn new(capacity: usize) -> Self {
        Self {
            images: Vec::new(),
            capacity,
        }
    }

    pub fn images(&self) -> &[ReferenceImage] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.capacity.saturating_sub(self.images.len())
    }

    pub fn push(&mut self, image: ReferenceImage) -> Result<(), ReferenceError> {
        if self.remaining() == 0 {
            return Err(ReferenceError::Full(self.capacity));
        }
        self.images.push(image);
        Ok(())
    }

    /// Removes the reference at `index`; later subjects move up one place.
    pub fn remove(&mut self, index: usize) -> Option<ReferenceImage> {
        if index < self.images.len() {
            Some(self.images.remove(index))
        } else {
            None
        }
    }

    pub fn replace(&mut self, images: Vec<ReferenceImage>) {
        self.images = images;
        self.images.truncate(self.capacity);
    }

    /// Adds a batch in selection order. Items past the remaining capacity are
    /// dropped; items that fail to encode are skipped and reported.
    pub async fn add_batch_with<T, F, Fut>(&mut self, items: Vec<T>, encode: F) -> Vec<ReferenceError>
    where
        F: Fn(T) -> Fut,
        Fut: Future<Output = Result<ReferenceImage, ReferenceError>> + Send + 'static,
    {
        let mut items = items;
        let remaining = self.remaining();
        if items.len() > remaining {
            warn!(
                "Reference batch of {} exceeds remaining capacity {}; extra images ignored",
                items.len(),
                remaining
            );
            items.truncate(remaining);
        }

        let mut errors = Vec::new();
        for result in collect_in_order(items, encode).await {
            match result {
                Ok(image) => self.images.push(image),
                Err(err) => {
                    warn!("Skipping reference image: {}", err);
                    errors.push(err);
                }
            }
        }
        errors
    }

    pub async fn add_files(&mut self, paths: &[impl AsRef<Path>]) -> Vec<ReferenceError> {
        let paths = paths
            .iter()
            .map(|path| path.as_ref().to_path_buf())
            .collect::<Vec<_>>();
        self.add_batch_with(paths, encode_file).await
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::Duration;

    use super::*;

    const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 13, 1, 2];

    fn delayed(name: &'static str, delay_ms: u64) -> (&'static str, u64) {
        (name, delay_ms)
    }

    async fn fake_encode(
        (name, delay_ms): (&'static str, u64),
    ) -> Result<ReferenceImage, ReferenceError> {
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        if name.is_empty() {
            return Err(ReferenceError::Empty(PathBuf::from("blank")));
        }
        Ok(ReferenceImage::new(name, "image/png"))
    }

    fn names(list: &ReferenceList) -> Vec<&str> {
        list.images().iter().map(|image| image.data.as_str()).collect()
    }

    #[tokio::test]
    async fn batch_keeps_selection_order_when_last_finishes_first() {
        let mut list = ReferenceList::new(24);
        let errors = list
            .add_batch_with(
                vec![delayed("A", 60), delayed("B", 30), delayed("C", 0)],
                fake_encode,
            )
            .await;
        assert!(errors.is_empty());
        assert_eq!(names(&list), vec!["A", "B", "C"]);
    }

    #[tokio::test]
    async fn batch_appends_after_existing_references() {
        let mut list = ReferenceList::new(24);
        list.push(ReferenceImage::new("first", "image/png")).unwrap();
        list.add_batch_with(vec![delayed("second", 20), delayed("third", 0)], fake_encode)
            .await;
        assert_eq!(names(&list), vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn failed_encodes_are_skipped_without_reordering() {
        let mut list = ReferenceList::new(24);
        let errors = list
            .add_batch_with(
                vec![delayed("A", 10), delayed("", 0), delayed("C", 5)],
                fake_encode,
            )
            .await;
        assert_eq!(errors.len(), 1);
        assert_eq!(names(&list), vec!["A", "C"]);
    }

    #[tokio::test]
    async fn batch_is_truncated_to_remaining_capacity() {
        let mut list = ReferenceList::new(2);
        list.add_batch_with(
            vec![delayed("A", 0), delayed("B", 0), delayed("C", 0)],
            fake_encode,
        )
        .await;
        assert_eq!(names(&list), vec!["A", "B"]);
        assert!(matches!(
            list.push(ReferenceImage::new("D", "image/png")),
            Err(ReferenceError::Full(2))
        ));
    }

    #[test]
    fn removing_shifts_later_subjects_up() {
        let mut list = ReferenceList::new(24);
        for name in ["A", "B", "C"] {
            list.push(ReferenceImage::new(name, "image/png")).unwrap();
        }
        assert_eq!(list.remove(0).map(|image| image.data), Some("A".to_string()));
        assert_eq!(names(&list), vec!["B", "C"]);
        assert!(list.remove(5).is_none());
    }

    #[tokio::test]
    async fn encodes_files_from_disk() {
        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(PNG_BYTES).unwrap();
        let image = encode_file(file.path().to_path_buf()).await.unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(
            general_purpose::STANDARD.decode(image.payload()).unwrap(),
            PNG_BYTES
        );
    }

    #[tokio::test]
    async fn rejects_non_image_files() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        file.write_all(b"plain text").unwrap();
        let err = encode_file(file.path().to_path_buf()).await.unwrap_err();
        assert!(matches!(err, ReferenceError::UnsupportedType(_)));
    }

    #[test]
    fn data_urls_are_split_into_type_and_payload() {
        let image = ReferenceImage::from_data_url("data:image/jpeg;base64,QUJD").unwrap();
        assert_eq!(image.mime_type, "image/jpeg");
        assert_eq!(image.payload(), "QUJD");
        assert_eq!(image.to_data_url(), "data:image/jpeg;base64,QUJD");
        assert!(ReferenceImage::from_data_url("QUJD").is_err());
    }

    #[test]
    fn payload_strips_embedded_prefix() {
        let image = ReferenceImage::new("data:image/png;base64,QUJD", "image/png");
        assert_eq!(image.payload(), "QUJD");
        assert_eq!(ReferenceImage::new("QUJD", "image/png").payload(), "QUJD");
    }
}
