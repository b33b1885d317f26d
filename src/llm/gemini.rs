use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, error, warn};

use crate::config::{
    ANALYZE_INSTRUCTION, CAST_LIST_LABEL, CONFIG, EDIT_IDENTITY_INSTRUCTION,
    EDIT_INSTRUCTION_PREFIX, EMPTY_ANALYSIS_TEXT,
};
use crate::llm::{GeneratedImage, ModelCallError};
use crate::reference::ReferenceImage;
use crate::utils::http::get_http_client;
use crate::utils::timing::log_model_timing;

#[derive(Debug, Clone, Default)]
pub struct GeminiImageConfig {
    pub aspect_ratio: Option<String>,
    pub image_size: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    parts: Option<Vec<GeminiPart>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiInlineData,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

fn redact_api_key(text: &str, api_key: &str) -> String {
    let key = api_key.trim();
    if key.is_empty() {
        return text.to_string();
    }
    text.replace(key, "[redacted]")
}

fn build_image_config(config: &GeminiImageConfig) -> Option<Value> {
    let mut map = Map::new();

    if let Some(aspect_ratio) = config.aspect_ratio.as_deref() {
        let trimmed = aspect_ratio.trim();
        if !trimmed.is_empty() {
            map.insert("aspectRatio".to_string(), json!(trimmed));
        }
    }

    if let Some(image_size) = config.image_size.as_deref() {
        let trimmed = image_size.trim();
        if !trimmed.is_empty() {
            map.insert("imageSize".to_string(), json!(trimmed));
        }
    }

    if map.is_empty() {
        None
    } else {
        Some(Value::Object(map))
    }
}

fn image_generation_config(config: &GeminiImageConfig) -> Value {
    let mut generation_config = json!({ "responseModalities": ["IMAGE"] });
    if let Some(image_config) = build_image_config(config) {
        if let Some(config_object) = generation_config.as_object_mut() {
            config_object.insert("imageConfig".to_string(), image_config);
        }
    }
    generation_config
}

fn truncate_for_log(value: &str, limit: usize) -> String {
    if value.chars().count() <= limit {
        return value.to_string();
    }
    let truncated: String = value.chars().take(limit).collect();
    format!("{truncated}... (truncated)")
}

fn summarize_parts(parts: &[Value]) -> Vec<Value> {
    parts
        .iter()
        .map(|part| {
            if let Some(text) = part.get("text").and_then(|value| value.as_str()) {
                json!({ "text": truncate_for_log(text, 200) })
            } else if let Some(inline_data) = part.get("inlineData") {
                let mime_type = inline_data
                    .get("mimeType")
                    .and_then(|value| value.as_str())
                    .unwrap_or("unknown");
                let data_len = inline_data
                    .get("data")
                    .and_then(|value| value.as_str())
                    .map(|value| value.len())
                    .unwrap_or(0);
                json!({ "inlineData": { "mimeType": mime_type, "dataLen": data_len } })
            } else {
                json!({ "unknownPart": true })
            }
        })
        .collect()
}

fn summarize_payload(payload: &Value) -> Value {
    let mut summary = Map::new();

    if let Some(contents) = payload.get("contents").and_then(|value| value.as_array()) {
        let mut summarized_contents = Vec::new();
        for content in contents {
            let parts = content
                .get("parts")
                .and_then(|value| value.as_array())
                .map(|parts| summarize_parts(parts))
                .unwrap_or_default();
            summarized_contents.push(json!({ "parts": parts }));
        }
        summary.insert("contents".to_string(), Value::Array(summarized_contents));
    }

    if let Some(config) = payload.get("generationConfig") {
        summary.insert("generationConfig".to_string(), config.clone());
    }

    Value::Object(summary)
}

fn summarize_response(response: &GeminiResponse) -> Value {
    let mut text_parts = 0usize;
    let mut image_parts = 0usize;
    let mut text_preview = None;

    for candidate in response.candidates.as_deref().unwrap_or(&[]) {
        let parts = candidate
            .content
            .as_ref()
            .and_then(|content| content.parts.as_deref())
            .unwrap_or(&[]);
        for part in parts {
            match part {
                GeminiPart::Text { text } => {
                    text_parts += 1;
                    if text_preview.is_none() && !text.trim().is_empty() {
                        text_preview = Some(truncate_for_log(text, 200));
                    }
                }
                GeminiPart::InlineData { inline_data } => {
                    if inline_data.mime_type.starts_with("image/") {
                        image_parts += 1;
                    }
                }
            }
        }
    }

    json!({
        "candidates": response.candidates.as_ref().map(|candidates| candidates.len()).unwrap_or(0),
        "textParts": text_parts,
        "imageParts": image_parts,
        "textPreview": text_preview
    })
}

fn summarize_error_body(body: &str) -> (Option<String>, String) {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return (None, "empty response body".to_string());
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        let message = value
            .pointer("/error/message")
            .and_then(|v| v.as_str())
            .map(|v| v.to_string())
            .or_else(|| {
                value
                    .get("message")
                    .and_then(|v| v.as_str())
                    .map(|v| v.to_string())
            });
        return (message, truncate_for_log(&value.to_string(), 2000));
    }

    (None, truncate_for_log(trimmed, 2000))
}

fn inline_part(image: &ReferenceImage) -> Value {
    json!({
        "inlineData": {
            "mimeType": image.mime_type,
            "data": image.payload()
        }
    })
}

/// Request parts for a generation: each reference is preceded by its subject
/// label, and the prompt document comes last.
fn build_generation_parts(prompt: &str, references: &[ReferenceImage]) -> Vec<Value> {
    let mut parts = Vec::new();
    if !references.is_empty() {
        parts.push(json!({ "text": CAST_LIST_LABEL }));
        for (index, image) in references.iter().enumerate() {
            parts.push(json!({ "text": format!("[IMAGE FOR SUBJECT {}]:", index + 1) }));
            parts.push(inline_part(image));
        }
    }
    parts.push(json!({ "text": prompt }));
    parts
}

fn build_edit_parts(
    source: &ReferenceImage,
    instructions: &str,
    references: &[ReferenceImage],
) -> Vec<Value> {
    let mut parts = vec![
        inline_part(source),
        json!({ "text": format!("{} {}", EDIT_INSTRUCTION_PREFIX, instructions) }),
    ];
    if !references.is_empty() {
        parts.push(json!({ "text": EDIT_IDENTITY_INSTRUCTION }));
        parts.extend(references.iter().map(inline_part));
    }
    parts
}

fn extract_text_from_response(response: GeminiResponse) -> String {
    let mut text_parts = Vec::new();
    for candidate in response.candidates.unwrap_or_default() {
        let parts = candidate
            .content
            .and_then(|content| content.parts)
            .unwrap_or_default();
        for part in parts {
            if let GeminiPart::Text { text } = part {
                if !text.trim().is_empty() {
                    text_parts.push(text);
                }
            }
        }
    }
    text_parts.join("\n")
}

fn analysis_text(text: String) -> String {
    if text.trim().is_empty() {
        EMPTY_ANALYSIS_TEXT.to_string()
    } else {
        text
    }
}

fn extract_first_image(response: GeminiResponse) -> Option<GeneratedImage> {
    response
        .candidates
        .unwrap_or_default()
        .into_iter()
        .take(1)
        .filter_map(|candidate| candidate.content.and_then(|content| content.parts))
        .flatten()
        .find_map(|part| match part {
            GeminiPart::InlineData { inline_data } => Some(GeneratedImage {
                mime_type: inline_data.mime_type,
                data: inline_data.data,
            }),
            GeminiPart::Text { .. } => None,
        })
}

/// Sends one `generateContent` request. There is no retry: any failure is
/// returned to the caller as a single error.
async fn call_gemini_api(
    api_key: &str,
    model: &str,
    payload: Value,
) -> Result<GeminiResponse, ModelCallError> {
    let client = get_http_client();
    let url = format!("{}/models/{}:generateContent", CONFIG.gemini_base_url, model);

    if tracing::enabled!(tracing::Level::DEBUG) {
        let payload_summary = summarize_payload(&payload);
        debug!(target: "llm.gemini", model = model, payload = %payload_summary);
    }

    let response = client
        .post(&url)
        .header("x-goog-api-key", api_key)
        .timeout(Duration::from_secs(CONFIG.gemini_timeout_seconds))
        .json(&payload)
        .send()
        .await
        .map_err(|err| {
            let err_text = redact_api_key(&err.to_string(), api_key);
            warn!(
                "Gemini request failed to send: {} (timeout={}, connect={}, status={:?})",
                err_text,
                err.is_timeout(),
                err.is_connect(),
                err.status()
            );
            ModelCallError(format!("Gemini request failed: {}", err_text))
        })?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let (message, body_summary) = summarize_error_body(&body);
        let body_summary = redact_api_key(&body_summary, api_key);
        warn!("Gemini API error: status={}, body={}", status, body_summary);
        let detail = message
            .map(|message| redact_api_key(&message, api_key))
            .unwrap_or(body_summary);
        return Err(ModelCallError(format!(
            "Gemini request failed with status {}: {}",
            status, detail
        )));
    }

    let value = response.json::<GeminiResponse>().await.map_err(|err| {
        ModelCallError(format!(
            "Gemini response could not be decoded: {}",
            redact_api_key(&err.to_string(), api_key)
        ))
    })?;
    if tracing::enabled!(tracing::Level::DEBUG) {
        let response_summary = summarize_response(&value);
        debug!(target: "llm.gemini", model = model, response = %response_summary);
    }
    Ok(value)
}

pub async fn generate_image_with_gemini(
    api_key: &str,
    prompt: &str,
    references: &[ReferenceImage],
    aspect_ratio: &str,
) -> Result<GeneratedImage, ModelCallError> {
    let image_config = GeminiImageConfig {
        aspect_ratio: Some(aspect_ratio.to_string()),
        image_size: Some(CONFIG.gemini_image_size.clone()),
    };
    let payload = json!({
        "contents": [{ "parts": build_generation_parts(prompt, references) }],
        "generationConfig": image_generation_config(&image_config),
    });

    let model = CONFIG.gemini_image_model.as_str();
    let metadata = json!({ "references": references.len(), "aspectRatio": aspect_ratio });
    log_model_timing("gemini", model, "generate", Some(metadata), || async {
        let response = call_gemini_api(api_key, model, payload).await?;
        extract_first_image(response).ok_or_else(|| {
            error!(model = model, "Gemini returned no image for generation");
            ModelCallError("No image data found in response.".to_string())
        })
    })
    .await
}

pub async fn edit_image_with_gemini(
    api_key: &str,
    source: &ReferenceImage,
    instructions: &str,
    references: &[ReferenceImage],
) -> Result<GeneratedImage, ModelCallError> {
    let image_config = GeminiImageConfig {
        aspect_ratio: None,
        image_size: Some(CONFIG.gemini_image_size.clone()),
    };
    let payload = json!({
        "contents": [{ "parts": build_edit_parts(source, instructions, references) }],
        "generationConfig": image_generation_config(&image_config),
    });

    let model = CONFIG.gemini_image_model.as_str();
    let metadata = json!({ "references": references.len() });
    log_model_timing("gemini", model, "edit", Some(metadata), || async {
        let response = call_gemini_api(api_key, model, payload).await?;
        extract_first_image(response)
            .ok_or_else(|| ModelCallError("No edited image data returned.".to_string()))
    })
    .await
}

pub async fn analyze_image_with_gemini(
    api_key: &str,
    image: &ReferenceImage,
) -> Result<String, ModelCallError> {
    let payload = json!({
        "contents": [{ "parts": [inline_part(image), { "text": ANALYZE_INSTRUCTION }] }],
    });

    let model = CONFIG.gemini_analysis_model.as_str();
    log_model_timing("gemini", model, "analyze", None, || async {
        let response = call_gemini_api(api_key, model, payload).await?;
        Ok(analysis_text(extract_text_from_response(response)))
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(parts: &[Value]) -> Vec<Option<&str>> {
        parts
            .iter()
            .map(|part| part.get("text").and_then(|value| value.as_str()))
            .collect()
    }

    #[test]
    fn generation_parts_label_each_subject_in_order() {
        let references = vec![
            ReferenceImage::new("QQ==", "image/png"),
            ReferenceImage::new("data:image/jpeg;base64,Qg==", "image/jpeg"),
        ];
        let parts = build_generation_parts("PROMPT", &references);
        assert_eq!(
            texts(&parts),
            vec![
                Some(CAST_LIST_LABEL),
                Some("[IMAGE FOR SUBJECT 1]:"),
                None,
                Some("[IMAGE FOR SUBJECT 2]:"),
                None,
                Some("PROMPT"),
            ]
        );
        assert_eq!(parts[2]["inlineData"]["data"], "QQ==");
        assert_eq!(parts[4]["inlineData"]["data"], "Qg==");
        assert_eq!(parts[4]["inlineData"]["mimeType"], "image/jpeg");
    }

    #[test]
    fn generation_without_references_sends_prompt_only() {
        let parts = build_generation_parts("PROMPT", &[]);
        assert_eq!(texts(&parts), vec![Some("PROMPT")]);
    }

    #[test]
    fn edit_parts_put_source_first_and_identities_last() {
        let source = ReferenceImage::new("U1JD", "image/png");
        let references = vec![ReferenceImage::new("UkVG", "image/png")];
        let parts = build_edit_parts(&source, "Add snow", &references);
        assert_eq!(parts[0]["inlineData"]["data"], "U1JD");
        assert_eq!(
            parts[1]["text"],
            "Edit this image based on the following instructions: Add snow"
        );
        assert_eq!(parts[2]["text"], EDIT_IDENTITY_INSTRUCTION);
        assert_eq!(parts[3]["inlineData"]["data"], "UkVG");

        let bare = build_edit_parts(&source, "Add snow", &[]);
        assert_eq!(bare.len(), 2);
    }

    #[test]
    fn image_config_omits_blank_fields() {
        let config = GeminiImageConfig {
            aspect_ratio: Some("3:4".to_string()),
            image_size: Some(" ".to_string()),
        };
        assert_eq!(
            image_generation_config(&config),
            json!({ "responseModalities": ["IMAGE"], "imageConfig": { "aspectRatio": "3:4" } })
        );
        assert_eq!(
            image_generation_config(&GeminiImageConfig::default()),
            json!({ "responseModalities": ["IMAGE"] })
        );
    }

    #[test]
    fn first_inline_image_is_returned() {
        let response: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "parts": [
                    { "text": "Here you go" },
                    { "inlineData": { "mimeType": "image/png", "data": "AAA=" } },
                    { "inlineData": { "mimeType": "image/png", "data": "BBB=" } }
                ]}
            }]
        }))
        .unwrap();
        let image = extract_first_image(response).unwrap();
        assert_eq!(image.data, "AAA=");
        assert_eq!(image.to_data_url(), "data:image/png;base64,AAA=");
    }

    #[test]
    fn text_only_response_has_no_image() {
        let response: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [{ "text": "I cannot do that" }] } }]
        }))
        .unwrap();
        assert!(extract_first_image(response).is_none());
    }

    #[test]
    fn empty_analysis_gets_placeholder_text() {
        let response: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [{ "text": "  " }] } }]
        }))
        .unwrap();
        assert_eq!(
            analysis_text(extract_text_from_response(response)),
            EMPTY_ANALYSIS_TEXT
        );

        let empty: GeminiResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(analysis_text(extract_text_from_response(empty)), EMPTY_ANALYSIS_TEXT);

        let described: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [
                { "text": "Warm fireplace scene." },
                { "text": "Red sweaters." }
            ] } }]
        }))
        .unwrap();
        assert_eq!(
            analysis_text(extract_text_from_response(described)),
            "Warm fireplace scene.\nRed sweaters."
        );
    }

    #[test]
    fn error_body_message_is_preferred() {
        let (message, _) = summarize_error_body(
            r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key."}}"#,
        );
        assert_eq!(
            message.as_deref(),
            Some("API key not valid. Please pass a valid API key.")
        );
        assert_eq!(summarize_error_body("  ").1, "empty response body");
    }

    #[test]
    fn api_key_is_redacted() {
        assert_eq!(
            redact_api_key("bad key AIza123 rejected", "AIza123"),
            "bad key [redacted] rejected"
        );
        assert_eq!(redact_api_key("unchanged", " "), "unchanged");
    }

    #[test]
    fn payload_summary_hides_image_data() {
        let payload = json!({
            "contents": [{ "parts": build_generation_parts("PROMPT", &[ReferenceImage::new("QUJDRA==", "image/png")]) }],
        });
        let summary = summarize_payload(&payload);
        assert_eq!(
            summary["contents"][0]["parts"][2],
            json!({ "inlineData": { "mimeType": "image/png", "dataLen": 8 } })
        );
    }
}
