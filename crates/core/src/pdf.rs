use base64::{engine::general_purpose::STANDARD, Engine};
use lopdf::Document;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::IngestError;

#[derive(Debug, Clone, Serialize)]
struct OcrRequest {
    pdf_base64: String,
    source_path: String,
}

#[derive(Debug, Clone, Deserialize)]
struct OcrResponse {
    extracted_text: Option<String>,
}

#[derive(Debug, Clone)]
struct OcrEndpointConfig {
    endpoint: String,
    api_key: Option<String>,
}

pub trait PdfTextExtractor {
    fn extract_text(&self, path: &Path) -> Result<String, IngestError>;
}

/// Text-layer extraction via lopdf. CVs produced from scans have no text
/// layer and fail here, which routes them to the OCR fallback.
#[derive(Default)]
pub struct LopdfExtractor;

impl PdfTextExtractor for LopdfExtractor {
    fn extract_text(&self, path: &Path) -> Result<String, IngestError> {
        let document =
            Document::load(path).map_err(|error| IngestError::PdfParse(error.to_string()))?;

        let mut text = String::new();
        for (page_no, _page_id) in document.get_pages() {
            let page_text = document
                .extract_text(&[page_no])
                .map_err(|error| IngestError::PdfParse(error.to_string()))?;
            text.push_str(&page_text);
        }

        if text.trim().is_empty() {
            return Err(IngestError::PdfParse(format!(
                "pdf has no readable text layer: {}",
                path.display()
            )));
        }

        Ok(text)
    }
}

/// Extracts the full text of one CV, falling back to a remote OCR service
/// (configured via CV_OCR_ENDPOINT / CV_OCR_API_KEY) when the text layer is
/// missing or unreadable.
pub fn extract_document_text(path: &Path) -> Result<String, IngestError> {
    match LopdfExtractor.extract_text(path) {
        Ok(text) => Ok(text),
        Err(IngestError::PdfParse(parse_error)) => match extract_with_remote_ocr(path) {
            Ok(Some(text)) => Ok(text),
            Ok(None) => Err(IngestError::PdfParse(parse_error)),
            Err(ocr_error) => Err(IngestError::PdfParse(format!(
                "{parse_error}; remote OCR fallback failed: {ocr_error}"
            ))),
        },
        Err(error) => Err(error),
    }
}

fn parse_ocr_config() -> Option<OcrEndpointConfig> {
    let endpoint = std::env::var("CV_OCR_ENDPOINT").ok()?;
    let endpoint = endpoint.trim().to_string();
    if endpoint.is_empty() {
        return None;
    }

    let api_key = std::env::var("CV_OCR_API_KEY").ok().and_then(|value| {
        let key = value.trim().to_string();
        if key.is_empty() {
            None
        } else {
            Some(key)
        }
    });

    Some(OcrEndpointConfig { endpoint, api_key })
}

fn extract_with_remote_ocr(path: &Path) -> Result<Option<String>, IngestError> {
    let config = match parse_ocr_config() {
        Some(config) => config,
        None => return Ok(None),
    };

    tokio::task::block_in_place(|| ocr_request_blocking(&config, path)).map(Some)
}

fn ocr_request_blocking(config: &OcrEndpointConfig, path: &Path) -> Result<String, IngestError> {
    let pdf = std::fs::read(path).map_err(IngestError::Io)?;
    let payload = OcrRequest {
        pdf_base64: STANDARD.encode(pdf),
        source_path: path.to_string_lossy().to_string(),
    };

    let mut request = Client::new()
        .post(&config.endpoint)
        .header("content-type", "application/json")
        .json(&payload);

    if let Some(api_key) = &config.api_key {
        request = request.bearer_auth(api_key);
    }

    let response = request.send()?;

    if !response.status().is_success() {
        return Err(IngestError::OcrFailed(format!(
            "OCR request to {} returned {}",
            config.endpoint,
            response.status()
        )));
    }

    let payload: OcrResponse = response.json()?;
    text_from_ocr_response(&payload, path)
}

fn text_from_ocr_response(payload: &OcrResponse, path: &Path) -> Result<String, IngestError> {
    match &payload.extracted_text {
        Some(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
        _ => Err(IngestError::OcrFailed(format!(
            "OCR response has no readable text: {}",
            path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::{text_from_ocr_response, LopdfExtractor, OcrResponse, PdfTextExtractor};
    use std::path::Path;

    #[test]
    fn ocr_response_with_text_is_trimmed() {
        let response = OcrResponse {
            extracted_text: Some("  John Doe\nPHP developer \n".to_string()),
        };

        let text = text_from_ocr_response(&response, Path::new("cv.pdf"))
            .expect("response has text");
        assert_eq!(text, "John Doe\nPHP developer");
    }

    #[test]
    fn empty_ocr_response_is_rejected() {
        let response = OcrResponse {
            extracted_text: Some("   ".to_string()),
        };
        assert!(text_from_ocr_response(&response, Path::new("cv.pdf")).is_err());

        let response = OcrResponse {
            extracted_text: None,
        };
        assert!(text_from_ocr_response(&response, Path::new("cv.pdf")).is_err());
    }

    #[test]
    fn broken_pdf_is_a_parse_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"%PDF-1.4\n%broken").expect("write");

        assert!(LopdfExtractor.extract_text(&path).is_err());
    }
}
