use chrono::Utc;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

use crate::error::IngestError;
use crate::models::CvDocument;
use crate::pdf::extract_document_text;

/// Finds PDF files under a folder, optionally keeping only those whose file
/// stem contains the filter substring. Sorted for deterministic batch order.
pub fn discover_cv_files(folder: &Path, filter: Option<&str>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let is_pdf = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

        if !is_pdf {
            continue;
        }

        let stem_matches = match filter {
            None => true,
            Some(needle) => entry
                .path()
                .file_stem()
                .and_then(|stem| stem.to_str())
                .is_some_and(|stem| stem.contains(needle)),
        };

        if stem_matches {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

pub fn digest_file(path: &Path) -> Result<String, IngestError> {
    let bytes = fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

pub struct SkippedCv {
    pub path: PathBuf,
    pub reason: String,
}

pub struct IngestionReport {
    pub documents: Vec<CvDocument>,
    pub skipped_files: Vec<SkippedCv>,
}

/// Best-effort ingestion of a CV folder: one CvDocument per readable PDF.
/// A file that cannot be read or parsed is skipped with a reason and never
/// aborts the batch.
pub fn ingest_folder(folder: &Path, filter: Option<&str>) -> Result<IngestionReport, IngestError> {
    let files = discover_cv_files(folder, filter);

    if files.is_empty() {
        return Err(IngestError::InvalidArgument(format!(
            "no pdf files found in {}",
            folder.display()
        )));
    }

    let mut documents = Vec::new();
    let mut skipped_files = Vec::new();

    for path in files {
        match build_document(&path) {
            Ok(document) => documents.push(document),
            Err(error) => {
                warn!(path = %path.display(), %error, "skipping unreadable cv");
                skipped_files.push(SkippedCv {
                    path,
                    reason: error.to_string(),
                });
            }
        }
    }

    Ok(IngestionReport {
        documents,
        skipped_files,
    })
}

fn build_document(path: &Path) -> Result<CvDocument, IngestError> {
    path.file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            IngestError::MissingFileName(format!("path missing filename: {}", path.display()))
        })?;

    let checksum = digest_file(path)?;
    let text = extract_document_text(path)?;

    Ok(CvDocument {
        text,
        source_path: path.to_string_lossy().to_string(),
        checksum,
        ingested_at: Utc::now(),
    })
}
