pub mod config;
pub mod error;
pub mod extractor;
pub mod guard;
pub mod ingest;
pub mod keywords;
pub mod models;
pub mod orchestrator;
pub mod pdf;
pub mod scoring;

pub use config::{RankerConfig, DEFAULT_API_BASE, DEFAULT_MODEL, DEFAULT_REQUEST_TIMEOUT};
pub use error::{ExtractError, IngestError, RankError};
pub use extractor::{CandidateExtractor, OpenAiExtractor};
pub use guard::{skill_present, verify};
pub use ingest::{digest_file, discover_cv_files, ingest_folder, IngestionReport, SkippedCv};
pub use keywords::{expression_pairs, extract_expressions};
pub use models::{
    CandidateIdentity, CandidateRecord, CvDocument, Gender, RankedBatch, SkillResponse, SkillSpec,
    WeightedSkillResponse,
};
pub use orchestrator::{RankingCoordinator, RankingOptions};
pub use pdf::{extract_document_text, LopdfExtractor, PdfTextExtractor};
pub use scoring::{rank, score};
