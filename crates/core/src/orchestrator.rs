use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::warn;

use crate::error::{ExtractError, RankError};
use crate::extractor::CandidateExtractor;
use crate::guard;
use crate::keywords;
use crate::models::{
    CandidateIdentity, CandidateRecord, CvDocument, RankedBatch, SkillResponse, SkillSpec,
    WeightedSkillResponse,
};
use crate::scoring;

#[derive(Debug, Clone)]
pub struct RankingOptions {
    /// Upper bound on documents processed at once. Skills within one
    /// document always run sequentially, so this also caps in-flight model
    /// calls.
    pub max_concurrent_documents: usize,
    /// Extra attempts per skill call after a transport failure.
    pub skill_retries: u32,
    pub retry_backoff: Duration,
}

impl Default for RankingOptions {
    fn default() -> Self {
        Self {
            max_concurrent_documents: 4,
            skill_retries: 1,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

/// Drives the whole batch: per document, one identity call, one call per
/// configured skill, the hallucination guard, then scoring. Each document is
/// processed in isolation so one bad CV never aborts the batch.
pub struct RankingCoordinator<E> {
    extractor: Arc<E>,
    options: RankingOptions,
}

impl<E> RankingCoordinator<E>
where
    E: CandidateExtractor + Send + Sync + 'static,
{
    pub fn new(extractor: E) -> Self {
        Self::with_options(extractor, RankingOptions::default())
    }

    pub fn with_options(extractor: E, options: RankingOptions) -> Self {
        Self {
            extractor: Arc::new(extractor),
            options,
        }
    }

    /// Validates the positional skill/weight pairing before any model call
    /// is issued, then ranks.
    pub async fn rank_documents_positional(
        &self,
        documents: Vec<CvDocument>,
        skill_names: &[String],
        weights: &[i64],
    ) -> Result<RankedBatch, RankError> {
        let skills = SkillSpec::pair(skill_names, weights)?;
        self.rank_documents(documents, skills).await
    }

    pub async fn rank_documents(
        &self,
        documents: Vec<CvDocument>,
        skills: Vec<SkillSpec>,
    ) -> Result<RankedBatch, RankError> {
        let expressions = Arc::new(keywords::expression_pairs(&skills));
        let skills = Arc::new(skills);
        let semaphore = Arc::new(Semaphore::new(self.options.max_concurrent_documents.max(1)));

        let mut handles = Vec::with_capacity(documents.len());
        for document in documents {
            let extractor = Arc::clone(&self.extractor);
            let skills = Arc::clone(&skills);
            let expressions = Arc::clone(&expressions);
            let semaphore = Arc::clone(&semaphore);
            let options = self.options.clone();

            handles.push(tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                process_document(extractor.as_ref(), &document, &skills, &expressions, &options)
                    .await
            }));
        }

        let mut records = Vec::with_capacity(handles.len());
        for handle in handles {
            records.push(handle.await?);
        }

        Ok(scoring::rank(records))
    }
}

/// Processes one CV end to end. Infallible: every extraction failure is
/// converted into a neutral default so the document is still scored.
async fn process_document<E: CandidateExtractor>(
    extractor: &E,
    document: &CvDocument,
    skills: &[SkillSpec],
    expressions: &[(String, Vec<String>)],
    options: &RankingOptions,
) -> CandidateRecord {
    let identity = match extractor.extract_identity(document).await {
        Ok(identity) if !identity.name.trim().is_empty() => identity,
        Ok(nameless) => CandidateIdentity {
            name: CandidateIdentity::fallback_from_source(&document.source_path).name,
            ..nameless
        },
        Err(error) => {
            warn!(
                source = %document.source_path,
                %error,
                "identity extraction failed, using fallback identity"
            );
            CandidateIdentity::fallback_from_source(&document.source_path)
        }
    };

    let mut weighted = Vec::with_capacity(skills.len());
    for (spec, (_, variants)) in skills.iter().zip(expressions) {
        let response = match extract_skill_with_retry(extractor, document, &spec.name, options)
            .await
        {
            Ok(raw) => guard::verify(raw, &document.text, variants),
            Err(error) => {
                warn!(
                    source = %document.source_path,
                    skill = %spec.name,
                    %error,
                    "skill extraction failed, scoring skill as absent"
                );
                SkillResponse::absent(&spec.name)
            }
        };

        weighted.push(WeightedSkillResponse {
            response,
            weight: spec.weight,
        });
    }

    CandidateRecord::new(identity, weighted, document.source_path.clone())
}

async fn extract_skill_with_retry<E: CandidateExtractor>(
    extractor: &E,
    document: &CvDocument,
    skill: &str,
    options: &RankingOptions,
) -> Result<SkillResponse, ExtractError> {
    let mut attempt = 0u32;
    loop {
        match extractor.extract_skill(document, skill).await {
            Ok(response) => return Ok(response),
            Err(error) if error.is_transient() && attempt < options.skill_retries => {
                attempt += 1;
                warn!(skill, %error, attempt, "transient skill extraction failure, retrying");
                tokio::time::sleep(options.retry_backoff).await;
            }
            Err(error) => return Err(error),
        }
    }
}
