use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::RankError;
use crate::scoring;

/// One ingested CV. Immutable once produced by ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvDocument {
    pub text: String,
    pub source_path: String,
    pub checksum: String,
    pub ingested_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SkillSpec {
    pub name: String,
    pub weight: i64,
}

impl SkillSpec {
    /// Pairs positional skill and weight lists. Unequal lengths are a
    /// configuration error and must be rejected before any model call.
    pub fn pair(names: &[String], weights: &[i64]) -> Result<Vec<SkillSpec>, RankError> {
        if names.len() != weights.len() {
            return Err(RankError::ConfigurationMismatch {
                skills: names.len(),
                weights: weights.len(),
            });
        }

        Ok(names
            .iter()
            .zip(weights)
            .map(|(name, weight)| SkillSpec {
                name: name.clone(),
                weight: *weight,
            })
            .collect())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Female,
    Male,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CandidateIdentity {
    pub name: String,
    pub email: String,
    pub age: i64,
    pub gender: Gender,
}

impl CandidateIdentity {
    /// Placeholder identity derived from the source filename, used when
    /// identity extraction fails so downstream code never misses a name.
    pub fn fallback_from_source(source_path: &str) -> Self {
        let stem = Path::new(source_path)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("candidate");

        let name = stem
            .split(|character: char| !character.is_alphabetic())
            .filter(|part| !part.is_empty())
            .map(capitalize)
            .collect::<Vec<_>>()
            .join(" ");

        Self {
            name: if name.is_empty() {
                "Unknown candidate".to_string()
            } else {
                name
            },
            email: String::new(),
            age: 0,
            gender: Gender::Unknown,
        }
    }
}

fn capitalize(part: &str) -> String {
    let mut chars = part.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

/// Verified answer for one (document, skill) question.
///
/// Invariants: `has_skill == false` implies `years == 0`; a hallucination-guard
/// miss forces both to `(false, 0)`; `has_skill == true` with `years == 0`
/// normalizes to `years == 1` (present, duration unknown).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SkillResponse {
    pub skill: String,
    pub has_skill: bool,
    pub years: i64,
}

impl SkillResponse {
    pub fn absent(skill: &str) -> Self {
        Self {
            skill: skill.to_string(),
            has_skill: false,
            years: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WeightedSkillResponse {
    pub response: SkillResponse,
    pub weight: i64,
}

/// Fully processed candidate. The score is computed once at construction and
/// frozen afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateRecord {
    pub identity: CandidateIdentity,
    pub skills: Vec<WeightedSkillResponse>,
    pub source_path: String,
    score: i64,
}

impl CandidateRecord {
    pub fn new(
        identity: CandidateIdentity,
        skills: Vec<WeightedSkillResponse>,
        source_path: String,
    ) -> Self {
        let score = scoring::score(&skills);
        Self {
            identity,
            skills,
            source_path,
            score,
        }
    }

    pub fn score(&self) -> i64 {
        self.score
    }
}

/// Candidate records sorted descending by score, stable for ties.
#[derive(Debug, Clone, Serialize)]
pub struct RankedBatch {
    pub records: Vec<CandidateRecord>,
}

impl RankedBatch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
