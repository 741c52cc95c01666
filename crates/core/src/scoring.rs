use std::cmp::Reverse;

use crate::models::{CandidateRecord, RankedBatch, WeightedSkillResponse};

/// Weighted score over already-verified skill responses:
/// years * weight for each claimed skill, zero otherwise.
pub fn score(skills: &[WeightedSkillResponse]) -> i64 {
    skills
        .iter()
        .map(|weighted| {
            if weighted.response.has_skill {
                weighted.response.years * weighted.weight
            } else {
                0
            }
        })
        .sum()
}

/// Sorts candidates descending by score. The sort is stable, so candidates
/// with equal scores keep their original input order.
pub fn rank(records: Vec<CandidateRecord>) -> RankedBatch {
    let mut records = records;
    records.sort_by_key(|record| Reverse(record.score()));
    RankedBatch { records }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CandidateIdentity, SkillResponse};

    fn weighted(skill: &str, has_skill: bool, years: i64, weight: i64) -> WeightedSkillResponse {
        WeightedSkillResponse {
            response: SkillResponse {
                skill: skill.to_string(),
                has_skill,
                years,
            },
            weight,
        }
    }

    fn record(source: &str, skills: Vec<WeightedSkillResponse>) -> CandidateRecord {
        CandidateRecord::new(
            CandidateIdentity::fallback_from_source(source),
            skills,
            source.to_string(),
        )
    }

    #[test]
    fn score_sums_years_times_weight_for_claimed_skills() {
        let skills = vec![
            weighted("Wordpress", true, 2, 3),
            weighted("PHP", true, 4, 2),
            weighted("CSS", false, 0, 1),
        ];

        assert_eq!(score(&skills), 14);
    }

    #[test]
    fn unclaimed_skills_contribute_zero_regardless_of_years() {
        let skills = vec![weighted("PHP", false, 9, 5)];
        assert_eq!(score(&skills), 0);
    }

    #[test]
    fn empty_skill_list_scores_zero() {
        assert_eq!(score(&[]), 0);
    }

    #[test]
    fn ranking_is_descending_by_score() {
        let low = record("low.pdf", vec![weighted("CSS", true, 1, 1)]);
        let high = record("high.pdf", vec![weighted("PHP", true, 4, 2)]);

        let batch = rank(vec![low, high]);
        assert_eq!(batch.records[0].source_path, "high.pdf");
        assert_eq!(batch.records[1].source_path, "low.pdf");
    }

    #[test]
    fn equal_scores_preserve_input_order() {
        let first = record("first.pdf", vec![weighted("PHP", true, 2, 1)]);
        let second = record("second.pdf", vec![weighted("CSS", true, 1, 2)]);
        let third = record("third.pdf", vec![weighted("Rust", true, 2, 1)]);

        let batch = rank(vec![first, second, third]);
        assert_eq!(batch.records[0].source_path, "first.pdf");
        assert_eq!(batch.records[1].source_path, "second.pdf");
        assert_eq!(batch.records[2].source_path, "third.pdf");
    }
}
