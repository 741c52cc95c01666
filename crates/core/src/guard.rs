use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::models::SkillResponse;

/// Whole-word, case-insensitive check for any keyword variant in the raw
/// document text. Pure predicate; this is the deterministic override
/// authority over the model's own claim that a skill is present.
pub fn skill_present(text: &str, keywords: &[String]) -> bool {
    keywords
        .iter()
        .filter(|keyword| !keyword.trim().is_empty())
        .any(|keyword| match whole_word_pattern(keyword) {
            Ok(pattern) => pattern.is_match(text),
            Err(_) => false,
        })
}

fn whole_word_pattern(keyword: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(&format!(r"\b{}\b", regex::escape(keyword.trim())))
        .case_insensitive(true)
        .build()
}

/// Applies the hallucination veto and the minimum-year normalization to a
/// raw model answer.
///
/// No keyword match in the text forces `(false, 0)` regardless of the model
/// output. When the guard passes and the model claims the skill with zero
/// years, the duration is normalized to one year.
pub fn verify(raw: SkillResponse, text: &str, keywords: &[String]) -> SkillResponse {
    if !skill_present(text, keywords) {
        debug!(skill = %raw.skill, ?keywords, "no keyword match in text, vetoing model claim");
        return SkillResponse::absent(&raw.skill);
    }

    let mut verified = raw;
    verified.years = verified.years.max(0);
    if verified.has_skill && verified.years == 0 {
        verified.years = 1;
    }
    if !verified.has_skill {
        verified.years = 0;
    }
    verified
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keywords(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert!(skill_present(
            "Five years working with wordpress themes",
            &keywords(&["Wordpress"])
        ));
    }

    #[test]
    fn substrings_inside_longer_words_do_not_match() {
        assert!(!skill_present("CSSomething else entirely", &keywords(&["CSS"])));
        assert!(skill_present("HTML and CSS, plus tooling", &keywords(&["CSS"])));
    }

    #[test]
    fn any_variant_matching_is_enough() {
        assert!(skill_present(
            "built plugins in PHP for years",
            &keywords(&["Wordpress", "PHP"])
        ));
    }

    #[test]
    fn absent_keyword_does_not_match() {
        assert!(!skill_present(
            "Figma and Adobe XD prototyping",
            &keywords(&["Rust"])
        ));
    }

    #[test]
    fn empty_keywords_never_match() {
        assert!(!skill_present("anything at all", &keywords(&["", "  "])));
    }

    #[test]
    fn veto_overrides_model_claim() {
        let raw = SkillResponse {
            skill: "Rust".to_string(),
            has_skill: true,
            years: 5,
        };

        let verified = verify(raw, "PHP developer since 2012", &keywords(&["Rust"]));
        assert!(!verified.has_skill);
        assert_eq!(verified.years, 0);
    }

    #[test]
    fn zero_years_with_skill_normalizes_to_one() {
        let raw = SkillResponse {
            skill: "PHP".to_string(),
            has_skill: true,
            years: 0,
        };

        let verified = verify(raw, "solid PHP background", &keywords(&["PHP"]));
        assert!(verified.has_skill);
        assert_eq!(verified.years, 1);
    }

    #[test]
    fn has_skill_false_zeroes_years() {
        let raw = SkillResponse {
            skill: "PHP".to_string(),
            has_skill: false,
            years: 7,
        };

        let verified = verify(raw, "mentions PHP once", &keywords(&["PHP"]));
        assert!(!verified.has_skill);
        assert_eq!(verified.years, 0);
    }

    #[test]
    fn negative_years_are_clamped() {
        let raw = SkillResponse {
            skill: "PHP".to_string(),
            has_skill: true,
            years: -3,
        };

        let verified = verify(raw, "PHP everywhere", &keywords(&["PHP"]));
        assert_eq!(verified.years, 1);
    }
}
