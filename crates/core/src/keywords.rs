use crate::models::SkillSpec;

/// Filler words that carry no signal when looking for a literal skill
/// mention in CV prose ("Programming in PHP" -> "PHP").
const FILLER_WORDS: &[&str] = &[
    "a", "an", "and", "development", "developer", "experience", "framework", "in", "knowledge",
    "language", "of", "programming", "skill", "skills", "the", "using", "with",
];

/// Derives the literal keyword variants expected to appear verbatim in a CV
/// when a skill is genuinely present. Pure and deterministic; never returns
/// an empty set (falls back to the skill string itself).
pub fn extract_expressions(skill: &str) -> Vec<String> {
    let salient: Vec<&str> = skill
        .split_whitespace()
        .filter(|token| {
            let lowered = token.to_lowercase();
            !FILLER_WORDS.iter().any(|filler| *filler == lowered)
        })
        .collect();

    if salient.is_empty() {
        return vec![skill.trim().to_string()];
    }

    let mut expressions = vec![salient.join(" ")];
    if salient.len() > 1 {
        for token in &salient {
            push_unique(&mut expressions, token);
        }
    }

    expressions
}

/// Precomputes (skill, keyword variants) pairs for a batch, so expression
/// extraction runs once per configured skill rather than once per document.
pub fn expression_pairs(skills: &[SkillSpec]) -> Vec<(String, Vec<String>)> {
    skills
        .iter()
        .map(|spec| (spec.name.clone(), extract_expressions(&spec.name)))
        .collect()
}

fn push_unique(expressions: &mut Vec<String>, candidate: &str) {
    let exists = expressions
        .iter()
        .any(|existing| existing.eq_ignore_ascii_case(candidate));
    if !exists {
        expressions.push(candidate.to_string());
    }
}
