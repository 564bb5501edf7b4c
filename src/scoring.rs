//! Five-layer scoring engine: a hard-exclusion veto (L1) plus four weighted
//! positive signals (L2-L5) combined into one `weighted_total` per skill.

use crate::language::Language;
use crate::model::{Index, LangSet, ScoreRecord, SkillDescriptor};
use lazy_static::lazy_static;
use rayon::prelude::*;
use regex::RegexBuilder;
use std::collections::HashSet;

/// Formula constants, kept in one place so every coefficient in the
/// weighted-total formula traces back to a single definition site.
pub struct Weights;

impl Weights {
    pub const L2_BASE: f64 = 40.0;
    pub const L2_STEP: f64 = 15.0;
    pub const L3_BASE: f64 = 50.0;
    pub const L3_STEP: f64 = 35.0;
    pub const W_L2: f64 = 0.40;
    pub const W_L3: f64 = 0.35;
    pub const W_L4: f64 = 0.15;
    pub const W_L5: f64 = 0.10;
}

lazy_static! {
    /// Closed stop-word set for L5 description-overlap scoring, covering
    /// common function words in both languages. Not exhaustive by design —
    /// the spec only requires it be small, closed, and stable.
    static ref STOPWORDS: HashSet<&'static str> = [
        "a", "an", "the", "is", "are", "to", "of", "for", "in", "on", "and",
        "or", "with", "this", "that", "it", "be", "as", "at", "by", "from",
        "的", "了", "和", "是", "在", "我", "你", "这", "那", "也", "就",
    ]
    .into_iter()
    .collect();
}

/// An ASCII alphanumeric byte is a "word" byte; anything else (punctuation,
/// whitespace, or a UTF-8 continuation byte of a multi-byte character) is
/// treated as a boundary.
fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric()
}

fn is_word_boundary_match(haystack: &str, start: usize, len: usize) -> bool {
    let before_ok = start == 0 || !is_word_byte(haystack.as_bytes()[start - 1]);
    let end = start + len;
    let after_ok = end >= haystack.len() || !is_word_byte(haystack.as_bytes()[end]);
    before_ok && after_ok
}

/// Does `needle` occur at least once in `haystack`, honoring the
/// English word-boundary rule or the Chinese plain-substring rule?
fn literal_match(haystack: &str, needle: &str, chinese: bool) -> bool {
    if needle.is_empty() {
        return false;
    }
    if chinese {
        haystack.contains(needle)
    } else {
        haystack
            .match_indices(needle)
            .any(|(idx, _)| is_word_boundary_match(haystack, idx, needle.len()))
    }
}

/// Total (non-distinct) occurrence count of `needle` in `haystack`, used
/// only by the L1 single-word-negative rule.
fn literal_occurrences(haystack: &str, needle: &str, chinese: bool) -> usize {
    if needle.is_empty() {
        return 0;
    }
    if chinese {
        haystack.matches(needle).count()
    } else {
        haystack
            .match_indices(needle)
            .filter(|(idx, _)| is_word_boundary_match(haystack, *idx, needle.len()))
            .count()
    }
}

/// Count of distinct phrases in `phrases` that match at least once.
fn distinct_hit_count(haystack_lower: &str, phrases: &[String], chinese: bool) -> usize {
    phrases
        .iter()
        .filter(|p| literal_match(haystack_lower, &p.to_lowercase(), chinese))
        .count()
}

/// Language-gated signal combination: `en` consults only English,
/// `zh` consults Chinese and falls back to English only if Chinese scored
/// zero hits, `both` sums the two. Used identically by L2's trigger
/// keywords and L1's negative-keyword gating.
fn gated_signal(language: Language, en_hits: usize, zh_hits: usize) -> usize {
    match language {
        Language::En => en_hits,
        Language::Zh => {
            if zh_hits > 0 {
                zh_hits
            } else {
                en_hits
            }
        }
        Language::Both => en_hits + zh_hits,
    }
}

/// L1 — negative-keyword hard exclusion. See spec: any multi-word negative
/// match excludes outright; single-word negatives need two total
/// occurrences (summed across all single-word negatives) to exclude.
fn is_excluded(prompt_lower: &str, language: Language, negatives: &LangSet) -> bool {
    let zh_any_hit = negatives
        .zh
        .iter()
        .any(|p| literal_match(prompt_lower, &p.to_lowercase(), true));

    // Same language-gating as L2: which list(s) are "active" for L1.
    let mut active: Vec<(&str, bool)> = Vec::new();
    match language {
        Language::En => {
            active.extend(negatives.en.iter().map(|p| (p.as_str(), false)));
        }
        Language::Zh => {
            if zh_any_hit {
                active.extend(negatives.zh.iter().map(|p| (p.as_str(), true)));
            } else {
                active.extend(negatives.en.iter().map(|p| (p.as_str(), false)));
            }
        }
        Language::Both => {
            active.extend(negatives.en.iter().map(|p| (p.as_str(), false)));
            active.extend(negatives.zh.iter().map(|p| (p.as_str(), true)));
        }
    }

    let mut single_word_occurrences = 0usize;
    for (phrase, chinese) in active {
        let phrase_lower = phrase.to_lowercase();
        let token_count = phrase_lower.split_whitespace().count();
        if token_count >= 2 {
            if literal_match(prompt_lower, &phrase_lower, chinese) {
                return true;
            }
        } else {
            single_word_occurrences += literal_occurrences(prompt_lower, &phrase_lower, chinese);
        }
    }

    single_word_occurrences >= 2
}

/// L2 — trigger-keyword scoring.
fn score_level2(prompt_lower: &str, language: Language, triggers: &LangSet) -> f64 {
    let en_hits = distinct_hit_count(prompt_lower, &triggers.en, false);
    let zh_hits = distinct_hit_count(prompt_lower, &triggers.zh, true);
    let h = gated_signal(language, en_hits, zh_hits);
    if h == 0 {
        0.0
    } else {
        (Weights::L2_BASE + Weights::L2_STEP * (h as f64 - 1.0)).min(100.0)
    }
}

/// L3 — intent-pattern scoring. Patterns are compiled case-insensitively
/// per invocation; the process is short-lived so there's no benefit to a
/// persistent regex cache.
fn score_level3(prompt: &str, language: Language, patterns: &LangSet) -> f64 {
    let count_hits = |list: &[String]| -> usize {
        list.iter()
            .filter(|src| {
                RegexBuilder::new(src)
                    .case_insensitive(true)
                    .build()
                    .map(|re| re.is_match(prompt))
                    .unwrap_or(false)
            })
            .count()
    };

    let en_hits = count_hits(&patterns.en);
    let zh_hits = count_hits(&patterns.zh);
    let h = gated_signal(language, en_hits, zh_hits);
    if h == 0 {
        0.0
    } else {
        (Weights::L3_BASE + Weights::L3_STEP * (h as f64 - 1.0)).min(100.0)
    }
}

/// Tokenize by splitting on non-alphanumeric characters, lowercased,
/// collapsed to a distinct set. Always language-agnostic (L4/L5 never
/// gate by detected language).
fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// L4 — tag-set overlap ratio.
fn score_level4(prompt_tokens: &HashSet<String>, tags: &HashSet<String>) -> f64 {
    if tags.is_empty() {
        return 0.0;
    }
    let overlap = prompt_tokens.intersection(tags).count();
    (100.0 * overlap as f64 / tags.len().max(1) as f64).min(100.0)
}

/// L5 — description-token overlap ratio, stop-words removed from the
/// description side.
fn score_level5(prompt_tokens: &HashSet<String>, short_description: &str) -> f64 {
    let description_tokens: HashSet<String> = tokenize(short_description)
        .into_iter()
        .filter(|t| !STOPWORDS.contains(t.as_str()))
        .collect();
    if description_tokens.is_empty() {
        return 0.0;
    }
    let overlap = prompt_tokens.intersection(&description_tokens).count();
    (100.0 * overlap as f64 / description_tokens.len().max(1) as f64).min(100.0)
}

/// Score a single skill against a prompt already classified by `language`.
pub fn score_skill(prompt: &str, language: Language, descriptor: &SkillDescriptor) -> ScoreRecord {
    let prompt_lower = prompt.to_lowercase();

    if is_excluded(&prompt_lower, language, &descriptor.negative_keywords) {
        return ScoreRecord {
            skill_id: descriptor.id.clone(),
            level2: 0.0,
            level3: 0.0,
            level4: 0.0,
            level5: 0.0,
            excluded: true,
            weighted_total: 0.0,
        };
    }

    let level2 = score_level2(&prompt_lower, language, &descriptor.trigger_keywords);
    let level3 = score_level3(prompt, language, &descriptor.intent_patterns);

    let prompt_tokens = tokenize(prompt);
    let level4 = score_level4(&prompt_tokens, &descriptor.tags);
    let level5 = score_level5(&prompt_tokens, &descriptor.short_description);

    let weighted_total = Weights::W_L2 * level2
        + Weights::W_L3 * level3
        + Weights::W_L4 * level4
        + Weights::W_L5 * level5;

    ScoreRecord {
        skill_id: descriptor.id.clone(),
        level2,
        level3,
        level4,
        level5,
        excluded: false,
        weighted_total,
    }
}

/// Score every skill in the index against one prompt. Independent
/// per-skill work, fanned out with `rayon` so the process has headroom as
/// the registry grows toward its ~100-skill ceiling.
pub fn score_index(index: &Index, prompt: &str, language: Language) -> Vec<ScoreRecord> {
    index
        .skills
        .par_iter()
        .map(|descriptor| score_skill(prompt, language, descriptor))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet as Set;

    fn descriptor(
        id: &str,
        triggers_en: &[&str],
        triggers_zh: &[&str],
        negatives_en: &[&str],
        tags: &[&str],
        short_description: &str,
    ) -> SkillDescriptor {
        SkillDescriptor {
            id: id.to_string(),
            name: id.to_string(),
            category: "coding".to_string(),
            short_description: short_description.to_string(),
            tags: tags.iter().map(|s| s.to_string()).collect(),
            trigger_keywords: LangSet {
                en: triggers_en.iter().map(|s| s.to_string()).collect(),
                zh: triggers_zh.iter().map(|s| s.to_string()).collect(),
            },
            intent_patterns: LangSet::default(),
            negative_keywords: LangSet {
                en: negatives_en.iter().map(|s| s.to_string()).collect(),
                zh: Vec::new(),
            },
            body_path: format!("{id}.md"),
            body_hash: "hash".to_string(),
        }
    }

    #[test]
    fn word_boundary_does_not_match_substring() {
        assert!(!literal_match("authentication required", "auth", false));
        assert!(literal_match("auth required", "auth", false));
    }

    #[test]
    fn chinese_match_is_plain_substring() {
        assert!(literal_match("帮我审查一下代码", "审查", true));
    }

    #[test]
    fn level2_scoring_curve() {
        let prompt = "code review pull request".to_lowercase();
        let triggers = LangSet {
            en: vec!["code review".to_string(), "pull request".to_string()],
            zh: Vec::new(),
        };
        let score = score_level2(&prompt, Language::En, &triggers);
        assert_eq!(score, 55.0); // 2 hits: 40 + 15
    }

    #[test]
    fn negative_keyword_multiword_excludes_immediately() {
        let d = descriptor(
            "auth-hardening",
            &["2fa", "harden"],
            &[],
            &["authentication method"],
            &[],
            "",
        );
        let record = score_skill("add 2fa to harden our authentication method", Language::En, &d);
        assert!(record.excluded);
    }

    #[test]
    fn negative_keyword_single_word_needs_two_hits() {
        let d = descriptor("auth-hardening", &["2fa"], &[], &["auth"], &[], "");
        let one_hit = score_skill("add 2fa to harden our auth setup", Language::En, &d);
        assert!(!one_hit.excluded);

        let two_hits = score_skill("auth auth everywhere, add 2fa", Language::En, &d);
        assert!(two_hits.excluded);
    }

    #[test]
    fn tag_overlap_is_capped_and_ratio_based() {
        let tags: Set<String> = ["testing", "tdd"].iter().map(|s| s.to_string()).collect();
        let prompt_tokens: Set<String> = ["write", "tests", "testing"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let score = score_level4(&prompt_tokens, &tags);
        assert_eq!(score, 50.0);
    }

    #[test]
    fn zh_falls_back_to_english_when_no_chinese_hits() {
        let d = descriptor("code-review", &["code review"], &["代码审查"], &[], &[], "");
        // Prompt has Chinese characters but none are the trigger phrase,
        // so detection is Zh but L2 falls back to the English trigger.
        let record = score_skill("请帮忙做 code review 谢谢", Language::Zh, &d);
        assert!(record.level2 > 0.0);
    }
}
