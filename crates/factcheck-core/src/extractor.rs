//! Claim and entity extraction
//!
//! Pattern-based extraction tuned for government press releases. The engine
//! only needs the [`ClaimExtractor`] contract; [`RuleBasedExtractor`] is the
//! default implementation.

use lazy_static::lazy_static;
use regex::Regex;

use crate::document::Entity;

pub const LABEL_ORG: &str = "ORG";
pub const LABEL_DATE: &str = "DATE";
pub const LABEL_MONEY: &str = "MONEY";
pub const LABEL_GPE: &str = "GPE";

/// Minimum words for a sentence to count as a claim
const MIN_CLAIM_WORDS: usize = 4;

/// Splits input text into checkable claims and tags entities
pub trait ClaimExtractor: Send + Sync {
    /// Candidate claims in order of appearance. Empty input yields none.
    fn extract_claims(&self, text: &str) -> Vec<String>;

    /// Advisory entity annotations
    fn extract_entities(&self, text: &str) -> Vec<Entity>;

    /// Get the name of this extractor
    fn name(&self) -> &str;
}

lazy_static! {
    static ref FACTUAL_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)\b(announced|declared|stated|confirmed|revealed|launched|introduced)\b").unwrap(),
        Regex::new(r"(?i)\b(will|shall|going to)\b").unwrap(),
        Regex::new(r"(?i)\b(government|minister|official|department)\b").unwrap(),
        Regex::new(r"\d{4}").unwrap(),
        Regex::new(r"(?i)\b(scheme|policy|program|initiative)\b").unwrap(),
    ];

    static ref NON_FACTUAL_PATTERNS: Vec<Regex> = vec![
        // Questions and exclamations
        Regex::new(r"^\s*[?!]").unwrap(),
        Regex::new(r"\?\s*$").unwrap(),
        // Opinions
        Regex::new(r"(?i)\b(I think|I believe|in my opinion|probably|maybe)\b").unwrap(),
    ];

    static ref ORG_PATTERN: Regex = Regex::new(
        r"\b(?:Ministry|Department|Government|Commission|Authority|Board|Bank|Corporation) of (?:the )?[A-Z][\w&]*(?: (?:and |& )?[A-Z][\w&]*)*"
    ).unwrap();

    /// All-caps acronyms such as SAIL or ISRO
    static ref ACRONYM_PATTERN: Regex = Regex::new(r"\b[A-Z]{3,}\b").unwrap();

    static ref MONTH_DATE_PATTERN: Regex = Regex::new(
        r"(?i)\b(?:January|February|March|April|May|June|July|August|September|October|November|December)(?: \d{1,2},?)? \d{4}\b"
    ).unwrap();

    static ref YEAR_PATTERN: Regex = Regex::new(r"\b(?:19|20)\d{2}\b").unwrap();

    static ref MONEY_PATTERN: Regex = Regex::new(
        r"(?i)(?:\bRs\.?|₹|\bINR)\s?\d[\d,]*(?:\.\d+)?(?:\s?(?:lakh|crore|million|billion)s?\b)?"
    ).unwrap();

    static ref GPE_PATTERN: Regex = {
        let places = [
            "India", "Andhra Pradesh", "Arunachal Pradesh", "Assam", "Bihar", "Chhattisgarh",
            "Goa", "Gujarat", "Haryana", "Himachal Pradesh", "Jharkhand", "Karnataka",
            "Kerala", "Madhya Pradesh", "Maharashtra", "Manipur", "Meghalaya", "Mizoram",
            "Nagaland", "Odisha", "Punjab", "Rajasthan", "Sikkim", "Tamil Nadu", "Telangana",
            "Tripura", "Uttar Pradesh", "Uttarakhand", "West Bengal", "Jammu and Kashmir",
            "Ladakh", "Delhi", "New Delhi", "Mumbai", "Kolkata", "Chennai", "Bengaluru",
            "Hyderabad", "Ahmedabad", "Pune", "Lucknow", "Jaipur", "Bhopal", "Patna",
            "Guwahati", "Bhubaneswar", "Chandigarh", "Puducherry",
        ];
        Regex::new(&format!(r"\b(?:{})\b", places.join("|"))).unwrap()
    };
}

/// Abbreviations whose trailing period does not end a sentence
const ABBREVIATIONS: &[&str] = &[
    "rs", "dr", "mr", "mrs", "ms", "shri", "smt", "no", "st", "govt", "dept", "e.g", "i.e",
    "vs", "etc",
];

/// Regex and keyword based [`ClaimExtractor`]
#[derive(Debug, Clone, Default)]
pub struct RuleBasedExtractor;

impl RuleBasedExtractor {
    pub fn new() -> Self {
        Self
    }

    /// True when `sentence` reads as a checkable factual statement.
    pub fn is_factual_claim(sentence: &str) -> bool {
        let has_factual = FACTUAL_PATTERNS.iter().any(|p| p.is_match(sentence));
        let has_non_factual = NON_FACTUAL_PATTERNS.iter().any(|p| p.is_match(sentence));

        has_factual && !has_non_factual && sentence.split_whitespace().count() >= MIN_CLAIM_WORDS
    }
}

impl ClaimExtractor for RuleBasedExtractor {
    fn extract_claims(&self, text: &str) -> Vec<String> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }

        let claims: Vec<String> = split_sentences(trimmed)
            .into_iter()
            .filter(|sentence| Self::is_factual_claim(sentence))
            .map(str::to_string)
            .collect();

        if claims.is_empty() {
            // Let the verifier judge the input as a whole
            vec![trimmed.to_string()]
        } else {
            claims
        }
    }

    fn extract_entities(&self, text: &str) -> Vec<Entity> {
        let mut spans: Vec<(usize, usize, &'static str)> = Vec::new();

        let patterns: [(&Regex, &'static str); 6] = [
            (&*ORG_PATTERN, LABEL_ORG),
            (&*MONTH_DATE_PATTERN, LABEL_DATE),
            (&*MONEY_PATTERN, LABEL_MONEY),
            (&*GPE_PATTERN, LABEL_GPE),
            (&*ACRONYM_PATTERN, LABEL_ORG),
            (&*YEAR_PATTERN, LABEL_DATE),
        ];

        for (pattern, label) in patterns {
            for m in pattern.find_iter(text) {
                spans.push((m.start(), m.end(), label));
            }
        }

        // Earliest first, longest wins on a shared start; drop overlaps
        spans.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));

        let mut entities: Vec<Entity> = Vec::new();
        let mut covered_until = 0;
        for (start, end, label) in spans {
            if start < covered_until {
                continue;
            }
            covered_until = end;

            let entity = Entity {
                text: text[start..end].trim_end().to_string(),
                label: label.to_string(),
            };
            if !entities.contains(&entity) {
                entities.push(entity);
            }
        }

        entities
    }

    fn name(&self) -> &str {
        "rule-based"
    }
}

/// Split text into trimmed sentences on `.`, `?` or `!` followed by
/// whitespace, ignoring periods after known abbreviations and initials.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !matches!(c, '.' | '?' | '!') {
            continue;
        }

        let at_boundary = match chars.peek() {
            Some((_, next)) => next.is_whitespace(),
            None => true,
        };
        if !at_boundary || (c == '.' && ends_with_abbreviation(&text[start..i])) {
            continue;
        }

        let end = i + c.len_utf8();
        let sentence = text[start..end].trim();
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
        start = end;
    }

    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest);
    }

    sentences
}

fn ends_with_abbreviation(before_period: &str) -> bool {
    let word = before_period
        .rsplit(char::is_whitespace)
        .next()
        .unwrap_or_default()
        .trim_start_matches(|c: char| !c.is_alphanumeric());

    if word.chars().count() == 1 && word.chars().all(|c| c.is_uppercase()) {
        return true;
    }

    ABBREVIATIONS.contains(&word.to_lowercase().as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_factual_sentence_detection() {
        assert!(RuleBasedExtractor::is_factual_claim(
            "The government announced a new irrigation scheme"
        ));
        assert!(RuleBasedExtractor::is_factual_claim(
            "Funds were released to Assam in 2023"
        ));
        // Too short
        assert!(!RuleBasedExtractor::is_factual_claim("Government announced it"));
        // Opinion
        assert!(!RuleBasedExtractor::is_factual_claim(
            "I think the minister announced a policy"
        ));
        // Question
        assert!(!RuleBasedExtractor::is_factual_claim(
            "Did the government launch the scheme in 2022?"
        ));
        // No factual marker
        assert!(!RuleBasedExtractor::is_factual_claim("The sky is very blue today"));
    }

    #[test]
    fn test_sentence_split_respects_abbreviations() {
        let sentences =
            split_sentences("SAIL will invest Rs. 800 crore. Dr. Rao confirmed it! Is it true?");
        assert_eq!(
            sentences,
            vec!["SAIL will invest Rs. 800 crore.", "Dr. Rao confirmed it!", "Is it true?"]
        );
    }

    #[test]
    fn test_extract_claims_keeps_factual_sentences_in_order() {
        let extractor = RuleBasedExtractor::new();
        let claims = extractor.extract_claims(
            "The Ministry of Steel announced new funding. Nice weather. \
             The scheme will cover 12 states by 2025.",
        );
        assert_eq!(
            claims,
            vec![
                "The Ministry of Steel announced new funding.".to_string(),
                "The scheme will cover 12 states by 2025.".to_string(),
            ]
        );
    }

    #[test]
    fn test_whole_text_when_no_sentence_qualifies() {
        let extractor = RuleBasedExtractor::new();
        let claims = extractor.extract_claims("  Indian Railways have steam locomotives for tourism ");
        assert_eq!(
            claims,
            vec!["Indian Railways have steam locomotives for tourism".to_string()]
        );
    }

    #[test]
    fn test_empty_text_has_no_claims() {
        let extractor = RuleBasedExtractor::new();
        assert!(extractor.extract_claims("   \n ").is_empty());
    }

    #[test]
    fn test_extract_entities() {
        let extractor = RuleBasedExtractor::new();
        let entities = extractor.extract_entities(
            "The Ministry of Rural Development released Rs. 1,200 crore to Assam in March 2023. \
             SAIL will invest in 2024.",
        );

        let pairs: Vec<(&str, &str)> = entities
            .iter()
            .map(|e| (e.text.as_str(), e.label.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("Ministry of Rural Development", "ORG"),
                ("Rs. 1,200 crore", "MONEY"),
                ("Assam", "GPE"),
                ("March 2023", "DATE"),
                ("SAIL", "ORG"),
                ("2024", "DATE"),
            ]
        );
    }

    #[test]
    fn test_entities_deduplicated() {
        let extractor = RuleBasedExtractor::new();
        let entities = extractor.extract_entities("Kerala and Kerala again");
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].label, LABEL_GPE);
    }
}
