//! Keyword-driven field extraction from resume text.
//!
//! Pure functions, no model calls: skills come from fixed vocabularies,
//! location from labelled lines or a place-name gazetteer, degree from a
//! ranked list, domain from trigger phrases.

use std::collections::BTreeSet;

use crate::models::profile::{Domain, ProfileFields};

const TECH_SKILLS: &[&str] = &[
    "python", "java", "react", "aws", "rust", "go", "golang", "c++", "c#", "javascript",
    "typescript", "node.js", "sql", "postgresql", "mongodb", "docker", "kubernetes", "terraform",
    "gcp", "azure", "kafka", "spark", "pytorch", "tensorflow", "linux", "git", "graphql",
];

const GENERAL_SKILLS: &[&str] = &[
    "leadership",
    "communication",
    "teamwork",
    "mentoring",
    "negotiation",
    "stakeholder",
];

/// Checked in order; the first hit wins.
const DEGREES: &[&str] = &["Bachelor", "Master", "PhD", "B.Sc", "M.Sc"];

const LOCATION_LABELS: &[&str] = &["location:", "address:", "based in"];

/// Canonical spellings; matched case-insensitively on word boundaries.
const PLACES: &[&str] = &[
    "New York",
    "San Francisco",
    "Los Angeles",
    "Seattle",
    "Austin",
    "Boston",
    "Chicago",
    "Toronto",
    "Vancouver",
    "London",
    "Manchester",
    "Dublin",
    "Paris",
    "Berlin",
    "Munich",
    "Amsterdam",
    "Madrid",
    "Barcelona",
    "Lisbon",
    "Stockholm",
    "Zurich",
    "Warsaw",
    "Bangalore",
    "Bengaluru",
    "Mumbai",
    "Delhi",
    "Hyderabad",
    "Singapore",
    "Tokyo",
    "Seoul",
    "Sydney",
    "Melbourne",
    "Dubai",
    "United States",
    "USA",
    "United Kingdom",
    "UK",
    "Canada",
    "Germany",
    "France",
    "India",
    "Japan",
    "Australia",
    "Netherlands",
    "Spain",
    "Ireland",
];

/// Derives the structured profile fields from extracted resume text.
pub fn extract_fields(text: &str) -> ProfileFields {
    ProfileFields {
        skills: extract_skills(text),
        location: extract_location(text),
        degree: extract_degree(text),
        domain: classify_domain(text),
        extra: Default::default(),
    }
}

/// Sorted, deduplicated vocabulary hits.
pub fn extract_skills(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    tokens(&lower)
        .filter(|t| TECH_SKILLS.contains(t) || GENERAL_SKILLS.contains(t))
        .map(String::from)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn extract_location(text: &str) -> Option<String> {
    if let Some(labelled) = labelled_location(text) {
        return Some(labelled);
    }

    let lower = text.to_lowercase();
    PLACES
        .iter()
        .filter_map(|place| find_word(&lower, &place.to_lowercase()).map(|pos| (pos, *place)))
        .min_by_key(|(pos, place)| (*pos, std::cmp::Reverse(place.len())))
        .map(|(_, place)| place.to_string())
}

pub fn extract_degree(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    DEGREES
        .iter()
        .find(|d| lower.contains(&d.to_lowercase()))
        .map(|d| d.to_string())
}

pub fn classify_domain(text: &str) -> Domain {
    let lower = text.to_lowercase();
    if lower.contains("product manager") || lower.contains("roadmap") {
        return Domain::ProductManagement;
    }
    if lower.contains("scalable") || tokens(&lower).any(|t| t == "api" || t == "apis") {
        return Domain::Engineering;
    }
    Domain::Other
}

/// Splits on anything other than alphanumerics and `+ # .`, trimming
/// sentence-ending dots so "AWS." still yields "aws".
fn tokens(lower: &str) -> impl Iterator<Item = &str> {
    lower
        .split(|c: char| !(c.is_alphanumeric() || matches!(c, '+' | '#' | '.')))
        .map(|t| t.trim_matches('.'))
        .filter(|t| !t.is_empty())
}

fn labelled_location(text: &str) -> Option<String> {
    text.lines().find_map(|line| {
        let trimmed = line.trim();
        let lower = trimmed.to_lowercase();
        LOCATION_LABELS.iter().find_map(|label| {
            if !lower.starts_with(label) {
                return None;
            }
            // Labels are ASCII, so the byte offset is valid in `trimmed` too.
            let value = trimmed[label.len()..]
                .trim()
                .trim_end_matches(|c: char| matches!(c, '.' | ',' | ';'));
            (!value.is_empty()).then(|| value.to_string())
        })
    })
}

/// Byte offset of the first occurrence of `needle` bounded by non-alphanumerics.
fn find_word(haystack: &str, needle: &str) -> Option<usize> {
    let mut start = 0;
    while let Some(found) = haystack[start..].find(needle) {
        let pos = start + found;
        let end = pos + needle.len();
        let before_ok = haystack[..pos]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let after_ok = haystack[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());
        if before_ok && after_ok {
            return Some(pos);
        }
        start = pos + haystack[pos..].chars().next().map_or(1, char::len_utf8);
    }
    None
}
