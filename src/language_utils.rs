use isolang::Language;

use crate::errors::ConfigError;

/// Language utilities for ISO language code handling
///
/// This module validates and normalizes ISO 639-1 (2-letter) and ISO 639-2
/// (3-letter) codes, and resolves user input (a code, a regional tag such as
/// `zh-TW`, or an English name such as "Chinese (Traditional)") into a
/// language the prompts and output file names can use.
/// Language code type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageCodeType {
    /// ISO 639-1 (2-letter) code
    Part1,
    /// ISO 639-2/T (3-letter) code
    Part2T,
    /// ISO 639-2/B (3-letter) code
    Part2B,
}

/// A language as used by the translator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLanguage {
    /// Short tag used in output file names (`fr`, `zh-TW`)
    pub code: String,

    /// Name shown to the model ("French", "Chinese (Traditional)")
    pub name: String,
}

/// Written variants that are not plain ISO 639 languages: (tag, name, aliases)
const REGIONAL_VARIANTS: &[(&str, &str, &[&str])] = &[
    ("zh-TW", "Chinese (Traditional)", &["zh-tw", "zh-hant", "zh-hk", "chinese (traditional)", "traditional chinese"]),
    ("zh-CN", "Chinese (Simplified)", &["zh-cn", "zh-hans", "zh-sg", "chinese (simplified)", "simplified chinese"]),
    ("pt-BR", "Portuguese (Brazil)", &["pt-br", "portuguese (brazil)", "brazilian portuguese"]),
];

/// ISO 639-2/B codes that differ from their ISO 639-2/T form
fn part2b_to_part2t(code: &str) -> Option<&'static str> {
    match code {
        "fre" => Some("fra"),
        "ger" => Some("deu"),
        "dut" => Some("nld"),
        "gre" => Some("ell"),
        "chi" => Some("zho"),
        "cze" => Some("ces"),
        "ice" => Some("isl"),
        "alb" => Some("sqi"),
        "arm" => Some("hye"),
        "baq" => Some("eus"),
        "bur" => Some("mya"),
        "per" => Some("fas"),
        "geo" => Some("kat"),
        "may" => Some("msa"),
        "mac" => Some("mkd"),
        "rum" => Some("ron"),
        "slo" => Some("slk"),
        "wel" => Some("cym"),
        _ => None,
    }
}

/// Validate if a language code is a valid ISO 639-1 or ISO 639-2 code
pub fn validate_language_code(code: &str) -> Result<LanguageCodeType, ConfigError> {
    let normalized_code = code.trim().to_lowercase();

    match normalized_code.len() {
        2 if Language::from_639_1(&normalized_code).is_some() => Ok(LanguageCodeType::Part1),
        3 if Language::from_639_3(&normalized_code).is_some() => Ok(LanguageCodeType::Part2T),
        3 if part2b_to_part2t(&normalized_code).is_some() => Ok(LanguageCodeType::Part2B),
        _ => Err(ConfigError::InvalidLanguage(code.to_string())),
    }
}

/// Normalize a language code to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String, ConfigError> {
    let normalized_code = code.trim().to_lowercase();

    let language = match normalized_code.len() {
        2 => Language::from_639_1(&normalized_code),
        3 => Language::from_639_3(part2b_to_part2t(&normalized_code).unwrap_or(&normalized_code)),
        _ => None,
    };

    language
        .map(|l| l.to_639_3().to_string())
        .ok_or_else(|| ConfigError::InvalidLanguage(code.to_string()))
}

/// Normalize a language code to ISO 639-1 (2-letter) format if possible
/// Falls back to ISO 639-2/T if no ISO 639-1 code exists
pub fn normalize_to_part1_or_part2t(code: &str) -> Result<String, ConfigError> {
    let part2t = normalize_to_part2t(code)?;
    let language = Language::from_639_3(&part2t).ok_or_else(|| ConfigError::InvalidLanguage(code.to_string()))?;

    Ok(language.to_639_1().map(|c| c.to_string()).unwrap_or(part2t))
}

/// Check if two language codes match (represent the same language)
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (normalize_to_part2t(code1), normalize_to_part2t(code2)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Get the language name from a code
pub fn get_language_name(code: &str) -> Result<String, ConfigError> {
    let normalized = normalize_to_part2t(code)?;
    Language::from_639_3(&normalized)
        .map(|lang| lang.to_name().to_string())
        .ok_or(ConfigError::InvalidLanguage(normalized))
}

/// Resolve a code, regional tag or English language name
pub fn resolve_language(input: &str) -> Result<ResolvedLanguage, ConfigError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::InvalidLanguage(input.to_string()));
    }
    let lowered = trimmed.to_lowercase();

    if let Some((tag, name, _)) = REGIONAL_VARIANTS
        .iter()
        .find(|(_, _, aliases)| aliases.contains(&lowered.as_str()))
    {
        return Ok(ResolvedLanguage { code: tag.to_string(), name: name.to_string() });
    }

    if let Ok(code) = normalize_to_part1_or_part2t(&lowered) {
        let name = get_language_name(&code)?;
        return Ok(ResolvedLanguage { code, name });
    }

    let language = Language::from_name(&title_case(&lowered))
        .ok_or_else(|| ConfigError::InvalidLanguage(input.to_string()))?;

    Ok(ResolvedLanguage {
        code: language.to_639_1().map(|c| c.to_string()).unwrap_or_else(|| language.to_639_3().to_string()),
        name: language.to_name().to_string(),
    })
}

/// Resolve a source language, where empty or `auto` means "detect"
pub fn resolve_source_language(input: &str) -> Result<Option<ResolvedLanguage>, ConfigError> {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("auto") {
        return Ok(None);
    }
    resolve_language(trimmed).map(Some)
}

fn title_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
