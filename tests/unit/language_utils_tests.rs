/*!
 * Tests for language code utilities
 */

use opensubtrans::language_utils::{
    LanguageCodeType, get_language_name, language_codes_match, normalize_to_part1_or_part2t, normalize_to_part2t,
    resolve_language, resolve_source_language, validate_language_code,
};

#[test]
fn test_validateLanguageCode_withKnownCodes_shouldReportType() {
    assert_eq!(validate_language_code("en").unwrap(), LanguageCodeType::Part1);
    assert_eq!(validate_language_code("fra").unwrap(), LanguageCodeType::Part2T);
    assert_eq!(validate_language_code("fre").unwrap(), LanguageCodeType::Part2B);
    assert!(validate_language_code("xx").is_err());
    assert!(validate_language_code("english").is_err());
}

#[test]
fn test_normalize_shouldConvertBetweenForms() {
    assert_eq!(normalize_to_part2t("en").unwrap(), "eng");
    assert_eq!(normalize_to_part2t("ger").unwrap(), "deu");
    assert_eq!(normalize_to_part1_or_part2t("deu").unwrap(), "de");
    assert_eq!(normalize_to_part1_or_part2t(" JA ").unwrap(), "ja");
}

#[test]
fn test_languageCodesMatch_shouldCompareAcrossForms() {
    assert!(language_codes_match("fr", "fre"));
    assert!(language_codes_match("zh", "chi"));
    assert!(!language_codes_match("fr", "de"));
    assert!(!language_codes_match("fr", "??"));
}

#[test]
fn test_getLanguageName_shouldReturnEnglishName() {
    assert_eq!(get_language_name("es").unwrap(), "Spanish");
    assert_eq!(get_language_name("ita").unwrap(), "Italian");
}

#[test]
fn test_resolveLanguage_shouldHandleVariantsCodesAndNames() {
    let traditional = resolve_language("zh-TW").unwrap();
    assert_eq!(traditional.code, "zh-TW");
    assert_eq!(traditional.name, "Chinese (Traditional)");

    assert_eq!(resolve_language("Simplified Chinese").unwrap().code, "zh-CN");
    assert_eq!(resolve_language("pt-br").unwrap().name, "Portuguese (Brazil)");
    assert_eq!(resolve_language("German").unwrap().code, "de");
    assert_eq!(resolve_language("spa").unwrap().name, "Spanish");
}

#[test]
fn test_resolveSourceLanguage_withAutoDetect_shouldBeNone() {
    assert!(resolve_source_language("AUTO").unwrap().is_none());
    assert_eq!(resolve_source_language("en").unwrap().unwrap().name, "English");
    assert!(resolve_source_language("not-a-language").is_err());
}
