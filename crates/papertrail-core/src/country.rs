//! Country-code normalization and display names, applied once at ingestion.

use isocountry::CountryCode;

/// Sentinel for groups the catalog could not attribute to a country.
pub const UNKNOWN_COUNTRY: &str = "UNKNOWN";

/// Display name of [`UNKNOWN_COUNTRY`].
pub const UNKNOWN_COUNTRY_NAME: &str = "Unknown";

const COUNTRY_URL_PREFIX: &str = "https://openalex.org/countries/";

/// Normalize a grouping key to an ISO alpha-2 code or [`UNKNOWN_COUNTRY`].
///
/// Strips the catalog's country URL prefix when present. A missing or empty
/// key maps to the sentinel. Idempotent.
pub fn normalize_country_code(key: Option<&str>) -> String {
    let Some(raw) = key.map(str::trim) else {
        return UNKNOWN_COUNTRY.to_string();
    };
    let code = raw.strip_prefix(COUNTRY_URL_PREFIX).unwrap_or(raw);
    if code.is_empty() || code.eq_ignore_ascii_case("null") {
        return UNKNOWN_COUNTRY.to_string();
    }
    code.to_ascii_uppercase()
}

/// ISO 3166 short name for a normalized code.
///
/// The sentinel maps to [`UNKNOWN_COUNTRY_NAME`]; a code the registry does not
/// know is echoed back.
pub fn country_display_name(code: &str) -> String {
    if code == UNKNOWN_COUNTRY {
        return UNKNOWN_COUNTRY_NAME.to_string();
    }
    match CountryCode::for_alpha2(code) {
        Ok(country) => country.name().to_string(),
        Err(_) => code.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_url_prefix() {
        assert_eq!(
            normalize_country_code(Some("https://openalex.org/countries/US")),
            "US"
        );
    }

    #[test]
    fn test_missing_key_is_unknown() {
        assert_eq!(normalize_country_code(None), UNKNOWN_COUNTRY);
        assert_eq!(normalize_country_code(Some("")), UNKNOWN_COUNTRY);
        assert_eq!(normalize_country_code(Some("null")), UNKNOWN_COUNTRY);
    }

    #[test]
    fn test_plain_code_passes_through() {
        assert_eq!(normalize_country_code(Some("GB")), "GB");
        assert_eq!(normalize_country_code(Some("de")), "DE");
    }

    #[test]
    fn test_idempotent() {
        for key in [
            Some("https://openalex.org/countries/CN"),
            Some("fr"),
            Some("UNKNOWN"),
            Some(""),
            None,
        ] {
            let once = normalize_country_code(key);
            let twice = normalize_country_code(Some(&once));
            assert_eq!(once, twice, "not idempotent for {:?}", key);
        }
    }

    #[test]
    fn test_display_name_from_registry() {
        assert_eq!(country_display_name("DE"), "Germany");
        assert_eq!(country_display_name("JP"), "Japan");
    }

    #[test]
    fn test_display_name_fallbacks() {
        assert_eq!(country_display_name(UNKNOWN_COUNTRY), "Unknown");
        // Catalog-only codes such as Kosovo are not ISO assigned.
        assert_eq!(country_display_name("XK"), "XK");
        assert_eq!(country_display_name("ZZ"), "ZZ");
    }
}
