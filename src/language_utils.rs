use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities for ISO language code handling
///
/// Recognition engines want the hint in different shapes: speech backends
/// take ISO 639-1, tesseract takes its own traineddata identifiers. Both
/// mappings start from a normalized 639-1 code.
/// Normalize a language hint to an ISO 639-1 (2-letter) code
///
/// Accepts 2-letter codes, 3-letter codes (639-2/T and the common 639-2/B
/// variants) and English language names. "auto" and the empty string mean
/// auto-detection and normalize to `None`.
pub fn normalize_hint(code: &str) -> Result<Option<String>> {
    let normalized = code.trim().to_lowercase();

    if normalized.is_empty() || normalized == "auto" {
        return Ok(None);
    }

    let language = if normalized.len() == 2 {
        Language::from_639_1(&normalized)
    } else if normalized.len() == 3 {
        Language::from_639_3(&normalized)
            .or_else(|| Language::from_639_3(bibliographic_to_terminologic(&normalized)))
    } else {
        Language::from_name(&capitalize(&normalized))
    };

    let language = language.ok_or_else(|| anyhow!("Invalid language code: {}", code))?;

    language
        .to_639_1()
        .map(|part1| Some(part1.to_string()))
        .ok_or_else(|| anyhow!("Language {} has no two-letter code", code))
}

/// Map an ISO 639-2/B (bibliographic) code to its 639-2/T twin
///
/// isolang only resolves terminologic codes, but subtitle and container
/// metadata commonly carries the bibliographic variants.
fn bibliographic_to_terminologic(code: &str) -> &str {
    match code {
        "fre" => "fra",
        "ger" => "deu",
        "dut" => "nld",
        "gre" => "ell",
        "chi" => "zho",
        "cze" => "ces",
        "ice" => "isl",
        "alb" => "sqi",
        "arm" => "hye",
        "baq" => "eus",
        "bur" => "mya",
        "per" => "fas",
        "geo" => "kat",
        "may" => "msa",
        "mac" => "mkd",
        "rum" => "ron",
        "slo" => "slk",
        "wel" => "cym",
        other => other,
    }
}

/// Tesseract traineddata identifier for a normalized hint
///
/// `None` (auto-detect) falls back to a broad English+Chinese pack, matching
/// the kind of short-video material the tool targets.
pub fn tesseract_lang(hint: Option<&str>) -> String {
    match hint {
        None => "eng+chi_sim".to_string(),
        Some("zh") => "chi_sim".to_string(),
        Some(part1) => Language::from_639_1(part1)
            .map(|lang| lang.to_639_3().to_string())
            .unwrap_or_else(|| "eng".to_string()),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
