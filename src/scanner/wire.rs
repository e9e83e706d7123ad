//! Pieces shared by the per-resource GMP response decoders.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

static CVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"CVE-\d{4}-\d+").expect("valid CVE regex")
});

/// `<x id="..."><name>...</name></x>`
#[derive(Debug, Default, Deserialize)]
pub(crate) struct Named {
    #[serde(rename = "@id", default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Leading text of an element that may also carry child elements.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct MixedText {
    #[serde(rename = "$text", default)]
    pub text: String,
}

/// `<x><count>N</count></x>`
#[derive(Debug, Default, Deserialize)]
pub(crate) struct Count {
    #[serde(default)]
    pub count: String,
}

/// CVE ids mentioned in `text`, in order of first appearance.
pub(crate) fn extract_cves(text: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for m in CVE_RE.find_iter(text) {
        if !found.iter().any(|c| c == m.as_str()) {
            found.push(m.as_str().to_string());
        }
    }
    found
}

/// `"443/tcp"` -> `"443"`, empty -> `"N/A"`.
pub(crate) fn port_number(raw: &str) -> String {
    let port = raw.trim().split('/').next().unwrap_or("").trim();
    if port.is_empty() {
        "N/A".to_string()
    } else {
        port.to_string()
    }
}

pub(crate) fn parse_severity(raw: &str) -> f64 {
    raw.trim().parse().unwrap_or(0.0)
}

pub(crate) fn or_default(value: String, default: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        default.to_string()
    } else {
        trimmed.to_string()
    }
}

pub(crate) fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
