use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info, warn};

use crate::llm::provider::LLMProvider;

const UNKNOWN_CVE: &str = "unknown";
const NO_DESCRIPTION: &str = "No description available.";
const SYSTEM_PROMPT: &str = "You are a vulnerability analyst helping an administrator triage OpenVAS findings.";

/// One scan result as submitted by the client.
#[derive(Debug, Clone, Deserialize)]
pub struct Finding {
    #[serde(default, deserialize_with = "lenient_severity")]
    pub severity: f64,
    #[serde(default)]
    pub cve_numbers: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CveAnswer {
    pub cve: String,
    pub answer: String,
}

/// Severity arrives as a number or as the scanner's string form.
fn lenient_severity<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
        Null,
    }
    Ok(match Raw::deserialize(deserializer)? {
        Raw::Number(n) => n,
        Raw::Text(s) => s.trim().parse().unwrap_or(0.0),
        Raw::Null => 0.0,
    })
}

fn build_prompt(cve: &str, description: &str) -> String {
    if cve == UNKNOWN_CVE {
        format!(
            "An OpenVAS scan found a vulnerability with the following details: {}. \
             Please give more information about this vulnerability, explain how to mitigate it, \
             and add links to articles about it if you can.",
            description
        )
    } else {
        format!(
            "An OpenVAS scan found a vulnerability with this CVE: {}. Details: {}. \
             Please explain the vulnerability, suggest mitigation steps, \
             and add links to articles about it if you can.",
            cve, description
        )
    }
}

pub struct CveAnalyzer {
    llm: Arc<dyn LLMProvider>,
}

impl CveAnalyzer {
    pub fn new(llm: Arc<dyn LLMProvider>) -> Self {
        Self { llm }
    }

    /// Sends one prompt per CVE of every finding with a positive severity.
    /// A failed completion becomes that item's answer.
    pub async fn analyze(&self, findings: &[Finding]) -> Vec<CveAnswer> {
        let mut answers = Vec::new();
        for finding in findings.iter().filter(|f| f.severity > 0.0) {
            let description = finding.description.as_deref().unwrap_or(NO_DESCRIPTION);
            let cves: Vec<&str> = if finding.cve_numbers.is_empty() {
                vec![UNKNOWN_CVE]
            } else {
                finding.cve_numbers.iter().map(String::as_str).collect()
            };

            for cve in cves {
                let prompt = build_prompt(cve, description);
                let answer = match self.llm.complete(&prompt, Some(SYSTEM_PROMPT)).await {
                    Ok(resp) if resp.content.trim().is_empty() => "No response from AI.".to_string(),
                    Ok(resp) => {
                        debug!(cve, output_tokens = resp.output_tokens, "CVE answered");
                        resp.content
                    }
                    Err(e) => {
                        warn!(cve, error = %e, "CVE lookup failed");
                        format!("Error processing CVE: {}", e)
                    }
                };
                answers.push(CveAnswer { cve: cve.to_string(), answer });
            }
        }
        info!(
            provider = self.llm.provider_name(),
            model = self.llm.model_name(),
            answers = answers.len(),
            "CVE analysis finished"
        );
        answers
    }
}
