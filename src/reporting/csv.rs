use ::csv::Writer;

use super::{row, HEADERS};
use crate::errors::VulnscanError;
use crate::scanner::models::Report;

pub fn generate(report: &Report) -> Result<Vec<u8>, VulnscanError> {
    let mut wtr = Writer::from_writer(vec![]);

    wtr.write_record(HEADERS)
        .map_err(|e| VulnscanError::Export(format!("CSV write failed: {}", e)))?;
    for result in &report.results {
        wtr.write_record(row(result))
            .map_err(|e| VulnscanError::Export(format!("CSV write failed: {}", e)))?;
    }

    wtr.into_inner()
        .map_err(|e| VulnscanError::Export(format!("CSV flush failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporting::tests::sample_report;

    #[test]
    fn test_csv_header_and_rows() {
        let bytes = generate(&sample_report()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();

        assert_eq!(
            lines.next(),
            Some("ID,Host,Port,Description,CVE Numbers,Severity,Threat")
        );
        assert_eq!(
            lines.next(),
            Some("res1,10.0.0.5,443,\"Log4Shell, see CVE-2021-44228 and CVE-2021-45046.\",\"CVE-2021-44228, CVE-2021-45046\",10,High")
        );
        assert!(text.contains("\"Weak ciphers, \"\"quoted\"\", with commas\""));
    }

    #[test]
    fn test_csv_empty_report_has_header_only() {
        let mut report = sample_report();
        report.results.clear();
        let text = String::from_utf8(generate(&report).unwrap()).unwrap();
        assert_eq!(text.lines().count(), 1);
    }
}
