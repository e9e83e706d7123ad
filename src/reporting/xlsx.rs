use rust_xlsxwriter::{Format, Workbook, XlsxError};

use super::{row, HEADERS};
use crate::errors::VulnscanError;
use crate::scanner::models::Report;

const COLUMN_WIDTHS: [f64; 7] = [38.0, 16.0, 8.0, 80.0, 30.0, 10.0, 10.0];

pub fn generate(report: &Report) -> Result<Vec<u8>, VulnscanError> {
    build(report).map_err(|e| VulnscanError::Export(format!("XLSX generation failed: {}", e)))
}

fn build(report: &Report) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Results")?;

    let header_format = Format::new().set_bold();
    for (col, header) in HEADERS.iter().enumerate() {
        worksheet.write_with_format(0, col as u16, *header, &header_format)?;
        worksheet.set_column_width(col as u16, COLUMN_WIDTHS[col])?;
    }

    for (idx, result) in report.results.iter().enumerate() {
        let r = (idx + 1) as u32;
        let cells = row(result);
        for (col, cell) in cells.iter().enumerate() {
            if col == 5 {
                // Keep severity numeric so it sorts in a spreadsheet.
                worksheet.write(r, col as u16, result.severity)?;
            } else {
                worksheet.write(r, col as u16, cell.as_str())?;
            }
        }
    }

    workbook.save_to_buffer()
}
