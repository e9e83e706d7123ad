use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};

use super::{row, HEADERS};
use crate::errors::VulnscanError;
use crate::scanner::models::Report;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 15.0;
const LINE_HEIGHT: f32 = 5.0;
const BODY_SIZE: f32 = 9.0;
const TITLE_SIZE: f32 = 16.0;
/// Characters per line at the body size across the printable width.
const WRAP_AT: usize = 100;

/// Writes lines top to bottom, starting a new page when the current one is full.
struct PageWriter<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    y: f32,
}

impl PageWriter<'_> {
    fn line(&mut self, text: &str, size: f32, font: &IndirectFontRef) {
        if self.y < MARGIN {
            let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = PAGE_HEIGHT - MARGIN;
        }
        self.layer.use_text(text, size, Mm(MARGIN), Mm(self.y), font);
        self.y -= LINE_HEIGHT * (size / BODY_SIZE).max(1.0);
    }

    fn gap(&mut self) {
        self.y -= LINE_HEIGHT;
    }
}

pub fn generate(report: &Report) -> Result<Vec<u8>, VulnscanError> {
    let title = "Scan Report";
    let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| VulnscanError::Export(format!("PDF font error: {}", e)))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| VulnscanError::Export(format!("PDF font error: {}", e)))?;

    {
        let mut writer = PageWriter {
            doc: &doc,
            layer: doc.get_page(page).get_layer(layer),
            y: PAGE_HEIGHT - MARGIN,
        };

        writer.line(title, TITLE_SIZE, &bold);
        writer.line(
            &sanitize(&format!("Report {} ({})", report.summary.id, report.summary.name)),
            BODY_SIZE,
            &regular,
        );
        writer.gap();

        for result in &report.results {
            for (header, value) in HEADERS.iter().zip(row(result)) {
                let text = sanitize(&format!("{}: {}", header, value));
                for (i, chunk) in wrap(&text, WRAP_AT).iter().enumerate() {
                    let font = if i == 0 { &bold } else { &regular };
                    writer.line(chunk, BODY_SIZE, font);
                }
            }
            writer.gap();
        }
    }

    doc.save_to_bytes()
        .map_err(|e| VulnscanError::Export(format!("PDF generation failed: {}", e)))
}

/// The builtin fonts only cover a Latin charset.
fn sanitize(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\n' | '\r' | '\t' => ' ',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '?',
        })
        .collect()
}

fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let mut word = word.to_string();
        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(width);
            lines.push(word);
            word = rest;
        }
        if !current.is_empty() && current.len() + 1 + word.len() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}
