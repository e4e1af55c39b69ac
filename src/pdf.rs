//! PDF marksheet rendering.
//!
//! Layout is computed first as a flat list of lines, then painted with a
//! simple Y cursor that opens a new page when it passes the bottom margin.
//! The layout stage is pure so the document structure is testable without
//! decoding PDF bytes.

use crate::extractor::{ExtractorError, RollNumber, SemesterRecord};
use chrono::Utc;
use printpdf::{BuiltinFont, Mm, PdfDocument};

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_LEFT_MM: f32 = 20.0;
const MARGIN_BOTTOM_MM: f32 = 15.0;
const TOP_CURSOR_MM: f32 = 280.0;

/// One line of the rendered marksheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// Document title with the roll number
    Title(String),
    /// "Semester N" section header
    SectionHeader(String),
    /// One table row, cells joined with " | "
    Data(String),
    /// Final CGPA line
    Summary(String),
    /// Generated-at stamp
    Footer(String),
}

impl Line {
    /// Font size and vertical advance for this line kind.
    fn metrics(&self) -> (f32, f32) {
        match self {
            Line::Title(_) => (16.0, 14.0),
            Line::SectionHeader(_) => (12.0, 9.0),
            Line::Data(_) => (11.0, 6.0),
            Line::Summary(_) => (12.0, 9.0),
            Line::Footer(_) => (9.0, 5.0),
        }
    }

    fn is_bold(&self) -> bool {
        matches!(
            self,
            Line::Title(_) | Line::SectionHeader(_) | Line::Summary(_)
        )
    }
}

/// Computes the marksheet layout: title, one labeled section per semester
/// record with a line per row, a final CGPA line, and a generated-at footer.
pub fn layout_lines(roll: &RollNumber, semesters: &[SemesterRecord], cgpa: &str) -> Vec<Line> {
    let mut lines = Vec::new();
    lines.push(Line::Title(format!("Marksheet for {roll}")));

    for (idx, semester) in semesters.iter().enumerate() {
        lines.push(Line::SectionHeader(format!("Semester {}", idx + 1)));
        for row in &semester.rows {
            lines.push(Line::Data(row.join(" | ")));
        }
    }

    lines.push(Line::Summary(format!("Final CGPA: {cgpa}")));
    lines.push(Line::Footer(format!(
        "Generated {}",
        Utc::now().format("%Y-%m-%d %H:%M UTC")
    )));
    lines
}

/// Renders the marksheet into PDF bytes.
pub fn render_marksheet(
    roll: &RollNumber,
    semesters: &[SemesterRecord],
    cgpa: &str,
) -> Result<Vec<u8>, ExtractorError> {
    let lines = layout_lines(roll, semesters, cgpa);

    let (doc, first_page, first_layer) = PdfDocument::new(
        format!("Marksheet {roll}"),
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "content",
    );
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(render_err)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(render_err)?;

    let mut layer = doc.get_page(first_page).get_layer(first_layer);
    let mut cursor = TOP_CURSOR_MM;

    for line in &lines {
        let (size, advance) = line.metrics();
        if cursor - advance < MARGIN_BOTTOM_MM {
            let (page, new_layer) =
                doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "content");
            layer = doc.get_page(page).get_layer(new_layer);
            cursor = TOP_CURSOR_MM;
        }

        let font = if line.is_bold() { &bold } else { &regular };
        let text = match line {
            Line::Title(t)
            | Line::SectionHeader(t)
            | Line::Data(t)
            | Line::Summary(t)
            | Line::Footer(t) => t,
        };
        layer.use_text(text.clone(), size, Mm(MARGIN_LEFT_MM), Mm(cursor), font);
        cursor -= advance;
    }

    doc.save_to_bytes().map_err(render_err)
}

fn render_err(err: printpdf::Error) -> ExtractorError {
    ExtractorError::Render {
        message: err.to_string(),
    }
}
