//! Result extraction from response HTML.
//!
//! Layered strategy: explicit error-text detection first, then an ordered
//! list of CGPA extractors (label regex over visible text, attribute-tagged
//! elements, table-cell adjacency), first accepted value wins. Semester
//! tables are collected independently of the CGPA search.

use super::document::Document;
use super::error::ExtractorError;
use super::types::{Extraction, RollNumber, SemesterRecord, MIN_ROW_CELLS};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// Phrases that mean the site explicitly reported no record. Checked before
/// any extraction attempt; a page that happens to contain one of these words
/// for another reason is an accepted false positive.
const ERROR_PHRASES: &[&str] = &[
    "not found",
    "invalid",
    "no record",
    "does not exist",
    "no results",
    "not available",
];

/// Keywords that mark a table cell as CGPA-related.
const CGPA_CELL_KEYWORDS: &[&str] = &["cgpa", "c.g.p.a", "cumulative grade point", "overall gpa"];

// Label patterns over the lower-cased visible text, most specific spellings
// included so punctuated variants still capture the number after the label.
static LABEL_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"cgpa\s*[:\-=]?\s*(\d+\.?\d*)",
        r"c\.\s*g\.\s*p\.\s*a\.?\s*[:\-=]?\s*(\d+\.?\d*)",
        r"cumulative grade point average\s*[:\-=]?\s*(\d+\.?\d*)",
        r"overall gpa\s*[:\-=]?\s*(\d+\.?\d*)",
        r"final gpa\s*[:\-=]?\s*(\d+\.?\d*)",
    ]
    .iter()
    .map(|pat| Regex::new(pat).unwrap())
    .collect()
});

static ATTR_HINT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)cgpa|gpa|grade").unwrap());
static DECIMAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+\.?\d*").unwrap());

/// One CGPA extraction strategy: pure function over the parsed document and
/// its lower-cased visible text.
type Strategy = fn(&Document, &str) -> Option<String>;

/// Ordered strategy list; the first accepted value stops the search.
const CGPA_STRATEGIES: &[(&str, Strategy)] = &[
    ("label_regex", by_label_regex),
    ("attribute_hint", by_attribute_hint),
    ("table_adjacency", by_table_adjacency),
];

/// Extracts structured results from a response page.
///
/// Errors with [`ExtractorError::NotFound`] when the page explicitly reports
/// a missing record, and [`ExtractorError::Format`] when no strategy yields a
/// CGPA within [0, 10].
pub fn extract(doc: &Document, roll: &RollNumber) -> Result<Extraction, ExtractorError> {
    let text = doc.visible_text().to_lowercase();

    if let Some(phrase) = ERROR_PHRASES.iter().find(|phrase| text.contains(*phrase)) {
        debug!(roll = %roll, phrase = *phrase, "page reports no record");
        return Err(ExtractorError::NotFound {
            roll: roll.to_string(),
        });
    }

    let cgpa = CGPA_STRATEGIES
        .iter()
        .find_map(|(name, strategy)| {
            let value = strategy(doc, &text)?;
            debug!(roll = %roll, strategy = name, cgpa = %value, "CGPA extracted");
            Some(value)
        })
        .ok_or(ExtractorError::Format)?;

    Ok(Extraction {
        cgpa,
        semesters: collect_semesters(doc),
    })
}

/// Accepts a candidate only if it parses and lands within [0, 10]. Anything
/// else is discarded outright so an unrelated number (percentage, date
/// fragment) never leaks through as a CGPA.
fn accept_in_range(candidate: &str) -> Option<String> {
    let value: f64 = candidate.parse().ok()?;
    if (0.0..=10.0).contains(&value) {
        Some(candidate.to_string())
    } else {
        None
    }
}

/// Strategy (a): label regexes over the visible text.
pub fn by_label_regex(_doc: &Document, text: &str) -> Option<String> {
    LABEL_PATTERNS
        .iter()
        .find_map(|pattern| accept_in_range(pattern.captures(text)?.get(1)?.as_str()))
}

/// Strategy (b): elements whose class/id hints at a grade value.
pub fn by_attribute_hint(doc: &Document, _text: &str) -> Option<String> {
    doc.elements_matching_attr(&ATTR_HINT)
        .iter()
        .find_map(|content| accept_in_range(DECIMAL.find(content)?.as_str()))
}

/// Strategy (c): a CGPA-keyword cell yields the number in the adjacent cell,
/// or failing that, in the same cell.
pub fn by_table_adjacency(doc: &Document, _text: &str) -> Option<String> {
    for table in doc.tables() {
        for row in &table {
            for (idx, cell) in row.iter().enumerate() {
                let lowered = cell.to_lowercase();
                if !CGPA_CELL_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
                    continue;
                }
                let adjacent = row
                    .get(idx + 1)
                    .and_then(|next| accept_in_range(DECIMAL.find(next)?.as_str()));
                let found = adjacent
                    .or_else(|| accept_in_range(DECIMAL.find(cell)?.as_str()));
                if found.is_some() {
                    return found;
                }
            }
        }
    }
    None
}

/// Collects semester tables: every table contributes a record iff it has at
/// least one row with [`MIN_ROW_CELLS`] cells. Document order is preserved.
fn collect_semesters(doc: &Document) -> Vec<SemesterRecord> {
    doc.tables()
        .into_iter()
        .filter_map(|table| {
            let rows: Vec<Vec<String>> = table
                .into_iter()
                .filter(|row| row.len() >= MIN_ROW_CELLS)
                .collect();
            if rows.is_empty() {
                None
            } else {
                Some(SemesterRecord { rows })
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roll() -> RollNumber {
        RollNumber::parse("21A91A0501").unwrap()
    }

    #[test]
    fn test_error_text_short_circuits_extraction() {
        // A CGPA-shaped substring elsewhere must not rescue the page
        let doc = Document::parse("<p>Roll number not found</p><p>CGPA: 8.45</p>");
        let err = extract(&doc, &roll()).unwrap_err();
        assert!(matches!(err, ExtractorError::NotFound { .. }));
        assert!(err.user_message().contains("21A91A0501"));
    }

    #[test]
    fn test_label_regex_extracts_plain_cgpa() {
        let doc = Document::parse("<p>CGPA: 8.45</p>");
        let extraction = extract(&doc, &roll()).unwrap();
        assert_eq!(extraction.cgpa, "8.45");
    }

    #[test]
    fn test_label_regex_handles_punctuated_label() {
        let doc = Document::parse("<p>C.G.P.A. - 7.9</p>");
        let text = doc.visible_text().to_lowercase();
        assert_eq!(by_label_regex(&doc, &text).as_deref(), Some("7.9"));
    }

    #[test]
    fn test_attribute_hint_strategy() {
        let doc = Document::parse(r#"<span class="cgpa-value">Score 9.12</span>"#);
        assert_eq!(by_attribute_hint(&doc, "").as_deref(), Some("9.12"));
    }

    #[test]
    fn test_table_adjacency_strategy() {
        let doc = Document::parse("<table><tr><td>CGPA</td><td>8.45</td></tr></table>");
        assert_eq!(by_table_adjacency(&doc, "").as_deref(), Some("8.45"));
    }

    #[test]
    fn test_table_adjacency_same_cell_fallback() {
        let doc = Document::parse("<table><tr><td>CGPA 8.45</td></tr></table>");
        assert_eq!(by_table_adjacency(&doc, "").as_deref(), Some("8.45"));
    }

    #[test]
    fn test_out_of_range_value_is_discarded_everywhere() {
        let doc = Document::parse(
            r#"<p>CGPA: 12.0</p>
               <span class="cgpa">12.0</span>
               <table><tr><td>CGPA</td><td>12.0</td></tr></table>"#,
        );
        let err = extract(&doc, &roll()).unwrap_err();
        assert!(matches!(err, ExtractorError::Format));
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let html = r#"<p>CGPA: 8.2</p>
            <table>
              <tr><td>MA101</td><td>Maths</td><td>A</td></tr>
              <tr><td>PH101</td><td>Physics</td><td>B</td></tr>
            </table>"#;
        let first = extract(&Document::parse(html), &roll()).unwrap();
        let second = extract(&Document::parse(html), &roll()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_semester_tables_need_min_cells() {
        let html = r#"<p>CGPA: 8.2</p>
            <table><tr><td>too</td><td>short</td></tr></table>
            <table>
              <tr><td>MA101</td><td>Maths</td><td>A</td></tr>
              <tr><td>skip</td><td>me</td></tr>
              <tr><td>PH101</td><td>Physics</td><td>B</td></tr>
            </table>"#;
        let extraction = extract(&Document::parse(html), &roll()).unwrap();
        assert_eq!(extraction.semesters.len(), 1);
        assert_eq!(extraction.semesters[0].rows.len(), 2);
    }

    #[test]
    fn test_tables_kept_in_document_order() {
        let html = r#"<p>CGPA: 8.2</p>
            <table><tr><td>s1</td><td>x</td><td>y</td></tr></table>
            <table><tr><td>s2</td><td>x</td><td>y</td></tr></table>"#;
        let extraction = extract(&Document::parse(html), &roll()).unwrap();
        assert_eq!(extraction.semesters[0].rows[0][0], "s1");
        assert_eq!(extraction.semesters[1].rows[0][0], "s2");
    }

    #[test]
    fn test_unrecognized_page_is_format_error() {
        let doc = Document::parse("<p>Welcome to the portal</p>");
        assert!(matches!(
            extract(&doc, &roll()),
            Err(ExtractorError::Format)
        ));
    }
}
