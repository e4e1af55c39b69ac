//! Capability wrapper over the parsed HTML document.
//!
//! The form discoverer and result extractor only see this interface, so the
//! parsing library's object model never leaks into the extraction logic.

use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;

// Static selectors - compiled once
static FORM_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("form").unwrap());
static INPUT_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("input").unwrap());
static TABLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table").unwrap());
static ROW_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static CELL_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());
static ATTR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[class], [id]").unwrap());

/// A single `<input>` found inside a form.
#[derive(Debug, Clone)]
pub struct InputInfo {
    pub name: Option<String>,
    pub value: Option<String>,
    /// The `type` attribute, lowercased; missing types default to "text"
    pub kind: String,
}

/// The first form on a page, flattened to what form replay needs.
#[derive(Debug, Clone)]
pub struct FormInfo {
    pub action: Option<String>,
    pub inputs: Vec<InputInfo>,
}

/// A parsed HTML page.
pub struct Document {
    html: Html,
}

impl Document {
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }

    /// All text content of the page, text nodes joined by single spaces.
    pub fn visible_text(&self) -> String {
        let mut out = String::new();
        for piece in self.html.root_element().text() {
            let trimmed = piece.trim();
            if trimmed.is_empty() {
                continue;
            }
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(trimmed);
        }
        out
    }

    /// The first `<form>` on the page, with its action and inputs.
    pub fn first_form(&self) -> Option<FormInfo> {
        let form = self.html.select(&FORM_SELECTOR).next()?;

        let inputs = form
            .select(&INPUT_SELECTOR)
            .map(|input| InputInfo {
                name: input.value().attr("name").map(str::to_string),
                value: input.value().attr("value").map(str::to_string),
                kind: input
                    .value()
                    .attr("type")
                    .unwrap_or("text")
                    .to_ascii_lowercase(),
            })
            .collect();

        Some(FormInfo {
            action: form.value().attr("action").map(str::to_string),
            inputs,
        })
    }

    /// Every table on the page, as rows of trimmed cell texts, in document order.
    ///
    /// Only `<td>` cells count, so pure header rows come out empty.
    pub fn tables(&self) -> Vec<Vec<Vec<String>>> {
        self.html
            .select(&TABLE_SELECTOR)
            .map(|table| {
                table
                    .select(&ROW_SELECTOR)
                    .map(|row| {
                        row.select(&CELL_SELECTOR)
                            .map(|cell| cell.text().collect::<String>().trim().to_string())
                            .collect()
                    })
                    .collect()
            })
            .collect()
    }

    /// Text of every element whose `class` or `id` attribute matches `pattern`.
    pub fn elements_matching_attr(&self, pattern: &Regex) -> Vec<String> {
        self.html
            .select(&ATTR_SELECTOR)
            .filter(|el| {
                el.value()
                    .attr("class")
                    .is_some_and(|v| pattern.is_match(v))
                    || el.value().attr("id").is_some_and(|v| pattern.is_match(v))
            })
            .map(|el| el.text().collect::<String>().trim().to_string())
            .collect()
    }
}
