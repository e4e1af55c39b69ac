//! Form discovery: figures out how to submit a roll number to an
//! unfamiliar results page.

use super::document::{Document, FormInfo};
use super::types::RollNumber;
use tracing::debug;
use url::Url;

/// Field names commonly used for the roll-number input, tried in order.
const ROLL_FIELD_CANDIDATES: &[&str] = &[
    "rollno",
    "regno",
    "rollnumber",
    "roll_no",
    "htno",
    "hallticket",
    "regdno",
    "student_id",
];

/// Everything needed to replay the results form via POST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSubmission {
    /// Resolved absolute action URL
    pub action: Url,
    /// Name of the input that takes the roll number
    pub roll_field: String,
    /// Hidden name/value pairs carried through unchanged (CSRF/session tokens)
    pub hidden_fields: Vec<(String, String)>,
    /// Submit control name/value, if the form has a named one
    pub submit_field: Option<(String, String)>,
}

impl FormSubmission {
    /// Builds the full POST body for a given roll number.
    pub fn form_fields(&self, roll: &RollNumber) -> Vec<(String, String)> {
        let mut fields = Vec::with_capacity(self.hidden_fields.len() + 2);
        fields.push((self.roll_field.clone(), roll.to_string()));
        fields.extend(self.hidden_fields.iter().cloned());
        if let Some((name, value)) = &self.submit_field {
            fields.push((name.clone(), value.clone()));
        }
        fields
    }
}

/// Inspects a fetched page and works out how to submit a roll number.
///
/// Uses the first form on the page. The roll-number input is matched by name
/// against [`ROLL_FIELD_CANDIDATES`], falling back to the first text-type
/// input. Returns `None` when there is no form or no usable input - the
/// caller then falls back to GET with candidate query parameters.
pub fn discover(doc: &Document, page_url: &Url, fallback_action: &Url) -> Option<FormSubmission> {
    let form = doc.first_form()?;

    let roll_field = find_roll_field(&form)?;

    let hidden_fields = form
        .inputs
        .iter()
        .filter(|input| input.kind == "hidden")
        .filter_map(|input| {
            input
                .name
                .clone()
                .map(|name| (name, input.value.clone().unwrap_or_default()))
        })
        .collect();

    let submit_field = form
        .inputs
        .iter()
        .find(|input| input.kind == "submit")
        .and_then(|input| {
            input
                .name
                .clone()
                .map(|name| (name, input.value.clone().unwrap_or_else(|| "Submit".to_string())))
        });

    let action = resolve_action(form.action.as_deref(), page_url, fallback_action);

    debug!(
        action = %action,
        roll_field = %roll_field,
        "discovered results form"
    );

    Some(FormSubmission {
        action,
        roll_field,
        hidden_fields,
        submit_field,
    })
}

/// Picks the input that should receive the roll number.
fn find_roll_field(form: &FormInfo) -> Option<String> {
    for candidate in ROLL_FIELD_CANDIDATES {
        if let Some(input) = form.inputs.iter().find(|input| {
            input
                .name
                .as_deref()
                .is_some_and(|name| name.eq_ignore_ascii_case(candidate))
        }) {
            return input.name.clone();
        }
    }

    // No candidate matched by name; take the first named text input
    form.inputs
        .iter()
        .find(|input| input.kind == "text" && input.name.is_some())
        .and_then(|input| input.name.clone())
}

/// Resolves the form action to an absolute URL.
///
/// Relative actions are rebased onto the page URL; absent or malformed
/// actions fall back to the known results endpoint.
fn resolve_action(action: Option<&str>, page_url: &Url, fallback_action: &Url) -> Url {
    match action {
        Some(raw) if !raw.trim().is_empty() => page_url
            .join(raw.trim())
            .unwrap_or_else(|_| fallback_action.clone()),
        _ => fallback_action.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn results_url() -> Url {
        Url::parse("https://example.edu/Results.php").unwrap()
    }

    #[test]
    fn test_discovers_named_roll_input() {
        let doc = Document::parse(
            r#"<form action="check.php">
                 <input type="hidden" name="csrf" value="tok123">
                 <input type="text" name="regno">
                 <input type="submit" name="submit" value="Get Result">
               </form>"#,
        );
        let form = discover(&doc, &results_url(), &results_url()).unwrap();
        assert_eq!(form.roll_field, "regno");
        assert_eq!(form.hidden_fields, vec![("csrf".to_string(), "tok123".to_string())]);
        assert_eq!(
            form.submit_field,
            Some(("submit".to_string(), "Get Result".to_string()))
        );
        assert_eq!(form.action.as_str(), "https://example.edu/check.php");
    }

    #[test]
    fn test_candidate_order_beats_document_order() {
        let doc = Document::parse(
            r#"<form>
                 <input type="text" name="captcha">
                 <input type="text" name="HTNO">
               </form>"#,
        );
        let form = discover(&doc, &results_url(), &results_url()).unwrap();
        assert_eq!(form.roll_field, "HTNO");
    }

    #[test]
    fn test_falls_back_to_first_text_input() {
        let doc = Document::parse(
            r#"<form action="/lookup">
                 <input type="hidden" name="sid" value="9">
                 <input type="text" name="q">
               </form>"#,
        );
        let form = discover(&doc, &results_url(), &results_url()).unwrap();
        assert_eq!(form.roll_field, "q");
    }

    #[test]
    fn test_missing_action_uses_fallback() {
        let doc = Document::parse(r#"<form><input type="text" name="rollno"></form>"#);
        let fallback = Url::parse("https://example.edu/Results.php").unwrap();
        let page = Url::parse("https://example.edu/index.html").unwrap();
        let form = discover(&doc, &page, &fallback).unwrap();
        assert_eq!(form.action, fallback);
    }

    #[test]
    fn test_no_usable_input_returns_none() {
        let doc = Document::parse(r#"<form><input type="hidden" name="sid"></form>"#);
        assert!(discover(&doc, &results_url(), &results_url()).is_none());
    }

    #[test]
    fn test_no_form_returns_none() {
        let doc = Document::parse("<p>CGPA: 8.1</p>");
        assert!(discover(&doc, &results_url(), &results_url()).is_none());
    }

    #[test]
    fn test_form_fields_include_roll_hidden_and_submit() {
        let submission = FormSubmission {
            action: results_url(),
            roll_field: "rollno".to_string(),
            hidden_fields: vec![("csrf".to_string(), "tok".to_string())],
            submit_field: Some(("go".to_string(), "Search".to_string())),
        };
        let roll = RollNumber::parse("21A91A0501").unwrap();
        assert_eq!(
            submission.form_fields(&roll),
            vec![
                ("rollno".to_string(), "21A91A0501".to_string()),
                ("csrf".to_string(), "tok".to_string()),
                ("go".to_string(), "Search".to_string()),
            ]
        );
    }
}
