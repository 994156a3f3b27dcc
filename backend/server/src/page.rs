//! # Lookup Page
//!
//! Server rendered form plus results grid. The same [`ViewState`] drives the HTML rendered
//! here, the inline script running in the browser (hydrated from a JSON island) and the
//! command line tester.
//!
//! ## Transitions
//!
//! - Submit: clear error and results, set `loading`
//! - Response: store headers + rows, or store the error message
//! - Always: clear `loading`
//!
//! ## Copy confirmation
//!
//! Each field key keeps its own deadline, `COPY_CONFIRM_MS` after the copy. Keys never
//! share a timer so copying one field does not reset another.
use std::{collections::BTreeMap, fmt::Write};

use serde::{Deserialize, Serialize};

use crate::lookup::LookupResult;

pub const COPY_CONFIRM_MS: u64 = 2_000;

const STYLE: &str = include_str!("../assets/page.css");
const SCRIPT: &str = include_str!("../assets/page.js");
const LOGO_URL: &str = "https://bestwork.cl/wp-content/uploads/2023/05/Logo.png";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub rut: String,
    pub rows: Vec<Vec<String>>,
    pub headers: Vec<String>,
    pub error: String,
    pub loading: bool,
    /// Field key to the epoch millisecond its confirmation ends.
    pub copied: BTreeMap<String, u64>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Field {
    pub key: String,
    pub label: String,
    pub value: String,
}

impl ViewState {
    pub fn new(rut: impl Into<String>) -> Self {
        Self {
            rut: rut.into(),
            ..Self::default()
        }
    }

    pub fn begin_submit(&mut self) {
        self.error.clear();
        self.rows.clear();
        self.headers.clear();
        self.loading = true;
    }

    pub fn succeed(&mut self, result: LookupResult) {
        self.headers = result.headers;
        self.rows = result.data;
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.error = message.into();
    }

    pub fn finish(&mut self) {
        self.loading = false;
    }

    /// Stores either outcome and leaves the loading state.
    pub fn apply(&mut self, outcome: Result<LookupResult, String>) {
        match outcome {
            Ok(result) => self.succeed(result),
            Err(message) => self.fail(message),
        }

        self.finish();
    }

    pub fn fields(&self) -> Vec<Vec<Field>> {
        self.rows
            .iter()
            .enumerate()
            .map(|(row_index, row)| {
                row.iter()
                    .enumerate()
                    .map(|(column, value)| Field {
                        key: field_key(row_index, column),
                        label: label_for(&self.headers, column),
                        value: value.clone(),
                    })
                    .collect()
            })
            .collect()
    }

    pub fn mark_copied(&mut self, key: &str, now_ms: u64) {
        self.copied
            .insert(key.to_string(), now_ms + COPY_CONFIRM_MS);
    }

    pub fn is_copied(&self, key: &str, now_ms: u64) -> bool {
        self.copied
            .get(key)
            .is_some_and(|&deadline| now_ms < deadline)
    }

    pub fn expire_copied(&mut self, now_ms: u64) {
        self.copied.retain(|_, deadline| now_ms < *deadline);
    }
}

pub fn field_key(row: usize, column: usize) -> String {
    format!("{row}-{column}")
}

/// Header text for a column, or `Columna N` (1-based) when the header row is short or blank.
pub fn label_for(headers: &[String], column: usize) -> String {
    headers
        .get(column)
        .filter(|header| !header.is_empty())
        .cloned()
        .unwrap_or_else(|| format!("Columna {}", column + 1))
}

pub fn render(state: &ViewState, now_ms: u64) -> String {
    let mut html = String::with_capacity(8 * 1024);

    html.push_str("<!doctype html>\n<html lang=\"es\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str("<title>Revisa tus datos</title>\n");
    let _ = writeln!(html, "<style>{STYLE}</style>");
    html.push_str("</head>\n<body>\n");

    let _ = writeln!(html, "<main class=\"page\" data-copy-ms=\"{COPY_CONFIRM_MS}\">");
    let _ = writeln!(
        html,
        "<div class=\"logo\"><img src=\"{LOGO_URL}\" alt=\"BestWork Logo\"></div>"
    );
    html.push_str("<h1>Revisa tus datos aquí</h1>\n");
    html.push_str("<p class=\"subtitle\">Si no encuentras tu link, ¡contáctanos!</p>\n");

    render_form(&mut html, state);

    html.push_str("<div id=\"error\">");
    if !state.error.is_empty() {
        let _ = write!(html, "<p class=\"error\">{}</p>", escape(&state.error));
    }
    html.push_str("</div>\n");

    html.push_str("<div id=\"results\">");
    if !state.rows.is_empty() {
        render_results(&mut html, state, now_ms);
    }
    html.push_str("</div>\n</main>\n");

    let _ = writeln!(
        html,
        "<script id=\"view-state\" type=\"application/json\">{}</script>",
        state_json(state)
    );
    let _ = writeln!(html, "<script>{SCRIPT}</script>");
    html.push_str("</body>\n</html>\n");

    html
}

fn render_form(html: &mut String, state: &ViewState) {
    let button = if state.loading { "Buscando..." } else { "Buscar" };

    html.push_str("<form id=\"lookup-form\" method=\"post\" action=\"/\">\n");
    let _ = writeln!(
        html,
        "<input type=\"text\" id=\"rut\" name=\"rut\" placeholder=\"Ingresa tu RUT (Ej: 12345678-9)\" value=\"{}\">",
        escape(&state.rut)
    );
    let _ = writeln!(html, "<button type=\"submit\" id=\"submit\">{button}</button>");
    html.push_str("</form>\n");
}

fn render_results(html: &mut String, state: &ViewState, now_ms: u64) {
    html.push_str("<section class=\"card\">\n<h2>📋 Información del Alumno</h2>\n");

    for row in state.fields() {
        html.push_str("<div class=\"resultado-grid\">\n");

        for field in row {
            let copy_label = if state.is_copied(&field.key, now_ms) {
                "¡Copiado!"
            } else {
                "Copiar"
            };

            let _ = writeln!(
                html,
                "<div class=\"field\"><span class=\"label\">{}</span><span class=\"value\">{}</span>\
                 <button type=\"button\" class=\"copy\" data-key=\"{}\" data-value=\"{}\">{copy_label}</button></div>",
                escape(&field.label),
                escape(&field.value),
                escape(&field.key),
                escape(&field.value),
            );
        }

        html.push_str("</div>\n");
    }

    html.push_str("</section>");
}

fn state_json(state: &ViewState) -> String {
    // '<' only shows up inside JSON strings, where < is equivalent
    serde_json::to_string(state)
        .unwrap_or_else(|_| "{}".to_string())
        .replace('<', "\\u003c")
}

pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());

    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }

    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn found() -> LookupResult {
        LookupResult {
            data: vec![vec!["22222222-2".into(), "Luis".into(), "Rust I".into()]],
            headers: vec!["RUT".into(), "Nombre".into()],
        }
    }

    #[test]
    fn test_submit_clears_previous() {
        let mut state = ViewState::new("22222222-2");
        state.apply(Ok(found()));
        state.error = "viejo".into();

        state.begin_submit();

        assert!(state.loading);
        assert!(state.rows.is_empty());
        assert!(state.headers.is_empty());
        assert!(state.error.is_empty());
        assert_eq!(state.rut, "22222222-2");
    }

    #[test]
    fn test_success_cycle() {
        let mut state = ViewState::new("22222222-2");
        state.begin_submit();
        state.apply(Ok(found()));

        assert!(!state.loading);
        assert_eq!(state.rows.len(), 1);
        assert_eq!(state.headers, vec!["RUT", "Nombre"]);
        assert!(state.error.is_empty());
    }

    #[test]
    fn test_error_cycle() {
        let mut state = ViewState::new("1-9");
        state.begin_submit();
        state.apply(Err("No se encontraron datos para el RUT: 1-9".into()));

        assert!(!state.loading);
        assert!(state.rows.is_empty());
        assert_eq!(state.error, "No se encontraron datos para el RUT: 1-9");
    }

    #[test]
    fn test_labels_fall_back() {
        let headers = vec!["RUT".to_string(), String::new()];

        assert_eq!(label_for(&headers, 0), "RUT");
        assert_eq!(label_for(&headers, 1), "Columna 2");
        assert_eq!(label_for(&headers, 2), "Columna 3");
        assert_eq!(label_for(&[], 0), "Columna 1");
    }

    #[test]
    fn test_fields() {
        let mut state = ViewState::default();
        state.apply(Ok(found()));

        let fields = state.fields();

        assert_eq!(fields.len(), 1);
        assert_eq!(
            fields[0],
            vec![
                Field {
                    key: "0-0".into(),
                    label: "RUT".into(),
                    value: "22222222-2".into()
                },
                Field {
                    key: "0-1".into(),
                    label: "Nombre".into(),
                    value: "Luis".into()
                },
                Field {
                    key: "0-2".into(),
                    label: "Columna 3".into(),
                    value: "Rust I".into()
                },
            ]
        );
    }

    #[test]
    fn test_copy_expires_after_two_seconds() {
        let mut state = ViewState::default();
        state.mark_copied("0-1", 10_000);

        assert!(state.is_copied("0-1", 10_000));
        assert!(state.is_copied("0-1", 11_999));
        assert!(!state.is_copied("0-1", 12_000));
        assert!(!state.is_copied("0-0", 10_000));
    }

    #[test]
    fn test_copy_timers_independent() {
        let mut state = ViewState::default();
        state.mark_copied("0-0", 10_000);
        state.mark_copied("0-1", 11_500);

        assert!(!state.is_copied("0-0", 12_100));
        assert!(state.is_copied("0-1", 12_100));

        state.expire_copied(12_100);

        assert!(!state.copied.contains_key("0-0"));
        assert!(state.copied.contains_key("0-1"));
    }

    #[test]
    fn test_copy_again_extends() {
        let mut state = ViewState::default();
        state.mark_copied("0-0", 10_000);
        state.mark_copied("0-0", 11_000);

        assert!(state.is_copied("0-0", 12_500));
    }

    #[test]
    fn test_render_idle() {
        let html = render(&ViewState::default(), 0);

        assert!(html.contains("Revisa tus datos aquí"));
        assert!(html.contains(">Buscar</button>"));
        assert!(html.contains("data-copy-ms=\"2000\""));
        assert!(!html.contains("resultado-grid\">"));
    }

    #[test]
    fn test_render_results() {
        let mut state = ViewState::new("22222222-2");
        state.apply(Ok(found()));
        state.mark_copied("0-1", 0);

        let html = render(&state, 500);

        assert!(html.contains("Información del Alumno"));
        assert!(html.contains("<span class=\"label\">Nombre</span><span class=\"value\">Luis</span>"));
        assert!(html.contains("<span class=\"label\">Columna 3</span>"));
        assert!(html.contains("data-key=\"0-1\" data-value=\"Luis\">¡Copiado!</button>"));
        assert!(html.contains("data-key=\"0-0\" data-value=\"22222222-2\">Copiar</button>"));
    }

    #[test]
    fn test_render_error_and_loading() {
        let mut state = ViewState::new("1-9");
        state.begin_submit();
        state.fail("La hoja está vacía.");

        let html = render(&state, 0);

        assert!(html.contains("<p class=\"error\">La hoja está vacía.</p>"));
        assert!(html.contains(">Buscando...</button>"));
    }

    #[test]
    fn test_render_escapes() {
        let mut state = ViewState::new("\"><script>alert(1)</script>");
        state.apply(Ok(LookupResult {
            data: vec![vec!["<b>x</b>".into()]],
            headers: vec!["A & B".into()],
        }));

        let html = render(&state, 0);

        assert!(!html.contains("<script>alert(1)"));
        assert!(!html.contains("<b>x</b>"));
        assert!(html.contains("&lt;b&gt;x&lt;/b&gt;"));
        assert!(html.contains("A &amp; B"));
        assert!(html.contains("\\u003cscript>"));
    }
}
