//! Rendering for the HTML page surface.
//!
//! Page handlers build a [`View`] (a template name plus a JSON context) and hand
//! it to the [`ViewRenderer`] held in application state. The bundled
//! [`HtmlShellRenderer`] produces a document that embeds the context for a
//! client-side front end; a server-side template engine can be plugged in by
//! implementing the trait.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("failed to serialize context for view '{view}': {source}")]
    Context {
        view: String,
        source: serde_json::Error,
    },
}

/// A named template and the data it is rendered with.
#[derive(Debug, Clone)]
pub struct View {
    pub name: &'static str,
    pub context: Value,
}

impl View {
    pub fn new(name: &'static str, context: impl Serialize) -> Result<Self, ViewError> {
        let context = serde_json::to_value(context).map_err(|source| ViewError::Context {
            view: name.to_string(),
            source,
        })?;
        Ok(Self { name, context })
    }
}

pub trait ViewRenderer: Send + Sync {
    fn render(&self, view: &View) -> Result<String, ViewError>;
}

/// Renders every view as an HTML shell carrying the view name and its context
/// as JSON in `<script id="view-context">`.
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlShellRenderer;

impl ViewRenderer for HtmlShellRenderer {
    fn render(&self, view: &View) -> Result<String, ViewError> {
        let context =
            serde_json::to_string(&view.context).map_err(|source| ViewError::Context {
                view: view.name.to_string(),
                source,
            })?;

        Ok(format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{name}</title>\n</head>\n<body data-view=\"{name}\">\n<script id=\"view-context\" type=\"application/json\">{context}</script>\n</body>\n</html>\n",
            name = view.name,
            context = escape_script_json(&context),
        ))
    }
}

/// Keep embedded JSON from terminating the surrounding `<script>` element.
fn escape_script_json(json: &str) -> String {
    json.replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}

/// Render `view` into an HTML response with the given status.
pub fn render_page(
    renderer: &dyn ViewRenderer,
    status: StatusCode,
    view: &View,
) -> Result<Response, ViewError> {
    let html = renderer.render(view)?;
    Ok((status, Html(html)).into_response())
}
