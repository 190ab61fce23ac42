use anyhow::{Context, Result};
use handlebars::Handlebars;
use std::collections::BTreeMap;

/// Renders downloaded template files using Handlebars
pub struct TemplateRenderer {
    handlebars: Handlebars<'static>,
}

impl TemplateRenderer {
    /// Create a new template renderer
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(escape_markup);

        Self { handlebars }
    }

    /// Render `content` with the session variables as context.
    ///
    /// Output is escaped; missing variables render empty.
    pub fn render(
        &self,
        name: &str,
        content: &str,
        variables: &BTreeMap<String, String>,
    ) -> Result<String> {
        self.handlebars
            .render_template(content, variables)
            .with_context(|| format!("Failed to render template: {}", name))
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Escape the five markup-significant characters, leaving `=` and backticks alone so
/// rendered config files keep their values intact
fn escape_markup(data: &str) -> String {
    let mut escaped = String::with_capacity(data.len());
    for c in data.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
