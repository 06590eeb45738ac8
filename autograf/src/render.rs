//! Dashboard template rendering.

use handlebars::Handlebars;
use serde::Serialize;

use crate::error::AutografResult;

/// The closed set of fields available to dashboard templates.
///
/// Templates reference these as `{{title}}` and `{{namespace}}`; any other
/// reference fails the render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderContext {
    /// Human-readable dashboard title, from the namespace's dashboard-name
    /// label. Empty when the label is absent.
    pub title: String,
    /// Name of the namespace the dashboard is provisioned for.
    pub namespace: String,
}

/// Renders a dashboard template with the given context.
///
/// Substitution is deterministic: the same template and context always
/// produce byte-identical output. Unknown references in the template are an
/// authoring mistake and surface as an error instead of rendering as empty
/// strings.
pub fn render_dashboard(template: &str, context: &RenderContext) -> AutografResult<String> {
    let mut registry = Handlebars::new();
    registry.set_strict_mode(true);

    let rendered = registry.render_template(template, context)?;

    Ok(rendered)
}
