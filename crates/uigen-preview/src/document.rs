//! HTML documents loaded into the preview frame.
//!
//! A document carries everything the frame needs to run a bundle without a
//! server: the styling layer, an import map for the framework runtime, the
//! error shim that reports failures to the host, and the bundle itself,
//! embedded as a string and imported from a blob URL.
//!
//! # Examples
//!
//! ```
//! use uigen_preview::document::{DocumentContext, DocumentRenderer};
//!
//! let renderer = DocumentRenderer::new().unwrap();
//! let context = DocumentContext::builder("/App.jsx", "export default () => null;")
//!     .styling_url("https://cdn.tailwindcss.com")
//!     .import("react", "https://esm.sh/react@19.1.0")
//!     .build();
//!
//! let html = renderer.render(&context).unwrap();
//! assert!(html.contains("<title>/App.jsx</title>"));
//! ```

use handlebars::Handlebars;
use serde::Serialize;
use std::collections::BTreeMap;
use uigen_core::{Error, ExternalModules, Result};

const DOCUMENT_TEMPLATE: &str = "document";

/// Inputs of one preview document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentContext {
    /// Document title, usually the entry path
    pub title: String,
    /// Frame the document is rendered for
    pub frame_id: String,
    /// URL of the styling runtime script
    pub styling_url: String,
    /// Collected project CSS
    pub stylesheet: String,
    /// Bare name to URL mapping exposed to module scripts
    pub imports: BTreeMap<String, String>,
    /// Linked bundle code
    pub bundle: String,
}

impl DocumentContext {
    /// Starts a context for `bundle` titled `title`.
    #[must_use]
    pub fn builder(title: impl Into<String>, bundle: impl Into<String>) -> DocumentContextBuilder {
        DocumentContextBuilder {
            context: Self {
                title: title.into(),
                frame_id: String::new(),
                styling_url: String::new(),
                stylesheet: String::new(),
                imports: BTreeMap::new(),
                bundle: bundle.into(),
            },
        }
    }
}

/// Builder for [`DocumentContext`].
#[derive(Debug, Clone)]
pub struct DocumentContextBuilder {
    context: DocumentContext,
}

impl DocumentContextBuilder {
    /// Sets the frame id written into the document and its reports.
    #[must_use]
    pub fn frame_id(mut self, id: impl Into<String>) -> Self {
        self.context.frame_id = id.into();
        self
    }

    /// Sets the styling runtime URL.
    #[must_use]
    pub fn styling_url(mut self, url: impl Into<String>) -> Self {
        self.context.styling_url = url.into();
        self
    }

    /// Sets the project CSS.
    #[must_use]
    pub fn stylesheet(mut self, css: impl Into<String>) -> Self {
        self.context.stylesheet = css.into();
        self
    }

    /// Adds an import map entry.
    #[must_use]
    pub fn import(mut self, name: impl Into<String>, url: impl Into<String>) -> Self {
        self.context.imports.insert(name.into(), url.into());
        self
    }

    /// Adds several import map entries.
    #[must_use]
    pub fn imports<'a>(mut self, entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        for (name, url) in entries {
            self.context.imports.insert(name.to_string(), url.to_string());
        }
        self
    }

    /// Finishes the context.
    #[must_use]
    pub fn build(self) -> DocumentContext {
        self.context
    }
}

/// Values handed to the template. Everything spliced into a `<script>` is
/// pre-encoded as a script-safe JSON literal.
#[derive(Serialize)]
struct TemplateData<'a> {
    title: &'a str,
    frame_id: &'a str,
    styling_url: &'a str,
    stylesheet: String,
    import_map: String,
    framework: String,
    mount: String,
    bundle: String,
}

/// Handlebars wrapper holding the preview document template.
///
/// # Thread Safety
///
/// This type is `Send` and `Sync`; a frame thread owns its own instance.
#[derive(Debug)]
pub struct DocumentRenderer<'a> {
    handlebars: Handlebars<'a>,
}

impl DocumentRenderer<'_> {
    /// Creates a renderer with the built-in document template.
    ///
    /// # Errors
    ///
    /// Returns an error if the template fails to register.
    pub fn new() -> Result<Self> {
        let mut handlebars = Handlebars::new();

        // Strict mode: fail on missing variables
        handlebars.set_strict_mode(true);

        handlebars
            .register_template_string(
                DOCUMENT_TEMPLATE,
                include_str!("../templates/document.html.hbs"),
            )
            .map_err(|e| Error::SerializationError {
                message: format!("Failed to register preview document template: {e}"),
                source: None,
            })?;

        Ok(Self { handlebars })
    }

    /// Renders the document for `context`.
    ///
    /// # Errors
    ///
    /// Returns an error if a value cannot be encoded or rendering fails.
    pub fn render(&self, context: &DocumentContext) -> Result<String> {
        let import_map = serde_json::json!({ "imports": context.imports });
        let data = TemplateData {
            title: &context.title,
            frame_id: &context.frame_id,
            styling_url: &context.styling_url,
            stylesheet: script_json(&context.stylesheet)?,
            import_map: script_json(&import_map)?,
            framework: script_json(ExternalModules::FRAMEWORK)?,
            mount: script_json(ExternalModules::MOUNT)?,
            bundle: script_json(&context.bundle)?,
        };

        self.handlebars
            .render(DOCUMENT_TEMPLATE, &data)
            .map_err(|e| Error::SerializationError {
                message: format!("Preview document rendering failed: {e}"),
                source: None,
            })
    }
}

/// JSON literal that cannot close the surrounding `<script>` element.
fn script_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let json = serde_json::to_string(value).map_err(|e| Error::SerializationError {
        message: format!("Failed to encode preview document value: {e}"),
        source: Some(e),
    })?;
    Ok(json.replace("</", "<\\/").replace("<!--", "<\\!--"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(context: &DocumentContext) -> String {
        DocumentRenderer::new().unwrap().render(context).unwrap()
    }

    #[test]
    fn test_document_contains_runtime_pieces() {
        let context = DocumentContext::builder("/App.jsx", "export default 1;")
            .frame_id("f-1")
            .styling_url("https://cdn.tailwindcss.com")
            .stylesheet(".card { color: red; }")
            .import("react", "https://esm.sh/react")
            .import("react-dom/client", "https://esm.sh/react-dom/client")
            .build();
        let html = render(&context);

        assert!(html.contains("<script src=\"https://cdn.tailwindcss.com\"></script>"));
        assert!(html.contains("style.textContent = \".card { color: red; }\";"));
        assert!(html.contains(
            r#"<script type="importmap">{"imports":{"react":"https://esm.sh/react","react-dom/client":"https://esm.sh/react-dom/client"}}</script>"#
        ));
        assert!(html.contains("import { createRoot } from \"react-dom/client\";"));
        assert!(html.contains("const source = \"export default 1;\";"));
        assert!(html.contains("type: \"uigen:error\""));
        assert!(html.contains("var frameId = \"f-1\";"));
    }

    #[test]
    fn test_bundle_cannot_break_out_of_script() {
        let bundle = "const s = \"</script><script>alert(1)</script>\";";
        let html = render(&DocumentContext::builder("/App.jsx", bundle).build());
        assert!(!html.contains("</script><script>alert(1)"));
        assert!(html.contains(r"<\/script><script>alert(1)<\/script>"));
    }

    #[test]
    fn test_title_is_escaped() {
        let html = render(&DocumentContext::builder("<b>x</b>", "").build());
        assert!(html.contains("<title>&lt;b&gt;x&lt;/b&gt;</title>"));
    }

    #[test]
    fn test_stylesheet_cannot_close_style() {
        let css = "a{}</style><script>alert(1)</script><!-- b{}";
        let html = render(&DocumentContext::builder("/App.jsx", "").stylesheet(css).build());

        assert!(!html.contains("</style><script>"));
        assert!(!html.contains("alert(1)</script>"));
        assert!(html.contains(
            r#"style.textContent = "a{}<\/style><script>alert(1)<\/script><\!-- b{}";"#
        ));
        assert_eq!(html.matches("<style>").count(), 1);
    }

    #[test]
    fn test_stylesheet_with_quotes_and_newlines() {
        let css = "a::before {\n  content: \"\\201C\";\n}";
        let html = render(&DocumentContext::builder("/App.jsx", "").stylesheet(css).build());
        assert!(html.contains(r#"style.textContent = "a::before {\n  content: \"\\201C\";\n}";"#));
    }
}
