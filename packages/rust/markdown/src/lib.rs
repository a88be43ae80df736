//! Markdown-to-HTML conversion with pluggable tree transforms.
//!
//! Parses Markdown into a [`Node`] tree with `pulldown-cmark`, runs any
//! [`Transform`]s over the tree in order, then renders HTML.

pub mod ast;
pub mod parse;
pub mod render;

use tracing::{debug, instrument};

use doctools_shared::{HtmlConfig, Result};

pub use ast::{Node, Position};
pub use parse::parse;
pub use render::{RenderOptions, render_html};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// A pass that rewrites a parsed document in place.
pub trait Transform {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Rewrite the tree. An error aborts the whole conversion.
    fn apply(&self, root: &mut Node) -> Result<()>;
}

/// Result of converting a Markdown document to HTML.
#[derive(Debug, Clone)]
pub struct ConvertResult {
    /// The rendered HTML.
    pub html: String,
    /// Document title (configured, or the first heading's text).
    pub title: String,
    /// Number of headings in the transformed tree.
    pub heading_count: usize,
}

/// Options for the Markdown-to-HTML conversion.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Emit a full HTML document instead of a fragment.
    pub complete_document: bool,
    /// Override title (if `None`, extracted from the first heading).
    pub title: Option<String>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self::from(&HtmlConfig::default())
    }
}

impl From<&HtmlConfig> for ConvertOptions {
    fn from(config: &HtmlConfig) -> Self {
        Self {
            complete_document: config.complete_document,
            title: config.title.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Converter
// ---------------------------------------------------------------------------

/// Convert Markdown to HTML.
///
/// 1. Parses Markdown into a tree
/// 2. Applies each transform in order (stopping at the first error)
/// 3. Renders the transformed tree
#[instrument(skip(markdown, transforms), fields(len = markdown.len()))]
pub fn convert(
    markdown: &str,
    opts: &ConvertOptions,
    transforms: &[&dyn Transform],
) -> Result<ConvertResult> {
    let mut root = parse(markdown);

    for transform in transforms {
        debug!(transform = transform.name(), "applying transform");
        transform.apply(&mut root)?;
    }

    let title = opts
        .title
        .clone()
        .or_else(|| first_heading_text(&root))
        .unwrap_or_else(|| "Untitled".to_string());

    let html = render_html(
        &root,
        &RenderOptions {
            complete_document: opts.complete_document,
            title: Some(title.clone()),
        },
    );

    let heading_count = count_headings(&root);

    debug!(
        title = %title,
        heading_count,
        html_len = html.len(),
        "conversion complete"
    );

    Ok(ConvertResult {
        html,
        title,
        heading_count,
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Plain text of the first heading in document order.
pub fn first_heading_text(root: &Node) -> Option<String> {
    match root {
        Node::Heading { .. } => Some(root.to_plain_string().trim().to_string()),
        _ => root.children().iter().find_map(first_heading_text),
    }
}

fn count_headings(root: &Node) -> usize {
    let own = usize::from(matches!(root, Node::Heading { .. }));
    own + root.children().iter().map(count_headings).sum::<usize>()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use doctools_shared::DocToolsError;

    struct Uppercase;

    impl Transform for Uppercase {
        fn name(&self) -> &str {
            "uppercase"
        }

        fn apply(&self, root: &mut Node) -> Result<()> {
            if let Node::Text { value } = root {
                *value = value.to_uppercase();
            }
            for child in root.children_mut().into_iter().flatten() {
                self.apply(child)?;
            }
            Ok(())
        }
    }

    struct Failing;

    impl Transform for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn apply(&self, _root: &mut Node) -> Result<()> {
            Err(DocToolsError::validation("boom"))
        }
    }

    fn fragment_opts() -> ConvertOptions {
        ConvertOptions {
            complete_document: false,
            title: None,
        }
    }

    #[test]
    fn convert_simple_markdown() {
        let result = convert("# Hello World\n\nSome text.\n", &fragment_opts(), &[]).unwrap();

        assert_eq!(result.html, "<h1>Hello World</h1>\n<p>Some text.</p>\n");
        assert_eq!(result.title, "Hello World");
        assert_eq!(result.heading_count, 1);
    }

    #[test]
    fn convert_complete_document_by_default() {
        let result = convert("text only\n", &ConvertOptions::default(), &[]).unwrap();

        assert!(result.html.starts_with("<!DOCTYPE html>"));
        assert!(result.html.contains("<title>Untitled</title>"));
    }

    #[test]
    fn transforms_run_in_order() {
        let result = convert("# hi\n", &fragment_opts(), &[&Uppercase]).unwrap();
        assert_eq!(result.html, "<h1>HI</h1>\n");
        assert_eq!(result.title, "HI");
    }

    #[test]
    fn transform_error_aborts() {
        let err = convert("# hi\n", &fragment_opts(), &[&Failing, &Uppercase]).unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn first_heading_is_found_in_nested_blocks() {
        let root = parse("> ## Quoted `title`\n\n# Later\n");
        assert_eq!(first_heading_text(&root).as_deref(), Some("Quoted title"));
        assert_eq!(count_headings(&root), 2);
    }
}
