//! [`Node`] tree → HTML.

use crate::ast::Node;

/// Options for [`render_html`].
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Wrap the body in a full `<!DOCTYPE html>` document.
    pub complete_document: bool,
    /// Document title (only used with `complete_document`).
    pub title: Option<String>,
}

/// Render a tree to HTML.
pub fn render_html(root: &Node, opts: &RenderOptions) -> String {
    let mut body = String::new();
    write_node(&mut body, root);

    if !opts.complete_document {
        return body;
    }

    let title = opts.title.as_deref().unwrap_or("Untitled");
    let mut html = String::from("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{}</title>\n", escape_text(title)));
    html.push_str("</head>\n<body>\n");
    html.push_str(&body);
    html.push_str("</body>\n</html>\n");
    html
}

fn write_children(out: &mut String, children: &[Node]) {
    for child in children {
        write_node(out, child);
    }
}

fn write_node(out: &mut String, node: &Node) {
    match node {
        Node::Root { children } => write_children(out, children),
        Node::Heading {
            depth, children, ..
        } => {
            out.push_str(&format!("<h{depth}>"));
            write_children(out, children);
            out.push_str(&format!("</h{depth}>\n"));
        }
        // A paragraph holding block content (the generated index page) can't be a <p>.
        Node::Paragraph { children } if children.iter().any(Node::is_block) => {
            out.push_str("<div>\n");
            write_children(out, children);
            out.push_str("</div>\n");
        }
        Node::Paragraph { children } => {
            out.push_str("<p>");
            write_children(out, children);
            out.push_str("</p>\n");
        }
        Node::Blockquote { children } => {
            out.push_str("<blockquote>\n");
            write_children(out, children);
            out.push_str("</blockquote>\n");
        }
        Node::List {
            ordered, start, children, ..
        } => {
            let tag = if *ordered { "ol" } else { "ul" };
            match start {
                Some(n) if *ordered && *n != 1 => out.push_str(&format!("<ol start=\"{n}\">\n")),
                _ => out.push_str(&format!("<{tag}>\n")),
            }
            write_children(out, children);
            out.push_str(&format!("</{tag}>\n"));
        }
        Node::ListItem { children } => {
            out.push_str("<li>");
            write_children(out, children);
            out.push_str("</li>\n");
        }
        Node::Code { lang, value } => {
            match lang {
                Some(lang) => out.push_str(&format!(
                    "<pre><code class=\"language-{}\">",
                    html_escape(lang)
                )),
                None => out.push_str("<pre><code>"),
            }
            out.push_str(&escape_text(value));
            out.push_str("</code></pre>\n");
        }
        Node::Html { value } => out.push_str(value),
        Node::ThematicBreak => out.push_str("<hr />\n"),
        Node::Text { value } => out.push_str(&escape_text(value)),
        Node::Emphasis { children } => wrap(out, "em", children),
        Node::Strong { children } => wrap(out, "strong", children),
        Node::Delete { children } => wrap(out, "del", children),
        Node::InlineCode { value } => {
            out.push_str("<code>");
            out.push_str(&escape_text(value));
            out.push_str("</code>");
        }
        Node::Break => out.push_str("<br />\n"),
        Node::Link {
            url,
            title,
            children,
        } => {
            out.push_str(&format!("<a href=\"{}\"", html_escape(url)));
            if let Some(title) = title {
                out.push_str(&format!(" title=\"{}\"", html_escape(title)));
            }
            out.push('>');
            write_children(out, children);
            out.push_str("</a>");
        }
        Node::Image { url, alt } => out.push_str(&format!(
            "<img src=\"{}\" alt=\"{}\" />",
            html_escape(url),
            html_escape(alt)
        )),
    }
}

fn wrap(out: &mut String, tag: &str, children: &[Node]) {
    out.push_str(&format!("<{tag}>"));
    write_children(out, children);
    out.push_str(&format!("</{tag}>"));
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(node: &Node) -> String {
        render_html(node, &RenderOptions::default())
    }

    #[test]
    fn renders_basic_blocks() {
        let root = Node::root(vec![
            Node::heading(2, vec![Node::html("<a name=\"x\"></a>"), Node::text("A & B")]),
            Node::paragraph(vec![
                Node::text("see "),
                Node::link("#x", vec![Node::inline_code("<T>")]),
            ]),
        ]);

        assert_eq!(
            fragment(&root),
            "<h2><a name=\"x\"></a>A &amp; B</h2>\n<p>see <a href=\"#x\"><code>&lt;T&gt;</code></a></p>\n"
        );
    }

    #[test]
    fn paragraph_with_blocks_becomes_div() {
        let root = Node::paragraph(vec![
            Node::heading(1, vec![Node::text("Index Page")]),
            Node::Break,
            Node::bullet_list(vec![]),
        ]);

        assert_eq!(
            fragment(&root),
            "<div>\n<h1>Index Page</h1>\n<br />\n<ul>\n</ul>\n</div>\n"
        );
    }

    #[test]
    fn ordered_list_start() {
        let list = Node::List {
            ordered: true,
            start: Some(3),
            loose: false,
            children: vec![Node::list_item(vec![Node::text("c")])],
        };
        assert_eq!(fragment(&list), "<ol start=\"3\">\n<li>c</li>\n</ol>\n");
    }

    #[test]
    fn complete_document_wraps_body() {
        let root = Node::root(vec![Node::paragraph(vec![Node::text("hi")])]);
        let html = render_html(
            &root,
            &RenderOptions {
                complete_document: true,
                title: Some("Guide \"1\"".into()),
            },
        );

        assert!(html.starts_with("<!DOCTYPE html>\n"));
        assert!(html.contains("<title>Guide \"1\"</title>"));
        assert!(html.contains("<body>\n<p>hi</p>\n</body>"));
    }

    #[test]
    fn link_and_image_attributes_are_escaped() {
        let root = Node::root(vec![Node::paragraph(vec![
            Node::Link {
                url: "/search?a=1&b=\"x\"".into(),
                title: Some("<Tips>".into()),
                children: vec![Node::text("a & b")],
            },
            Node::Image {
                url: "logo.png".into(),
                alt: "say \"hi\"".into(),
            },
        ])]);

        assert_eq!(
            fragment(&root),
            "<p><a href=\"/search?a=1&amp;b=&quot;x&quot;\" title=\"&lt;Tips&gt;\">a &amp; b</a>\
             <img src=\"logo.png\" alt=\"say &quot;hi&quot;\" /></p>\n"
        );
    }
}
