//! Document tree produced by [`crate::parse`] and consumed by transforms and
//! the HTML renderer.
//!
//! Node kinds and their JSON shape follow mdast (`{"type": "heading", ...}`),
//! so a serialized tree reads the same as one from a remark pipeline.

use serde::{Deserialize, Serialize};

use doctools_shared::Result;

/// Source position of a node (1-based line).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub start_line: usize,
}

/// A node in the document tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Node {
    Root {
        children: Vec<Node>,
    },
    Heading {
        depth: u8,
        children: Vec<Node>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        position: Option<Position>,
    },
    Paragraph {
        children: Vec<Node>,
    },
    Blockquote {
        children: Vec<Node>,
    },
    List {
        ordered: bool,
        start: Option<u64>,
        loose: bool,
        children: Vec<Node>,
    },
    ListItem {
        children: Vec<Node>,
    },
    Code {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lang: Option<String>,
        value: String,
    },
    /// Raw embedded markup, passed through to the renderer untouched.
    Html {
        value: String,
    },
    ThematicBreak,
    Text {
        value: String,
    },
    Emphasis {
        children: Vec<Node>,
    },
    Strong {
        children: Vec<Node>,
    },
    Delete {
        children: Vec<Node>,
    },
    InlineCode {
        value: String,
    },
    Break,
    Link {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        children: Vec<Node>,
    },
    Image {
        url: String,
        alt: String,
    },
}

impl Node {
    pub fn root(children: Vec<Node>) -> Self {
        Node::Root { children }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Node::Text {
            value: value.into(),
        }
    }

    pub fn html(value: impl Into<String>) -> Self {
        Node::Html {
            value: value.into(),
        }
    }

    pub fn inline_code(value: impl Into<String>) -> Self {
        Node::InlineCode {
            value: value.into(),
        }
    }

    /// A heading without source position (used for generated content).
    pub fn heading(depth: u8, children: Vec<Node>) -> Self {
        Node::Heading {
            depth,
            children,
            position: None,
        }
    }

    pub fn paragraph(children: Vec<Node>) -> Self {
        Node::Paragraph { children }
    }

    /// A tight, unordered list.
    pub fn bullet_list(children: Vec<Node>) -> Self {
        Node::List {
            ordered: false,
            start: None,
            loose: false,
            children,
        }
    }

    pub fn list_item(children: Vec<Node>) -> Self {
        Node::ListItem { children }
    }

    pub fn link(url: impl Into<String>, children: Vec<Node>) -> Self {
        Node::Link {
            url: url.into(),
            title: None,
            children,
        }
    }

    /// Child nodes, empty for leaves.
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Root { children }
            | Node::Heading { children, .. }
            | Node::Paragraph { children }
            | Node::Blockquote { children }
            | Node::List { children, .. }
            | Node::ListItem { children }
            | Node::Emphasis { children }
            | Node::Strong { children }
            | Node::Delete { children }
            | Node::Link { children, .. } => children,
            Node::Code { .. }
            | Node::Html { .. }
            | Node::ThematicBreak
            | Node::Text { .. }
            | Node::InlineCode { .. }
            | Node::Break
            | Node::Image { .. } => &[],
        }
    }

    /// Mutable child list, `None` for leaves.
    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match self {
            Node::Root { children }
            | Node::Heading { children, .. }
            | Node::Paragraph { children }
            | Node::Blockquote { children }
            | Node::List { children, .. }
            | Node::ListItem { children }
            | Node::Emphasis { children }
            | Node::Strong { children }
            | Node::Delete { children }
            | Node::Link { children, .. } => Some(children),
            Node::Code { .. }
            | Node::Html { .. }
            | Node::ThematicBreak
            | Node::Text { .. }
            | Node::InlineCode { .. }
            | Node::Break
            | Node::Image { .. } => None,
        }
    }

    /// Whether the node renders as a block-level element.
    pub fn is_block(&self) -> bool {
        matches!(
            self,
            Node::Root { .. }
                | Node::Heading { .. }
                | Node::Paragraph { .. }
                | Node::Blockquote { .. }
                | Node::List { .. }
                | Node::ListItem { .. }
                | Node::Code { .. }
                | Node::ThematicBreak
        )
    }

    /// Concatenated text content (`text`, `inlineCode` and code values),
    /// ignoring raw markup.
    pub fn to_plain_string(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text { value } | Node::InlineCode { value } | Node::Code { value, .. } => {
                out.push_str(value)
            }
            Node::Image { alt, .. } => out.push_str(alt),
            _ => {
                for child in self.children() {
                    child.collect_text(out);
                }
            }
        }
    }

    /// Visit every node in document (pre-order) order together with its
    /// child-index path from `self`. The first error stops the walk.
    pub fn walk<'a, F>(&'a self, f: &mut F) -> Result<()>
    where
        F: FnMut(&'a Node, &[usize]) -> Result<()>,
    {
        let mut path = Vec::new();
        self.walk_inner(&mut path, f)
    }

    fn walk_inner<'a, F>(&'a self, path: &mut Vec<usize>, f: &mut F) -> Result<()>
    where
        F: FnMut(&'a Node, &[usize]) -> Result<()>,
    {
        f(self, path)?;
        for (i, child) in self.children().iter().enumerate() {
            path.push(i);
            child.walk_inner(path, f)?;
            path.pop();
        }
        Ok(())
    }

    /// Resolve a child-index path produced by [`Node::walk`].
    pub fn node_at_path_mut(&mut self, path: &[usize]) -> Option<&mut Node> {
        let mut node = self;
        for &i in path {
            node = node.children_mut()?.get_mut(i)?;
        }
        Some(node)
    }
}
