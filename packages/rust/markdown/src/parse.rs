//! Markdown → [`Node`] tree, built from `pulldown-cmark` offset events.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag};
use tracing::{debug, instrument};

use crate::ast::{Node, Position};

/// Parse Markdown into a `root` node.
///
/// Inline raw HTML stays attached to its parent as `html` children, so an
/// anchor written inside a heading (`## Title <a name="t"></a>`) is a child of
/// that heading. Headings carry their 1-based source line.
#[instrument(skip_all, fields(len = markdown.len()))]
pub fn parse(markdown: &str) -> Node {
    let line_starts = line_starts(markdown);
    let mut stack: Vec<Node> = vec![Node::root(Vec::new())];

    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);

    for (event, range) in Parser::new_ext(markdown, options).into_offset_iter() {
        match event {
            Event::Start(tag) => stack.push(open(tag, line_of(&line_starts, range.start))),
            Event::End(_) => {
                // Root is never closed by an event.
                if stack.len() > 1 {
                    if let Some(node) = stack.pop() {
                        append(&mut stack, close(node));
                    }
                }
            }
            Event::Text(text) => push_text(&mut stack, &text),
            Event::Code(code) => append(&mut stack, Node::inline_code(code.to_string())),
            Event::Html(html) | Event::InlineHtml(html) => match stack.last_mut() {
                Some(Node::Html { value }) => value.push_str(&html),
                _ => append(&mut stack, Node::html(html.to_string())),
            },
            Event::SoftBreak => push_text(&mut stack, "\n"),
            Event::HardBreak => append(&mut stack, Node::Break),
            Event::Rule => append(&mut stack, Node::ThematicBreak),
            _ => {}
        }
    }

    while stack.len() > 1 {
        if let Some(node) = stack.pop() {
            append(&mut stack, close(node));
        }
    }

    let root = stack.pop().unwrap_or_else(|| Node::root(Vec::new()));
    debug!(top_level = root.children().len(), "markdown parsed");
    root
}

fn open(tag: Tag<'_>, line: usize) -> Node {
    match tag {
        Tag::Paragraph => Node::paragraph(Vec::new()),
        Tag::Heading { level, .. } => Node::Heading {
            depth: level as u8,
            children: Vec::new(),
            position: Some(Position { start_line: line }),
        },
        Tag::BlockQuote(_) => Node::Blockquote {
            children: Vec::new(),
        },
        Tag::CodeBlock(kind) => Node::Code {
            lang: match kind {
                CodeBlockKind::Fenced(info) => info.split_whitespace().next().map(str::to_string),
                CodeBlockKind::Indented => None,
            },
            value: String::new(),
        },
        Tag::HtmlBlock => Node::html(String::new()),
        Tag::List(start) => Node::List {
            ordered: start.is_some(),
            start,
            loose: false,
            children: Vec::new(),
        },
        Tag::Item => Node::list_item(Vec::new()),
        Tag::Emphasis => Node::Emphasis {
            children: Vec::new(),
        },
        Tag::Strong => Node::Strong {
            children: Vec::new(),
        },
        Tag::Strikethrough => Node::Delete {
            children: Vec::new(),
        },
        Tag::Link {
            dest_url, title, ..
        } => Node::Link {
            url: dest_url.to_string(),
            title: (!title.is_empty()).then(|| title.to_string()),
            children: Vec::new(),
        },
        Tag::Image { dest_url, .. } => Node::Image {
            url: dest_url.to_string(),
            alt: String::new(),
        },
        // Extensions we don't enable; keep their content.
        _ => Node::paragraph(Vec::new()),
    }
}

/// Finalize a container once its end event arrives.
fn close(mut node: Node) -> Node {
    // pulldown-cmark only wraps item content in paragraphs for loose lists.
    if let Node::List {
        loose, children, ..
    } = &mut node
    {
        *loose = children.iter().any(|item| {
            item.children()
                .iter()
                .any(|c| matches!(c, Node::Paragraph { .. }))
        });
    }
    node
}

fn append(stack: &mut [Node], node: Node) {
    let Some(top) = stack.last_mut() else {
        return;
    };

    if let Node::Image { alt, .. } = top {
        alt.push_str(&node.to_plain_string());
    } else if let Some(children) = top.children_mut() {
        children.push(node);
    }
}

/// Append text to the open node, merging with a preceding text sibling.
fn push_text(stack: &mut [Node], text: &str) {
    let Some(top) = stack.last_mut() else {
        return;
    };

    if let Node::Code { value, .. } | Node::Html { value } | Node::Image { alt: value, .. } = top {
        value.push_str(text);
    } else if let Some(children) = top.children_mut() {
        if let Some(Node::Text { value }) = children.last_mut() {
            value.push_str(text);
        } else {
            children.push(Node::text(text));
        }
    }
}

fn line_starts(text: &str) -> Vec<usize> {
    std::iter::once(0)
        .chain(text.match_indices('\n').map(|(i, _)| i + 1))
        .collect()
}

/// 1-based line containing byte `offset`.
fn line_of(line_starts: &[usize], offset: usize) -> usize {
    line_starts.partition_point(|&start| start <= offset).max(1)
}
