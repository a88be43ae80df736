//! Index page builder.
//!
//! Headings may carry an anchor annotation in raw markup:
//!
//! ```text
//! ## <a name="own" tags="memory safety, ownership"></a>Ownership
//! ```
//!
//! Every tag key collects references to the anchors that declare it. The
//! first heading whose text is the placeholder sentinel is replaced by a
//! generated index page: one section per tag key, in collation order, listing
//! its references and "See Also" links to keys sharing an anchor.
//!
//! The builder is two-pass. Annotations are collected over the whole tree
//! first, then the placeholder is replaced once, so the placeholder may appear
//! anywhere in the document.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, instrument};

use doctools_markdown::{Node, Transform};
use doctools_shared::{DocToolsError, IndexConfig, Result};

static TAGS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"tags\s*=\s*"((:?[-a-zA-Z_ ]+[-a-zA-Z_*0-9]*(,\s*)?)*)""#).expect("valid regex")
});

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"name\s*=\s*"([a-zA-Z0-9_*.\- ]+)""#).expect("valid regex")
});

// ---------------------------------------------------------------------------
// Entry table
// ---------------------------------------------------------------------------

/// One tagged anchor, labelled with its heading's inline text.
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    pub anchor: String,
    pub name_parts: Vec<Node>,
}

/// All references for one tag key, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexEntry {
    pub refs: Vec<Reference>,
}

/// Tag key → entry.
#[derive(Debug, Clone, Default)]
pub struct IndexEntries {
    entries: HashMap<String, IndexEntry>,
}

impl IndexEntries {
    /// Record `anchor` under every key in `tags`. Repeated keys accumulate.
    pub fn add_tags(&mut self, tags: &[String], anchor: &str, name_parts: &[Node]) {
        for tag in tags {
            self.entries
                .entry(tag.clone())
                .or_default()
                .refs
                .push(Reference {
                    anchor: anchor.to_string(),
                    name_parts: name_parts.to_vec(),
                });
        }
    }

    pub fn get(&self, key: &str) -> Option<&IndexEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of references across all keys.
    pub fn reference_count(&self) -> usize {
        self.entries.values().map(|e| e.refs.len()).sum()
    }

    /// Tag keys in collation order.
    pub fn sorted_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        keys.sort_by(|a, b| locale_cmp(a, b));
        keys
    }

    /// Anchor → tag keys referencing it, each list in collation order.
    pub fn cross_references(&self) -> HashMap<&str, Vec<&str>> {
        let mut map: HashMap<&str, Vec<&str>> = HashMap::new();

        for (key, entry) in &self.entries {
            for r in &entry.refs {
                let keys = map.entry(r.anchor.as_str()).or_default();
                if !keys.contains(&key.as_str()) {
                    keys.push(key.as_str());
                }
            }
        }

        for keys in map.values_mut() {
            keys.sort_by(|a, b| locale_cmp(a, b));
        }

        map
    }
}

// ---------------------------------------------------------------------------
// Annotation parsing
// ---------------------------------------------------------------------------

/// A parsed `tags="..."` / `name="..."` annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub tags: Vec<String>,
    pub anchor: String,
}

/// Parse raw markup attached to a heading.
///
/// Returns `Ok(None)` for closing tags and markup without a non-empty
/// `tags` attribute. Markup with tags but no valid `name` is an error.
pub fn parse_annotation(markup: &str, line: usize) -> Result<Option<Annotation>> {
    if markup.starts_with("</") {
        return Ok(None);
    }

    let Some(caps) = TAGS_RE.captures(markup) else {
        return Ok(None);
    };
    let list = caps.get(1).map_or("", |m| m.as_str());
    if list.is_empty() {
        return Ok(None);
    }

    let anchor = NAME_RE
        .captures(markup)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .ok_or_else(|| DocToolsError::InvalidAnchor {
            line,
            markup: markup.to_string(),
        })?;

    // Trailing commas leave empty keys behind.
    let tags: Vec<String> = list
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect();

    if tags.is_empty() {
        return Ok(None);
    }

    Ok(Some(Annotation { tags, anchor }))
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// What a [`IndexBuilder::build_index`] run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSummary {
    pub placeholder_found: bool,
    pub entries: usize,
    pub references: usize,
}

/// Injects a generated index page at the placeholder heading.
#[derive(Debug, Clone)]
pub struct IndexBuilder {
    placeholder: String,
    title: String,
}

impl Default for IndexBuilder {
    fn default() -> Self {
        Self::from(&IndexConfig::default())
    }
}

impl From<&IndexConfig> for IndexBuilder {
    fn from(config: &IndexConfig) -> Self {
        Self::new(config.placeholder.clone(), config.title.clone())
    }
}

impl IndexBuilder {
    pub fn new(placeholder: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            placeholder: placeholder.into(),
            title: title.into(),
        }
    }

    /// Collect every heading annotation, then replace the first placeholder
    /// heading with the index page.
    ///
    /// Without a placeholder the tree is left untouched. A malformed
    /// annotation aborts before any mutation.
    #[instrument(skip_all)]
    pub fn build_index(&self, root: &mut Node) -> Result<IndexSummary> {
        let (entries, placeholder) = self.collect(root)?;

        let summary = IndexSummary {
            placeholder_found: placeholder.is_some(),
            entries: entries.len(),
            references: entries.reference_count(),
        };

        if let Some(path) = placeholder {
            if let Some(slot) = root.node_at_path_mut(&path) {
                *slot = self.index_page(&entries);
            }
        }

        info!(
            placeholder_found = summary.placeholder_found,
            entries = summary.entries,
            references = summary.references,
            "index page built"
        );

        Ok(summary)
    }

    /// First pass: entry table plus the path of the first placeholder heading.
    fn collect(&self, root: &Node) -> Result<(IndexEntries, Option<Vec<usize>>)> {
        let mut entries = IndexEntries::default();
        let mut placeholder: Option<Vec<usize>> = None;

        root.walk(&mut |node, path| {
            let Node::Heading {
                children, position, ..
            } = node
            else {
                return Ok(());
            };

            if placeholder.is_none() && node.to_plain_string().trim() == self.placeholder {
                debug!(?path, "placeholder heading found");
                placeholder = Some(path.to_vec());
            }

            let line = position.map_or(0, |p| p.start_line);
            let label: Vec<Node> = children
                .iter()
                .filter(|c| matches!(c, Node::Text { .. } | Node::InlineCode { .. }))
                .cloned()
                .collect();

            for child in children {
                let Node::Html { value } = child else {
                    continue;
                };
                if let Some(annotation) = parse_annotation(value, line)? {
                    debug!(line, anchor = %annotation.anchor, tags = ?annotation.tags, "annotation");
                    entries.add_tags(&annotation.tags, &annotation.anchor, &label);
                }
            }

            Ok(())
        })?;

        Ok((entries, placeholder))
    }

    /// Title heading, break, then the generated entries (or an empty list).
    fn index_page(&self, entries: &IndexEntries) -> Node {
        let body = if entries.is_empty() {
            Node::bullet_list(Vec::new())
        } else {
            gen_page(entries)
        };

        Node::paragraph(vec![
            Node::heading(1, vec![Node::text(self.title.clone())]),
            Node::Break,
            body,
        ])
    }
}

impl Transform for IndexBuilder {
    fn name(&self) -> &str {
        "index-page"
    }

    fn apply(&self, root: &mut Node) -> Result<()> {
        self.build_index(root).map(|_| ())
    }
}

// ---------------------------------------------------------------------------
// Page generation
// ---------------------------------------------------------------------------

/// Render the entry table as a container of per-key sections.
pub fn gen_page(entries: &IndexEntries) -> Node {
    let cross = entries.cross_references();
    let mut children = Vec::new();

    for key in entries.sorted_keys() {
        let Some(entry) = entries.get(key) else {
            continue;
        };

        let mut items = Vec::with_capacity(entry.refs.len() + 1);
        let mut see_also = Vec::new();
        let mut visited: HashSet<&str> = HashSet::from([key]);

        for r in &entry.refs {
            items.push(Node::list_item(vec![Node::link(
                format!("#{}", r.anchor),
                r.name_parts.clone(),
            )]));

            for &other in cross.get(r.anchor.as_str()).into_iter().flatten() {
                if !visited.insert(other) {
                    continue;
                }
                see_also.push(Node::list_item(vec![Node::link(
                    format!("#{}", index_anchor(other)),
                    vec![Node::text(friendly_name(other))],
                )]));
            }
        }

        items.push(Node::list_item(vec![
            Node::text("See Also:"),
            Node::bullet_list(see_also),
        ]));

        children.push(Node::heading(
            2,
            vec![
                Node::html(format!("<a name=\"{}\"></a>", index_anchor(key))),
                Node::text(friendly_name(key)),
            ],
        ));
        children.push(Node::Break);
        children.push(Node::paragraph(vec![Node::bullet_list(items)]));
        // Two breaks keep downstream renderers from merging sections.
        children.push(Node::Break);
        children.push(Node::Break);
    }

    Node::paragraph(children)
}

/// Anchor name of a key's index section: `index.<key-with-dashes>`.
pub fn index_anchor(key: &str) -> String {
    format!("index.{}", key.replace(' ', "-"))
}

/// Capitalize each space-separated word: `memory safety` → `Memory Safety`.
pub fn friendly_name(key: &str) -> String {
    key.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(c) => {
                    let upper: String = c.to_uppercase().collect();
                    format!("{upper}{}", chars.as_str())
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// ASCII punctuation and symbols in ICU root collation order.
const PUNCTUATION_ORDER: &str = "_-,;:!?.'\"()[]{}@*/\\&#%`^+<=>|~$";

/// Locale-style string ordering.
///
/// Primary: case-insensitive, with whitespace < punctuation < digits <
/// letters, and punctuation ranked as in ICU root (`_` < `-` < `*`). Ties
/// prefer lowercase at the first case difference, then fall back to code
/// point order.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    let primary = a.chars().map(collation_key).cmp(b.chars().map(collation_key));
    if primary != Ordering::Equal {
        return primary;
    }

    for (x, y) in a.chars().zip(b.chars()) {
        if x != y {
            match (x.is_lowercase(), y.is_lowercase()) {
                (true, false) => return Ordering::Less,
                (false, true) => return Ordering::Greater,
                _ => {}
            }
        }
    }

    a.cmp(b)
}

fn collation_key(c: char) -> (u8, u32, char) {
    let lower = c.to_lowercase().next().unwrap_or(c);
    if c.is_whitespace() {
        (0, 0, lower)
    } else if c.is_numeric() {
        (2, 0, lower)
    } else if c.is_alphabetic() {
        (3, 0, lower)
    } else {
        // Unlisted symbols sort after the known ones, by code point.
        let rank = PUNCTUATION_ORDER
            .find(c)
            .map_or(PUNCTUATION_ORDER.len() as u32 + u32::from(c), |i| i as u32);
        (1, rank, lower)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use doctools_markdown::parse;

    const TAGGED: &str = "\
# put-index-page-here

## <a name=\"own\" tags=\"memory safety, ownership\"></a>Ownership

Some text.

## <a name=\"borrow\" tags=\"memory safety, borrowing\"></a>Borrowing `&T`
";

    fn build(md: &str) -> (Node, IndexSummary) {
        let mut root = parse(md);
        let summary = IndexBuilder::default().build_index(&mut root).unwrap();
        (root, summary)
    }

    /// The generated sections container inside an index page.
    fn sections(page: &Node) -> &[Node] {
        page.children()[2].children()
    }

    /// Section for `key`: (heading, reference list items).
    fn section<'a>(page: &'a Node, key: &str) -> (&'a Node, &'a [Node]) {
        let nodes = sections(page);
        let i = nodes
            .iter()
            .position(|n| {
                matches!(n, Node::Heading { .. })
                    && n.children()[0] == Node::html(format!("<a name=\"{}\"></a>", index_anchor(key)))
            })
            .unwrap_or_else(|| panic!("no section for {key}"));
        (&nodes[i], nodes[i + 2].children()[0].children())
    }

    fn link_urls(items: &[Node]) -> Vec<String> {
        items
            .iter()
            .filter_map(|item| match &item.children()[0] {
                Node::Link { url, .. } => Some(url.clone()),
                _ => None,
            })
            .collect()
    }

    fn see_also(items: &[Node]) -> Vec<String> {
        let last = items.last().expect("see also item");
        assert_eq!(last.children()[0], Node::text("See Also:"));
        last.children()[1]
            .children()
            .iter()
            .map(|item| item.to_plain_string())
            .collect()
    }

    #[test]
    fn no_placeholder_leaves_tree_unchanged() {
        let md = "# Title\n\n## <a name=\"a\" tags=\"x\"></a>A\n";
        let original = parse(md);
        let (root, summary) = build(md);

        assert_eq!(root, original);
        assert!(!summary.placeholder_found);
        assert_eq!(summary.entries, 1);
    }

    #[test]
    fn placeholder_without_tags_gets_empty_page() {
        let (root, summary) = build("# Intro\n\n# put-index-page-here\n\ntext\n");

        assert!(summary.placeholder_found);
        assert_eq!(summary.entries, 0);
        assert_eq!(
            root.children()[1],
            Node::paragraph(vec![
                Node::heading(1, vec![Node::text("Index Page")]),
                Node::Break,
                Node::bullet_list(vec![]),
            ])
        );
        assert_eq!(root.children()[0].to_plain_string(), "Intro");
        assert_eq!(root.children()[2].to_plain_string(), "text");
    }

    #[test]
    fn shared_key_lists_both_anchors_and_cross_references() {
        let (root, summary) = build(TAGGED);
        assert_eq!(summary.entries, 3);
        assert_eq!(summary.references, 4);

        let page = &root.children()[0];
        assert_eq!(page.children()[0].to_plain_string(), "Index Page");
        assert_eq!(page.children()[1], Node::Break);

        let (heading, items) = section(page, "memory safety");
        assert_eq!(heading.children()[1], Node::text("Memory Safety"));
        assert_eq!(link_urls(items), vec!["#own", "#borrow"]);
        assert_eq!(see_also(items), vec!["Ownership", "Borrowing"]);

        let (_, items) = section(page, "ownership");
        assert_eq!(link_urls(items), vec!["#own"]);
        assert_eq!(see_also(items), vec!["Memory Safety"]);

        let (_, items) = section(page, "borrowing");
        assert_eq!(see_also(items), vec!["Memory Safety"]);
    }

    #[test]
    fn sections_are_sorted_and_spaced() {
        let (root, _) = build(TAGGED);
        let nodes = sections(&root.children()[0]);

        assert_eq!(nodes.len(), 15);
        let titles: Vec<String> = nodes
            .iter()
            .filter(|n| matches!(n, Node::Heading { depth: 2, .. }))
            .map(|n| n.to_plain_string())
            .collect();
        assert_eq!(titles, vec!["Borrowing", "Memory Safety", "Ownership"]);

        assert_eq!(nodes[1], Node::Break);
        assert_eq!(nodes[3], Node::Break);
        assert_eq!(nodes[4], Node::Break);
    }

    #[test]
    fn reference_label_keeps_text_and_inline_code_only() {
        let (root, _) = build(TAGGED);
        let (_, items) = section(&root.children()[0], "borrowing");

        assert_eq!(
            items[0].children()[0],
            Node::link(
                "#borrow",
                vec![Node::text("Borrowing "), Node::inline_code("&T")]
            )
        );
    }

    #[test]
    fn placeholder_after_tagged_headings_sees_every_entry() {
        let md = "\
## <a name=\"a\" tags=\"alpha\"></a>A

## <a name=\"b\" tags=\"beta\"></a>B

# put-index-page-here
";
        let (root, summary) = build(md);
        assert!(summary.placeholder_found);

        let page = &root.children()[2];
        let (_, alpha) = section(page, "alpha");
        let (_, beta) = section(page, "beta");
        assert_eq!(link_urls(alpha), vec!["#a"]);
        assert_eq!(link_urls(beta), vec!["#b"]);
    }

    #[test]
    fn only_first_placeholder_is_replaced() {
        let (root, _) = build("# put-index-page-here\n\n# put-index-page-here\n");
        assert!(matches!(root.children()[0], Node::Paragraph { .. }));
        assert_eq!(root.children()[1].to_plain_string(), "put-index-page-here");
    }

    #[test]
    fn missing_name_is_fatal_with_line() {
        let mut root = parse("# Intro\n\n## <a tags=\"a, b\"></a>Bad\n\n# put-index-page-here\n");
        let before = root.clone();

        let err = IndexBuilder::default().build_index(&mut root).unwrap_err();
        match &err {
            DocToolsError::InvalidAnchor { line, markup } => {
                assert_eq!(*line, 3);
                assert_eq!(markup, "<a tags=\"a, b\">");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().starts_with("3: Invalid anchor name attribute:"));
        assert_eq!(root, before);
    }

    #[test]
    fn second_run_is_a_no_op() {
        let (mut root, _) = build(TAGGED);
        let once = root.clone();

        let summary = IndexBuilder::default().build_index(&mut root).unwrap();
        assert!(!summary.placeholder_found);
        assert_eq!(root, once);
    }

    #[test]
    fn custom_placeholder_and_title() {
        let mut root = parse("# INDEX\n");
        IndexBuilder::new("INDEX", "Tags")
            .build_index(&mut root)
            .unwrap();
        assert_eq!(root.children()[0].children()[0].to_plain_string(), "Tags");
    }

    #[test]
    fn annotation_parsing() {
        let a = parse_annotation(r#"<a name="x.1" tags="b, a-b, c_2,"></a>"#, 1)
            .unwrap()
            .unwrap();
        assert_eq!(a.anchor, "x.1");
        assert_eq!(a.tags, vec!["b", "a-b", "c_2"]);

        assert_eq!(parse_annotation("</a>", 1).unwrap(), None);
        assert_eq!(parse_annotation(r#"<a name="x"></a>"#, 1).unwrap(), None);
        assert_eq!(parse_annotation(r#"<a name="x" tags=""></a>"#, 1).unwrap(), None);
        // Digits can't start a key, so the attribute doesn't match at all.
        assert_eq!(parse_annotation(r#"<a tags="9lives"></a>"#, 1).unwrap(), None);
    }

    #[test]
    fn duplicate_tags_accumulate() {
        let mut entries = IndexEntries::default();
        let label = vec![Node::text("L")];
        entries.add_tags(&["k".into()], "one", &label);
        entries.add_tags(&["k".into()], "two", &label);

        let refs: Vec<&str> = entries
            .get("k")
            .unwrap()
            .refs
            .iter()
            .map(|r| r.anchor.as_str())
            .collect();
        assert_eq!(refs, vec!["one", "two"]);
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn locale_ordering() {
        let mut keys = vec!["zebra", "Apple", "apple pie"];
        keys.sort_by(|a, b| locale_cmp(a, b));
        assert_eq!(keys, vec!["Apple", "apple pie", "zebra"]);

        assert_eq!(locale_cmp("apple", "Apple"), Ordering::Less);
        assert_eq!(locale_cmp("a b", "a-b"), Ordering::Less);
        assert_eq!(locale_cmp("a1", "ab"), Ordering::Less);
        assert_eq!(locale_cmp("same", "same"), Ordering::Equal);
    }

    #[test]
    fn key_punctuation_follows_icu_root() {
        let mut keys = vec!["a*b", "a-b", "A b", "a_b", "a b"];
        keys.sort_by(|a, b| locale_cmp(a, b));
        assert_eq!(keys, vec!["a b", "A b", "a_b", "a-b", "a*b"]);

        assert_eq!(locale_cmp("a*b", "a1"), Ordering::Less);
        assert_eq!(locale_cmp("a~b", "a$b"), Ordering::Less);
    }

    #[test]
    fn friendly_names() {
        assert_eq!(friendly_name("memory safety"), "Memory Safety");
        assert_eq!(friendly_name("already Upper"), "Already Upper");
        assert_eq!(friendly_name("ünïcode"), "Ünïcode");
        assert_eq!(index_anchor("memory safety"), "index.memory-safety");
    }
}
