//! Rich text rendering
//!
//! The content API encodes formatted text as a list of blocks (headings,
//! paragraphs, list items, images, embeds). Each text block carries spans
//! (`strong`, `em`, `hyperlink`, `label`) addressed by UTF-16 offsets into
//! the block's text.
//!
//! The resulting HTML is placed into pages without template escaping, so the
//! renderer owns the trust decision through [`EmbedPolicy`]:
//!
//! - [`EmbedPolicy::Trusted`] emits text, URLs and embed markup exactly as
//!   the content API sent them. Anyone able to publish in the repository can
//!   inject markup into the site.
//! - [`EmbedPolicy::Sanitized`] escapes text, drops link targets that are not
//!   `http`, `https`, `mailto` or relative, and replaces embed markup with a
//!   plain link.

use serde::{Deserialize, Serialize};

use crate::helpers::{html_escape, is_safe_url};

/// Whether rich text from the content API is embedded verbatim
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedPolicy {
    #[default]
    Trusted,
    Sanitized,
}

/// A rich text document
pub type RichText = Vec<Block>;

/// One block of rich text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(rename = "type")]
    pub kind: BlockKind,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub spans: Vec<Span>,
    /// Image source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oembed: Option<Embed>,
}

impl Block {
    /// A text block without spans
    pub fn text(kind: BlockKind, text: &str) -> Self {
        Self {
            kind,
            text: text.to_string(),
            spans: Vec::new(),
            url: None,
            alt: None,
            label: None,
            oembed: None,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.spans.push(span);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    #[serde(rename = "heading1")]
    Heading1,
    #[serde(rename = "heading2")]
    Heading2,
    #[serde(rename = "heading3")]
    Heading3,
    #[serde(rename = "heading4")]
    Heading4,
    #[serde(rename = "heading5")]
    Heading5,
    #[serde(rename = "heading6")]
    Heading6,
    #[serde(rename = "paragraph")]
    Paragraph,
    #[serde(rename = "preformatted")]
    Preformatted,
    #[serde(rename = "list-item")]
    ListItem,
    #[serde(rename = "o-list-item")]
    OrderedListItem,
    #[serde(rename = "image")]
    Image,
    #[serde(rename = "embed")]
    Embed,
    #[serde(other)]
    Unknown,
}

/// oEmbed payload of an `embed` block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    pub embed_url: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub provider_name: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
}

/// Inline formatting over `start..end` (UTF-16 offsets)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: SpanKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<SpanData>,
}

impl Span {
    pub fn new(kind: SpanKind, start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            kind,
            data: None,
        }
    }

    pub fn link(start: usize, end: usize, url: &str) -> Self {
        Self {
            start,
            end,
            kind: SpanKind::Hyperlink,
            data: Some(SpanData {
                link_type: Some("Web".to_string()),
                url: Some(url.to_string()),
                ..SpanData::default()
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanKind {
    Strong,
    Em,
    Hyperlink,
    Label,
    #[serde(other)]
    Unknown,
}

/// Link or label payload of a span
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpanData {
    #[serde(default)]
    pub link_type: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub uid: Option<String>,
    #[serde(rename = "type", default)]
    pub doc_type: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

/// Plain text of a rich text document, one line per block
pub fn as_text(blocks: &[Block]) -> String {
    blocks
        .iter()
        .filter(|b| !b.text.is_empty())
        .map(|b| b.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Rich text to HTML renderer
#[derive(Debug, Clone)]
pub struct RichTextRenderer {
    policy: EmbedPolicy,
    /// Root path used to resolve links to other documents
    root: String,
}

impl RichTextRenderer {
    pub fn new(policy: EmbedPolicy, root: &str) -> Self {
        Self {
            policy,
            root: format!("{}/", root.trim_end_matches('/')),
        }
    }

    /// Render blocks to HTML, grouping consecutive list items
    pub fn as_html(&self, blocks: &[Block]) -> String {
        let mut html = String::new();
        let mut open_list: Option<BlockKind> = None;

        for block in blocks {
            let list = match block.kind {
                BlockKind::ListItem | BlockKind::OrderedListItem => Some(block.kind),
                _ => None,
            };

            if open_list != list {
                if let Some(kind) = open_list {
                    html.push_str(list_tag(kind).1);
                }
                if let Some(kind) = list {
                    html.push_str(list_tag(kind).0);
                }
                open_list = list;
            }

            html.push_str(&self.render_block(block));
        }

        if let Some(kind) = open_list {
            html.push_str(list_tag(kind).1);
        }

        html
    }

    fn render_block(&self, block: &Block) -> String {
        let class = block
            .label
            .as_deref()
            .map(|l| format!(r#" class="{}""#, self.attr(l)))
            .unwrap_or_default();

        match block.kind {
            BlockKind::Heading1
            | BlockKind::Heading2
            | BlockKind::Heading3
            | BlockKind::Heading4
            | BlockKind::Heading5
            | BlockKind::Heading6 => {
                let level = heading_level(block.kind);
                format!(
                    "<h{level}{class}>{}</h{level}>",
                    self.render_inline(&block.text, &block.spans)
                )
            }
            BlockKind::Paragraph => format!(
                "<p{class}>{}</p>",
                self.render_inline(&block.text, &block.spans)
            ),
            BlockKind::Preformatted => format!(
                "<pre{class}>{}</pre>",
                self.render_inline(&block.text, &block.spans)
            ),
            BlockKind::ListItem | BlockKind::OrderedListItem => format!(
                "<li{class}>{}</li>",
                self.render_inline(&block.text, &block.spans)
            ),
            BlockKind::Image => self.render_image(block),
            BlockKind::Embed => self.render_embed(block),
            BlockKind::Unknown => {
                tracing::debug!("Skipping unsupported rich text block");
                String::new()
            }
        }
    }

    fn render_image(&self, block: &Block) -> String {
        let Some(src) = block.url.as_deref() else {
            return String::new();
        };
        if !self.url_allowed(src) {
            return String::new();
        }
        format!(
            r#"<p class="block-img"><img src="{}" alt="{}" /></p>"#,
            self.attr(src),
            self.attr(block.alt.as_deref().unwrap_or(""))
        )
    }

    fn render_embed(&self, block: &Block) -> String {
        let Some(embed) = &block.oembed else {
            return String::new();
        };

        match self.policy {
            EmbedPolicy::Trusted => format!(
                r#"<div data-oembed="{}" data-oembed-type="{}" data-oembed-provider="{}">{}</div>"#,
                embed.embed_url,
                embed.kind.as_deref().unwrap_or(""),
                embed.provider_name.as_deref().unwrap_or(""),
                embed.html.as_deref().unwrap_or("")
            ),
            EmbedPolicy::Sanitized if is_safe_url(&embed.embed_url) => {
                let url = html_escape(&embed.embed_url);
                format!(r#"<p class="block-embed"><a href="{url}">{url}</a></p>"#)
            }
            EmbedPolicy::Sanitized => String::new(),
        }
    }

    /// Render text with its spans, keeping tags well nested
    fn render_inline(&self, text: &str, spans: &[Span]) -> String {
        let chars: Vec<char> = text.chars().collect();

        // UTF-16 offset at which each char starts
        let mut utf16_starts = Vec::with_capacity(chars.len());
        let mut offset = 0;
        for c in &chars {
            utf16_starts.push(offset);
            offset += c.len_utf16();
        }
        let to_char_index = |utf16: usize| utf16_starts.partition_point(|&o| o < utf16);

        let mut ranges: Vec<(usize, usize, &Span)> = spans
            .iter()
            .map(|s| (to_char_index(s.start), to_char_index(s.end), s))
            .filter(|(start, end, _)| start < end)
            .collect();
        // Outer (longer) spans open first
        ranges.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));

        let mut boundaries: Vec<usize> = ranges
            .iter()
            .flat_map(|(start, end, _)| [*start, *end])
            .chain([chars.len()])
            .collect();
        boundaries.sort_unstable();
        boundaries.dedup();

        let mut html = String::new();
        let mut stack: Vec<usize> = Vec::new();
        let mut next_range = 0;
        let mut pos = 0;

        for boundary in boundaries {
            if boundary > pos {
                let segment: String = chars[pos..boundary].iter().collect();
                html.push_str(&self.text(&segment));
                pos = boundary;
            }

            // Close spans ending here; spans opened after them are re-opened
            if let Some(first) = stack.iter().position(|&i| ranges[i].1 == boundary) {
                for &i in stack[first..].iter().rev() {
                    html.push_str(&self.span_tags(ranges[i].2).1);
                }
                let reopen: Vec<usize> = stack[first..]
                    .iter()
                    .copied()
                    .filter(|&i| ranges[i].1 > boundary)
                    .collect();
                stack.truncate(first);
                for i in reopen {
                    html.push_str(&self.span_tags(ranges[i].2).0);
                    stack.push(i);
                }
            }

            while next_range < ranges.len() && ranges[next_range].0 == boundary {
                html.push_str(&self.span_tags(ranges[next_range].2).0);
                stack.push(next_range);
                next_range += 1;
            }
        }

        html
    }

    fn span_tags(&self, span: &Span) -> (String, String) {
        match span.kind {
            SpanKind::Strong => ("<strong>".to_string(), "</strong>".to_string()),
            SpanKind::Em => ("<em>".to_string(), "</em>".to_string()),
            SpanKind::Hyperlink => match self.link_href(span.data.as_ref()) {
                Some(href) => {
                    let target = span
                        .data
                        .as_ref()
                        .and_then(|d| d.target.as_deref())
                        .map(|t| format!(r#" target="{}" rel="noopener""#, self.attr(t)))
                        .unwrap_or_default();
                    (
                        format!(r#"<a href="{}"{}>"#, self.attr(&href), target),
                        "</a>".to_string(),
                    )
                }
                None => (String::new(), String::new()),
            },
            SpanKind::Label => {
                let label = span
                    .data
                    .as_ref()
                    .and_then(|d| d.label.as_deref())
                    .unwrap_or("");
                (
                    format!(r#"<span class="{}">"#, self.attr(label)),
                    "</span>".to_string(),
                )
            }
            SpanKind::Unknown => (String::new(), String::new()),
        }
    }

    fn link_href(&self, data: Option<&SpanData>) -> Option<String> {
        let data = data?;
        let href = match data.link_type.as_deref() {
            Some("Document") => match data.uid.as_deref() {
                Some(uid) => format!("{}post/{}/", self.root, uid),
                None => self.root.clone(),
            },
            _ => data.url.clone()?,
        };

        self.url_allowed(&href).then_some(href)
    }

    fn url_allowed(&self, url: &str) -> bool {
        self.policy == EmbedPolicy::Trusted || is_safe_url(url)
    }

    fn text(&self, text: &str) -> String {
        let text = match self.policy {
            EmbedPolicy::Trusted => text.to_string(),
            EmbedPolicy::Sanitized => html_escape(text),
        };
        text.replace('\n', "<br />")
    }

    fn attr(&self, value: &str) -> String {
        match self.policy {
            EmbedPolicy::Trusted => value.to_string(),
            EmbedPolicy::Sanitized => html_escape(value),
        }
    }
}

fn heading_level(kind: BlockKind) -> u8 {
    match kind {
        BlockKind::Heading1 => 1,
        BlockKind::Heading2 => 2,
        BlockKind::Heading3 => 3,
        BlockKind::Heading4 => 4,
        BlockKind::Heading5 => 5,
        _ => 6,
    }
}

fn list_tag(kind: BlockKind) -> (&'static str, &'static str) {
    match kind {
        BlockKind::OrderedListItem => ("<ol>", "</ol>"),
        _ => ("<ul>", "</ul>"),
    }
}
