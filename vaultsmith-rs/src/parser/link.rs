//! Wikilink, markdown link and embed parsing.

use crate::parser::code_block::{find_code_ranges, is_in_code, line_of, line_start_of};
use crate::types::{Link, LinkKind};
use regex::Regex;
use std::sync::LazyLock;

// (!)? [[ target (#^block)? (#heading)? (|alias)? ]]
static WIKILINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(!?)\[\[([^\]\|#\n]+)(?:#\^([a-zA-Z0-9_-]+))?(?:#([^\]\|\n]+))?(?:\|([^\]\n]+))?\]\]")
        .unwrap()
});

// (!)? [text](<dest with spaces>) or [text](dest "title")
static MARKDOWN_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(!?)\[([^\]\n]*)\]\((?:<([^>\n]+)>|([^)\s]+))(?:\s+"[^"\n]*")?\)"#).unwrap()
});

const ATTACHMENT_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "svg", "bmp", "avif", "mp3", "wav", "ogg", "m4a",
    "flac", "mp4", "webm", "mov", "mkv", "pdf", "canvas",
];

/// Parse wikilinks, markdown links and embeds in document order.
pub fn parse_links(content: &str) -> Vec<Link> {
    let code_ranges = find_code_ranges(content);
    let mut links = Vec::new();
    let mut wiki_spans = Vec::new();

    for cap in WIKILINK.captures_iter(content) {
        let Some(whole) = cap.get(0) else { continue };
        if is_in_code(whole.start(), &code_ranges) {
            continue;
        }
        wiki_spans.push(whole.range());

        let target = cap.get(2).map(|m| m.as_str().trim()).unwrap_or("");
        links.push(make_link(
            content,
            whole.range(),
            target.to_string(),
            cap.get(5).map(|m| m.as_str().to_string()),
            cap.get(4).map(|m| m.as_str().to_string()),
            cap.get(3).map(|m| m.as_str().to_string()),
            LinkKind::Wiki,
            cap.get(1).is_some_and(|m| !m.as_str().is_empty()),
        ));
    }

    for cap in MARKDOWN_LINK.captures_iter(content) {
        let Some(whole) = cap.get(0) else { continue };
        if is_in_code(whole.start(), &code_ranges)
            || wiki_spans.iter().any(|r| whole.start() < r.end && whole.end() > r.start)
        {
            continue;
        }

        let Some(dest) = cap.get(3).or_else(|| cap.get(4)) else {
            continue;
        };
        let Some((target, heading, block_id)) = split_markdown_destination(dest.as_str()) else {
            continue;
        };
        let text = cap.get(2).map(|m| m.as_str()).unwrap_or("");

        links.push(make_link(
            content,
            whole.range(),
            target,
            (!text.is_empty()).then(|| text.to_string()),
            heading,
            block_id,
            LinkKind::Markdown,
            cap.get(1).is_some_and(|m| !m.as_str().is_empty()),
        ));
    }

    links.sort_by_key(|l| (l.line, l.start_col));
    links
}

#[allow(clippy::too_many_arguments)]
fn make_link(
    content: &str,
    range: std::ops::Range<usize>,
    target: String,
    alias: Option<String>,
    heading: Option<String>,
    block_id: Option<String>,
    kind: LinkKind,
    embed: bool,
) -> Link {
    let line_start = line_start_of(content, range.start);
    Link {
        target,
        alias,
        heading,
        block_id,
        kind,
        embed,
        line: line_of(content, range.start),
        start_col: range.start - line_start,
        end_col: range.end - line_start,
    }
}

/// Split a markdown destination into (decoded path, heading, block id).
///
/// Returns `None` for external URLs and same-note anchors.
fn split_markdown_destination(dest: &str) -> Option<(String, Option<String>, Option<String>)> {
    if dest.contains("://") || dest.starts_with("mailto:") || dest.starts_with('#') {
        return None;
    }

    let decoded = urlencoding::decode(dest)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| dest.to_string());

    let (path, anchor) = match decoded.split_once('#') {
        Some((p, a)) => (p.to_string(), Some(a.to_string())),
        None => (decoded, None),
    };

    let (heading, block_id) = match anchor {
        Some(a) if a.starts_with('^') => (None, Some(a[1..].to_string())),
        Some(a) if !a.is_empty() => (Some(a), None),
        _ => (None, None),
    };

    Some((path, heading, block_id))
}

/// Whether a link target names an attachment (image, media, PDF, diagram) rather than a note.
pub fn is_attachment(target: &str) -> bool {
    let file = target.rsplit('/').next().unwrap_or(target);
    match file.rsplit_once('.') {
        Some((_, ext)) => ATTACHMENT_EXTENSIONS
            .iter()
            .any(|known| known.eq_ignore_ascii_case(ext)),
        None => false,
    }
}

/// Format a link back into wikilink syntax.
pub fn format_wikilink(link: &Link) -> String {
    let mut result = String::new();
    if link.embed {
        result.push('!');
    }
    result.push_str("[[");
    result.push_str(&link.full_target());
    if let Some(ref alias) = link.alias {
        result.push('|');
        result.push_str(alias);
    }
    result.push_str("]]");
    result
}
