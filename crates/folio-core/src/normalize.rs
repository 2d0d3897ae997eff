//! Editor text normalization.
//!
//! Pure functions that turn the raw text of the editing surface into the
//! structured values stored on an entity, and back.

use url::Url;

use crate::domain::PortfolioLink;

/// Separator used by the tag and tech-stack inputs.
pub const LIST_SEPARATOR: char = ',';

const NBSP_ESCAPE: &str = "&nbsp;";

/// Splits `raw` on `separator`, trims every segment and drops empty ones.
/// Order is preserved and duplicates are kept.
pub fn normalize_list(raw: &str, separator: char) -> Vec<String> {
    raw.split(separator)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(String::from)
        .collect()
}

/// Renders a stored list back into editor text.
pub fn join_list(items: &[String]) -> String {
    items.join(", ")
}

/// Removes `<...>` tag-like substrings and `&nbsp;` escapes, then trims.
///
/// Only used to decide whether rich text has visible content; the markup
/// itself is what gets persisted.
pub fn strip_markup_text(raw: &str) -> String {
    let mut text = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(open) = rest.find('<') {
        text.push_str(&rest[..open]);
        match rest[open..].find('>') {
            Some(close) => rest = &rest[open + close + 1..],
            None => {
                // An unterminated `<` is not a tag.
                text.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    text.push_str(rest);

    text.replace(NBSP_ESCAPE, "").trim().to_string()
}

/// Parses one `Label | https://url` entry per line.
///
/// Blank lines are skipped. A line without `|` becomes a link with an empty
/// href so validation can flag it.
pub fn parse_links(raw: &str) -> Vec<PortfolioLink> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| match line.split_once('|') {
            Some((label, href)) => PortfolioLink::new(label.trim(), href.trim()),
            None => PortfolioLink::new(line, ""),
        })
        .collect()
}

/// Renders stored links back into editor text, one per line.
pub fn format_links(links: &[PortfolioLink]) -> String {
    links
        .iter()
        .map(|link| format!("{} | {}", link.label, link.href))
        .collect::<Vec<_>>()
        .join("\n")
}

/// True only for values that parse as absolute `http` or `https` URLs.
pub fn is_absolute_web_url(value: &str) -> bool {
    Url::parse(value)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}
