//! Minimal RSS reader: splits a feed into `<item>` blocks and collects the
//! text of each direct child element, namespaced tags included.

use anyhow::Result;
use html2text::from_read;
use regex::Regex;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RssItem {
    fields: HashMap<String, String>,
}

impl RssItem {
    /// Text of the first child element named `tag`, if present and non-empty.
    pub fn get(&self, tag: &str) -> Option<&str> {
        self.fields
            .get(tag)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }
}

pub fn parse_items(xml: &str) -> Result<Vec<RssItem>> {
    let item_re = Regex::new(r"(?s)<item\b[^>]*>(.*?)</item>")?;
    let open_re = Regex::new(r"<([A-Za-z_][\w:.\-]*)(?:\s[^>]*)?/?>")?;

    let mut items = Vec::new();
    for caps in item_re.captures_iter(xml) {
        let Some(body) = caps.get(1) else {
            continue;
        };
        items.push(RssItem {
            fields: child_elements(body.as_str(), &open_re),
        });
    }
    Ok(items)
}

fn child_elements(block: &str, open_re: &Regex) -> HashMap<String, String> {
    let mut fields = HashMap::new();
    let mut cursor = 0;
    while let Some(caps) = open_re.captures_at(block, cursor) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        let name = name.as_str();
        if whole.as_str().ends_with("/>") {
            cursor = whole.end();
            continue;
        }
        let close = format!("</{name}>");
        match block[whole.end()..].find(&close) {
            Some(offset) => {
                let inner = &block[whole.end()..whole.end() + offset];
                fields
                    .entry(name.to_string())
                    .or_insert_with(|| element_text(inner));
                cursor = whole.end() + offset + close.len();
            }
            None => cursor = whole.end(),
        }
    }
    fields
}

fn element_text(raw: &str) -> String {
    let trimmed = raw.trim();
    if let Some(inner) = trimmed
        .strip_prefix("<![CDATA[")
        .and_then(|rest| rest.strip_suffix("]]>"))
    {
        return inner.trim().to_string();
    }
    clean_text(trimmed)
}

/// Strips markup and entities from an HTML fragment and collapses
/// whitespace.
pub fn clean_text(fragment: &str) -> String {
    if fragment.trim().is_empty() {
        return String::new();
    }
    let without_tags = strip_tags(fragment);
    let text = from_read(without_tags.as_bytes(), 400).replace('\u{00a0}', " ");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_tags(fragment: &str) -> String {
    let mut out = String::with_capacity(fragment.len());
    let mut in_tag = false;
    for ch in fragment.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                out.push(' ');
            }
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out
}
