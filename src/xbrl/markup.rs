//! Scans over the raw inline XBRL document, independent of the model graph.

use once_cell::sync::Lazy;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use roxmltree::{Document, Node, ParsingOptions};
use std::collections::BTreeMap;

use crate::core::ExtractError;

pub const IX_NS: &str = "http://www.xbrl.org/2013/inlineXBRL";
const FACT_ELEMENTS: [&str; 2] = ["nonFraction", "nonNumeric"];

static DISPLAY_NONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bdisplay\s*:\s*none").unwrap());

static VENDOR_PHRASE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*((?:document\s+)?created (?:by|with|using)|merged by|generated by|i?xbrl document created with|generated using|Generado por):?\s+(.*)",
    )
    .unwrap()
});

static VENDOR_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(datatracks|integix|clausion)").unwrap());

/// Parse the report once for the tree-based scans below.
pub fn parse_report(xhtml: &str) -> Result<Document<'_>, ExtractError> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    Document::parse_with_options(xhtml, options).map_err(|e| ExtractError::Markup(e.to_string()))
}

fn is_ix(node: &Node<'_, '_>, local_name: &str) -> bool {
    node.tag_name().namespace() == Some(IX_NS) && node.tag_name().name() == local_name
}

/// Facts styled `display:none` by themselves or an ancestor, excluding
/// anything inside `ix:header`.
pub fn concealed_fact_count(doc: &Document<'_>) -> usize {
    doc.descendants()
        .filter(|n| n.is_element())
        .filter(|n| FACT_ELEMENTS.iter().any(|name| is_ix(n, name)))
        .filter(|n| {
            let mut concealed = false;
            for ancestor in n.ancestors() {
                if is_ix(&ancestor, "header") {
                    return false;
                }
                if ancestor
                    .attribute("style")
                    .map_or(false, |style| DISPLAY_NONE.is_match(style))
                {
                    concealed = true;
                }
            }
            concealed
        })
        .count()
}

/// Text of every named, untargeted element inside `ix:hidden`, keyed by the
/// Clark notation of its `name` attribute.
pub fn hidden_facts(doc: &Document<'_>) -> Result<BTreeMap<String, Vec<String>>, ExtractError> {
    let mut hidden: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for section in doc.descendants().filter(|n| is_ix(n, "hidden")) {
        for element in section.descendants().skip(1).filter(|n| n.is_element()) {
            if element.has_attribute("target") {
                continue;
            }
            let Some(name) = element.attribute("name") else {
                continue;
            };
            let (prefix, local_name) = match name.split_once(':') {
                Some((prefix, local_name)) => (Some(prefix), local_name),
                None => (None, name),
            };
            let namespace = element.lookup_namespace_uri(prefix).ok_or_else(|| {
                ExtractError::Markup(format!("unknown namespace prefix '{}'", prefix.unwrap_or("")))
            })?;

            hidden
                .entry(format!("{{{}}}{}", namespace, local_name))
                .or_default()
                .push(element.text().unwrap_or_default().to_string());
        }
    }

    Ok(hidden)
}

/// Best-effort authoring software fingerprint from comments and processing
/// instructions, `None` when nothing recognisable is found.
pub fn identify_software(xhtml: &str) -> Option<String> {
    let mut reader = Reader::from_str(xhtml);
    reader.config_mut().check_end_names = false;

    let mut comments: Vec<String> = Vec::new();
    loop {
        match reader.read_event() {
            Ok(Event::Comment(text)) => {
                comments.push(String::from_utf8_lossy(&text).into_owned());
            }
            Ok(Event::PI(pi)) => {
                comments.push(format!(
                    "{}: {}",
                    String::from_utf8_lossy(pi.target()),
                    String::from_utf8_lossy(pi.content()).trim()
                ));
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                log::debug!("Stopped software scan at byte {}: {}", reader.buffer_position(), e);
                break;
            }
            _ => (),
        }
    }

    let vendors: Vec<String> = comments
        .iter()
        .filter_map(|comment| {
            if let Some(caps) = VENDOR_PHRASE.captures(comment) {
                caps.get(2).map(|m| m.as_str().trim().to_string())
            } else if VENDOR_NAME.is_match(comment) {
                Some(comment.trim().to_string())
            } else {
                None
            }
        })
        .collect();

    if vendors.is_empty() {
        None
    } else {
        Some(vendors.join(" / "))
    }
}
