//! Placeholder substitution over `.docx` packages.
//!
//! A placeholder is `{key}` in the visible text of a paragraph. Word freely
//! splits visible text over several `<w:r>` runs (spell checking, edits,
//! formatting changes), so `{fio}` may be stored as `{f` + `io}` in two
//! different `<w:t>` elements. Matching is therefore done on the logical text
//! of each paragraph (all of its `<w:t>` contents joined), and the result is
//! mapped back onto the text nodes it came from:
//!
//! - the value goes into the node holding the opening `{`,
//! - the rest of the token is cut out of the following nodes,
//! - nodes without a match, and all other markup, keep their original bytes.
//!
//! Paragraphs may nest (a text box anchored in a run carries its own
//! `<w:p>` elements inside the outer paragraph). Each paragraph collects only
//! the text nodes directly inside it, so a token around a text box still
//! matches the outer paragraph and the box text stays a paragraph of its own.
//!
//! Values are checked before anything is rendered: characters XML 1.0 cannot
//! carry (most C0 controls) are rejected as invalid input.
//!
//! Only the text-bearing parts (`word/document.xml`, headers, footers,
//! footnotes, endnotes) are inspected. Every other archive entry, and every
//! part without a match, is copied into the output without recompression.

use crate::error::{AppError, Result};
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::io::{Cursor, Read, Write};
use std::ops::Range;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const MAIN_PART: &str = "word/document.xml";
const TEXT_PARTS: &str = r"^word/(document|header\d*|footer\d*|footnotes|endnotes)\.xml$";
/// A text node (content in group 1), a paragraph start or a paragraph end.
const RUN_TEXT: &str = r"<w:t(?:\s[^>]*)?>([^<]*)</w:t>|<w:p(?:\s[^>]*)?>|</w:p>";
const ANY_TOKEN: &str = r"\{([A-Za-z0-9_]+)\}";

/// One `<w:t>` element of a part.
struct TextNode {
    /// Offset of `<w:t`.
    start: usize,
    /// Raw (still escaped) content.
    content: Range<usize>,
    /// Offset just past `</w:t>`.
    end: usize,
    /// Decoded content, rewritten in place by substitution.
    text: String,
    changed: bool,
}

type Paragraph = Vec<TextNode>;

struct Patterns {
    text_parts: Regex,
    run_text: Regex,
}

impl Patterns {
    fn compile() -> Result<Self> {
        Ok(Self {
            text_parts: compile(TEXT_PARTS)?,
            run_text: compile(RUN_TEXT)?,
        })
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| AppError::Internal(format!("regex error: {}", e)))
}

/// Outcome of [`render`].
#[derive(Debug)]
pub struct Rendered {
    pub bytes: Vec<u8>,
    /// Number of tokens replaced across all parts.
    pub replaced: usize,
}

/// Substitutes `{key}` tokens in a `.docx` held in memory and returns the
/// complete rewritten package.
///
/// Keys without a token in the document are ignored; tokens without a key in
/// `replacements` stay as they are. Nothing is produced unless every part was
/// read and rewritten.
pub fn render(source: &[u8], replacements: &BTreeMap<String, String>) -> Result<Rendered> {
    for (key, value) in replacements {
        check_value(key, value)?;
    }
    let patterns = Patterns::compile()?;
    let tokens = token_pattern(replacements)?;

    let mut archive = open_package(source)?;
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let mut replaced = 0;

    for index in 0..archive.len() {
        let name = archive.by_index_raw(index)?.name().to_string();

        if let Some(tokens) = tokens.as_ref().filter(|_| patterns.text_parts.is_match(&name)) {
            let (xml, modified) = {
                let mut entry = archive.by_index(index)?;
                (read_part(&mut entry, &name)?, entry.last_modified())
            };

            let mut paragraphs = scan(&xml, &patterns.run_text);
            let count: usize = paragraphs
                .iter_mut()
                .map(|paragraph| substitute_paragraph(paragraph, tokens, replacements))
                .sum();

            if count > 0 {
                let options = FileOptions::default()
                    .compression_method(CompressionMethod::Deflated)
                    .last_modified_time(modified);
                writer.start_file(name.as_str(), options)?;
                writer
                    .write_all(rebuild(&xml, &paragraphs).as_bytes())
                    .map_err(|e| AppError::io(format!("failed to write part {}", name), e))?;
                log::debug!("{}: replaced {} placeholder(s)", name, count);
                replaced += count;
                continue;
            }
        }

        writer.raw_copy_file(archive.by_index_raw(index)?)?;
    }

    let bytes = writer.finish()?.into_inner();
    Ok(Rendered { bytes, replaced })
}

/// Visible text of the main part, one line per paragraph.
pub fn extract_text(source: &[u8]) -> Result<String> {
    let patterns = Patterns::compile()?;
    let mut archive = open_package(source)?;
    let mut entry = archive.by_name(MAIN_PART)?;
    let xml = read_part(&mut entry, MAIN_PART)?;

    let lines: Vec<String> = scan(&xml, &patterns.run_text)
        .iter()
        .map(|paragraph| logical_text(paragraph))
        .collect();
    Ok(lines.join("\n"))
}

/// Distinct placeholder keys present in the text-bearing parts, split runs
/// included.
pub fn find_placeholders(source: &[u8]) -> Result<Vec<String>> {
    let patterns = Patterns::compile()?;
    let any_token = compile(ANY_TOKEN)?;
    let mut archive = open_package(source)?;
    let mut keys = BTreeSet::new();

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let name = entry.name().to_string();
        if !patterns.text_parts.is_match(&name) {
            continue;
        }
        let xml = read_part(&mut entry, &name)?;
        for paragraph in scan(&xml, &patterns.run_text) {
            let text = logical_text(&paragraph);
            keys.extend(
                any_token
                    .captures_iter(&text)
                    .filter_map(|caps| caps.get(1))
                    .map(|key| key.as_str().to_string()),
            );
        }
    }

    Ok(keys.into_iter().collect())
}

fn open_package(source: &[u8]) -> Result<ZipArchive<Cursor<&[u8]>>> {
    let archive = ZipArchive::new(Cursor::new(source))?;
    if !archive.file_names().any(|name| name == MAIN_PART) {
        return Err(AppError::Parse(format!("package has no {}", MAIN_PART)));
    }
    Ok(archive)
}

fn read_part(entry: &mut impl Read, name: &str) -> Result<String> {
    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .map_err(|e| AppError::Parse(format!("could not read {}: {}", name, e)))?;
    Ok(xml)
}

/// `\{(k1|k2|...)\}` for the supplied keys, `None` when there are none.
fn token_pattern(replacements: &BTreeMap<String, String>) -> Result<Option<Regex>> {
    if replacements.is_empty() {
        return Ok(None);
    }
    let alternatives: Vec<String> = replacements.keys().map(|k| regex::escape(k)).collect();
    compile(&format!(r"\{{({})\}}", alternatives.join("|"))).map(Some)
}

/// Groups text nodes by the innermost open paragraph. Paragraphs are returned
/// in the order they open.
fn scan(xml: &str, run_text: &Regex) -> Vec<Paragraph> {
    let mut paragraphs: Vec<Paragraph> = Vec::new();
    // Indexes into `paragraphs`, innermost last.
    let mut open: Vec<usize> = Vec::new();

    for caps in run_text.captures_iter(xml) {
        let Some(whole) = caps.get(0) else { continue };
        match caps.get(1) {
            Some(content) => {
                let node = TextNode {
                    start: whole.start(),
                    content: content.range(),
                    end: whole.end(),
                    text: unescape(content.as_str()),
                    changed: false,
                };
                // Text outside any paragraph joins until the next `</w:p>`.
                let index = match open.last() {
                    Some(&index) => index,
                    None => {
                        open.push(paragraphs.len());
                        paragraphs.push(Vec::new());
                        paragraphs.len() - 1
                    }
                };
                paragraphs[index].push(node);
            }
            None if whole.as_str() == "</w:p>" => {
                open.pop();
            }
            // `<w:p/>` holds no text.
            None if whole.as_str().ends_with("/>") => {}
            None => {
                open.push(paragraphs.len());
                paragraphs.push(Vec::new());
            }
        }
    }
    paragraphs
}

fn logical_text(paragraph: &[TextNode]) -> String {
    paragraph.iter().map(|node| node.text.as_str()).collect()
}

fn substitute_paragraph(
    paragraph: &mut [TextNode],
    tokens: &Regex,
    replacements: &BTreeMap<String, String>,
) -> usize {
    let logical = logical_text(paragraph);
    let mut bounds = Vec::with_capacity(paragraph.len());
    let mut offset = 0;
    for node in paragraph.iter() {
        bounds.push(offset..offset + node.text.len());
        offset += node.text.len();
    }

    let matches: Vec<(Range<usize>, &str)> = tokens
        .captures_iter(&logical)
        .filter_map(|caps| {
            let token = caps.get(0)?;
            let value = replacements.get(caps.get(1)?.as_str())?;
            Some((token.range(), value.as_str()))
        })
        .collect();

    // Back to front, so offsets computed from the original text stay valid.
    for (token, value) in matches.iter().rev() {
        let mut placed = false;
        for (node, span) in paragraph.iter_mut().zip(&bounds) {
            if span.is_empty() || span.end <= token.start || span.start >= token.end {
                continue;
            }
            let from = token.start.max(span.start) - span.start;
            let to = token.end.min(span.end) - span.start;
            let insert = if placed { "" } else { *value };
            placed = true;
            node.text.replace_range(from..to, insert);
            node.changed = true;
        }
    }

    matches.len()
}

fn rebuild(xml: &str, paragraphs: &[Paragraph]) -> String {
    let mut out = String::with_capacity(xml.len());
    let mut last = 0;

    // Nested paragraphs interleave, so go by position.
    let mut changed: Vec<&TextNode> = paragraphs
        .iter()
        .flatten()
        .filter(|node| node.changed)
        .collect();
    changed.sort_by_key(|node| node.start);

    for node in changed {
        out.push_str(&xml[last..node.start]);
        let open = &xml[node.start..node.content.start];
        if open.contains("xml:space") {
            out.push_str(open);
        } else {
            // Values may start or end with spaces Word would otherwise drop.
            out.push_str(r#"<w:t xml:space="preserve""#);
            out.push_str(&open["<w:t".len()..]);
        }
        out.push_str(&escape(&node.text));
        out.push_str("</w:t>");
        last = node.end;
    }

    out.push_str(&xml[last..]);
    out
}

fn check_value(key: &str, value: &str) -> Result<()> {
    match value.chars().find(|&ch| !is_xml_char(ch)) {
        Some(ch) => Err(AppError::InvalidInput(format!(
            "'{}' contains U+{:04X}, which a document cannot hold",
            key, ch as u32
        ))),
        None => Ok(()),
    }
}

/// The `Char` production of XML 1.0.
fn is_xml_char(ch: char) -> bool {
    matches!(
        ch,
        '\t' | '\n' | '\r' | '\u{20}'..='\u{D7FF}' | '\u{E000}'..='\u{FFFD}' | '\u{10000}'..='\u{10FFFF}'
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn unescape(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail
            .find(';')
            .and_then(|semi| decode_entity(&tail[1..semi]).map(|ch| (ch, semi)));
        match decoded {
            Some((ch, semi)) => {
                out.push(ch);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse::<u32>().ok()?
            };
            char::from_u32(code)
        }
    }
}
