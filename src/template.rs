//! Note rendering: turns a vault template plus a merged record into note text.
//!
//! Rendering is best effort. Unknown placeholders stay in the output verbatim,
//! missing front matter skips the front-matter rewrite, and section injection
//! only fills gaps the template author left. Nothing here returns an error.

use regex::{Captures, Regex};
use std::ops::Range;
use std::sync::LazyLock;

use crate::record::{display_value, get_list, get_non_blank, get_str, resolve_path, Record};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\{\{\s*([A-Za-z0-9_][A-Za-z0-9_.\-]*)\s*\}\}|<!--\s*([A-Za-z0-9_][A-Za-z0-9_.\-]*)\s*-->",
    )
    .unwrap()
});

/// `Source:` with no value, or with a link whose target is empty, optionally quoted.
static EMPTY_SOURCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(\s*)Source:\s*("?)(?:\[([^\]]*)\]\(\s*\))?("?)\s*$"#).unwrap()
});

static CLICKABLE_SOURCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)Clickable Source:").unwrap());

static TAGS_KEY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^tags:\s*$").unwrap());

static LIST_ITEM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*-\s*(.*)$").unwrap());

static KEYWORDS_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#### Keywords:").unwrap());

static CHANNEL_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?mi)^[ \t]*#{1,6}[ \t]*Channel:?[ \t]*\r?$").unwrap());

static THUMBNAIL_MARKER: LazyLock<Regex> = LazyLock::new(|| marker_regex("thumbnail"));
static CHANNEL_MARKER: LazyLock<Regex> = LazyLock::new(|| marker_regex("channel"));
static DESCRIPTION_MARKER: LazyLock<Regex> = LazyLock::new(|| marker_regex("description"));

/// A concept is "already in the template" when a placeholder name starts with it
/// in either syntax, or a heading names it.
fn marker_regex(concept: &str) -> Regex {
    let pattern = [
        r"(?im)\{\{\s*",
        concept,
        r"[A-Za-z0-9_.\-]*\s*\}\}|<!--\s*",
        concept,
        r"[A-Za-z0-9_.\-]*\s*-->|^[ \t]*#+[ \t]*",
        concept,
        r"\b",
    ]
    .concat();
    Regex::new(&pattern).unwrap()
}

/// Render a template against a merged record.
pub fn render(template: &str, merged: &Record) -> String {
    let record = derive_fields(merged);
    let mut text = template.to_string();

    if let Some(front) = locate_front_matter(&text) {
        let rewritten = rewrite_front_matter(&text[front.inner.clone()], &record);
        text.replace_range(front.inner, &rewritten);
    }

    let text = substitute_placeholders(&text, &record);

    if is_video_content(&record) {
        inject_sections(template, text, &record)
    } else {
        text
    }
}

// --- Step 1: computed fields ---

/// Add the keys templates commonly reference but the scrapers do not produce.
/// Keys the caller already supplied are left alone.
pub fn derive_fields(merged: &Record) -> Record {
    let mut record = merged.clone();
    let mut derive = |key: &str, value: Option<String>| {
        if let Some(value) = value {
            record
                .entry(key.to_string())
                .or_insert_with(|| serde_json::Value::String(value));
        }
    };

    derive(
        "tagsYaml",
        get_list(merged, "tags").map(|tags| {
            tags.iter()
                .map(|t| format!("  - {}", t))
                .collect::<Vec<_>>()
                .join("\n")
        }),
    );
    derive("authorLink", get_non_blank(merged, "author").map(|a| wiki_link(&a)));
    derive("channelLink", get_non_blank(merged, "channel").map(|c| wiki_link(&c)));
    derive("imageEmbed", get_non_blank(merged, "imageUrl").map(|u| image_embed(&u)));
    derive(
        "thumbnailEmbed",
        get_non_blank(merged, "thumbnailUrl").map(|u| image_embed(&u)),
    );

    record
}

pub fn wiki_link(name: &str) -> String {
    format!("[[{}]]", name)
}

fn image_embed(url: &str) -> String {
    format!("![]({})", url)
}

// --- Step 2: front matter ---

/// Byte ranges of a leading front-matter block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontMatter {
    /// Lines between the delimiters, each with its line terminator.
    pub inner: Range<usize>,
    /// Offset just past the closing delimiter line.
    pub end: usize,
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end() == "---"
}

/// Find a `---` delimited block at the very start of the document.
pub fn locate_front_matter(text: &str) -> Option<FrontMatter> {
    let first_end = text.find('\n')?;
    if !is_delimiter(&text[..first_end]) {
        return None;
    }

    let inner_start = first_end + 1;
    let mut offset = inner_start;
    for line in text[inner_start..].split_inclusive('\n') {
        if is_delimiter(line) {
            return Some(FrontMatter {
                inner: inner_start..offset,
                end: offset + line.len(),
            });
        }
        offset += line.len();
    }
    None
}

// --- Step 3: front matter rewriting ---

/// Split a line into its content and terminator (`\n`, `\r\n` or nothing).
fn split_eol(line: &str) -> (&str, &str) {
    let content = line.trim_end_matches(['\n', '\r']);
    (content, &line[content.len()..])
}

/// Rewrite the recognized keys of a front-matter block. Every other line is kept as is.
pub fn rewrite_front_matter(block: &str, record: &Record) -> String {
    let source_url = get_non_blank(record, "sourceUrl");
    let significance = record
        .get("significance")
        .filter(|v| !v.is_null())
        .map(display_value)
        .filter(|s| !s.trim().is_empty());
    let user_tags = get_list(record, "tags");

    let lines: Vec<&str> = block.split_inclusive('\n').collect();
    let mut out = String::with_capacity(block.len());
    let mut i = 0;

    while i < lines.len() {
        let (content, eol) = split_eol(lines[i]);

        if let (Some(url), Some(caps)) = (source_url.as_deref(), EMPTY_SOURCE.captures(content)) {
            if let Some(line) = source_line(&caps, url) {
                out.push_str(&line);
                out.push_str(eol);
                i += 1;
                continue;
            }
        }

        if let (Some(url), Some(caps)) = (source_url.as_deref(), CLICKABLE_SOURCE.captures(content)) {
            out.push_str(&caps[1]);
            out.push_str("Clickable Source: ");
            out.push_str(url);
            out.push_str(eol);
            i += 1;
            continue;
        }

        if let (Some(tags), true) = (&user_tags, TAGS_KEY.is_match(content)) {
            let mut template_tags = Vec::new();
            let mut j = i + 1;
            while j < lines.len() {
                let (item_line, _) = split_eol(lines[j]);
                match LIST_ITEM.captures(item_line) {
                    Some(item) => {
                        let tag = item[1].trim();
                        if !tag.is_empty() {
                            template_tags.push(tag.to_string());
                        }
                        j += 1;
                    }
                    None => break,
                }
            }

            let eol = if eol.is_empty() { "\n" } else { eol };
            out.push_str(content);
            out.push_str(eol);
            for tag in merge_tags(&template_tags, tags) {
                out.push_str("  - ");
                out.push_str(&tag);
                out.push_str(eol);
            }
            i = j;
            continue;
        }

        if let Some(ref value) = significance {
            let trimmed = content.trim_end();
            if trimmed.ends_with("Significance:") {
                out.push_str(trimmed);
                out.push(' ');
                out.push_str(value);
                out.push_str(eol);
                i += 1;
                continue;
            }
        }

        out.push_str(lines[i]);
        i += 1;
    }

    out
}

fn source_line(caps: &Captures<'_>, url: &str) -> Option<String> {
    let open = caps.get(2).map_or("", |m| m.as_str());
    let close = caps.get(4).map_or("", |m| m.as_str());
    if open != close {
        return None;
    }
    let label = caps
        .get(3)
        .map(|m| m.as_str())
        .filter(|l| !l.trim().is_empty())
        .unwrap_or("Source");
    Some(format!("{}Source: {}[{}]({}){}", &caps[1], open, label, url, close))
}

/// Template tags first, then novel user tags, each exactly once.
pub fn merge_tags(template_tags: &[String], user_tags: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(template_tags.len() + user_tags.len());
    for tag in template_tags.iter().chain(user_tags) {
        if !merged.contains(tag) {
            merged.push(tag.clone());
        }
    }
    merged
}

// --- Step 4: placeholders ---

/// Replace `{{ path }}` and `<!-- path -->` placeholders that resolve in `record`.
/// Unresolved placeholders are kept byte for byte.
pub fn substitute_placeholders(text: &str, record: &Record) -> String {
    PLACEHOLDER
        .replace_all(text, |caps: &Captures<'_>| {
            let path = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            match resolve_path(record, path) {
                Some(value) => display_value(value),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

// --- Step 5: section injection ---

fn is_video_content(record: &Record) -> bool {
    let flow = get_str(record, "flowType").unwrap_or_default();
    let content = get_str(record, "contentType").unwrap_or_default();
    flow.eq_ignore_ascii_case("youtube")
        || content.eq_ignore_ascii_case("video")
        || content.eq_ignore_ascii_case("playlist")
}

/// Insert `section` at `pos`, starting it on a fresh line. Returns the offset past it.
fn insert_section(text: &mut String, pos: usize, section: &str) -> usize {
    let mut pos = pos;
    if pos > 0 && !text[..pos].ends_with('\n') {
        text.insert(pos, '\n');
        pos += 1;
    }
    text.insert_str(pos, section);
    pos + section.len()
}

/// End of the section whose heading ends at `heading_end`: the next heading line, or the end.
fn section_end(text: &str, heading_end: usize) -> usize {
    let body_start = match text[heading_end..].find('\n') {
        Some(nl) => heading_end + nl + 1,
        None => return text.len(),
    };
    let mut offset = body_start;
    for line in text[body_start..].split_inclusive('\n') {
        if line.trim_start().starts_with('#') {
            return offset;
        }
        offset += line.len();
    }
    text.len()
}

fn inject_sections(template: &str, mut text: String, record: &Record) -> String {
    let front_end = locate_front_matter(&text).map_or(0, |f| f.end);

    let mut thumbnail_end = None;
    if !THUMBNAIL_MARKER.is_match(template) {
        if let Some(url) = get_non_blank(record, "thumbnailUrl") {
            let section = format!("#### Thumbnail:\n{}\n\n", image_embed(&url));
            thumbnail_end = Some(insert_section(&mut text, front_end, &section));
        }
    }

    let mut channel_end = None;
    if !CHANNEL_MARKER.is_match(template) {
        if let Some(channel) = get_non_blank(record, "channel") {
            let link = get_non_blank(record, "channelLink").unwrap_or_else(|| wiki_link(&channel));
            let section = format!("#### Channel:\n{}\n\n", link);
            let pos = KEYWORDS_HEADING
                .find(&text[front_end..])
                .map(|m| front_end + m.start())
                .or(thumbnail_end)
                .unwrap_or(front_end);
            channel_end = Some(insert_section(&mut text, pos, &section));
        }
    }

    if !DESCRIPTION_MARKER.is_match(template) {
        if let Some(description) = get_non_blank(record, "description") {
            let section = format!("#### Description:\n{}\n\n", description.trim_end());
            // An injected Channel section is followed directly; one the
            // template already has is followed at its end.
            let pos = channel_end
                .or_else(|| {
                    CHANNEL_HEADING
                        .find(&text[front_end..])
                        .map(|m| section_end(&text, front_end + m.end()))
                })
                .or(thumbnail_end)
                .unwrap_or(front_end);
            insert_section(&mut text, pos, &section);
        }
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_body_placeholders() {
        let out = render(
            "Author: {{author}}\n{{missing}}",
            &record(json!({"author": "Jane Doe"})),
        );
        assert_eq!(out, "Author: Jane Doe\n{{missing}}");
    }

    #[test]
    fn test_placeholder_syntaxes_and_paths() {
        let data = record(json!({
            "title": "Dune",
            "book": {"series": {"name": "Dune Chronicles"}},
            "rating": 4.5,
            "genres": ["Fiction", "Classics"]
        }));
        let out = render(
            "# {{ title }}\n<!-- book.series.name -->\n{{rating}} | {{genres}}\n<!-- note: keep -->\n{{book.publisher}}",
            &data,
        );
        assert_eq!(
            out,
            "# Dune\nDune Chronicles\n4.5 | Fiction, Classics\n<!-- note: keep -->\n{{book.publisher}}"
        );
    }

    #[test]
    fn test_empty_string_is_defined() {
        let out = render("[{{subtitle}}]", &record(json!({"subtitle": ""})));
        assert_eq!(out, "[]");
        let out = render("[{{subtitle}}]", &record(json!({"subtitle": null})));
        assert_eq!(out, "[{{subtitle}}]");
    }

    #[test]
    fn test_derived_fields() {
        let data = record(json!({
            "author": "Jane Doe",
            "channel": "Veritasium",
            "imageUrl": "https://img/cover.jpg",
            "thumbnailUrl": "https://img/thumb.jpg",
            "tags": "History, Media-Type/Book, History"
        }));
        let derived = derive_fields(&data);
        assert_eq!(derived["authorLink"], json!("[[Jane Doe]]"));
        assert_eq!(derived["channelLink"], json!("[[Veritasium]]"));
        assert_eq!(derived["imageEmbed"], json!("![](https://img/cover.jpg)"));
        assert_eq!(derived["thumbnailEmbed"], json!("![](https://img/thumb.jpg)"));
        assert_eq!(
            derived["tagsYaml"],
            json!("  - History\n  - Media-Type/Book\n  - History")
        );
    }

    #[test]
    fn test_derived_fields_keep_explicit_values() {
        let data = record(json!({"author": "Jane Doe", "authorLink": "[[Doe, Jane]]"}));
        assert_eq!(derive_fields(&data)["authorLink"], json!("[[Doe, Jane]]"));
    }

    #[test]
    fn test_tags_block_union() {
        let template = "---\ntags:\n  - Media-Type/Book\n---\nBody";
        let out = render(template, &record(json!({"tags": "History, Media-Type/Book"})));
        assert_eq!(out, "---\ntags:\n  - Media-Type/Book\n  - History\n---\nBody");
    }

    #[test]
    fn test_tags_block_dedup_is_case_sensitive() {
        let template = "---\ntitle: x\ntags:\n  - history\n  - history\nstatus: open\n---\n";
        let out = render(template, &record(json!({"tags": ["History", "Science"]})));
        assert_eq!(
            out,
            "---\ntitle: x\ntags:\n  - history\n  - History\n  - Science\nstatus: open\n---\n"
        );
    }

    #[test]
    fn test_tags_block_not_fabricated() {
        let template = "---\ntitle: x\n---\nBody";
        let out = render(template, &record(json!({"tags": "History"})));
        assert_eq!(out, template);
    }

    #[test]
    fn test_empty_tags_block_filled() {
        let template = "---\ntags:\nstatus: open\n---\n";
        let out = render(template, &record(json!({"tags": "Inbox"})));
        assert_eq!(out, "---\ntags:\n  - Inbox\nstatus: open\n---\n");
    }

    #[test]
    fn test_source_lines() {
        let template = "---\nSource: \nLink Source: [Goodreads]()\nClickable Source: TBD\n  Source: \"[Goodreads]()\"\nNotes Source: keep\n---\n";
        let data = record(json!({"sourceUrl": "https://example.com/b"}));
        let out = render(template, &data);
        assert_eq!(
            out,
            "---\nSource: [Source](https://example.com/b)\nLink Source: [Goodreads]()\nClickable Source: https://example.com/b\n  Source: \"[Goodreads](https://example.com/b)\"\nNotes Source: keep\n---\n"
        );
    }

    #[test]
    fn test_filled_source_left_alone() {
        let template = "---\nSource: [Site](https://already.example)\n---\n";
        let out = render(template, &record(json!({"sourceUrl": "https://example.com/b"})));
        assert_eq!(out, template);
    }

    #[test]
    fn test_source_untouched_without_url() {
        let template = "---\nSource: \nClickable Source: \n---\n";
        assert_eq!(render(template, &Record::new()), template);
    }

    #[test]
    fn test_significance() {
        let template = "---\nSignificance:\nOther Significance: 2\n---\n";
        let out = render(template, &record(json!({"significance": 4})));
        assert_eq!(out, "---\nSignificance: 4\nOther Significance: 2\n---\n");

        let out = render(template, &record(json!({"significance": ""})));
        assert_eq!(out, template);
    }

    #[test]
    fn test_unrecognized_front_matter_passthrough() {
        let template = "---\naliases: [ \"x\" ]\r\ncreated:   2024-01-01  \n# comment\n---\nBody {{title}}\n";
        let out = render(template, &record(json!({"title": "T", "tags": "a"})));
        assert_eq!(
            out,
            "---\naliases: [ \"x\" ]\r\ncreated:   2024-01-01  \n# comment\n---\nBody T\n"
        );
    }

    #[test]
    fn test_crlf_front_matter() {
        let template = "---\r\ntags:\r\n  - a\r\nSignificance:\r\n---\r\nBody";
        let out = render(template, &record(json!({"tags": "b", "significance": 3})));
        assert_eq!(out, "---\r\ntags:\r\n  - a\r\n  - b\r\nSignificance: 3\r\n---\r\nBody");
    }

    #[test]
    fn test_missing_front_matter_is_noop() {
        let template = "Source: \ntags:\n  - a\n{{title}}";
        let data = record(json!({"sourceUrl": "https://x", "tags": "b", "title": "T"}));
        assert_eq!(render(template, &data), "Source: \ntags:\n  - a\nT");

        let unterminated = "---\ntags:\n  - a\nno closing line";
        assert_eq!(render(unterminated, &data), unterminated);
    }

    #[test]
    fn test_front_matter_placeholders_substituted_after_rewrite() {
        let template = "---\ntitle: \"{{title}}\"\nauthor: \"{{authorLink}}\"\n---\n";
        let out = render(template, &record(json!({"title": "Dune", "author": "Frank Herbert"})));
        assert_eq!(out, "---\ntitle: \"Dune\"\nauthor: \"[[Frank Herbert]]\"\n---\n");
    }

    #[test]
    fn test_render_is_idempotent() {
        let template = "---\nSource: \ntags:\n  - Media-Type/Book\nSignificance:\n---\n# {{title}}\n{{unknown}}\n";
        let data = record(json!({
            "title": "Dune",
            "sourceUrl": "https://example.com",
            "tags": "History",
            "significance": 3
        }));
        let once = render(template, &data);
        assert_eq!(render(&once, &Record::new()), once);
        assert_eq!(render(&once, &data), once);
    }

    fn video_data() -> Record {
        record(json!({
            "flowType": "youtube",
            "thumbnailUrl": "https://i.ytimg.com/vi/abc/maxresdefault.jpg",
            "channel": "Veritasium",
            "description": "Why the sky is blue."
        }))
    }

    #[test]
    fn test_video_sections_injected_in_order() {
        let template = "---\ntitle: x\n---\n# Notes\n";
        let out = render(template, &video_data());
        assert_eq!(
            out,
            "---\ntitle: x\n---\n#### Thumbnail:\n![](https://i.ytimg.com/vi/abc/maxresdefault.jpg)\n\n#### Channel:\n[[Veritasium]]\n\n#### Description:\nWhy the sky is blue.\n\n# Notes\n"
        );
    }

    #[test]
    fn test_injected_sections_precede_opening_paragraph() {
        let template = "---\ntitle: x\n---\nIntro paragraph\n# Notes\n";
        let out = render(template, &video_data());
        assert_eq!(
            out,
            "---\ntitle: x\n---\n#### Thumbnail:\n![](https://i.ytimg.com/vi/abc/maxresdefault.jpg)\n\n#### Channel:\n[[Veritasium]]\n\n#### Description:\nWhy the sky is blue.\n\nIntro paragraph\n# Notes\n"
        );
    }

    #[test]
    fn test_description_follows_thumbnail_without_channel() {
        let template = "---\ntitle: x\n---\nIntro paragraph\n# Notes\n";
        let mut data = video_data();
        data.remove("channel");
        let out = render(template, &data);
        assert_eq!(
            out,
            "---\ntitle: x\n---\n#### Thumbnail:\n![](https://i.ytimg.com/vi/abc/maxresdefault.jpg)\n\n#### Description:\nWhy the sky is blue.\n\nIntro paragraph\n# Notes\n"
        );
    }

    #[test]
    fn test_video_sections_independently_omitted() {
        let template = "---\ntitle: x\n---\n# Notes\n";
        let mut data = video_data();
        data.remove("thumbnailUrl");
        data.insert("description".to_string(), json!("   "));
        let out = render(template, &data);
        assert_eq!(out, "---\ntitle: x\n---\n#### Channel:\n[[Veritasium]]\n\n# Notes\n");
    }

    #[test]
    fn test_video_markers_suppress_injection() {
        let template = "---\ntitle: x\n---\n{{thumbnailEmbed}}\n<!-- description -->\n";
        let out = render(template, &video_data());
        assert_eq!(
            out,
            "---\ntitle: x\n---\n#### Channel:\n[[Veritasium]]\n\n![](https://i.ytimg.com/vi/abc/maxresdefault.jpg)\nWhy the sky is blue.\n"
        );
    }

    #[test]
    fn test_channel_goes_before_keywords() {
        let template = "---\ntitle: x\n---\n{{thumbnailEmbed}}\n#### Keywords:\n- a\n";
        let mut data = video_data();
        data.remove("description");
        let out = render(template, &data);
        assert_eq!(
            out,
            "---\ntitle: x\n---\n![](https://i.ytimg.com/vi/abc/maxresdefault.jpg)\n#### Channel:\n[[Veritasium]]\n\n#### Keywords:\n- a\n"
        );
    }

    #[test]
    fn test_description_follows_existing_channel_section() {
        let template = "---\ntitle: x\n---\n#### Channel:\n{{channelLink}}\n#### Notes\n";
        let mut data = video_data();
        data.remove("thumbnailUrl");
        let out = render(template, &data);
        assert_eq!(
            out,
            "---\ntitle: x\n---\n#### Channel:\n[[Veritasium]]\n#### Description:\nWhy the sky is blue.\n\n#### Notes\n"
        );
    }

    #[test]
    fn test_injection_without_front_matter() {
        let mut data = video_data();
        data.remove("channel");
        data.remove("description");
        let out = render("Body", &data);
        assert_eq!(
            out,
            "#### Thumbnail:\n![](https://i.ytimg.com/vi/abc/maxresdefault.jpg)\n\nBody"
        );
    }

    #[test]
    fn test_front_matter_without_trailing_newline() {
        let mut data = video_data();
        data.remove("thumbnailUrl");
        data.remove("description");
        let out = render("---\ntitle: x\n---", &data);
        assert_eq!(out, "---\ntitle: x\n---\n#### Channel:\n[[Veritasium]]\n\n");
    }

    #[test]
    fn test_no_injection_for_other_flows() {
        let mut data = video_data();
        data.insert("flowType".to_string(), json!("goodreads"));
        let template = "---\ntitle: x\n---\n";
        assert_eq!(render(template, &data), template);

        data.insert("contentType".to_string(), json!("Playlist"));
        assert!(render(template, &data).contains("#### Thumbnail:"));
    }

    #[test]
    fn test_locate_front_matter() {
        let text = "---\na: 1\n---\nbody";
        assert_eq!(
            locate_front_matter(text),
            Some(FrontMatter { inner: 4..9, end: 13 })
        );
        assert_eq!(locate_front_matter("---\n---\n"), Some(FrontMatter { inner: 4..4, end: 8 }));
        assert_eq!(locate_front_matter("body\n---\na\n---\n"), None);
        assert_eq!(locate_front_matter("---"), None);
    }

    #[test]
    fn test_merge_tags() {
        let template = vec!["a".to_string(), "b".to_string()];
        let user = vec!["b".to_string(), "c".to_string(), "c".to_string()];
        assert_eq!(merge_tags(&template, &user), vec!["a", "b", "c"]);
    }
}
