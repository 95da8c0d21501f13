use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt;

use crate::record::{get_bool, get_list, get_str, Record};
use crate::tags::fuzzy_match_tag;

// --- Flow kinds ---

/// The content source a flow handles. Per-flow behavior dispatches on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowKind {
    Book,
    Video,
    Generic,
}

impl FlowKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowKind::Book => "book",
            FlowKind::Video => "video",
            FlowKind::Generic => "generic",
        }
    }
}

impl fmt::Display for FlowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// --- Form schema ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Url,
    Textarea,
    Number,
    Tags,
    Location,
    Template,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSpec {
    pub id: String,
    pub label: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub readonly: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rows: Option<u32>,
    #[serde(default)]
    pub show_preview: bool,
}

impl FieldSpec {
    fn new(id: &str, label: &str, kind: FieldKind) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            kind,
            required: false,
            readonly: false,
            min: None,
            max: None,
            default: None,
            rows: None,
            show_preview: false,
        }
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    fn preview(mut self) -> Self {
        self.show_preview = true;
        self
    }

    fn rows(mut self, rows: u32) -> Self {
        self.rows = Some(rows);
        self
    }

    fn significance() -> Self {
        let mut field = Self::new("significance", "Significance (1-5)", FieldKind::Number);
        field.min = Some(1);
        field.max = Some(5);
        field.default = Some(json!(3));
        field
    }
}

// --- Vault state used by tag generation ---

/// What tag generation knows about the vault: its existing tags and the
/// user's genre override table.
#[derive(Debug, Clone, Default)]
pub struct VaultState {
    pub tags: Vec<String>,
    pub genre_overrides: HashMap<String, String>,
}

// --- Flow descriptor ---

#[derive(Debug, Clone)]
pub struct FlowDescriptor {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub kind: FlowKind,
    pub url_patterns: Vec<Regex>,
    pub form_fields: Vec<FieldSpec>,
    pub default_location: String,
    pub media_type_tag: Option<String>,
    pub default_template: Option<String>,
    /// Genre → comma-separated tags, consulted by exact genre name.
    pub genre_mapping: Vec<(String, String)>,
}

impl FlowDescriptor {
    pub fn matches(&self, url: &str) -> bool {
        self.url_patterns.iter().any(|p| p.is_match(url))
    }

    /// Suggested tags for freshly extracted data.
    pub fn generate_tags(&self, input: &Record, vault: &VaultState) -> Vec<String> {
        match self.kind {
            FlowKind::Book => self.book_tags(input, vault),
            FlowKind::Video => video_tags(input, vault),
            FlowKind::Generic => self.media_type_tag.iter().cloned().collect(),
        }
    }

    fn book_tags(&self, input: &Record, vault: &VaultState) -> Vec<String> {
        let mut suggested: Vec<String> = Vec::new();
        if let Some(ref media) = self.media_type_tag {
            push_unique(&mut suggested, media.clone());
        }

        for genre in get_list(input, "genres").unwrap_or_default() {
            let mapped = vault
                .genre_overrides
                .get(&genre)
                .map(String::as_str)
                .or_else(|| {
                    self.genre_mapping
                        .iter()
                        .find(|(name, _)| *name == genre)
                        .map(|(_, tags)| tags.as_str())
                });

            if let Some(mapped) = mapped {
                for tag in mapped.split(',').map(str::trim).filter(|t| !t.is_empty()) {
                    push_unique(&mut suggested, tag.to_string());
                }
                continue;
            }

            let normalized = genre.trim().to_lowercase();
            if let Some(tag) = fuzzy_match_tag(&normalized, &vault.tags) {
                push_unique(&mut suggested, tag);
            }
        }

        suggested
    }

    /// Map extracted page data onto this flow's form fields.
    pub fn map_data_to_form(&self, data: &Record) -> Record {
        let mut form = Record::new();

        match self.kind {
            FlowKind::Book => {
                copy_field(&mut form, data, "title", "title");
                copy_field(&mut form, data, "author", "author");
                copy_field(&mut form, data, "imageUrl", "imageUrl");
                copy_field(&mut form, data, "description", "description");
                copy_field(&mut form, data, "sourceUrl", "pageUrl");
                let genres = data.get("genres").cloned().unwrap_or_else(|| json!([]));
                form.insert("genres".to_string(), genres);
            }
            FlowKind::Video => {
                copy_field(&mut form, data, "title", "title");
                copy_field(&mut form, data, "channel", "channel");
                copy_field(&mut form, data, "thumbnailUrl", "thumbnailUrl");
                copy_field(&mut form, data, "description", "description");
                copy_field(&mut form, data, "sourceUrl", "pageUrl");
                let is_playlist = get_bool(data, "isPlaylist");
                let content_type = if is_playlist { "Playlist" } else { "Video" };
                form.insert("contentType".to_string(), json!(content_type));
                form.insert("isPlaylist".to_string(), json!(is_playlist));
            }
            FlowKind::Generic => {
                let title = get_str(data, "title")
                    .filter(|t| !t.trim().is_empty())
                    .unwrap_or_else(|| "Untitled".to_string());
                form.insert("title".to_string(), json!(title));
                copy_field(&mut form, data, "sourceUrl", "pageUrl");
                let description = get_str(data, "description").unwrap_or_default();
                form.insert("description".to_string(), json!(description));
            }
        }

        form
    }

    /// Mapped form values with field defaults filled in where nothing was extracted.
    pub fn initial_values(&self, mapped: &Record) -> Record {
        let mut values = mapped.clone();
        for field in &self.form_fields {
            if let Some(ref default) = field.default {
                let missing = match values.get(&field.id) {
                    None | Some(Value::Null) => true,
                    Some(Value::String(s)) => s.is_empty(),
                    _ => false,
                };
                if missing {
                    values.insert(field.id.clone(), default.clone());
                }
            }
        }
        if !values.contains_key("location") {
            values.insert("location".to_string(), json!(self.default_location));
        }
        values
    }

    pub fn summary(&self) -> FlowSummary {
        FlowSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            icon: self.icon.clone(),
            kind: self.kind,
            default_location: self.default_location.clone(),
            default_template: self.default_template.clone(),
            form_fields: self.form_fields.clone(),
        }
    }
}

fn video_tags(input: &Record, vault: &VaultState) -> Vec<String> {
    if !get_bool(input, "isPlaylist") {
        return Vec::new();
    }

    let existing = vault.tags.iter().find(|tag| {
        let clean = tag.to_lowercase();
        let clean = clean.strip_prefix('#').unwrap_or(&clean);
        clean == "resource" || clean == "resources"
    });

    match existing {
        Some(tag) => vec![tag.strip_prefix('#').unwrap_or(tag).to_string()],
        None => vec!["Resource".to_string()],
    }
}

fn copy_field(form: &mut Record, data: &Record, key: &str, from: &str) {
    if let Some(value) = data.get(from).filter(|v| !v.is_null()) {
        form.insert(key.to_string(), value.clone());
    }
}

fn push_unique(tags: &mut Vec<String>, tag: String) {
    if !tags.contains(&tag) {
        tags.push(tag);
    }
}

/// Serializable view of a flow for the popup and the CLI.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub kind: FlowKind,
    pub default_location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_template: Option<String>,
    pub form_fields: Vec<FieldSpec>,
}

/// Pick a folder for a note from its tags. Falls back to `default_location`.
pub fn suggest_location(tags: &str, folders: &[String], default_location: &str) -> String {
    let tags_lower = tags.to_lowercase();
    for folder in folders {
        let folder_lower = folder.to_lowercase();
        let leaf = folder_lower.rsplit('/').next().unwrap_or(&folder_lower);
        for tag in tags_lower.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            if folder_lower.contains(tag) || tag.contains(leaf) {
                return folder.clone();
            }
        }
    }
    default_location.to_string()
}

// --- Registry ---

/// Outcome of picking a flow for a page.
#[derive(Debug, Clone)]
pub enum FlowSelection<'a> {
    Single(&'a FlowDescriptor),
    Choice(Vec<&'a FlowDescriptor>),
    NoMatch,
}

pub const GENERIC_FLOW_ID: &str = "generic";

/// Flows in registration order.
#[derive(Debug, Clone, Default)]
pub struct FlowRegistry {
    flows: Vec<FlowDescriptor>,
}

impl FlowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the book, video and generic page flows, in that order.
    pub fn with_builtin_flows() -> Self {
        let mut registry = Self::new();
        registry.register(book_flow());
        registry.register(video_flow());
        registry.register(generic_flow());
        registry
    }

    /// Add a flow. An existing id is replaced in place, keeping its position.
    pub fn register(&mut self, flow: FlowDescriptor) {
        match self.flows.iter_mut().find(|f| f.id == flow.id) {
            Some(existing) => *existing = flow,
            None => self.flows.push(flow),
        }
    }

    pub fn get_flow(&self, id: &str) -> Option<&FlowDescriptor> {
        self.flows.iter().find(|f| f.id == id)
    }

    pub fn all_flows(&self) -> &[FlowDescriptor] {
        &self.flows
    }

    pub fn detect_flow(&self, url: &str) -> Option<&FlowDescriptor> {
        self.flows.iter().find(|f| f.matches(url))
    }

    pub fn get_matching_flows(&self, url: &str) -> Vec<&FlowDescriptor> {
        self.flows.iter().filter(|f| f.matches(url)).collect()
    }

    /// Prefer site-specific flows over the catch-all one.
    pub fn select_flow(&self, url: &str) -> FlowSelection<'_> {
        let specific: Vec<&FlowDescriptor> = self
            .get_matching_flows(url)
            .into_iter()
            .filter(|f| f.id != GENERIC_FLOW_ID)
            .collect();

        match specific.len() {
            0 => self
                .get_flow(GENERIC_FLOW_ID)
                .map(FlowSelection::Single)
                .unwrap_or(FlowSelection::NoMatch),
            1 => FlowSelection::Single(specific[0]),
            _ => FlowSelection::Choice(specific),
        }
    }
}

fn patterns(sources: &[&str]) -> Vec<Regex> {
    sources
        .iter()
        .map(|s| Regex::new(s).expect("built-in flow pattern"))
        .collect()
}

const BOOK_GENRES: &[(&str, &str)] = &[
    ("Fiction", "Literature"),
    ("Science Fiction", "Computer-Science, Science-Fiction"),
    ("Fantasy", "Literature, Fantasy"),
    ("History", "History"),
    ("Philosophy", "Philosophy"),
    ("Computer Science", "Computer-Science"),
    ("Programming", "Computer-Science, Software-Engineering"),
    ("Biography", "Biography"),
    ("Self Help", "Psychology, Self-Improvement"),
    ("Business", "Economics, Business"),
    ("Science", "Science"),
    ("Politics", "Politics"),
    ("Economics", "Economics"),
    ("Sociology", "Sociology"),
    ("Psychology", "Psychology"),
    ("Neuroscience", "Neuroscience"),
    ("Mathematics", "Mathematics"),
    ("Physics", "Physics"),
    ("Biology", "Biology"),
];

/// Genre table shipped with the book flow; also the default override table in settings.
pub fn default_genre_mapping() -> Vec<(String, String)> {
    BOOK_GENRES
        .iter()
        .map(|(g, t)| (g.to_string(), t.to_string()))
        .collect()
}

fn book_flow() -> FlowDescriptor {
    FlowDescriptor {
        id: "goodreads".to_string(),
        name: "Goodreads Book".to_string(),
        description: "Import book information from Goodreads".to_string(),
        icon: "📚".to_string(),
        kind: FlowKind::Book,
        url_patterns: patterns(&[r"goodreads\.com/book/show/"]),
        form_fields: vec![
            FieldSpec::new("title", "Title", FieldKind::Text).required(),
            FieldSpec::new("author", "Author", FieldKind::Text).required(),
            FieldSpec::new("imageUrl", "Image URL", FieldKind::Url).required().preview(),
            FieldSpec::new("description", "Summary", FieldKind::Textarea).rows(6),
            FieldSpec::new("tags", "Tags", FieldKind::Tags),
            FieldSpec::significance(),
            FieldSpec::new("location", "Note Location", FieldKind::Location),
            FieldSpec::new("template", "Note Template", FieldKind::Template),
            FieldSpec::new("sourceUrl", "Goodreads URL", FieldKind::Url).readonly(),
        ],
        default_location: "Books".to_string(),
        media_type_tag: Some("Media-Type/Book".to_string()),
        default_template: Some("Book Note Template".to_string()),
        genre_mapping: default_genre_mapping(),
    }
}

fn video_flow() -> FlowDescriptor {
    FlowDescriptor {
        id: "youtube".to_string(),
        name: "YouTube Video/Playlist".to_string(),
        description: "Import video or playlist information from YouTube".to_string(),
        icon: "🎥".to_string(),
        kind: FlowKind::Video,
        url_patterns: patterns(&[
            r"youtube\.com/watch",
            r"youtube\.com/playlist",
            r"youtu\.be/",
            r"youtube\.com/shorts/",
        ]),
        form_fields: vec![
            FieldSpec::new("title", "Title", FieldKind::Text).required(),
            FieldSpec::new("channel", "Channel", FieldKind::Text),
            FieldSpec::new("thumbnailUrl", "Thumbnail URL", FieldKind::Url).preview(),
            FieldSpec::new("description", "Description", FieldKind::Textarea).rows(4),
            FieldSpec::new("tags", "Tags", FieldKind::Tags),
            FieldSpec::significance(),
            FieldSpec::new("location", "Note Location", FieldKind::Location),
            FieldSpec::new("template", "Note Template", FieldKind::Template),
        ],
        default_location: "Resources".to_string(),
        media_type_tag: None,
        // Subject-specific templates are picked by the user.
        default_template: None,
        genre_mapping: Vec::new(),
    }
}

fn generic_flow() -> FlowDescriptor {
    FlowDescriptor {
        id: GENERIC_FLOW_ID.to_string(),
        name: "Web Page".to_string(),
        description: "Save any web page to the vault".to_string(),
        icon: "🌐".to_string(),
        kind: FlowKind::Generic,
        url_patterns: patterns(&[r".*"]),
        form_fields: vec![
            FieldSpec::new("title", "Title", FieldKind::Text).required(),
            FieldSpec::new("sourceUrl", "URL", FieldKind::Url).readonly(),
            FieldSpec::new("description", "Notes", FieldKind::Textarea).rows(6),
            FieldSpec::new("tags", "Tags", FieldKind::Tags),
            FieldSpec::significance(),
            FieldSpec::new("location", "Note Location", FieldKind::Location),
            FieldSpec::new("template", "Note Template", FieldKind::Template),
        ],
        default_location: "Inbox".to_string(),
        media_type_tag: Some("Media-Type/Web-Page".to_string()),
        default_template: Some("Web Page Note Template".to_string()),
        genre_mapping: Vec::new(),
    }
}
