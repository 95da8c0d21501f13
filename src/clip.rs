use serde::Serialize;
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::error::{ClipError, WriteError};
use crate::flows::{suggest_location, FlowDescriptor, FlowRegistry};
use crate::record::{get_non_blank, merge_records, Record};
use crate::settings::Settings;
use crate::template::render;
use crate::vault::VaultClient;
use crate::writer::{NoteWriter, WriteResult};

/// Where the template text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// A note in the vault, fetched over the Local REST API.
    Vault(String),
    File(PathBuf),
    Inline(String),
}

/// One clip action: the extracted page data plus the user's edits.
#[derive(Debug, Clone)]
pub struct ClipRequest {
    pub flow_id: String,
    pub extracted: Record,
    pub form: Record,
    /// `None` falls back to the form's `template` field, then the flow default.
    pub template: Option<TemplateSource>,
}

/// A finished note, ready for a writer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedNote {
    pub file_name: String,
    pub location: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipOutcome {
    pub note: RenderedNote,
    pub write: WriteResult,
}

/// Everything a clip action needs: flows, settings and the vault connection.
pub struct Clipper {
    pub registry: FlowRegistry,
    pub settings: Settings,
    vault: Option<VaultClient>,
    /// Launch URIs and use the clipboard when writing through the URI scheme.
    interactive: bool,
}

impl Clipper {
    pub fn new(registry: FlowRegistry, settings: Settings, interactive: bool) -> Result<Self, ClipError> {
        let vault = if settings.local_rest_api_key.trim().is_empty() {
            None
        } else {
            Some(VaultClient::from_settings(&settings)?)
        };
        Ok(Self {
            registry,
            settings,
            vault,
            interactive,
        })
    }

    pub fn flow(&self, id: &str) -> Result<&FlowDescriptor, ClipError> {
        self.registry
            .get_flow(id)
            .ok_or_else(|| ClipError::UnknownFlow(id.to_string()))
    }

    /// The vault client, or a configuration error when no API key is set.
    pub fn vault(&self) -> Result<&VaultClient, ClipError> {
        self.vault.as_ref().ok_or_else(|| {
            ClipError::Configuration(
                "the Local REST API key is not set (localRestApiKey)".to_string(),
            )
        })
    }

    pub fn writer(&self) -> Result<NoteWriter, ClipError> {
        NoteWriter::from_settings(&self.settings, self.interactive).map_err(|e| match e {
            WriteError::VaultUnconfigured(msg) => ClipError::Configuration(msg),
            other => ClipError::Write(other),
        })
    }

    /// Initial form values for freshly extracted data.
    pub fn prepare_form(&self, flow: &FlowDescriptor, extracted: &Record) -> Record {
        prepare_form(flow, extracted, &self.settings)
    }

    /// Resolve the template text for a request.
    pub async fn resolve_template(
        &self,
        flow: &FlowDescriptor,
        source: Option<&TemplateSource>,
        form: &Record,
    ) -> Result<String, ClipError> {
        let chosen = match source {
            Some(source) => Some(source.clone()),
            None => get_non_blank(form, "template").map(TemplateSource::Vault),
        };

        match chosen {
            Some(TemplateSource::Inline(text)) => Ok(text),
            Some(TemplateSource::File(path)) => tokio::fs::read_to_string(&path)
                .await
                .map_err(|source| ClipError::TemplateRead {
                    path: path.display().to_string(),
                    source,
                }),
            Some(TemplateSource::Vault(path)) => self.fetch_vault_template(&path).await,
            None => {
                let default = flow
                    .default_template
                    .as_deref()
                    .ok_or_else(|| ClipError::TemplateMissing(flow.id.clone()))?;
                let templates = self
                    .vault()?
                    .list_templates(&self.settings.template_pattern)
                    .await?;
                let found = templates
                    .into_iter()
                    .find(|t| t.name == default)
                    .ok_or_else(|| ClipError::TemplateMissing(flow.id.clone()))?;
                debug!(flow = %flow.id, template = %found.path, "using default template");
                self.fetch_vault_template(&found.path).await
            }
        }
    }

    async fn fetch_vault_template(&self, path: &str) -> Result<String, ClipError> {
        self.vault()?
            .fetch_template_content(path)
            .await
            .map_err(|source| ClipError::TemplateFetch {
                path: path.to_string(),
                source,
            })
    }

    /// Render the note for a request without writing it.
    pub async fn render(&self, request: &ClipRequest) -> Result<RenderedNote, ClipError> {
        let flow = self.flow(&request.flow_id)?;
        let template = self
            .resolve_template(flow, request.template.as_ref(), &request.form)
            .await?;
        Ok(build_note(
            flow,
            &request.extracted,
            &request.form,
            &template,
            &self.settings,
            &today(),
        ))
    }

    /// Render and persist a note.
    pub async fn clip(&self, request: &ClipRequest) -> Result<ClipOutcome, ClipError> {
        let writer = self.writer()?;
        let note = self.render(request).await?;
        let write = writer
            .write(&note.file_name, &note.location, &note.content)
            .await?;
        info!(flow = %request.flow_id, path = %write.full_path, "clipped note");
        Ok(ClipOutcome { note, write })
    }
}

/// Form values the popup starts from: mapped fields, suggested tags, a
/// suggested location and field defaults.
pub fn prepare_form(flow: &FlowDescriptor, extracted: &Record, settings: &Settings) -> Record {
    let mut form = flow.map_data_to_form(extracted);

    let tags = flow.generate_tags(extracted, &settings.vault_state()).join(", ");
    let fallback = if flow.default_location.is_empty() {
        settings.default_location.as_str()
    } else {
        flow.default_location.as_str()
    };
    let location = suggest_location(&tags, &settings.vault_folders, fallback);

    form.insert("tags".to_string(), json!(tags));
    form.insert("location".to_string(), json!(location));
    if !form.contains_key("significance") {
        form.insert("significance".to_string(), json!(settings.default_significance));
    }
    flow.initial_values(&form)
}

/// Merge, name and render a note. Pure apart from the supplied date.
pub fn build_note(
    flow: &FlowDescriptor,
    extracted: &Record,
    form: &Record,
    template: &str,
    settings: &Settings,
    date: &str,
) -> RenderedNote {
    let mut merged = merge_records(extracted, form);
    merged
        .entry("flowType")
        .or_insert_with(|| json!(flow.id));
    merged.entry("date").or_insert_with(|| json!(date));
    let significance_missing = match merged.get("significance") {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        _ => false,
    };
    if significance_missing {
        merged.insert("significance".to_string(), json!(settings.default_significance));
    }

    let title = get_non_blank(form, "title")
        .or_else(|| get_non_blank(extracted, "title"))
        .unwrap_or_else(|| "Untitled".to_string());
    let location = get_non_blank(form, "location")
        .or_else(|| Some(flow.default_location.clone()).filter(|l| !l.is_empty()))
        .unwrap_or_else(|| settings.default_location.clone());

    RenderedNote {
        file_name: format!("{}.md", sanitize_file_name(&title)),
        location,
        content: render(template, &merged),
    }
}

/// Replace characters that are invalid in vault file names with `-`.
pub fn sanitize_file_name(title: &str) -> String {
    let sanitized: String = title
        .chars()
        .filter(|c| *c != '\u{00A0}' && *c != '\u{FEFF}')
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            _ => c,
        })
        .collect();

    let trimmed = sanitized.trim();
    if trimmed.is_empty() {
        "Untitled".to_string()
    } else {
        trimmed.to_string()
    }
}

fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}
