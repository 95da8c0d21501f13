use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::error::WriteError;
use crate::settings::{Settings, WriterKind};
use crate::vault::VaultClient;

/// Longest content (in characters) sent inline through a `new` URI.
pub const URI_CONTENT_LIMIT: usize = 8000;

/// Outcome of a successful write.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteResult {
    pub file_name: String,
    pub full_path: String,
    pub method: WriterKind,
    /// The URI that creates the note, for the URI transport.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// Content did not fit in the URI and was copied to the clipboard instead.
    pub clipboard_fallback: bool,
}

/// Writes notes through the vault app's URI scheme.
#[derive(Debug, Clone)]
pub struct UriWriter {
    pub vault: String,
    /// Launch the URI and use the clipboard. When off, the URI is only returned.
    pub interactive: bool,
}

/// Where finished notes go.
#[derive(Debug, Clone)]
pub enum NoteWriter {
    Uri(UriWriter),
    Rest(VaultClient),
    Filesystem { root: PathBuf },
}

impl NoteWriter {
    pub fn from_settings(settings: &Settings, interactive: bool) -> Result<Self, WriteError> {
        match settings.writer {
            WriterKind::Uri => {
                if settings.vault_path.trim().is_empty() {
                    return Err(WriteError::VaultUnconfigured(
                        "set the vault name (vaultPath) in settings".to_string(),
                    ));
                }
                Ok(NoteWriter::Uri(UriWriter {
                    vault: settings.vault_path.clone(),
                    interactive,
                }))
            }
            WriterKind::Rest => {
                if settings.local_rest_api_key.trim().is_empty() {
                    return Err(WriteError::VaultUnconfigured(
                        "set the Local REST API key (localRestApiKey) in settings".to_string(),
                    ));
                }
                let client = VaultClient::from_settings(settings)
                    .map_err(|e| WriteError::VaultUnconfigured(e.to_string()))?;
                Ok(NoteWriter::Rest(client))
            }
            WriterKind::Filesystem => match settings.vault_root.as_deref().map(str::trim) {
                Some(root) if !root.is_empty() => Ok(NoteWriter::Filesystem {
                    root: PathBuf::from(root),
                }),
                _ => Err(WriteError::VaultUnconfigured(
                    "set the vault directory (vaultRoot) in settings".to_string(),
                )),
            },
        }
    }

    pub fn kind(&self) -> WriterKind {
        match self {
            NoteWriter::Uri(_) => WriterKind::Uri,
            NoteWriter::Rest(_) => WriterKind::Rest,
            NoteWriter::Filesystem { .. } => WriterKind::Filesystem,
        }
    }

    /// Persist `content` as `location/file_name`.
    pub async fn write(
        &self,
        file_name: &str,
        location: &str,
        content: &str,
    ) -> Result<WriteResult, WriteError> {
        let full_path = note_path(location, file_name);
        let mut result = WriteResult {
            file_name: file_name.to_string(),
            full_path: full_path.clone(),
            method: self.kind(),
            uri: None,
            clipboard_fallback: false,
        };

        match self {
            NoteWriter::Uri(writer) => {
                let (uri, clipboard_fallback) = writer.create(&full_path, content)?;
                result.uri = Some(uri);
                result.clipboard_fallback = clipboard_fallback;
            }
            NoteWriter::Rest(client) => {
                client
                    .put_note(&full_path, content)
                    .await
                    .map_err(|e| WriteError::Transport {
                        path: full_path.clone(),
                        reason: e.to_string(),
                    })?;
            }
            NoteWriter::Filesystem { root } => {
                let target = root.join(&full_path);
                if let Some(parent) = target.parent() {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .map_err(|e| WriteError::Transport {
                            path: parent.display().to_string(),
                            reason: e.to_string(),
                        })?;
                }
                tokio::fs::write(&target, content)
                    .await
                    .map_err(|e| WriteError::Transport {
                        path: target.display().to_string(),
                        reason: e.to_string(),
                    })?;
            }
        }

        info!(path = %result.full_path, method = ?result.method, "note written");
        Ok(result)
    }
}

impl UriWriter {
    fn create(&self, full_path: &str, content: &str) -> Result<(String, bool), WriteError> {
        let inline = content.chars().count() < URI_CONTENT_LIMIT;
        let uri = new_note_uri(&self.vault, full_path, inline.then_some(content));

        if !self.interactive {
            return Ok((uri, false));
        }

        debug!(%uri, "launching vault URI");
        open::that(&uri).map_err(|e| WriteError::Transport {
            path: full_path.to_string(),
            reason: format!("could not open the vault URI: {}", e),
        })?;

        let copied = !inline && copy_to_clipboard(content);
        Ok((uri, copied))
    }
}

// Best effort: the note is already created, the user pastes the body.
fn copy_to_clipboard(content: &str) -> bool {
    match arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(content)) {
        Ok(()) => {
            info!("note content copied to clipboard, paste it into the new note");
            true
        }
        Err(e) => {
            warn!(error = %e, "clipboard copy failed");
            false
        }
    }
}

/// `location/file_name`, or just the file name when no location is set.
pub fn note_path(location: &str, file_name: &str) -> String {
    let location = location.trim_matches('/');
    if location.is_empty() {
        file_name.to_string()
    } else {
        format!("{}/{}", location, file_name)
    }
}

/// URI that creates a note, with the body inline when given.
pub fn new_note_uri(vault: &str, full_path: &str, content: Option<&str>) -> String {
    let mut uri = format!(
        "obsidian://new?vault={}&file={}",
        urlencoding::encode(vault),
        urlencoding::encode(full_path)
    );
    if let Some(content) = content {
        uri.push_str("&content=");
        uri.push_str(&urlencoding::encode(content));
    }
    uri
}

/// URI that opens an existing note.
pub fn open_note_uri(vault: &str, location: &str, file_name: &str) -> String {
    format!(
        "obsidian://open?vault={}&file={}",
        urlencoding::encode(vault),
        urlencoding::encode(&note_path(location, file_name))
    )
}
