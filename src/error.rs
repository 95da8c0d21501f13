use thiserror::Error;

/// Errors raised while talking to the vault's Local REST API.
#[derive(Error, Debug)]
pub enum VaultError {
    #[error("API key is required or invalid. Please check your API key.")]
    Unauthorized,

    #[error("Not authenticated. Please make sure your API key is correct.")]
    NotAuthenticated,

    #[error("Cannot reach the vault API at {url}. Make sure the vault app is running and its HTTP server is enabled: {reason}")]
    Unreachable { url: String, reason: String },

    #[error("Vault API returned {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Vault API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid template name pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Errors raised by a note writer. Every transport reports through these two kinds.
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("Vault is not configured: {0}")]
    VaultUnconfigured(String),

    #[error("Failed to write note '{path}': {reason}")]
    Transport { path: String, reason: String },
}

/// Errors surfaced to the user for a single clip action.
#[derive(Error, Debug)]
pub enum ClipError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Failed to extract content: {0}. Please try refreshing the page.")]
    Extraction(String),

    #[error("Failed to fetch template '{path}': {source}")]
    TemplateFetch {
        path: String,
        #[source]
        source: VaultError,
    },

    #[error("Failed to read template file '{path}': {source}")]
    TemplateRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No template selected for flow '{0}' and no default template was found in the vault")]
    TemplateMissing(String),

    #[error("Unknown flow '{0}'")]
    UnknownFlow(String),

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error("Settings error: {0}")]
    Settings(String),
}
