//! Clip book, video and web page metadata into markdown notes.
//!
//! A URL selects a flow, the page is scraped into a record, the record is
//! mapped onto form fields, and the user's template is rendered against the
//! merged record before a writer hands the note to the vault.

pub mod clip;
pub mod error;
pub mod extract;
pub mod flows;
pub mod logging;
pub mod record;
pub mod server;
pub mod settings;
pub mod tags;
pub mod template;
pub mod vault;
pub mod writer;

pub use clip::{ClipRequest, Clipper, RenderedNote, TemplateSource};
pub use error::{ClipError, VaultError, WriteError};
pub use flows::{FlowDescriptor, FlowKind, FlowRegistry};
pub use record::Record;
pub use settings::Settings;
pub use template::render;
