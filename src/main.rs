use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use vault_agent_lib::clip::{prepare_form, ClipRequest, Clipper, TemplateSource};
use vault_agent_lib::extract::{extract, fetch_page};
use vault_agent_lib::flows::{FlowDescriptor, FlowRegistry, FlowSelection};
use vault_agent_lib::logging::init_logging;
use vault_agent_lib::record::{merge_records, Record};
use vault_agent_lib::server;
use vault_agent_lib::settings::{default_settings_path, load_settings, save_settings, Settings};
use vault_agent_lib::vault::VaultClient;

/// Clip web pages into notes in a local vault
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Settings file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List flows, or the flows that apply to a URL
    Flows {
        #[arg(long)]
        url: Option<String>,
    },
    /// Extract page data and print the prefilled form
    Extract {
        url: String,
        /// Saved page HTML instead of downloading the URL
        #[arg(long)]
        html: Option<PathBuf>,
        #[arg(long)]
        flow: Option<String>,
    },
    /// Render a note from a template without writing it
    Render {
        #[arg(long)]
        flow: String,
        /// Template file
        #[arg(long)]
        template: PathBuf,
        /// Extracted data (JSON or YAML)
        #[arg(long)]
        data: Option<PathBuf>,
        /// Form values (JSON or YAML)
        #[arg(long)]
        form: Option<PathBuf>,
    },
    /// Extract, render and write a note
    Clip {
        /// Page to clip; its data is extracted and the form prefilled
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        flow: Option<String>,
        #[arg(long)]
        data: Option<PathBuf>,
        #[arg(long)]
        form: Option<PathBuf>,
        /// Template file on disk
        #[arg(long, conflicts_with = "template_path")]
        template: Option<PathBuf>,
        /// Template note in the vault
        #[arg(long)]
        template_path: Option<String>,
    },
    /// Pull folders and tags from the vault into the settings
    Sync,
    /// List template notes in the vault
    Templates {
        /// Overrides the configured template name pattern
        #[arg(long)]
        pattern: Option<String>,
    },
    /// Run the local HTTP service for the browser extension
    Serve {
        #[arg(long, default_value_t = 27125)]
        port: u16,
    },
    /// Show or change settings
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the settings
    Show,
    /// Print the settings file location
    Path,
    /// Set one setting; the value is parsed as JSON, else taken as a string
    Set { key: String, value: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings_path = match cli.config {
        Some(path) => path,
        None => default_settings_path()?,
    };
    let settings = load_settings(&settings_path);

    match cli.command {
        Command::Flows { url } => run_flows(url.as_deref()),
        Command::Extract { url, html, flow } => {
            run_extract(&settings, &url, html.as_deref(), flow.as_deref()).await
        }
        Command::Render {
            flow,
            template,
            data,
            form,
        } => {
            let clipper = Clipper::new(FlowRegistry::with_builtin_flows(), settings, false)?;
            let request = ClipRequest {
                flow_id: flow,
                extracted: read_record(data.as_deref())?,
                form: read_record(form.as_deref())?,
                template: Some(TemplateSource::File(template)),
            };
            let note = clipper.render(&request).await?;
            print!("{}", note.content);
            Ok(())
        }
        Command::Clip {
            url,
            flow,
            data,
            form,
            template,
            template_path,
        } => {
            let clipper = Clipper::new(FlowRegistry::with_builtin_flows(), settings, true)?;
            let template = template
                .map(TemplateSource::File)
                .or(template_path.map(TemplateSource::Vault));
            run_clip(&clipper, url, flow, data, form, template).await
        }
        Command::Sync => run_sync(settings, &settings_path).await,
        Command::Templates { pattern } => {
            let client = VaultClient::from_settings(&settings)?;
            let pattern = pattern.unwrap_or_else(|| settings.template_pattern.clone());
            let templates = client.list_templates(&pattern).await?;
            print_json(&serde_json::to_value(templates)?)
        }
        Command::Serve { port } => {
            let clipper = Clipper::new(FlowRegistry::with_builtin_flows(), settings, false)?;
            server::serve(Arc::new(clipper), port).await
        }
        Command::Config { action } => run_config(settings, &settings_path, action),
    }
}

fn run_flows(url: Option<&str>) -> Result<()> {
    let registry = FlowRegistry::with_builtin_flows();
    let flows: Vec<&FlowDescriptor> = match url {
        None => registry.all_flows().iter().collect(),
        Some(url) => match registry.select_flow(url) {
            FlowSelection::Single(flow) => vec![flow],
            FlowSelection::Choice(flows) => flows,
            FlowSelection::NoMatch => Vec::new(),
        },
    };
    let summaries: Vec<_> = flows.iter().map(|f| f.summary()).collect();
    print_json(&serde_json::to_value(summaries)?)
}

fn pick_flow<'a>(registry: &'a FlowRegistry, url: &str, id: Option<&str>) -> Result<&'a FlowDescriptor> {
    match id {
        Some(id) => registry
            .get_flow(id)
            .with_context(|| format!("unknown flow '{}'", id)),
        None => match registry.select_flow(url) {
            FlowSelection::Single(flow) => Ok(flow),
            FlowSelection::Choice(flows) => {
                let ids: Vec<&str> = flows.iter().map(|f| f.id.as_str()).collect();
                bail!("several flows match {}; pick one with --flow ({})", url, ids.join(", "))
            }
            FlowSelection::NoMatch => bail!("no flow matches {}", url),
        },
    }
}

async fn load_page(settings: &Settings, url: &str, html: Option<&Path>) -> Result<String> {
    match html {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => Ok(fetch_page(url, settings.request_timeout()).await?),
    }
}

async fn run_extract(
    settings: &Settings,
    url: &str,
    html: Option<&Path>,
    flow_id: Option<&str>,
) -> Result<()> {
    let registry = FlowRegistry::with_builtin_flows();
    let flow = pick_flow(&registry, url, flow_id)?;
    let page = load_page(settings, url, html).await?;
    let extracted = extract(flow.kind, &page, url)?;
    let form = prepare_form(flow, &extracted, settings);

    print_json(&serde_json::json!({
        "flow": flow.id,
        "extracted": extracted,
        "form": form,
    }))
}

async fn run_clip(
    clipper: &Clipper,
    url: Option<String>,
    flow_id: Option<String>,
    data: Option<PathBuf>,
    form: Option<PathBuf>,
    template: Option<TemplateSource>,
) -> Result<()> {
    let overrides = read_record(form.as_deref())?;

    let (flow_id, extracted, form) = match url {
        Some(url) => {
            let flow = pick_flow(&clipper.registry, &url, flow_id.as_deref())?;
            let page = load_page(&clipper.settings, &url, None).await?;
            let extracted = extract(flow.kind, &page, &url)?;
            let prepared = clipper.prepare_form(flow, &extracted);
            (flow.id.clone(), extracted, merge_records(&prepared, &overrides))
        }
        None => {
            let flow_id = flow_id.context("--flow is required without --url")?;
            (flow_id, read_record(data.as_deref())?, overrides)
        }
    };

    let outcome = clipper
        .clip(&ClipRequest {
            flow_id,
            extracted,
            form,
            template,
        })
        .await?;
    if outcome.write.clipboard_fallback {
        info!("note content is on the clipboard, paste it into the new note");
    }
    print_json(&serde_json::to_value(&outcome.write)?)
}

async fn run_sync(mut settings: Settings, path: &Path) -> Result<()> {
    let client = VaultClient::from_settings(&settings)?;
    client.check_connection().await?;

    let folders = client.list_folders().await?;
    let tags = client.list_tags().await?;
    info!(folders = folders.len(), tags = tags.len(), "synced vault");

    settings.vault_folders = folders;
    settings.vault_tags = tags;
    save_settings(path, &settings)?;
    println!(
        "Synced {} folders and {} tags into {}",
        settings.vault_folders.len(),
        settings.vault_tags.len(),
        path.display()
    );
    Ok(())
}

fn run_config(settings: Settings, path: &Path, action: Option<ConfigAction>) -> Result<()> {
    match action.unwrap_or(ConfigAction::Show) {
        ConfigAction::Show => print_json(&serde_json::to_value(&settings)?),
        ConfigAction::Path => {
            println!("{}", path.display());
            Ok(())
        }
        ConfigAction::Set { key, value } => {
            let mut current = serde_json::to_value(&settings)?;
            let Some(object) = current.as_object_mut() else {
                bail!("settings did not serialize to an object");
            };
            if !object.contains_key(&key) {
                bail!("unknown setting '{}'", key);
            }
            let parsed = serde_json::from_str::<Value>(&value).unwrap_or(Value::String(value));
            object.insert(key, parsed);

            let updated: Settings = serde_json::from_value(current)
                .context("value does not fit this setting")?;
            save_settings(path, &updated.normalize())?;
            Ok(())
        }
    }
}

/// Read a record from a JSON or YAML file. No file means an empty record.
fn read_record(path: Option<&Path>) -> Result<Record> {
    let Some(path) = path else {
        return Ok(Record::new());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value: Value = serde_yaml::from_str(&text)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Record::new()),
        _ => bail!("{} must contain a mapping", path.display()),
    }
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
