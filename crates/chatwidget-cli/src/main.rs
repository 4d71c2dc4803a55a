use std::{
    fs,
    io::{self, Read},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use chatwidget_core::{
    Config, DEFAULT_SCRIPT_URL, Mode, Theme, WidgetOptions, WidgetState, embed_snippet, normalize,
    render,
};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{Map, Value, json};
use uuid::Uuid;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = match cli.command {
        CliCommand::Snippet {
            config,
            chatbot_id,
            routing_url,
            script_url,
            mode,
            container_id,
        } => handle_snippet(
            &config,
            chatbot_id,
            routing_url,
            &script_url,
            mode,
            container_id,
        )?,
        CliCommand::Normalize { config } => handle_normalize(&config)?,
        CliCommand::Preview { config, open } => handle_preview(&config, open)?,
    };
    println!("{output}");
    Ok(())
}

#[derive(Parser, Debug)]
#[command(
    name = "chatwidget",
    version,
    about = "Chat widget tooling: embed snippets, normalized configs and previews"
)]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Print the embed snippet for a theme produced by the builder
    Snippet {
        /// Theme JSON file, or `-` for stdin.
        #[arg(long, value_name = "PATH")]
        config: PathBuf,
        /// Chatbot id; a fresh UUID is generated when omitted.
        #[arg(long)]
        chatbot_id: Option<String>,
        /// Base URL of the routing backend.
        #[arg(long)]
        routing_url: String,
        #[arg(long, default_value = DEFAULT_SCRIPT_URL)]
        script_url: String,
        #[arg(long, value_enum, default_value_t = ModeArg::Bubble)]
        mode: ModeArg,
        /// Host element id for inline mode.
        #[arg(long)]
        container_id: Option<String>,
    },
    /// Print the normalized configuration for an init options file
    Normalize {
        /// Options JSON file (`{ chatbotId, routingUrl, metadata, mode, theme }`), or `-`.
        #[arg(long, value_name = "PATH")]
        config: PathBuf,
    },
    /// Print the static HTML and stylesheet the widget renders on first load
    Preview {
        #[arg(long, value_name = "PATH")]
        config: PathBuf,
        /// Render the window open.
        #[arg(long)]
        open: bool,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Bubble,
    Inpage,
}

impl From<ModeArg> for Mode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Bubble => Mode::Bubble,
            ModeArg::Inpage => Mode::Inpage,
        }
    }
}

fn read_json(path: &Path) -> Result<Value> {
    let raw = if path == Path::new("-") {
        let mut raw = String::new();
        io::stdin()
            .read_to_string(&mut raw)
            .context("failed to read stdin")?;
        raw
    } else {
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?
    };
    serde_json::from_str(&raw).with_context(|| format!("invalid JSON in {}", path.display()))
}

fn read_options(path: &Path) -> Result<WidgetOptions> {
    let value = read_json(path)?;
    serde_json::from_value(value)
        .with_context(|| format!("{} is not a valid options object", path.display()))
}

fn handle_snippet(
    config: &Path,
    chatbot_id: Option<String>,
    routing_url: String,
    script_url: &str,
    mode: ModeArg,
    container_id: Option<String>,
) -> Result<String> {
    let theme = match read_json(config)? {
        Value::Object(theme) => theme,
        other => bail!("theme must be a JSON object, got {other}"),
    };
    let options = WidgetOptions {
        chatbot_id: chatbot_id.unwrap_or_else(|| Uuid::new_v4().to_string()),
        routing_url,
        mode: mode.into(),
        container_id,
        theme,
        ..WidgetOptions::default()
    };
    Ok(embed_snippet(script_url, &options))
}

fn handle_normalize(config: &Path) -> Result<String> {
    let config = normalize(&Theme::default(), read_options(config)?);
    serde_json::to_string_pretty(&normalized_json(&config)).context("failed to encode config")
}

fn normalized_json(config: &Config) -> Value {
    let unknown: Vec<&str> = config.unknown_options().collect();
    let mut out = Map::new();
    out.insert("chatbotId".into(), json!(config.chatbot_id));
    out.insert("routingUrl".into(), json!(config.routing_url));
    out.insert("endpoint".into(), json!(config.endpoint()));
    out.insert("metadata".into(), json!(config.metadata));
    out.insert("mode".into(), json!(config.mode));
    out.insert("containerId".into(), json!(config.container_id));
    out.insert("theme".into(), Value::Object(config.theme.to_map()));
    if !unknown.is_empty() {
        out.insert("unknownOptions".into(), json!(unknown));
    }
    Value::Object(out)
}

fn handle_preview(config: &Path, open: bool) -> Result<String> {
    let config = normalize(&Theme::default(), read_options(config)?);
    let mut state = WidgetState::new(&config);
    if open {
        state.open = true;
    }
    Ok(render(&config, &state).to_html())
}
