//! CityApp wizard driver
//!
//! Every wizard interaction is one process: the session store is loaded from
//! `<home>/sessions.json`, the command runs, and the store is written back.
//! Messages go to stdout as JSON; logs go to stderr and the rolling log file.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

use cityapp_grass::{Engine, GrassCli};
use cityapp_logging::{init_logging, LogConfig};
use cityapp_modules::{ModuleContext, ModuleError, SessionStore, Wizard};
use cityapp_protocol::Reply;
use cityapp_report::{DocumentTools, GhostscriptTools};

mod config;

use config::CityAppConfig;

#[derive(Parser, Debug)]
#[command(name = "cityapp", about = "CityApp GIS wizard", version)]
struct Cli {
    /// Enable verbose logging (info/debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Configuration file (default: <home>/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start a module and print its first message
    Launch {
        /// Module name (e.g. add_location, attribute_query)
        module: String,
    },

    /// Answer a message
    Reply(ReplyArgs),

    /// List finished reports
    Results,

    /// Describe the attribute table of a base-mapset layer
    Describe {
        /// Table (layer) name
        table: String,
    },

    /// List the available modules
    Modules,

    /// Show resolved configuration
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
struct ReplyArgs {
    /// Id of the message being answered, e.g. `add_map.2`
    message_id: String,

    /// Free text answer
    #[arg(conflicts_with_all = ["list", "file"])]
    text: Option<String>,

    /// Answer with a list of tokens
    #[arg(long, num_args = 1.., allow_hyphen_values = true, conflicts_with = "file")]
    list: Option<Vec<String>>,

    /// Answer with a file
    #[arg(long)]
    file: Option<PathBuf>,
}

impl ReplyArgs {
    fn reply(&self) -> Result<Reply> {
        match (&self.text, &self.list, &self.file) {
            (Some(text), None, None) => Ok(Reply::text(text.clone())),
            (None, Some(items), None) => Ok(Reply::list(items.iter().cloned())),
            (None, None, Some(path)) => Ok(Reply::file(path.clone())),
            _ => anyhow::bail!("Reply needs exactly one of TEXT, --list or --file"),
        }
    }
}

/// Error body printed on failure.
#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_logging(LogConfig {
        app_name: "cityapp",
        verbose: cli.verbose,
        log_dir: None,
    }) {
        eprintln!("Warning: logging disabled: {:#}", err);
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{:#}", err);
            let body = ErrorBody {
                message: user_message(&err),
            };
            match serde_json::to_string_pretty(&body) {
                Ok(json) => println!("{}", json),
                Err(_) => println!("{{\"message\": \"{}\"}}", body.message),
            }
            ExitCode::from(1)
        }
    }
}

/// Module errors carry their own user-facing text; anything else is shown
/// with its context chain.
fn user_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ModuleError>() {
        Some(module_err) => module_err.user_message(),
        None => format!("{:#}", err),
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = CityAppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Config { json } => {
            print_config(&config, json);
            Ok(())
        }
        Commands::Modules => {
            let wizard = build_wizard(&config)?;
            let names: Vec<&str> = wizard.modules().iter().map(|m| m.as_str()).collect();
            print_json(&names)
        }
        Commands::Results => {
            let wizard = build_wizard(&config)?;
            print_json(&wizard.list_results()?)
        }
        Commands::Describe { table } => {
            let wizard = build_wizard(&config)?;
            print_json(&wizard.describe_table(&table)?)
        }
        Commands::Launch { module } => {
            let wizard = build_wizard(&config)?;
            with_sessions(|store| {
                let message = wizard.launch(store, &module)?;
                info!(message_id = %message.message_id, "module launched");
                print_json(&message)
            })
        }
        Commands::Reply(args) => {
            let reply = args.reply()?;
            let wizard = build_wizard(&config)?;
            with_sessions(|store| {
                let message = wizard.reply(store, &args.message_id, reply)?;
                print_json(&message)
            })
        }
    }
}

fn build_wizard(config: &CityAppConfig) -> Result<Wizard> {
    let engine: Arc<dyn Engine> = Arc::new(match &config.grass_bin {
        Some(bin) => GrassCli::new(bin, config.gisdbase()),
        None => GrassCli::discover(config.gisdbase()).context("GRASS GIS not found")?,
    });
    let documents: Arc<dyn DocumentTools> =
        Arc::new(GhostscriptTools::discover().context("Report tools not found")?);
    Ok(Wizard::new(ModuleContext::new(config.to_paths(), engine, documents)))
}

/// Run `f` against the persisted store and write the store back on success.
fn with_sessions<F>(f: F) -> Result<()>
where
    F: FnOnce(&mut SessionStore) -> Result<()>,
{
    let path = config::sessions_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let mut store = SessionStore::load(&path)?;
    f(&mut store)?;
    store.save(&path)?;
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to encode output")?;
    println!("{}", json);
    Ok(())
}

fn print_config(config: &CityAppConfig, json: bool) {
    if json {
        let output = serde_json::json!({
            "home": config::cityapp_home(),
            "sessions": config::sessions_path(),
            "data_from_browser_dir": config.data_from_browser_dir,
            "geoserver_data_dir": config.geoserver_data_dir,
            "tile_dir": config.to_paths().tile_dir(),
            "grass_dir": config.grass_dir,
            "output_dir": config.output_dir,
            "grass_bin": config.grass_bin,
        });
        println!("{}", serde_json::to_string_pretty(&output).unwrap_or_default());
        return;
    }

    println!("CITYAPP CONFIGURATION");
    println!();
    println!("Home:              {}", config::cityapp_home().display());
    println!("Sessions:          {}", config::sessions_path().display());
    println!("Browser uploads:   {}", config.data_from_browser_dir.display());
    println!("GeoServer data:    {}", config.geoserver_data_dir.display());
    println!("Tile output:       {}", config.to_paths().tile_dir().display());
    println!("GIS database:      {}", config.grass_dir.display());
    println!("Results:           {}", config.output_dir.display());
    match &config.grass_bin {
        Some(bin) => println!("GRASS binary:      {}", bin.display()),
        None => println!("GRASS binary:      (PATH lookup)"),
    }
}
