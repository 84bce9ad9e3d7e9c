use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use scriptchat_core::template::DEFAULT_KEY;
use scriptchat_core::{Config, SiteConfig, TemplateStore, ThemeName};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod app;
mod handler;
mod tui;
mod ui;

use app::{App, AppOptions};
use tui::EventHandler;

#[derive(Parser)]
#[command(name = "scriptchat")]
#[command(version, about = "Replay scripted chat conversations with a live analysis feed")]
struct Cli {
    /// Template to load on startup (e.g. template_two)
    #[arg(short, long)]
    template: Option<String>,

    /// Theme to start with: premium, retro or hybrid
    #[arg(long)]
    theme: Option<String>,

    /// Extra directory of template JSON files
    #[arg(long)]
    templates_dir: Option<PathBuf>,

    /// Config file (defaults to <config_dir>/scriptchat/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write logs here; the terminal UI owns stdout and stderr
    #[arg(long, env = "SCRIPTCHAT_LOG")]
    log_file: Option<PathBuf>,
}

fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Arc::new(file)),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    Ok(())
}

fn load_config(cli: &Cli) -> Config {
    let loaded = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    loaded.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not read config, using defaults");
        Config::new()
    })
}

fn load_templates(cli: &Cli, config: &Config) -> TemplateStore {
    let mut store = TemplateStore::builtin();
    let dir = cli.templates_dir.as_ref().or(config.templates_dir.as_ref());
    if let Some(dir) = dir {
        match store.load_dir(dir) {
            Ok(count) => tracing::info!(count, dir = %dir.display(), "loaded templates"),
            Err(e) => tracing::warn!(error = %e, "could not load templates directory"),
        }
    }
    store
}

/// CLI flag, then config file, then the site's active theme
fn resolve_theme(cli: &Cli, config: &Config, site: &SiteConfig) -> ThemeName {
    if let Some(name) = cli.theme.as_deref() {
        match ThemeName::from_str(name) {
            Some(theme) => return theme,
            None => tracing::warn!(theme = name, "unknown theme"),
        }
    }
    config.theme_name().unwrap_or(site.active_theme)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.log_file {
        init_logging(path)?;
    }

    let config = load_config(&cli);
    let store = load_templates(&cli, &config);
    let site = SiteConfig::builtin();

    let options = AppOptions {
        theme: resolve_theme(&cli, &config, &site),
        initial_template: cli
            .template
            .clone()
            .or_else(|| config.default_template.clone())
            .unwrap_or_else(|| DEFAULT_KEY.to_string()),
        timing: config.timing(),
    };
    tracing::info!(
        theme = options.theme.as_str(),
        template = %options.initial_template,
        "starting"
    );

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let mut events = EventHandler::new(options.timing.typing_speed);
    let mut app = App::new(store, site, options, events.sender());

    let result = run(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    result
}

async fn run(terminal: &mut tui::Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        let Some(event) = events.next().await else {
            break;
        };
        handler::handle_event(app, event)?;
    }
    Ok(())
}
