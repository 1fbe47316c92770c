use std::path::PathBuf;

use clap::Parser;
use sidepage::demo::{run_scenario, DemoPage, Scenario};
use sidepage::{ConfigError, GlobalConfig, PanelOptions, Position, StackManager};
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Error, Debug)]
pub enum DemoError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("scenario failed: {0}")]
    Scenario(#[from] anyhow::Error),

    #[error("failed to encode report: {0}")]
    Report(#[from] serde_json::Error),
}

/// Runs side-page stack scenarios and prints what each one observed.
#[derive(Parser, Debug)]
#[command(name = "side-page-demo", version)]
struct Args {
    /// Scenarios to run (default: all).
    #[arg(value_enum)]
    scenarios: Vec<Scenario>,

    /// JSON file with global panel defaults.
    #[arg(long, env = "SIDE_PAGE_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, env = "SIDE_PAGE_WIDTH")]
    width: Option<String>,

    #[arg(long, env = "SIDE_PAGE_MIN_WIDTH")]
    min_width: Option<String>,

    #[arg(long, env = "SIDE_PAGE_MAX_WIDTH")]
    max_width: Option<String>,

    #[arg(long, value_enum, env = "SIDE_PAGE_POSITION")]
    position: Option<PositionArg>,

    #[arg(long, env = "SIDE_PAGE_DISABLE_CLOSE")]
    disable_close: Option<bool>,

    #[command(flatten)]
    playground: PlaygroundArgs,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PositionArg {
    Start,
    End,
}

impl From<PositionArg> for Position {
    fn from(arg: PositionArg) -> Self {
        match arg {
            PositionArg::Start => Position::Start,
            PositionArg::End => Position::End,
        }
    }
}

/// Options for the playground scenario's panel.
#[derive(clap::Args, Debug)]
struct PlaygroundArgs {
    #[arg(long = "pg-position", value_enum, default_value = "end")]
    position: PositionArg,

    #[arg(long = "pg-width", default_value = "400px")]
    width: String,

    #[arg(long = "pg-min-width", default_value = "250px")]
    min_width: String,

    #[arg(long = "pg-max-width", default_value = "500px")]
    max_width: String,

    #[arg(long = "pg-z-index", default_value_t = 1000)]
    z_index: i32,

    #[arg(long = "pg-disable-close")]
    disable_close: bool,

    #[arg(long = "pg-hide-close-button")]
    hide_close_button: bool,

    #[arg(long = "pg-no-backdrop")]
    no_backdrop: bool,

    #[arg(long = "pg-panel-class")]
    panel_class: Option<String>,

    #[arg(long = "pg-backdrop-class")]
    backdrop_class: Option<String>,
}

impl PlaygroundArgs {
    fn to_options(&self) -> PanelOptions {
        let mut options = PanelOptions::default()
            .position(self.position.into())
            .width(&self.width)
            .min_width(&self.min_width)
            .max_width(&self.max_width)
            .z_index(self.z_index)
            .disable_close(self.disable_close)
            .show_close_button(!self.hide_close_button)
            .has_backdrop(!self.no_backdrop)
            .data(serde_json::json!({
                "type": "playground-test",
                "message": "Hello from the playground!"
            }));
        // Blank class names are left unset.
        if let Some(class) = self.panel_class.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            options = options.panel_class(class);
        }
        if let Some(class) = self.backdrop_class.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            options = options.backdrop_class(class);
        }
        options
    }
}

impl Args {
    fn global_config(&self) -> Result<GlobalConfig, ConfigError> {
        let file = match &self.config {
            Some(path) => GlobalConfig::load(path)?,
            None => GlobalConfig::default(),
        };
        Ok(file.merge(GlobalConfig {
            width: self.width.clone(),
            min_width: self.min_width.clone(),
            max_width: self.max_width.clone(),
            position: self.position.map(Into::into),
            disable_close: self.disable_close,
        }))
    }
}

#[tokio::main]
async fn main() -> Result<(), DemoError> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "side_page_demo=debug,sidepage=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = args.global_config()?;
    tracing::info!(?config, "side page demo starting");

    let stack: StackManager<DemoPage> = StackManager::new(config);
    let playground = args.playground.to_options();

    let scenarios = if args.scenarios.is_empty() {
        Scenario::all().to_vec()
    } else {
        args.scenarios.clone()
    };

    for scenario in scenarios {
        let report = run_scenario(&stack, scenario, &playground).await?;
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    tracing::info!("side page demo finished");
    Ok(())
}
