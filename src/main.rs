//! mealsnap - Entry Point

use clap::{ArgGroup, Parser};
use mealsnap::config::{ResolvedConfig, StoreKind};
use mealsnap::gateway::{HttpAnalysisGateway, HttpMealStore, JsonlMealStore, MealStore};
use mealsnap::integration::{run_session, spawn_interrupt_handler};
use mealsnap::model::{AppError, Language};
use mealsnap::source::{CaptureCommand, FilePicker, LocalImageSource};
use mealsnap::state::WorkflowCoordinator;
use mealsnap::workflow::{Timeouts, Workflow};
use std::path::PathBuf;
use tracing::{info, warn};

/// mealsnap - estimate a meal's nutrition from a photo, edit it, save it
#[derive(Parser, Debug)]
#[command(name = "mealsnap")]
#[command(version)]
#[command(about = "Photo-based meal logging: analyse, edit ingredients, submit")]
#[command(group(ArgGroup::new("input").required(true).args(["image", "capture"])))]
pub struct Args {
    /// Image file to analyse
    pub image: Option<PathBuf>,

    /// Take the photo with the configured capture command
    #[arg(short, long)]
    pub capture: bool,

    /// Comment sent with the initial analysis
    #[arg(long)]
    pub hint: Option<String>,

    /// Analysis language (en or he)
    #[arg(short, long)]
    pub language: Option<Language>,

    /// Root URL of the nutrition API
    #[arg(long)]
    pub api_url: Option<String>,

    /// Save meals to the local JSONL file instead of the API
    #[arg(long)]
    pub local: bool,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(run(args));
    // A pending stdin read holds a blocking thread until Enter is pressed.
    runtime.shutdown_background();
    result
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    // Defaults → Config File → Env Vars → CLI Args
    let config = {
        let config_file = mealsnap::config::load_config_with_precedence(args.config.clone())?;
        let merged = mealsnap::config::merge_config(config_file)?;
        let with_env = mealsnap::config::apply_env_overrides(merged)?;
        mealsnap::config::apply_cli_overrides(with_env, args.language, args.api_url.clone(), args.local)
    };

    let _log_guard = mealsnap::logging::init(&config.log_file_path).map_err(AppError::from)?;

    info!(
        config = ?config,
        "Configuration loaded and resolved"
    );

    let source = LocalImageSource::new(
        CaptureCommand::new(config.capture_command.clone()),
        args.image.clone().map(FilePicker::new),
    );
    if args.capture && !source.has_camera() {
        warn!("--capture given but no capture_command is configured");
    }

    let gateway = HttpAnalysisGateway::new(&config.api_base_url, config.api_token.clone())
        .map_err(|e| AppError::Http(e.to_string()))?;
    let store = build_store(&config)?;
    let timeouts = Timeouts {
        analysis: config.analysis_timeout(),
        submission: config.submission_timeout(),
    };
    let mut workflow = Workflow::new(
        WorkflowCoordinator::new(config.language),
        gateway,
        store,
        timeouts,
    );

    let acquired = if args.capture {
        workflow.capture(&source).await
    } else {
        workflow.pick(&source).await
    };
    acquired.map_err(AppError::from)?;

    if let Some(hint) = args.hint {
        workflow
            .coordinator_mut()
            .set_pre_comment(hint)
            .map_err(AppError::from)?;
    }

    let quit = spawn_interrupt_handler(workflow.cancel_handle());
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    run_session(&mut workflow, stdin, &mut stdout, &quit).await?;

    info!(status = %workflow.coordinator().status(), "Session finished");
    Ok(())
}

fn build_store(config: &ResolvedConfig) -> Result<Box<dyn MealStore>, AppError> {
    match config.store {
        StoreKind::Remote => {
            let store = HttpMealStore::new(&config.api_base_url, config.api_token.clone())
                .map_err(|e| AppError::Http(e.to_string()))?;
            Ok(Box::new(store))
        }
        StoreKind::Local => Ok(Box::new(JsonlMealStore::new(
            config.local_store_path.clone(),
        ))),
    }
}
