// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// ToolGhor — Local File-Processing Toolbox
//
// Entry point. Loads configuration, initialises logging, queues the given
// files and runs one operation over them.

mod services;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use toolghor_jobs::{
    Dispatcher, OperationId, ParameterPrompt, ProgressReporter, QueueStore, RawFile, RunOutcome,
    ScriptedPrompt,
};
use tracing::{error, info, warn};

use services::app_services::{self, AppServices};
use services::terminal::{self, LinePrompt};

#[derive(Parser)]
#[command(name = "toolghor", version, about = "Local PDF, image, video and archive toolbox")]
struct Cli {
    /// Configuration file (defaults to config.json in the data directory)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the available operations and their parameters
    List {
        /// Print the operation table as JSON
        #[arg(long)]
        json: bool,
    },
    /// Queue files and run one operation over them
    Run {
        /// Operation name, as printed by `toolghor list`
        operation: OperationId,
        /// Files to queue, in order
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Directory receiving the results
        #[arg(short, long, value_name = "DIR")]
        out: Option<PathBuf>,
        /// Answer the next parameter prompt; repeat for operations that ask
        /// more than once
        #[arg(short, long = "param", value_name = "VALUE")]
        params: Vec<String>,
        /// ffmpeg executable used for video operations
        #[arg(long, value_name = "PATH")]
        ffmpeg: Option<PathBuf>,
        /// Directory holding the OCR detection and recognition models
        #[arg(long, value_name = "DIR")]
        ocr_models: Option<PathBuf>,
        /// JPEG quality for converted images (1-100)
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=100))]
        jpeg_quality: Option<u8>,
    },
    /// Show the effective configuration
    Config {
        /// Write it to the configuration file
        #[arg(long)]
        save: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(AppServices::default_config_path);
    let (config, config_error) = match app_services::load_config(&config_path) {
        Ok(config) => (config, None),
        Err(err) => (Default::default(), Some(err)),
    };

    // Logs go to stderr; stdout carries results.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .or_else(|_| tracing_subscriber::EnvFilter::try_new(&config.log_filter))
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Some(err) = config_error {
        warn!(path = %config_path.display(), error = %err, "ignoring unreadable configuration");
    }

    let mut services = AppServices::new(config, config_path);

    match cli.command {
        Command::List { json } => list(json),
        Command::Config { save } => show_config(&services, save),
        Command::Run {
            operation,
            files,
            out,
            params,
            ffmpeg,
            ocr_models,
            jpeg_quality,
        } => {
            let config = services.config_mut();
            if let Some(out) = out {
                config.output_dir = out;
            }
            if let Some(ffmpeg) = ffmpeg {
                config.ffmpeg_path = ffmpeg;
            }
            if let Some(dir) = ocr_models {
                config.ocr_model_dir = Some(dir);
            }
            if let Some(quality) = jpeg_quality {
                config.jpeg_quality = quality;
            }
            run(&services, operation, files, params).await
        }
    }
}

fn list(json: bool) -> ExitCode {
    if json {
        let table: Vec<_> = Dispatcher::operations().collect();
        match serde_json::to_string_pretty(&table) {
            Ok(text) => println!("{text}"),
            Err(err) => {
                error!("cannot serialise operation table: {err}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        print!("{}", terminal::render_operations(Dispatcher::operations()));
    }
    ExitCode::SUCCESS
}

fn show_config(services: &AppServices, save: bool) -> ExitCode {
    if save {
        if let Err(err) = services.save_config() {
            error!(path = %services.config_path().display(), "cannot save configuration: {err}");
            return ExitCode::FAILURE;
        }
    }
    match serde_json::to_string_pretty(services.config()) {
        Ok(text) => {
            println!("# {}", services.config_path().display());
            println!("{text}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("cannot serialise configuration: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(
    services: &AppServices,
    operation: OperationId,
    files: Vec<PathBuf>,
    params: Vec<String>,
) -> ExitCode {
    info!(%operation, files = files.len(), "ToolGhor starting");

    let reporter = Arc::new(ProgressReporter::new());
    reporter.on_progress(|state| eprintln!("{}", terminal::render_progress(state)));
    let queue = Arc::new(QueueStore::new(Arc::clone(&reporter)));
    queue.on_queue_changed(|view| eprint!("{}", terminal::render_queue(view)));

    let added = queue.add(files.into_iter().map(RawFile::Path)).await;
    if added.skipped > 0 {
        warn!(skipped = added.skipped, "some files could not be read");
    }

    let prompt: Arc<dyn ParameterPrompt> = if params.is_empty() {
        Arc::new(LinePrompt::stdin())
    } else {
        Arc::new(ScriptedPrompt::new(params))
    };
    let dispatcher = services.dispatcher(queue, prompt);
    let outcome = dispatcher.run(operation).await;

    println!("{}", terminal::render_progress(&reporter.current()));
    if outcome.skipped_everything() {
        return ExitCode::from(2);
    }
    match outcome {
        RunOutcome::Completed { artifacts, skipped } => {
            let root = &services.config().output_dir;
            for name in artifacts {
                println!("  {}", root.join(name).display());
            }
            for name in skipped {
                println!("  skipped: {name}");
            }
            ExitCode::SUCCESS
        }
        RunOutcome::Rejected(_) => ExitCode::from(2),
        RunOutcome::Failed(_) => ExitCode::FAILURE,
    }
}
