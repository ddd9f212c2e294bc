mod config;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use orchestrator::{RunDispatcher, RunPipeline, RunReport, RunWorkspaceManager, StageStatus};
use reel_core::RunRequest;
use server::{create_router, state::AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::{StudioConfig, CONFIG_FILE};

#[derive(Parser)]
#[command(name = "reel-studio")]
#[command(about = "Turn a topic into a narrated, subtitled video", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file. Defaults to ./reel-studio.toml when present.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate one video and exit
    Run {
        /// Video topic; several words are joined with spaces
        #[arg(required = true, num_args = 1..)]
        topic: Vec<String>,

        /// `video` (landscape) or `short` (portrait)
        #[arg(short, long, default_value = "video")]
        format: String,

        /// Publish after rendering. Accepts a value such as `--publish=no`.
        #[arg(long, num_args = 0..=1, default_missing_value = "true")]
        publish: Option<String>,

        /// `public` or `private`
        #[arg(long)]
        privacy: Option<String>,
    },
    /// Serve the HTTP trigger
    Serve {
        #[arg(long)]
        host: Option<String>,

        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Report missing programs and secrets
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init { force } => init_config(cli.config.as_deref(), force).await,
        Commands::Check => {
            let (config, _) = StudioConfig::load(cli.config.as_deref())?;
            check(&config)
        }
        Commands::Run {
            topic,
            format,
            publish,
            privacy,
        } => {
            let (config, _) = StudioConfig::load(cli.config.as_deref())?;
            init_tracing();

            let mut request = RunRequest::new(topic.join(" ")).with_format(format);
            if let Some(publish) = publish {
                request = request.with_upload(publish);
            }
            if let Some(privacy) = privacy {
                request = request.with_privacy(privacy);
            }
            run_once(&config, request).await
        }
        Commands::Serve { host, port } => {
            let (config, source) = StudioConfig::load(cli.config.as_deref())?;
            init_tracing();
            serve(&config, source.as_deref(), host, port).await
        }
    }
}

fn build_dispatcher(config: &StudioConfig) -> Result<RunDispatcher> {
    let services = providers::build_services(&config.providers_config())
        .context("Failed to set up service adapters")?;
    let workspaces = RunWorkspaceManager::new(config.workspace_config());
    let pipeline = RunPipeline::new(services, workspaces, config.pipeline_config());
    Ok(RunDispatcher::new(pipeline))
}

async fn run_once(config: &StudioConfig, request: RunRequest) -> Result<()> {
    let dispatcher = build_dispatcher(config)?;

    match dispatcher.dispatch_request(request).await {
        Ok(report) => {
            print_report(&report);
            Ok(())
        }
        Err(e) => {
            eprintln!("{} {}", "✗".red().bold(), e.to_string().red());
            if let Some(stage) = e.failed_stage() {
                eprintln!("  Failed at stage {}: {}", stage.number(), stage.description());
            }
            bail!("Run did not produce a video")
        }
    }
}

fn print_report(report: &RunReport) {
    println!();
    println!("{} {}", "✓".green().bold(), report.title.bold());
    println!();
    for record in &report.stages {
        let status = match record.status {
            StageStatus::Completed => format!("{:<10}", "completed").green(),
            StageStatus::Degraded => format!("{:<10}", "degraded").yellow(),
            StageStatus::Skipped => format!("{:<10}", "skipped").dimmed(),
        };
        let note = record
            .note
            .as_deref()
            .map(|n| format!("  {}", n.dimmed()))
            .unwrap_or_default();
        println!(
            "  {}. {:<10} {} {:>7} ms{}",
            record.stage.number(),
            record.stage.as_str(),
            status,
            record.duration_ms,
            note
        );
    }
    println!();
    println!("  Video:      {}", report.final_artifact.display());
    if let Some(thumbnail) = &report.thumbnail {
        println!("  Thumbnail:  {}", thumbnail.display());
    }
    if let Some(id) = &report.video_id {
        println!("  Published:  https://youtube.com/watch?v={}", id);
    }
    println!("  Run:        {} ({:.1}s)", report.run_id, report.duration_ms as f64 / 1000.0);
    for warning in &report.warnings {
        println!("  {} {}", "!".yellow(), warning.yellow());
    }
    println!();
}

async fn serve(
    config: &StudioConfig,
    source: Option<&Path>,
    host: Option<String>,
    port: Option<u16>,
) -> Result<()> {
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    let dispatcher = build_dispatcher(config)?;
    let app = create_router(AppState::new(dispatcher));

    let listener = tokio::net::TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", host, port))?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    println!();
    println!("{}", "Reel Studio".bold());
    println!("════════════════════════════════════════");
    println!();
    println!("  Trigger:     POST http://{}:{}/run", host, port);
    println!("  Swagger UI:  http://{}:{}/swagger-ui", host, port);
    match source {
        Some(path) => println!("  Config:      {}", path.display()),
        None => println!("  Config:      defaults (no {})", CONFIG_FILE),
    }
    println!("  Output:      {}", config.paths.output_dir.display());
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}

async fn init_config(explicit: Option<&Path>, force: bool) -> Result<()> {
    let path = explicit.map_or_else(|| PathBuf::from(CONFIG_FILE), Path::to_path_buf);

    if path.exists() && !force {
        println!("Config already exists at {}", path.display());
        println!("Use --force to overwrite it.");
        return Ok(());
    }

    let content = StudioConfig::default().to_toml()?;
    tokio::fs::write(&path, content)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("Wrote {}", path.display());
    println!();
    println!("Secrets are read from the environment:");
    println!("  {}", providers::config::GEMINI_API_KEY_ENV);
    println!("  {}", providers::config::PEXELS_API_KEY_ENV);
    println!("  {} (only for publishing)", providers::config::YOUTUBE_ACCESS_TOKEN_ENV);
    println!();
    println!("Next: 'reel-studio check', then 'reel-studio run <topic>'");

    Ok(())
}

fn check(config: &StudioConfig) -> Result<()> {
    let providers = config.providers_config();
    let mut problems = 0;

    println!("Programs:");
    for program in providers::required_programs(&providers) {
        match which::which(program) {
            Ok(path) => println!("  {} {:<10} {}", "✓".green(), program, path.display()),
            Err(_) => {
                problems += 1;
                println!("  {} {:<10} {}", "✗".red(), program, "not found on PATH".red());
            }
        }
    }

    println!("Secrets:");
    let secrets = [
        (providers::config::GEMINI_API_KEY_ENV, providers.gemini.api_key.is_some(), true),
        (providers::config::PEXELS_API_KEY_ENV, providers.pexels.api_key.is_some(), true),
        (
            providers::config::YOUTUBE_ACCESS_TOKEN_ENV,
            providers.youtube.access_token.is_some(),
            false,
        ),
    ];
    for (name, set, required) in secrets {
        if set {
            println!("  {} {}", "✓".green(), name);
        } else if required {
            problems += 1;
            println!("  {} {} {}", "✗".red(), name, "not set".red());
        } else {
            println!("  {} {} {}", "-".yellow(), name, "not set, needed only to publish".yellow());
        }
    }

    if problems > 0 {
        bail!("{} problem(s) found", problems);
    }
    println!();
    println!("{}", "Ready.".green());
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "reel_studio=info,orchestrator=info,providers=info,server=info,tower_http=info".into()
        }))
        .init();
}
