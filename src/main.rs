use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
use humantime::parse_rfc3339_weak;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

use wallpaper_companion::config::Configuration;
use wallpaper_companion::events::ControlCommand;
use wallpaper_companion::platform::installer::{
    CommandInstaller, NoopInstaller, WallpaperInstaller,
};
use wallpaper_companion::platform::processes::PsSnapshot;
use wallpaper_companion::platform::screens::XrandrProbe;
use wallpaper_companion::processing::text::{FontSet, GlyphPainter};
use wallpaper_companion::settings::{FileSettings, SettingsProvider};
use wallpaper_companion::synthesis::{Collaborators, Synthesizer};
use wallpaper_companion::tasks;

#[derive(Debug, Parser)]
#[command(
    name = "wallpaper-companion",
    version,
    about = "Keeps the desktop background in sync with the time of day"
)]
struct Args {
    /// Path to YAML config; defaults are used when omitted
    #[arg(long, value_name = "CONFIG")]
    config: Option<PathBuf>,
    /// Raise log verbosity (-v debug, -vv trace); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Watch for changes and keep the wallpaper current (default)
    Run,
    /// Render a single wallpaper to a file without installing it
    Render {
        #[arg(long, value_name = "FILE")]
        output: PathBuf,
        /// Render as if it were this RFC 3339 instant
        #[arg(long, value_name = "RFC3339")]
        at: Option<String>,
    },
    /// Change the persisted rotation offset or intensity
    Nudge {
        #[arg(long, allow_hyphen_values = true, value_name = "N")]
        offset: Option<i64>,
        /// Intensity change, e.g. 0.2 or -0.2
        #[arg(long, allow_hyphen_values = true, value_name = "DELTA")]
        intensity: Option<f32>,
        /// Lower the intensity by one configured step
        #[arg(long, conflicts_with_all = ["intensity", "brighten"])]
        dim: bool,
        /// Raise the intensity by one configured step
        #[arg(long, conflicts_with = "intensity")]
        brighten: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let Args {
        config,
        verbose,
        command,
    } = Args::parse();

    // init tracing (RUST_LOG controls level, default = info)
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .compact()
        .init();

    let cfg = match &config {
        Some(path) => Configuration::from_yaml_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => Configuration::default(),
    }
    .validated()
    .context("invalid configuration values")?;
    tracing::debug!("Loaded configuration:\n{:#?}", cfg);

    match command.unwrap_or(Command::Run) {
        Command::Run => run_daemon(cfg).await,
        Command::Render { output, at } => render_once(&cfg, output, at.as_deref()),
        Command::Nudge {
            offset,
            intensity,
            dim,
            brighten,
        } => {
            let step = cfg.intensity.step;
            let intensity = match (dim, brighten) {
                (true, _) => Some(-step),
                (_, true) => Some(step),
                _ => intensity,
            };
            nudge(&cfg, offset, intensity)
        }
    }
}

fn build_synthesizer(
    cfg: &Configuration,
    installer: Box<dyn WallpaperInstaller>,
) -> Result<Synthesizer> {
    let settings = Arc::new(FileSettings::new(cfg));
    let fonts = FontSet::load(&settings.font_family()).context("failed to load overlay font")?;
    tracing::info!(family = fonts.family(), "overlay font loaded");
    let collaborators = Collaborators {
        settings,
        processes: Box::new(PsSnapshot::new()),
        screens: Box::new(XrandrProbe::new(
            cfg.fallback_screen.map(|screen| screen.geometry()),
        )),
        installer,
        painter: Box::new(GlyphPainter::new(fonts)),
    };
    Ok(Synthesizer::new(cfg, collaborators))
}

async fn run_daemon(cfg: Configuration) -> Result<()> {
    let installer = Box::new(CommandInstaller::new(cfg.install_command.clone()));
    let synth = Arc::new(Mutex::new(build_synthesizer(&cfg, installer)?));

    let (control_tx, control_rx) = mpsc::channel::<ControlCommand>(16);
    let cancel = CancellationToken::new();

    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::warn!("ctrl-c handler failed: {err}");
                return;
            }
            tracing::info!("ctrl-c received; initiating shutdown");
            cancel.cancel();
        });
    }

    #[cfg(unix)]
    {
        let forwards = [
            (SignalKind::user_defined1(), "SIGUSR1", ControlCommand::ShiftOffset(1)),
            (SignalKind::user_defined2(), "SIGUSR2", ControlCommand::ShiftOffset(-1)),
            (SignalKind::hangup(), "SIGHUP", ControlCommand::Refresh),
        ];
        for (kind, name, command) in forwards {
            let cancel = cancel.clone();
            let control = control_tx.clone();
            tokio::spawn(async move {
                match signal(kind) {
                    Ok(mut stream) => loop {
                        tokio::select! {
                            _ = cancel.cancelled() => break,
                            received = stream.recv() => {
                                if received.is_none() {
                                    break;
                                }
                                tracing::info!(?command, "{name} received");
                                if let Err(err) = control.send(command).await {
                                    tracing::warn!("failed to forward {name}: {err}");
                                    break;
                                }
                            }
                        }
                    },
                    Err(err) => tracing::warn!("failed to register {name} handler: {err}"),
                }
            });
        }
    }

    tracing::info!(interval = ?cfg.tick_interval, "wallpaper daemon started");
    tasks::scheduler::run(synth, cfg.tick_interval, control_rx, cancel)
        .await
        .context("scheduler task failed")
}

fn render_once(cfg: &Configuration, output: PathBuf, at: Option<&str>) -> Result<()> {
    let now: DateTime<Local> = match at {
        Some(ts) => parse_rfc3339_weak(ts)
            .context("failed to parse --at")?
            .into(),
        None => Local::now(),
    };
    let mut synth = build_synthesizer(cfg, Box::new(NoopInstaller))?;
    let inputs = synth.render_to(&now, &output)?;
    tracing::info!(
        path = %output.display(),
        fingerprint = inputs.fingerprint(),
        "wallpaper written"
    );
    Ok(())
}

fn nudge(cfg: &Configuration, offset: Option<i64>, intensity: Option<f32>) -> Result<()> {
    let settings = FileSettings::new(cfg);
    if let Some(delta) = offset {
        let next = settings.rotation_offset().saturating_add(delta);
        settings.set_rotation_offset(next)?;
        println!("rotation offset: {next}");
    }
    if let Some(delta) = intensity {
        let next = cfg.intensity.nudge(settings.intensity(), delta);
        settings.set_intensity(next)?;
        println!("intensity: {next}");
    }
    if offset.is_none() && intensity.is_none() {
        println!(
            "rotation offset: {}\nintensity: {}",
            settings.rotation_offset(),
            cfg.intensity.clamp(settings.intensity())
        );
    }
    Ok(())
}

