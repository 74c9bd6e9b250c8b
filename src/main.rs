use anyhow::{Context, bail};
use slotboard::assets::RoutedAssetLoader;
use slotboard::config::loader::{ConfigLoader, default_config_path};
use slotboard::config::{AppConfig, BoardSettings};
use slotboard::models::ProfilePool;
use slotboard::observability::init_tracing;
use slotboard::render::MirrorBoard;
use slotboard::services::{Board, BoardRuntime};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

const STATUS_INTERVAL: Duration = Duration::from_secs(30);

struct Args {
    preset: AppConfig,
    config_path: PathBuf,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut preset = AppConfig::landscape();
    let mut config_path = default_config_path();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--preset" => {
                preset = match args.next().as_deref() {
                    Some("landscape") => AppConfig::landscape(),
                    Some("wide") => AppConfig::wide(),
                    other => bail!("unknown preset {other:?}, expected landscape or wide"),
                };
            }
            _ => config_path = PathBuf::from(arg),
        }
    }

    Ok(Args {
        preset,
        config_path,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = parse_args()?;
    let config = ConfigLoader::load_over(args.preset, &args.config_path)
        .with_context(|| format!("loading {}", args.config_path.display()))?;
    let _log_guard = init_tracing(&config.logging);

    info!("Starting Slotboard...");

    let settings = BoardSettings::from_config(&config)?;
    info!(
        slots = settings.slot_count(),
        mode = ?settings.stagger.mode,
        "Configuration loaded successfully"
    );

    let pool = ProfilePool::load(&config.data.profiles_path)
        .await
        .with_context(|| format!("loading profiles from {}", config.data.profiles_path.display()))?;

    let sink = Arc::new(MirrorBoard::new(settings.slot_count(), &settings.layout));
    info!(elements = sink.element_count(), "Mirror board initialized");

    let board = Board::new(settings, pool, sink)?;
    let loader = RoutedAssetLoader::new(config.assets.root.clone())?;
    let runtime = BoardRuntime::new().with_loader(Arc::new(loader));
    let handle = runtime.spawn(board);
    info!(board = %handle.id(), "Board running, press Ctrl+C to stop");

    let mut status = tokio::time::interval(STATUS_INTERVAL);
    status.tick().await;

    loop {
        tokio::select! {
            _ = status.tick() => {
                match handle.snapshot().await {
                    Some(snapshot) => {
                        let (stopped, waiting, transitioning) = snapshot.phase_counts();
                        info!(
                            stopped,
                            waiting,
                            transitioning,
                            waves = snapshot.waves_released,
                            offset = snapshot.scroll_offset,
                            "Board status"
                        );
                    }
                    None => {
                        error!("Board task ended unexpectedly");
                        break;
                    }
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("listening for Ctrl+C")?;
                info!("Shutdown requested, finishing in-flight transitions");
                break;
            }
        }
    }

    let metrics = handle.metrics().clone();
    let report = handle.shutdown().await?;
    info!(
        board = %report.board_id,
        swaps = report.swaps,
        skipped = report.skipped,
        "Board stopped"
    );
    info!("Final counters:\n{}", metrics.gather());

    Ok(())
}
