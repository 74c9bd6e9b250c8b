//! Board runtime
//!
//! Drives a [`Board`] from one tokio task: sleeps until the next slot deadline,
//! ticks the scroll driver per frame, applies lifecycle commands and collects
//! image loads. Loads run as separate tasks so a slow image never holds up the
//! loop.

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, info};
use uuid::Uuid;

use crate::assets::{AssetLoader, AssetOutcome, LoadKind, load_bounded};
use crate::config::settings::BoardSettings;
use crate::error::{BoardError, Result};
use crate::models::profile::ProfilePool;
use crate::observability::BoardMetrics;
use crate::render::Sink;
use crate::services::board::{Board, BoardSnapshot};

/// Command sent to a running board
#[derive(Debug)]
pub enum BoardCommand {
    /// Cooperative stop of the whole board
    Stop,
    /// Cooperative stop of one slot
    HaltSlot(usize),
    Snapshot(oneshot::Sender<BoardSnapshot>),
}

/// Summary returned when a board task ends
#[derive(Debug, Clone)]
pub struct BoardReport {
    pub board_id: Uuid,
    pub swaps: u64,
    pub skipped: u64,
    pub final_snapshot: BoardSnapshot,
}

/// Control handle of a running board
pub struct BoardHandle {
    id: Uuid,
    commands: mpsc::UnboundedSender<BoardCommand>,
    task: JoinHandle<BoardReport>,
    metrics: BoardMetrics,
}

impl BoardHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn metrics(&self) -> &BoardMetrics {
        &self.metrics
    }

    /// Request a cooperative stop, returns false if the board already ended
    pub fn stop(&self) -> bool {
        self.commands.send(BoardCommand::Stop).is_ok()
    }

    /// Request that one slot stop after its current transition
    pub fn halt_slot(&self, slot: usize) -> bool {
        self.commands.send(BoardCommand::HaltSlot(slot)).is_ok()
    }

    /// Current board state, `None` once the board ended
    pub async fn snapshot(&self) -> Option<BoardSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.commands.send(BoardCommand::Snapshot(tx)).ok()?;
        rx.await.ok()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the board task to end
    pub async fn join(self) -> Result<BoardReport> {
        self.task
            .await
            .map_err(|e| BoardError::Internal(format!("board task failed: {e}")))
    }

    /// Stop and wait for in-flight transitions to complete
    pub async fn shutdown(self) -> Result<BoardReport> {
        self.stop();
        self.join().await
    }
}

/// Spawns boards onto the tokio runtime
#[derive(Clone, Default)]
pub struct BoardRuntime {
    loader: Option<Arc<dyn AssetLoader>>,
}

impl BoardRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load images through `loader`; without one, asset tracking is off
    pub fn with_loader(mut self, loader: Arc<dyn AssetLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Start the board cycle on a new task
    pub fn spawn(&self, mut board: Board) -> BoardHandle {
        if self.loader.is_none() {
            board.set_asset_tracking(false);
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let id = board.id();
        let metrics = board.metrics().clone();
        let loader = self.loader.clone();
        let task = tokio::spawn(drive(board, rx, loader));

        BoardHandle {
            id,
            commands: tx,
            task,
            metrics,
        }
    }

    /// Tear down a running board and start a fresh one from scratch
    ///
    /// No state carries over: the plan, positions and asset cache are rebuilt.
    pub async fn reload(
        &self,
        handle: BoardHandle,
        settings: BoardSettings,
        pool: ProfilePool,
        sink: Arc<dyn Sink>,
    ) -> Result<BoardHandle> {
        let old = handle.shutdown().await?;
        let board = Board::new(settings, pool, sink)?;
        info!(previous = %old.board_id, board = %board.id(), "Board reloaded");
        Ok(self.spawn(board))
    }
}

async fn drive(
    mut board: Board,
    mut commands: mpsc::UnboundedReceiver<BoardCommand>,
    loader: Option<Arc<dyn AssetLoader>>,
) -> BoardReport {
    let (asset_tx, mut asset_rx) = mpsc::unbounded_channel::<AssetOutcome>();
    let mut commands_open = true;

    board.start(Instant::now());
    let mut frames = board.scroll_running().then(|| {
        let mut frames = tokio::time::interval(board.settings().scroll.frame);
        frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
        frames
    });
    dispatch_loads(&mut board, loader.as_ref(), &asset_tx);

    while !board.is_finished() {
        let deadline = board.next_deadline();
        let scrolling = board.scroll_running();

        tokio::select! {
            _ = sleep_until(deadline) => {
                board.fire_due(Instant::now());
            }
            _ = next_frame(&mut frames), if scrolling => {
                board.tick_scroll(Instant::now());
            }
            command = commands.recv(), if commands_open => match command {
                Some(BoardCommand::Stop) => board.stop(),
                Some(BoardCommand::HaltSlot(slot)) => board.halt_slot(slot),
                Some(BoardCommand::Snapshot(reply)) => {
                    let _ = reply.send(board.snapshot());
                }
                None => {
                    debug!(board = %board.id(), "All handles dropped, stopping");
                    commands_open = false;
                    board.stop();
                }
            },
            Some(outcome) = asset_rx.recv() => {
                board.record_asset(outcome);
            }
        }

        dispatch_loads(&mut board, loader.as_ref(), &asset_tx);
    }

    let metrics = board.metrics();
    info!(
        board = %board.id(),
        swaps = metrics.swaps(),
        skipped = metrics.skipped(),
        "Board cycle stopped"
    );

    BoardReport {
        board_id: board.id(),
        swaps: metrics.swaps(),
        skipped: metrics.skipped(),
        final_snapshot: board.snapshot(),
    }
}

/// Spawn a bounded load for every queued request
///
/// Prefetches are bounded by the slot's display time, fallbacks by the
/// configured asset timeout.
fn dispatch_loads(
    board: &mut Board,
    loader: Option<&Arc<dyn AssetLoader>>,
    outcomes: &mpsc::UnboundedSender<AssetOutcome>,
) {
    let requests = board.drain_asset_requests();
    let Some(loader) = loader else {
        return;
    };

    for request in requests {
        let timeout = match request.kind {
            LoadKind::Prefetch => board.settings().display_for(request.slot),
            LoadKind::Fallback => board.settings().asset_timeout,
        };
        let loader = Arc::clone(loader);
        let outcomes = outcomes.clone();
        tokio::spawn(async move {
            let outcome = load_bounded(loader.as_ref(), &request, timeout).await;
            let _ = outcomes.send(outcome);
        });
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn next_frame(frames: &mut Option<Interval>) {
    match frames {
        Some(frames) => {
            frames.tick().await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{MockAssetLoader, RoutedAssetLoader};
    use crate::models::profile::ProfileRecord;
    use crate::models::slot::SlotPhase;
    use crate::render::MirrorBoard;
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    fn roster(n: usize) -> ProfilePool {
        ProfilePool::new(
            (0..n)
                .map(|i| {
                    ProfileRecord::new(i as i64 + 1, &format!("user{i}"), "hello", &format!("img/{i}.png"))
                })
                .collect(),
        )
    }

    fn board(slots: usize, capacity: usize, prefetch: bool) -> (Board, Arc<MirrorBoard>) {
        let mut settings = BoardSettings::uniform(slots, capacity, Duration::from_secs(12));
        settings.prefetch = prefetch;
        let sink = Arc::new(MirrorBoard::new(slots, &settings.layout));
        let board = Board::new(settings, roster(slots * capacity), sink.clone()).unwrap();
        (board, sink)
    }

    #[tokio::test(start_paused = true)]
    async fn test_runtime_cycles_until_shutdown() {
        let (board, _) = board(4, 2, false);
        let handle = BoardRuntime::new().spawn(board);

        tokio::time::sleep(Duration::from_secs(30)).await;
        let snapshot = handle.snapshot().await.unwrap();
        assert!(snapshot.active);
        assert_eq!(snapshot.slots[0].swaps, 2);

        let report = handle.shutdown().await.unwrap();
        assert_eq!(report.final_snapshot.phase_counts(), (4, 0, 0));
        assert!(!report.final_snapshot.active);
        assert!(report.swaps >= 2);
        assert_eq!(report.skipped, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_waits_for_in_flight_transition() {
        let (board, sink) = board(2, 2, false);
        let handle = BoardRuntime::new().spawn(board);

        tokio::time::sleep(Duration::from_millis(12_500)).await;
        let report = handle.shutdown().await.unwrap();

        // both slots launched together and finished the swap they had begun
        for slot in &report.final_snapshot.slots {
            assert_eq!(slot.swaps, 1);
            assert_eq!(slot.position, 1);
            assert_eq!(slot.phase, SlotPhase::Stopped);
            assert_eq!(sink.displayed(slot.slot), slot.displayed_id);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_halt_slot_through_handle() {
        let (board, _) = board(10, 3, false);
        let handle = BoardRuntime::new().spawn(board);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(handle.halt_slot(5));
        tokio::time::sleep(Duration::from_secs(30)).await;

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.slots[5].phase, SlotPhase::Stopped);
        assert_eq!(snapshot.slots[5].swaps, 0);
        assert_eq!(snapshot.slots[0].swaps, 2);
        assert!(snapshot.active);

        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_prefetched_images_swap_without_degrading() {
        let mut loader = MockAssetLoader::new();
        loader.expect_load().returning(|_| Ok(()));

        let (board, sink) = board(2, 3, true);
        let handle = BoardRuntime::new()
            .with_loader(Arc::new(loader))
            .spawn(board);

        tokio::time::sleep(Duration::from_secs(15)).await;
        let metrics = handle.metrics().clone();
        assert!(metrics.swaps() >= 2);
        assert_eq!(metrics.degraded_swaps.load(Ordering::SeqCst), 0);
        assert_eq!(metrics.asset_failures.load(Ordering::SeqCst), 0);
        assert!(sink.group(0).iter().all(|e| e.asset_ready));

        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_loads_degrade_but_do_not_block() {
        let mut loader = MockAssetLoader::new();
        loader.expect_load().returning(|reference| {
            Err(BoardError::AssetLoad {
                reference: reference.to_string(),
                reason: "not found".into(),
            })
        });

        let (board, sink) = board(1, 2, true);
        let handle = BoardRuntime::new()
            .with_loader(Arc::new(loader))
            .spawn(board);

        tokio::time::sleep(Duration::from_secs(15)).await;
        let metrics = handle.metrics().clone();
        assert_eq!(metrics.swaps(), 1);
        assert_eq!(metrics.degraded_swaps.load(Ordering::SeqCst), 1);
        assert!(metrics.asset_failures.load(Ordering::SeqCst) >= 2);
        assert_eq!(sink.displayed(0), Some(2));

        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_reload_starts_fresh_board() {
        let (board, sink) = board(3, 2, false);
        let runtime = BoardRuntime::new();
        let handle = runtime.spawn(board);
        let first_id = handle.id();

        tokio::time::sleep(Duration::from_secs(20)).await;
        let settings = BoardSettings::uniform(3, 2, Duration::from_secs(12));
        let handle = runtime
            .reload(handle, settings, roster(6), sink.clone())
            .await
            .unwrap();
        assert_ne!(handle.id(), first_id);

        let snapshot = handle.snapshot().await.unwrap();
        assert!(snapshot.slots.iter().all(|s| s.position == 0 && s.swaps == 0));
        assert_eq!(sink.displayed(0), Some(1));

        handle.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_handle_commands_fail_after_board_ends() {
        let (board, _) = board(1, 1, false);
        let handle = BoardRuntime::new().spawn(board);
        assert!(handle.stop());

        while !handle.is_finished() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(handle.snapshot().await.is_none());
        assert!(!handle.halt_slot(0));
    }

    #[tokio::test]
    async fn test_remote_images_load_before_swaps() {
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 64]))
            .mount(&server)
            .await;

        let pool = ProfilePool::new(
            (0..4)
                .map(|i| {
                    let url = format!("{}/img/{i}.png", server.uri());
                    ProfileRecord::new(i as i64 + 1, &format!("user{i}"), "hello", &url)
                })
                .collect(),
        );
        let mut settings = BoardSettings::uniform(2, 2, Duration::from_millis(400));
        settings.transition = Duration::from_millis(200);
        settings.wipe = Duration::from_millis(100);
        settings.prefetch = true;
        let sink = Arc::new(MirrorBoard::new(2, &settings.layout));
        let board = Board::new(settings, pool, sink.clone()).unwrap();

        let loader = RoutedAssetLoader::new(None).unwrap();
        let handle = BoardRuntime::new().with_loader(Arc::new(loader)).spawn(board);

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        let metrics = handle.metrics().clone();
        assert!(metrics.swaps() >= 2);
        assert_eq!(metrics.degraded_swaps.load(Ordering::SeqCst), 0);
        assert_eq!(metrics.asset_failures.load(Ordering::SeqCst), 0);
        assert!(sink.group(0).iter().all(|e| e.asset_ready));

        handle.shutdown().await.unwrap();
    }
}
