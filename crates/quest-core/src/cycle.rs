use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::exchange::AgentClient;
use crate::progress::{ProgressBoard, ProgressEntry, WalletTracker};
use crate::render::Render;

/// One pass of every wallet over every message.
///
/// Wallets run as separate tasks; inside a task messages go strictly in order.
/// The board is redrawn after every exchange and once more when a wallet finishes.
pub async fn run_cycle(
    client: &AgentClient,
    wallets: &[String],
    messages: Arc<[String]>,
    render: &mut dyn Render,
) -> ProgressBoard {
    let mut board = ProgressBoard::new(wallets, messages.len());
    render.board(&board);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut tasks = JoinSet::new();
    for tracker in board.trackers(&tx) {
        tasks.spawn(drive_wallet(client.clone(), messages.clone(), tracker));
    }
    drop(tx);

    while let Some(update) = rx.recv().await {
        board.apply(update);
        render.board(&board);
    }
    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            tracing::error!(target: "cycle", "wallet task aborted: {}", e);
        }
    }

    render.finish();
    quest_obs::record_cycle();
    board
}

async fn drive_wallet(client: AgentClient, messages: Arc<[String]>, mut tracker: WalletTracker) -> ProgressEntry {
    for message in messages.iter() {
        let outcome = client.exchange(tracker.wallet(), message).await;
        match outcome {
            Ok(record) => {
                tracing::debug!(target: "cycle", wallet = tracker.wallet(), ttft = ?record.ttft, total = record.total_time, "exchange ok");
                tracker.advance(message);
            }
            Err(err) => {
                tracing::warn!(target: "cycle", wallet = tracker.wallet(), "{}", err);
                quest_obs::record_failure(err.outcome());
                tracker.fail(&err);
            }
        }
    }
    tracker.finish()
}
