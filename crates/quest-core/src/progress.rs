//! Per-wallet progress.
//!
//! Every wallet task owns its [`WalletTracker`] outright and publishes a
//! snapshot after each change. The orchestrator owns the [`ProgressBoard`]
//! and is the only one writing to it, so nothing here is shared mutably.

use tokio::sync::mpsc;

pub const PREVIEW_CHARS: usize = 20;
pub const COMPLETED: &str = "Completed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Processing,
    Processed,
    Failed,
    Completed,
    FinishedWithErrors,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEntry {
    pub completed: usize,
    pub total: usize,
    pub failures: usize,
    pub status: String,
    pub kind: StatusKind,
}

impl ProgressEntry {
    pub fn new(total: usize) -> Self {
        Self {
            completed: 0,
            total,
            failures: 0,
            status: "Processing...".into(),
            kind: StatusKind::Processing,
        }
    }
}

/// First [`PREVIEW_CHARS`] characters of `message` followed by `...`.
pub fn preview(message: &str) -> String {
    let mut out: String = message.chars().take(PREVIEW_CHARS).collect();
    out.push_str("...");
    out
}

#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    pub slot: usize,
    pub entry: ProgressEntry,
}

/// Snapshot of every wallet, in configuration order.
#[derive(Debug, Clone, Default)]
pub struct ProgressBoard {
    rows: Vec<(String, ProgressEntry)>,
}

impl ProgressBoard {
    pub fn new(wallets: &[String], total: usize) -> Self {
        Self { rows: wallets.iter().map(|w| (w.clone(), ProgressEntry::new(total))).collect() }
    }

    pub fn apply(&mut self, update: ProgressUpdate) {
        if let Some(row) = self.rows.get_mut(update.slot) {
            row.1 = update.entry;
        }
    }

    pub fn rows(&self) -> &[(String, ProgressEntry)] {
        &self.rows
    }

    pub fn get(&self, wallet: &str) -> Option<&ProgressEntry> {
        self.rows.iter().find(|(w, _)| w == wallet).map(|(_, e)| e)
    }

    /// Hands out one tracker per wallet, each wired to `tx`.
    pub fn trackers(&self, tx: &mpsc::UnboundedSender<ProgressUpdate>) -> Vec<WalletTracker> {
        self.rows
            .iter()
            .enumerate()
            .map(|(slot, (wallet, entry))| WalletTracker {
                slot,
                wallet: wallet.clone(),
                entry: entry.clone(),
                last_error: None,
                tx: tx.clone(),
            })
            .collect()
    }
}

pub struct WalletTracker {
    slot: usize,
    wallet: String,
    entry: ProgressEntry,
    last_error: Option<String>,
    tx: mpsc::UnboundedSender<ProgressUpdate>,
}

impl WalletTracker {
    pub fn wallet(&self) -> &str {
        &self.wallet
    }

    pub fn entry(&self) -> &ProgressEntry {
        &self.entry
    }

    pub fn advance(&mut self, message: &str) {
        self.entry.completed = (self.entry.completed + 1).min(self.entry.total);
        self.entry.status = format!("Processed: {}", preview(message));
        self.entry.kind = StatusKind::Processed;
        self.publish();
    }

    pub fn fail(&mut self, error: &impl std::fmt::Display) {
        let text = format!("Error: {error}");
        self.entry.failures += 1;
        self.entry.status = text.clone();
        self.entry.kind = StatusKind::Failed;
        self.last_error = Some(text);
        self.publish();
    }

    /// Terminal status once the message list is exhausted.
    pub fn finish(mut self) -> ProgressEntry {
        match &self.last_error {
            None => {
                self.entry.status = COMPLETED.into();
                self.entry.kind = StatusKind::Completed;
            }
            Some(last) => {
                self.entry.status = format!("Finished with {} error(s). Last: {}", self.entry.failures, last);
                self.entry.kind = StatusKind::FinishedWithErrors;
            }
        }
        self.publish();
        self.entry
    }

    fn publish(&self) {
        // the board only goes away once the cycle is over
        let _ = self.tx.send(ProgressUpdate { slot: self.slot, entry: self.entry.clone() });
    }
}
