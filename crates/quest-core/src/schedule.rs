use std::sync::Arc;
use std::time::Duration;

use quest_common::config::{QuestConfig, SchedulePolicy};
use quest_common::Result;
use tokio::time;

use crate::cycle::run_cycle;
use crate::exchange::AgentClient;
use crate::progress::ProgressBoard;
use crate::render::{format_remaining, Render};

pub struct Runner {
    client: AgentClient,
    wallets: Vec<String>,
    messages: Arc<[String]>,
    policy: SchedulePolicy,
    max_cycles: Option<u64>,
}

impl Runner {
    pub fn new(client: AgentClient, wallets: Vec<String>, messages: Arc<[String]>, policy: SchedulePolicy) -> Self {
        Self { client, wallets, messages, policy, max_cycles: None }
    }

    pub fn from_config(cfg: &QuestConfig, messages: Arc<[String]>) -> Result<Self> {
        let client = AgentClient::new(cfg.endpoints.clone())?;
        Ok(Self::new(client, cfg.wallets.clone(), messages, cfg.schedule))
    }

    /// Stop after `n` cycles even when the policy repeats.
    pub fn with_max_cycles(mut self, n: u64) -> Self {
        self.max_cycles = Some(n);
        self
    }

    pub async fn run_cycle(&self, render: &mut dyn Render) -> ProgressBoard {
        run_cycle(&self.client, &self.wallets, self.messages.clone(), render).await
    }

    /// Cycles until the policy (or the cycle cap) says stop; returns the last board.
    pub async fn run(&self, render: &mut dyn Render) -> ProgressBoard {
        let mut cycle: u64 = 0;
        loop {
            cycle += 1;
            tracing::info!(target: "schedule", cycle, wallets = self.wallets.len(), messages = self.messages.len(), "starting cycle");
            let board = self.run_cycle(render).await;

            let capped = self.max_cycles.is_some_and(|max| cycle >= max);
            match self.policy {
                SchedulePolicy::Repeat(delay) if !capped => {
                    render.notice(&format!("Script completed. Restarting in {}...", format_remaining(delay)));
                    countdown(delay, render).await;
                    render.notice("Restarting script now...");
                }
                _ => {
                    render.notice("Script completed.");
                    return board;
                }
            }
        }
    }
}

/// Ticks once a second, redrawing the time left, until `delay` has passed.
pub async fn countdown(delay: Duration, render: &mut dyn Render) {
    let step = Duration::from_secs(1);
    let mut remaining = delay;
    let mut ticker = time::interval_at(time::Instant::now() + step, step);
    while !remaining.is_zero() {
        ticker.tick().await;
        remaining = remaining.saturating_sub(step);
        render.countdown(remaining);
    }
    render.finish();
}
