use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::messages::DEFAULT_MESSAGES_PATH;
use crate::{QuestError, Result};

pub const REPORT_USAGE_URL: &str = "https://quests-usage-dev.prod.zettablock.com/api/report_usage";
pub const AGENT_ORIGIN: &str = "https://agents.testnet.gokite.ai";
pub const AGENT_REFERER: &str = "https://agents.testnet.gokite.ai/";
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/133.0.0.0 Safari/537.36";
pub const DEFAULT_RESTART_SECS: u64 = 24 * 60 * 60;

/// What happens once every wallet has gone through every message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulePolicy {
    Once,
    Repeat(Duration),
}

impl Default for SchedulePolicy {
    fn default() -> Self {
        SchedulePolicy::Repeat(Duration::from_secs(DEFAULT_RESTART_SECS))
    }
}

impl SchedulePolicy {
    fn parse(mode: &str, restart: Duration) -> Result<Self> {
        match mode.trim().to_ascii_lowercase().as_str() {
            "once" => Ok(SchedulePolicy::Once),
            "daily" | "repeat" | "loop" => Ok(SchedulePolicy::Repeat(restart)),
            other => Err(QuestError::Config(format!(
                "unknown schedule '{other}', expected 'once' or 'daily'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub agent_id: String,
    pub agent_url: String,
    /// Host header sent to the agent. Only set for the derived deployment URL.
    pub agent_host: Option<String>,
    pub report_url: String,
}

impl Endpoints {
    pub fn for_agent(agent_id: &str) -> Self {
        let host = format!("deployment-{agent_id}.stag-vxzy.zettablock.com");
        Self {
            agent_id: agent_id.to_string(),
            agent_url: format!("https://{host}/main"),
            agent_host: Some(host),
            report_url: REPORT_USAGE_URL.to_string(),
        }
    }

    /// Point both calls somewhere else (staging proxies, local test servers).
    pub fn with_urls(agent_id: &str, agent_url: impl Into<String>, report_url: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.to_string(),
            agent_url: agent_url.into(),
            agent_host: None,
            report_url: report_url.into(),
        }
    }

    /// Agent id as the usage endpoint expects it.
    pub fn report_agent_id(&self) -> String {
        format!("deployment_{}", self.agent_id)
    }
}

/// Optional settings read from the YAML file named by `QUEST_CONFIG`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub messages: Option<PathBuf>,
    pub schedule: Option<String>,
    pub restart_secs: Option<u64>,
    pub agent_url: Option<String>,
    pub report_url: Option<String>,
}

impl FileConfig {
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| QuestError::Config(format!("cannot read {}: {e}", path.display())))?;
        serde_yaml::from_str(&text)
            .map_err(|e| QuestError::Config(format!("cannot parse {}: {e}", path.display())))
    }
}

#[derive(Debug, Clone)]
pub struct QuestConfig {
    pub wallets: Vec<String>,
    pub endpoints: Endpoints,
    pub messages_path: PathBuf,
    pub schedule: SchedulePolicy,
}

impl QuestConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; env values win over the YAML file.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let wallets = parse_wallets(lookup("WALLET_ADDRESSES").as_deref())
            .ok_or(QuestError::MissingEnv("WALLET_ADDRESSES"))?;
        let agent_id = normalize_agent_id(lookup("AGENT_ID").as_deref())
            .ok_or(QuestError::MissingEnv("AGENT_ID"))?;

        let file = match lookup("QUEST_CONFIG") {
            Some(path) => FileConfig::read(path)?,
            None => FileConfig::default(),
        };

        let messages_path = lookup("QUEST_MESSAGES")
            .map(PathBuf::from)
            .or(file.messages)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MESSAGES_PATH));

        let restart_secs = match lookup("QUEST_RESTART_SECS") {
            Some(v) => v
                .trim()
                .parse::<u64>()
                .map_err(|_| QuestError::Config(format!("QUEST_RESTART_SECS is not a number: {v}")))?,
            None => file.restart_secs.unwrap_or(DEFAULT_RESTART_SECS),
        };
        if restart_secs == 0 {
            return Err(QuestError::Config("restart delay must be at least one second".into()));
        }
        let restart = Duration::from_secs(restart_secs);
        let schedule = match lookup("QUEST_SCHEDULE").or(file.schedule) {
            Some(mode) => SchedulePolicy::parse(&mode, restart)?,
            None => SchedulePolicy::Repeat(restart),
        };

        let agent_url = lookup("AGENT_URL").or(file.agent_url);
        let report_url = lookup("REPORT_USAGE_URL").or(file.report_url);
        let endpoints = match agent_url {
            Some(url) => Endpoints::with_urls(
                &agent_id,
                url,
                report_url.unwrap_or_else(|| REPORT_USAGE_URL.to_string()),
            ),
            None => {
                let mut ep = Endpoints::for_agent(&agent_id);
                if let Some(url) = report_url { ep.report_url = url; }
                ep
            }
        };

        Ok(Self { wallets, endpoints, messages_path, schedule })
    }
}

/// Splits the comma separated wallet list. `None` when nothing usable remains.
pub fn parse_wallets(raw: Option<&str>) -> Option<Vec<String>> {
    let wallets: Vec<String> = raw?
        .split(',')
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect();
    if wallets.is_empty() { None } else { Some(wallets) }
}

pub fn normalize_agent_id(raw: Option<&str>) -> Option<String> {
    let id = raw?.trim();
    if id.is_empty() { None } else { Some(id.to_lowercase()) }
}
