//! One request/report round trip for a (wallet, message) pair.

use std::time::{Duration, Instant};

use quest_common::config::{Endpoints, AGENT_ORIGIN, AGENT_REFERER, BROWSER_USER_AGENT};
use quest_common::{QuestError, Result};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, HOST, ORIGIN, REFERER, USER_AGENT};
use serde::Serialize;
use tokio_stream::StreamExt as _;

#[derive(Serialize)]
struct AgentRequest<'a> {
    message: &'a str,
    stream: bool,
}

/// What gets reported to the usage endpoint. Built per message and dropped afterwards.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ExchangeRecord {
    pub agent_id: String,
    pub request_metadata: serde_json::Map<String, serde_json::Value>,
    pub request_text: String,
    pub response_text: String,
    /// Milliseconds from sending the request until the stream ended.
    pub total_time: u64,
    /// Milliseconds until the first chunk; `None` if the body was empty.
    pub ttft: Option<u64>,
    pub wallet_address: String,
}

#[derive(Clone)]
pub struct AgentClient {
    http: reqwest::Client,
    endpoints: Endpoints,
    agent_headers: HeaderMap,
}

impl AgentClient {
    pub fn new(endpoints: Endpoints) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| QuestError::Message(format!("http client: {e}")))?;
        Self::with_client(http, endpoints)
    }

    pub fn with_client(http: reqwest::Client, endpoints: Endpoints) -> Result<Self> {
        let agent_headers = agent_headers(&endpoints)?;
        Ok(Self { http, endpoints, agent_headers })
    }

    /// Agent call followed by the usage report. Either failing fails the exchange.
    pub async fn exchange(&self, wallet: &str, message: &str) -> Result<ExchangeRecord> {
        let record = self.converse(wallet, message).await?;
        self.report(&record).await?;
        quest_obs::record_exchange(
            record.ttft.map(Duration::from_millis),
            Duration::from_millis(record.total_time),
        );
        Ok(record)
    }

    /// Streams the agent's answer, timing the first chunk and the whole body.
    pub async fn converse(&self, wallet: &str, message: &str) -> Result<ExchangeRecord> {
        let start = Instant::now();
        let response = self
            .http
            .post(&self.endpoints.agent_url)
            .headers(self.agent_headers.clone())
            .json(&AgentRequest { message, stream: true })
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| QuestError::Agent(error_chain(&e)))?;

        let mut ttft: Option<Duration> = None;
        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| QuestError::Agent(format!("stream: {}", error_chain(&e))))?;
            if ttft.is_none() { ttft = Some(start.elapsed()); }
            body.extend_from_slice(&chunk);
        }
        let total = start.elapsed();
        tracing::debug!(target: "exchange", wallet, bytes = body.len(), "agent stream finished in {:?}", total);

        Ok(ExchangeRecord {
            agent_id: self.endpoints.report_agent_id(),
            request_metadata: serde_json::Map::new(),
            request_text: message.to_string(),
            response_text: String::from_utf8_lossy(&body).into_owned(),
            total_time: millis(total),
            ttft: ttft.map(millis),
            wallet_address: wallet.to_string(),
        })
    }

    pub async fn report(&self, record: &ExchangeRecord) -> Result<()> {
        self.http
            .post(&self.endpoints.report_url)
            .json(record)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| QuestError::Report(error_chain(&e)))?;
        Ok(())
    }
}

fn agent_headers(endpoints: &Endpoints) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ORIGIN, HeaderValue::from_static(AGENT_ORIGIN));
    headers.insert(REFERER, HeaderValue::from_static(AGENT_REFERER));
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    if let Some(host) = &endpoints.agent_host {
        let value = HeaderValue::from_str(host)
            .map_err(|_| QuestError::Config(format!("agent id yields an invalid host: {host}")))?;
        headers.insert(HOST, value);
    }
    Ok(headers)
}

/// `err` followed by each of its sources, so the root cause (refused, dns, reset) shows.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !text.ends_with(&cause_text) {
            text.push_str(": ");
            text.push_str(&cause_text);
        }
        source = cause.source();
    }
    text
}

fn millis(d: Duration) -> u64 {
    d.as_millis().min(u64::MAX as u128) as u64
}
