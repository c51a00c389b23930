use std::time::Duration;

#[tokio::test]
async fn metrics_endpoint_reports_exchanges() {
    quest_obs::record_exchange(Some(Duration::from_millis(40)), Duration::from_millis(120));
    quest_obs::record_failure("agent_error");
    assert!(quest_obs::exchanges("ok") >= 1);
    assert!(quest_obs::exchanges("agent_error") >= 1);

    let addr = quest_obs::spawn_server(([127, 0, 0, 1], 0).into()).await.unwrap();
    let base = format!("http://{}", addr);
    let client = reqwest::Client::new();

    let r = client.get(format!("{}/healthz", base)).send().await.unwrap();
    assert!(r.status().is_success());

    let r = client.get(format!("{}/metrics", base)).send().await.unwrap();
    assert!(r.status().is_success());
    let body = r.text().await.unwrap();
    assert!(body.contains("quest_exchanges_total"));
    assert!(body.contains("quest_ttft_seconds"));
}

#[test]
fn cycle_counter_increments() {
    let before = quest_obs::cycles();
    quest_obs::record_cycle();
    assert!(quest_obs::cycles() > before);
}
