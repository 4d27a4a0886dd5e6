//! Boots the real server on an ephemeral port and drives it over HTTP.

use std::sync::Arc;
use std::time::Duration;

use esa_llm::GenerationEngine;
use esa_llm::testutil::ScriptedEngine;
use esa_runtime::Specialization;
use esa_runtime::roster::build_registry;
use esa_server::{EsaServer, ServerConfig};
use serde_json::{Value, json};

fn boot(engine: ScriptedEngine, roster: &[Specialization]) -> EsaServer {
    let engine: Arc<dyn GenerationEngine> = Arc::new(engine);
    let registry = Arc::new(build_registry(roster, &engine, 20).unwrap());
    EsaServer::new(ServerConfig::default(), registry)
}

#[tokio::test]
async fn workflow_round_trip_over_http() {
    let server = boot(
        ScriptedEngine::replying("Layer 45 reasons about it, Layer 49 hardens it."),
        &Specialization::ALL,
    );
    let (addr, handle) = server.listen().await.unwrap();
    let base = format!("http://{addr}");
    let client = reqwest::Client::new();

    let health: Value = client
        .get(format!("{base}/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
    assert_eq!(health["agents"], Specialization::ALL.len());

    let resp = client
        .post(format!("{base}/api/workflows"))
        .json(&json!({"goal": "harden the login flow", "complexity": "complex", "urgency": "high"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let plan: Value = resp.json().await.unwrap();
    assert_eq!(plan["outcome"], "planned");
    assert_eq!(plan["requiredAgents"], json!([45, 49]));
    let workflow_id = plan["workflowId"].as_str().unwrap().to_string();

    let run: Value = client
        .post(format!("{base}/api/workflows/{workflow_id}/run"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(run["status"], "completed");
    assert_eq!(run["steps"].as_array().unwrap().len(), 2);

    let status: Value = client
        .get(format!("{base}/api/status"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["workflows"], 1);
    assert_eq!(status["activeWorkflows"], 0);

    server.shutdown().shutdown();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn errors_use_the_json_envelope() {
    let server = boot(ScriptedEngine::replying("ok"), &[Specialization::Reasoning]);
    let (addr, handle) = server.listen().await.unwrap();
    let base = format!("http://{addr}");
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{base}/api/agents/3/status"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "AGENT_NOT_FOUND");

    let resp = client
        .post(format!("{base}/api/orchestrator/conflicts"))
        .json(&json!({"agent_1": "a", "agent_2": "b"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 503);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "NOT_AVAILABLE");

    let resp = client
        .post(format!("{base}/api/agents/45/execute"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "INVALID_PARAMS");

    server
        .shutdown()
        .graceful_shutdown(handle, Some(Duration::from_secs(5)))
        .await;
}
