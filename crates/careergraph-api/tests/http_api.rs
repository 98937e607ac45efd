//! Integration tests for the HTTP surface. A server is spawned on a local
//! port and exercised with a plain HTTP client; no external source is
//! configured, so every pipeline stage runs on its deterministic fallback.

use careergraph_api::Server;
use careergraph_core::Settings;
use serde_json::{json, Value};
use tokio::time::{sleep, Duration};

async fn spawn_server(port: u16) {
    let mut settings = Settings::default();
    settings.server.host = "127.0.0.1".to_string();
    settings.server.port = port;

    let server = Server::new(settings).expect("server construction");
    tokio::spawn(async move {
        if let Err(e) = server.run().await {
            eprintln!("Server error: {}", e);
        }
    });

    // Wait for the listener to come up.
    sleep(Duration::from_millis(150)).await;
}

#[tokio::test]
async fn test_health_endpoint() {
    spawn_server(18080).await;

    let client = reqwest::Client::new();
    let response = client
        .get("http://127.0.0.1:18080/health")
        .send()
        .await
        .expect("health request");

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["agents"]["pathway_research"], "ready");
    assert_eq!(body["environment"]["llm"], false);
}

#[tokio::test]
async fn test_plan_endpoint_generates_roadmap() {
    spawn_server(18081).await;

    let client = reqwest::Client::new();
    let response = client
        .post("http://127.0.0.1:18081/api/plan")
        .json(&json!({
            "quiz_data": {
                "career": "Registered Nurse",
                "current_education": "hs",
                "gpa": 3.4,
                "budget": "low",
                "timeline": "normal",
                "location": "miami",
                "goals": []
            }
        }))
        .send()
        .await
        .expect("plan request");

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);

    let roadmap = &body["roadmap"];
    assert!(roadmap["paths"]["cheapest"]["total_cost"].as_f64().unwrap() > 0.0);
    assert!(roadmap["paths"]["prestige"]["total_cost"].as_f64().unwrap()
        > roadmap["paths"]["cheapest"]["total_cost"].as_f64().unwrap());
    assert!(!roadmap["nodes"].as_array().unwrap().is_empty());
    assert_eq!(roadmap["metadata"]["confidence"], 0.85);
}

#[tokio::test]
async fn test_plan_endpoint_rejects_empty_career() {
    spawn_server(18082).await;

    let client = reqwest::Client::new();
    let response = client
        .post("http://127.0.0.1:18082/api/plan")
        .json(&json!({
            "quiz_data": {
                "career": "   ",
                "current_education": "hs",
                "gpa": 3.4,
                "budget": "low",
                "timeline": "normal",
                "location": "miami"
            }
        }))
        .send()
        .await
        .expect("plan request");

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("career"));
}

#[tokio::test]
async fn test_careers_endpoint() {
    spawn_server(18083).await;

    let client = reqwest::Client::new();
    let response = client
        .get("http://127.0.0.1:18083/api/careers")
        .send()
        .await
        .expect("careers request");

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    let careers = body["careers"].as_array().unwrap();
    assert!(careers
        .iter()
        .any(|c| c["name"] == "Registered Nurse" && c["category"] == "Healthcare"));
}

#[tokio::test]
async fn test_chat_endpoint_without_llm_is_unavailable() {
    spawn_server(18084).await;

    let client = reqwest::Client::new();
    let response = client
        .post("http://127.0.0.1:18084/api/chat")
        .json(&json!({
            "message": "How long is the nursing path?",
            "system_prompt": "You are a roadmap assistant."
        }))
        .send()
        .await
        .expect("chat request");

    assert_eq!(response.status(), 503);
}
