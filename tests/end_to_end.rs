//! The copilot served over HTTP against fake upstream services on ephemeral ports

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::Mutex;

use axum::http::header;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::Json;
use axum::Router;
use copilot_rag::api::handlers::AppState;
use copilot_rag::api::server::build_app;
use copilot_rag::api::EndpointClient;
use copilot_rag::models::ChatRequest;
use copilot_rag::models::Conversation;
use copilot_rag::models::RetrievedPassage;
use copilot_rag::rag::CopilotService;
use copilot_rag::AppConfig;
use copilot_rag::CopilotError;
use copilot_rag::Result;
use futures::TryStreamExt;
use serde_json::json;
use serde_json::Value;

const SHOES: &str = "Trailwalker shoes are waterproof up to 2 meters.";
const REPLY: [&str; 3] = ["Yes, the Trailwalker", " shoes are waterproof", " up to 2 meters [doc1]."];

/// Requests seen by the fake upstreams
#[derive(Default)]
struct Recorded {
    completions: Vec<Value>,
    embeddings: Vec<Value>,
    searches: Vec<Value>,
}

type Log = Arc<Mutex<Recorded>>;

fn sse_body(fragments: &[&str]) -> String {
    let mut body = String::new();
    // Azure sends a content-filter chunk with no choices first
    body.push_str("data: {\"choices\":[]}\n\n");
    for fragment in fragments {
        let chunk = json!({"choices": [{"delta": {"content": fragment}}]});
        body.push_str(&format!("data: {chunk}\n\n"));
    }
    body.push_str("data: [DONE]\n\n");
    body
}

async fn fake_chat(
    axum::extract::State(log): axum::extract::State<Log>,
    Json(body): Json<Value>,
) -> axum::response::Response {
    log.lock().unwrap().completions.push(body.clone());

    // The intent prompt is a single user message; replies start with the grounding system message
    let is_intent = body["messages"][0]["role"] == "user";
    if is_intent {
        return Json(json!({"choices": [{"message": {"content": "trailwalker socks waterproof"}}]}))
            .into_response();
    }

    if body["stream"] == true {
        ([(header::CONTENT_TYPE, "text/event-stream")], sse_body(&REPLY)).into_response()
    } else {
        Json(json!({"choices": [{"message": {"content": REPLY.concat()}}]})).into_response()
    }
}

async fn fake_embeddings(
    axum::extract::State(log): axum::extract::State<Log>,
    Json(body): Json<Value>,
) -> Json<Value> {
    log.lock().unwrap().embeddings.push(body);
    Json(json!({"data": [{"embedding": [0.1, 0.2, 0.3]}]}))
}

async fn fake_search(
    axum::extract::State(log): axum::extract::State<Log>,
    Json(body): Json<Value>,
) -> Json<Value> {
    log.lock().unwrap().searches.push(body);
    Json(json!({"value": [
        {"@search.score": 0.91, "id": "doc1", "content": SHOES},
        {"@search.score": 0.72, "id": "doc2", "content": "Merino hiking socks."},
    ]}))
}

async fn throttled_search() -> impl IntoResponse {
    (
        StatusCode::TOO_MANY_REQUESTS,
        [(header::RETRY_AFTER, "7")],
        "slow down",
    )
}

async fn spawn(router: Router) -> Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    Ok(addr)
}

async fn spawn_upstream(log: Log, throttle_search: bool) -> Result<SocketAddr> {
    let search = if throttle_search {
        post(throttled_search)
    } else {
        post(fake_search)
    };
    let router = Router::new()
        .route(
            "/openai/deployments/:deployment/chat/completions",
            post(fake_chat),
        )
        .route(
            "/openai/deployments/:deployment/embeddings",
            post(fake_embeddings),
        )
        .route("/indexes/:index/docs/search", search)
        .with_state(log);
    spawn(router).await
}

fn config_for(upstream: SocketAddr) -> AppConfig {
    let mut config = AppConfig::default();
    config.apply_overrides(|key| {
        let value = match key {
            "AZURE_OPENAI_ENDPOINT" | "AZURE_SEARCH_ENDPOINT" => format!("http://{upstream}"),
            "AZURE_OPENAI_API_KEY" | "AZURE_SEARCH_KEY" => "test-key".to_string(),
            "AZURE_OPENAI_CHAT_DEPLOYMENT" => "gpt-35-turbo".to_string(),
            "AZURE_OPENAI_EMBEDDING_DEPLOYMENT" => "text-embedding-ada-002".to_string(),
            "AZUREAI_SEARCH_INDEX_NAME" => "product-info".to_string(),
            _ => return None,
        };
        Some(value)
    });
    config.copilot.retrieval_limit = 1;
    config
}

/// Start the copilot in front of fresh fake upstreams; returns its `/score` URL
async fn start_copilot(throttle_search: bool) -> Result<(String, Log)> {
    let log = Log::default();
    let upstream = spawn_upstream(log.clone(), throttle_search).await?;

    let copilot = CopilotService::new(&config_for(upstream))?;
    let addr = spawn(build_app(AppState::new(copilot), false)).await?;
    Ok((format!("http://{addr}/score"), log))
}

#[tokio::test]
async fn test_trailwalker_over_http() -> Result<()> {
    let (url, log) = start_copilot(false).await?;
    let client = EndpointClient::new(url, Some("endpoint-token".to_string()), reqwest::Client::new());

    let response = client
        .invoke(&ChatRequest::new("Are the trailwalker shoes waterproof?"))
        .await?;

    assert_eq!(response.reply, REPLY.concat());
    assert_eq!(
        response.context.passages(),
        &[RetrievedPassage::new("doc1", SHOES)]
    );

    let log = log.lock().unwrap();
    // No history, so only the grounded reply went to the chat deployment
    assert_eq!(log.completions.len(), 1);
    assert_eq!(
        log.embeddings[0]["input"],
        "Are the trailwalker shoes waterproof?"
    );
    assert_eq!(log.searches[0]["select"], "id,content");
    assert_eq!(log.searches[0]["vectorQueries"][0]["k"], 1);

    let system = log.completions[0]["messages"][0]["content"].as_str().unwrap_or_default();
    assert!(system.contains(&format!(">>> From: doc1\n{SHOES}")));
    Ok(())
}

#[tokio::test]
async fn test_stream_over_http() -> Result<()> {
    let (url, _log) = start_copilot(false).await?;
    let client = EndpointClient::new(url, None, reqwest::Client::new());

    let lines: Vec<String> = client
        .invoke_stream(&ChatRequest::new("Are the trailwalker shoes waterproof?"))
        .await?
        .try_collect()
        .await?;

    let data: Vec<Value> = lines
        .iter()
        .filter_map(|line| line.strip_prefix("data:"))
        .filter_map(|payload| serde_json::from_str(payload.trim()).ok())
        .collect();

    assert_eq!(data[0]["context"][0]["id"], "doc1");
    let reply: String = data[1..]
        .iter()
        .filter_map(|event| event["reply"].as_str())
        .collect();
    assert_eq!(reply, REPLY.concat());
    assert!(!lines.iter().any(|line| line.contains("error")));
    Ok(())
}

#[tokio::test]
async fn test_follow_up_resolves_intent_over_http() -> Result<()> {
    let (url, log) = start_copilot(false).await?;
    let client = EndpointClient::new(url, None, reqwest::Client::new());

    let mut history = Conversation::new();
    history.push_exchange("Are the trailwalker shoes waterproof?", REPLY.concat());
    let request = ChatRequest::new("What about socks?").with_history(history);

    client.invoke(&request).await?;

    let log = log.lock().unwrap();
    assert_eq!(log.completions.len(), 2);
    assert_eq!(log.embeddings[0]["input"], "trailwalker socks waterproof");

    let messages = log.completions[1]["messages"].as_array().cloned().unwrap_or_default();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[3]["content"], "What about socks?");
    Ok(())
}

#[tokio::test]
async fn test_upstream_throttling_reaches_the_caller() -> Result<()> {
    let (url, log) = start_copilot(true).await?;
    let client = EndpointClient::new(url, None, reqwest::Client::new());

    let err = client
        .invoke(&ChatRequest::new("Are the trailwalker shoes waterproof?"))
        .await
        .unwrap_err();

    match err {
        CopilotError::UpstreamRateLimited { retry_after, .. } => {
            assert_eq!(retry_after.map(|d| d.as_secs()), Some(7));
        }
        other => panic!("expected rate limiting, got {other}"),
    }
    assert!(log.lock().unwrap().completions.is_empty());
    Ok(())
}
