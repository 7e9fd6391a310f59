use std::sync::Arc;

use anyhow::Result;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::post,
};
use serde_json::{Value, json};
use tokio::sync::Mutex;

use gce_results::api;
use gce_results::remote::RemoteDataService;

mod test_helpers {
    use super::*;

    /// Every call the stub receives: (function name, params body)
    pub type CallLog = Arc<Mutex<Vec<(String, Value)>>>;

    #[derive(Clone)]
    pub struct StubState {
        pub calls: CallLog,
        /// Response rows per function name; unknown functions answer `[]`
        pub responses: Value,
    }

    async fn rpc_stub_handler(
        State(state): State<StubState>,
        Path(function): Path<String>,
        Json(params): Json<Value>,
    ) -> Json<Value> {
        let rows = state
            .responses
            .get(&function)
            .cloned()
            .unwrap_or_else(|| json!([]));
        state.calls.lock().await.push((function, params));
        Json(rows)
    }

    async fn rpc_failure_handler() -> (StatusCode, Json<Value>) {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"message": "permission denied for function"})),
        )
    }

    async fn spawn(router: Router) -> Result<String> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        Ok(format!("http://{}", addr))
    }

    /// A local stand-in for the hosted database's RPC endpoint
    pub async fn spawn_rpc_stub(responses: Value) -> Result<(String, CallLog)> {
        let calls: CallLog = Arc::new(Mutex::new(Vec::new()));
        let state = StubState {
            calls: calls.clone(),
            responses,
        };
        let router = Router::new()
            .route("/rest/v1/rpc/:function", post(rpc_stub_handler))
            .with_state(state);
        Ok((spawn(router).await?, calls))
    }

    /// An RPC endpoint where every function call fails
    pub async fn spawn_failing_rpc_stub() -> Result<String> {
        let router = Router::new().route("/rest/v1/rpc/:function", post(rpc_failure_handler));
        spawn(router).await
    }

    /// The application under test, wired to the given RPC endpoint
    pub async fn spawn_app(rpc_url: &str) -> Result<String> {
        let remote = Arc::new(RemoteDataService::new(rpc_url, "test-anon-key")?);
        spawn(api::create_router(remote, "static")).await
    }

    pub fn sample_rows() -> Value {
        json!([
            {
                "record_id": "rec-0001",
                "student_name": "Ngu Emmanuel",
                "center_name": "Government High School Limbe",
                "center_number": "12345",
                "level": "OLG",
                "year": 2023,
                "papers_passed": "Mathematics, English Language",
                "student_grades": "B3, A4",
                "entry_date": "2023-08-14"
            },
            {
                "record_id": "rec-0002",
                "student_name": "Tabi Grace",
                "center_name": "Government High School Limbe",
                "center_number": "12345",
                "level": "OLG",
                "year": 2023,
                "papers_passed": "Biology, Chemistry, Physics",
                "student_grades": "A4, B3, C5",
                "entry_date": "2023-08-14"
            }
        ])
    }

    pub fn search_body() -> Value {
        json!({
            "searchType": "number",
            "searchValue": "12345",
            "level": "OLG",
            "year": "2023"
        })
    }
}

use test_helpers::*;

#[tokio::test]
async fn missing_fields_are_rejected_before_any_remote_call() -> Result<()> {
    let (rpc_url, calls) = spawn_rpc_stub(json!({})).await?;
    let app = spawn_app(&rpc_url).await?;
    let http = reqwest::Client::new();

    for field in ["searchType", "searchValue", "level", "year"] {
        let mut body = search_body();
        body.as_object_mut().unwrap().remove(field);

        let response = http
            .post(format!("{app}/api/search"))
            .json(&body)
            .send()
            .await?;
        assert_eq!(response.status().as_u16(), 400, "without {field}");
        let error: Value = response.json().await?;
        assert_eq!(error, json!({"error": "Missing required fields"}));
    }

    assert!(calls.lock().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn blank_fields_count_as_missing() -> Result<()> {
    let (rpc_url, calls) = spawn_rpc_stub(json!({})).await?;
    let app = spawn_app(&rpc_url).await?;

    let mut body = search_body();
    body["searchValue"] = json!("   ");
    let response = reqwest::Client::new()
        .post(format!("{app}/api/search"))
        .json(&body)
        .send()
        .await?;

    assert_eq!(response.status().as_u16(), 400);
    let error: Value = response.json().await?;
    assert_eq!(error["error"], "Missing required fields");
    assert!(calls.lock().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn unknown_search_type_is_rejected() -> Result<()> {
    let (rpc_url, calls) = spawn_rpc_stub(json!({})).await?;
    let app = spawn_app(&rpc_url).await?;

    let mut body = search_body();
    body["searchType"] = json!("email");
    let response = reqwest::Client::new()
        .post(format!("{app}/api/search"))
        .json(&body)
        .send()
        .await?;

    assert_eq!(response.status().as_u16(), 400);
    let error: Value = response.json().await?;
    assert_eq!(error, json!({"error": "Invalid search type"}));
    assert!(calls.lock().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn non_numeric_year_is_rejected() -> Result<()> {
    let (rpc_url, calls) = spawn_rpc_stub(json!({})).await?;
    let app = spawn_app(&rpc_url).await?;

    let mut body = search_body();
    body["year"] = json!("twenty23");
    let response = reqwest::Client::new()
        .post(format!("{app}/api/search"))
        .json(&body)
        .send()
        .await?;

    assert_eq!(response.status().as_u16(), 400);
    let error: Value = response.json().await?;
    assert_eq!(error, json!({"error": "Invalid year"}));
    assert!(calls.lock().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn center_number_search_calls_the_center_number_function() -> Result<()> {
    let (rpc_url, calls) =
        spawn_rpc_stub(json!({"search_by_center_number": sample_rows()})).await?;
    let app = spawn_app(&rpc_url).await?;

    let response = reqwest::Client::new()
        .post(format!("{app}/api/search"))
        .json(&search_body())
        .send()
        .await?;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await?;
    assert_eq!(body["totalResults"], 2);
    assert_eq!(body["results"], sample_rows());

    let calls = calls.lock().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "search_by_center_number");
    assert_eq!(
        calls[0].1,
        json!({
            "center_num": "12345",
            "level_filter": "OLG",
            "year_filter": 2023
        })
    );
    Ok(())
}

#[tokio::test]
async fn name_and_school_searches_use_the_search_term_key() -> Result<()> {
    let (rpc_url, calls) = spawn_rpc_stub(json!({})).await?;
    let app = spawn_app(&rpc_url).await?;
    let http = reqwest::Client::new();

    for search_type in ["name", "school"] {
        let body = json!({
            "searchType": search_type,
            "searchValue": "Saint Joseph",
            "level": "ALT",
            "year": "2022"
        });
        let response = http
            .post(format!("{app}/api/search"))
            .json(&body)
            .send()
            .await?;
        assert_eq!(response.status().as_u16(), 200);
    }

    let calls = calls.lock().await;
    assert_eq!(calls.len(), 2);
    for (call, function) in calls
        .iter()
        .zip(["search_by_student_name", "search_by_center_name"])
    {
        assert_eq!(call.0, function);
        assert_eq!(
            call.1,
            json!({
                "search_term": "Saint Joseph",
                "level_filter": "ALT",
                "year_filter": 2022
            })
        );
    }
    Ok(())
}

#[tokio::test]
async fn zero_matches_is_a_success_with_an_empty_set() -> Result<()> {
    let (rpc_url, _calls) = spawn_rpc_stub(json!({})).await?;
    let app = spawn_app(&rpc_url).await?;

    let response = reqwest::Client::new()
        .post(format!("{app}/api/search"))
        .json(&search_body())
        .send()
        .await?;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await?;
    assert_eq!(body["results"], json!([]));
    assert_eq!(body["totalResults"], 0);
    Ok(())
}

#[tokio::test]
async fn upstream_failure_answers_a_generic_500() -> Result<()> {
    let rpc_url = spawn_failing_rpc_stub().await?;
    let app = spawn_app(&rpc_url).await?;

    let response = reqwest::Client::new()
        .post(format!("{app}/api/search"))
        .json(&search_body())
        .send()
        .await?;

    assert_eq!(response.status().as_u16(), 500);
    let raw = response.text().await?;
    // Generic message only; the upstream detail must not leak
    assert_eq!(
        serde_json::from_str::<Value>(&raw)?,
        json!({"error": "Database query failed"})
    );
    assert!(!raw.contains("permission denied"));
    Ok(())
}

#[tokio::test]
async fn unreachable_remote_answers_a_generic_500() -> Result<()> {
    // Discard port: connection refused without leaving the host
    let app = spawn_app("http://127.0.0.1:9").await?;

    let response = reqwest::Client::new()
        .post(format!("{app}/api/search"))
        .json(&search_body())
        .send()
        .await?;

    assert_eq!(response.status().as_u16(), 500);
    let error: Value = response.json().await?;
    assert_eq!(error, json!({"error": "Database query failed"}));
    Ok(())
}

#[tokio::test]
async fn meta_endpoint_serves_selector_data() -> Result<()> {
    let (rpc_url, calls) = spawn_rpc_stub(json!({
        "get_distinct_years": [2024, 2023, 2022],
        "get_distinct_levels": ["OLG", "OLT", "ALG", "ALT"]
    }))
    .await?;
    let app = spawn_app(&rpc_url).await?;

    let response = reqwest::Client::new()
        .get(format!("{app}/api/meta"))
        .send()
        .await?;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await?;
    assert_eq!(body["years"], json!([2024, 2023, 2022]));
    assert_eq!(body["levels"], json!(["OLG", "OLT", "ALG", "ALT"]));

    let calls = calls.lock().await;
    let functions: Vec<&str> = calls.iter().map(|(f, _)| f.as_str()).collect();
    assert_eq!(functions, ["get_distinct_years", "get_distinct_levels"]);
    Ok(())
}

#[tokio::test]
async fn meta_failure_maps_to_the_generic_500() -> Result<()> {
    let rpc_url = spawn_failing_rpc_stub().await?;
    let app = spawn_app(&rpc_url).await?;

    let response = reqwest::Client::new()
        .get(format!("{app}/api/meta"))
        .send()
        .await?;

    assert_eq!(response.status().as_u16(), 500);
    let error: Value = response.json().await?;
    assert_eq!(error, json!({"error": "Database query failed"}));
    Ok(())
}
