//! Drives the real HTTP clients against an in-process mock of the node RPC
//! and the GitHub API.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    Json, Router,
    extract::Path,
    http::{HeaderMap, StatusCode, header},
    routing::get,
};
use serde_json::{Value, json};

use scraper::{
    Aggregator, BinaryVersionProbe, FetchError, GithubConfig, GithubReleaseClient,
    MetricsRenderer, ScrapeConfig, ScrapeSource, TendermintRpcClient,
};

const TOKEN: &str = "ghp_test_token";

fn status_body(id: &str, moniker: &str, height: u64, voting_power: u64) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": -1,
        "result": {
            "node_info": { "id": id, "moniker": moniker, "network": "testnet-1" },
            "sync_info": {
                "latest_block_height": height.to_string(),
                "latest_block_time": "2024-01-01T00:00:00.123456789Z",
                "catching_up": false
            },
            "validator_info": { "voting_power": voting_power.to_string() }
        }
    })
}

async fn latest_release(
    Path((org, repo)): Path<(String, String)>,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    if headers.get(header::USER_AGENT).is_none() {
        return Err(StatusCode::FORBIDDEN);
    }
    match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(auth) if auth == format!("Bearer {TOKEN}") => {}
        Some(_) => return Err(StatusCode::UNAUTHORIZED),
        None => {}
    }
    if org != "cosmos" || repo != "gaia" {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(json!({ "name": "Gaia v2.0.0", "tag_name": "v2.0.0", "draft": false })))
}

async fn spawn_mock() -> SocketAddr {
    let app = Router::new()
        .route(
            "/local/status",
            get(|| async { Json(status_body("abc", "node1", 500, 100)) }),
        )
        .route(
            "/remote/status",
            get(|| async { Json(status_body("def", "reference", 503, 0)) }),
        )
        .route(
            "/empty/status",
            get(|| async { Json(json!({ "jsonrpc": "2.0", "id": -1, "result": null })) }),
        )
        .route("/repos/{org}/{repo}/releases/latest", get(latest_release))
        .route(
            "/slow/repos/{org}/{repo}/releases/latest",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({ "tag_name": "v2.0.0" }))
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock server");
    let addr = listener.local_addr().expect("mock server address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock server");
    });
    addr
}

/// Returns an address nothing listens on.
async fn closed_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind throwaway listener");
    let addr = listener.local_addr().expect("throwaway address");
    drop(listener);
    addr
}

fn github(addr: SocketAddr, token: Option<&str>) -> GithubConfig {
    GithubConfig {
        api_url: format!("http://{addr}"),
        organization: "cosmos".into(),
        repository: "gaia".into(),
        token: token.map(str::to_string),
    }
}

fn aggregator(
    config: ScrapeConfig,
) -> Aggregator<TendermintRpcClient, GithubReleaseClient, BinaryVersionProbe> {
    Aggregator::new(
        Arc::new(config),
        TendermintRpcClient::new().expect("rpc client"),
        GithubReleaseClient::new().expect("github client"),
        BinaryVersionProbe::new(),
    )
}

#[cfg(unix)]
#[tokio::test]
async fn full_scrape_renders_every_gauge() {
    let addr = spawn_mock().await;

    let config = ScrapeConfig {
        local_rpc: format!("http://{addr}/local"),
        remote_rpc: Some(format!("http://{addr}/remote")),
        github: Some(github(addr, Some(TOKEN))),
        binary: Some(scraper::BinaryConfig {
            path: "sh".into(),
            args: vec![
                "-c".into(),
                r#"echo "INF cosmovisor starting"; echo '{"name":"gaia","version":"2.0.0"}'"#
                    .into(),
            ],
        }),
    };

    let agg = aggregator(config);
    let snapshot = agg.aggregate().await.expect("scrape should succeed");

    assert_eq!(snapshot.local.latest_block_height, 500);
    assert_eq!(snapshot.remote.as_ref().map(|r| r.latest_block_height), Some(503));
    assert_eq!(
        snapshot.release.as_ref().and_then(|r| r.name.as_deref()),
        Some("Gaia v2.0.0")
    );

    let renderer = MetricsRenderer::new(Arc::new(agg.config().clone()));
    let text = renderer.render(&snapshot).expect("render");

    assert!(text.contains(r#"tendermint_node_voting_power{id="abc",moniker="node1"} 100"#));
    assert!(text.contains(r#"tendermint_local_node_latest_block{id="abc",moniker="node1"} 500"#));
    assert!(text.contains(
        r#"tendermint_remote_node_latest_block{id="def",moniker="reference"} 503"#
    ));
    assert!(text.contains(
        r#"tendermint_latest_version_mismatch{id="abc",local_version="2.0.0",moniker="node1",remote_version="v2.0.0"} 0"#
    ));
}

#[tokio::test]
async fn local_only_scrape_succeeds() {
    let addr = spawn_mock().await;

    let agg = aggregator(ScrapeConfig {
        local_rpc: format!("http://{addr}/local"),
        ..ScrapeConfig::default()
    });

    let snapshot = agg.aggregate().await.expect("scrape should succeed");
    assert_eq!(snapshot.local.node_id, "abc");
    assert!(snapshot.remote.is_none());
    assert!(snapshot.release.is_none());
    assert!(snapshot.version.is_none());
}

#[tokio::test]
async fn refused_local_connection_fails_the_scrape() {
    let mock = spawn_mock().await;
    let closed = closed_addr().await;

    let agg = aggregator(ScrapeConfig {
        local_rpc: format!("http://{closed}"),
        remote_rpc: Some(format!("http://{mock}/remote")),
        github: Some(github(mock, None)),
        binary: None,
    });

    let err = agg.aggregate().await.unwrap_err();
    assert_eq!(err.source_kind, ScrapeSource::LocalStatus);
    assert!(matches!(err.error, FetchError::Transport(_)), "got {err:?}");
    assert!(
        err.to_string().to_lowercase().contains("connection refused"),
        "unexpected message: {err}"
    );
}

#[tokio::test]
async fn empty_remote_status_fails_the_scrape() {
    let addr = spawn_mock().await;

    let agg = aggregator(ScrapeConfig {
        local_rpc: format!("http://{addr}/local"),
        remote_rpc: Some(format!("http://{addr}/empty")),
        ..ScrapeConfig::default()
    });

    let err = agg.aggregate().await.unwrap_err();
    assert_eq!(err.source_kind, ScrapeSource::RemoteStatus);
    assert!(matches!(err.error, FetchError::EmptyResponse), "got {err:?}");
}

#[tokio::test]
async fn wrong_token_surfaces_http_status() {
    let addr = spawn_mock().await;

    let agg = aggregator(ScrapeConfig {
        local_rpc: format!("http://{addr}/local"),
        github: Some(github(addr, Some("wrong"))),
        ..ScrapeConfig::default()
    });

    let err = agg.aggregate().await.unwrap_err();
    assert_eq!(err.source_kind, ScrapeSource::Release);
    match err.error {
        FetchError::UnexpectedStatus { status, .. } => assert_eq!(status, 401),
        other => panic!("unexpected error variant: {other:?}"),
    }
}

#[tokio::test]
async fn unknown_repository_surfaces_not_found() {
    let addr = spawn_mock().await;

    let mut gh = github(addr, None);
    gh.repository = "does-not-exist".into();

    let agg = aggregator(ScrapeConfig {
        local_rpc: format!("http://{addr}/local"),
        github: Some(gh),
        ..ScrapeConfig::default()
    });

    let err = agg.aggregate().await.unwrap_err();
    match err.error {
        FetchError::UnexpectedStatus { status, url } => {
            assert_eq!(status, 404);
            assert!(url.ends_with("/repos/cosmos/does-not-exist/releases/latest"));
        }
        other => panic!("unexpected error variant: {other:?}"),
    }
}

#[tokio::test]
async fn slow_release_api_times_out() {
    let addr = spawn_mock().await;

    let mut gh = github(addr, None);
    gh.api_url = format!("http://{addr}/slow");

    let agg = Aggregator::new(
        Arc::new(ScrapeConfig {
            local_rpc: format!("http://{addr}/local"),
            github: Some(gh),
            ..ScrapeConfig::default()
        }),
        TendermintRpcClient::new().expect("rpc client"),
        GithubReleaseClient::with_timeout(Duration::from_millis(200)).expect("github client"),
        BinaryVersionProbe::new(),
    );

    let started = Instant::now();
    let err = agg.aggregate().await.unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(4), "took {:?}", started.elapsed());
    assert_eq!(err.source_kind, ScrapeSource::Release);
    assert!(matches!(err.error, FetchError::Transport(_)), "got {err:?}");
}
