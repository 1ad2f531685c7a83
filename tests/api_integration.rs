use std::sync::Arc;
use std::time::Duration;

use streamalert::api::{self, ApiState};
use streamalert::config::AuthConfig;
use streamalert::jobs::http_api_routine;
use streamalert::store::{MemoryBroadcasterStore, MemoryUserStore};
use streamalert::{Routine, RoutineFailure, StreamalertError, Supervisor};

fn test_state() -> Arc<ApiState> {
    Arc::new(ApiState {
        users: Arc::new(MemoryUserStore::new()),
        broadcasters: Arc::new(MemoryBroadcasterStore::new()),
        auth: AuthConfig {
            jwt_secret: "integration-secret".into(),
            token_ttl_hours: 1,
        },
    })
}

/// Drive the API over a real socket while it runs as a supervised routine,
/// then let a peer failure take it down.
#[tokio::test]
async fn register_login_and_track_broadcaster_over_http() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = api::router(test_state());

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let mut supervisor = Supervisor::new();
    supervisor.start(vec![
        http_api_routine(listener, app),
        Routine::new("test-driver-stop", |_cancel, errors| async move {
            let _ = stop_rx.await;
            let _ = errors.try_send(RoutineFailure::new(
                "test-driver-stop",
                StreamalertError::Provider("test finished".into()),
            ));
        }),
    ]);
    let shutdown = tokio::spawn(supervisor.wait_for_shutdown());

    let base = format!("http://{addr}");
    let client = reqwest::Client::new();

    let health = client
        .get(format!("{base}/healthz"))
        .send()
        .await
        .unwrap();
    assert!(health.status().is_success());

    let register: serde_json::Value = client
        .post(format!("{base}/users"))
        .json(&serde_json::json!({
            "email": "ada@example.com",
            "username": "ada",
            "password": "hunter2hunter2"
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let token = register["token"].as_str().unwrap().to_string();

    let login = client
        .post(format!("{base}/users/login"))
        .json(&serde_json::json!({
            "email": "ada@example.com",
            "password": "hunter2hunter2"
        }))
        .send()
        .await
        .unwrap();
    assert!(login.status().is_success());

    let created = client
        .post(format!("{base}/broadcasters"))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "login": "cohhcarnage" }))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status().as_u16(), 201);

    let listed: serde_json::Value = client
        .get(format!("{base}/broadcasters"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed["data"][0]["login"], "cohhcarnage");

    let unauthorized = client
        .get(format!("{base}/broadcasters"))
        .send()
        .await
        .unwrap();
    assert_eq!(unauthorized.status().as_u16(), 401);

    // Tear down: a peer failure cancels the server routine; the supervisor
    // drains and reports the failure.
    stop_tx.send(()).unwrap();
    let failure = shutdown.await.unwrap().unwrap_err();
    assert_eq!(failure.routine, "test-driver-stop");

    // The listener is gone once the drain barrier releases.
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(tokio::net::TcpStream::connect(addr).await.is_err());
}
