//! Shared test helpers

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;

use crate::session::{PublishState, SessionCoordinator};

/// Offers received by a mock ingest, as `(stream, sdp)`
pub(crate) type Received = Arc<Mutex<Vec<(String, String)>>>;

/// Start a WHIP ingest answering every offer with `status` and `body`
pub(crate) async fn mock_ingest(status: StatusCode, body: &'static str) -> (SocketAddr, Received) {
    let received: Received = Arc::default();

    let app = Router::new()
        .route(
            "/:stream/whip",
            post(
                move |State(received): State<Received>, Path(stream): Path<String>, sdp: String| async move {
                    received.lock().unwrap().push((stream, sdp));
                    (status, body)
                },
            ),
        )
        .with_state(Arc::clone(&received));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, received)
}

/// Start a WHIP ingest that records offers and never answers
pub(crate) async fn stalled_ingest() -> (SocketAddr, Received) {
    let received: Received = Arc::default();

    let app = Router::new()
        .route(
            "/:stream/whip",
            post(
                move |State(received): State<Received>, Path(stream): Path<String>, sdp: String| async move {
                    received.lock().unwrap().push((stream, sdp));
                    std::future::pending::<()>().await;
                    StatusCode::CREATED
                },
            ),
        )
        .with_state(Arc::clone(&received));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, received)
}

/// Poll until the camera's session reaches a terminal state
pub(crate) async fn wait_terminal(sessions: &SessionCoordinator, camera: &str) -> PublishState {
    for _ in 0..500 {
        if let Some(state) = sessions.state(camera) {
            if state.is_terminal() {
                return state;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("session for {} never finished", camera);
}
