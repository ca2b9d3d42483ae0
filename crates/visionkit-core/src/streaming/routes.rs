use super::state::{AppState, FrameHub};
use crate::config::DetectionConfig;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::BytesMut;
use tokio_stream::{wrappers::WatchStream, StreamExt};

pub async fn list_windows(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.window_names().await)
}

pub async fn stream_window(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    match state.window(&name).await {
        Some(hub) => stream_mjpeg_internal(hub).await.into_response(),
        None => {
            tracing::debug!(window = %name, "stream requested for unknown window");
            (StatusCode::NOT_FOUND, format!("no window named {name}")).into_response()
        }
    }
}

async fn stream_mjpeg_internal(hub: FrameHub) -> impl IntoResponse {
    // Starts with the current frame, then follows updates.
    let rx = hub.subscribe();
    let stream = WatchStream::new(rx)
        .filter_map(|frame| frame)
        .map(|frame| {
            let mut buf = BytesMut::new();
            buf.extend_from_slice(b"--frame\r\n");
            buf.extend_from_slice(b"Content-Type: image/jpeg\r\n");
            buf.extend_from_slice(format!("Content-Length: {}\r\n\r\n", frame.len()).as_bytes());
            buf.extend_from_slice(&frame);
            buf.extend_from_slice(b"\r\n");
            Ok::<_, std::io::Error>(buf.freeze())
        });

    (
        StatusCode::OK,
        [(
            header::CONTENT_TYPE,
            "multipart/x-mixed-replace; boundary=frame",
        )],
        axum::body::Body::from_stream(stream),
    )
}

pub async fn post_key(State(state): State<AppState>, Path(key): Path<String>) -> StatusCode {
    let mut chars = key.chars();
    let (Some(c), None) = (chars.next(), chars.next()) else {
        return StatusCode::BAD_REQUEST;
    };
    match state.keys.send(c) {
        Ok(()) => {
            tracing::debug!(key = %c, "key pressed on dashboard");
            StatusCode::ACCEPTED
        }
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

pub async fn get_config_handler(State(state): State<AppState>) -> Json<DetectionConfig> {
    tracing::info!("getting config");
    Json(state.get_detection().await)
}

pub async fn update_config_handler(
    State(state): State<AppState>,
    Json(new_detection_cfg): Json<DetectionConfig>,
) -> impl IntoResponse {
    tracing::info!("Received configuration update request");
    let mut config = state.config.write().await;
    tracing::debug!("New Config Values: {:?}", new_detection_cfg);
    config.detection = new_detection_cfg;
    tracing::info!("Configuration successfully updated in AppState");
    StatusCode::OK
}
