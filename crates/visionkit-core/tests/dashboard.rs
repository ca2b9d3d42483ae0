use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use bytes::Bytes;
use std::time::Duration;
use tokio::runtime::Runtime;
use tokio_stream::StreamExt;
use tower::ServiceExt;
use visionkit_core::display::{DashboardSink, FrameSink};
use visionkit_core::streaming::{router, AppState};
use visionkit_core::{Config, Frame, PixelFormat};

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, body: Body) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body)
        .unwrap()
}

#[test]
fn root_serves_page() {
    let (state, _keys) = AppState::new(Config::default());
    let app = router(state);
    Runtime::new().unwrap().block_on(async {
        let res = app.oneshot(get("/")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&body).contains("/windows"));
    });
}

#[test]
fn published_windows_are_listed_and_streamed() {
    let (state, _keys) = AppState::new(Config::default());
    state.blocking_publish("webcam", Bytes::from_static(&[0xFF, 0xD8, 0xFF, 0xD9]));
    state.blocking_publish("mask", Bytes::from_static(&[0xFF, 0xD8, 0xFF, 0xD9]));

    Runtime::new().unwrap().block_on(async {
        let res = router(state.clone()).oneshot(get("/windows")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], br#"["mask","webcam"]"#);

        let res = router(state.clone()).oneshot(get("/stream/webcam")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            res.headers()[header::CONTENT_TYPE],
            "multipart/x-mixed-replace; boundary=frame"
        );

        let res = router(state).oneshot(get("/stream/nowhere")).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    });
}

#[test]
fn late_viewers_get_the_last_frame() {
    let (state, keys) = AppState::new(Config::default());
    let still = Frame::from_array(ndarray::Array3::from_elem((8, 8, 3), 90u8), PixelFormat::BGR8).unwrap();
    DashboardSink::new(state.clone(), keys).show("Cat1", &still).unwrap();

    Runtime::new().unwrap().block_on(async {
        let res = router(state).oneshot(get("/stream/Cat1")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let mut body = res.into_body().into_data_stream();
        let chunk = tokio::time::timeout(Duration::from_secs(2), body.next())
            .await
            .expect("no frame within 2s")
            .unwrap()
            .unwrap();
        assert!(chunk.starts_with(b"--frame\r\nContent-Type: image/jpeg\r\n"));
        let jpeg_start = chunk.windows(2).position(|w| w == [0xFF, 0xD8]);
        assert!(jpeg_start.is_some());
    });
}

#[test]
fn keys_reach_the_lesson() {
    let (state, keys) = AppState::new(Config::default());
    Runtime::new().unwrap().block_on(async {
        let res = router(state.clone()).oneshot(post("/key/q", Body::empty())).await.unwrap();
        assert_eq!(res.status(), StatusCode::ACCEPTED);

        let res = router(state).oneshot(post("/key/quit", Body::empty())).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    });
    assert_eq!(keys.try_recv(), Ok('q'));
    assert!(keys.try_recv().is_err());
}

#[test]
fn keys_without_a_listener_are_refused() {
    let (state, keys) = AppState::new(Config::default());
    drop(keys);
    Runtime::new().unwrap().block_on(async {
        let res = router(state).oneshot(post("/key/q", Body::empty())).await.unwrap();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    });
}

#[test]
fn detection_config_can_be_edited() {
    let (state, _keys) = AppState::new(Config::default());
    let update = r#"{
        "color_lower": [20, 100, 100],
        "color_upper": [40, 255, 255],
        "target_bgr": [255, 0, 0],
        "min_area": 50.0,
        "threshold": 90,
        "contour_threshold": 110
    }"#;

    Runtime::new().unwrap().block_on(async {
        let res = router(state.clone())
            .oneshot(post("/config", Body::from(update)))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let detection = state.get_detection().await;
        assert_eq!(detection.color_lower, [20, 100, 100]);
        assert_eq!(detection.target_bgr, [255, 0, 0]);
        assert_eq!(detection.min_area, 50.0);

        let res = router(state).oneshot(get("/config")).await.unwrap();
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&body).contains("\"contour_threshold\":110"));
    });
}
