use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{Rgb, RgbImage};
use imvdb::server::{AppState, create_app};
use imvdb::{ClientBuilder, GridEmbedding};
use serde_json::{Value, json};
use tower::ServiceExt;

const TOKEN: &str = "secret-token";

/// 每个测试使用独立的内存数据库
async fn test_app() -> Router {
    let client = ClientBuilder::new(GridEmbedding::new(4)).open().await.unwrap();
    create_app(AppState::new(client, TOKEN.to_string()))
}

/// 生成内容确定的 PNG，竖切和横切两种图案的相似度远低于 1
fn split_png(vertical: bool) -> Vec<u8> {
    let image = RgbImage::from_fn(64, 64, |x, y| {
        let white = if vertical { x < 32 } else { y < 32 };
        if white { Rgb([255, 255, 255]) } else { Rgb([0, 0, 0]) }
    });
    let mut buf = std::io::Cursor::new(vec![]);
    image::DynamicImage::ImageRgb8(image).write_to(&mut buf, image::ImageFormat::Png).unwrap();
    buf.into_inner()
}

async fn post_json(app: &Router, path: &str, token: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get(app: &Router, path: &str, token: Option<&str>) -> (StatusCode, String) {
    let mut builder = Request::builder().method("GET").uri(path);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let response = app.clone().oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn test_create_collection() {
    let app = test_app().await;

    let (status, body) = post_json(&app, "/create_collection", TOKEN, json!({"name": "pics"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Collection 'pics' created.");

    // 同名集合冲突
    let (status, body) = post_json(&app, "/create_collection", TOKEN, json!({"name": "pics"})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("pics"));
}

#[tokio::test]
async fn test_wrong_token_rejected() {
    let app = test_app().await;

    let (status, _) = post_json(&app, "/create_collection", "wrong", json!({"name": "pics"})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = get(&app, "/collections", Some("wrong")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_add_and_find_similar() {
    let app = test_app().await;
    let vertical = split_png(true);
    let horizontal = split_png(false);

    post_json(&app, "/create_collection", TOKEN, json!({"name": "pics"})).await;

    let (status, body) = post_json(
        &app,
        "/add_image",
        TOKEN,
        json!({
            "collection": "pics",
            "file": "v.png",
            "image_base64": STANDARD.encode(&vertical),
            "metadata": {"side": "vertical"},
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Image added to collection.");
    assert_eq!(body["id"], 1);

    let (status, _) = post_json(
        &app,
        "/add_image",
        TOKEN,
        json!({
            "collection": "pics",
            "file": "h.png",
            "image_base64": STANDARD.encode(&horizontal),
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post_json(
        &app,
        "/find_similar",
        TOKEN,
        json!({
            "collection": "pics",
            "image_base64": STANDARD.encode(&vertical),
            "top_N": 1,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["n_findings"], 2);
    assert_eq!(body["files"], json!(["v.png"]));
    assert!((body["scores"][0].as_f64().unwrap() - 1.0).abs() < 1e-6);
    assert_eq!(body["metadata"][0], json!({"side": "vertical"}));
    // 返回的 base64 能还原出原始图片内容
    let content = STANDARD.decode(body["base64"][0].as_str().unwrap()).unwrap();
    assert_eq!(content, vertical);
}

#[tokio::test]
async fn test_find_similar_threshold_and_filter() {
    let app = test_app().await;
    let vertical = split_png(true);
    let horizontal = split_png(false);

    post_json(&app, "/create_collection", TOKEN, json!({"name": "pics"})).await;
    for (file, data, side) in [("v.png", &vertical, "vertical"), ("h.png", &horizontal, "horizontal")] {
        post_json(
            &app,
            "/add_image",
            TOKEN,
            json!({
                "collection": "pics",
                "file": file,
                "image_base64": STANDARD.encode(data),
                "metadata": {"side": side},
            }),
        )
        .await;
    }

    // 横切图案与竖切查询的相似度明显低于 0.8
    let (status, body) = post_json(
        &app,
        "/find_similar",
        TOKEN,
        json!({
            "collection": "pics",
            "image_base64": STANDARD.encode(&vertical),
            "threshold": 0.8,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["n_findings"], 1);
    assert_eq!(body["files"], json!(["v.png"]));

    // 过滤后只剩横切图案，即使查询图片是竖切的
    let (status, body) = post_json(
        &app,
        "/find_similar",
        TOKEN,
        json!({
            "collection": "pics",
            "image_base64": STANDARD.encode(&vertical),
            "where": {"side": "horizontal"},
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["files"], json!(["h.png"]));
}

#[tokio::test]
async fn test_error_statuses() {
    let app = test_app().await;

    // 集合不存在
    let (status, _) = post_json(
        &app,
        "/add_image",
        TOKEN,
        json!({"collection": "nope", "file": "a.png", "image_base64": STANDARD.encode(split_png(true))}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    post_json(&app, "/create_collection", TOKEN, json!({"name": "pics"})).await;

    // 非法 base64
    let (status, _) = post_json(
        &app,
        "/add_image",
        TOKEN,
        json!({"collection": "pics", "file": "a.png", "image_base64": "!!not base64!!"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // base64 合法但不是图片
    let (status, _) = post_json(
        &app,
        "/add_image",
        TOKEN,
        json!({"collection": "pics", "file": "a.png", "image_base64": STANDARD.encode(b"hello")}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // 路径重复
    let image = json!({"collection": "pics", "file": "a.png", "image_base64": STANDARD.encode(split_png(true))});
    let (status, _) = post_json(&app, "/add_image", TOKEN, image.clone()).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = post_json(&app, "/add_image", TOKEN, image).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_collections() {
    let app = test_app().await;
    post_json(&app, "/create_collection", TOKEN, json!({"name": "zoo"})).await;
    post_json(&app, "/create_collection", TOKEN, json!({"name": "art"})).await;

    let (status, body) = get(&app, "/collections", Some(TOKEN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), json!({"collections": ["zoo", "art"]}));
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = test_app().await;
    let vertical = split_png(true);

    post_json(&app, "/create_collection", TOKEN, json!({"name": "pics"})).await;
    post_json(
        &app,
        "/add_image",
        TOKEN,
        json!({"collection": "pics", "file": "v.png", "image_base64": STANDARD.encode(&vertical)}),
    )
    .await;
    post_json(
        &app,
        "/find_similar",
        TOKEN,
        json!({"collection": "pics", "image_base64": STANDARD.encode(&vertical)}),
    )
    .await;

    // 指标端点不需要鉴权
    let (status, body) = get(&app, "/metrics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("imvdb_add_image_count"));
    assert!(body.contains("imvdb_search_count"));
}
