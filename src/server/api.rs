use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::extract::State;
use axum_auth::AuthBearer;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use log::info;
use prometheus::TextEncoder;

use super::error::{AppError, Result};
use super::state::AppState;
use super::types::*;
use crate::collection::SearchQuery;
use crate::embedding::decode_image;
use crate::error::Error;
use crate::metrics;

/// 创建集合
pub async fn create_collection_handler(
    State(state): State<Arc<AppState>>,
    AuthBearer(token): AuthBearer,
    Json(data): Json<CreateCollectionRequest>,
) -> Result<Json<MessageResponse>> {
    check_token(&state, &token)?;

    state.client.create_collection(&data.name).await?;
    Ok(Json(MessageResponse { message: format!("Collection '{}' created.", data.name) }))
}

/// 添加图片到集合
pub async fn add_image_handler(
    State(state): State<Arc<AppState>>,
    AuthBearer(token): AuthBearer,
    Json(data): Json<AddImageRequest>,
) -> Result<Json<AddImageResponse>> {
    check_token(&state, &token)?;

    let content = decode_base64(&data.image_base64)?;
    let collection = state.client.collection(&data.collection).await?;
    let id = collection.add_image_bytes(&data.file, &content, data.metadata).await?;

    metrics::inc_add_image(&data.collection);
    Ok(Json(AddImageResponse { message: "Image added to collection.".to_string(), id }))
}

/// 搜索相似图片
pub async fn find_similar_handler(
    State(state): State<Arc<AppState>>,
    AuthBearer(token): AuthBearer,
    Json(data): Json<FindSimilarRequest>,
) -> Result<Json<FindSimilarResponse>> {
    check_token(&state, &token)?;

    let image = decode_image(&decode_base64(&data.image_base64)?)?;
    let collection = state.client.collection(&data.collection).await?;
    let query =
        SearchQuery { count: data.top_n, threshold: data.threshold, filter: data.r#where };

    let start = Instant::now();
    info!("正在搜索上传图片");
    let result = collection.find_similar_images(&image, &query).await?;

    metrics::inc_search_count(&data.collection);
    metrics::observe_search_duration(&data.collection, start.elapsed().as_secs_f32());
    if let Some(best) = result.matches.first() {
        metrics::observe_search_max_score(&data.collection, best.score);
    }

    let mut response = FindSimilarResponse {
        n_findings: result.n_findings,
        scores: vec![],
        files: vec![],
        base64: vec![],
        metadata: vec![],
    };
    for m in result.matches {
        let content = collection.get_image(m.id).await?;
        response.scores.push(m.score);
        response.files.push(m.path);
        response.base64.push(STANDARD.encode(content));
        response.metadata.push(m.metadata);
    }
    Ok(Json(response))
}

/// 列出所有集合
pub async fn collections_handler(
    State(state): State<Arc<AppState>>,
    AuthBearer(token): AuthBearer,
) -> Result<Json<CollectionsResponse>> {
    check_token(&state, &token)?;

    let collections = state.client.collections().await?;
    Ok(Json(CollectionsResponse { collections }))
}

/// prometheus 指标
pub async fn metrics_handler() -> Result<String> {
    let encoder = TextEncoder::new();
    Ok(encoder.encode_to_string(&prometheus::gather())?)
}

fn check_token(state: &AppState, token: &str) -> Result<()> {
    if token != state.token {
        return Err(AppError::unauthorized());
    }
    Ok(())
}

fn decode_base64(data: &str) -> Result<Vec<u8>> {
    Ok(STANDARD.decode(data).map_err(|e| Error::Input(format!("无效的 base64 图片: {e}")))?)
}
