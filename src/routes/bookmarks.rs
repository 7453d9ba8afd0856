use crate::{
    error::Result,
    models::bookmark::*,
    services::auth::CurrentUser,
    state::AppState,
};
use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, put},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(get_user_bookmarks).post(create_bookmark))
        .route("/:id", put(update_bookmark).delete(delete_bookmark))
        .route("/:id/favorite", put(toggle_favorite))
        .route("/:id/collection", put(update_collection))
}

/// Get the caller's bookmarks, newest first
/// GET /api/bookmarks
async fn get_user_bookmarks(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Value>> {
    debug!("Getting bookmarks for user: {}", user.id);

    let bookmarks = state.bookmark_service.get_user_bookmarks(&user.id).await?;

    Ok(Json(json!({
        "success": true,
        "data": bookmarks
    })))
}

/// Create a bookmark
/// POST /api/bookmarks
///
/// 不返回记录本身，调用方经订阅事件或重新拉取快照获得新记录。
async fn create_bookmark(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<CreateBookmarkRequest>,
) -> Result<Json<Value>> {
    debug!("Creating bookmark by user: {}", user.id);

    state.bookmark_service.create_bookmark(&user.id, request).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Bookmark created successfully"
    })))
}

/// Update a bookmark's title, url and/or collection
/// PUT /api/bookmarks/:id
async fn update_bookmark(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(bookmark_id): Path<String>,
    Json(request): Json<UpdateBookmarkRequest>,
) -> Result<Json<Value>> {
    debug!("Updating bookmark: {} by user: {}", bookmark_id, user.id);

    let bookmark = state
        .bookmark_service
        .update_bookmark(&user.id, &bookmark_id, request)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": bookmark,
        "message": "Bookmark updated successfully"
    })))
}

/// Delete a bookmark
/// DELETE /api/bookmarks/:id
async fn delete_bookmark(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(bookmark_id): Path<String>,
) -> Result<Json<Value>> {
    debug!("Deleting bookmark: {} by user: {}", bookmark_id, user.id);

    state
        .bookmark_service
        .delete_bookmark(&user.id, &bookmark_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Bookmark deleted successfully"
    })))
}

/// Set the favorite flag on a bookmark
/// PUT /api/bookmarks/:id/favorite
async fn toggle_favorite(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(bookmark_id): Path<String>,
    Json(request): Json<ToggleFavoriteRequest>,
) -> Result<Json<Value>> {
    debug!("Toggling favorite on bookmark: {} by user: {}", bookmark_id, user.id);

    let bookmark = state
        .bookmark_service
        .toggle_favorite(&user.id, &bookmark_id, request.is_favorite)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": bookmark
    })))
}

/// Move a bookmark into (or out of) a collection
/// PUT /api/bookmarks/:id/collection
async fn update_collection(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(bookmark_id): Path<String>,
    Json(request): Json<UpdateCollectionRequest>,
) -> Result<Json<Value>> {
    debug!("Updating collection on bookmark: {} by user: {}", bookmark_id, user.id);

    let bookmark = state
        .bookmark_service
        .update_collection(&user.id, &bookmark_id, request)
        .await?;

    Ok(Json(json!({
        "success": true,
        "data": bookmark
    })))
}
