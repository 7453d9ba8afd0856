use crate::{error::AppError, state::AppState};
use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// 认证中间件
///
/// 验证Bearer JWT并把用户放进请求扩展；验证失败时请求继续，
/// 由CurrentUser提取器在需要认证的端点上报Unauthorized。
pub async fn auth_middleware(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request<Body>,
    next: Next<Body>,
) -> Result<Response, AppError> {
    if let Some(auth_header) = headers.get("authorization") {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                match app_state.auth_service.verify_jwt(token) {
                    Ok(claims) => {
                        match app_state.auth_service.get_current_user(&claims.sub, token).await {
                            Ok(user) => {
                                debug!("Authenticated user: {} ({})", user.id, user.email);
                                request.extensions_mut().insert(user);
                            }
                            Err(e) => {
                                warn!("Failed to resolve user from auth service: {}", e);
                            }
                        }
                    }
                    Err(e) => {
                        debug!("JWT verification failed: {}", e);
                    }
                }
            }
        }
    }

    Ok(next.run(request).await)
}
