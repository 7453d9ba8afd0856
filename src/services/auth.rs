use crate::{config::Config, error::{AppError, Result}};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

#[derive(Clone)]
pub struct AuthService {
    config: Config,
    http_client: Client,
    user_cache: Arc<RwLock<HashMap<String, CachedUser>>>,
}

#[derive(Debug, Clone)]
struct CachedUser {
    user: User,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,        // 用户ID
    pub exp: i64,           // 过期时间
    pub iat: i64,           // 签发时间
    pub session_id: Option<String>, // 会话ID
    pub email: Option<String>,      // 邮箱
}

/// 当前会话的用户，所有书签查询与写入都以其id为作用域
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AuthUserResponse {
    id: String,
    email: String,
    display_name: Option<String>,
    created_at: String,
}

impl AuthService {
    pub async fn new(config: &Config) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::ExternalService(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config: config.clone(),
            http_client,
            user_cache: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    pub fn verify_jwt(&self, token: &str) -> Result<Claims> {
        let decoding_key = DecodingKey::from_secret(self.config.jwt_secret.as_ref());
        let validation = Validation::new(Algorithm::HS256);

        match decode::<Claims>(token, &decoding_key, &validation) {
            Ok(token_data) => {
                debug!("JWT token verified for user: {}", token_data.claims.sub);
                Ok(token_data.claims)
            }
            Err(e) => {
                warn!("JWT verification failed: {}", e);
                Err(AppError::Authentication("Invalid token".to_string()))
            }
        }
    }

    /// 获取当前认证用户，要求稳定非空的用户id
    pub async fn get_current_user(&self, user_id: &str, token: &str) -> Result<User> {
        // 检查缓存
        if let Some(cached_user) = self.get_cached_user(user_id).await {
            debug!("Using cached user data for user: {}", user_id);
            return Ok(cached_user);
        }

        let url = format!("{}/api/users/me", self.config.auth_service_url);

        let response = self.http_client
            .get(&url)
            .header("Authorization", format!("Bearer {}", token))
            .send()
            .await
            .map_err(|e| {
                error!("Failed to fetch user from auth service: {}", e);
                AppError::ExternalService("Failed to verify user with auth service".to_string())
            })?;

        if !response.status().is_success() {
            warn!("Auth service returned error status: {}", response.status());
            return Err(AppError::Authentication("Invalid credentials".to_string()));
        }

        let user_data: AuthUserResponse = response.json().await
            .map_err(|e| {
                error!("Failed to parse auth service response: {}", e);
                AppError::Authentication("Invalid response from auth service".to_string())
            })?;

        if user_data.id.trim().is_empty() {
            return Err(AppError::Authentication("Auth service returned empty user id".to_string()));
        }

        let user = User {
            id: user_data.id.clone(),
            email: user_data.email,
            display_name: user_data.display_name,
            created_at: chrono::DateTime::parse_from_rfc3339(&user_data.created_at)
                .unwrap_or_else(|_| Utc::now().into())
                .with_timezone(&Utc),
        };

        self.cache_user(&user_data.id, user.clone()).await;

        Ok(user)
    }

    async fn get_cached_user(&self, user_id: &str) -> Option<User> {
        let cache = self.user_cache.read().await;
        if let Some(cached) = cache.get(user_id) {
            if cached.expires_at > Utc::now() {
                return Some(cached.user.clone());
            }
        }
        None
    }

    async fn cache_user(&self, user_id: &str, user: User) {
        let mut cache = self.user_cache.write().await;
        cache.insert(user_id.to_string(), CachedUser {
            user,
            expires_at: Utc::now() + Duration::minutes(15), // 缓存15分钟
        });
    }

    // 清理过期缓存
    pub async fn cleanup_expired_sessions(&self) -> Result<()> {
        let now = Utc::now();

        let mut user_cache = self.user_cache.write().await;
        let before_count = user_cache.len();
        user_cache.retain(|_, cached| cached.expires_at > now);
        debug!("Cleaned {} expired user cache entries", before_count - user_cache.len());

        Ok(())
    }
}

/// 必须认证的提取器：会话缺失时返回Unauthorized
pub struct CurrentUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        parts
            .extensions
            .get::<User>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| AppError::Authentication("You must be logged in".to_string()))
    }
}
