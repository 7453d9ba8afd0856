use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub url: String,
    pub is_favorite: bool,
    pub collection: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateBookmarkRequest {
    #[validate(length(max = 500))]
    pub title: String,
    #[validate(length(max = 2048))]
    pub url: String,
}

/// 部分更新：未提供的字段保持不变
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateBookmarkRequest {
    #[validate(length(max = 500))]
    pub title: Option<String>,
    #[validate(length(max = 2048))]
    pub url: Option<String>,
    // 双层Option：缺省=不修改，null=移出集合
    #[serde(default, with = "crate::utils::serde_helpers::double_option")]
    pub collection: Option<Option<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleFavoriteRequest {
    pub is_favorite: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateCollectionRequest {
    #[validate(length(max = 100))]
    pub collection: Option<String>,
}

impl CreateBookmarkRequest {
    /// 存储形式：title与url去除首尾空白
    pub fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.url = self.url.trim().to_string();
        self
    }
}

impl UpdateBookmarkRequest {
    /// 存储形式：提供的title/url去除首尾空白，缺省字段保持缺省
    pub fn normalized(mut self) -> Self {
        self.title = self.title.map(|t| t.trim().to_string());
        self.url = self.url.map(|u| u.trim().to_string());
        self
    }

    /// 是否至少指定了一个待修改字段
    pub fn has_changes(&self) -> bool {
        self.title.is_some() || self.url.is_some() || self.collection.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_normalized_trims_title_and_url() {
        let request = CreateBookmarkRequest {
            title: "  Example  ".to_string(),
            url: "\thttps://example.com \n".to_string(),
        }
        .normalized();

        assert_eq!(request.title, "Example");
        assert_eq!(request.url, "https://example.com");
    }

    #[test]
    fn test_update_request_normalized_trims_provided_fields_only() {
        let request: UpdateBookmarkRequest =
            serde_json::from_str(r#"{"title": "  New title  ", "url": " https://example.com "}"#)
                .unwrap();
        let request = request.normalized();

        assert_eq!(request.title.as_deref(), Some("New title"));
        assert_eq!(request.url.as_deref(), Some("https://example.com"));
        assert!(request.collection.is_none());
    }

    #[test]
    fn test_update_request_without_fields_has_no_changes() {
        let empty: UpdateBookmarkRequest = serde_json::from_str("{}").unwrap();
        assert!(!empty.has_changes());

        // 显式null是一次修改（移出集合）
        let clear: UpdateBookmarkRequest =
            serde_json::from_str(r#"{"collection": null}"#).unwrap();
        assert!(clear.has_changes());
    }
}
