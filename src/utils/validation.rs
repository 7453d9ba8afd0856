use crate::error::{AppError, Result};
use url::Url;

/// URL验证工具函数
/// 仅接受带scheme和host的绝对URL
pub fn is_valid_url(url: &str) -> bool {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return false;
    }

    match Url::parse(trimmed) {
        Ok(parsed) => parsed.has_host(),
        Err(_) => false,
    }
}

/// 验证URL并返回详细错误信息
pub fn validate_url_format(url: &str) -> Result<()> {
    if url.trim().is_empty() {
        return Err(AppError::Validation("URL is required".to_string()));
    }

    if !is_valid_url(url) {
        return Err(AppError::Validation(
            "Please enter a valid URL (e.g., https://example.com)".to_string(),
        ));
    }

    Ok(())
}

/// 验证书签标题：去除首尾空白后非空
pub fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }

    Ok(())
}

/// 验证集合名长度，与专用端点共用同一上限
pub fn validate_collection_label(label: &str) -> Result<()> {
    if label.chars().count() > 100 {
        return Err(AppError::Validation(
            "Collection name must be 100 characters or fewer".to_string(),
        ));
    }

    Ok(())
}

/// 验证书签ID格式
pub fn validate_bookmark_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(AppError::Validation("Bookmark ID is required".to_string()));
    }

    Ok(())
}
