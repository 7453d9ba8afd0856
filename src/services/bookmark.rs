use crate::{
    error::{AppError, Result},
    models::{bookmark::*, change::ChangeEvent},
    services::{ChangeFeedService, Database},
    utils::validation::{
        validate_bookmark_id, validate_collection_label, validate_title, validate_url_format,
    },
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;
use validator::Validate;

const BOOKMARK_FIELDS: &str =
    "type::string(meta::id(id)) AS id, user_id, title, url, is_favorite, collection, created_at, updated_at";

/// 书签变更网关
///
/// 每个操作都要求已认证的调用者，并在存储层再次按user_id过滤，
/// 防止通过猜测id访问他人记录。写入提交后向变更订阅发布对应事件。
#[derive(Clone)]
pub struct BookmarkService {
    db: Arc<Database>,
    changes: ChangeFeedService,
}

impl BookmarkService {
    pub async fn new(db: Arc<Database>, changes: ChangeFeedService) -> Result<Self> {
        Ok(Self { db, changes })
    }

    /// 创建书签
    ///
    /// 不返回记录：调用方通过订阅事件或下一次快照看到新记录。
    /// create不是幂等的，重复调用会创建多条记录。
    pub async fn create_bookmark(&self, user_id: &str, request: CreateBookmarkRequest) -> Result<()> {
        debug!("Creating bookmark for user: {}", user_id);

        request.validate().map_err(AppError::ValidatorError)?;
        validate_title(&request.title)?;
        validate_url_format(&request.url)?;

        let request = request.normalized();
        let bookmark_id = Uuid::new_v4().simple().to_string();

        let query = r#"
            CREATE type::thing('bookmark', $id) SET
                user_id = $user_id,
                title = $title,
                url = $url,
                is_favorite = false,
                collection = NULL,
                created_at = time::now(),
                updated_at = time::now()
        "#;

        self.db
            .query_with_params(query, json!({
                "id": bookmark_id,
                "user_id": user_id,
                "title": request.title,
                "url": request.url,
            }))
            .await?
            .check()?;

        let created = self
            .fetch_owned(user_id, &bookmark_id)
            .await?
            .ok_or_else(|| AppError::persistence("Failed to create bookmark"))?;

        self.changes.publish(user_id, ChangeEvent::insert(created));

        Ok(())
    }

    /// 获取用户的书签快照，created_at倒序（最新在前）
    pub async fn get_user_bookmarks(&self, user_id: &str) -> Result<Vec<Bookmark>> {
        debug!("Getting bookmarks for user: {}", user_id);

        let query = format!(
            "SELECT {} FROM bookmark WHERE user_id = $user_id ORDER BY created_at DESC",
            BOOKMARK_FIELDS
        );

        let mut response = self
            .db
            .query_with_params(&query, json!({ "user_id": user_id }))
            .await?;

        let bookmarks: Vec<Bookmark> = response.take(0)?;
        Ok(bookmarks)
    }

    /// 删除书签
    ///
    /// not-found与not-owned对调用方不可区分，统一为持久化失败。
    pub async fn delete_bookmark(&self, user_id: &str, bookmark_id: &str) -> Result<()> {
        debug!("Deleting bookmark: {} by user: {}", bookmark_id, user_id);

        validate_bookmark_id(bookmark_id)?;

        let existing = self
            .fetch_owned(user_id, bookmark_id)
            .await?
            .ok_or_else(|| AppError::persistence("Failed to delete bookmark"))?;

        let query = r#"
            DELETE bookmark
            WHERE id = type::thing('bookmark', $id)
            AND user_id = $user_id
        "#;

        self.db
            .query_with_params(query, json!({
                "id": bookmark_id,
                "user_id": user_id,
            }))
            .await?
            .check()?;

        self.changes.publish(user_id, ChangeEvent::delete(existing));

        Ok(())
    }

    /// 设置收藏标记，返回更新后的记录
    pub async fn toggle_favorite(
        &self,
        user_id: &str,
        bookmark_id: &str,
        is_favorite: bool,
    ) -> Result<Bookmark> {
        debug!(
            "Setting favorite = {} on bookmark: {} by user: {}",
            is_favorite, bookmark_id, user_id
        );

        validate_bookmark_id(bookmark_id)?;

        let query = r#"
            UPDATE bookmark SET
                is_favorite = $is_favorite,
                updated_at = time::now()
            WHERE id = type::thing('bookmark', $id)
            AND user_id = $user_id
        "#;

        self.db
            .query_with_params(query, json!({
                "id": bookmark_id,
                "user_id": user_id,
                "is_favorite": is_favorite,
            }))
            .await?
            .check()?;

        let updated = self
            .fetch_owned(user_id, bookmark_id)
            .await?
            .ok_or_else(|| AppError::persistence("Failed to update favorite status"))?;

        self.changes.publish(user_id, ChangeEvent::update(updated.clone()));

        Ok(updated)
    }

    /// 修改书签所属集合，None表示移出集合
    pub async fn update_collection(
        &self,
        user_id: &str,
        bookmark_id: &str,
        request: UpdateCollectionRequest,
    ) -> Result<Bookmark> {
        debug!("Updating collection on bookmark: {} by user: {}", bookmark_id, user_id);

        request.validate().map_err(AppError::ValidatorError)?;
        validate_bookmark_id(bookmark_id)?;

        let query = r#"
            UPDATE bookmark SET
                collection = $collection,
                updated_at = time::now()
            WHERE id = type::thing('bookmark', $id)
            AND user_id = $user_id
        "#;

        self.db
            .query_with_params(query, json!({
                "id": bookmark_id,
                "user_id": user_id,
                "collection": request.collection,
            }))
            .await?
            .check()?;

        let updated = self
            .fetch_owned(user_id, bookmark_id)
            .await?
            .ok_or_else(|| AppError::persistence("Failed to update collection"))?;

        self.changes.publish(user_id, ChangeEvent::update(updated.clone()));

        Ok(updated)
    }

    /// 部分更新title/url/collection，返回更新后的记录
    pub async fn update_bookmark(
        &self,
        user_id: &str,
        bookmark_id: &str,
        request: UpdateBookmarkRequest,
    ) -> Result<Bookmark> {
        debug!("Updating bookmark: {} by user: {}", bookmark_id, user_id);

        request.validate().map_err(AppError::ValidatorError)?;
        validate_bookmark_id(bookmark_id)?;

        // 空patch不落库：不推进updated_at，也不发布回声
        if !request.has_changes() {
            return Err(AppError::validation("At least one field must be provided"));
        }

        if let Some(title) = &request.title {
            validate_title(title)?;
        }
        if let Some(url) = &request.url {
            validate_url_format(url)?;
        }
        // derive无法穿过双层Option，上限在这里手动检查
        if let Some(Some(label)) = &request.collection {
            validate_collection_label(label)?;
        }

        let request = request.normalized();
        let mut assignments = vec!["updated_at = time::now()"];
        let mut params: Value = json!({
            "id": bookmark_id,
            "user_id": user_id,
        });

        if let Some(title) = &request.title {
            assignments.push("title = $title");
            params["title"] = json!(title);
        }
        if let Some(url) = &request.url {
            assignments.push("url = $url");
            params["url"] = json!(url);
        }
        if let Some(collection) = &request.collection {
            assignments.push("collection = $collection");
            params["collection"] = json!(collection);
        }

        let query = format!(
            "UPDATE bookmark SET {} WHERE id = type::thing('bookmark', $id) AND user_id = $user_id",
            assignments.join(", ")
        );

        self.db.query_with_params(&query, params).await?.check()?;

        let updated = self
            .fetch_owned(user_id, bookmark_id)
            .await?
            .ok_or_else(|| AppError::persistence("Failed to update bookmark"))?;

        self.changes.publish(user_id, ChangeEvent::update(updated.clone()));

        Ok(updated)
    }

    /// 按owner过滤读取单条记录，id归一化为纯字符串
    async fn fetch_owned(&self, user_id: &str, bookmark_id: &str) -> Result<Option<Bookmark>> {
        let query = format!(
            "SELECT {} FROM bookmark WHERE id = type::thing('bookmark', $id) AND user_id = $user_id",
            BOOKMARK_FIELDS
        );

        let mut response = self
            .db
            .query_with_params(&query, json!({
                "id": bookmark_id,
                "user_id": user_id,
            }))
            .await?;

        let rows: Vec<Bookmark> = response.take(0)?;
        Ok(rows.into_iter().next())
    }
}
