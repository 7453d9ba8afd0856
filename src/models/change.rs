use serde::{Deserialize, Serialize};

use crate::models::bookmark::Bookmark;

/// 变更事件类型，与存储层提交顺序一致地按订阅投递
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// 单条书签的行级变更通知
///
/// INSERT/UPDATE 携带 `new`，DELETE 携带删除前的 `old`。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub event_type: ChangeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new: Option<Bookmark>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old: Option<Bookmark>,
}

impl ChangeEvent {
    pub fn insert(record: Bookmark) -> Self {
        Self {
            event_type: ChangeKind::Insert,
            new: Some(record),
            old: None,
        }
    }

    pub fn update(record: Bookmark) -> Self {
        Self {
            event_type: ChangeKind::Update,
            new: Some(record),
            old: None,
        }
    }

    pub fn delete(record: Bookmark) -> Self {
        Self {
            event_type: ChangeKind::Delete,
            new: None,
            old: Some(record),
        }
    }

    /// 事件涉及的记录ID
    pub fn record_id(&self) -> Option<&str> {
        self.new
            .as_ref()
            .or(self.old.as_ref())
            .map(|record| record.id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample(id: &str) -> Bookmark {
        Bookmark {
            id: id.to_string(),
            user_id: "user-1".to_string(),
            title: "Example".to_string(),
            url: "https://example.com".to_string(),
            is_favorite: false,
            collection: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_event_wire_format() {
        let event = ChangeEvent::insert(sample("bm-1"));
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["event_type"], "INSERT");
        assert_eq!(json["new"]["id"], "bm-1");
        assert!(json.get("old").is_none());
    }

    #[test]
    fn test_delete_carries_old_record() {
        let event = ChangeEvent::delete(sample("bm-2"));

        assert_eq!(event.event_type, ChangeKind::Delete);
        assert_eq!(event.record_id(), Some("bm-2"));
        assert!(event.new.is_none());
    }
}
