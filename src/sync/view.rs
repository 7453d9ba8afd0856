use crate::models::{
    bookmark::Bookmark,
    change::{ChangeEvent, ChangeKind},
};
use std::collections::HashMap;
use tracing::debug;

/// 一个会话持有的书签视图
///
/// 有序内存序列，加载快照时整体替换（最新在前），此后只做增量修补：
/// 订阅事件与本地乐观编辑。更新不重排序，只有加载和插入决定顺序。
///
/// 乐观编辑（删除、收藏切换）先行生效并登记到pending表；网关失败时
/// 回滚，但若订阅回声已确认同一变更，回滚退化为no-op，不会把后端
/// 已删除的记录复活（见revert_delete/revert_favorite）。
#[derive(Debug, Default)]
pub struct BookmarkView {
    items: Vec<Bookmark>,
    pending_deletes: HashMap<String, PendingDelete>,
    pending_favorites: HashMap<String, PendingFavorite>,
}

#[derive(Debug)]
struct PendingDelete {
    index: usize,
    record: Bookmark,
}

#[derive(Debug)]
struct PendingFavorite {
    previous: bool,
    target: bool,
}

impl BookmarkView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: Vec<Bookmark>) -> Self {
        Self {
            items: snapshot,
            pending_deletes: HashMap::new(),
            pending_favorites: HashMap::new(),
        }
    }

    /// 用新的权威快照整体替换视图，未决的乐观编辑一并失效
    pub fn load(&mut self, snapshot: Vec<Bookmark>) {
        self.items = snapshot;
        self.pending_deletes.clear();
        self.pending_favorites.clear();
    }

    pub fn items(&self) -> &[Bookmark] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Bookmark> {
        self.items.iter().find(|b| b.id == id)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|b| b.id == id)
    }

    /// 应用一条订阅事件
    pub fn apply(&mut self, event: &ChangeEvent) {
        match event.event_type {
            ChangeKind::Insert => {
                if let Some(record) = &event.new {
                    // 外部驱动的插入前插，序列其余部分不重排
                    self.items.insert(0, record.clone());
                }
            }
            ChangeKind::Update => {
                if let Some(record) = &event.new {
                    // 记录不在本地视图中时事件是no-op：该记录要等到
                    // 下一次全量加载才会出现，这是已接受的空隙
                    if let Some(index) = self.position(&record.id) {
                        self.items[index] = record.clone();
                    }

                    // 回声确认了未决的收藏切换
                    if let Some(pending) = self.pending_favorites.get(&record.id) {
                        if record.is_favorite == pending.target {
                            self.pending_favorites.remove(&record.id);
                        }
                    }
                }
            }
            ChangeKind::Delete => {
                if let Some(record) = &event.old {
                    if let Some(index) = self.position(&record.id) {
                        self.items.remove(index);
                    }

                    // 回声确认了未决的乐观删除，之后的回滚不再复活记录
                    if self.pending_deletes.remove(&record.id).is_some() {
                        debug!("Optimistic delete of {} confirmed by feed event", record.id);
                    }
                }
            }
        }
    }

    /// 乐观删除：立即从视图移除并登记原位置，等待网关结果
    ///
    /// 返回false表示记录不在视图中，调用方不应发起删除。
    pub fn stage_delete(&mut self, id: &str) -> bool {
        match self.position(id) {
            Some(index) => {
                let record = self.items.remove(index);
                self.pending_deletes.insert(id.to_string(), PendingDelete { index, record });
                true
            }
            None => false,
        }
    }

    /// 网关删除成功，撤销登记，移除保持生效
    pub fn commit_delete(&mut self, id: &str) {
        self.pending_deletes.remove(id);
    }

    /// 网关删除失败，恢复记录到原位置
    ///
    /// 若删除回声已先行确认（登记已清除），这里是no-op。
    pub fn revert_delete(&mut self, id: &str) -> bool {
        match self.pending_deletes.remove(id) {
            Some(pending) => {
                let index = pending.index.min(self.items.len());
                self.items.insert(index, pending.record);
                true
            }
            None => false,
        }
    }

    /// 乐观收藏切换：立即翻转标记并登记翻转前的值
    pub fn stage_favorite(&mut self, id: &str, target: bool) -> bool {
        match self.position(id) {
            Some(index) => {
                let previous = self.items[index].is_favorite;
                self.items[index].is_favorite = target;
                self.pending_favorites
                    .insert(id.to_string(), PendingFavorite { previous, target });
                true
            }
            None => false,
        }
    }

    /// 网关确认收藏状态，撤销登记
    pub fn commit_favorite(&mut self, id: &str) {
        self.pending_favorites.remove(id);
    }

    /// 网关失败后回滚收藏标记
    ///
    /// 仅当记录当前值仍是乐观写入的值时才恢复：若期间有事件把它
    /// 改成了别的值，以事件为准，不再覆盖。
    pub fn revert_favorite(&mut self, id: &str) -> bool {
        match self.pending_favorites.remove(id) {
            Some(pending) => {
                if let Some(index) = self.position(id) {
                    if self.items[index].is_favorite == pending.target {
                        self.items[index].is_favorite = pending.previous;
                        return true;
                    }
                }
                false
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn bookmark(id: &str, title: &str) -> Bookmark {
        Bookmark {
            id: id.to_string(),
            user_id: "user-1".to_string(),
            title: title.to_string(),
            url: "https://example.com".to_string(),
            is_favorite: false,
            collection: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn ids(view: &BookmarkView) -> Vec<&str> {
        view.items().iter().map(|b| b.id.as_str()).collect()
    }

    #[test]
    fn test_load_replaces_wholesale() {
        let mut view = BookmarkView::from_snapshot(vec![bookmark("1", "A")]);
        view.stage_delete("1");

        view.load(vec![bookmark("2", "B"), bookmark("3", "C")]);

        assert_eq!(ids(&view), vec!["2", "3"]);
        // 旧的未决编辑随快照替换一并失效
        assert!(!view.revert_delete("1"));
    }

    #[test]
    fn test_insert_prepends() {
        let mut view = BookmarkView::from_snapshot(vec![bookmark("1", "A")]);

        view.apply(&ChangeEvent::insert(bookmark("2", "B")));

        assert_eq!(ids(&view), vec!["2", "1"]);
    }

    #[test]
    fn test_update_replaces_in_place() {
        let mut view =
            BookmarkView::from_snapshot(vec![bookmark("1", "A"), bookmark("2", "B")]);

        let mut updated = bookmark("2", "B2");
        updated.is_favorite = true;
        view.apply(&ChangeEvent::update(updated));

        assert_eq!(ids(&view), vec!["1", "2"]);
        assert_eq!(view.get("2").unwrap().title, "B2");
        assert!(view.get("2").unwrap().is_favorite);
    }

    #[test]
    fn test_insert_then_update_converges_but_reverse_does_not() {
        // 正序：insert后update，收敛到update的内容
        let mut view = BookmarkView::new();
        view.apply(&ChangeEvent::insert(bookmark("x", "first")));
        view.apply(&ChangeEvent::update(bookmark("x", "second")));
        assert_eq!(view.get("x").unwrap().title, "second");

        // 逆序：update先到时记录不在视图中，是no-op，随后的insert
        // 留下的是旧内容——顺序在这里是有意义的
        let mut view = BookmarkView::new();
        view.apply(&ChangeEvent::update(bookmark("x", "second")));
        assert!(view.is_empty());
        view.apply(&ChangeEvent::insert(bookmark("x", "first")));
        assert_eq!(view.get("x").unwrap().title, "first");
    }

    #[test]
    fn test_delete_absent_is_noop() {
        let mut view = BookmarkView::from_snapshot(vec![bookmark("1", "A")]);

        view.apply(&ChangeEvent::delete(bookmark("99", "ghost")));

        assert_eq!(view.len(), 1);
    }

    #[test]
    fn test_optimistic_delete_then_gateway_failure_reverts() {
        let mut view = BookmarkView::from_snapshot(vec![bookmark("1", "A")]);

        assert!(view.stage_delete("1"));
        assert!(view.is_empty());

        // 网关调用失败
        assert!(view.revert_delete("1"));
        assert_eq!(view.len(), 1);
        assert_eq!(view.get("1").unwrap().title, "A");
    }

    #[test]
    fn test_revert_restores_original_position() {
        let mut view = BookmarkView::from_snapshot(vec![
            bookmark("1", "A"),
            bookmark("2", "B"),
            bookmark("3", "C"),
        ]);

        view.stage_delete("2");
        assert_eq!(ids(&view), vec!["1", "3"]);

        view.revert_delete("2");
        assert_eq!(ids(&view), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_confirmed_delete_is_not_resurrected_by_late_revert() {
        let mut view = BookmarkView::from_snapshot(vec![bookmark("1", "A")]);

        view.stage_delete("1");
        // 订阅回声先于网关响应到达，确认删除
        view.apply(&ChangeEvent::delete(bookmark("1", "A")));

        // 之后网关报告失败：不能把后端已删除的记录复活
        assert!(!view.revert_delete("1"));
        assert!(view.is_empty());
    }

    #[test]
    fn test_toggle_twice_returns_to_original() {
        let mut view = BookmarkView::from_snapshot(vec![bookmark("1", "A")]);

        assert!(view.stage_favorite("1", true));
        // 中间状态可观察到相反的值
        assert!(view.get("1").unwrap().is_favorite);
        view.commit_favorite("1");

        assert!(view.stage_favorite("1", false));
        view.commit_favorite("1");

        assert!(!view.get("1").unwrap().is_favorite);
    }

    #[test]
    fn test_favorite_revert_after_gateway_failure() {
        let mut view = BookmarkView::from_snapshot(vec![bookmark("1", "A")]);

        view.stage_favorite("1", true);
        assert!(view.revert_favorite("1"));
        assert!(!view.get("1").unwrap().is_favorite);
    }

    #[test]
    fn test_favorite_revert_skipped_when_echo_confirmed() {
        let mut view = BookmarkView::from_snapshot(vec![bookmark("1", "A")]);

        view.stage_favorite("1", true);

        let mut echoed = bookmark("1", "A");
        echoed.is_favorite = true;
        view.apply(&ChangeEvent::update(echoed));

        // 回声已确认目标值，迟到的回滚不再翻转
        assert!(!view.revert_favorite("1"));
        assert!(view.get("1").unwrap().is_favorite);
    }

    #[test]
    fn test_favorite_revert_skipped_when_superseded() {
        let mut view = BookmarkView::from_snapshot(vec![bookmark("1", "A")]);

        view.stage_favorite("1", true);

        // 另一会话的更新把标记改回false（last-write-wins）
        let foreign = bookmark("1", "A");
        view.apply(&ChangeEvent::update(foreign));

        // 当前值已不是乐观写入的值，回滚不覆盖
        assert!(!view.revert_favorite("1"));
        assert!(!view.get("1").unwrap().is_favorite);
    }

    #[test]
    fn test_update_for_unknown_record_is_noop() {
        let mut view = BookmarkView::from_snapshot(vec![bookmark("1", "A")]);

        view.apply(&ChangeEvent::update(bookmark("99", "ghost")));

        assert_eq!(view.len(), 1);
        assert!(view.get("99").is_none());
    }

    #[test]
    fn test_ordering_not_resorted_on_update() {
        let old = Utc::now() - Duration::hours(1);
        let mut first = bookmark("1", "A");
        first.created_at = old;
        let second = bookmark("2", "B");

        let mut view = BookmarkView::from_snapshot(vec![second, first]);

        // 更新最旧的记录不会把它移到前面
        let mut updated = bookmark("1", "A+");
        updated.created_at = old;
        view.apply(&ChangeEvent::update(updated));

        assert_eq!(ids(&view), vec!["2", "1"]);
    }
}
