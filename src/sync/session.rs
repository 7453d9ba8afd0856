use crate::models::bookmark::Bookmark;
use crate::services::ChangeSubscription;
use crate::sync::view::BookmarkView;

/// 一个客户端会话的同步循环
///
/// 把初始快照、变更订阅和乐观编辑归并到同一个视图上。视图只被
/// 本会话这一个逻辑任务修改，无需加锁；并发只存在于网络边界的
/// 另一侧。drop会话即撤销订阅，在途的网关调用不会被取消。
pub struct SyncSession {
    view: BookmarkView,
    subscription: ChangeSubscription,
}

impl SyncSession {
    pub fn new(snapshot: Vec<Bookmark>, subscription: ChangeSubscription) -> Self {
        Self {
            view: BookmarkView::from_snapshot(snapshot),
            subscription,
        }
    }

    pub fn view(&self) -> &BookmarkView {
        &self.view
    }

    /// 乐观编辑入口：stage/commit/revert都经由视图
    pub fn view_mut(&mut self) -> &mut BookmarkView {
        &mut self.view
    }

    /// 用新的权威快照重建视图（导航或手动刷新后）
    pub fn reload(&mut self, snapshot: Vec<Bookmark>) {
        self.view.load(snapshot);
    }

    /// 等待下一条订阅事件并应用到视图
    ///
    /// 返回false表示订阅已关闭。落后丢失的事件已在订阅层跳过。
    pub async fn apply_next(&mut self) -> bool {
        match self.subscription.recv().await {
            Some(event) => {
                self.view.apply(&event);
                true
            }
            None => false,
        }
    }

    /// 应用所有已就绪的事件，返回应用条数
    pub fn drain_ready(&mut self) -> usize {
        let mut applied = 0;
        while let Some(event) = self.subscription.try_recv() {
            self.view.apply(&event);
            applied += 1;
        }
        applied
    }
}
