use crate::models::change::ChangeEvent;
use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// 变更订阅管理器
///
/// 每个用户一条broadcast通道，按需创建、无人订阅时回收。
/// 订阅不可重放：断线后重新订阅得到的是全新通道，断开窗口内
/// 的事件静默丢失，只能靠下一次全量快照纠正。
#[derive(Clone)]
pub struct ChangeFeedService {
    // 用户到通道的映射
    senders: Arc<RwLock<HashMap<String, broadcast::Sender<ChangeEvent>>>>,
    capacity: usize,
}

/// 单个会话持有的订阅句柄，drop即退订
pub struct ChangeSubscription {
    user_id: String,
    receiver: broadcast::Receiver<ChangeEvent>,
}

impl ChangeFeedService {
    pub fn new(capacity: usize) -> Self {
        Self {
            senders: Arc::new(RwLock::new(HashMap::new())),
            capacity,
        }
    }

    /// 为一个用户的会话建立订阅，仅投递该用户记录的事件
    pub fn subscribe(&self, user_id: &str) -> ChangeSubscription {
        let mut senders = self.senders.write().unwrap();
        let sender = senders
            .entry(user_id.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0);

        debug!("New change subscription for user: {}", user_id);

        ChangeSubscription {
            user_id: user_id.to_string(),
            receiver: sender.subscribe(),
        }
    }

    /// 向一个用户的所有活跃订阅投递事件
    ///
    /// 没有订阅者时事件被丢弃，与不可重放语义一致。
    pub fn publish(&self, user_id: &str, event: ChangeEvent) {
        let mut senders = self.senders.write().unwrap();

        let stale = match senders.get(user_id) {
            Some(sender) if sender.receiver_count() > 0 => match sender.send(event) {
                Ok(delivered) => {
                    debug!("Change event delivered to {} subscription(s) for user: {}", delivered, user_id);
                    false
                }
                // 所有接收端在检查后恰好关闭
                Err(_) => true,
            },
            Some(_) => true,
            None => false,
        };

        if stale {
            senders.remove(user_id);
        }
    }

    /// 当前持有活跃通道的用户数
    pub fn active_user_count(&self) -> usize {
        self.senders.read().unwrap().len()
    }
}

impl ChangeSubscription {
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// 等待下一条事件
    ///
    /// 落后于通道容量的订阅会丢失被挤出的事件：记一条警告后
    /// 继续消费后续事件，不做补偿。
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(
                        "Change subscription for user {} lagged, {} event(s) lost",
                        self.user_id, missed
                    );
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// 非阻塞地取一条已就绪的事件
    pub fn try_recv(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(missed)) => {
                    warn!(
                        "Change subscription for user {} lagged, {} event(s) lost",
                        self.user_id, missed
                    );
                }
                Err(_) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::bookmark::Bookmark;
    use chrono::Utc;

    fn sample(id: &str, user_id: &str) -> Bookmark {
        Bookmark {
            id: id.to_string(),
            user_id: user_id.to_string(),
            title: "Example".to_string(),
            url: "https://example.com".to_string(),
            is_favorite: false,
            collection: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_events_scoped_to_subscribing_user() {
        let feed = ChangeFeedService::new(16);
        let mut alice = feed.subscribe("alice");
        let mut bob = feed.subscribe("bob");

        feed.publish("alice", ChangeEvent::insert(sample("bm-1", "alice")));

        let event = alice.recv().await.unwrap();
        assert_eq!(event.record_id(), Some("bm-1"));
        assert!(bob.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_dropped() {
        let feed = ChangeFeedService::new(16);

        // 不应panic，事件直接丢弃
        feed.publish("nobody", ChangeEvent::insert(sample("bm-1", "nobody")));

        let mut late = feed.subscribe("nobody");
        assert!(late.try_recv().is_none(), "no replay for late subscribers");
    }

    #[tokio::test]
    async fn test_lagged_subscription_drops_events_silently() {
        let feed = ChangeFeedService::new(2);
        let mut sub = feed.subscribe("alice");

        for i in 0..5 {
            feed.publish("alice", ChangeEvent::insert(sample(&format!("bm-{}", i), "alice")));
        }

        // 容量为2：只有最后两条存活，较早的静默丢失
        assert_eq!(sub.recv().await.unwrap().record_id(), Some("bm-3"));
        assert_eq!(sub.recv().await.unwrap().record_id(), Some("bm-4"));
        assert!(sub.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_channel_reclaimed_after_unsubscribe() {
        let feed = ChangeFeedService::new(16);
        let sub = feed.subscribe("alice");
        assert_eq!(feed.active_user_count(), 1);

        drop(sub);
        feed.publish("alice", ChangeEvent::insert(sample("bm-1", "alice")));
        assert_eq!(feed.active_user_count(), 0);
    }
}
