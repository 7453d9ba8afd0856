//! 客户端同步核心：快照、订阅事件与乐观编辑的归并。

pub mod session;
pub mod view;

pub use session::SyncSession;
pub use view::BookmarkView;
