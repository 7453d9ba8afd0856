pub mod database;
pub mod auth;
pub mod bookmark;
pub mod changes;

// 重新导出常用类型
pub use database::Database;
pub use auth::AuthService;
pub use bookmark::BookmarkService;
pub use changes::{ChangeFeedService, ChangeSubscription};
