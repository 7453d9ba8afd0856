use crate::{
    config::Config,
    services::{AuthService, BookmarkService, ChangeFeedService, Database},
};
use std::sync::Arc;

/// 应用程序的共享状态
///
/// 进程启动时构造一次，作为显式上下文传递给路由与中间件，
/// 不使用模块级可变单例。
#[derive(Clone)]
pub struct AppState {
    /// 应用配置
    pub config: Config,

    /// 数据库连接
    pub db: Arc<Database>,

    /// 认证服务
    pub auth_service: AuthService,

    /// 书签变更网关
    pub bookmark_service: BookmarkService,

    /// 变更订阅
    pub change_feed: ChangeFeedService,
}
