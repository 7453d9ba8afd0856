use crate::config::Config;
use crate::error::{AppError, Result};
use serde::Serialize;
use surrealdb::engine::remote::http::{Client, Http};
use surrealdb::opt::auth::Root;
use surrealdb::{Response, Surreal};
use tracing::{error, info};

/// 数据库服务
///
/// 进程启动时构造一次，经由AppState显式传递给需要它的服务。
#[derive(Clone)]
pub struct Database {
    client: Surreal<Client>,
}

impl Database {
    /// 创建新的数据库实例
    pub async fn new(config: &Config) -> Result<Self> {
        info!("Initializing database connection to {}", config.database_url);

        let client = Surreal::new::<Http>(config.database_url.as_str()).await?;

        client
            .signin(Root {
                username: &config.database_username,
                password: &config.database_password,
            })
            .await?;

        client
            .use_ns(&config.database_namespace)
            .use_db(&config.database_name)
            .await?;

        Ok(Self { client })
    }

    /// 验证数据库连接
    pub async fn verify_connection(&self) -> Result<()> {
        match self.client.query("INFO FOR DB").await {
            Ok(_) => {
                info!("Database connection verified successfully");
                Ok(())
            }
            Err(e) => {
                error!("Failed to verify database connection: {}", e);
                Err(AppError::from(e))
            }
        }
    }

    /// 执行带参数的查询
    ///
    /// `params`序列化为对象后逐键绑定。
    pub async fn query_with_params<P>(&self, sql: &str, params: P) -> Result<Response>
    where
        P: Serialize + 'static,
    {
        self.client
            .query(sql)
            .bind(params)
            .await
            .map_err(AppError::from)
    }
}
