use std::sync::Arc;

use sqlx::SqlitePool;

use shared::event::OrderEvent;

use crate::auth::JwtService;
use crate::core::Config;
use crate::db::DbService;
use crate::message::{BusConfig, EventBus};

/// 服务器状态 - 持有所有服务的单例引用
///
/// ServerState 持有所有服务的共享引用，使用 Arc 实现浅拷贝。
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | db | SqlitePool | SQLite 连接池 |
/// | bus | Arc<EventBus> | 事件分发总线 |
/// | jwt_service | Arc<JwtService> | JWT 认证服务 |
#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// SQLite 连接池
    pub db: SqlitePool,
    /// 事件分发总线
    pub bus: Arc<EventBus>,
    /// JWT 认证服务 (Arc 共享所有权)
    pub jwt_service: Arc<JwtService>,
}

impl ServerState {
    pub fn new(
        config: Config,
        db: SqlitePool,
        bus: Arc<EventBus>,
        jwt_service: Arc<JwtService>,
    ) -> Self {
        Self {
            config,
            db,
            bus,
            jwt_service,
        }
    }

    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录结构
    /// 2. 数据库 (work_dir/database/orders.db) + 迁移
    /// 3. 事件总线和 JWT 服务
    ///
    /// # Panics
    ///
    /// 数据库初始化失败时 panic
    pub async fn initialize(config: &Config) -> Self {
        config
            .ensure_work_dir_structure()
            .expect("Failed to create work directory structure");

        let db_path = config.database_dir().join("orders.db");
        let db_path_str = db_path.to_string_lossy();

        let db_service = DbService::new(&db_path_str)
            .await
            .expect("Failed to initialize database");

        let bus = Arc::new(EventBus::from_config(BusConfig {
            listen_addr: config.bus_listen_addr(),
            channel_capacity: config.bus_channel_capacity,
        }));
        let jwt_service = Arc::new(JwtService::new(config.jwt.clone()));

        Self::new(config.clone(), db_service.pool, bus, jwt_service)
    }

    /// 获取 JWT 服务
    pub fn jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }

    /// 获取事件总线
    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// Publish an order lifecycle event.
    ///
    /// Callers invoke this synchronously, immediately after their commit,
    /// on the same task — that is the whole per-order ordering guarantee,
    /// so no queue may ever be inserted here.
    pub fn publish_event(&self, event: OrderEvent) {
        self.bus.publish(event);
    }
}
