//! Order Server - 零售订单生命周期与实时分发引擎
//!
//! # 架构概述
//!
//! - **订单域** (`orders`): transactional intake + the status state machine
//! - **事件总线** (`message`): scoped real-time fan-out over TCP/in-process
//! - **数据库** (`db`): SQLite (WAL) storage with the inventory ledger
//! - **认证** (`auth`): JWT validation at HTTP and bus boundaries
//! - **HTTP API** (`api`): RESTful surface for customers and operators
//!
//! # 模块结构
//!
//! ```text
//! order-server/src/
//! ├── core/          # 配置、状态、服务器
//! ├── auth/          # JWT 认证
//! ├── api/           # HTTP 路由和处理器
//! ├── db/            # 数据库层 (repositories)
//! ├── orders/        # 订单域 (intake + lifecycle)
//! ├── message/       # 事件分发总线
//! └── utils/         # 错误、日志
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod message;
pub mod orders;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtConfig, JwtService};
pub use core::{Config, Server, ServerState, build_router};
pub use message::{EventBus, ScopedReceiver, SubscriberScope};
pub use orders::OrderError;
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

pub fn print_banner() {
    println!(
        r#"
   ____           __
  / __ \_________/ /__  _____
 / / / / ___/ __  / _ \/ ___/
/ /_/ / /  / /_/ /  __/ /
\____/_/   \__,_/\___/_/
   _____
  / ___/___  ______   _____  _____
  \__ \/ _ \/ ___/ | / / _ \/ ___/
 ___/ /  __/ /   | |/ /  __/ /
/____/\___/_/    |___/\___/_/
    "#
    );
}
