use std::time::Instant;

use crate::core::{Config, Result};
use crate::db::FloorStorage;

/// 服务器状态 - 持有所有共享资源
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | storage | FloorStorage | redb 存储 (Arc 浅拷贝) |
/// | started_at | Instant | 启动时间 (健康检查用) |
#[derive(Debug, Clone)]
pub struct ServerState {
    pub config: Config,
    pub storage: FloorStorage,
    pub started_at: Instant,
}

impl ServerState {
    pub fn new(config: Config, storage: FloorStorage) -> Self {
        Self {
            config,
            storage,
            started_at: Instant::now(),
        }
    }

    /// 初始化状态：创建工作目录并打开数据库
    pub fn initialize(config: &Config) -> Result<Self> {
        std::fs::create_dir_all(&config.work_dir)?;
        let db_path = config.db_path();
        let storage = FloorStorage::open(&db_path)?;
        tracing::info!(path = %db_path.display(), "Floor storage opened");
        Ok(Self::new(config.clone(), storage))
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
