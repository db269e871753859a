// GKE cleaner backend library
// Экспортируем публичные модули для использования в тестах

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use std::sync::Arc;

pub use auth::AuthService;
pub use config::Config;
pub use error::{Error, Result};

use services::ClusterStore;

// Основная структура состояния приложения
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub auth_service: AuthService,
    pub cluster_store: Arc<dyn ClusterStore>,
}
