use crate::auth::{
    memory::MemoryUserStore,
    repo::{PgUserStore, UserStore},
    services::AuthService,
};
use crate::config::AppConfig;
use anyhow::Context;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: Arc<AuthService>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let store: Arc<dyn UserStore> = match &config.database_url {
            Some(url) => {
                let db = sqlx::postgres::PgPoolOptions::new()
                    .max_connections(10)
                    .connect(url)
                    .await
                    .context("connect to database")?;
                sqlx::migrate!("./migrations")
                    .run(&db)
                    .await
                    .context("run migrations")?;
                Arc::new(PgUserStore::new(db))
            }
            None => {
                tracing::warn!("DATABASE_URL not set; users are kept in memory");
                Arc::new(MemoryUserStore::new())
            }
        };

        Ok(Self::from_parts(config, store))
    }

    pub fn from_parts(config: Arc<AppConfig>, store: Arc<dyn UserStore>) -> Self {
        let auth = Arc::new(AuthService::new(
            store,
            config.jwt.secret.as_bytes(),
            config.jwt.ttl(),
        ));
        Self { config, auth }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        let config = Arc::new(AppConfig {
            database_url: None,
            bind_addr: ([127, 0, 0, 1], 0).into(),
            jwt: crate::config::JwtConfig {
                secret: "test".into(),
                ttl_minutes: 5,
            },
        });
        Self::from_parts(config, Arc::new(MemoryUserStore::new()))
    }
}
