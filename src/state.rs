use std::sync::Arc;

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::auth::{
    jwt::JwtKeys,
    password::{CredentialHasher, PasswordHasher},
    services::AuthService,
};
use crate::config::AppConfig;
use crate::operations::{
    repo::PgOperationStore, services::OperationsService, store::OperationStore,
};
use crate::users::{repo::PgUserStore, services::UsersService, store::UserStore};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
    pub keys: JwtKeys,
    pub auth: AuthService,
    pub users: UsersService,
    pub operations: OperationsService,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        let users = Arc::new(PgUserStore::new(db.clone())) as Arc<dyn UserStore>;
        let operations = Arc::new(PgOperationStore::new(db.clone())) as Arc<dyn OperationStore>;
        Self::from_parts(db, config, users, operations, Arc::new(PasswordHasher::new()))
    }

    pub fn from_parts(
        db: PgPool,
        config: Arc<AppConfig>,
        users: Arc<dyn UserStore>,
        operations: Arc<dyn OperationStore>,
        hasher: Arc<dyn CredentialHasher>,
    ) -> anyhow::Result<Self> {
        let keys = JwtKeys::new(&config.jwt);
        let auth = AuthService::new(users.clone(), hasher, keys.clone())
            .context("prepare auth service")?;
        Ok(Self {
            auth,
            users: UsersService::new(users),
            operations: OperationsService::new(operations),
            db,
            config,
            keys,
        })
    }
}
