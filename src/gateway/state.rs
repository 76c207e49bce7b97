use std::sync::Arc;

use crate::account::{AccountStore, Database};
use crate::auth::TokenService;
use crate::query::BalanceQueryService;
use crate::transfer::TransferEngine;
use crate::websocket::{ConnectionDirectory, NotificationDispatcher};

/// Gateway application state (shared)
#[derive(Clone)]
pub struct AppState {
    /// Executes transfers
    pub engine: Arc<TransferEngine>,
    /// Read-only balance lookups
    pub balances: Arc<BalanceQueryService>,
    /// Online users and their push channels
    pub directory: Arc<ConnectionDirectory>,
    /// JWT verification
    pub tokens: TokenService,
    /// PostgreSQL pool, when the postgres backend is active (health checks)
    pub pg_db: Option<Arc<Database>>,
}

impl AppState {
    /// Wire the services around one account store.
    pub fn new(
        store: Arc<dyn AccountStore>,
        config: &crate::config::AppConfig,
        pg_db: Option<Arc<Database>>,
    ) -> Self {
        let directory = Arc::new(ConnectionDirectory::new());
        let dispatcher = Arc::new(NotificationDispatcher::new(directory.clone()));
        let engine = Arc::new(TransferEngine::new(
            store.clone(),
            dispatcher,
            &config.transfer,
        ));
        let balances = Arc::new(BalanceQueryService::new(
            store,
            config.balance_query.legacy_fallback,
        ));

        Self {
            engine,
            balances,
            directory,
            tokens: TokenService::new(&config.auth.jwt_secret),
            pg_db,
        }
    }
}
