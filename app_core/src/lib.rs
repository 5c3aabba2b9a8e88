// contains core functionality

mod alias_resolution;
mod auth;
mod config;
mod errors;
mod locks;
mod merge;
mod pending_store;
mod pending_tournament;
mod player;
mod ports;
mod ranking;
mod rating;
mod region;
mod registry;
mod skill;
mod tournament;
pub mod utils;

pub use alias_resolution::*;
pub use auth::*;
pub use config::*;
pub use errors::*;
pub use merge::*;
pub use pending_tournament::*;
pub use player::*;
pub use ports::*;
pub use ranking::*;
pub use rating::*;
pub use region::*;
pub use registry::*;
pub use skill::*;
pub use tournament::*;

use crate::locks::OpLocks;
use std::sync::Arc;

/// Core provides the identity-and-ranking engine of the service:
/// - player registry (create, edit, alias lookup, similar-alias search)
/// - pending tournament lifecycle (scrape, map aliases, finalize)
/// - identity merge engine (apply and undo merges across tournaments)
/// - ranking pipeline (skill replay, activity filter, leaderboard persist)
/// - authentication and region-scoped authorization
///
/// Core holds the connection to the database port plus the immutable
/// process configuration. Exclusive sections (ranking generation, merges,
/// finalization) are serialized through per-key async mutexes.
pub struct Core {
    pub config: AppConfig,
    pub database: Arc<dyn DatabasePort>,
    pub(crate) locks: OpLocks,
}

pub struct NoDb {}
pub struct NoConfig {}

pub struct DynDb(Arc<dyn DatabasePort>);
pub struct SetConfig(AppConfig);

/// Typestate builder: a Core can only be built once both the database port
/// and the configuration have been provided.
pub struct CoreBuilder<DB, CFG> {
    state_db: DB,
    state_config: CFG,
}

impl CoreBuilder<NoDb, NoConfig> {
    pub fn new() -> Self {
        CoreBuilder {
            state_db: NoDb {},
            state_config: NoConfig {},
        }
    }
}

impl Default for CoreBuilder<NoDb, NoConfig> {
    fn default() -> Self {
        Self::new()
    }
}

impl<DB, CFG> CoreBuilder<DB, CFG> {
    pub fn set_db(self, database: Arc<dyn DatabasePort>) -> CoreBuilder<DynDb, CFG> {
        CoreBuilder {
            state_db: DynDb(database),
            state_config: self.state_config,
        }
    }

    pub fn set_config(self, config: AppConfig) -> CoreBuilder<DB, SetConfig> {
        CoreBuilder {
            state_db: self.state_db,
            state_config: SetConfig(config),
        }
    }
}

impl CoreBuilder<DynDb, SetConfig> {
    pub fn build(self) -> Core {
        Core {
            config: self.state_config.0,
            database: self.state_db.0,
            locks: OpLocks::new(),
        }
    }
}
