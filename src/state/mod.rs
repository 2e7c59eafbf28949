pub mod export;
mod game;
mod player;
mod round;
mod score;

pub use crate::machine::{AdvanceOutcome, AdvanceReport};

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::{Arc, Mutex};

use crate::auth::{AdminVerifier, AuthConfig};
use crate::config::ServerConfig;
use crate::error::{GameError, GameResult};
use crate::store::{GameStore, MemoryStore};
use crate::types::Game;

/// Current wall-clock time in epoch milliseconds
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn GameStore>,
    /// Login credentials and admin identity
    pub auth: Arc<AuthConfig>,
    /// Decides admin-only access for sockets and HTTP routes
    pub verifier: Arc<dyn AdminVerifier>,
    pub config: Arc<ServerConfig>,
    /// Source for PINs and round sampling
    rng: Arc<Mutex<StdRng>>,
}

impl AppState {
    pub fn new(config: ServerConfig, auth: AuthConfig) -> Self {
        Self::with_store(Arc::new(MemoryStore::new()), config, auth)
    }

    pub fn with_store(store: Arc<dyn GameStore>, config: ServerConfig, auth: AuthConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => {
                tracing::info!("Using fixed game seed {}", seed);
                StdRng::seed_from_u64(seed)
            }
            None => StdRng::from_os_rng(),
        };
        let auth = Arc::new(auth);
        Self {
            store,
            verifier: auth.clone(),
            auth,
            config: Arc::new(config),
            rng: Arc::new(Mutex::new(rng)),
        }
    }

    /// Swap the admin check, e.g. for an external identity provider
    pub fn with_verifier(mut self, verifier: Arc<dyn AdminVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    pub fn verify_admin(&self, token: &str) -> bool {
        self.verifier.verify_admin(token)
    }

    /// Run `f` with exclusive access to the random source
    pub(crate) fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> GameResult<T> {
        let mut rng = self.rng.lock().map_err(|_| {
            tracing::error!("Random source lock poisoned");
            GameError::StoreUnavailable
        })?;
        Ok(f(&mut rng))
    }

    /// Get a live game or fail with `GameNotFound`
    pub async fn get_game(&self, pin: &str) -> GameResult<Game> {
        self.store
            .get(pin)
            .await?
            .ok_or_else(|| GameError::GameNotFound(pin.to_string()))
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ServerConfig::default(), AuthConfig::disabled())
    }
}
