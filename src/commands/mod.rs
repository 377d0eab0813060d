pub mod delete;
pub mod edit;
pub mod get;
pub mod move_event;
pub mod new;
pub mod show;

use std::sync::Arc;

use anyhow::Result;
use campcal_core::config::CampcalConfig;
use campcal_core::controller::ViewController;
use campcal_core::identity::StaticIdentity;
use campcal_core::store::LocalStore;
use chrono_tz::Tz;
use tracing::debug;

/// Common context for every command, loaded once per invocation.
pub struct AppContext {
    pub config: CampcalConfig,
    pub tz: Tz,
    pub store: Arc<LocalStore>,
}

impl AppContext {
    pub fn load() -> Result<Self> {
        let config = CampcalConfig::load()?;
        let tz = config.tz()?;
        let data_path = config.data_path();
        debug!(data_dir = %data_path.display(), %tz, "loaded config");

        Ok(AppContext {
            tz,
            store: Arc::new(LocalStore::new(data_path)),
            config,
        })
    }

    /// A controller over the event directory, acting as the configured user.
    pub fn controller(&self) -> Result<ViewController<LocalStore>> {
        let identity = StaticIdentity::from(self.config.user_id.clone());
        Ok(ViewController::new(
            self.store.clone(),
            Arc::new(identity),
            self.config.controller_settings()?,
        ))
    }
}

/// Shared error message for writes without a configured user.
pub fn sign_in_hint(err: campcal_core::CampcalError) -> anyhow::Error {
    match err {
        campcal_core::CampcalError::NotAuthenticated => anyhow::anyhow!(
            "No user configured.\n\
            Set user_id in ~/.config/campcal/config.toml or export CAMPCAL_USER_ID"
        ),
        other => other.into(),
    }
}
