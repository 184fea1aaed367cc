use std::ffi::OsString;
use std::path::PathBuf;
use tracing::info;

use crate::analytic::AnalyticEphemeris;
use crate::ephemeris::{EphemerisBackend, EphemerisError, FixedEphemeris};

/// Environment variable naming a snapshot file for [`FixedEphemeris`].
pub const SNAPSHOT_ENV: &str = "AZTRO_EPHEMERIS_SNAPSHOT";

/// Which ephemeris backend to cast charts with.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BackendConfig {
    #[default]
    Analytic,
    Snapshot(PathBuf),
}

impl BackendConfig {
    /// Reads [`SNAPSHOT_ENV`]; an unset or empty variable selects the analytic backend.
    pub fn from_env() -> Self {
        BackendConfig::resolve(None, std::env::var_os(SNAPSHOT_ENV))
    }

    /// An explicit path wins over the environment value.
    pub fn resolve(explicit: Option<PathBuf>, env_value: Option<OsString>) -> Self {
        explicit
            .or_else(|| env_value.map(PathBuf::from))
            .filter(|path| !path.as_os_str().is_empty())
            .map_or(BackendConfig::Analytic, BackendConfig::Snapshot)
    }

    pub fn build(&self) -> Result<Box<dyn EphemerisBackend>, EphemerisError> {
        match self {
            BackendConfig::Analytic => {
                info!("using analytic ephemeris");
                Ok(Box::new(AnalyticEphemeris::new()))
            }
            BackendConfig::Snapshot(path) => {
                info!(path = %path.display(), "loading ephemeris snapshot");
                Ok(Box::new(FixedEphemeris::from_path(path)?))
            }
        }
    }
}
