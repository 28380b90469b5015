//! Layered configuration for the switchyard dispatcher.
//!
//! Values are merged with `ortho_config` from, in increasing precedence, the
//! built-in defaults, a `switchyard.toml` configuration file (or the file named
//! by `--config-path`), `SWITCHYARD_*` environment variables and command-line
//! flags. The resulting [`Config`] seeds the dispatcher's binding and loading
//! policies and the telemetry subscriber.

mod defaults;
mod options;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use self::defaults::{
    DEFAULT_LOG_FILTER, default_collision_policy, default_extra_parameters, default_log_filter,
    default_log_filter_string, default_log_format,
};
pub use self::options::{CollisionPolicy, ExtraParameterPolicy, LogFormat, OptionParseError};

/// Resolved dispatcher configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "SWITCHYARD")]
pub struct Config {
    /// `tracing` filter expression, for example `info` or `switchyard=debug`.
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Output format of the telemetry subscriber.
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
    /// Treatment of request parameters that no signature declares.
    #[ortho_config(default = default_extra_parameters())]
    pub extra_parameters: ExtraParameterPolicy,
    /// Treatment of an action name defined by more than one loader.
    #[ortho_config(default = default_collision_policy())]
    pub collision_policy: CollisionPolicy,
    /// Print the service description and exit instead of serving requests.
    #[ortho_config(default = false)]
    pub describe: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            extra_parameters: default_extra_parameters(),
            collision_policy: default_collision_policy(),
            describe: false,
        }
    }
}

impl Config {
    /// Filter expression handed to the telemetry subscriber.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Output format of the telemetry subscriber.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Treatment of undeclared request parameters.
    #[must_use]
    pub const fn extra_parameters(&self) -> ExtraParameterPolicy {
        self.extra_parameters
    }

    /// Treatment of duplicate action names across loaders.
    #[must_use]
    pub const fn collision_policy(&self) -> CollisionPolicy {
        self.collision_policy
    }

    /// Whether the binary should print its service description and exit.
    #[must_use]
    pub const fn describe(&self) -> bool {
        self.describe
    }
}
