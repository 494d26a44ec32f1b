use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Sizing hints for a [`Condition`](crate::Condition).
///
/// Both values only affect how often memory is reallocated, never what a
/// condition matches.
///
///   env var:   UNIT_PEEK_FILTER_CAPACITY=4
///              UNIT_PEEK_BUFFER_SIZE=65536
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionConfig {
    /// Filters to reserve room for up front.
    #[serde(default = "default_filter_capacity")]
    pub filter_capacity: usize,
    /// Initial dump buffer size in bytes. Grows on demand.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
}

impl Default for ConditionConfig {
    fn default() -> Self {
        Self {
            filter_capacity: default_filter_capacity(),
            buffer_size: default_buffer_size(),
        }
    }
}

fn default_filter_capacity() -> usize {
    10
}

fn default_buffer_size() -> usize {
    1 << 20
}

pub const ENV_PREFIX: &str = "UNIT_PEEK_";

impl ConditionConfig {
    /// Build a figment that layers struct defaults under `UNIT_PEEK_*` env vars.
    pub fn figment() -> figment::Figment {
        use figment::{
            Figment,
            providers::{Env, Serialized},
        };

        Figment::from(Serialized::defaults(ConditionConfig::default()))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    /// Defaults overridden by `UNIT_PEEK_FILTER_CAPACITY` / `UNIT_PEEK_BUFFER_SIZE`.
    pub fn from_env() -> Result<Self> {
        Ok(Self::figment().extract().map_err(Box::new)?)
    }
}
