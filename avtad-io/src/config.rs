use std::fs::read_to_string;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AvtadIoError;

///
/// Defaults for `avtad snip`; command-line flags take precedence.
///
#[derive(Deserialize, Serialize, Debug, PartialEq, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct SnipConfig {
    pub format: Option<String>,
    pub balance: Option<bool>,
    pub niter: Option<usize>,
    pub window: Option<f64>,
    pub diagonals_to_remove: Option<usize>,
    pub seed: Option<u64>,
}

///
/// Defaults for `avtad rescale`; command-line flags take precedence.
///
#[derive(Deserialize, Serialize, Debug, PartialEq, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct RescaleConfig {
    pub rescaled_size: Option<usize>,
    pub save_sum: Option<bool>,
    pub smooth_order: Option<usize>,
    pub operation: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, PartialEq, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    #[serde(default)]
    pub snip: SnipConfig,
    #[serde(default)]
    pub rescale: RescaleConfig,
}

impl TryFrom<&Path> for RunConfig {
    type Error = AvtadIoError;

    fn try_from(path: &Path) -> Result<Self, Self::Error> {
        let toml_str = read_to_string(path)?;
        let config = toml::from_str(&toml_str)?;
        Ok(config)
    }
}
