//! TOML scenario fixtures: named sequences of ticks with their expected outcome.
//!
//! ```toml
//! [[scenario]]
//! name = "basic"
//!
//! [[scenario.tick]]
//! batch = '{"metaKind":"commit","ops":[...]}'
//! expect_snapshot = '[...]'
//! expect_fingerprint = "123"
//! ```
//!
//! `expect_error` names the error variant a tick must fail with instead.

use serde::Deserialize;
use std::path::Path;

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioFile {
    #[serde(default)]
    pub scenario: Vec<Scenario>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub tick: Vec<TickFixture>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TickFixture {
    /// Batch in wire JSON.
    pub batch: String,
    pub expect_snapshot: Option<String>,
    pub expect_fingerprint: Option<String>,
    pub expect_error: Option<String>,
}

pub fn parse_scenarios(text: &str) -> Result<Vec<Scenario>, String> {
    let file: ScenarioFile = toml::from_str(text).map_err(|err| err.to_string())?;
    Ok(file.scenario)
}

pub fn load_scenarios(path: &Path) -> Result<Vec<Scenario>, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|err| format!("failed to read {}: {err}", path.display()))?;
    parse_scenarios(&text).map_err(|err| format!("{}: {err}", path.display()))
}
