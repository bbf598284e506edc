// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Modeler configuration.

use std::env;

/// Scheduler settings.
#[derive(Debug, Clone)]
pub struct ModelerConfig {
    /// Run a parameter node once when it is added to the scene
    pub run_on_node_added: bool,
    /// Upper bound on notifications drained in one dispatch pass
    pub max_dispatch_events: usize,
}

impl ModelerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            run_on_node_added: env::var("DYNAMIC_MODELER_RUN_ON_ADD")
                .ok()
                .and_then(|v| parse_flag(&v))
                .unwrap_or(true),
            max_dispatch_events: env::var("DYNAMIC_MODELER_MAX_DISPATCH_EVENTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&n: &usize| n > 0)
                .unwrap_or(10_000),
        }
    }

    /// Settings that ignore the environment.
    pub fn fixed(run_on_node_added: bool, max_dispatch_events: usize) -> Self {
        Self {
            run_on_node_added,
            max_dispatch_events: max_dispatch_events.max(1),
        }
    }
}

impl Default for ModelerConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag(" On "), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn test_fixed_clamps_event_limit() {
        let config = ModelerConfig::fixed(false, 0);
        assert!(!config.run_on_node_added);
        assert_eq!(config.max_dispatch_events, 1);
    }
}
