// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed schema for the store's key/value config table.

use std::fmt;
use std::str::FromStr;

/// Recognized config keys and their constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    MaxRetries,
    BackoffBase,
    BackoffFactorMs,
    TickIntervalMs,
    SaveIntervalMs,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 5] = [
        ConfigKey::MaxRetries,
        ConfigKey::BackoffBase,
        ConfigKey::BackoffFactorMs,
        ConfigKey::TickIntervalMs,
        ConfigKey::SaveIntervalMs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigKey::MaxRetries => "max_retries",
            ConfigKey::BackoffBase => "backoff_base",
            ConfigKey::BackoffFactorMs => "backoff_factor_ms",
            ConfigKey::TickIntervalMs => "tick_interval_ms",
            ConfigKey::SaveIntervalMs => "save_interval_ms",
        }
    }

    pub fn default_value(&self) -> i64 {
        match self {
            ConfigKey::MaxRetries => 3,
            ConfigKey::BackoffBase => 2,
            ConfigKey::BackoffFactorMs => 1_000,
            ConfigKey::TickIntervalMs => 200,
            ConfigKey::SaveIntervalMs => 5_000,
        }
    }

    /// Validate a candidate value against this key's constraint (§3).
    pub fn validate(&self, value: i64) -> Result<(), String> {
        let ok = match self {
            ConfigKey::MaxRetries => value >= 0,
            ConfigKey::BackoffBase => value >= 1,
            ConfigKey::BackoffFactorMs => value >= 0,
            ConfigKey::TickIntervalMs => value >= 50,
            ConfigKey::SaveIntervalMs => value >= 1000,
        };
        if ok {
            Ok(())
        } else {
            Err(format!(
                "value {value} out of range for config key {}",
                self.as_str()
            ))
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ConfigKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigKey::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown config key: {s}"))
    }
}

/// Resolved scheduling configuration, with every key defaulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub max_retries: u32,
    pub backoff_base: u32,
    pub backoff_factor_ms: i64,
    pub tick_interval_ms: u64,
    pub save_interval_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_retries: ConfigKey::MaxRetries.default_value() as u32,
            backoff_base: ConfigKey::BackoffBase.default_value() as u32,
            backoff_factor_ms: ConfigKey::BackoffFactorMs.default_value(),
            tick_interval_ms: ConfigKey::TickIntervalMs.default_value() as u64,
            save_interval_ms: ConfigKey::SaveIntervalMs.default_value() as u64,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
