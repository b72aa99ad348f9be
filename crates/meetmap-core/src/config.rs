//! Client configuration types.

use serde::{Deserialize, Serialize};

/// Root client configuration.
///
/// Loaded from a TOML file by the infrastructure layer; every section falls
/// back to its defaults when absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub realtime: RealtimeSettings,
    #[serde(default)]
    pub chat: ChatSettings,
}

/// Live-feed hardening knobs.
///
/// A silently dead subscription means messages stop arriving with no
/// visible symptom, so a dropped feed is re-established with bounded retry
/// before being surfaced as an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeSettings {
    /// How many times to retry re-establishing a dropped subscription.
    #[serde(default = "default_resubscribe_max_retries")]
    pub resubscribe_max_retries: u32,
    /// Delay between resubscribe attempts, in milliseconds.
    #[serde(default = "default_resubscribe_backoff_ms")]
    pub resubscribe_backoff_ms: u64,
}

impl Default for RealtimeSettings {
    fn default() -> Self {
        Self {
            resubscribe_max_retries: default_resubscribe_max_retries(),
            resubscribe_backoff_ms: default_resubscribe_backoff_ms(),
        }
    }
}

fn default_resubscribe_max_retries() -> u32 {
    3
}

fn default_resubscribe_backoff_ms() -> u64 {
    500
}

/// Chat input limits, checked locally before any network call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSettings {
    /// Maximum message length in characters.
    #[serde(default = "default_max_message_length")]
    pub max_message_length: usize,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            max_message_length: default_max_message_length(),
        }
    }
}

fn default_max_message_length() -> usize {
    2000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.realtime.resubscribe_max_retries, 3);
        assert_eq!(config.realtime.resubscribe_backoff_ms, 500);
        assert_eq!(config.chat.max_message_length, 2000);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: ClientConfig = toml::from_str(
            r#"
            [realtime]
            resubscribe_max_retries = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.realtime.resubscribe_max_retries, 5);
        assert_eq!(config.realtime.resubscribe_backoff_ms, 500);
        assert_eq!(config.chat.max_message_length, 2000);
    }
}
