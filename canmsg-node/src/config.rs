//! Load node config from file and environment.

use serde::Deserialize;
use std::path::PathBuf;

/// Node configuration. File: ~/.config/canmsg/config.toml or
/// /etc/canmsg/config.toml. Env overrides: CANMSG_NODE_ID, CANMSG_CAPACITY,
/// CANMSG_MAX_ATTEMPTS, CANMSG_RETRY_DELAY_MS, CANMSG_FRAME_GAP_MS,
/// CANMSG_POLL_IDLE_MS.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Receiver id this node listens as (1..=5, default 1).
    #[serde(default = "default_node_id")]
    pub node_id: u8,
    /// Receive buffer capacity in bytes (default 2048).
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    /// Per-frame transmit attempts while the link is busy (default 50).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Wait between busy retries, milliseconds (default 5).
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Pacing gap between transmitted frames, milliseconds (default 10).
    #[serde(default = "default_frame_gap_ms")]
    pub frame_gap_ms: u64,
    /// Receiver idle sleep between polls, milliseconds (default 5).
    #[serde(default = "default_poll_idle_ms")]
    pub poll_idle_ms: u64,
}

fn default_node_id() -> u8 {
    1
}
fn default_capacity() -> usize {
    canmsg_core::DEFAULT_CAPACITY
}
fn default_max_attempts() -> u32 {
    50
}
fn default_retry_delay_ms() -> u64 {
    5
}
fn default_frame_gap_ms() -> u64 {
    10
}
fn default_poll_idle_ms() -> u64 {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            capacity: default_capacity(),
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            frame_gap_ms: default_frame_gap_ms(),
            poll_idle_ms: default_poll_idle_ms(),
        }
    }
}

impl Config {
    /// Sender policy derived from the configured knobs.
    pub fn send_policy(&self) -> canmsg_core::SendPolicy {
        canmsg_core::SendPolicy {
            max_attempts: self.max_attempts,
            retry_delay: std::time::Duration::from_millis(self.retry_delay_ms),
            frame_gap: std::time::Duration::from_millis(self.frame_gap_ms),
        }
    }
}

/// Load config: merge default, then config file (if present), then env vars.
pub fn load() -> Config {
    let mut c = load_file().unwrap_or_default();
    if let Ok(s) = std::env::var("CANMSG_NODE_ID") {
        if let Ok(v) = s.parse::<u8>() {
            c.node_id = v;
        }
    }
    if let Ok(s) = std::env::var("CANMSG_CAPACITY") {
        if let Ok(v) = s.parse::<usize>() {
            c.capacity = v;
        }
    }
    if let Ok(s) = std::env::var("CANMSG_MAX_ATTEMPTS") {
        if let Ok(v) = s.parse::<u32>() {
            c.max_attempts = v;
        }
    }
    if let Ok(s) = std::env::var("CANMSG_RETRY_DELAY_MS") {
        if let Ok(v) = s.parse::<u64>() {
            c.retry_delay_ms = v;
        }
    }
    if let Ok(s) = std::env::var("CANMSG_FRAME_GAP_MS") {
        if let Ok(v) = s.parse::<u64>() {
            c.frame_gap_ms = v;
        }
    }
    if let Ok(s) = std::env::var("CANMSG_POLL_IDLE_MS") {
        if let Ok(v) = s.parse::<u64>() {
            c.poll_idle_ms = v;
        }
    }
    c
}

fn config_paths() -> Vec<PathBuf> {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    let mut out = Vec::new();
    if let Some(h) = home {
        out.push(h.join(".config/canmsg/config.toml"));
    }
    out.push(PathBuf::from("/etc/canmsg/config.toml"));
    out
}

fn load_file() -> Option<Config> {
    for p in config_paths() {
        if p.exists() {
            if let Ok(s) = std::fs::read_to_string(&p) {
                if let Ok(c) = toml::from_str::<Config>(&s) {
                    return Some(c);
                }
            }
            break;
        }
    }
    None
}
