//! Runtime policy read once from the environment.

use once_cell::sync::OnceCell;

pub const DEFAULT_LOG_FILTER: &str = "warn";
pub const DEFAULT_MAX_LIVE_OBJECTS: u32 = 65_536;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    pub log_filter: String,
    pub max_live_objects: u32,
    pub allow_offline_devices: bool,
}

static POLICY: OnceCell<Policy> = OnceCell::new();

fn parse_bool(v: &str) -> Option<bool> {
    match v {
        "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
        "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
        _ => None,
    }
}

impl Policy {
    /// Build a policy from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Policy
    where
        F: Fn(&str) -> Option<String>,
    {
        let log_filter = lookup("CLRT_LOG")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
        let max_live_objects = lookup("CLRT_MAX_LIVE_OBJECTS")
            .and_then(|v| v.trim().parse::<u32>().ok())
            .filter(|&v| v != 0)
            .unwrap_or(DEFAULT_MAX_LIVE_OBJECTS);
        let allow_offline_devices = lookup("CLRT_ALLOW_OFFLINE_DEVICES")
            .and_then(|v| parse_bool(v.trim()))
            .unwrap_or(true);
        Policy {
            log_filter,
            max_live_objects,
            allow_offline_devices,
        }
    }

    pub fn from_env() -> Policy {
        Policy::from_lookup(|name| std::env::var(name).ok())
    }
}

impl Default for Policy {
    fn default() -> Self {
        Policy::from_lookup(|_| None)
    }
}

pub fn policy() -> &'static Policy {
    POLICY.get_or_init(Policy::from_env)
}
