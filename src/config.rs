use std::time::Duration;

const BUSY_TIMEOUT_ENV: &str = "PORTALD_BUSY_TIMEOUT_MS";
const UPLOAD_LIST_LIMIT_ENV: &str = "PORTALD_UPLOAD_LIST_LIMIT";
const DEFAULT_ACTOR_ENV: &str = "PORTALD_DEFAULT_ACTOR";

#[derive(Debug, Clone)]
pub struct Config {
    pub busy_timeout: Duration,
    pub upload_list_limit: i64,
    pub default_actor: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            busy_timeout: Duration::from_millis(5000),
            upload_list_limit: 50,
            default_actor: "admin".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Config::default();
        if let Some(ms) = parse_positive(BUSY_TIMEOUT_ENV, lookup(BUSY_TIMEOUT_ENV)) {
            cfg.busy_timeout = Duration::from_millis(ms as u64);
        }
        if let Some(limit) = parse_positive(UPLOAD_LIST_LIMIT_ENV, lookup(UPLOAD_LIST_LIMIT_ENV)) {
            cfg.upload_list_limit = limit;
        }
        if let Some(actor) = lookup(DEFAULT_ACTOR_ENV) {
            let actor = actor.trim();
            if !actor.is_empty() {
                cfg.default_actor = actor.to_string();
            }
        }
        cfg
    }
}

fn parse_positive(key: &str, raw: Option<String>) -> Option<i64> {
    let raw = raw?;
    match raw.trim().parse::<i64>() {
        Ok(v) if v > 0 => Some(v),
        _ => {
            tracing::warn!(key, value = %raw, "ignoring malformed setting, using default");
            None
        }
    }
}
