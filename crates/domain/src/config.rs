use std::env;
use std::str::FromStr;

/// Runtime settings, read from the environment with defaults.
#[derive(Clone, Debug)]
pub struct Config {
    pub event_log_table: String,
    pub event_snapshots_table: String,
    pub intake_view_table: String,
    pub medicines_table: String,
    pub users_table: String,
    pub login_route: String,
    pub max_search_limit: u32,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            event_log_table: var_or("DYNAMODB_EVENT_LOG_TABLE", "pharmacy-event-log"),
            event_snapshots_table: var_or("DYNAMODB_EVENT_SNAPSHOTS_TABLE", "pharmacy-event-snapshots"),
            intake_view_table: var_or("DYNAMODB_INTAKE_VIEW_TABLE", "pharmacy-intake-view"),
            medicines_table: var_or("DYNAMODB_MEDICINES_TABLE", "pharmacy-medicines"),
            users_table: var_or("DYNAMODB_USERS_TABLE", "pharmacy-users"),
            login_route: var_or("LOGIN_ROUTE", "/login"),
            max_search_limit: parse_or(env::var("MAX_SEARCH_LIMIT").ok(), 100),
        }
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or(default.to_string())
}

fn parse_or<T: FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|value| value.trim().parse().ok()).unwrap_or(default)
}
