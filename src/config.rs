use std::env;

/// Runtime configuration, read once at startup and passed explicitly to the
/// components that need it.
#[derive(Clone, Debug, Default)]
pub struct Config {
    /// Overrides the built-in license list with an externally loaded one.
    /// Accepts a `file://` path or any URL fetchable over HTTP.
    pub licenses_group_url: Option<String>,

    /// Connection string for the portal database.
    pub db_connection_string: Option<String>,
}

impl Config {
    /// Reads the configuration from the environment.
    pub fn from_env() -> Self {
        Config {
            licenses_group_url: maybe_variable("PORTAL_LICENSES_GROUP_URL"),
            db_connection_string: maybe_variable("PORTAL_DB_CONNECTION_STRING"),
        }
    }
}

/// Returns the value of the named environment variable if it exists or panics.
pub fn get_variable(name: &str) -> String {
    env::var(name).unwrap_or_else(|_| panic!("must define {} environment variable", name))
}

/// Returns the value of the named environment variable if it exists.
pub fn maybe_variable(name: &str) -> Option<String> {
    env::var(name).ok()
}
