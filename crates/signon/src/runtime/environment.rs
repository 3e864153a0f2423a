use std::env;
use std::sync::OnceLock;

/// The environment the server is deployed in.
///
/// Read from `SIGNON_ENVIRONMENT` once, on first use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Local,
    Staging,
    Production,
}

impl Environment {
    pub fn is_local(&self) -> bool {
        matches!(self, Environment::Local)
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    fn from_env() -> Self {
        match env::var("SIGNON_ENVIRONMENT").map(|env| env.to_lowercase()) {
            Ok(env) => match env.as_str() {
                "local" => Environment::Local,
                "staging" => Environment::Staging,
                "production" => Environment::Production,
                value => {
                    warn!(value, "invalid `SIGNON_ENVIRONMENT`, using 'local'");
                    Environment::Local
                },
            },
            Err(env::VarError::NotPresent) => Environment::Local,
            Err(env::VarError::NotUnicode(raw)) => {
                warn!(?raw, "`SIGNON_ENVIRONMENT` is not a UTF-8 string, using 'local'");
                Environment::Local
            },
        }
    }
}

pub fn current() -> Environment {
    static ENV: OnceLock<Environment> = OnceLock::new();

    *ENV.get_or_init(Environment::from_env)
}
