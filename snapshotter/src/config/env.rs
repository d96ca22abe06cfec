//! Credentials and source region from the process environment.
//!
//! The lookup is injectable so validation can be tested without touching the
//! real environment.

use std::fmt;

use crate::constants::env;
use crate::errors::ValidationError;

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

// Secrets stay out of logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    pub credentials: Credentials,
    pub region: String,
}

impl Environment {
    pub fn from_process_env() -> Result<Self, ValidationError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| -> Result<String, ValidationError> {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .ok_or_else(|| ValidationError::MissingRequired {
                    field: name.to_string(),
                })
        };

        let access_key_id = required(env::ACCESS_KEY_ID)?;
        let secret_access_key = required(env::SECRET_ACCESS_KEY)?;
        let region = required(env::DEFAULT_REGION)?;
        let session_token = lookup(env::SESSION_TOKEN).filter(|token| !token.is_empty());

        Ok(Self {
            credentials: Credentials {
                access_key_id,
                secret_access_key,
                session_token,
            },
            region,
        })
    }
}
