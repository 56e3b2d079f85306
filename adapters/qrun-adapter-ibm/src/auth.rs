//! IBM Quantum credentials.

use std::fmt;

use crate::error::{IbmError, IbmResult};

pub const ENV_API_KEY: &str = "IBM_API_KEY";
pub const ENV_SERVICE_CRN: &str = "IBM_SERVICE_CRN";
pub const ENV_TOKEN: &str = "IBM_QUANTUM_TOKEN";

/// How to authenticate against IBM Quantum.
#[derive(Clone, PartialEq, Eq)]
pub enum IbmCredentials {
    /// IBM Cloud API key, exchanged for an IAM bearer token, plus the CRN of
    /// the Quantum service instance.
    ApiKey { api_key: String, service_crn: String },
    /// Bearer token used as-is.
    Token(String),
}

impl IbmCredentials {
    /// Read credentials from `IBM_API_KEY` + `IBM_SERVICE_CRN`, falling back
    /// to `IBM_QUANTUM_TOKEN`.
    pub fn from_env() -> IbmResult<Self> {
        Self::resolve(
            non_empty_env(ENV_API_KEY),
            non_empty_env(ENV_SERVICE_CRN),
            non_empty_env(ENV_TOKEN),
        )
    }

    /// Pick credentials from optional parts. An API key wins over a token.
    pub fn resolve(
        api_key: Option<String>,
        service_crn: Option<String>,
        token: Option<String>,
    ) -> IbmResult<Self> {
        match (api_key, service_crn, token) {
            (Some(api_key), Some(service_crn), _) => Ok(Self::ApiKey {
                api_key,
                service_crn,
            }),
            (Some(_), None, _) => Err(IbmError::MissingServiceCrn),
            (None, _, Some(token)) => Ok(Self::Token(token)),
            (None, _, None) => Err(IbmError::MissingCredentials),
        }
    }

    /// Environment values override the given parts, field by field.
    pub fn from_env_or(
        api_key: Option<String>,
        service_crn: Option<String>,
        token: Option<String>,
    ) -> IbmResult<Self> {
        Self::resolve(
            non_empty_env(ENV_API_KEY).or(api_key),
            non_empty_env(ENV_SERVICE_CRN).or(service_crn),
            non_empty_env(ENV_TOKEN).or(token),
        )
    }
}

impl fmt::Debug for IbmCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiKey { service_crn, .. } => f
                .debug_struct("ApiKey")
                .field("api_key", &"[REDACTED]")
                .field("service_crn", service_crn)
                .finish(),
            Self::Token(_) => f.debug_tuple("Token").field(&"[REDACTED]").finish(),
        }
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    #[test]
    fn test_resolve_prefers_api_key() {
        let creds = IbmCredentials::resolve(s("key"), s("crn:v1:x"), s("tok")).unwrap();
        assert_eq!(
            creds,
            IbmCredentials::ApiKey {
                api_key: "key".into(),
                service_crn: "crn:v1:x".into()
            }
        );
    }

    #[test]
    fn test_resolve_token_and_errors() {
        assert_eq!(
            IbmCredentials::resolve(None, None, s("tok")).unwrap(),
            IbmCredentials::Token("tok".into())
        );
        assert!(matches!(
            IbmCredentials::resolve(s("key"), None, s("tok")),
            Err(IbmError::MissingServiceCrn)
        ));
        assert!(matches!(
            IbmCredentials::resolve(None, s("crn"), None),
            Err(IbmError::MissingCredentials)
        ));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = IbmCredentials::ApiKey {
            api_key: "super-secret".into(),
            service_crn: "crn:v1:x".into(),
        };
        let debug = format!("{creds:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("crn:v1:x"));

        let debug = format!("{:?}", IbmCredentials::Token("tok-secret".into()));
        assert!(!debug.contains("tok-secret"));
    }
}
