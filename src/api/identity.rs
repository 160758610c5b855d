//! Identity validation against request headers.

use crate::api::event::ApiEvent;
use crate::lifecycle::LifecycleError;
use serde_json::Value;
use std::sync::Arc;

/// Validates caller credentials carried by the event.
pub trait IdentityValidator: Send + Sync {
    /// Check the event, optionally attaching claims to it.
    fn validate(&self, event: &mut ApiEvent) -> Result<(), LifecycleError>;
}

/// Accepts every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIdentity;

impl IdentityValidator for NoIdentity {
    fn validate(&self, _event: &mut ApiEvent) -> Result<(), LifecycleError> {
        Ok(())
    }
}

type Verifier = Arc<dyn Fn(&str) -> Result<Value, LifecycleError> + Send + Sync>;

/// Requires a bearer token and hands it to a verifier.
///
/// The claims returned by the verifier are attached to `event.jwt`.
#[derive(Clone)]
pub struct BearerToken {
    header: String,
    verifier: Verifier,
}

impl BearerToken {
    /// Read the token from the `Authorization` header.
    pub fn new(
        verifier: impl Fn(&str) -> Result<Value, LifecycleError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            header: "Authorization".to_string(),
            verifier: Arc::new(verifier),
        }
    }

    /// Read the token from another header.
    pub fn header(mut self, name: impl Into<String>) -> Self {
        self.header = name.into();
        self
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerToken")
            .field("header", &self.header)
            .finish_non_exhaustive()
    }
}

impl IdentityValidator for BearerToken {
    fn validate(&self, event: &mut ApiEvent) -> Result<(), LifecycleError> {
        let value = event.get_header(&self.header).ok_or_else(|| {
            LifecycleError::authentication(format!("missing {} header", self.header))
        })?;

        let token = value
            .split_once(' ')
            .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
            .map(|(_, token)| token.trim())
            .filter(|token| !token.is_empty())
            .ok_or_else(|| LifecycleError::authentication("expected a bearer token"))?;

        let claims = (self.verifier)(token)?;
        event.jwt = Some(claims);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::event::Method;
    use serde_json::json;

    fn validator() -> BearerToken {
        BearerToken::new(|token| {
            if token == "good" {
                Ok(json!({"sub": "user-1"}))
            } else {
                Err(LifecycleError::authentication("invalid token"))
            }
        })
    }

    #[test]
    fn test_valid_token_attaches_claims() {
        let mut event = ApiEvent::new(Method::Get, "/").header("authorization", "Bearer good");
        validator().validate(&mut event).unwrap();
        assert_eq!(event.jwt, Some(json!({"sub": "user-1"})));
    }

    #[test]
    fn test_missing_header() {
        let mut event = ApiEvent::new(Method::Get, "/");
        let err = validator().validate(&mut event).unwrap_err();
        assert_eq!(err.kind(), "AuthenticationFailureError");
    }

    #[test]
    fn test_wrong_scheme() {
        let mut event = ApiEvent::new(Method::Get, "/").header("Authorization", "Basic good");
        assert!(validator().validate(&mut event).is_err());
    }

    #[test]
    fn test_rejected_token() {
        let mut event = ApiEvent::new(Method::Get, "/").header("Authorization", "Bearer bad");
        assert!(validator().validate(&mut event).is_err());
        assert!(event.jwt.is_none());
    }

    #[test]
    fn test_custom_header() {
        let mut event = ApiEvent::new(Method::Get, "/").header("X-Token", "Bearer good");
        validator().header("X-Token").validate(&mut event).unwrap();
        assert!(event.jwt.is_some());
    }
}
