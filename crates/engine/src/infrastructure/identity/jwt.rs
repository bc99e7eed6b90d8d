//! HS256 JWT verification.

use async_trait::async_trait;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use metaverse_domain::Identity;

use crate::infrastructure::ports::{IdentityError, IdentityVerifier};

/// Claims the coordinator reads. `exp` is checked by `jsonwebtoken` when present.
#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(rename = "userId", default)]
    user_id: Option<String>,
    #[serde(default)]
    sub: Option<String>,
}

impl Claims {
    /// `userId` wins over `sub` when a token carries both.
    fn into_subject(self) -> Result<String, IdentityError> {
        self.user_id
            .or(self.sub)
            .ok_or_else(|| IdentityError::Invalid("token carries no userId or sub claim".to_string()))
    }
}

/// Verifies tokens signed with a shared secret.
#[derive(Clone)]
pub struct JwtIdentityVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtIdentityVerifier {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Tokens issued by the account service carry no `exp`.
        validation.required_spec_claims.clear();
        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    fn decode(&self, token: &str) -> Result<Claims, IdentityError> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => IdentityError::Expired,
                _ => IdentityError::Invalid(e.to_string()),
            })
    }
}

impl std::fmt::Debug for JwtIdentityVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtIdentityVerifier")
            .field("algorithms", &self.validation.algorithms)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl IdentityVerifier for JwtIdentityVerifier {
    async fn verify(&self, token: &str) -> Result<Identity, IdentityError> {
        if token.trim().is_empty() {
            return Err(IdentityError::Invalid("missing token".to_string()));
        }
        let subject = self.decode(token)?.into_subject()?;
        Identity::new(subject).map_err(|e| IdentityError::Invalid(e.to_string()))
    }
}
