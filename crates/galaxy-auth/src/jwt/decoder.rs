//! JWT signature, algorithm and expiry validation.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use galaxy_core::error::AppError;
use galaxy_core::result::AppResult;

use super::claims::{AccessClaims, RefreshClaims, TokenType};
use super::encoder::SIGNING_ALGORITHM;
use super::secrets::SigningSecrets;

/// Validates JWTs against the signing secrets.
///
/// Stateless: blacklist and refresh-row checks live in the token store.
#[derive(Clone)]
pub struct JwtDecoder {
    access_key: DecodingKey,
    refresh_key: DecodingKey,
    access_validation: Validation,
    refresh_validation: Validation,
}

impl std::fmt::Debug for JwtDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtDecoder")
            .field("access_validation", &self.access_validation)
            .finish()
    }
}

impl JwtDecoder {
    /// Creates a new decoder from resolved secrets.
    pub fn new(secrets: &SigningSecrets) -> Self {
        let mut access_validation = Validation::new(SIGNING_ALGORITHM);
        access_validation.validate_exp = true;
        // Blacklist TTLs are computed from `exp`; any leeway would let a
        // revoked token outlive its entry.
        access_validation.leeway = 0;

        // Refresh expiry is checked after the row lookup, so an absent or
        // revoked row is reported before an expired one.
        let mut refresh_validation = Validation::new(SIGNING_ALGORITHM);
        refresh_validation.validate_exp = false;
        refresh_validation.leeway = 0;

        Self {
            access_key: DecodingKey::from_secret(secrets.access()),
            refresh_key: DecodingKey::from_secret(secrets.refresh()),
            access_validation,
            refresh_validation,
        }
    }

    /// Decodes an access token, rejecting it once `exp` is reached.
    pub fn decode_access(&self, token: &str) -> AppResult<AccessClaims> {
        let claims: AccessClaims = decode_with(token, &self.access_key, &self.access_validation)?;

        if claims.token_type != TokenType::Access {
            return Err(AppError::invalid_token(
                "Invalid token type: expected access token",
            ));
        }
        if claims.exp <= Utc::now().timestamp() {
            return Err(AppError::token_expired("Token has expired"));
        }
        Ok(claims)
    }

    /// Decodes a refresh token without checking its expiry.
    pub fn decode_refresh(&self, token: &str) -> AppResult<RefreshClaims> {
        let claims: RefreshClaims =
            decode_with(token, &self.refresh_key, &self.refresh_validation)?;

        if claims.token_type != TokenType::Refresh {
            return Err(AppError::invalid_token(
                "Invalid token type: expected refresh token",
            ));
        }
        Ok(claims)
    }
}

/// The `alg` member of a JOSE header, kept as text so values the JWT
/// library cannot represent (such as `none`) are still visible.
#[derive(Deserialize)]
struct RawHeader {
    alg: String,
}

/// Rejects any header whose `alg` is not the signing algorithm.
///
/// Headers that cannot be read at all are left to `decode`.
fn check_algorithm(token: &str) -> AppResult<()> {
    let Some(segment) = token.split('.').next() else {
        return Ok(());
    };
    let Ok(bytes) = URL_SAFE_NO_PAD.decode(segment.trim_end_matches('=')) else {
        return Ok(());
    };
    let Ok(header) = serde_json::from_slice::<RawHeader>(&bytes) else {
        return Ok(());
    };
    match header.alg.parse::<Algorithm>() {
        Ok(alg) if alg == SIGNING_ALGORITHM => Ok(()),
        _ => Err(AppError::invalid_algorithm(
            "Token signed with an unsupported algorithm",
        )),
    }
}

fn decode_with<T: DeserializeOwned>(
    token: &str,
    key: &DecodingKey,
    validation: &Validation,
) -> AppResult<T> {
    check_algorithm(token)?;
    decode::<T>(token, key, validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            JwtErrorKind::ExpiredSignature => AppError::token_expired("Token has expired"),
            JwtErrorKind::InvalidAlgorithm => {
                AppError::invalid_algorithm("Token signed with an unsupported algorithm")
            }
            JwtErrorKind::InvalidSignature => AppError::invalid_token("Invalid token signature"),
            _ => AppError::invalid_token("Invalid token"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::encoder::TokenIssuer;
    use galaxy_core::ErrorKind;
    use galaxy_core::config::AuthConfig;
    use galaxy_entity::user::UserRole;
    use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
    use uuid::Uuid;

    const ACCESS: &str = "access-secret-access-secret-access-secret";
    const REFRESH: &str = "refresh-secret-refresh-secret-refresh-secret";

    fn setup() -> (TokenIssuer, JwtDecoder) {
        let secrets = SigningSecrets::new(ACCESS, REFRESH).unwrap();
        (
            TokenIssuer::new(&secrets, &AuthConfig::default()),
            JwtDecoder::new(&secrets),
        )
    }

    fn claims(exp_offset: i64) -> AccessClaims {
        let now = Utc::now().timestamp();
        AccessClaims {
            sub: Uuid::new_v4(),
            role: UserRole::User,
            sid: Uuid::new_v4(),
            jti: Uuid::new_v4(),
            iat: now,
            exp: now + exp_offset,
            token_type: TokenType::Access,
        }
    }

    #[test]
    fn test_round_trip_access() {
        let (issuer, decoder) = setup();
        let user = Uuid::new_v4();
        let issued = issuer.issue_access(user, UserRole::Admin, Uuid::new_v4()).unwrap();
        let claims = decoder.decode_access(&issued.token).unwrap();
        assert_eq!(claims.sub, user);
        assert_eq!(claims.role, UserRole::Admin);
        assert_eq!(claims.jti, issued.jti);
    }

    #[test]
    fn test_other_algorithm_rejected() {
        let (_, decoder) = setup();
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims(600),
            &EncodingKey::from_secret(ACCESS.as_bytes()),
        )
        .unwrap();
        let err = decoder.decode_access(&token).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidAlgorithm);
    }

    #[test]
    fn test_unsigned_none_algorithm_rejected() {
        let (_, decoder) = setup();
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims(600)).unwrap());
        let token = format!("{header}.{payload}.");

        let err = decoder.decode_access(&token).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidAlgorithm);
        let err = decoder.decode_refresh(&token).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidAlgorithm);
    }

    #[test]
    fn test_expired_access_rejected() {
        let (_, decoder) = setup();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims(-30),
            &EncodingKey::from_secret(ACCESS.as_bytes()),
        )
        .unwrap();
        let err = decoder.decode_access(&token).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TokenExpired);
    }

    #[test]
    fn test_refresh_token_not_accepted_as_access() {
        let (issuer, decoder) = setup();
        let refresh = issuer
            .issue_refresh(Uuid::new_v4(), Uuid::new_v4(), Utc::now())
            .unwrap();
        let err = decoder.decode_access(&refresh.token).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidToken);
    }

    #[test]
    fn test_tampered_signature_rejected() {
        let (issuer, decoder) = setup();
        let issued = issuer
            .issue_access(Uuid::new_v4(), UserRole::User, Uuid::new_v4())
            .unwrap();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims(600),
            &EncodingKey::from_secret(b"another-secret-another-secret-another"),
        )
        .unwrap();
        assert_eq!(
            decoder.decode_access(&token).unwrap_err().kind,
            ErrorKind::InvalidToken
        );
        assert!(decoder.decode_access(&format!("{}x", issued.token)).is_err());
    }
}
