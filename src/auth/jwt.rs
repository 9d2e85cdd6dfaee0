use std::{fmt, time::Duration};

use base64ct::{Base64UrlUnpadded, Encoding};
use jsonwebtoken::{
    decode, decode_header, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey,
    Header, Validation,
};
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::{claims::Claims, errors::AuthError};

/// Signing algorithms accepted by [`validate_token`]. Tokens are issued with HS256.
const HMAC_ALGORITHMS: [&str; 3] = ["HS256", "HS384", "HS512"];

/// Only the `alg` field is read from the raw header, before any library parsing.
#[derive(Deserialize)]
struct RawHeader {
    alg: String,
}

/// Sign a token for `subject` that expires `ttl` from now.
pub fn issue_token(
    subject: Uuid,
    username: &str,
    secret: &[u8],
    ttl: Duration,
) -> Result<String, AuthError> {
    let ttl = i64::try_from(ttl.as_secs()).map_err(|_| AuthError::TokenIssuanceFailed)?;
    let iat = OffsetDateTime::now_utc().unix_timestamp();
    let claims = Claims {
        sub: subject,
        username: username.to_owned(),
        iat,
        exp: iat.saturating_add(ttl),
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| {
        error!(error = %e, "jwt encode failed");
        AuthError::TokenIssuanceFailed
    })?;
    debug!(user_id = %subject, "jwt signed");
    Ok(token)
}

/// Validate a token (optionally prefixed with `Bearer `) and return its claims.
///
/// The header algorithm is checked against the HMAC family before the library
/// touches the token, so `alg: none` and asymmetric algorithms are rejected as
/// [`AuthError::InvalidSignature`] without looking at the claims.
pub fn validate_token(token: &str, secret: &[u8]) -> Result<Claims, AuthError> {
    let token = strip_bearer(token);

    let alg = header_algorithm(token)?;
    if !HMAC_ALGORITHMS.contains(&alg.as_str()) {
        warn!(alg = %alg, "token rejected: unexpected signing algorithm");
        return Err(AuthError::InvalidSignature);
    }
    decode_header(token).map_err(|_| AuthError::Malformed)?;

    let mut validation = Validation::new(Algorithm::HS256);
    validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);

    let data = decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation).map_err(
        |e| {
            let err = classify(e.kind());
            debug!(error = %e, kind = ?err, "jwt rejected");
            err
        },
    )?;
    debug!(user_id = %data.claims.sub, "jwt verified");
    Ok(data.claims)
}

fn strip_bearer(token: &str) -> &str {
    let token = token.trim();
    token
        .strip_prefix("Bearer ")
        .or_else(|| token.strip_prefix("bearer "))
        .unwrap_or(token)
        .trim_start()
}

fn header_algorithm(token: &str) -> Result<String, AuthError> {
    let mut segments = token.split('.');
    let (Some(header), Some(_), Some(_), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(AuthError::Malformed);
    };
    let raw = Base64UrlUnpadded::decode_vec(header).map_err(|_| AuthError::Malformed)?;
    let header: RawHeader = serde_json::from_slice(&raw).map_err(|_| AuthError::Malformed)?;
    Ok(header.alg)
}

fn classify(kind: &ErrorKind) -> AuthError {
    match kind {
        ErrorKind::InvalidSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::InvalidAlgorithmName
        | ErrorKind::MissingAlgorithm => AuthError::InvalidSignature,
        ErrorKind::ExpiredSignature => AuthError::Expired,
        ErrorKind::Json(_)
        | ErrorKind::MissingRequiredClaim(_)
        | ErrorKind::InvalidIssuer
        | ErrorKind::InvalidAudience
        | ErrorKind::InvalidSubject
        | ErrorKind::ImmatureSignature => AuthError::InvalidClaims,
        _ => AuthError::Malformed,
    }
}

/// Signing secret and token lifetime, fixed at startup.
#[derive(Clone)]
pub struct JwtKeys {
    secret: Vec<u8>,
    ttl: Duration,
}

impl fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtKeys")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl JwtKeys {
    pub fn new(secret: impl Into<Vec<u8>>, ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn sign(&self, user_id: Uuid, username: &str) -> Result<String, AuthError> {
        issue_token(user_id, username, &self.secret, self.ttl)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        validate_token(token, &self.secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    const SECRET: &[u8] = b"dev-secret";

    fn now() -> i64 {
        OffsetDateTime::now_utc().unix_timestamp()
    }

    fn b64(bytes: &[u8]) -> String {
        Base64UrlUnpadded::encode_string(bytes)
    }

    /// Assemble a token by hand; the signature segment is arbitrary.
    fn forge(header: &str, payload: &str, signature: &str) -> String {
        format!(
            "{}.{}.{}",
            b64(header.as_bytes()),
            b64(payload.as_bytes()),
            signature
        )
    }

    fn sign_raw<T: Serialize>(alg: Algorithm, claims: &T, secret: &[u8]) -> String {
        encode(&Header::new(alg), claims, &EncodingKey::from_secret(secret)).expect("encode")
    }

    #[test]
    fn issue_and_validate_roundtrip() {
        let user_id = Uuid::new_v4();
        let token = issue_token(user_id, "alice", SECRET, Duration::from_secs(3600))
            .expect("sign token");
        let claims = validate_token(&token, SECRET).expect("verify token");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn accepts_bearer_prefix() {
        let user_id = Uuid::new_v4();
        let token = issue_token(user_id, "alice", SECRET, Duration::from_secs(60)).unwrap();
        let claims = validate_token(&format!("Bearer {token}"), SECRET).expect("verify");
        assert_eq!(claims.sub, user_id);
    }

    #[test]
    fn rejects_token_signed_with_other_secret() {
        let token =
            issue_token(Uuid::new_v4(), "alice", b"other-secret", Duration::from_secs(60)).unwrap();
        let err = validate_token(&token, SECRET).unwrap_err();
        assert!(matches!(err, AuthError::InvalidSignature), "got {err:?}");
    }

    #[test]
    fn rejects_tampered_payload() {
        let token = issue_token(Uuid::new_v4(), "alice", SECRET, Duration::from_secs(60)).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let payload = format!(
            r#"{{"sub":"{}","username":"mallory","iat":{},"exp":{}}}"#,
            Uuid::new_v4(),
            now(),
            now() + 60
        );
        let tampered = format!("{}.{}.{}", parts[0], b64(payload.as_bytes()), parts[2]);
        let err = validate_token(&tampered, SECRET).unwrap_err();
        assert!(matches!(err, AuthError::InvalidSignature), "got {err:?}");
    }

    #[test]
    fn rejects_expired_token() {
        let claims = Claims {
            sub: Uuid::new_v4(),
            username: "alice".into(),
            iat: now() - 7200,
            exp: now() - 3600,
        };
        let token = sign_raw(Algorithm::HS256, &claims, SECRET);
        let err = validate_token(&token, SECRET).unwrap_err();
        assert!(matches!(err, AuthError::Expired), "got {err:?}");
    }

    #[test]
    fn rejects_non_hmac_algorithm() {
        let payload = format!(
            r#"{{"sub":"{}","username":"alice","iat":{},"exp":{}}}"#,
            Uuid::new_v4(),
            now(),
            now() + 60
        );
        let token = forge(r#"{"alg":"RS256","typ":"JWT"}"#, &payload, "c2lnbmF0dXJl");
        let err = validate_token(&token, SECRET).unwrap_err();
        assert!(matches!(err, AuthError::InvalidSignature), "got {err:?}");
    }

    #[test]
    fn rejects_alg_none() {
        let payload = format!(
            r#"{{"sub":"{}","username":"alice","iat":{},"exp":{}}}"#,
            Uuid::new_v4(),
            now(),
            now() + 60
        );
        let token = forge(r#"{"alg":"none","typ":"JWT"}"#, &payload, "");
        let err = validate_token(&token, SECRET).unwrap_err();
        assert!(matches!(err, AuthError::InvalidSignature), "got {err:?}");
    }

    #[test]
    fn accepts_other_hmac_variants() {
        let claims = Claims {
            sub: Uuid::new_v4(),
            username: "alice".into(),
            iat: now(),
            exp: now() + 60,
        };
        let token = sign_raw(Algorithm::HS512, &claims, SECRET);
        let verified = validate_token(&token, SECRET).expect("HS512 is HMAC");
        assert_eq!(verified, claims);
    }

    #[test]
    fn rejects_malformed_tokens() {
        for token in ["", "invalid.token", "invalid.token.string", "Bearer ", "a.b.c.d"] {
            let err = validate_token(token, SECRET).unwrap_err();
            assert!(matches!(err, AuthError::Malformed), "{token:?} gave {err:?}");
        }
    }

    #[test]
    fn rejects_missing_subject() {
        #[derive(Serialize)]
        struct NoSubject {
            username: String,
            iat: i64,
            exp: i64,
        }
        let token = sign_raw(
            Algorithm::HS256,
            &NoSubject {
                username: "alice".into(),
                iat: now(),
                exp: now() + 60,
            },
            SECRET,
        );
        let err = validate_token(&token, SECRET).unwrap_err();
        assert!(matches!(err, AuthError::InvalidClaims), "got {err:?}");
    }

    #[test]
    fn rejects_subject_of_wrong_type() {
        #[derive(Serialize)]
        struct NumericSubject {
            sub: u64,
            username: String,
            iat: i64,
            exp: i64,
        }
        let token = sign_raw(
            Algorithm::HS256,
            &NumericSubject {
                sub: 123,
                username: "alice".into(),
                iat: now(),
                exp: now() + 60,
            },
            SECRET,
        );
        let err = validate_token(&token, SECRET).unwrap_err();
        assert!(matches!(err, AuthError::InvalidClaims), "got {err:?}");
    }

    #[test]
    fn claim_check_failures_are_invalid_claims() {
        for kind in [
            ErrorKind::InvalidIssuer,
            ErrorKind::InvalidAudience,
            ErrorKind::InvalidSubject,
            ErrorKind::ImmatureSignature,
            ErrorKind::MissingRequiredClaim("sub".into()),
        ] {
            let err = classify(&kind);
            assert!(matches!(err, AuthError::InvalidClaims), "{kind:?} gave {err:?}");
        }
        assert!(matches!(
            classify(&ErrorKind::InvalidToken),
            AuthError::Malformed
        ));
        assert!(matches!(
            classify(&ErrorKind::ExpiredSignature),
            AuthError::Expired
        ));
    }

    #[test]
    fn keys_sign_and_verify() {
        let keys = JwtKeys::new("dev-secret", Duration::from_secs(300));
        let user_id = Uuid::new_v4();
        let token = keys.sign(user_id, "bob").expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.username, "bob");
        assert_eq!(keys.ttl(), Duration::from_secs(300));
        assert!(!format!("{keys:?}").contains("dev-secret"));
    }
}
