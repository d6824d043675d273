use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::config::{Config, SessionConfig};
use crate::error::{AppError, AppResult};

type HmacSha256 = Hmac<Sha256>;

/// Subject used for admin sessions opened with an event QR code.
pub const ADMIN_SUBJECT: &str = "admin";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionRole {
    Volunteer,
    TeamLead,
    Admin,
}

impl SessionRole {
    pub fn can_lead(&self) -> bool {
        matches!(self, SessionRole::TeamLead | SessionRole::Admin)
    }
}

/// Claims carried by a session token. `sub` is the volunteer uid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub event: String,
    pub name: String,
    pub first_name: String,
    pub last_name: String,
    pub role: SessionRole,
    pub iat: usize,
    pub exp: usize,
}

impl SessionClaims {
    pub fn uid(&self) -> &str {
        &self.sub
    }

    pub fn require_admin(&self) -> AppResult<()> {
        if self.role == SessionRole::Admin {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }

    pub fn require_lead(&self) -> AppResult<()> {
        if self.role.can_lead() {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }

    /// Sessions are scoped to one event.
    pub fn require_event(&self, event: &str) -> AppResult<()> {
        if self.event == event {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

pub struct SessionService;

impl SessionService {
    /// Create a signed session token
    pub fn issue(
        config: &SessionConfig,
        uid: &str,
        event: &str,
        first_name: &str,
        last_name: &str,
        role: SessionRole,
    ) -> AppResult<String> {
        if config.secret.is_empty() {
            return Err(AppError::Config("SESSION_SECRET is empty".to_string()));
        }

        let now = Utc::now();
        let exp = now + Duration::hours(config.expiration_hours);
        let claims = SessionClaims {
            sub: uid.to_string(),
            event: event.to_string(),
            name: format!("{} {}", first_name, last_name).trim().to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            role,
            iat: now.timestamp() as usize,
            exp: exp.timestamp() as usize,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )?;
        Ok(token)
    }

    /// Decode and validate a session token, returning the claims
    pub fn decode(config: &SessionConfig, token: &str) -> AppResult<SessionClaims> {
        let token_data = decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(config.secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    fn admin_mac(secret: &str, event: &str) -> AppResult<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|_| AppError::Internal(anyhow::anyhow!("Failed to create HMAC")))?;
        mac.update(event.as_bytes());
        Ok(mac)
    }

    /// Hex HMAC-SHA256 of the event name. This is the payload printed in an
    /// event's admin QR code.
    pub fn admin_code(secret: &str, event: &str) -> AppResult<String> {
        Ok(hex::encode(Self::admin_mac(secret, event)?.finalize().into_bytes()))
    }

    /// Check a scanned admin code for an event.
    ///
    /// With `QR_BYPASS` on every code is accepted; otherwise the server must
    /// have `ADMIN_QR_SECRET` configured.
    pub fn verify_admin_code(config: &Config, event: &str, code: &str) -> AppResult<()> {
        if config.features.qr_bypass {
            tracing::warn!("QR_BYPASS is on; accepting admin code for {}", event);
            return Ok(());
        }

        let expected = hex::decode(code.trim())
            .map_err(|_| AppError::BadRequest(crate::i18n::t("admin.invalid_code")))?;

        Self::admin_mac(qr_secret(config)?, event)?
            .verify_slice(&expected)
            .map_err(|_| AppError::Unauthorized)
    }
}

/// `ADMIN_QR_SECRET`, required to mint or check admin codes.
pub fn qr_secret(config: &Config) -> AppResult<&str> {
    config
        .admin
        .qr_secret
        .as_deref()
        .ok_or_else(|| AppError::Config("ADMIN_QR_SECRET is not set".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_config() -> SessionConfig {
        SessionConfig {
            secret: "test-secret".to_string(),
            expiration_hours: 1,
        }
    }

    #[test]
    fn issue_and_decode_round_trip_claims() {
        let config = session_config();
        let token =
            SessionService::issue(&config, "u-1", "RenderATL", "Ada", "Lovelace", SessionRole::TeamLead)
                .unwrap();
        let claims = SessionService::decode(&config, &token).unwrap();
        assert_eq!(claims.uid(), "u-1");
        assert_eq!(claims.name, "Ada Lovelace");
        assert_eq!(claims.role, SessionRole::TeamLead);
        assert!(claims.require_lead().is_ok());
        assert!(matches!(claims.require_admin(), Err(AppError::Forbidden)));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = SessionService::issue(
            &session_config(),
            "u-1",
            "RenderATL",
            "Ada",
            "Lovelace",
            SessionRole::Volunteer,
        )
        .unwrap();
        let other = SessionConfig {
            secret: "another".to_string(),
            expiration_hours: 1,
        };
        assert!(matches!(SessionService::decode(&other, &token), Err(AppError::Jwt(_))));
    }

    #[test]
    fn empty_secret_is_a_config_error() {
        let config = SessionConfig {
            secret: String::new(),
            expiration_hours: 1,
        };
        let err = SessionService::issue(&config, "u", "e", "a", "b", SessionRole::Volunteer).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_value(SessionRole::TeamLead).unwrap(), "teamlead");
    }

    #[test]
    fn admin_code_verification() {
        let mut config = Config::default();
        config.admin.qr_secret = Some("qr-secret".to_string());

        let code = SessionService::admin_code("qr-secret", "RenderATL").unwrap();
        assert!(SessionService::verify_admin_code(&config, "RenderATL", &code).is_ok());
        assert!(matches!(
            SessionService::verify_admin_code(&config, "ATW", &code),
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            SessionService::verify_admin_code(&config, "RenderATL", "not-hex"),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn admin_code_needs_secret_unless_bypassed() {
        let mut config = Config::default();
        assert!(matches!(
            SessionService::verify_admin_code(&config, "RenderATL", "00"),
            Err(AppError::Config(_))
        ));

        config.features.qr_bypass = true;
        assert!(SessionService::verify_admin_code(&config, "RenderATL", "anything").is_ok());
    }
}
