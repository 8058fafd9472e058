// ==================== IDENTITY PROVIDER CLIENT ====================
// Verifies Firebase ID tokens and writes custom claims (role, verified)
// through the Identity Toolkit REST API.

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use reqwest::header::{HeaderMap, CACHE_CONTROL};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};

use crate::config::AppConfig;
use crate::middleware::auth::Claims;
use crate::models::Role;
use crate::utils::AppError;

const JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";
const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1/projects";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const OAUTH_SCOPES: &str =
    "https://www.googleapis.com/auth/identitytoolkit https://www.googleapis.com/auth/cloud-platform";
const DEFAULT_KEYS_TTL: Duration = Duration::from_secs(3600);
/// Access tokens are refreshed this long before they expire.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Everything the backend needs from the identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Decodes a bearer token into claims. Any failure is `Unauthorized`.
    async fn verify_token(&self, token: &str) -> Result<Claims, AppError>;

    async fn set_custom_claims(&self, uid: &str, role: Role, verified: bool) -> Result<(), AppError>;

    async fn delete_user(&self, uid: &str) -> Result<(), AppError>;
}

/// Payload of a Firebase ID token. Custom claims sit at the top level.
#[derive(Debug, Deserialize)]
struct FirebaseTokenClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    verified: Option<bool>,
}

impl From<FirebaseTokenClaims> for Claims {
    fn from(token: FirebaseTokenClaims) -> Self {
        Claims {
            uid: token.sub,
            email: token.email.unwrap_or_default().to_lowercase(),
            role: token.role.as_deref().and_then(Role::parse),
            verified: token.verified.unwrap_or(false),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ServiceAccount {
    client_email: String,
    private_key: String,
    #[serde(default)]
    private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedKeys {
    keys: JwkSet,
    fetched_at: Instant,
    ttl: Duration,
}

struct CachedToken {
    token: String,
    expires_at: Instant,
}

pub struct FirebaseIdentity {
    project_id: String,
    http: reqwest::Client,
    service_account: Option<ServiceAccount>,
    keys: RwLock<Option<CachedKeys>>,
    access_token: Mutex<Option<CachedToken>>,
}

impl FirebaseIdentity {
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        let service_account = match &config.service_account_path {
            Some(path) => Some(load_service_account(path)?),
            None => {
                log::warn!("⚠️  GOOGLE_APPLICATION_CREDENTIALS not set: custom claims will not be written");
                None
            }
        };

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            project_id: config.firebase_project_id.clone(),
            http,
            service_account,
            keys: RwLock::new(None),
            access_token: Mutex::new(None),
        })
    }

    fn issuer(&self) -> String {
        format!("https://securetoken.google.com/{}", self.project_id)
    }

    /// Returns the signing key for `kid`, refreshing the cached key set when it
    /// is stale or does not know the key yet (provider key rotation).
    async fn signing_key(&self, kid: &str) -> Result<DecodingKey, AppError> {
        {
            let cache = self.keys.read().await;
            if let Some(cached) = cache.as_ref() {
                if cached.fetched_at.elapsed() < cached.ttl {
                    if let Some(jwk) = cached.keys.find(kid) {
                        return DecodingKey::from_jwk(jwk)
                            .map_err(|e| AppError::Unauthorized(format!("Unusable signing key: {}", e)));
                    }
                }
            }
        }

        let fresh = self.fetch_keys().await?;
        let key = fresh
            .keys
            .find(kid)
            .ok_or_else(|| AppError::Unauthorized("Unknown token signing key".to_string()))
            .and_then(|jwk| {
                DecodingKey::from_jwk(jwk)
                    .map_err(|e| AppError::Unauthorized(format!("Unusable signing key: {}", e)))
            });

        *self.keys.write().await = Some(fresh);
        key
    }

    async fn fetch_keys(&self) -> Result<CachedKeys, AppError> {
        log::debug!("🔑 Fetching identity provider signing keys");

        let response = self
            .http
            .get(JWKS_URL)
            .send()
            .await
            .map_err(|e| AppError::IdentityError(format!("Failed to fetch signing keys: {}", e)))?;

        let ttl = cache_max_age(response.headers()).unwrap_or(DEFAULT_KEYS_TTL);
        let keys = response
            .error_for_status()
            .map_err(|e| AppError::IdentityError(format!("Signing keys request failed: {}", e)))?
            .json::<JwkSet>()
            .await
            .map_err(|e| AppError::IdentityError(format!("Invalid signing keys payload: {}", e)))?;

        Ok(CachedKeys {
            keys,
            fetched_at: Instant::now(),
            ttl,
        })
    }

    async fn access_token(&self, account: &ServiceAccount) -> Result<String, AppError> {
        let mut cached = self.access_token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() + TOKEN_EXPIRY_MARGIN < token.expires_at {
                return Ok(token.token.clone());
            }
        }

        let now = chrono::Utc::now().timestamp();
        let assertion_claims = AssertionClaims {
            iss: &account.client_email,
            scope: OAUTH_SCOPES,
            aud: &account.token_uri,
            iat: now,
            exp: now + 3600,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = account.private_key_id.clone();

        let key = EncodingKey::from_rsa_pem(account.private_key.as_bytes())
            .map_err(|e| AppError::Config(format!("Invalid service account key: {}", e)))?;
        let assertion = encode(&header, &assertion_claims, &key)
            .map_err(|e| AppError::IdentityError(format!("Failed to sign assertion: {}", e)))?;

        let response = self
            .http
            .post(&account.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::IdentityError(format!("Token exchange failed: {}", e)))?
            .error_for_status()
            .map_err(|e| AppError::IdentityError(format!("Token exchange rejected: {}", e)))?
            .json::<AccessTokenResponse>()
            .await
            .map_err(|e| AppError::IdentityError(format!("Invalid token response: {}", e)))?;

        let token = response.access_token.clone();
        *cached = Some(CachedToken {
            token: response.access_token,
            expires_at: Instant::now() + Duration::from_secs(response.expires_in),
        });

        Ok(token)
    }

    async fn accounts_call(&self, action: &str, body: serde_json::Value) -> Result<(), AppError> {
        let Some(account) = self.service_account.as_ref() else {
            log::warn!("⚠️  Skipping accounts:{} (no service account configured)", action);
            return Ok(());
        };

        let token = self.access_token(account).await?;
        let url = format!("{}/{}/accounts:{}", IDENTITY_TOOLKIT_URL, self.project_id, action);

        self.http
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::IdentityError(format!("accounts:{} failed: {}", action, e)))?
            .error_for_status()
            .map_err(|e| AppError::IdentityError(format!("accounts:{} rejected: {}", action, e)))?;

        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentity {
    async fn verify_token(&self, token: &str) -> Result<Claims, AppError> {
        let unauthorized = |reason: String| {
            log::debug!("🔒 Token rejected: {}", reason);
            AppError::Unauthorized("Invalid or expired token".to_string())
        };

        let header = decode_header(token).map_err(|e| unauthorized(e.to_string()))?;
        if header.alg != Algorithm::RS256 {
            return Err(unauthorized(format!("unexpected algorithm {:?}", header.alg)));
        }
        let kid = header
            .kid
            .ok_or_else(|| unauthorized("missing kid".to_string()))?;

        let key = self
            .signing_key(&kid)
            .await
            .map_err(|e| unauthorized(e.to_string()))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.project_id]);
        validation.set_issuer(&[self.issuer()]);

        let data = decode::<FirebaseTokenClaims>(token, &key, &validation)
            .map_err(|e| unauthorized(e.to_string()))?;

        if data.claims.sub.is_empty() {
            return Err(unauthorized("empty subject".to_string()));
        }

        Ok(data.claims.into())
    }

    async fn set_custom_claims(&self, uid: &str, role: Role, verified: bool) -> Result<(), AppError> {
        let attributes = serde_json::json!({ "role": role.as_str(), "verified": verified });
        log::info!("🏷️  Setting custom claims for {}: {}", uid, attributes);

        self.accounts_call(
            "update",
            serde_json::json!({
                "localId": uid,
                "customAttributes": attributes.to_string(),
            }),
        )
        .await
    }

    async fn delete_user(&self, uid: &str) -> Result<(), AppError> {
        log::info!("🗑️  Deleting identity provider account {}", uid);
        self.accounts_call("delete", serde_json::json!({ "localId": uid })).await
    }
}

fn load_service_account(path: &Path) -> Result<ServiceAccount, AppError> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        AppError::Config(format!("Cannot read service account {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&raw)
        .map_err(|e| AppError::Config(format!("Invalid service account {}: {}", path.display(), e)))
}

/// `max-age` from a Cache-Control header, used as the key set lifetime.
fn cache_max_age(headers: &HeaderMap) -> Option<Duration> {
    let value = headers.get(CACHE_CONTROL)?.to_str().ok()?;
    value
        .split(',')
        .map(str::trim)
        .find_map(|directive| directive.strip_prefix("max-age="))
        .and_then(|secs| secs.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn reads_max_age_from_cache_control() {
        let mut headers = HeaderMap::new();
        headers.insert(
            CACHE_CONTROL,
            HeaderValue::from_static("public, max-age=19302, must-revalidate, no-transform"),
        );
        assert_eq!(cache_max_age(&headers), Some(Duration::from_secs(19302)));
    }

    #[test]
    fn missing_or_malformed_cache_control_yields_none() {
        assert_eq!(cache_max_age(&HeaderMap::new()), None);

        let mut headers = HeaderMap::new();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        assert_eq!(cache_max_age(&headers), None);
    }

    #[test]
    fn token_claims_map_custom_attributes() {
        let token: FirebaseTokenClaims = serde_json::from_value(serde_json::json!({
            "sub": "uid-1",
            "email": "Asha@College.edu",
            "role": "clubMember",
            "verified": true,
            "aud": "project",
        }))
        .unwrap();
        let claims: Claims = token.into();
        assert_eq!(claims.uid, "uid-1");
        assert_eq!(claims.email, "asha@college.edu");
        assert_eq!(claims.role, Some(Role::ClubMember));
        assert!(claims.verified);
    }

    #[test]
    fn unknown_role_claim_is_dropped() {
        let token: FirebaseTokenClaims =
            serde_json::from_value(serde_json::json!({ "sub": "uid-2", "role": "root" })).unwrap();
        let claims: Claims = token.into();
        assert_eq!(claims.role, None);
        assert!(!claims.verified);
        assert_eq!(claims.email, "");
    }

    #[tokio::test]
    async fn rejects_garbage_tokens_without_network() {
        let config = AppConfig::from_lookup(|key| match key {
            "DATABASE_URL" => Some("mongodb://localhost/test".to_string()),
            "COLLEGE_DOMAIN" => Some("college.edu".to_string()),
            "FIREBASE_PROJECT_ID" => Some("alumni-connect-dev".to_string()),
            _ => None,
        })
        .unwrap();
        let identity = FirebaseIdentity::new(&config).unwrap();

        let err = identity.verify_token("not-a-jwt").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
