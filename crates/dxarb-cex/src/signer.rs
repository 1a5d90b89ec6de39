//! Request signing for private CEX endpoints.
//!
//! The exchange expects an HMAC-SHA256 hex digest of the parameters sorted
//! by name and joined as `k=v&k=v`. The digest is sent as the `signature`
//! parameter; the API key goes in a header.

use crate::error::{CexError, CexResult};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::BTreeMap;
use std::fmt;
use zeroize::Zeroizing;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "X-MBX-APIKEY";

/// Credentials for the secondary trading account, preferred when present.
const ACCOUNT_KEY_VARS: (&str, &str) = ("XT_ACCOUNT_2_API_KEY", "XT_ACCOUNT_2_API_SECRET");
const DEFAULT_KEY_VARS: (&str, &str) = ("XT_API_KEY", "XT_API_SECRET");

/// API key and secret. The secret is zeroed on drop and never printed.
#[derive(Clone)]
pub struct ApiCredentials {
    api_key: String,
    secret: Zeroizing<String>,
}

impl ApiCredentials {
    pub fn new(api_key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            secret: Zeroizing::new(secret.into()),
        }
    }

    /// Resolve credentials through `lookup`, trying the secondary account
    /// pair first. Blank values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Option<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        [ACCOUNT_KEY_VARS, DEFAULT_KEY_VARS]
            .iter()
            .find_map(|(key_var, secret_var)| match (get(key_var), get(secret_var)) {
                (Some(key), Some(secret)) => Some(Self::new(key, secret)),
                _ => None,
            })
    }

    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let visible: String = self.api_key.chars().take(4).collect();
        f.debug_struct("ApiCredentials")
            .field("api_key", &format!("{visible}..."))
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Signs parameter sets with the account secret.
#[derive(Debug, Clone)]
pub struct RequestSigner {
    credentials: ApiCredentials,
}

impl RequestSigner {
    pub fn new(credentials: ApiCredentials) -> Self {
        Self { credentials }
    }

    pub fn api_key(&self) -> &str {
        self.credentials.api_key()
    }

    /// `k=v&k=v` with keys in ascending order.
    pub fn canonical_query(params: &BTreeMap<String, String>) -> String {
        params
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Hex signature of `params`.
    pub fn sign(&self, params: &BTreeMap<String, String>) -> CexResult<String> {
        hmac_sha256_hex(&self.credentials.secret, &Self::canonical_query(params))
    }

    /// Add `timestamp` and `signature` to `params`.
    pub fn sign_params(
        &self,
        mut params: BTreeMap<String, String>,
        timestamp_ms: i64,
    ) -> CexResult<BTreeMap<String, String>> {
        params.insert("timestamp".to_string(), timestamp_ms.to_string());
        let signature = self.sign(&params)?;
        params.insert("signature".to_string(), signature);
        Ok(params)
    }
}

pub fn hmac_sha256_hex(secret: &str, message: &str) -> CexResult<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| CexError::HttpClient(format!("Invalid signing key: {e}")))?;
    mac.update(message.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}
