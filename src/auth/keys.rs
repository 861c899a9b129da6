use jsonwebtoken::DecodingKey;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use thiserror::Error;

/// Modulus of the deployment's long-lived RS256 verification key (base64url, no padding).
const BUILTIN_MODULUS: &str = "72-uwG-Sv9uK2-uBIJDrLwZylkUobQz9necajaS1GN5HxYC8Jd4nMto2bFjyMlUaIWiirohMZo1eXfHt5fUxUupK6eDuobP2-IvE4Gk_pG4kaK88rZS1o6XSWX-FHrqZrVt2j0LAyqMF0-SFN6S332hlQge8_nfKHzeJIk8OZ_8j5CQ6wUxxLHwRiC_BK0Mcuy5xATZn1qq_0lf9Ikf37EyWUo0enhFYp7emivasV012cJmic1fcTFyBzeibmRQdNQpqflpITLeN9-6ah1nDNfs2KRbZdyrHkuVHdCh3MwHz7quAyKZwTCiWk8zOM8OF-qGuXMspdVAFAYw5XCjkRw";
/// 65537
const BUILTIN_EXPONENT: &str = "AQAB";

/// Where the RSA public key for token verification comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeySource {
    BuiltIn,
    Pem(String),
    PemFile(PathBuf),
    Components { modulus: String, exponent: String },
}

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("failed to read public key file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid RSA public key: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
}

impl KeySource {
    /// Picks the first configured source: JWT_PUBLIC_KEY, JWT_PUBLIC_KEY_FILE,
    /// then JWT_RSA_MODULUS + JWT_RSA_EXPONENT. None means "keep the default".
    pub fn from_env() -> Option<Self> {
        if let Ok(pem) = env::var("JWT_PUBLIC_KEY") {
            if !pem.trim().is_empty() {
                // Single-line env files carry the PEM with escaped newlines
                return Some(KeySource::Pem(pem.replace("\\n", "\n")));
            }
        }
        if let Ok(path) = env::var("JWT_PUBLIC_KEY_FILE") {
            if !path.trim().is_empty() {
                return Some(KeySource::PemFile(PathBuf::from(path)));
            }
        }
        if let Ok(modulus) = env::var("JWT_RSA_MODULUS") {
            let exponent = env::var("JWT_RSA_EXPONENT").unwrap_or_else(|_| BUILTIN_EXPONENT.to_string());
            return Some(KeySource::Components { modulus, exponent });
        }
        None
    }

    pub fn decoding_key(&self) -> Result<DecodingKey, KeyError> {
        let key = match self {
            KeySource::BuiltIn => DecodingKey::from_rsa_components(BUILTIN_MODULUS, BUILTIN_EXPONENT)?,
            KeySource::Pem(pem) => DecodingKey::from_rsa_pem(pem.as_bytes())?,
            KeySource::PemFile(path) => {
                let pem = std::fs::read(path).map_err(|source| KeyError::Io {
                    path: path.clone(),
                    source,
                })?;
                DecodingKey::from_rsa_pem(&pem)?
            }
            KeySource::Components { modulus, exponent } => {
                DecodingKey::from_rsa_components(modulus, exponent)?
            }
        };
        Ok(key)
    }
}
