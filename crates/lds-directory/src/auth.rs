use std::collections::HashMap;
use std::sync::Arc;

use subtle::ConstantTimeEq;
use tracing::debug;

use crate::config::DirectoryConfig;
use crate::error::AuthError;

/// Where per-layer secrets come from.
pub trait SecretSource: Send + Sync {
    /// Look up the secret stored under `key`.
    fn secret(&self, key: &str) -> Option<String>;
}

/// Reads secrets from the process environment.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnvSecrets;

impl SecretSource for EnvSecrets {
    fn secret(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// A fixed key/secret table.
#[derive(Clone, Debug, Default)]
pub struct StaticSecrets {
    secrets: HashMap<String, String>,
}

impl StaticSecrets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, secret: impl Into<String>) -> Self {
        self.secrets.insert(key.into(), secret.into());
        self
    }
}

impl SecretSource for StaticSecrets {
    fn secret(&self, key: &str) -> Option<String> {
        self.secrets.get(key).cloned()
    }
}

/// Checks layer credentials against a [`SecretSource`].
///
/// The check does not consult the loaded store: a layer needs a configured
/// secret, not a directory under `layers/`.
#[derive(Clone)]
pub struct LayerAuth {
    secrets: Arc<dyn SecretSource>,
    prefix: String,
    suffix: String,
}

impl std::fmt::Debug for LayerAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerAuth")
            .field("prefix", &self.prefix)
            .field("suffix", &self.suffix)
            .finish_non_exhaustive()
    }
}

impl LayerAuth {
    pub fn new(secrets: Arc<dyn SecretSource>, config: &DirectoryConfig) -> Self {
        Self {
            secrets,
            prefix: config.secret_prefix.clone(),
            suffix: config.secret_suffix.clone(),
        }
    }

    /// Environment-backed checker using the default naming convention.
    pub fn from_env() -> Self {
        Self::new(Arc::new(EnvSecrets), &DirectoryConfig::default())
    }

    /// The key a layer's secret is stored under, e.g. `LDAP_LAYER_PROD_PASSWORD`.
    pub fn secret_key(&self, layer: &str) -> String {
        format!("{}{}{}", self.prefix, layer.to_uppercase(), self.suffix)
    }

    /// Compare `credential` with the layer's secret, yielding the secret on a
    /// match. A layer without a configured secret rejects every credential.
    ///
    /// Equal-length inputs are compared in constant time.
    pub fn authenticate(&self, layer: &str, credential: &str) -> Result<String, AuthError> {
        let key = self.secret_key(layer);
        match self.secrets.secret(&key) {
            Some(secret) if secrets_match(&secret, credential) => Ok(secret),
            found => {
                debug!(%layer, configured = found.is_some(), "layer credential rejected");
                Err(AuthError::InvalidCredentials {
                    layer: layer.to_string(),
                })
            }
        }
    }
}

fn secrets_match(secret: &str, credential: &str) -> bool {
    secret.as_bytes().ct_eq(credential.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> LayerAuth {
        let secrets = StaticSecrets::new().with("LDAP_LAYER_PROD_PASSWORD", "right-secret");
        LayerAuth::new(Arc::new(secrets), &DirectoryConfig::default())
    }

    #[test]
    fn secret_key_uppercases_layer() {
        assert_eq!(auth().secret_key("prod"), "LDAP_LAYER_PROD_PASSWORD");
        assert_eq!(auth().secret_key("Staging"), "LDAP_LAYER_STAGING_PASSWORD");
    }

    #[test]
    fn correct_credential_yields_secret() {
        assert_eq!(auth().authenticate("prod", "right-secret").unwrap(), "right-secret");
    }

    #[test]
    fn wrong_credential_names_layer() {
        let err = auth().authenticate("prod", "wrong").unwrap_err();
        assert_eq!(
            err,
            AuthError::InvalidCredentials {
                layer: "prod".into()
            }
        );
        assert_eq!(err.to_string(), "invalid credentials for layer prod");
    }

    #[test]
    fn near_miss_credentials_are_rejected() {
        assert!(secrets_match("right-secret", "right-secret"));
        assert!(!secrets_match("right-secret", "right-secreT"));
        assert!(!secrets_match("right-secret", "right-secret-and-more"));
        assert!(!secrets_match("right-secret", "right"));
        assert!(!secrets_match("right-secret", ""));
        assert!(auth().authenticate("prod", "right-secret ").is_err());
    }

    #[test]
    fn unconfigured_layer_rejects_everything() {
        assert!(auth().authenticate("dev", "").is_err());
        assert!(auth().authenticate("dev", "right-secret").is_err());
    }

    #[test]
    fn custom_naming_convention() {
        let config = DirectoryConfig {
            secret_prefix: "LAYER_".into(),
            secret_suffix: "".into(),
            ..DirectoryConfig::default()
        };
        let auth = LayerAuth::new(Arc::new(StaticSecrets::new().with("LAYER_QA", "s")), &config);
        assert_eq!(auth.authenticate("qa", "s").unwrap(), "s");
    }

    #[test]
    fn env_secrets_read_process_environment() {
        std::env::set_var("LDAP_LAYER_LDSAUTHTEST_PASSWORD", "from-env");
        let auth = LayerAuth::from_env();
        assert_eq!(auth.authenticate("ldsauthtest", "from-env").unwrap(), "from-env");
        assert!(auth.authenticate("ldsauthtest", "nope").is_err());
    }
}
