//! White-label brand settings, stored per hostname.
//!
//! A stored override is merged over the configured defaults on read. Writes merge
//!  the accepted fields of an update over the current effective settings.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use common::store::{KvError, KvStore};

pub const BRAND_KEY_PREFIX: &str = "config:brand:";
/// Longest stored string field, in characters
pub const MAX_FIELD_LENGTH: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Brand {
    pub name: String,
    pub tagline: String,
    pub logo: Option<String>,
    pub primary_color: String,
    pub domain: String,
    pub support_email: String,
}

impl Default for Brand {
    fn default() -> Self {
        Self {
            name: "Deadrop".to_string(),
            tagline: "Share a secret. It burns after reading.".to_string(),
            logo: None,
            primary_color: "#ef4444".to_string(),
            domain: String::new(),
            support_email: String::new(),
        }
    }
}

/// Sanitized partial update. Absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrandUpdate {
    pub name: Option<String>,
    pub tagline: Option<String>,
    /// `Some(None)` clears the logo
    pub logo: Option<Option<String>>,
    pub primary_color: Option<String>,
    pub domain: Option<String>,
    pub support_email: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum BrandError {
    #[error("Missing brand object in request body")]
    MissingBrand,
    #[error("primaryColor must be a valid hex color (e.g. #ef4444)")]
    InvalidColor,
    #[error("storage error: {0}")]
    Storage(#[from] KvError),
}

fn is_hex_color(s: &str) -> bool {
    s.strip_prefix('#').is_some_and(|hex| {
        (3..=8).contains(&hex.len()) && hex.bytes().all(|b| b.is_ascii_hexdigit())
    })
}

fn sanitize(s: &str) -> String {
    s.trim().chars().take(MAX_FIELD_LENGTH).collect()
}

impl BrandUpdate {
    /// Extract an update from a `{ "brand": { ... } }` body.
    ///
    /// Unknown keys are dropped. String fields are trimmed and truncated; non-string
    ///  values are ignored, except `logo`, where any non-string clears it.
    pub fn from_body(body: &Value) -> Result<Self, BrandError> {
        let brand = body
            .get("brand")
            .and_then(Value::as_object)
            .ok_or(BrandError::MissingBrand)?;

        let text = |map: &Map<String, Value>, key: &str| map.get(key)?.as_str().map(sanitize);

        let update = Self {
            name: text(brand, "name"),
            tagline: text(brand, "tagline"),
            logo: brand
                .get("logo")
                .map(|logo| logo.as_str().map(str::to_string)),
            primary_color: text(brand, "primaryColor"),
            domain: text(brand, "domain"),
            support_email: text(brand, "supportEmail"),
        };

        match &update.primary_color {
            // an empty color is ignored rather than rejected
            Some(color) if !color.is_empty() && !is_hex_color(color) => {
                Err(BrandError::InvalidColor)
            }
            _ => Ok(update),
        }
    }

    pub fn apply(self, brand: &mut Brand) {
        if let Some(name) = self.name {
            brand.name = name;
        }
        if let Some(tagline) = self.tagline {
            brand.tagline = tagline;
        }
        if let Some(logo) = self.logo {
            brand.logo = logo;
        }
        if let Some(color) = self.primary_color {
            brand.primary_color = color;
        }
        if let Some(domain) = self.domain {
            brand.domain = domain;
        }
        if let Some(email) = self.support_email {
            brand.support_email = email;
        }
    }
}

/// Reads and writes brand overrides in the key-value store
#[derive(Debug, Clone)]
pub struct BrandSettings {
    store: Arc<dyn KvStore>,
    defaults: Brand,
    timeout: Duration,
}

impl BrandSettings {
    pub fn new(store: Arc<dyn KvStore>, defaults: Brand, timeout: Duration) -> Self {
        Self {
            store,
            defaults,
            timeout,
        }
    }

    fn key(hostname: &str) -> String {
        format!("{}{}", BRAND_KEY_PREFIX, hostname)
    }

    async fn bounded<T>(
        &self,
        op: impl std::future::Future<Output = Result<T, KvError>>,
    ) -> Result<T, KvError> {
        tokio::time::timeout(self.timeout, op)
            .await
            .map_err(|_| KvError::Timeout(self.timeout))?
    }

    /// Effective settings for `hostname`. Unreadable overrides fall back to defaults.
    pub async fn load(&self, hostname: Option<&str>) -> Result<Brand, KvError> {
        let Some(hostname) = hostname else {
            return Ok(self.defaults.clone());
        };
        let stored = self.bounded(self.store.get(&Self::key(hostname))).await?;
        let Some(stored) = stored else {
            return Ok(self.defaults.clone());
        };

        // stored values are partial; merge them field by field over the defaults
        let mut merged = match serde_json::to_value(&self.defaults) {
            Ok(Value::Object(map)) => map,
            _ => return Ok(self.defaults.clone()),
        };
        match serde_json::from_str::<Map<String, Value>>(&stored) {
            Ok(overrides) => merged.extend(overrides),
            Err(e) => {
                tracing::warn!(%hostname, "ignoring unreadable brand override: {}", e);
                return Ok(self.defaults.clone());
            }
        }
        Ok(serde_json::from_value(Value::Object(merged)).unwrap_or_else(|e| {
            tracing::warn!(%hostname, "ignoring malformed brand override: {}", e);
            self.defaults.clone()
        }))
    }

    /// Merge `update` over the current settings for `hostname` and persist the result
    pub async fn save(&self, hostname: &str, update: BrandUpdate) -> Result<Brand, BrandError> {
        let mut brand = self.load(Some(hostname)).await?;
        update.apply(&mut brand);

        let value = serde_json::to_string(&brand)
            .map_err(|e| KvError::Backend(format!("encode brand: {}", e)))?;
        self.bounded(self.store.put(&Self::key(hostname), value, None))
            .await?;
        tracing::info!(%hostname, "brand settings updated");
        Ok(brand)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use common::store::MemoryKvStore;

    use super::*;

    fn settings() -> (BrandSettings, MemoryKvStore) {
        let store = MemoryKvStore::new();
        let settings = BrandSettings::new(
            Arc::new(store.clone()),
            Brand::default(),
            Duration::from_secs(1),
        );
        (settings, store)
    }

    #[test]
    fn test_update_sanitizes() {
        let long = "x".repeat(500);
        let update = BrandUpdate::from_body(&json!({
            "brand": {
                "name": "  Acme  ",
                "tagline": long,
                "primaryColor": "#ABCDEF",
                "supportEmail": 42,
                "admin": true,
            }
        }))
        .unwrap();

        assert_eq!(update.name.as_deref(), Some("Acme"));
        assert_eq!(update.tagline.as_ref().map(|t| t.len()), Some(MAX_FIELD_LENGTH));
        assert_eq!(update.primary_color.as_deref(), Some("#ABCDEF"));
        assert_eq!(update.support_email, None);
        assert_eq!(update.logo, None);
    }

    #[test]
    fn test_update_logo_handling() {
        let set = BrandUpdate::from_body(&json!({"brand": {"logo": "https://x/logo.png"}})).unwrap();
        assert_eq!(set.logo, Some(Some("https://x/logo.png".to_string())));

        let cleared = BrandUpdate::from_body(&json!({"brand": {"logo": null}})).unwrap();
        assert_eq!(cleared.logo, Some(None));

        let bogus = BrandUpdate::from_body(&json!({"brand": {"logo": 7}})).unwrap();
        assert_eq!(bogus.logo, Some(None));
    }

    #[test]
    fn test_update_rejects_bad_input() {
        assert!(matches!(
            BrandUpdate::from_body(&json!({"name": "Acme"})),
            Err(BrandError::MissingBrand)
        ));
        assert!(matches!(
            BrandUpdate::from_body(&json!({"brand": "Acme"})),
            Err(BrandError::MissingBrand)
        ));
        for color in ["red", "#12", "#123456789", "#ggg", "ef4444"] {
            assert!(
                matches!(
                    BrandUpdate::from_body(&json!({"brand": {"primaryColor": color}})),
                    Err(BrandError::InvalidColor)
                ),
                "{color}"
            );
        }
    }

    #[tokio::test]
    async fn test_load_defaults_and_overrides() {
        let (settings, store) = settings();
        assert_eq!(settings.load(None).await.unwrap(), Brand::default());
        assert_eq!(
            settings.load(Some("a.example")).await.unwrap(),
            Brand::default()
        );

        store
            .put(
                "config:brand:a.example",
                json!({"name": "Acme"}).to_string(),
                None,
            )
            .await
            .unwrap();
        let brand = settings.load(Some("a.example")).await.unwrap();
        assert_eq!(brand.name, "Acme");
        assert_eq!(brand.primary_color, Brand::default().primary_color);

        store
            .put("config:brand:b.example", "not json".into(), None)
            .await
            .unwrap();
        assert_eq!(
            settings.load(Some("b.example")).await.unwrap(),
            Brand::default()
        );
    }

    #[tokio::test]
    async fn test_save_merges_per_host() {
        let (settings, _store) = settings();

        let update = BrandUpdate {
            name: Some("Acme".into()),
            ..Default::default()
        };
        settings.save("a.example", update).await.unwrap();

        let update = BrandUpdate {
            primary_color: Some("#000".into()),
            ..Default::default()
        };
        let saved = settings.save("a.example", update).await.unwrap();
        assert_eq!(saved.name, "Acme");
        assert_eq!(saved.primary_color, "#000");

        assert_eq!(settings.load(Some("a.example")).await.unwrap(), saved);
        assert_eq!(
            settings.load(Some("b.example")).await.unwrap(),
            Brand::default()
        );
    }
}
