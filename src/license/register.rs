use std::fs;

use log::{debug, Logger};
use serde_json::Value;
use url::Url;

use crate::config::Config;
use crate::errors::BackendError;
use crate::i18n::Translate;
use crate::license::{builtin, License, LicenseDescriptor};

/// Dictionary-like, read-only collection of licenses.
///
/// Built once at startup and safe to share for reads afterwards; there are
/// no update or delete operations. Lookups scan in insertion order, which is
/// fine for a collection bounded by tens of entries.
pub struct LicenseRegister {
    licenses: Vec<License>,
}

impl LicenseRegister {
    /// Builds the register `config` asks for: loaded from the external
    /// source when `licenses_group_url` is set, the built-in list otherwise.
    pub async fn new(
        config: &Config,
        translator: &dyn Translate,
        logger: &Logger,
    ) -> Result<Self, BackendError> {
        match &config.licenses_group_url {
            Some(source) => Self::load(source, translator, logger).await,
            None => Self::builtin(translator),
        }
    }

    /// Builds the register from the built-in license list.
    pub fn builtin(translator: &dyn Translate) -> Result<Self, BackendError> {
        let licenses = builtin::descriptors()
            .into_iter()
            .map(|descriptor| License::new(descriptor, translator))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(LicenseRegister { licenses })
    }

    /// Loads the register from a `file://` path or an HTTP URL pointing at a
    /// JSON document: either a list of descriptors or a mapping from id to
    /// descriptor.
    pub async fn load(
        source: &str,
        translator: &dyn Translate,
        logger: &Logger,
    ) -> Result<Self, BackendError> {
        debug!(logger, "Loading licenses..."; "source" => source);

        let text = if let Some(path) = source.strip_prefix("file://") {
            fs::read_to_string(path).map_err(|e| BackendError::LicenseSourceRead {
                url: source.to_string(),
                source: e,
            })?
        } else {
            let url = Url::parse(source).map_err(|e| BackendError::InvalidLicenseSource {
                url: source.to_string(),
                source: e,
            })?;

            let fetch_error = |e: reqwest::Error| BackendError::LicenseSourceFetch {
                url: source.to_string(),
                source: e,
            };

            reqwest::get(url)
                .await
                .and_then(|response| response.error_for_status())
                .map_err(fetch_error)?
                .text()
                .await
                .map_err(fetch_error)?
        };

        let document: Value =
            serde_json::from_str(&text).map_err(|e| BackendError::LicenseSourceParse {
                url: source.to_string(),
                source: e,
            })?;

        let register = Self::from_document(document, source, translator)?;

        debug!(logger, "Loaded licenses."; "source" => source, "count" => register.len());

        Ok(register)
    }

    fn from_document(
        document: Value,
        source: &str,
        translator: &dyn Translate,
    ) -> Result<Self, BackendError> {
        let entries: Vec<Value> = match document {
            Value::Array(entries) => entries,
            // document order is preserved, see the serde_json features
            Value::Object(entries) => entries.into_iter().map(|(_, entry)| entry).collect(),
            _ => {
                return Err(BackendError::MalformedLicenseDocument {
                    url: source.to_string(),
                })
            }
        };

        let mut licenses = Vec::with_capacity(entries.len());

        for entry in entries {
            let descriptor: LicenseDescriptor =
                serde_json::from_value(entry).map_err(|e| BackendError::LicenseSourceParse {
                    url: source.to_string(),
                    source: e,
                })?;

            licenses.push(License::new(descriptor, translator)?);
        }

        Ok(LicenseRegister { licenses })
    }

    /// Returns the first license with the given id, if any. Callers wanting
    /// a fallback can chain `unwrap_or`-style combinators.
    pub fn get(&self, id: &str) -> Option<&License> {
        self.licenses.iter().find(|license| license.id == id)
    }

    /// Returns the first license with the given id, or a not-found error
    /// naming it.
    pub fn require(&self, id: &str) -> Result<&License, BackendError> {
        self.get(id)
            .ok_or_else(|| BackendError::LicenseNotFound(id.to_string()))
    }

    /// The license ids, in register order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.licenses.iter().map(|license| license.id.as_str())
    }

    /// The licenses, in register order.
    pub fn values(&self) -> &[License] {
        &self.licenses
    }

    /// (id, license) pairs, in register order.
    pub fn items(&self) -> impl Iterator<Item = (&str, &License)> {
        self.licenses
            .iter()
            .map(|license| (license.id.as_str(), license))
    }

    /// Restartable iteration over the ids; each call starts a fresh pass.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys()
    }

    pub fn len(&self) -> usize {
        self.licenses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.licenses.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use log::{o, Discard, Logger};
    use serde_json::json;
    use tempfile::NamedTempFile;

    use super::*;
    use crate::i18n::{NoTranslation, TranslateFn};

    const BUILTIN_IDS: [&str; 15] = [
        "notspecified",
        "odc-pddl",
        "odc-odbl",
        "odc-by",
        "cc-zero",
        "cc-by",
        "cc-by-sa",
        "gfdl",
        "other-open",
        "other-pd",
        "other-at",
        "uk-ogl",
        "cc-nc",
        "other-nc",
        "other-closed",
    ];

    fn logger() -> Logger {
        Logger::root(Discard, o!())
    }

    fn builtin_register() -> LicenseRegister {
        LicenseRegister::builtin(&NoTranslation).unwrap()
    }

    fn temp_document(contents: &str) -> (NamedTempFile, String) {
        let mut file = NamedTempFile::new().expect("create temporary license file");
        file.write_all(contents.as_bytes())
            .expect("write temporary license file");

        let source = format!("file://{}", file.path().display());
        (file, source)
    }

    #[test]
    fn builtin_register_has_the_known_ids_in_order() {
        let register = builtin_register();

        assert_eq!(register.len(), BUILTIN_IDS.len());
        assert_eq!(register.keys().collect::<Vec<_>>(), BUILTIN_IDS);

        for id in &BUILTIN_IDS {
            let license = register.require(id).unwrap();
            assert_eq!(license.id, *id);
        }
    }

    #[test]
    fn builtin_openness_matches_the_conformance_fields() {
        let register = builtin_register();

        assert!(register.get("cc-by").unwrap().is_open());
        assert!(register.get("odc-pddl").unwrap().is_open());
        assert!(!register.get("other-nc").unwrap().is_open());
        assert!(!register.get("notspecified").unwrap().is_open());
    }

    #[test]
    fn missing_ids_are_none_or_an_error() {
        let register = builtin_register();

        assert!(register.get("nonexistent-id").is_none());
        assert_eq!(
            register
                .get("nonexistent-id")
                .map(|license| license.id.as_str())
                .unwrap_or("fallback"),
            "fallback"
        );

        match register.require("nonexistent-id") {
            Err(BackendError::LicenseNotFound(id)) => assert_eq!(id, "nonexistent-id"),
            other => panic!("expected a not-found error, got {:?}", other.map(|l| &l.id)),
        }
    }

    #[test]
    fn keys_values_and_items_line_up() {
        let register = builtin_register();

        assert_eq!(register.keys().count(), register.len());
        assert_eq!(register.values().len(), register.len());

        for (key, license) in register.items() {
            assert_eq!(key, license.id);
        }
    }

    #[test]
    fn iteration_is_restartable() {
        let register = builtin_register();

        let first: Vec<_> = register.iter().collect();
        let second: Vec<_> = register.iter().collect();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn loads_a_list_shaped_document_from_a_local_file() {
        let (_file, source) = temp_document(
            &json!([
                {"id": "mit", "title": "MIT licence", "is_osi_compliant": true},
                {"id": "uk-ogl", "title": "UK Open Government Licence", "od_conformance": "approved"}
            ])
            .to_string(),
        );

        let translator = TranslateFn(|text: &str| text.to_uppercase());
        let register = LicenseRegister::load(&source, &translator, &logger())
            .await
            .unwrap();

        assert_eq!(register.keys().collect::<Vec<_>>(), ["mit", "uk-ogl"]);

        let mit = register.require("mit").unwrap();
        assert_eq!(mit.title, "MIT LICENCE");
        assert!(mit.is_open());
    }

    #[tokio::test]
    async fn loads_a_map_shaped_document_from_a_local_file() {
        let (_file, source) = temp_document(
            &json!({
                "mit": {"id": "mit", "title": "MIT licence"},
                "cc-by": {"id": "cc-by", "title": "Creative Commons Attribution"}
            })
            .to_string(),
        );

        let register = LicenseRegister::load(&source, &NoTranslation, &logger())
            .await
            .unwrap();

        assert_eq!(register.len(), 2);
        assert!(register.get("mit").is_some());
        assert!(register.get("cc-by").is_some());
    }

    #[tokio::test]
    async fn a_scalar_document_is_malformed() {
        let (_file, source) = temp_document("42");

        assert!(matches!(
            LicenseRegister::load(&source, &NoTranslation, &logger()).await,
            Err(BackendError::MalformedLicenseDocument { .. })
        ));
    }

    #[tokio::test]
    async fn invalid_json_is_a_parse_error() {
        let (_file, source) = temp_document("{not json");

        assert!(matches!(
            LicenseRegister::load(&source, &NoTranslation, &logger()).await,
            Err(BackendError::LicenseSourceParse { .. })
        ));
    }

    #[tokio::test]
    async fn a_missing_file_is_a_read_error() {
        let result = LicenseRegister::load(
            "file:///nonexistent/licenses.json",
            &NoTranslation,
            &logger(),
        )
        .await;

        assert!(matches!(
            result,
            Err(BackendError::LicenseSourceRead { .. })
        ));
    }

    #[tokio::test]
    async fn config_selects_between_builtin_and_external() {
        let config = Config::default();
        let register = LicenseRegister::new(&config, &NoTranslation, &logger())
            .await
            .unwrap();
        assert_eq!(register.len(), BUILTIN_IDS.len());

        let (_file, source) = temp_document(&json!([{"id": "mit"}]).to_string());
        let config = Config {
            licenses_group_url: Some(source),
            ..Config::default()
        };

        let register = LicenseRegister::new(&config, &NoTranslation, &logger())
            .await
            .unwrap();
        assert_eq!(register.keys().collect::<Vec<_>>(), ["mit"]);
    }
}
