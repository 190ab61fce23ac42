//! Remote catalog of categories and templates
//!
//! The catalog is a YAML mapping fetched once per session from `{base_url}/docker.yml`:
//!
//! ```yaml
//! web:
//!   description: Web servers
//!   options:
//!     nginx:
//!       desc: Nginx reverse proxy
//!       vars: [port]
//!       urls: [nginx/docker-compose.yml, nginx/nginx.conf.j2]
//!       dirs: [logs]
//!       help: nginx/README
//!       versions: [nginx]
//! ```

use crate::config::Settings;
use crate::error::WizardError;
use crate::traits::{HttpClient, MenuItem};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Catalog document path relative to the base URL
pub const CATALOG_PATH: &str = "docker.yml";

/// Category key → category, immutable after loading
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    categories: BTreeMap<String, Category>,
}

/// A named grouping of templates
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Category {
    #[serde(default)]
    pub description: String,

    /// Template key → template
    #[serde(default)]
    pub options: BTreeMap<String, Template>,
}

/// A preconfigured application deployment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Template {
    #[serde(default, alias = "description")]
    pub desc: String,

    /// Variables the user must fill in
    #[serde(default)]
    pub vars: Vec<String>,

    /// Files to download; `.j2` files are rendered first
    #[serde(default)]
    pub urls: Vec<String>,

    /// Compressed tar archive unpacked into the working directory
    #[serde(default)]
    pub bundle: Option<String>,

    /// Subdirectories created inside the working directory
    #[serde(default)]
    pub dirs: Vec<String>,

    /// Help document shown after a successful installation
    #[serde(default)]
    pub help: Option<String>,

    /// Applications whose image tag the user picks
    #[serde(default)]
    pub versions: Vec<String>,
}

impl Catalog {
    /// Parse a catalog document
    pub fn from_yaml(content: &str) -> Result<Self> {
        let catalog: Catalog = serde_yaml::from_str(content)
            .map_err(|e| WizardError::CatalogFetch(format!("invalid catalog document: {}", e)))?;

        if catalog.categories.is_empty() {
            return Err(WizardError::CatalogFetch("catalog has no categories".to_string()).into());
        }

        Ok(catalog)
    }

    pub fn category(&self, key: &str) -> Option<&Category> {
        self.categories.get(key)
    }

    pub fn template(&self, category: &str, template: &str) -> Option<&Template> {
        self.category(category)?.options.get(template)
    }

    /// Category menu, sorted by key
    pub fn category_items(&self) -> Vec<MenuItem> {
        self.categories
            .iter()
            .map(|(key, category)| MenuItem::new(key, &category.description))
            .collect()
    }
}

impl From<BTreeMap<String, Category>> for Catalog {
    fn from(categories: BTreeMap<String, Category>) -> Self {
        Self { categories }
    }
}

impl Category {
    /// Template menu, sorted by key
    pub fn template_items(&self) -> Vec<MenuItem> {
        self.options
            .iter()
            .map(|(key, template)| MenuItem::new(key, &template.desc))
            .collect()
    }
}

/// Fetch and parse the catalog. Any failure is a `CatalogFetch` error.
pub fn load(http: &dyn HttpClient, settings: &Settings) -> Result<Catalog> {
    let url = settings
        .resolve(CATALOG_PATH)
        .map_err(|e| WizardError::CatalogFetch(format!("{:#}", e)))?;

    log::info!("Loading catalog from {}", url);

    let content = http
        .get_text(url.as_str())
        .map_err(|e| WizardError::CatalogFetch(format!("{:#}", e)))?;

    let catalog = Catalog::from_yaml(&content)?;
    log::info!("Catalog loaded with {} categories", catalog.categories.len());

    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MockHttpClient;

    const DOCUMENT: &str = r#"
web:
  description: Web servers
  options:
    nginx:
      desc: Nginx
      vars: [port]
      urls: [nginx.conf.j2]
    apache:
      description: Apache httpd
      bundle: apache/site.tar.gz
      dirs: [htdocs, logs]
      help: apache/README
      versions: [httpd]
db:
  description: Databases
"#;

    #[test]
    fn test_parse_document() {
        let catalog = Catalog::from_yaml(DOCUMENT).unwrap();

        let nginx = catalog.template("web", "nginx").unwrap();
        assert_eq!(nginx.desc, "Nginx");
        assert_eq!(nginx.vars, vec!["port"]);
        assert_eq!(nginx.urls, vec!["nginx.conf.j2"]);
        assert!(nginx.bundle.is_none());

        let apache = catalog.template("web", "apache").unwrap();
        assert_eq!(apache.desc, "Apache httpd");
        assert_eq!(apache.bundle.as_deref(), Some("apache/site.tar.gz"));
        assert_eq!(apache.dirs, vec!["htdocs", "logs"]);
        assert_eq!(apache.help.as_deref(), Some("apache/README"));
        assert_eq!(apache.versions, vec!["httpd"]);

        assert!(catalog.category("db").unwrap().options.is_empty());
    }

    #[test]
    fn test_unknown_keys_are_rejected_lookups() {
        let catalog = Catalog::from_yaml(DOCUMENT).unwrap();
        assert!(catalog.category("mail").is_none());
        assert!(catalog.template("web", "caddy").is_none());
        assert!(catalog.template("mail", "nginx").is_none());
    }

    #[test]
    fn test_menus_are_sorted() {
        let catalog = Catalog::from_yaml(DOCUMENT).unwrap();
        let keys: Vec<String> = catalog.category_items().into_iter().map(|i| i.key).collect();
        assert_eq!(keys, vec!["db", "web"]);

        let templates = catalog.category("web").unwrap().template_items();
        assert_eq!(templates[0], MenuItem::new("apache", "Apache httpd"));
        assert_eq!(templates[1], MenuItem::new("nginx", "Nginx"));
    }

    #[test]
    fn test_invalid_document() {
        let err = Catalog::from_yaml("- just\n- a list\n").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<WizardError>(),
            Some(WizardError::CatalogFetch(_))
        ));
    }

    #[test]
    fn test_empty_catalog_rejected() {
        assert!(Catalog::from_yaml("{}").is_err());
    }

    #[test]
    fn test_load_fetches_fixed_path() {
        let temp = tempfile::tempdir().unwrap();
        let settings = Settings::for_tests(temp.path());
        let http =
            MockHttpClient::new().with_response("http://repo.test/docker/docker.yml", DOCUMENT);

        let catalog = load(&http, &settings).unwrap();

        assert!(catalog.category("web").is_some());
        assert_eq!(http.requests(), vec!["http://repo.test/docker/docker.yml"]);
    }

    #[test]
    fn test_load_network_failure_is_catalog_error() {
        let temp = tempfile::tempdir().unwrap();
        let settings = Settings::for_tests(temp.path());
        let http = MockHttpClient::new()
            .with_error("http://repo.test/docker/docker.yml", "Connection refused");

        let err = load(&http, &settings).unwrap_err();
        match err.downcast_ref::<WizardError>() {
            Some(WizardError::CatalogFetch(msg)) => assert!(msg.contains("Connection refused")),
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
