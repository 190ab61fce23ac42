//! Test helpers for building catalogs without going through YAML

#![cfg(test)]

use crate::catalog::{Catalog, Category, Template};
use std::collections::BTreeMap;

/// Builder for an in-memory catalog
#[derive(Default)]
pub struct CatalogBuilder {
    categories: BTreeMap<String, Category>,
}

/// Builder for a single template
pub struct TemplateBuilder {
    template: Template,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(mut self, key: &str, description: &str) -> Self {
        self.categories
            .entry(key.to_string())
            .or_default()
            .description = description.to_string();
        self
    }

    /// Add a template; the category is created when missing
    pub fn template(mut self, category: &str, key: &str, template: TemplateBuilder) -> Self {
        self.categories
            .entry(category.to_string())
            .or_default()
            .options
            .insert(key.to_string(), template.build());
        self
    }

    pub fn build(self) -> Catalog {
        Catalog::from(self.categories)
    }

    /// The catalog as the YAML document served by the repository
    pub fn to_yaml(&self) -> String {
        serde_yaml::to_string(&self.categories).unwrap()
    }
}

impl TemplateBuilder {
    pub fn new(description: &str) -> Self {
        Self {
            template: Template {
                desc: description.to_string(),
                ..Template::default()
            },
        }
    }

    pub fn var(mut self, name: &str) -> Self {
        self.template.vars.push(name.to_string());
        self
    }

    pub fn url(mut self, url: &str) -> Self {
        self.template.urls.push(url.to_string());
        self
    }

    pub fn bundle(mut self, url: &str) -> Self {
        self.template.bundle = Some(url.to_string());
        self
    }

    pub fn dir(mut self, dir: &str) -> Self {
        self.template.dirs.push(dir.to_string());
        self
    }

    pub fn help(mut self, path: &str) -> Self {
        self.template.help = Some(path.to_string());
        self
    }

    pub fn version(mut self, app: &str) -> Self {
        self.template.versions.push(app.to_string());
        self
    }

    pub fn build(self) -> Template {
        self.template
    }
}
