use super::stage::Stage;
use crate::catalog::{Catalog, Template};
use crate::error::WizardError;
use anyhow::Result;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Whether `value` counts as no input at all
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Mutable state of one wizard run, owned by the wizard loop.
///
/// Collected values (secrets included) live only here; they are never logged or persisted
/// except through rendered template files.
#[derive(Debug)]
pub struct Session {
    pub stage: Stage,
    category: Option<String>,
    template: Option<String>,
    variables: BTreeMap<String, String>,
    workdir: Option<PathBuf>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            stage: Stage::CategorySelect,
            category: None,
            template: None,
            variables: BTreeMap::new(),
            workdir: None,
        }
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn template_key(&self) -> Option<&str> {
        self.template.as_deref()
    }

    pub fn variables(&self) -> &BTreeMap<String, String> {
        &self.variables
    }

    pub fn workdir(&self) -> Option<&PathBuf> {
        self.workdir.as_ref()
    }

    /// Select a category; keys missing from the catalog are rejected
    pub fn select_category(&mut self, catalog: &Catalog, key: &str) -> Result<()> {
        if catalog.category(key).is_none() {
            return Err(WizardError::InputValidation(format!("Unknown category: {}", key)).into());
        }

        if self.category.as_deref() != Some(key) {
            self.template = None;
            self.workdir = None;
        }
        self.category = Some(key.to_string());
        Ok(())
    }

    /// Select a template of the current category; keys missing from the catalog are rejected
    pub fn select_template(
        &mut self,
        catalog: &Catalog,
        key: &str,
        workdir: PathBuf,
    ) -> Result<()> {
        let category = self
            .category
            .as_deref()
            .ok_or_else(|| WizardError::InputValidation("No category selected".to_string()))?;

        if catalog.template(category, key).is_none() {
            return Err(WizardError::InputValidation(format!(
                "Unknown template '{}' in category '{}'",
                key, category
            ))
            .into());
        }

        self.template = Some(key.to_string());
        self.workdir = Some(workdir);
        Ok(())
    }

    /// The selected template definition
    pub fn template<'c>(&self, catalog: &'c Catalog) -> Result<&'c Template> {
        let category = self
            .category
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("No category selected"))?;
        let template = self
            .template
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("No template selected"))?;

        catalog
            .template(category, template)
            .ok_or_else(|| anyhow::anyhow!("Template '{}/{}' not found", category, template))
    }

    /// Record a collected value; empty values never satisfy a variable
    pub fn record(&mut self, name: &str, value: String) -> Result<()> {
        if is_blank(&value) {
            let message = format!("Value for '{}' is empty", name);
            return Err(WizardError::InputValidation(message).into());
        }

        self.variables.insert(name.to_string(), value);
        Ok(())
    }

    pub fn is_satisfied(&self, name: &str) -> bool {
        self.variables
            .get(name)
            .is_some_and(|value| !is_blank(value))
    }

    /// Forget values collected for a previous template
    pub fn clear_variables(&mut self) {
        self.variables.clear();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
