use serde::{Deserialize, Serialize};

/// A selectable model and whether the user still has to supply an API key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Model {
    pub name: String,
    #[serde(default)]
    pub requires_key: bool,
}

/// A vendor grouping of models, rendered as one labeled selector group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    #[serde(rename = "company")]
    pub name: String,
    #[serde(default)]
    pub models: Vec<Model>,
}

/// Ordered model catalog as returned by `get_models`.
///
/// The catalog is replaced wholesale on every load; the only in-place
/// mutation is [`ModelCatalog::set_requires_key`] after a key save/clear.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelCatalog {
    companies: Vec<Company>,
}

impl ModelCatalog {
    pub fn new(companies: Vec<Company>) -> Self {
        Self { companies }
    }

    pub fn companies(&self) -> &[Company] {
        &self.companies
    }

    /// `true` when there are no company groups at all.
    pub fn is_empty(&self) -> bool {
        self.companies.is_empty()
    }

    /// Total number of selectable models across all groups.
    pub fn model_count(&self) -> usize {
        self.companies.iter().map(|c| c.models.len()).sum()
    }

    /// First model of the first company, used for startup auto-selection.
    ///
    /// Returns `None` when the first company has no models, even if a later
    /// company does.
    pub fn first_model(&self) -> Option<&Model> {
        self.companies.first()?.models.first()
    }

    /// Finds a model by name across all companies.
    pub fn find(&self, name: &str) -> Option<&Model> {
        self.companies
            .iter()
            .flat_map(|c| c.models.iter())
            .find(|m| m.name == name)
    }

    /// Patches `requires_key` on every entry named `name`.
    /// Returns `true` if at least one entry was found.
    pub fn set_requires_key(&mut self, name: &str, requires_key: bool) -> bool {
        let mut found = false;
        for model in self
            .companies
            .iter_mut()
            .flat_map(|c| c.models.iter_mut())
            .filter(|m| m.name == name)
        {
            model.requires_key = requires_key;
            found = true;
        }
        found
    }

    pub fn clear(&mut self) {
        self.companies.clear();
    }
}
