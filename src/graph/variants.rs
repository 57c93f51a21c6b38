//! Attribute-selected extra dependencies of modules.

use crate::models::{ArtifactCoords, ModuleId};
use std::collections::{BTreeMap, BTreeSet};

/// Extra dependencies of one module, active when its attribute is selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    pub name: String,
    pub attribute: String,
    pub value: String,
    pub dependencies: Vec<ArtifactCoords>,
}

/// Variants of every module touched by resolution.
#[derive(Debug, Clone, Default)]
pub struct ComponentVariants {
    variants: BTreeMap<ModuleId, Vec<Variant>>,
}

impl ComponentVariants {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `dependency` to variant `name` of `module`, creating the variant if
    /// needed. A dependency with the same `group:artifact` already in the
    /// variant is kept and `false` is returned.
    pub fn add_dependency(
        &mut self,
        module: &ModuleId,
        name: &str,
        attribute: &str,
        value: &str,
        dependency: ArtifactCoords,
    ) -> bool {
        let variants = self.variants.entry(module.clone()).or_default();
        let index = match variants.iter().position(|v| v.name == name) {
            Some(index) => index,
            None => {
                variants.push(Variant {
                    name: name.to_string(),
                    attribute: attribute.to_string(),
                    value: value.to_string(),
                    dependencies: Vec::new(),
                });
                variants.len() - 1
            }
        };
        let variant = &mut variants[index];
        if variant.dependencies.iter().any(|d| d.key().same_ga(dependency.key())) {
            return false;
        }
        variant.dependencies.push(dependency);
        true
    }

    pub fn variants(&self, module: &ModuleId) -> &[Variant] {
        self.variants.get(module).map_or(&[], Vec::as_slice)
    }

    /// Dependencies of `module` contributed by selected variants.
    pub fn selected_dependencies<'a>(
        &'a self,
        module: &ModuleId,
        selection: &'a VariantSelection,
    ) -> impl Iterator<Item = &'a ArtifactCoords> + 'a {
        self.variants(module)
            .iter()
            .filter(move |v| selection.matches(v))
            .flat_map(|v| v.dependencies.iter())
    }

    pub fn modules(&self) -> impl Iterator<Item = &ModuleId> {
        self.variants.keys()
    }

    pub fn dependency_count(&self) -> usize {
        self.variants.values().flatten().map(|v| v.dependencies.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.dependency_count() == 0
    }
}

/// Set of `(attribute, value)` pairs a resolution selects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariantSelection {
    attributes: BTreeSet<(String, String)>,
}

impl VariantSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, attribute: &str, value: &str) -> Self {
        self.attributes.insert((attribute.to_string(), value.to_string()));
        self
    }

    pub fn matches(&self, variant: &Variant) -> bool {
        self.attributes.contains(&(variant.attribute.clone(), variant.value.clone()))
    }
}
