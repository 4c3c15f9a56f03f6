//! Generator options that influence the class pipeline.

use crate::{CodegenError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Dotted root package of the generated code.
    pub package: String,
    pub structure_style: StructureStyle,
    pub filter_strategy: FilterStrategy,
    /// Promote every inner class to a global class.
    pub unnest_classes: bool,
    /// Drop `pattern` facets instead of keeping them on the attrs.
    pub ignore_patterns: bool,
    pub compound_fields: CompoundFields,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            package: "generated".to_string(),
            structure_style: StructureStyle::default(),
            filter_strategy: FilterStrategy::default(),
            unnest_classes: false,
            ignore_patterns: false,
            compound_fields: CompoundFields::default(),
        }
    }
}

/// How classes are distributed over packages and modules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureStyle {
    /// One module per source file, packages mirror the directory layout.
    #[default]
    Filenames,
    /// One module per target namespace.
    Namespaces,
    /// Everything in a single module.
    SinglePackage,
}

impl StructureStyle {
    /// Styles where classes of different namespaces share a module and need unique local names.
    pub fn requires_unique_names(self) -> bool {
        matches!(self, StructureStyle::SinglePackage)
    }
}

/// Which classes survive the filtering pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterStrategy {
    /// Global elements and every class they reference.
    #[default]
    AllGlobals,
    All,
    /// Classes referenced by at least one other class.
    Referred,
}

/// Grouping of mutually exclusive elements into one compound field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompoundFields {
    pub enabled: bool,
    pub default_name: String,
    pub use_substitution_groups: bool,
    pub force_default_name: bool,
    pub max_name_parts: usize,
}

impl Default for CompoundFields {
    fn default() -> Self {
        Self {
            enabled: false,
            default_name: "choice".to_string(),
            use_substitution_groups: false,
            force_default_name: false,
            max_name_parts: 3,
        }
    }
}

impl GeneratorConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: GeneratorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject option combinations the pipeline cannot honor.
    pub fn validate(&self) -> Result<()> {
        let output = &self.output;

        if output.package.is_empty()
            || !output.package.split('.').all(is_identifier)
        {
            return Err(CodegenError::config(format!(
                "package `{}` is not a dotted identifier",
                output.package
            )));
        }

        let compound = &output.compound_fields;
        if compound.enabled {
            if !is_identifier(&compound.default_name) {
                return Err(CodegenError::config(format!(
                    "compound field default name `{}` is not an identifier",
                    compound.default_name
                )));
            }
            if compound.max_name_parts == 0 {
                return Err(CodegenError::config(
                    "compound field max_name_parts must be at least 1",
                ));
            }
        }

        Ok(())
    }
}

fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}
