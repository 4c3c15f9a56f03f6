//! Class processing passes.
//!
//! A [`ClassHandler`] transforms one class at a time and runs inside a step of the container
//! pipeline. A [`ContainerHandler`] runs once over the whole registry between steps.

mod add_attribute_substitutions;
mod calculate_attribute_paths;
mod create_compound_fields;
mod designate_class_packages;
mod detect_circular_references;
mod disambiguate_choices;
mod filter_classes;
mod flatten_attribute_groups;
mod flatten_class_extensions;
mod merge_attributes;
mod process_attribute_types;
mod process_mixed_content_class;
mod rename_duplicate_attributes;
mod rename_duplicate_classes;
mod reset_attribute_sequence_numbers;
mod reset_attribute_sequences;
mod sanitize_attributes_default_value;
mod sanitize_enumeration_class;
mod unnest_inner_classes;
mod update_attributes_effective_choice;
mod vacuum_inner_classes;
mod validate_attributes_overrides;
mod validate_references;

pub use add_attribute_substitutions::AddAttributeSubstitutions;
pub use calculate_attribute_paths::CalculateAttributePaths;
pub use create_compound_fields::CreateCompoundFields;
pub use designate_class_packages::DesignateClassPackages;
pub use detect_circular_references::DetectCircularReferences;
pub use disambiguate_choices::DisambiguateChoices;
pub use filter_classes::FilterClasses;
pub use flatten_attribute_groups::FlattenAttributeGroups;
pub use flatten_class_extensions::FlattenClassExtensions;
pub use merge_attributes::MergeAttributes;
pub use process_attribute_types::ProcessAttributeTypes;
pub use process_mixed_content_class::ProcessMixedContentClass;
pub use rename_duplicate_attributes::RenameDuplicateAttributes;
pub use rename_duplicate_classes::RenameDuplicateClasses;
pub use reset_attribute_sequence_numbers::ResetAttributeSequenceNumbers;
pub use reset_attribute_sequences::ResetAttributeSequences;
pub use sanitize_attributes_default_value::SanitizeAttributesDefaultValue;
pub use sanitize_enumeration_class::SanitizeEnumerationClass;
pub use unnest_inner_classes::UnnestInnerClasses;
pub use update_attributes_effective_choice::UpdateAttributesEffectiveChoice;
pub use vacuum_inner_classes::VacuumInnerClasses;
pub use validate_attributes_overrides::ValidateAttributesOverrides;
pub use validate_references::ValidateReferences;

use crate::container::ClassContainer;
use crate::models::{Attr, ClassId};
use crate::Result;
use std::collections::HashSet;

/// A pass over a single class.
pub trait ClassHandler: std::fmt::Debug {
    fn process(&self, container: &mut ClassContainer, target: ClassId) -> Result<()>;
}

/// A pass over the whole container.
pub trait ContainerHandler {
    fn run(&self, container: &mut ClassContainer) -> Result<()>;
}

/// Classes `target` extends, directly or through other bases, nearest first.
pub(crate) fn base_classes(container: &mut ClassContainer, target: ClassId) -> Result<Vec<ClassId>> {
    let mut result = Vec::new();
    let mut seen = HashSet::from([target]);
    let mut stack = vec![target];

    while let Some(current) = stack.pop() {
        let extensions: Vec<_> = container
            .class(current)
            .extensions
            .iter()
            .filter(|ext| !ext.r#type.native)
            .map(|ext| (ext.r#type.reference, ext.r#type.qname.clone()))
            .collect();

        for (reference, qname) in extensions {
            let base = match reference {
                Some(id) => Some(id),
                None => container.find_any(&qname)?,
            };
            if let Some(base) = base {
                if seen.insert(base) {
                    result.push(base);
                    stack.push(base);
                }
            }
        }
    }

    Ok(result)
}

/// Attrs inherited through the extensions of `target`.
pub(crate) fn base_attrs(container: &mut ClassContainer, target: ClassId) -> Result<Vec<Attr>> {
    let bases = base_classes(container, target)?;
    Ok(bases
        .into_iter()
        .flat_map(|base| container.class(base).attrs.clone())
        .collect())
}
