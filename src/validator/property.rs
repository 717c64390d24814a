//! Property checks

use super::{arity_in_range, ValidationErrorKind};
use crate::graph::{Node, PropertyValue, ValueKind};
use crate::schema::{NodeTypeSpec, PropertySpec};

pub(super) fn validate_properties(node: &Node, spec: &NodeTypeSpec) -> Vec<ValidationErrorKind> {
    let mut errors = Vec::new();

    for prop_spec in spec.property_specs.values() {
        if !node.has_property(&prop_spec.name) {
            if prop_spec.is_required() {
                errors.push(ValidationErrorKind::RequiredProperty(prop_spec.name.clone()));
            }
            continue;
        }

        let values = node.get_prop(&prop_spec.name);
        if !arity_in_range(values.len(), prop_spec.min_arity, prop_spec.max_arity) {
            errors.push(ValidationErrorKind::PropertyArity {
                name: prop_spec.name.clone(),
                min: prop_spec.min_arity,
                max: prop_spec.max_arity,
                actual: values.len(),
            });
        }

        for value in values {
            check_value(value, prop_spec, &mut errors);
        }
    }

    errors
}

fn check_value(value: &PropertyValue, spec: &PropertySpec, errors: &mut Vec<ValidationErrorKind>) {
    let name = || spec.name.clone();
    match spec.value_kind {
        ValueKind::Integer => match value {
            PropertyValue::Integer(n) if i32::try_from(*n).is_ok() => check_range(*n as f64, spec, errors),
            _ => errors.push(ValidationErrorKind::NotInteger(name())),
        },
        ValueKind::Float => match value.as_number() {
            Some(n) => check_range(n, spec, errors),
            None => errors.push(ValidationErrorKind::NotFloat(name())),
        },
        ValueKind::Boolean => {
            if value.as_boolean().is_none() {
                errors.push(ValidationErrorKind::NotBoolean(name()));
            }
        }
        ValueKind::String => match value.as_string() {
            Some(text) => {
                if let Some(items) = &spec.restrictions.items {
                    if !items.iter().any(|item| item == text) {
                        errors.push(ValidationErrorKind::NotEnumerated {
                            name: name(),
                            value: text.to_string(),
                        });
                    }
                }
            }
            None => errors.push(ValidationErrorKind::NotString(name())),
        },
    }
}

fn check_range(value: f64, spec: &PropertySpec, errors: &mut Vec<ValidationErrorKind>) {
    let restrictions = &spec.restrictions;
    if restrictions.has_range() && !restrictions.in_range(value) {
        errors.push(ValidationErrorKind::OutOfRange {
            name: spec.name.clone(),
            min: restrictions.min_range.unwrap_or(f64::NEG_INFINITY),
            max: restrictions.max_range.unwrap_or(f64::INFINITY),
        });
    }
}
