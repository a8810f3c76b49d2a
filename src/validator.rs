use crate::models::{LoadParameters, LoadType, ParamKind, ParamValue, ValidationResult};
use crate::registry::LoadRegistry;

/// Force and moment keywords checked by the inert-load advisory.
const FORCE_COMPONENTS: [&str; 6] = ["FX", "FY", "FZ", "MX", "MY", "MZ"];

/// Validate a parameter mapping against a load type's rules.
///
/// Returns the validation result together with a freshly normalized copy of
/// the parameters (stringified numbers coerced to numbers, vector elements
/// coerced element-wise). The caller's mapping is never touched, so sharing
/// it across concurrent calls is safe.
pub fn validate(
    registry: &LoadRegistry,
    load_type: &str,
    parameters: &LoadParameters,
) -> (ValidationResult, LoadParameters) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut normalized = parameters.clone();

    let Some(definition) = registry.get(load_type) else {
        return (
            ValidationResult {
                is_valid: false,
                errors: vec![format!("Unknown load type: {}", load_type)],
                warnings,
            },
            normalized,
        );
    };

    // Every rule is checked; errors accumulate instead of failing fast.
    for rule in &definition.parameter_rules {
        let Some(value) = parameters.get(rule.name) else {
            if rule.required {
                errors.push(format!("Required parameter '{}' is missing.", rule.name));
            }
            continue;
        };

        match rule.kind {
            ParamKind::Float => match value.as_number() {
                Some(number) => {
                    normalized.insert(rule.name.to_string(), ParamValue::Number(number));
                    if let Some(min) = rule.min_value {
                        if number < min {
                            errors.push(format!("{} must be >= {}", rule.name, min));
                        }
                    }
                    if let Some(max) = rule.max_value {
                        if number > max {
                            errors.push(format!("{} must be <= {}", rule.name, max));
                        }
                    }
                }
                None => errors.push(format!("{} must be a numeric value", rule.name)),
            },
            ParamKind::Vector3d => match value {
                ParamValue::Vector(elements) => {
                    let numbers: Vec<f64> =
                        elements.iter().filter_map(|e| e.as_number()).collect();
                    if elements.len() == 3 && numbers.len() == 3 {
                        normalized.insert(
                            rule.name.to_string(),
                            ParamValue::Vector(
                                numbers.into_iter().map(ParamValue::Number).collect(),
                            ),
                        );
                    } else {
                        errors.push(format!(
                            "{} must be a 3-element numeric vector",
                            rule.name
                        ));
                    }
                }
                _ => errors.push(format!("{} must be a 3-element vector", rule.name)),
            },
            // Free text is accepted as-is; no OUI/NON membership check
            ParamKind::Text => {}
        }
    }

    // Advisory only: a force load whose components are all absent or zero is
    // legal but inert. Users stage incomplete loads while editing.
    if matches!(
        definition.load_type,
        LoadType::ForceNodale | LoadType::ForceArete | LoadType::ForceFace
    ) {
        let has_contribution = definition.parameter_rules.iter().any(|rule| {
            FORCE_COMPONENTS.contains(&rule.name)
                && parameters
                    .get(rule.name)
                    .and_then(|v| v.as_number())
                    .is_some_and(|n| n != 0.0)
        });
        if !has_contribution {
            warnings.push(
                "No force or moment components specified. Load will have no effect.".to_string(),
            );
        }
    }

    let is_valid = errors.is_empty();
    (
        ValidationResult {
            is_valid,
            errors,
            warnings,
        },
        normalized,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> LoadRegistry {
        LoadRegistry::new()
    }

    fn params(entries: &[(&str, ParamValue)]) -> LoadParameters {
        entries
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn test_unknown_load_type_single_error() {
        let (result, _) = validate(&registry(), "NOT_A_TYPE", &LoadParameters::new());
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("NOT_A_TYPE"));
    }

    #[test]
    fn test_missing_required_parameter() {
        let (result, _) = validate(&registry(), "PRES_REP", &LoadParameters::new());
        assert!(!result.is_valid);
        assert_eq!(result.errors, vec!["Required parameter 'PRES' is missing."]);
    }

    #[test]
    fn test_minimum_bound_violation() {
        let input = params(&[("PRES", ParamValue::Number(-5.0))]);
        let (result, _) = validate(&registry(), "PRES_REP", &input);
        assert!(!result.is_valid);
        assert_eq!(result.errors, vec!["PRES must be >= 0"]);
    }

    #[test]
    fn test_non_numeric_scalar() {
        let input = params(&[("PRES", ParamValue::Text("high".to_string()))]);
        let (result, _) = validate(&registry(), "PRES_REP", &input);
        assert_eq!(result.errors, vec!["PRES must be a numeric value"]);
    }

    #[test]
    fn test_pesanteur_valid() {
        let input = params(&[
            ("GRAVITE", ParamValue::Number(9.81)),
            ("DIRECTION", ParamValue::vec3(0.0, 0.0, -1.0)),
        ]);
        let (result, _) = validate(&registry(), "PESANTEUR", &input);
        assert!(result.is_valid);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_vector_shape_errors() {
        let short = params(&[
            ("GRAVITE", ParamValue::Number(9.81)),
            (
                "DIRECTION",
                ParamValue::Vector(vec![ParamValue::Number(0.0), ParamValue::Number(1.0)]),
            ),
        ]);
        let (result, _) = validate(&registry(), "PESANTEUR", &short);
        assert_eq!(result.errors, vec!["DIRECTION must be a 3-element numeric vector"]);

        let scalar = params(&[
            ("GRAVITE", ParamValue::Number(9.81)),
            ("DIRECTION", ParamValue::Number(1.0)),
        ]);
        let (result, _) = validate(&registry(), "PESANTEUR", &scalar);
        assert_eq!(result.errors, vec!["DIRECTION must be a 3-element vector"]);
    }

    #[test]
    fn test_string_vector_is_normalized() {
        let input = params(&[
            ("GRAVITE", ParamValue::Text("9.81".to_string())),
            (
                "DIRECTION",
                ParamValue::Vector(vec![
                    ParamValue::Text("0".to_string()),
                    ParamValue::Text("0".to_string()),
                    ParamValue::Text("-1".to_string()),
                ]),
            ),
        ]);
        let (result, normalized) = validate(&registry(), "PESANTEUR", &input);
        assert!(result.is_valid);
        assert_eq!(normalized["GRAVITE"], ParamValue::Number(9.81));
        assert_eq!(normalized["DIRECTION"], ParamValue::vec3(0.0, 0.0, -1.0));
        // the caller's mapping keeps its original string values
        assert_eq!(input["GRAVITE"], ParamValue::Text("9.81".to_string()));
    }

    #[test]
    fn test_empty_force_load_warns_but_stays_valid() {
        let (result, _) = validate(&registry(), "FORCE_NODALE", &LoadParameters::new());
        assert!(result.is_valid);
        assert_eq!(
            result.warnings,
            vec!["No force or moment components specified. Load will have no effect."]
        );
    }

    #[test]
    fn test_all_zero_force_load_still_warns() {
        let input = params(&[
            ("FX", ParamValue::Number(0.0)),
            ("FY", ParamValue::Number(0.0)),
            ("FZ", ParamValue::Number(0.0)),
        ]);
        let (result, _) = validate(&registry(), "FORCE_NODALE", &input);
        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_nonzero_component_suppresses_warning() {
        let input = params(&[("MZ", ParamValue::Number(-12.5))]);
        let (result, _) = validate(&registry(), "FORCE_NODALE", &input);
        assert!(result.is_valid);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_extra_keys_are_ignored() {
        let input = params(&[
            ("PRES", ParamValue::Number(100.0)),
            ("WHATEVER", ParamValue::Text("x".to_string())),
        ]);
        let (result, _) = validate(&registry(), "PRES_REP", &input);
        assert!(result.is_valid);
    }
}
