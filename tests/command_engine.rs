//! End-to-end checks of the command engine surface: registry bindings,
//! parameter validation and command text generation.

use aster_service::models::{CommandStatus, GroupPrefix, LoadParameters, ParamValue, Topology};
use aster_service::{validate, CommandGenerator, LoadRegistry, LoadType};

fn params(entries: &[(&str, ParamValue)]) -> LoadParameters {
    entries
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

#[test]
fn registry_bindings_match_solver_contract() {
    let registry = LoadRegistry::new();

    let expectations: [(&str, &[Topology], GroupPrefix, &[&str]); 5] = [
        ("FORCE_NODALE", &[Topology::Node], GroupPrefix::NodeGroup, &[]),
        ("FORCE_ARETE", &[Topology::Wire], GroupPrefix::ElementGroup, &[]),
        ("FORCE_FACE", &[Topology::Surface], GroupPrefix::ElementGroup, &[]),
        (
            "PRES_REP",
            &[Topology::Surface, Topology::Volume],
            GroupPrefix::ElementGroup,
            &["PRES"],
        ),
        (
            "PESANTEUR",
            &[Topology::Volume],
            GroupPrefix::ElementGroup,
            &["GRAVITE", "DIRECTION"],
        ),
    ];

    for (keyword, topologies, prefix, required) in expectations {
        let def = registry
            .get(keyword)
            .unwrap_or_else(|| panic!("missing definition for {}", keyword));
        assert_eq!(def.allowed_topology, topologies, "{} topology", keyword);
        assert_eq!(def.group_prefix, prefix, "{} group prefix", keyword);
        let required_names: Vec<&str> = def
            .parameter_rules
            .iter()
            .filter(|r| r.required)
            .map(|r| r.name)
            .collect();
        assert_eq!(required_names, required, "{} required params", keyword);
        assert!(def.requires_modele, "{} references the model", keyword);
    }

    assert_eq!(registry.all().len(), LoadType::ALL.len());
}

#[test]
fn missing_pressure_is_the_only_error() {
    let registry = LoadRegistry::new();
    let (result, _) = validate(&registry, "PRES_REP", &LoadParameters::new());
    assert!(!result.is_valid);
    assert_eq!(result.errors, vec!["Required parameter 'PRES' is missing."]);
}

#[test]
fn negative_pressure_reports_minimum_bound() {
    let registry = LoadRegistry::new();
    let input = params(&[("PRES", ParamValue::Number(-5.0))]);
    let (result, _) = validate(&registry, "PRES_REP", &input);
    assert!(!result.is_valid);
    assert_eq!(result.errors, vec!["PRES must be >= 0"]);
}

#[test]
fn gravity_with_direction_is_clean() {
    let registry = LoadRegistry::new();
    let input = params(&[
        ("GRAVITE", ParamValue::Number(9.81)),
        ("DIRECTION", ParamValue::vec3(0.0, 0.0, -1.0)),
    ]);
    let (result, _) = validate(&registry, "PESANTEUR", &input);
    assert!(result.is_valid);
    assert!(result.errors.is_empty());
    assert!(result.warnings.is_empty());
}

#[test]
fn empty_nodal_force_is_valid_with_one_warning() {
    let registry = LoadRegistry::new();
    let (result, _) = validate(&registry, "FORCE_NODALE", &LoadParameters::new());
    assert!(result.is_valid);
    assert_eq!(
        result.warnings,
        vec!["No force or moment components specified. Load will have no effect."]
    );
}

#[test]
fn all_zero_nodal_force_behaves_like_empty() {
    let registry = LoadRegistry::new();
    let input = params(&[
        ("FX", ParamValue::Number(0.0)),
        ("FY", ParamValue::Number(0.0)),
        ("FZ", ParamValue::Number(0.0)),
    ]);
    let (result, _) = validate(&registry, "FORCE_NODALE", &input);
    assert!(result.is_valid);
    assert_eq!(result.warnings.len(), 1);
}

#[test]
fn pressure_command_contains_group_and_block_without_flags() {
    let registry = LoadRegistry::new();
    let generator = CommandGenerator::new();
    let input = params(&[("PRES", ParamValue::Number(101325.0))]);

    let out = generator.generate(&registry, "PRES_REP", &input, "SURF_TOP", "CHARGE1");
    assert_eq!(out.status, CommandStatus::Success);
    let command = out.command.unwrap();
    assert!(command.contains("GROUP_MA = 'SURF_TOP'"));
    assert!(command.contains("PRES_REP = _F(PRES = 101325)"));
    assert!(!command.contains("DOUBLE_LAGRANGE"));
    assert!(!command.contains("INFO"));
    assert!(!command.contains("VERI_NORM"));
    assert!(!command.contains("VERI_AFFE"));
}

#[test]
fn gravity_without_group_scopes_to_whole_model() {
    let registry = LoadRegistry::new();
    let generator = CommandGenerator::new();
    let input = params(&[
        ("GRAVITE", ParamValue::Number(9.81)),
        ("DIRECTION", ParamValue::vec3(0.0, 0.0, -1.0)),
    ]);

    let out = generator.generate(&registry, "PESANTEUR", &input, "", "GRAV1");
    assert_eq!(out.status, CommandStatus::Success);
    let command = out.command.unwrap();
    assert!(!command.contains("GROUP_MA"));
    assert!(!command.contains("GROUP_NO"));
}

#[test]
fn warned_but_valid_load_still_generates() {
    let registry = LoadRegistry::new();
    let generator = CommandGenerator::new();

    let out = generator.generate(&registry, "FORCE_NODALE", &LoadParameters::new(), "N1", "F1");
    assert_eq!(out.status, CommandStatus::Success);
    let command = out.command.unwrap();
    assert!(command.contains("GROUP_NO = 'N1'"));
    assert!(!command.contains("FORCE_NODALE = _F"));
}

#[test]
fn generation_is_byte_identical_across_calls() {
    let registry = LoadRegistry::new();
    let generator = CommandGenerator::new();
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

    let first = generator.generate(&registry, "PESANTEUR", &input, "VOL", "GRAV1");
    let second = generator.generate(&registry, "PESANTEUR", &input, "VOL", "GRAV1");
    assert!(first.command.is_some());
    assert_eq!(first.command, second.command);
}

#[test]
fn unknown_type_fails_both_operations() {
    let registry = LoadRegistry::new();
    let generator = CommandGenerator::new();

    let (result, _) = validate(&registry, "NOT_A_TYPE", &LoadParameters::new());
    assert!(!result.is_valid);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].contains("NOT_A_TYPE"));

    let out = generator.generate(&registry, "NOT_A_TYPE", &LoadParameters::new(), "G", "C1");
    assert_eq!(out.status, CommandStatus::Error);
    assert!(out.command.is_none());
}
