use crate::models::{
    GroupPrefix, LoadDefinition, LoadType, ParamKind, ParamValue, ParameterRule, Topology,
};

/// Solver-level flags every load command accepts, orthogonal to the
/// physical parameters. Emitted only when diverging from their default.
pub const SOLVER_FLAGS: [&str; 4] = ["DOUBLE_LAGRANGE", "INFO", "VERI_NORM", "VERI_AFFE"];

/// Default value of a solver flag, as it appears in generated text.
pub fn flag_default(name: &str) -> Option<&'static str> {
    match name {
        "DOUBLE_LAGRANGE" | "VERI_NORM" | "VERI_AFFE" => Some("NON"),
        "INFO" => Some("1"),
        _ => None,
    }
}

const NODE_ONLY: &[Topology] = &[Topology::Node];
const WIRE_ONLY: &[Topology] = &[Topology::Wire];
const SURFACE_ONLY: &[Topology] = &[Topology::Surface];
const SURFACE_OR_VOLUME: &[Topology] = &[Topology::Surface, Topology::Volume];
const VOLUME_ONLY: &[Topology] = &[Topology::Volume];

fn force_component(name: &'static str) -> ParameterRule {
    ParameterRule {
        name,
        required: false,
        kind: ParamKind::Float,
        min_value: None,
        max_value: None,
        default_value: Some(ParamValue::Number(0.0)),
    }
}

/// Read-only table of load definitions, one per AFFE_CHAR_MECA keyword.
/// Built once at startup and never mutated.
pub struct LoadRegistry {
    definitions: Vec<LoadDefinition>,
}

impl LoadRegistry {
    pub fn new() -> Self {
        let definitions = vec![
            // Point forces and moments on node groups
            LoadDefinition {
                load_type: LoadType::ForceNodale,
                allowed_topology: NODE_ONLY,
                group_prefix: GroupPrefix::NodeGroup,
                parameter_rules: ["FX", "FY", "FZ", "MX", "MY", "MZ"]
                    .into_iter()
                    .map(force_component)
                    .collect(),
                optional_params: &SOLVER_FLAGS,
                requires_modele: true,
            },
            // Line forces along edge (wire) groups
            LoadDefinition {
                load_type: LoadType::ForceArete,
                allowed_topology: WIRE_ONLY,
                group_prefix: GroupPrefix::ElementGroup,
                parameter_rules: ["FX", "FY", "FZ", "MX", "MY", "MZ"]
                    .into_iter()
                    .map(force_component)
                    .collect(),
                optional_params: &SOLVER_FLAGS,
                requires_modele: true,
            },
            // Surface tractions on face groups
            LoadDefinition {
                load_type: LoadType::ForceFace,
                allowed_topology: SURFACE_ONLY,
                group_prefix: GroupPrefix::ElementGroup,
                parameter_rules: ["FX", "FY", "FZ"]
                    .into_iter()
                    .map(force_component)
                    .collect(),
                optional_params: &SOLVER_FLAGS,
                requires_modele: true,
            },
            // Normal pressure on faces or volume skins
            LoadDefinition {
                load_type: LoadType::PresRep,
                allowed_topology: SURFACE_OR_VOLUME,
                group_prefix: GroupPrefix::ElementGroup,
                parameter_rules: vec![ParameterRule {
                    name: "PRES",
                    required: true,
                    kind: ParamKind::Float,
                    min_value: Some(0.0),
                    max_value: None,
                    default_value: None,
                }],
                optional_params: &SOLVER_FLAGS,
                requires_modele: true,
            },
            // Gravity; the only load allowed to omit its target group
            // (whole-model scope)
            LoadDefinition {
                load_type: LoadType::Pesanteur,
                allowed_topology: VOLUME_ONLY,
                group_prefix: GroupPrefix::ElementGroup,
                parameter_rules: vec![
                    ParameterRule {
                        name: "GRAVITE",
                        required: true,
                        kind: ParamKind::Float,
                        min_value: Some(0.0),
                        max_value: None,
                        default_value: Some(ParamValue::Number(9.81)),
                    },
                    ParameterRule {
                        name: "DIRECTION",
                        required: true,
                        kind: ParamKind::Vector3d,
                        min_value: None,
                        max_value: None,
                        default_value: Some(ParamValue::vec3(0.0, 0.0, -1.0)),
                    },
                ],
                optional_params: &SOLVER_FLAGS,
                requires_modele: true,
            },
        ];

        Self { definitions }
    }

    /// Look up a definition by its solver keyword. Unknown keywords return
    /// None; callers report them, this never panics.
    pub fn get(&self, keyword: &str) -> Option<&LoadDefinition> {
        let load_type = LoadType::parse(keyword)?;
        self.definitions.iter().find(|d| d.load_type == load_type)
    }

    pub fn all(&self) -> &[LoadDefinition] {
        &self.definitions
    }

    /// Human-readable parameter hints for the given load type, rendered for
    /// the front-end's help panel. Empty for unknown keywords.
    pub fn hints(&self, keyword: &str) -> Vec<String> {
        let Some(definition) = self.get(keyword) else {
            return Vec::new();
        };

        let mut hints = Vec::new();

        let topologies = definition
            .allowed_topology
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(" or ");
        hints.push(format!(
            "Applies to {} groups (referenced via {})",
            topologies,
            definition.group_prefix.keyword()
        ));

        for rule in &definition.parameter_rules {
            let mut hint = format!(
                "{}: {} {}",
                rule.name,
                if rule.required { "required" } else { "optional" },
                match rule.kind {
                    ParamKind::Float => "numeric value",
                    ParamKind::Vector3d => "3-component vector",
                    ParamKind::Text => "text value",
                }
            );
            if let Some(min) = rule.min_value {
                hint.push_str(&format!(", >= {}", min));
            }
            if let Some(max) = rule.max_value {
                hint.push_str(&format!(", <= {}", max));
            }
            if let Some(default) = &rule.default_value {
                match default {
                    ParamValue::Number(n) => hint.push_str(&format!(" (default {})", n)),
                    ParamValue::Text(s) => hint.push_str(&format!(" (default {})", s)),
                    ParamValue::Vector(v) => {
                        let parts = v
                            .iter()
                            .filter_map(|e| e.as_number())
                            .map(|n| n.to_string())
                            .collect::<Vec<_>>()
                            .join(", ");
                        hint.push_str(&format!(" (default ({}))", parts));
                    }
                }
            }
            hints.push(hint);
        }

        if definition.load_type == LoadType::Pesanteur {
            hints.push("Target group is optional; omit it to load the whole model".to_string());
        }

        hints.push(format!(
            "Optional solver flags: {}",
            definition.optional_params.join(", ")
        ));

        hints
    }
}

impl Default for LoadRegistry {
    fn default() -> Self {
        Self::new()
    }
}
