use crate::models::{
    CommandStatus, CommandStructure, LoadParameters, LoadType, ParamValue, StudyModel, Topology,
};
use crate::registry::{flag_default, LoadRegistry, SOLVER_FLAGS};
use crate::validator;

/// Renders AFFE_CHAR_MECA load commands and whole .comm study files.
pub struct CommandGenerator {
    /// Identifier of the model object referenced by generated commands
    model_name: String,
}

impl CommandGenerator {
    const MESH_NAME: &'static str = "MAIL";
    const MATERIAL_FIELD_NAME: &'static str = "CHMAT";
    const CONSTRAINT_NAME: &'static str = "BLOCAGE";
    const RESULT_NAME: &'static str = "RESU";

    pub fn new() -> Self {
        Self {
            model_name: "MODELE".to_string(),
        }
    }

    pub fn with_model_name(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
        }
    }

    /// Generate one AFFE_CHAR_MECA command. Validation runs first; any error
    /// yields a structured error payload and no command text.
    pub fn generate(
        &self,
        registry: &LoadRegistry,
        load_type: &str,
        parameters: &LoadParameters,
        group: &str,
        result_name: &str,
    ) -> CommandStructure {
        let (validation, normalized) = validator::validate(registry, load_type, parameters);
        let definition = match registry.get(load_type) {
            Some(definition) if validation.is_valid => definition,
            _ => {
                return CommandStructure {
                    status: CommandStatus::Error,
                    load_type: load_type.to_string(),
                    result_name: result_name.to_string(),
                    command: None,
                    parameters: None,
                    errors: Some(validation.errors),
                }
            }
        };

        let mut args: Vec<String> = Vec::new();

        // Model reference always leads
        if definition.requires_modele {
            args.push(format!("MODELE = {}", self.model_name));
        }

        // PESANTEUR with no group means whole-model scope; every other type
        // emits its group reference unconditionally
        if !group.is_empty() || definition.load_type != LoadType::Pesanteur {
            args.push(format!(
                "{} = '{}'",
                definition.group_prefix.keyword(),
                group
            ));
        }

        // Nested keyword block, only for rules actually supplied
        let fields: Vec<String> = definition
            .parameter_rules
            .iter()
            .filter_map(|rule| {
                normalized
                    .get(rule.name)
                    .map(|value| format!("{} = {}", rule.name, render_value(value)))
            })
            .collect();
        if !fields.is_empty() {
            args.push(format!(
                "{} = _F({})",
                definition.load_type.as_str(),
                fields.join(", ")
            ));
        }

        // Solver flags trail, and only when diverging from their default
        for flag in SOLVER_FLAGS {
            if let Some(value) = normalized.get(flag) {
                if let Some(arg) = flag_argument(flag, value) {
                    args.push(arg);
                }
            }
        }

        let command = format!(
            "{} = AFFE_CHAR_MECA(\n    {}\n);",
            result_name,
            args.join(",\n    ")
        );

        CommandStructure {
            status: CommandStatus::Success,
            load_type: load_type.to_string(),
            result_name: result_name.to_string(),
            command: Some(command),
            parameters: Some(normalized),
            errors: None,
        }
    }

    /// Assemble a complete .comm file from a staged study: mesh read, model
    /// and material assignment, boundary conditions, one load command per
    /// assignment, static solve and result output.
    pub fn generate_comm(
        &self,
        registry: &LoadRegistry,
        model: &StudyModel,
    ) -> Result<String, GeneratorError> {
        if model.groups.is_empty() {
            return Err(GeneratorError::GenerationError(
                "Study has no mesh groups".to_string(),
            ));
        }

        let mut comm = String::new();

        // 1. Header
        comm.push_str("DEBUT(LANG = 'EN');\n\n");

        // 2. Mesh
        comm.push_str(&format!(
            "{} = LIRE_MAILLAGE(FORMAT = 'MED', UNITE = 20);\n\n",
            Self::MESH_NAME
        ));

        // 3. Model assignment
        comm.push_str(&format!(
            "{} = AFFE_MODELE(\n    MAILLAGE = {},\n    AFFE = _F(TOUT = 'OUI', PHENOMENE = 'MECANIQUE', MODELISATION = '3D')\n);\n\n",
            self.model_name,
            Self::MESH_NAME
        ));

        // 4. Materials
        for (idx, material) in model.materials.iter().enumerate() {
            comm.push_str(&format!(
                "MAT{} = DEFI_MATERIAU(\n    ELAS = _F(E = {}, NU = {}, RHO = {})\n);\n\n",
                idx + 1,
                material.elastic_modulus,
                material.poisson_ratio,
                material.density
            ));
        }
        if !model.materials.is_empty() {
            let mut assignments: Vec<String> = Vec::new();
            for (idx, material) in model.materials.iter().enumerate() {
                if material.groups.is_empty() {
                    assignments.push(format!("_F(TOUT = 'OUI', MATER = MAT{})", idx + 1));
                } else {
                    let groups = material
                        .groups
                        .iter()
                        .map(|g| format!("'{}'", g))
                        .collect::<Vec<_>>()
                        .join(", ");
                    assignments.push(format!(
                        "_F(GROUP_MA = ({}), MATER = MAT{})",
                        groups,
                        idx + 1
                    ));
                }
            }
            comm.push_str(&format!(
                "{} = AFFE_MATERIAU(\n    MAILLAGE = {},\n    AFFE = (\n        {}\n    )\n);\n\n",
                Self::MATERIAL_FIELD_NAME,
                Self::MESH_NAME,
                assignments.join(",\n        ")
            ));
        }

        // 5. Boundary conditions
        if !model.constraints.is_empty() {
            let mut blocks: Vec<String> = Vec::new();
            for constraint in &model.constraints {
                let keyword = match group_topology(model, &constraint.group) {
                    Some(Topology::Node) => "GROUP_NO",
                    _ => "GROUP_MA",
                };
                blocks.push(format!(
                    "_F({} = '{}', {})",
                    keyword,
                    constraint.group,
                    constraint_components(constraint.constraint_type)
                ));
            }
            comm.push_str(&format!(
                "{} = AFFE_CHAR_MECA(\n    MODELE = {},\n    DDL_IMPO = (\n        {}\n    )\n);\n\n",
                Self::CONSTRAINT_NAME,
                self.model_name,
                blocks.join(",\n        ")
            ));
        }

        // 6. Loads, one command per assignment; any invalid one aborts
        for load in &model.loads {
            let structure = self.generate(
                registry,
                &load.load_type,
                &load.parameters,
                &load.group,
                &load.result_name,
            );
            match structure.command {
                Some(command) => {
                    comm.push_str(&command);
                    comm.push_str("\n\n");
                }
                None => {
                    return Err(GeneratorError::InvalidLoad {
                        name: load.result_name.clone(),
                        reasons: structure.errors.unwrap_or_default().join("; "),
                    })
                }
            }
        }

        // 7. Static solve referencing every charge
        let mut excit: Vec<String> = Vec::new();
        if !model.constraints.is_empty() {
            excit.push(format!("_F(CHARGE = {})", Self::CONSTRAINT_NAME));
        }
        for load in &model.loads {
            excit.push(format!("_F(CHARGE = {})", load.result_name));
        }
        let mut solve_args = vec![format!("MODELE = {}", self.model_name)];
        if !model.materials.is_empty() {
            solve_args.push(format!("CHAM_MATER = {}", Self::MATERIAL_FIELD_NAME));
        }
        if !excit.is_empty() {
            solve_args.push(format!(
                "EXCIT = (\n        {}\n    )",
                excit.join(",\n        ")
            ));
        }
        comm.push_str(&format!(
            "{} = MECA_STATIQUE(\n    {}\n);\n\n",
            Self::RESULT_NAME,
            solve_args.join(",\n    ")
        ));

        // 8. Result output
        comm.push_str(&format!(
            "IMPR_RESU(\n    FORMAT = 'MED',\n    UNITE = 80,\n    RESU = _F(RESULTAT = {}, TOUT_CHAM = 'OUI')\n);\n\n",
            Self::RESULT_NAME
        ));

        comm.push_str("FIN();\n");

        Ok(comm)
    }
}

impl Default for CommandGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn group_topology(model: &StudyModel, name: &str) -> Option<Topology> {
    model
        .groups
        .iter()
        .find(|g| g.name == name)
        .and_then(|g| g.resolved_topology())
}

fn constraint_components(constraint_type: crate::models::ConstraintType) -> &'static str {
    use crate::models::ConstraintType;
    match constraint_type {
        ConstraintType::Fixed => "DX = 0, DY = 0, DZ = 0, DRX = 0, DRY = 0, DRZ = 0",
        ConstraintType::Pinned => "DX = 0, DY = 0, DZ = 0",
        ConstraintType::RollerX => "DX = 0",
        ConstraintType::RollerY => "DY = 0",
        ConstraintType::RollerZ => "DZ = 0",
    }
}

/// Natural decimal rendering; display formatting (scientific notation etc.)
/// is the calling UI's concern.
fn render_value(value: &ParamValue) -> String {
    match value {
        ParamValue::Number(n) => n.to_string(),
        ParamValue::Text(s) => format!("'{}'", s),
        ParamValue::Vector(elements) => {
            let parts = elements
                .iter()
                .map(|e| match e {
                    ParamValue::Number(n) => n.to_string(),
                    ParamValue::Text(s) => s.clone(),
                    ParamValue::Vector(_) => String::new(),
                })
                .collect::<Vec<_>>()
                .join(", ");
            format!("({})", parts)
        }
    }
}

/// Render a trailing solver flag, or None when the value sits at its
/// documented default and stays out of the generated text.
fn flag_argument(name: &str, value: &ParamValue) -> Option<String> {
    let default = flag_default(name)?;
    let text = match value {
        ParamValue::Number(n) => n.to_string(),
        ParamValue::Text(s) => s.trim().to_string(),
        ParamValue::Vector(_) => return None,
    };
    if text == default {
        return None;
    }
    if name == "INFO" {
        Some(format!("INFO = {}", text))
    } else {
        Some(format!("{} = '{}'", name, text))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("Generation error: {0}")]
    GenerationError(String),
    #[error("Load '{name}' is invalid: {reasons}")]
    InvalidLoad { name: String, reasons: String },
}
