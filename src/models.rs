use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Main analysis request structure from the configurator app
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub model: StudyModel,
    #[serde(default)]
    pub use_mock: bool,
}

/// A full study as staged by the front-end: named mesh groups plus the
/// materials, constraints and loads attached to them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyModel {
    pub groups: Vec<MeshGroup>,
    pub materials: Vec<MaterialDef>,
    pub constraints: Vec<Constraint>,
    pub loads: Vec<LoadAssignment>,
}

/// A named mesh group as reported by the mesh-inspection backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeshGroup {
    pub name: String,
    /// Topology tag when the backend already classified the group
    #[serde(default)]
    pub topology: Option<Topology>,
    /// Raw element type codes (SEG2, QUAD4, HEXA8, ...) from the mesh scan
    #[serde(default)]
    pub element_codes: Vec<String>,
}

impl MeshGroup {
    /// Topology of the group, classifying from element codes when the
    /// backend did not tag it. Mixed groups resolve to the highest
    /// dimension present.
    pub fn resolved_topology(&self) -> Option<Topology> {
        self.topology.or_else(|| {
            self.element_codes
                .iter()
                .filter_map(|code| Topology::from_element_code(code))
                .max()
        })
    }
}

/// Mesh topology a load or constraint may target.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Topology {
    Node,
    Wire,
    Surface,
    Volume,
}

impl Topology {
    /// Classify a MED/Aster element type code into a topology tag.
    pub fn from_element_code(code: &str) -> Option<Topology> {
        let code = code.trim().to_ascii_uppercase();
        if code.starts_with("POI") {
            Some(Topology::Node)
        } else if code.starts_with("SEG") {
            Some(Topology::Wire)
        } else if code.starts_with("TRIA") || code.starts_with("QUAD") {
            Some(Topology::Surface)
        } else if code.starts_with("TETRA")
            || code.starts_with("HEXA")
            || code.starts_with("PENTA")
            || code.starts_with("PYRAM")
        {
            Some(Topology::Volume)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Topology::Node => "NODE",
            Topology::Wire => "WIRE",
            Topology::Surface => "SURFACE",
            Topology::Volume => "VOLUME",
        }
    }
}

/// Which group-reference keyword a load command emits.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum GroupPrefix {
    NodeGroup,
    ElementGroup,
}

impl GroupPrefix {
    pub fn keyword(&self) -> &'static str {
        match self {
            GroupPrefix::NodeGroup => "GROUP_NO",
            GroupPrefix::ElementGroup => "GROUP_MA",
        }
    }
}

/// Load type keywords understood by AFFE_CHAR_MECA.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum LoadType {
    #[serde(rename = "FORCE_NODALE")]
    ForceNodale,
    #[serde(rename = "FORCE_ARETE")]
    ForceArete,
    #[serde(rename = "FORCE_FACE")]
    ForceFace,
    #[serde(rename = "PRES_REP")]
    PresRep,
    #[serde(rename = "PESANTEUR")]
    Pesanteur,
}

impl LoadType {
    pub const ALL: [LoadType; 5] = [
        LoadType::ForceNodale,
        LoadType::ForceArete,
        LoadType::ForceFace,
        LoadType::PresRep,
        LoadType::Pesanteur,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LoadType::ForceNodale => "FORCE_NODALE",
            LoadType::ForceArete => "FORCE_ARETE",
            LoadType::ForceFace => "FORCE_FACE",
            LoadType::PresRep => "PRES_REP",
            LoadType::Pesanteur => "PESANTEUR",
        }
    }

    /// Parse a solver keyword. Unknown keywords return None; callers report
    /// them as validation errors rather than failing hard.
    pub fn parse(keyword: &str) -> Option<LoadType> {
        match keyword {
            "FORCE_NODALE" => Some(LoadType::ForceNodale),
            "FORCE_ARETE" => Some(LoadType::ForceArete),
            "FORCE_FACE" => Some(LoadType::ForceFace),
            "PRES_REP" => Some(LoadType::PresRep),
            "PESANTEUR" => Some(LoadType::Pesanteur),
            _ => None,
        }
    }
}

/// Expected shape of a physical load parameter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    Float,
    Vector3d,
    Text,
}

/// One physical parameter of a load type: solver keyword, requiredness,
/// shape and optional inclusive bounds.
#[derive(Debug, Clone, Serialize)]
pub struct ParameterRule {
    pub name: &'static str,
    pub required: bool,
    pub kind: ParamKind,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    /// UI default only; validation never substitutes it
    pub default_value: Option<ParamValue>,
}

/// Static description of one AFFE_CHAR_MECA load keyword.
#[derive(Debug, Clone, Serialize)]
pub struct LoadDefinition {
    pub load_type: LoadType,
    pub allowed_topology: &'static [Topology],
    pub group_prefix: GroupPrefix,
    pub parameter_rules: Vec<ParameterRule>,
    /// Solver-level flags orthogonal to the physical parameters. Values are
    /// left as free strings (no OUI/NON membership check) so future solver
    /// flag values pass through untouched.
    pub optional_params: &'static [&'static str],
    pub requires_modele: bool,
}

/// A caller-supplied parameter value. The front-end sends numbers as JSON
/// numbers or strings interchangeably; vectors may arrive with string
/// elements. Validation normalizes everything to numeric form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ParamValue {
    Number(f64),
    Text(String),
    Vector(Vec<ParamValue>),
}

impl ParamValue {
    /// Numeric view of the value, accepting stringified numbers.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            ParamValue::Number(n) if n.is_finite() => Some(*n),
            ParamValue::Text(s) => match s.trim().parse::<f64>() {
                Ok(n) if n.is_finite() => Some(n),
                _ => None,
            },
            _ => None,
        }
    }

    /// Textual view, used for solver flag values.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn vec3(x: f64, y: f64, z: f64) -> ParamValue {
        ParamValue::Vector(vec![
            ParamValue::Number(x),
            ParamValue::Number(y),
            ParamValue::Number(z),
        ])
    }
}

/// Parameter mapping for one load, keyed by solver keyword. BTreeMap keeps
/// serialized payloads deterministic.
pub type LoadParameters = BTreeMap<String, ParamValue>;

/// Outcome of validating a parameter mapping against a load definition.
/// Warnings are advisory only and never affect validity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CommandStatus {
    Success,
    Error,
}

/// Generation output: either full command text or the validation errors
/// that blocked it. Never both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandStructure {
    pub status: CommandStatus,
    pub load_type: String,
    pub result_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<LoadParameters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialDef {
    pub name: String,
    pub elastic_modulus: f64, // Pa
    pub poisson_ratio: f64,
    pub density: f64, // kg/m³
    /// Element groups the material is assigned to; empty means whole mesh
    #[serde(default)]
    pub groups: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Constraint {
    pub group: String,
    pub constraint_type: ConstraintType,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ConstraintType {
    Fixed,   // All DOFs blocked (DX, DY, DZ, DRX, DRY, DRZ)
    Pinned,  // Translations blocked, rotations free (DX, DY, DZ)
    RollerX, // X translation blocked only
    RollerY, // Y translation blocked only
    RollerZ, // Z translation blocked only
}

/// One load attached to a mesh group, as staged in the front-end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadAssignment {
    pub result_name: String,
    pub load_type: String,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub parameters: LoadParameters,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateRequest {
    pub load_type: String,
    #[serde(default)]
    pub parameters: LoadParameters,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub result: ValidationResult,
    /// Freshly normalized copy of the input parameters; the request payload
    /// itself is never mutated
    pub normalized: LoadParameters,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub load_type: String,
    #[serde(default)]
    pub parameters: LoadParameters,
    #[serde(default)]
    pub group: String,
    pub result_name: String,
}

/// Analysis response structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub job_id: String,
    pub status: AnalysisStatus,
    pub diagnostics: Vec<SolverDiagnostic>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comm_file: Option<String>,
    pub error_message: Option<String>,
    pub timestamp: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AnalysisStatus {
    Success,
    Failed,
    Running,
}

/// One tagged message scraped from the solver .mess file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverDiagnostic {
    pub severity: DiagnosticSeverity,
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DiagnosticSeverity {
    Alarm,
    Error,
    Fatal,
}

impl DiagnosticSeverity {
    pub fn from_tag(tag: &str) -> Option<DiagnosticSeverity> {
        match tag {
            "A" => Some(DiagnosticSeverity::Alarm),
            "E" => Some(DiagnosticSeverity::Error),
            "F" => Some(DiagnosticSeverity::Fatal),
            _ => None,
        }
    }
}
