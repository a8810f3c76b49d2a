use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

use crate::executor::AsterExecutor;
use crate::generator::CommandGenerator;
use crate::models::{
    AnalysisRequest, AnalysisResponse, AnalysisStatus, CommandStructure, GenerateRequest,
    StudyModel, ValidateRequest, ValidateResponse,
};
use crate::registry::LoadRegistry;
use crate::validator;

pub type SharedExecutor = Arc<Mutex<AsterExecutor>>;

/// Application state
pub struct AppState {
    executor: SharedExecutor,
    generator: CommandGenerator,
    registry: LoadRegistry,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            executor: Arc::new(Mutex::new(AsterExecutor::new())),
            generator: CommandGenerator::new(),
            registry: LoadRegistry::new(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the API router
pub fn create_router() -> Router {
    let state = AppState::new();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_check))
        .route("/api/v1/version", get(version_handler))
        .route("/api/v1/definitions", get(definitions_handler))
        .route("/api/v1/definitions/:load_type", get(definition_handler))
        .route("/api/v1/validate", post(validate_handler))
        .route("/api/v1/generate", post(generate_handler))
        .route("/api/v1/comm", post(comm_handler))
        .route("/api/v1/analyze", post(analyze_handler))
        .layer(cors)
        .with_state(Arc::new(state))
}

/// Root endpoint
async fn root_handler() -> Json<serde_json::Value> {
    Json(json!({
        "service": "Code_Aster Command Service",
        "version": "0.1.0",
        "status": "running",
        "description": "Command generation and validation for Code_Aster structural studies",
        "supported_loads": ["FORCE_NODALE", "FORCE_ARETE", "FORCE_FACE", "PRES_REP", "PESANTEUR"]
    }))
}

/// Health check endpoint
async fn health_check() -> Json<serde_json::Value> {
    // Check if the Code_Aster launcher is available
    let launcher = crate::executor::resolve_launcher_path();

    let launcher_available = std::process::Command::new(&launcher)
        .arg("--version")
        .output()
        .is_ok();

    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "aster_available": launcher_available,
        "aster_command": launcher
    }))
}

/// Version endpoint
async fn version_handler() -> Json<serde_json::Value> {
    Json(json!({
        "service": "Code_Aster Command Service",
        "version": "0.1.0",
        "api_version": "v1",
        "solver": "Code_Aster (as_run)"
    }))
}

/// All load definitions, for the front-end's assignment panels
async fn definitions_handler(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({ "definitions": state.registry.all() }))
}

/// One load definition plus its parameter hints
async fn definition_handler(
    State(state): State<Arc<AppState>>,
    Path(load_type): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let definition = state
        .registry
        .get(&load_type)
        .ok_or_else(|| ApiError::NotFound(format!("Unknown load type: {}", load_type)))?;

    Ok(Json(json!({
        "definition": definition,
        "hints": state.registry.hints(&load_type)
    })))
}

/// Validate a single load's parameters without generating anything
async fn validate_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ValidateRequest>,
) -> Json<ValidateResponse> {
    tracing::info!("Validating {} parameters", request.load_type);

    let (result, normalized) =
        validator::validate(&state.registry, &request.load_type, &request.parameters);

    Json(ValidateResponse { result, normalized })
}

/// Generate one load command for the preview pane. Engine failures come back
/// as a structured error payload, not an HTTP error.
async fn generate_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GenerateRequest>,
) -> Json<CommandStructure> {
    tracing::info!(
        "Generating {} command for group '{}'",
        request.load_type,
        request.group
    );

    Json(state.generator.generate(
        &state.registry,
        &request.load_type,
        &request.parameters,
        &request.group,
        &request.result_name,
    ))
}

/// Assemble the full .comm file for preview without running the solver
async fn comm_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    tracing::info!("Assembling .comm preview");

    validate_study(&request.model, &state.registry)?;

    let comm = state
        .generator
        .generate_comm(&state.registry, &request.model)
        .map_err(|e| ApiError::ValidationError(e.to_string()))?;

    Ok(Json(json!({ "comm_file": comm })))
}

/// Run a full study: validate, assemble the .comm file, submit to the solver
async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    tracing::info!("Received analysis request");
    tracing::info!(
        "  Groups: {}, Materials: {}, Constraints: {}, Loads: {}",
        request.model.groups.len(),
        request.model.materials.len(),
        request.model.constraints.len(),
        request.model.loads.len()
    );
    for (i, load) in request.model.loads.iter().enumerate() {
        tracing::info!(
            "  Load {}: {} -> '{}' as {}",
            i,
            load.load_type,
            load.group,
            load.result_name
        );
    }

    // 1. Validate study
    validate_study(&request.model, &state.registry)?;
    tracing::info!("Study validation passed");

    // 2. Assemble command file
    let comm = state
        .generator
        .generate_comm(&state.registry, &request.model)
        .map_err(|e| ApiError::ValidationError(format!("Failed to generate command file: {}", e)))?;
    tracing::info!("Command file generated");

    // 3. Execute, unless the caller only wants the generated study back
    if request.use_mock {
        return Ok(Json(AnalysisResponse {
            job_id: Uuid::new_v4().to_string(),
            status: AnalysisStatus::Success,
            diagnostics: Vec::new(),
            comm_file: Some(comm),
            error_message: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }));
    }

    let mut executor = state.executor.lock().await;
    let outcome = executor
        .execute(&comm)
        .await
        .map_err(|e| ApiError::InternalError(format!("Study execution failed: {}", e)))?;

    let status = if outcome.succeeded {
        AnalysisStatus::Success
    } else {
        AnalysisStatus::Failed
    };

    Ok(Json(AnalysisResponse {
        job_id: Uuid::new_v4().to_string(),
        status,
        diagnostics: outcome.diagnostics,
        comm_file: Some(comm),
        error_message: if outcome.succeeded {
            None
        } else {
            Some("Solver reported errors; see diagnostics".to_string())
        },
        timestamp: chrono::Utc::now().to_rfc3339(),
    }))
}

/// Study-level checks before any text is generated. Load-parameter rules are
/// the engine's job; this covers the study shape and group compatibility.
fn validate_study(model: &StudyModel, registry: &LoadRegistry) -> Result<(), ApiError> {
    if model.groups.is_empty() {
        return Err(ApiError::ValidationError(
            "Study must have at least one mesh group".to_string(),
        ));
    }
    if model.materials.is_empty() {
        return Err(ApiError::ValidationError(
            "Study must define a material".to_string(),
        ));
    }
    if model.constraints.is_empty() {
        return Err(ApiError::ValidationError(
            "Study must have at least one constraint".to_string(),
        ));
    }

    for load in &model.loads {
        let Some(definition) = registry.get(&load.load_type) else {
            return Err(ApiError::ValidationError(format!(
                "Load '{}' has unknown type '{}'",
                load.result_name, load.load_type
            )));
        };

        if load.group.is_empty() {
            continue;
        }
        let group = model.groups.iter().find(|g| g.name == load.group);
        let Some(group) = group else {
            return Err(ApiError::ValidationError(format!(
                "Load '{}' targets unknown group '{}'",
                load.result_name, load.group
            )));
        };
        if let Some(topology) = group.resolved_topology() {
            if !definition.allowed_topology.contains(&topology) {
                return Err(ApiError::ValidationError(format!(
                    "Load '{}' targets group '{}' ({}) but {} applies to {} groups",
                    load.result_name,
                    load.group,
                    topology.as_str(),
                    load.load_type,
                    definition
                        .allowed_topology
                        .iter()
                        .map(|t| t.as_str())
                        .collect::<Vec<_>>()
                        .join(" or ")
                )));
            }
        }
    }

    Ok(())
}

/// API Errors
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::InternalError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Constraint, ConstraintType, LoadAssignment, MaterialDef, MeshGroup, Topology};

    fn steel() -> MaterialDef {
        MaterialDef {
            name: "steel".to_string(),
            elastic_modulus: 2.1e11,
            poisson_ratio: 0.3,
            density: 7850.0,
            groups: Vec::new(),
        }
    }

    fn base_model() -> StudyModel {
        StudyModel {
            groups: vec![
                MeshGroup {
                    name: "SURF_TOP".to_string(),
                    topology: Some(Topology::Surface),
                    element_codes: Vec::new(),
                },
                MeshGroup {
                    name: "FIX".to_string(),
                    topology: Some(Topology::Node),
                    element_codes: Vec::new(),
                },
            ],
            materials: vec![steel()],
            constraints: vec![Constraint {
                group: "FIX".to_string(),
                constraint_type: ConstraintType::Fixed,
            }],
            loads: Vec::new(),
        }
    }

    #[test]
    fn test_study_requires_groups_material_constraint() {
        let registry = LoadRegistry::new();

        let mut model = base_model();
        model.groups.clear();
        assert!(validate_study(&model, &registry).is_err());

        let mut model = base_model();
        model.materials.clear();
        assert!(validate_study(&model, &registry).is_err());

        let mut model = base_model();
        model.constraints.clear();
        assert!(validate_study(&model, &registry).is_err());

        assert!(validate_study(&base_model(), &registry).is_ok());
    }

    #[test]
    fn test_incompatible_topology_is_rejected() {
        let registry = LoadRegistry::new();
        let mut model = base_model();
        model.loads.push(LoadAssignment {
            result_name: "F1".to_string(),
            load_type: "FORCE_NODALE".to_string(),
            group: "SURF_TOP".to_string(),
            parameters: Default::default(),
        });

        let err = validate_study(&model, &registry).unwrap_err();
        match err {
            ApiError::ValidationError(msg) => {
                assert!(msg.contains("SURF_TOP"));
                assert!(msg.contains("NODE"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_load_type_in_study_is_rejected() {
        let registry = LoadRegistry::new();
        let mut model = base_model();
        model.loads.push(LoadAssignment {
            result_name: "F1".to_string(),
            load_type: "NOT_A_TYPE".to_string(),
            group: String::new(),
            parameters: Default::default(),
        });

        assert!(validate_study(&model, &registry).is_err());
    }
}
