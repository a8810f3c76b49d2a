//! Code_Aster command generation and validation for structural FEA
//! front-ends.
//!
//! The engine turns staged load configurations into AFFE_CHAR_MECA command
//! text, validated against a static per-load-type rules registry, and can
//! assemble whole .comm study files for submission to the solver launcher.

pub mod api;
pub mod executor;
pub mod generator;
pub mod models;
pub mod registry;
pub mod validator;

pub use generator::CommandGenerator;
pub use models::{
    CommandStatus, CommandStructure, LoadDefinition, LoadParameters, LoadType, ParamValue,
    Topology, ValidationResult,
};
pub use registry::LoadRegistry;
pub use validator::validate;
