//! auditsq-core
//!
//! Turns a free-form natural-language question about Kubernetes/OpenShift
//! audit logs into a strongly-typed Structured Query (SQ), through three
//! subsystems applied in sequence: Extraction & Normalization, a six-phase
//! Schema Validator, and a dependency/priority-ordered Rule Engine.

pub mod config;
pub mod error;
pub mod extract;
pub mod model;
pub mod normalize;
pub mod retry;
pub mod rules;
pub mod validate;

pub use config::Config;
pub use error::ErrorCode;
pub use model::{
    ComplexityLevel, FlexibleScalar, QueryComplexity, Severity, StructuredQuery, ValidationError,
    ValidationResult,
};
pub use retry::{Orchestrator, OrchestratorError};
pub use rules::{default_registry, EngineConfig, EngineError, RegistryError, RuleCache, RuleEngine, RuleRegistry};
pub use validate::{SchemaValidator, ValidatorConfig};
