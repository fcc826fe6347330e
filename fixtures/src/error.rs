//! Error types for the deployment fixtures.

use std::fmt::Display;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result type alias for fixture operations.
pub type FixtureResult<T> = Result<T, FixtureError>;

/// Why a contract deployment did not produce a usable instance.
#[derive(Error, Debug)]
pub enum DeploymentFailure {
    /// No compiled artifact exists for the requested contract name.
    #[error("artifact not found at {}", path.display())]
    ArtifactNotFound { path: PathBuf },

    /// The artifact exists but holds no code.
    #[error("artifact at {} is empty", path.display())]
    EmptyArtifact { path: PathBuf },

    /// A deployment or initialization transaction failed on chain.
    #[error("transaction reverted: {0}")]
    Reverted(String),

    /// Deployment did not finalize in time.
    #[error("not finalized within {0:?}")]
    Timeout(Duration),

    /// The sandbox rejected or failed to answer a request.
    #[error("sandbox request failed: {0}")]
    Rpc(String),
}

/// Errors that can occur while building, restoring or checking fixtures.
#[derive(Error, Debug)]
pub enum FixtureError {
    /// A contract could not be deployed.
    #[error("Deployment of '{contract}' failed: {failure}")]
    Deployment {
        contract: String,
        #[source]
        failure: DeploymentFailure,
    },

    /// A read-only call against a contract failed.
    #[error("Query '{method}' on {contract} failed: {reason}")]
    Query {
        contract: String,
        method: String,
        reason: String,
    },

    /// An equality check did not hold.
    #[error("Assertion failed for {subject}: expected {expected}, got {actual}")]
    Assertion {
        subject: String,
        expected: String,
        actual: String,
    },

    /// Signing identities could not be provisioned.
    #[error("Identity error: {0}")]
    Identity(String),

    /// Chain state could not be captured or restored.
    #[error("Snapshot error: {0}")]
    Snapshot(String),

    /// The sandbox node could not be started or reached.
    #[error("Sandbox error: {0}")]
    Sandbox(String),

    /// Invalid fixture configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FixtureError {
    /// Create a deployment error.
    pub fn deployment(contract: impl Into<String>, failure: DeploymentFailure) -> Self {
        Self::Deployment {
            contract: contract.into(),
            failure,
        }
    }

    /// Create a query error.
    pub fn query(contract: impl Display, method: impl Into<String>, reason: impl Display) -> Self {
        Self::Query {
            contract: contract.to_string(),
            method: method.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an assertion error carrying both sides of the comparison.
    pub fn assertion(subject: impl Into<String>, expected: impl Display, actual: impl Display) -> Self {
        Self::Assertion {
            subject: subject.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Create an identity error.
    pub fn identity(msg: impl Into<String>) -> Self {
        Self::Identity(msg.into())
    }

    /// Create a snapshot error.
    pub fn snapshot(msg: impl Into<String>) -> Self {
        Self::Snapshot(msg.into())
    }

    /// Create a sandbox error.
    pub fn sandbox(msg: impl Into<String>) -> Self {
        Self::Sandbox(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn is_deployment(&self) -> bool {
        matches!(self, Self::Deployment { .. })
    }

    pub fn is_query(&self) -> bool {
        matches!(self, Self::Query { .. })
    }

    pub fn is_assertion(&self) -> bool {
        matches!(self, Self::Assertion { .. })
    }
}
