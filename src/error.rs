//! Query-layer error taxonomy.
//!
//! An exact-timestamp replay that matches nothing is not an error; it is
//! reported through [`ReplayOutcome::NoData`](crate::replay::ReplayOutcome).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Invalid plant: {0:?}")]
    InvalidPlant(String),

    #[error("Invalid timestamp: {0:?}")]
    InvalidTimestamp(String),

    #[error("Unknown inverter {inverter:?} for {plant}")]
    UnknownInverter { plant: String, inverter: String },

    #[error("Incomplete feature window for {inverter:?} at {anchor}: slot {missing} has no usable point")]
    IncompleteWindow {
        inverter: String,
        anchor: String,
        missing: String,
    },

    #[error("Forecaster unavailable: {0}")]
    ForecasterUnavailable(String),

    #[error("Data integrity violation: {0}")]
    DataIntegrity(String),

    #[error("Point store query failed: {0}")]
    Store(String),
}

impl QueryError {
    /// Whether the caller sent something malformed, as opposed to the
    /// service or its data being at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            QueryError::InvalidPlant(_)
                | QueryError::InvalidTimestamp(_)
                | QueryError::UnknownInverter { .. }
                | QueryError::IncompleteWindow { .. }
        )
    }
}

impl From<anyhow::Error> for QueryError {
    fn from(error: anyhow::Error) -> Self {
        QueryError::Store(format!("{error:#}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = QueryError::UnknownInverter {
            plant: "Plant1".into(),
            inverter: "X".into(),
        };
        assert_eq!(e.to_string(), "Unknown inverter \"X\" for Plant1");
    }

    #[test]
    fn test_client_error_classification() {
        assert!(QueryError::InvalidPlant("9".into()).is_client_error());
        assert!(!QueryError::ForecasterUnavailable("down".into()).is_client_error());
        assert!(!QueryError::Store("io".into()).is_client_error());
    }

    #[test]
    fn test_store_error_from_anyhow_keeps_context() {
        let err = anyhow::anyhow!("disk gone").context("reading plant1");
        let q: QueryError = err.into();
        assert_eq!(q.to_string(), "Point store query failed: reading plant1: disk gone");
    }
}
