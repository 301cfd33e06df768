//! Queries this layer does not answer
//!
//! Callers feature-detect with [`Capability::is_supported`] instead of
//! treating a missing feature as a failure.

use serde::Serialize;

use crate::error::{Error, Result};

/// Answer to a query that may not be available
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capability<T> {
    Available(T),
    NotSupported(&'static str),
}

impl<T> Capability<T> {
    pub fn is_supported(&self) -> bool {
        matches!(self, Capability::Available(_))
    }

    pub fn ok(self) -> Option<T> {
        match self {
            Capability::Available(value) => Some(value),
            Capability::NotSupported(_) => None,
        }
    }

    /// Convert to a `Result`, mapping an unsupported query to [`Error::Unsupported`]
    pub fn into_result(self) -> Result<T> {
        match self {
            Capability::Available(value) => Ok(value),
            Capability::NotSupported(what) => Err(Error::Unsupported(what)),
        }
    }
}

/// Commits ahead of and behind the upstream branch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AheadBehind {
    pub ahead: usize,
    pub behind: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_supported_is_feature_detectable() {
        let capability: Capability<AheadBehind> = Capability::NotSupported("ahead/behind count");
        assert!(!capability.is_supported());
        assert_eq!(capability.clone().ok(), None);
        assert!(matches!(
            capability.into_result(),
            Err(Error::Unsupported("ahead/behind count"))
        ));
    }

    #[test]
    fn test_available() {
        let capability = Capability::Available(AheadBehind { ahead: 2, behind: 0 });
        assert!(capability.is_supported());
        assert_eq!(capability.into_result().unwrap().ahead, 2);
    }
}
