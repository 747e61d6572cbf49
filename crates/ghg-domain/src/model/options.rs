//! Calculation options

use serde::{Deserialize, Serialize};

use ghg_types::Scope;

/// Scopes collected for an organization
///
/// Which scopes apply depends on the organization's occupancy type. The
/// matrix is configuration data handed in by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeSelection {
    #[serde(default = "default_true")]
    pub scope1: bool,
    #[serde(default = "default_true")]
    pub scope2: bool,
    #[serde(default = "default_true")]
    pub scope3: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ScopeSelection {
    fn default() -> Self {
        Self::all()
    }
}

impl ScopeSelection {
    pub fn all() -> Self {
        Self {
            scope1: true,
            scope2: true,
            scope3: true,
        }
    }

    pub fn only(scopes: &[Scope]) -> Self {
        Self {
            scope1: scopes.contains(&Scope::Scope1),
            scope2: scopes.contains(&Scope::Scope2),
            scope3: scopes.contains(&Scope::Scope3),
        }
    }

    pub fn includes(&self, scope: Scope) -> bool {
        match scope {
            Scope::Scope1 => self.scope1,
            Scope::Scope2 => self.scope2,
            Scope::Scope3 => self.scope3,
        }
    }
}

/// Options for one `calculate` invocation
#[derive(Debug, Clone, Default)]
pub struct CalculationOptions {
    /// Explicit recompute request. The engine always recomputes; this only
    /// marks the intent in logs and on the outcome.
    pub force: bool,

    pub scopes: ScopeSelection,
}

impl CalculationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn with_scopes(mut self, scopes: ScopeSelection) -> Self {
        self.scopes = scopes;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_selection_only() {
        let selection = ScopeSelection::only(&[Scope::Scope1, Scope::Scope2]);
        assert!(selection.includes(Scope::Scope1));
        assert!(selection.includes(Scope::Scope2));
        assert!(!selection.includes(Scope::Scope3));
    }

    #[test]
    fn test_missing_flags_default_to_enabled() {
        let selection: ScopeSelection = serde_json::from_str(r#"{"scope3": false}"#).unwrap();
        assert!(selection.scope1);
        assert!(selection.scope2);
        assert!(!selection.scope3);
    }

    #[test]
    fn test_options_builder() {
        let options = CalculationOptions::new()
            .with_force(true)
            .with_scopes(ScopeSelection::only(&[Scope::Scope2]));
        assert!(options.force);
        assert!(!options.scopes.scope1);
    }
}
