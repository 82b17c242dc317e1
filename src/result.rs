use std::collections::BTreeMap;
use std::fmt;

use crate::schema::{AccessLevel, Address};

/// Outcome of executing one action
///
/// Built by the simulator for each step and consumed by the observation
/// update. The maps are handed over as-is; no merging happens here.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ActionResult {
    pub success: bool,
    /// Reward contribution of the action
    pub value: f64,
    /// Services observed on the target
    pub services: BTreeMap<String, bool>,
    /// Operating systems observed on the target
    pub os: BTreeMap<String, bool>,
    /// Processes observed on the target
    pub processes: BTreeMap<String, bool>,
    /// Access level held per host after the action
    pub access: BTreeMap<Address, AccessLevel>,
    /// Hosts reachable from the target
    pub discovered: BTreeMap<Address, bool>,
    /// Hosts seen for the first time during this action
    pub newly_discovered: BTreeMap<Address, bool>,
    pub connection_error: bool,
    pub permission_error: bool,
    pub undefined_error: bool,
}

impl ActionResult {
    pub fn new(success: bool) -> Self {
        Self {
            success,
            ..Self::default()
        }
    }

    /// Failed action whose target could not be reached
    pub fn connection_failure() -> Self {
        Self {
            connection_error: true,
            ..Self::default()
        }
    }

    /// Failed action whose access precondition was not met
    pub fn permission_failure() -> Self {
        Self {
            permission_error: true,
            ..Self::default()
        }
    }

    pub fn undefined_failure() -> Self {
        Self {
            undefined_error: true,
            ..Self::default()
        }
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = value;
        self
    }

    pub fn with_services(mut self, services: BTreeMap<String, bool>) -> Self {
        self.services = services;
        self
    }

    pub fn with_os(mut self, os: BTreeMap<String, bool>) -> Self {
        self.os = os;
        self
    }

    pub fn with_processes(mut self, processes: BTreeMap<String, bool>) -> Self {
        self.processes = processes;
        self
    }

    pub fn with_access(mut self, access: BTreeMap<Address, AccessLevel>) -> Self {
        self.access = access;
        self
    }

    pub fn with_discovered(mut self, discovered: BTreeMap<Address, bool>) -> Self {
        self.discovered = discovered;
        self
    }

    pub fn with_newly_discovered(mut self, newly_discovered: BTreeMap<Address, bool>) -> Self {
        self.newly_discovered = newly_discovered;
        self
    }

    /// True if any of the error flags is set
    pub fn has_error(&self) -> bool {
        self.connection_error || self.permission_error || self.undefined_error
    }
}

fn fmt_map<K: fmt::Display, V: fmt::Display>(map: &BTreeMap<K, V>) -> String {
    let entries: Vec<String> = map.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
    format!("{{{}}}", entries.join(", "))
}

impl fmt::Display for ActionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ActionResult:")?;
        writeln!(f, "  success={}", self.success)?;
        writeln!(f, "  value={}", self.value)?;
        writeln!(f, "  services={}", fmt_map(&self.services))?;
        writeln!(f, "  os={}", fmt_map(&self.os))?;
        writeln!(f, "  processes={}", fmt_map(&self.processes))?;
        writeln!(f, "  access={}", fmt_map(&self.access))?;
        writeln!(f, "  discovered={}", fmt_map(&self.discovered))?;
        writeln!(f, "  connection_error={}", self.connection_error)?;
        writeln!(f, "  permission_error={}", self.permission_error)?;
        writeln!(f, "  undefined_error={}", self.undefined_error)?;
        write!(f, "  newly_discovered={}", fmt_map(&self.newly_discovered))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_empty() {
        let result = ActionResult::new(true);
        assert!(result.success);
        assert_eq!(result.value, 0.0);
        assert!(result.services.is_empty());
        assert!(result.access.is_empty());
        assert!(result.newly_discovered.is_empty());
        assert!(!result.has_error());
    }

    #[test]
    fn test_failure_helpers_set_one_flag() {
        let result = ActionResult::permission_failure();
        assert!(!result.success);
        assert!(result.permission_error);
        assert!(!result.connection_error && !result.undefined_error);
        assert!(ActionResult::connection_failure().has_error());
    }

    #[test]
    fn test_display_lists_every_field() {
        let mut access = BTreeMap::new();
        access.insert(Address::new(1, 0), AccessLevel::Root);
        let mut services = BTreeMap::new();
        services.insert("ssh".to_string(), true);
        let result = ActionResult::new(true)
            .with_value(10.0)
            .with_services(services)
            .with_access(access);

        let rendered = result.to_string();
        assert!(rendered.starts_with("ActionResult:"));
        assert!(rendered.contains("services={ssh: true}"));
        assert!(rendered.contains("access={(1, 0): root}"));
        for field in [
            "success=", "value=", "os=", "processes=", "discovered=",
            "connection_error=", "permission_error=", "undefined_error=", "newly_discovered=",
        ] {
            assert!(rendered.contains(field), "missing {}", field);
        }
    }
}
