//! Immutable action descriptors for the attacker and the defender.
//!
//! Cost and probability are compared and hashed through a quantised
//! representation, so two actions built from slightly different float
//! arithmetic still compare equal and land in the same hash bucket.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::ActionError;
use crate::schema::*;

/// Resolution of the cost/probability comparison
const QUANTUM: f64 = 1e9;

/// Largest accepted cost; its quantised form stays finite
pub const MAX_COST: f64 = 1e290;

/// Comparison key of a validated cost or probability.
///
/// The rounded value stays a float so large costs keep distinct keys; adding
/// `0.0` folds `-0.0` into `+0.0` before taking the bits.
pub(crate) fn quantize(value: f64) -> u64 {
    ((value * QUANTUM).round() + 0.0).to_bits()
}

/// Checks the invariants every action shares: a non-negative cost no larger
/// than `MAX_COST` and a probability in [0, 1].
pub(crate) fn validate_cost_prob(cost: f64, prob: f64) -> Result<(), ActionError> {
    if !(0.0..=1.0).contains(&prob) {
        return Err(ActionError::construction(format!(
            "probability {} is outside [0, 1]",
            prob
        )));
    }
    if !(0.0..=MAX_COST).contains(&cost) {
        return Err(ActionError::construction(format!(
            "cost {} must be non-negative and at most {:e}",
            cost, MAX_COST
        )));
    }
    Ok(())
}

/// Variant-specific part of an attacker action
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActionVariant {
    ServiceScan,
    OsScan,
    SubnetScan,
    ProcessScan,
    Exploit {
        service: ServiceName,
        os: Option<OsName>,
        access: AccessLevel,
    },
    PrivilegeEscalation {
        process: ProcessName,
        os: Option<OsName>,
        access: AccessLevel,
    },
    NoOp,
}

impl ActionVariant {
    pub fn kind(&self) -> ActionKind {
        match self {
            ActionVariant::ServiceScan => ActionKind::ServiceScan,
            ActionVariant::OsScan => ActionKind::OsScan,
            ActionVariant::SubnetScan => ActionKind::SubnetScan,
            ActionVariant::ProcessScan => ActionKind::ProcessScan,
            ActionVariant::Exploit { .. } => ActionKind::Exploit,
            ActionVariant::PrivilegeEscalation { .. } => ActionKind::PrivilegeEscalation,
            ActionVariant::NoOp => ActionKind::NoOp,
        }
    }
}

/// An attacker action
///
/// `target` is `None` only for `NoOp`, which is not addressed at any host.
#[derive(Debug, Clone)]
pub struct Action {
    name: String,
    target: Option<Address>,
    cost: f64,
    prob: f64,
    req_access: AccessLevel,
    variant: ActionVariant,
}

impl Action {
    fn build(
        name: &str,
        target: Option<Address>,
        cost: f64,
        prob: f64,
        req_access: AccessLevel,
        variant: ActionVariant,
    ) -> Result<Self, ActionError> {
        validate_cost_prob(cost, prob)?;
        Ok(Self {
            name: name.to_string(),
            target,
            cost,
            prob,
            req_access,
            variant,
        })
    }

    /// Scan of the given kind with probability 1 and `User` precondition
    pub fn scan(kind: ActionKind, target: Address, cost: f64) -> Result<Self, ActionError> {
        Self::scan_with(kind, target, cost, 1.0, AccessLevel::User)
    }

    pub fn scan_with(
        kind: ActionKind,
        target: Address,
        cost: f64,
        prob: f64,
        req_access: AccessLevel,
    ) -> Result<Self, ActionError> {
        let variant = match kind {
            ActionKind::ServiceScan => ActionVariant::ServiceScan,
            ActionKind::OsScan => ActionVariant::OsScan,
            ActionKind::SubnetScan => ActionVariant::SubnetScan,
            ActionKind::ProcessScan => ActionVariant::ProcessScan,
            other => return Err(ActionError::TypeMismatch { kind: other }),
        };
        Self::build(kind.label(), Some(target), cost, prob, req_access, variant)
    }

    pub fn service_scan(target: Address, cost: f64) -> Result<Self, ActionError> {
        Self::scan(ActionKind::ServiceScan, target, cost)
    }

    pub fn os_scan(target: Address, cost: f64) -> Result<Self, ActionError> {
        Self::scan(ActionKind::OsScan, target, cost)
    }

    pub fn subnet_scan(target: Address, cost: f64) -> Result<Self, ActionError> {
        Self::scan(ActionKind::SubnetScan, target, cost)
    }

    pub fn process_scan(target: Address, cost: f64) -> Result<Self, ActionError> {
        Self::scan(ActionKind::ProcessScan, target, cost)
    }

    pub fn exploit(name: &str, target: Address, def: &ExploitDef) -> Result<Self, ActionError> {
        Self::build(
            name,
            Some(target),
            def.cost,
            def.prob,
            def.req_access,
            ActionVariant::Exploit {
                service: def.service.clone(),
                os: def.os.clone(),
                access: def.access,
            },
        )
    }

    pub fn privilege_escalation(
        name: &str,
        target: Address,
        def: &PrivescDef,
    ) -> Result<Self, ActionError> {
        Self::build(
            name,
            Some(target),
            def.cost,
            def.prob,
            def.req_access,
            ActionVariant::PrivilegeEscalation {
                process: def.process.clone(),
                os: def.os.clone(),
                access: def.access,
            },
        )
    }

    /// Builds an exploit or privilege escalation from a capability table entry
    pub fn from_capability(
        kind: ActionKind,
        target: Address,
        def: &CapabilityDef,
    ) -> Result<Self, ActionError> {
        let variant = match kind {
            ActionKind::Exploit => ActionVariant::Exploit {
                service: def.subject.clone(),
                os: def.os.clone(),
                access: def.access,
            },
            ActionKind::PrivilegeEscalation => ActionVariant::PrivilegeEscalation {
                process: def.subject.clone(),
                os: def.os.clone(),
                access: def.access,
            },
            other => return Err(ActionError::TypeMismatch { kind: other }),
        };
        Self::build(&def.name, Some(target), def.cost, def.prob, def.req_access, variant)
    }

    /// The zero-cost, always successful placeholder action
    pub fn noop() -> Self {
        Self {
            name: ActionKind::NoOp.label().to_string(),
            target: None,
            cost: 0.0,
            prob: 1.0,
            req_access: AccessLevel::None,
            variant: ActionVariant::NoOp,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> Option<Address> {
        self.target
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }

    pub fn prob(&self) -> f64 {
        self.prob
    }

    pub fn req_access(&self) -> AccessLevel {
        self.req_access
    }

    pub fn variant(&self) -> &ActionVariant {
        &self.variant
    }

    pub fn kind(&self) -> ActionKind {
        self.variant.kind()
    }

    /// Operating system an exploit or privilege escalation requires
    pub fn os(&self) -> Option<&str> {
        match &self.variant {
            ActionVariant::Exploit { os, .. } | ActionVariant::PrivilegeEscalation { os, .. } => {
                os.as_deref()
            }
            _ => None,
        }
    }

    pub fn service(&self) -> Option<&str> {
        match &self.variant {
            ActionVariant::Exploit { service, .. } => Some(service.as_str()),
            _ => None,
        }
    }

    pub fn process(&self) -> Option<&str> {
        match &self.variant {
            ActionVariant::PrivilegeEscalation { process, .. } => Some(process.as_str()),
            _ => None,
        }
    }

    /// Access level granted on success, for exploits and privilege escalations
    pub fn access(&self) -> Option<AccessLevel> {
        match &self.variant {
            ActionVariant::Exploit { access, .. }
            | ActionVariant::PrivilegeEscalation { access, .. } => Some(*access),
            _ => None,
        }
    }

    pub fn is_exploit(&self) -> bool {
        self.kind() == ActionKind::Exploit
    }

    pub fn is_privilege_escalation(&self) -> bool {
        self.kind() == ActionKind::PrivilegeEscalation
    }

    pub fn is_scan(&self) -> bool {
        self.kind().is_scan()
    }

    pub fn is_remote(&self) -> bool {
        self.kind().is_remote()
    }

    pub fn is_service_scan(&self) -> bool {
        self.kind() == ActionKind::ServiceScan
    }

    pub fn is_os_scan(&self) -> bool {
        self.kind() == ActionKind::OsScan
    }

    pub fn is_subnet_scan(&self) -> bool {
        self.kind() == ActionKind::SubnetScan
    }

    pub fn is_process_scan(&self) -> bool {
        self.kind() == ActionKind::ProcessScan
    }

    pub fn is_noop(&self) -> bool {
        self.kind() == ActionKind::NoOp
    }
}

impl PartialEq for Action {
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        self.variant == other.variant
            && self.target == other.target
            && quantize(self.cost) == quantize(other.cost)
            && quantize(self.prob) == quantize(other.prob)
            && self.req_access == other.req_access
    }
}

impl Eq for Action {}

impl Hash for Action {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.variant.hash(state);
        self.target.hash(state);
        quantize(self.cost).hash(state);
        quantize(self.prob).hash(state);
        self.req_access.hash(state);
    }
}

fn fmt_target(target: Option<Address>) -> String {
    match target {
        Some(address) => address.to_string(),
        None => "unaddressed".to_string(),
    }
}

fn fmt_os(os: &Option<OsName>) -> &str {
    os.as_deref().unwrap_or("any")
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: target={}, cost={:.2}, prob={:.2}, req_access={}",
            self.kind(),
            fmt_target(self.target),
            self.cost,
            self.prob,
            self.req_access
        )?;
        match &self.variant {
            ActionVariant::Exploit { service, os, access } => {
                write!(f, ", os={}, service={}, access={}", fmt_os(os), service, access)
            }
            ActionVariant::PrivilegeEscalation { process, os, access } => {
                write!(f, ", os={}, process={}, access={}", fmt_os(os), process, access)
            }
            _ => Ok(()),
        }
    }
}

// ============================================================================
// DEFENDER ACTIONS
// ============================================================================

/// A defender countermeasure
#[derive(Debug, Clone)]
pub struct DefenderAction {
    kind: DefenderActionKind,
    target: Address,
    cost: f64,
    prob: f64,
    req_access: AccessLevel,
}

impl DefenderAction {
    pub fn new(
        kind: DefenderActionKind,
        target: Address,
        def: &DefenderActionDef,
    ) -> Result<Self, ActionError> {
        validate_cost_prob(def.cost, def.prob)?;
        Ok(Self {
            kind,
            target,
            cost: def.cost,
            prob: def.prob,
            req_access: def.req_access,
        })
    }

    pub fn change_os(target: Address, def: &DefenderActionDef) -> Result<Self, ActionError> {
        Self::new(DefenderActionKind::ChangeOs, target, def)
    }

    pub fn change_firewall(target: Address, def: &DefenderActionDef) -> Result<Self, ActionError> {
        Self::new(DefenderActionKind::ChangeFirewall, target, def)
    }

    pub fn stop_service(target: Address, def: &DefenderActionDef) -> Result<Self, ActionError> {
        Self::new(DefenderActionKind::StopService, target, def)
    }

    pub fn stop_process(target: Address, def: &DefenderActionDef) -> Result<Self, ActionError> {
        Self::new(DefenderActionKind::StopProcess, target, def)
    }

    pub fn name(&self) -> &'static str {
        self.kind.label()
    }

    pub fn kind(&self) -> DefenderActionKind {
        self.kind
    }

    pub fn target(&self) -> Address {
        self.target
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }

    pub fn prob(&self) -> f64 {
        self.prob
    }

    pub fn req_access(&self) -> AccessLevel {
        self.req_access
    }

    pub fn is_change_os(&self) -> bool {
        self.kind == DefenderActionKind::ChangeOs
    }

    pub fn is_change_firewall(&self) -> bool {
        self.kind == DefenderActionKind::ChangeFirewall
    }

    pub fn is_stop_service(&self) -> bool {
        self.kind == DefenderActionKind::StopService
    }

    pub fn is_stop_process(&self) -> bool {
        self.kind == DefenderActionKind::StopProcess
    }
}

impl PartialEq for DefenderAction {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.target == other.target
            && quantize(self.cost) == quantize(other.cost)
            && quantize(self.prob) == quantize(other.prob)
            && self.req_access == other.req_access
    }
}

impl Eq for DefenderAction {}

impl Hash for DefenderAction {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.target.hash(state);
        quantize(self.cost).hash(state);
        quantize(self.prob).hash(state);
        self.req_access.hash(state);
    }
}

impl fmt::Display for DefenderAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: target={}, cost={:.2}, prob={:.2}, req_access={}",
            self.kind, self.target, self.cost, self.prob, self.req_access
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::collections::HashSet;

    fn hash_of<T: Hash>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    fn http_linux(cost: f64, prob: f64) -> ExploitDef {
        ExploitDef::new("http", Some("linux"), cost, prob, AccessLevel::User)
    }

    #[test]
    fn test_probability_out_of_range_is_rejected() {
        let target = Address::new(1, 0);
        for prob in [-0.1, 1.01, f64::NAN] {
            let result = Action::exploit("e_http", target, &http_linux(1.0, prob));
            assert!(matches!(result, Err(ActionError::Construction { .. })));
        }
        assert!(Action::scan_with(ActionKind::OsScan, target, 1.0, 2.0, AccessLevel::User).is_err());
        assert!(Action::exploit("e_http", target, &http_linux(1.0, 0.0)).is_ok());
        assert!(Action::exploit("e_http", target, &http_linux(1.0, 1.0)).is_ok());
    }

    #[test]
    fn test_negative_cost_is_rejected() {
        let result = Action::service_scan(Address::new(1, 0), -1.0);
        assert!(matches!(result, Err(ActionError::Construction { .. })));
    }

    #[test]
    fn test_scan_rejects_non_scan_kind() {
        let result = Action::scan(ActionKind::Exploit, Address::new(1, 0), 1.0);
        assert_eq!(
            result.unwrap_err(),
            ActionError::TypeMismatch { kind: ActionKind::Exploit }
        );
    }

    #[test]
    fn test_exploit_equality_uses_tolerance() {
        let target = Address::new(2, 1);
        let a = Action::exploit("e_http", target, &http_linux(0.1 + 0.2, 0.8)).unwrap();
        let b = Action::exploit("other_name", target, &http_linux(0.3, 0.8000000000001)).unwrap();
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));

        let set: HashSet<Action> = [a.clone(), b].into_iter().collect();
        assert_eq!(set.len(), 1);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_large_costs_stay_distinct() {
        let target = Address::new(1, 0);
        let a = Action::service_scan(target, 1e10).unwrap();
        let b = Action::service_scan(target, 5e12).unwrap();
        assert_ne!(a, b);
        assert_ne!(hash_of(&a), hash_of(&b));

        let largest = Action::service_scan(target, MAX_COST).unwrap();
        assert_ne!(largest, Action::service_scan(target, MAX_COST / 2.0).unwrap());
        for cost in [MAX_COST * 2.0, f64::MAX, f64::INFINITY, f64::NAN] {
            assert!(matches!(
                Action::service_scan(target, cost),
                Err(ActionError::Construction { .. })
            ));
        }
    }

    #[test]
    fn test_negative_zero_cost_equals_zero() {
        let target = Address::new(1, 0);
        let a = Action::service_scan(target, 0.0).unwrap();
        let b = Action::service_scan(target, -0.0).unwrap();
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn test_exploit_inequality() {
        let target = Address::new(2, 1);
        let base = Action::exploit("e_http", target, &http_linux(2.0, 0.8)).unwrap();

        let other_target = Action::exploit("e_http", Address::new(2, 0), &http_linux(2.0, 0.8)).unwrap();
        let other_prob = Action::exploit("e_http", target, &http_linux(2.0, 0.7)).unwrap();
        let mut root_def = http_linux(2.0, 0.8);
        root_def.access = AccessLevel::Root;
        let other_access = Action::exploit("e_http", target, &root_def).unwrap();
        let mut any_os = http_linux(2.0, 0.8);
        any_os.os = None;
        let other_os = Action::exploit("e_http", target, &any_os).unwrap();

        assert_ne!(base, other_target);
        assert_ne!(base, other_prob);
        assert_ne!(base, other_access);
        assert_ne!(base, other_os);

        let scan = Action::service_scan(target, 2.0).unwrap();
        assert_ne!(base, scan);
    }

    #[test]
    fn test_classification_predicates() {
        let target = Address::new(1, 0);
        let service_scan = Action::service_scan(target, 1.0).unwrap();
        let subnet_scan = Action::subnet_scan(target, 1.0).unwrap();
        let exploit = Action::exploit("e_http", target, &http_linux(1.0, 0.5)).unwrap();
        let privesc = Action::privilege_escalation(
            "pe_tomcat",
            target,
            &PrivescDef::new("tomcat", Some("linux"), 1.0, 1.0, AccessLevel::Root),
        )
        .unwrap();

        assert!(service_scan.is_scan() && service_scan.is_remote() && service_scan.is_service_scan());
        assert!(subnet_scan.is_scan() && !subnet_scan.is_remote() && subnet_scan.is_subnet_scan());
        assert!(exploit.is_exploit() && exploit.is_remote() && !exploit.is_scan());
        assert!(privesc.is_privilege_escalation() && !privesc.is_remote());
        assert_eq!(privesc.process(), Some("tomcat"));
        assert_eq!(privesc.access(), Some(AccessLevel::Root));
        assert_eq!(
            privesc.to_string(),
            "PrivilegeEscalation: target=(1, 0), cost=1.00, prob=1.00, req_access=user, os=linux, process=tomcat, access=root"
        );
        assert!(Action::noop().is_noop());
    }

    #[test]
    fn test_noop_constants() {
        let noop = Action::noop();
        assert_eq!(noop.cost(), 0.0);
        assert_eq!(noop.prob(), 1.0);
        assert_eq!(noop.req_access(), AccessLevel::None);
        assert_eq!(noop.target(), None);
        assert_eq!(noop, Action::noop());
        assert_eq!(noop.to_string(), "NoOp: target=unaddressed, cost=0.00, prob=1.00, req_access=none");
    }

    #[test]
    fn test_display_renders_capability_fields() {
        let exploit = Action::exploit("e_http", Address::new(1, 2), &http_linux(2.0, 0.8)).unwrap();
        assert_eq!(
            exploit.to_string(),
            "Exploit: target=(1, 2), cost=2.00, prob=0.80, req_access=user, os=linux, service=http, access=user"
        );
        let scan = Action::os_scan(Address::new(3, 0), 0.5).unwrap();
        assert_eq!(scan.to_string(), "OSScan: target=(3, 0), cost=0.50, prob=1.00, req_access=user");
    }

    #[test]
    fn test_defender_action_honours_definition() {
        let def = DefenderActionDef {
            cost: 2.5,
            prob: 0.9,
            req_access: AccessLevel::Root,
        };
        let action = DefenderAction::stop_service(Address::new(1, 0), &def).unwrap();
        assert_eq!(action.cost(), 2.5);
        assert_eq!(action.prob(), 0.9);
        assert_eq!(action.req_access(), AccessLevel::Root);
        assert_eq!(action.name(), "stop_service");
        assert!(action.is_stop_service() && !action.is_stop_process());

        let bad = DefenderActionDef { prob: 1.5, ..def };
        assert!(DefenderAction::change_os(Address::new(1, 0), &bad).is_err());
    }

    #[test]
    fn test_defender_equality_distinguishes_kind() {
        let def = DefenderActionDef::default();
        let target = Address::new(1, 0);
        let a = DefenderAction::change_os(target, &def).unwrap();
        let b = DefenderAction::change_firewall(target, &def).unwrap();
        assert_ne!(a, b);
        assert_eq!(a, DefenderAction::change_os(target, &def).unwrap());
        assert_eq!(hash_of(&a), hash_of(&DefenderAction::change_os(target, &def).unwrap()));
    }
}
