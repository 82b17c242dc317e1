//! Core data types shared by the action descriptors and the codecs.
//!
//! Everything here is plain data: addresses, access levels, the closed set
//! of action kinds and the capability definitions a scenario supplies.

use abomonation_derive::Abomonation;
use std::fmt;

/// Name of an operating system, e.g. "linux"
pub type OsName = String;

/// Name of a network service, e.g. "ssh"
pub type ServiceName = String;

/// Name of a running process, e.g. "tomcat"
pub type ProcessName = String;

/// Subnet id reserved for the Internet
pub const INTERNET: usize = 0;

/// Privilege level an attacker holds on a host
///
/// Ordering is total: `None < User < Root`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Abomonation)]
pub enum AccessLevel {
    #[default]
    None,
    User,
    Root,
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessLevel::None => write!(f, "none"),
            AccessLevel::User => write!(f, "user"),
            AccessLevel::Root => write!(f, "root"),
        }
    }
}

/// A host in the simulated network
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Abomonation)]
pub struct Address {
    /// Subnet id; `INTERNET` (0) is never a decodable target
    pub subnet: usize,
    /// Host id within the subnet
    pub host: usize,
}

impl Address {
    pub fn new(subnet: usize, host: usize) -> Self {
        Self { subnet, host }
    }
}

impl From<(usize, usize)> for Address {
    fn from((subnet, host): (usize, usize)) -> Self {
        Self::new(subnet, host)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.subnet, self.host)
    }
}

// ============================================================================
// ACTION KINDS
// ============================================================================

/// Discriminant of an attacker action
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Abomonation)]
pub enum ActionKind {
    ServiceScan,
    OsScan,
    SubnetScan,
    ProcessScan,
    Exploit,
    PrivilegeEscalation,
    NoOp,
}

impl ActionKind {
    /// The four scan kinds, in flat enumeration order
    pub const SCANS: [ActionKind; 4] = [
        ActionKind::ServiceScan,
        ActionKind::OsScan,
        ActionKind::SubnetScan,
        ActionKind::ProcessScan,
    ];

    pub fn is_scan(self) -> bool {
        matches!(
            self,
            ActionKind::ServiceScan
                | ActionKind::OsScan
                | ActionKind::SubnetScan
                | ActionKind::ProcessScan
        )
    }

    /// Remote actions are performed against a host the attacker does not
    /// have to be on.
    pub fn is_remote(self) -> bool {
        matches!(
            self,
            ActionKind::ServiceScan | ActionKind::OsScan | ActionKind::Exploit
        )
    }

    /// Default action name used by the scan and no-op constructors
    pub fn label(self) -> &'static str {
        match self {
            ActionKind::ServiceScan => "service_scan",
            ActionKind::OsScan => "os_scan",
            ActionKind::SubnetScan => "subnet_scan",
            ActionKind::ProcessScan => "process_scan",
            ActionKind::Exploit => "exploit",
            ActionKind::PrivilegeEscalation => "privilege_escalation",
            ActionKind::NoOp => "noop",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionKind::ServiceScan => "ServiceScan",
            ActionKind::OsScan => "OSScan",
            ActionKind::SubnetScan => "SubnetScan",
            ActionKind::ProcessScan => "ProcessScan",
            ActionKind::Exploit => "Exploit",
            ActionKind::PrivilegeEscalation => "PrivilegeEscalation",
            ActionKind::NoOp => "NoOp",
        };
        f.write_str(name)
    }
}

/// Discriminant of a defender countermeasure
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Abomonation)]
pub enum DefenderActionKind {
    ChangeOs,
    ChangeFirewall,
    StopService,
    StopProcess,
}

impl DefenderActionKind {
    /// All defender kinds, in flat enumeration order
    pub const ALL: [DefenderActionKind; 4] = [
        DefenderActionKind::ChangeOs,
        DefenderActionKind::ChangeFirewall,
        DefenderActionKind::StopService,
        DefenderActionKind::StopProcess,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DefenderActionKind::ChangeOs => "change_os",
            DefenderActionKind::ChangeFirewall => "change_firewall",
            DefenderActionKind::StopService => "stop_service",
            DefenderActionKind::StopProcess => "stop_process",
        }
    }
}

impl fmt::Display for DefenderActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DefenderActionKind::ChangeOs => "ChangeOS",
            DefenderActionKind::ChangeFirewall => "ChangeFirewall",
            DefenderActionKind::StopService => "StopService",
            DefenderActionKind::StopProcess => "StopProcess",
        };
        f.write_str(name)
    }
}

// ============================================================================
// CAPABILITY DEFINITIONS
// ============================================================================

/// An exploit registry entry
#[derive(Debug, Clone, PartialEq)]
pub struct ExploitDef {
    /// Service the exploit targets
    pub service: ServiceName,
    /// Required operating system, `None` matches any
    pub os: Option<OsName>,
    pub cost: f64,
    pub prob: f64,
    /// Access level granted on success
    pub access: AccessLevel,
    pub req_access: AccessLevel,
}

impl ExploitDef {
    pub fn new(service: &str, os: Option<&str>, cost: f64, prob: f64, access: AccessLevel) -> Self {
        Self {
            service: service.to_string(),
            os: os.map(str::to_string),
            cost,
            prob,
            access,
            req_access: AccessLevel::User,
        }
    }
}

/// A privilege escalation registry entry
#[derive(Debug, Clone, PartialEq)]
pub struct PrivescDef {
    /// Process the escalation abuses
    pub process: ProcessName,
    /// Required operating system, `None` matches any
    pub os: Option<OsName>,
    pub cost: f64,
    pub prob: f64,
    /// Access level granted on success
    pub access: AccessLevel,
    pub req_access: AccessLevel,
}

impl PrivescDef {
    pub fn new(process: &str, os: Option<&str>, cost: f64, prob: f64, access: AccessLevel) -> Self {
        Self {
            process: process.to_string(),
            os: os.map(str::to_string),
            cost,
            prob,
            access,
            req_access: AccessLevel::User,
        }
    }
}

/// Resolved entry of a capability table
///
/// `exploit_map[service][os]` and `privesc_map[process][os]` both map to
/// this record. The lookup keys themselves are carried along so the decoded
/// action can be built from the definition alone.
#[derive(Debug, Clone, PartialEq)]
pub struct CapabilityDef {
    /// Registry name of the exploit or privilege escalation
    pub name: String,
    /// Service (exploits) or process (privilege escalations)
    pub subject: String,
    pub os: Option<OsName>,
    pub cost: f64,
    pub prob: f64,
    pub access: AccessLevel,
    pub req_access: AccessLevel,
}

impl CapabilityDef {
    pub fn from_exploit(name: &str, def: &ExploitDef) -> Self {
        Self {
            name: name.to_string(),
            subject: def.service.clone(),
            os: def.os.clone(),
            cost: def.cost,
            prob: def.prob,
            access: def.access,
            req_access: def.req_access,
        }
    }

    pub fn from_privesc(name: &str, def: &PrivescDef) -> Self {
        Self {
            name: name.to_string(),
            subject: def.process.clone(),
            os: def.os.clone(),
            cost: def.cost,
            prob: def.prob,
            access: def.access,
            req_access: def.req_access,
        }
    }
}

/// Cost, probability and precondition of one defender countermeasure
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DefenderActionDef {
    pub cost: f64,
    pub prob: f64,
    pub req_access: AccessLevel,
}

impl Default for DefenderActionDef {
    fn default() -> Self {
        Self {
            cost: 0.0,
            prob: 1.0,
            req_access: AccessLevel::None,
        }
    }
}

/// Fixed scenario-level cost of each scan type
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanCosts {
    pub service_scan: f64,
    pub os_scan: f64,
    pub subnet_scan: f64,
    pub process_scan: f64,
}

impl Default for ScanCosts {
    fn default() -> Self {
        Self {
            service_scan: 1.0,
            os_scan: 1.0,
            subnet_scan: 1.0,
            process_scan: 1.0,
        }
    }
}

/// Per-kind definitions for defender countermeasures
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DefenderCosts {
    pub change_os: DefenderActionDef,
    pub change_firewall: DefenderActionDef,
    pub stop_service: DefenderActionDef,
    pub stop_process: DefenderActionDef,
}

impl DefenderCosts {
    pub fn get(&self, kind: DefenderActionKind) -> &DefenderActionDef {
        match kind {
            DefenderActionKind::ChangeOs => &self.change_os,
            DefenderActionKind::ChangeFirewall => &self.change_firewall,
            DefenderActionKind::StopService => &self.stop_service,
            DefenderActionKind::StopProcess => &self.stop_process,
        }
    }
}
