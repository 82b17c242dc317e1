//! Scenario description consumed by the codecs.
//!
//! A scenario is assembled with [`ScenarioBuilder`], which validates the
//! registries and derives the two capability tables
//! (`exploit_map[service][os]` and `privesc_map[process][os]`).
//! Once built a scenario is read-only.

use std::collections::{HashMap, HashSet};

use log::warn;

use crate::error::ActionError;
use crate::schema::*;

/// Capability table keyed by service or process, then by OS (`None` = any)
pub type CapabilityMap = HashMap<String, HashMap<Option<OsName>, CapabilityDef>>;

#[derive(Debug, Clone)]
pub struct Scenario {
    name: String,
    subnets: Vec<usize>,
    os: Vec<OsName>,
    services: Vec<ServiceName>,
    processes: Vec<ProcessName>,
    exploits: Vec<(String, ExploitDef)>,
    privescs: Vec<(String, PrivescDef)>,
    scan_costs: ScanCosts,
    defender_costs: DefenderCosts,
    address_space: Vec<Address>,
    defendable: Vec<Address>,
    exploit_map: CapabilityMap,
    privesc_map: CapabilityMap,
}

impl Scenario {
    pub fn builder(name: &str) -> ScenarioBuilder {
        ScenarioBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Subnet sizes, including the Internet at index 0
    pub fn subnets(&self) -> &[usize] {
        &self.subnets
    }

    pub fn subnet_size(&self, subnet: usize) -> Option<usize> {
        self.subnets.get(subnet).copied()
    }

    /// Number of subnets, including the Internet
    pub fn num_subnets(&self) -> usize {
        self.subnets.len()
    }

    pub fn max_subnet_size(&self) -> usize {
        self.subnets.iter().copied().max().unwrap_or(0)
    }

    pub fn os(&self) -> &[OsName] {
        &self.os
    }

    pub fn services(&self) -> &[ServiceName] {
        &self.services
    }

    pub fn processes(&self) -> &[ProcessName] {
        &self.processes
    }

    pub fn num_os(&self) -> usize {
        self.os.len()
    }

    pub fn num_services(&self) -> usize {
        self.services.len()
    }

    pub fn num_processes(&self) -> usize {
        self.processes.len()
    }

    /// Exploit registry, in registration order
    pub fn exploits(&self) -> &[(String, ExploitDef)] {
        &self.exploits
    }

    /// Privilege escalation registry, in registration order
    pub fn privescs(&self) -> &[(String, PrivescDef)] {
        &self.privescs
    }

    pub fn scan_costs(&self) -> &ScanCosts {
        &self.scan_costs
    }

    pub fn defender_costs(&self) -> &DefenderCosts {
        &self.defender_costs
    }

    /// Every host address, ordered by subnet then host
    pub fn address_space(&self) -> &[Address] {
        &self.address_space
    }

    /// Addresses the defender may act on
    pub fn defendable(&self) -> &[Address] {
        &self.defendable
    }

    pub fn exploit_map(&self) -> &CapabilityMap {
        &self.exploit_map
    }

    pub fn privesc_map(&self) -> &CapabilityMap {
        &self.privesc_map
    }

    /// Fixed cost of a scan kind; any other kind is a configuration bug
    pub fn scan_cost(&self, kind: ActionKind) -> Result<f64, ActionError> {
        match kind {
            ActionKind::ServiceScan => Ok(self.scan_costs.service_scan),
            ActionKind::OsScan => Ok(self.scan_costs.os_scan),
            ActionKind::SubnetScan => Ok(self.scan_costs.subnet_scan),
            ActionKind::ProcessScan => Ok(self.scan_costs.process_scan),
            other => Err(ActionError::TypeMismatch { kind: other }),
        }
    }

    /// `exploit_map[service][os]`, or `None` if either key is absent
    pub fn exploit_def(&self, service: &str, os: Option<&str>) -> Option<&CapabilityDef> {
        lookup(&self.exploit_map, service, os)
    }

    /// `privesc_map[process][os]`, or `None` if either key is absent
    pub fn privesc_def(&self, process: &str, os: Option<&str>) -> Option<&CapabilityDef> {
        lookup(&self.privesc_map, process, os)
    }
}

fn lookup<'a>(map: &'a CapabilityMap, subject: &str, os: Option<&str>) -> Option<&'a CapabilityDef> {
    map.get(subject)?.get(&os.map(str::to_string))
}

fn insert_capability(map: &mut CapabilityMap, def: CapabilityDef) {
    let by_os = map.entry(def.subject.clone()).or_default();
    if let Some(previous) = by_os.get(&def.os) {
        warn!(
            "capability {} replaces {} for ({}, {:?})",
            def.name, previous.name, def.subject, def.os
        );
    }
    by_os.insert(def.os.clone(), def);
}

/// Builder for [`Scenario`]
#[derive(Debug, Clone)]
pub struct ScenarioBuilder {
    name: String,
    subnets: Vec<usize>,
    os: Vec<OsName>,
    services: Vec<ServiceName>,
    processes: Vec<ProcessName>,
    exploits: Vec<(String, ExploitDef)>,
    privescs: Vec<(String, PrivescDef)>,
    scan_costs: ScanCosts,
    defender_costs: DefenderCosts,
    defendable: Option<Vec<Address>>,
}

impl ScenarioBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            subnets: Vec::new(),
            os: Vec::new(),
            services: Vec::new(),
            processes: Vec::new(),
            exploits: Vec::new(),
            privescs: Vec::new(),
            scan_costs: ScanCosts::default(),
            defender_costs: DefenderCosts::default(),
            defendable: None,
        }
    }

    /// Sizes of the non-Internet subnets; the Internet is added as subnet 0
    pub fn subnets(mut self, sizes: &[usize]) -> Self {
        self.subnets = sizes.to_vec();
        self
    }

    pub fn os(mut self, names: &[&str]) -> Self {
        self.os = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn services(mut self, names: &[&str]) -> Self {
        self.services = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn processes(mut self, names: &[&str]) -> Self {
        self.processes = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn exploit(mut self, name: &str, def: ExploitDef) -> Self {
        self.exploits.push((name.to_string(), def));
        self
    }

    pub fn privesc(mut self, name: &str, def: PrivescDef) -> Self {
        self.privescs.push((name.to_string(), def));
        self
    }

    pub fn scan_costs(mut self, costs: ScanCosts) -> Self {
        self.scan_costs = costs;
        self
    }

    pub fn defender_costs(mut self, costs: DefenderCosts) -> Self {
        self.defender_costs = costs;
        self
    }

    /// Restricts the defender to the given hosts; defaults to every host
    pub fn defendable(mut self, addresses: &[Address]) -> Self {
        self.defendable = Some(addresses.to_vec());
        self
    }

    pub fn build(self) -> Result<Scenario, ActionError> {
        if self.subnets.is_empty() {
            return Err(ActionError::scenario("at least one subnet besides the Internet is required"));
        }
        if let Some(position) = self.subnets.iter().position(|&size| size == 0) {
            return Err(ActionError::scenario(format!("subnet {} has no hosts", position + 1)));
        }

        let mut subnets = Vec::with_capacity(self.subnets.len() + 1);
        subnets.push(1);
        subnets.extend_from_slice(&self.subnets);

        let check_os = |owner: &str, os: &Option<OsName>| match os {
            Some(os) if !self.os.contains(os) => Err(ActionError::scenario(format!(
                "{} requires unknown os {}",
                owner, os
            ))),
            _ => Ok(()),
        };

        let mut exploit_map = CapabilityMap::new();
        let mut names = HashSet::new();
        for (name, def) in &self.exploits {
            if !names.insert(name.as_str()) {
                return Err(ActionError::scenario(format!("duplicate exploit name {}", name)));
            }
            if !self.services.contains(&def.service) {
                return Err(ActionError::scenario(format!(
                    "exploit {} targets unknown service {}",
                    name, def.service
                )));
            }
            check_os(name, &def.os)?;
            insert_capability(&mut exploit_map, CapabilityDef::from_exploit(name, def));
        }

        let mut privesc_map = CapabilityMap::new();
        names.clear();
        for (name, def) in &self.privescs {
            if !names.insert(name.as_str()) {
                return Err(ActionError::scenario(format!(
                    "duplicate privilege escalation name {}",
                    name
                )));
            }
            if !self.processes.contains(&def.process) {
                return Err(ActionError::scenario(format!(
                    "privilege escalation {} targets unknown process {}",
                    name, def.process
                )));
            }
            check_os(name, &def.os)?;
            insert_capability(&mut privesc_map, CapabilityDef::from_privesc(name, def));
        }
        drop(names);

        let address_space: Vec<Address> = subnets
            .iter()
            .enumerate()
            .skip(1)
            .flat_map(|(subnet, &size)| (0..size).map(move |host| Address::new(subnet, host)))
            .collect();

        let defendable = match self.defendable {
            Some(addresses) => {
                if let Some(bad) = addresses.iter().find(|a| !address_space.contains(*a)) {
                    return Err(ActionError::scenario(format!(
                        "defendable address {} is not a host",
                        bad
                    )));
                }
                addresses
            }
            None => address_space.clone(),
        };

        Ok(Scenario {
            name: self.name,
            subnets,
            os: self.os,
            services: self.services,
            processes: self.processes,
            exploits: self.exploits,
            privescs: self.privescs,
            scan_costs: self.scan_costs,
            defender_costs: self.defender_costs,
            address_space,
            defendable,
            exploit_map,
            privesc_map,
        })
    }
}
