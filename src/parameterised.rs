//! Parameterised action spaces.
//!
//! A policy picks an action as a 6-component integer vector:
//!
//! | # | component | bound |
//! |---|-----------|-------|
//! | 0 | action kind | number of kinds |
//! | 1 | subnet, offset by one to skip the Internet | `num_subnets - 1` |
//! | 2 | host, reduced modulo the subnet size | `max_subnet_size` |
//! | 3 | OS, 0 is the wildcard | `num_os + 1` |
//! | 4 | service (exploits) | `num_services` |
//! | 5 | process (privilege escalations) | `num_processes` |
//!
//! The vector space is a dense rectangle while the legal actions are sparse,
//! so a combination with no backing capability decodes to `NoOp` instead of
//! failing.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use log::{debug, info};
use rand::Rng;

use crate::action::{Action, DefenderAction};
use crate::error::ActionError;
use crate::scenario::Scenario;
use crate::schema::*;

pub const VECTOR_LEN: usize = 6;

const KIND: usize = 0;
const SUBNET: usize = 1;
const HOST: usize = 2;
const OS: usize = 3;
const SERVICE: usize = 4;
const PROCESS: usize = 5;

/// Names picked by components 3 to 5 of a vector
#[derive(Debug, Clone, Copy)]
pub struct Selectors<'a> {
    /// `None` is the wildcard
    pub os: Option<&'a str>,
    pub service: Option<&'a str>,
    pub process: Option<&'a str>,
}

/// An action-kind enumeration that can drive a [`ParameterisedDecoder`]
pub trait ParamKind: Copy + fmt::Debug + Send + Sync + 'static {
    type Action;

    /// Kinds in the order component 0 indexes them
    const KINDS: &'static [Self];

    /// Builds the action for an already resolved target and selectors.
    ///
    /// Combinations without a backing capability resolve to a valid
    /// placeholder rather than an error.
    fn resolve(
        self,
        scenario: &Scenario,
        target: Address,
        selectors: &Selectors<'_>,
    ) -> Result<Self::Action, ActionError>;
}

impl ParamKind for ActionKind {
    type Action = Action;

    const KINDS: &'static [ActionKind] = &[
        ActionKind::Exploit,
        ActionKind::PrivilegeEscalation,
        ActionKind::ServiceScan,
        ActionKind::OsScan,
        ActionKind::SubnetScan,
        ActionKind::ProcessScan,
    ];

    fn resolve(
        self,
        scenario: &Scenario,
        target: Address,
        selectors: &Selectors<'_>,
    ) -> Result<Action, ActionError> {
        let def = match self {
            ActionKind::Exploit => selectors
                .service
                .and_then(|service| scenario.exploit_def(service, selectors.os)),
            ActionKind::PrivilegeEscalation => selectors
                .process
                .and_then(|process| scenario.privesc_def(process, selectors.os)),
            // OS, service and process are irrelevant to scans
            scan => return Action::scan(scan, target, scenario.scan_cost(scan)?),
        };

        match def {
            Some(def) => Action::from_capability(self, target, def),
            None => {
                debug!("no {} capability for {:?}, decoding to noop", self, selectors);
                Ok(Action::noop())
            }
        }
    }
}

impl ParamKind for DefenderActionKind {
    type Action = DefenderAction;

    const KINDS: &'static [DefenderActionKind] = &[
        DefenderActionKind::ChangeFirewall,
        DefenderActionKind::ChangeOs,
        DefenderActionKind::StopProcess,
        DefenderActionKind::StopService,
    ];

    fn resolve(
        self,
        scenario: &Scenario,
        target: Address,
        _selectors: &Selectors<'_>,
    ) -> Result<DefenderAction, ActionError> {
        DefenderAction::new(self, target, scenario.defender_costs().get(self))
    }
}

/// Decodes fixed-width integer vectors into actions without materialising
/// the full action list.
#[derive(Debug, Clone)]
pub struct ParameterisedDecoder<K> {
    scenario: Arc<Scenario>,
    nvec: [usize; VECTOR_LEN],
    kind: PhantomData<K>,
}

pub type ParameterisedActionSpace = ParameterisedDecoder<ActionKind>;
pub type ParameterisedDefenderActionSpace = ParameterisedDecoder<DefenderActionKind>;

impl<K: ParamKind> ParameterisedDecoder<K> {
    pub fn new(scenario: Arc<Scenario>) -> Self {
        // An empty name list still gets one selector value, which resolves to
        // no name at all.
        let nvec = [
            K::KINDS.len(),
            scenario.num_subnets() - 1,
            scenario.max_subnet_size(),
            scenario.num_os() + 1,
            scenario.num_services().max(1),
            scenario.num_processes().max(1),
        ];
        info!("parameterised action space for {}: nvec={:?}", scenario.name(), nvec);
        Self {
            scenario,
            nvec,
            kind: PhantomData,
        }
    }

    /// Per-component bounds, used to size a policy's output heads
    pub fn nvec(&self) -> [usize; VECTOR_LEN] {
        self.nvec
    }

    /// Number of vectors in the rectangle
    pub fn size(&self) -> usize {
        self.nvec.iter().fold(1usize, |acc, &bound| acc.saturating_mul(bound))
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn decode(&self, vector: &[usize]) -> Result<K::Action, ActionError> {
        if vector.len() != VECTOR_LEN {
            return Err(ActionError::vector(format!(
                "expected {} components, got {}",
                VECTOR_LEN,
                vector.len()
            )));
        }
        // Any host value is valid, it is reduced modulo the subnet size
        for (component, (&value, &bound)) in vector.iter().zip(self.nvec.iter()).enumerate() {
            if component != HOST && value >= bound {
                return Err(ActionError::vector(format!(
                    "component {} is {}, bound is {}",
                    component, value, bound
                )));
            }
        }

        let kind = K::KINDS[vector[KIND]];
        let subnet = vector[SUBNET] + 1;
        let subnet_size = self
            .scenario
            .subnet_size(subnet)
            .ok_or_else(|| ActionError::vector(format!("subnet {} does not exist", subnet)))?;
        let target = Address::new(subnet, vector[HOST] % subnet_size);

        let selectors = Selectors {
            os: match vector[OS] {
                0 => None,
                value => Some(self.scenario.os()[value - 1].as_str()),
            },
            service: self.scenario.services().get(vector[SERVICE]).map(String::as_str),
            process: self.scenario.processes().get(vector[PROCESS]).map(String::as_str),
        };

        kind.resolve(&self.scenario, target, &selectors)
    }

    /// Uniformly random vector, or `None` when the rectangle is empty
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Option<Vec<usize>> {
        if self.size() == 0 {
            return None;
        }
        Some(self.nvec.iter().map(|&bound| rng.gen_range(0..bound)).collect())
    }

    /// Every vector of the rectangle, last component varying fastest
    pub fn vectors(&self) -> Vectors {
        Vectors {
            nvec: self.nvec,
            next: if self.size() == 0 { None } else { Some([0; VECTOR_LEN]) },
        }
    }
}

/// Iterator over all vectors of a parameterised space
#[derive(Debug, Clone)]
pub struct Vectors {
    nvec: [usize; VECTOR_LEN],
    next: Option<[usize; VECTOR_LEN]>,
}

impl Iterator for Vectors {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        let current = self.next?;

        let mut following = current;
        let mut exhausted = true;
        for component in (0..VECTOR_LEN).rev() {
            following[component] += 1;
            if following[component] < self.nvec[component] {
                exhausted = false;
                break;
            }
            following[component] = 0;
        }
        self.next = if exhausted { None } else { Some(following) };

        Some(current.to_vec())
    }
}
