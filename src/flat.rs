//! Flat action spaces: every legal action gets one dedicated index.

use std::collections::HashMap;
use std::hash::Hash;

use log::{info, warn};
use rand::Rng;

use crate::action::{Action, DefenderAction};
use crate::error::ActionError;
use crate::scenario::Scenario;
use crate::schema::{ActionKind, DefenderActionKind};

/// Enumerates the attacker actions of a scenario.
///
/// Per address: the four scans, then every exploit in registry order, then
/// every privilege escalation in registry order.
pub fn load_action_list(scenario: &Scenario) -> Result<Vec<Action>, ActionError> {
    let per_address = ActionKind::SCANS.len() + scenario.exploits().len() + scenario.privescs().len();
    let mut actions = Vec::with_capacity(scenario.address_space().len() * per_address);

    for &address in scenario.address_space() {
        for kind in ActionKind::SCANS {
            actions.push(Action::scan(kind, address, scenario.scan_cost(kind)?)?);
        }
        for (name, def) in scenario.exploits() {
            actions.push(Action::exploit(name, address, def)?);
        }
        for (name, def) in scenario.privescs() {
            actions.push(Action::privilege_escalation(name, address, def)?);
        }
    }

    Ok(actions)
}

/// Enumerates the defender actions: the four countermeasures per defendable host
pub fn load_defender_action_list(scenario: &Scenario) -> Result<Vec<DefenderAction>, ActionError> {
    let mut actions = Vec::with_capacity(scenario.defendable().len() * DefenderActionKind::ALL.len());

    for &address in scenario.defendable() {
        for kind in DefenderActionKind::ALL {
            actions.push(DefenderAction::new(kind, address, scenario.defender_costs().get(kind))?);
        }
    }

    Ok(actions)
}

/// Dense index <-> action mapping
#[derive(Debug, Clone)]
pub struct FlatSpace<A> {
    actions: Vec<A>,
    index: HashMap<A, usize>,
}

pub type FlatActionSpace = FlatSpace<Action>;
pub type FlatDefenderActionSpace = FlatSpace<DefenderAction>;

impl FlatSpace<Action> {
    pub fn new(scenario: &Scenario) -> Result<Self, ActionError> {
        let space = Self::from_actions(load_action_list(scenario)?);
        info!("flat action space for {}: {} actions", scenario.name(), space.len());
        Ok(space)
    }
}

impl FlatSpace<DefenderAction> {
    pub fn new(scenario: &Scenario) -> Result<Self, ActionError> {
        let space = Self::from_actions(load_defender_action_list(scenario)?);
        info!("flat defender action space for {}: {} actions", scenario.name(), space.len());
        Ok(space)
    }
}

impl<A: Clone + Eq + Hash> FlatSpace<A> {
    /// Wraps an already ordered action list.
    ///
    /// Actions that compare equal to an earlier entry keep their own index,
    /// but `index_of` resolves them to the first occurrence.
    pub fn from_actions(actions: Vec<A>) -> Self {
        let mut index = HashMap::with_capacity(actions.len());
        for (position, action) in actions.iter().enumerate() {
            if let Some(first) = index.get(action) {
                warn!("action {} duplicates action {}", position, first);
                continue;
            }
            index.insert(action.clone(), position);
        }
        Self { actions, index }
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn actions(&self) -> &[A] {
        &self.actions
    }

    pub fn get_action(&self, index: usize) -> Result<&A, ActionError> {
        self.actions.get(index).ok_or(ActionError::InvalidActionIndex {
            index: i64::try_from(index).unwrap_or(i64::MAX),
            len: self.actions.len(),
        })
    }

    /// Like `get_action`, for signed indices straight out of a policy
    pub fn get_action_raw(&self, index: i64) -> Result<&A, ActionError> {
        match usize::try_from(index) {
            Ok(index) => self.get_action(index),
            Err(_) => Err(ActionError::InvalidActionIndex {
                index,
                len: self.actions.len(),
            }),
        }
    }

    /// Index of the first action equal to `action`
    pub fn index_of(&self, action: &A) -> Option<usize> {
        self.index.get(action).copied()
    }

    /// Uniformly random action, or `None` for an empty space
    pub fn sample<R: Rng>(&self, rng: &mut R) -> Option<&A> {
        if self.actions.is_empty() {
            return None;
        }
        Some(&self.actions[rng.gen_range(0..self.actions.len())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenarios::{tiny, tiny_with_defender, uniform};
    use crate::schema::{Address, DefenderActionDef};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_action_count_formula() {
        for scenario in [tiny().unwrap(), uniform(3, 4).unwrap()] {
            let space = FlatActionSpace::new(&scenario).unwrap();
            let per_address = 4 + scenario.exploits().len() + scenario.privescs().len();
            assert_eq!(space.len(), scenario.address_space().len() * per_address);
        }
    }

    #[test]
    fn test_enumeration_order() {
        let scenario = tiny().unwrap();
        let space = FlatActionSpace::new(&scenario).unwrap();
        let first = Address::new(1, 0);

        assert!(space.get_action(0).unwrap().is_service_scan());
        assert!(space.get_action(1).unwrap().is_os_scan());
        assert!(space.get_action(2).unwrap().is_subnet_scan());
        assert!(space.get_action(3).unwrap().is_process_scan());
        assert!(space.get_action(4).unwrap().is_exploit());
        assert!(space.get_action(5).unwrap().is_privilege_escalation());
        for index in 0..6 {
            assert_eq!(space.get_action(index).unwrap().target(), Some(first));
        }
        assert_eq!(space.get_action(6).unwrap().target(), Some(Address::new(2, 0)));
    }

    #[test]
    fn test_index_bijection() {
        let space = FlatActionSpace::new(&uniform(2, 3).unwrap()).unwrap();
        for index in 0..space.len() {
            let action = space.get_action(index).unwrap();
            assert_eq!(space.index_of(action), Some(index));
        }
        assert_eq!(space.index_of(&Action::noop()), None);
    }

    #[test]
    fn test_out_of_range_index_is_an_error() {
        let space = FlatActionSpace::new(&tiny().unwrap()).unwrap();
        let len = space.len();
        assert_eq!(
            space.get_action(len).unwrap_err(),
            ActionError::InvalidActionIndex { index: len as i64, len }
        );
        assert!(matches!(
            space.get_action_raw(-1),
            Err(ActionError::InvalidActionIndex { index: -1, .. })
        ));
        assert!(space.get_action_raw(0).is_ok());
    }

    #[test]
    fn test_huge_index_reports_saturated_value() {
        let space = FlatActionSpace::new(&tiny().unwrap()).unwrap();
        assert_eq!(
            space.get_action(usize::MAX).unwrap_err(),
            ActionError::InvalidActionIndex { index: i64::MAX, len: space.len() }
        );
    }

    #[test]
    fn test_enumeration_is_stable() {
        let a = FlatActionSpace::new(&uniform(2, 2).unwrap()).unwrap();
        let b = FlatActionSpace::new(&uniform(2, 2).unwrap()).unwrap();
        assert_eq!(a.actions(), b.actions());
    }

    #[test]
    fn test_defender_space() {
        let scenario = tiny_with_defender().unwrap();
        let space = FlatDefenderActionSpace::new(&scenario).unwrap();
        assert_eq!(space.len(), scenario.defendable().len() * 4);

        let first = space.get_action(0).unwrap();
        assert!(first.is_change_os());
        assert!(space.get_action(1).unwrap().is_change_firewall());
        assert!(space.get_action(2).unwrap().is_stop_service());
        assert!(space.get_action(3).unwrap().is_stop_process());
        assert_eq!(first.cost(), scenario.defender_costs().change_os.cost);

        for index in 0..space.len() {
            assert_eq!(space.index_of(space.get_action(index).unwrap()), Some(index));
        }
    }

    #[test]
    fn test_duplicates_resolve_to_first_index() {
        let def = DefenderActionDef::default();
        let action = DefenderAction::change_os(Address::new(1, 0), &def).unwrap();
        let space = FlatSpace::from_actions(vec![action.clone(), action.clone()]);
        assert_eq!(space.len(), 2);
        assert_eq!(space.index_of(&action), Some(0));
    }

    #[test]
    fn test_sample_stays_in_space() {
        let space = FlatActionSpace::new(&tiny().unwrap()).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let action = space.sample(&mut rng).unwrap();
            assert!(space.index_of(action).is_some());
        }
        let empty: FlatSpace<Action> = FlatSpace::from_actions(Vec::new());
        assert!(empty.sample(&mut rng).is_none());
    }
}
