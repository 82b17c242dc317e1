// Coverage report for a parameterised action space
// Decodes every vector of the rectangle and aggregates the outcomes with a
// differential dataflow, per requested action kind

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use differential_dataflow::input::Input;
use differential_dataflow::operators::reduce::{Count, Threshold};
use log::info;
use timely::dataflow::operators::probe::Handle;

use crate::error::ActionError;
use crate::parameterised::{ParamKind, ParameterisedActionSpace};
use crate::schema::{ActionKind, Address};

// Outcome counts for one requested action kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KindCoverage {
    pub vectors: usize,
    pub resolved: usize,
    pub noop: usize,
    pub distinct_targets: usize,
}

#[derive(Debug, Clone)]
pub struct CoverageReport {
    pub scenario: String,
    pub vectors: usize,
    pub kinds: BTreeMap<ActionKind, KindCoverage>,
}

impl CoverageReport {
    // Share of decoded vectors that fell back to a NoOp
    pub fn noop_fraction(&self) -> f64 {
        if self.vectors == 0 {
            return 0.0;
        }
        let noops: usize = self.kinds.values().map(|k| k.noop).sum();
        noops as f64 / self.vectors as f64
    }

    pub fn print_summary(&self) {
        println!("=== ACTION SPACE COVERAGE ===");
        println!("Scenario: {}", self.scenario);
        println!("Vectors decoded: {}", self.vectors);
        println!("NoOp fraction: {:.2}%", self.noop_fraction() * 100.0);
        println!();
        println!("| Kind                | Vectors | Resolved |    NoOp | Targets |");
        println!("|---------------------|---------|----------|---------|---------|");
        for (kind, coverage) in &self.kinds {
            println!(
                "| {:<19} | {:>7} | {:>8} | {:>7} | {:>7} |",
                kind.to_string(),
                coverage.vectors,
                coverage.resolved,
                coverage.noop,
                coverage.distinct_targets,
            );
        }
    }
}

type OutcomeCounts = BTreeMap<(ActionKind, ActionKind, isize), isize>;
type TargetCounts = BTreeMap<(ActionKind, isize), isize>;

// Decode up to `max_vectors` vectors (all of them when `None`) and build the report
pub fn action_space_coverage(
    space: &ParameterisedActionSpace,
    max_vectors: Option<usize>,
) -> Result<CoverageReport, ActionError> {
    let limit = max_vectors.unwrap_or(usize::MAX);

    // Decoding happens outside the dataflow so errors surface as a Result
    let mut decoded: Vec<(ActionKind, ActionKind, Option<Address>)> = Vec::new();
    for vector in space.vectors().take(limit) {
        let action = space.decode(&vector)?;
        let requested = <ActionKind as ParamKind>::KINDS[vector[0]];
        decoded.push((requested, action.kind(), action.target()));
    }
    let number_of_vectors = decoded.len();
    info!(
        "computing coverage of {} over {} vectors",
        space.scenario().name(),
        number_of_vectors
    );

    let (outcome_counts, target_counts) = timely::execute_directly(move |worker| {
        let mut probe = Handle::new();

        let outcomes: Rc<RefCell<OutcomeCounts>> = Rc::new(RefCell::new(BTreeMap::new()));
        let targets: Rc<RefCell<TargetCounts>> = Rc::new(RefCell::new(BTreeMap::new()));
        let outcome_sink = Rc::clone(&outcomes);
        let target_sink = Rc::clone(&targets);

        let (mut outcome_input, mut target_input) = worker.dataflow::<usize, _, _>(|scope| {
            // (requested kind, decoded kind)
            let (outcome_handle, outcome_collection) =
                scope.new_collection::<(ActionKind, ActionKind), isize>();
            // (decoded kind, target) for every resolved action
            let (target_handle, target_collection) =
                scope.new_collection::<(ActionKind, Address), isize>();

            outcome_collection
                .count()
                .inspect(move |(((requested, decoded_kind), count), _time, diff)| {
                    *outcome_sink
                        .borrow_mut()
                        .entry((*requested, *decoded_kind, *count))
                        .or_insert(0) += *diff;
                })
                .probe_with(&mut probe);

            // Count distinct targets reached by each decoded kind
            target_collection
                .distinct()
                .map(|(decoded_kind, _target)| decoded_kind)
                .count()
                .inspect(move |((decoded_kind, count), _time, diff)| {
                    *target_sink
                        .borrow_mut()
                        .entry((*decoded_kind, *count))
                        .or_insert(0) += *diff;
                })
                .probe_with(&mut probe);

            (outcome_handle, target_handle)
        });

        for (requested, decoded_kind, target) in decoded {
            outcome_input.insert((requested, decoded_kind));
            if let Some(target) = target {
                target_input.insert((decoded_kind, target));
            }
        }

        outcome_input.advance_to(1);
        target_input.advance_to(1);
        outcome_input.flush();
        target_input.flush();

        while probe.less_than(&1) {
            worker.step();
        }

        let outcome_counts = outcomes.borrow().clone();
        let target_counts = targets.borrow().clone();
        (outcome_counts, target_counts)
    });

    let mut kinds: BTreeMap<ActionKind, KindCoverage> = BTreeMap::new();
    for ((requested, decoded_kind, count), multiplicity) in outcome_counts {
        if multiplicity <= 0 {
            continue;
        }
        let count = count as usize;
        let entry = kinds.entry(requested).or_default();
        entry.vectors += count;
        if decoded_kind == ActionKind::NoOp {
            entry.noop += count;
        } else {
            entry.resolved += count;
        }
    }
    for ((decoded_kind, count), multiplicity) in target_counts {
        if multiplicity > 0 {
            kinds.entry(decoded_kind).or_default().distinct_targets = count as usize;
        }
    }

    Ok(CoverageReport {
        scenario: space.scenario().name().to_string(),
        vectors: number_of_vectors,
        kinds,
    })
}
