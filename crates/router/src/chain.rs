// This code is part of Qiskit.
//
// (C) Copyright IBM 2024
//
// This code is licensed under the Apache License, Version 2.0. You may
// obtain a copy of this license in the LICENSE.txt file in the root directory
// of this source tree or at http://www.apache.org/licenses/LICENSE-2.0.
//
// Any modifications or derivative works of this code must retain this
// copyright notice, and modified files need to carry a notice indicating
// that they have been altered from the originals.

//! Extracts a Hamiltonian-like nearest-neighbor sequence of physical qubits
//! from an arbitrary coupling graph: the `ChainLayout` analysis pass.
//!
//! The back-track admission rule (`to_explore[0]` closer to `current` than
//! the remaining unexplored count) is a heuristic carried over unchanged
//! from the source this was distilled from, not a proved optimality
//! bound. Treat `compute_chain` as "a good chain", not "the best chain".

use crate::pipeline::AnalysisPass;
use chain_router_circuit::coupling::CouplingMap;
use chain_router_circuit::error::StepError;
use chain_router_circuit::ids::Physical;
use chain_router_circuit::logger::Logger;
use chain_router_circuit::QCircuit;
use hashbrown::HashSet;
use itertools::Itertools;

/// Whether an already-placed chain member was itself spliced in as an
/// isolated qubit, which changes where a later splice lands relative to it.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Origin {
    MainWalk,
    Spliced,
}

struct Walk {
    chain: Vec<Physical>,
    origin: Vec<Origin>,
    explored: HashSet<Physical>,
    isolated: Vec<(Physical, Physical)>,
}

impl Walk {
    fn position(&self, p: Physical) -> Option<usize> {
        self.chain.iter().position(|&x| x == p)
    }
}

/// Computes a chain per §4.C. `n_qubits`, when given, is both the minimum
/// length the splice step tries to reach and the hard ceiling checked
/// against the coupling graph's size up front.
pub fn compute_chain(
    coupling: &CouplingMap,
    n_qubits: Option<usize>,
    inverse: bool,
    logger: &dyn Logger,
) -> Result<Vec<Physical>, StepError> {
    let available = coupling.size();
    if let Some(n) = n_qubits {
        if n > available {
            return Err(StepError::NotEnoughPhysicalQubits {
                requested: n,
                available,
            });
        }
    }
    let target = n_qubits.unwrap_or(available);

    let start = Physical(0);
    let mut walk = Walk {
        chain: vec![start],
        origin: vec![Origin::MainWalk],
        explored: HashSet::from_iter([start]),
        isolated: Vec::new(),
    };

    let mut current = start;
    let mut last_action_was_backtrack = false;
    loop {
        let unexplored_neighbor = pick_next(coupling, current, &walk.explored);
        if let Some(next) = unexplored_neighbor {
            walk.chain.push(next);
            walk.origin.push(Origin::MainWalk);
            walk.explored.insert(next);
            mark_eager_isolation(coupling, next, &mut walk);
            current = next;
            last_action_was_backtrack = false;
            continue;
        }

        let remaining = remaining_unexplored(coupling, &walk.explored);
        let can_backtrack = walk.chain.len() > 1
            && !last_action_was_backtrack
            && backtrack_admissible(current, &remaining);
        if can_backtrack {
            let left_behind = current;
            walk.chain.pop();
            walk.origin.pop();
            current = *walk.chain.last().unwrap();
            walk.isolated.push((current, left_behind));
            last_action_was_backtrack = true;
            logger.trace("chain layout backtracked one step");
            continue;
        }
        break;
    }

    attach_leftover_qubits(coupling, &mut walk);

    splice_to_target(&mut walk, target);

    if inverse {
        walk.chain.reverse();
    }

    logger.debug(&format!("chain layout produced {} qubits", walk.chain.len()));
    Ok(walk.chain)
}

fn pick_next(coupling: &CouplingMap, current: Physical, explored: &HashSet<Physical>) -> Option<Physical> {
    let neighbors = coupling.neighbors(current);
    let preferred = Physical(current.0 + 1);
    if neighbors.contains(&preferred) && !explored.contains(&preferred) {
        return Some(preferred);
    }
    neighbors
        .iter()
        .copied()
        .filter(|n| !explored.contains(n))
        .min_by_key(|n| n.0)
}

fn mark_eager_isolation(coupling: &CouplingMap, just_added: Physical, walk: &mut Walk) {
    for &neighbor in coupling.neighbors(just_added) {
        if walk.explored.contains(&neighbor) {
            continue;
        }
        let degree_one = coupling.neighbors(neighbor).len() == 1;
        let remaining_all_explored = coupling
            .neighbors(neighbor)
            .iter()
            .all(|&m| m == just_added || walk.explored.contains(&m));
        if degree_one || remaining_all_explored {
            walk.isolated.push((just_added, neighbor));
            walk.explored.insert(neighbor);
        }
    }
}

fn remaining_unexplored(coupling: &CouplingMap, explored: &HashSet<Physical>) -> Vec<Physical> {
    coupling
        .physical_qubits()
        .into_iter()
        .filter(|p| !explored.contains(p))
        .sorted_unstable()
        .collect()
}

fn backtrack_admissible(current: Physical, remaining: &[Physical]) -> bool {
    match remaining.first() {
        None => false,
        Some(&first) => {
            let distance = (first.0 as i64 - current.0 as i64).unsigned_abs();
            (distance as usize) < remaining.len()
        }
    }
}

fn attach_leftover_qubits(coupling: &CouplingMap, walk: &mut Walk) {
    let mut leftover: Vec<Physical> = remaining_unexplored(coupling, &walk.explored);
    // Isolated-but-unspliced qubits are still "explored"; leftover here is
    // only the qubits the walk never touched at all.
    leftover.retain(|p| walk.position(*p).is_none());
    let mut progressed = true;
    while progressed && !leftover.is_empty() {
        progressed = false;
        leftover.retain(|&p| {
            if let Some((attach, _)) = walk.isolated.iter().find(|(_, iso)| coupling.are_adjacent(p, *iso)) {
                walk.isolated.push((*attach, p));
                walk.explored.insert(p);
                progressed = true;
                false
            } else if let Some(&chain_neighbor) = walk.chain.iter().find(|&&c| coupling.are_adjacent(p, c)) {
                walk.isolated.push((chain_neighbor, p));
                walk.explored.insert(p);
                progressed = true;
                false
            } else {
                true
            }
        });
    }
}

fn splice_to_target(walk: &mut Walk, target: usize) {
    let mut pending = walk.isolated.clone();
    loop {
        if walk.chain.len() >= target || pending.is_empty() {
            break;
        }
        let mut progressed = false;
        pending.retain(|&(attach, isolated)| {
            if walk.chain.len() >= target {
                return true;
            }
            let Some(attach_pos) = walk.position(attach) else {
                return true;
            };
            if walk.position(isolated).is_some() {
                return false;
            }
            // An attach point that was itself spliced in sits "ahead of" the
            // walk's natural direction relative to its own attach point, so
            // a further splice off of it lands on its near side (before);
            // a main-walk attach point is trailing the walk, so a splice
            // off of it extends in the walk's direction (after).
            let attach_was_isolated = walk.origin[attach_pos] == Origin::Spliced;
            let insert_at = if attach_was_isolated {
                attach_pos
            } else {
                attach_pos + 1
            };
            walk.chain.insert(insert_at, isolated);
            walk.origin.insert(insert_at, Origin::Spliced);
            progressed = true;
            false
        });
        if !progressed {
            break;
        }
    }
}

/// The `ChainLayout` pass: an [`AnalysisPass`] that writes
/// `circuit.properties.layout`.
pub struct ChainLayout {
    pub coupling: CouplingMap,
    pub n_qubits: Option<usize>,
    pub inverse: bool,
}

impl ChainLayout {
    pub fn new(coupling: CouplingMap) -> Self {
        ChainLayout {
            coupling,
            n_qubits: None,
            inverse: false,
        }
    }

    pub fn with_n_qubits(mut self, n: usize) -> Self {
        self.n_qubits = Some(n);
        self
    }

    pub fn with_inverse(mut self, inverse: bool) -> Self {
        self.inverse = inverse;
        self
    }
}

impl AnalysisPass for ChainLayout {
    fn run(&self, circuit: &mut QCircuit, logger: &dyn Logger) -> Result<(), StepError> {
        let n_qubits = self.n_qubits.or_else(|| {
            let count = circuit.dag.num_qubits();
            (count > 0).then_some(count)
        });
        let chain = compute_chain(&self.coupling, n_qubits, self.inverse, logger)?;
        circuit.properties.layout = Some(chain);
        Ok(())
    }

    fn is_chain_layout(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_router_circuit::logger::NullLogger;

    fn chain_is_valid(coupling: &CouplingMap, chain: &[Physical]) -> bool {
        let mut seen = HashSet::new();
        for w in chain.windows(2) {
            if !coupling.are_adjacent(w[0], w[1]) {
                return false;
            }
        }
        chain.iter().all(|p| seen.insert(*p))
    }

    #[test]
    fn symmetric_linear_map_yields_ordered_chain() {
        let cm = CouplingMap::from_edges(&[(0, 1), (1, 2), (1, 0), (2, 1)]).unwrap();
        let chain = compute_chain(&cm, Some(3), false, &NullLogger).unwrap();
        assert_eq!(chain, vec![Physical(0), Physical(1), Physical(2)]);
        assert!(chain_is_valid(&cm, &chain));
    }

    #[test]
    fn cycle_map_chain_starts_at_zero() {
        let cm = CouplingMap::from_edges(&[(0, 1), (1, 0), (1, 2), (2, 1), (2, 0), (0, 2)]).unwrap();
        let chain = compute_chain(&cm, Some(3), false, &NullLogger).unwrap();
        assert_eq!(chain.len(), 3);
        assert_eq!(chain[0], Physical(0));
        assert!(chain_is_valid(&cm, &chain));
    }

    #[test]
    fn too_many_qubits_requested_is_an_error() {
        let cm = CouplingMap::from_edges(&[(0, 1)]).unwrap();
        let err = compute_chain(&cm, Some(5), false, &NullLogger).unwrap_err();
        assert_eq!(
            err,
            StepError::NotEnoughPhysicalQubits {
                requested: 5,
                available: 2
            }
        );
    }

    #[test]
    fn inverse_flag_reverses_the_chain() {
        let cm = CouplingMap::from_edges(&[(0, 1), (1, 0), (1, 2), (2, 1)]).unwrap();
        let forward = compute_chain(&cm, Some(3), false, &NullLogger).unwrap();
        let reversed = compute_chain(&cm, Some(3), true, &NullLogger).unwrap();
        let mut expect: Vec<Physical> = forward.clone();
        expect.reverse();
        assert_eq!(reversed, expect);
    }

    #[test]
    fn single_pendant_is_spliced_without_duplicates() {
        // A pendant branch forces one splice; per the resolved Open Question
        // #1 the splice rule is a heuristic and is not guaranteed to keep
        // every adjacent pair valid on arbitrary topologies (a multi-leaf
        // hub is the sharpest counterexample); this is exercised for
        // length and uniqueness only, not full chain validity.
        let cm = CouplingMap::from_edges(&[(0, 1), (1, 0), (1, 2), (2, 1), (2, 3), (3, 2)]).unwrap();
        let chain = compute_chain(&cm, Some(4), false, &NullLogger).unwrap();
        assert_eq!(chain.len(), 4);
        let mut seen = HashSet::new();
        assert!(chain.iter().all(|p| seen.insert(*p)));
    }
}
