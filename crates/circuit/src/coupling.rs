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

//! Directed and undirected views of a hardware coupling map.

use crate::error::StepError;
use crate::ids::Physical;
use hashbrown::{HashMap, HashSet};
use itertools::Itertools;

/// Cost, in CNOTs, of realizing one logical SWAP on a given link.
pub const SWAP_COST_SYMMETRIC: usize = 3;
pub const SWAP_COST_DIRECTED: usize = 5;

/// A hardware connectivity graph: `(u, v)` pairs where a CX can run with `u`
/// as control and `v` as target.
#[derive(Clone, Debug)]
pub struct CouplingMap {
    directed: HashMap<Physical, Vec<Physical>>,
    undirected: HashMap<Physical, Vec<Physical>>,
    symmetric: bool,
    size: usize,
}

impl CouplingMap {
    pub fn from_edges(edges: &[(u32, u32)]) -> Result<Self, StepError> {
        if edges.is_empty() {
            return Err(StepError::EmptyCouplingMap);
        }
        let mut directed: HashMap<Physical, Vec<Physical>> = HashMap::new();
        let mut undirected: HashMap<Physical, Vec<Physical>> = HashMap::new();
        let mut seen = HashSet::new();
        let edge_set: HashSet<(u32, u32)> = edges.iter().copied().collect();
        for &(u, v) in edges {
            let (pu, pv) = (Physical(u), Physical(v));
            directed.entry(pu).or_default().push(pv);
            directed.entry(pv).or_default();
            undirected.entry(pu).or_default().push(pv);
            undirected.entry(pv).or_default().push(pu);
            seen.insert(u);
            seen.insert(v);
        }
        for neighbors in undirected.values_mut() {
            neighbors.sort_unstable();
            neighbors.dedup();
        }
        for neighbors in directed.values_mut() {
            neighbors.sort_unstable();
            neighbors.dedup();
        }
        let symmetric = edge_set.iter().all(|&(u, v)| edge_set.contains(&(v, u)));
        Ok(CouplingMap {
            directed,
            undirected,
            symmetric,
            size: seen.len(),
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn is_symmetric(&self) -> bool {
        self.symmetric
    }

    pub fn swap_cost(&self) -> usize {
        if self.symmetric {
            SWAP_COST_SYMMETRIC
        } else {
            SWAP_COST_DIRECTED
        }
    }

    pub fn neighbors(&self, p: Physical) -> &[Physical] {
        self.undirected.get(&p).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn directed_successors(&self, p: Physical) -> &[Physical] {
        self.directed.get(&p).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn are_adjacent(&self, a: Physical, b: Physical) -> bool {
        self.undirected.get(&a).map_or(false, |n| n.contains(&b))
    }

    pub fn can_run_cx(&self, control: Physical, target: Physical) -> bool {
        self.directed_successors(control).contains(&target)
    }

    pub fn physical_qubits(&self) -> Vec<Physical> {
        self.undirected.keys().copied().sorted_unstable().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symmetric_linear_map() {
        let cm = CouplingMap::from_edges(&[(0, 1), (1, 2), (1, 0), (2, 1)]).unwrap();
        assert!(cm.is_symmetric());
        assert_eq!(cm.swap_cost(), SWAP_COST_SYMMETRIC);
        assert_eq!(cm.neighbors(Physical(1)), &[Physical(0), Physical(2)]);
    }

    #[test]
    fn directed_map_detected() {
        let cm = CouplingMap::from_edges(&[(0, 1), (1, 2)]).unwrap();
        assert!(!cm.is_symmetric());
        assert_eq!(cm.swap_cost(), SWAP_COST_DIRECTED);
        assert!(cm.can_run_cx(Physical(0), Physical(1)));
        assert!(!cm.can_run_cx(Physical(1), Physical(0)));
    }

    #[test]
    fn empty_map_is_an_error() {
        assert!(CouplingMap::from_edges(&[]).is_err());
    }
}
