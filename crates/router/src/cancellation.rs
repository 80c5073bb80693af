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

//! Single-sweep DAG rewrites: adjacent-inverse CNOT pairs, adjacent-inverse
//! Hadamard pairs, and equal-argument barrier merges. Each returns whether
//! it rewrote anything so the driver can loop to a fixed point.

use crate::pipeline::CancellationPass;
use chain_router_circuit::dag::{NodeId, WireDag};
use chain_router_circuit::error::StepError;
use chain_router_circuit::logger::Logger;
use chain_router_circuit::QCircuit;
use hashbrown::HashSet;

/// Cancels a `CX(c, t)` immediately followed, on both wires, by an
/// identical `CX(c, t)`.
pub fn cancel_cx(dag: &mut WireDag) -> bool {
    let mut removed: HashSet<NodeId> = HashSet::new();
    let mut changed = false;
    for n in dag.topological() {
        if removed.contains(&n) {
            continue;
        }
        let gate_n = dag.gate(n).clone();
        if !gate_n.is_cx() {
            continue;
        }
        let succs = dag.successors(n);
        if succs.len() != 2 {
            continue;
        }
        let succ_id = succs[0].0;
        if succs[1].0 != succ_id || removed.contains(&succ_id) {
            continue;
        }
        if dag.gate(succ_id) != &gate_n {
            continue;
        }
        let preds_n = dag.predecessors(n);
        let succs_succ = dag.successors(succ_id);
        for (pred, wire) in &preds_n {
            if let Some((after, w2)) = succs_succ.iter().find(|(_, w)| w == wire) {
                dag.add_edge(*pred, *after, *w2);
            }
        }
        dag.remove_node(n);
        dag.remove_node(succ_id);
        removed.insert(n);
        removed.insert(succ_id);
        changed = true;
    }
    changed
}

/// Cancels a Hadamard (or a `u3(pi/2, 0, pi)` dummy gate recognized as one,
/// per the resolved Open Question) immediately followed by another on the
/// same qubit.
pub fn cancel_h(dag: &mut WireDag) -> bool {
    let mut removed: HashSet<NodeId> = HashSet::new();
    let mut changed = false;
    for n in dag.topological() {
        if removed.contains(&n) {
            continue;
        }
        let gate_n = dag.gate(n).clone();
        if !gate_n.is_hadamard_like() {
            continue;
        }
        let q = gate_n.qubits()[0];
        let succs = dag.successors(n);
        if succs.len() != 1 {
            continue;
        }
        let (succ_id, _wire) = succs[0];
        if removed.contains(&succ_id) {
            continue;
        }
        let gate_succ = dag.gate(succ_id).clone();
        if !gate_succ.is_hadamard_like() || gate_succ.qubits()[0] != q {
            continue;
        }
        let preds_n = dag.predecessors(n);
        let succs_succ = dag.successors(succ_id);
        if let (Some((pred, wire)), Some((after, _))) = (preds_n.first(), succs_succ.first()) {
            dag.add_edge(*pred, *after, *wire);
        }
        dag.remove_node(n);
        dag.remove_node(succ_id);
        removed.insert(n);
        removed.insert(succ_id);
        changed = true;
    }
    changed
}

/// Coalesces two successive barriers over the same (unordered) qubit set,
/// keeping the first.
pub fn merge_barrier(dag: &mut WireDag) -> bool {
    let mut removed: HashSet<NodeId> = HashSet::new();
    let mut changed = false;
    for n in dag.topological() {
        if removed.contains(&n) {
            continue;
        }
        let gate_n = dag.gate(n).clone();
        if !gate_n.is_barrier() {
            continue;
        }
        let mut qs_n = gate_n.qubits();
        qs_n.sort();
        let succs = dag.successors(n);
        if succs.is_empty() || succs.len() != qs_n.len() {
            continue;
        }
        let second = succs[0].0;
        if removed.contains(&second) || succs.iter().any(|(id, _)| *id != second) {
            continue;
        }
        let gate_second = dag.gate(second).clone();
        if !gate_second.is_barrier() {
            continue;
        }
        let mut qs_second = gate_second.qubits();
        qs_second.sort();
        if qs_n != qs_second {
            continue;
        }
        let succs_second = dag.successors(second);
        for (after, wire) in &succs_second {
            dag.add_edge(n, *after, *wire);
        }
        dag.remove_node(second);
        removed.insert(second);
        changed = true;
    }
    changed
}

macro_rules! cancellation_pass {
    ($name:ident, $func:path, $label:expr) => {
        #[derive(Clone, Copy, Debug, Default)]
        pub struct $name;

        impl CancellationPass for $name {
            fn run(&self, circuit: &mut QCircuit, logger: &dyn Logger) -> Result<bool, StepError> {
                let changed = $func(&mut circuit.dag);
                if changed {
                    logger.debug(concat!($label, " rewrote at least one node"));
                } else {
                    logger.trace(concat!($label, " made no change"));
                }
                Ok(changed)
            }
        }
    };
}

cancellation_pass!(CancelCx, cancel_cx, "CancelCx");
cancellation_pass!(CancelH, cancel_h, "CancelH");

#[derive(Clone, Copy, Debug, Default)]
pub struct MergeBarrier;

impl CancellationPass for MergeBarrier {
    fn run(&self, circuit: &mut QCircuit, logger: &dyn Logger) -> Result<bool, StepError> {
        let changed = merge_barrier(&mut circuit.dag);
        if changed {
            logger.debug("MergeBarrier coalesced at least one pair");
        } else {
            logger.trace("MergeBarrier made no change");
        }
        Ok(changed)
    }

    fn is_merge_barrier(&self) -> bool {
        true
    }
}
