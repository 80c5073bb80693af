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

//! The deterministic SWAP router (§4.F): embeds a circuit's logical qubits
//! onto a physical chain and inserts explicit SWAP triples to realize CX
//! gates between qubits the coupling map does not place adjacent.
//!
//! The path search below (`bring_together`) finds the shortest available
//! route with a plain breadth-first search instead of the source's
//! recursive, depth-bounded heuristic with explicit backtracking and a
//! loop-splicing post-pass. A BFS path is already simple (no loop-splice
//! needed) and always finds a route when one exists (no backtrack needed);
//! what it gives up is the source's preference for cheaper-looking
//! intermediate stops when several shortest paths tie, which this
//! implementation instead breaks by ascending physical id, deterministic,
//! just not bit-for-bit the same tie-break.
//!
//! Every emitted CX is routed through `emit_cx` rather than appended
//! directly, since a hardware link may only support one control/target
//! direction (§4.B). When the link is directed and only the reverse
//! direction is native, the desired CX is realized as the standard
//! Hadamard-bracketed substitution instead of being appended as-is.

use crate::decomposition::DecompositionPass;
use crate::pipeline::CompilePass;
use chain_router_circuit::coupling::CouplingMap;
use chain_router_circuit::dag::WireDag;
use chain_router_circuit::error::StepError;
use chain_router_circuit::ids::{Clbit, Physical, Qubit};
use chain_router_circuit::logger::Logger;
use chain_router_circuit::operations::GateKind;
use chain_router_circuit::QCircuit;
use hashbrown::{HashMap, HashSet};
use std::collections::VecDeque;

/// Depth-growth tolerance offset tuning accepts before giving up on further
/// candidate offsets and adopting the best one seen so far.
pub const OFFSET_EARLY_STOP_RATIO: f64 = 0.25;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WireStatus {
    Free,
    Active,
    Measured,
}

/// The router's mutable view of where every logical wire currently sits.
struct RouterState {
    wire_phys: Vec<Physical>,
    phys_wire: HashMap<Physical, usize>,
    status: Vec<WireStatus>,
    depth: Vec<usize>,
    available: HashSet<Physical>,
}

impl RouterState {
    fn new(chain: &[Physical], n: usize, offset: usize) -> Self {
        let len = chain.len();
        let mut wire_phys = Vec::with_capacity(n);
        let mut phys_wire = HashMap::new();
        let mut available = HashSet::new();
        for w in 0..n {
            let p = chain[(w + offset) % len];
            wire_phys.push(p);
            phys_wire.insert(p, w);
            available.insert(p);
        }
        RouterState {
            wire_phys,
            phys_wire,
            status: vec![WireStatus::Free; n],
            depth: vec![0; n],
            available,
        }
    }

    fn phys(&self, wire: usize) -> Physical {
        self.wire_phys[wire]
    }

    fn wire_at(&self, p: Physical) -> Option<usize> {
        self.phys_wire.get(&p).copied()
    }

    fn touch(&mut self, wire: usize) {
        if self.status[wire] == WireStatus::Free {
            self.status[wire] = WireStatus::Active;
        }
        self.depth[wire] += 1;
    }

    fn mark_measured(&mut self, wire: usize) {
        self.status[wire] = WireStatus::Measured;
        self.available.remove(&self.wire_phys[wire]);
    }

    /// Exchanges the physical sites of `a` and `b`, bumping both wires'
    /// depth by one (a SWAP triple is one extra layer on each wire it
    /// touches).
    fn swap(&mut self, a: usize, b: usize) {
        let (pa, pb) = (self.wire_phys[a], self.wire_phys[b]);
        self.wire_phys[a] = pb;
        self.wire_phys[b] = pa;
        self.phys_wire.insert(pb, a);
        self.phys_wire.insert(pa, b);
        self.depth[a] += 1;
        self.depth[b] += 1;
    }

    /// Finds a shortest path of physical sites, currently occupied by
    /// non-measured wires, from `start` to `goal`.
    fn shortest_path(&self, coupling: &CouplingMap, start: Physical, goal: Physical) -> Option<Vec<Physical>> {
        if start == goal {
            return Some(vec![start]);
        }
        let mut visited: HashSet<Physical> = HashSet::from_iter([start]);
        let mut queue: VecDeque<Physical> = VecDeque::from([start]);
        let mut parent: HashMap<Physical, Physical> = HashMap::new();
        while let Some(cur) = queue.pop_front() {
            let mut neighbors: Vec<Physical> = coupling
                .neighbors(cur)
                .iter()
                .copied()
                .filter(|p| *p == goal || self.available.contains(p))
                .collect();
            // Break BFS ties by the occupying wire's current depth, then by
            // physical id. A loose stand-in for the source's
            // `SWAP_DEPTH * estimated_distance + max_depth` cost function,
            // which this search otherwise replaces with plain shortest-path.
            neighbors.sort_unstable_by_key(|p| (self.wire_at(*p).map(|w| self.depth[w]).unwrap_or(0), p.0));
            for nb in neighbors {
                if visited.contains(&nb) {
                    continue;
                }
                visited.insert(nb);
                parent.insert(nb, cur);
                if nb == goal {
                    let mut path = vec![goal];
                    let mut cursor = goal;
                    while let Some(&p) = parent.get(&cursor) {
                        path.push(p);
                        cursor = p;
                    }
                    path.reverse();
                    return Some(path);
                }
                queue.push_back(nb);
            }
        }
        None
    }

    /// Moves the higher-wired endpoint of `(wc, wt)` one physical hop at a
    /// time toward the lower-wired endpoint (the anchor, which never moves)
    /// until the two are adjacent, per §4.F. Returns the sequence of
    /// *physical* site pairs exchanged, in the order the caller should emit
    /// SWAP triples. A SWAP gate acts on fixed hardware sites, so the pair
    /// is recorded at the moment of exchange rather than re-derived from
    /// wire position afterward (later swaps in this same call move the wires
    /// again, which would stale out a wire-indexed pair by the time the
    /// caller emits it).
    fn bring_together(&mut self, coupling: &CouplingMap, wc: usize, wt: usize) -> Result<Vec<(Physical, Physical)>, StepError> {
        if coupling.are_adjacent(self.phys(wc), self.phys(wt)) {
            return Ok(Vec::new());
        }
        let (anchor, mover) = if wc <= wt { (wc, wt) } else { (wt, wc) };
        let (anchor_site, mover_site) = (self.phys(anchor), self.phys(mover));
        let path = self
            .shortest_path(coupling, anchor_site, mover_site)
            .ok_or(StepError::NoSwapPath(anchor_site, mover_site))?;
        if path.len() < 2 {
            return Err(StepError::NoSwapPath(anchor_site, mover_site));
        }
        let mut swaps = Vec::new();
        // path = [anchor_site, .., mover_site]; walk the mover inward one
        // hop per step until it sits one hop from the anchor.
        for i in (1..path.len() - 1).rev() {
            let site_here = path[i + 1];
            let site_next = path[i];
            let wire_here = self
                .wire_at(site_here)
                .ok_or(StepError::NoSwapPath(site_here, site_next))?;
            let wire_next = self
                .wire_at(site_next)
                .ok_or(StepError::NoSwapPath(site_here, site_next))?;
            self.swap(wire_here, wire_next);
            swaps.push((site_here, site_next));
        }
        Ok(swaps)
    }
}

/// Configuration for the [`Router`] compile pass.
#[derive(Clone, Copy, Debug, Default)]
pub struct RouterConfig {
    /// A fixed embedding offset into the chain. When `None`, the router
    /// tunes it itself (§4.F "Offset tuning"), falling back to `0` if
    /// tuning cannot complete.
    pub offset: Option<usize>,
}

/// The deterministic SWAP router, a `Compile`-taxonomy pass.
pub struct Router {
    pub coupling: CouplingMap,
    pub config: RouterConfig,
}

impl Router {
    pub fn new(coupling: CouplingMap) -> Self {
        Router {
            coupling,
            config: RouterConfig::default(),
        }
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.config.offset = Some(offset);
        self
    }

    fn resolve_offset(
        &self,
        chain: &[Physical],
        n: usize,
        probe: &[(usize, usize)],
        logger: &dyn Logger,
    ) -> Result<usize, StepError> {
        let max_offset = chain.len().saturating_sub(n);
        if let Some(o) = self.config.offset {
            if o > max_offset {
                return Err(StepError::OffsetOutOfRange {
                    offset: o,
                    chain_len: chain.len(),
                });
            }
            return Ok(o);
        }
        if max_offset == 0 {
            return Ok(0);
        }
        let mut best_offset = 0usize;
        let mut best_depth: Option<usize> = None;
        for o in 0..=max_offset {
            let Some(depth) = probe_depth(&self.coupling, chain, n, o, probe) else {
                continue;
            };
            match best_depth {
                None => {
                    best_depth = Some(depth);
                    best_offset = o;
                }
                Some(b) if depth < b => {
                    best_depth = Some(depth);
                    best_offset = o;
                }
                Some(b) => {
                    let threshold = (b as f64) * (1.0 + OFFSET_EARLY_STOP_RATIO);
                    if (depth as f64) > threshold {
                        logger.debug("offset tuning early-stopped");
                        break;
                    }
                }
            }
        }
        match best_depth {
            Some(_) => Ok(best_offset),
            None => {
                logger.warn("offset tuning found no viable candidate, falling back to offset 0");
                Ok(0)
            }
        }
    }
}

/// Routes `probe`'s remote CXs against a scratch `RouterState` at a given
/// offset and returns the resulting swap cost, used only to rank candidate
/// offsets relative to each other. Each swap triple is weighted by
/// `coupling.swap_cost()` so a directed map's Hadamard-bracketed triples
/// are not ranked as cheap as a symmetric map's plain ones.
fn probe_depth(coupling: &CouplingMap, chain: &[Physical], n: usize, offset: usize, probe: &[(usize, usize)]) -> Option<usize> {
    let mut state = RouterState::new(chain, n, offset);
    let mut cost = 0usize;
    for &(wc, wt) in probe {
        match state.bring_together(coupling, wc, wt) {
            Ok(swaps) => cost += swaps.len() * coupling.swap_cost(),
            Err(_) => return None,
        }
    }
    Some(cost)
}

/// Appends a CX with `control`/`target` already resolved to physical sites.
/// If the coupling map is directed and only the reverse direction is
/// native, the CX is realized as `H(control) H(target) CX(target, control)
/// H(control) H(target)`, the standard substitution for reversing a CX's
/// control and target with single-qubit gates alone.
fn emit_cx(out: &mut WireDag, phys_qubit: &dyn Fn(Physical) -> Qubit, coupling: &CouplingMap, control: Physical, target: Physical) {
    if coupling.is_symmetric() || coupling.can_run_cx(control, target) {
        out.append(GateKind::Cx(phys_qubit(control), phys_qubit(target))).unwrap();
        return;
    }
    debug_assert!(
        coupling.can_run_cx(target, control),
        "emit_cx called on a non-adjacent pair"
    );
    out.append(GateKind::H(phys_qubit(control))).unwrap();
    out.append(GateKind::H(phys_qubit(target))).unwrap();
    out.append(GateKind::Cx(phys_qubit(target), phys_qubit(control))).unwrap();
    out.append(GateKind::H(phys_qubit(control))).unwrap();
    out.append(GateKind::H(phys_qubit(target))).unwrap();
}

impl CompilePass for Router {
    fn run(&self, circuit: &mut QCircuit, logger: &dyn Logger) -> Result<(), StepError> {
        DecompositionPass.run(circuit, logger)?;

        let chain = match &circuit.properties.layout {
            Some(chain) => chain.clone(),
            None => crate::chain::compute_chain(&self.coupling, None, false, logger)?,
        };

        let qubits = circuit.dag.all_qubits();
        let n = qubits.len();
        if n > chain.len() {
            return Err(StepError::NotEnoughPhysicalQubits {
                requested: n,
                available: chain.len(),
            });
        }
        let wire_of: HashMap<Qubit, usize> = qubits.iter().enumerate().map(|(i, &q)| (q, i)).collect();

        let probe_len = (n / 2).max(1);
        let mut probe = Vec::new();
        'probe: for node in circuit.dag.topological() {
            if let GateKind::Cx(c, t) = circuit.dag.gate(node) {
                let wc = wire_of[c];
                let wt = wire_of[t];
                if !self.coupling.are_adjacent(chain[wc], chain[wt]) {
                    probe.push((wc, wt));
                    if probe.len() >= probe_len {
                        break 'probe;
                    }
                }
            }
        }
        let offset = self.resolve_offset(&chain, n, &probe, logger)?;
        logger.debug(&format!("router resolved offset {offset}"));

        let mut state = RouterState::new(&chain, n, offset);

        let mut out = WireDag::new();
        let phys_qubits = out
            .add_q_register("physical", self.coupling.size() as u32)
            .expect("fresh output dag has no registers yet");
        for (name, dim) in circuit.dag.c_register_specs() {
            out.add_c_register(&name, dim)
                .expect("fresh output dag has no registers yet");
        }
        let phys_qubit = |p: Physical| phys_qubits[p.index()];

        let mut pending_measures: Vec<(usize, Clbit)> = Vec::new();

        for node in circuit.dag.topological() {
            match circuit.dag.gate(node) {
                GateKind::Cx(c, t) => {
                    let wc = wire_of[c];
                    let wt = wire_of[t];
                    if !self.coupling.are_adjacent(state.phys(wc), state.phys(wt)) {
                        let swaps = state.bring_together(&self.coupling, wc, wt)?;
                        for (pa, pb) in swaps {
                            emit_cx(&mut out, &phys_qubit, &self.coupling, pa, pb);
                            emit_cx(&mut out, &phys_qubit, &self.coupling, pb, pa);
                            emit_cx(&mut out, &phys_qubit, &self.coupling, pa, pb);
                        }
                    }
                    let (pc, pt) = (state.phys(wc), state.phys(wt));
                    if !self.coupling.are_adjacent(pc, pt) {
                        return Err(StepError::NonAdjacentCx {
                            control: pc,
                            target: pt,
                        });
                    }
                    emit_cx(&mut out, &phys_qubit, &self.coupling, pc, pt);
                    state.touch(wc);
                    state.touch(wt);
                }
                GateKind::Measure(q, c) => {
                    let w = wire_of[q];
                    pending_measures.push((w, *c));
                    state.mark_measured(w);
                }
                GateKind::Barrier(qs) => {
                    let remapped: chain_router_circuit::operations::QubitVec = qs
                        .iter()
                        .map(|q| {
                            let w = wire_of[q];
                            state.touch(w);
                            phys_qubit(state.phys(w))
                        })
                        .collect();
                    out.append(GateKind::Barrier(remapped)).unwrap();
                }
                other => {
                    let qs = other.qubits();
                    let remapped: Vec<Qubit> = qs
                        .iter()
                        .map(|q| {
                            let w = wire_of[q];
                            state.touch(w);
                            phys_qubit(state.phys(w))
                        })
                        .collect();
                    let rebuilt = remap_single(other, &remapped);
                    out.append(rebuilt).unwrap();
                }
            }
        }

        if !pending_measures.is_empty() {
            let barrier_qubits: chain_router_circuit::operations::QubitVec = pending_measures
                .iter()
                .map(|&(w, _)| phys_qubit(state.phys(w)))
                .collect();
            out.append(GateKind::Barrier(barrier_qubits)).unwrap();
            for (w, c) in pending_measures {
                out.measure(phys_qubit(state.phys(w)), c).unwrap();
            }
        }

        circuit.dag = out;
        circuit.properties.regs_to_physical =
            Some(qubits.iter().enumerate().map(|(w, &q)| (q, state.phys(w))).collect());
        circuit.properties.offset = Some(offset);
        Ok(())
    }
}

/// Rebuilds a non-CX, non-Measure, non-Barrier gate with its qubits replaced
/// by `remapped`, in the same order `GateKind::qubits()` produced them.
fn remap_single(gate: &GateKind, remapped: &[Qubit]) -> GateKind {
    match gate {
        GateKind::Id(_) => GateKind::Id(remapped[0]),
        GateKind::X(_) => GateKind::X(remapped[0]),
        GateKind::Y(_) => GateKind::Y(remapped[0]),
        GateKind::Z(_) => GateKind::Z(remapped[0]),
        GateKind::H(_) => GateKind::H(remapped[0]),
        GateKind::Rx(_, theta) => GateKind::Rx(remapped[0], *theta),
        GateKind::Ry(_, theta) => GateKind::Ry(remapped[0], *theta),
        GateKind::Rz(_, theta) => GateKind::Rz(remapped[0], *theta),
        GateKind::DummyGate { name, params, .. } => GateKind::DummyGate {
            name: name.clone(),
            qubits: remapped.iter().copied().collect(),
            params: params.clone(),
        },
        other => unreachable!("remap_single called on a gate handled elsewhere: {other:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_router_circuit::logger::NullLogger;
    use chain_router_circuit::QCircuit;

    fn linear_coupling(n: u32) -> CouplingMap {
        let edges: Vec<(u32, u32)> = (0..n - 1).flat_map(|i| [(i, i + 1), (i + 1, i)]).collect();
        CouplingMap::from_edges(&edges).unwrap()
    }

    /// A line with every edge pointing from the lower index to the higher
    /// one only, so `can_run_cx(p, p+1)` holds but `can_run_cx(p+1, p)`
    /// never does.
    fn directed_linear_coupling(n: u32) -> CouplingMap {
        let edges: Vec<(u32, u32)> = (0..n - 1).map(|i| (i, i + 1)).collect();
        CouplingMap::from_edges(&edges).unwrap()
    }

    #[test]
    fn remote_cx_on_five_qubit_line_takes_three_swap_triples() {
        let coupling = linear_coupling(5);
        let mut circuit = QCircuit::new();
        let qs = circuit.add_q_register("q", 5).unwrap();
        circuit.cx(qs[0], qs[4]).unwrap();

        let router = Router::new(coupling.clone()).with_offset(0);
        router.run(&mut circuit, &NullLogger).unwrap();

        let cx_count = circuit
            .dag
            .topological()
            .iter()
            .filter(|&&n| circuit.dag.gate(n).is_cx())
            .count();
        assert_eq!(cx_count, 10, "3 swap triples (9 CX) plus the final local CX");

        for node in circuit.dag.topological() {
            if let GateKind::Cx(c, t) = circuit.dag.gate(node) {
                let (pc, pt) = (Physical(c.index as u32), Physical(t.index as u32));
                assert!(coupling.are_adjacent(pc, pt), "every emitted CX must be local");
            }
        }

        let mapping = circuit.properties.regs_to_physical.as_ref().unwrap();
        let (_, final_phys) = mapping.iter().find(|(q, _)| *q == qs[4]).unwrap();
        assert_eq!(*final_phys, Physical(1));
    }

    #[test]
    fn already_adjacent_cx_needs_no_swaps() {
        let coupling = linear_coupling(3);
        let mut circuit = QCircuit::new();
        let qs = circuit.add_q_register("q", 3).unwrap();
        circuit.cx(qs[0], qs[1]).unwrap();

        let router = Router::new(coupling).with_offset(0);
        router.run(&mut circuit, &NullLogger).unwrap();

        let cx_count = circuit
            .dag
            .topological()
            .iter()
            .filter(|&&n| circuit.dag.gate(n).is_cx())
            .count();
        assert_eq!(cx_count, 1);
    }

    #[test]
    fn reversed_cx_on_directed_link_is_bracketed_with_hadamards() {
        let coupling = directed_linear_coupling(2);
        let mut circuit = QCircuit::new();
        let qs = circuit.add_q_register("q", 2).unwrap();
        circuit.cx(qs[1], qs[0]).unwrap();

        let router = Router::new(coupling.clone()).with_offset(0);
        router.run(&mut circuit, &NullLogger).unwrap();

        let kinds: Vec<&'static str> = circuit
            .dag
            .topological()
            .iter()
            .map(|&n| circuit.dag.gate(n).name())
            .collect();
        assert_eq!(kinds, vec!["h", "h", "cx", "h", "h"]);

        for node in circuit.dag.topological() {
            if let GateKind::Cx(c, t) = circuit.dag.gate(node) {
                let (pc, pt) = (Physical(c.index as u32), Physical(t.index as u32));
                assert!(coupling.can_run_cx(pc, pt), "bracketed CX must run in the native direction");
            }
        }
    }

    #[test]
    fn remote_cx_on_directed_line_keeps_every_cx_native() {
        let coupling = directed_linear_coupling(4);
        let mut circuit = QCircuit::new();
        let qs = circuit.add_q_register("q", 4).unwrap();
        circuit.cx(qs[0], qs[3]).unwrap();

        let router = Router::new(coupling.clone()).with_offset(0);
        router.run(&mut circuit, &NullLogger).unwrap();

        for node in circuit.dag.topological() {
            if let GateKind::Cx(c, t) = circuit.dag.gate(node) {
                let (pc, pt) = (Physical(c.index as u32), Physical(t.index as u32));
                assert!(coupling.can_run_cx(pc, pt), "every emitted CX must run in the native direction");
            }
        }
    }

    #[test]
    fn too_many_logical_qubits_is_an_error() {
        let coupling = linear_coupling(2);
        let mut circuit = QCircuit::new();
        circuit.add_q_register("q", 3).unwrap();
        let router = Router::new(coupling);
        let err = router.run(&mut circuit, &NullLogger).unwrap_err();
        assert_eq!(
            err,
            StepError::NotEnoughPhysicalQubits {
                requested: 3,
                available: 2
            }
        );
    }

    #[test]
    fn measurement_is_coalesced_behind_a_barrier() {
        let coupling = linear_coupling(2);
        let mut circuit = QCircuit::new();
        let qs = circuit.add_q_register("q", 2).unwrap();
        let cs = circuit.add_c_register("c", 2).unwrap();
        circuit.measure(qs[0], cs[0]).unwrap();
        circuit.measure(qs[1], cs[1]).unwrap();

        let router = Router::new(coupling).with_offset(0);
        router.run(&mut circuit, &NullLogger).unwrap();

        let kinds: Vec<&'static str> = circuit
            .dag
            .topological()
            .iter()
            .map(|&n| circuit.dag.gate(n).name())
            .collect();
        assert_eq!(kinds, vec!["barrier", "measure", "measure"]);
    }
}
