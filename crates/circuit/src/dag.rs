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

//! The wire DAG: a directed multigraph of gate events with per-qubit edge
//! identity, backed by a [`StableDiGraph`] so node indices never get reused
//! once assigned.

use crate::error::GraphError;
use crate::ids::{Clbit, Qubit, RegisterId, Wire};
use crate::operations::GateKind;
use hashbrown::HashMap;
use rustworkx_core::petgraph::prelude::StableDiGraph;
use rustworkx_core::petgraph::stable_graph::NodeIndex;
use rustworkx_core::petgraph::Direction;
use std::collections::VecDeque;

/// Stable identity for a DAG node. Equal to the underlying petgraph index,
/// but newtyped so callers never construct one from a raw integer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) NodeIndex);

#[derive(Clone, Copy, Debug)]
struct RegisterInfo {
    id: RegisterId,
    dim: u32,
}

/// The circuit's DAG: one `Input`/`Output` sentinel pair per logical qubit,
/// one `ClassicOutput` per classical bit, and one node per gate event.
pub struct WireDag {
    graph: StableDiGraph<GateKind, Wire>,
    q_registers: indexmap::IndexMap<String, RegisterInfo>,
    c_registers: indexmap::IndexMap<String, RegisterInfo>,
    in_qubit: HashMap<Qubit, NodeIndex>,
    out_qubit: HashMap<Qubit, NodeIndex>,
    out_classic: HashMap<Clbit, NodeIndex>,
}

impl Default for WireDag {
    fn default() -> Self {
        Self::new()
    }
}

impl WireDag {
    pub fn new() -> Self {
        WireDag {
            graph: StableDiGraph::new(),
            q_registers: indexmap::IndexMap::new(),
            c_registers: indexmap::IndexMap::new(),
            in_qubit: HashMap::new(),
            out_qubit: HashMap::new(),
            out_classic: HashMap::new(),
        }
    }

    pub fn num_qubits(&self) -> usize {
        self.in_qubit.len()
    }

    pub fn q_register_name(&self, id: RegisterId) -> Option<&str> {
        self.q_registers
            .iter()
            .find(|(_, info)| info.id == id)
            .map(|(name, _)| name.as_str())
    }

    pub fn c_register_name(&self, id: RegisterId) -> Option<&str> {
        self.c_registers
            .iter()
            .find(|(_, info)| info.id == id)
            .map(|(name, _)| name.as_str())
    }

    /// `(name, dim)` for every quantum register, in declaration order;
    /// enough for a pass that builds a fresh `WireDag` to recreate the same
    /// register layout before replaying gates into it.
    pub fn q_register_specs(&self) -> Vec<(String, u32)> {
        self.q_registers
            .iter()
            .map(|(name, info)| (name.clone(), info.dim))
            .collect()
    }

    /// `(name, dim)` for every classical register, in declaration order.
    pub fn c_register_specs(&self) -> Vec<(String, u32)> {
        self.c_registers
            .iter()
            .map(|(name, info)| (name.clone(), info.dim))
            .collect()
    }

    /// Every logical qubit across all registers, in register-declaration,
    /// then index, order: the canonical wire-id enumeration order used by
    /// routing and pattern matching.
    pub fn all_qubits(&self) -> Vec<Qubit> {
        let mut qubits: Vec<Qubit> = self
            .q_registers
            .values()
            .flat_map(|info| (0..info.dim).map(move |i| Qubit::new(info.id, i)))
            .collect();
        qubits.sort_by_key(|q| (q.reg.0, q.index));
        qubits
    }

    /// Every classical bit across all registers, in register-declaration,
    /// then index, order.
    pub fn all_clbits(&self) -> Vec<Clbit> {
        let mut clbits: Vec<Clbit> = self
            .c_registers
            .values()
            .flat_map(|info| (0..info.dim).map(move |i| Clbit::new(info.id, i)))
            .collect();
        clbits.sort_by_key(|c| (c.reg.0, c.index));
        clbits
    }

    pub fn add_q_register(&mut self, name: &str, dim: u32) -> Result<Vec<Qubit>, GraphError> {
        if self.q_registers.contains_key(name) {
            return Err(GraphError::QuantumRegisterExists(name.to_string()));
        }
        let id = RegisterId(self.q_registers.len() as u32);
        self.q_registers
            .insert(name.to_string(), RegisterInfo { id, dim });
        let mut qubits = Vec::with_capacity(dim as usize);
        for i in 0..dim {
            let q = Qubit::new(id, i);
            let input = self.graph.add_node(GateKind::Input(q));
            let output = self.graph.add_node(GateKind::Output(q));
            self.graph.add_edge(input, output, Wire::Qubit(q));
            self.in_qubit.insert(q, input);
            self.out_qubit.insert(q, output);
            qubits.push(q);
        }
        Ok(qubits)
    }

    pub fn add_c_register(&mut self, name: &str, dim: u32) -> Result<Vec<Clbit>, GraphError> {
        if self.c_registers.contains_key(name) {
            return Err(GraphError::ClassicalRegisterExists(name.to_string()));
        }
        let id = RegisterId(self.c_registers.len() as u32);
        self.c_registers
            .insert(name.to_string(), RegisterInfo { id, dim });
        let mut clbits = Vec::with_capacity(dim as usize);
        for i in 0..dim {
            let c = Clbit::new(id, i);
            let node = self.graph.add_node(GateKind::ClassicOutput(c));
            self.out_classic.insert(c, node);
            clbits.push(c);
        }
        Ok(clbits)
    }

    /// Adds a sentinel pair for `q` directly, without allocating a named
    /// register, for a scratch dag built to stand in for one node's worth
    /// of wires during [`Self::substitute`], where the wire identity must
    /// match the outer dag's logical qubit exactly rather than being
    /// renumbered from zero.
    pub fn add_scratch_qubit(&mut self, q: Qubit) -> NodeId {
        let input = self.graph.add_node(GateKind::Input(q));
        let output = self.graph.add_node(GateKind::Output(q));
        self.graph.add_edge(input, output, Wire::Qubit(q));
        self.in_qubit.insert(q, input);
        self.out_qubit.insert(q, output);
        NodeId(input)
    }

    /// Adds a `ClassicOutput` sentinel for `c` directly, the classical-wire
    /// counterpart of [`Self::add_scratch_qubit`].
    pub fn add_scratch_clbit(&mut self, c: Clbit) -> NodeId {
        let node = self.graph.add_node(GateKind::ClassicOutput(c));
        self.out_classic.insert(c, node);
        NodeId(node)
    }

    fn require_qubit_registered(&self, q: Qubit) -> Result<(), GraphError> {
        if self.out_qubit.contains_key(&q) {
            Ok(())
        } else {
            Err(GraphError::UnknownQuantumRegisterId(q.reg.0))
        }
    }

    /// Splices `gate` onto the tail of every qubit wire it touches, just
    /// before that qubit's `Output` sentinel.
    pub fn append(&mut self, gate: GateKind) -> Result<NodeId, GraphError> {
        for q in gate.qubits() {
            self.require_qubit_registered(q)?;
            let out = self.out_qubit[&q];
            if self.graph.edges_directed(out, Direction::Incoming).count() == 0 {
                return Err(GraphError::AlreadyMeasured(q));
            }
        }
        let node = self.graph.add_node(gate.clone());
        for q in gate.qubits() {
            let out = self.out_qubit[&q];
            let incoming: Vec<_> = self
                .graph
                .edges_directed(out, Direction::Incoming)
                .map(|e| e.source())
                .collect();
            for pred in incoming {
                self.graph.remove_edge(self.graph.find_edge(pred, out).unwrap());
                self.graph.add_edge(pred, node, Wire::Qubit(q));
            }
            self.graph.add_edge(node, out, Wire::Qubit(q));
        }
        Ok(NodeId(node))
    }

    /// Splices a measurement in: consumes the qubit wire (its `Output` is
    /// left with in-degree 0) and writes the classical wire.
    pub fn measure(&mut self, q: Qubit, c: Clbit) -> Result<NodeId, GraphError> {
        self.require_qubit_registered(q)?;
        let c_out = *self
            .out_classic
            .get(&c)
            .ok_or(GraphError::UnknownClassicalRegisterId(c.reg.0))?;
        let q_out = self.out_qubit[&q];
        if self.graph.edges_directed(q_out, Direction::Incoming).count() == 0 {
            return Err(GraphError::AlreadyMeasured(q));
        }
        if self.graph.edges_directed(c_out, Direction::Incoming).count() != 0 {
            return Err(GraphError::ClbitAlreadyUsed(c));
        }
        let node = self.graph.add_node(GateKind::Measure(q, c));
        let incoming: Vec<_> = self
            .graph
            .edges_directed(q_out, Direction::Incoming)
            .map(|e| e.source())
            .collect();
        for pred in incoming {
            self.graph.remove_edge(self.graph.find_edge(pred, q_out).unwrap());
            self.graph.add_edge(pred, node, Wire::Qubit(q));
        }
        self.graph.add_edge(node, c_out, Wire::Clbit(c));
        Ok(NodeId(node))
    }

    pub fn gate(&self, node: NodeId) -> &GateKind {
        &self.graph[node.0]
    }

    pub fn gate_mut(&mut self, node: NodeId) -> &mut GateKind {
        &mut self.graph[node.0]
    }

    pub fn remove_node(&mut self, node: NodeId) {
        self.graph.remove_node(node.0);
    }

    pub fn predecessors(&self, node: NodeId) -> Vec<(NodeId, Wire)> {
        self.graph
            .edges_directed(node.0, Direction::Incoming)
            .map(|e| (NodeId(e.source()), *e.weight()))
            .collect()
    }

    pub fn successors(&self, node: NodeId) -> Vec<(NodeId, Wire)> {
        self.graph
            .edges_directed(node.0, Direction::Outgoing)
            .map(|e| (NodeId(e.target()), *e.weight()))
            .collect()
    }

    pub fn add_edge(&mut self, from: NodeId, to: NodeId, wire: Wire) {
        self.graph.add_edge(from.0, to.0, wire);
    }

    pub fn input_node(&self, q: Qubit) -> NodeId {
        NodeId(self.in_qubit[&q])
    }

    pub fn output_node(&self, q: Qubit) -> NodeId {
        NodeId(self.out_qubit[&q])
    }

    pub fn classic_output_node(&self, c: Clbit) -> NodeId {
        NodeId(self.out_classic[&c])
    }

    /// Replaces `node` with `sub`, a small scratch DAG whose sentinels only
    /// cover the wires `node` actually touches. Rewires each touched wire's
    /// predecessor/successor directly to the matching sentinel's neighbor in
    /// `sub`, then drops `node` and `sub`'s own sentinels.
    pub fn substitute(&mut self, node: NodeId, sub: WireDag) {
        let WireDag {
            graph: sub_graph,
            in_qubit: sub_in,
            out_qubit: sub_out,
            out_classic: sub_out_c,
            ..
        } = sub;

        let mut index_map: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        for idx in sub_graph.node_indices() {
            let new_idx = self.graph.add_node(sub_graph[idx].clone());
            index_map.insert(idx, new_idx);
        }
        for edge in sub_graph.edge_references_owned() {
            let (src, dst, w) = edge;
            self.graph.add_edge(index_map[&src], index_map[&dst], w);
        }

        let preds = self.predecessors(node);
        let succs = self.successors(node);

        for (pred, wire) in preds {
            if let Wire::Qubit(q) = wire {
                if let Some(&sub_in_idx) = sub_in.get(&q) {
                    let mapped_in = index_map[&sub_in_idx];
                    if let Some(first) = sub_graph
                        .neighbors_directed(sub_in_idx, Direction::Outgoing)
                        .next()
                    {
                        let mapped_first = index_map[&first];
                        self.graph.add_edge(pred.0, mapped_first, wire);
                    }
                    self.graph.remove_node(mapped_in);
                }
            }
        }
        for (succ, wire) in succs {
            match wire {
                Wire::Qubit(q) => {
                    if let Some(&sub_out_idx) = sub_out.get(&q) {
                        let mapped_out = index_map[&sub_out_idx];
                        if let Some(last) = sub_graph
                            .neighbors_directed(sub_out_idx, Direction::Incoming)
                            .next()
                        {
                            let mapped_last = index_map[&last];
                            self.graph.add_edge(mapped_last, succ.0, wire);
                        }
                        self.graph.remove_node(mapped_out);
                    }
                }
                Wire::Clbit(c) => {
                    if let Some(&sub_out_idx) = sub_out_c.get(&c) {
                        let mapped_out = index_map[&sub_out_idx];
                        if let Some(last) = sub_graph
                            .neighbors_directed(sub_out_idx, Direction::Incoming)
                            .next()
                        {
                            let mapped_last = index_map[&last];
                            self.graph.add_edge(mapped_last, succ.0, wire);
                        }
                        self.graph.remove_node(mapped_out);
                    }
                }
            }
        }
        self.graph.remove_node(node.0);
    }

    /// A linear extension of the DAG, sentinels excluded, ties broken by
    /// ascending node id.
    pub fn topological(&self) -> Vec<NodeId> {
        let mut in_degree: HashMap<NodeIndex, usize> = HashMap::new();
        for idx in self.graph.node_indices() {
            in_degree.insert(idx, self.graph.edges_directed(idx, Direction::Incoming).count());
        }
        let mut ready: Vec<NodeIndex> = in_degree
            .iter()
            .filter(|(_, &d)| d == 0)
            .map(|(&idx, _)| idx)
            .collect();
        ready.sort_by_key(|idx| idx.index());
        let mut queue: VecDeque<NodeIndex> = ready.into();
        let mut order = Vec::new();
        while let Some(idx) = queue.pop_front() {
            if !self.graph[idx].is_sentinel() {
                order.push(NodeId(idx));
            }
            let mut newly_ready = Vec::new();
            for succ in self.graph.neighbors_directed(idx, Direction::Outgoing) {
                let d = in_degree.get_mut(&succ).unwrap();
                *d -= 1;
                if *d == 0 {
                    newly_ready.push(succ);
                }
            }
            newly_ready.sort_by_key(|idx| idx.index());
            for n in newly_ready {
                // keep overall queue sorted-enough for deterministic ties by
                // always draining in ascending id among currently-ready nodes
                let pos = queue
                    .iter()
                    .position(|q| q.index() > n.index())
                    .unwrap_or(queue.len());
                queue.insert(pos, n);
            }
        }
        order
    }

    /// Maximal antichains in ascending order (Kahn layering), sentinels
    /// excluded, each layer ordered ascending by node id.
    pub fn layers(&self) -> Vec<Vec<NodeId>> {
        let mut predecessor_count: HashMap<NodeIndex, isize> = HashMap::new();
        let mut cur_layer: Vec<NodeIndex> = self.in_qubit.values().copied().collect();
        let mut layers = Vec::new();
        loop {
            let mut next_layer = Vec::new();
            for &node in &cur_layer {
                for succ in self.graph.neighbors_directed(node, Direction::Outgoing) {
                    let entry = predecessor_count.entry(succ).or_insert_with(|| {
                        self.graph.edges_directed(succ, Direction::Incoming).count() as isize
                    });
                    *entry -= 1;
                    if *entry == 0 {
                        next_layer.push(succ);
                    }
                }
            }
            if next_layer.is_empty() {
                break;
            }
            let mut op_nodes: Vec<NodeId> = next_layer
                .iter()
                .filter(|&&n| !self.graph[n].is_sentinel())
                .map(|&n| NodeId(n))
                .collect();
            op_nodes.sort_by_key(|n| n.0.index());
            if !op_nodes.is_empty() {
                layers.push(op_nodes);
            }
            cur_layer = next_layer;
        }
        layers
    }

    /// Longest path length in edges, minus one, clamped at zero.
    pub fn depth(&self) -> usize {
        let order: Vec<NodeIndex> = {
            let mut in_degree: HashMap<NodeIndex, usize> = HashMap::new();
            for idx in self.graph.node_indices() {
                in_degree.insert(idx, self.graph.edges_directed(idx, Direction::Incoming).count());
            }
            let mut ready: Vec<NodeIndex> = in_degree
                .iter()
                .filter(|(_, &d)| d == 0)
                .map(|(&idx, _)| idx)
                .collect();
            ready.sort_by_key(|idx| idx.index());
            let mut queue: VecDeque<NodeIndex> = ready.into();
            let mut out = Vec::new();
            while let Some(idx) = queue.pop_front() {
                out.push(idx);
                for succ in self.graph.neighbors_directed(idx, Direction::Outgoing) {
                    let d = in_degree.get_mut(&succ).unwrap();
                    *d -= 1;
                    if *d == 0 {
                        queue.push_back(succ);
                    }
                }
            }
            out
        };
        let mut longest: HashMap<NodeIndex, usize> = HashMap::new();
        let mut best = 0usize;
        for idx in order {
            let here = *longest.get(&idx).unwrap_or(&0);
            best = best.max(here);
            for succ in self.graph.neighbors_directed(idx, Direction::Outgoing) {
                let cand = here + 1;
                let e = longest.entry(succ).or_insert(0);
                if cand > *e {
                    *e = cand;
                }
            }
        }
        best.saturating_sub(1)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// A fresh, empty `WireDag` with the same registers as `self`: the
    /// common first step for a pass that rebuilds the DAG wholesale rather
    /// than mutating it in place.
    pub fn empty_like(&self) -> Self {
        let mut fresh = WireDag::new();
        for (name, dim) in self.q_register_specs() {
            fresh.add_q_register(&name, dim).expect("fresh dag has no registers yet");
        }
        for (name, dim) in self.c_register_specs() {
            fresh.add_c_register(&name, dim).expect("fresh dag has no registers yet");
        }
        fresh
    }
}

trait EdgeReferencesOwned {
    fn edge_references_owned(&self) -> Vec<(NodeIndex, NodeIndex, Wire)>;
}

impl EdgeReferencesOwned for StableDiGraph<GateKind, Wire> {
    fn edge_references_owned(&self) -> Vec<(NodeIndex, NodeIndex, Wire)> {
        use rustworkx_core::petgraph::visit::EdgeRef;
        self.edge_references()
            .map(|e| (e.source(), e.target(), *e.weight()))
            .collect()
    }
}
