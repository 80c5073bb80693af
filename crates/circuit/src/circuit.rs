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

//! `QCircuit`: a wire DAG plus register tables and the pass-handoff property
//! bag.

use crate::dag::{NodeId, WireDag};
use crate::error::{CircuitError, GateError, GraphError};
use crate::ids::{Clbit, Physical, Qubit};
use crate::operations::{CompositeCall, CompositeGateDef, GateKind};
use std::sync::Arc;

/// The well-known side channel passes use to hand data to later passes.
///
/// The original design used a stringly-keyed property bag; this is its
/// typed replacement (one field per documented key) per the design notes.
#[derive(Clone, Debug, Default)]
pub struct Properties {
    /// Physical chain produced by the chain layout pass.
    pub layout: Option<Vec<Physical>>,
    /// Final logical-qubit -> physical-qubit mapping after routing.
    pub regs_to_physical: Option<Vec<(Qubit, Physical)>>,
    /// Offset into `layout` the router embedded logical wires at.
    pub offset: Option<usize>,
    /// Number of cascades committed by the pattern pass.
    pub patterns: usize,
}

pub struct QCircuit {
    pub dag: WireDag,
    pub properties: Properties,
}

impl Default for QCircuit {
    fn default() -> Self {
        Self::new()
    }
}

impl QCircuit {
    pub fn new() -> Self {
        QCircuit {
            dag: WireDag::new(),
            properties: Properties::default(),
        }
    }

    pub fn add_q_register(&mut self, name: &str, dim: u32) -> Result<Vec<Qubit>, GraphError> {
        self.dag.add_q_register(name, dim)
    }

    pub fn add_c_register(&mut self, name: &str, dim: u32) -> Result<Vec<Clbit>, GraphError> {
        self.dag.add_c_register(name, dim)
    }

    pub fn id(&mut self, q: Qubit) -> Result<NodeId, GraphError> {
        self.dag.append(GateKind::Id(q))
    }

    pub fn x(&mut self, q: Qubit) -> Result<NodeId, GraphError> {
        self.dag.append(GateKind::X(q))
    }

    pub fn y(&mut self, q: Qubit) -> Result<NodeId, GraphError> {
        self.dag.append(GateKind::Y(q))
    }

    pub fn z(&mut self, q: Qubit) -> Result<NodeId, GraphError> {
        self.dag.append(GateKind::Z(q))
    }

    pub fn h(&mut self, q: Qubit) -> Result<NodeId, GraphError> {
        self.dag.append(GateKind::H(q))
    }

    pub fn rx(&mut self, q: Qubit, theta: f64) -> Result<NodeId, GraphError> {
        self.dag.append(GateKind::Rx(q, theta))
    }

    pub fn ry(&mut self, q: Qubit, theta: f64) -> Result<NodeId, GraphError> {
        self.dag.append(GateKind::Ry(q, theta))
    }

    pub fn rz(&mut self, q: Qubit, theta: f64) -> Result<NodeId, GraphError> {
        self.dag.append(GateKind::Rz(q, theta))
    }

    pub fn cx(&mut self, control: Qubit, target: Qubit) -> Result<NodeId, GraphError> {
        self.dag.append(GateKind::Cx(control, target))
    }

    pub fn barrier(&mut self, qubits: &[Qubit]) -> Result<NodeId, GraphError> {
        let mut qs: crate::operations::QubitVec = qubits.iter().copied().collect();
        qs.sort();
        self.dag.append(GateKind::Barrier(qs))
    }

    pub fn measure(&mut self, q: Qubit, c: Clbit) -> Result<NodeId, GraphError> {
        self.dag.measure(q, c)
    }

    pub fn dummy_gate(
        &mut self,
        name: impl Into<Arc<str>>,
        qubits: &[Qubit],
        params: &[f64],
    ) -> Result<NodeId, GraphError> {
        self.dag.append(GateKind::DummyGate {
            name: name.into(),
            qubits: qubits.iter().copied().collect(),
            params: params.iter().copied().collect(),
        })
    }

    pub fn composite_gate(
        &mut self,
        def: Arc<CompositeGateDef>,
        qubits: &[Qubit],
        clbits: &[Clbit],
        params: &[f64],
    ) -> Result<NodeId, CircuitError> {
        if qubits.len() != def.q_args.len() {
            return Err(GateError::WrongQubitArity {
                name: "composite",
                expected: def.q_args.len(),
                got: qubits.len(),
            }
            .into());
        }
        if clbits.len() != def.c_args.len() {
            return Err(GateError::WrongQubitArity {
                name: "composite",
                expected: def.c_args.len(),
                got: clbits.len(),
            }
            .into());
        }
        if params.len() != def.params.len() {
            return Err(GateError::WrongParamArity {
                name: "composite",
                expected: def.params.len(),
                got: params.len(),
            }
            .into());
        }
        let call = CompositeCall {
            def,
            qubits: qubits.iter().copied().collect(),
            clbits: clbits.iter().copied().collect(),
            params: params.iter().copied().collect(),
        };
        self.dag.append(GateKind::Composite(call)).map_err(Into::into)
    }

    pub fn depth(&self) -> usize {
        self.dag.depth()
    }
}
