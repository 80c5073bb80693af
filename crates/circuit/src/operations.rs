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

//! The closed gate-kind variant and the composite-gate AST.

use crate::error::GateError;
use crate::ids::{Clbit, Qubit};
use smallvec::SmallVec;
use std::sync::Arc;

/// Small inline buffer for the qubits a gate touches; most gates touch 1 or 2.
pub type QubitVec = SmallVec<[Qubit; 2]>;
pub type ParamVec = SmallVec<[f64; 3]>;

/// A single primitive gate event, or a sentinel, or an opaque/composite escape hatch.
///
/// This is a closed sum type rather than a trait-object hierarchy: the set of
/// primitives this compiler reasons about is fixed, and every pass matches on
/// it exhaustively.
#[derive(Clone, Debug, PartialEq)]
pub enum GateKind {
    Input(Qubit),
    Output(Qubit),
    ClassicOutput(Clbit),

    Id(Qubit),
    X(Qubit),
    Y(Qubit),
    Z(Qubit),
    H(Qubit),
    Rx(Qubit, f64),
    Ry(Qubit, f64),
    Rz(Qubit, f64),

    Cx(Qubit, Qubit),

    Measure(Qubit, Clbit),
    Barrier(QubitVec),

    /// An opaque gate from a format this crate does not itself decode.
    DummyGate {
        name: Arc<str>,
        qubits: QubitVec,
        params: ParamVec,
    },

    /// A bound call of a [`CompositeGateDef`]; expanded by the decomposition pass.
    Composite(CompositeCall),
}

impl GateKind {
    /// Every qubit this node reads or writes, in argument order.
    pub fn qubits(&self) -> QubitVec {
        match self {
            GateKind::Input(q) | GateKind::Output(q) => SmallVec::from_slice(&[*q]),
            GateKind::ClassicOutput(_) => SmallVec::new(),
            GateKind::Id(q)
            | GateKind::X(q)
            | GateKind::Y(q)
            | GateKind::Z(q)
            | GateKind::H(q)
            | GateKind::Rx(q, _)
            | GateKind::Ry(q, _)
            | GateKind::Rz(q, _) => SmallVec::from_slice(&[*q]),
            GateKind::Cx(c, t) => SmallVec::from_slice(&[*c, *t]),
            GateKind::Measure(q, _) => SmallVec::from_slice(&[*q]),
            GateKind::Barrier(qs) => qs.clone(),
            GateKind::DummyGate { qubits, .. } => qubits.clone(),
            GateKind::Composite(call) => call.qubits.clone(),
        }
    }

    pub fn clbit(&self) -> Option<Clbit> {
        match self {
            GateKind::ClassicOutput(c) => Some(*c),
            GateKind::Measure(_, c) => Some(*c),
            _ => None,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        matches!(
            self,
            GateKind::Input(_) | GateKind::Output(_) | GateKind::ClassicOutput(_)
        )
    }

    pub fn is_cx(&self) -> bool {
        matches!(self, GateKind::Cx(_, _))
    }

    pub fn is_barrier(&self) -> bool {
        matches!(self, GateKind::Barrier(_))
    }

    /// True for the reserved opaque-op names that must never be reordered
    /// across during pattern rewriting even though they aren't `Barrier`.
    pub fn is_reorder_fence(&self) -> bool {
        if self.is_barrier() {
            return true;
        }
        if let GateKind::DummyGate { name, .. } = self {
            matches!(&**name, "snapshot" | "save" | "load" | "noise")
        } else {
            false
        }
    }

    /// Recognizes a `u3(pi/2, 0, pi)` dummy gate as a Hadamard, per the
    /// resolved cancellation Open Question.
    pub fn is_hadamard_like(&self) -> bool {
        use std::f64::consts::PI;
        match self {
            GateKind::H(_) => true,
            GateKind::DummyGate { name, params, .. } if &**name == "u3" && params.len() == 3 => {
                approx::abs_diff_eq!(params[0], PI / 2.0, epsilon = 1e-9)
                    && approx::abs_diff_eq!(params[1], 0.0, epsilon = 1e-9)
                    && approx::abs_diff_eq!(params[2], PI, epsilon = 1e-9)
            }
            _ => false,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            GateKind::Input(_) => "input",
            GateKind::Output(_) => "output",
            GateKind::ClassicOutput(_) => "classic_output",
            GateKind::Id(_) => "id",
            GateKind::X(_) => "x",
            GateKind::Y(_) => "y",
            GateKind::Z(_) => "z",
            GateKind::H(_) => "h",
            GateKind::Rx(_, _) => "rx",
            GateKind::Ry(_, _) => "ry",
            GateKind::Rz(_, _) => "rz",
            GateKind::Cx(_, _) => "cx",
            GateKind::Measure(_, _) => "measure",
            GateKind::Barrier(_) => "barrier",
            GateKind::DummyGate { .. } => "dummy",
            GateKind::Composite(_) => "composite",
        }
    }
}

/// One step in a [`CompositeGateDef`] body: either a primitive applied to
/// symbolic argument names, or a nested composite call with its own mapping.
#[derive(Clone, Debug, PartialEq)]
pub enum CompositeStep {
    Primitive {
        gate: PrimitiveTemplate,
    },
    Nested {
        def: Arc<CompositeGateDef>,
        /// Maps the nested def's symbolic names to this def's symbolic names.
        q_arg_map: Vec<(String, String)>,
        c_arg_map: Vec<(String, String)>,
        param_map: Vec<(String, String)>,
    },
}

/// A primitive gate whose qubit/clbit/param slots are symbolic names, to be
/// resolved through a binding map when a composite call is decomposed.
#[derive(Clone, Debug, PartialEq)]
pub enum PrimitiveTemplate {
    Id(String),
    X(String),
    Y(String),
    Z(String),
    H(String),
    Rx(String, String),
    Ry(String, String),
    Rz(String, String),
    Cx(String, String),
    Measure(String, String),
    Barrier(Vec<String>),
}

/// A named, reusable composite-gate definition (not a DAG node itself).
#[derive(Clone, Debug, PartialEq)]
pub struct CompositeGateDef {
    pub name: Arc<str>,
    pub q_args: Vec<String>,
    pub c_args: Vec<String>,
    pub params: Vec<String>,
    pub body: Vec<CompositeStep>,
}

impl CompositeGateDef {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        CompositeGateDef {
            name: name.into(),
            q_args: Vec::new(),
            c_args: Vec::new(),
            params: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn validate(&self) -> Result<(), GateError> {
        for step in &self.body {
            if let CompositeStep::Primitive { gate } = step {
                self.validate_template(gate)?;
            }
        }
        Ok(())
    }

    fn validate_template(&self, gate: &PrimitiveTemplate) -> Result<(), GateError> {
        let check = |arg: &str| -> Result<(), GateError> {
            if self.q_args.iter().any(|a| a == arg) || self.c_args.iter().any(|a| a == arg) {
                Ok(())
            } else {
                Err(GateError::UnboundArgument {
                    name: self.name.to_string(),
                    arg: arg.to_string(),
                })
            }
        };
        match gate {
            PrimitiveTemplate::Id(a)
            | PrimitiveTemplate::X(a)
            | PrimitiveTemplate::Y(a)
            | PrimitiveTemplate::Z(a)
            | PrimitiveTemplate::H(a) => check(a),
            PrimitiveTemplate::Rx(a, _)
            | PrimitiveTemplate::Ry(a, _)
            | PrimitiveTemplate::Rz(a, _) => check(a),
            PrimitiveTemplate::Cx(a, b) => check(a).and(check(b)),
            PrimitiveTemplate::Measure(a, c) => check(a).and(check(c)),
            PrimitiveTemplate::Barrier(qs) => qs.iter().try_for_each(|q| check(q)),
        }
    }
}

/// A bound invocation of a [`CompositeGateDef`] sitting in the DAG.
#[derive(Clone, Debug, PartialEq)]
pub struct CompositeCall {
    pub def: Arc<CompositeGateDef>,
    pub qubits: QubitVec,
    pub clbits: SmallVec<[Clbit; 2]>,
    pub params: ParamVec,
}

impl CompositeCall {
    /// Binding from the def's symbolic names to concrete logical bits/params,
    /// in declaration order.
    pub fn q_binding(&self) -> Vec<(String, Qubit)> {
        self.def
            .q_args
            .iter()
            .cloned()
            .zip(self.qubits.iter().copied())
            .collect()
    }

    pub fn c_binding(&self) -> Vec<(String, Clbit)> {
        self.def
            .c_args
            .iter()
            .cloned()
            .zip(self.clbits.iter().copied())
            .collect()
    }

    pub fn param_binding(&self) -> Vec<(String, f64)> {
        self.def
            .params
            .iter()
            .cloned()
            .zip(self.params.iter().copied())
            .collect()
    }
}
