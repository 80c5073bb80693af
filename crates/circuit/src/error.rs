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

//! Error taxonomy, one variant family per failure domain.

use crate::ids::{Clbit, Physical, Qubit};
use thiserror::Error;

/// Malformed gate arguments or an invalid composite-gate definition.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GateError {
    #[error("gate {name} expects {expected} qubit argument(s), got {got}")]
    WrongQubitArity {
        name: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("gate {name} expects {expected} parameter(s), got {got}")]
    WrongParamArity {
        name: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("composite gate definition {name:?} references unknown argument name {arg:?}")]
    UnboundArgument { name: String, arg: String },
    #[error("composite gate definition {name:?} is recursive through itself")]
    RecursiveDefinition { name: String },
}

/// Failures raised while mutating the wire DAG.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GraphError {
    #[error("quantum register {0:?} already exists")]
    QuantumRegisterExists(String),
    #[error("classical register {0:?} already exists")]
    ClassicalRegisterExists(String),
    #[error("quantum register with id {0} not found")]
    UnknownQuantumRegisterId(u32),
    #[error("classical register with id {0} not found")]
    UnknownClassicalRegisterId(u32),
    #[error("qubit {0} already measured")]
    AlreadyMeasured(Qubit),
    #[error("classical bit {0} already written")]
    ClbitAlreadyUsed(Clbit),
}

/// Failures raised by chain layout or the deterministic router.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StepError {
    #[error("coupling map is empty")]
    EmptyCouplingMap,
    #[error("requested chain of {requested} qubits but the coupling graph has only {available}")]
    NotEnoughPhysicalQubits { requested: usize, available: usize },
    #[error("ChainLayout pass must run first in the pipeline")]
    ChainLayoutNotFirst,
    #[error("router would emit CX({control}, {target}) on non-adjacent physical qubits")]
    NonAdjacentCx {
        control: Physical,
        target: Physical,
    },
    #[error("no path could be found to bring {0} and {1} together")]
    NoSwapPath(Physical, Physical),
    #[error("offset {offset} is out of range for a chain of length {chain_len}")]
    OffsetOutOfRange { offset: usize, chain_len: usize },
}

/// Wraps the two error domains the `QCircuit` construction API can surface
/// in a single call (e.g. a composite-gate invocation validates arity
/// before ever touching the DAG).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CircuitError {
    #[error(transparent)]
    Gate(#[from] GateError),
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Reserved for an external textual-format converter; not raised by this crate.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConverterError {
    #[error("quantum register {0:?} missing at emission time")]
    MissingRegister(String),
    #[error("malformed gate line: {0:?}")]
    MalformedLine(String),
}
