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

//! The circuit intermediate representation: the wire DAG, its gate-kind
//! vocabulary, identifier newtypes, the coupling-map model, and the small
//! dense-matrix simulator used by tests to check unitary equivalence.
//!
//! Everything here is pass-agnostic; the passes that rewrite and route
//! circuits built on top of this crate live in `chain_router_router`.

pub mod circuit;
pub mod coupling;
pub mod dag;
pub mod error;
pub mod ids;
pub mod logger;
pub mod operations;
pub mod simulate;

pub use circuit::{Properties, QCircuit};
pub use coupling::CouplingMap;
pub use dag::{NodeId, WireDag};
pub use error::{CircuitError, ConverterError, GateError, GraphError, StepError};
pub use ids::{Clbit, Physical, Qubit, RegisterId, Wire};
pub use logger::{Level, Logger, NullLogger, TracingLogger};
pub use operations::{
    CompositeCall, CompositeGateDef, CompositeStep, GateKind, ParamVec, PrimitiveTemplate,
    QubitVec,
};
