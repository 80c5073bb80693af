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

//! The compile pipeline: pass taxonomy and driver, chain layout, cancellation,
//! CNOT-cascade rewriting, composite-gate decomposition, and the deterministic
//! SWAP router, built on top of `chain_router_circuit`'s wire DAG.

pub mod cancellation;
pub mod chain;
pub mod decomposition;
pub mod pattern;
pub mod pipeline;
pub mod swap;

pub use cancellation::{cancel_cx, cancel_h, merge_barrier, CancelCx, CancelH, MergeBarrier};
pub use chain::{compute_chain, ChainLayout};
pub use decomposition::DecompositionPass;
pub use pattern::{run_pattern_pass, PatternPass};
pub use pipeline::{
    run_pipeline, run_pipeline_silent, AnalysisPass, CancellationPass, CompilePass, Pass,
    PipelineConfig, TransformationPass,
};
pub use swap::{Router, RouterConfig};
