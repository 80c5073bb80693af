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

//! The pass taxonomy and the deterministic compile driver.
//!
//! The driver is a flat loop, not a scheduler: passes run in the order it
//! hands them out, and the only feedback edge is cancellation passes
//! looping to a fixed point when `PipelineConfig::iterate` is set.

use chain_router_circuit::error::StepError;
use chain_router_circuit::logger::{Logger, NullLogger};
use chain_router_circuit::QCircuit;

/// Reads and/or writes `circuit.properties`; never rewrites the DAG.
pub trait AnalysisPass {
    fn run(&self, circuit: &mut QCircuit, logger: &dyn Logger) -> Result<(), StepError>;

    /// Marks the `ChainLayout` pass specifically, which the driver pins to
    /// the front of the pipeline regardless of how the caller ordered it.
    fn is_chain_layout(&self) -> bool {
        false
    }
}

/// Rewrites the DAG unconditionally; no return value to react to.
pub trait TransformationPass {
    fn run(&self, circuit: &mut QCircuit, logger: &dyn Logger) -> Result<(), StepError>;
}

/// Rewrites the DAG, consulting `circuit.properties` for inputs a prior
/// analysis pass produced (e.g. the chain layout).
pub trait CompilePass {
    fn run(&self, circuit: &mut QCircuit, logger: &dyn Logger) -> Result<(), StepError>;
}

/// Rewrites the DAG and reports whether it changed anything, so the driver
/// can decide whether another sweep is worth running.
pub trait CancellationPass {
    fn run(&self, circuit: &mut QCircuit, logger: &dyn Logger) -> Result<bool, StepError>;

    /// Marks the barrier-merge pass specifically: the driver appends one of
    /// these to the cancellation group when the caller's pass list has none
    /// and `explicit` was not requested.
    fn is_merge_barrier(&self) -> bool {
        false
    }
}

/// One entry in a pipeline: a boxed pass tagged by its taxonomy slot.
pub enum Pass {
    Analysis(Box<dyn AnalysisPass>),
    Transformation(Box<dyn TransformationPass>),
    Compile(Box<dyn CompilePass>),
    Cancellation(Box<dyn CancellationPass>),
}

impl Pass {
    fn rank(&self) -> u8 {
        match self {
            Pass::Analysis(_) => 0,
            Pass::Transformation(_) => 1,
            Pass::Compile(_) => 2,
            Pass::Cancellation(_) => 3,
        }
    }

    fn is_chain_layout(&self) -> bool {
        matches!(self, Pass::Analysis(p) if p.is_chain_layout())
    }

    fn is_merge_barrier(&self) -> bool {
        matches!(self, Pass::Cancellation(p) if p.is_merge_barrier())
    }
}

/// `iterate` loops the cancellation group to a fixed point after the main
/// sweep; `explicit` takes the caller's pass list verbatim instead of
/// reordering it into `[analysis…, transformation…, compile…,
/// cancellation…]` and appending a default barrier-merge.
#[derive(Clone, Copy, Debug)]
pub struct PipelineConfig {
    pub iterate: bool,
    pub explicit: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            iterate: true,
            explicit: false,
        }
    }
}

/// Runs `passes` over `circuit` per `config`, reporting through `logger`.
pub fn run_pipeline(
    circuit: &mut QCircuit,
    passes: Vec<Pass>,
    config: &PipelineConfig,
    logger: &dyn Logger,
) -> Result<(), StepError> {
    let ordered = if config.explicit {
        passes
    } else {
        default_order(passes)
    };
    validate_chain_layout_position(&ordered)?;

    for pass in &ordered {
        match pass {
            Pass::Analysis(p) => {
                logger.trace("running analysis pass");
                p.run(circuit, logger)?;
            }
            Pass::Transformation(p) => {
                logger.trace("running transformation pass");
                p.run(circuit, logger)?;
            }
            Pass::Compile(p) => {
                logger.trace("running compile pass");
                p.run(circuit, logger)?;
            }
            Pass::Cancellation(p) => {
                let changed = p.run(circuit, logger)?;
                logger.trace(if changed {
                    "cancellation pass changed the circuit"
                } else {
                    "cancellation pass made no change"
                });
            }
        }
    }

    if config.iterate {
        loop {
            let mut changed_this_sweep = false;
            for pass in &ordered {
                if let Pass::Cancellation(p) = pass {
                    if p.run(circuit, logger)? {
                        changed_this_sweep = true;
                    }
                }
            }
            if !changed_this_sweep {
                break;
            }
        }
    }
    Ok(())
}

/// Convenience overload for callers that don't want to construct a
/// `Logger`.
pub fn run_pipeline_silent(
    circuit: &mut QCircuit,
    passes: Vec<Pass>,
    config: &PipelineConfig,
) -> Result<(), StepError> {
    run_pipeline(circuit, passes, config, &NullLogger)
}

fn default_order(passes: Vec<Pass>) -> Vec<Pass> {
    let mut ordered = passes;
    ordered.sort_by_key(|p| p.rank());
    if !ordered.iter().any(Pass::is_merge_barrier) {
        ordered.push(Pass::Cancellation(Box::new(
            crate::cancellation::MergeBarrier,
        )));
    }
    ordered
}

fn validate_chain_layout_position(passes: &[Pass]) -> Result<(), StepError> {
    for (i, pass) in passes.iter().enumerate() {
        if pass.is_chain_layout() && i != 0 {
            return Err(StepError::ChainLayoutNotFirst);
        }
    }
    Ok(())
}
