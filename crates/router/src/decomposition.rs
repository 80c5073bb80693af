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

//! Expands every `CompositeGate` node still in the DAG into primitives, per
//! §4.G. This is the step the deterministic SWAP router's setup runs
//! before anything else touches the DAG, since cancellation, pattern
//! matching and routing only ever reason about the primitive gate set.

use crate::pipeline::CompilePass;
use chain_router_circuit::dag::WireDag;
use chain_router_circuit::error::StepError;
use chain_router_circuit::ids::{Clbit, Qubit};
use chain_router_circuit::logger::Logger;
use chain_router_circuit::operations::{
    CompositeCall, CompositeStep, GateKind, PrimitiveTemplate, QubitVec,
};
use chain_router_circuit::QCircuit;
use hashbrown::HashMap;

struct Binding {
    qubits: HashMap<String, Qubit>,
    clbits: HashMap<String, Clbit>,
    params: HashMap<String, f64>,
}

impl Binding {
    fn from_call(call: &CompositeCall) -> Self {
        Binding {
            qubits: call.q_binding().into_iter().collect(),
            clbits: call.c_binding().into_iter().collect(),
            params: call.param_binding().into_iter().collect(),
        }
    }

    fn q(&self, name: &str) -> Qubit {
        *self
            .qubits
            .get(name)
            .unwrap_or_else(|| panic!("composite argument {name:?} was validated but not bound"))
    }

    fn c(&self, name: &str) -> Clbit {
        *self
            .clbits
            .get(name)
            .unwrap_or_else(|| panic!("composite argument {name:?} was validated but not bound"))
    }

    fn p(&self, name: &str) -> f64 {
        *self
            .params
            .get(name)
            .unwrap_or_else(|| panic!("composite parameter {name:?} was validated but not bound"))
    }

    /// Builds the nested call's own binding by resolving its argument-name
    /// mapping through this binding.
    fn nested(
        &self,
        q_arg_map: &[(String, String)],
        c_arg_map: &[(String, String)],
        param_map: &[(String, String)],
    ) -> Binding {
        Binding {
            qubits: q_arg_map
                .iter()
                .map(|(inner, outer)| (inner.clone(), self.q(outer)))
                .collect(),
            clbits: c_arg_map
                .iter()
                .map(|(inner, outer)| (inner.clone(), self.c(outer)))
                .collect(),
            params: param_map
                .iter()
                .map(|(inner, outer)| (inner.clone(), self.p(outer)))
                .collect(),
        }
    }
}

fn resolve_primitive(template: &PrimitiveTemplate, binding: &Binding) -> GateKind {
    match template {
        PrimitiveTemplate::Id(a) => GateKind::Id(binding.q(a)),
        PrimitiveTemplate::X(a) => GateKind::X(binding.q(a)),
        PrimitiveTemplate::Y(a) => GateKind::Y(binding.q(a)),
        PrimitiveTemplate::Z(a) => GateKind::Z(binding.q(a)),
        PrimitiveTemplate::H(a) => GateKind::H(binding.q(a)),
        PrimitiveTemplate::Rx(a, p) => GateKind::Rx(binding.q(a), binding.p(p)),
        PrimitiveTemplate::Ry(a, p) => GateKind::Ry(binding.q(a), binding.p(p)),
        PrimitiveTemplate::Rz(a, p) => GateKind::Rz(binding.q(a), binding.p(p)),
        PrimitiveTemplate::Cx(a, b) => GateKind::Cx(binding.q(a), binding.q(b)),
        PrimitiveTemplate::Measure(a, c) => GateKind::Measure(binding.q(a), binding.c(c)),
        PrimitiveTemplate::Barrier(qs) => {
            let mut bound: QubitVec = qs.iter().map(|a| binding.q(a)).collect();
            bound.sort();
            GateKind::Barrier(bound)
        }
    }
}

/// Recursively appends the resolved body of a composite call into `scratch`.
fn expand_into(scratch: &mut WireDag, call: &CompositeCall, binding: &Binding) {
    for step in &call.def.body {
        match step {
            CompositeStep::Primitive { gate } => {
                let resolved = resolve_primitive(gate, binding);
                if let GateKind::Measure(q, c) = resolved {
                    scratch
                        .measure(q, c)
                        .expect("composite body was validated before this call was built");
                } else {
                    scratch
                        .append(resolved)
                        .expect("composite body was validated before this call was built");
                }
            }
            CompositeStep::Nested {
                def,
                q_arg_map,
                c_arg_map,
                param_map,
            } => {
                let nested_binding = binding.nested(q_arg_map, c_arg_map, param_map);
                let nested_call = CompositeCall {
                    def: def.clone(),
                    qubits: def.q_args.iter().map(|a| nested_binding.q(a)).collect(),
                    clbits: def.c_args.iter().map(|a| nested_binding.c(a)).collect(),
                    params: def.params.iter().map(|a| nested_binding.p(a)).collect(),
                };
                expand_into(scratch, &nested_call, &nested_binding);
            }
        }
    }
}

/// Expands one `CompositeGate` node into a scratch DAG with sentinels only
/// for the wires the call actually touches, ready for `WireDag::substitute`.
/// The scratch dag's qubits and clbits are the caller's own logical ids
/// (via `add_scratch_qubit`/`add_scratch_clbit`), not freshly minted ones,
/// since `substitute` matches wires by that identity.
fn build_scratch(call: &CompositeCall) -> WireDag {
    let mut scratch = WireDag::new();
    let mut qubits: Vec<Qubit> = call.qubits.iter().copied().collect();
    qubits.sort();
    qubits.dedup();
    let mut clbits: Vec<Clbit> = call.clbits.iter().copied().collect();
    clbits.sort();
    clbits.dedup();

    for q in qubits {
        scratch.add_scratch_qubit(q);
    }
    for c in clbits {
        scratch.add_scratch_clbit(c);
    }

    let binding = Binding::from_call(call);
    expand_into(&mut scratch, call, &binding);
    scratch
}

/// The `Compile`-taxonomy pass that expands every `CompositeGate` node.
#[derive(Clone, Copy, Debug, Default)]
pub struct DecompositionPass;

impl CompilePass for DecompositionPass {
    fn run(&self, circuit: &mut QCircuit, logger: &dyn Logger) -> Result<(), StepError> {
        let mut expanded = 0usize;
        loop {
            let composite_node = circuit
                .dag
                .topological()
                .into_iter()
                .find(|&n| matches!(circuit.dag.gate(n), GateKind::Composite(_)));
            let Some(node) = composite_node else {
                break;
            };
            let call = match circuit.dag.gate(node) {
                GateKind::Composite(call) => call.clone(),
                _ => unreachable!(),
            };
            let scratch = build_scratch(&call);
            circuit.dag.substitute(node, scratch);
            expanded += 1;
        }
        if expanded > 0 {
            logger.debug("decomposition pass expanded composite gate calls");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_router_circuit::logger::NullLogger;
    use chain_router_circuit::operations::CompositeGateDef;
    use chain_router_circuit::simulate;
    use chain_router_circuit::QCircuit;
    use std::sync::Arc;

    fn bell_def() -> Arc<CompositeGateDef> {
        let mut def = CompositeGateDef::new("bell");
        def.q_args = vec!["a".to_string(), "b".to_string()];
        def.body = vec![
            CompositeStep::Primitive {
                gate: PrimitiveTemplate::H("a".to_string()),
            },
            CompositeStep::Primitive {
                gate: PrimitiveTemplate::Cx("a".to_string(), "b".to_string()),
            },
        ];
        def.validate().unwrap();
        Arc::new(def)
    }

    #[test]
    fn composite_call_expands_to_its_body_in_order() {
        let mut circuit = QCircuit::new();
        let qs = circuit.add_q_register("q", 2).unwrap();
        let def = bell_def();
        circuit
            .composite_gate(def, &[qs[0], qs[1]], &[], &[])
            .unwrap();

        DecompositionPass.run(&mut circuit, &NullLogger).unwrap();

        let kinds: Vec<&'static str> = circuit
            .dag
            .topological()
            .iter()
            .map(|&n| circuit.dag.gate(n).name())
            .collect();
        assert_eq!(kinds, vec!["h", "cx"]);

        let u = simulate::unitary(&circuit.dag, &qs).unwrap();
        assert_eq!(u.dim(), (4, 4));
    }

    #[test]
    fn no_composite_nodes_is_a_no_op() {
        let mut circuit = QCircuit::new();
        let qs = circuit.add_q_register("q", 1).unwrap();
        circuit.h(qs[0]).unwrap();
        DecompositionPass.run(&mut circuit, &NullLogger).unwrap();
        assert_eq!(circuit.dag.depth(), 1);
    }

    #[test]
    fn nested_composite_call_expands_recursively() {
        let inner = bell_def();
        let mut outer_def = CompositeGateDef::new("bell_twice");
        outer_def.q_args = vec!["x".to_string(), "y".to_string()];
        outer_def.body = vec![
            CompositeStep::Nested {
                def: inner.clone(),
                q_arg_map: vec![
                    ("a".to_string(), "x".to_string()),
                    ("b".to_string(), "y".to_string()),
                ],
                c_arg_map: vec![],
                param_map: vec![],
            },
            CompositeStep::Nested {
                def: inner,
                q_arg_map: vec![
                    ("a".to_string(), "x".to_string()),
                    ("b".to_string(), "y".to_string()),
                ],
                c_arg_map: vec![],
                param_map: vec![],
            },
        ];
        outer_def.validate().unwrap();

        let mut circuit = QCircuit::new();
        let qs = circuit.add_q_register("q", 2).unwrap();
        circuit
            .composite_gate(Arc::new(outer_def), &[qs[0], qs[1]], &[], &[])
            .unwrap();
        DecompositionPass.run(&mut circuit, &NullLogger).unwrap();

        let cx_count = circuit
            .dag
            .topological()
            .iter()
            .filter(|&&n| circuit.dag.gate(n).is_cx())
            .count();
        assert_eq!(cx_count, 2);
    }
}
