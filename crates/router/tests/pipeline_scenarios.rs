//! End-to-end exercises of the concrete scenarios against the full pass
//! pipeline, not just each pass in isolation.

use chain_router_circuit::operations::GateKind;
use chain_router_circuit::{simulate, CouplingMap, Physical, QCircuit};
use chain_router_router::{
    run_pipeline_silent, CancelCx, CancelH, ChainLayout, MergeBarrier, Pass, PatternPass,
    PipelineConfig, Router,
};

fn linear_coupling(n: u32) -> CouplingMap {
    let edges: Vec<(u32, u32)> = (0..n - 1).flat_map(|i| [(i, i + 1), (i + 1, i)]).collect();
    CouplingMap::from_edges(&edges).unwrap()
}

#[test]
fn empty_circuit_on_symmetric_linear_map_gets_a_three_qubit_chain() {
    let coupling = CouplingMap::from_edges(&[(0, 1), (1, 2), (1, 0), (2, 1)]).unwrap();
    let mut circuit = QCircuit::new();
    circuit.add_q_register("q", 3).unwrap();

    let passes = vec![Pass::Analysis(Box::new(
        ChainLayout::new(coupling).with_n_qubits(3),
    ))];
    run_pipeline_silent(&mut circuit, passes, &PipelineConfig::default()).unwrap();

    assert_eq!(
        circuit.properties.layout,
        Some(vec![Physical(0), Physical(1), Physical(2)])
    );
}

#[test]
fn cycle_map_chain_starts_at_zero() {
    let coupling =
        CouplingMap::from_edges(&[(0, 1), (1, 0), (1, 2), (2, 1), (2, 0), (0, 2)]).unwrap();
    let mut circuit = QCircuit::new();
    circuit.add_q_register("q", 3).unwrap();

    let passes = vec![Pass::Analysis(Box::new(
        ChainLayout::new(coupling).with_n_qubits(3),
    ))];
    run_pipeline_silent(&mut circuit, passes, &PipelineConfig::default()).unwrap();

    let chain = circuit.properties.layout.unwrap();
    assert_eq!(chain.len(), 3);
    assert_eq!(chain[0], Physical(0));
}

#[test]
fn double_cx_cancels_to_an_empty_circuit() {
    let mut circuit = QCircuit::new();
    let qs = circuit.add_q_register("q", 2).unwrap();
    circuit.cx(qs[0], qs[1]).unwrap();
    circuit.cx(qs[0], qs[1]).unwrap();

    let passes = vec![Pass::Cancellation(Box::new(CancelCx))];
    run_pipeline_silent(&mut circuit, passes, &PipelineConfig::default()).unwrap();

    assert_eq!(circuit.depth(), 0);
    let topo = circuit.dag.topological();
    assert!(topo.is_empty());
}

#[test]
fn double_h_reduces_to_empty() {
    let mut circuit = QCircuit::new();
    let qs = circuit.add_q_register("q", 1).unwrap();
    circuit.h(qs[0]).unwrap();
    circuit.h(qs[0]).unwrap();

    let passes = vec![Pass::Cancellation(Box::new(CancelH))];
    run_pipeline_silent(&mut circuit, passes, &PipelineConfig::default()).unwrap();
    assert_eq!(circuit.depth(), 0);
}

#[test]
fn ascending_cnot_cascade_becomes_a_five_gate_adjacent_ladder_with_equal_unitary() {
    let mut circuit = QCircuit::new();
    let qs = circuit.add_q_register("q", 4).unwrap();
    circuit.cx(qs[0], qs[3]).unwrap();
    circuit.cx(qs[1], qs[3]).unwrap();
    circuit.cx(qs[2], qs[3]).unwrap();

    let mut original = circuit.dag.empty_like();
    for node in circuit.dag.topological() {
        original.append(circuit.dag.gate(node).clone()).unwrap();
    }

    let passes = vec![Pass::Transformation(Box::new(PatternPass))];
    let config = PipelineConfig {
        iterate: false,
        explicit: true,
    };
    run_pipeline_silent(&mut circuit, passes, &config).unwrap();

    let cx_count = circuit
        .dag
        .topological()
        .iter()
        .filter(|&&n| circuit.dag.gate(n).is_cx())
        .count();
    assert_eq!(cx_count, 5);

    for node in circuit.dag.topological() {
        if let GateKind::Cx(c, t) = circuit.dag.gate(node) {
            assert_eq!((c.index as i64 - t.index as i64).abs(), 1);
        }
    }

    let u_before = simulate::unitary(&original, &qs).unwrap();
    let u_after = simulate::unitary(&circuit.dag, &qs).unwrap();
    assert!(simulate::approx_eq_global_phase(&u_before, &u_after, 1e-9));
}

#[test]
fn remote_cx_on_five_qubit_line_routes_through_three_swap_triples() {
    let coupling = linear_coupling(5);
    let mut circuit = QCircuit::new();
    let qs = circuit.add_q_register("q", 5).unwrap();
    circuit.cx(qs[0], qs[4]).unwrap();

    let passes = vec![Pass::Compile(Box::new(
        Router::new(coupling.clone()).with_offset(0),
    ))];
    let config = PipelineConfig {
        iterate: false,
        explicit: true,
    };
    run_pipeline_silent(&mut circuit, passes, &config).unwrap();

    let cx_count = circuit
        .dag
        .topological()
        .iter()
        .filter(|&&n| circuit.dag.gate(n).is_cx())
        .count();
    assert_eq!(cx_count, 10);

    for node in circuit.dag.topological() {
        if let GateKind::Cx(c, t) = circuit.dag.gate(node) {
            let (pc, pt) = (Physical(c.index as u32), Physical(t.index as u32));
            assert!(coupling.are_adjacent(pc, pt));
        }
    }

    let (_, final_phys) = circuit
        .properties
        .regs_to_physical
        .unwrap()
        .into_iter()
        .find(|(q, _)| *q == qs[4])
        .unwrap();
    assert_eq!(final_phys, Physical(1));
}

#[test]
fn full_default_pipeline_leaves_only_adjacent_cx_gates() {
    let coupling = linear_coupling(4);
    let mut circuit = QCircuit::new();
    let qs = circuit.add_q_register("q", 4).unwrap();
    circuit.cx(qs[0], qs[3]).unwrap();
    circuit.cx(qs[1], qs[3]).unwrap();
    circuit.cx(qs[2], qs[3]).unwrap();

    let passes = vec![
        Pass::Analysis(Box::new(ChainLayout::new(coupling.clone()))),
        Pass::Transformation(Box::new(PatternPass)),
        Pass::Compile(Box::new(Router::new(coupling.clone()))),
        Pass::Cancellation(Box::new(CancelCx)),
        Pass::Cancellation(Box::new(MergeBarrier)),
    ];
    run_pipeline_silent(&mut circuit, passes, &PipelineConfig::default()).unwrap();

    for node in circuit.dag.topological() {
        if let GateKind::Cx(c, t) = circuit.dag.gate(node) {
            let (pc, pt) = (Physical(c.index as u32), Physical(t.index as u32));
            assert!(
                coupling.are_adjacent(pc, pt),
                "routed circuit must only have adjacent CX gates"
            );
        }
    }
}
