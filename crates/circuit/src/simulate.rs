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

//! A small dense-matrix simulator used only by tests to check unitary
//! equivalence at a handful of qubits. Never called from any pass; the
//! compiler's hot path never builds a `2^n x 2^n` matrix.

use crate::dag::WireDag;
use crate::ids::Qubit;
use crate::operations::GateKind;
use hashbrown::HashMap;
use ndarray::Array2;
use num_complex::Complex64;
use std::f64::consts::FRAC_1_SQRT_2;

pub type Unitary = Array2<Complex64>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimulateError {
    #[error("gate {0:?} has no fixed unitary and cannot be simulated")]
    UnsupportedGate(String),
}

fn c(re: f64, im: f64) -> Complex64 {
    Complex64::new(re, im)
}

fn one() -> Complex64 {
    c(1.0, 0.0)
}
fn zero() -> Complex64 {
    c(0.0, 0.0)
}

fn pauli_x() -> [[Complex64; 2]; 2] {
    [[zero(), one()], [one(), zero()]]
}

fn pauli_y() -> [[Complex64; 2]; 2] {
    [[zero(), c(0.0, -1.0)], [c(0.0, 1.0), zero()]]
}

fn pauli_z() -> [[Complex64; 2]; 2] {
    [[one(), zero()], [zero(), -one()]]
}

fn hadamard() -> [[Complex64; 2]; 2] {
    let h = c(FRAC_1_SQRT_2, 0.0);
    [[h, h], [h, -h]]
}

fn rx(theta: f64) -> [[Complex64; 2]; 2] {
    let (cos, sin) = ((theta / 2.0).cos(), (theta / 2.0).sin());
    [[c(cos, 0.0), c(0.0, -sin)], [c(0.0, -sin), c(cos, 0.0)]]
}

fn ry(theta: f64) -> [[Complex64; 2]; 2] {
    let (cos, sin) = ((theta / 2.0).cos(), (theta / 2.0).sin());
    [[c(cos, 0.0), c(-sin, 0.0)], [c(sin, 0.0), c(cos, 0.0)]]
}

fn rz(theta: f64) -> [[Complex64; 2]; 2] {
    [
        [c(0.0, -theta / 2.0).exp(), zero()],
        [zero(), c(0.0, theta / 2.0).exp()],
    ]
}

/// Left-multiplies `state` by a single-qubit gate acting on bit `bit` of a
/// `dim`-wide (2^n) basis, i.e. `state := (I ⊗ gate ⊗ I) * state` without
/// ever materializing the full kron product.
fn apply_1q(state: &mut Unitary, gate: &[[Complex64; 2]; 2], bit: usize, dim: usize) {
    let mask = 1usize << bit;
    for j in 0..dim {
        for r in 0..dim {
            if r & mask != 0 {
                continue;
            }
            let r2 = r | mask;
            let v0 = state[[r, j]];
            let v1 = state[[r2, j]];
            state[[r, j]] = gate[0][0] * v0 + gate[0][1] * v1;
            state[[r2, j]] = gate[1][0] * v0 + gate[1][1] * v1;
        }
    }
}

/// Left-multiplies by a CX with control bit `ctrl` and target bit `tgt`.
fn apply_cx(state: &mut Unitary, ctrl: usize, tgt: usize, dim: usize) {
    let cmask = 1usize << ctrl;
    let tmask = 1usize << tgt;
    for j in 0..dim {
        for r in 0..dim {
            if r & cmask == 0 || r & tmask != 0 {
                continue;
            }
            let r2 = r | tmask;
            let tmp = state[[r, j]];
            state[[r, j]] = state[[r2, j]];
            state[[r2, j]] = tmp;
        }
    }
}

/// The unitary of every non-sentinel, non-measurement gate in `dag`,
/// restricted to `qubits`, in the basis where `qubits[0]` is bit 0 (the
/// least significant bit) of the `2^n`-dimensional state space.
///
/// Barriers are transparent (they carry no unitary effect). Any gate this
/// simulator has no fixed matrix for (`Measure`, `DummyGate`, a still-bound
/// `Composite` call) is an error: decompose or remove those before calling.
pub fn unitary(dag: &WireDag, qubits: &[Qubit]) -> Result<Unitary, SimulateError> {
    let n = qubits.len();
    let dim = 1usize << n;
    let mut state = Array2::<Complex64>::zeros((dim, dim));
    for i in 0..dim {
        state[[i, i]] = one();
    }
    let pos: HashMap<Qubit, usize> = qubits.iter().enumerate().map(|(i, &q)| (q, i)).collect();
    for node in dag.topological() {
        match dag.gate(node) {
            GateKind::Id(_) | GateKind::Barrier(_) => {}
            GateKind::X(q) => apply_1q(&mut state, &pauli_x(), pos[q], dim),
            GateKind::Y(q) => apply_1q(&mut state, &pauli_y(), pos[q], dim),
            GateKind::Z(q) => apply_1q(&mut state, &pauli_z(), pos[q], dim),
            GateKind::H(q) => apply_1q(&mut state, &hadamard(), pos[q], dim),
            GateKind::Rx(q, theta) => apply_1q(&mut state, &rx(*theta), pos[q], dim),
            GateKind::Ry(q, theta) => apply_1q(&mut state, &ry(*theta), pos[q], dim),
            GateKind::Rz(q, theta) => apply_1q(&mut state, &rz(*theta), pos[q], dim),
            GateKind::Cx(ctrl, tgt) => apply_cx(&mut state, pos[ctrl], pos[tgt], dim),
            other => return Err(SimulateError::UnsupportedGate(other.name().to_string())),
        }
    }
    Ok(state)
}

/// Compares two same-shape unitaries up to a single global phase: finds the
/// phase from the first entry with a magnitude above `tol` in `a`, then
/// requires every entry of `b` to match `a`'s after dividing it out.
pub fn approx_eq_global_phase(a: &Unitary, b: &Unitary, tol: f64) -> bool {
    if a.shape() != b.shape() {
        return false;
    }
    let mut phase: Option<Complex64> = None;
    for (x, y) in a.iter().zip(b.iter()) {
        if x.norm() > tol {
            phase = Some(y / x);
            break;
        }
    }
    let Some(phase) = phase else {
        return a.iter().all(|x| x.norm() <= tol) && b.iter().all(|y| y.norm() <= tol);
    };
    if (phase.norm() - 1.0).abs() > 1e-6 {
        return false;
    }
    a.iter()
        .zip(b.iter())
        .all(|(x, y)| (x * phase - y).norm() <= tol)
}

/// Re-indexes the basis of `u` according to a qubit permutation: `perm[i]`
/// is the original position now occupying position `i`.
pub fn permute(u: &Unitary, perm: &[usize]) -> Unitary {
    let n = perm.len();
    let dim = 1usize << n;
    let remap = |idx: usize| -> usize {
        let mut out = 0usize;
        for (new_bit, &old_bit) in perm.iter().enumerate() {
            if idx & (1 << old_bit) != 0 {
                out |= 1 << new_bit;
            }
        }
        out
    };
    let mut out = Array2::<Complex64>::zeros((dim, dim));
    for r in 0..dim {
        for col in 0..dim {
            out[[remap(r), remap(col)]] = u[[r, col]];
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::RegisterId;

    #[test]
    fn two_cx_cancel_to_identity() {
        let mut dag = WireDag::new();
        let qs = dag.add_q_register("q", 2).unwrap();
        dag.append(GateKind::Cx(qs[0], qs[1])).unwrap();
        dag.append(GateKind::Cx(qs[0], qs[1])).unwrap();
        let u = unitary(&dag, &qs).unwrap();
        let identity = Array2::<Complex64>::eye(4);
        assert!(approx_eq_global_phase(&u, &identity, 1e-9));
    }

    #[test]
    fn two_hadamards_cancel() {
        let mut dag = WireDag::new();
        let qs = dag.add_q_register("q", 1).unwrap();
        dag.append(GateKind::H(qs[0])).unwrap();
        dag.append(GateKind::H(qs[0])).unwrap();
        let u = unitary(&dag, &qs).unwrap();
        let identity = Array2::<Complex64>::eye(2);
        assert!(approx_eq_global_phase(&u, &identity, 1e-9));
    }

    #[test]
    fn measurement_is_unsupported() {
        let mut dag = WireDag::new();
        let qs = dag.add_q_register("q", 1).unwrap();
        let cs = dag.add_c_register("c", 1).unwrap();
        dag.measure(qs[0], cs[0]).unwrap();
        assert!(unitary(&dag, &qs).is_err());
    }

    #[test]
    fn unknown_qubit_never_indexed() {
        // Sanity: RegisterId newtype participates in map keys as expected.
        let r = RegisterId(0);
        assert_eq!(r.0, 0);
    }
}
