//! Lane arithmetic properties checked against scalar reference models, on
//! the portable backend and, when enabled, the SSE2 backend.

use log as _;
use proptest::prelude::*;
use rsp_core::vector::{self, LaneOps, Portable, VectorOperands};
use rsp_core::{Lanes, VectorOpcode, VectorRegister, VectorState};
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;

const VS: u8 = 1;
const VT: u8 = 2;
const VD: u8 = 3;

fn operands(element: u8) -> VectorOperands {
    VectorOperands {
        vd: VD,
        vs: VS,
        vt: VT,
        element,
    }
}

fn state_with(vs: Lanes, vt: Lanes) -> VectorState {
    let mut state = VectorState::default();
    state.registers.set(VS, VectorRegister(vs));
    state.registers.set(VT, VectorRegister(vt));
    state
}

fn run<B: LaneOps>(state: &mut VectorState, ops: &[VectorOpcode], element: u8) {
    for &op in ops {
        vector::execute::<B>(state, op, operands(element));
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp16(value: i64) -> u16 {
    value.clamp(-32768, 32767) as i16 as u16
}

#[allow(clippy::cast_possible_wrap)]
fn signed(lane: u16) -> i64 {
    i64::from(lane as i16)
}

/// Runs `ops` on every compiled backend and checks they agree.
fn run_all(vs: Lanes, vt: Lanes, ops: &[VectorOpcode], element: u8) -> VectorState {
    let mut portable = state_with(vs, vt);
    run::<Portable>(&mut portable, ops, element);
    #[cfg(all(feature = "simd", target_arch = "x86_64"))]
    {
        let mut sse = state_with(vs, vt);
        run::<rsp_core::vector::sse::Sse2>(&mut sse, ops, element);
        assert_eq!(portable, sse, "backends disagree on {ops:?}");
    }
    portable
}

fn lanes() -> impl Strategy<Value = Lanes> {
    prop::array::uniform8(any::<u16>())
}

proptest! {
    #[test]
    fn vadd_then_vaddc_matches_reference(vs in lanes(), vt in lanes()) {
        let state = run_all(vs, vt, &[VectorOpcode::Vadd], 0);
        for i in 0..8 {
            let sum = signed(vs[i]) + signed(vt[i]);
            prop_assert_eq!(state.registers.get(VD).lane(i), clamp16(sum));
            prop_assert_eq!(state.acc.low[i], vs[i].wrapping_add(vt[i]));
        }
        prop_assert_eq!(state.flags.vco(), 0);

        let state = run_all(vs, vt, &[VectorOpcode::Vaddc], 0);
        for i in 0..8 {
            let wrapped = vs[i].wrapping_add(vt[i]);
            let overflow = u32::from(vs[i]) + u32::from(vt[i]) > 0xFFFF;
            prop_assert_eq!(state.acc.low[i], wrapped);
            prop_assert_eq!(state.registers.get(VD).lane(i), wrapped);
            prop_assert_eq!(state.flags.vco() & (1 << i) != 0, overflow);
        }
        prop_assert_eq!(state.flags.vco() >> 8, 0);
    }

    #[test]
    fn vaddc_carry_feeds_next_vadd(vs in lanes(), vt in lanes()) {
        let state = run_all(vs, vt, &[VectorOpcode::Vaddc, VectorOpcode::Vadd], 0);
        for i in 0..8 {
            let carry = i64::from(u32::from(vs[i]) + u32::from(vt[i]) > 0xFFFF);
            let sum = signed(vs[i]) + signed(vt[i]) + carry;
            prop_assert_eq!(state.registers.get(VD).lane(i), clamp16(sum));
        }
        prop_assert_eq!(state.flags.vco(), 0);
    }

    #[test]
    fn vmulf_matches_reference(vs in lanes(), vt in lanes()) {
        let state = run_all(vs, vt, &[VectorOpcode::Vmulf], 0);
        for i in 0..8 {
            let product = signed(vs[i]) * signed(vt[i]) * 2 + 0x8000;
            prop_assert_eq!(state.acc.lane(i), product);
            prop_assert_eq!(state.registers.get(VD).lane(i), clamp16(product >> 16));
        }
    }

    #[test]
    fn multiply_family_agrees_across_backends(
        vs in lanes(),
        vt in lanes(),
        element in 0u8..16,
    ) {
        run_all(vs, vt, &[
            VectorOpcode::Vmudh,
            VectorOpcode::Vmadm,
            VectorOpcode::Vmadn,
            VectorOpcode::Vmadl,
            VectorOpcode::Vmacf,
            VectorOpcode::Vmacu,
            VectorOpcode::Vmadh,
        ], element);
    }

    #[test]
    fn select_family_agrees_across_backends(vs in lanes(), vt in lanes(), vco in any::<u16>()) {
        let mut portable = state_with(vs, vt);
        portable.flags.set_vco(vco);
        run::<Portable>(&mut portable, &[VectorOpcode::Vch, VectorOpcode::Vcl, VectorOpcode::Vmrg], 0);
        #[cfg(all(feature = "simd", target_arch = "x86_64"))]
        {
            let mut sse = state_with(vs, vt);
            sse.flags.set_vco(vco);
            run::<rsp_core::vector::sse::Sse2>(
                &mut sse,
                &[VectorOpcode::Vch, VectorOpcode::Vcl, VectorOpcode::Vmrg],
                0,
            );
            prop_assert_eq!(portable, sse);
        }
    }

    #[test]
    fn vco_control_round_trips(value in any::<u16>()) {
        let mut state = VectorState::default();
        state.flags.write_control(0, value);
        prop_assert_eq!(state.flags.read_control(0), value);
    }

    #[test]
    fn vrcp_specials_ignore_prior_divide_state(
        div_in in any::<u16>(),
        div_out in any::<u16>(),
        double in any::<bool>(),
    ) {
        for (input, low, high) in [(0u16, 0xFFFF, 0x7FFF), (0x8000, 0x0000, 0xFFFF)] {
            let mut state = state_with([0; 8], [input; 8]);
            state.divide.div_in = div_in;
            state.divide.div_out = div_out;
            state.divide.double_precision = double;
            let rcp = VectorOperands { vd: VD, vs: 4, vt: VT, element: 8 };
            vector::execute::<Portable>(&mut state, VectorOpcode::Vrcp, rcp);
            prop_assert_eq!(state.registers.get(VD).lane(4), low);
            let rcph = VectorOperands { vd: VD, vs: 5, vt: VT, element: 8 };
            vector::execute::<Portable>(&mut state, VectorOpcode::Vrcph, rcph);
            prop_assert_eq!(state.registers.get(VD).lane(5), high);
        }
    }

    #[test]
    fn vnop_is_idempotent(vs in lanes(), vt in lanes(), vco in any::<u16>()) {
        let mut state = state_with(vs, vt);
        state.flags.set_vco(vco);
        let before = state.clone();
        run::<Portable>(&mut state, &[VectorOpcode::Vnop, VectorOpcode::Vnop], 0);
        prop_assert_eq!(state, before);
    }
}

#[test]
fn vmulf_min_times_min() {
    let state = run_all([0x8000; 8], [0x8000; 8], &[VectorOpcode::Vmulf], 0);
    assert_eq!(state.registers.get(VD).lanes(), [0x7FFF; 8]);
    assert_eq!(state.acc.high, [0; 8]);
}
