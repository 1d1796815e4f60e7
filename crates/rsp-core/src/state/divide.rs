/// Latched state of the reciprocal / inverse-square-root unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DivideState {
    /// High half latched by `VRCPH`/`VRSQH`.
    pub div_in: u16,
    /// High half of the last result.
    pub div_out: u16,
    /// Set by the high-half opcodes, consumed by the next low-half opcode.
    pub double_precision: bool,
}
