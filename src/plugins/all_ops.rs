//! Allows every opcode, including undocumented ones.

use crate::bank::Bank;
use crate::plugin::Plugin;

/// Relaxes `ops_valid` so pass 1 never rejects an instruction purely for
/// being undocumented. Useful for programs known to rely on illegal
/// opcodes, at the cost of more false-positive CODE classification.
pub struct AllOps;

impl Plugin for AllOps {
    fn update_ops_valid(&self, _bank: &Bank, ops_valid: &mut [bool; 256]) -> anyhow::Result<()> {
        ops_valid.fill(true);
        Ok(())
    }
}
