//! The plug-in contract. A plug-in customizes analysis for one platform by
//! seeding the database with known facts, tightening opcode validity, and
//! tightening permissions, in that order.

use crate::bank::Bank;
use crate::database::Database;
use crate::perm::Permissions;

/// A platform-specific source of analysis facts.
///
/// Implementors should not assume anything about the order plug-ins run
/// relative to each other beyond user-specified order; each hook only sees
/// the bank and must produce facts that hold regardless of what other
/// plug-ins already contributed.
pub trait Plugin {
    /// Seeds the database with known labels, data types, comments, or
    /// forced analysis states (e.g. the reset vector).
    fn update_db(&self, _bank: &Bank, _db: &mut Database) -> anyhow::Result<()> {
        Ok(())
    }

    /// Narrows which opcodes are considered valid. `ops_valid[code]` starts
    /// `true` for every code the global table marks as a real instruction;
    /// a plug-in may only clear bits, never set ones the table didn't.
    fn update_ops_valid(&self, _bank: &Bank, _ops_valid: &mut [bool; 256]) -> anyhow::Result<()> {
        Ok(())
    }

    /// Narrows per-address read/write/execute permissions.
    fn update_perms(&self, _bank: &Bank, _db: &Database, _perms: &mut Permissions) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Runs every hook of `plugin` against `bank`/`db`/`perms`, in the order
/// the analyzer contract requires.
pub fn run_plugin(
    plugin: &dyn Plugin,
    bank: &Bank,
    db: &mut Database,
    ops_valid: &mut [bool; 256],
) -> anyhow::Result<()> {
    plugin.update_db(bank, db)?;
    plugin.update_ops_valid(bank, ops_valid)?;
    Ok(())
}

/// `update_perms` runs in a second pass after every plug-in's `update_db`
/// has run, since permission decisions may depend on labels other plug-ins
/// established earlier.
pub fn run_plugin_perms(
    plugin: &dyn Plugin,
    bank: &Bank,
    db: &Database,
    perms: &mut Permissions,
) -> anyhow::Result<()> {
    plugin.update_perms(bank, db, perms)
}

/// Builds the `ops_valid` table the analyzer's first pass consults before
/// any plug-in narrows it: `official[code]`, i.e. `true` only for documented
/// 6502 opcodes. KIL codes are undocumented and so are already `false` here.
pub fn default_ops_valid() -> [bool; 256] {
    let mut table = [false; 256];
    for code in 0..=255u8 {
        table[code as usize] = crate::opcode::get(code).official;
    }
    table
}
