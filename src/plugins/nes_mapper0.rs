//! NROM (mapper 0) cartridge layout: the unmapped $4018-$7FFF window and
//! read-only PRG ROM at $8000-$FFFF.
//!
//! At least one real cartridge (NES "Golf") performs empty accesses to the
//! unmapped window, so this is stated as a mapper fact rather than a
//! universal safety net.

use crate::bank::Bank;
use crate::database::Database;
use crate::perm::Permissions;
use crate::plugin::Plugin;

pub struct NesMapper0;

impl Plugin for NesMapper0 {
    fn update_perms(&self, _bank: &Bank, _db: &Database, perms: &mut Permissions) -> anyhow::Result<()> {
        for i in 0x4018..=0x7FFFu32 {
            let p = perms.get_mut(i as u16);
            p.readable = false;
            p.writable = false;
            p.executable = false;
        }

        for i in 0x8000..=0xFFFFu32 {
            perms.get_mut(i as u16).writable = false;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::run_plugin_perms;

    #[test]
    fn locks_unmapped_window_and_rom() {
        let bank = Bank::new(vec![0; 4], 0x8000).unwrap();
        let db = Database::new(0x8000);
        let mut perms = Permissions::new();
        run_plugin_perms(&NesMapper0, &bank, &db, &mut perms).unwrap();
        assert!(!perms.get(0x5000).readable);
        assert!(!perms.get(0x8000).writable);
        assert!(perms.get(0x8000).readable);
    }
}
