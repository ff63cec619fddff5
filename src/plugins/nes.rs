//! Full NES register map: everything [`super::nes_minimal::NesMinimal`]
//! does, plus locking out the $0800-$1FFF RAM mirror and disabling BRK
//! (rarely used deliberately; leaving it enabled makes UNKNOWN data regions
//! noisy with spurious BRK-starts).

use crate::bank::Bank;
use crate::database::Database;
use crate::perm::Permissions;
use crate::plugin::Plugin;

use super::nes_minimal::{add_register_labels, lock_io_registers};

const BRK: u8 = 0x00;

pub struct Nes;

impl Plugin for Nes {
    fn update_db(&self, _bank: &Bank, db: &mut Database) -> anyhow::Result<()> {
        add_register_labels(db)
    }

    fn update_ops_valid(&self, _bank: &Bank, ops_valid: &mut [bool; 256]) -> anyhow::Result<()> {
        ops_valid[BRK as usize] = false;
        Ok(())
    }

    fn update_perms(&self, _bank: &Bank, _db: &Database, perms: &mut Permissions) -> anyhow::Result<()> {
        for i in 0x0800..=0x1FFFu32 {
            let p = perms.get_mut(i as u16);
            p.readable = false;
            p.writable = false;
            p.executable = false;
        }

        lock_io_registers(perms);

        for i in 0x2008..=0x3FFFu32 {
            let p = perms.get_mut(i as u16);
            p.readable = false;
            p.writable = false;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::{run_plugin, run_plugin_perms};

    #[test]
    fn disables_brk_and_ram_mirror() {
        let bank = Bank::new(vec![0; 4], 0x8000).unwrap();
        let mut db = Database::new(0x8000);
        let mut ops_valid = crate::plugin::default_ops_valid();
        run_plugin(&Nes, &bank, &mut db, &mut ops_valid).unwrap();
        assert!(!ops_valid[BRK as usize]);

        let mut perms = Permissions::new();
        run_plugin_perms(&Nes, &bank, &db, &mut perms).unwrap();
        assert!(!perms.get(0x1000).readable);
        assert!(!perms.get(0x1000).executable);
        assert!(!perms.get(0x2008).readable); // PPU register mirror
    }
}
