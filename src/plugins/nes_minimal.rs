//! Minimal NES register map: labels the PPU/APU/controller registers and
//! locks down their access direction, without touching RAM mirroring or
//! BRK.

use crate::bank::Bank;
use crate::database::Database;
use crate::perm::Permissions;
use crate::plugin::Plugin;

pub struct NesMinimal;

const SCALAR_LABELS: &[(&str, u16)] = &[
    ("PPU_CTRL", 0x2000),
    ("PPU_MASK", 0x2001),
    ("PPU_STATUS", 0x2002),
    ("OAM_ADDR", 0x2003),
    ("OAM_DATA", 0x2004),
    ("PPU_SCROLL", 0x2005),
    ("PPU_ADDR", 0x2006),
    ("PPU_DATA", 0x2007),
    ("OAM_DMA", 0x4014),
    ("APU_STATUS", 0x4015),
    ("APU_FRAME", 0x4017),
];

const ARRAY_LABELS: &[(&str, u16, u16)] = &[
    ("APU_PULSE1", 0x4000, 4),
    ("APU_PULSE2", 0x4004, 4),
    ("APU_TRIANGLE", 0x4008, 4),
    ("APU_NOISE", 0x400C, 4),
    ("APU_DMC", 0x4010, 4),
    ("CONTROLLER", 0x4016, 2),
];

/// Read-only APU registers beyond the write-only pulse/triangle/noise/DMC
/// blocks handled by the PPU-mirror loop below.
const APU_WRITE_ONLY: &[u16] = &[
    0x4000, 0x4001, 0x4002, 0x4003, 0x4004, 0x4005, 0x4006, 0x4007, 0x4008, 0x400A, 0x400B,
    0x400C, 0x400E, 0x400F, 0x4010, 0x4011, 0x4012, 0x4013, 0x4014,
];

pub(crate) fn add_register_labels(db: &mut Database) -> anyhow::Result<()> {
    for &(name, addr) in SCALAR_LABELS {
        db.add_label(name, addr, 1)?;
    }
    for &(name, addr, size) in ARRAY_LABELS {
        db.add_label(name, addr, size)?;
    }
    Ok(())
}

pub(crate) fn lock_io_registers(perms: &mut Permissions) {
    for i in 0x2000..=0x4017u32 {
        perms.get_mut(i as u16).executable = false;
    }

    // every PPU register mirror ($2000-$3FFF, period 8) has the same
    // write-only bytes at offsets 0, 1, 3, 5, 6 and the same read-only byte
    // at offset 2.
    let mut base = 0x2000u32;
    while base <= 0x3FFF {
        for offset in [0, 1, 3, 5, 6] {
            perms.get_mut((base + offset) as u16).readable = false;
        }
        perms.get_mut((base + 2) as u16).writable = false;
        base += 8;
    }

    for &addr in APU_WRITE_ONLY {
        perms.get_mut(addr).readable = false;
    }
}

impl Plugin for NesMinimal {
    fn update_db(&self, _bank: &Bank, db: &mut Database) -> anyhow::Result<()> {
        add_register_labels(db)
    }

    fn update_perms(&self, _bank: &Bank, _db: &Database, perms: &mut Permissions) -> anyhow::Result<()> {
        lock_io_registers(perms);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::{run_plugin, run_plugin_perms};

    #[test]
    fn registers_labels_and_locks_directions() {
        let bank = Bank::new(vec![0; 4], 0x8000).unwrap();
        let mut db = Database::new(0x8000);
        let mut ops_valid = crate::plugin::default_ops_valid();
        run_plugin(&NesMinimal, &bank, &mut db, &mut ops_valid).unwrap();
        assert_eq!(db.get_label("PPU_CTRL").unwrap().addr, 0x2000);
        assert_eq!(db.get_label("APU_PULSE1").unwrap().size, 4);

        let mut perms = Permissions::new();
        run_plugin_perms(&NesMinimal, &bank, &db, &mut perms).unwrap();
        assert!(!perms.get(0x2000).readable); // PPU_CTRL write-only
        assert!(!perms.get(0x2002).writable); // PPU_STATUS read-only
        assert!(!perms.get(0x2000).executable);
        assert!(perms.get(0x0800).executable); // RAM mirror untouched here
    }
}
