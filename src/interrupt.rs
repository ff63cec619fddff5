//! Fetching and registering the 6502 interrupt vectors (NMI/RESET/IRQ).
//!
//! These are plain functions over the public `Bank`/`Database` API; a
//! plug-in could write them itself, but the vectors are a first-class
//! external interface so the library provides them directly.

use crate::analyzer;
use crate::bank::Bank;
use crate::database::{Database, DataType};
use crate::error::ReachError;
use crate::util::unpack_u;

pub const NMI_VECTOR: u16 = 0xFFFA;
pub const RESET_VECTOR: u16 = 0xFFFC;
pub const IRQ_VECTOR: u16 = 0xFFFE;

/// Reads the little-endian word at `vector_addr`/`vector_addr + 1`. Fails if
/// either byte falls outside `bank`.
pub fn fetch_vector(bank: &Bank, vector_addr: u16) -> Result<u16, ReachError> {
    let hi_addr = vector_addr.wrapping_add(1);
    if !bank.contains(vector_addr) || !bank.contains(hi_addr) {
        return Err(ReachError::InputShape(format!(
            "vector at {vector_addr:#06X} is outside the bank"
        )));
    }
    let bytes = [
        bank.read_byte(vector_addr).unwrap(),
        bank.read_byte(hi_addr).unwrap(),
    ];
    Ok(unpack_u(&bytes))
}

/// If every byte of the vector table (`0xFFFA..=0xFFFF`) is still UNKNOWN,
/// types the three vectors as WORD (which also marks their six bytes
/// NOTCODE, per [`Database::set_data_type`]). A no-op otherwise, so that a
/// bank which already has opinions about those bytes (code running there,
/// or an explicit annotation) is left alone.
pub fn mark_default_vector_types(db: &mut Database) {
    let all_unknown = (NMI_VECTOR..=0xFFFF).all(|a| db.is_unknown(a));
    if !all_unknown {
        return;
    }
    db.set_data_type(NMI_VECTOR, DataType::Word);
    db.set_data_type(RESET_VECTOR, DataType::Word);
    db.set_data_type(IRQ_VECTOR, DataType::Word);
}

/// Registers `addr` as the entry point for an interrupt named `name`:
/// promotes it to CODE (spanning its first instruction, consistent with
/// every other CODE-seeding path) and, if it has no covering label yet,
/// adds one.
pub fn register_interrupt(db: &mut Database, bank: &Bank, name: &str, addr: u16) -> Result<(), ReachError> {
    analyzer::seed_code(db, bank, addr);
    if db.is_code(addr) && db.get_label_by_addr(addr, None).is_none() {
        db.add_label(name, addr, 1)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_vector_reads_little_endian() {
        let mut body = vec![0u8; 0x10000];
        body[0xFFFA] = 0x34;
        body[0xFFFB] = 0x12;
        let bank = Bank::new(body, 0x0000).unwrap();
        assert_eq!(fetch_vector(&bank, NMI_VECTOR).unwrap(), 0x1234);
    }

    #[test]
    fn fetch_vector_rejects_out_of_bank() {
        let bank = Bank::new(vec![0, 0, 0], 0x8000).unwrap();
        assert!(fetch_vector(&bank, NMI_VECTOR).is_err());
    }

    #[test]
    fn mark_default_vector_types_only_when_all_unknown() {
        let mut db = Database::new(0x0000);
        mark_default_vector_types(&mut db);
        assert_eq!(db.data_type(NMI_VECTOR), DataType::Word);
        assert!(db.is_notcode(NMI_VECTOR));
        assert!(db.is_notcode(0xFFFF));

        // a database where something already touched a vector byte: no override
        let mut db2 = Database::new(0x0000);
        db2.force_code(RESET_VECTOR);
        mark_default_vector_types(&mut db2);
        assert_eq!(db2.data_type(NMI_VECTOR), DataType::Byte);
    }

    #[test]
    fn register_interrupt_adds_label_once() {
        let bank = Bank::new(vec![0x60], 0x8000).unwrap(); // RTS
        let mut db = Database::new(0x8000);
        register_interrupt(&mut db, &bank, "RESET", 0x8000).unwrap();
        assert!(db.is_code(0x8000));
        assert_eq!(db.get_label_by_addr(0x8000, None).unwrap().name, "RESET");
    }
}
