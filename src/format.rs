//! A minimal disassembly renderer, out of scope for correctness testing but
//! implemented so the database's read-side API (`get_label_by_addr`,
//! `get_operand_base`, `get_operand_label`, comments) has a consumer.
//!
//! It performs no analysis of its own: CODE/UNKNOWN/NOTCODE classification
//! is taken as given from the database.

use crate::bank::Bank;
use crate::database::Database;
use crate::opcode::{self, Mode, OpcodeDescriptor};
use crate::util::{rel_target, unpack_u};

/// Renders `addr`'s operand, preferring a covering label (shifted by the
/// address's displacement hint, per spec.md's operand-hint semantics) over
/// the bare numeric value.
fn resolve_token(db: &Database, addr: u16, value: u16, width: usize) -> String {
    let base = db.get_operand_base(addr, value);
    if let Some(label) = db.get_operand_label(addr, base) {
        let disp = db.operand_hint(addr).disp;
        if disp != 0 {
            format!("{}+{}", label.name, disp)
        } else {
            label.name.clone()
        }
    } else {
        format!("${value:0width$X}")
    }
}

fn format_operand(db: &Database, addr: u16, op: OpcodeDescriptor, raw_operand: u16) -> String {
    match op.mode {
        Mode::None => String::new(),
        Mode::Im | Mode::Brk => format!("#${raw_operand:02X}"),
        Mode::Zp => resolve_token(db, addr, raw_operand, 2),
        Mode::ZpX => format!("{},x", resolve_token(db, addr, raw_operand, 2)),
        Mode::ZpY => format!("{},y", resolve_token(db, addr, raw_operand, 2)),
        Mode::Ab => resolve_token(db, addr, raw_operand, 4),
        Mode::AbX => format!("{},x", resolve_token(db, addr, raw_operand, 4)),
        Mode::AbY => format!("{},y", resolve_token(db, addr, raw_operand, 4)),
        Mode::Ix => format!("({},x)", resolve_token(db, addr, raw_operand, 2)),
        Mode::Iy => format!("({}),y", resolve_token(db, addr, raw_operand, 2)),
        Mode::Ind => format!("({})", resolve_token(db, addr, raw_operand, 4)),
        Mode::Rel => {
            let target = rel_target(addr, raw_operand as u8);
            resolve_token(db, addr, target, 4)
        }
    }
}

/// Whether `addr` should be rendered as an instruction: it's CODE, or it's
/// UNKNOWN and the opcode there is official, and either way the instruction
/// must fit within the bank (a truncated tail is always rendered as data).
fn renders_as_code(db: &Database, bank: &Bank, addr: u16, op: OpcodeDescriptor) -> bool {
    let end = addr as u32 + op.size as u32 - 1;
    if end > bank.addr_max() as u32 {
        return false;
    }
    db.is_code(addr) || (db.is_unknown(addr) && op.official)
}

/// Renders `bank` as text, one line per CODE instruction or per NOTCODE/
/// UNKNOWN byte, with head/tail comments interleaved.
pub fn disassemble(db: &Database, bank: &Bank) -> String {
    let mut out = String::new();
    let mut addr = bank.org();
    loop {
        for line in db.comment(addr).head_lines() {
            out.push_str("; ");
            out.push_str(line);
            out.push('\n');
        }

        let code = bank.read_byte(addr).expect("addr walked within bank");
        let op = opcode::get(code);
        let advance;
        if renders_as_code(db, bank, addr, op) {
            let raw_operand = if op.argsize == 0 {
                0
            } else {
                let bytes = bank
                    .read_slice(addr.wrapping_add(1), addr as u32 + 1 + op.argsize as u32)
                    .expect("size already checked by renders_as_code");
                unpack_u(bytes)
            };
            let operand = format_operand(db, addr, op, raw_operand);
            out.push_str(&format!("{addr:04X} : {}", op.name));
            if !operand.is_empty() {
                out.push(' ');
                out.push_str(&operand);
            }
            advance = op.size as u32;
        } else {
            out.push_str(&format!("{addr:04X} : .byte ${code:02X}"));
            advance = 1;
        }

        if let Some(tail) = db.comment(addr).tail() {
            out.push_str("  ; ");
            out.push_str(tail);
        }
        out.push('\n');

        let next = addr as u32 + advance;
        if next > bank.addr_max() as u32 {
            break;
        }
        addr = next as u16;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::hint::LabelPolicy;

    #[test]
    fn renders_code_and_data_lines() {
        let bank = Bank::new(vec![0xA9, 0x00, 0x60, 0xFF], 0x8000).unwrap();
        let mut db = Database::new(0x8000);
        db.force_code(0x8000);
        db.force_code(0x8001);
        db.force_code(0x8002);
        db.force_notcode(0x8003);
        let out = disassemble(&db, &bank);
        assert!(out.contains("8000 : LDA #$00"));
        assert!(out.contains("8002 : RTS"));
        assert!(out.contains("8003 : .byte $FF"));
    }

    #[test]
    fn substitutes_label_for_absolute_operand() {
        let bank = Bank::new(vec![0x4C, 0x00, 0x90], 0x8000).unwrap(); // JMP $9000
        let mut db = Database::new(0x8000);
        db.force_code(0x8000);
        db.add_label("START", 0x9000, 1).unwrap();
        let out = disassemble(&db, &bank);
        assert!(out.contains("8000 : JMP START"));
    }

    #[test]
    fn none_policy_keeps_numeric_operand() {
        let bank = Bank::new(vec![0x4C, 0x00, 0x90], 0x8000).unwrap();
        let mut db = Database::new(0x8000);
        db.force_code(0x8000);
        db.add_label("START", 0x9000, 1).unwrap();
        db.set_operand_label_policy(0x8000, LabelPolicy::None);
        let out = disassemble(&db, &bank);
        assert!(out.contains("8000 : JMP $9000"));
    }

    #[test]
    fn unknown_official_opcode_renders_as_code() {
        let bank = Bank::new(vec![0xEA], 0x8000).unwrap(); // NOP, UNKNOWN
        let db = Database::new(0x8000);
        let out = disassemble(&db, &bank);
        assert!(out.contains("8000 : NOP"));
    }
}
