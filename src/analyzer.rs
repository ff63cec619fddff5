//! THE CORE: the two-pass reachability analyzer. Pass 1 rules out UNKNOWN
//! instructions whose operand access violates permissions; pass 2 explores
//! remaining UNKNOWN addresses along control flow, dooming traces that
//! deterministically hit NOTCODE and promoting forced single-successor
//! chains out of CODE.

use crate::bank::Bank;
use crate::database::{Analysis, Database};
use crate::opcode::{self, Mode, OpcodeDescriptor, KIL_CODES};
use crate::perm::Permissions;
use crate::util::{addr_add, rel_target, rel_target_checked, unpack_u};

fn not_executable(db: &Database, perms: &Permissions, addr: u16) -> bool {
    db.is_notcode(addr) || !perms.get(addr).executable
}

fn access_illegal(op: OpcodeDescriptor, perms: &Permissions, db: &Database, addr: u16) -> bool {
    if op.argread && !perms.get(addr).readable {
        return true;
    }
    if op.argwrite && !perms.get(addr).writable {
        return true;
    }
    if op.argexec && not_executable(db, perms, addr) {
        return true;
    }
    false
}

/// The 256 candidate addresses `ABX`/`ABY` could resolve to, wrapping
/// modulo 2^16 with no attempt to reason about the index register's value.
fn abi_addrs(base: u16) -> impl Iterator<Item = u16> {
    (0..0x100u32).map(move |i| addr_add(base, i as i32))
}

/// Decodes the instruction at `addr`, returning its descriptor and operand
/// value. `None` if `addr` falls outside the bank or the instruction would
/// run past the end of it.
fn decode_at(bank: &Bank, addr: u16) -> Option<(OpcodeDescriptor, u16)> {
    let code = bank.read_byte(addr)?;
    let op = opcode::get(code);
    let end = addr as u32 + op.size as u32 - 1;
    if end > bank.addr_max() as u32 {
        return None;
    }
    let arg = if op.argsize == 0 {
        0
    } else {
        let bytes = bank.read_slice(addr_add(addr, 1), addr as u32 + 1 + op.argsize as u32)?;
        unpack_u(bytes)
    };
    Some((op, arg))
}

/// Whether the instruction at `addr` is permission-legal given its
/// addressing mode's effective-address fan-out, per spec.md 4.F.2.
fn is_permission_legal(
    op: OpcodeDescriptor,
    addr: u16,
    arg: u16,
    irq: Option<u16>,
    perms: &Permissions,
    db: &Database,
) -> bool {
    match op.mode {
        Mode::None | Mode::Im => true,
        // Only evaluated when an IRQ vector is known; with no vector BRK is
        // left unconstrained rather than synthesizing a default target.
        Mode::Brk => match irq {
            None => true,
            Some(irq) => !(not_executable(db, perms, irq) || !perms.get(irq).readable),
        },
        Mode::Rel => {
            let target = rel_target(addr, arg as u8);
            !(not_executable(db, perms, target) || !perms.get(target).readable)
        }
        // JMP indirect: both pointer bytes (with the low-byte page-wrap bug)
        // must be readable, regardless of op flags.
        Mode::Ind => {
            let hi = (arg & 0xFF00) | (arg.wrapping_add(1) & 0xFF);
            perms.get(arg).readable && perms.get(hi).readable
        }
        // (zp),Y: both zero-page pointer bytes are touched regardless of Y.
        Mode::Iy => {
            let hi = arg.wrapping_add(1) & 0xFF;
            perms.get(arg).readable && perms.get(hi).readable
        }
        Mode::Zp | Mode::Ab => !access_illegal(op, perms, db, arg),
        // Unknown index register: legal if at least one of the 256
        // zero-page candidates is legal.
        Mode::ZpX | Mode::ZpY | Mode::Ix => {
            !(0..=0xFFu16).all(|a| access_illegal(op, perms, db, a))
        }
        // Unknown index register: legal if at least one of the 256 wrapped
        // candidates is legal.
        Mode::AbX | Mode::AbY => !abi_addrs(arg).all(|a| access_illegal(op, perms, db, a)),
    }
}

/// Control-flow successors of the instruction at `pc`.
enum Successors {
    /// No successor (KIL, BRK with no vector, or an out-of-range branch).
    None,
    /// A successor exists but isn't statically determined (JMP indirect,
    /// RTS, RTI).
    Undetermined,
    One(u16),
    Two(u16, u16),
}

/// Control-flow successors of the instruction at `pc`, threaded with the IRQ
/// vector BRK needs. Grounded in `_op_nexts`.
fn next_set_with_irq(pc: u16, op: OpcodeDescriptor, arg: u16, irq: Option<u16>) -> Successors {
    if KIL_CODES.contains(&op.code) {
        return Successors::None;
    }
    match op.code {
        0x00 => match irq {
            Some(irq) => Successors::One(irq),
            None => Successors::None,
        },
        0x20 | 0x4C => Successors::One(arg), // JSR abs, JMP abs
        0x6C | 0x60 | 0x40 => Successors::Undetermined, // JMP ind, RTS, RTI
        _ if op.mode == Mode::Rel => match rel_target_checked(pc, arg as u8) {
            None => Successors::None,
            Some((after, target)) if after == target => Successors::One(after),
            Some((after, target)) => Successors::Two(after, target),
        },
        _ => {
            let after = pc as u32 + op.size as u32;
            if after > 0xFFFF {
                Successors::None
            } else {
                Successors::One(after as u16)
            }
        }
    }
}

// --- pass 1: per-instruction legality ---------------------------------------

/// First pass: for every still-UNKNOWN address in the bank, decide whether
/// the instruction starting there is outright illegal (unknown opcode,
/// truncated, or an operand access that can never be legal) and mark it
/// NOTCODE. Never promotes anything to CODE. A single sweep, not iterated.
pub fn analyze_single(
    db: &mut Database,
    bank: &Bank,
    ops_valid: &[bool; 256],
    perms: &Permissions,
    irq: Option<u16>,
) {
    for addr in bank.org()..=bank.addr_max() {
        if !db.is_unknown(addr) {
            continue;
        }
        let code = bank.read_byte(addr).expect("addr is within bank by loop bound");
        let op = opcode::get(code);
        if !ops_valid[code as usize] {
            db.change_analysis(addr, Analysis::Unknown, Analysis::Notcode);
            continue;
        }
        let end = addr as u32 + op.size as u32 - 1;
        if end > bank.addr_max() as u32 {
            continue; // truncated: stays UNKNOWN, no verdict possible
        }
        let (op, arg) = decode_at(bank, addr).expect("bounds already checked above");
        if !is_permission_legal(op, addr, arg, irq, perms, db) {
            db.change_analysis(addr, Analysis::Unknown, Analysis::Notcode);
        }
        if addr == bank.addr_max() {
            break; // avoid wrapping the loop variable past 0xFFFF
        }
    }
}

// --- pass 2a: exploring UNKNOWN chains ---------------------------------------

/// Second pass, first half: walks every remaining UNKNOWN address along its
/// control-flow chain. A chain that deterministically reaches NOTCODE dooms
/// every address visited along the way; anything else is left UNKNOWN.
pub fn analyze_flow_unknown(db: &mut Database, bank: &Bank, irq: Option<u16>) {
    let mut done = vec![false; 0x1_0000];
    for addr in bank.org()..=bank.addr_max() {
        if !done[addr as usize] && db.is_unknown(addr) {
            let mut trace = Vec::new();
            explore_unknown(db, bank, irq, addr, &mut done, &mut trace);
        }
        if addr == bank.addr_max() {
            break;
        }
    }
}

fn doom(db: &mut Database, trace: &[u16]) {
    for &a in trace {
        db.change_analysis(a, Analysis::Unknown, Analysis::Notcode);
    }
}

fn explore_unknown(
    db: &mut Database,
    bank: &Bank,
    irq: Option<u16>,
    addr: u16,
    done: &mut [bool],
    trace: &mut Vec<u16>,
) {
    if done[addr as usize] {
        return;
    }
    done[addr as usize] = true;
    trace.push(addr);

    let nexts = match decode_at(bank, addr) {
        None => Successors::None,
        Some((op, arg)) => next_set_with_irq(addr, op, arg, irq),
    };

    match nexts {
        Successors::None | Successors::Undetermined => {
            // Inconclusive: the trace stays UNKNOWN.
        }
        Successors::One(next) => match db.analysis(next) {
            Analysis::Unknown => explore_unknown(db, bank, irq, next, done, trace),
            Analysis::Code => {}
            Analysis::Notcode => doom(db, trace),
        },
        Successors::Two(a, b) => match (db.analysis(a), db.analysis(b)) {
            (Analysis::Code, _) | (_, Analysis::Code) => {}
            (Analysis::Unknown, Analysis::Unknown) => {
                let mut trace_a = Vec::new();
                let mut trace_b = Vec::new();
                explore_unknown(db, bank, irq, a, done, &mut trace_a);
                explore_unknown(db, bank, irq, b, done, &mut trace_b);
                if db.is_notcode(a) && db.is_notcode(b) {
                    doom(db, trace);
                }
            }
            (Analysis::Unknown, Analysis::Notcode) => explore_unknown(db, bank, irq, a, done, trace),
            (Analysis::Notcode, Analysis::Unknown) => explore_unknown(db, bank, irq, b, done, trace),
            (Analysis::Notcode, Analysis::Notcode) => doom(db, trace),
        },
    }
}

// --- pass 2b: propagating CODE --------------------------------------------

/// Marks the interior bytes of the instruction starting at `addr` (already
/// CODE) as CODE too, so that an operand byte which happens to decode as a
/// different opcode is never independently mistaken for an instruction
/// start. `change_analysis` and the `code()` script directive both remain
/// single-address; this is the analyzer's own bookkeeping.
///
/// `perms`, when given, gates each byte on its executable permission
/// (invariant 2); `None` skips the gate entirely for explicit external
/// seeding, which is allowed to override permissions the way
/// `force_code`/the script `code()` directive do.
fn mark_instruction_span(db: &mut Database, bank: &Bank, perms: Option<&Permissions>, addr: u16) {
    if let Some((op, _)) = decode_at(bank, addr) {
        for i in 1..op.size as u32 {
            let a = addr as u32 + i;
            if a > 0xFFFF {
                break;
            }
            let a = a as u16;
            if perms.map_or(true, |p| p.get(a).executable) {
                db.change_analysis(a, Analysis::Unknown, Analysis::Code);
            }
        }
    }
}

/// Second pass, second half: walks every CODE address's control-flow chain,
/// promoting a forced UNKNOWN successor to CODE. Two-successor steps only
/// promote when exactly one candidate is UNKNOWN and the other NOTCODE;
/// never when both are UNKNOWN, to avoid speculatively committing to one of
/// two live branches. Never promotes an address whose executable permission
/// is closed (invariant 2); such an address is simply left UNKNOWN and the
/// walk stops there.
pub fn analyze_flow_code(db: &mut Database, bank: &Bank, perms: &Permissions, irq: Option<u16>) {
    let mut done = vec![false; 0x1_0000];
    for addr in bank.org()..=bank.addr_max() {
        if !done[addr as usize] && db.is_code(addr) {
            walk_code(db, bank, perms, irq, addr, &mut done);
        }
        if addr == bank.addr_max() {
            break;
        }
    }
}

fn walk_code(db: &mut Database, bank: &Bank, perms: &Permissions, irq: Option<u16>, start: u16, done: &mut [bool]) {
    let mut addr = start;
    loop {
        if done[addr as usize] {
            return;
        }
        done[addr as usize] = true;
        mark_instruction_span(db, bank, Some(perms), addr);

        let nexts = match decode_at(bank, addr) {
            None => Successors::None,
            Some((op, arg)) => next_set_with_irq(addr, op, arg, irq),
        };

        match nexts {
            Successors::None | Successors::Undetermined => return,
            Successors::One(next) => match db.analysis(next) {
                Analysis::Unknown if perms.get(next).executable => {
                    db.change_analysis(next, Analysis::Unknown, Analysis::Code);
                    addr = next;
                }
                Analysis::Code => addr = next,
                _ => return,
            },
            Successors::Two(a, b) => {
                let a_open = db.analysis(a) == Analysis::Unknown && perms.get(a).executable;
                let b_open = db.analysis(b) == Analysis::Unknown && perms.get(b).executable;
                match (db.analysis(a), db.analysis(b)) {
                    (Analysis::Unknown, Analysis::Notcode) if a_open => {
                        db.change_analysis(a, Analysis::Unknown, Analysis::Code);
                        addr = a;
                    }
                    (Analysis::Notcode, Analysis::Unknown) if b_open => {
                        db.change_analysis(b, Analysis::Unknown, Analysis::Code);
                        addr = b;
                    }
                    _ => return,
                }
            }
        }
    }
}

// --- entry point -------------------------------------------------------------

/// Runs the full two-pass analysis against `bank`: per-instruction legality,
/// then UNKNOWN-chain exploration, then CODE-chain promotion.
pub fn analyze(
    db: &mut Database,
    bank: &Bank,
    ops_valid: &[bool; 256],
    perms: &Permissions,
    irq: Option<u16>,
) {
    analyze_single(db, bank, ops_valid, perms, irq);
    analyze_flow_unknown(db, bank, irq);
    analyze_flow_code(db, bank, perms, irq);
}

/// Seeds `addr` as a known entry point: promotes it to CODE (if it was
/// UNKNOWN) and marks the rest of its instruction's bytes CODE too. Used by
/// the driver and interrupt-vector handling before `analyze` runs.
pub fn seed_code(db: &mut Database, bank: &Bank, addr: u16) -> bool {
    let promoted = db.change_analysis(addr, Analysis::Unknown, Analysis::Code);
    mark_instruction_span(db, bank, None, addr);
    promoted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::default_ops_valid;

    fn bank_of(bytes: &[u8], org: u16) -> Bank {
        Bank::new(bytes.to_vec(), org).unwrap()
    }

    #[test]
    fn scenario_straight_line_seed_marks_whole_instruction() {
        // LDA #$00 ; RTS
        let bank = bank_of(&[0xA9, 0x00, 0x60], 0x8000);
        let mut db = Database::new(0x8000);
        let ops_valid = default_ops_valid();
        let perms = Permissions::new();
        seed_code(&mut db, &bank, 0x8000);
        analyze(&mut db, &bank, &ops_valid, &perms, None);
        assert!(db.is_code(0x8000));
        assert!(db.is_code(0x8001));
        assert!(db.is_code(0x8002));
    }

    #[test]
    fn scenario_jmp_to_non_executable_target_is_notcode() {
        // JMP $2000
        let bank = bank_of(&[0x4C, 0x00, 0x20], 0x8000);
        let mut db = Database::new(0x8000);
        let ops_valid = default_ops_valid();
        let mut perms = Permissions::new();
        perms.get_mut(0x2000).executable = false;
        analyze(&mut db, &bank, &ops_valid, &perms, None);
        assert!(db.is_notcode(0x8000));
    }

    #[test]
    fn scenario_trailing_nops_before_illegal_opcode_are_doomed() {
        // NOP ; NOP ; KIL (0x02)
        let bank = bank_of(&[0xEA, 0xEA, 0x02], 0x8000);
        let mut db = Database::new(0x8000);
        let ops_valid = default_ops_valid();
        let perms = Permissions::new();
        analyze(&mut db, &bank, &ops_valid, &perms, None);
        assert!(db.is_notcode(0x8000));
        assert!(db.is_notcode(0x8001));
        assert!(db.is_notcode(0x8002));
    }

    #[test]
    fn scenario_branch_promotes_through_notcode_sibling() {
        // BNE +1 ; BRK ; RTS, BRK disabled via ops_valid so 0x8002 is
        // NOTCODE by the time pass 2b runs, letting the asymmetric
        // two-successor rule promote 0x8003.
        let bank = bank_of(&[0xD0, 0x01, 0x00, 0x60], 0x8000);
        let mut db = Database::new(0x8000);
        let mut ops_valid = default_ops_valid();
        ops_valid[0x00] = false;
        let perms = Permissions::new();
        seed_code(&mut db, &bank, 0x8000);
        analyze(&mut db, &bank, &ops_valid, &perms, None);
        assert!(db.is_code(0x8000));
        assert!(db.is_code(0x8001));
        assert!(db.is_notcode(0x8002));
        assert!(db.is_code(0x8003));
    }

    #[test]
    fn jmp_indirect_requires_both_pointer_bytes_readable() {
        let bank = bank_of(&[0x6C, 0xFF, 0x20], 0x8000); // JMP ($20FF)
        let mut db = Database::new(0x8000);
        let ops_valid = default_ops_valid();
        let mut perms = Permissions::new();
        perms.get_mut(0x2000).readable = false; // the page-wrapped high byte: (0x20FF & 0xFF00) | ((0x20FF+1) & 0xFF)
        analyze(&mut db, &bank, &ops_valid, &perms, None);
        assert!(db.is_notcode(0x8000));
    }
}
