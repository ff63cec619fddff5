//! The 256-entry static description of the 6502 instruction set.
//!
//! This table is pure data: mnemonic, addressing mode, operand size,
//! officiality, and the read/write/execute effect of the instruction on its
//! effective operand address. It is consulted by both the analyzer and the
//! formatter and never mutated.

/// A 6502 addressing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Implied or accumulator — no operand.
    None,
    /// Immediate.
    Im,
    /// Zero page.
    Zp,
    /// Zero page, X-indexed.
    ZpX,
    /// Zero page, Y-indexed.
    ZpY,
    /// Absolute.
    Ab,
    /// Absolute, X-indexed.
    AbX,
    /// Absolute, Y-indexed.
    AbY,
    /// Indexed indirect, (zp,X).
    Ix,
    /// Indirect indexed, (zp),Y.
    Iy,
    /// Program-counter relative (conditional branches).
    Rel,
    /// Indirect (JMP only).
    Ind,
    /// BRK's one-byte signature operand.
    Brk,
}

impl Mode {
    /// Operand size in bytes, per spec.md 4.A's addressing-mode table.
    const fn argsize(self) -> u8 {
        match self {
            Mode::None => 0,
            Mode::Im
            | Mode::Zp
            | Mode::ZpX
            | Mode::ZpY
            | Mode::Ix
            | Mode::Iy
            | Mode::Rel
            | Mode::Brk => 1,
            Mode::Ab | Mode::AbX | Mode::AbY | Mode::Ind => 2,
        }
    }
}

/// A single opcode's static description.
#[derive(Debug, Clone, Copy)]
pub struct OpcodeDescriptor {
    pub code: u8,
    pub name: &'static str,
    pub mode: Mode,
    pub argsize: u8,
    pub size: u8,
    pub official: bool,
    /// Whether executing this instruction reads its effective operand address.
    pub argread: bool,
    /// Whether executing this instruction writes its effective operand address.
    pub argwrite: bool,
    /// Whether executing this instruction jumps to its effective operand address.
    pub argexec: bool,
}

struct Spec {
    name: &'static str,
    mode: Mode,
    official: bool,
    argread: bool,
    argwrite: bool,
    argexec: bool,
}

const fn sp(
    name: &'static str,
    mode: Mode,
    official: bool,
    argread: bool,
    argwrite: bool,
    argexec: bool,
) -> Spec {
    Spec {
        name,
        mode,
        official,
        argread,
        argwrite,
        argexec,
    }
}

use Mode::*;

// Rows are laid out by high nibble, matching every published 6502 opcode
// matrix (e.g. the nesdev wiki's "6502 instructions" table). `*` in a
// comment marks an undocumented opcode; mnemonics for those follow the
// common naming used by visual6502/nestest-derived disassemblers.
#[rustfmt::skip]
const TABLE: [Spec; 256] = [
    // 0x0_
    sp("BRK", Brk, true,  false, false, true),  // 00
    sp("ORA", Ix,  true,  true,  false, false), // 01
    sp("KIL", None,false, false, false, false), // 02 *
    sp("SLO", Ix,  false, true,  true,  false), // 03 *
    sp("NOP", Zp,  false, true,  false, false), // 04 *
    sp("ORA", Zp,  true,  true,  false, false), // 05
    sp("ASL", Zp,  true,  true,  true,  false), // 06
    sp("SLO", Zp,  false, true,  true,  false), // 07 *
    sp("PHP", None,true,  false, false, false), // 08
    sp("ORA", Im,  true,  false, false, false), // 09
    sp("ASL", None,true,  false, false, false), // 0A (accumulator)
    sp("ANC", Im,  false, false, false, false), // 0B *
    sp("NOP", Ab,  false, true,  false, false), // 0C *
    sp("ORA", Ab,  true,  true,  false, false), // 0D
    sp("ASL", Ab,  true,  true,  true,  false), // 0E
    sp("SLO", Ab,  false, true,  true,  false), // 0F *
    // 0x1_
    sp("BPL", Rel, true,  false, false, true),  // 10
    sp("ORA", Iy,  true,  true,  false, false), // 11
    sp("KIL", None,false, false, false, false), // 12 *
    sp("SLO", Iy,  false, true,  true,  false), // 13 *
    sp("NOP", ZpX, false, true,  false, false), // 14 *
    sp("ORA", ZpX, true,  true,  false, false), // 15
    sp("ASL", ZpX, true,  true,  true,  false), // 16
    sp("SLO", ZpX, false, true,  true,  false), // 17 *
    sp("CLC", None,true,  false, false, false), // 18
    sp("ORA", AbY, true,  true,  false, false), // 19
    sp("NOP", None,false, false, false, false), // 1A *
    sp("SLO", AbY, false, true,  true,  false), // 1B *
    sp("NOP", AbX, false, true,  false, false), // 1C *
    sp("ORA", AbX, true,  true,  false, false), // 1D
    sp("ASL", AbX, true,  true,  true,  false), // 1E
    sp("SLO", AbX, false, true,  true,  false), // 1F *
    // 0x2_
    sp("JSR", Ab,  true,  false, false, true),  // 20
    sp("AND", Ix,  true,  true,  false, false), // 21
    sp("KIL", None,false, false, false, false), // 22 *
    sp("RLA", Ix,  false, true,  true,  false), // 23 *
    sp("BIT", Zp,  true,  true,  false, false), // 24
    sp("AND", Zp,  true,  true,  false, false), // 25
    sp("ROL", Zp,  true,  true,  true,  false), // 26
    sp("RLA", Zp,  false, true,  true,  false), // 27 *
    sp("PLP", None,true,  false, false, false), // 28
    sp("AND", Im,  true,  false, false, false), // 29
    sp("ROL", None,true,  false, false, false), // 2A
    sp("ANC", Im,  false, false, false, false), // 2B *
    sp("BIT", Ab,  true,  true,  false, false), // 2C
    sp("AND", Ab,  true,  true,  false, false), // 2D
    sp("ROL", Ab,  true,  true,  true,  false), // 2E
    sp("RLA", Ab,  false, true,  true,  false), // 2F *
    // 0x3_
    sp("BMI", Rel, true,  false, false, true),  // 30
    sp("AND", Iy,  true,  true,  false, false), // 31
    sp("KIL", None,false, false, false, false), // 32 *
    sp("RLA", Iy,  false, true,  true,  false), // 33 *
    sp("NOP", ZpX, false, true,  false, false), // 34 *
    sp("AND", ZpX, true,  true,  false, false), // 35
    sp("ROL", ZpX, true,  true,  true,  false), // 36
    sp("RLA", ZpX, false, true,  true,  false), // 37 *
    sp("SEC", None,true,  false, false, false), // 38
    sp("AND", AbY, true,  true,  false, false), // 39
    sp("NOP", None,false, false, false, false), // 3A *
    sp("RLA", AbY, false, true,  true,  false), // 3B *
    sp("NOP", AbX, false, true,  false, false), // 3C *
    sp("AND", AbX, true,  true,  false, false), // 3D
    sp("ROL", AbX, true,  true,  true,  false), // 3E
    sp("RLA", AbX, false, true,  true,  false), // 3F *
    // 0x4_
    sp("RTI", None,true,  false, false, false), // 40
    sp("EOR", Ix,  true,  true,  false, false), // 41
    sp("KIL", None,false, false, false, false), // 42 *
    sp("SRE", Ix,  false, true,  true,  false), // 43 *
    sp("NOP", Zp,  false, true,  false, false), // 44 *
    sp("EOR", Zp,  true,  true,  false, false), // 45
    sp("LSR", Zp,  true,  true,  true,  false), // 46
    sp("SRE", Zp,  false, true,  true,  false), // 47 *
    sp("PHA", None,true,  false, false, false), // 48
    sp("EOR", Im,  true,  false, false, false), // 49
    sp("LSR", None,true,  false, false, false), // 4A
    sp("ALR", Im,  false, false, false, false), // 4B *
    sp("JMP", Ab,  true,  false, false, true),  // 4C
    sp("EOR", Ab,  true,  true,  false, false), // 4D
    sp("LSR", Ab,  true,  true,  true,  false), // 4E
    sp("SRE", Ab,  false, true,  true,  false), // 4F *
    // 0x5_
    sp("BVC", Rel, true,  false, false, true),  // 50
    sp("EOR", Iy,  true,  true,  false, false), // 51
    sp("KIL", None,false, false, false, false), // 52 *
    sp("SRE", Iy,  false, true,  true,  false), // 53 *
    sp("NOP", ZpX, false, true,  false, false), // 54 *
    sp("EOR", ZpX, true,  true,  false, false), // 55
    sp("LSR", ZpX, true,  true,  true,  false), // 56
    sp("SRE", ZpX, false, true,  true,  false), // 57 *
    sp("CLI", None,true,  false, false, false), // 58
    sp("EOR", AbY, true,  true,  false, false), // 59
    sp("NOP", None,false, false, false, false), // 5A *
    sp("SRE", AbY, false, true,  true,  false), // 5B *
    sp("NOP", AbX, false, true,  false, false), // 5C *
    sp("EOR", AbX, true,  true,  false, false), // 5D
    sp("LSR", AbX, true,  true,  true,  false), // 5E
    sp("SRE", AbX, false, true,  true,  false), // 5F *
    // 0x6_
    sp("RTS", None,true,  false, false, false), // 60
    sp("ADC", Ix,  true,  true,  false, false), // 61
    sp("KIL", None,false, false, false, false), // 62 *
    sp("RRA", Ix,  false, true,  true,  false), // 63 *
    sp("NOP", Zp,  false, true,  false, false), // 64 *
    sp("ADC", Zp,  true,  true,  false, false), // 65
    sp("ROR", Zp,  true,  true,  true,  false), // 66
    sp("RRA", Zp,  false, true,  true,  false), // 67 *
    sp("PLA", None,true,  false, false, false), // 68
    sp("ADC", Im,  true,  false, false, false), // 69
    sp("ROR", None,true,  false, false, false), // 6A
    sp("ARR", Im,  false, false, false, false), // 6B *
    sp("JMP", Ind, true,  false, false, true),  // 6C
    sp("ADC", Ab,  true,  true,  false, false), // 6D
    sp("ROR", Ab,  true,  true,  true,  false), // 6E
    sp("RRA", Ab,  false, true,  true,  false), // 6F *
    // 0x7_
    sp("BVS", Rel, true,  false, false, true),  // 70
    sp("ADC", Iy,  true,  true,  false, false), // 71
    sp("KIL", None,false, false, false, false), // 72 *
    sp("RRA", Iy,  false, true,  true,  false), // 73 *
    sp("NOP", ZpX, false, true,  false, false), // 74 *
    sp("ADC", ZpX, true,  true,  false, false), // 75
    sp("ROR", ZpX, true,  true,  true,  false), // 76
    sp("RRA", ZpX, false, true,  true,  false), // 77 *
    sp("SEI", None,true,  false, false, false), // 78
    sp("ADC", AbY, true,  true,  false, false), // 79
    sp("NOP", None,false, false, false, false), // 7A *
    sp("RRA", AbY, false, true,  true,  false), // 7B *
    sp("NOP", AbX, false, true,  false, false), // 7C *
    sp("ADC", AbX, true,  true,  false, false), // 7D
    sp("ROR", AbX, true,  true,  true,  false), // 7E
    sp("RRA", AbX, false, true,  true,  false), // 7F *
    // 0x8_
    sp("NOP", Im,  false, false, false, false), // 80 *
    sp("STA", Ix,  true,  false, true,  false), // 81
    sp("NOP", Im,  false, false, false, false), // 82 *
    sp("SAX", Ix,  false, false, true,  false), // 83 *
    sp("STY", Zp,  true,  false, true,  false), // 84
    sp("STA", Zp,  true,  false, true,  false), // 85
    sp("STX", Zp,  true,  false, true,  false), // 86
    sp("SAX", Zp,  false, false, true,  false), // 87 *
    sp("DEY", None,true,  false, false, false), // 88
    sp("NOP", Im,  false, false, false, false), // 89 *
    sp("TXA", None,true,  false, false, false), // 8A
    sp("XAA", Im,  false, false, false, false), // 8B * (unstable)
    sp("STY", Ab,  true,  false, true,  false), // 8C
    sp("STA", Ab,  true,  false, true,  false), // 8D
    sp("STX", Ab,  true,  false, true,  false), // 8E
    sp("SAX", Ab,  false, false, true,  false), // 8F *
    // 0x9_
    sp("BCC", Rel, true,  false, false, true),  // 90
    sp("STA", Iy,  true,  false, true,  false), // 91
    sp("KIL", None,false, false, false, false), // 92 *
    sp("AHX", Iy,  false, false, true,  false), // 93 * (unstable)
    sp("STY", ZpX, true,  false, true,  false), // 94
    sp("STA", ZpX, true,  false, true,  false), // 95
    sp("STX", ZpY, true,  false, true,  false), // 96
    sp("SAX", ZpY, false, false, true,  false), // 97 *
    sp("TYA", None,true,  false, false, false), // 98
    sp("STA", AbY, true,  false, true,  false), // 99
    sp("TXS", None,true,  false, false, false), // 9A
    sp("TAS", AbY, false, false, true,  false), // 9B * (unstable)
    sp("SHY", AbX, false, false, true,  false), // 9C * (unstable)
    sp("STA", AbX, true,  false, true,  false), // 9D
    sp("SHX", AbY, false, false, true,  false), // 9E * (unstable)
    sp("AHX", AbY, false, false, true,  false), // 9F * (unstable)
    // 0xA_
    sp("LDY", Im,  true,  false, false, false), // A0
    sp("LDA", Ix,  true,  true,  false, false), // A1
    sp("LDX", Im,  true,  false, false, false), // A2
    sp("LAX", Ix,  false, true,  false, false), // A3 *
    sp("LDY", Zp,  true,  true,  false, false), // A4
    sp("LDA", Zp,  true,  true,  false, false), // A5
    sp("LDX", Zp,  true,  true,  false, false), // A6
    sp("LAX", Zp,  false, true,  false, false), // A7 *
    sp("TAY", None,true,  false, false, false), // A8
    sp("LDA", Im,  true,  false, false, false), // A9
    sp("TAX", None,true,  false, false, false), // AA
    sp("LAX", Im,  false, false, false, false), // AB * (unstable)
    sp("LDY", Ab,  true,  true,  false, false), // AC
    sp("LDA", Ab,  true,  true,  false, false), // AD
    sp("LDX", Ab,  true,  true,  false, false), // AE
    sp("LAX", Ab,  false, true,  false, false), // AF *
    // 0xB_
    sp("BCS", Rel, true,  false, false, true),  // B0
    sp("LDA", Iy,  true,  true,  false, false), // B1
    sp("KIL", None,false, false, false, false), // B2 *
    sp("LAX", Iy,  false, true,  false, false), // B3 *
    sp("LDY", ZpX, true,  true,  false, false), // B4
    sp("LDA", ZpX, true,  true,  false, false), // B5
    sp("LDX", ZpY, true,  true,  false, false), // B6
    sp("LAX", ZpY, false, true,  false, false), // B7 *
    sp("CLV", None,true,  false, false, false), // B8
    sp("LDA", AbY, true,  true,  false, false), // B9
    sp("TSX", None,true,  false, false, false), // BA
    sp("LAS", AbY, false, true,  false, false), // BB * (unstable)
    sp("LDY", AbX, true,  true,  false, false), // BC
    sp("LDA", AbX, true,  true,  false, false), // BD
    sp("LDX", AbY, true,  true,  false, false), // BE
    sp("LAX", AbY, false, true,  false, false), // BF *
    // 0xC_
    sp("CPY", Im,  true,  false, false, false), // C0
    sp("CMP", Ix,  true,  true,  false, false), // C1
    sp("NOP", Im,  false, false, false, false), // C2 *
    sp("DCP", Ix,  false, true,  true,  false), // C3 *
    sp("CPY", Zp,  true,  true,  false, false), // C4
    sp("CMP", Zp,  true,  true,  false, false), // C5
    sp("DEC", Zp,  true,  true,  true,  false), // C6
    sp("DCP", Zp,  false, true,  true,  false), // C7 *
    sp("INY", None,true,  false, false, false), // C8
    sp("CMP", Im,  true,  false, false, false), // C9
    sp("DEX", None,true,  false, false, false), // CA
    sp("AXS", Im,  false, false, false, false), // CB *
    sp("CPY", Ab,  true,  true,  false, false), // CC
    sp("CMP", Ab,  true,  true,  false, false), // CD
    sp("DEC", Ab,  true,  true,  true,  false), // CE
    sp("DCP", Ab,  false, true,  true,  false), // CF *
    // 0xD_
    sp("BNE", Rel, true,  false, false, true),  // D0
    sp("CMP", Iy,  true,  true,  false, false), // D1
    sp("KIL", None,false, false, false, false), // D2 *
    sp("DCP", Iy,  false, true,  true,  false), // D3 *
    sp("NOP", ZpX, false, true,  false, false), // D4 *
    sp("CMP", ZpX, true,  true,  false, false), // D5
    sp("DEC", ZpX, true,  true,  true,  false), // D6
    sp("DCP", ZpX, false, true,  true,  false), // D7 *
    sp("CLD", None,true,  false, false, false), // D8
    sp("CMP", AbY, true,  true,  false, false), // D9
    sp("NOP", None,false, false, false, false), // DA *
    sp("DCP", AbY, false, true,  true,  false), // DB *
    sp("NOP", AbX, false, true,  false, false), // DC *
    sp("CMP", AbX, true,  true,  false, false), // DD
    sp("DEC", AbX, true,  true,  true,  false), // DE
    sp("DCP", AbX, false, true,  true,  false), // DF *
    // 0xE_
    sp("CPX", Im,  true,  false, false, false), // E0
    sp("SBC", Ix,  true,  true,  false, false), // E1
    sp("NOP", Im,  false, false, false, false), // E2 *
    sp("ISC", Ix,  false, true,  true,  false), // E3 *
    sp("CPX", Zp,  true,  true,  false, false), // E4
    sp("SBC", Zp,  true,  true,  false, false), // E5
    sp("INC", Zp,  true,  true,  true,  false), // E6
    sp("ISC", Zp,  false, true,  true,  false), // E7 *
    sp("INX", None,true,  false, false, false), // E8
    sp("SBC", Im,  true,  false, false, false), // E9
    sp("NOP", None,true,  false, false, false), // EA
    sp("SBC", Im,  false, false, false, false), // EB *
    sp("CPX", Ab,  true,  true,  false, false), // EC
    sp("SBC", Ab,  true,  true,  false, false), // ED
    sp("INC", Ab,  true,  true,  true,  false), // EE
    sp("ISC", Ab,  false, true,  true,  false), // EF *
    // 0xF_
    sp("BEQ", Rel, true,  false, false, true),  // F0
    sp("SBC", Iy,  true,  true,  false, false), // F1
    sp("KIL", None,false, false, false, false), // F2 *
    sp("ISC", Iy,  false, true,  true,  false), // F3 *
    sp("NOP", ZpX, false, true,  false, false), // F4 *
    sp("SBC", ZpX, true,  true,  false, false), // F5
    sp("INC", ZpX, true,  true,  true,  false), // F6
    sp("ISC", ZpX, false, true,  true,  false), // F7 *
    sp("SED", None,true,  false, false, false), // F8
    sp("SBC", AbY, true,  true,  false, false), // F9
    sp("NOP", None,false, false, false, false), // FA *
    sp("ISC", AbY, false, true,  true,  false), // FB *
    sp("NOP", AbX, false, true,  false, false), // FC *
    sp("SBC", AbX, true,  true,  false, false), // FD
    sp("INC", AbX, true,  true,  true,  false), // FE
    sp("ISC", AbX, false, true,  true,  false), // FF *
];

/// Opcode numbers that halt the processor (`KIL`/`JAM`); the analyzer treats
/// these as having no control-flow successors.
pub const KIL_CODES: [u8; 12] = [
    0x02, 0x12, 0x22, 0x32, 0x42, 0x52, 0x62, 0x72, 0x92, 0xB2, 0xD2, 0xF2,
];

/// Returns the static descriptor for `code`. Total over all 256 byte values.
pub fn get(code: u8) -> OpcodeDescriptor {
    let s = &TABLE[code as usize];
    let argsize = s.mode.argsize();
    OpcodeDescriptor {
        code,
        name: s.name,
        mode: s.mode,
        argsize,
        size: 1 + argsize,
        official: s.official,
        argread: s.argread,
        argwrite: s.argwrite,
        argexec: s.argexec,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn table_is_total() {
        for code in 0..=255u8 {
            let op = get(code);
            assert_eq!(op.code, code);
            assert_eq!(op.size, 1 + op.argsize);
        }
    }

    #[rstest]
    #[case(0x00, "BRK", Mode::Brk, 2, true)]
    #[case(0xEA, "NOP", Mode::None, 1, true)]
    #[case(0x4C, "JMP", Mode::Ab, 3, true)]
    #[case(0x6C, "JMP", Mode::Ind, 3, true)]
    #[case(0xA9, "LDA", Mode::Im, 2, true)]
    #[case(0x02, "KIL", Mode::None, 1, false)]
    #[case(0x07, "SLO", Mode::Zp, 2, false)]
    fn known_opcodes(
        #[case] code: u8,
        #[case] name: &str,
        #[case] mode: Mode,
        #[case] size: u8,
        #[case] official: bool,
    ) {
        let op = get(code);
        assert_eq!(op.name, name);
        assert_eq!(op.mode, mode);
        assert_eq!(op.size, size);
        assert_eq!(op.official, official);
    }

    #[test]
    fn kil_codes_match_table() {
        for &code in &KIL_CODES {
            assert_eq!(get(code).name, "KIL");
        }
        for code in 0..=255u8 {
            let is_kil_name = get(code).name == "KIL";
            let is_in_list = KIL_CODES.contains(&code);
            assert_eq!(is_kil_name, is_in_list, "code {code:#04X}");
        }
    }

    #[test]
    fn sta_abs_is_write_only() {
        let op = get(0x8D); // STA abs
        assert!(op.argwrite);
        assert!(!op.argread);
        assert!(!op.argexec);
    }

    #[test]
    fn jsr_abs_executes() {
        let op = get(0x20);
        assert!(op.argexec);
    }

    #[test]
    fn read_modify_write_ops_set_both_flags() {
        for code in [0x06, 0x26, 0x46, 0x66, 0xC6, 0xE6] {
            let op = get(code);
            assert!(op.argread && op.argwrite, "{} at {code:#04X}", op.name);
        }
    }
}
