//! End-to-end scenarios exercising the full `analyze` pipeline and the
//! script round-trip through the public API, as opposed to the module-level
//! unit tests that poke individual analyzer passes directly.

use reach6502::bank::Bank;
use reach6502::database::hint::LabelPolicy;
use reach6502::database::script::{apply_script, save_script};
use reach6502::database::Database;
use reach6502::perm::Permissions;
use reach6502::plugin::default_ops_valid;
use reach6502::{analyzer, format};

fn bank_of(bytes: &[u8], org: u16) -> Bank {
    Bank::new(bytes.to_vec(), org).unwrap()
}

#[test]
fn forbidden_execution_target_is_notcode() {
    // JMP $2000, target not executable.
    let bank = bank_of(&[0x4C, 0x00, 0x20], 0x8000);
    let mut db = Database::new(0x8000);
    analyzer::seed_code(&mut db, &bank, 0x8000);
    let ops_valid = default_ops_valid();
    let mut perms = Permissions::new();
    perms.get_mut(0x2000).executable = false;

    analyzer::analyze(&mut db, &bank, &ops_valid, &perms, None);

    assert!(db.is_notcode(0x8000));
}

#[test]
fn doomed_trace_via_invalid_opcode() {
    // NOP; NOP; 0x02 (KIL, never official) -- all start UNKNOWN.
    let bank = bank_of(&[0xEA, 0xEA, 0x02], 0x8000);
    let mut db = Database::new(0x8000);
    let ops_valid = default_ops_valid();
    let perms = Permissions::new();

    analyzer::analyze(&mut db, &bank, &ops_valid, &perms, None);

    assert!(db.is_notcode(0x8002));
    assert!(db.is_notcode(0x8000));
    assert!(db.is_notcode(0x8001));
}

#[test]
fn indirect_jmp_page_wrap_pointer_checks_wrapped_low_byte() {
    // JMP ($80FF) at 0x80FE; the low-byte-wrap bug means the high pointer
    // byte is read from 0x8000, not 0x8100.
    let bytes: Vec<u8> = {
        let mut v = vec![0u8; 0x102];
        v[0] = 0x6C; // JMP ind
        v[1] = 0xFF;
        v[2] = 0x80;
        v
    };
    let bank = Bank::new(bytes, 0x80FE).unwrap();
    let mut db = Database::new(0x80FE);
    analyzer::seed_code(&mut db, &bank, 0x80FE);
    let ops_valid = default_ops_valid();

    let mut perms = Permissions::new();
    perms.get_mut(0x8100).readable = false; // the "wrong" high byte stays closed
    analyzer::analyze(&mut db, &bank, &ops_valid, &perms, None);
    assert!(db.is_code(0x80FE));

    let mut perms2 = Permissions::new();
    perms2.get_mut(0x8000).readable = false; // the wrapped byte closed instead
    let mut db2 = Database::new(0x80FE); // left UNKNOWN so pass 1 can still demote it
    analyzer::analyze(&mut db2, &bank, &ops_valid, &perms2, None);
    assert!(db2.is_notcode(0x80FE));
}

#[test]
fn no_analyzer_induced_code_at_non_executable_cell() {
    let bank = bank_of(&[0xEA, 0xEA, 0xEA], 0x8000);
    let mut db = Database::new(0x8000);
    let ops_valid = default_ops_valid();
    let mut perms = Permissions::new();
    perms.get_mut(0x8001).executable = false;

    analyzer::seed_code(&mut db, &bank, 0x8000);
    analyzer::analyze(&mut db, &bank, &ops_valid, &perms, None);

    assert!(!db.is_code(0x8001));
}

#[test]
fn round_trip_preserves_every_annotation() {
    let mut db = Database::new(0x8000);
    db.force_code(0x8000);
    db.force_notcode(0x8010);
    for a in 0x8011..=0x801F {
        db.force_notcode(a);
    }
    for i in 0..4u32 {
        db.set_data_type(0x8020 + (i * 2) as u16, reach6502::database::DataType::Word);
    }
    db.add_label("foo", 0x8000, 1).unwrap();
    db.add_label("arr", 0x8020, 8).unwrap();
    db.set_operand_disp(0x8005, -1);
    db.set_operand_label_policy(0x8005, LabelPolicy::None);
    db.comment(0x8000); // ensure reading an absent comment never panics
    db.set_comment_head(0x8000, "entry point".to_string());
    db.set_comment_tail(0x8001, "tail note".to_string()).unwrap();

    let script = save_script(&db);

    let mut reloaded = Database::new(0);
    apply_script(&mut reloaded, &script).unwrap();

    assert_eq!(save_script(&reloaded), script);
    assert_eq!(reloaded.org(), 0x8000);
    assert!(reloaded.is_code(0x8000));
    for a in 0x8010..=0x801F {
        assert!(reloaded.is_notcode(a));
    }
    assert_eq!(
        reloaded.data_type(0x8020),
        reach6502::database::DataType::Word
    );
    assert_eq!(
        reloaded.get_label_by_addr(0x8000, None).unwrap().name,
        "foo"
    );
    assert_eq!(reloaded.operand_hint(0x8005).disp, -1);
}

#[test]
fn save_script_is_deterministic_across_equal_databases() {
    let mut a = Database::new(0x8000);
    a.force_code(0x8000);
    a.add_label("start", 0x8000, 1).unwrap();

    let mut b = Database::new(0x8000);
    b.force_code(0x8000);
    b.add_label("start", 0x8000, 1).unwrap();

    assert_eq!(save_script(&a), save_script(&b));
}

#[test]
fn disassemble_reflects_analyzed_database() {
    let bank = bank_of(&[0xA9, 0x00, 0x60], 0x8000);
    let mut db = Database::new(0x8000);
    analyzer::seed_code(&mut db, &bank, 0x8000);
    let ops_valid = default_ops_valid();
    let perms = Permissions::new();
    analyzer::analyze(&mut db, &bank, &ops_valid, &perms, None);

    let text = format::disassemble(&db, &bank);
    assert!(text.contains("LDA #$00"));
    assert!(text.contains("RTS"));
}
