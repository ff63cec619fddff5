//! The program database: per-address analysis state plus annotations
//! (labels, data types, operand hints, comments), with an executable
//! annotation-script representation that round-trips.

pub mod comment;
pub mod hint;
pub mod label;
pub mod script;

use comment::Comment;
use hint::{LabelPolicy, OperandHint};
use label::{Label, LabelTable};

use crate::error::ReachError;

const SPACE: usize = 0x1_0000;

/// Per-address classification produced by the analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Analysis {
    Unknown,
    Code,
    Notcode,
}

/// The data type assigned to a non-code address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Byte,
    Word,
}

impl DataType {
    pub fn size(self) -> u16 {
        match self {
            DataType::Byte => 1,
            DataType::Word => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DataType::Byte => "BYTE",
            DataType::Word => "WORD",
        }
    }
}

/// The program database: `org`, the 65536-cell analysis/data-type/comment
/// arrays, the label table, and per-address operand hints.
///
/// The analyzer is the only component that mutates `analysis`, and only via
/// [`Database::change_analysis`]. Everything else (labels, comments, data
/// types, hints) is owned by plug-ins and, before analysis, the driver.
#[derive(Debug, Clone)]
pub struct Database {
    org: u16,
    analysis: Vec<Analysis>,
    data_type: Vec<DataType>,
    comments: Vec<Comment>,
    labels: LabelTable,
    hints: Vec<OperandHint>,
}

impl Database {
    pub fn new(org: u16) -> Self {
        Database {
            org,
            analysis: vec![Analysis::Unknown; SPACE],
            data_type: vec![DataType::Byte; SPACE],
            comments: vec![Comment::default(); SPACE],
            labels: LabelTable::new(),
            hints: (0..SPACE).map(|_| OperandHint::default()).collect(),
        }
    }

    pub fn org(&self) -> u16 {
        self.org
    }

    pub fn set_org(&mut self, org: u16) {
        self.org = org;
    }

    // --- analysis state -------------------------------------------------

    pub fn analysis(&self, addr: u16) -> Analysis {
        self.analysis[addr as usize]
    }

    pub fn is_unknown(&self, addr: u16) -> bool {
        self.analysis(addr) == Analysis::Unknown
    }

    pub fn is_code(&self, addr: u16) -> bool {
        self.analysis(addr) == Analysis::Code
    }

    pub fn is_notcode(&self, addr: u16) -> bool {
        self.analysis(addr) == Analysis::Notcode
    }

    /// Compare-and-set: sets `analysis[addr] = to` iff it was `from`.
    /// Returns whether the swap happened. This is the only mechanism the
    /// analyzer uses to mutate analysis state.
    pub fn change_analysis(&mut self, addr: u16, from: Analysis, to: Analysis) -> bool {
        if self.analysis[addr as usize] == from {
            self.analysis[addr as usize] = to;
            true
        } else {
            false
        }
    }

    /// Forces `analysis[addr] = Notcode` unconditionally. Used by scripts
    /// and plug-ins, never by the analyzer.
    pub fn force_notcode(&mut self, addr: u16) {
        self.analysis[addr as usize] = Analysis::Notcode;
    }

    /// Forces `analysis[addr] = Code` unconditionally.
    pub fn force_code(&mut self, addr: u16) {
        self.analysis[addr as usize] = Analysis::Code;
    }

    // --- data types -------------------------------------------------------

    pub fn data_type(&self, addr: u16) -> DataType {
        self.data_type[addr as usize]
    }

    /// Sets `addr`'s data type and unconditionally marks
    /// `[addr, addr + t.size())` as NOTCODE, overriding UNKNOWN or CODE.
    pub fn set_data_type(&mut self, addr: u16, t: DataType) {
        self.data_type[addr as usize] = t;
        let mut a = addr as u32;
        let end = addr as u32 + t.size() as u32;
        while a < end && a <= 0xFFFF {
            self.analysis[a as usize] = Analysis::Notcode;
            a += 1;
        }
    }

    // --- labels -----------------------------------------------------------

    pub fn add_label(&mut self, name: impl Into<String>, addr: u16, size: u16) -> Result<(), ReachError> {
        self.labels.add(Label::new(name, addr, size)?);
        Ok(())
    }

    pub fn remove_label(&mut self, name: &str) -> Option<Label> {
        self.labels.remove(name)
    }

    pub fn get_label(&self, name: &str) -> Option<&Label> {
        self.labels.get(name)
    }

    pub fn get_labels_by_addr(&self, addr: u16) -> Vec<&Label> {
        self.labels.labels_at(addr)
    }

    pub fn get_label_by_addr(&self, addr: u16, prefer: Option<&str>) -> Option<&Label> {
        self.labels.label_by_addr(addr, prefer)
    }

    pub fn labels(&self) -> impl Iterator<Item = &Label> {
        self.labels.labels()
    }

    pub fn clear_labels(&mut self) {
        self.labels.clear();
    }

    // --- comments -----------------------------------------------------------

    pub fn comment(&self, addr: u16) -> &Comment {
        &self.comments[addr as usize]
    }

    pub fn set_comment_head(&mut self, addr: u16, text: impl Into<String>) {
        self.comments[addr as usize].head = Some(text.into());
    }

    pub fn set_comment_tail(&mut self, addr: u16, text: impl Into<String>) -> Result<(), ReachError> {
        self.comments[addr as usize].set_tail(text)
    }

    // --- operand hints ------------------------------------------------------

    pub fn set_operand_disp(&mut self, addr: u16, disp: i32) {
        self.hints[addr as usize].disp = disp;
    }

    pub fn set_operand_label_policy(&mut self, addr: u16, policy: LabelPolicy) {
        self.hints[addr as usize].label_policy = policy;
    }

    pub fn operand_hint(&self, addr: u16) -> &OperandHint {
        &self.hints[addr as usize]
    }

    /// Shifts `operand` by the address's displacement hint to produce a
    /// "base" value. If the shifted result would fall outside `[0, 0xFFFF]`,
    /// the hint is ignored and `operand` is returned unchanged.
    pub fn get_operand_base(&self, instr_addr: u16, operand_value: u16) -> u16 {
        let disp = self.hints[instr_addr as usize].disp;
        let base = operand_value as i64 - disp as i64;
        if (0..=0xFFFF).contains(&base) {
            base as u16
        } else {
            operand_value
        }
    }

    /// Resolves a label covering `base_value`, honoring the address's
    /// label-resolution policy. `None` if the policy forbids it or no
    /// label covers the address.
    pub fn get_operand_label(&self, instr_addr: u16, base_value: u16) -> Option<&Label> {
        match &self.hints[instr_addr as usize].label_policy {
            LabelPolicy::None => None,
            LabelPolicy::Auto => self.labels.label_by_addr(base_value, None),
            LabelPolicy::Named(name) => self.labels.label_by_addr(base_value, Some(name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_analysis_is_cas() {
        let mut db = Database::new(0x8000);
        assert!(db.is_unknown(0x8000));
        assert!(db.change_analysis(0x8000, Analysis::Unknown, Analysis::Code));
        assert!(db.is_code(0x8000));
        // from no longer matches -> no-op
        assert!(!db.change_analysis(0x8000, Analysis::Unknown, Analysis::Notcode));
        assert!(db.is_code(0x8000));
    }

    #[test]
    fn set_data_type_word_marks_two_bytes_notcode() {
        let mut db = Database::new(0x8000);
        db.force_code(0x8020);
        db.set_data_type(0x8020, DataType::Word);
        assert!(db.is_notcode(0x8020));
        assert!(db.is_notcode(0x8021));
        assert_eq!(db.data_type(0x8020), DataType::Word);
        // the data type array is set only at the base address
        assert_eq!(db.data_type(0x8021), DataType::Byte);
    }

    #[test]
    fn operand_base_ignores_out_of_range_hint() {
        let mut db = Database::new(0x8000);
        db.set_operand_disp(0x8005, -1);
        assert_eq!(db.get_operand_base(0x8005, 0x0000), 0x0000); // would be -1
        assert_eq!(db.get_operand_base(0x8005, 0x1000), 0x0FFF);
    }

    #[test]
    fn operand_label_none_policy_suppresses_resolution() {
        let mut db = Database::new(0x8000);
        db.add_label("foo", 0x9000, 1).unwrap();
        db.set_operand_label_policy(0x8005, LabelPolicy::None);
        assert!(db.get_operand_label(0x8005, 0x9000).is_none());
    }

    #[test]
    fn operand_label_named_hint_used_as_prefer() {
        let mut db = Database::new(0x8000);
        db.add_label("arr", 0x9000, 4).unwrap();
        db.add_label("scalar", 0x9000, 1).unwrap();
        db.set_operand_label_policy(0x8005, LabelPolicy::Named("arr".to_string()));
        assert_eq!(db.get_operand_label(0x8005, 0x9000).unwrap().name, "arr");
    }
}
