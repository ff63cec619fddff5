//! Seeds CODE/NOTCODE from an FCEUX "Code/Data Logger" trace.
//!
//! FCEUX's CDL format doesn't distinguish opcode bytes from operand bytes,
//! so the best this can do is promote the first byte of each code run to
//! CODE and let the analyzer's own reachability logic fill in the rest.

use anyhow::ensure;

use crate::bank::Bank;
use crate::database::{Analysis, Database};
use crate::perm::Permissions;
use crate::plugin::Plugin;

const FLAG_CODE: u8 = 1 << 0;
const FLAG_DATA: u8 = 1 << 1;
const FLAG_CODE_IND: u8 = 1 << 4;
const FLAG_DATA_IND: u8 = 1 << 5;
const FLAG_PCM: u8 = 1 << 6;

/// `cdl` must cover exactly the bank's address range, byte for byte.
///
/// `aggressive`, if set, additionally demotes UNKNOWN bytes the log marks
/// purely as data (including DPCM samples) to NOTCODE. This can misfire: a
/// byte the log only ever saw used as data might still be code reachable by
/// a path the logging run never took.
pub struct CdlFceux {
    cdl: Vec<u8>,
    aggressive: bool,
}

impl CdlFceux {
    pub fn new(cdl: Vec<u8>, aggressive: bool) -> Self {
        CdlFceux { cdl, aggressive }
    }
}

impl Plugin for CdlFceux {
    fn update_db(&self, bank: &Bank, db: &mut Database) -> anyhow::Result<()> {
        ensure!(
            self.cdl.len() == bank.len(),
            "cdl_fceux: log length {} does not match bank length {}",
            self.cdl.len(),
            bank.len()
        );

        let mut in_code = false;
        let mut in_code_ind = false;
        for (i, &b) in self.cdl.iter().enumerate() {
            let addr = bank.org().wrapping_add(i as u16);
            let code = b & FLAG_CODE != 0;
            let data = b & FLAG_DATA != 0;
            let code_ind = b & FLAG_CODE_IND != 0;
            let data_ind = b & FLAG_DATA_IND != 0;
            let pcm = b & FLAG_PCM != 0;

            if self.aggressive && !code && !code_ind && (data || data_ind || pcm) {
                db.change_analysis(addr, Analysis::Unknown, Analysis::Notcode);
            }

            if code {
                if !in_code {
                    db.change_analysis(addr, Analysis::Unknown, Analysis::Code);
                }
                in_code = true;
            } else {
                in_code = false;
            }

            if code_ind {
                if !in_code_ind {
                    db.change_analysis(addr, Analysis::Unknown, Analysis::Code);
                }
                in_code_ind = true;
            } else {
                in_code_ind = false;
            }
        }

        Ok(())
    }

    fn update_perms(&self, _bank: &Bank, _db: &Database, _perms: &mut Permissions) -> anyhow::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::run_plugin;

    #[test]
    fn marks_code_run_starts() {
        let bank = Bank::new(vec![0xA9, 0x00, 0x60, 0xFF], 0x8000).unwrap();
        let cdl = vec![FLAG_CODE, FLAG_CODE, FLAG_CODE, FLAG_DATA];
        let mut db = Database::new(0x8000);
        let mut ops_valid = crate::plugin::default_ops_valid();
        run_plugin(&CdlFceux::new(cdl, false), &bank, &mut db, &mut ops_valid).unwrap();
        assert!(db.is_code(0x8000));
        assert!(db.is_unknown(0x8003)); // non-aggressive leaves plain data alone
    }

    #[test]
    fn aggressive_mode_demotes_data_bytes() {
        let bank = Bank::new(vec![0xA9, 0x00, 0x60, 0xFF], 0x8000).unwrap();
        let cdl = vec![FLAG_CODE, FLAG_CODE, FLAG_CODE, FLAG_DATA];
        let mut db = Database::new(0x8000);
        let mut ops_valid = crate::plugin::default_ops_valid();
        run_plugin(&CdlFceux::new(cdl, true), &bank, &mut db, &mut ops_valid).unwrap();
        assert!(db.is_notcode(0x8003));
    }

    #[test]
    fn rejects_mismatched_length() {
        let bank = Bank::new(vec![0; 4], 0x8000).unwrap();
        let mut db = Database::new(0x8000);
        let mut ops_valid = crate::plugin::default_ops_valid();
        assert!(run_plugin(&CdlFceux::new(vec![0; 3], false), &bank, &mut db, &mut ops_valid).is_err());
    }
}
