#![forbid(unsafe_code)]

//! A static reachability disassembler for the MOS 6502: classify every byte
//! of a binary image as CODE or NOTCODE by tracing control flow from known
//! entry points, and record the result in an annotatable, script-
//! serializable program database.

pub mod analyzer;
pub mod bank;
pub mod database;
pub mod error;
pub mod format;
pub mod interrupt;
pub mod opcode;
pub mod perm;
pub mod plugin;
pub mod plugins;
pub mod util;
