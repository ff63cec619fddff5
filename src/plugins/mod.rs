//! Built-in plug-ins. Each implements [`crate::plugin::Plugin`] directly;
//! none need the dynamic-library loading path that a driver would use to
//! load a third-party plug-in — that mechanism is out of scope here, only
//! its contract (`Plugin`) is.

pub mod all_ops;
pub mod cdl_fceux;
pub mod nes;
pub mod nes_mapper0;
pub mod nes_minimal;
