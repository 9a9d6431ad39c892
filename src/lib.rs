//! Frame synchronization and decoding core for digital voice radio protocols (P25 Phase 1,
//! DMR, D-Star, NXDN, dPMR, YSF, X2-TDMA, ProVoice).
//!
//! The decoder consumes one demodulated dibit at a time and produces decoded frame fields
//! along with opaque voice codec frames meant for an external vocoder.

extern crate binfield_matrix;
extern crate collect_slice;
extern crate num;
extern crate thiserror;

#[macro_use]
extern crate lazy_static;

#[macro_use]
extern crate log;

#[cfg(feature = "ser")]
#[macro_use]
extern crate serde_derive;

mod buffer;

pub mod bits;
pub mod coding;
pub mod config;
pub mod decoder;
pub mod dmr;
pub mod dpmr;
pub mod dstar;
pub mod error;
pub mod nxdn;
pub mod p25;
pub mod session;
pub mod stats;
pub mod sync;
pub mod ysf;

pub use crate::config::{Config, DataRate, DecodeMode};
pub use crate::decoder::{Decoder, Event, FsmState};
pub use crate::error::{DecodeError, Result};
pub use crate::session::{Session, Snapshot};
pub use crate::sync::SyncType;
