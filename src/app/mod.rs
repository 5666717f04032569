//! Application module
//!
//! This module contains the crop session logic, kept free of any GTK
//! types so it can be tested without a display.

mod session;

pub use session::{CropRect, CropSession, ExportReport, PendingRect, SessionError, SessionResult};
