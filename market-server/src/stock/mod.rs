//! Stock reservation subsystem
//!
//! - [`ledger`] - hold / confirm / release of per-product quantities
//! - [`sweeper`] - background release of reservations past their expiry

pub mod ledger;
pub mod sweeper;

pub use sweeper::ReservationSweeper;
