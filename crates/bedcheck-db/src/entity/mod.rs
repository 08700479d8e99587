//! database entity models for sea-orm.
//!
//! these entities map to database tables and handle conversion
//! between database rows and the domain types in bedcheck-types.

pub mod checkin_record;
pub mod device_binding;
pub mod resident;
