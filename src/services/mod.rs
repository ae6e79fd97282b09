//! Business operations behind the HTTP handlers. Handlers parse and shape
//! payloads; everything that reads or writes the store goes through here.

pub mod auth;
pub mod bookings;
