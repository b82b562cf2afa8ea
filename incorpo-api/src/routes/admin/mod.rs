/// Admin back-office endpoints; every route here sits behind the admin guard
///
/// - `stats`: Read-only aggregates over a `period`
/// - `users`: User listing, role and activation toggles

pub mod stats;
pub mod users;
