/// Router Module Index
///
/// Routes are split by what they touch: `public` never reaches the store,
/// `users` is the CRUD and reporting surface over the `users` table.

/// Health endpoints.
pub mod public;

/// User CRUD, listings and age statistics.
pub mod users;
