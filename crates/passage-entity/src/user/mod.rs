//! User domain entities.

pub mod model;
pub mod role;

pub use model::{NewUser, User, normalize_email, normalize_username};
pub use role::UserRole;
