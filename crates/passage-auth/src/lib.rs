//! # passage-auth
//!
//! Session-credential lifecycle and the coordination primitives that keep
//! account creation correct across processes.
//!
//! ## Modules
//!
//! - `credential`: signing, verification, and rotation of access/refresh credentials
//! - `revocation`: deny-list of credential ids, self-expiring at credential expiry
//! - `lock`: owner-checked leases with deterministic multi-key acquisition
//! - `idempotency`: registration replay stamps
//! - `rate_limit`: fixed-window request admission
//! - `policy`: username and password rules
//! - `session`: the orchestrator tying the above to the user directory

pub mod credential;
pub mod idempotency;
pub mod lock;
pub mod policy;
pub mod rate_limit;
pub mod revocation;
pub mod session;

pub use credential::{Claims, CredentialService, TokenPair, TokenType};
pub use idempotency::{IdempotencyCache, IdempotencyStamp};
pub use lock::{DistributedLock, Lease, LeaseSet, LockOutcome};
pub use rate_limit::{Admission, RateLimiter};
pub use revocation::RevocationRegistry;
pub use session::{
    AuthContext, AuthOutcome, AuthSessionOrchestrator, LoginInput, RegisterInput,
};
