//! Session lifecycle orchestration.

pub mod orchestrator;

pub use orchestrator::{
    ACCOUNT_DEACTIVATED, ACCOUNT_UNAVAILABLE, AuthContext, AuthOutcome, AuthSessionOrchestrator,
    LOGIN_FAILED, LoginInput, REGISTRATION_BUSY, RegisterInput,
};
