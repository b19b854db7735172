//! # Quizdesk (role-based accounts and topic flashcards)
//!
//! `quizdesk` lets visitors register, sign in under one of four roles and,
//! depending on that role, either study randomly sampled flashcards or
//! administer the user directory and the flashcard bank itself.
//!
//! ## Roles
//!
//! Roles form a closed set: `normal`, `student`, `teacher` and `admin`. At login
//! the visitor also picks a *role claim*; [`roles::reconcile_claim`] decides
//! whether the claim is compatible with the stored role and which dashboard the
//! session lands on. Every protected route checks a [`roles::Capability`]
//! against the stored role, re-read on each request.
//!
//! ## Stores
//!
//! - **Credential store** ([`credentials`]): `SQLite` tables for users and cookie
//!   sessions. Passwords are hashed with Argon2id; only a SHA-256 of the session
//!   token is persisted.
//! - **Flashcard bank** ([`bank`]): a single JSON document mapping topic names
//!   to ordered question lists. Every mutation is a load-mutate-persist cycle
//!   under one process-wide lock, persisted by write-to-temp-then-rename.
//!
//! Concurrent editors from different processes can still lose updates (last
//! writer wins); the bank is sized for a single operator.

pub mod api;
pub mod bank;
pub mod cli;
pub mod credentials;
pub mod error;
pub mod quiz;
pub mod roles;

pub use error::{Error, Result};

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
    }
}
