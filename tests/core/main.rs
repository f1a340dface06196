#[path = "../common/mod.rs"]
mod common;

mod printing;
mod sanitize_invariants;
mod scenarios;
mod serialization;
mod wrap_precedence;
