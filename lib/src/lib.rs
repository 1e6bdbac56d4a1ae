//! Rewrite compiled JVM classes so that untrusted code can run inside a shared simulation
//!
//! Classes submitted by players are rewritten before they are loaded: every class reference,
//! descriptor, and generic signature is passed through a [`sandbox::Resolver`] which enforces the
//! package allow-list and class deny-list, redirects stateful runtime classes to sandboxed
//! replacements, and moves utility classes into a private namespace.

pub mod jvm;
pub mod sandbox;
pub mod util;
