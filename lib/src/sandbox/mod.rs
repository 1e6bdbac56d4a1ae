//! Rewriting class references made by untrusted code
//!
//! Every class a sandbox mentions goes through a [`Resolver`], which either keeps the name,
//! redirects it to a substitute (a private copy under `sandboxed/`, or a replacement in the
//! runtime's `lang` package), or flags it as a policy violation. [`ClassRewriter`] applies the
//! resolver to a whole class file. [`MethodCosts`] answers how much calling a trusted method
//! costs, looking through supertypes via a [`HierarchyCache`].
//!
//! ### Example
//!
//! ```
//! use classjail::jvm::{BinaryName, Name};
//! use classjail::sandbox::*;
//!
//! # fn main() -> Result<(), Error> {
//! let settings = Settings::new()?;
//! let policy = PolicyStore::from_lines(vec!["java/util"], vec!["java/util/Random"]);
//! let resolver = Resolver::new(&settings, &policy);
//!
//! let team = BinaryName::from_string(String::from("team1")).map_err(Error::MalformedName)?;
//! let mut ctx = ResolutionContext::new(team);
//! assert_eq!(
//!     resolver.resolve_class("java/util/ArrayList", &mut ctx)?,
//!     "sandboxed/java/util/ArrayList"
//! );
//! assert!(resolver.resolve_class("java/util/Random", &mut ctx).is_err());
//! # Ok(())
//! # }
//! ```

mod costs;
mod diagnostics;
mod errors;
mod hierarchy;
mod policy;
mod resolver;
mod rewriter;
mod settings;

pub use costs::*;
pub use diagnostics::*;
pub use errors::*;
pub use hierarchy::*;
pub use policy::*;
pub use resolver::*;
pub use rewriter::*;
pub use settings::*;
