//! Read, inspect, and write JVM classes
//!
//! Only the parts of the class file format needed for rewriting symbolic references are modelled
//! in detail: the constant pool, the class header, fields and methods, and the `Signature`
//! and `Exceptions` attributes. Every other attribute (including method bodies) is carried along
//! as opaque bytes. Class references those attributes make through `Class`, `NameAndType`, or
//! `MethodType` constants still get rewritten with the pool. Attributes that name classes directly
//! inside `Utf8` descriptors (annotations, `LocalVariableTypeTable`, `Record` components) are
//! left as they are.
//!
//! ### Example
//!
//! ```
//! use classjail::jvm::class_file::ClassFile;
//! use classjail::jvm::*;
//!
//! # fn inspect(bytes: &[u8]) -> Result<(), Error> {
//! let class_file = ClassFile::parse(bytes)?;
//! println!("{} extends {:?}", class_file.this_class_name()?, class_file.super_class_name()?);
//! for interface in class_file.interface_names()? {
//!     println!("  implements {}", interface);
//! }
//! # Ok(())
//! # }
//! ```

mod access_flags;
pub mod class_file;
mod descriptors;
mod errors;
mod names;
mod signatures;

pub use access_flags::*;
pub use descriptors::*;
pub use errors::*;
pub use names::*;
pub use signatures::*;
