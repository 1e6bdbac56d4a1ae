use super::{Error, ResolutionContext, Resolver};
use crate::jvm::class_file::{
    Attribute, AttributeLike, ClassConstantIndex, ClassFile, Constant, ConstantIndex,
    ConstantsPool, Exceptions, Field, Method, Signature, Utf8ConstantIndex,
};
use crate::jvm::{FieldAccessFlags, MethodAccessFlags};
use std::collections::HashSet;

/// Symbolic parts of a class header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassHeader {
    pub name: String,
    pub super_class: Option<String>,
    pub interfaces: Vec<String>,
    pub signature: Option<String>,
}

/// Symbolic parts of a field declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldHeader {
    pub access_flags: FieldAccessFlags,
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
}

/// Symbolic parts of a method declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodHeader {
    pub access_flags: MethodAccessFlags,
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub exceptions: Vec<String>,
}

/// Resolve the class, its superclass and interfaces, and its generic signature
pub fn rewrite_header(
    resolver: &Resolver,
    header: &ClassHeader,
    ctx: &mut ResolutionContext,
) -> Result<ClassHeader, Error> {
    Ok(ClassHeader {
        name: resolver.resolve_class(&header.name, ctx)?,
        super_class: header
            .super_class
            .as_deref()
            .map(|super_class| resolver.resolve_class(super_class, ctx))
            .transpose()?,
        interfaces: header
            .interfaces
            .iter()
            .map(|interface| resolver.resolve_class(interface, ctx))
            .collect::<Result<_, _>>()?,
        signature: resolver.resolve_method_signature(header.signature.as_deref(), ctx)?,
    })
}

/// Resolve the field's types and drop `volatile`
///
/// No object is ever visible to two sandboxes, so volatility of instance fields is meaningless.
/// Static fields of trusted classes keep it unless the policy is enforced.
pub fn rewrite_field(
    resolver: &Resolver,
    field: &FieldHeader,
    ctx: &mut ResolutionContext,
) -> Result<FieldHeader, Error> {
    let mut access_flags = field.access_flags;
    if ctx.enforce_policy || !access_flags.contains(FieldAccessFlags::STATIC) {
        access_flags.remove(FieldAccessFlags::VOLATILE);
    }

    Ok(FieldHeader {
        access_flags,
        name: field.name.clone(),
        descriptor: resolver.resolve_class_descriptor(&field.descriptor, ctx)?,
        signature: resolver.resolve_field_signature(field.signature.as_deref(), ctx)?,
    })
}

/// Resolve the method's types and drop `synchronized`
///
/// Two sandboxes never hold the same receiver, so there is nothing to synchronize on.
pub fn rewrite_method(
    resolver: &Resolver,
    method: &MethodHeader,
    ctx: &mut ResolutionContext,
) -> Result<MethodHeader, Error> {
    let mut access_flags = method.access_flags;
    access_flags.remove(MethodAccessFlags::SYNCHRONIZED);

    Ok(MethodHeader {
        access_flags,
        name: method.name.clone(),
        descriptor: resolver.resolve_method_descriptor(&method.descriptor, ctx)?,
        signature: resolver.resolve_method_signature(method.signature.as_deref(), ctx)?,
        exceptions: method
            .exceptions
            .iter()
            .map(|exception| resolver.resolve_class(exception, ctx))
            .collect::<Result<_, _>>()?,
    })
}

/// Applies the resolver to every symbolic reference in a class file
///
/// Headers, fields, and methods go through [`rewrite_header`], [`rewrite_field`], and
/// [`rewrite_method`]. Afterwards, every class, name-and-type, and method type constant that
/// wasn't already handled is resolved, which covers all the references made from bytecode,
/// inner class tables, enclosing methods, and bootstrap methods.
///
/// `Utf8` constants are never modified in place since a class name might also be the contents of
/// a string literal. New strings are appended to the pool instead.
pub struct ClassRewriter<'a> {
    resolver: Resolver<'a>,
}

impl<'a> ClassRewriter<'a> {
    pub fn new(resolver: Resolver<'a>) -> ClassRewriter<'a> {
        ClassRewriter { resolver }
    }

    pub fn rewrite(
        &self,
        mut class: ClassFile,
        ctx: &mut ResolutionContext,
    ) -> Result<ClassFile, Error> {
        let mut pool = PoolEditor {
            constants: &mut class.constants,
            resolved_classes: HashSet::new(),
        };

        let header = ClassHeader {
            name: pool.constants.class_name(class.this_class)?.to_owned(),
            super_class: class
                .super_class
                .map(|super_class| pool.constants.class_name(super_class))
                .transpose()?
                .map(String::from),
            interfaces: class
                .interfaces
                .iter()
                .map(|interface| pool.constants.class_name(*interface).map(String::from))
                .collect::<Result<_, _>>()?,
            signature: pool.signature(&class.attributes)?,
        };
        let rewritten = rewrite_header(&self.resolver, &header, ctx)?;
        pool.set_class(class.this_class, &rewritten.name)?;
        if let (Some(index), Some(name)) = (class.super_class, &rewritten.super_class) {
            pool.set_class(index, name)?;
        }
        for (index, name) in class.interfaces.iter().zip(&rewritten.interfaces) {
            pool.set_class(*index, name)?;
        }
        pool.set_signature(&mut class.attributes, &header.signature, &rewritten.signature)?;

        for field in &mut class.fields {
            self.rewrite_field(&mut pool, field, ctx)?;
        }
        for method in &mut class.methods {
            self.rewrite_method(&mut pool, method, ctx)?;
        }
        self.rewrite_remaining_constants(&mut pool, ctx)?;

        Ok(class)
    }

    fn rewrite_field(
        &self,
        pool: &mut PoolEditor,
        field: &mut Field,
        ctx: &mut ResolutionContext,
    ) -> Result<(), Error> {
        let header = FieldHeader {
            access_flags: field.access_flags,
            name: pool.constants.utf8(field.name_index)?.to_owned(),
            descriptor: pool.constants.utf8(field.descriptor_index)?.to_owned(),
            signature: pool.signature(&field.attributes)?,
        };
        let rewritten = rewrite_field(&self.resolver, &header, ctx)?;

        field.access_flags = rewritten.access_flags;
        pool.set_utf8(
            &mut field.descriptor_index,
            &header.descriptor,
            &rewritten.descriptor,
        )?;
        pool.set_signature(&mut field.attributes, &header.signature, &rewritten.signature)
    }

    fn rewrite_method(
        &self,
        pool: &mut PoolEditor,
        method: &mut Method,
        ctx: &mut ResolutionContext,
    ) -> Result<(), Error> {
        let mut exception_indices = vec![];
        for attribute in &method.attributes {
            if let Some(exceptions) = attribute.decode::<Exceptions>(pool.constants)? {
                exception_indices.extend(exceptions.exceptions);
            }
        }

        let header = MethodHeader {
            access_flags: method.access_flags,
            name: pool.constants.utf8(method.name_index)?.to_owned(),
            descriptor: pool.constants.utf8(method.descriptor_index)?.to_owned(),
            signature: pool.signature(&method.attributes)?,
            exceptions: exception_indices
                .iter()
                .map(|exception| pool.constants.class_name(*exception).map(String::from))
                .collect::<Result<_, _>>()?,
        };
        let rewritten = rewrite_method(&self.resolver, &header, ctx)?;

        method.access_flags = rewritten.access_flags;
        pool.set_utf8(
            &mut method.descriptor_index,
            &header.descriptor,
            &rewritten.descriptor,
        )?;
        pool.set_signature(&mut method.attributes, &header.signature, &rewritten.signature)?;
        for (index, name) in exception_indices.iter().zip(&rewritten.exceptions) {
            pool.set_class(*index, name)?;
        }
        Ok(())
    }

    /// Resolve the constants that no header, field, or method accounted for
    fn rewrite_remaining_constants(
        &self,
        pool: &mut PoolEditor,
        ctx: &mut ResolutionContext,
    ) -> Result<(), Error> {
        let symbolic: Vec<(ConstantIndex, Constant)> = pool
            .constants
            .iter()
            .filter(|(_, _, constant)| {
                matches!(
                    constant,
                    Constant::Class(_) | Constant::NameAndType { .. } | Constant::MethodType { .. }
                )
            })
            .map(|(offset, _, constant)| (ConstantIndex(offset.0 as u16), constant.clone()))
            .collect();

        for (index, constant) in symbolic {
            match constant {
                Constant::Class(name) => {
                    if pool.resolved_classes.contains(&index) {
                        continue;
                    }
                    let name = pool.constants.utf8(name)?.to_owned();
                    let resolved = self.resolver.resolve_class(&name, ctx)?;
                    if resolved != name {
                        let resolved = pool.constants.get_utf8(resolved)?;
                        pool.constants.replace(index, Constant::Class(resolved))?;
                    }
                }

                // Method descriptors for methods, field descriptors for fields and dynamic
                // constants
                Constant::NameAndType {
                    name,
                    mut descriptor,
                } => {
                    let old = pool.constants.utf8(descriptor)?.to_owned();
                    let new = if old.starts_with('(') {
                        self.resolver.resolve_method_descriptor(&old, ctx)?
                    } else {
                        self.resolver.resolve_class_descriptor(&old, ctx)?
                    };
                    if pool.set_utf8(&mut descriptor, &old, &new)? {
                        let constant = Constant::NameAndType { name, descriptor };
                        pool.constants.replace(index, constant)?;
                    }
                }

                Constant::MethodType { mut descriptor } => {
                    let old = pool.constants.utf8(descriptor)?.to_owned();
                    let new = self.resolver.resolve_method_descriptor(&old, ctx)?;
                    if pool.set_utf8(&mut descriptor, &old, &new)? {
                        pool.constants
                            .replace(index, Constant::MethodType { descriptor })?;
                    }
                }

                _ => (),
            }
        }
        Ok(())
    }
}

/// Constant pool being rewritten, and which class constants are already done
struct PoolEditor<'p> {
    constants: &'p mut ConstantsPool,
    resolved_classes: HashSet<ConstantIndex>,
}

impl<'p> PoolEditor<'p> {
    /// Contents of the first `Signature` attribute, if there is one
    fn signature(&self, attributes: &[Attribute]) -> Result<Option<String>, Error> {
        for attribute in attributes {
            if let Some(signature) = attribute.decode::<Signature>(self.constants)? {
                let signature = self.constants.utf8(signature.signature)?;
                return Ok(Some(signature.to_owned()));
            }
        }
        Ok(None)
    }

    /// Point a class constant at a resolved name
    ///
    /// The same constant can be reached several ways (eg. an interface that is also thrown), but
    /// only the first resolution counts.
    fn set_class(&mut self, index: ClassConstantIndex, resolved: &str) -> Result<(), Error> {
        let index = ConstantIndex::from(index);
        if !self.resolved_classes.insert(index) {
            return Ok(());
        }
        let current = match self.constants.get(index)? {
            Constant::Class(name) => *name,
            other => {
                return Err(crate::jvm::Error::UnexpectedConstant {
                    index,
                    expected: "Class",
                    found: other.clone(),
                }
                .into())
            }
        };
        if self.constants.utf8(current)? != resolved {
            let resolved = self.constants.get_utf8(resolved)?;
            self.constants.replace(index, Constant::Class(resolved))?;
        }
        Ok(())
    }

    /// Point a string reference at the new string, if it changed
    fn set_utf8(
        &mut self,
        index: &mut Utf8ConstantIndex,
        old: &str,
        new: &str,
    ) -> Result<bool, Error> {
        if old == new {
            return Ok(false);
        }
        *index = self.constants.get_utf8(new)?;
        Ok(true)
    }

    /// Swap out the `Signature` attribute if the signature changed, or drop it if it was rejected
    fn set_signature(
        &mut self,
        attributes: &mut Vec<Attribute>,
        old: &Option<String>,
        new: &Option<String>,
    ) -> Result<(), Error> {
        if old == new {
            return Ok(());
        }
        let mut position = None;
        for (i, attribute) in attributes.iter().enumerate() {
            if self.constants.utf8(attribute.name_index)? == Signature::NAME {
                position = Some(i);
                break;
            }
        }
        let position = match position {
            Some(position) => position,
            None => return Ok(()),
        };

        match new {
            Some(new) => {
                let signature = Signature {
                    signature: self.constants.get_utf8(new.as_str())?,
                };
                attributes[position] = self.constants.get_attribute(signature)?;
            }
            None => {
                attributes.remove(position);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::BinaryName;
    use crate::jvm::Name;
    use crate::sandbox::{PolicyStore, Settings};

    fn context(enforce_policy: bool) -> ResolutionContext {
        let mut ctx = ResolutionContext::new(BinaryName::from_string("team1".into()).unwrap());
        ctx.enforce_policy = enforce_policy;
        ctx
    }

    #[test]
    fn field_flags() {
        let settings = Settings::new().unwrap();
        let policy = PolicyStore::from_lines(vec!["java/util"], vec![]);
        let resolver = Resolver::new(&settings, &policy);

        let field = FieldHeader {
            access_flags: FieldAccessFlags::PRIVATE | FieldAccessFlags::VOLATILE,
            name: String::from("cache"),
            descriptor: String::from("Ljava/util/Map;"),
            signature: Some(String::from("Ljava/util/Map<TK;TV;>;")),
        };
        let rewritten = rewrite_field(&resolver, &field, &mut context(true)).unwrap();
        assert_eq!(rewritten.access_flags, FieldAccessFlags::PRIVATE);
        assert_eq!(rewritten.name, "cache");
        assert_eq!(rewritten.descriptor, "Lsandboxed/java/util/Map;");
        assert_eq!(
            rewritten.signature.as_deref(),
            Some("Lsandboxed/java/util/Map<TK;TV;>;")
        );

        let static_field = FieldHeader {
            access_flags: FieldAccessFlags::STATIC | FieldAccessFlags::VOLATILE,
            signature: None,
            ..field
        };
        let trusted = rewrite_field(&resolver, &static_field, &mut context(false)).unwrap();
        assert!(trusted.access_flags.contains(FieldAccessFlags::VOLATILE));
        let enforced = rewrite_field(&resolver, &static_field, &mut context(true)).unwrap();
        assert!(!enforced.access_flags.contains(FieldAccessFlags::VOLATILE));
    }

    #[test]
    fn method_flags() {
        let settings = Settings::new().unwrap();
        let policy = PolicyStore::from_lines(vec!["java/util", "java/io"], vec![]);
        let resolver = Resolver::new(&settings, &policy);

        let method = MethodHeader {
            access_flags: MethodAccessFlags::PUBLIC | MethodAccessFlags::SYNCHRONIZED,
            name: String::from("drain"),
            descriptor: String::from("(Ljava/util/List;I)V"),
            signature: None,
            exceptions: vec![String::from("java/io/IOException")],
        };
        let rewritten = rewrite_method(&resolver, &method, &mut context(true)).unwrap();
        assert_eq!(rewritten.access_flags, MethodAccessFlags::PUBLIC);
        assert_eq!(rewritten.descriptor, "(Lsandboxed/java/util/List;I)V");
        assert_eq!(rewritten.signature, None);
        assert_eq!(rewritten.exceptions, vec!["java/io/IOException"]);
    }

    #[test]
    fn header() {
        let settings = Settings::new().unwrap();
        let policy = PolicyStore::from_lines(vec!["java/util", "java/lang"], vec![]);
        let resolver = Resolver::new(&settings, &policy);

        let header = ClassHeader {
            name: String::from("team1/Squad"),
            super_class: Some(String::from("java/util/AbstractList")),
            interfaces: vec![String::from("java/lang/Runnable")],
            signature: Some(String::from(
                "Ljava/util/AbstractList<Lteam1/Unit;>;Ljava/lang/Runnable;",
            )),
        };
        let rewritten = rewrite_header(&resolver, &header, &mut context(true)).unwrap();
        assert_eq!(rewritten.name, "team1/Squad");
        assert_eq!(
            rewritten.super_class.as_deref(),
            Some("sandboxed/java/util/AbstractList")
        );
        assert_eq!(rewritten.interfaces, vec!["java/lang/Runnable"]);
        assert_eq!(
            rewritten.signature.as_deref(),
            Some("Lsandboxed/java/util/AbstractList<Lteam1/Unit;>;Ljava/lang/Runnable;")
        );
    }
}
