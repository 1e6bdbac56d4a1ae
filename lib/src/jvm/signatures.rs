//! Generic signatures
//!
//! Signatures are optional metadata (the `Signature` attribute) carrying the generic type
//! information that erased descriptors lose. The grammar is described in [section 4.7.9.1][0].
//!
//! Parsing followed by rendering reproduces the input exactly, so a signature can be rewritten
//! by parsing it, mapping the class names it mentions, and rendering it again.
//!
//! [0]: https://docs.oracle.com/javase/specs/jvms/se17/html/jvms-4.html#jvms-4.7.9.1

use super::{BaseType, ParseDescriptor, RenderDescriptor};
use std::io::{Error, ErrorKind, Result};
use std::iter::Peekable;
use std::str::Chars;

/// Any JVM type signature
#[derive(PartialEq, Eq, Hash, Debug, Clone)]
pub enum JavaTypeSignature {
    Base(BaseType),
    Reference(ReferenceTypeSignature),
}

impl RenderDescriptor for JavaTypeSignature {
    fn render_to(&self, write_to: &mut String) {
        match self {
            JavaTypeSignature::Base(typ) => typ.render_to(write_to),
            JavaTypeSignature::Reference(typ) => typ.render_to(write_to),
        }
    }
}

impl ParseDescriptor for JavaTypeSignature {
    fn parse_from(source: &mut Peekable<Chars>) -> Result<Self> {
        match source.peek().copied() {
            Some('L' | 'T' | '[') => {
                let sig = ReferenceTypeSignature::parse_from(source)?;
                Ok(JavaTypeSignature::Reference(sig))
            }
            _ => {
                let base = BaseType::parse_from(source)?;
                Ok(JavaTypeSignature::Base(base))
            }
        }
    }
}

/// Signature for a reference type
#[derive(PartialEq, Eq, Hash, Debug, Clone)]
pub enum ReferenceTypeSignature {
    Class(ClassTypeSignature),
    TypeVariable(String),
    Array(Box<JavaTypeSignature>),
}

impl RenderDescriptor for ReferenceTypeSignature {
    fn render_to(&self, write_to: &mut String) {
        match self {
            ReferenceTypeSignature::Class(class) => class.render_to(write_to),
            ReferenceTypeSignature::TypeVariable(ty_var) => {
                write_to.push('T');
                write_to.push_str(ty_var);
                write_to.push(';');
            }
            ReferenceTypeSignature::Array(sig) => {
                write_to.push('[');
                sig.render_to(write_to);
            }
        }
    }
}

impl ParseDescriptor for ReferenceTypeSignature {
    fn parse_from(source: &mut Peekable<Chars>) -> Result<Self> {
        let sig = match source.peek() {
            Some('L') => {
                let class = ClassTypeSignature::parse_from(source)?;
                ReferenceTypeSignature::Class(class)
            }
            Some('T') => {
                let _ = source.next();
                let name = parse_identifier(source, &[';'])?;
                expect_char(source, ';')?;
                ReferenceTypeSignature::TypeVariable(name)
            }
            Some('[') => {
                let _ = source.next();
                let sig = JavaTypeSignature::parse_from(source)?;
                ReferenceTypeSignature::Array(Box::new(sig))
            }
            Some(c) => {
                let msg = format!("Invalid start to reference type: {}", c);
                return Err(Error::new(ErrorKind::InvalidInput, msg));
            }
            None => {
                let msg = "Expected reference type";
                return Err(Error::new(ErrorKind::UnexpectedEof, msg));
            }
        };
        Ok(sig)
    }
}

/// Type signature for a class or an interface
///
/// `Ljava/util/Map<TK;TV;>.Entry<TK;TV;>;` has `java/util/Map<TK;TV;>` as its class and one
/// projection, `Entry<TK;TV;>`.
#[derive(PartialEq, Eq, Hash, Debug, Clone)]
pub struct ClassTypeSignature {
    /// Outermost class, with its full binary name (eg. `java/util/Map`)
    pub class: SimpleClassTypeSignature,

    /// Nested classes selected with `.`, each named relative to the one before
    pub projections: Vec<SimpleClassTypeSignature>,
}

impl RenderDescriptor for ClassTypeSignature {
    fn render_to(&self, write_to: &mut String) {
        write_to.push('L');
        self.class.render_to(write_to);
        for projection in &self.projections {
            write_to.push('.');
            projection.render_to(write_to);
        }
        write_to.push(';')
    }
}

impl ParseDescriptor for ClassTypeSignature {
    fn parse_from(source: &mut Peekable<Chars>) -> Result<Self> {
        expect_char(source, 'L')?;
        let class = SimpleClassTypeSignature::parse_from(source)?;

        let mut projections = vec![];
        while source.next_if_eq(&'.').is_some() {
            projections.push(SimpleClassTypeSignature::parse_from(source)?);
        }

        expect_char(source, ';')?;
        Ok(ClassTypeSignature { class, projections })
    }
}

/// Class name followed by optional type arguments
#[derive(PartialEq, Eq, Hash, Debug, Clone)]
pub struct SimpleClassTypeSignature {
    pub name: String,
    pub arguments: Vec<TypeArgument>,
}

impl RenderDescriptor for SimpleClassTypeSignature {
    fn render_to(&self, write_to: &mut String) {
        write_to.push_str(&self.name);
        if !self.arguments.is_empty() {
            write_to.push('<');
            for argument in &self.arguments {
                argument.render_to(write_to);
            }
            write_to.push('>');
        }
    }
}

impl ParseDescriptor for SimpleClassTypeSignature {
    fn parse_from(source: &mut Peekable<Chars>) -> Result<Self> {
        let name = parse_identifier(source, &['<', '.', ';'])?;
        if name.split('/').any(str::is_empty) {
            let msg = format!("Invalid class name in signature: '{}'", name);
            return Err(Error::new(ErrorKind::InvalidInput, msg));
        }

        let mut arguments = vec![];
        if source.next_if_eq(&'<').is_some() {
            while source.next_if_eq(&'>').is_none() {
                arguments.push(TypeArgument::parse_from(source)?);
            }
            if arguments.is_empty() {
                let msg = format!("Empty type argument list for '{}'", name);
                return Err(Error::new(ErrorKind::InvalidInput, msg));
            }
        }
        Ok(SimpleClassTypeSignature { name, arguments })
    }
}

/// Type argument (needed to complete signatures for generic classes)
#[derive(PartialEq, Eq, Hash, Debug, Clone)]
pub enum TypeArgument {
    Concrete(Option<WildcardIndicator>, ReferenceTypeSignature),
    Wildcard,
}

impl RenderDescriptor for TypeArgument {
    fn render_to(&self, write_to: &mut String) {
        match self {
            TypeArgument::Wildcard => write_to.push('*'),
            TypeArgument::Concrete(indicator, reference_type) => {
                if let Some(indicator) = indicator {
                    write_to.push(match indicator {
                        WildcardIndicator::Plus => '+',
                        WildcardIndicator::Minus => '-',
                    });
                }
                reference_type.render_to(write_to);
            }
        };
    }
}

impl ParseDescriptor for TypeArgument {
    fn parse_from(source: &mut Peekable<Chars>) -> Result<Self> {
        let ty_arg = match source.peek().copied() {
            Some('*') => {
                let _ = source.next();
                TypeArgument::Wildcard
            }
            Some('+') => {
                let _ = source.next();
                let ref_type = ReferenceTypeSignature::parse_from(source)?;
                TypeArgument::Concrete(Some(WildcardIndicator::Plus), ref_type)
            }
            Some('-') => {
                let _ = source.next();
                let ref_type = ReferenceTypeSignature::parse_from(source)?;
                TypeArgument::Concrete(Some(WildcardIndicator::Minus), ref_type)
            }
            _ => {
                let ref_type = ReferenceTypeSignature::parse_from(source)?;
                TypeArgument::Concrete(None, ref_type)
            }
        };
        Ok(ty_arg)
    }
}

/// Bound on a wildcard: `? extends T` is `+`, `? super T` is `-`
#[derive(Copy, PartialEq, Eq, Hash, Debug, Clone)]
pub enum WildcardIndicator {
    Plus,
    Minus,
}

/// Type parameter declaration, like `T extends Comparable<T>`
///
/// The class bound is optional because interfaces bounds alone are written as `T::Lfoo;`.
#[derive(PartialEq, Eq, Hash, Debug, Clone)]
pub struct TypeParameter {
    pub name: String,
    pub class_bound: Option<ReferenceTypeSignature>,
    pub interface_bounds: Vec<ReferenceTypeSignature>,
}

impl RenderDescriptor for TypeParameter {
    fn render_to(&self, write_to: &mut String) {
        write_to.push_str(&self.name);
        write_to.push(':');
        if let Some(class_bound) = &self.class_bound {
            class_bound.render_to(write_to);
        }
        for interface_bound in &self.interface_bounds {
            write_to.push(':');
            interface_bound.render_to(write_to);
        }
    }
}

impl ParseDescriptor for TypeParameter {
    fn parse_from(source: &mut Peekable<Chars>) -> Result<Self> {
        let name = parse_identifier(source, &[':'])?;
        expect_char(source, ':')?;
        let class_bound = match source.peek().copied() {
            Some('L' | 'T' | '[') => Some(ReferenceTypeSignature::parse_from(source)?),
            _ => None,
        };
        let mut interface_bounds = vec![];
        while source.next_if_eq(&':').is_some() {
            interface_bounds.push(ReferenceTypeSignature::parse_from(source)?);
        }
        Ok(TypeParameter {
            name,
            class_bound,
            interface_bounds,
        })
    }
}

/// Signature of a generic class or interface
#[derive(PartialEq, Eq, Hash, Debug, Clone)]
pub struct ClassSignature {
    pub type_parameters: Vec<TypeParameter>,
    pub superclass: ClassTypeSignature,
    pub superinterfaces: Vec<ClassTypeSignature>,
}

impl RenderDescriptor for ClassSignature {
    fn render_to(&self, write_to: &mut String) {
        render_type_parameters(&self.type_parameters, write_to);
        self.superclass.render_to(write_to);
        for superinterface in &self.superinterfaces {
            superinterface.render_to(write_to);
        }
    }
}

impl ParseDescriptor for ClassSignature {
    fn parse_from(source: &mut Peekable<Chars>) -> Result<Self> {
        let type_parameters = parse_type_parameters(source)?;
        ClassSignature::parse_after_type_parameters(type_parameters, source)
    }
}

impl ClassSignature {
    fn parse_after_type_parameters(
        type_parameters: Vec<TypeParameter>,
        source: &mut Peekable<Chars>,
    ) -> Result<Self> {
        let superclass = ClassTypeSignature::parse_from(source)?;
        let mut superinterfaces = vec![];
        while source.peek().is_some() {
            superinterfaces.push(ClassTypeSignature::parse_from(source)?);
        }
        Ok(ClassSignature {
            type_parameters,
            superclass,
            superinterfaces,
        })
    }
}

/// Signature of a generic method
#[derive(PartialEq, Eq, Hash, Debug, Clone)]
pub struct MethodSignature {
    pub type_parameters: Vec<TypeParameter>,
    pub parameters: Vec<JavaTypeSignature>,
    pub result: Option<JavaTypeSignature>, // `None` is for `void`
    pub throws: Vec<ReferenceTypeSignature>,
}

impl RenderDescriptor for MethodSignature {
    fn render_to(&self, write_to: &mut String) {
        render_type_parameters(&self.type_parameters, write_to);
        write_to.push('(');
        for parameter in &self.parameters {
            parameter.render_to(write_to);
        }
        write_to.push(')');
        match &self.result {
            None => write_to.push('V'),
            Some(result) => result.render_to(write_to),
        }
        for throws in &self.throws {
            write_to.push('^');
            throws.render_to(write_to);
        }
    }
}

impl ParseDescriptor for MethodSignature {
    fn parse_from(source: &mut Peekable<Chars>) -> Result<Self> {
        let type_parameters = parse_type_parameters(source)?;
        MethodSignature::parse_after_type_parameters(type_parameters, source)
    }
}

impl MethodSignature {
    fn parse_after_type_parameters(
        type_parameters: Vec<TypeParameter>,
        source: &mut Peekable<Chars>,
    ) -> Result<Self> {
        expect_char(source, '(')?;
        let mut parameters = vec![];
        while source.next_if_eq(&')').is_none() {
            parameters.push(JavaTypeSignature::parse_from(source)?);
        }

        let result = if source.next_if_eq(&'V').is_some() {
            None
        } else {
            Some(JavaTypeSignature::parse_from(source)?)
        };

        let mut throws = vec![];
        while source.next_if_eq(&'^').is_some() {
            match ReferenceTypeSignature::parse_from(source)? {
                ReferenceTypeSignature::Array(_) => {
                    let msg = "Thrown type cannot be an array";
                    return Err(Error::new(ErrorKind::InvalidInput, msg));
                }
                thrown => throws.push(thrown),
            }
        }

        Ok(MethodSignature {
            type_parameters,
            parameters,
            result,
            throws,
        })
    }
}

/// Either a class signature or a method signature
///
/// The two can only be told apart after the (shared) type parameters, by whether a `(` follows.
#[derive(PartialEq, Eq, Hash, Debug, Clone)]
pub enum GenericSignature {
    Class(ClassSignature),
    Method(MethodSignature),
}

impl RenderDescriptor for GenericSignature {
    fn render_to(&self, write_to: &mut String) {
        match self {
            GenericSignature::Class(class) => class.render_to(write_to),
            GenericSignature::Method(method) => method.render_to(write_to),
        }
    }
}

impl ParseDescriptor for GenericSignature {
    fn parse_from(source: &mut Peekable<Chars>) -> Result<Self> {
        let type_parameters = parse_type_parameters(source)?;
        if let Some('(') = source.peek() {
            MethodSignature::parse_after_type_parameters(type_parameters, source)
                .map(GenericSignature::Method)
        } else {
            ClassSignature::parse_after_type_parameters(type_parameters, source)
                .map(GenericSignature::Class)
        }
    }
}

/// Rewrite every class name mentioned in a signature
///
/// Nested class projections are named relative to their outer class, so `map_class` is called on
/// the full name (eg. `java/util/Map$Entry`) and the projection keeps the part of the result after
/// the mapped outer name and `$`. If the mapped name no longer extends the mapped outer name, the
/// original simple name is kept.
pub trait MapClassNames {
    fn map_class_names<E>(
        &mut self,
        map_class: &mut impl FnMut(&str) -> std::result::Result<String, E>,
    ) -> std::result::Result<(), E>;
}

impl MapClassNames for JavaTypeSignature {
    fn map_class_names<E>(
        &mut self,
        map_class: &mut impl FnMut(&str) -> std::result::Result<String, E>,
    ) -> std::result::Result<(), E> {
        match self {
            JavaTypeSignature::Base(_) => Ok(()),
            JavaTypeSignature::Reference(reference) => reference.map_class_names(map_class),
        }
    }
}

impl MapClassNames for ReferenceTypeSignature {
    fn map_class_names<E>(
        &mut self,
        map_class: &mut impl FnMut(&str) -> std::result::Result<String, E>,
    ) -> std::result::Result<(), E> {
        match self {
            ReferenceTypeSignature::Class(class) => class.map_class_names(map_class),
            ReferenceTypeSignature::TypeVariable(_) => Ok(()),
            ReferenceTypeSignature::Array(element) => element.map_class_names(map_class),
        }
    }
}

impl MapClassNames for ClassTypeSignature {
    fn map_class_names<E>(
        &mut self,
        map_class: &mut impl FnMut(&str) -> std::result::Result<String, E>,
    ) -> std::result::Result<(), E> {
        let mut old_outer = self.class.name.clone();
        let mut new_outer = map_class(&old_outer)?;
        self.class.name = new_outer.clone();
        for argument in &mut self.class.arguments {
            argument.map_class_names(map_class)?;
        }

        for projection in &mut self.projections {
            let old_inner = format!("{}${}", old_outer, projection.name);
            let new_inner = map_class(&old_inner)?;
            if let Some(simple) = new_inner
                .strip_prefix(new_outer.as_str())
                .and_then(|rest| rest.strip_prefix('$'))
            {
                projection.name = simple.to_owned();
            }
            for argument in &mut projection.arguments {
                argument.map_class_names(map_class)?;
            }
            old_outer = old_inner;
            new_outer = new_inner;
        }
        Ok(())
    }
}

impl MapClassNames for TypeArgument {
    fn map_class_names<E>(
        &mut self,
        map_class: &mut impl FnMut(&str) -> std::result::Result<String, E>,
    ) -> std::result::Result<(), E> {
        match self {
            TypeArgument::Wildcard => Ok(()),
            TypeArgument::Concrete(_, reference) => reference.map_class_names(map_class),
        }
    }
}

impl MapClassNames for TypeParameter {
    fn map_class_names<E>(
        &mut self,
        map_class: &mut impl FnMut(&str) -> std::result::Result<String, E>,
    ) -> std::result::Result<(), E> {
        if let Some(class_bound) = &mut self.class_bound {
            class_bound.map_class_names(map_class)?;
        }
        for interface_bound in &mut self.interface_bounds {
            interface_bound.map_class_names(map_class)?;
        }
        Ok(())
    }
}

impl MapClassNames for ClassSignature {
    fn map_class_names<E>(
        &mut self,
        map_class: &mut impl FnMut(&str) -> std::result::Result<String, E>,
    ) -> std::result::Result<(), E> {
        for type_parameter in &mut self.type_parameters {
            type_parameter.map_class_names(map_class)?;
        }
        self.superclass.map_class_names(map_class)?;
        for superinterface in &mut self.superinterfaces {
            superinterface.map_class_names(map_class)?;
        }
        Ok(())
    }
}

impl MapClassNames for MethodSignature {
    fn map_class_names<E>(
        &mut self,
        map_class: &mut impl FnMut(&str) -> std::result::Result<String, E>,
    ) -> std::result::Result<(), E> {
        for type_parameter in &mut self.type_parameters {
            type_parameter.map_class_names(map_class)?;
        }
        for parameter in &mut self.parameters {
            parameter.map_class_names(map_class)?;
        }
        if let Some(result) = &mut self.result {
            result.map_class_names(map_class)?;
        }
        for throws in &mut self.throws {
            throws.map_class_names(map_class)?;
        }
        Ok(())
    }
}

impl MapClassNames for GenericSignature {
    fn map_class_names<E>(
        &mut self,
        map_class: &mut impl FnMut(&str) -> std::result::Result<String, E>,
    ) -> std::result::Result<(), E> {
        match self {
            GenericSignature::Class(class) => class.map_class_names(map_class),
            GenericSignature::Method(method) => method.map_class_names(map_class),
        }
    }
}

fn parse_type_parameters(source: &mut Peekable<Chars>) -> Result<Vec<TypeParameter>> {
    let mut type_parameters = vec![];
    if source.next_if_eq(&'<').is_some() {
        while source.next_if_eq(&'>').is_none() {
            type_parameters.push(TypeParameter::parse_from(source)?);
        }
        if type_parameters.is_empty() {
            let msg = "Empty type parameter list";
            return Err(Error::new(ErrorKind::InvalidInput, msg));
        }
    }
    Ok(type_parameters)
}

fn render_type_parameters(type_parameters: &[TypeParameter], write_to: &mut String) {
    if !type_parameters.is_empty() {
        write_to.push('<');
        for type_parameter in type_parameters {
            type_parameter.render_to(write_to);
        }
        write_to.push('>');
    }
}

/// Read a non-empty identifier, stopping (without consuming) at any of the terminators
///
/// Running out of input before a terminator is an error, since every identifier in the grammar is
/// followed by something.
fn parse_identifier(source: &mut Peekable<Chars>, terminators: &[char]) -> Result<String> {
    let mut name = String::new();
    loop {
        match source.peek().copied() {
            None => {
                let msg = format!("Unterminated identifier '{}'", name);
                return Err(Error::new(ErrorKind::UnexpectedEof, msg));
            }
            Some(c) if terminators.contains(&c) => break,
            Some(c @ ('.' | ';' | '[' | '<' | '>' | ':')) => {
                let msg = format!("Unexpected '{}' in identifier '{}'", c, name);
                return Err(Error::new(ErrorKind::InvalidInput, msg));
            }
            Some(c) => {
                name.push(c);
                let _ = source.next();
            }
        }
    }
    if name.is_empty() {
        let msg = "Empty identifier";
        return Err(Error::new(ErrorKind::InvalidInput, msg));
    }
    Ok(name)
}

fn expect_char(source: &mut Peekable<Chars>, expected: char) -> Result<()> {
    match source.next() {
        Some(c) if c == expected => Ok(()),
        Some(c) => {
            let msg = format!("Expected '{}' but found '{}'", expected, c);
            Err(Error::new(ErrorKind::InvalidInput, msg))
        }
        None => {
            let msg = format!("Expected '{}'", expected);
            Err(Error::new(ErrorKind::UnexpectedEof, msg))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fmt::Debug;

    fn round_trip<T: RenderDescriptor + ParseDescriptor + Debug>(rendered: &str) -> T {
        let parsed = T::parse(rendered).unwrap();
        assert_eq!(parsed.render(), rendered);
        parsed
    }

    fn class_type(name: &str) -> ClassTypeSignature {
        ClassTypeSignature {
            class: SimpleClassTypeSignature {
                name: name.to_owned(),
                arguments: vec![],
            },
            projections: vec![],
        }
    }

    #[test]
    fn field_signatures() {
        let parsed: ReferenceTypeSignature = round_trip("Ljava/util/List<Ljava/lang/String;>;");
        assert_eq!(
            parsed,
            ReferenceTypeSignature::Class(ClassTypeSignature {
                class: SimpleClassTypeSignature {
                    name: String::from("java/util/List"),
                    arguments: vec![TypeArgument::Concrete(
                        None,
                        ReferenceTypeSignature::Class(class_type("java/lang/String")),
                    )],
                },
                projections: vec![],
            })
        );

        round_trip::<ReferenceTypeSignature>("TT;");
        round_trip::<ReferenceTypeSignature>("[[TT;");
        round_trip::<ReferenceTypeSignature>("[I");
        round_trip::<ReferenceTypeSignature>("Ljava/util/Map<*+TK;-[Ljava/lang/Number;>;");
        round_trip::<ReferenceTypeSignature>(
            "Ljava/util/Map<TK;TV;>.Entry<TK;Ljava/util/List<-TV;>;>;",
        );
    }

    #[test]
    fn class_signatures() {
        let parsed: ClassSignature = round_trip(
            "<T::Ljava/lang/Comparable<-TT;>;U:Ljava/lang/Object;:Ljava/lang/Runnable;>\
             Ljava/util/AbstractList<TT;>;Ljava/util/RandomAccess;",
        );
        assert_eq!(parsed.type_parameters.len(), 2);
        assert_eq!(parsed.type_parameters[0].class_bound, None);
        assert_eq!(parsed.type_parameters[0].interface_bounds.len(), 1);
        assert_eq!(parsed.type_parameters[1].interface_bounds.len(), 1);
        assert_eq!(parsed.superinterfaces, vec![class_type("java/util/RandomAccess")]);
    }

    #[test]
    fn method_signatures() {
        let parsed: MethodSignature =
            round_trip("<E:Ljava/lang/Exception;>(Ljava/util/List<+TE;>;[IJ)TE;^TE;^Ljava/io/IOException;");
        assert_eq!(parsed.parameters.len(), 3);
        assert_eq!(parsed.throws.len(), 2);

        let void: MethodSignature = round_trip("()V");
        assert_eq!(void.result, None);
    }

    #[test]
    fn generic_signatures_pick_the_right_shape() {
        assert!(matches!(
            round_trip::<GenericSignature>("<T:Ljava/lang/Object;>(TT;)V"),
            GenericSignature::Method(_)
        ));
        assert!(matches!(
            round_trip::<GenericSignature>("<T:Ljava/lang/Object;>Ljava/lang/Object;"),
            GenericSignature::Class(_)
        ));
    }

    #[test]
    fn malformed_signatures() {
        assert!(ReferenceTypeSignature::parse("Ljava/util/List<>;").is_err());
        assert!(ReferenceTypeSignature::parse("Ljava/util/List").is_err());
        assert!(ReferenceTypeSignature::parse("Ljava//List;").is_err());
        assert!(ReferenceTypeSignature::parse("T;").is_err());
        assert!(ReferenceTypeSignature::parse("I").is_err());
        assert!(MethodSignature::parse("(I)V^[I").is_err());
        assert!(MethodSignature::parse("<>()V").is_err());
        assert!(ClassSignature::parse("").is_err());
    }

    #[test]
    fn mapping_class_names() {
        let mut signature = GenericSignature::parse(
            "<T:Ljava/util/Map<TT;Ljava/util/Map$Entry;>.Entry<TT;*>;>(Lteam/A;)Lteam/B;",
        )
        .unwrap();
        let mut seen = vec![];
        signature
            .map_class_names::<()>(&mut |name| {
                seen.push(name.to_owned());
                Ok(format!("x/{}", name))
            })
            .unwrap();
        assert_eq!(
            seen,
            vec![
                "java/util/Map",
                "java/util/Map$Entry",
                "java/util/Map$Entry",
                "team/A",
                "team/B"
            ]
        );
        assert_eq!(
            signature.render(),
            "<T:Lx/java/util/Map<TT;Lx/java/util/Map$Entry;>.Entry<TT;*>;>(Lx/team/A;)Lx/team/B;"
        );
    }

    #[test]
    fn mapping_stops_at_first_error() {
        let mut signature = ReferenceTypeSignature::parse("Ljava/util/List<Lbad/Class;>;").unwrap();
        let result = signature.map_class_names(&mut |name| {
            if name.starts_with("bad/") {
                Err(name.to_owned())
            } else {
                Ok(name.to_owned())
            }
        });
        assert_eq!(result, Err(String::from("bad/Class")));
    }
}
