use super::{BinaryName, Name};
use std::io::{Error, ErrorKind, Result};
use std::iter::Peekable;
use std::str::Chars;

fn invalid(msg: impl Into<String>) -> Error {
    Error::new(ErrorKind::InvalidInput, msg.into())
}

fn truncated(msg: impl Into<String>) -> Error {
    Error::new(ErrorKind::UnexpectedEof, msg.into())
}

/// Types which have a textual descriptor form (eg. `[Ljava/util/Map;`)
pub trait RenderDescriptor {
    /// Turn the descriptor into a string
    fn render(&self) -> String {
        let mut string = String::new();
        self.render_to(&mut string);
        string
    }

    /// Append the descriptor to a string
    fn render_to(&self, write_to: &mut String);
}

/// Types which can be read back out of their textual descriptor form
pub trait ParseDescriptor: Sized {
    /// Parse a complete descriptor (leftover input is an error)
    fn parse(source: &str) -> Result<Self> {
        let mut chars = source.chars().peekable();
        let parsed = Self::parse_from(&mut chars)?;
        match chars.next() {
            None => Ok(parsed),
            Some(c) => Err(invalid(format!(
                "Unexpected leftover input '{}' in '{}'",
                c, source
            ))),
        }
    }

    /// Read a descriptor off the front of a character stream
    fn parse_from(source: &mut Peekable<Chars>) -> Result<Self>;
}

/// Primitive value types
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum BaseType {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
}

impl BaseType {
    const ALL: [BaseType; 8] = [
        BaseType::Byte,
        BaseType::Char,
        BaseType::Double,
        BaseType::Float,
        BaseType::Int,
        BaseType::Long,
        BaseType::Short,
        BaseType::Boolean,
    ];

    /// Descriptor character of the type
    pub const fn as_char(self) -> char {
        match self {
            BaseType::Byte => 'B',
            BaseType::Char => 'C',
            BaseType::Double => 'D',
            BaseType::Float => 'F',
            BaseType::Int => 'I',
            BaseType::Long => 'J',
            BaseType::Short => 'S',
            BaseType::Boolean => 'Z',
        }
    }

    /// Decode a single descriptor character
    pub fn from_char(c: char) -> Option<BaseType> {
        BaseType::ALL
            .iter()
            .copied()
            .find(|base_type| base_type.as_char() == c)
    }
}

impl RenderDescriptor for BaseType {
    fn render_to(&self, write_to: &mut String) {
        write_to.push(self.as_char());
    }
}

impl ParseDescriptor for BaseType {
    fn parse_from(source: &mut Peekable<Chars>) -> Result<Self> {
        let c = source
            .next()
            .ok_or_else(|| truncated("Missing base type character"))?;
        BaseType::from_char(c)
            .ok_or_else(|| invalid(format!("Invalid base type character '{}'", c)))
    }
}

/// Class names appear in descriptors as `L<name>;`
impl RenderDescriptor for BinaryName {
    fn render_to(&self, write_to: &mut String) {
        write_to.push('L');
        write_to.push_str(self.as_str());
        write_to.push(';');
    }
}

impl ParseDescriptor for BinaryName {
    fn parse_from(source: &mut Peekable<Chars>) -> Result<Self> {
        if source.next() != Some('L') {
            return Err(invalid("Expected object type to start with 'L'"));
        }
        let mut class_name = String::new();
        loop {
            match source.next() {
                Some(';') => return BinaryName::from_string(class_name).map_err(invalid),
                Some(c) => class_name.push(c),
                None => {
                    return Err(truncated(format!(
                        "Missing terminator for 'L{}'",
                        class_name
                    )))
                }
            }
        }
    }
}

/// Reference type
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum RefType<Class> {
    Object(Class),
    ObjectArray(ArrayType<Class>),
    PrimitiveArray(ArrayType<BaseType>),
}

/// Array of some element type
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct ArrayType<T> {
    /// Additional dimensions (`A[]` has 0 additional dimensions, `A[][][][]` has 3)
    pub additional_dimensions: usize,

    /// Underlying element type (`A` is the underlying element type of `A[][]`)
    pub element_type: T,
}

impl<T: RenderDescriptor> RenderDescriptor for ArrayType<T> {
    fn render_to(&self, write_to: &mut String) {
        for _ in 0..=self.additional_dimensions {
            write_to.push('[');
        }
        self.element_type.render_to(write_to);
    }
}

impl<C: RenderDescriptor> RenderDescriptor for RefType<C> {
    fn render_to(&self, write_to: &mut String) {
        match self {
            RefType::Object(class) => class.render_to(write_to),
            RefType::PrimitiveArray(array) => array.render_to(write_to),
            RefType::ObjectArray(array) => array.render_to(write_to),
        }
    }
}

impl<C: ParseDescriptor> ParseDescriptor for RefType<C> {
    fn parse_from(source: &mut Peekable<Chars>) -> Result<Self> {
        match source.peek().copied() {
            Some('L') => C::parse_from(source).map(RefType::Object),
            Some('[') => {
                let mut additional_dimensions = 0;
                source.next();
                while source.next_if_eq(&'[').is_some() {
                    additional_dimensions += 1;
                }
                if source.peek() == Some(&'L') {
                    let element_type = C::parse_from(source)?;
                    Ok(RefType::ObjectArray(ArrayType {
                        additional_dimensions,
                        element_type,
                    }))
                } else {
                    let element_type = BaseType::parse_from(source)?;
                    Ok(RefType::PrimitiveArray(ArrayType {
                        additional_dimensions,
                        element_type,
                    }))
                }
            }
            Some(c) => Err(invalid(format!("Invalid reference type character '{}'", c))),
            None => Err(truncated("Missing reference type")),
        }
    }
}

impl<C> RefType<C> {
    /// Array whose elements have the given type
    pub fn array(element: FieldType<C>) -> RefType<C> {
        match element {
            FieldType::Base(element_type) => RefType::PrimitiveArray(ArrayType {
                additional_dimensions: 0,
                element_type,
            }),
            FieldType::Ref(RefType::Object(element_type)) => RefType::ObjectArray(ArrayType {
                additional_dimensions: 0,
                element_type,
            }),
            FieldType::Ref(RefType::PrimitiveArray(array)) => {
                RefType::PrimitiveArray(ArrayType {
                    additional_dimensions: array.additional_dimensions + 1,
                    element_type: array.element_type,
                })
            }
            FieldType::Ref(RefType::ObjectArray(array)) => RefType::ObjectArray(ArrayType {
                additional_dimensions: array.additional_dimensions + 1,
                element_type: array.element_type,
            }),
        }
    }

    /// Class mentioned by the type, if any (primitive arrays mention none)
    pub fn class(&self) -> Option<&C> {
        match self {
            RefType::Object(class) => Some(class),
            RefType::ObjectArray(array) => Some(&array.element_type),
            RefType::PrimitiveArray(_) => None,
        }
    }

    /// Replace the class mentioned by the type, keeping the array structure around it
    pub fn map_class<D, E>(
        self,
        map_class: impl FnOnce(C) -> std::result::Result<D, E>,
    ) -> std::result::Result<RefType<D>, E> {
        Ok(match self {
            RefType::Object(class) => RefType::Object(map_class(class)?),
            RefType::ObjectArray(array) => RefType::ObjectArray(ArrayType {
                additional_dimensions: array.additional_dimensions,
                element_type: map_class(array.element_type)?,
            }),
            RefType::PrimitiveArray(array) => RefType::PrimitiveArray(array),
        })
    }
}

/// Type of a field, parameter, or return value
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum FieldType<Class> {
    Base(BaseType),
    Ref(RefType<Class>),
}

impl<C> FieldType<C> {
    pub fn array(element: FieldType<C>) -> FieldType<C> {
        FieldType::Ref(RefType::array(element))
    }

    pub const fn object(class_name: C) -> FieldType<C> {
        FieldType::Ref(RefType::Object(class_name))
    }

    /// Class mentioned by the type, if any
    pub fn class(&self) -> Option<&C> {
        match self {
            FieldType::Base(_) => None,
            FieldType::Ref(ref_type) => ref_type.class(),
        }
    }

    pub fn map_class<D, E>(
        self,
        map_class: impl FnOnce(C) -> std::result::Result<D, E>,
    ) -> std::result::Result<FieldType<D>, E> {
        match self {
            FieldType::Base(base_type) => Ok(FieldType::Base(base_type)),
            FieldType::Ref(ref_type) => ref_type.map_class(map_class).map(FieldType::Ref),
        }
    }
}

impl<C: RenderDescriptor> RenderDescriptor for FieldType<C> {
    fn render_to(&self, write_to: &mut String) {
        match self {
            FieldType::Base(base_type) => base_type.render_to(write_to),
            FieldType::Ref(ref_type) => ref_type.render_to(write_to),
        }
    }
}

impl<C: ParseDescriptor> ParseDescriptor for FieldType<C> {
    fn parse_from(source: &mut Peekable<Chars>) -> Result<Self> {
        match source.peek().copied() {
            Some('L' | '[') => RefType::parse_from(source).map(FieldType::Ref),
            Some(_) => BaseType::parse_from(source).map(FieldType::Base),
            None => Err(truncated("Missing field type")),
        }
    }
}

/// Parameter and return types of a method
#[derive(PartialEq, Eq, Hash, Debug, Clone)]
pub struct MethodDescriptor<Class> {
    pub parameters: Vec<FieldType<Class>>,

    /// `None` is for `void`
    pub return_type: Option<FieldType<Class>>,
}

impl<C> MethodDescriptor<C> {
    /// Replace every class mentioned, in order (parameters first, then the return type)
    pub fn map_classes<D, E>(
        self,
        mut map_class: impl FnMut(C) -> std::result::Result<D, E>,
    ) -> std::result::Result<MethodDescriptor<D>, E> {
        let parameters = self
            .parameters
            .into_iter()
            .map(|parameter| parameter.map_class(&mut map_class))
            .collect::<std::result::Result<_, _>>()?;
        let return_type = self
            .return_type
            .map(|return_type| return_type.map_class(&mut map_class))
            .transpose()?;
        Ok(MethodDescriptor {
            parameters,
            return_type,
        })
    }
}

impl<C: RenderDescriptor> RenderDescriptor for MethodDescriptor<C> {
    fn render_to(&self, write_to: &mut String) {
        write_to.push('(');
        for parameter in &self.parameters {
            parameter.render_to(write_to);
        }
        write_to.push(')');
        match &self.return_type {
            None => write_to.push('V'),
            Some(return_type) => return_type.render_to(write_to),
        }
    }
}

impl<C: ParseDescriptor> ParseDescriptor for MethodDescriptor<C> {
    fn parse_from(source: &mut Peekable<Chars>) -> Result<Self> {
        if source.next() != Some('(') {
            return Err(invalid("Expected '(' to open method parameters"));
        }

        let mut parameters = vec![];
        loop {
            match source.peek() {
                Some(')') => break,
                Some(_) => parameters.push(FieldType::parse_from(source)?),
                None => return Err(truncated("Expected ')' to close method parameters")),
            }
        }
        source.next();

        let return_type = match source.next_if_eq(&'V') {
            Some(_) => None,
            None => Some(FieldType::parse_from(source)?),
        };

        Ok(MethodDescriptor {
            parameters,
            return_type,
        })
    }
}
