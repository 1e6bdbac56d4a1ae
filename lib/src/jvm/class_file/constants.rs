use crate::jvm::class_file::{u16_length, Attribute, AttributeLike, Deserialize, Serialize};
use crate::jvm::Error;
use crate::util::{Offset, OffsetResult, OffsetVec, OffsetVecIter, Width};
use byteorder::{ReadBytesExt, WriteBytesExt};
use std::borrow::{Borrow, Cow};
use std::collections::HashMap;
use std::io::{Error as IoError, ErrorKind};
use std::result::Result;

/// Class file constants pool
///
/// A pool is usually read from an existing class file and then extended: rewriting a class never
/// mutates a `Utf8` constant in place (the same string may back both a class name and a string
/// literal), so new strings are appended and the constants referring to them are re-pointed.
/// Appending deduplicates `Utf8`, `Class`, and `NameAndType` entries against what is already in
/// the pool.
pub struct ConstantsPool {
    constants: OffsetVec<Constant>,

    utf8s: HashMap<String, Utf8ConstantIndex>,
    classes: HashMap<Utf8ConstantIndex, ClassConstantIndex>,
    name_and_types: HashMap<(Utf8ConstantIndex, Utf8ConstantIndex), NameAndTypeConstantIndex>,
}

impl ConstantsPool {
    /// Make a fresh empty constants pool
    pub fn new() -> ConstantsPool {
        ConstantsPool {
            constants: OffsetVec::new_starting_at(Offset(1)),
            utf8s: HashMap::new(),
            classes: HashMap::new(),
            name_and_types: HashMap::new(),
        }
    }

    /// Push a constant into the constant pool, provided there is space for it
    ///
    /// Note: the largest valid index is 65535, indexing starts at 1, and some constants take two
    /// spaces.
    fn push_constant(&mut self, constant: Constant) -> Result<ConstantIndex, Error> {
        if let Constant::Utf8(string) = &constant {
            let length = modified_utf8_len(string);
            if length > u16::MAX.into() {
                return Err(Error::Utf8TooLong { length });
            }
        }

        let Offset(offset) = self.constants.offset_len();

        if offset + constant.width() <= u16::MAX.into() {
            let index = ConstantIndex(offset as u16);
            self.remember(index, &constant);
            self.constants.push(constant);
            Ok(index)
        } else {
            Err(Error::ConstantPoolOverflow { constant, offset })
        }
    }

    /// Record a constant in the deduplication maps (earlier entries win)
    fn remember(&mut self, index: ConstantIndex, constant: &Constant) {
        match constant {
            Constant::Utf8(string) => {
                self.utf8s
                    .entry(string.clone())
                    .or_insert(Utf8ConstantIndex(index));
            }
            Constant::Class(name) => {
                self.classes
                    .entry(*name)
                    .or_insert(ClassConstantIndex(index));
            }
            Constant::NameAndType { name, descriptor } => {
                self.name_and_types
                    .entry((*name, *descriptor))
                    .or_insert(NameAndTypeConstantIndex(index));
            }
            _ => (),
        }
    }

    /// Drop any deduplication entry that resolves to this index
    fn forget(&mut self, index: ConstantIndex) {
        self.classes.retain(|_, idx| idx.0 != index);
        self.name_and_types.retain(|_, idx| idx.0 != index);
    }

    /// Number of constants in the pool
    pub fn len(&self) -> usize {
        self.constants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constants.is_empty()
    }

    /// Iterate over the constants, along with their offsets
    pub fn iter(&self) -> OffsetVecIter<'_, Constant> {
        self.constants.iter()
    }

    /// Look up a constant by index
    pub fn get(&self, index: ConstantIndex) -> Result<&Constant, Error> {
        self.constants
            .get_offset(Offset(index.0 as usize))
            .ok()
            .ok_or(Error::MissingConstant(index))
    }

    /// Look up the string of a `Utf8` constant
    pub fn utf8(&self, index: Utf8ConstantIndex) -> Result<&str, Error> {
        match self.get(index.0)? {
            Constant::Utf8(string) => Ok(string),
            other => Err(Error::UnexpectedConstant {
                index: index.0,
                expected: "Utf8",
                found: other.clone(),
            }),
        }
    }

    /// Look up the name of a `Class` constant
    pub fn class_name(&self, index: ClassConstantIndex) -> Result<&str, Error> {
        match self.get(index.0)? {
            Constant::Class(name) => self.utf8(*name),
            other => Err(Error::UnexpectedConstant {
                index: index.0,
                expected: "Class",
                found: other.clone(),
            }),
        }
    }

    /// Overwrite an existing constant
    ///
    /// The replacement must have the same width as the constant it replaces.
    pub fn replace(&mut self, index: ConstantIndex, constant: Constant) -> Result<(), Error> {
        self.forget(index);
        self.remember(index, &constant);
        match self.constants.set_offset(Offset(index.0 as usize), constant) {
            OffsetResult::Ok(_, _) => Ok(()),
            OffsetResult::IncompatibleWidth(_, _) => Err(Error::MalformedClassFile(format!(
                "constant #{} cannot change width",
                index.0
            ))),
            OffsetResult::InvalidOffset(_) | OffsetResult::TooLarge => {
                Err(Error::MissingConstant(index))
            }
        }
    }

    /// Get or insert a utf8 constant from the constant pool
    pub fn get_utf8<'a, S: Into<Cow<'a, str>>>(
        &mut self,
        utf8: S,
    ) -> Result<Utf8ConstantIndex, Error> {
        let cow = utf8.into();

        if let Some(idx) = self.utf8s.get::<str>(cow.borrow()) {
            Ok(*idx)
        } else {
            let constant = Constant::Utf8(cow.into_owned());
            Ok(Utf8ConstantIndex(self.push_constant(constant)?))
        }
    }

    /// Get or insert a class constant from the constant pool
    pub fn get_class<'a, S: Into<Cow<'a, str>>>(
        &mut self,
        name: S,
    ) -> Result<ClassConstantIndex, Error> {
        let name = self.get_utf8(name)?;
        if let Some(idx) = self.classes.get(&name) {
            Ok(*idx)
        } else {
            let constant = Constant::Class(name);
            Ok(ClassConstantIndex(self.push_constant(constant)?))
        }
    }

    /// Get or insert a name & type constant from the constant pool
    pub fn get_name_and_type(
        &mut self,
        name: Utf8ConstantIndex,
        descriptor: Utf8ConstantIndex,
    ) -> Result<NameAndTypeConstantIndex, Error> {
        if let Some(idx) = self.name_and_types.get(&(name, descriptor)) {
            Ok(*idx)
        } else {
            let constant = Constant::NameAndType { name, descriptor };
            Ok(NameAndTypeConstantIndex(self.push_constant(constant)?))
        }
    }

    /// Append any constant, even if an equal one is already in the pool
    pub fn add(&mut self, constant: Constant) -> Result<ConstantIndex, Error> {
        self.push_constant(constant)
    }

    /// Add an attribute to the constant pool
    pub fn get_attribute<A: AttributeLike>(&mut self, attribute: A) -> Result<Attribute, Error> {
        let name_index = self.get_utf8(A::NAME)?;
        let mut info = vec![];

        attribute.serialize(&mut info).map_err(Error::IoError)?;

        Ok(Attribute { name_index, info })
    }
}

impl Default for ConstantsPool {
    fn default() -> Self {
        ConstantsPool::new()
    }
}

impl std::fmt::Debug for ConstantsPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.constants.fmt(f)
    }
}

/// The pool is preceded by `constant_pool_count`, which is one more than the largest index
impl Serialize for ConstantsPool {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        (self.constants.offset_len().0 as u16).serialize(writer)?;
        for (_, _, constant) in &self.constants {
            constant.serialize(writer)?;
        }
        Ok(())
    }
}

impl Deserialize for ConstantsPool {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> std::io::Result<Self> {
        let count = u16::deserialize(reader)? as usize;
        let mut pool = ConstantsPool::new();
        while pool.constants.offset_len().0 < count {
            let constant = Constant::deserialize(reader)?;
            let index = ConstantIndex(pool.constants.offset_len().0 as u16);
            pool.remember(index, &constant);
            pool.constants.push(constant);
        }
        if pool.constants.offset_len().0 != count {
            let msg = format!("constant pool overflows its declared count {}", count);
            return Err(IoError::new(ErrorKind::InvalidData, msg));
        }
        Ok(pool)
    }
}

/// Constants as in the constant pool
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.4
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    /// Class or an interface
    Class(Utf8ConstantIndex),

    /// Field
    FieldRef(ClassConstantIndex, NameAndTypeConstantIndex),

    /// Method (this combines `Methodref` and `InterfaceMethodref`
    MethodRef {
        class: ClassConstantIndex,
        name_and_type: NameAndTypeConstantIndex,
        is_interface: bool,
    },

    /// Constant object of type `java.lang.String`
    String(Utf8ConstantIndex),

    /// Constant primitive of type `int`
    Integer(i32),

    /// Constant primitive of type `float`
    Float(f32),

    /// Constant primitive of type `long`
    Long(i64),

    /// Constant primitive of type `double`
    Double(f64),

    /// Name and a type (eg. for a field or a method)
    NameAndType {
        name: Utf8ConstantIndex,
        descriptor: Utf8ConstantIndex,
    },

    /// Constant UTF-8 encoded raw string value
    ///
    /// Despite the name, the encoding is not quite UTF-8 (the encoding of the
    /// null character `\u{0000}` and the encoding of supplementary characters
    /// is different).
    Utf8(String),

    /// Constant object of type `java.lang.invoke.MethodHandle`
    MethodHandle {
        handle_kind: HandleKind,

        /// Depending on the method kind, this points to different things:
        ///
        ///   - `FieldRef` for `GetField`, `GetStatic`, `PutField`, `PutStatic`
        ///   - `MethodRef` for the rest
        member: ConstantIndex,
    },

    /// Method type
    MethodType { descriptor: Utf8ConstantIndex },

    /// Dynamically-computed constant
    Dynamic {
        /// Index into the `BootstrapMethods` attribute
        bootstrap_method: u16,
        name_and_type: NameAndTypeConstantIndex,
    },

    /// Dynamically-computed call site
    InvokeDynamic {
        /// Index into the `BootstrapMethods` attribute
        bootstrap_method: u16,
        method_descriptor: NameAndTypeConstantIndex,
    },

    /// Module (only in `module-info` classes)
    Module(Utf8ConstantIndex),

    /// Package exported or opened by a module
    Package(Utf8ConstantIndex),
}

impl Serialize for Constant {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        match self {
            Constant::Utf8(string) => {
                1u8.serialize(writer)?;
                let buffer: Vec<u8> = encode_modified_utf8(string);
                u16_length(buffer.len(), "Utf8 constant")?.serialize(writer)?;
                writer.write_all(&buffer)?;
            }
            Constant::Integer(integer) => {
                3u8.serialize(writer)?;
                integer.serialize(writer)?;
            }
            Constant::Float(float) => {
                4u8.serialize(writer)?;
                float.serialize(writer)?;
            }
            Constant::Long(long) => {
                5u8.serialize(writer)?;
                long.serialize(writer)?;
            }
            Constant::Double(double) => {
                6u8.serialize(writer)?;
                double.serialize(writer)?;
            }
            Constant::Class(name) => {
                7u8.serialize(writer)?;
                name.serialize(writer)?;
            }
            Constant::String(bytes) => {
                8u8.serialize(writer)?;
                bytes.serialize(writer)?;
            }
            Constant::FieldRef(class, name_and_type) => {
                9u8.serialize(writer)?;
                class.serialize(writer)?;
                name_and_type.serialize(writer)?;
            }
            Constant::MethodRef {
                class,
                name_and_type,
                is_interface,
            } => {
                (if !is_interface { 10u8 } else { 11u8 }).serialize(writer)?;
                class.serialize(writer)?;
                name_and_type.serialize(writer)?;
            }
            Constant::NameAndType { name, descriptor } => {
                12u8.serialize(writer)?;
                name.serialize(writer)?;
                descriptor.serialize(writer)?;
            }
            Constant::MethodHandle {
                handle_kind,
                member,
            } => {
                15u8.serialize(writer)?;
                handle_kind.serialize(writer)?;
                member.serialize(writer)?;
            }
            Constant::MethodType { descriptor } => {
                16u8.serialize(writer)?;
                descriptor.serialize(writer)?;
            }
            Constant::Dynamic {
                bootstrap_method,
                name_and_type,
            } => {
                17u8.serialize(writer)?;
                bootstrap_method.serialize(writer)?;
                name_and_type.serialize(writer)?;
            }
            Constant::InvokeDynamic {
                bootstrap_method,
                method_descriptor,
            } => {
                18u8.serialize(writer)?;
                bootstrap_method.serialize(writer)?;
                method_descriptor.serialize(writer)?;
            }
            Constant::Module(name) => {
                19u8.serialize(writer)?;
                name.serialize(writer)?;
            }
            Constant::Package(name) => {
                20u8.serialize(writer)?;
                name.serialize(writer)?;
            }
        };
        Ok(())
    }
}

impl Deserialize for Constant {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> std::io::Result<Self> {
        let constant = match u8::deserialize(reader)? {
            1 => {
                let len = u16::deserialize(reader)?;
                let mut buffer = vec![0; len as usize];
                reader.read_exact(&mut buffer)?;
                let string = decode_modified_utf8(&buffer)
                    .map_err(|msg| IoError::new(ErrorKind::InvalidData, msg))?;
                Constant::Utf8(string)
            }
            3 => Constant::Integer(i32::deserialize(reader)?),
            4 => Constant::Float(f32::deserialize(reader)?),
            5 => Constant::Long(i64::deserialize(reader)?),
            6 => Constant::Double(f64::deserialize(reader)?),
            7 => Constant::Class(Utf8ConstantIndex::deserialize(reader)?),
            8 => Constant::String(Utf8ConstantIndex::deserialize(reader)?),
            9 => {
                let class = ClassConstantIndex::deserialize(reader)?;
                let name_and_type = NameAndTypeConstantIndex::deserialize(reader)?;
                Constant::FieldRef(class, name_and_type)
            }
            tag @ (10 | 11) => Constant::MethodRef {
                class: ClassConstantIndex::deserialize(reader)?,
                name_and_type: NameAndTypeConstantIndex::deserialize(reader)?,
                is_interface: tag == 11,
            },
            12 => Constant::NameAndType {
                name: Utf8ConstantIndex::deserialize(reader)?,
                descriptor: Utf8ConstantIndex::deserialize(reader)?,
            },
            15 => Constant::MethodHandle {
                handle_kind: HandleKind::deserialize(reader)?,
                member: ConstantIndex::deserialize(reader)?,
            },
            16 => Constant::MethodType {
                descriptor: Utf8ConstantIndex::deserialize(reader)?,
            },
            17 => Constant::Dynamic {
                bootstrap_method: u16::deserialize(reader)?,
                name_and_type: NameAndTypeConstantIndex::deserialize(reader)?,
            },
            18 => Constant::InvokeDynamic {
                bootstrap_method: u16::deserialize(reader)?,
                method_descriptor: NameAndTypeConstantIndex::deserialize(reader)?,
            },
            19 => Constant::Module(Utf8ConstantIndex::deserialize(reader)?),
            20 => Constant::Package(Utf8ConstantIndex::deserialize(reader)?),
            tag => {
                let msg = format!("unknown constant pool tag {}", tag);
                return Err(IoError::new(ErrorKind::InvalidData, msg));
            }
        };
        Ok(constant)
    }
}

/// Modified UTF-8 format used in class files.
///
/// See [this `DataInput` section for details][0]. Quoting from that section:
///
/// > The differences between this format and the standard UTF-8 format are the following:
/// >
/// >  * The null byte `\u0000` is encoded in 2-byte format rather than 1-byte, so that the encoded
/// >    strings never have embedded nulls.
/// >  * Only the 1-byte, 2-byte, and 3-byte formats are used.
/// >  * Supplementary characters are represented in the form of surrogate pairs.
///
/// [0]: https://docs.oracle.com/en/java/javase/17/docs/api/java.base/java/io/DataInput.html#modified-utf-8
pub fn encode_modified_utf8(string: &str) -> Vec<u8> {
    let mut buffer: Vec<u8> = vec![];
    for c in string.chars() {
        // Handle the exception for how `\u{0000}` is represented
        let len: usize = if c == '\u{0000}' { 2 } else { c.len_utf8() };
        let code: u32 = c as u32;

        match len {
            1 => buffer.push(code as u8),
            2 => {
                buffer.push((code >> 6 & 0x1F) as u8 | 0b1100_0000);
                buffer.push((code & 0x3F) as u8 | 0b1000_0000);
            }
            3 => {
                buffer.push((code >> 12 & 0x0F) as u8 | 0b1110_0000);
                buffer.push((code >> 6 & 0x3F) as u8 | 0b1000_0000);
                buffer.push((code & 0x3F) as u8 | 0b1000_0000);
            }

            // Supplementary characters: main divergence from unicode
            _ => {
                buffer.push(0b1110_1101);
                buffer.push(((code >> 16 & 0x0F) as u8).wrapping_sub(1) & 0x0F | 0b1010_0000);
                buffer.push((code >> 10 & 0x3F) as u8 | 0b1000_0000);

                buffer.push(0b1110_1101);
                buffer.push(((code >> 6 & 0x0F) as u8) | 0b1011_0000);
                buffer.push((code & 0x3F) as u8 | 0b1000_0000);
            }
        }
    }
    buffer
}

/// Number of bytes [`encode_modified_utf8`] produces for a string
pub fn modified_utf8_len(string: &str) -> usize {
    string
        .chars()
        .map(|c| match c.len_utf8() {
            _ if c == '\u{0000}' => 2,
            4 => 6,
            len => len,
        })
        .sum()
}

/// Inverse of [`encode_modified_utf8`]
///
/// Bytes are first decoded into UTF-16 code units (which is what the 1/2/3-byte forms encode),
/// then surrogate pairs are combined. Unpaired surrogates have no `String` representation and are
/// rejected.
pub fn decode_modified_utf8(bytes: &[u8]) -> Result<String, String> {
    fn continuation(bytes: &[u8], at: usize) -> Result<u16, String> {
        match bytes.get(at) {
            Some(byte) if byte & 0b1100_0000 == 0b1000_0000 => Ok((byte & 0x3F) as u16),
            Some(byte) => Err(format!("invalid continuation byte {:#04x} at {}", byte, at)),
            None => Err(format!("truncated character at {}", at)),
        }
    }

    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut at = 0;
    while at < bytes.len() {
        let byte = bytes[at];
        if byte != 0 && byte & 0b1000_0000 == 0 {
            units.push(byte as u16);
            at += 1;
        } else if byte & 0b1110_0000 == 0b1100_0000 {
            let unit = ((byte & 0x1F) as u16) << 6 | continuation(bytes, at + 1)?;
            units.push(unit);
            at += 2;
        } else if byte & 0b1111_0000 == 0b1110_0000 {
            let unit = ((byte & 0x0F) as u16) << 12
                | continuation(bytes, at + 1)? << 6
                | continuation(bytes, at + 2)?;
            units.push(unit);
            at += 3;
        } else {
            return Err(format!("invalid leading byte {:#04x} at {}", byte, at));
        }
    }
    String::from_utf16(&units).map_err(|err| err.to_string())
}


/// Almost all constants have width 1, except for `Constant::Long` and `Constant::Double`. From
/// the JVM class file format:
///
/// > All 8-byte constants take up two entries in the constant_pool table of the class file. If a
/// > CONSTANT_Long_info or CONSTANT_Double_info structure is the item in the constant_pool table
/// > at index n, then the next usable item in the pool is located at index n+2. The constant_pool
/// > index n+1 must be valid but is considered unusable.
/// >
/// > In retrospect, making 8-byte constants take two constant pool entries was a poor choice.
impl Width for Constant {
    fn width(&self) -> usize {
        match self {
            Constant::Long(_) | Constant::Double(_) => 2,
            _ => 1,
        }
    }
}

#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub struct ConstantIndex(pub u16);

#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub struct Utf8ConstantIndex(pub ConstantIndex);

#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub struct NameAndTypeConstantIndex(ConstantIndex);

#[derive(Copy, Clone, Hash, Eq, PartialEq, Debug)]
pub struct ClassConstantIndex(ConstantIndex);

impl From<Utf8ConstantIndex> for ConstantIndex {
    fn from(index: Utf8ConstantIndex) -> ConstantIndex {
        index.0
    }
}
impl From<NameAndTypeConstantIndex> for ConstantIndex {
    fn from(index: NameAndTypeConstantIndex) -> ConstantIndex {
        index.0
    }
}
impl From<ClassConstantIndex> for ConstantIndex {
    fn from(index: ClassConstantIndex) -> ConstantIndex {
        index.0
    }
}

impl Serialize for ConstantIndex {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.0.serialize(writer)
    }
}
impl Serialize for Utf8ConstantIndex {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.0.serialize(writer)
    }
}
impl Serialize for NameAndTypeConstantIndex {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.0.serialize(writer)
    }
}
impl Serialize for ClassConstantIndex {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.0.serialize(writer)
    }
}

impl Deserialize for ConstantIndex {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> std::io::Result<Self> {
        u16::deserialize(reader).map(ConstantIndex)
    }
}
impl Deserialize for Utf8ConstantIndex {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> std::io::Result<Self> {
        ConstantIndex::deserialize(reader).map(Utf8ConstantIndex)
    }
}
impl Deserialize for NameAndTypeConstantIndex {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> std::io::Result<Self> {
        ConstantIndex::deserialize(reader).map(NameAndTypeConstantIndex)
    }
}
impl Deserialize for ClassConstantIndex {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> std::io::Result<Self> {
        ConstantIndex::deserialize(reader).map(ClassConstantIndex)
    }
}

/// `super_class` is zero for `java/lang/Object` (and for `module-info`)
impl Serialize for Option<ClassConstantIndex> {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        match self {
            Some(index) => index.serialize(writer),
            None => 0u16.serialize(writer),
        }
    }
}

impl Deserialize for Option<ClassConstantIndex> {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> std::io::Result<Self> {
        let index = ConstantIndex::deserialize(reader)?;
        Ok(if index.0 == 0 {
            None
        } else {
            Some(ClassConstantIndex(index))
        })
    }
}

/// Type of method handle
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-5.html#jvms-5.4.3.5-220
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum HandleKind {
    GetField,
    GetStatic,
    PutField,
    PutStatic,
    InvokeVirtual,
    InvokeStatic,
    InvokeSpecial,
    NewInvokeSpecial,
    InvokeInterface,
}

impl Serialize for HandleKind {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        let byte: u8 = match self {
            HandleKind::GetField => 1,
            HandleKind::GetStatic => 2,
            HandleKind::PutField => 3,
            HandleKind::PutStatic => 4,
            HandleKind::InvokeVirtual => 5,
            HandleKind::InvokeStatic => 6,
            HandleKind::InvokeSpecial => 7,
            HandleKind::NewInvokeSpecial => 8,
            HandleKind::InvokeInterface => 9,
        };
        byte.serialize(writer)
    }
}

impl Deserialize for HandleKind {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> std::io::Result<Self> {
        let kind = match u8::deserialize(reader)? {
            1 => HandleKind::GetField,
            2 => HandleKind::GetStatic,
            3 => HandleKind::PutField,
            4 => HandleKind::PutStatic,
            5 => HandleKind::InvokeVirtual,
            6 => HandleKind::InvokeStatic,
            7 => HandleKind::InvokeSpecial,
            8 => HandleKind::NewInvokeSpecial,
            9 => HandleKind::InvokeInterface,
            other => {
                let msg = format!("unknown method handle kind {}", other);
                return Err(IoError::new(ErrorKind::InvalidData, msg));
            }
        };
        Ok(kind)
    }
}
