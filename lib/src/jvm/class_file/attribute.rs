use crate::jvm::class_file::{
    ClassConstantIndex, ConstantsPool, Deserialize, Serialize, Utf8ConstantIndex,
};
use crate::jvm::Error;
use byteorder::{ReadBytesExt, WriteBytesExt};

/// Attributes (used in classes, fields, methods, and even on some attributes)
///
/// Attributes are kept as raw bytes unless someone asks to decode them. Bytecode and everything
/// else that mentions classes only does so through constant pool indices, so leaving the bytes
/// alone is safe when only the pool is being rewritten.
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name_index: Utf8ConstantIndex,
    pub info: Vec<u8>,
}

impl Attribute {
    /// Decode this attribute as `A`, if it has the right name
    pub fn decode<A: AttributeLike>(&self, constants: &ConstantsPool) -> Result<Option<A>, Error> {
        if constants.utf8(self.name_index)? != A::NAME {
            return Ok(None);
        }
        let mut info: &[u8] = &self.info;
        let attribute = A::deserialize(&mut info).map_err(|err| {
            Error::MalformedClassFile(format!("{} attribute: {}", A::NAME, err))
        })?;
        if !info.is_empty() {
            return Err(Error::MalformedClassFile(format!(
                "{} attribute has {} trailing bytes",
                A::NAME,
                info.len()
            )));
        }
        Ok(Some(attribute))
    }
}

impl Serialize for Attribute {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.name_index.serialize(writer)?;

        // Attribute info length is 4 bytes
        (self.info.len() as u32).serialize(writer)?;
        writer.write_all(&self.info)?;

        Ok(())
    }
}

impl Deserialize for Attribute {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> std::io::Result<Self> {
        let name_index = Utf8ConstantIndex::deserialize(reader)?;
        let len = u32::deserialize(reader)?;
        let mut info = vec![0; len as usize];
        reader.read_exact(&mut info)?;
        Ok(Attribute { name_index, info })
    }
}

/// Attributes are all stored in the same way (see `Attribute`), but internally
/// they represent very different things. This trait is implemented by things
/// which can be turned into (and read back out of) attributes.
pub trait AttributeLike: Serialize + Deserialize {
    /// Name of the attribute
    const NAME: &'static str;
}

/// Generic signature of a class, field, or method
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.9
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Signature {
    pub signature: Utf8ConstantIndex,
}

impl Serialize for Signature {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.signature.serialize(writer)
    }
}

impl Deserialize for Signature {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> std::io::Result<Self> {
        let signature = Utf8ConstantIndex::deserialize(reader)?;
        Ok(Signature { signature })
    }
}

impl AttributeLike for Signature {
    const NAME: &'static str = "Signature";
}

/// Checked exceptions a method declares
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html#jvms-4.7.5
#[derive(Debug, Clone, PartialEq)]
pub struct Exceptions {
    pub exceptions: Vec<ClassConstantIndex>,
}

impl Serialize for Exceptions {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        self.exceptions.serialize(writer)
    }
}

impl Deserialize for Exceptions {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> std::io::Result<Self> {
        let exceptions = Vec::deserialize(reader)?;
        Ok(Exceptions { exceptions })
    }
}

impl AttributeLike for Exceptions {
    const NAME: &'static str = "Exceptions";
}
