use crate::jvm::class_file::{
    Attribute, ClassConstantIndex, ConstantsPool, Deserialize, Field, Method, Serialize, Version,
};
use crate::jvm::{ClassAccessFlags, Error};
use byteorder::{ReadBytesExt, WriteBytesExt};
use std::fs;
use std::io::{Error as IoError, ErrorKind};
use std::path::Path;

/// Representation of the [`class` file format of the JVM][0]
///
/// [0]: https://docs.oracle.com/javase/specs/jvms/se15/html/jvms-4.html
#[derive(Debug)]
pub struct ClassFile {
    pub version: Version,
    pub constants: ConstantsPool,
    pub access_flags: ClassAccessFlags,
    pub this_class: ClassConstantIndex,
    pub super_class: Option<ClassConstantIndex>,
    pub interfaces: Vec<ClassConstantIndex>,
    pub fields: Vec<Field>,
    pub methods: Vec<Method>,
    pub attributes: Vec<Attribute>,
}

impl ClassFile {
    /// Magic header bytes that go at the front of the serialized class file
    const MAGIC: [u8; 4] = [0xCA, 0xFE, 0xBA, 0xBE];

    /// Parse a complete class file
    ///
    /// The input must contain exactly one class: trailing bytes are an error.
    pub fn parse(bytes: &[u8]) -> Result<ClassFile, Error> {
        let mut reader = bytes;
        let class_file = ClassFile::deserialize(&mut reader).map_err(malformed)?;
        if !reader.is_empty() {
            return Err(Error::MalformedClassFile(format!(
                "{} trailing bytes after class",
                reader.len()
            )));
        }
        Ok(class_file)
    }

    /// Read and parse a class file from disk
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<ClassFile, Error> {
        let bytes = fs::read(path)?;
        ClassFile::parse(&bytes)
    }

    /// Serialize the class file into a fresh buffer
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        let mut bytes = vec![];
        self.serialize(&mut bytes)?;
        Ok(bytes)
    }

    /// Save the class file to disk
    pub fn save_to_path<P: AsRef<Path>>(
        &self,
        path: P,
        create_missing_directories: bool,
    ) -> std::io::Result<()> {
        let path = path.as_ref();
        if create_missing_directories {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut class_file = fs::File::create(path)?;
        self.serialize(&mut class_file)
    }

    pub fn this_class_name(&self) -> Result<&str, Error> {
        self.constants.class_name(self.this_class)
    }

    pub fn super_class_name(&self) -> Result<Option<&str>, Error> {
        self.super_class
            .map(|super_class| self.constants.class_name(super_class))
            .transpose()
    }

    /// Names of directly implemented interfaces, in declaration order
    pub fn interface_names(&self) -> Result<Vec<&str>, Error> {
        self.interfaces
            .iter()
            .map(|interface| self.constants.class_name(*interface))
            .collect()
    }
}

/// Running out of input or hitting bad data means the class file itself is broken
fn malformed(err: IoError) -> Error {
    match err.kind() {
        ErrorKind::UnexpectedEof => {
            Error::MalformedClassFile(String::from("unexpected end of class file"))
        }
        ErrorKind::InvalidData => Error::MalformedClassFile(err.to_string()),
        _ => Error::IoError(err),
    }
}

impl Serialize for ClassFile {
    fn serialize<W: WriteBytesExt>(&self, writer: &mut W) -> std::io::Result<()> {
        writer.write_all(&ClassFile::MAGIC)?;
        self.version.serialize(writer)?;
        self.constants.serialize(writer)?;
        self.access_flags.serialize(writer)?;
        self.this_class.serialize(writer)?;
        self.super_class.serialize(writer)?;
        self.interfaces.serialize(writer)?;
        self.fields.serialize(writer)?;
        self.methods.serialize(writer)?;
        self.attributes.serialize(writer)?;
        Ok(())
    }
}

impl Deserialize for ClassFile {
    fn deserialize<R: ReadBytesExt>(reader: &mut R) -> std::io::Result<Self> {
        let mut magic = [0; 4];
        reader.read_exact(&mut magic)?;
        if magic != ClassFile::MAGIC {
            let msg = format!("bad magic number {:02X?}", magic);
            return Err(IoError::new(ErrorKind::InvalidData, msg));
        }

        Ok(ClassFile {
            version: Version::deserialize(reader)?,
            constants: ConstantsPool::deserialize(reader)?,
            access_flags: ClassAccessFlags::deserialize(reader)?,
            this_class: ClassConstantIndex::deserialize(reader)?,
            super_class: Option::deserialize(reader)?,
            interfaces: Vec::deserialize(reader)?,
            fields: Vec::deserialize(reader)?,
            methods: Vec::deserialize(reader)?,
            attributes: Vec::deserialize(reader)?,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::jvm::{FieldAccessFlags, MethodAccessFlags};

    fn sample_class() -> ClassFile {
        let mut constants = ConstantsPool::new();
        let this_class = constants.get_class("team1/RobotPlayer").unwrap();
        let super_class = constants.get_class("java/lang/Object").unwrap();
        let runnable = constants.get_class("java/lang/Runnable").unwrap();
        let field_name = constants.get_utf8("random").unwrap();
        let field_descriptor = constants.get_utf8("Ljava/util/Random;").unwrap();
        let method_name = constants.get_utf8("run").unwrap();
        let method_descriptor = constants.get_utf8("()V").unwrap();

        ClassFile {
            version: Version::JAVA8,
            constants,
            access_flags: ClassAccessFlags::PUBLIC | ClassAccessFlags::SUPER,
            this_class,
            super_class: Some(super_class),
            interfaces: vec![runnable],
            fields: vec![Field {
                access_flags: FieldAccessFlags::PRIVATE,
                name_index: field_name,
                descriptor_index: field_descriptor,
                attributes: vec![],
            }],
            methods: vec![Method {
                access_flags: MethodAccessFlags::PUBLIC,
                name_index: method_name,
                descriptor_index: method_descriptor,
                attributes: vec![],
            }],
            attributes: vec![],
        }
    }

    #[test]
    fn parse_what_was_written() {
        let class = sample_class();
        let bytes = class.to_bytes().unwrap();
        assert_eq!(&bytes[0..4], &ClassFile::MAGIC);

        let parsed = ClassFile::parse(&bytes).unwrap();
        assert_eq!(parsed.this_class_name().unwrap(), "team1/RobotPlayer");
        assert_eq!(parsed.super_class_name().unwrap(), Some("java/lang/Object"));
        assert_eq!(parsed.interface_names().unwrap(), vec!["java/lang/Runnable"]);
        assert_eq!(parsed.fields, class.fields);
        assert_eq!(parsed.methods, class.methods);
        assert_eq!(parsed.version, Version::JAVA8);
        assert_eq!(parsed.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn object_has_no_superclass() {
        let mut class = sample_class();
        class.super_class = None;
        let parsed = ClassFile::parse(&class.to_bytes().unwrap()).unwrap();
        assert_eq!(parsed.super_class_name().unwrap(), None);
    }

    #[test]
    fn reject_malformed_input() {
        let bytes = sample_class().to_bytes().unwrap();

        let mut bad_magic = bytes.clone();
        bad_magic[0] = 0;
        assert!(matches!(
            ClassFile::parse(&bad_magic),
            Err(Error::MalformedClassFile(_))
        ));

        assert!(matches!(
            ClassFile::parse(&bytes[..bytes.len() - 1]),
            Err(Error::MalformedClassFile(_))
        ));

        let mut trailing = bytes;
        trailing.push(0);
        assert!(matches!(
            ClassFile::parse(&trailing),
            Err(Error::MalformedClassFile(_))
        ));
    }
}
