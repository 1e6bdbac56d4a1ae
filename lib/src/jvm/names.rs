use std::borrow::Cow;
use std::fmt::{Debug, Error as FmtError, Formatter};

/// Names of methods, fields
///
/// See <https://docs.oracle.com/javase/specs/jvms/se16/html/jvms-4.html#jvms-4.2.2>
#[derive(Clone, Hash, Eq, PartialEq)]
pub struct UnqualifiedName(Cow<'static, str>);

/// Names of classes and interfaces
///
/// See <https://docs.oracle.com/javase/specs/jvms/se16/html/jvms-4.html#jvms-4.2.1>
#[derive(Clone, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub struct BinaryName(Cow<'static, str>);

/// Extracts the raw underlying string name
impl AsRef<str> for UnqualifiedName {
    fn as_ref(&self) -> &str {
        self.0.as_ref()
    }
}

/// Extracts the raw underlying string name
impl AsRef<str> for BinaryName {
    fn as_ref(&self) -> &str {
        self.0.as_ref()
    }
}

pub trait Name: Sized {
    /// Check if a string would be a valid name
    fn check_valid(name: impl AsRef<str>) -> Result<(), String>;

    /// Extact the raw underlying string data:
    fn as_cow(&self) -> &Cow<'static, str>;

    /// Extact the raw underlying string name
    fn as_str(&self) -> &str {
        self.as_cow().as_ref()
    }

    /// Try to construct a name from a string
    fn from_string(name: String) -> Result<Self, String>;
}

impl Name for UnqualifiedName {
    fn check_valid(name: impl AsRef<str>) -> Result<(), String> {
        let name = name.as_ref();
        if name.contains(&['.', ';', '[', '/'][..]) {
            Err(format!(
                "Unqualified name '{}' contains an illegal character",
                name
            ))
        } else if name.is_empty() {
            Err(format!("Unqualified name '{}' is empty", name))
        } else {
            Ok(())
        }
    }

    fn as_cow(&self) -> &Cow<'static, str> {
        &self.0
    }

    fn from_string(name: String) -> Result<Self, String> {
        match Self::check_valid(&name) {
            Ok(()) => Ok(UnqualifiedName(Cow::Owned(name))),
            Err(msg) => Err(msg),
        }
    }
}

impl Name for BinaryName {
    fn check_valid(name: impl AsRef<str>) -> Result<(), String> {
        let name = name.as_ref();
        if name.is_empty() {
            Err(format!("Binary name '{}' is empty", name))
        } else {
            name.split('/').map(UnqualifiedName::check_valid).collect()
        }
    }

    fn as_cow(&self) -> &Cow<'static, str> {
        &self.0
    }

    fn from_string(name: String) -> Result<Self, String> {
        match Self::check_valid(&name) {
            Ok(()) => Ok(BinaryName(Cow::Owned(name))),
            Err(msg) => Err(msg),
        }
    }
}

impl Debug for UnqualifiedName {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        f.write_str(self.0.as_ref())
    }
}
impl Debug for BinaryName {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        f.write_str(self.0.as_ref())
    }
}

impl BinaryName {
    /// Package containing the class (eg. `java/util` for `java/util/Map`)
    ///
    /// Classes in the default package have no package.
    pub fn package(&self) -> Option<&str> {
        self.as_str().rsplit_once('/').map(|(package, _)| package)
    }

    /// Last segment of the name (eg. `Map` for `java/util/Map`)
    pub fn simple_name(&self) -> &str {
        match self.as_str().rsplit_once('/') {
            Some((_, simple)) => simple,
            None => self.as_str(),
        }
    }

    /// Check if a raw class name lies strictly inside this name, treated as a namespace
    ///
    /// `java/util` contains `java/util/Map` and `java/util/concurrent/Future`, but not
    /// `java/utility/Tool` or `java/util` itself.
    pub fn contains(&self, class_name: &str) -> bool {
        self.strip_from(class_name).is_some()
    }

    /// Remove this namespace (and the separating `/`) from the front of a raw class name
    pub fn strip_from<'a>(&self, class_name: &'a str) -> Option<&'a str> {
        class_name
            .strip_prefix(self.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|rest| !rest.is_empty())
    }

    /// Prefix a raw class name with this namespace
    pub fn wrap(&self, class_name: &str) -> String {
        format!("{}/{}", self.as_str(), class_name)
    }

    const fn name(value: &'static str) -> BinaryName {
        BinaryName(Cow::Borrowed(value))
    }

    // JDK names
    pub const ATOMICINTEGER: Self = Self::name("java/util/concurrent/atomic/AtomicInteger");
    pub const ATOMICLONG: Self = Self::name("java/util/concurrent/atomic/AtomicLong");
    pub const ATOMICREFERENCE: Self = Self::name("java/util/concurrent/atomic/AtomicReference");
    pub const CONCURRENTHASHMAP: Self = Self::name("java/util/concurrent/ConcurrentHashMap");
    pub const ITERATOR: Self = Self::name("java/util/Iterator");
    pub const OBJECT: Self = Self::name("java/lang/Object");
    pub const RANDOM: Self = Self::name("java/util/Random");
    pub const SECURERANDOM: Self = Self::name("java/security/SecureRandom");
    pub const SYSTEM: Self = Self::name("java/lang/System");
    pub const TIMEUNIT: Self = Self::name("java/util/concurrent/TimeUnit");
    pub const UNSAFE: Self = Self::name("sun/misc/Unsafe");

    // JDK packages
    pub const JAVA: Self = Self::name("java");
    pub const JAVA_MATH: Self = Self::name("java/math");
    pub const JAVA_UTIL: Self = Self::name("java/util");
    pub const JAVA_UTIL_JAR: Self = Self::name("java/util/jar");
    pub const JAVA_UTIL_ZIP: Self = Self::name("java/util/zip");
    pub const COM: Self = Self::name("com");
    pub const SUN: Self = Self::name("sun");
}
