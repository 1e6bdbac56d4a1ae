use super::Error;
use crate::jvm::class_file::ClassFile;
use crate::jvm::{BinaryName, Name};
use elsa::sync::FrozenMap;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::PathBuf;

/// Somewhere class files can be found by binary name
pub trait ClassSource: Send + Sync {
    /// Raw bytes of the class file for `class_name` (eg. `java/util/Map`)
    fn load_class(&self, class_name: &str) -> io::Result<Vec<u8>>;
}

/// Directories laid out like a class path (`<root>/java/util/Map.class`)
#[derive(Debug, Clone, Default)]
pub struct ClassPath {
    roots: Vec<PathBuf>,
}

impl ClassPath {
    pub fn new(roots: impl IntoIterator<Item = impl Into<PathBuf>>) -> ClassPath {
        ClassPath {
            roots: roots.into_iter().map(Into::into).collect(),
        }
    }
}

impl ClassSource for ClassPath {
    fn load_class(&self, class_name: &str) -> io::Result<Vec<u8>> {
        // Also keeps `..` and absolute paths out of the lookup
        BinaryName::check_valid(class_name)
            .map_err(|msg| io::Error::new(io::ErrorKind::InvalidInput, msg))?;

        for root in &self.roots {
            match fs::read(root.join(format!("{}.class", class_name))) {
                Ok(bytes) => return Ok(bytes),
                Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
                Err(err) => return Err(err),
            }
        }
        Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} is not on the class path", class_name),
        ))
    }
}

impl ClassSource for HashMap<String, Vec<u8>> {
    fn load_class(&self, class_name: &str) -> io::Result<Vec<u8>> {
        self.get(class_name).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no class {}", class_name))
        })
    }
}

/// Memoized flattened supertypes of classes
///
/// For each class, the list holds every declared interface (in declaration order) immediately
/// followed by that interface's own flattened supertypes, and then the superclass followed by its
/// flattened supertypes. Classes appear once, at their first position.
///
/// Entries are computed on first use and never change afterwards. Threads racing to compute the
/// same entry produce the same list, and the first one inserted is kept.
pub struct HierarchyCache<S> {
    source: S,
    cache: FrozenMap<String, Vec<String>>,
}

impl<S: ClassSource> HierarchyCache<S> {
    pub fn new(source: S) -> HierarchyCache<S> {
        HierarchyCache {
            source,
            cache: FrozenMap::new(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Flattened supertypes of a class
    ///
    /// Fails only if the class itself can't be loaded or parsed. Supertypes that can't be loaded
    /// (commonly JDK classes when the class path only has sandbox code) are kept in the list but
    /// contribute no supertypes of their own.
    pub fn supertypes(&self, class_name: &str) -> Result<&[String], Error> {
        if let Some(cached) = self.cache.get(class_name) {
            return Ok(cached);
        }

        // Cycles cut anywhere below the class itself still leave its own list complete
        let class = self.parse(class_name)?;
        let mut visiting = vec![class_name.to_owned()];
        let flattened = self.flatten(&class, &mut visiting)?;
        Ok(self.cache.insert(class_name.to_owned(), flattened.supertypes))
    }

    fn parse(&self, class_name: &str) -> Result<ClassFile, Error> {
        let bytes = self
            .source
            .load_class(class_name)
            .map_err(crate::jvm::Error::IoError)?;
        Ok(ClassFile::parse(&bytes)?)
    }

    fn flatten(&self, class: &ClassFile, visiting: &mut Vec<String>) -> Result<Flattened, Error> {
        let mut supertypes = vec![];
        let mut seen = HashSet::new();
        let mut cut_at = None;

        let interfaces = class.interface_names()?;
        for direct in interfaces.into_iter().chain(class.super_class_name()?) {
            if seen.insert(direct.to_owned()) {
                supertypes.push(direct.to_owned());
            }
            let inherited = self.inherited(direct, visiting);
            for supertype in inherited.supertypes {
                if seen.insert(supertype.clone()) {
                    supertypes.push(supertype);
                }
            }
            cut_at = cut_at.into_iter().chain(inherited.cut_at).min();
        }

        Ok(Flattened { supertypes, cut_at })
    }

    /// Supertypes of a supertype, treating anything unavailable as having none
    ///
    /// Only complete lists are cached. A list is cut short when the cycle guard stops at a class
    /// further up `visiting`, and that class's own list fills in the rest.
    fn inherited(&self, class_name: &str, visiting: &mut Vec<String>) -> Flattened {
        if let Some(cached) = self.cache.get(class_name) {
            return Flattened::complete(cached.to_vec());
        }

        // Cyclic hierarchies can't be loaded by a JVM, but class files can still claim one
        if let Some(position) = visiting.iter().position(|class| class == class_name) {
            log::debug!("Cutting cyclic hierarchy at {}", class_name);
            return Flattened {
                supertypes: vec![],
                cut_at: Some(position),
            };
        }

        let class = match self.parse(class_name) {
            Ok(class) => class,
            Err(err) => {
                log::debug!("Treating {} as a leaf supertype: {}", class_name, err);
                return Flattened::complete(vec![]);
            }
        };

        let position = visiting.len();
        visiting.push(class_name.to_owned());
        let flattened = self.flatten(&class, visiting);
        visiting.pop();

        match flattened {
            Ok(flattened) if flattened.cut_at.map_or(false, |cut_at| cut_at < position) => {
                flattened
            }
            Ok(flattened) => {
                let supertypes = self
                    .cache
                    .insert(class_name.to_owned(), flattened.supertypes)
                    .to_vec();
                Flattened::complete(supertypes)
            }
            Err(err) => {
                log::debug!("Treating {} as a leaf supertype: {}", class_name, err);
                Flattened::complete(vec![])
            }
        }
    }
}

/// Supertypes gathered for one class
struct Flattened {
    supertypes: Vec<String>,

    /// Lowest position in the `visiting` stack where a cycle was cut
    cut_at: Option<usize>,
}

impl Flattened {
    fn complete(supertypes: Vec<String>) -> Flattened {
        Flattened {
            supertypes,
            cut_at: None,
        }
    }
}
