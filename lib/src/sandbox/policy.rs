use super::Error;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Which classes sandboxes may reference
///
/// A class is allowed if it is not on the deny-list and its package (everything before the last
/// `/`) is on the allow-list. Classes in the default package are never allowed.
#[derive(Debug, Default, Clone)]
pub struct PolicyStore {
    allowed_packages: HashSet<String>,
    disallowed_classes: HashSet<String>,
}

impl PolicyStore {
    pub const ALLOWED_PACKAGES_FILE: &'static str = "AllowedPackages.txt";
    pub const DISALLOWED_CLASSES_FILE: &'static str = "DisallowedClasses.txt";

    /// Load `AllowedPackages.txt` and `DisallowedClasses.txt` from a directory
    pub fn load_from_dir(directory: impl AsRef<Path>) -> Result<PolicyStore, Error> {
        let directory = directory.as_ref();
        PolicyStore::load(
            directory.join(Self::ALLOWED_PACKAGES_FILE),
            directory.join(Self::DISALLOWED_CLASSES_FILE),
        )
    }

    pub fn load(
        allowed_packages: impl AsRef<Path>,
        disallowed_classes: impl AsRef<Path>,
    ) -> Result<PolicyStore, Error> {
        let allowed_packages = read_resource(allowed_packages.as_ref())?;
        let disallowed_classes = read_resource(disallowed_classes.as_ref())?;
        let store = PolicyStore::from_lines(
            resource_lines(&allowed_packages).map(|(_, line)| line),
            resource_lines(&disallowed_classes).map(|(_, line)| line),
        );
        log::debug!(
            "Loaded {} allowed packages and {} disallowed classes",
            store.allowed_packages.len(),
            store.disallowed_classes.len()
        );
        Ok(store)
    }

    pub fn from_lines<'a>(
        allowed_packages: impl IntoIterator<Item = &'a str>,
        disallowed_classes: impl IntoIterator<Item = &'a str>,
    ) -> PolicyStore {
        PolicyStore {
            allowed_packages: allowed_packages.into_iter().map(String::from).collect(),
            disallowed_classes: disallowed_classes.into_iter().map(String::from).collect(),
        }
    }

    pub fn is_in_allowed_package(&self, class_name: &str) -> bool {
        match class_name.rsplit_once('/') {
            Some((package, _)) => self.allowed_packages.contains(package),
            None => false,
        }
    }

    pub fn is_disallowed(&self, class_name: &str) -> bool {
        self.disallowed_classes.contains(class_name)
    }

    /// Deny-list first, then allow-list
    pub fn allows(&self, class_name: &str) -> bool {
        !self.is_disallowed(class_name) && self.is_in_allowed_package(class_name)
    }
}

/// Read a whole resource file, naming the file on failure
pub(super) fn read_resource(path: &Path) -> Result<String, Error> {
    fs::read_to_string(path).map_err(|error| Error::ResourceLoad {
        file: path.to_path_buf(),
        error,
    })
}

/// Meaningful lines of a resource, with 1-based line numbers
///
/// Lines are trimmed, and blank lines or lines starting with `#` are skipped.
fn resource_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
}

#[cfg(test)]
mod test {
    use super::*;

    fn policy() -> PolicyStore {
        PolicyStore::from_lines(
            vec!["java/util", "java/lang"],
            vec!["java/util/Random", "java/lang/Thread"],
        )
    }

    #[test]
    fn allow_list_is_by_exact_package() {
        let policy = policy();
        assert!(policy.allows("java/util/ArrayList"));
        assert!(policy.allows("java/lang/String"));
        assert!(!policy.allows("java/util/concurrent/Future"));
        assert!(!policy.allows("java/io/File"));
        assert!(!policy.allows("Main"));
    }

    #[test]
    fn deny_list_wins() {
        let policy = policy();
        assert!(policy.is_in_allowed_package("java/util/Random"));
        assert!(!policy.allows("java/util/Random"));
        assert!(!policy.allows("java/lang/Thread"));
    }

    #[test]
    fn resource_lines_skip_noise() {
        let text = "# allowed\njava/util\n\n  java/lang  \r\n#java/io\n";
        let lines: Vec<_> = resource_lines(text).collect();
        assert_eq!(lines, vec![(2, "java/util"), (4, "java/lang")]);
    }

    #[test]
    fn missing_file_names_the_file() {
        let missing = Path::new("definitely/not/here/AllowedPackages.txt");
        match PolicyStore::load(missing, missing) {
            Err(Error::ResourceLoad { file, .. }) => assert_eq!(file, missing),
            other => panic!("expected a resource error, got {:?}", other.map(|_| ())),
        }
    }
}
