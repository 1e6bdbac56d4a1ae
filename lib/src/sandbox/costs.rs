use super::policy::read_resource;
use super::{ClassSource, Diagnostic, Error, HierarchyCache, Settings};
use crate::jvm::{BinaryName, Name, UnqualifiedName};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Cost metadata attached to a method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodCost {
    /// Bytecode cycles charged for calling the method
    pub cycles: u32,

    /// Whether calling the method ends the current quantum
    pub ends_quantum: bool,
}

/// Costs of trusted methods, keyed by `Class/method`
///
/// The file format has one entry per line, as three whitespace-separated tokens:
///
/// ```text
/// battlecode/common/RobotController/move 0 true
/// java/lang/Math/sqrt 10 false
/// ```
///
/// Every line must be an entry. Unlike the policy files, blank lines and comments are errors.
#[derive(Debug, Default, Clone)]
pub struct MethodCostTable {
    costs: HashMap<String, MethodCost>,
}

impl MethodCostTable {
    pub const FILE: &'static str = "MethodCosts.txt";

    pub fn load(file: impl AsRef<Path>) -> Result<MethodCostTable, Error> {
        let file = file.as_ref();
        let text = read_resource(file)?;
        let table = MethodCostTable::parse(file, &text)?;
        log::debug!("Loaded {} method costs from {}", table.len(), file.display());
        Ok(table)
    }

    /// Parse the contents of a cost file (`file` only labels errors)
    pub fn parse(file: impl Into<PathBuf>, text: &str) -> Result<MethodCostTable, Error> {
        let file = file.into();
        let mut costs = HashMap::new();

        // `lines` already ignores the newline ending the last line
        for (idx, content) in text.lines().enumerate() {
            let line = idx + 1;
            let malformed = |message: String| Error::MalformedResource {
                file: file.clone(),
                line,
                message,
            };

            let tokens: Vec<&str> = content.split_whitespace().collect();
            let (key, cycles, ends_quantum) = match tokens[..] {
                [key, cycles, ends_quantum] => (key, cycles, ends_quantum),
                _ => {
                    return Err(malformed(format!(
                        "expected 3 tokens but found {}",
                        tokens.len()
                    )))
                }
            };

            let (class_name, method_name) = key
                .rsplit_once('/')
                .ok_or_else(|| malformed(format!("'{}' is not of the form Class/method", key)))?;
            BinaryName::check_valid(class_name).map_err(&malformed)?;
            UnqualifiedName::check_valid(method_name).map_err(&malformed)?;

            let cycles: u32 = cycles
                .parse()
                .map_err(|err| malformed(format!("bad cost '{}': {}", cycles, err)))?;
            let ends_quantum = if ends_quantum.eq_ignore_ascii_case("true") {
                true
            } else if ends_quantum.eq_ignore_ascii_case("false") {
                false
            } else {
                return Err(malformed(format!("bad boolean '{}'", ends_quantum)));
            };

            costs.insert(
                key.to_owned(),
                MethodCost {
                    cycles,
                    ends_quantum,
                },
            );
        }

        Ok(MethodCostTable { costs })
    }

    /// Cost registered under exactly this `Class/method` key
    pub fn get_raw(&self, full_name: &str) -> Option<MethodCost> {
        self.costs.get(full_name).copied()
    }

    pub fn len(&self) -> usize {
        self.costs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.costs.is_empty()
    }
}

/// Method cost lookups that fall back on inherited entries
pub struct MethodCosts<'a, S> {
    pub settings: &'a Settings,
    pub table: &'a MethodCostTable,
    pub hierarchy: &'a HierarchyCache<S>,
}

impl<'a, S: ClassSource> MethodCosts<'a, S> {
    pub fn new(
        settings: &'a Settings,
        table: &'a MethodCostTable,
        hierarchy: &'a HierarchyCache<S>,
    ) -> MethodCosts<'a, S> {
        MethodCosts {
            settings,
            table,
            hierarchy,
        }
    }

    /// Cost of calling `method_name` on `class_name`
    ///
    /// An exact entry wins, otherwise the first supertype (in hierarchy order) with an entry for
    /// the method does. Array classes never have costs. When the supertypes of the class can't be
    /// determined, a diagnostic is reported and the method is treated as free.
    pub fn lookup(&self, class_name: &str, method_name: &str) -> Option<MethodCost> {
        if class_name.starts_with('[') {
            return None;
        }

        let exact = self.table.get_raw(&format!("{}/{}", class_name, method_name));
        if exact.is_some() {
            return exact;
        }

        let supertypes = match self.hierarchy.supertypes(class_name) {
            Ok(supertypes) => supertypes,
            Err(err) => {
                self.settings
                    .reporter
                    .report(Diagnostic::HierarchyResolutionFailure {
                        class: class_name.to_owned(),
                        reason: err.to_string(),
                    });
                return None;
            }
        };

        supertypes
            .iter()
            .find_map(|supertype| self.table.get_raw(&format!("{}/{}", supertype, method_name)))
    }
}
