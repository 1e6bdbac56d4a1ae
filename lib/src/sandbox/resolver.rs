use super::{Diagnostic, Error, PolicyStore, PolicyViolation, Settings, ViolationMode};
use crate::jvm::{
    BaseType, BinaryName, GenericSignature, MapClassNames, MethodDescriptor, Name,
    ParseDescriptor, ReferenceTypeSignature, RenderDescriptor,
};

/// Classes replaced by substitutes from the runtime's `lang` package, whatever the policy
///
/// Each one is a covert channel between sandboxes: the wall clock and standard streams, state
/// shared through concurrent collections and atomics, or raw memory access.
const FIXED_REDIRECTS: [BinaryName; 6] = [
    BinaryName::SYSTEM,
    BinaryName::CONCURRENTHASHMAP,
    BinaryName::ATOMICINTEGER,
    BinaryName::ATOMICLONG,
    BinaryName::ATOMICREFERENCE,
    BinaryName::UNSAFE,
];

/// Per-class state for resolving references
#[derive(Debug, Clone)]
pub struct ResolutionContext {
    /// Package of the sandbox whose code is being rewritten (eg. `team1`)
    pub sandbox: BinaryName,

    /// Don't report diagnostics (the resolution itself is unaffected)
    pub silenced: bool,

    /// Whether the allow/deny lists apply
    ///
    /// This is off when rewriting trusted runtime classes on behalf of a sandbox.
    pub enforce_policy: bool,

    violations: Vec<PolicyViolation>,
}

impl ResolutionContext {
    pub fn new(sandbox: BinaryName) -> ResolutionContext {
        ResolutionContext {
            sandbox,
            silenced: false,
            enforce_policy: true,
            violations: vec![],
        }
    }

    /// Violations deferred so far (lazy mode only), in the order they were first seen
    pub fn violations(&self) -> &[PolicyViolation] {
        &self.violations
    }

    pub fn take_violations(&mut self) -> Vec<PolicyViolation> {
        std::mem::take(&mut self.violations)
    }

    fn record_violation(&mut self, violation: PolicyViolation) {
        if !self.violations.contains(&violation) {
            self.violations.push(violation);
        }
    }
}

/// Decides what every class reference made by sandboxed code turns into
///
/// The resolver is immutable and can be shared across threads rewriting different classes.
#[derive(Clone, Copy)]
pub struct Resolver<'a> {
    pub settings: &'a Settings,
    pub policy: &'a PolicyStore,
}

impl<'a> Resolver<'a> {
    pub fn new(settings: &'a Settings, policy: &'a PolicyStore) -> Resolver<'a> {
        Resolver { settings, policy }
    }

    /// Resolve a binary class name (or an array class name like `[[Ljava/util/Map;`)
    ///
    /// Resolution is idempotent: resolving a resolved name gives back the same name.
    pub fn resolve_class(&self, name: &str, ctx: &mut ResolutionContext) -> Result<String, Error> {
        let resolved = self.resolve_class_name(name, ctx)?;
        if !ctx.silenced && resolved != name {
            self.settings.reporter.report(Diagnostic::Redirected {
                from: name.to_owned(),
                to: resolved.clone(),
            });
        }
        Ok(resolved)
    }

    fn resolve_class_name(&self, name: &str, ctx: &mut ResolutionContext) -> Result<String, Error> {
        let settings = self.settings;

        // Only the element class of an object array is resolved
        if name.starts_with('[') {
            let element = name.trim_start_matches('[');
            let dimensions = &name[..name.len() - element.len()];
            return match element.strip_prefix('L').and_then(|e| e.strip_suffix(';')) {
                Some(inner) => {
                    let inner = self.resolve_class_name(inner, ctx)?;
                    Ok(format!("{}L{};", dimensions, inner))
                }
                None => Ok(name.to_owned()),
            };
        }

        // Past this point every name is a well-formed binary name (so never `team1/../x`)
        if BinaryName::check_valid(name).is_err() {
            self.violation(name, ctx)?;
            return Ok(name.to_owned());
        }

        if ctx.sandbox.contains(name) || self.is_redirect_target(name) {
            return Ok(name.to_owned());
        }

        // Names that have already been through resolution
        if let Some(original) = settings.forbidden_namespace.strip_from(name) {
            if ctx.enforce_policy {
                self.violation(original, ctx)?;
            }
            return Ok(name.to_owned());
        }
        // `sandboxed/x` is only kept if it is what `x` itself resolves to
        if let Some(original) = settings.sandboxed_namespace.strip_from(name) {
            return self.resolve_class_name(original, ctx);
        }

        if let Some(redirect) = FIXED_REDIRECTS.iter().find(|class| class.as_str() == name) {
            return Ok(settings.runtime_lang_package.wrap(redirect.simple_name()));
        }

        if ctx.enforce_policy && !self.policy.allows(name) {
            self.violation(name, ctx)?;
            return Ok(settings.forbidden_namespace.wrap(name));
        }

        if name == BinaryName::SECURERANDOM.as_str() {
            return Ok(settings.sandboxed_namespace.wrap(BinaryName::RANDOM.as_str()));
        }

        if self.should_redirect_to_sandbox_namespace(name) {
            Ok(settings.sandboxed_namespace.wrap(name))
        } else {
            Ok(name.to_owned())
        }
    }

    /// Whether the name is the output of one of the fixed redirects
    fn is_redirect_target(&self, name: &str) -> bool {
        let settings = self.settings;
        let lang_substitute = settings
            .runtime_lang_package
            .strip_from(name)
            .map_or(false, |simple| {
                FIXED_REDIRECTS
                    .iter()
                    .any(|class| class.simple_name() == simple)
            });
        let random_substitute = settings
            .sandboxed_namespace
            .strip_from(name)
            .map_or(false, |original| original == BinaryName::RANDOM.as_str());
        lang_substitute || random_substitute
    }

    /// Report a violation and either fail (strict) or record it for later (lazy)
    fn violation(&self, class_name: &str, ctx: &mut ResolutionContext) -> Result<(), Error> {
        let violation = PolicyViolation {
            class: class_name.to_owned(),
            sandbox: ctx.sandbox.as_str().to_owned(),
        };
        match self.settings.violation_mode {
            ViolationMode::Strict => {
                if !ctx.silenced {
                    let diagnostic = Diagnostic::PolicyViolation(violation.clone());
                    self.settings.reporter.report(diagnostic);
                }
                Err(violation.into())
            }
            ViolationMode::Lazy => {
                if !ctx.silenced {
                    let diagnostic = Diagnostic::DeferredViolation(violation.clone());
                    self.settings.reporter.report(diagnostic);
                }
                ctx.record_violation(violation);
                Ok(())
            }
        }
    }

    /// Whether a class that passed the policy gets a private copy in the sandboxed namespace
    ///
    /// The rules are an explicit table of exceptions, checked top to bottom:
    ///
    /// | class                                                   | redirected |
    /// |---------------------------------------------------------|------------|
    /// | the support shim                                        | yes        |
    /// | under the runtime namespace                             | no         |
    /// | under the sandboxed namespace                           | no         |
    /// | under `java/util/jar` or `java/util/zip`, or `TimeUnit` | no         |
    /// | `java/util/Iterator`                                    | no         |
    /// | under `java/util` or `java/math`                        | yes        |
    /// | under `sun`, `com`, or `java`                           | no         |
    /// | anything else                                           | yes        |
    ///
    /// Archive classes, `TimeUnit`, and `Iterator` are shared with runtime internals that are
    /// never rewritten, so their identity has to be kept. Collections and big numbers are not
    /// safe to share between sandboxes.
    pub fn should_redirect_to_sandbox_namespace(&self, name: &str) -> bool {
        let settings = self.settings;
        if name == settings.support_shim.as_str() {
            return true;
        }
        if settings.runtime_namespace.contains(name) || settings.sandboxed_namespace.contains(name)
        {
            return false;
        }
        if BinaryName::JAVA_UTIL_JAR.contains(name)
            || BinaryName::JAVA_UTIL_ZIP.contains(name)
            || name == BinaryName::TIMEUNIT.as_str()
            || name == BinaryName::ITERATOR.as_str()
        {
            return false;
        }
        if BinaryName::JAVA_UTIL.contains(name) || BinaryName::JAVA_MATH.contains(name) {
            return true;
        }
        !(BinaryName::SUN.contains(name)
            || BinaryName::COM.contains(name)
            || BinaryName::JAVA.contains(name))
    }

    /// Resolve a single field descriptor (eg. `Ljava/util/Map;`, `[[I`)
    ///
    /// Anything outside the descriptor grammar is reported and passed through.
    pub fn resolve_class_descriptor(
        &self,
        descriptor: &str,
        ctx: &mut ResolutionContext,
    ) -> Result<String, Error> {
        if let Some(element) = descriptor.strip_prefix('[') {
            let element = element.trim_start_matches('[');
            let dimensions = &descriptor[..descriptor.len() - element.len()];
            let element = self.resolve_class_descriptor(element, ctx)?;
            return Ok(format!("{}{}", dimensions, element));
        }

        if let Some(class_name) = descriptor
            .strip_prefix('L')
            .and_then(|rest| rest.strip_suffix(';'))
            .filter(|class_name| !class_name.is_empty())
        {
            let class_name = self.resolve_class(class_name, ctx)?;
            return Ok(format!("L{};", class_name));
        }

        let mut chars = descriptor.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c == 'V' || BaseType::from_char(c).is_some() => {}
            _ => {
                if !ctx.silenced {
                    self.settings
                        .reporter
                        .report(Diagnostic::UnrecognizedDescriptor {
                            descriptor: descriptor.to_owned(),
                            sandbox: ctx.sandbox.as_str().to_owned(),
                        });
                }
            }
        }
        Ok(descriptor.to_owned())
    }

    /// Resolve every class in a method descriptor (eg. `(Ljava/util/Map;Z)Ljava/util/Set;`)
    ///
    /// A descriptor that doesn't parse is a violation. In lazy mode it is passed through.
    pub fn resolve_method_descriptor(
        &self,
        descriptor: &str,
        ctx: &mut ResolutionContext,
    ) -> Result<String, Error> {
        let parsed = match MethodDescriptor::<BinaryName>::parse(descriptor) {
            Ok(parsed) => parsed,
            Err(err) => {
                log::debug!("Malformed method descriptor {:?}: {}", descriptor, err);
                self.violation(descriptor, ctx)?;
                return Ok(descriptor.to_owned());
            }
        };

        let resolved = parsed.map_classes(|class| {
            let resolved = self.resolve_class(class.as_str(), ctx)?;
            BinaryName::from_string(resolved).map_err(Error::MalformedName)
        })?;
        Ok(resolved.render())
    }

    /// Resolve every class in a class or method generic signature
    ///
    /// Signatures are optional, so `None` stays `None`. A signature that doesn't parse is a
    /// violation. In lazy mode it resolves to `None`, and the attribute is dropped.
    pub fn resolve_method_signature(
        &self,
        signature: Option<&str>,
        ctx: &mut ResolutionContext,
    ) -> Result<Option<String>, Error> {
        self.resolve_signature::<GenericSignature>(signature, ctx)
    }

    /// Resolve every class in a field generic signature
    pub fn resolve_field_signature(
        &self,
        signature: Option<&str>,
        ctx: &mut ResolutionContext,
    ) -> Result<Option<String>, Error> {
        self.resolve_signature::<ReferenceTypeSignature>(signature, ctx)
    }

    fn resolve_signature<S>(
        &self,
        signature: Option<&str>,
        ctx: &mut ResolutionContext,
    ) -> Result<Option<String>, Error>
    where
        S: ParseDescriptor + RenderDescriptor + MapClassNames,
    {
        let signature = match signature {
            None => return Ok(None),
            Some(signature) => signature,
        };
        let mut parsed = match S::parse(signature) {
            Ok(parsed) => parsed,
            Err(err) => {
                log::debug!("Malformed signature {:?}: {}", signature, err);
                self.violation(signature, ctx)?;
                return Ok(None);
            }
        };
        parsed.map_class_names(&mut |class_name| self.resolve_class(class_name, ctx))?;
        Ok(Some(parsed.render()))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sandbox::MemoryReporter;
    use std::sync::Arc;

    fn policy() -> PolicyStore {
        PolicyStore::from_lines(
            vec!["java/util", "java/lang", "java/math", "java/security"],
            vec!["java/util/Random", "java/lang/Thread"],
        )
    }

    fn context(enforce_policy: bool) -> ResolutionContext {
        let mut ctx = ResolutionContext::new(BinaryName::from_string("team1".into()).unwrap());
        ctx.enforce_policy = enforce_policy;
        ctx
    }

    fn resolve(resolver: &Resolver, name: &str, enforce_policy: bool) -> Result<String, Error> {
        resolver.resolve_class(name, &mut context(enforce_policy))
    }

    #[test]
    fn arrays() {
        let settings = Settings::new().unwrap();
        let policy = policy();
        let resolver = Resolver::new(&settings, &policy);

        assert_eq!(resolve(&resolver, "[I", true).unwrap(), "[I");
        assert_eq!(resolve(&resolver, "[[[J", false).unwrap(), "[[[J");
        assert_eq!(
            resolve(&resolver, "[[Ljava/util/Map;", true).unwrap(),
            "[[Lsandboxed/java/util/Map;"
        );
        assert_eq!(
            resolve(&resolver, "[Lteam1/Unit;", true).unwrap(),
            "[Lteam1/Unit;"
        );
    }

    #[test]
    fn own_namespace() {
        let settings = Settings::new().unwrap();
        let policy = policy();
        let resolver = Resolver::new(&settings, &policy);

        assert_eq!(resolve(&resolver, "team1/RobotPlayer", true).unwrap(), "team1/RobotPlayer");
        assert_eq!(resolve(&resolver, "team1/a/b/C", true).unwrap(), "team1/a/b/C");
        assert!(resolve(&resolver, "team10/RobotPlayer", true).is_err());
    }

    #[test]
    fn fixed_redirects_ignore_policy() {
        let settings = Settings::new().unwrap();
        let policy = PolicyStore::default();
        let resolver = Resolver::new(&settings, &policy);

        for enforce_policy in [true, false] {
            assert_eq!(
                resolve(&resolver, "java/util/concurrent/atomic/AtomicInteger", enforce_policy)
                    .unwrap(),
                "battlecode/engine/instrumenter/lang/AtomicInteger"
            );
            assert_eq!(
                resolve(&resolver, "java/lang/System", enforce_policy).unwrap(),
                "battlecode/engine/instrumenter/lang/System"
            );
            assert_eq!(
                resolve(&resolver, "sun/misc/Unsafe", enforce_policy).unwrap(),
                "battlecode/engine/instrumenter/lang/Unsafe"
            );
        }
    }

    #[test]
    fn secure_random_after_policy() {
        let settings = Settings::new().unwrap();
        let policy = policy();
        let resolver = Resolver::new(&settings, &policy);

        assert_eq!(
            resolve(&resolver, "java/security/SecureRandom", true).unwrap(),
            "sandboxed/java/util/Random"
        );

        let strict = PolicyStore::from_lines(vec!["java/util"], vec![]);
        let resolver = Resolver::new(&settings, &strict);
        assert!(resolve(&resolver, "java/security/SecureRandom", true).is_err());
        assert_eq!(
            resolve(&resolver, "java/security/SecureRandom", false).unwrap(),
            "sandboxed/java/util/Random"
        );
    }

    #[test]
    fn prefix_table() {
        let settings = Settings::new().unwrap();
        let policy = policy();
        let resolver = Resolver::new(&settings, &policy);
        let redirected = |name| resolver.should_redirect_to_sandbox_namespace(name);

        assert!(redirected(
            "battlecode/engine/instrumenter/lang/InstrumentableFunctions"
        ));
        assert!(!redirected("battlecode/common/RobotController"));
        assert!(!redirected("sandboxed/java/util/ArrayList"));
        assert!(!redirected("java/util/jar/JarFile"));
        assert!(!redirected("java/util/zip/ZipEntry"));
        assert!(!redirected("java/util/concurrent/TimeUnit"));
        assert!(!redirected("java/util/Iterator"));
        assert!(redirected("java/util/ArrayList"));
        assert!(redirected("java/util/concurrent/Future"));
        assert!(redirected("java/math/BigInteger"));
        assert!(!redirected("java/lang/String"));
        assert!(!redirected("com/sun/Foo"));
        assert!(!redirected("sun/misc/Signal"));
        assert!(redirected("org/apache/Commons"));
        assert!(redirected("Main"));
    }

    #[test]
    fn strict_violations() {
        let reporter = Arc::new(MemoryReporter::default());
        let settings = Settings::new().unwrap().with_reporter(reporter.clone());
        let policy = PolicyStore::from_lines(vec!["java/util"], vec!["java/util/Random"]);
        let resolver = Resolver::new(&settings, &policy);

        match resolve(&resolver, "java/util/Random", true) {
            Err(Error::PolicyViolation { class, sandbox }) => {
                assert_eq!(class, "java/util/Random");
                assert_eq!(sandbox, "team1");
            }
            other => panic!("expected a violation, got {:?}", other),
        }
        assert_eq!(
            resolve(&resolver, "java/util/ArrayList", true).unwrap(),
            "sandboxed/java/util/ArrayList"
        );
        assert_eq!(
            resolve(&resolver, "java/util/Random", false).unwrap(),
            "sandboxed/java/util/Random"
        );

        let diagnostics = reporter.drain();
        assert!(matches!(
            &diagnostics[0],
            Diagnostic::PolicyViolation(PolicyViolation { class, .. }) if class == "java/util/Random"
        ));
    }

    #[test]
    fn lazy_violations() {
        let settings = Settings::new()
            .unwrap()
            .with_violation_mode(ViolationMode::Lazy);
        let policy = PolicyStore::from_lines(vec!["java/util"], vec!["java/util/Random"]);
        let resolver = Resolver::new(&settings, &policy);
        let mut ctx = context(true);

        assert_eq!(
            resolver.resolve_class("java/util/Random", &mut ctx).unwrap(),
            "forbidden/java/util/Random"
        );
        assert_eq!(
            resolver.resolve_class("[Ljava/io/File;", &mut ctx).unwrap(),
            "[Lforbidden/java/io/File;"
        );
        assert_eq!(
            resolver
                .resolve_class("forbidden/java/util/Random", &mut ctx)
                .unwrap(),
            "forbidden/java/util/Random"
        );

        let violations: Vec<&str> = ctx.violations().iter().map(|v| v.class.as_str()).collect();
        assert_eq!(violations, vec!["java/util/Random", "java/io/File"]);
        assert_eq!(ctx.take_violations().len(), 2);
        assert!(ctx.violations().is_empty());
    }

    #[test]
    fn sandboxed_names_are_still_checked() {
        let settings = Settings::new()
            .unwrap()
            .with_violation_mode(ViolationMode::Lazy);
        let policy = PolicyStore::from_lines(vec!["java/util"], vec!["java/util/HashMap"]);
        let resolver = Resolver::new(&settings, &policy);
        let mut ctx = context(true);

        assert_eq!(
            resolver
                .resolve_class("sandboxed/java/util/HashMap", &mut ctx)
                .unwrap(),
            "forbidden/java/util/HashMap"
        );
        assert_eq!(ctx.violations().len(), 1);

        let mut trusted = context(false);
        assert_eq!(
            resolver
                .resolve_class("sandboxed/java/util/HashMap", &mut trusted)
                .unwrap(),
            "sandboxed/java/util/HashMap"
        );
        assert!(trusted.violations().is_empty());
    }

    #[test]
    fn idempotence() {
        let settings = Settings::new().unwrap();
        let policy = policy();
        let resolver = Resolver::new(&settings, &policy);
        let names = [
            "java/util/ArrayList",
            "java/util/Iterator",
            "java/lang/String",
            "java/lang/System",
            "java/math/BigDecimal",
            "java/security/SecureRandom",
            "java/util/concurrent/ConcurrentHashMap",
            "team1/RobotPlayer",
            "[[Ljava/util/HashMap;",
            "[D",
        ];

        for enforce_policy in [true, false] {
            for name in names {
                let once = resolve(&resolver, name, enforce_policy).unwrap();
                let twice = resolve(&resolver, &once, enforce_policy).unwrap();
                assert_eq!(once, twice, "resolving {} twice", name);

                if let Some(unwrapped) = once.strip_prefix("sandboxed/") {
                    if !unwrapped.ends_with("Random") {
                        assert_eq!(resolve(&resolver, unwrapped, enforce_policy).unwrap(), once);
                    }
                }
            }
        }

        // The shim is outside every allowed package, so only trusted code can name it
        let shim = "battlecode/engine/instrumenter/lang/InstrumentableFunctions";
        let once = resolve(&resolver, shim, false).unwrap();
        assert_eq!(once, format!("sandboxed/{}", shim));
        assert_eq!(resolve(&resolver, &once, false).unwrap(), once);
    }

    #[test]
    fn class_descriptors() {
        let reporter = Arc::new(MemoryReporter::default());
        let settings = Settings::new().unwrap().with_reporter(reporter.clone());
        let policy = policy();
        let resolver = Resolver::new(&settings, &policy);
        let mut ctx = context(true);

        assert_eq!(
            resolver
                .resolve_class_descriptor("[[Ljava/util/Map;", &mut ctx)
                .unwrap(),
            "[[Lsandboxed/java/util/Map;"
        );
        assert_eq!(resolver.resolve_class_descriptor("[I", &mut ctx).unwrap(), "[I");
        assert_eq!(resolver.resolve_class_descriptor("Z", &mut ctx).unwrap(), "Z");
        assert_eq!(
            resolver
                .resolve_class_descriptor("Ljava/lang/String;", &mut ctx)
                .unwrap(),
            "Ljava/lang/String;"
        );
        reporter.drain();

        assert_eq!(resolver.resolve_class_descriptor("Q", &mut ctx).unwrap(), "Q");
        assert_eq!(resolver.resolve_class_descriptor("II", &mut ctx).unwrap(), "II");
        assert_eq!(resolver.resolve_class_descriptor("L;", &mut ctx).unwrap(), "L;");
        assert_eq!(reporter.drain().len(), 3);

        ctx.silenced = true;
        assert_eq!(resolver.resolve_class_descriptor("Q", &mut ctx).unwrap(), "Q");
        assert!(reporter.drain().is_empty());
    }

    #[test]
    fn method_descriptors() {
        let settings = Settings::new().unwrap();
        let policy = policy();
        let resolver = Resolver::new(&settings, &policy);
        let mut ctx = context(true);

        assert_eq!(
            resolver
                .resolve_method_descriptor("(Ljava/util/Map;Z)Ljava/util/Set;", &mut ctx)
                .unwrap(),
            "(Lsandboxed/java/util/Map;Z)Lsandboxed/java/util/Set;"
        );
        assert_eq!(
            resolver
                .resolve_method_descriptor("([[Ljava/util/List;[IJ)V", &mut ctx)
                .unwrap(),
            "([[Lsandboxed/java/util/List;[IJ)V"
        );
        assert_eq!(
            resolver.resolve_method_descriptor("()V", &mut ctx).unwrap(),
            "()V"
        );
        for malformed in ["", "(", "(Q)V", "(I)", "()VV", "Ljava/util/Map;", "(Lteam1/../X;)V"] {
            assert!(matches!(
                resolver.resolve_method_descriptor(malformed, &mut ctx),
                Err(Error::PolicyViolation { class, .. }) if class == malformed
            ));
        }
    }

    #[test]
    fn signatures() {
        let settings = Settings::new().unwrap();
        let policy = policy();
        let resolver = Resolver::new(&settings, &policy);
        let mut ctx = context(true);

        assert_eq!(resolver.resolve_field_signature(None, &mut ctx).unwrap(), None);
        assert_eq!(
            resolver
                .resolve_field_signature(
                    Some("Ljava/util/Map<Ljava/lang/String;+Ljava/util/List<*>;>;"),
                    &mut ctx
                )
                .unwrap()
                .as_deref(),
            Some("Lsandboxed/java/util/Map<Ljava/lang/String;+Lsandboxed/java/util/List<*>;>;")
        );
        assert_eq!(
            resolver
                .resolve_field_signature(Some("Ljava/util/Map$Entry<TK;TV;>;"), &mut ctx)
                .unwrap()
                .as_deref(),
            Some("Lsandboxed/java/util/Map$Entry<TK;TV;>;")
        );
        assert_eq!(
            resolver
                .resolve_field_signature(Some("Ljava/util/HashMap<TK;TV;>.KeySet;"), &mut ctx)
                .unwrap()
                .as_deref(),
            Some("Lsandboxed/java/util/HashMap<TK;TV;>.KeySet;")
        );
        assert_eq!(
            resolver
                .resolve_method_signature(
                    Some("<T::Ljava/lang/Comparable<-TT;>;>(Ljava/util/Collection<+TT;>;[TT;)TT;^Ljava/lang/Exception;"),
                    &mut ctx
                )
                .unwrap()
                .as_deref(),
            Some("<T::Ljava/lang/Comparable<-TT;>;>(Lsandboxed/java/util/Collection<+TT;>;[TT;)TT;^Ljava/lang/Exception;")
        );
        assert_eq!(
            resolver
                .resolve_method_signature(
                    Some("<E:Ljava/lang/Object;>Ljava/util/AbstractList<TE;>;Ljava/util/RandomAccess;"),
                    &mut ctx
                )
                .unwrap()
                .as_deref(),
            Some("<E:Ljava/lang/Object;>Lsandboxed/java/util/AbstractList<TE;>;Lsandboxed/java/util/RandomAccess;")
        );

        for malformed in ["Ljava/util/Map<", "TT", "<>V", "(I"] {
            assert!(matches!(
                resolver.resolve_method_signature(Some(malformed), &mut ctx),
                Err(Error::PolicyViolation { class, .. }) if class == malformed
            ));
        }
    }

    #[test]
    fn lazy_malformed_input() {
        let reporter = Arc::new(MemoryReporter::default());
        let settings = Settings::new()
            .unwrap()
            .with_violation_mode(ViolationMode::Lazy)
            .with_reporter(reporter.clone());
        let policy = PolicyStore::from_lines(vec!["java/util"], vec!["java/util/Random"]);
        let resolver = Resolver::new(&settings, &policy);
        let mut ctx = context(true);

        assert_eq!(
            resolver.resolve_method_descriptor("(Q)V", &mut ctx).unwrap(),
            "(Q)V"
        );
        assert_eq!(
            resolver
                .resolve_field_signature(Some("Ljava/util/Map<"), &mut ctx)
                .unwrap(),
            None
        );
        assert_eq!(
            resolver
                .resolve_method_signature(Some("<>V"), &mut ctx)
                .unwrap(),
            None
        );

        // Later violations are still collected
        assert_eq!(
            resolver
                .resolve_method_descriptor("(Ljava/util/Random;)V", &mut ctx)
                .unwrap(),
            "(Lforbidden/java/util/Random;)V"
        );

        let violations: Vec<&str> = ctx.violations().iter().map(|v| v.class.as_str()).collect();
        assert_eq!(
            violations,
            vec!["(Q)V", "Ljava/util/Map<", "<>V", "java/util/Random"]
        );
        let deferred = reporter
            .drain()
            .iter()
            .filter(|diagnostic| matches!(diagnostic, Diagnostic::DeferredViolation(_)))
            .count();
        assert_eq!(deferred, 4);
    }

    #[test]
    fn invalid_names() {
        let settings = Settings::new().unwrap();
        let policy = policy();
        let resolver = Resolver::new(&settings, &policy);

        for name in [
            "team1/../../../escaped",
            "team1/./Player",
            "team1//Player",
            "team1/",
            "",
            "java/util/Map;",
            "[Lteam1/../Player;",
        ] {
            for enforce_policy in [true, false] {
                assert!(
                    matches!(
                        resolve(&resolver, name, enforce_policy),
                        Err(Error::PolicyViolation { .. })
                    ),
                    "resolving {:?}",
                    name
                );
            }
        }

        let lazy = Settings::new()
            .unwrap()
            .with_violation_mode(ViolationMode::Lazy);
        let resolver = Resolver::new(&lazy, &policy);
        let mut ctx = context(true);
        assert_eq!(
            resolver
                .resolve_class("team1/../../../tmp/escaped", &mut ctx)
                .unwrap(),
            "team1/../../../tmp/escaped"
        );
        assert_eq!(ctx.violations()[0].class, "team1/../../../tmp/escaped");
    }

    #[test]
    fn sandboxed_names_resolve_like_originals() {
        let settings = Settings::new().unwrap();
        let policy = PolicyStore::from_lines(
            vec!["java/lang", "java/util", "java/util/concurrent"],
            vec![],
        );
        let resolver = Resolver::new(&settings, &policy);

        for enforce_policy in [true, false] {
            assert_eq!(
                resolve(&resolver, "sandboxed/java/lang/System", enforce_policy).unwrap(),
                "battlecode/engine/instrumenter/lang/System"
            );
            assert_eq!(
                resolve(
                    &resolver,
                    "sandboxed/java/util/concurrent/ConcurrentHashMap",
                    enforce_policy
                )
                .unwrap(),
                "battlecode/engine/instrumenter/lang/ConcurrentHashMap"
            );
            assert_eq!(
                resolve(&resolver, "sandboxed/java/lang/String", enforce_policy).unwrap(),
                "java/lang/String"
            );
            assert_eq!(
                resolve(&resolver, "sandboxed/sandboxed/java/util/List", enforce_policy).unwrap(),
                "sandboxed/java/util/List"
            );
            assert_eq!(
                resolve(&resolver, "sandboxed/java/util/ArrayList", enforce_policy).unwrap(),
                "sandboxed/java/util/ArrayList"
            );
        }
    }
}
