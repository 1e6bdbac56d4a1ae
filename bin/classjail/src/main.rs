mod error;

use classjail::jvm::class_file::ClassFile;
use classjail::jvm::{BinaryName, Name};
use classjail::sandbox::{
    ClassPath, ClassRewriter, Diagnostic, Error, HierarchyCache, LogReporter, MethodCostTable,
    MethodCosts, PolicyStore, PolicyViolation, Reporter, ResolutionContext, Resolver, Settings,
    ViolationMode,
};
use clap::{crate_version, value_parser, Arg, ArgAction, ArgMatches, Command};
use error::CliError;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::process::ExitCode;
use std::thread;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use walkdir::WalkDir;

fn main() -> ExitCode {
    env_logger::init();

    let matches = cli().get_matches();
    let result = match matches.subcommand() {
        Some(("rewrite", matches)) => rewrite(matches),
        Some(("resolve", matches)) => resolve(matches),
        Some(("cost", matches)) => cost(matches),
        _ => Err(CliError::MissingArgument("SUBCOMMAND")),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            LogReporter.report(Diagnostic::StartupFailure(err.to_string()));
            ExitCode::from(2)
        }
    }
}

fn cli() -> Command {
    let sandbox = Arg::new("sandbox")
        .long("sandbox")
        .value_name("PACKAGE")
        .required(true)
        .help("Package of the sandbox whose classes are rewritten (eg. `team1`)");
    let policy_dir = Arg::new("policy-dir")
        .long("policy-dir")
        .value_name("DIRECTORY")
        .value_parser(value_parser!(PathBuf))
        .default_value(".")
        .help("Directory containing the allow-list, deny-list, and method cost files");
    let trusted = Arg::new("trusted")
        .long("trusted")
        .action(ArgAction::SetTrue)
        .help("Treat the classes as trusted runtime code (the allow/deny lists don't apply)");

    Command::new("classjail")
        .version(crate_version!())
        .author("Alec Theriault <alec.theriault@gmail.com>")
        .about("Rewrite JVM classes so that untrusted code runs inside a sandbox")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("rewrite")
                .about("Rewrite class files (or directories of them) for a sandbox")
                .arg(sandbox.clone())
                .arg(policy_dir.clone())
                .arg(trusted.clone())
                .arg(
                    Arg::new("lazy")
                        .long("lazy")
                        .action(ArgAction::SetTrue)
                        .help("Collect violations instead of stopping at the first one"),
                )
                .arg(
                    Arg::new("silent")
                        .long("silent")
                        .action(ArgAction::SetTrue)
                        .help("Don't report redirections or unrecognized descriptors"),
                )
                .arg(
                    Arg::new("jobs")
                        .long("jobs")
                        .short('j')
                        .value_name("N")
                        .value_parser(value_parser!(usize))
                        .help("Number of worker threads (defaults to the available parallelism)"),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .value_name("DIRECTORY")
                        .value_parser(value_parser!(PathBuf))
                        .required(true)
                        .help("Directory into which rewritten classes are saved"),
                )
                .arg(
                    Arg::new("INPUT")
                        .value_parser(value_parser!(PathBuf))
                        .num_args(1..)
                        .required(true)
                        .help("Class files or directories to rewrite"),
                ),
        )
        .subcommand(
            Command::new("resolve")
                .about("Show what class names or descriptors resolve to inside a sandbox")
                .arg(sandbox)
                .arg(policy_dir.clone())
                .arg(trusted)
                .arg(
                    Arg::new("NAME")
                        .num_args(1..)
                        .required(true)
                        .help("Binary class names, field descriptors, or method descriptors"),
                ),
        )
        .subcommand(
            Command::new("cost")
                .about("Look up the cost of calling a method")
                .arg(policy_dir)
                .arg(
                    Arg::new("classpath")
                        .long("classpath")
                        .value_name("DIRECTORY")
                        .value_parser(value_parser!(PathBuf))
                        .action(ArgAction::Append)
                        .help("Directory of class files used to find supertypes"),
                )
                .arg(Arg::new("CLASS").required(true).help("Binary name of the class"))
                .arg(Arg::new("METHOD").required(true).help("Name of the method")),
        )
}

fn required<'a, T>(matches: &'a ArgMatches, id: &'static str) -> Result<&'a T, CliError>
where
    T: Clone + Send + Sync + 'static,
{
    matches
        .get_one::<T>(id)
        .ok_or(CliError::MissingArgument(id))
}

fn sandbox_context(matches: &ArgMatches) -> Result<ResolutionContext, CliError> {
    let sandbox = required::<String>(matches, "sandbox")?;
    let sandbox = BinaryName::from_string(sandbox.clone()).map_err(Error::MalformedName)?;
    let mut ctx = ResolutionContext::new(sandbox);
    ctx.enforce_policy = !matches.get_flag("trusted");
    Ok(ctx)
}

/// Outcome of rewriting one input file
struct Rewritten {
    class: String,
    violations: Vec<PolicyViolation>,
}

fn rewrite(matches: &ArgMatches) -> Result<ExitCode, CliError> {
    let policy_dir = required::<PathBuf>(matches, "policy-dir")?;
    let output = required::<PathBuf>(matches, "output")?;
    let mut ctx = sandbox_context(matches)?;
    ctx.silenced = matches.get_flag("silent");

    let violation_mode = if matches.get_flag("lazy") {
        ViolationMode::Lazy
    } else {
        ViolationMode::Strict
    };
    let settings = Settings::new()?.with_violation_mode(violation_mode);
    let policy = PolicyStore::load_from_dir(policy_dir)?;
    let rewriter = ClassRewriter::new(Resolver::new(&settings, &policy));

    let inputs = matches
        .get_many::<PathBuf>("INPUT")
        .ok_or(CliError::MissingArgument("INPUT"))?;
    let files = class_files(inputs);
    log::info!("Rewriting {} classes into {}", files.len(), output.display());

    let jobs = match matches.get_one::<usize>("jobs") {
        Some(jobs) => *jobs,
        None => thread::available_parallelism().map_or(1, |n| n.get()),
    };
    let chunk_size = ((files.len() + jobs.max(1) - 1) / jobs.max(1)).max(1);

    let rewriter = &rewriter;
    let ctx = &ctx;
    let results: Vec<(PathBuf, Result<Rewritten, CliError>)> = thread::scope(|scope| {
        let workers: Vec<_> = files
            .chunks(chunk_size)
            .map(|chunk| {
                scope.spawn(move || {
                    chunk
                        .iter()
                        .map(|path| {
                            let result = rewrite_file(rewriter, ctx.clone(), path, output);
                            (path.clone(), result)
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        workers
            .into_iter()
            .flat_map(|worker| match worker.join() {
                Ok(results) => results,
                Err(_) => {
                    log::error!("Rewriting worker panicked");
                    vec![]
                }
            })
            .collect()
    });

    let expected = files.len();
    let summary = print_results(&results)?;
    if summary.passed == expected {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Expand directories into the `.class` files inside them
fn class_files<'a>(inputs: impl Iterator<Item = &'a PathBuf>) -> Vec<PathBuf> {
    let mut files = vec![];
    for input in inputs {
        if input.is_dir() {
            files.extend(
                WalkDir::new(input)
                    .follow_links(true)
                    .sort_by_file_name()
                    .into_iter()
                    .filter_map(|entry| entry.ok())
                    .map(|entry| entry.into_path())
                    .filter(|path| {
                        path.is_file() && path.extension().map_or(false, |ext| ext == "class")
                    }),
            );
        } else {
            files.push(input.clone());
        }
    }
    files
}

fn rewrite_file(
    rewriter: &ClassRewriter,
    mut ctx: ResolutionContext,
    path: &Path,
    output: &Path,
) -> Result<Rewritten, CliError> {
    let class = ClassFile::load_from_path(path)?;
    let class = rewriter.rewrite(class, &mut ctx)?;
    let name = class.this_class_name()?.to_owned();
    class.save_to_path(output_path(output, &name)?, true)?;
    Ok(Rewritten {
        class: name,
        violations: ctx.take_violations(),
    })
}

/// Where a rewritten class is saved, which must be somewhere under `output`
fn output_path(output: &Path, class_name: &str) -> Result<PathBuf, CliError> {
    let relative = PathBuf::from(format!("{}.class", class_name));
    let contained = BinaryName::check_valid(class_name).is_ok()
        && relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
    if contained {
        Ok(output.join(relative))
    } else {
        Err(CliError::UnsafeOutputPath(class_name.to_owned()))
    }
}

struct Summary {
    passed: usize,
}

fn print_results(results: &[(PathBuf, Result<Rewritten, CliError>)]) -> Result<Summary, CliError> {
    let stdout = StandardStream::stdout(ColorChoice::Auto);
    let mut stdout = stdout.lock();
    let mut passed = 0;

    for (path, result) in results {
        match result {
            Ok(rewritten) if rewritten.violations.is_empty() => {
                passed += 1;
                stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
                write!(stdout, "rewrote")?;
                stdout.reset()?;
                writeln!(stdout, " {} ({})", rewritten.class, path.display())?;
            }
            Ok(rewritten) => {
                stdout.set_color(ColorSpec::new().set_bold(true).set_fg(Some(Color::Yellow)))?;
                write!(stdout, "violations")?;
                stdout.reset()?;
                writeln!(stdout, " {} ({})", rewritten.class, path.display())?;
                for violation in &rewritten.violations {
                    stdout.set_color(ColorSpec::new().set_dimmed(true))?;
                    writeln!(stdout, "    {}", violation)?;
                    stdout.reset()?;
                }
            }
            Err(err) => {
                stdout.set_color(ColorSpec::new().set_bold(true).set_fg(Some(Color::Red)))?;
                write!(stdout, "failed")?;
                stdout.reset()?;
                writeln!(stdout, " {}", path.display())?;
                stdout.set_color(ColorSpec::new().set_dimmed(true))?;
                writeln!(stdout, "    {}", err)?;
                stdout.reset()?;
            }
        }
    }

    stdout.set_color(ColorSpec::new().set_bold(true))?;
    writeln!(stdout, "{}/{} classes rewritten cleanly", passed, results.len())?;
    stdout.reset()?;

    Ok(Summary { passed })
}

fn resolve(matches: &ArgMatches) -> Result<ExitCode, CliError> {
    let policy_dir = required::<PathBuf>(matches, "policy-dir")?;
    let mut ctx = sandbox_context(matches)?;
    let settings = Settings::new()?.with_violation_mode(ViolationMode::Lazy);
    let policy = PolicyStore::load_from_dir(policy_dir)?;
    let resolver = Resolver::new(&settings, &policy);

    let stdout = StandardStream::stdout(ColorChoice::Auto);
    let mut stdout = stdout.lock();
    let mut clean = true;

    let names = matches
        .get_many::<String>("NAME")
        .ok_or(CliError::MissingArgument("NAME"))?;
    for name in names {
        let resolved = if name.starts_with('(') {
            resolver.resolve_method_descriptor(name, &mut ctx)
        } else if name.starts_with('L') && name.ends_with(';') {
            resolver.resolve_class_descriptor(name, &mut ctx)
        } else {
            resolver.resolve_class(name, &mut ctx)
        };

        match resolved {
            Ok(resolved) => writeln!(stdout, "{} -> {}", name, resolved)?,
            Err(err) => {
                clean = false;
                stdout.set_color(ColorSpec::new().set_fg(Some(Color::Red)))?;
                write!(stdout, "{}", name)?;
                stdout.reset()?;
                writeln!(stdout, ": {}", err)?;
            }
        }

        for violation in ctx.take_violations() {
            clean = false;
            stdout.set_color(ColorSpec::new().set_dimmed(true))?;
            writeln!(stdout, "    {}", violation)?;
            stdout.reset()?;
        }
    }

    Ok(if clean {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn cost(matches: &ArgMatches) -> Result<ExitCode, CliError> {
    let policy_dir = required::<PathBuf>(matches, "policy-dir")?;
    let class = required::<String>(matches, "CLASS")?;
    let method = required::<String>(matches, "METHOD")?;
    let classpath: Vec<PathBuf> = matches
        .get_many::<PathBuf>("classpath")
        .map(|roots| roots.cloned().collect())
        .unwrap_or_default();

    let settings = Settings::new()?;
    let table = MethodCostTable::load(policy_dir.join(MethodCostTable::FILE))?;
    log::info!("Loaded {} method costs", table.len());
    let hierarchy = HierarchyCache::new(ClassPath::new(classpath));
    let costs = MethodCosts::new(&settings, &table, &hierarchy);

    match costs.lookup(class, method) {
        Some(cost) => {
            let ends = if cost.ends_quantum {
                " (ends the quantum)"
            } else {
                ""
            };
            println!("{}/{}: {} cycles{}", class, method, cost.cycles, ends);
            Ok(ExitCode::SUCCESS)
        }
        None => {
            println!("{}/{}: no cost", class, method);
            Ok(ExitCode::FAILURE)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn output_paths_stay_in_output_directory() {
        let output = Path::new("out/a/b");
        assert_eq!(
            output_path(output, "team1/pkg/Player").unwrap(),
            Path::new("out/a/b/team1/pkg/Player.class")
        );
        assert_eq!(
            output_path(output, "team1/Player$Inner").unwrap(),
            Path::new("out/a/b/team1/Player$Inner.class")
        );

        for escaping in [
            "team1/../../../escaped",
            "../escaped",
            "team1/./Player",
            "/tmp/escaped",
            "team1//Player",
            "",
        ] {
            assert!(
                matches!(
                    output_path(output, escaping),
                    Err(CliError::UnsafeOutputPath(class)) if class == escaping
                ),
                "{:?}",
                escaping
            );
        }
    }
}
