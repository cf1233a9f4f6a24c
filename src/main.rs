use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, Subcommand};
use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use tsx_patcher::config::{apply_plan_to_file, load_from_path, FileReport, PlanError};
use tsx_patcher::pool;
use tsx_patcher::sg::{is_component_source, PatternMatcher};
use tsx_patcher::ts::{NodeQuery, NodeSpan, QueryEngine, SyntaxTree};
use tsx_patcher::validate::collect_errors;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "tsx-patcher")]
#[command(about = "Structural patching for TSX/JSX components", long_about = None)]
#[command(version)]
struct Cli {
    /// Log resolution decisions (overridden by TSX_PATCHER_LOG / RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a plan file against source files or directories
    Apply {
        /// Plan file (TOML) listing the requests to apply
        #[arg(short, long)]
        plan: PathBuf,

        /// Files, or directories searched for .tsx/.jsx files
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Write generated code back to each file
        #[arg(short, long)]
        write: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,

        /// Print one JSON report per file instead of human output
        #[arg(long)]
        json: bool,
    },

    /// Look up nodes in a source file
    #[command(group(
        ArgGroup::new("lookup")
            .required(true)
            .args(["kind", "component", "function", "sexp", "pattern"])
    ))]
    Query {
        file: PathBuf,

        /// Every node of this tree-sitter kind
        #[arg(long)]
        kind: Option<String>,

        /// First element with this tag name
        #[arg(long)]
        component: Option<String>,

        /// Function or function-valued binding with this name
        #[arg(long)]
        function: Option<String>,

        /// Matches of a tree-sitter S-expression query, with their captures
        #[arg(long)]
        sexp: Option<String>,

        /// Matches of an ast-grep code pattern ($NAME, $$$ARGS), with their captures
        #[arg(long)]
        pattern: Option<String>,
    },

    /// Report syntax errors in a source file
    Check { file: PathBuf },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let ok = match cli.command {
        Commands::Apply {
            plan,
            paths,
            write,
            diff,
            json,
        } => cmd_apply(&plan, &paths, write, diff, json)?,

        Commands::Query {
            file,
            kind,
            component,
            function,
            sexp,
            pattern,
        } => {
            let lookup = match (kind, component, function, sexp, pattern) {
                (Some(kind), ..) => Lookup::Kind(kind),
                (_, Some(tag), ..) => Lookup::Component(tag),
                (_, _, Some(name), ..) => Lookup::Function(name),
                (_, _, _, Some(query), _) => Lookup::Sexp(query),
                (_, _, _, _, Some(pattern)) => Lookup::Pattern(pattern),
                _ => anyhow::bail!("one of --kind, --component, --function, --sexp or --pattern is required"),
            };
            cmd_query(&file, lookup)?
        }

        Commands::Check { file } => cmd_check(&file)?,
    };

    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "tsx_patcher=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("TSX_PATCHER_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Expand directories into the .tsx/.jsx files below them, sorted.
fn collect_sources(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }

        let mut found = Vec::new();
        let walker = WalkDir::new(path)
            .into_iter()
            .filter_entry(|entry| entry.file_name() != "node_modules");
        for entry in walker {
            let entry = entry.with_context(|| format!("walking {}", path.display()))?;
            if entry.file_type().is_file() && is_component_source(entry.path()) {
                found.push(entry.into_path());
            }
        }
        found.sort();
        files.extend(found);
    }

    if files.is_empty() {
        anyhow::bail!("no .tsx or .jsx files found");
    }
    Ok(files)
}

/// Helper: Show unified diff between original and generated content
fn display_diff(file: &Path, original: &str, generated: &str) {
    println!("\n{}", format!("--- {} (original)", file.display()).dimmed());
    println!("{}", format!("+++ {} (generated)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, generated);
    for change in diff.iter_all_changes() {
        let line = match change.tag() {
            ChangeTag::Delete => format!("-{change}").red(),
            ChangeTag::Insert => format!("+{change}").green(),
            ChangeTag::Equal => format!(" {change}").normal(),
        };
        print!("{line}");
    }
}

fn cmd_apply(plan_path: &Path, paths: &[PathBuf], write: bool, show_diff: bool, json: bool) -> Result<bool> {
    let plan = load_from_path(plan_path)?;
    let files = collect_sources(paths)?;

    if !json {
        let name = if plan.meta.name.is_empty() {
            plan_path.display().to_string()
        } else {
            plan.meta.name.clone()
        };
        println!("Plan: {} ({} request(s))", name, plan.requests.len());
        println!();
    }

    let mut total_changed = 0;
    let mut total_unchanged = 0;
    let mut total_failed = 0;

    for file in &files {
        let report = match apply_plan_to_file(&plan, file, write) {
            Ok(report) => report,
            Err(e @ PlanError::AmbiguousImport { .. }) => return Err(e.into()),
            Err(e) => {
                eprintln!("{} {}", "✗".red(), e);
                total_failed += 1;
                continue;
            }
        };

        if !report.result.success {
            total_failed += 1;
        } else if report.changed() {
            total_changed += 1;
        } else {
            total_unchanged += 1;
        }

        if json {
            println!("{}", json_report(&report)?);
        } else {
            print_report(&report, write);
            if show_diff && report.changed() {
                if let Some(code) = &report.result.code {
                    display_diff(&report.file, &report.original, code);
                }
            }
        }
    }

    if !json {
        println!();
        let verb = if write { "changed" } else { "would change" };
        println!(
            "{}: {} {}, {} unchanged, {} failed",
            "Summary".bold(),
            total_changed.to_string().green(),
            verb,
            total_unchanged.to_string().yellow(),
            total_failed.to_string().red(),
        );
    }

    Ok(total_failed == 0)
}

fn print_report(report: &FileReport, write: bool) {
    let file = report.file.display();
    if !report.result.success {
        eprintln!("{} {}: generation failed", "✗".red(), file);
    } else if report.changed() {
        let verb = if report.written {
            "Written"
        } else if write {
            "Changed"
        } else {
            "Would change"
        };
        println!("{} {}: {}", "✓".green(), file, verb);
    } else {
        println!("{} {}: No changes", "⊙".yellow(), file);
    }

    for message in report.result.error_messages() {
        eprintln!("    {} {}", "!".yellow(), message);
    }
}

fn json_report(report: &FileReport) -> Result<String> {
    let value = serde_json::json!({
        "file": report.file,
        "changed": report.changed(),
        "written": report.written,
        "result": report.result,
    });
    Ok(serde_json::to_string(&value)?)
}

fn parse_file(file: &Path) -> Result<SyntaxTree> {
    let source = fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    Ok(pool::parse(&source)?)
}

/// 1-based line and column of a byte offset.
fn position(source: &str, offset: usize) -> (usize, usize) {
    let before = &source[..offset];
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    (before.matches('\n').count() + 1, offset - line_start + 1)
}

fn print_node(tree: &SyntaxTree, span: &NodeSpan) {
    let text = &tree.source()[span.byte_start..span.byte_end];
    let first_line = text.lines().next().unwrap_or_default();
    let (line, column) = position(tree.source(), span.byte_start);
    println!(
        "{}:{}  {}  {}",
        line,
        column,
        span.to_string().cyan(),
        first_line.dimmed()
    );
}

fn print_capture(name: &str, text: &str) {
    let first_line = text.lines().next().unwrap_or_default();
    println!("    {}  {}", name.yellow(), first_line);
}

enum Lookup {
    Kind(String),
    Component(String),
    Function(String),
    Sexp(String),
    Pattern(String),
}

fn cmd_query(file: &Path, lookup: Lookup) -> Result<bool> {
    let tree = parse_file(file)?;
    let query = NodeQuery::new(&tree);

    let nodes = match lookup {
        Lookup::Kind(kind) => query.find_nodes(&kind),
        Lookup::Sexp(source) => {
            let engine = QueryEngine::new(&source)?;
            let matches = engine.find_all(&tree);
            for m in &matches {
                print_node(&tree, &NodeSpan::new("match", m.byte_start, m.byte_end));
                for capture in &m.captures {
                    print_capture(&format!("@{}", capture.name), &capture.text);
                }
            }
            return Ok(!matches.is_empty());
        }
        Lookup::Pattern(pattern) => {
            let matches = PatternMatcher::new(tree.source()).find_all(&pattern)?;
            for m in &matches {
                print_node(&tree, &NodeSpan::new("match", m.byte_start, m.byte_end));
                for (name, text) in &m.captures {
                    print_capture(&format!("${name}"), text);
                }
            }
            return Ok(!matches.is_empty());
        }
        Lookup::Component(tag) => match query.find_component(&tag) {
            Some(node) => vec![node],
            None => {
                match query.suggest_tag(&tag) {
                    Some(suggestion) => eprintln!(
                        "{} no <{}> element (did you mean <{}>?)",
                        "✗".red(),
                        tag,
                        suggestion
                    ),
                    None => eprintln!("{} no <{}> element", "✗".red(), tag),
                }
                return Ok(false);
            }
        },
        Lookup::Function(name) => match query.find_function(&name) {
            Some(found) => vec![found.declaration, found.body],
            None => {
                eprintln!("{} no function named {}", "✗".red(), name);
                return Ok(false);
            }
        },
    };

    for node in &nodes {
        print_node(&tree, &NodeSpan::from(*node));
    }
    Ok(!nodes.is_empty())
}

fn cmd_check(file: &Path) -> Result<bool> {
    let tree = parse_file(file)?;
    let errors = collect_errors(&tree);

    if errors.is_empty() {
        println!("{} {}: no syntax errors", "✓".green(), file.display());
        return Ok(true);
    }

    for error in &errors {
        println!(
            "{}:{}:{}: {} near `{}`",
            file.display(),
            error.line,
            error.column,
            "syntax error".red(),
            error.context
        );
    }
    println!("{} syntax error(s)", errors.len());
    Ok(false)
}
