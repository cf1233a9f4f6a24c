//! Integration tests for the command-line interface: apply, query and check.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const APP: &str = r#"export default function App() {
  return (
    <div className="app">
      <Header />
    </div>
  );
}
"#;

const PLAN: &str = r#"[meta]
name = "guard-app"

[[requests]]
type = "wrap-element"
target = { tag = "div", identifier = "app" }
component = "AuthGuard"
import = { module = "@/components/AuthGuard", default = "AuthGuard" }
"#;

/// A project directory with a plan and two components, one nested.
fn setup_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("plan.toml"), PLAN).unwrap();

    let components = dir.path().join("src/components");
    fs::create_dir_all(&components).unwrap();
    fs::write(dir.path().join("src/App.tsx"), APP).unwrap();
    fs::write(components.join("Widget.jsx"), APP).unwrap();
    fs::write(components.join("notes.md"), "<div className=\"app\" />").unwrap();
    dir
}

fn run(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tsx-patcher"))
        .args(args)
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .output()
        .unwrap()
}

#[test]
fn apply_without_write_leaves_files_alone() {
    let dir = setup_project();
    let output = run(dir.path(), &["apply", "--plan", "plan.toml", "src", "--diff"]);

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("guard-app"));
    assert!(stdout.contains("Would change"));
    assert!(stdout.contains("+import AuthGuard from '@/components/AuthGuard';"));
    assert_eq!(fs::read_to_string(dir.path().join("src/App.tsx")).unwrap(), APP);
}

#[test]
fn apply_with_write_updates_every_component() {
    let dir = setup_project();
    let output = run(dir.path(), &["apply", "--plan", "plan.toml", "src", "--write"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    for file in ["src/App.tsx", "src/components/Widget.jsx"] {
        let code = fs::read_to_string(dir.path().join(file)).unwrap();
        assert!(code.starts_with("import AuthGuard from '@/components/AuthGuard';\n\n"));
        assert!(code.contains("<AuthGuard><div className=\"app\">"));
    }
    assert_eq!(
        fs::read_to_string(dir.path().join("src/components/notes.md")).unwrap(),
        "<div className=\"app\" />"
    );
}

#[test]
fn apply_json_reports_each_file() {
    let dir = setup_project();
    let output = run(dir.path(), &["apply", "--plan", "plan.toml", "src/App.tsx", "--json"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let report: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(report["changed"], true);
    assert_eq!(report["written"], false);
    assert_eq!(report["result"]["success"], true);
    assert!(report["result"]["errors"].as_array().unwrap().is_empty());
}

#[test]
fn apply_fails_when_generation_fails() {
    let dir = setup_project();
    fs::write(
        dir.path().join("strict.toml"),
        "[options]\nstrict_parse = true\n\n[[requests]]\ntype = \"replace-text\"\nsearch = \"a\"\nreplace = \"b\"\n",
    )
    .unwrap();
    fs::write(dir.path().join("Broken.tsx"), "const a = (;\n").unwrap();

    let output = run(dir.path(), &["apply", "--plan", "strict.toml", "Broken.tsx"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("parse failure"));
}

#[test]
fn invalid_plan_is_an_error() {
    let dir = setup_project();
    fs::write(dir.path().join("empty.toml"), "[meta]\nname = \"nothing\"\n").unwrap();

    let output = run(dir.path(), &["apply", "--plan", "empty.toml", "src"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("plan contains no requests"));
}

#[test]
fn query_finds_components_and_suggests_tags() {
    let dir = setup_project();

    let output = run(dir.path(), &["query", "src/App.tsx", "--component", "Header"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("jsx_self_closing_element@"));

    let output = run(dir.path(), &["query", "src/App.tsx", "--component", "Headr"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("did you mean <Header>?"));

    let output = run(dir.path(), &["query", "src/App.tsx", "--function", "App"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("statement_block@"));
}

#[test]
fn query_runs_sexp_queries_and_code_patterns() {
    let dir = setup_project();

    let output = run(
        dir.path(),
        &["query", "src/App.tsx", "--sexp", "(jsx_attribute (property_identifier) @attr (string) @value)"],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("@attr  className"));
    assert!(stdout.contains("@value  \"app\""));

    let output = run(dir.path(), &["query", "src/App.tsx", "--pattern", "<Header />"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("4:7  match@"));

    fs::write(
        dir.path().join("Toggle.tsx"),
        "export function Toggle() {\n  const [open, setOpen] = useState(false);\n  return null;\n}\n",
    )
    .unwrap();
    let output = run(dir.path(), &["query", "Toggle.tsx", "--pattern", "useState($INIT)"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stdout).contains("$INIT  false"));

    let output = run(dir.path(), &["query", "src/App.tsx", "--pattern", "useState($INIT)"]);
    assert!(!output.status.success());

    let output = run(dir.path(), &["query", "src/App.tsx", "--sexp", "(not_a_node) @x"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid tree-sitter query"));
}

#[test]
fn check_reports_syntax_errors() {
    let dir = setup_project();
    fs::write(dir.path().join("Broken.tsx"), "const a = 1;\nconst b = ;\n").unwrap();

    let output = run(dir.path(), &["check", "src/App.tsx"]);
    assert!(output.status.success());

    let output = run(dir.path(), &["check", "Broken.tsx"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Broken.tsx:2:"));
}
