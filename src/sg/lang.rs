//! Which files and grammar the engine works with.
//!
//! `SupportLang::Tsx` parses both TSX and plain JSX, so one grammar covers
//! every component file.

use std::path::Path;

pub use ast_grep_language::SupportLang;

/// File extensions treated as component sources.
pub const SOURCE_EXTENSIONS: &[&str] = &["tsx", "jsx"];

pub fn tsx() -> SupportLang {
    SupportLang::Tsx
}

/// Whether `path` names a component source by its extension.
pub fn is_component_source(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ast_grep_core::AstGrep;

    #[test]
    fn jsx_parses_with_the_tsx_grammar() {
        let sg = AstGrep::new("const x = <div className=\"a\">{items.map(i => <li>{i}</li>)}</div>;", tsx());
        assert_eq!(sg.root().kind(), "program");
        assert!(sg.root().find("items.map($FN)").is_some());
    }

    #[test]
    fn hook_patterns_bind_metavariables() {
        let sg = AstGrep::new("const [open, setOpen] = useState(false);\nuseEffect(() => { load(); }, [id]);", tsx());
        let root = sg.root();

        assert!(root.find("useState($INIT)").is_some());
        assert!(root.find("$HOOK(false)").is_some());
        assert!(root.find("useEffect($$$ARGS)").is_some());
        assert!(root.find("useReducer($$$)").is_none());
    }

    #[test]
    fn component_sources_by_extension() {
        assert!(is_component_source(Path::new("src/App.tsx")));
        assert!(is_component_source(Path::new("Widget.jsx")));
        assert!(!is_component_source(Path::new("util.ts")));
        assert!(!is_component_source(Path::new("README")));
    }
}
