use serde::{Deserialize, Serialize};

/// Names of the hooks generated code calls, and the module they come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HookConfig {
    pub module: String,
    pub state: String,
    pub effect: String,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            module: "react".to_string(),
            state: "useState".to_string(),
            effect: "useEffect".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    pub hooks: HookConfig,
    /// Treat a tree containing ERROR or MISSING nodes as a parse failure.
    pub strict_parse: bool,
    /// Refuse to emit code that has more syntax errors than the input.
    pub validate_output: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            hooks: HookConfig::default(),
            strict_parse: false,
            validate_output: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_options_keep_defaults() {
        let options: SessionOptions =
            toml_edit::de::from_str("strict_parse = true\n[hooks]\nmodule = \"preact/hooks\"\n")
                .unwrap();

        assert!(options.strict_parse);
        assert!(options.validate_output);
        assert_eq!(options.hooks.module, "preact/hooks");
        assert_eq!(options.hooks.state, "useState");
    }
}
