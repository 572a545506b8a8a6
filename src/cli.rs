//! Command-line front end: subcommand gate, token parsing, config expansion
//! and the required-key check.

use crate::diagnostics::{face_error, required_option_message};
use crate::environ::{Environment, ProcessEnv};
use crate::error::{AdhocResult, ArgsError};
use crate::global::install_main_scope;
use crate::scope::AdhocArguments;
use crate::tokens::parse_tokens;
use crate::value::ArgValue;
use std::sync::Arc;

/// Key under which the chosen subcommand is stored.
pub const SUBCOMMAND_KEY: &str = "subcommand";

pub struct ParseOptions {
    pub subcommands: Option<Vec<String>>,
    pub requires: Vec<String>,
    pub use_environ: bool,
    pub expand_config: Option<String>,
    environ: Arc<dyn Environment>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            subcommands: None,
            requires: Vec::new(),
            use_environ: true,
            expand_config: None,
            environ: Arc::new(ProcessEnv),
        }
    }
}

fn split_specs(specs: &str) -> Vec<String> {
    specs.split('|').filter(|s| !s.is_empty()).map(String::from).collect()
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pipe-delimited list of accepted subcommands.
    pub fn subcommands(mut self, names: &str) -> Self {
        self.subcommands = Some(split_specs(names));
        self
    }

    /// Pipe-delimited list of keys that must all be present.
    pub fn requires(mut self, keys: &str) -> Self {
        self.requires.extend(split_specs(keys));
        self
    }

    /// One required alias-spec, satisfied by any of its candidates.
    pub fn require_any(mut self, spec: impl Into<String>) -> Self {
        self.requires.push(spec.into());
        self
    }

    pub fn use_environ(mut self, enabled: bool) -> Self {
        self.use_environ = enabled;
        self
    }

    pub fn expand_config(mut self, key: impl Into<String>) -> Self {
        self.expand_config = Some(key.into());
        self
    }

    pub fn environ<E: Environment + 'static>(mut self, environ: E) -> Self {
        self.environ = Arc::new(environ);
        self
    }
}

/// Build a root scope from `argv` (program name first) without touching the
/// main scope.
pub fn parse_scope<S: AsRef<str>>(
    argv: &[S],
    options: &ParseOptions,
) -> AdhocResult<AdhocArguments> {
    let program = argv.first().map(|s| s.as_ref().to_string()).unwrap_or_default();
    let (subcommand, tokens) = match &options.subcommands {
        Some(choices) => {
            let chosen = argv.get(1).map(|s| s.as_ref());
            match chosen {
                Some(name) if choices.iter().any(|c| c == name) => {
                    (Some(name.to_string()), argv.get(2..).unwrap_or(&[]))
                }
                _ => {
                    return Err(ArgsError::MissingSubcommand {
                        program,
                        choices: choices.clone(),
                    })
                }
            }
        }
        None => (None, argv.get(1..).unwrap_or(&[])),
    };

    let mut args = parse_tokens(tokens);
    if let Some(name) = subcommand {
        args.shift_insert(0, SUBCOMMAND_KEY.to_string(), ArgValue::Str(name));
    }

    let mut builder = AdhocArguments::builder()
        .args(args)
        .use_environ(options.use_environ)
        .environ_arc(Arc::clone(&options.environ));
    if let Some(key) = &options.expand_config {
        builder = builder.expand_config(key.clone());
    }
    let scope = builder.build()?;

    let missing = missing_required(&scope, &options.requires);
    if !missing.is_empty() {
        for key in &missing {
            face_error(scope.face(), &required_option_message(key));
        }
        return Err(ArgsError::missing_required(missing));
    }
    Ok(scope)
}

/// Parse `argv`, install the result as the main scope and return it.
pub fn parse_arguments<S: AsRef<str>>(
    argv: &[S],
    options: &ParseOptions,
) -> AdhocResult<Arc<AdhocArguments>> {
    let scope = Arc::new(parse_scope(argv, options)?);
    install_main_scope(Arc::clone(&scope));
    Ok(scope)
}

/// Alias-specs none of whose candidates are contained in `scope`.
pub fn missing_required(scope: &AdhocArguments, requires: &[String]) -> Vec<String> {
    requires
        .iter()
        .filter(|spec| {
            !spec
                .split('|')
                .filter(|k| !k.is_empty() && !k.starts_with('=') && !k.starts_with('!'))
                .any(|k| scope.contains(k))
        })
        .cloned()
        .collect()
}
