pub mod cli;
pub mod code;
pub mod config;
pub mod datastream;
pub mod diagnostics;
pub mod environ;
pub mod error;
pub mod global;
#[cfg(feature = "cli")]
pub mod logging;
pub mod record;
pub mod scope;
pub mod tokens;
pub mod transform;
pub mod units;
pub mod value;
#[cfg(test)]
mod tests;
pub use cli::{parse_arguments, parse_scope, ParseOptions, SUBCOMMAND_KEY};
pub use code::{code_fix_prompt, extract_from_code_completion, extract_python_code};
pub use config::{load_config, ConfigFormat};
pub use datastream::{open_stream, DataStream, Sample, StreamRange};
pub use environ::{Environment, MapEnv, ProcessEnv};
pub use error::{AdhocResult, ArgsError};
pub use global::{from_main, install_main_scope, main_scope, verbose_print};
pub use record::{prepare_testdata, save_path, RecordData};
pub use scope::{AdhocArguments, ScopeBuilder};
pub use tokens::parse_tokens;
pub use transform::Transform;
pub use units::{basename_from_path, format_unit, Scale};
pub use value::{arg_map, parse_literal, ArgMap, ArgValue};
