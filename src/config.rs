//! Config file loading.
//!
//! JSON files are read as a flat mapping. YAML and TOML files are organised as
//! `section -> {key: value}`; section names are discarded and all nested pairs
//! land in one namespace, later sections overwriting earlier ones.

use crate::error::{AdhocResult, ArgsError};
use crate::value::{ArgMap, ArgValue};
use log::{debug, warn};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
    Toml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.to_string_lossy();
        if name.ends_with(".json") {
            Some(ConfigFormat::Json)
        } else if name.ends_with(".yaml") || name.ends_with(".yml") {
            Some(ConfigFormat::Yaml)
        } else if name.ends_with(".toml") {
            Some(ConfigFormat::Toml)
        } else {
            None
        }
    }

    fn name(&self) -> &'static str {
        match self {
            ConfigFormat::Json => "JSON",
            ConfigFormat::Yaml => "YAML",
            ConfigFormat::Toml => "TOML",
        }
    }
}

/// Load a config file into a flat mapping. Unknown extensions yield an
/// empty mapping.
pub fn load_config<P: AsRef<Path>>(path: P) -> AdhocResult<ArgMap> {
    let path = path.as_ref();
    let Some(format) = ConfigFormat::from_path(path) else {
        warn!("Ignoring config file with unknown extension: {}", path.display());
        return Ok(ArgMap::new());
    };
    let content = fs::read_to_string(path).map_err(|e| ArgsError::config_read(path, e))?;
    let loaded = parse_config(&content, format, path)?;
    debug!("Loaded {} keys from {} config {}", loaded.len(), format.name(), path.display());
    Ok(loaded)
}

/// Parse config text of a known format. `origin` is only used in errors.
pub fn parse_config(content: &str, format: ConfigFormat, origin: &Path) -> AdhocResult<ArgMap> {
    match format {
        ConfigFormat::Json => parse_json(content, origin),
        ConfigFormat::Yaml => parse_yaml(content, origin),
        ConfigFormat::Toml => parse_toml(content, origin),
    }
}

fn parse_json(content: &str, origin: &Path) -> AdhocResult<ArgMap> {
    let value: serde_json::Value = serde_json::from_str(content)
        .map_err(|e| ArgsError::config_parse(origin, "JSON", e))?;
    match value {
        serde_json::Value::Object(map) => Ok(map
            .into_iter()
            .filter_map(|(k, v)| ArgValue::from_json(v).map(|v| (k, v)))
            .collect()),
        other => Err(ArgsError::ConfigShape {
            path: origin.to_path_buf(),
            details: format!("expected an object at the top level, found {}", json_kind(&other)),
        }),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

fn parse_yaml(content: &str, origin: &Path) -> AdhocResult<ArgMap> {
    let value: serde_yaml::Value = serde_yaml::from_str(content)
        .map_err(|e| ArgsError::config_parse(origin, "YAML", e))?;
    let sections = match value {
        serde_yaml::Value::Mapping(sections) => sections,
        // An empty document
        serde_yaml::Value::Null => return Ok(ArgMap::new()),
        _ => {
            return Err(ArgsError::ConfigShape {
                path: origin.to_path_buf(),
                details: "expected a mapping of sections".to_string(),
            })
        }
    };
    let mut loaded = ArgMap::new();
    for (_section, settings) in sections {
        if let serde_yaml::Value::Mapping(settings) = settings {
            for (key, value) in settings {
                let Some(key) = yaml_key(&key) else { continue };
                if let Some(value) = from_yaml(value) {
                    loaded.insert(key, value);
                }
            }
        }
    }
    Ok(loaded)
}

fn yaml_key(key: &serde_yaml::Value) -> Option<String> {
    match key {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn from_yaml(value: serde_yaml::Value) -> Option<ArgValue> {
    use serde_yaml::Value;
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(ArgValue::Bool(b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(ArgValue::Int(i)),
            None => n.as_f64().map(ArgValue::Float),
        },
        Value::String(s) => Some(ArgValue::Str(s)),
        Value::Sequence(items) => Some(ArgValue::List(
            items.into_iter().filter_map(from_yaml).collect(),
        )),
        Value::Mapping(map) => Some(ArgValue::Map(
            map.into_iter()
                .filter_map(|(k, v)| Some((yaml_key(&k)?, from_yaml(v)?)))
                .collect(),
        )),
        Value::Tagged(tagged) => from_yaml(tagged.value),
    }
}

fn parse_toml(content: &str, origin: &Path) -> AdhocResult<ArgMap> {
    let table: toml::Table = content
        .parse()
        .map_err(|e| ArgsError::config_parse(origin, "TOML", e))?;
    let mut loaded = ArgMap::new();
    for (key, value) in table {
        match value {
            toml::Value::Table(settings) => {
                for (key, value) in settings {
                    loaded.insert(key, from_toml(value));
                }
            }
            scalar => {
                loaded.insert(key, from_toml(scalar));
            }
        }
    }
    Ok(loaded)
}

fn from_toml(value: toml::Value) -> ArgValue {
    match value {
        toml::Value::String(s) => ArgValue::Str(s),
        toml::Value::Integer(n) => ArgValue::Int(n),
        toml::Value::Float(x) => ArgValue::Float(x),
        toml::Value::Boolean(b) => ArgValue::Bool(b),
        toml::Value::Datetime(dt) => ArgValue::Str(dt.to_string()),
        toml::Value::Array(items) => ArgValue::List(items.into_iter().map(from_toml).collect()),
        toml::Value::Table(table) => ArgValue::Map(
            table.into_iter().map(|(k, v)| (k, from_toml(v))).collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::arg_map;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_json_is_flat() {
        let file = write_temp(".json", r#"{"model": "gpt2", "max_length": 512, "skip": null}"#);
        let loaded = load_config(file.path()).unwrap();
        assert_eq!(
            loaded,
            arg_map([("model", ArgValue::from("gpt2")), ("max_length", ArgValue::Int(512))])
        );
    }

    #[test]
    fn test_json_top_level_must_be_object() {
        let file = write_temp(".json", "[1, 2]");
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ArgsError::ConfigShape { .. }));
    }

    #[test]
    fn test_yaml_sections_are_flattened() {
        let yaml = "\
model:
  model_path: kkuramitsu/chico-0.03b
  max_new_tokens: 256
data:
  dataset: openai_humaneval
  max_new_tokens: 128
version: 3
";
        let file = write_temp(".yaml", yaml);
        let loaded = load_config(file.path()).unwrap();
        assert_eq!(
            loaded,
            arg_map([
                ("model_path", ArgValue::from("kkuramitsu/chico-0.03b")),
                ("max_new_tokens", ArgValue::Int(128)),
                ("dataset", ArgValue::from("openai_humaneval")),
            ])
        );
    }

    #[test]
    fn test_toml_sections_are_flattened() {
        let toml = "\
seed = 42

[eval]
metric = \"pass@1\"
test_run = 4
";
        let file = write_temp(".toml", toml);
        let loaded = load_config(file.path()).unwrap();
        assert_eq!(
            loaded,
            arg_map([
                ("seed", ArgValue::Int(42)),
                ("metric", ArgValue::from("pass@1")),
                ("test_run", ArgValue::Int(4)),
            ])
        );
    }

    #[test]
    fn test_toml_later_section_wins_in_file_order() {
        let toml = "\
[zeta]
lr = 1
warmup = 10

[alpha]
lr = 2
batch_size = 8
";
        let loaded = parse_config(toml, ConfigFormat::Toml, Path::new("train.toml")).unwrap();
        assert_eq!(loaded.get("lr"), Some(&ArgValue::Int(2)));
        assert_eq!(
            loaded.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["lr", "warmup", "batch_size"]
        );

        let yaml = "zeta:\n  lr: 1\n  warmup: 10\nalpha:\n  lr: 2\n  batch_size: 8\n";
        let from_yaml = parse_config(yaml, ConfigFormat::Yaml, Path::new("train.yaml")).unwrap();
        assert_eq!(
            from_yaml.iter().collect::<Vec<_>>(),
            loaded.iter().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_unknown_extension_is_empty() {
        let file = write_temp(".ini", "a=1");
        assert!(load_config(file.path()).unwrap().is_empty());
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = load_config("/nonexistent/dir/conf.json").unwrap_err();
        assert!(matches!(err, ArgsError::ConfigRead { .. }));
    }

    #[test]
    fn test_malformed_yaml_is_parse_error() {
        let file = write_temp(".yaml", "a: [1, 2\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ArgsError::ConfigParse { .. }));
    }
}
