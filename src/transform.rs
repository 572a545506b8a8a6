//! Per-sample reshaping rules.
//!
//! A transform string is a pipe list of rules:
//!
//! - `new=old` copies field `old` into `new`
//! - `new=` (or a bare `new`) removes `new`
//! - `new=... {field} ...` fills a template from the sample
//!
//! An optional comma list of columns then projects and orders the result.

use crate::datastream::{Sample, SampleIter};
use crate::error::{AdhocResult, ArgsError};
use crate::scope::AdhocArguments;
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, PartialEq)]
enum Rule {
    Remove(String),
    Copy { key: String, from: String },
    Template { key: String, format: String },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transform {
    rules: Vec<Rule>,
    columns: Option<Vec<String>>,
}

impl Transform {
    pub fn new(transforms: Option<&str>, columns: Option<&str>) -> Self {
        let rules = transforms
            .map(|spec| {
                spec.split('|')
                    .filter(|r| !r.is_empty())
                    .map(|rule| {
                        let (key, format) = rule.split_once('=').unwrap_or((rule, ""));
                        let key = key.to_string();
                        let format = format.replace("\\n", "\n");
                        if format.is_empty() {
                            Rule::Remove(key)
                        } else if format.contains('{') {
                            Rule::Template { key, format }
                        } else {
                            Rule::Copy { key, from: format }
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();
        let columns = columns.map(|c| {
            c.split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(String::from)
                .collect()
        });
        Self { rules, columns }
    }

    /// Reads `transform` and `columns` from the scope.
    pub fn from_args(args: &AdhocArguments) -> Self {
        let transforms = args.get_str("transform");
        let columns = args.get_str("columns");
        Self::new(transforms.as_deref(), columns.as_deref())
    }

    pub fn is_identity(&self) -> bool {
        self.rules.is_empty() && self.columns.is_none()
    }

    pub fn transform_sample(&self, sample: &mut Sample) -> AdhocResult<()> {
        for rule in &self.rules {
            match rule {
                Rule::Remove(key) => {
                    sample.shift_remove(key);
                }
                Rule::Copy { key, from } => {
                    let value = sample
                        .get(from)
                        .cloned()
                        .ok_or_else(|| missing_column(from, sample))?;
                    sample.insert(key.clone(), value);
                }
                Rule::Template { key, format } => {
                    let text = fill_template(format, sample)?;
                    sample.insert(key.clone(), JsonValue::String(text));
                }
            }
        }
        if let Some(columns) = &self.columns {
            let mut projected = Sample::new();
            for column in columns {
                let value = sample
                    .get(column)
                    .cloned()
                    .ok_or_else(|| missing_column(column, sample))?;
                projected.insert(column.clone(), value);
            }
            *sample = projected;
        }
        Ok(())
    }

    pub fn transform_all(&self, samples: &mut [Sample]) -> AdhocResult<()> {
        samples.iter_mut().try_for_each(|s| self.transform_sample(s))
    }

    /// Lazily transform a sample stream.
    pub fn transform_iter(self, samples: SampleIter) -> SampleIter {
        Box::new(samples.map(move |sample| {
            let mut sample = sample?;
            self.transform_sample(&mut sample)?;
            Ok(sample)
        }))
    }
}

fn missing_column(column: &str, sample: &Sample) -> ArgsError {
    ArgsError::MissingColumn {
        column: column.to_string(),
        available: sample.keys().cloned().collect(),
    }
}

fn field_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Fill `{field}` placeholders from `sample`. `{{` and `}}` are literal braces.
pub fn fill_template(format: &str, sample: &Sample) -> AdhocResult<String> {
    let template_error = |message: &str| ArgsError::Template {
        format: format.to_string(),
        message: message.to_string(),
    };
    let mut out = String::with_capacity(format.len());
    let mut chars = format.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '{' => {
                let mut field = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(c) => field.push(c),
                        None => return Err(template_error("unclosed '{'")),
                    }
                }
                let value = sample
                    .get(&field)
                    .ok_or_else(|| missing_column(&field, sample))?;
                out.push_str(&field_text(value));
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '}' => return Err(template_error("single '}' encountered")),
            c => out.push(c),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample(value: JsonValue) -> Sample {
        match value {
            JsonValue::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_copy_remove_and_template() {
        let rules = "input=question|answer=|prompt=Q: {question}\\nA:";
        let transform = Transform::new(Some(rules), None);
        let mut s = sample(json!({"question": "1+1?", "answer": 2}));
        transform.transform_sample(&mut s).unwrap();
        assert_eq!(
            JsonValue::Object(s),
            json!({"question": "1+1?", "input": "1+1?", "prompt": "Q: 1+1?\nA:"})
        );
    }

    #[test]
    fn test_bare_key_removes() {
        let transform = Transform::new(Some("noise"), None);
        let mut s = sample(json!({"a": 1, "noise": 2, "b": 3}));
        transform.transform_sample(&mut s).unwrap();
        assert_eq!(s.keys().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_columns_project_and_order() {
        let transform = Transform::new(None, Some("b, a"));
        let mut s = sample(json!({"a": 1, "b": 2, "c": 3}));
        transform.transform_sample(&mut s).unwrap();
        assert_eq!(s.keys().collect::<Vec<_>>(), vec!["b", "a"]);
    }

    #[test]
    fn test_missing_column_lists_available() {
        let transform = Transform::new(Some("x=nope"), None);
        let mut s = sample(json!({"a": 1}));
        match transform.transform_sample(&mut s) {
            Err(ArgsError::MissingColumn { column, available }) => {
                assert_eq!(column, "nope");
                assert_eq!(available, vec!["a".to_string()]);
            }
            other => panic!("expected missing column, got {:?}", other),
        }
    }

    #[test]
    fn test_template_escapes_and_errors() {
        let s = sample(json!({"n": 3}));
        assert_eq!(fill_template("{{n}}={n}", &s).unwrap(), "{n}=3");
        assert!(matches!(fill_template("{n", &s), Err(ArgsError::Template { .. })));
        assert!(matches!(fill_template("n}", &s), Err(ArgsError::Template { .. })));
    }

    #[test]
    fn test_from_args_marks_keys_used() {
        let args = AdhocArguments::builder()
            .args(crate::value::arg_map([("transform", "x=a"), ("columns", "x")]))
            .environ(crate::environ::MapEnv::new())
            .build()
            .unwrap();
        let transform = Transform::from_args(&args);
        assert!(!transform.is_identity());
        assert!(args.close().is_ok());

        let mut samples = vec![sample(json!({"a": 1, "b": 2}))];
        transform.transform_all(&mut samples).unwrap();
        assert_eq!(JsonValue::Object(samples.remove(0)), json!({"x": 1}));
    }
}
