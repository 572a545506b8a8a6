//! Evaluation records: a list of samples tied to a JSONL file.

use crate::datastream::{open_stream, read_jsonl, Sample};
use crate::error::{AdhocResult, ArgsError};
use crate::scope::AdhocArguments;
use crate::transform::Transform;
use log::info;
use serde_json::Value as JsonValue;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordData {
    pub path: PathBuf,
    samples: Vec<Sample>,
    /// `(model, dataset)` tags, when known.
    pub tags: Option<(String, String)>,
}

impl RecordData {
    pub fn new(path: impl Into<PathBuf>, samples: Vec<Sample>) -> Self {
        Self {
            path: path.into(),
            samples,
            tags: None,
        }
    }

    /// Read every line of a (possibly gzipped) JSONL file.
    pub fn load<P: AsRef<Path>>(path: P) -> AdhocResult<Self> {
        let path = path.as_ref();
        let samples = read_jsonl(path)?.collect::<AdhocResult<Vec<_>>>()?;
        Ok(Self::new(path, samples))
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples in `[start, end)`, clamped to the record.
    pub fn samples(&self, start: usize, end: Option<usize>) -> &[Sample] {
        let end = end.unwrap_or(self.samples.len()).min(self.samples.len());
        let start = start.min(end);
        &self.samples[start..end]
    }

    /// Values of `keys` in the first sample; absent keys read as `""`.
    pub fn get_sample(&self, keys: &[&str]) -> Vec<JsonValue> {
        let first = self.samples.first();
        keys.iter()
            .map(|key| {
                first
                    .and_then(|s| s.get(*key))
                    .cloned()
                    .unwrap_or_else(|| JsonValue::String(String::new()))
            })
            .collect()
    }

    /// Write one JSON object per line to `path`, or to the record's own path.
    pub fn save(&self, path: Option<&Path>) -> AdhocResult<()> {
        let path = path.unwrap_or(&self.path);
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| ArgsError::write(dir, e))?;
        }
        let file = File::create(path).map_err(|e| ArgsError::write(path, e))?;
        let mut writer = BufWriter::new(file);
        for sample in &self.samples {
            let line = serde_json::to_string(sample)
                .map_err(|e| ArgsError::write(path, std::io::Error::other(e)))?;
            writeln!(writer, "{}", line).map_err(|e| ArgsError::write(path, e))?;
        }
        writer.flush().map_err(|e| ArgsError::write(path, e))?;
        info!("Saved {} records to {}", self.samples.len(), path.display());
        Ok(())
    }
}

/// Relative save path for a model's results on a dataset.
pub fn save_path(model: &str, data: &str, task: Option<&str>, selfcheck: bool) -> String {
    let task = if selfcheck { Some("selfcheck") } else { task };
    match task {
        None | Some("gen") => format!("{model}/{data}_x_{model}.jsonl"),
        Some(task) => format!("{model}/{data}_{task}_x_{model}.jsonl"),
    }
}

/// Turn a dataset file into an evaluation record saved under the model's
/// directory. A JSONL file that is already a record (its first sample has
/// `dataset` and `model`) is returned as-is.
pub fn prepare_testdata(path: &str, tag: &str, args: &AdhocArguments) -> AdhocResult<RecordData> {
    let stream = open_stream(path, args)?;
    let mut samples = stream.samples()?.collect::<AdhocResult<Vec<_>>>()?;

    if path.ends_with(".jsonl") {
        if let Some(first) = samples.first() {
            if let (Some(model), Some(dataset)) = (first.get("model"), first.get("dataset")) {
                let tags = (text(model), text(dataset));
                let mut record = RecordData::new(path, samples);
                record.tags = Some(tags);
                return Ok(record);
            }
        }
    }

    Transform::from_args(args).transform_all(&mut samples)?;

    let datatag = if tag.is_empty() { stream.datatag() } else { tag.to_string() };
    let samples = samples
        .into_iter()
        .map(|sample| {
            let mut tagged = Sample::new();
            tagged.insert("dataset".to_string(), JsonValue::String(datatag.clone()));
            tagged.extend(sample);
            tagged
        })
        .collect();

    let modeltag = args.get_str("modeltag|=(model)").unwrap_or_default();
    let task = args.get_str("eval_type|=gen");
    let selfcheck = args.get_bool("selfcheck|self_check|=False").unwrap_or(false);
    let output_dir = args.get_str("output_dir|=.").unwrap_or_default();
    let relative = save_path(&modeltag, &datatag, task.as_deref(), selfcheck);

    let mut record = RecordData::new(Path::new(&output_dir).join(relative), samples);
    record.tags = Some((modeltag, datatag));
    record.save(None)?;
    Ok(record)
}

fn text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environ::MapEnv;
    use crate::value::{arg_map, ArgMap, ArgValue};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn scope(pairs: ArgMap) -> AdhocArguments {
        AdhocArguments::builder()
            .args(pairs)
            .environ(MapEnv::new())
            .build()
            .unwrap()
    }

    fn sample(value: JsonValue) -> Sample {
        match value {
            JsonValue::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_save_path_naming() {
        assert_eq!(save_path("gpt2", "jhe", None, false), "gpt2/jhe_x_gpt2.jsonl");
        assert_eq!(save_path("gpt2", "jhe", Some("gen"), false), "gpt2/jhe_x_gpt2.jsonl");
        assert_eq!(
            save_path("gpt2", "jhe", Some("choice"), false),
            "gpt2/jhe_choice_x_gpt2.jsonl"
        );
        assert_eq!(
            save_path("gpt2", "jhe", Some("gen"), true),
            "gpt2/jhe_selfcheck_x_gpt2.jsonl"
        );
    }

    #[test]
    fn test_slices_and_first_sample() {
        let record = RecordData::new(
            "r.jsonl",
            vec![sample(json!({"a": 1})), sample(json!({"a": 2})), sample(json!({"a": 3}))],
        );
        assert_eq!(record.samples(1, None).len(), 2);
        assert_eq!(record.samples(2, Some(10)).len(), 1);
        assert!(record.samples(5, Some(1)).is_empty());
        assert_eq!(record.get_sample(&["a", "b"]), vec![json!(1), json!("")]);
        assert_eq!(RecordData::default().get_sample(&["a"]), vec![json!("")]);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("r.jsonl");
        let record = RecordData::new(&path, vec![sample(json!({"text": "日本語", "n": 1}))]);
        record.save(None).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("日本語"));
        let loaded = RecordData::load(&path).unwrap();
        assert_eq!(loaded.samples(0, None), record.samples(0, None));
    }

    #[test]
    fn test_prepare_testdata_tags_and_saves() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("jqa_L2.jsonl");
        let rows = "{\"q\": \"a\", \"junk\": 0}\n{\"q\": \"b\", \"junk\": 1}\n";
        std::fs::write(&data, rows).unwrap();
        let out = dir.path().to_string_lossy().into_owned();
        let args = scope(arg_map([
            ("modeltag", ArgValue::from("m1")),
            ("transform", ArgValue::from("junk=")),
            ("output_dir", ArgValue::from(out)),
        ]));

        let record = prepare_testdata(&data.to_string_lossy(), "", &args).unwrap();
        assert_eq!(record.tags, Some(("m1".to_string(), "jqa".to_string())));
        assert_eq!(record.path, dir.path().join("m1/jqa_x_m1.jsonl"));
        assert_eq!(
            record.samples(0, Some(1))[0].keys().collect::<Vec<_>>(),
            vec!["dataset", "q"]
        );
        assert_eq!(RecordData::load(&record.path).unwrap().len(), 2);
        assert!(args.close().is_ok());
    }

    #[test]
    fn test_prepare_testdata_reuses_existing_record() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("prev.jsonl");
        let row = "{\"dataset\": \"jqa\", \"model\": \"m0\", \"output\": \"x\"}\n";
        std::fs::write(&data, row).unwrap();
        let args = scope(ArgMap::new());
        let record = prepare_testdata(&data.to_string_lossy(), "", &args).unwrap();
        assert_eq!(record.tags, Some(("m0".to_string(), "jqa".to_string())));
        assert_eq!(record.path, data);
    }
}
