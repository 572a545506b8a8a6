use crate::environ::MapEnv;
use crate::error::ArgsError;
use crate::scope::AdhocArguments;
use crate::value::{arg_map, ArgMap, ArgValue};
use pretty_assertions::assert_eq;
use std::io::Write;
use std::sync::Arc;

fn root(pairs: ArgMap) -> Arc<AdhocArguments> {
    Arc::new(
        AdhocArguments::builder()
            .args(pairs)
            .environ(MapEnv::new())
            .build()
            .unwrap(),
    )
}

#[test]
fn t01_managed_block_over_child_scope() {
    let parent = root(arg_map([("model_path", "gpt2"), ("batch_size", "8")]));
    let child = parent.from_kwargs(arg_map([("max_new_tokens", 32), ("tyop", 1)]));

    let result: Result<i64, ArgsError> = child.scoped(|scope| {
        let n = scope.get("max_new_tokens").and_then(|v| v.as_i64()).unwrap_or(0);
        let model = scope.get_str("model_path|model|!gpt2");
        assert_eq!(model.as_deref(), Some("gpt2"));
        Ok(n)
    });
    match result {
        Err(ArgsError::UnusedParameters { keys, .. }) => assert_eq!(keys, vec!["tyop".to_string()]),
        other => panic!("expected unused parameters, got {:?}", other),
    }
    assert_eq!(parent.unused_keys(), vec!["batch_size".to_string()]);
}

#[test]
fn t02_anyhow_errors_pass_through_scoped() {
    let scope = AdhocArguments::builder()
        .args(arg_map([("unread", true)]))
        .environ(MapEnv::new())
        .build()
        .unwrap();
    let result: anyhow::Result<()> = scope.scoped(|_| Err(anyhow::anyhow!("generation failed")));
    assert_eq!(result.unwrap_err().to_string(), "generation failed");
}

#[test]
fn t03_toml_config_then_save() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(b"seed = 7\n[generation]\ntemperature = 0.5\nstop = [\"\\n\", \"###\"]\n")
        .unwrap();
    let scope = root(ArgMap::new());
    scope.load_config(file.path(), true, false).unwrap();
    assert_eq!(scope.get("seed"), Some(ArgValue::Int(7)));
    assert_eq!(scope.get("temperature"), Some(ArgValue::Float(0.5)));
    assert_eq!(
        scope.get("stop"),
        Some(ArgValue::List(vec![ArgValue::from("\n"), ArgValue::from("###")]))
    );
    assert!(scope.close().is_ok());

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("args.json");
    scope.save_as_json(&out).unwrap();
    let saved = crate::config::load_config(&out).unwrap();
    assert_eq!(saved, scope.snapshot());
}

#[test]
fn t04_warn_default_across_children() {
    let parent = root(ArgMap::new());
    let first = parent.from_kwargs(ArgMap::new());
    let second = parent.from_kwargs(ArgMap::new());
    assert_eq!(first.get("num_return_sequences|n|!1"), Some(ArgValue::Int(1)));
    assert_eq!(first.get("num_return_sequences|n|!1"), Some(ArgValue::Int(1)));
    assert_eq!(second.get("num_return_sequences|n|!1"), Some(ArgValue::Int(1)));
    assert_eq!(first.warned_keys(), vec!["num_return_sequences".to_string()]);
    assert_eq!(second.warned_keys(), vec!["num_return_sequences".to_string()]);
    assert!(parent.warned_keys().is_empty());
}

#[test]
fn t05_subset_feeds_nested_scope() {
    let scope = root(arg_map([
        ("tokenizer_path", ArgValue::from("llm-jp/tok")),
        ("tokenizer_use_fast", ArgValue::Bool(true)),
        ("model_path", ArgValue::from("gpt2")),
    ]));
    let tokenizer_args = scope.subset("", Some("tokenizer"));
    let extras = arg_map([("padding_side", "left")]);
    let tokenizer = AdhocArguments::to_adhoc(Some(tokenizer_args), extras);
    assert_eq!(tokenizer.get_str("path"), Some("llm-jp/tok".to_string()));
    assert_eq!(tokenizer.get_bool("use_fast|=false"), Some(true));
    assert!(tokenizer.close().is_ok());
    assert_eq!(scope.unused_keys(), vec!["model_path".to_string()]);
}
