//! Command-line token grammar.
//!
//! - `--key=value` or `key=value` sets `key` to the literal `value`
//! - `--key` followed by another `--` token (or nothing) is a boolean flag;
//!   `enable_`/`enable-` forces true and `disable_`/`disable-` forces false,
//!   with the prefix stripped
//! - `--key value` consumes `value`
//! - anything else is a positional file, collected under `files`
//!
//! Dashes in keys are stored as underscores.

use crate::value::{parse_literal, ArgMap, ArgValue};
use once_cell::sync::Lazy;
use regex::Regex;

static KEY_VALUE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9.\-_]+=").unwrap());

/// Key under which positional tokens are collected.
pub const FILES_KEY: &str = "files";

enum Token {
    Pair(String, ArgValue),
    Flag(String, bool),
    Consumes(String),
    File(String),
}

fn classify(token: &str, next: Option<&str>) -> Token {
    if KEY_VALUE.is_match(token) {
        let body = token.strip_prefix("--").unwrap_or(token);
        let (key, value) = body.split_once('=').unwrap_or((body, ""));
        return Token::Pair(key.to_string(), parse_literal(value));
    }
    if let Some(key) = token.strip_prefix("--") {
        if next.map_or(true, |n| n.starts_with("--")) {
            for prefix in ["enable_", "enable-"] {
                if let Some(rest) = key.strip_prefix(prefix) {
                    return Token::Flag(rest.to_string(), true);
                }
            }
            for prefix in ["disable_", "disable-"] {
                if let Some(rest) = key.strip_prefix(prefix) {
                    return Token::Flag(rest.to_string(), false);
                }
            }
            return Token::Flag(key.to_string(), true);
        }
        return Token::Consumes(key.to_string());
    }
    Token::File(token.to_string())
}

fn normalize_key(key: &str) -> String {
    key.replace('-', "_")
}

/// Parse command-line tokens (without the program name) into a mapping.
pub fn parse_tokens<S: AsRef<str>>(argv: &[S]) -> ArgMap {
    let mut args = ArgMap::new();
    let mut files = Vec::new();
    let mut i = 0;
    while i < argv.len() {
        let token = argv[i].as_ref();
        let next = argv.get(i + 1).map(|s| s.as_ref());
        match classify(token, next) {
            Token::Pair(key, value) => {
                args.insert(normalize_key(&key), value);
            }
            Token::Flag(key, value) => {
                args.insert(normalize_key(&key), ArgValue::Bool(value));
            }
            Token::Consumes(key) => {
                if let Some(next) = next {
                    args.insert(normalize_key(&key), parse_literal(next));
                }
                i += 1;
            }
            Token::File(file) => files.push(ArgValue::Str(file)),
        }
        i += 1;
    }
    if !files.is_empty() {
        args.insert(FILES_KEY.to_string(), ArgValue::List(files));
    }
    args
}
