//! User-facing messages.
//!
//! Messages are bilingual, written `日本語//English`. The `raise_*` paths in
//! [`crate::scope`] print one of these and terminate the process.

use colored::Colorize;

/// Default face printed in front of every message.
pub const DEFAULT_FACE: &str = "🦊";

pub fn face_print(face: &str, message: &str) {
    println!("{} {}", face, message);
}

pub fn face_warn(face: &str, message: &str) {
    println!("{} {}", face, message.yellow());
}

pub fn face_error(face: &str, message: &str) {
    println!("{} {}", face, message.red().bold());
}

pub fn unset_key_message(key: &str, desc_ja: Option<&str>, desc_en: Option<&str>) -> String {
    let desc_ja = desc_ja.map(|d| format!(" ({})", d)).unwrap_or_default();
    let desc_en = desc_en.map(|d| format!(" ({})", d)).unwrap_or_default();
    format!("{key}{desc_ja}を設定してください//Please set {key}{desc_en}")
}

pub fn warn_unset_message(key: &str, value: &str) -> String {
    format!("{key}を忘れずに設定してください。とりあえず{value}にしてます。//Please set {key}")
}

pub fn uninstalled_module_message(module: &str) -> String {
    format!("{module}がインストールされていません//Uninstalled {module}")
}

pub const FILES_REQUIRED_MESSAGE: &str =
    "ファイルの指定が一つ以上必要です。//At least one file must be specified.";

pub const UNUSED_HEADER: &str = "未使用のパラメータ一覧//List of unused parameters";

pub const TYPO_HINT: &str = "スペルミスがないか確認してください//Check if typos exist.";

pub fn required_option_message(key: &str) -> String {
    format!("Option {key} is required.")
}
