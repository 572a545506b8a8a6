//! Python code extraction from model completions.
//!
//! Completions mix code with prose, markdown fences and half-finished
//! statements. These helpers keep the parts that parse as Python.

use rustpython_parser::{ast, Parse};

/// Sequences that end the first top-level definition of a code completion.
pub const STOP_SEQUENCES: [&str; 7] =
    ["\nclass", "\ndef", "\n#", "\n@", "\nprint", "\nif", "\n```"];

/// Stack traces longer than this are cut in [`code_fix_prompt`].
pub const STACK_TRACE_LIMIT: usize = 256;

/// 1-based line of the first syntax error in `code`, or `None` if it parses.
pub fn syntax_error_line(code: &str) -> Option<usize> {
    let err = ast::Suite::parse(code, "<completion>").err()?;
    let offset = (u32::from(err.offset) as usize).min(code.len());
    let newlines = code.as_bytes()[..offset].iter().filter(|b| **b == b'\n').count();
    Some(newlines + 1)
}

/// Drop trailing lines until `code` parses. `None` when no prefix does.
pub fn clean_code(code: &str) -> Option<&str> {
    let mut code = code;
    loop {
        if syntax_error_line(code).is_none() {
            return Some(code);
        }
        let (head, _) = code.rsplit_once('\n')?;
        code = head;
    }
}

/// Join the runs of lines in `text` that parse as Python.
pub fn extract_python_code(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut result: Vec<String> = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        if lines[i].trim().is_empty() {
            i += 1;
            continue;
        }
        let code = lines[i..].join("\n");
        match syntax_error_line(&code) {
            None => {
                result.push(code);
                break;
            }
            Some(1) => i += 1,
            Some(next) => {
                let end = (i + next - 1).min(lines.len());
                if let Some(cleaned) = clean_code(&lines[i..end].join("\n")) {
                    result.push(cleaned.to_string());
                }
                i += next;
            }
        }
    }
    result.join("\n")
}

/// Cut `generated` at the earliest stop sequence, prepend the prompt and
/// extract the code.
pub fn extract_from_code_completion(prompt: &str, generated: &str) -> String {
    let stop = STOP_SEQUENCES
        .iter()
        .filter_map(|seq| generated.find(seq))
        .min()
        .unwrap_or(generated.len());
    extract_python_code(&format!("{}\n{}", prompt, &generated[..stop]))
}

/// Prompt asking a model to repair `code` after it failed with `error_message`.
pub fn code_fix_prompt(code: &str, error_message: &str, stack_trace: &str) -> String {
    let stack_trace = match stack_trace.char_indices().nth(STACK_TRACE_LIMIT) {
        Some((cut, _)) => &stack_trace[..cut],
        None => stack_trace,
    };
    format!(
        "The following error has occurred. \n\
         Please fix the code so that it can be executed without errors.\n\
         \n\
         ### Error\n\
         {error_message}\n\
         {stack_trace}\n\
         \n\
         ### Code\n\
         {code}\n\
         \n"
    )
}
