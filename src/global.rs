//! Process-wide main scope.
//!
//! The main scope is created empty on first use and replaced by
//! [`install_main_scope`] (which [`crate::cli::parse_arguments`] calls). It is
//! never torn down.

use crate::scope::AdhocArguments;
use crate::value::ArgMap;
use once_cell::sync::Lazy;
use std::sync::{Arc, Mutex, PoisonError};

static MAIN_SCOPE: Lazy<Mutex<Option<Arc<AdhocArguments>>>> = Lazy::new(|| Mutex::new(None));

/// The current main scope, creating an empty root on first use.
pub fn main_scope() -> Arc<AdhocArguments> {
    let mut slot = MAIN_SCOPE.lock().unwrap_or_else(PoisonError::into_inner);
    Arc::clone(slot.get_or_insert_with(|| Arc::new(AdhocArguments::new(ArgMap::new()))))
}

/// Replace the main scope.
pub fn install_main_scope(scope: Arc<AdhocArguments>) {
    let mut slot = MAIN_SCOPE.lock().unwrap_or_else(PoisonError::into_inner);
    *slot = Some(scope);
}

/// Child of the main scope holding `overrides`.
pub fn from_main(overrides: ArgMap) -> AdhocArguments {
    main_scope().from_kwargs(overrides)
}

pub fn verbose_print(message: &str) {
    main_scope().verbose_print(message);
}
