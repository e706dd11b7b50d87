use std::borrow::Cow;
use std::sync::OnceLock;

use regex::{NoExpand, Regex};

pub const APP_IMPORT_REPLACEMENT: &str = "const app = require('./app');";

fn app_import_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)const app = require\(.+\);").expect("app import pattern is valid")
    })
}

/// Point the task's app import at the copy staged next to it.
///
/// Only the first matching declaration is replaced.
pub fn rewrite_app_import(source: &str) -> Cow<'_, str> {
    app_import_pattern().replacen(source, 1, NoExpand(APP_IMPORT_REPLACEMENT))
}
