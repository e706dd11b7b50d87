use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

pub const TEMPLATE_EXTENSION: &str = "html";
const TOKEN_OPEN: &str = "!{";
const TOKEN_CLOSE: char = '}';

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to read template {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Load `<template_path>.html` and substitute `data` into it.
pub fn render_html(template_path: &Path, data: &Value) -> Result<String, TemplateError> {
    let path = template_file(template_path);
    let template = fs::read_to_string(&path).map_err(|source| TemplateError::Read {
        path: path.clone(),
        source,
    })?;
    Ok(render(&template, data))
}

/// Replace every `!{name}` token with the matching value from `data`.
///
/// Substitution is literal: values are not escaped and tokens introduced by a
/// value are not expanded again. Anything other than a JSON object leaves the
/// template untouched.
pub fn render(template: &str, data: &Value) -> String {
    let Some(fields) = data.as_object() else {
        return template.to_string();
    };

    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find(TOKEN_OPEN) {
        rendered.push_str(&rest[..start]);
        let after_open = &rest[start + TOKEN_OPEN.len()..];
        let Some(end) = after_open.find(TOKEN_CLOSE) else {
            break;
        };
        match fields.get(&after_open[..end]) {
            Some(value) => {
                rendered.push_str(&display_value(value));
                rest = &after_open[end + TOKEN_CLOSE.len_utf8()..];
            }
            None => {
                rendered.push_str(TOKEN_OPEN);
                rest = after_open;
            }
        }
    }
    rendered.push_str(rest);
    rendered
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn template_file(template_path: &Path) -> PathBuf {
    let mut file = template_path.as_os_str().to_owned();
    file.push(".");
    file.push(TEMPLATE_EXTENSION);
    PathBuf::from(file)
}
