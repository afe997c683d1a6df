//! Header (frontmatter) field edits.

use crate::error::Result;
use crate::parser::frontmatter::{
    parse_yaml_mapping, remove_yaml_key, replace_frontmatter, set_yaml_key, split_frontmatter,
};
use serde_yaml::Value;
use std::path::Path;

/// Set `key` to `value`, creating the header block if the note has none.
///
/// Keys other than `key` keep their exact bytes and order.
pub fn set_field(content: &str, path: &Path, key: &str, value: &Value) -> Result<String> {
    let yaml = existing_yaml(content, path)?;
    let new_yaml = set_yaml_key(yaml.unwrap_or(""), key, value)?;
    parse_yaml_mapping(&new_yaml, path)?;
    Ok(replace_frontmatter(content, &new_yaml))
}

/// Remove `key`. A missing key (or header) leaves the content unchanged.
pub fn remove_field(content: &str, path: &Path, key: &str) -> Result<String> {
    let Some(yaml) = existing_yaml(content, path)? else {
        return Ok(content.to_string());
    };
    match remove_yaml_key(yaml, key) {
        Some(new_yaml) => Ok(replace_frontmatter(content, &new_yaml)),
        None => Ok(content.to_string()),
    }
}

/// Interpret a command-line value as YAML: `3` is a number, `[a, b]` a list,
/// anything unparseable a plain string.
pub fn parse_value_arg(raw: &str) -> Value {
    match serde_yaml::from_str::<Value>(raw) {
        Ok(Value::Null) if !raw.trim().is_empty() && raw.trim() != "null" && raw.trim() != "~" => {
            Value::String(raw.to_string())
        }
        Ok(value) => value,
        Err(_) => Value::String(raw.to_string()),
    }
}

// Refuse to edit a header that does not parse; rewriting it could lose data.
fn existing_yaml<'a>(content: &'a str, path: &Path) -> Result<Option<&'a str>> {
    let split = split_frontmatter(content);
    if let Some(yaml) = split.yaml {
        parse_yaml_mapping(yaml, path)?;
    }
    Ok(split.yaml)
}
