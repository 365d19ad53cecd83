use std::collections::BTreeMap;

use crate::error::{AppError, AppResult, ConfigError};

/// Replaces every `{{name}}` in `input` with its value from `vars`.
///
/// Whitespace inside the braces is ignored. An unknown name or a `{{`
/// without a closing `}}` is an error; `field` names the request part in the
/// message.
///
/// # Errors
///
/// Returns `ConfigError::UnresolvedVariable` or
/// `ConfigError::UnterminatedPlaceholder`.
pub fn render_template(
    input: &str,
    vars: &BTreeMap<String, String>,
    field: &'static str,
) -> AppResult<String> {
    let mut rest = input;
    let mut output = String::with_capacity(input.len());

    while let Some(start) = rest.find("{{") {
        let (before, after_start) = rest.split_at(start);
        output.push_str(before);
        let after = after_start.get(2..).unwrap_or_default();
        let Some(end) = after.find("}}") else {
            return Err(AppError::config(ConfigError::UnterminatedPlaceholder {
                field,
            }));
        };
        let (key_part, after_end) = after.split_at(end);
        let key = key_part.trim();
        let value = vars.get(key).ok_or_else(|| {
            AppError::config(ConfigError::UnresolvedVariable {
                name: key.to_owned(),
                field,
            })
        })?;
        output.push_str(value);
        rest = after_end.get(2..).unwrap_or_default();
    }
    output.push_str(rest);

    Ok(output)
}
