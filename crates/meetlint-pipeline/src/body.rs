//! Keeps the markdown body of an issue in sync with its parsed fields.
//!
//! Every field lives in a `### <label>` section that runs up to the next
//! `\n###` or the end of the body.

use regex::Regex;

use meetlint_types::{BodyField, MeetlintError, MeetupIssue, Result};

/// Re-render the section of `issue.body` that holds `field` from the current
/// field value. An absent value renders as an empty section.
pub fn render_body_field(issue: &mut MeetupIssue, field: BodyField) -> Result<()> {
    let value = issue.field(field).map(|v| v.render()).unwrap_or_default();
    issue.body = replace_section(&issue.body, field.label(), value.trim())?;
    Ok(())
}

fn replace_section(body: &str, label: &str, value: &str) -> Result<String> {
    let (start, end) = locate_section(body, label)?.ok_or_else(|| {
        MeetlintError::MissingBodySection {
            field: label.to_string(),
        }
    })?;

    let mut rendered = String::with_capacity(body.len() + value.len());
    rendered.push_str(&body[..start]);
    rendered.push_str(&format!("### {label}\n\n{value}\n"));
    rendered.push_str(&body[end..]);
    Ok(rendered)
}

/// Byte range of the section headed by `label`, heading included.
fn locate_section(body: &str, label: &str) -> Result<Option<(usize, usize)>> {
    let heading = Regex::new(&format!(r"### {}\s*\n", regex::escape(label)))
        .map_err(|e| MeetlintError::Other(format!("invalid section pattern: {e}")))?;

    let Some(m) = heading.find(body) else {
        return Ok(None);
    };

    // The heading match always ends with a newline; searching from it lets an
    // empty section end right before the next heading.
    let search_from = m.end() - 1;
    let end = body[search_from..]
        .find("\n###")
        .map(|offset| search_from + offset)
        .unwrap_or(body.len());

    Ok(Some((m.start(), end)))
}
