//! The INI grammar itself.

use std::collections::BTreeMap;

use super::ConfigFileError;

/// An opaque key→value map for one `[section]`.
pub type Section = BTreeMap<String, String>;

/// A parsed INI file: section name → key → value. Unknown sections are
/// kept verbatim so callers (e.g. the SSO provider's `[sso-session X]`
/// lookup) can read sections this parser has no special knowledge of.
#[derive(Debug, Default, Clone)]
pub struct IniFile {
    sections: BTreeMap<String, Section>,
}

impl IniFile {
    pub fn parse(content: &str) -> Result<Self, ConfigFileError> {
        let mut sections: BTreeMap<String, Section> = BTreeMap::new();
        let mut current: Option<String> = None;

        for (idx, raw_line) in content.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw_line.trim();

            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(stripped) = line.strip_prefix('[') {
                let name = stripped.strip_suffix(']').ok_or_else(|| ConfigFileError::InvalidSyntax {
                    line: line_no,
                    reason: "unterminated section header".to_string(),
                })?;
                let name = name.trim().to_string();
                sections.entry(name.clone()).or_default();
                current = Some(name);
                continue;
            }

            let Some(section_name) = current.clone() else {
                return Err(ConfigFileError::InvalidSyntax {
                    line: line_no,
                    reason: "key-value pair outside of any section".to_string(),
                });
            };

            let (key, value) = split_key_value(line, line_no)?;
            sections.entry(section_name).or_default().insert(key, value);
        }

        Ok(Self { sections })
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }

    pub fn sections(&self) -> impl Iterator<Item = (&String, &Section)> {
        self.sections.iter()
    }
}

fn split_key_value(line: &str, line_no: usize) -> Result<(String, String), ConfigFileError> {
    let eq_pos = line.find('=').ok_or_else(|| ConfigFileError::InvalidSyntax {
        line: line_no,
        reason: "expected `key = value`".to_string(),
    })?;
    let key = line[..eq_pos].trim().to_string();
    let raw_value = line[eq_pos + 1..].trim();
    let value = unquote_and_strip_comment(raw_value);
    Ok((key, value))
}

/// Handle single/double quoting and strip an unquoted trailing `#`/`;` comment.
fn unquote_and_strip_comment(raw: &str) -> String {
    let raw = raw.trim();
    if let Some(rest) = raw.strip_prefix('"') {
        if let Some(end) = rest.find('"') {
            return rest[..end].to_string();
        }
        return rest.to_string();
    }
    if let Some(rest) = raw.strip_prefix('\'') {
        if let Some(end) = rest.find('\'') {
            return rest[..end].to_string();
        }
        return rest.to_string();
    }

    let mut result = raw;
    if let Some(pos) = find_unquoted_comment(raw) {
        result = raw[..pos].trim_end();
    }
    result.to_string()
}

fn find_unquoted_comment(s: &str) -> Option<usize> {
    s.find('#').into_iter().chain(s.find(';')).min()
}
