//! `# @param` directives inside block bodies.
//!
//! ```text
//! # @param name
//! # @param name password
//! # @param name ["choice1", "choice2"]
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    Text,
    Secret,
    Choice,
}

impl ParamKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ParamKind::Text => "text",
            ParamKind::Secret => "secret",
            ParamKind::Choice => "choice",
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One declared input of a block, in prompt order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormParameter {
    pub name: String,
    pub kind: ParamKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
}

impl FormParameter {
    pub fn text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::Text,
            choices: Vec::new(),
        }
    }

    pub fn secret(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::Secret,
            choices: Vec::new(),
        }
    }

    pub fn choice<I, S>(name: impl Into<String>, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            kind: ParamKind::Choice,
            choices: choices.into_iter().map(Into::into).collect(),
        }
    }
}

const SECRET_KEYWORD: &str = "password";

static PARAM_RE: OnceLock<Regex> = OnceLock::new();

fn param_re() -> &'static Regex {
    PARAM_RE.get_or_init(|| {
        Regex::new(r"^\s*#\s*@param\s+([A-Za-z0-9_]+)(?:\s+(\[.*\]|\bpassword\b))?(?:\W|$)")
            .unwrap()
    })
}

/// Extract every parameter directive from `body`, in line order.
pub fn extract(body: &str) -> Vec<FormParameter> {
    body.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<FormParameter> {
    let caps = param_re().captures(line)?;
    let name = caps.get(1)?.as_str();

    let Some(suffix) = caps.get(2).map(|m| m.as_str()) else {
        return Some(FormParameter::text(name));
    };

    if suffix == SECRET_KEYWORD {
        return Some(FormParameter::secret(name));
    }

    match serde_json::from_str::<Vec<String>>(suffix) {
        Ok(choices) => Some(FormParameter::choice(name, choices)),
        Err(e) => {
            tracing::warn!(param = name, error = %e, "invalid choice list, treating as text");
            Some(FormParameter::text(name))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_text_parameter() {
        assert_eq!(extract("# @param Value1"), [FormParameter::text("Value1")]);
    }

    #[test]
    fn single_choice_parameter() {
        assert_eq!(
            extract(r#"# @param Value2 ["Option1", "Option2", "Option3"]"#),
            [FormParameter::choice(
                "Value2",
                ["Option1", "Option2", "Option3"]
            )]
        );
    }

    #[test]
    fn multiple_parameters_keep_order() {
        let body = r#"
            # @param Value1
            # @param Value2 ["Option1", "Option2"]
            echo 123
        "#;
        assert_eq!(
            extract(body),
            [
                FormParameter::text("Value1"),
                FormParameter::choice("Value2", ["Option1", "Option2"]),
            ]
        );
    }

    #[test]
    fn lines_without_comment_marker_are_skipped() {
        let body = "Some random text\n# @param Value1\nAnother line\n@param Value2\n";
        assert_eq!(extract(body), [FormParameter::text("Value1")]);
    }

    #[test]
    fn truncated_choice_list_degrades_to_text() {
        assert_eq!(
            extract(r#"# @param V ["a","b""#),
            [FormParameter::text("V")]
        );
    }

    #[test]
    fn non_string_choice_list_degrades_to_text() {
        assert_eq!(extract("# @param V [1, 2]"), [FormParameter::text("V")]);
    }

    #[test]
    fn no_parameters() {
        assert!(extract("No parameters here").is_empty());
        assert!(extract("").is_empty());
    }

    #[test]
    fn secret_parameter() {
        assert_eq!(
            extract("# @param secretKey password "),
            [FormParameter::secret("secretKey")]
        );
    }

    #[test]
    fn password_must_be_a_whole_word() {
        assert_eq!(
            extract("# @param key passwords"),
            [FormParameter::text("key")]
        );
    }

    #[test]
    fn mixed_kinds() {
        let body = r#"
            # @param username
            # @param password password
            # @param role ["admin", "user"]
        "#;
        let params = extract(body);
        assert_eq!(
            params,
            [
                FormParameter::text("username"),
                FormParameter::secret("password"),
                FormParameter::choice("role", ["admin", "user"]),
            ]
        );
    }

    #[test]
    fn duplicates_are_retained() {
        let params = extract("# @param A\n#@param A password");
        assert_eq!(
            params,
            [FormParameter::text("A"), FormParameter::secret("A")]
        );
    }

    #[test]
    fn names_must_be_valid_shell_identifiers() {
        assert!(extract("# @param café").is_empty());
        assert!(extract("# @param ÉTAT password").is_empty());
        assert_eq!(extract("# @param HOST_1"), [FormParameter::text("HOST_1")]);
        assert_eq!(extract("# @param HOST-NAME"), [FormParameter::text("HOST")]);
    }

    #[test]
    fn empty_choice_list_is_choice() {
        let params = extract("# @param env []");
        assert_eq!(params[0].kind, ParamKind::Choice);
        assert!(params[0].choices.is_empty());
    }
}
