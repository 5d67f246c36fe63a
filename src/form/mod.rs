//! Form definitions, validation and the view handed to the presentation layer.
//!
//! Each form declares its fields once (`FormType::fields`). Validation runs
//! through the `validator` derive and is flattened into `FormErrors`, a map
//! from field name to human readable messages.

mod account;
mod theme;
mod website;

pub use account::{EditPasswordForm, LoginForm, RegisterForm, UserSettingsForm};
pub use theme::ThemeForm;
pub use website::WebsiteForm;

use crate::constants::{MAX_TAGS_PER_THEME, MAX_TAG_LENGTH};
use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use validator::{ValidationError, ValidationErrors};

/// Field name to violation messages.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_owned())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn merge(&mut self, other: FormErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    /// `Ok` when no field has a violation.
    pub fn into_result(self) -> Result<(), FormErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for FormErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(" ")))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl From<ValidationErrors> for FormErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut out = FormErrors::default();
        for (field, violations) in errors.field_errors() {
            for violation in violations {
                let message = violation
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("This value is not valid ({}).", violation.code));
                out.add(field, message);
            }
        }
        out
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Widget {
    Text,
    Textarea,
    Checkbox,
    Url,
    Email,
    Password,
    /// Comma separated list.
    Tags,
}

/// Static description of one editable field.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub widget: Widget,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<&'static str>,
}

#[derive(Clone, Debug, Serialize)]
pub struct FieldView {
    #[serde(flatten)]
    pub spec: FieldSpec,
    pub value: serde_json::Value,
    pub errors: Vec<String>,
}

/// Everything a renderer needs to draw a form, with prior input and errors.
#[derive(Clone, Debug, Serialize)]
pub struct FormView {
    pub name: &'static str,
    pub action: String,
    pub csrf_token: String,
    pub fields: Vec<FieldView>,
}

impl FormView {
    pub fn field(&self, name: &str) -> Option<&FieldView> {
        self.fields.iter().find(|f| f.spec.name == name)
    }
}

pub trait FormType {
    const NAME: &'static str;

    fn fields() -> &'static [FieldSpec];

    /// Current value of a field. Password widgets are never echoed back.
    fn value_of(&self, field: &str) -> serde_json::Value;
}

pub fn render<F: FormType>(
    form: &F,
    action: impl Into<String>,
    csrf_token: impl Into<String>,
    errors: &FormErrors,
) -> FormView {
    let fields = F::fields()
        .iter()
        .map(|spec| FieldView {
            spec: *spec,
            value: match spec.widget {
                Widget::Password => serde_json::Value::Null,
                _ => form.value_of(spec.name),
            },
            errors: errors.get(spec.name).to_vec(),
        })
        .collect();

    FormView {
        name: F::NAME,
        action: action.into(),
        csrf_token: csrf_token.into(),
        fields,
    }
}

fn violation(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::from(message));
    error
}

pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(violation("not_blank", "This value should not be blank."))
    } else {
        Ok(())
    }
}

pub(crate) fn http_url(value: &str) -> Result<(), ValidationError> {
    match url::Url::parse(value) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.has_host() => Ok(()),
        _ => Err(violation("url", "This value is not a valid URL.")),
    }
}

/// Accepts HTML checkbox values (`on`, `1`, `true`, `yes`) and JSON booleans.
pub(crate) fn checkbox<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Text(String),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Bool(b) => b,
        Raw::Text(s) => matches!(s.trim(), "on" | "1" | "true" | "yes"),
    })
}

/// Trims, drops empty input, and maps an empty string to `None`.
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Splits `"tag, tag, ..."` into lowercase names, first occurrence wins.
pub fn parse_tags(input: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for name in input.split(',').map(|t| t.trim().to_lowercase()) {
        if name.is_empty() || name.chars().count() > MAX_TAG_LENGTH || tags.contains(&name) {
            continue;
        }
        tags.push(name);
        if tags.len() == MAX_TAGS_PER_THEME {
            break;
        }
    }
    tags
}
