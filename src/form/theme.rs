use super::{checkbox, not_blank, optional_text, parse_tags, FieldSpec, FormType, Widget};
use crate::orm::themes;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use validator::Validate;

#[derive(Clone, Debug, Default, Deserialize, Serialize, Validate)]
pub struct ThemeForm {
    #[validate(
        custom = "not_blank",
        length(min = 2, max = 255, message = "The title must be between 2 and 255 characters.")
    )]
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "checkbox")]
    pub private: bool,
    #[serde(default, deserialize_with = "checkbox")]
    pub open: bool,
    #[serde(default, deserialize_with = "checkbox")]
    pub approve: bool,
    /// `None` leaves the tags untouched.
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default, skip_serializing)]
    pub csrf_token: String,
}

const FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "title",
        label: "Title",
        widget: Widget::Text,
        required: true,
        placeholder: Some("Theme title"),
        help: None,
    },
    FieldSpec {
        name: "description",
        label: "Description",
        widget: Widget::Textarea,
        required: true,
        placeholder: Some("What is this theme about?"),
        help: None,
    },
    FieldSpec {
        name: "private",
        label: "Private theme",
        widget: Widget::Checkbox,
        required: false,
        placeholder: None,
        help: Some("Only you will see this theme and add links to it."),
    },
    FieldSpec {
        name: "open",
        label: "Open to contributions",
        widget: Widget::Checkbox,
        required: false,
        placeholder: None,
        help: Some("Other users will be able to add links to this theme."),
    },
    FieldSpec {
        name: "approve",
        label: "Approve contributions",
        widget: Widget::Checkbox,
        required: false,
        placeholder: None,
        help: Some("Review new contributions before they are published."),
    },
    FieldSpec {
        name: "tags",
        label: "Tags",
        widget: Widget::Tags,
        required: false,
        placeholder: Some("tag, tag, ..."),
        help: Some("Separate tags with a comma"),
    },
];

impl ThemeForm {
    /// Prefills the edit form from a stored theme.
    pub fn from_model(theme: &themes::Model, tags: &[String]) -> Self {
        Self {
            title: theme.title.clone(),
            description: theme.description.clone(),
            private: theme.private,
            open: theme.open,
            approve: theme.approve,
            tags: Some(tags.join(", ")),
            csrf_token: String::new(),
        }
    }

    pub fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_owned();
        self.description = optional_text(self.description);
        self
    }

    pub fn tag_names(&self) -> Option<Vec<String>> {
        self.tags.as_deref().map(parse_tags)
    }
}

impl FormType for ThemeForm {
    const NAME: &'static str = "theme";

    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn value_of(&self, field: &str) -> Value {
        match field {
            "title" => json!(self.title),
            "description" => json!(self.description),
            "private" => json!(self.private),
            "open" => json!(self.open),
            "approve" => json!(self.approve),
            "tags" => json!(self.tags.clone().unwrap_or_default()),
            _ => Value::Null,
        }
    }
}
