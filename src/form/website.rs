use super::{http_url, optional_text, FieldSpec, FormType, Widget};
use crate::orm::websites;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use validator::Validate;

#[derive(Clone, Debug, Default, Deserialize, Serialize, Validate)]
pub struct WebsiteForm {
    #[validate(
        custom = "http_url",
        length(min = 2, max = 255, message = "The URL must be between 2 and 255 characters.")
    )]
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub comment: Option<String>,
    /// Target theme id. Only read by the API, the HTML routes take it from the path.
    #[serde(default)]
    pub theme: Option<i32>,
    #[serde(default, skip_serializing)]
    pub csrf_token: String,
}

const FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "url",
        label: "URL",
        widget: Widget::Url,
        required: true,
        placeholder: Some("https://"),
        help: None,
    },
    FieldSpec {
        name: "comment",
        label: "Comment",
        widget: Widget::Textarea,
        required: false,
        placeholder: Some("Why is this link worth a visit?"),
        help: None,
    },
];

impl WebsiteForm {
    pub fn from_model(website: &websites::Model) -> Self {
        Self {
            url: website.url.clone(),
            comment: website.comment.clone(),
            theme: Some(website.theme_id),
            csrf_token: String::new(),
        }
    }

    pub fn normalized(mut self) -> Self {
        self.url = self.url.trim().to_owned();
        self.comment = optional_text(self.comment);
        self
    }
}

impl FormType for WebsiteForm {
    const NAME: &'static str = "website";

    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn value_of(&self, field: &str) -> Value {
        match field {
            "url" => json!(self.url),
            "comment" => json!(self.comment),
            _ => Value::Null,
        }
    }
}
