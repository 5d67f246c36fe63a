use super::{not_blank, FieldSpec, FormErrors, FormType, Widget};
use crate::orm::users;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use validator::Validate;

#[derive(Clone, Debug, Default, Deserialize, Serialize, Validate)]
pub struct UserSettingsForm {
    #[validate(
        custom = "not_blank",
        length(min = 2, max = 180, message = "The username must be between 2 and 180 characters.")
    )]
    #[serde(default)]
    pub username: String,
    #[validate(email(message = "This value is not a valid email address."))]
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing)]
    pub csrf_token: String,
}

const SETTINGS_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "username",
        label: "Username",
        widget: Widget::Text,
        required: true,
        placeholder: None,
        help: None,
    },
    FieldSpec {
        name: "email",
        label: "Email",
        widget: Widget::Email,
        required: true,
        placeholder: None,
        help: None,
    },
];

impl UserSettingsForm {
    pub fn from_model(user: &users::Model) -> Self {
        Self {
            username: user.username.clone(),
            email: user.email.clone(),
            csrf_token: String::new(),
        }
    }

    pub fn normalized(mut self) -> Self {
        self.username = self.username.trim().to_owned();
        self.email = self.email.trim().to_owned();
        self
    }
}

impl FormType for UserSettingsForm {
    const NAME: &'static str = "user_settings";

    fn fields() -> &'static [FieldSpec] {
        SETTINGS_FIELDS
    }

    fn value_of(&self, field: &str) -> Value {
        match field {
            "username" => json!(self.username),
            "email" => json!(self.email),
            _ => Value::Null,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Validate)]
pub struct EditPasswordForm {
    #[validate(length(
        min = 8,
        max = 1000,
        message = "The password must be between 8 and 1000 characters."
    ))]
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub new_password_confirm: String,
    #[serde(default)]
    pub csrf_token: String,
}

const PASSWORD_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "new_password",
        label: "New password",
        widget: Widget::Password,
        required: true,
        placeholder: None,
        help: None,
    },
    FieldSpec {
        name: "new_password_confirm",
        label: "Repeat password",
        widget: Widget::Password,
        required: true,
        placeholder: None,
        help: None,
    },
];

impl EditPasswordForm {
    /// Field rules plus the confirmation match.
    pub fn check(&self) -> Result<(), FormErrors> {
        let mut errors = match self.validate() {
            Ok(()) => FormErrors::default(),
            Err(e) => e.into(),
        };
        if self.new_password != self.new_password_confirm {
            errors.add("new_password_confirm", "The password fields must match.");
        }
        errors.into_result()
    }
}

impl FormType for EditPasswordForm {
    const NAME: &'static str = "edit_password";

    fn fields() -> &'static [FieldSpec] {
        PASSWORD_FIELDS
    }

    fn value_of(&self, _field: &str) -> Value {
        Value::Null
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub csrf_token: String,
}

const LOGIN_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "username",
        label: "Username",
        widget: Widget::Text,
        required: true,
        placeholder: None,
        help: None,
    },
    FieldSpec {
        name: "password",
        label: "Password",
        widget: Widget::Password,
        required: true,
        placeholder: None,
        help: None,
    },
];

impl FormType for LoginForm {
    const NAME: &'static str = "login";

    fn fields() -> &'static [FieldSpec] {
        LOGIN_FIELDS
    }

    fn value_of(&self, field: &str) -> Value {
        match field {
            "username" => json!(self.username),
            _ => Value::Null,
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Validate)]
pub struct RegisterForm {
    #[validate(
        custom = "not_blank",
        length(min = 2, max = 180, message = "The username must be between 2 and 180 characters.")
    )]
    #[serde(default)]
    pub username: String,
    #[validate(email(message = "This value is not a valid email address."))]
    #[serde(default)]
    pub email: String,
    #[validate(length(
        min = 8,
        max = 1000,
        message = "The password must be between 8 and 1000 characters."
    ))]
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
    #[serde(default)]
    pub csrf_token: String,
}

const REGISTER_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "username",
        label: "Username",
        widget: Widget::Text,
        required: true,
        placeholder: None,
        help: None,
    },
    FieldSpec {
        name: "email",
        label: "Email",
        widget: Widget::Email,
        required: true,
        placeholder: None,
        help: None,
    },
    FieldSpec {
        name: "password",
        label: "Password",
        widget: Widget::Password,
        required: true,
        placeholder: None,
        help: None,
    },
    FieldSpec {
        name: "password_confirm",
        label: "Repeat password",
        widget: Widget::Password,
        required: true,
        placeholder: None,
        help: None,
    },
];

impl RegisterForm {
    pub fn normalized(mut self) -> Self {
        self.username = self.username.trim().to_owned();
        self.email = self.email.trim().to_owned();
        self
    }

    pub fn check(&self) -> Result<(), FormErrors> {
        let mut errors = match self.validate() {
            Ok(()) => FormErrors::default(),
            Err(e) => e.into(),
        };
        if self.password != self.password_confirm {
            errors.add("password_confirm", "The password fields must match.");
        }
        errors.into_result()
    }
}

impl FormType for RegisterForm {
    const NAME: &'static str = "register";

    fn fields() -> &'static [FieldSpec] {
        REGISTER_FIELDS
    }

    fn value_of(&self, field: &str) -> Value {
        match field {
            "username" => json!(self.username),
            "email" => json!(self.email),
            _ => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::render;

    #[test]
    fn test_password_confirmation_must_match() {
        let form = EditPasswordForm {
            new_password: "correct horse".to_owned(),
            new_password_confirm: "battery staple".to_owned(),
            csrf_token: String::new(),
        };
        let errors = form.check().unwrap_err();
        assert!(errors.has("new_password_confirm"));
        assert!(!errors.has("new_password"));
    }

    #[test]
    fn test_password_length() {
        let form = EditPasswordForm {
            new_password: "short".to_owned(),
            new_password_confirm: "short".to_owned(),
            csrf_token: String::new(),
        };
        let errors = form.check().unwrap_err();
        assert!(errors.has("new_password"));
        assert!(!errors.has("new_password_confirm"));
    }

    #[test]
    fn test_settings_rejects_bad_email() {
        let form = UserSettingsForm {
            username: "alice".to_owned(),
            email: "not-an-email".to_owned(),
            csrf_token: String::new(),
        };
        let errors: FormErrors = form.validate().unwrap_err().into();
        assert_eq!(errors.get("email"), ["This value is not a valid email address."]);
    }

    #[test]
    fn test_register_check() {
        let form = RegisterForm {
            username: "bob".to_owned(),
            email: "bob@example.com".to_owned(),
            password: "hunter22hunter".to_owned(),
            password_confirm: "hunter22hunter".to_owned(),
            csrf_token: String::new(),
        }
        .normalized();
        assert!(form.check().is_ok());
    }

    #[test]
    fn test_passwords_are_never_rendered() {
        let form = LoginForm {
            username: "alice".to_owned(),
            password: "secret-password".to_owned(),
            csrf_token: String::new(),
        };
        let view = render(&form, "/login", "t", &FormErrors::default());
        assert_eq!(view.field("username").unwrap().value, json!("alice"));
        assert_eq!(view.field("password").unwrap().value, Value::Null);
    }
}
