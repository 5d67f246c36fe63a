//! Authorization policy for themes and websites.
//!
//! Every rule takes the acting principal explicitly. `None` is a guest.
//! Denials distinguish guests (who must authenticate) from known users
//! acting on resources they do not own.

use crate::constants::ROLE_USER;
use crate::error::AppError;
use crate::orm::{themes, websites};
use crate::principal::Principal;
use sea_orm::ActiveValue;

/// Resources that record the user who created them.
pub trait UserOwned {
    fn owner_id(&self) -> Option<i32>;
    fn set_owner_id(&mut self, owner_id: i32);
}

impl UserOwned for themes::Model {
    fn owner_id(&self) -> Option<i32> {
        Some(self.owner_id)
    }

    fn set_owner_id(&mut self, owner_id: i32) {
        self.owner_id = owner_id;
    }
}

impl UserOwned for websites::Model {
    fn owner_id(&self) -> Option<i32> {
        Some(self.owner_id)
    }

    fn set_owner_id(&mut self, owner_id: i32) {
        self.owner_id = owner_id;
    }
}

fn active_owner(value: &ActiveValue<i32>) -> Option<i32> {
    match value {
        ActiveValue::Set(id) | ActiveValue::Unchanged(id) => Some(*id),
        ActiveValue::NotSet => None,
    }
}

impl UserOwned for themes::ActiveModel {
    fn owner_id(&self) -> Option<i32> {
        active_owner(&self.owner_id)
    }

    fn set_owner_id(&mut self, owner_id: i32) {
        self.owner_id = ActiveValue::Set(owner_id);
    }
}

impl UserOwned for websites::ActiveModel {
    fn owner_id(&self) -> Option<i32> {
        active_owner(&self.owner_id)
    }

    fn set_owner_id(&mut self, owner_id: i32) {
        self.owner_id = ActiveValue::Set(owner_id);
    }
}

/// True when the principal created the resource.
pub fn is_owner<T: UserOwned + ?Sized>(principal: Option<&Principal>, resource: &T) -> bool {
    match (principal, resource.owner_id()) {
        (Some(p), Some(owner_id)) => p.id == owner_id,
        _ => false,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    View,
    Create,
    Edit,
    Delete,
    /// Approve or reject a pending website.
    Moderate,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Denial {
    LoginRequired,
    Forbidden(&'static str),
}

impl From<Denial> for AppError {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::LoginRequired => AppError::LoginRequired,
            Denial::Forbidden(msg) => AppError::Forbidden(msg.to_owned()),
        }
    }
}

pub const THEME_PRIVATE: &str = "This theme is private.";
pub const THEME_EDIT_DENIED: &str = "Only the theme's creator can edit it.";
pub const THEME_DELETE_DENIED: &str = "Only the theme's creator can delete it.";
pub const WEBSITE_CREATE_DENIED: &str = "Only the theme's creator can add a link.";
pub const WEBSITE_EDIT_DENIED: &str = "Only the link's creator can edit it.";
pub const WEBSITE_DELETE_DENIED: &str = "Only the link's creator can delete it.";
pub const WEBSITE_MODERATE_DENIED: &str = "Only the theme's creator can moderate links.";
pub const WEBSITE_UNPUBLISHED: &str = "This link is not published.";

fn deny(principal: Option<&Principal>, message: &'static str) -> Result<(), Denial> {
    match principal {
        None => Err(Denial::LoginRequired),
        Some(_) => Err(Denial::Forbidden(message)),
    }
}

/// Any authenticated user may create a theme.
pub fn can_create_theme(principal: Option<&Principal>) -> Result<(), Denial> {
    match principal {
        Some(p) if p.has_role(ROLE_USER) => Ok(()),
        _ => Err(Denial::LoginRequired),
    }
}

pub fn check_theme(
    principal: Option<&Principal>,
    action: Action,
    theme: &themes::Model,
) -> Result<(), Denial> {
    let owner = is_owner(principal, theme);
    match action {
        Action::View if !theme.private || owner => Ok(()),
        Action::View => deny(principal, THEME_PRIVATE),
        Action::Create => can_create_theme(principal),
        Action::Edit | Action::Moderate if owner => Ok(()),
        Action::Edit | Action::Moderate => deny(principal, THEME_EDIT_DENIED),
        Action::Delete if owner => Ok(()),
        Action::Delete => deny(principal, THEME_DELETE_DENIED),
    }
}

pub fn can_view_theme(principal: Option<&Principal>, theme: &themes::Model) -> bool {
    check_theme(principal, Action::View, theme).is_ok()
}

/// The theme owner may always add links. Others may when the theme is open,
/// unless it is private.
pub fn can_create_website(
    principal: Option<&Principal>,
    theme: &themes::Model,
) -> Result<(), Denial> {
    can_create_theme(principal)?;
    if is_owner(principal, theme) || (theme.open && !theme.private) {
        Ok(())
    } else {
        deny(principal, WEBSITE_CREATE_DENIED)
    }
}

pub fn check_website(
    principal: Option<&Principal>,
    action: Action,
    website: &websites::Model,
    theme: &themes::Model,
) -> Result<(), Denial> {
    match action {
        Action::View => {
            check_theme(principal, Action::View, theme)?;
            if website.approved == Some(true)
                || is_owner(principal, website)
                || is_owner(principal, theme)
            {
                Ok(())
            } else {
                deny(principal, WEBSITE_UNPUBLISHED)
            }
        }
        Action::Create => can_create_website(principal, theme),
        Action::Edit if is_owner(principal, website) => Ok(()),
        Action::Edit => deny(principal, WEBSITE_EDIT_DENIED),
        Action::Delete if is_owner(principal, website) => Ok(()),
        Action::Delete => deny(principal, WEBSITE_DELETE_DENIED),
        Action::Moderate if is_owner(principal, theme) => Ok(()),
        Action::Moderate => deny(principal, WEBSITE_MODERATE_DENIED),
    }
}

pub fn can_view_website(
    principal: Option<&Principal>,
    website: &websites::Model,
    theme: &themes::Model,
) -> bool {
    check_website(principal, Action::View, website, theme).is_ok()
}

/// Approval state of a new website: pending when a non-owner contributes to a
/// moderated theme, published otherwise.
pub fn initial_approval(principal: &Principal, theme: &themes::Model) -> Option<bool> {
    if theme.approve && !is_owner(Some(principal), theme) {
        None
    } else {
        Some(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn now() -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn theme(owner_id: i32) -> themes::Model {
        themes::Model {
            id: 1,
            title: "Rust".to_owned(),
            description: None,
            slug: "rust".to_owned(),
            private: false,
            open: false,
            approve: false,
            owner_id,
            websites_count: 0,
            created_at: now(),
            updated_at: None,
        }
    }

    fn website(owner_id: i32, approved: Option<bool>) -> websites::Model {
        websites::Model {
            id: 7,
            url: "https://www.rust-lang.org".to_owned(),
            comment: None,
            theme_id: 1,
            owner_id,
            approved,
            created_at: now(),
        }
    }

    #[test]
    fn test_public_theme_is_visible_to_everyone() {
        let t = theme(1);
        assert!(can_view_theme(None, &t));
        assert!(can_view_theme(Some(&Principal::new(2, "bob")), &t));
    }

    #[test]
    fn test_private_theme_is_visible_to_owner_only() {
        let mut t = theme(1);
        t.private = true;
        let alice = Principal::new(1, "alice");
        let bob = Principal::new(2, "bob");

        assert_eq!(check_theme(Some(&alice), Action::View, &t), Ok(()));
        assert_eq!(
            check_theme(Some(&bob), Action::View, &t),
            Err(Denial::Forbidden(THEME_PRIVATE))
        );
        assert_eq!(
            check_theme(None, Action::View, &t),
            Err(Denial::LoginRequired)
        );
    }

    #[test]
    fn test_theme_create_requires_authentication() {
        assert_eq!(can_create_theme(None), Err(Denial::LoginRequired));
        assert_eq!(can_create_theme(Some(&Principal::new(3, "carol"))), Ok(()));
    }

    #[test]
    fn test_theme_edit_and_delete_are_owner_only() {
        let t = theme(1);
        let alice = Principal::new(1, "alice");
        let bob = Principal::new(2, "bob");

        for action in [Action::Edit, Action::Delete] {
            assert_eq!(check_theme(Some(&alice), action, &t), Ok(()));
            assert_eq!(check_theme(None, action, &t), Err(Denial::LoginRequired));
        }
        assert_eq!(
            check_theme(Some(&bob), Action::Edit, &t),
            Err(Denial::Forbidden(THEME_EDIT_DENIED))
        );
        assert_eq!(
            check_theme(Some(&bob), Action::Delete, &t),
            Err(Denial::Forbidden(THEME_DELETE_DENIED))
        );
    }

    #[test]
    fn test_open_theme_accepts_contributions() {
        let mut t = theme(1);
        let bob = Principal::new(2, "bob");
        assert_eq!(
            can_create_website(Some(&bob), &t),
            Err(Denial::Forbidden(WEBSITE_CREATE_DENIED))
        );

        t.open = true;
        assert_eq!(can_create_website(Some(&bob), &t), Ok(()));
        assert_eq!(can_create_website(None, &t), Err(Denial::LoginRequired));

        // Private wins over open.
        t.private = true;
        assert!(can_create_website(Some(&bob), &t).is_err());
        assert_eq!(can_create_website(Some(&Principal::new(1, "alice")), &t), Ok(()));
    }

    #[test]
    fn test_website_edit_is_website_owner_only() {
        let t = theme(1);
        let w = website(2, Some(true));
        let alice = Principal::new(1, "alice");
        let bob = Principal::new(2, "bob");

        assert_eq!(check_website(Some(&bob), Action::Edit, &w, &t), Ok(()));
        assert_eq!(check_website(Some(&bob), Action::Delete, &w, &t), Ok(()));
        // Owning the theme is not enough.
        assert_eq!(
            check_website(Some(&alice), Action::Delete, &w, &t),
            Err(Denial::Forbidden(WEBSITE_DELETE_DENIED))
        );
        assert_eq!(
            check_website(None, Action::Edit, &w, &t),
            Err(Denial::LoginRequired)
        );
    }

    #[test]
    fn test_pending_website_visibility() {
        let t = theme(1);
        let w = website(2, None);

        assert!(!can_view_website(None, &w, &t));
        assert!(!can_view_website(Some(&Principal::new(3, "carol")), &w, &t));
        assert!(can_view_website(Some(&Principal::new(2, "bob")), &w, &t));
        assert!(can_view_website(Some(&Principal::new(1, "alice")), &w, &t));
    }

    #[test]
    fn test_website_follows_theme_visibility() {
        let mut t = theme(1);
        t.private = true;
        let w = website(2, Some(true));
        assert!(!can_view_website(Some(&Principal::new(2, "bob")), &w, &t));
        assert!(can_view_website(Some(&Principal::new(1, "alice")), &w, &t));
    }

    #[test]
    fn test_initial_approval() {
        let mut t = theme(1);
        t.open = true;
        let alice = Principal::new(1, "alice");
        let bob = Principal::new(2, "bob");

        assert_eq!(initial_approval(&bob, &t), Some(true));
        t.approve = true;
        assert_eq!(initial_approval(&bob, &t), None);
        assert_eq!(initial_approval(&alice, &t), Some(true));
    }

    #[test]
    fn test_owner_check_is_generic_over_owned_resources() {
        let alice = Principal::new(1, "alice");
        let mut draft = themes::ActiveModel::default();
        assert!(!is_owner(Some(&alice), &draft));
        draft.set_owner_id(1);
        assert!(is_owner(Some(&alice), &draft));
        assert!(is_owner(Some(&alice), &website(1, None)));
        assert!(!is_owner(None, &website(1, None)));
    }
}
