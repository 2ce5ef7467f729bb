//! Request shapes and the constraints they must satisfy.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Body of `CreateUser`.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct NewUser {
    #[validate(
        length(
            min = 3,
            max = 50,
            message = "Name must be 3 to 50 characters long."
        ),
        custom(
            function = "crate::user::validate_alphabetic",
            message = "Name must only contain letters."
        )
    )]
    pub name: String,
    #[validate(
        length(min = 1, message = "Email is required."),
        custom(
            function = "crate::user::validate_lowercase",
            message = "Email must be lowercase."
        )
    )]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required."))]
    pub password: String,
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("name", &self.name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Body of `UpdateUserPassword`.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangeUserPasswordRequest {
    #[validate(length(min = 1, message = "Email is required."))]
    pub email: String,
    #[validate(length(min = 1, message = "Old password is required."))]
    pub old_password: String,
    #[validate(
        length(min = 1, message = "New password is required."),
        must_match(
            other = "confirm_new_password",
            message = "New password and its confirmation differ."
        )
    )]
    pub new_password: String,
    #[validate(length(min = 1, message = "Password confirmation is required."))]
    pub confirm_new_password: String,
}

impl std::fmt::Debug for ChangeUserPasswordRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeUserPasswordRequest")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Body of `UpdateUserName`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangeUserNameRequest {
    #[validate(length(min = 1, message = "Email is required."))]
    pub email: String,
    #[validate(length(
        min = 3,
        max = 50,
        message = "Name must be 3 to 50 characters long."
    ))]
    pub new_name: String,
}

/// Body of `GetUserByID`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetUserByIdRequest {
    pub id: u64,
}

/// Body of `GetUserByEmail`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetUserByEmailRequest {
    pub email: String,
}

/// Only ASCII letters are accepted.
pub fn validate_alphabetic(value: &str) -> Result<(), ValidationError> {
    if !value.is_empty() && value.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(())
    } else {
        Err(ValidationError::new("alpha"))
    }
}

/// Value must already be in lowercase.
pub fn validate_lowercase(value: &str) -> Result<(), ValidationError> {
    if value == value.to_lowercase() {
        Ok(())
    } else {
        Err(ValidationError::new("lowercase"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user() -> NewUser {
        NewUser {
            name: "Alice".into(),
            email: "alice@example.com".into(),
            password: "secret1".into(),
        }
    }

    fn password_request() -> ChangeUserPasswordRequest {
        ChangeUserPasswordRequest {
            email: "alice@example.com".into(),
            old_password: "secret1".into(),
            new_password: "secret2".into(),
            confirm_new_password: "secret2".into(),
        }
    }

    #[test]
    fn test_valid_user() {
        assert!(new_user().validate().is_ok());
    }

    #[test]
    fn test_user_name() {
        let short = NewUser {
            name: "Al".into(),
            ..new_user()
        };
        let errors = short.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));

        let long = NewUser {
            name: "a".repeat(51),
            ..new_user()
        };
        assert!(long.validate().is_err());

        let max = NewUser {
            name: "a".repeat(50),
            ..new_user()
        };
        assert!(max.validate().is_ok());

        let digits = NewUser {
            name: "Alice42".into(),
            ..new_user()
        };
        assert!(digits.validate().is_err());
    }

    #[test]
    fn test_user_email() {
        let upper = NewUser {
            email: "User@Example.com".into(),
            ..new_user()
        };
        let errors = upper.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));

        let empty = NewUser {
            email: String::default(),
            ..new_user()
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_user_password() {
        let user = NewUser {
            password: String::default(),
            ..new_user()
        };
        let errors = user.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));
    }

    #[test]
    fn test_password_confirmation() {
        assert!(password_request().validate().is_ok());

        let request = ChangeUserPasswordRequest {
            confirm_new_password: "secret3".into(),
            ..password_request()
        };
        let errors = request.validate().unwrap_err();
        assert_eq!(errors.field_errors().len(), 1);

        let request = ChangeUserPasswordRequest {
            old_password: String::default(),
            ..password_request()
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_change_name() {
        let request = ChangeUserNameRequest {
            email: "alice@example.com".into(),
            new_name: "Bob".into(),
        };
        assert!(request.validate().is_ok());

        let request = ChangeUserNameRequest {
            new_name: String::default(),
            ..request
        };
        let errors = request.validate().unwrap_err();
        assert_eq!(errors.field_errors().len(), 1);
    }

    #[test]
    fn test_custom_rules() {
        assert!(validate_alphabetic("Alice").is_ok());
        assert!(validate_alphabetic("Al ice").is_err());
        assert!(validate_alphabetic("").is_err());
        assert!(validate_lowercase("alice@example.com").is_ok());
        assert!(validate_lowercase("Alice@example.com").is_err());
    }
}
