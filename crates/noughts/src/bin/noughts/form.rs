//! Player form validation for new games.

use derive_more::{Display, Error};
use noughts::NewGame;
use tracing::instrument;

/// Why a new-game form was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum FormError {
    /// Name missing.
    #[display("Name is required")]
    NameRequired,
    /// Name shorter than two characters.
    #[display("Name must be at least 2 characters")]
    NameTooShort,
    /// Age missing or not a whole number.
    #[display("Age must be a whole number")]
    AgeNotANumber,
    /// Age outside 1-120.
    #[display("Age must be between 1 and 120")]
    AgeOutOfRange,
    /// Email missing.
    #[display("Email is required")]
    EmailRequired,
    /// Email not shaped like `user@example.com`.
    #[display("Must be a valid email")]
    EmailInvalid,
}

/// Raw form input as typed by the player.
#[derive(Debug, Clone, Default)]
pub struct PlayerForm<'a> {
    /// Display name.
    pub player_name: &'a str,
    /// Age as typed.
    pub age: &'a str,
    /// Email as typed.
    pub email: &'a str,
    /// Whether the player takes X and moves first.
    pub start_first: bool,
}

impl PlayerForm<'_> {
    /// Checks every field and builds the game parameters.
    #[instrument]
    pub fn validate(&self) -> Result<NewGame, FormError> {
        let name = self.player_name.trim();
        if name.is_empty() {
            return Err(FormError::NameRequired);
        }
        if name.chars().count() < 2 {
            return Err(FormError::NameTooShort);
        }

        let age: i64 = self
            .age
            .trim()
            .parse()
            .map_err(|_| FormError::AgeNotANumber)?;
        let age = u8::try_from(age)
            .ok()
            .filter(|age| (1..=120).contains(age))
            .ok_or(FormError::AgeOutOfRange)?;

        let email = self.email.trim();
        if email.is_empty() {
            return Err(FormError::EmailRequired);
        }
        if !is_valid_email(email) {
            return Err(FormError::EmailInvalid);
        }

        Ok(NewGame::new(
            name.to_string(),
            age,
            email.to_string(),
            self.start_first,
        ))
    }
}

/// Loose `local@domain.tld` check.
fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let labels: Vec<&str> = domain.split('.').collect();
    !local.is_empty()
        && !email.chars().any(char::is_whitespace)
        && !domain.contains('@')
        && labels.len() >= 2
        && labels.iter().all(|label| !label.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form<'a>(name: &'a str, age: &'a str, email: &'a str) -> PlayerForm<'a> {
        PlayerForm {
            player_name: name,
            age,
            email,
            start_first: true,
        }
    }

    #[test]
    fn test_valid_form() {
        let game = form(" Rupesh ", "12", "rupeshg@gmail.com").validate().unwrap();
        assert_eq!(game.player_name(), "Rupesh");
        assert_eq!(*game.age(), 12);
        assert!(*game.start_first());
    }

    #[test]
    fn test_name_rules() {
        assert_eq!(form("", "12", "a@b.co").validate(), Err(FormError::NameRequired));
        assert_eq!(form("R", "12", "a@b.co").validate(), Err(FormError::NameTooShort));
    }

    #[test]
    fn test_age_rules() {
        assert_eq!(form("Ro", "twelve", "a@b.co").validate(), Err(FormError::AgeNotANumber));
        assert_eq!(form("Ro", "12.5", "a@b.co").validate(), Err(FormError::AgeNotANumber));
        assert_eq!(form("Ro", "0", "a@b.co").validate(), Err(FormError::AgeOutOfRange));
        assert_eq!(form("Ro", "121", "a@b.co").validate(), Err(FormError::AgeOutOfRange));
        assert_eq!(form("Ro", "-3", "a@b.co").validate(), Err(FormError::AgeOutOfRange));
        assert!(form("Ro", "120", "a@b.co").validate().is_ok());
    }

    #[test]
    fn test_email_rules() {
        assert_eq!(form("Ro", "14", "").validate(), Err(FormError::EmailRequired));
        for bad in ["rohan", "@gmail.com", "rohan@", "rohan@gmail", "ro han@gmail.com", "a@b..com"] {
            assert_eq!(form("Ro", "14", bad).validate(), Err(FormError::EmailInvalid), "{bad}");
        }
    }
}
