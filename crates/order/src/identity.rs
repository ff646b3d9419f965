//! Host-supplied identity and out-of-band contact details.

use serde::{Deserialize, Serialize};

/// User identity as supplied by the host platform at session start.
///
/// Never entered by the user; either present or absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: i64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
}

impl Identity {
    pub fn new(id: i64, first_name: impl Into<String>) -> Self {
        Self {
            id,
            first_name: first_name.into(),
            last_name: None,
            username: None,
            language_code: None,
        }
    }

    pub fn with_last_name(mut self, last_name: impl Into<String>) -> Self {
        self.last_name = Some(last_name.into());
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_language_code(mut self, code: impl Into<String>) -> Self {
        self.language_code = Some(code.into());
        self
    }

    /// "First Last", or just the first name; empty when both are blank.
    pub fn display_name(&self) -> String {
        let first = self.first_name.trim();
        match self.last_name.as_deref().map(str::trim) {
            Some(last) if !last.is_empty() && !first.is_empty() => format!("{first} {last}"),
            Some(last) if !last.is_empty() => last.to_string(),
            _ => first.to_string(),
        }
    }

    /// Username without a leading `@`, if non-blank.
    pub fn handle(&self) -> Option<&str> {
        self.username
            .as_deref()
            .map(|u| u.trim().trim_start_matches('@'))
            .filter(|u| !u.is_empty())
    }

    /// Copy with blank optional parts dropped, so serialized keys are present
    /// only when they carry a value.
    pub fn normalized(&self) -> Self {
        fn keep(v: &Option<String>) -> Option<String> {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        }
        Self {
            id: self.id,
            first_name: self.first_name.trim().to_string(),
            last_name: keep(&self.last_name),
            username: keep(&self.username),
            language_code: keep(&self.language_code),
        }
    }
}

/// Phone contact shared by the user through the host's own bot interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub phone_number: String,
}

impl Contact {
    /// `None` for a blank number.
    pub fn new(phone_number: impl Into<String>) -> Option<Self> {
        let phone_number = phone_number.into().trim().to_string();
        if phone_number.is_empty() {
            None
        } else {
            Some(Self { phone_number })
        }
    }
}

/// Whether contact details are known in this session.
///
/// `Unavailable` is an expected state, not an error: out-of-band sharing may
/// never report back into the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactStatus {
    Provided(Contact),
    Unavailable,
}

impl ContactStatus {
    pub fn from_option(contact: Option<&Contact>) -> Self {
        match contact {
            Some(c) => ContactStatus::Provided(c.clone()),
            None => ContactStatus::Unavailable,
        }
    }

    pub fn contact(&self) -> Option<&Contact> {
        match self {
            ContactStatus::Provided(c) => Some(c),
            ContactStatus::Unavailable => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_joins_first_and_last() {
        let id = Identity::new(1, "Anna").with_last_name("Petrova");
        assert_eq!(id.display_name(), "Anna Petrova");
        assert_eq!(Identity::new(1, "Anna").display_name(), "Anna");
        assert_eq!(
            Identity::new(1, "Anna").with_last_name("  ").display_name(),
            "Anna"
        );
    }

    #[test]
    fn handle_strips_at_sign_and_blanks() {
        assert_eq!(
            Identity::new(1, "A").with_username("@anna").handle(),
            Some("anna")
        );
        assert_eq!(Identity::new(1, "A").with_username(" ").handle(), None);
    }

    #[test]
    fn identity_uses_host_key_names_and_skips_absent_parts() {
        let json = serde_json::to_value(Identity::new(7, "Anna").with_username("anna")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": 7, "first_name": "Anna", "username": "anna"})
        );
    }

    #[test]
    fn blank_phone_is_not_a_contact() {
        assert_eq!(Contact::new("   "), None);
        assert_eq!(
            Contact::new(" +79990001122 ").unwrap().phone_number,
            "+79990001122"
        );
    }

    #[test]
    fn contact_status_from_option() {
        assert_eq!(ContactStatus::from_option(None), ContactStatus::Unavailable);
        let c = Contact::new("+1").unwrap();
        assert_eq!(
            ContactStatus::from_option(Some(&c)).contact(),
            Some(&c)
        );
    }
}
