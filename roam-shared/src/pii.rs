use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Customer contact data (email, phone) that must not leak through log macros.
///
/// `Debug` and `Display` print a redacted form; `Serialize` emits the real value
/// because API responses and outgoing mail need it.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Masked<T>(pub T);

impl<T> Masked<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn expose(&self) -> &T {
        &self.0
    }
}

impl Masked<String> {
    /// Keeps the first character and the domain of an email, e.g. `a*****@example.com`.
    pub fn hint(&self) -> String {
        match self.0.split_once('@') {
            Some((local, domain)) if !local.is_empty() => {
                let first: String = local.chars().take(1).collect();
                format!("{}*****@{}", first, domain)
            }
            _ => "********".to_string(),
        }
    }
}

impl<T> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl From<String> for Masked<String> {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_is_redacted() {
        let email = Masked::new("guest@example.com".to_string());
        assert_eq!(format!("{:?}", email), "********");
        assert_eq!(format!("{}", email), "********");
    }

    #[test]
    fn test_serialize_exposes_value() {
        let email = Masked::new("guest@example.com".to_string());
        assert_eq!(serde_json::to_string(&email).unwrap(), "\"guest@example.com\"");

        let back: Masked<String> = serde_json::from_str("\"x@y.z\"").unwrap();
        assert_eq!(back.expose(), "x@y.z");
    }

    #[test]
    fn test_email_hint() {
        assert_eq!(Masked::new("guest@example.com".to_string()).hint(), "g*****@example.com");
        assert_eq!(Masked::new("not-an-email".to_string()).hint(), "********");
    }
}
