//! URN helpers

use uuid::Uuid;

/// A fresh random UUID URN, the usual shape of an `atom:id`
pub fn uuid_urn() -> String {
    format!("urn:uuid:{}", Uuid::new_v4())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape() {
        let urn = uuid_urn();
        assert!(urn.starts_with("urn:uuid:"));
        assert_eq!(urn.len(), "urn:uuid:".len() + 36);
    }

    #[test]
    fn test_unique() {
        assert_ne!(uuid_urn(), uuid_urn());
    }
}
