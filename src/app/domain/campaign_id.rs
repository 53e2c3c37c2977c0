/// Campaign ID domain type. Wraps ULID so ids sort by creation time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CampaignId(ulid::Ulid);

impl CampaignId {
    /// Generate a new random ULID.
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }

    /// Get as string for storage and as the session registry key.
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }

    /// Parse from a path segment or a stored column.
    pub fn from_string(s: &str) -> Result<Self, ulid::DecodeError> {
        Ok(Self(ulid::Ulid::from_string(s)?))
    }
}

impl Default for CampaignId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CampaignId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_distinct() {
        let id1 = CampaignId::new();
        let id2 = CampaignId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn parse_round_trips_through_storage_form() {
        let original = CampaignId::new();
        let parsed = CampaignId::from_string(&original.as_str()).unwrap();
        assert_eq!(original, parsed);
        assert_eq!(parsed.to_string(), original.as_str());
    }

    #[test]
    fn parse_rejects_non_ulid() {
        assert!(CampaignId::from_string("not-a-campaign").is_err());
    }
}
