//! Strongly-typed identifiers.
//!
//! Every record the engine touches is keyed by an `i64`; the newtypes keep a
//! class id from being passed where a teacher id is expected.

crate::define_id_types!(i64 => SchoolId, ClassId, SubjectId, UserId, TimeSlotId, EntryId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_roundtrip_and_display() {
        let id = TimeSlotId::new(42);
        assert_eq!(id.value(), 42);
        assert_eq!(i64::from(id), 42);
        assert_eq!(id.to_string(), "42");
        assert_eq!("42".parse::<TimeSlotId>().unwrap(), id);
        assert!("x".parse::<ClassId>().is_err());
    }

    #[test]
    fn test_id_serializes_as_number() {
        assert_eq!(serde_json::to_string(&SchoolId(7)).unwrap(), "7");
        let id: UserId = serde_json::from_str("9").unwrap();
        assert_eq!(id, UserId(9));
    }
}
