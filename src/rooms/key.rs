//! Canonical room keys
//!
//! Key format: `<low>_<high>[_<context>]`, where `low`/`high` are the two
//! participant ids in byte-wise order. Identifiers may not contain the
//! separator, so every key splits back into exactly its fields.

use crate::models::{ContextId, ParsedRoom, ParticipantId, RoomKey};

use super::ChatError;

/// Field separator inside a room key.
pub const SEPARATOR: char = '_';

/// Delimiter of store document paths. Keys are embedded in paths, so
/// identifiers may not contain it either.
const PATH_DELIMITER: char = '/';

/// Check that an identifier can be embedded in a room key.
pub fn validate_identifier(id: &str) -> Result<(), ChatError> {
    let reason = if id.is_empty() {
        "empty"
    } else if id.contains(SEPARATOR) {
        "contains the room key separator"
    } else if id.contains(PATH_DELIMITER) {
        "contains a path delimiter"
    } else {
        return Ok(());
    };

    Err(ChatError::InvalidIdentifier {
        id: id.to_string(),
        reason,
    })
}

/// Derive the room key for a pair of participants and an optional context.
///
/// Order of `participants` does not matter. Repeated ids count once, so
/// `[a, a]` is rejected like `[a]`.
pub fn compute_key(
    participants: &[ParticipantId],
    context: Option<&ContextId>,
) -> Result<RoomKey, ChatError> {
    for participant in participants {
        validate_identifier(participant.as_str())?;
    }
    if let Some(context) = context {
        validate_identifier(context.as_str())?;
    }

    let mut sorted: Vec<&str> = participants.iter().map(ParticipantId::as_str).collect();
    sorted.sort_unstable();
    sorted.dedup();

    match sorted.len() {
        2 => {}
        n if n < 2 => return Err(ChatError::InsufficientParticipants { found: n }),
        n => return Err(ChatError::TooManyParticipants { found: n }),
    }

    let mut key = format!("{}{}{}", sorted[0], SEPARATOR, sorted[1]);
    if let Some(context) = context {
        key.push(SEPARATOR);
        key.push_str(context.as_str());
    }

    Ok(RoomKey::from_raw(key))
}

/// Split a room key back into its participants and context.
///
/// Participants come back sorted. A key that names the same participant twice
/// still parses; the inbox drops such rooms as degenerate.
pub fn parse_key(key: &RoomKey) -> Result<ParsedRoom, ChatError> {
    let malformed = |reason: String| ChatError::MalformedKey {
        key: key.as_str().to_string(),
        reason,
    };

    let fields: Vec<&str> = key.as_str().split(SEPARATOR).collect();
    if !(2..=3).contains(&fields.len()) {
        return Err(malformed(format!(
            "expected 2 or 3 fields, found {}",
            fields.len()
        )));
    }
    if let Some(pos) = fields.iter().position(|f| f.is_empty()) {
        return Err(malformed(format!("field {} is empty", pos + 1)));
    }
    if fields.iter().any(|f| f.contains(PATH_DELIMITER)) {
        return Err(malformed("contains a path delimiter".to_string()));
    }

    let (low, high) = if fields[0] <= fields[1] {
        (fields[0], fields[1])
    } else {
        (fields[1], fields[0])
    };

    Ok(ParsedRoom {
        participants: [ParticipantId::new(low), ParticipantId::new(high)],
        context: fields.get(2).map(|c| ContextId::new(*c)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<ParticipantId> {
        raw.iter().map(|s| ParticipantId::new(*s)).collect()
    }

    #[test]
    fn test_key_is_symmetric() {
        let product = ContextId::new("P1");
        for (a, b) in [("alice", "bob"), ("zed", "amy"), ("u-9", "u-10")] {
            let ab = compute_key(&ids(&[a, b]), Some(&product)).unwrap();
            let ba = compute_key(&ids(&[b, a]), Some(&product)).unwrap();
            assert_eq!(ab, ba);

            let ab = compute_key(&ids(&[a, b]), None).unwrap();
            let ba = compute_key(&ids(&[b, a]), None).unwrap();
            assert_eq!(ab, ba);
        }
    }

    #[test]
    fn test_key_format() {
        let key = compute_key(&ids(&["B", "A"]), Some(&ContextId::new("P1"))).unwrap();
        assert_eq!(key.as_str(), "A_B_P1");

        let key = compute_key(&ids(&["B", "A"]), None).unwrap();
        assert_eq!(key.as_str(), "A_B");
    }

    #[test]
    fn test_context_is_not_sorted_into_participants() {
        // A context that sorts before both participants stays last.
        let key = compute_key(&ids(&["mia", "noah"]), Some(&ContextId::new("aaa"))).unwrap();
        assert_eq!(key.as_str(), "mia_noah_aaa");
    }

    #[test]
    fn test_byte_wise_ordering() {
        // Uppercase sorts before lowercase byte-wise.
        let key = compute_key(&ids(&["bob", "Bob"]), None).unwrap();
        assert_eq!(key.as_str(), "Bob_bob");
    }

    #[test]
    fn test_parse_recovers_inputs() {
        let product = ContextId::new("prod-42");
        let key = compute_key(&ids(&["carol", "alice"]), Some(&product)).unwrap();
        let parsed = parse_key(&key).unwrap();
        assert_eq!(parsed.participants, [ParticipantId::new("alice"), ParticipantId::new("carol")]);
        assert_eq!(parsed.context, Some(product));

        let key = compute_key(&ids(&["carol", "alice"]), None).unwrap();
        let parsed = parse_key(&key).unwrap();
        assert!(parsed.contains(&ParticipantId::new("carol")));
        assert_eq!(parsed.context, None);
    }

    #[test]
    fn test_separator_in_identifier_rejected() {
        let err = compute_key(&ids(&["al_ice", "bob"]), None).unwrap_err();
        assert!(matches!(err, ChatError::InvalidIdentifier { ref id, .. } if id == "al_ice"));

        let err = compute_key(&ids(&["alice", "bob"]), Some(&ContextId::new("p_1"))).unwrap_err();
        assert!(matches!(err, ChatError::InvalidIdentifier { .. }));
    }

    #[test]
    fn test_empty_and_path_identifiers_rejected() {
        assert!(matches!(
            compute_key(&ids(&["", "bob"]), None),
            Err(ChatError::InvalidIdentifier { .. })
        ));
        assert!(matches!(
            compute_key(&ids(&["a/b", "bob"]), None),
            Err(ChatError::InvalidIdentifier { .. })
        ));
        assert!(matches!(
            compute_key(&ids(&["alice", "bob"]), Some(&ContextId::new(""))),
            Err(ChatError::InvalidIdentifier { .. })
        ));
    }

    #[test]
    fn test_participant_count() {
        assert_eq!(
            compute_key(&ids(&["alice"]), None),
            Err(ChatError::InsufficientParticipants { found: 1 })
        );
        assert_eq!(
            compute_key(&ids(&["alice", "alice"]), None),
            Err(ChatError::InsufficientParticipants { found: 1 })
        );
        assert_eq!(
            compute_key(&[], None),
            Err(ChatError::InsufficientParticipants { found: 0 })
        );
        assert_eq!(
            compute_key(&ids(&["a", "b", "c"]), None),
            Err(ChatError::TooManyParticipants { found: 3 })
        );
        // Duplicates collapse before the count.
        assert!(compute_key(&ids(&["a", "b", "a"]), None).is_ok());
    }

    #[test]
    fn test_parse_rejects_bad_field_counts() {
        for raw in ["alice", "a_b_c_d", "", "a__p", "_b", "a_b_"] {
            let err = parse_key(&RoomKey::from_raw(raw)).unwrap_err();
            assert!(matches!(err, ChatError::MalformedKey { .. }), "{raw}: {err:?}");
        }
    }

    #[test]
    fn test_parse_sorts_legacy_order() {
        let parsed = parse_key(&RoomKey::from_raw("zoe_adam_P1")).unwrap();
        assert_eq!(parsed.participants[0].as_str(), "adam");
        assert_eq!(parsed.participants[1].as_str(), "zoe");
    }

    #[test]
    fn test_parse_allows_self_room() {
        let parsed = parse_key(&RoomKey::from_raw("amy_amy_P1")).unwrap();
        assert_eq!(parsed.other(&ParticipantId::new("amy")), None);
    }
}
