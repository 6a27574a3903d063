/// Stable backlink identity via SHA-256 over the backlink's structural content.
use sha2::{Digest as _, Sha256};

use crate::types::{Backlink, BacklinkId, ReferenceLocation};

/// Compute the identity of a backlink.
///
/// Every field takes part, offsets included, so two backlinks share an id
/// exactly when they are structurally equal. Fields are NUL-separated so
/// that adjacent strings cannot run together into the same byte stream.
pub fn backlink_id(backlink: &Backlink) -> BacklinkId {
    let mut hasher = Sha256::new();
    feed_str(&mut hasher, &backlink.data_string);
    match &backlink.portal_text {
        None => hasher.update([0_u8]),
        Some(text) => {
            hasher.update([1_u8]);
            feed_str(&mut hasher, text);
        },
    }
    feed_location(&mut hasher, &backlink.referenced_location);
    feed_location(&mut hasher, &backlink.referencing_location);

    let digest = hasher.finalize();
    return BacklinkId(format!("backlink-{digest:x}"));
}

/// Feed every field of a location.
fn feed_location(hasher: &mut Sha256, location: &ReferenceLocation) {
    feed_str(hasher, &location.filename);
    hasher.update(location.from.to_le_bytes());
    feed_str(hasher, &location.prefix);
    feed_str(hasher, &location.suffix);
    feed_str(hasher, &location.text);
    hasher.update(location.to.to_le_bytes());
    feed_str(hasher, location.variant.as_str());
}

/// Feed a string followed by a NUL terminator.
fn feed_str(hasher: &mut Sha256, value: &str) {
    hasher.update(value.as_bytes());
    hasher.update([0_u8]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Variant;

    fn backlink() -> Backlink {
        let referenced = ReferenceLocation {
            filename: "b.md".to_string(),
            from: 3,
            prefix: String::new(),
            suffix: String::new(),
            text: "hi".to_string(),
            to: 5,
            variant: Variant::Plain,
        };
        return Backlink {
            data_string: "ref://b.md#3-5/\"hi\"".to_string(),
            portal_text: None,
            referenced_location: referenced.clone(),
            referencing_location: ReferenceLocation {
                filename: "a.md".to_string(),
                ..referenced
            },
        };
    }

    #[test]
    fn equal_backlinks_share_an_id() {
        let id = backlink_id(&backlink());
        assert_eq!(id, backlink_id(&backlink()));
        assert!(id.0.starts_with("backlink-"));
        assert_eq!(id.0.len(), "backlink-".len() + 64);
    }

    #[test]
    fn shifted_offsets_change_the_id() {
        let mut moved = backlink();
        moved.referencing_location.from = 4;
        assert_ne!(backlink_id(&moved), backlink_id(&backlink()));
    }

    #[test]
    fn empty_portal_differs_from_absent_portal() {
        let mut with_portal = backlink();
        with_portal.portal_text = Some(String::new());
        assert_ne!(backlink_id(&with_portal), backlink_id(&backlink()));
    }
}
