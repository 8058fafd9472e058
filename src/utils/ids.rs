use mongodb::bson::oid::ObjectId;

use super::error::AppError;

/// Parses a hex document id from a path segment, naming the resource in the
/// error so clients see e.g. "Invalid event ID".
pub fn parse_object_id(raw: &str, resource: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(raw).map_err(|_| AppError::InvalidRequest(format!("Invalid {} ID", resource)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_hex_ids() {
        let id = ObjectId::new();
        assert_eq!(parse_object_id(&id.to_hex(), "event").unwrap(), id);
    }

    #[test]
    fn names_the_resource_on_failure() {
        match parse_object_id("nope", "event") {
            Err(AppError::InvalidRequest(msg)) => assert_eq!(msg, "Invalid event ID"),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
