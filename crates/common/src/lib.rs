pub mod types;
pub mod utils;
pub mod env;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_serializes_message() {
        let body = types::ErrorBody::new("backend unavailable");
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({"error": "backend unavailable"}));
    }
}
