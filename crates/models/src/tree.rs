use std::collections::BTreeMap;

/// component name → version of one environment
pub type ComponentVersions = BTreeMap<String, String>;

/// environment name → components of one app
pub type EnvironmentTree = BTreeMap<String, ComponentVersions>;

/// app name → environments; the whole dataset
pub type AppTree = BTreeMap<String, EnvironmentTree>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_payload_deserializes() {
        let raw = r#"{"svcA":{"prod":{"api":"1.0.0","db":"2.0.0"}}}"#;
        let tree: AppTree = serde_json::from_str(raw).unwrap();
        assert_eq!(tree["svcA"]["prod"]["db"], "2.0.0");
        // BTreeMap keeps output stable regardless of insertion order
        assert_eq!(serde_json::to_string(&tree).unwrap(), raw);
    }
}
