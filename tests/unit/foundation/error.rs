use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        CollageError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(CollageError::decode("x").to_string().contains("decode error:"));
    assert!(CollageError::asset("x").to_string().contains("asset error:"));
    assert!(
        CollageError::persist("x")
            .to_string()
            .contains("persist error:")
    );
    assert!(
        CollageError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = CollageError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn missing_or_corrupt_classification() {
    assert!(CollageError::asset("gone").is_missing_or_corrupt());
    assert!(CollageError::decode("bad").is_missing_or_corrupt());
    assert!(!CollageError::persist("disk").is_missing_or_corrupt());
    assert!(!CollageError::validation("v").is_missing_or_corrupt());
}
