use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        TenebraError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        TenebraError::capability("x")
            .to_string()
            .contains("capability unavailable:")
    );
    assert!(
        TenebraError::synthesis("x")
            .to_string()
            .contains("synthesis error:")
    );
    assert!(
        TenebraError::lifecycle("x")
            .to_string()
            .contains("lifecycle error:")
    );
    assert!(
        TenebraError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = TenebraError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn only_backend_failures_are_degradable() {
    assert!(TenebraError::capability("no audio").is_degradable());
    assert!(TenebraError::synthesis("bad buffer").is_degradable());
    assert!(!TenebraError::validation("x").is_degradable());
    assert!(!TenebraError::lifecycle("x").is_degradable());
}
