use chrono::Utc;

/// Human-readable document number, e.g. `PO-1722950400123`. Distinct from the
/// row id; shown on printed documents and used for lookup by search.
pub fn generate(prefix: &str) -> String {
    format!("{}-{}", prefix, Utc::now().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_has_prefix_and_numeric_suffix() {
        let reference = generate("ADJ");
        let (prefix, suffix) = reference.split_once('-').expect("dash separator");
        assert_eq!(prefix, "ADJ");
        assert!(suffix.parse::<i64>().is_ok());
    }
}
