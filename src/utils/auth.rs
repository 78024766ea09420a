/// Compare two secrets in constant time.
///
/// Used for the legacy plaintext password path so the comparison does not leak
/// how many leading bytes matched.
pub fn constant_time_eq(provided: &[u8], expected: &[u8]) -> bool {
    provided.len() == expected.len()
        && provided
            .iter()
            .zip(expected.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_secrets() {
        assert!(constant_time_eq(b"s3cret", b"s3cret"));
    }

    #[test]
    fn test_different_secrets() {
        assert!(!constant_time_eq(b"s3cret", b"s3creT"));
    }

    #[test]
    fn test_different_length() {
        assert!(!constant_time_eq(b"short", b"much-longer-secret"));
        assert!(!constant_time_eq(b"s3cret", b"s3cret "));
    }

    #[test]
    fn test_empty() {
        assert!(constant_time_eq(b"", b""));
        assert!(!constant_time_eq(b"", b"x"));
    }
}
