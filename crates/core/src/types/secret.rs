//! Strength checks for configured secrets.
//!
//! Both web binaries refuse to start with a session secret that looks like a
//! placeholder or has too little entropy.

use std::collections::HashMap;

/// Minimum Shannon entropy, in bits per character, for a configured secret.
pub const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Why a secret was rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SecretStrengthError {
    #[error("appears to be a placeholder (contains '{0}')")]
    Placeholder(&'static str),
    #[error("entropy too low ({0:.2} bits/char, need >= 3.3). Use a randomly generated secret.")]
    LowEntropy(f64),
}

/// Calculate Shannon entropy in bits per character.
#[must_use]
pub fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Reject placeholders and low-entropy strings.
///
/// # Errors
///
/// Returns the first failed check.
pub fn validate_secret_strength(secret: &str) -> Result<(), SecretStrengthError> {
    let lower = secret.to_lowercase();

    if let Some(pattern) = PLACEHOLDER_PATTERNS
        .iter()
        .copied()
        .find(|p| lower.contains(p))
    {
        return Err(SecretStrengthError::Placeholder(pattern));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(SecretStrengthError::LowEntropy(entropy));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_edges() {
        assert!(shannon_entropy("").abs() < f64::EPSILON);
        assert!(shannon_entropy("aaaaaaa").abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!(shannon_entropy("aB3$xY9!mK2@nL5#") > MIN_ENTROPY_BITS_PER_CHAR);
    }

    #[test]
    fn test_placeholder_rejected() {
        assert_eq!(
            validate_secret_strength("your-session-key-here"),
            Err(SecretStrengthError::Placeholder("your-"))
        );
        assert!(validate_secret_strength("CHANGEME-now-123").is_err());
    }

    #[test]
    fn test_low_entropy_rejected() {
        assert!(matches!(
            validate_secret_strength(&"ab".repeat(20)),
            Err(SecretStrengthError::LowEntropy(_))
        ));
    }

    #[test]
    fn test_strong_secret_accepted() {
        assert!(validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6").is_ok());
    }
}
