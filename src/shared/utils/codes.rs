use rand::Rng;

/// Six-digit numeric one-time passcode.
pub fn generate_otp() -> String {
    let code: u32 = rand::rng().random_range(100_000..=999_999);
    code.to_string()
}

/// 32 random bytes, hex encoded (64 chars).
pub fn generate_reset_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill(&mut bytes);
    hex::encode(bytes)
}

/// Candidate username: local part of the email plus a number below 10000.
pub fn username_candidate(email: &str) -> String {
    let local = email.split('@').next().unwrap_or(email);
    let suffix: u32 = rand::rng().random_range(0..10_000);
    format!("{local}{suffix}")
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otp_is_six_digits() {
        for _ in 0..100 {
            let otp = generate_otp();
            assert_eq!(otp.len(), 6);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn reset_token_is_64_hex_chars() {
        let token = generate_reset_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_reset_token());
    }

    #[test]
    fn username_uses_email_local_part() {
        assert!(username_candidate("jane.doe@example.com").starts_with("jane.doe"));
    }

    #[test]
    fn emails_are_trimmed_and_lowercased() {
        assert_eq!(normalize_email("  Jane@Example.COM "), "jane@example.com");
    }
}
