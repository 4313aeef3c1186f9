//! Password strength rules for self-service password changes.

pub const MIN_LENGTH: usize = 8;

/// Characters that count as a symbol.
pub const SYMBOLS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";

/// Returns the first rule `password` breaks, if any.
pub fn check_strength(password: &str) -> Result<(), &'static str> {
    if password.chars().count() < MIN_LENGTH {
        return Err("Password must be at least 8 characters long");
    }
    if !password.chars().any(char::is_uppercase) {
        return Err("Password must contain at least one uppercase letter");
    }
    if !password.chars().any(char::is_lowercase) {
        return Err("Password must contain at least one lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one number");
    }
    if !password.chars().any(|c| SYMBOLS.contains(c)) {
        return Err("Password must contain at least one special character");
    }
    Ok(())
}
