use rand::{thread_rng, Rng};

const LOWEST_CODE: u32 = 100_000;
const HIGHEST_CODE: u32 = 999_999;

/// A one-time 6-digit numeric credential. Never starts with a zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerificationCode(u32);

impl VerificationCode {
    pub fn generate() -> Self {
        Self(thread_rng().gen_range(LOWEST_CODE..=HIGHEST_CODE))
    }

    /// Parses a code typed in by a visitor.
    pub fn parse(s: &str) -> Result<Self, String> {
        let trimmed = s.trim();
        let is_six_digits = trimmed.len() == 6 && trimmed.chars().all(|c| c.is_ascii_digit());
        if !is_six_digits {
            return Err(format!("{} is not a 6-digit verification code.", s));
        }
        match trimmed.parse::<u32>() {
            Ok(value) if (LOWEST_CODE..=HIGHEST_CODE).contains(&value) => Ok(Self(value)),
            _ => Err(format!("{} is not a 6-digit verification code.", s)),
        }
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for VerificationCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:06}", self.0)
    }
}
