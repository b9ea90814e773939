//! # Configuration
//!
//! Runtime settings for the contiguous allocator. [`CmaConfig::default`]
//! mirrors the build-time defaults in [`kernel_info::cma`]; the kernel
//! command line may then override the size of the default area with a
//! `cma=<size>` token.

use crate::error::ConfigError;
use kernel_info::cma::{DEFAULT_SIZE_MBYTES, DEFAULT_SIZE_PERCENTAGE, MAX_ALIGN_ORDER, SZ_1M};
use kernel_info::memory::PAGE_SIZE;
use kernel_memory_addresses::PhysicalAddress;

/// How the size of the default area is derived when no override is given.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub enum SizePolicy {
    /// Use [`CmaConfig::fixed_bytes`].
    #[default]
    Fixed,
    /// Use [`CmaConfig::percentage`] of total memory.
    Percentage,
    /// The smaller of the fixed and percentage sizes.
    Minimum,
    /// The larger of the fixed and percentage sizes.
    Maximum,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct CmaConfig {
    policy: SizePolicy,
    fixed_bytes: u64,
    percentage: u8,
    max_align_order: u32,
    size_override: Option<u64>,
    limit: Option<PhysicalAddress>,
}

impl Default for CmaConfig {
    fn default() -> Self {
        Self {
            policy: SizePolicy::default(),
            fixed_bytes: DEFAULT_SIZE_MBYTES * SZ_1M,
            percentage: DEFAULT_SIZE_PERCENTAGE,
            max_align_order: MAX_ALIGN_ORDER,
            size_override: None,
            limit: None,
        }
    }
}

impl CmaConfig {
    #[must_use]
    pub const fn with_policy(mut self, policy: SizePolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub const fn with_fixed_bytes(mut self, bytes: u64) -> Self {
        self.fixed_bytes = bytes;
        self
    }

    /// Percentages above 100 are clamped to 100.
    #[must_use]
    pub const fn with_percentage(mut self, percentage: u8) -> Self {
        self.percentage = if percentage > 100 { 100 } else { percentage };
        self
    }

    #[must_use]
    pub const fn with_max_align_order(mut self, order: u32) -> Self {
        self.max_align_order = order;
        self
    }

    /// Explicit default area size; takes precedence over the policy.
    #[must_use]
    pub const fn with_size_override(mut self, bytes: Option<u64>) -> Self {
        self.size_override = bytes;
        self
    }

    /// Upper physical bound for the default area.
    #[must_use]
    pub const fn with_limit(mut self, limit: Option<PhysicalAddress>) -> Self {
        self.limit = limit;
        self
    }

    #[must_use]
    pub const fn policy(&self) -> SizePolicy {
        self.policy
    }

    #[must_use]
    pub const fn fixed_bytes(&self) -> u64 {
        self.fixed_bytes
    }

    #[must_use]
    pub const fn percentage(&self) -> u8 {
        self.percentage
    }

    #[must_use]
    pub const fn max_align_order(&self) -> u32 {
        self.max_align_order
    }

    #[must_use]
    pub const fn size_override(&self) -> Option<u64> {
        self.size_override
    }

    #[must_use]
    pub const fn limit(&self) -> Option<PhysicalAddress> {
        self.limit
    }

    /// Apply every `cma=<size>` token of a kernel command line. The last one wins;
    /// other tokens are ignored.
    ///
    /// # Errors
    /// Returns a [`ConfigError`] if a `cma=` value is malformed.
    pub fn apply_cmdline(mut self, cmdline: &str) -> Result<Self, ConfigError> {
        for value in cmdline
            .split_ascii_whitespace()
            .filter_map(|token| token.strip_prefix("cma="))
        {
            self.size_override = Some(parse_size(value)?);
        }
        Ok(self)
    }

    /// Size of the default area for a machine with `total_memory` bytes,
    /// before reservation alignment. The override wins over the policy.
    #[must_use]
    pub fn default_area_size(&self, total_memory: u64) -> u64 {
        if let Some(bytes) = self.size_override {
            return bytes;
        }

        let fixed = self.fixed_bytes;
        let pages = total_memory / PAGE_SIZE;
        let percent = (pages.saturating_mul(u64::from(self.percentage)) / 100)
            .saturating_mul(PAGE_SIZE);

        match self.policy {
            SizePolicy::Fixed => fixed,
            SizePolicy::Percentage => percent,
            SizePolicy::Minimum => fixed.min(percent),
            SizePolicy::Maximum => fixed.max(percent),
        }
    }
}

/// Parse a size with an optional binary suffix (`K`, `M`, `G`, `T`, `P`, `E`,
/// case-insensitive). The mantissa is decimal, `0x` hexadecimal, or octal
/// with a leading `0`.
///
/// # Errors
/// [`ConfigError::InvalidSize`] for empty input, bad digits or trailing
/// characters; [`ConfigError::Overflow`] if the value exceeds 64 bits.
pub fn parse_size(input: &str) -> Result<u64, ConfigError> {
    let (digits, shift) = match input.as_bytes().last() {
        Some(b'k' | b'K') => (&input[..input.len() - 1], 10),
        Some(b'm' | b'M') => (&input[..input.len() - 1], 20),
        Some(b'g' | b'G') => (&input[..input.len() - 1], 30),
        Some(b't' | b'T') => (&input[..input.len() - 1], 40),
        Some(b'p' | b'P') => (&input[..input.len() - 1], 50),
        Some(b'e' | b'E') => (&input[..input.len() - 1], 60),
        _ => (input, 0),
    };

    let (digits, radix) = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        (hex, 16)
    } else if digits.len() > 1 && digits.starts_with('0') {
        (&digits[1..], 8)
    } else {
        (digits, 10)
    };

    let mut value: u64 = 0;
    if digits.is_empty() {
        return Err(ConfigError::InvalidSize);
    }
    for c in digits.chars() {
        let digit = c.to_digit(radix).ok_or(ConfigError::InvalidSize)?;
        value = value
            .checked_mul(u64::from(radix))
            .and_then(|v| v.checked_add(u64::from(digit)))
            .ok_or(ConfigError::Overflow)?;
    }

    if shift > 0 && value.leading_zeros() < shift {
        return Err(ConfigError::Overflow);
    }
    Ok(value << shift)
}
