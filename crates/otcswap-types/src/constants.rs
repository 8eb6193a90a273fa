//! System-wide constants for the OTCSwap offer escrow.

/// Protocol fee numerator: 25 / 10 000 = 0.25%.
pub const FEE_NUMERATOR: u64 = 25;

/// Protocol fee denominator (basis points of a basis point).
pub const FEE_DENOMINATOR: u64 = 10_000;
