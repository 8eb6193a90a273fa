//! Protocol fee: `floor(amount * numerator / denominator)`, 25 / 10 000 by
//! default. No minimum fee; a zero amount pays zero.

use otcswap_types::{Amount, FeeSchedule, OtcError, Result, checked_add, mul_div_floor};

/// An amount together with the fee charged on top of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Charge {
    pub amount: Amount,
    pub fee: Amount,
    /// `amount + fee`: what the payer's balance and allowance must cover.
    pub total: Amount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeCalculator {
    numerator: Amount,
    denominator: Amount,
}

impl FeeCalculator {
    /// # Errors
    /// Returns `Configuration` if the denominator is zero.
    pub fn new(schedule: FeeSchedule) -> Result<Self> {
        if schedule.denominator == 0 {
            return Err(OtcError::Configuration("fee denominator must be > 0".into()));
        }
        Ok(Self {
            numerator: Amount::from(schedule.numerator),
            denominator: Amount::from(schedule.denominator),
        })
    }

    /// Fee owed on `amount`, rounded down.
    ///
    /// # Errors
    /// Returns `ArithmeticOverflow` if `amount * numerator` exceeds 256 bits.
    pub fn fee(&self, amount: Amount) -> Result<Amount> {
        mul_div_floor(amount, self.numerator, self.denominator, "fee")?
            .ok_or_else(|| OtcError::Internal("fee denominator is zero".into()))
    }

    /// Fee plus the overflow-checked total the payer must fund.
    pub fn charge(&self, amount: Amount) -> Result<Charge> {
        let fee = self.fee(amount)?;
        let total = checked_add(amount, fee, "amount + fee")?;
        Ok(Charge { amount, fee, total })
    }
}

impl Default for FeeCalculator {
    fn default() -> Self {
        let schedule = FeeSchedule::default();
        Self {
            numerator: Amount::from(schedule.numerator),
            denominator: Amount::from(schedule.denominator),
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::Rng;

    use super::*;

    fn amt(n: u64) -> Amount {
        Amount::from(n)
    }

    #[test]
    fn zero_amount_zero_fee() {
        assert_eq!(FeeCalculator::default().fee(amt(0)).unwrap(), amt(0));
    }

    #[test]
    fn small_amounts_round_down_to_zero() {
        let fees = FeeCalculator::default();
        assert_eq!(fees.fee(amt(250)).unwrap(), amt(0));
        assert_eq!(fees.fee(amt(399)).unwrap(), amt(0));
        assert_eq!(fees.fee(amt(400)).unwrap(), amt(1));
    }

    #[test]
    fn scenario_values() {
        let fees = FeeCalculator::default();
        assert_eq!(fees.fee(amt(1000)).unwrap(), amt(2));
        let charge = fees.charge(amt(1000)).unwrap();
        assert_eq!(charge.total, amt(1002));
    }

    #[test]
    fn fee_matches_formula_randomized() {
        let fees = FeeCalculator::default();
        let mut rng = rand::thread_rng();
        for _ in 0..1000 {
            let amount: u64 = rng.r#gen();
            let expected = u128::from(amount) * 25 / 10_000;
            assert_eq!(fees.fee(amt(amount)).unwrap(), Amount::from(expected));
        }
    }

    #[test]
    fn huge_amount_overflows_instead_of_wrapping() {
        let err = FeeCalculator::default().fee(Amount::MAX).unwrap_err();
        assert!(matches!(err, OtcError::ArithmeticOverflow { op: "fee" }));
    }

    #[test]
    fn fee_product_overflow_detected() {
        let fees = FeeCalculator::default();
        assert!(fees.fee(Amount::MAX / Amount::from(25u64)).is_ok());
        let err = fees.charge(Amount::MAX - amt(1)).unwrap_err();
        assert!(matches!(err, OtcError::ArithmeticOverflow { op: "fee" }));
    }

    #[test]
    fn total_overflow_detected() {
        // A 100% fee keeps the product in range, so only the sum overflows.
        let fees = FeeCalculator::new(FeeSchedule {
            numerator: 1,
            denominator: 1,
        })
        .unwrap();
        let amount = Amount::MAX / Amount::from(2u64) + amt(1);
        assert_eq!(fees.fee(amount).unwrap(), amount);
        let err = fees.charge(amount).unwrap_err();
        assert!(matches!(err, OtcError::ArithmeticOverflow { op: "amount + fee" }));
    }

    #[test]
    fn custom_schedule() {
        let fees = FeeCalculator::new(FeeSchedule {
            numerator: 1,
            denominator: 100,
        })
        .unwrap();
        assert_eq!(fees.fee(amt(1000)).unwrap(), amt(10));
        assert!(FeeCalculator::new(FeeSchedule {
            numerator: 1,
            denominator: 0,
        })
        .is_err());
    }
}
