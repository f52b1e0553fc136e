use {
    crate::identity::Party,
    serde::{Deserialize, Serialize},
    std::{cmp::Ordering, fmt},
    thiserror::Error,
};

/// A token type together with the party that issued it.
///
/// Two amounts are only comparable when both the symbol and the issuer
/// match; "10 GBP issued by bank A" and "10 GBP issued by bank B" are
/// distinct instruments.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenType {
    pub symbol: String,
    pub issuer: Party,
}

impl TokenType {
    pub fn new(symbol: impl Into<String>, issuer: Party) -> Self {
        Self {
            symbol: symbol.into(),
            issuer,
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.symbol, self.issuer)
    }
}

impl fmt::Debug for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "TokenType({self})")
    }
}

#[derive(Debug, Error)]
pub enum AmountError {
    #[error("cannot combine amounts of {0} and {1}")]
    TokenMismatch(TokenType, TokenType),
    #[error("amount arithmetic over- or underflowed")]
    Overflow,
}

/// An integer quantity of an issued token, in the token's minor unit.
///
/// Quantities are plain integers so that every validating party computes
/// bit-identical results; floating point would let independently-run
/// verifications diverge.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amount {
    pub quantity: u64,
    pub token: TokenType,
}

impl Amount {
    pub fn new(quantity: u64, token: TokenType) -> Self {
        Self { quantity, token }
    }

    pub fn zero(token: TokenType) -> Self {
        Self { quantity: 0, token }
    }

    pub fn is_zero(&self) -> bool {
        self.quantity == 0
    }

    pub fn checked_add(&self, other: &Self) -> Result<Self, AmountError> {
        self.combine(other, u64::checked_add)
    }

    pub fn checked_sub(&self, other: &Self) -> Result<Self, AmountError> {
        self.combine(other, u64::checked_sub)
    }

    fn combine(
        &self,
        other: &Self,
        op: impl Fn(u64, u64) -> Option<u64>,
    ) -> Result<Self, AmountError> {
        if self.token != other.token {
            return Err(AmountError::TokenMismatch(
                self.token.clone(),
                other.token.clone(),
            ));
        }
        let quantity = op(self.quantity, other.quantity).ok_or(AmountError::Overflow)?;
        Ok(Self {
            quantity,
            token: self.token.clone(),
        })
    }
}

impl PartialOrd for Amount {
    /// Amounts of different token types are incomparable.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        (self.token == other.token).then(|| self.quantity.cmp(&other.quantity))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.quantity, self.token)
    }
}

impl fmt::Debug for Amount {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Amount({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gbp() -> TokenType {
        TokenType::new("GBP", Party::new("Bank"))
    }

    #[test]
    fn adds_and_subtracts_same_token() {
        let a = Amount::new(100, gbp());
        let b = Amount::new(40, gbp());
        assert_eq!(a.checked_add(&b).unwrap().quantity, 140);
        assert_eq!(a.checked_sub(&b).unwrap().quantity, 60);
    }

    #[test]
    fn rejects_cross_token_arithmetic() {
        let a = Amount::new(100, gbp());
        let b = Amount::new(100, TokenType::new("USD", Party::new("Bank")));
        assert!(matches!(
            a.checked_add(&b),
            Err(AmountError::TokenMismatch(..))
        ));
        assert!(a.partial_cmp(&b).is_none());
    }

    #[test]
    fn underflow_is_an_error() {
        let a = Amount::new(10, gbp());
        let b = Amount::new(20, gbp());
        assert!(matches!(a.checked_sub(&b), Err(AmountError::Overflow)));
    }

    #[test]
    fn ordering_within_a_token() {
        let a = Amount::new(10, gbp());
        let b = Amount::new(20, gbp());
        assert!(a < b);
        assert!(b > a);
    }
}
