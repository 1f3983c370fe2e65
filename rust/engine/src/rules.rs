use crate::errors::GameError;
use crate::Coins;

/// Smallest stake accepted by every table.
pub const MIN_BET: Coins = 10;

/// Largest stake any table accepts. The richest payout (50x on slots) of a
/// stake this size still fits in [`Coins`].
pub const MAX_BET: Coins = Coins::MAX / 64;

/// Checks a stake against the table minimum and the coins the player can
/// actually spend.
///
/// # Errors
///
/// - [`GameError::InvalidBetAmount`] - stake is below `minimum`
/// - [`GameError::AmountTooLarge`] - stake is above [`MAX_BET`]
/// - [`GameError::InsufficientFunds`] - stake exceeds `available`
///
/// # Examples
///
/// ```
/// use casino_engine::rules::validate_wager;
/// use casino_engine::errors::GameError;
///
/// assert_eq!(validate_wager(100, 10, 10_000), Ok(100));
/// assert!(matches!(
///     validate_wager(5, 10, 10_000),
///     Err(GameError::InvalidBetAmount { amount: 5, minimum: 10 })
/// ));
/// assert!(matches!(
///     validate_wager(500, 10, 200),
///     Err(GameError::InsufficientFunds { requested: 500, available: 200 })
/// ));
/// ```
pub fn validate_wager(amount: Coins, minimum: Coins, available: Coins) -> Result<Coins, GameError> {
    if amount < minimum {
        return Err(GameError::InvalidBetAmount { amount, minimum });
    }
    if amount > MAX_BET {
        return Err(GameError::AmountTooLarge {
            amount,
            maximum: MAX_BET,
        });
    }
    if amount > available {
        return Err(GameError::InsufficientFunds {
            requested: amount,
            available,
        });
    }
    Ok(amount)
}
