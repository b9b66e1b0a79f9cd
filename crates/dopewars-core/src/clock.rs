//! The global game clock.
//!
//! One counter is shared by every player. It starts at 0 and advances by
//! exactly one on each accepted turn; a rejected turn never touches it.
//! The per-player cooldown is measured in these ticks, which is what lets
//! other players' turns fill a waiting player's lockout window.

/// Errors that can occur during clock operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,
}

/// Global tick counter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameClock {
    tick: u64,
}

impl GameClock {
    /// Create a clock at tick 0.
    pub const fn new() -> Self {
        Self { tick: 0 }
    }

    #[cfg(test)]
    const fn at(tick: u64) -> Self {
        Self { tick }
    }

    /// Return the current tick number.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// The tick an accepted turn would be recorded at, without advancing.
    pub const fn next_tick(&self) -> Result<u64, ClockError> {
        match self.tick.checked_add(1) {
            Some(next) => Ok(next),
            None => Err(ClockError::TickOverflow),
        }
    }

    /// Advance the clock by one tick. Returns the new tick number.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.tick = self.next_tick()?;
        Ok(self.tick)
    }
}

/// Cooldown rule: whether a player whose last accepted turn was at
/// `last_turn_tick` may act at `attempted_tick`.
///
/// Players who never acted are always allowed.
pub const fn cooldown_elapsed(last_turn_tick: Option<u64>, attempted_tick: u64, lockout: u64) -> bool {
    match last_turn_tick {
        None => true,
        Some(last) => match attempted_tick.checked_sub(last) {
            Some(gap) => gap >= lockout,
            None => false,
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn advances_by_one() {
        let mut clock = GameClock::new();
        assert_eq!(clock.next_tick().unwrap(), 1);
        assert_eq!(clock.tick(), 0);
        assert_eq!(clock.advance().unwrap(), 1);
        assert_eq!(clock.advance().unwrap(), 2);
        assert_eq!(clock.tick(), 2);
    }

    #[test]
    fn overflow_leaves_clock_unchanged() {
        let mut clock = GameClock::at(u64::MAX);
        assert_eq!(clock.advance(), Err(ClockError::TickOverflow));
        assert_eq!(clock.tick(), u64::MAX);
    }

    #[test]
    fn cooldown_boundaries() {
        assert!(cooldown_elapsed(None, 1, 3));
        assert!(!cooldown_elapsed(Some(1), 2, 3));
        assert!(!cooldown_elapsed(Some(1), 3, 3));
        assert!(cooldown_elapsed(Some(1), 4, 3));
        assert!(cooldown_elapsed(Some(1), 5, 3));
        // A clock behind the recorded tick never satisfies the rule.
        assert!(!cooldown_elapsed(Some(9), 4, 3));
    }
}
