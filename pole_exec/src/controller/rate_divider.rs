//! Rate divider for running a slower loop inside a faster one

/// Fires once every `divisor` steps.
///
/// The first step fires, so the slow loop runs on the very first tick.
#[derive(Debug, Clone)]
pub struct RateDivider {
    divisor: u32,
    count: u32
}

impl RateDivider {
    /// Create a new divider. A divisor of zero is treated as one.
    pub fn new(divisor: u32) -> Self {
        Self {
            divisor: divisor.max(1),
            count: 0
        }
    }

    /// Advance by one step, returning `true` on steps where the slow loop
    /// should run.
    pub fn step(&mut self) -> bool {
        let fire = self.count == 0;

        self.count += 1;
        if self.count >= self.divisor {
            self.count = 0;
        }

        fire
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_every_fifth() {
        let mut div = RateDivider::new(5);
        let fired: Vec<bool> = (0..11).map(|_| div.step()).collect();

        assert_eq!(
            fired,
            vec![true, false, false, false, false, true, false, false, false, false, true]
        );
    }

    #[test]
    fn test_unity_and_zero() {
        let mut div = RateDivider::new(1);
        assert!((0..4).all(|_| div.step()));

        let mut div = RateDivider::new(0);
        assert!((0..4).all(|_| div.step()));
    }
}
