//! Run configuration.

use clap::ValueEnum;

/// How far the matrix dimension is padded before it is cut into blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum PaddingPolicy {
    /// Round up to a power of two, then up to a multiple of the grid
    /// dimension.
    #[default]
    PowerOfTwo,
    /// Round straight up to a multiple of the grid dimension.
    MultipleOfGrid,
}

impl PaddingPolicy {
    /// Smallest size `>= n` that this policy accepts for a `q x q` grid.
    /// Always a multiple of `q`.
    pub fn padded_size(self, n: usize, q: usize) -> usize {
        let base = match self {
            PaddingPolicy::PowerOfTwo => n.next_power_of_two(),
            PaddingPolicy::MultipleOfGrid => n,
        };
        base.div_ceil(q) * q
    }
}

/// What to do with a process count that is not a perfect square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum GridPolicy {
    /// Use the largest square grid that fits; the remaining ranks sit idle.
    #[default]
    ExcludeExtra,
    /// Fail on every rank before any communication happens.
    RequireSquare,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Config {
    pub padding: PaddingPolicy,
    pub grid: GridPolicy,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_padding(mut self, padding: PaddingPolicy) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_grid(mut self, grid: GridPolicy) -> Self {
        self.grid = grid;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_of_two_padding() {
        let policy = PaddingPolicy::PowerOfTwo;
        assert_eq!(policy.padded_size(1, 1), 1);
        assert_eq!(policy.padded_size(5, 1), 8);
        assert_eq!(policy.padded_size(5, 2), 8);
        // 8 is not a multiple of 3, so it is pushed to 9.
        assert_eq!(policy.padded_size(5, 3), 9);
        assert_eq!(policy.padded_size(17, 3), 33);
    }

    #[test]
    fn test_multiple_of_grid_padding() {
        let policy = PaddingPolicy::MultipleOfGrid;
        assert_eq!(policy.padded_size(1, 1), 1);
        assert_eq!(policy.padded_size(5, 2), 6);
        assert_eq!(policy.padded_size(6, 3), 6);
        assert_eq!(policy.padded_size(17, 3), 18);
    }

    #[test]
    fn test_padding_never_shrinks() {
        for policy in [PaddingPolicy::PowerOfTwo, PaddingPolicy::MultipleOfGrid] {
            for q in 1..=5 {
                for n in 1..=40 {
                    let padded = policy.padded_size(n, q);
                    assert!(padded >= n);
                    assert_eq!(padded % q, 0);
                }
            }
        }
    }

    #[test]
    fn test_builder() {
        let config = Config::new()
            .with_padding(PaddingPolicy::MultipleOfGrid)
            .with_grid(GridPolicy::RequireSquare);
        assert_eq!(config.padding, PaddingPolicy::MultipleOfGrid);
        assert_eq!(config.grid, GridPolicy::RequireSquare);
        assert_eq!(Config::default().padding, PaddingPolicy::PowerOfTwo);
    }
}
