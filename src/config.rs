/// Side length of every grid.
pub const GRID_SIZE: usize = 10;

/// Canonical fleet: one 4, two 3s, three 2s and four 1s.
pub const FLEET: [usize; 10] = [4, 3, 3, 2, 2, 2, 1, 1, 1, 1];

/// Number of ships in the canonical fleet.
pub const NUM_SHIPS: usize = FLEET.len();

/// Total number of ship segments used in the standard configuration.
pub const TOTAL_SHIP_CELLS: usize = 4 + 3 + 3 + 2 + 2 + 2 + 1 + 1 + 1 + 1;

/// Random samples tried per ship before falling back to a systematic scan.
pub const MAX_PLACEMENT_ATTEMPTS: usize = 1_000;

/// Longest protocol line accepted from a peer.
pub const MAX_LINE_LENGTH: usize = 1_024;

#[cfg(feature = "std")]
pub use settings::Settings;

#[cfg(feature = "std")]
mod settings {
    use std::path::PathBuf;
    use std::time::Duration;

    /// Runtime knobs for the binaries. Every field has a sensible default and the
    /// CLI overrides individual values.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Settings {
        pub save_dir: PathBuf,
        pub stats_path: PathBuf,
        pub think_time: Duration,
        pub io_timeout: Duration,
        pub port: u16,
    }

    impl Default for Settings {
        fn default() -> Self {
            Self {
                save_dir: PathBuf::from("saves"),
                stats_path: PathBuf::from("stats.json"),
                think_time: Duration::from_millis(1_000),
                io_timeout: Duration::from_secs(30),
                port: 5_000,
            }
        }
    }
}
