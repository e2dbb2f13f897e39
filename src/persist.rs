//! Saved matches and win/loss statistics on disk.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::game::{GameMode, MatchSnapshot, Scoreboard};

/// Extension of saved-match files.
pub const SAVE_EXTENSION: &str = "sav";

/// Named match snapshots in one directory, bincode-encoded.
#[derive(Debug, Clone)]
pub struct SaveStore {
    dir: PathBuf,
}

impl SaveStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Names of the saved matches, sorted. A missing directory holds none.
    pub fn list(&self) -> anyhow::Result<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", self.dir.display()))
            }
        };
        let mut names: Vec<String> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == SAVE_EXTENSION))
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(String::from))
            .collect();
        names.sort();
        Ok(names)
    }

    pub fn save(&self, name: &str, snapshot: &MatchSnapshot) -> anyhow::Result<PathBuf> {
        let path = self.path_for(name)?;
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("creating {}", self.dir.display()))?;
        let bytes = bincode::serialize(snapshot).context("encoding match")?;
        fs::write(&path, bytes).with_context(|| format!("writing {}", path.display()))?;
        log::info!("saved match {:?} to {}", name, path.display());
        Ok(path)
    }

    pub fn load(&self, name: &str) -> anyhow::Result<MatchSnapshot> {
        let path = self.path_for(name)?;
        let bytes = fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
        let snapshot = bincode::deserialize(&bytes)
            .with_context(|| format!("{} is not a saved match", path.display()))?;
        log::info!("loaded match {:?}", name);
        Ok(snapshot)
    }

    /// File for `name`. Names are plain file stems.
    fn path_for(&self, name: &str) -> anyhow::Result<PathBuf> {
        let name = name.trim();
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            anyhow::bail!("invalid save name {:?}", name);
        }
        Ok(self.dir.join(format!("{}.{}", name, SAVE_EXTENSION)))
    }
}

/// Wins and losses for one match type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub wins: u32,
    pub losses: u32,
}

impl Tally {
    pub fn played(&self) -> u32 {
        self.wins + self.losses
    }
}

/// Aggregate results per match type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Stats {
    pub vs_computer: Tally,
    pub local: Tally,
    pub online: Tally,
}

impl Stats {
    pub fn tally(&self, mode: GameMode) -> Tally {
        match mode {
            GameMode::VsComputer => self.vs_computer,
            GameMode::Hotseat => self.local,
            GameMode::Online => self.online,
        }
    }

    fn tally_mut(&mut self, mode: GameMode) -> &mut Tally {
        match mode {
            GameMode::VsComputer => &mut self.vs_computer,
            GameMode::Hotseat => &mut self.local,
            GameMode::Online => &mut self.online,
        }
    }

    pub fn record(&mut self, mode: GameMode, won: bool) {
        let tally = self.tally_mut(mode);
        if won {
            tally.wins = tally.wins.saturating_add(1);
        } else {
            tally.losses = tally.losses.saturating_add(1);
        }
    }

    /// Multi-line report, one line per match type.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        for mode in [GameMode::VsComputer, GameMode::Hotseat, GameMode::Online] {
            let t = self.tally(mode);
            let _ = writeln!(out, "{:<12} wins {:>4}  losses {:>4}", mode, t.wins, t.losses);
        }
        out
    }
}

/// Statistics backed by a JSON file, written after every change.
#[derive(Debug)]
pub struct StatsStore {
    path: PathBuf,
    stats: Stats,
}

impl StatsStore {
    /// Load the counters. A missing or unreadable file starts from zero.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let stats = match fs::read_to_string(&path) {
            Ok(json) => serde_json::from_str(&json).unwrap_or_else(|e| {
                log::warn!("ignoring corrupt stats file {}: {}", path.display(), e);
                Stats::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Stats::default(),
            Err(e) => {
                log::warn!("cannot read stats file {}: {}", path.display(), e);
                Stats::default()
            }
        };
        Self { path, stats }
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(&mut self, mode: GameMode, won: bool) -> anyhow::Result<()> {
        self.stats.record(mode, won);
        self.flush()
    }

    pub fn record_win(&mut self, mode: GameMode) -> anyhow::Result<()> {
        self.record(mode, true)
    }

    pub fn record_loss(&mut self, mode: GameMode) -> anyhow::Result<()> {
        self.record(mode, false)
    }

    pub fn reset(&mut self) -> anyhow::Result<()> {
        self.stats = Stats::default();
        self.flush()
    }

    pub fn flush(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&self.stats)?;
        fs::write(&self.path, json).with_context(|| format!("writing {}", self.path.display()))
    }
}

impl Scoreboard for StatsStore {
    fn record(&mut self, mode: GameMode, won: bool) -> anyhow::Result<()> {
        StatsStore::record(self, mode, won)
    }
}

/// A `StatsStore` shared between the front-end and the engines it creates.
#[derive(Debug, Clone)]
pub struct SharedStats(Arc<Mutex<StatsStore>>);

impl SharedStats {
    pub fn new(store: StatsStore) -> Self {
        Self(Arc::new(Mutex::new(store)))
    }

    pub fn snapshot(&self) -> anyhow::Result<Stats> {
        Ok(*self.lock()?.stats())
    }

    pub fn reset(&self) -> anyhow::Result<()> {
        self.lock()?.reset()
    }

    fn lock(&self) -> anyhow::Result<std::sync::MutexGuard<'_, StatsStore>> {
        self.0
            .lock()
            .map_err(|_| anyhow::anyhow!("stats store lock poisoned"))
    }
}

impl Scoreboard for SharedStats {
    fn record(&mut self, mode: GameMode, won: bool) -> anyhow::Result<()> {
        self.lock()?.record(mode, won)
    }
}
