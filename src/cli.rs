#![cfg(feature = "std")]

//! Text helpers for the terminal front-end: coordinate parsing and grid drawing.

use std::fmt::Write as _;

use crate::common::{Coord, ShotOutcome, ShotReport};
use crate::config::GRID_SIZE;
use crate::grid::Grid;

/// Column letter plus one-based row, e.g. `B7`.
pub fn coord_label(coord: Coord) -> String {
    format!("{}{}", (b'A' + coord.col as u8) as char, coord.row + 1)
}

/// Parse `B7` (case-insensitive) into a coordinate on the grid.
pub fn parse_coord(input: &str) -> Option<Coord> {
    let input = input.trim();
    let mut chars = input.chars();
    let col_ch = chars.next()?.to_ascii_uppercase();
    if !col_ch.is_ascii_uppercase() {
        return None;
    }
    let col = (col_ch as u8 - b'A') as usize;
    let row: usize = chars.as_str().parse().ok()?;
    if row == 0 {
        return None;
    }
    Coord::checked(row - 1, col).ok()
}

/// Parse a placement such as `A5 H` or `c2 v`. The orientation defaults to
/// horizontal. Returns the bow cell and whether the ship runs horizontally.
pub fn parse_placement(input: &str) -> Option<(Coord, bool)> {
    let mut parts = input.split_whitespace();
    let coord = parse_coord(parts.next()?)?;
    let horizontal = match parts.next().map(|p| p.to_ascii_uppercase()) {
        None => true,
        Some(p) if p == "H" => true,
        Some(p) if p == "V" => false,
        Some(_) => return None,
    };
    if parts.next().is_some() {
        return None;
    }
    Some((coord, horizontal))
}

/// Draw a grid. Ships are only drawn when `reveal` is set; sunk ships revealed
/// by the peer are always drawn.
///
/// ```text
/// X hit   o miss   S ship   # sunk ship   . unknown
/// ```
pub fn render_grid(grid: &Grid, reveal: bool) -> String {
    let mut out = String::from("   ");
    for c in 0..GRID_SIZE {
        let _ = write!(out, " {}", (b'A' + c as u8) as char);
    }
    out.push('\n');
    for r in 0..GRID_SIZE {
        let _ = write!(out, "{:2} ", r + 1);
        for c in 0..GRID_SIZE {
            let ch = match grid.cell(r, c) {
                Ok(cell) => {
                    let sunk = cell
                        .ship_index()
                        .and_then(|i| grid.ships().get(i))
                        .is_some_and(|s| s.is_sunk());
                    if cell.is_hit() && sunk {
                        '#'
                    } else if cell.is_hit() {
                        'X'
                    } else if cell.is_miss() {
                        'o'
                    } else if reveal && cell.has_ship() {
                        'S'
                    } else {
                        '.'
                    }
                }
                Err(_) => '?',
            };
            let _ = write!(out, " {}", ch);
        }
        out.push('\n');
    }
    out
}

/// One-line description of a shot, e.g. `B7: hit`.
pub fn describe_shot(report: &ShotReport) -> String {
    let what = match report.outcome {
        ShotOutcome::Miss => "miss",
        ShotOutcome::Hit => "hit",
        ShotOutcome::Sunk => "hit and sunk",
        ShotOutcome::AlreadyShot => "already shot there",
    };
    format!("{}: {}", coord_label(report.coord), what)
}
