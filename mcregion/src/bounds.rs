//! Parsing and ordering of the requested scan volume.

use anyhow::{Context, Result, bail};
use mcregion_anvil::WorldPos;

/// Comma separated "x,y,z" block position.
pub fn parse_xyz(s: &str) -> Result<WorldPos> {
    let values = parse_list(s, 3)?;
    Ok(WorldPos::new(values[0], values[1], values[2]))
}

/// Viewer position plus facing, "x,y,z,d" with d in degrees (0-360).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewer {
    pub pos: WorldPos,
    pub direction: u16,
}

pub fn parse_viewer(s: &str) -> Result<Viewer> {
    let values = parse_list(s, 4)?;
    let direction = values[3];
    if !(0..=360).contains(&direction) {
        bail!("direction {} must be between 0 and 360 degrees", direction);
    }
    Ok(Viewer {
        pos: WorldPos::new(values[0], values[1], values[2]),
        direction: direction as u16,
    })
}

fn parse_list(s: &str, expected: usize) -> Result<Vec<i64>> {
    let values = s
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<i64>()
                .with_context(|| format!("'{}' is not an integer", part))
        })
        .collect::<Result<Vec<_>>>()?;
    if values.len() != expected {
        bail!("expected {} comma-separated values, got {} in '{}'", expected, values.len(), s);
    }
    Ok(values)
}

/// Inclusive block volume with `min <= max` on every axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanBounds {
    pub min: WorldPos,
    pub max: WorldPos,
}

impl ScanBounds {
    /// Order two corners into a volume; reversed axes are swapped.
    pub fn new(start: WorldPos, end: WorldPos) -> Self {
        Self {
            min: WorldPos::new(start.x.min(end.x), start.y.min(end.y), start.z.min(end.z)),
            max: WorldPos::new(start.x.max(end.x), start.y.max(end.y), start.z.max(end.z)),
        }
    }

    pub fn contains(&self, pos: WorldPos) -> bool {
        (self.min.x..=self.max.x).contains(&pos.x)
            && (self.min.y..=self.max.y).contains(&pos.y)
            && (self.min.z..=self.max.z).contains(&pos.z)
    }

    /// Number of blocks in the volume (saturating).
    pub fn volume(&self) -> u128 {
        let span = |a: i64, b: i64| (b as i128 - a as i128 + 1) as u128;
        span(self.min.x, self.max.x)
            .saturating_mul(span(self.min.y, self.max.y))
            .saturating_mul(span(self.min.z, self.max.z))
    }
}
