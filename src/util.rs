// SATEXP: Batch Experiments and Forwarding State Analysis for Satellite Network Simulations
// Copyright (C) 2024-2025 Roland Schmid <roschmi@ethz.ch> and Tibor Schneider <sctibor@ethz.ch>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//! Utility module collection of functions

use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

use crate::fstate::RoutePair;

/// Configuration file of `log4rs`, relative to the working directory.
pub const LOG_CONFIG_FILE: &str = "log4rs.yml";

/// Initialize logging from `log4rs.yml`, or with `pretty_env_logger` (configured through
/// `RUST_LOG`) if that file does not exist.
pub fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    if Path::new(LOG_CONFIG_FILE).exists() {
        log4rs::init_file(LOG_CONFIG_FILE, Default::default())?;
    } else {
        pretty_env_logger::try_init()?;
    }
    Ok(())
}

/// Parse a route pair given as `src,dst` (e.g., on the command line).
pub fn parse_pair(s: &str) -> Result<RoutePair, String> {
    let (src, dst) = s
        .split_once(',')
        .ok_or_else(|| format!("expected `src,dst`, got {s:?}"))?;
    let parse = |x: &str| u32::from_str(x.trim()).map_err(|e| format!("{x:?}: {e}"));
    Ok((parse(src)?, parse(dst)?))
}

pub trait PathBufExt: Sized {
    fn then(self, p: impl AsRef<Path>) -> PathBuf;

    fn then_ts(self, p: impl AsRef<str>, ts: &str) -> PathBuf {
        self.then(p.as_ref().replacen("{}", ts, 1))
    }
}

impl PathBufExt for PathBuf {
    fn then(mut self, p: impl AsRef<Path>) -> PathBuf {
        self.push(p);
        self
    }
}

impl PathBufExt for &Path {
    fn then(self, p: impl AsRef<Path>) -> PathBuf {
        let mut path = self.to_path_buf();
        path.push(p);
        path
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn pairs() {
        assert_eq!(parse_pair("1543,1612"), Ok((1543, 1612)));
        assert_eq!(parse_pair(" 10 , 20"), Ok((10, 20)));
        assert!(parse_pair("10").is_err());
        assert!(parse_pair("10,x").is_err());
    }

    #[test]
    fn path_ext() {
        let p = Path::new("runs").then("a").then_ts("scheduler_{}.json", "2026-10-19");
        assert_eq!(p, PathBuf::from("runs/a/scheduler_2026-10-19.json"));
    }
}
