//! Perspective-aware box-score extraction
//!
//! Every extractor reads one game from the point of view of one team and
//! picks the home or away half accordingly.

use crate::{GameRecord, HoopsError, Result, StatValue, TeamId};

fn lookup<'g>(game: &'g GameRecord, team: TeamId, label: &str) -> Result<&'g StatValue> {
    game.stats_for(team)
        .ok_or(HoopsError::NotAParticipant { team })?
        .get(label)
        .ok_or_else(|| HoopsError::MissingStatistic {
            label: label.to_string(),
        })
}

fn malformed(label: &str, value: &StatValue) -> HoopsError {
    HoopsError::MalformedStatistic {
        label: label.to_string(),
        value: value.to_string(),
    }
}

/// A counting stat such as `BLK` or `AST`
pub fn counting_stat(game: &GameRecord, team: TeamId, label: &str) -> Result<f64> {
    let value = lookup(game, team, label)?;
    value.as_number().ok_or_else(|| malformed(label, value))
}

/// Made shots from a `"made-attempted"` line such as `FG`
pub fn shots_made(game: &GameRecord, team: TeamId, label: &str) -> Result<f64> {
    let value = lookup(game, team, label)?;
    value
        .as_made_attempted()
        .map(|(made, _)| made)
        .ok_or_else(|| malformed(label, value))
}

/// Made over attempted for one game, 0 when nothing was attempted
pub fn shooting_pct(game: &GameRecord, team: TeamId, label: &str) -> Result<f64> {
    let value = lookup(game, team, label)?;
    let (made, attempted) = value
        .as_made_attempted()
        .ok_or_else(|| malformed(label, value))?;
    if attempted == 0.0 {
        Ok(0.0)
    } else {
        Ok(made / attempted)
    }
}

pub fn points_for(game: &GameRecord, team: TeamId) -> Result<f64> {
    game.score_for(team)
        .map(f64::from)
        .ok_or(HoopsError::NotAParticipant { team })
}

pub fn points_against(game: &GameRecord, team: TeamId) -> Result<f64> {
    game.score_against(team)
        .map(f64::from)
        .ok_or(HoopsError::NotAParticipant { team })
}
