//! Rendering and writing of the reward artifacts.
//!
//! All three reports are rendered in memory first. Writing stages each one in a
//! temporary file inside the output directory and only moves them into place once
//! every file has been written and synced. If moving one of them fails, the reports
//! already moved are restored to their previous contents (or removed when there
//! were none), so an I/O error never leaves a mix of old and new reports. A crash
//! in the middle of the moves is not covered.

use crate::{
    error::{CrowdloanError, IntegrityError},
    rewards::RewardPolicy,
};
use crowdloan_primitives::{format_decimal, ContributionMap, Ss58Normalizer};
use std::{
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;
use tracing::{debug, error, info, warn};

/// Raw contributions report.
pub const CONTRIBUTIONS_FILE: &str = "contributions.txt";

/// Raw rewards report.
pub const REWARDS_FILE: &str = "rewards.txt";

/// Markdown summary table.
pub const SUMMARY_FILE: &str = "crowdloan.md";

const SUMMARY_HEADER: &str = "| Contributor Address | DOT contributed | Entitled LAOS Rewards |\n";
const SUMMARY_DIVIDER: &str = "| --- | --- | --- |\n";

/// Rendered contents of the three artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reports {
    /// `|address|amount|` lines in smallest source units.
    pub contributions: String,
    /// `|address|reward|` lines in smallest target units.
    pub rewards: String,
    /// Markdown table with human readable amounts.
    pub summary: String,
}

impl Reports {
    /// File names paired with their contents, in write order.
    pub fn files(&self) -> [(&'static str, &str); 3] {
        [
            (CONTRIBUTIONS_FILE, self.contributions.as_str()),
            (REWARDS_FILE, self.rewards.as_str()),
            (SUMMARY_FILE, self.summary.as_str()),
        ]
    }
}

/// Renders the reports in the iteration order of `contributions`.
///
/// Every contributor must have an entry in `rewards`.
pub fn render_reports(
    contributions: &ContributionMap,
    rewards: &ContributionMap,
    normalizer: &Ss58Normalizer,
    policy: &RewardPolicy,
) -> Result<Reports, CrowdloanError> {
    let mut raw_contributions = String::new();
    let mut raw_rewards = String::new();
    let mut summary = String::from(SUMMARY_HEADER);
    summary.push_str(SUMMARY_DIVIDER);

    for (account, amount) in contributions {
        let reward =
            rewards.get(account).ok_or_else(|| IntegrityError::MissingReward(account.clone()))?;
        let address = normalizer.encode(account);

        raw_contributions.push_str(&format!("|{address}|{amount}|\n"));
        raw_rewards.push_str(&format!("|{address}|{reward}|\n"));
        summary.push_str(&format!(
            "| {address} | {} | {} |\n",
            format_decimal(*amount, policy.source_decimals),
            format_decimal(reward, policy.target_decimals),
        ));
    }

    Ok(Reports { contributions: raw_contributions, rewards: raw_rewards, summary })
}

/// Writes `reports` into `dir`, creating it if needed, and returns the written paths.
pub fn write_reports(dir: &Path, reports: &Reports) -> Result<Vec<PathBuf>, CrowdloanError> {
    std::fs::create_dir_all(dir).map_err(|err| {
        CrowdloanError::io(format!("failed to create output directory {}", dir.display()), err)
    })?;

    let mut staged = Vec::with_capacity(3);
    for (name, contents) in reports.files() {
        let target = dir.join(name);
        let mut file = NamedTempFile::new_in(dir).map_err(|err| {
            CrowdloanError::io(format!("failed to stage {}", target.display()), err)
        })?;
        file.write_all(contents.as_bytes())
            .and_then(|()| file.as_file().sync_all())
            .map_err(|err| CrowdloanError::io(format!("failed to write {}", target.display()), err))?;
        debug!(path = %target.display(), bytes = contents.len(), "staged report");
        staged.push((file, target));
    }

    let mut replaced = Vec::with_capacity(staged.len());
    if let Err(err) = persist_all(staged, &mut replaced) {
        restore(&replaced);
        return Err(err);
    }
    Ok(replaced.into_iter().map(|(target, _)| target).collect())
}

/// Moves every staged file into place, recording each target with the contents it
/// replaced.
fn persist_all(
    staged: Vec<(NamedTempFile, PathBuf)>,
    replaced: &mut Vec<(PathBuf, Option<Vec<u8>>)>,
) -> Result<(), CrowdloanError> {
    for (file, target) in staged {
        let previous = match std::fs::read(&target) {
            Ok(bytes) => Some(bytes),
            Err(err) if err.kind() == ErrorKind::NotFound => None,
            Err(err) => {
                return Err(CrowdloanError::io(format!("failed to read {}", target.display()), err))
            }
        };
        file.persist(&target).map_err(|err| {
            CrowdloanError::io(format!("failed to move {} into place", target.display()), err.error)
        })?;
        info!(path = %target.display(), "wrote report");
        replaced.push((target, previous));
    }
    Ok(())
}

fn restore(replaced: &[(PathBuf, Option<Vec<u8>>)]) {
    for (target, previous) in replaced.iter().rev() {
        let result = match previous {
            Some(bytes) => std::fs::write(target, bytes),
            None => std::fs::remove_file(target),
        };
        match result {
            Ok(()) => warn!(path = %target.display(), "rolled back report"),
            Err(err) => error!(path = %target.display(), %err, "failed to roll back report"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;
    use crowdloan_primitives::AccountId32;

    const UNIT: u64 = 10_000_000_000;

    fn fixtures() -> (ContributionMap, ContributionMap, Ss58Normalizer, RewardPolicy) {
        let contributions = ContributionMap::from_entries([
            (AccountId32::new([2u8; 32]), U256::from(12_345_000_000u64)),
            (AccountId32::new([1u8; 32]), U256::from(5 * UNIT)),
        ])
        .unwrap();
        let policy = RewardPolicy::default();
        let rewards = policy.compute_rewards(&contributions).unwrap();
        (contributions, rewards, Ss58Normalizer::default(), policy)
    }

    #[test]
    fn renders_all_reports_in_order() {
        let (contributions, rewards, normalizer, policy) = fixtures();
        let first = normalizer.encode(&AccountId32::new([2u8; 32]));
        let second = normalizer.encode(&AccountId32::new([1u8; 32]));

        let reports = render_reports(&contributions, &rewards, &normalizer, &policy).unwrap();

        assert_eq!(
            reports.contributions,
            format!("|{first}|12345000000|\n|{second}|50000000000|\n")
        );
        assert_eq!(
            reports.rewards,
            format!("|{first}|123450000000000000000|\n|{second}|500000000000000000000|\n")
        );
        assert_eq!(
            reports.summary,
            format!(
                "| Contributor Address | DOT contributed | Entitled LAOS Rewards |\n\
                 | --- | --- | --- |\n\
                 | {first} | 1.2345 | 123.45 |\n\
                 | {second} | 5 | 500 |\n"
            )
        );
    }

    #[test]
    fn empty_mapping_renders_header_only() {
        let reports = render_reports(
            &ContributionMap::new(),
            &ContributionMap::new(),
            &Ss58Normalizer::default(),
            &RewardPolicy::default(),
        )
        .unwrap();
        assert!(reports.contributions.is_empty());
        assert!(reports.rewards.is_empty());
        assert_eq!(reports.summary, format!("{SUMMARY_HEADER}{SUMMARY_DIVIDER}"));
    }

    #[test]
    fn missing_reward_is_an_integrity_error() {
        let (contributions, _, normalizer, policy) = fixtures();
        let err = render_reports(&contributions, &ContributionMap::new(), &normalizer, &policy)
            .unwrap_err();
        assert!(matches!(err, CrowdloanError::Integrity(IntegrityError::MissingReward(_))));
    }

    #[test]
    fn writes_reports_without_leftovers() {
        let (contributions, rewards, normalizer, policy) = fixtures();
        let reports = render_reports(&contributions, &rewards, &normalizer, &policy).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");

        let written = write_reports(&out, &reports).unwrap();

        assert_eq!(
            written,
            vec![out.join(CONTRIBUTIONS_FILE), out.join(REWARDS_FILE), out.join(SUMMARY_FILE)]
        );
        assert_eq!(std::fs::read_to_string(&written[0]).unwrap(), reports.contributions);
        assert_eq!(std::fs::read_to_string(&written[1]).unwrap(), reports.rewards);
        assert_eq!(std::fs::read_to_string(&written[2]).unwrap(), reports.summary);
        assert_eq!(std::fs::read_dir(&out).unwrap().count(), 3);
    }

    #[test]
    fn overwrites_previous_reports() {
        let (contributions, rewards, normalizer, policy) = fixtures();
        let reports = render_reports(&contributions, &rewards, &normalizer, &policy).unwrap();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(REWARDS_FILE), "stale").unwrap();

        write_reports(dir.path(), &reports).unwrap();

        assert_eq!(
            std::fs::read_to_string(dir.path().join(REWARDS_FILE)).unwrap(),
            reports.rewards
        );
    }

    #[test]
    fn failed_move_restores_earlier_reports() {
        let (contributions, rewards, normalizer, policy) = fixtures();
        let reports = render_reports(&contributions, &rewards, &normalizer, &policy).unwrap();
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONTRIBUTIONS_FILE), "previous run").unwrap();
        // a directory where the summary belongs makes the last move fail
        std::fs::create_dir(dir.path().join(SUMMARY_FILE)).unwrap();
        std::fs::write(dir.path().join(SUMMARY_FILE).join("keep"), "").unwrap();

        let err = write_reports(dir.path(), &reports).unwrap_err();

        assert!(matches!(err, CrowdloanError::Io { .. }));
        assert_eq!(
            std::fs::read_to_string(dir.path().join(CONTRIBUTIONS_FILE)).unwrap(),
            "previous run"
        );
        assert!(!dir.path().join(REWARDS_FILE).exists());
        let mut names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        assert_eq!(names, vec![CONTRIBUTIONS_FILE.to_string(), SUMMARY_FILE.to_string()]);
    }

    #[test]
    fn output_path_that_is_a_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();

        let reports = Reports {
            contributions: String::new(),
            rewards: String::new(),
            summary: String::new(),
        };
        let err = write_reports(&blocker, &reports).unwrap_err();

        assert!(matches!(err, CrowdloanError::Io { .. }));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
