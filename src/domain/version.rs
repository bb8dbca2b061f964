//! Service version selection rules

use std::fmt;
use std::str::FromStr;

use crate::domain::{DomainError, Version};

/// Which service version a command should operate on (`--version`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VersionSelector {
    /// Flag omitted: the active version, falling back to the latest.
    #[default]
    Unspecified,
    Latest,
    Active,
    Number(i64),
}

impl FromStr for VersionSelector {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Ok(VersionSelector::Unspecified),
            "latest" => Ok(VersionSelector::Latest),
            "active" => Ok(VersionSelector::Active),
            other => other
                .parse::<i64>()
                .map(VersionSelector::Number)
                .map_err(|_| DomainError::InvalidVersionSelector(other.to_string())),
        }
    }
}

impl fmt::Display for VersionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionSelector::Unspecified => write!(f, ""),
            VersionSelector::Latest => write!(f, "latest"),
            VersionSelector::Active => write!(f, "active"),
            VersionSelector::Number(n) => write!(f, "{n}"),
        }
    }
}

/// Pick the version matching `selector` from an unordered list.
pub fn select_version(
    versions: &[Version],
    selector: VersionSelector,
) -> Result<Version, DomainError> {
    let mut sorted: Vec<&Version> = versions.iter().collect();
    sorted.sort_by(|a, b| b.number.cmp(&a.number));

    let latest = || sorted.first().map(|v| (*v).clone());
    let active = || sorted.iter().find(|v| v.active).map(|v| (*v).clone());

    match selector {
        VersionSelector::Latest => latest().ok_or(DomainError::NoVersions),
        VersionSelector::Active => active().ok_or(DomainError::NoActiveVersion),
        VersionSelector::Unspecified => active().or_else(latest).ok_or(DomainError::NoVersions),
        VersionSelector::Number(n) => sorted
            .iter()
            .find(|v| v.number == n)
            .map(|v| (*v).clone())
            .ok_or(DomainError::VersionNotFound(n)),
    }
}

/// What a mutating command must do with the selected version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditPlan {
    /// Version is a draft and can be modified in place.
    InPlace,
    /// Version is locked or active and `--autoclone` permits cloning it.
    Clone,
}

/// Decide whether `version` can be mutated, given the autoclone setting.
pub fn plan_edit(version: &Version, autoclone: bool) -> Result<EditPlan, DomainError> {
    match (version.is_editable(), autoclone) {
        (true, _) => Ok(EditPlan::InPlace),
        (false, true) => Ok(EditPlan::Clone),
        (false, false) => Err(DomainError::VersionNotEditable(version.number)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn versions() -> Vec<Version> {
        vec![
            Version {
                number: 1,
                locked: true,
                ..Default::default()
            },
            Version {
                number: 3,
                ..Default::default()
            },
            Version {
                number: 2,
                active: true,
                locked: true,
                ..Default::default()
            },
        ]
    }

    #[rstest]
    #[case("latest", 3)]
    #[case("active", 2)]
    #[case("", 2)]
    #[case("1", 1)]
    fn given_selector_when_selecting_then_returns_expected_version(
        #[case] input: &str,
        #[case] expected: i64,
    ) {
        let selector: VersionSelector = input.parse().unwrap();
        let version = select_version(&versions(), selector).unwrap();
        assert_eq!(version.number, expected);
    }

    #[test]
    fn given_unknown_number_when_selecting_then_version_not_found() {
        let result = select_version(&versions(), VersionSelector::Number(42));
        assert_eq!(result, Err(DomainError::VersionNotFound(42)));
        assert_eq!(
            result.unwrap_err().to_string(),
            "specified service version not found: 42"
        );
    }

    #[test]
    fn given_no_active_version_when_selecting_unspecified_then_falls_back_to_latest() {
        let versions: Vec<Version> = versions()
            .into_iter()
            .map(|v| Version { active: false, ..v })
            .collect();
        let version = select_version(&versions, VersionSelector::Unspecified).unwrap();
        assert_eq!(version.number, 3);
        assert_eq!(
            select_version(&versions, VersionSelector::Active),
            Err(DomainError::NoActiveVersion)
        );
    }

    #[test]
    fn given_garbage_selector_when_parsing_then_error() {
        assert!(matches!(
            "abc".parse::<VersionSelector>(),
            Err(DomainError::InvalidVersionSelector(_))
        ));
    }

    #[rstest]
    #[case(false, false, false, Ok(EditPlan::InPlace))]
    #[case(true, false, true, Ok(EditPlan::Clone))]
    #[case(false, true, true, Ok(EditPlan::Clone))]
    #[case(true, true, false, Err(DomainError::VersionNotEditable(7)))]
    fn given_version_state_when_planning_edit_then_matches_table(
        #[case] active: bool,
        #[case] locked: bool,
        #[case] autoclone: bool,
        #[case] expected: Result<EditPlan, DomainError>,
    ) {
        let version = Version {
            number: 7,
            active,
            locked,
            ..Default::default()
        };
        assert_eq!(plan_edit(&version, autoclone), expected);
    }
}
