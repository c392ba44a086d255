use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// The consensus forks a beacon state or block can belong to, in activation order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum ForkName {
    #[default]
    Phase0,
    Altair,
    Bellatrix,
    Capella,
}

impl ForkName {
    pub const ALL: [ForkName; 4] = [
        ForkName::Phase0,
        ForkName::Altair,
        ForkName::Bellatrix,
        ForkName::Capella,
    ];

    pub fn next(self) -> Option<ForkName> {
        match self {
            ForkName::Phase0 => Some(ForkName::Altair),
            ForkName::Altair => Some(ForkName::Bellatrix),
            ForkName::Bellatrix => Some(ForkName::Capella),
            ForkName::Capella => None,
        }
    }

    pub fn previous(self) -> Option<ForkName> {
        match self {
            ForkName::Phase0 => None,
            ForkName::Altair => Some(ForkName::Phase0),
            ForkName::Bellatrix => Some(ForkName::Altair),
            ForkName::Capella => Some(ForkName::Bellatrix),
        }
    }

    pub fn altair_enabled(self) -> bool {
        self >= ForkName::Altair
    }

    pub fn bellatrix_enabled(self) -> bool {
        self >= ForkName::Bellatrix
    }

    pub fn capella_enabled(self) -> bool {
        self >= ForkName::Capella
    }
}

impl fmt::Display for ForkName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForkName::Phase0 => write!(f, "phase0"),
            ForkName::Altair => write!(f, "altair"),
            ForkName::Bellatrix => write!(f, "bellatrix"),
            ForkName::Capella => write!(f, "capella"),
        }
    }
}

impl FromStr for ForkName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "phase0" | "base" => Ok(ForkName::Phase0),
            "altair" => Ok(ForkName::Altair),
            "bellatrix" | "merge" => Ok(ForkName::Bellatrix),
            "capella" => Ok(ForkName::Capella),
            other => Err(format!("unknown fork name: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("phase0", ForkName::Phase0)]
    #[case("Altair", ForkName::Altair)]
    #[case("merge", ForkName::Bellatrix)]
    #[case("capella", ForkName::Capella)]
    fn test_parse_fork_name(#[case] input: &str, #[case] expected: ForkName) {
        assert_eq!(input.parse::<ForkName>().unwrap(), expected);
    }

    #[test]
    fn test_fork_order() {
        for pair in ForkName::ALL.windows(2) {
            assert_eq!(pair[0].next(), Some(pair[1]));
            assert_eq!(pair[1].previous(), Some(pair[0]));
        }
        assert!(!ForkName::Phase0.altair_enabled());
        assert!(ForkName::Capella.bellatrix_enabled());
    }
}
