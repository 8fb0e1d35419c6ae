//! A region is a named string with well-known members plus an escape hatch
//! for anything this crate doesn't know about yet (new regions launch more
//! often than SDK releases ship).

use super::Partition;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Region {
    UsEast1,
    UsEast2,
    UsWest1,
    UsWest2,
    EuWest1,
    EuCentral1,
    ApSoutheast1,
    ApSoutheast2,
    ApNortheast1,
    CnNorth1,
    CnNorthwest1,
    UsGovWest1,
    UsGovEast1,
    Other(String),
}

impl Region {
    pub fn as_str(&self) -> &str {
        match self {
            Self::UsEast1 => "us-east-1",
            Self::UsEast2 => "us-east-2",
            Self::UsWest1 => "us-west-1",
            Self::UsWest2 => "us-west-2",
            Self::EuWest1 => "eu-west-1",
            Self::EuCentral1 => "eu-central-1",
            Self::ApSoutheast1 => "ap-southeast-1",
            Self::ApSoutheast2 => "ap-southeast-2",
            Self::ApNortheast1 => "ap-northeast-1",
            Self::CnNorth1 => "cn-north-1",
            Self::CnNorthwest1 => "cn-northwest-1",
            Self::UsGovWest1 => "us-gov-west-1",
            Self::UsGovEast1 => "us-gov-east-1",
            Self::Other(name) => name.as_str(),
        }
    }

    pub fn partition(&self) -> Partition {
        match self.as_str() {
            s if s.starts_with("cn-") => Partition::AwsCn,
            s if s.starts_with("us-gov-") => Partition::AwsUsGov,
            s if s.starts_with("us-iso-") => Partition::AwsIso,
            s if s.starts_with("us-isob-") => Partition::AwsIsoB,
            _ => Partition::Aws,
        }
    }
}

impl From<&str> for Region {
    fn from(s: &str) -> Self {
        match s {
            "us-east-1" => Self::UsEast1,
            "us-east-2" => Self::UsEast2,
            "us-west-1" => Self::UsWest1,
            "us-west-2" => Self::UsWest2,
            "eu-west-1" => Self::EuWest1,
            "eu-central-1" => Self::EuCentral1,
            "ap-southeast-1" => Self::ApSoutheast1,
            "ap-southeast-2" => Self::ApSoutheast2,
            "ap-northeast-1" => Self::ApNortheast1,
            "cn-north-1" => Self::CnNorth1,
            "cn-northwest-1" => Self::CnNorthwest1,
            "us-gov-west-1" => Self::UsGovWest1,
            "us-gov-east-1" => Self::UsGovEast1,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for Region {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_region_round_trips() {
        let r = Region::from("us-west-2");
        assert_eq!(r, Region::UsWest2);
        assert_eq!(r.as_str(), "us-west-2");
    }

    #[test]
    fn unknown_region_falls_back_to_other() {
        let r = Region::from("me-south-1");
        assert_eq!(r, Region::Other("me-south-1".to_string()));
    }

    #[test]
    fn china_regions_map_to_aws_cn_partition() {
        assert_eq!(Region::CnNorth1.partition(), Partition::AwsCn);
    }

    #[test]
    fn govcloud_regions_map_to_aws_us_gov_partition() {
        assert_eq!(Region::UsGovWest1.partition(), Partition::AwsUsGov);
    }
}
