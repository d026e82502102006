//! Artifact モデル - レジストリが管理するもの
//!
//! artifact は `(name, type)` の組で識別されます。
//! バージョンは artifact にぶら下がり、出どころを指す provenance URI を持ちます。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::ValidationError;
use super::ids::ArtifactUid;

/// デプロイ単位の種類（artifact の識別子の一部）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArtifactType {
    Deb,
    Docker,
    GitRepo,
}

impl ArtifactType {
    pub const ALL: [ArtifactType; 3] = [Self::Deb, Self::Docker, Self::GitRepo];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deb => "DEB",
            Self::Docker => "DOCKER",
            Self::GitRepo => "GIT_REPO",
        }
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ValidationError::UnknownArtifactType(s.to_string()))
    }
}

/// DeliveryArtifact は名前と種類で識別されるデプロイ単位
///
/// デシリアライズも [`DeliveryArtifact::new`] を通るため、空の名前は入り込めない。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDeliveryArtifact")]
pub struct DeliveryArtifact {
    name: String,
    #[serde(rename = "type")]
    artifact_type: ArtifactType,
}

#[derive(Deserialize)]
struct RawDeliveryArtifact {
    name: String,
    #[serde(rename = "type")]
    artifact_type: ArtifactType,
}

impl TryFrom<RawDeliveryArtifact> for DeliveryArtifact {
    type Error = ValidationError;

    fn try_from(raw: RawDeliveryArtifact) -> Result<Self, Self::Error> {
        Self::new(raw.name, raw.artifact_type)
    }
}

impl DeliveryArtifact {
    pub fn new(name: impl Into<String>, artifact_type: ArtifactType) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        Ok(Self {
            name,
            artifact_type,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn artifact_type(&self) -> ArtifactType {
        self.artifact_type
    }
}

impl fmt::Display for DeliveryArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.artifact_type)
    }
}

/// レジストリが採番した uid と artifact の組
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredArtifact {
    pub uid: ArtifactUid,
    pub artifact: DeliveryArtifact,
}

/// Provenance はバージョンの出どころを示す URI（ビルドジョブ、コミットなど）
///
/// 検査するのは scheme だけで、残りはそのまま保持する。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Provenance(String);

impl Provenance {
    pub fn parse(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if has_uri_scheme(&value) {
            Ok(Self(value))
        } else {
            Err(ValidationError::InvalidProvenance(value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// scheme = ALPHA *( ALPHA / DIGIT / "+" / "-" / "." )、その後に ':' と 1 文字以上
fn has_uri_scheme(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((scheme, rest)) = value.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    let starts_alpha = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    starts_alpha
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        && !rest.is_empty()
}

impl TryFrom<String> for Provenance {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Provenance> for String {
    fn from(value: Provenance) -> Self {
        value.0
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// artifact の不変なリリース 1 件（provenance 付き）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryArtifactVersion {
    pub artifact: DeliveryArtifact,
    pub version: String,
    pub provenance: Provenance,
}

impl DeliveryArtifactVersion {
    pub fn new(artifact: DeliveryArtifact, version: impl Into<String>, provenance: Provenance) -> Self {
        Self {
            artifact,
            version: version.into(),
            provenance,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("DEB", ArtifactType::Deb)]
    #[case("DOCKER", ArtifactType::Docker)]
    #[case("GIT_REPO", ArtifactType::GitRepo)]
    fn artifact_type_parses_canonical_names(#[case] raw: &str, #[case] expected: ArtifactType) {
        assert_eq!(raw.parse::<ArtifactType>().unwrap(), expected);
        assert_eq!(expected.to_string(), raw);
    }

    #[rstest]
    #[case("docker")]
    #[case("RPM")]
    #[case("")]
    fn artifact_type_rejects_unknown(#[case] raw: &str) {
        assert!(matches!(
            raw.parse::<ArtifactType>(),
            Err(ValidationError::UnknownArtifactType(_))
        ));
    }

    #[test]
    fn artifact_type_serializes_like_display() {
        let json = serde_json::to_string(&ArtifactType::GitRepo).unwrap();
        assert_eq!(json, "\"GIT_REPO\"");
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn empty_names_are_rejected(#[case] name: &str) {
        assert_eq!(
            DeliveryArtifact::new(name, ArtifactType::Deb),
            Err(ValidationError::EmptyName)
        );
    }

    #[rstest]
    #[case("https://ci/build/42")]
    #[case("git+ssh://git@example.com/org/repo.git#abc123")]
    #[case("docker:registry.example.com/svc-a:10")]
    #[case("urn:isbn:0451450523")]
    fn provenance_accepts_uris(#[case] raw: &str) {
        assert_eq!(Provenance::parse(raw).unwrap().as_str(), raw);
    }

    #[rstest]
    #[case("")]
    #[case("ci/build/42")]
    #[case("1http://ci")]
    #[case("https:")]
    #[case("https://ci/build 42")]
    fn provenance_rejects_non_uris(#[case] raw: &str) {
        assert!(matches!(
            Provenance::parse(raw),
            Err(ValidationError::InvalidProvenance(_))
        ));
    }

    #[rstest]
    #[case(r#"{"name":"","type":"DEB"}"#)]
    #[case(r#"{"name":"  ","type":"DEB"}"#)]
    fn blank_names_do_not_deserialize(#[case] raw: &str) {
        assert!(serde_json::from_str::<DeliveryArtifact>(raw).is_err());
    }

    #[test]
    fn artifact_json_round_trips_through_validation() {
        let artifact: DeliveryArtifact =
            serde_json::from_str(r#"{"name":"payments","type":"DEB"}"#).unwrap();
        assert_eq!(artifact, DeliveryArtifact::new("payments", ArtifactType::Deb).unwrap());
        assert_eq!(
            serde_json::to_string(&artifact).unwrap(),
            r#"{"name":"payments","type":"DEB"}"#
        );
    }

    #[test]
    fn registered_artifact_rejects_blank_name() {
        let registered = RegisteredArtifact {
            uid: ArtifactUid::from_ulid(ulid::Ulid::new()),
            artifact: DeliveryArtifact::new("svc-a", ArtifactType::Docker).unwrap(),
        };
        let mut value = serde_json::to_value(&registered).unwrap();
        assert_eq!(
            serde_json::from_value::<RegisteredArtifact>(value.clone()).unwrap(),
            registered
        );

        value["artifact"]["name"] = serde_json::json!(" ");
        assert!(serde_json::from_value::<RegisteredArtifact>(value).is_err());
    }

    #[test]
    fn provenance_deserialization_validates() {
        let ok: Provenance = serde_json::from_str("\"https://ci/build/1\"").unwrap();
        assert_eq!(ok.as_str(), "https://ci/build/1");
        assert!(serde_json::from_str::<Provenance>("\"nope\"").is_err());
    }
}
