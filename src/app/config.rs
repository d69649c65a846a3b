//! Tool configuration.
//!
//! A small YAML file maps profile groups to AWS profiles per account type and
//! carries region defaults. The file is shared with the companion SSM tool.
//!
//! ```yaml
//! aws:
//!   profile_groups:
//!     apis:
//!       prod: apis-prod
//!       nonprod: apis-nonprod
//!   regions:
//!     apis: eu-west-1
//!   default_region: eu-west-1
//! timezone: local
//! ```

#![warn(clippy::all, rust_2018_idioms)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use crate::app::error::{ExportError, ExportResult};
use crate::app::local_zone::LocalZone;

pub const CONFIG_FILE_NAME: &str = "cloudwatch-get.yaml";
pub const SHARED_CONFIG_FILE_NAME: &str = "ssm-get.yaml";

/// Profiles for one group, by account type
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ProfileGroup {
    pub prod: Option<String>,
    pub nonprod: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct AwsSection {
    #[serde(default)]
    pub profile_groups: HashMap<String, ProfileGroup>,
    /// Region per profile group
    #[serde(default)]
    pub regions: HashMap<String, String>,
    pub default_region: Option<String>,
    pub region: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ToolConfig {
    pub aws: Option<AwsSection>,
    /// `local`, `utc` or a fixed offset like `+02:00`
    pub timezone: Option<String>,
}

/// Config plus the file it came from, if any
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub config: ToolConfig,
    pub source: Option<PathBuf>,
}

impl ToolConfig {
    pub fn from_yaml_str(contents: &str, path: &Path) -> ExportResult<Self> {
        let value: serde_yaml::Value = serde_yaml::from_str(contents).map_err(|e| {
            ExportError::validation(format!("Invalid YAML in config file: {}: {}", path.display(), e))
        })?;
        match value {
            serde_yaml::Value::Null => Ok(ToolConfig::default()),
            serde_yaml::Value::Mapping(_) => serde_yaml::from_value(value).map_err(|e| {
                ExportError::validation(format!(
                    "Invalid config structure in {}: {}",
                    path.display(),
                    e
                ))
            }),
            _ => Err(ExportError::validation(format!(
                "Invalid config structure in {}",
                path.display()
            ))),
        }
    }

    pub fn load_from_path(path: &Path) -> ExportResult<Self> {
        if !path.exists() {
            return Err(ExportError::validation(format!(
                "Missing config file: {}",
                path.display()
            )));
        }
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ExportError::validation(format!("Unable to read config file {}: {}", path.display(), e))
        })?;
        let config = Self::from_yaml_str(&contents, path)?;
        debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    fn aws(&self) -> ExportResult<&AwsSection> {
        self.aws
            .as_ref()
            .ok_or_else(|| ExportError::validation("Missing aws block in config"))
    }

    /// Profile for `group_name`, `prod` when `env` is `prod`, `nonprod` otherwise.
    pub fn profile_for(&self, group_name: &str, env: &str) -> ExportResult<String> {
        let aws = self.aws()?;
        if aws.profile_groups.is_empty() {
            return Err(ExportError::validation("Missing aws.profile_groups in config"));
        }
        let group = aws.profile_groups.get(group_name).ok_or_else(|| {
            ExportError::validation(format!("Unknown profile group: {}", group_name))
        })?;

        let account_type = if env == "prod" { "prod" } else { "nonprod" };
        let profile = if env == "prod" {
            group.prod.as_deref()
        } else {
            group.nonprod.as_deref()
        };
        non_blank(profile).ok_or_else(|| {
            ExportError::validation(format!(
                "Missing profile for {}.{}",
                group_name, account_type
            ))
        })
    }

    /// Region for the run: override, group region, `default_region`, `region`.
    pub fn resolve_region(
        &self,
        group_name: Option<&str>,
        override_region: Option<&str>,
    ) -> ExportResult<String> {
        if let Some(region) = non_blank(override_region) {
            return Ok(region);
        }

        let aws = self.aws.as_ref().ok_or_else(|| {
            ExportError::validation("Missing aws block in config; pass --region or provide config")
        })?;

        if let Some(region) = group_name
            .and_then(|group| aws.regions.get(group))
            .and_then(|region| non_blank(Some(region.as_str())))
        {
            return Ok(region);
        }

        non_blank(aws.default_region.as_deref())
            .or_else(|| non_blank(aws.region.as_deref()))
            .ok_or_else(|| {
                ExportError::validation(
                    "AWS region is not configured; pass --region or set aws.default_region in config",
                )
            })
    }

    /// Zone from the `timezone` key, host zone when unset.
    pub fn local_zone(&self) -> ExportResult<LocalZone> {
        match self.timezone.as_deref() {
            Some(raw) => raw.parse(),
            None => Ok(LocalZone::Host),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Profile group implied by a base log group name
pub fn infer_profile_group(base_name: &str) -> ExportResult<&'static str> {
    let lowered = base_name.to_lowercase();
    if lowered.contains("api") {
        return Ok("apis");
    }
    if lowered.contains("service") {
        return Ok("services");
    }
    Err(ExportError::validation(
        "Unable to infer profile group from base name. Include 'api' or 'service', or pass --profile.",
    ))
}

/// Places searched for a config file when none is given explicitly
pub fn candidate_paths() -> Vec<PathBuf> {
    let mut candidates = vec![PathBuf::from(CONFIG_FILE_NAME)];
    if let Some(config_dir) = dirs::config_dir() {
        candidates.push(config_dir.join("cloudwatch-get").join(CONFIG_FILE_NAME));
    }
    candidates.push(PathBuf::from(SHARED_CONFIG_FILE_NAME));
    candidates
}

/// Load `explicit` (must exist) or the first existing candidate.
///
/// Finding nothing is not an error: the run can still proceed with
/// `--profile` and `--region`.
pub fn load_config(explicit: Option<&Path>) -> ExportResult<LoadedConfig> {
    if let Some(path) = explicit {
        let config = ToolConfig::load_from_path(path)?;
        return Ok(LoadedConfig {
            config,
            source: Some(path.to_path_buf()),
        });
    }
    load_first_existing(&candidate_paths())
}

pub fn load_first_existing(candidates: &[PathBuf]) -> ExportResult<LoadedConfig> {
    for candidate in candidates {
        if candidate.exists() {
            let config = ToolConfig::load_from_path(candidate)?;
            info!("Using config file {:?}", candidate);
            return Ok(LoadedConfig {
                config,
                source: Some(candidate.clone()),
            });
        }
    }
    debug!("No config file found in {:?}", candidates);
    Ok(LoadedConfig::default())
}

/// AWS profile and region selected for a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwsTarget {
    pub profile: String,
    pub region: String,
}

/// Pick profile and region from CLI overrides and config.
pub fn resolve_aws_target(
    config: &ToolConfig,
    base_name: &str,
    env: &str,
    profile_override: Option<&str>,
    region_override: Option<&str>,
) -> ExportResult<AwsTarget> {
    let mut inferred_group = None;
    let profile = match non_blank(profile_override) {
        Some(profile) => profile,
        None => {
            let group = infer_profile_group(base_name)?;
            inferred_group = Some(group);
            config.profile_for(group, env)?
        }
    };
    let region = config.resolve_region(inferred_group, region_override)?;
    Ok(AwsTarget { profile, region })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
aws:
  profile_groups:
    apis:
      prod: apis-prod
      nonprod: apis-nonprod
    services:
      prod: svc-prod
      nonprod: "  "
  regions:
    apis: eu-west-1
  default_region: eu-central-1
timezone: "+01:00"
"#;

    fn sample() -> ToolConfig {
        ToolConfig::from_yaml_str(SAMPLE, Path::new("sample.yaml")).unwrap()
    }

    #[test]
    fn test_infer_profile_group() {
        assert_eq!(infer_profile_group("orders-API").unwrap(), "apis");
        assert_eq!(infer_profile_group("billing-service").unwrap(), "services");
        assert_eq!(infer_profile_group("api-service").unwrap(), "apis");
        assert!(infer_profile_group("worker").is_err());
    }

    #[test]
    fn test_profile_for_account_type() {
        let config = sample();
        assert_eq!(config.profile_for("apis", "prod").unwrap(), "apis-prod");
        assert_eq!(config.profile_for("apis", "sit").unwrap(), "apis-nonprod");
        let blank = config.profile_for("services", "dev").unwrap_err();
        assert_eq!(blank.to_string(), "Missing profile for services.nonprod");
        let unknown = config.profile_for("jobs", "dev").unwrap_err();
        assert_eq!(unknown.to_string(), "Unknown profile group: jobs");
    }

    #[test]
    fn test_region_precedence() {
        let config = sample();
        assert_eq!(
            config.resolve_region(Some("apis"), Some(" us-east-1 ")).unwrap(),
            "us-east-1"
        );
        assert_eq!(config.resolve_region(Some("apis"), None).unwrap(), "eu-west-1");
        assert_eq!(
            config.resolve_region(Some("services"), None).unwrap(),
            "eu-central-1"
        );
        assert_eq!(config.resolve_region(None, None).unwrap(), "eu-central-1");
    }

    #[test]
    fn test_region_falls_back_to_region_key() {
        let config = ToolConfig::from_yaml_str("aws:\n  region: ap-south-1\n", Path::new("c.yaml"))
            .unwrap();
        assert_eq!(config.resolve_region(None, None).unwrap(), "ap-south-1");
        let empty = ToolConfig::default();
        assert!(empty.resolve_region(None, None).is_err());
        assert_eq!(empty.resolve_region(None, Some("eu-west-2")).unwrap(), "eu-west-2");
    }

    #[test]
    fn test_empty_and_invalid_files() {
        let path = Path::new("c.yaml");
        assert_eq!(ToolConfig::from_yaml_str("", path).unwrap(), ToolConfig::default());
        assert!(ToolConfig::from_yaml_str("- a\n- b\n", path).is_err());
        assert!(ToolConfig::from_yaml_str("aws: [unclosed", path).is_err());
    }

    #[test]
    fn test_timezone_key() {
        assert!(matches!(sample().local_zone().unwrap(), LocalZone::Fixed(_)));
        assert_eq!(ToolConfig::default().local_zone().unwrap(), LocalZone::Host);
    }

    #[test]
    fn test_resolve_aws_target_prefers_overrides() {
        let config = sample();
        let target =
            resolve_aws_target(&config, "worker", "sit", Some("custom"), Some("us-west-2")).unwrap();
        assert_eq!(
            target,
            AwsTarget {
                profile: "custom".to_string(),
                region: "us-west-2".to_string(),
            }
        );

        let inferred = resolve_aws_target(&config, "orders-api", "sit", None, None).unwrap();
        assert_eq!(inferred.profile, "apis-nonprod");
        assert_eq!(inferred.region, "eu-west-1");
    }

    #[test]
    fn test_load_first_existing_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("shared.yaml");
        std::fs::write(&present, SAMPLE).unwrap();
        let loaded =
            load_first_existing(&[dir.path().join("absent.yaml"), present.clone()]).unwrap();
        assert_eq!(loaded.source, Some(present));
        assert_eq!(loaded.config, sample());

        let none = load_first_existing(&[dir.path().join("absent.yaml")]).unwrap();
        assert!(none.source.is_none());

        let absent = dir.path().join("absent.yaml");
        let missing = load_config(Some(absent.as_path())).unwrap_err();
        assert!(missing.to_string().starts_with("Missing config file:"));
    }
}
