use crate::domain::model::{Catalog, Domain, Faculty, Group, Member, Topic};
use crate::utils::error::{AllocError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_unique_ids, Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Declarative catalog + roster + submission script, loaded from TOML.
/// This stands in for the admin-managed catalog and the group-formation
/// flow, both of which live outside this crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub scenario: ScenarioMeta,
    #[serde(default, rename = "faculty")]
    pub faculties: Vec<Faculty>,
    #[serde(default, rename = "domain")]
    pub domains: Vec<Domain>,
    #[serde(default, rename = "topic")]
    pub topics: Vec<Topic>,
    #[serde(default, rename = "group")]
    pub groups: Vec<GroupSpec>,
    #[serde(default, rename = "submission")]
    pub submissions: Vec<SubmissionSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioMeta {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSpec {
    pub id: String,
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionSpec {
    pub group: String,
    pub faculty: String,
    pub domain: String,
    pub topic: String,
}

impl ScenarioConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(AllocError::Io)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content);
        toml::from_str(&processed).map_err(|e| AllocError::ConfigParse {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replace `${VAR_NAME}` placeholders with environment values; unknown
    /// variables are left as-is.
    fn substitute_env_vars(content: &str) -> String {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").expect("static pattern");
        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }

    /// Build the validated, immutable catalog.
    pub fn catalog(&self) -> Result<Catalog> {
        Catalog::new(
            self.faculties.clone(),
            self.domains.clone(),
            self.topics.clone(),
        )
    }

    /// Build the validated group roster.
    pub fn build_groups(&self) -> Result<Vec<Group>> {
        self.groups
            .iter()
            .map(|spec| Group::new(spec.id.clone(), spec.members.clone()))
            .collect()
    }
}

impl Validate for ScenarioConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("scenario.name", &self.scenario.name)?;

        validate_unique_ids("faculty", self.faculties.iter().map(|f| f.id.as_str()))?;
        for faculty in &self.faculties {
            validate_non_empty_string("faculty.id", &faculty.id)?;
            validate_positive_number("faculty.max_groups", faculty.max_groups, 1)?;
        }

        validate_unique_ids("domain", self.domains.iter().map(|d| d.id.as_str()))?;
        for domain in &self.domains {
            validate_non_empty_string("domain.id", &domain.id)?;
        }

        validate_unique_ids("topic", self.topics.iter().map(|t| t.id.as_str()))?;
        for topic in &self.topics {
            validate_non_empty_string("topic.id", &topic.id)?;
            validate_non_empty_string("topic.domain_id", &topic.domain_id)?;
            validate_positive_number("topic.max_groups", topic.max_groups, 1)?;
        }

        validate_unique_ids("group", self.groups.iter().map(|g| g.id.as_str()))?;
        for group in &self.groups {
            validate_non_empty_string("group.id", &group.id)?;
        }

        // submissions may reference unknown ids on purpose (to exercise the
        // NotFound paths), so only shape is checked here
        for submission in &self.submissions {
            validate_non_empty_string("submission.group", &submission.group)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const BASIC: &str = r#"
[scenario]
name = "contention-demo"
description = "three groups race for two slots"

[[faculty]]
id = "F1"
name = "Dr. Rao"
max_groups = 2

[[domain]]
id = "D1"
name = "Systems"

[[topic]]
id = "T1"
name = "Schedulers"
domain_id = "D1"
max_groups = 2

[[group]]
id = "G1"
members = [
    { roll_number = "21CS001", name = "Asha", leader = true },
    { roll_number = "21CS002", name = "Vikram" },
]

[[submission]]
group = "G1"
faculty = "F1"
domain = "D1"
topic = "T1"
"#;

    #[test]
    fn test_parse_basic_scenario() {
        let config = ScenarioConfig::from_toml_str(BASIC).unwrap();
        assert_eq!(config.scenario.name, "contention-demo");
        assert_eq!(config.faculties.len(), 1);
        assert_eq!(config.topics[0].max_groups, 2);
        assert_eq!(config.submissions.len(), 1);
        config.validate().unwrap();

        let groups = config.build_groups().unwrap();
        assert_eq!(groups[0].leader().roll_number, "21CS001");

        let catalog = config.catalog().unwrap();
        assert!(catalog.topic("T1").is_some());
    }

    #[test]
    fn test_max_groups_defaults_to_three() {
        let toml_content = r#"
[scenario]
name = "defaults"

[[faculty]]
id = "F1"
name = "Dr. Rao"

[[domain]]
id = "D1"
name = "Systems"

[[topic]]
id = "T1"
name = "Schedulers"
domain_id = "D1"
"#;
        let config = ScenarioConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.faculties[0].max_groups, 3);
        assert_eq!(config.topics[0].max_groups, 3);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("TEST_SCENARIO_NAME", "from-env");

        let toml_content = r#"
[scenario]
name = "${TEST_SCENARIO_NAME}"
"#;
        let config = ScenarioConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.scenario.name, "from-env");

        std::env::remove_var("TEST_SCENARIO_NAME");
    }

    #[test]
    fn test_validation_rejects_zero_capacity() {
        let toml_content = r#"
[scenario]
name = "broken"

[[faculty]]
id = "F1"
name = "Dr. Rao"
max_groups = 0
"#;
        let config = ScenarioConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_duplicate_ids() {
        let toml_content = r#"
[scenario]
name = "broken"

[[faculty]]
id = "F1"
name = "Dr. Rao"

[[faculty]]
id = "F1"
name = "Dr. Iyer"
"#;
        let config = ScenarioConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_build_groups_rejects_invalid_roster() {
        // parses fine, but the three-member group must not survive
        // construction: group invariants are enforced by Group::new, not
        // by deserialization
        let toml_content = r#"
[scenario]
name = "bad-roster"

[[group]]
id = "G1"
members = [
    { roll_number = "21CS001", name = "Asha", leader = true },
    { roll_number = "21CS002", name = "Vikram" },
    { roll_number = "21CS003", name = "Meera" },
]
"#;
        let config = ScenarioConfig::from_toml_str(toml_content).unwrap();
        assert!(config.build_groups().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(BASIC.as_bytes()).unwrap();

        let config = ScenarioConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.scenario.name, "contention-demo");
    }
}
