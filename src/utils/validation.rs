use crate::utils::error::{Result, TopologyError};
use std::collections::HashSet;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(TopologyError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// Deploy env 名稱只允許小寫英數字、底線與連字號
pub fn validate_deploy_env_name(field_name: &str, name: &str) -> Result<()> {
    validate_non_empty_string(field_name, name)?;

    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
    {
        return Err(TopologyError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: name.to_string(),
            reason: "Deploy env names may only contain lowercase letters, digits, '_' and '-'"
                .to_string(),
        });
    }
    Ok(())
}

pub fn validate_unique_names<'a, I>(field_name: &str, names: I) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(TopologyError::ConfigValidationError {
                field: field_name.to_string(),
                message: format!("Duplicate name '{}'", name),
            });
        }
    }
    Ok(())
}

pub fn validate_non_empty_list<T>(field_name: &str, values: &[T]) -> Result<()> {
    if values.is_empty() {
        return Err(TopologyError::ConfigValidationError {
            field: field_name.to_string(),
            message: "List cannot be empty".to_string(),
        });
    }
    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| TopologyError::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(TopologyError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_deploy_env_name() {
        assert!(validate_deploy_env_name("deploy_envs", "sihp").is_ok());
        assert!(validate_deploy_env_name("deploy_envs", "uat-2").is_ok());
        assert!(validate_deploy_env_name("deploy_envs", "").is_err());
        assert!(validate_deploy_env_name("deploy_envs", "Prod").is_err());
        assert!(validate_deploy_env_name("deploy_envs", "dev staging").is_err());
    }

    #[test]
    fn test_validate_unique_names() {
        assert!(validate_unique_names("projects", ["cat", "dog"]).is_ok());
        assert!(validate_unique_names("projects", ["cat", "cat"]).is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("sizing.compute_max", 10u32, 1, 100).is_ok());
        assert!(validate_range("sizing.compute_max", 0u32, 1, 100).is_err());
        assert!(validate_range("sizing.compute_max", 101u32, 1, 100).is_err());
    }

    #[test]
    fn test_validate_required_field() {
        let region: Option<String> = None;
        assert!(matches!(
            validate_required_field("region", &region),
            Err(TopologyError::MissingConfigError { .. })
        ));
    }
}
