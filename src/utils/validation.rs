use crate::utils::error::{ProxyError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(ProxyError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(ProxyError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(ProxyError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

/// 必填的機密欄位：缺少或空白都視為未設定，錯誤訊息不回顯內容
pub fn validate_required_secret<'a>(field_name: &str, value: &'a Option<String>) -> Result<&'a str> {
    match value.as_deref().map(str::trim) {
        Some(secret) if !secret.is_empty() => Ok(secret),
        _ => Err(ProxyError::MissingConfigError {
            field: field_name.to_string(),
        }),
    }
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ProxyError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(ProxyError::InvalidConfigValueError {
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
    fn test_validate_url() {
        assert!(validate_url("base_url", "https://serpapi.com").is_ok());
        assert!(validate_url("base_url", "http://127.0.0.1:8080").is_ok());
        assert!(validate_url("base_url", "").is_err());
        assert!(validate_url("base_url", "invalid-url").is_err());
        assert!(validate_url("base_url", "ftp://serpapi.com").is_err());
    }

    #[test]
    fn test_validate_required_secret() {
        assert_eq!(
            validate_required_secret("SERPAPI_API_KEY", &Some(" abc ".to_string())).unwrap(),
            "abc"
        );
        assert!(validate_required_secret("SERPAPI_API_KEY", &None).is_err());

        let err = validate_required_secret("SERPAPI_API_KEY", &Some("   ".to_string())).unwrap_err();
        assert!(matches!(err, ProxyError::MissingConfigError { ref field } if field == "SERPAPI_API_KEY"));
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("timeout_secs", 30u64, 1, 300).is_ok());
        assert!(validate_range("timeout_secs", 0u64, 1, 300).is_err());
        assert!(validate_range("timeout_secs", 301u64, 1, 300).is_err());
    }
}
