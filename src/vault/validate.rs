use url::Url;

use crate::error::ValidationError;
use crate::providers::ServiceType;

/// Connection fields after validation. Blank optional fields become `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CheckedTarget {
    pub service_type: ServiceType,
    pub endpoint: Option<String>,
    pub model: Option<String>,
}

pub(crate) fn required<'a>(
    field: &'static str,
    value: &'a str,
) -> Result<&'a str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(trimmed)
}

fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Check service type, endpoint and model against the registry entry.
pub(crate) fn check_target(
    service_type: &str,
    endpoint: Option<&str>,
    model: Option<&str>,
) -> Result<CheckedTarget, ValidationError> {
    let service_type: ServiceType = required("service_type", service_type)?.parse()?;
    let capability = service_type.capability();

    let endpoint = optional(endpoint);
    let model = optional(model);

    match endpoint.as_deref() {
        None if capability.requires_endpoint => {
            return Err(ValidationError::MissingField("endpoint"));
        }
        Some(raw) if Url::parse(raw).is_err() => {
            return Err(ValidationError::InvalidEndpoint(raw.to_string()));
        }
        _ => {}
    }

    if capability.requires_model && model.is_none() {
        return Err(ValidationError::MissingField("model"));
    }

    Ok(CheckedTarget {
        service_type,
        endpoint,
        model,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_required_only_where_registered() {
        assert_eq!(
            check_target("huggingface", None, None),
            Err(ValidationError::MissingField("endpoint"))
        );
        assert_eq!(
            check_target("huggingface", Some("   "), None),
            Err(ValidationError::MissingField("endpoint"))
        );
        let ok = check_target("openai", Some(""), None).expect("openai needs no endpoint");
        assert_eq!(ok.endpoint, None);
    }

    #[test]
    fn malformed_endpoint_is_rejected() {
        assert_eq!(
            check_target("google-vertex-ai", Some("us-central1/predict"), None),
            Err(ValidationError::InvalidEndpoint("us-central1/predict".to_string()))
        );
    }

    #[test]
    fn requesty_requires_a_model() {
        assert_eq!(
            check_target("requesty-ai", None, None),
            Err(ValidationError::MissingField("model"))
        );
        let ok = check_target("requesty-ai", None, Some(" openai/gpt-4o ")).expect("valid");
        assert_eq!(ok.model.as_deref(), Some("openai/gpt-4o"));
    }

    #[test]
    fn unknown_and_blank_service_types() {
        assert_eq!(
            check_target("grok", None, None),
            Err(ValidationError::UnknownServiceType("grok".to_string()))
        );
        assert_eq!(
            check_target("", None, None),
            Err(ValidationError::MissingField("service_type"))
        );
    }
}
