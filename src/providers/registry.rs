use super::ServiceType;

/// Input requirements of one provider. Compiled in; never mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderCapability {
    pub service_type: ServiceType,
    pub display_name: &'static str,
    pub requires_endpoint: bool,
    pub requires_model: bool,
    pub requires_api_key_for_model_listing: bool,
    pub endpoint_placeholder: Option<&'static str>,
    pub model_placeholder: Option<&'static str>,
}

static CAPABILITIES: [ProviderCapability; 5] = [
    ProviderCapability {
        service_type: ServiceType::Openai,
        display_name: "OpenAI",
        requires_endpoint: false,
        requires_model: false,
        requires_api_key_for_model_listing: true,
        endpoint_placeholder: None,
        model_placeholder: Some("e.g., gpt-3.5-turbo"),
    },
    ProviderCapability {
        service_type: ServiceType::HuggingFace,
        display_name: "Hugging Face",
        requires_endpoint: true,
        requires_model: false,
        requires_api_key_for_model_listing: false,
        endpoint_placeholder: Some("e.g., https://api-inference.huggingface.co/models/gpt2"),
        model_placeholder: None,
    },
    ProviderCapability {
        service_type: ServiceType::GoogleVertexAi,
        display_name: "Google Vertex AI",
        requires_endpoint: true,
        requires_model: false,
        requires_api_key_for_model_listing: false,
        endpoint_placeholder: Some(
            "e.g., https://us-central1-aiplatform.googleapis.com/v1/projects/YOUR_PROJECT_ID/locations/us-central1/publishers/google/models/text-bison:predict",
        ),
        model_placeholder: None,
    },
    ProviderCapability {
        service_type: ServiceType::Anthropic,
        display_name: "Anthropic",
        requires_endpoint: false,
        requires_model: false,
        requires_api_key_for_model_listing: false,
        endpoint_placeholder: None,
        model_placeholder: Some("e.g., claude-3-opus-20240229"),
    },
    ProviderCapability {
        service_type: ServiceType::RequestyAi,
        display_name: "Requesty.ai",
        requires_endpoint: false,
        requires_model: true,
        requires_api_key_for_model_listing: true,
        endpoint_placeholder: None,
        model_placeholder: Some("e.g., openai/gpt-4o-mini"),
    },
];

/// Lookup by the stored `service_type` string; unknown names yield `None`.
pub fn get_capability(service_type: &str) -> Option<&'static ProviderCapability> {
    CAPABILITIES
        .iter()
        .find(|cap| cap.service_type.as_str() == service_type)
}

pub(crate) fn capability_of(service_type: ServiceType) -> &'static ProviderCapability {
    CAPABILITIES
        .iter()
        .find(|cap| cap.service_type == service_type)
        .unwrap_or_else(|| unreachable!("every ServiceType has a registry entry"))
}

pub fn list_capabilities() -> &'static [ProviderCapability] {
    &CAPABILITIES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_service_type_has_exactly_one_entry() {
        for ty in ServiceType::ALL {
            let count = list_capabilities()
                .iter()
                .filter(|cap| cap.service_type == ty)
                .count();
            assert_eq!(count, 1, "{ty}");
            assert_eq!(capability_of(ty).service_type, ty);
            assert_eq!(get_capability(ty.as_str()), Some(capability_of(ty)));
        }
    }

    #[test]
    fn endpoint_requirements_carry_placeholders() {
        for cap in list_capabilities() {
            if cap.requires_endpoint {
                assert!(cap.endpoint_placeholder.is_some(), "{}", cap.display_name);
            }
            if cap.requires_model {
                assert!(cap.model_placeholder.is_some(), "{}", cap.display_name);
            }
        }
    }

    #[test]
    fn requesty_needs_a_model_and_a_key_to_list() {
        let cap = get_capability("requesty-ai").expect("registered");
        assert!(cap.requires_model);
        assert!(cap.requires_api_key_for_model_listing);
        assert!(!cap.requires_endpoint);

        assert!(get_capability("grok").is_none());
    }
}
