use std::env;

/// Identity stamped on the startup log line of each binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceContext {
    pub service_name: String,
    pub stage: String,
    pub component: String,
}

impl ServiceContext {
    pub fn from_env(component: &str) -> Self {
        Self::resolve(
            component,
            env::var("SERVICE_NAME").ok(),
            env::var("STAGE").ok(),
        )
    }

    pub(crate) fn resolve(
        component: &str,
        service_name: Option<String>,
        stage: Option<String>,
    ) -> Self {
        let component = component.trim().to_string();

        let service_name = non_blank(service_name).unwrap_or_else(|| component.clone());
        let stage = non_blank(stage)
            .map(|s| s.to_ascii_lowercase())
            .unwrap_or_else(|| "unknown".to_string());

        Self {
            service_name,
            stage,
            component,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_component_and_unknown_stage() {
        let context = ServiceContext::resolve(" backend ", None, Some("  ".to_string()));

        assert_eq!(context.service_name, "backend");
        assert_eq!(context.stage, "unknown");
        assert_eq!(context.component, "backend");
    }

    #[test]
    fn uses_configured_values() {
        let context = ServiceContext::resolve(
            "worker",
            Some("slot-market".to_string()),
            Some("Production".to_string()),
        );

        assert_eq!(context.service_name, "slot-market");
        assert_eq!(context.stage, "production");
    }
}
