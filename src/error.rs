use thiserror::Error;

pub type Result<T> = std::result::Result<T, ComponentreeError>;

#[derive(Debug, Error)]
pub enum ComponentreeError {
    #[error(
        "Could not find component: {name}{}",
        .required_by.as_ref().map(|c| format!(" in component {c}")).unwrap_or_default()
    )]
    NotFound {
        name: String,
        required_by: Option<String>,
    },

    #[error("Circular dependency detected: {}", .chain.join(" -> "))]
    Circularity { chain: Vec<String> },

    #[error("No parameter source '{source_name}' registered (parameter '{parameter}' of {component})")]
    NoDataSource {
        component: String,
        parameter: String,
        source_name: String,
    },

    #[error("No value available for data parameter '{parameter}' of {component}")]
    MissingData { component: String, parameter: String },

    #[error("Component {component} is not constructible: {reason}")]
    NotConstructible { component: String, reason: String },

    #[error("Initializer {component}::{initializer} failed: {message}")]
    InitializerFailure {
        component: String,
        initializer: String,
        message: String,
    },

    #[error("Failed to downcast type: {type_name}")]
    DowncastFailed { type_name: String },

    #[error("Dependency graph validation failed: {count} circular chain(s) found")]
    InvalidGraph {
        count: usize,
        errors: Vec<ComponentreeError>,
    },

    #[error("Component loading failed: {0}")]
    Load(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ComponentreeError {
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound {
            name: name.into(),
            required_by: None,
        }
    }

    pub fn not_constructible(component: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::NotConstructible {
            component: component.into(),
            reason: reason.into(),
        }
    }

    /// The dependency chain carried by a `Circularity` error.
    pub fn chain(&self) -> Option<&[String]> {
        match self {
            Self::Circularity { chain } => Some(chain),
            _ => None,
        }
    }
}

impl From<figment::Error> for ComponentreeError {
    fn from(err: figment::Error) -> Self {
        ComponentreeError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_names_dependent() {
        let err = ComponentreeError::NotFound {
            name: "Database".into(),
            required_by: Some("UserService".into()),
        };
        assert_eq!(
            err.to_string(),
            "Could not find component: Database in component UserService"
        );
        assert_eq!(
            ComponentreeError::not_found("Database").to_string(),
            "Could not find component: Database"
        );
    }

    #[test]
    fn test_circularity_renders_chain() {
        let err = ComponentreeError::Circularity {
            chain: vec!["A".into(), "B".into(), "A".into()],
        };
        assert_eq!(err.to_string(), "Circular dependency detected: A -> B -> A");
        assert_eq!(err.chain().unwrap().len(), 3);
    }
}
