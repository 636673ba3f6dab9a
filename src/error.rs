pub type TripvizResult<T> = Result<T, TripvizError>;

#[derive(thiserror::Error, Debug)]
pub enum TripvizError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("attribute error: {0}")]
    Attribute(String),

    #[error("shader error: {0}")]
    Shader(String),

    #[error("render error: {0}")]
    Render(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TripvizError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn attribute(msg: impl Into<String>) -> Self {
        Self::Attribute(msg.into())
    }

    pub fn shader(msg: impl Into<String>) -> Self {
        Self::Shader(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(
            TripvizError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(
            TripvizError::attribute("x")
                .to_string()
                .contains("attribute error:")
        );
        assert!(
            TripvizError::shader("x")
                .to_string()
                .contains("shader error:")
        );
        assert!(
            TripvizError::render("x")
                .to_string()
                .contains("render error:")
        );
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = TripvizError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
