use thiserror::Error;

#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Invalid value '{value}' for filter parameter '{param}'")]
    InvalidParameter { param: String, value: String },
}

impl FilterError {
    pub fn invalid(param: impl Into<String>, value: impl Into<String>) -> Self {
        FilterError::InvalidParameter {
            param: param.into(),
            value: value.into(),
        }
    }
}
