use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateRoleRequest {
    #[validate(length(min = 1, max = 100, message = "The name field cannot be empty"))]
    pub name: String,

    #[validate(length(max = 255))]
    pub description: Option<String>,
}

/// Partial update of a role. A present `name` must not be empty.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct EditRoleRequest {
    #[validate(length(min = 1, max = 100, message = "The name field cannot be empty"))]
    pub name: Option<String>,

    #[validate(length(max = 255))]
    pub description: Option<String>,
}
