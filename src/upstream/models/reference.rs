// src/upstream/models/reference.rs
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A stakeholder or coordinator entry from the reference endpoints, as used
/// to populate form dropdowns. Only the fields the dashboard needs are kept;
/// the alternate spellings mirror what the backend actually sends.
#[derive(Debug, Clone, Serialize, Deserialize, Default, ToSchema)]
pub struct ReferencePerson {
    #[serde(alias = "_id", alias = "Stakeholder_ID", alias = "Coordinator_ID", default)]
    pub id: String,
    #[serde(alias = "fullName", alias = "Name", default)]
    pub name: String,
    #[serde(alias = "Email", default)]
    pub email: Option<String>,
    #[serde(alias = "District", alias = "districtName", default)]
    pub district: Option<String>,
    #[serde(alias = "Phone", alias = "phoneNumber", default)]
    pub phone: Option<String>,
}

/// District reference entry for the stakeholder management forms.
#[derive(Debug, Clone, Serialize, Deserialize, Default, ToSchema)]
pub struct District {
    #[serde(alias = "_id", alias = "District_ID", default)]
    pub id: String,
    #[serde(alias = "Name", alias = "districtName", default)]
    pub name: String,
}
