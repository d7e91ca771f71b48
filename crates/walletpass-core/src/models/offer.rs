//! Offer vertical: the class (template) and object (issued pass).
//!
//! Only the fields this tool writes are modelled. Everything else the API
//! returns is ignored on deserialization.

use serde::{Deserialize, Serialize};

use super::common::{
    Barcode, Image, ImageModuleData, LatLongPoint, LinksModuleData, TextModuleData, TimeInterval,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RedemptionChannel {
    #[serde(alias = "online")]
    Online,
    #[serde(alias = "instore")]
    Instore,
    #[serde(alias = "both")]
    Both,
    #[serde(alias = "temporaryPriceReduction")]
    TemporaryPriceReduction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewStatus {
    #[serde(alias = "underReview")]
    UnderReview,
    #[serde(alias = "draft")]
    Draft,
    #[serde(alias = "approved")]
    Approved,
    #[serde(alias = "rejected")]
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObjectState {
    #[serde(alias = "active")]
    Active,
    #[serde(alias = "completed")]
    Completed,
    #[serde(alias = "expired")]
    Expired,
    #[serde(alias = "inactive")]
    Inactive,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferClass {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redemption_channel: Option<RedemptionChannel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_status: Option<ReviewStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferObject {
    /// Empty only for partial updates, where the id travels in the URL.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub class_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<ObjectState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_time_interval: Option<TimeInterval>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hero_image: Option<Image>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub barcode: Option<Barcode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<LatLongPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links_module_data: Option<LinksModuleData>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_modules_data: Vec<ImageModuleData>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub text_modules_data: Vec<TextModuleData>,
}

impl OfferObject {
    pub fn new(id: String, class_id: String, state: ObjectState) -> Self {
        Self {
            id,
            class_id,
            state: Some(state),
            ..Default::default()
        }
    }

    /// Body for a PATCH that changes nothing but the state.
    pub fn state_patch(state: ObjectState) -> Self {
        Self {
            state: Some(state),
            ..Default::default()
        }
    }
}
