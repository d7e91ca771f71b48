//! Demo payloads used by the CLI.
//!
//! The values mirror the published offer-pass walkthrough so the resulting
//! passes look the same in the Wallet console.

use chrono::{DateTime, Duration, Utc};

use crate::ids::resource_id;
use crate::models::{
    Barcode, BarcodeType, Image, ImageModuleData, LatLongPoint, LinksModuleData, ObjectReference,
    ObjectState, OfferClass, OfferObject, PassVertical, RedemptionChannel, ReviewStatus,
    TextModuleData, TimeInterval, Uri,
};

/// Length of the demo object's validity window.
const SAMPLE_VALIDITY_DAYS: i64 = 183;

const HERO_IMAGE_URI: &str = "https://farm4.staticflickr.com/3723/11177041115_6e6a3b6f49_o.jpg";
const MODULE_IMAGE_URI: &str = "http://farm4.staticflickr.com/3738/12440799783_3dc3c20606_b.jpg";

pub fn sample_offer_class(issuer_id: &str, class_suffix: &str) -> OfferClass {
    OfferClass {
        id: resource_id(issuer_id, class_suffix),
        issuer_name: Some("Issuer name".to_string()),
        provider: Some("Provider name".to_string()),
        title: Some("Offer title".to_string()),
        redemption_channel: Some(RedemptionChannel::Online),
        review_status: Some(ReviewStatus::UnderReview),
    }
}

pub fn sample_offer_object(
    issuer_id: &str,
    class_suffix: &str,
    object_suffix: &str,
    now: DateTime<Utc>,
) -> OfferObject {
    OfferObject {
        valid_time_interval: Some(TimeInterval {
            start: Some(crate::models::DateTime::from_utc(now)),
            end: Some(crate::models::DateTime::from_utc(
                now + Duration::days(SAMPLE_VALIDITY_DAYS),
            )),
        }),
        hero_image: Some(Image::from_uri(HERO_IMAGE_URI)),
        barcode: Some(Barcode {
            kind: BarcodeType::QrCode,
            value: "QR code".to_string(),
            alternate_text: None,
        }),
        locations: vec![LatLongPoint {
            latitude: 37.424015499999996,
            longitude: -122.09259560000001,
        }],
        links_module_data: Some(LinksModuleData {
            uris: vec![
                Uri {
                    id: Some("LINK_MODULE_URI_ID".to_string()),
                    uri: "http://maps.google.com/".to_string(),
                    description: Some("Link module URI description".to_string()),
                },
                Uri {
                    id: Some("LINK_MODULE_TEL_ID".to_string()),
                    uri: "tel:6505555555".to_string(),
                    description: Some("Link module tel description".to_string()),
                },
            ],
        }),
        image_modules_data: vec![ImageModuleData {
            id: Some("IMAGE_MODULE_ID".to_string()),
            main_image: Image::from_uri(MODULE_IMAGE_URI),
        }],
        text_modules_data: vec![TextModuleData {
            id: Some("TEXT_MODULE_ID".to_string()),
            header: Some("Text module header".to_string()),
            body: Some("Text module body".to_string()),
        }],
        ..minimal_offer_object(issuer_id, class_suffix, object_suffix)
    }
}

/// Just enough for the API to accept the object: ids and an active state.
pub fn minimal_offer_object(
    issuer_id: &str,
    class_suffix: &str,
    object_suffix: &str,
) -> OfferObject {
    OfferObject::new(
        resource_id(issuer_id, object_suffix),
        resource_id(issuer_id, class_suffix),
        ObjectState::Active,
    )
}

/// One placeholder reference per vertical.
pub fn existing_object_references(issuer_id: &str) -> Vec<(PassVertical, ObjectReference)> {
    PassVertical::ALL
        .iter()
        .map(|vertical| {
            let label = vertical.label();
            (
                *vertical,
                ObjectReference {
                    id: resource_id(issuer_id, &format!("{}_OBJECT_SUFFIX", label)),
                    class_id: resource_id(issuer_id, &format!("{}_CLASS_SUFFIX", label)),
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_sample_offer_class_json() {
        let class = sample_offer_class("3388000000022", "cls");
        assert_eq!(
            serde_json::to_value(&class).unwrap(),
            json!({
                "id": "3388000000022.cls",
                "issuerName": "Issuer name",
                "provider": "Provider name",
                "title": "Offer title",
                "redemptionChannel": "ONLINE",
                "reviewStatus": "UNDER_REVIEW"
            })
        );
    }

    #[test]
    fn test_sample_offer_object_json() {
        let now = Utc.with_ymd_and_hms(2023, 6, 12, 23, 20, 50).unwrap();
        let object = sample_offer_object("3388000000022", "cls", "obj", now);
        assert_eq!(
            serde_json::to_value(&object).unwrap(),
            json!({
                "id": "3388000000022.obj",
                "classId": "3388000000022.cls",
                "state": "ACTIVE",
                "validTimeInterval": {
                    "start": {"date": "2023-06-12T23:20:50.000Z"},
                    "end": {"date": "2023-12-12T23:20:50.000Z"}
                },
                "heroImage": {"sourceUri": {"uri": HERO_IMAGE_URI}},
                "barcode": {"type": "QR_CODE", "value": "QR code"},
                "locations": [{"latitude": 37.424015499999996, "longitude": -122.09259560000001}],
                "linksModuleData": {"uris": [
                    {"id": "LINK_MODULE_URI_ID", "uri": "http://maps.google.com/", "description": "Link module URI description"},
                    {"id": "LINK_MODULE_TEL_ID", "uri": "tel:6505555555", "description": "Link module tel description"}
                ]},
                "imageModulesData": [
                    {"id": "IMAGE_MODULE_ID", "mainImage": {"sourceUri": {"uri": MODULE_IMAGE_URI}}}
                ],
                "textModulesData": [
                    {"id": "TEXT_MODULE_ID", "header": "Text module header", "body": "Text module body"}
                ]
            })
        );
    }

    #[test]
    fn test_existing_object_references() {
        let refs = existing_object_references("42");
        assert_eq!(refs.len(), 7);

        let (vertical, gift_card) = &refs[3];
        assert_eq!(*vertical, PassVertical::GiftCard);
        assert_eq!(gift_card.id, "42.GIFT_CARD_OBJECT_SUFFIX");
        assert_eq!(gift_card.class_id, "42.GIFT_CARD_CLASS_SUFFIX");
    }
}
