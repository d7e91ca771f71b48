//! Building blocks shared by every pass vertical.

use serde::{Deserialize, Serialize};

/// A validity window. Either end may be open.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeInterval {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<DateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime>,
}

/// ISO 8601 date-time wrapper as the API expects it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateTime {
    pub date: String,
}

impl DateTime {
    pub fn from_utc(at: chrono::DateTime<chrono::Utc>) -> Self {
        Self {
            date: at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub source_uri: ImageUri,
}

impl Image {
    pub fn from_uri(uri: impl Into<String>) -> Self {
        Self {
            source_uri: ImageUri { uri: uri.into() },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUri {
    pub uri: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BarcodeType {
    #[serde(alias = "qrCode")]
    QrCode,
    #[serde(alias = "aztec")]
    Aztec,
    #[serde(alias = "pdf417")]
    Pdf417,
    #[serde(alias = "code128")]
    Code128,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Barcode {
    #[serde(rename = "type")]
    pub kind: BarcodeType,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternate_text: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLongPoint {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinksModuleData {
    #[serde(default)]
    pub uris: Vec<Uri>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Uri {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageModuleData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub main_image: Image,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextModuleData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// Pass verticals a save token can carry objects for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassVertical {
    EventTicket,
    Flight,
    Generic,
    GiftCard,
    Loyalty,
    Offer,
    Transit,
}

impl PassVertical {
    pub const ALL: [PassVertical; 7] = [
        PassVertical::EventTicket,
        PassVertical::Flight,
        PassVertical::Generic,
        PassVertical::GiftCard,
        PassVertical::Loyalty,
        PassVertical::Offer,
        PassVertical::Transit,
    ];

    /// Key of the object list in a save-token payload.
    pub fn objects_key(&self) -> &'static str {
        match self {
            PassVertical::EventTicket => "eventTicketObjects",
            PassVertical::Flight => "flightObjects",
            PassVertical::Generic => "genericObjects",
            PassVertical::GiftCard => "giftCardObjects",
            PassVertical::Loyalty => "loyaltyObjects",
            PassVertical::Offer => "offerObjects",
            PassVertical::Transit => "transitObjects",
        }
    }

    /// Upper-case label used in placeholder suffixes.
    pub fn label(&self) -> &'static str {
        match self {
            PassVertical::EventTicket => "EVENT",
            PassVertical::Flight => "FLIGHT",
            PassVertical::Generic => "GENERIC",
            PassVertical::GiftCard => "GIFT_CARD",
            PassVertical::Loyalty => "LOYALTY",
            PassVertical::Offer => "OFFER",
            PassVertical::Transit => "TRANSIT",
        }
    }
}

/// Points at an object that already exists on the issuer account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectReference {
    pub id: String,
    pub class_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_date_time_from_utc() {
        let at = chrono::Utc.with_ymd_and_hms(2023, 6, 12, 23, 20, 50).unwrap();
        assert_eq!(DateTime::from_utc(at).date, "2023-06-12T23:20:50.000Z");
    }

    #[test]
    fn test_barcode_type_field_name() {
        let barcode = Barcode {
            kind: BarcodeType::QrCode,
            value: "QR code".to_string(),
            alternate_text: None,
        };
        assert_eq!(
            serde_json::to_value(&barcode).unwrap(),
            json!({"type": "QR_CODE", "value": "QR code"})
        );
    }

    #[test]
    fn test_barcode_accepts_echoed_enum_form() {
        let barcode: Barcode = serde_json::from_value(
            json!({"type": "qrCode", "value": "x", "kind": "walletobjects#barcode"}),
        )
        .unwrap();
        assert_eq!(barcode.kind, BarcodeType::QrCode);
    }

    #[test]
    fn test_open_time_interval_omits_missing_end() {
        let interval = TimeInterval {
            start: Some(DateTime { date: "2023-06-12T23:20:50.52Z".to_string() }),
            end: None,
        };
        assert_eq!(
            serde_json::to_value(&interval).unwrap(),
            json!({"start": {"date": "2023-06-12T23:20:50.52Z"}})
        );
    }
}
