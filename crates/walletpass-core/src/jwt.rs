//! Signed "save to wallet" tokens.
//!
//! A token is an RS256 JWT signed with the service-account key. Its payload
//! either defines new classes/objects (created when the user saves the
//! pass) or references objects that already exist. Opening
//! `https://pay.google.com/gp/v/save/<token>` adds the passes to the user's
//! wallet.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::auth::{CredentialsError, ServiceAccountKey};
use crate::models::{ObjectReference, OfferClass, OfferObject, PassVertical};

pub const SAVE_URL_PREFIX: &str = "https://pay.google.com/gp/v/save/";

const AUDIENCE: &str = "google";
const TOKEN_TYPE: &str = "savetowallet";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavePayload {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub offer_classes: Vec<OfferClass>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub offer_objects: Vec<OfferObject>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub event_ticket_objects: Vec<ObjectReference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flight_objects: Vec<ObjectReference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub generic_objects: Vec<ObjectReference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub gift_card_objects: Vec<ObjectReference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub loyalty_objects: Vec<ObjectReference>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transit_objects: Vec<ObjectReference>,
}

impl SavePayload {
    /// Payload that creates the class and object when the user saves.
    pub fn new_offer(class: Option<OfferClass>, object: OfferObject) -> Self {
        Self {
            offer_classes: class.into_iter().collect(),
            offer_objects: vec![object],
            ..Default::default()
        }
    }

    pub fn from_references<I>(references: I) -> Self
    where
        I: IntoIterator<Item = (PassVertical, ObjectReference)>,
    {
        let mut payload = Self::default();
        for (vertical, reference) in references {
            payload.push_reference(vertical, reference);
        }
        payload
    }

    pub fn push_reference(&mut self, vertical: PassVertical, reference: ObjectReference) {
        let list = match vertical {
            PassVertical::Offer => {
                self.offer_objects.push(OfferObject {
                    id: reference.id,
                    class_id: reference.class_id,
                    ..Default::default()
                });
                return;
            }
            PassVertical::EventTicket => &mut self.event_ticket_objects,
            PassVertical::Flight => &mut self.flight_objects,
            PassVertical::Generic => &mut self.generic_objects,
            PassVertical::GiftCard => &mut self.gift_card_objects,
            PassVertical::Loyalty => &mut self.loyalty_objects,
            PassVertical::Transit => &mut self.transit_objects,
        };
        list.push(reference);
    }

    pub fn is_empty(&self) -> bool {
        self.offer_classes.is_empty()
            && self.offer_objects.is_empty()
            && self.event_ticket_objects.is_empty()
            && self.flight_objects.is_empty()
            && self.generic_objects.is_empty()
            && self.gift_card_objects.is_empty()
            && self.loyalty_objects.is_empty()
            && self.transit_objects.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveClaims {
    pub iss: String,
    pub aud: String,
    pub origins: Vec<String>,
    pub typ: String,
    pub iat: i64,
    pub payload: SavePayload,
}

/// Signs save tokens on behalf of one service account.
pub struct PassSigner {
    encoding_key: EncodingKey,
    key_id: Option<String>,
    issuer_email: String,
    origins: Vec<String>,
}

impl PassSigner {
    pub fn new(key: &ServiceAccountKey, origins: Vec<String>) -> Result<Self, CredentialsError> {
        Ok(Self {
            encoding_key: key.encoding_key()?,
            key_id: key.private_key_id.clone(),
            issuer_email: key.client_email.clone(),
            origins,
        })
    }

    pub fn claims(&self, payload: SavePayload, now: DateTime<Utc>) -> SaveClaims {
        SaveClaims {
            iss: self.issuer_email.clone(),
            aud: AUDIENCE.to_string(),
            origins: self.origins.clone(),
            typ: TOKEN_TYPE.to_string(),
            iat: now.timestamp(),
            payload,
        }
    }

    pub fn sign(&self, payload: SavePayload) -> Result<String> {
        self.sign_at(payload, Utc::now())
    }

    pub fn sign_at(&self, payload: SavePayload, now: DateTime<Utc>) -> Result<String> {
        if payload.is_empty() {
            anyhow::bail!("Refusing to sign a save token with an empty payload");
        }

        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key_id.clone();

        jsonwebtoken::encode(&header, &self.claims(payload, now), &self.encoding_key)
            .context("Failed to sign save token")
    }
}

pub fn save_url(token: &str) -> String {
    format!("{}{}", SAVE_URL_PREFIX, token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::samples::{existing_object_references, minimal_offer_object, sample_offer_class};
    use jsonwebtoken::{DecodingKey, Validation};
    use serde_json::json;

    const FIXTURE: &str = include_str!("../tests/fixtures/service_account.json");
    const PUBLIC_KEY: &str = include_str!("../tests/fixtures/public_key.pem");

    fn signer() -> PassSigner {
        let key = ServiceAccountKey::from_json(FIXTURE).unwrap();
        PassSigner::new(&key, vec!["www.example.com".to_string()]).unwrap()
    }

    fn decode(token: &str) -> jsonwebtoken::TokenData<SaveClaims> {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[AUDIENCE]);
        // Save tokens carry no expiry
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        jsonwebtoken::decode::<SaveClaims>(
            token,
            &DecodingKey::from_rsa_pem(PUBLIC_KEY.as_bytes()).unwrap(),
            &validation,
        )
        .expect("token should verify with the fixture public key")
    }

    #[test]
    fn test_new_objects_token() {
        let class = sample_offer_class("338", "cls");
        let object = minimal_offer_object("338", "cls", "obj");
        let payload = SavePayload::new_offer(Some(class), object);

        let now = Utc::now();
        let token = signer().sign_at(payload.clone(), now).unwrap();
        let decoded = decode(&token);

        assert_eq!(decoded.header.alg, Algorithm::RS256);
        assert_eq!(
            decoded.header.kid.as_deref(),
            Some("0123456789abcdef0123456789abcdef01234567")
        );
        assert_eq!(
            decoded.claims.iss,
            "wallet-demo@walletpass-test.iam.gserviceaccount.com"
        );
        assert_eq!(decoded.claims.aud, "google");
        assert_eq!(decoded.claims.typ, "savetowallet");
        assert_eq!(decoded.claims.origins, vec!["www.example.com".to_string()]);
        assert_eq!(decoded.claims.iat, now.timestamp());
        assert_eq!(decoded.claims.payload, payload);
    }

    #[test]
    fn test_existing_objects_payload_json() {
        let payload = SavePayload::from_references(existing_object_references("338"));
        let value = serde_json::to_value(&payload).unwrap();

        assert_eq!(value.as_object().unwrap().len(), 7);
        assert_eq!(
            value["offerObjects"],
            json!([{"id": "338.OFFER_OBJECT_SUFFIX", "classId": "338.OFFER_CLASS_SUFFIX"}])
        );
        assert_eq!(
            value["eventTicketObjects"],
            json!([{"id": "338.EVENT_OBJECT_SUFFIX", "classId": "338.EVENT_CLASS_SUFFIX"}])
        );
        assert!(value.get("offerClasses").is_none());

        let token = signer().sign(payload.clone()).unwrap();
        assert_eq!(decode(&token).claims.payload, payload);
    }

    #[test]
    fn test_rejects_empty_payload() {
        assert!(SavePayload::default().is_empty());
        assert!(signer().sign(SavePayload::default()).is_err());
    }

    #[test]
    fn test_save_url() {
        assert_eq!(save_url("abc.def.ghi"), "https://pay.google.com/gp/v/save/abc.def.ghi");
    }
}
