//! Data models for Google Wallet pass resources.
//!
//! - `OfferClass`, `OfferObject`: the offer vertical's class and object
//! - Shared building blocks: `TimeInterval`, `Image`, `Barcode`,
//!   `LatLongPoint`, links/image/text module data
//! - `ObjectReference`: an `{id, classId}` pair pointing at an existing object

pub mod common;
pub mod offer;

pub use common::{
    Barcode, BarcodeType, DateTime, Image, ImageModuleData, ImageUri, LatLongPoint,
    LinksModuleData, ObjectReference, PassVertical, TextModuleData, TimeInterval, Uri,
};
pub use offer::{ObjectState, OfferClass, OfferObject, RedemptionChannel, ReviewStatus};
