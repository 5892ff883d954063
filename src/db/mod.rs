//! Database layer (Firestore).

pub mod firestore;

pub use self::firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    /// TOTP credential records (keyed by lower-cased email)
    pub const TWO_FACTOR: &str = "two_factor";
}
