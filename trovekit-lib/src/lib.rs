//! Trovekit core library.
//!
//! A treasure is a keypair; so is the account that plants or claims it. This
//! crate is the stateless core shared by every trovekit front end: the
//! role-tagged key model and its human-typeable encodings, locator URLs for
//! QR codes and shared links, the backend wire types, and the dual-signature
//! plant/claim protocol engine.
//!
//! It holds no network or session state; the client crate owns those.
//!
//! # Example
//!
//! ```
//! use trovekit_lib::{protocol, Identity, KeyRole, Keypair};
//!
//! let account = Identity::from_keypair(Keypair::generate(KeyRole::Account));
//! let treasure = Identity::from_keypair(Keypair::generate(KeyRole::Treasure));
//!
//! let request = protocol::build_plant_request(&account, &treasure, Some(b"image"))?;
//! protocol::verify_plant_request(&request)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod digest;
pub mod errors;
pub mod keys;
pub mod locator;
pub mod protocol;
pub mod request;

pub use digest::ImageDigest;
pub use errors::{DecodeError, ProtocolError, VerifyError};
pub use keys::{Identity, KeyRole, Keypair, PublicKey, SecretKey, Signature};
pub use locator::DecodedLocator;
