//! Chia NFT Minter
//!
//! Desktop backend for minting NFTs through a local Chia wallet node. The UI
//! talks to the backend only through named relay channels; see [`relay`] for
//! the request/response pairing and [`handlers`] for what each channel does.

pub mod api;
pub mod client;
pub mod coin;
pub mod handlers;
pub mod logging;
pub mod relay;
pub mod services;
pub mod settings;
pub mod store;
pub mod ui_state;
pub mod version;
pub mod wallet;

#[cfg(feature = "desktop")]
mod desktop;

#[cfg(test)]
pub(crate) mod testing;

#[cfg(feature = "desktop")]
pub use desktop::run;
