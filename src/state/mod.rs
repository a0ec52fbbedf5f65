//! Client-side render state.
//!
//! DESIGN
//! ======
//! Reactive signals hold plain snapshots captured from the `mappings`
//! synchronizer, so views never borrow the synchronizer while rendering.

pub mod mapper;
