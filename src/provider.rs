//! Provider-facing descriptors (data) and strategies (behavior).
//!
//! `descriptor` exposes validated, static endpoint configuration (`ProviderDescriptor`)
//! covering HTTPS-only authorization, token, and device authorization endpoints plus
//! the enabled grant types. `strategy` defines [`ProviderStrategy`], a transport-agnostic
//! hook used by flows to decorate outgoing parameter maps and to classify OAuth error
//! responses (`authorization_pending`, `slow_down`, `invalid_grant`, ...).

pub mod descriptor;
pub mod strategy;

pub use descriptor::*;
pub use strategy::*;
