// Managed resources served by this provider.

pub mod revealer; // Write-only value -> persisted attribute

pub use revealer::RevealerResource;
