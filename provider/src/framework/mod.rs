// 🛡️ The framework owns every conversion between wire payloads and typed
// models, so write-only handling is enforced in one place.

pub mod codec;       // DynamicValue <-> Record
pub mod diagnostics; // Per-call problem reporting
pub mod lifecycle;   // Plan / apply / import / upgrade drivers
pub mod record;      // Decoded objects and typed extraction
pub mod schema;      // Attribute declarations
pub mod secrets;     // Write-only value hygiene
pub mod traits;      // Resource contracts
pub mod value;       // Null | Unknown | Known
