// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust structs and traits describing what the system
// works with: sentence pairs and the collaborators that
// produce and tokenise them.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Everything that touches disk or tensors implements one of
// the traits declared here from a lower layer.

// A source/target sentence pair
pub mod sentence_pair;

// Collaborator abstractions (corpus source, vocabulary)
pub mod traits;
