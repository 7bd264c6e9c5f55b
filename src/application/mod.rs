// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Workflow coordination only: each use case wires the data,
// infra and ml layers together in the right order.
//
//   - No tensor math here (Layer 5)
//   - No argument parsing or printing (Layer 1)
//   - No file formats (Layers 4 and 6)

// The training workflow
pub mod train_use_case;

// Scoring a saved snapshot on a corpus split
pub mod evaluate_use_case;
