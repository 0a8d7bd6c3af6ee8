//! # Dailydays Photos
//!
//! Tooling for the Dailydays household-inventory prototypes: generates an
//! illustrative photo for every inventory item and serves the prototype
//! pages locally.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌──────────┐   ┌─────────┐   ┌──────────────┐
//! │ data.js  │──▶│  loader  │──▶│  select  │──▶│ prompt  │──▶│ image service│
//! │ RAW = [] │   │ jsonish  │   │ sampler  │   │ builder │   │  (OpenAI)    │
//! └──────────┘   └──────────┘   └──────────┘   └─────────┘   └──────┬───────┘
//!                                                                   ▼
//!                                                   images/<id>.webp + manifest.json
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! photos generate --dry-run --room kitchen   # preview prompts
//! photos generate --sample 25                # 25 diverse items
//! photos generate --ids obj-001,obj-005      # regenerate specific items
//! photos serve 8766                          # static dev server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration |
//! | [`error`] | Fatal startup conditions and exit codes |
//! | [`jsonish`] | JavaScript literal → JSON conversion |
//! | [`models`] | Item records and size buckets |
//! | [`loader`] | Data file parsing and record expansion |
//! | [`select`] | Filters and diversity sampling |
//! | [`prompt`] | Prompt construction |
//! | [`manifest`] | Generation manifest |
//! | [`images`] | Image service abstraction |
//! | [`artifacts`] | Full-size and thumbnail output |
//! | [`generate`] | Generation driver |
//! | [`server`] | Static file server |

pub mod artifacts;
pub mod config;
pub mod error;
pub mod generate;
pub mod images;
pub mod jsonish;
pub mod loader;
pub mod manifest;
pub mod models;
pub mod prompt;
pub mod select;
pub mod server;
