// ─────────────────────────────────────────────────────────────────────
// SCPN Lattice Boundaries — Error
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LatticeError {
    #[error(
        "Unregistered boundary: the boundary was never added to the registry or has been removed"
    )]
    UnregisteredBoundary,

    #[error("No charged species available to create wall charge")]
    NoWallChargeSpecies,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Domain decomposition error: {0}")]
    Decomposition(String),

    #[error("Device error: {0}")]
    Device(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type LatticeResult<T> = Result<T, LatticeError>;
