// ─────────────────────────────────────────────────────────────────────
// SCPN Lattice Boundaries — Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use crate::error::{LatticeError, LatticeResult};
use crate::state::{Grid3D, Vec3};
use serde::{Deserialize, Serialize};

/// Top-level system configuration: lattice, process grid, backend,
/// boundaries and the optional electrokinetic coupling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatticeConfig {
    pub system_name: String,
    pub lattice: LatticeParams,
    /// Process grid for the partitioned backend.
    #[serde(default = "default_node_grid")]
    pub node_grid: [usize; 3],
    #[serde(default)]
    pub backend: BackendKind,
    /// Rank of this process. Only rank 0 classifies on the GPU backend.
    #[serde(default)]
    pub this_node: usize,
    #[serde(default)]
    pub boundaries: Vec<BoundaryConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub electrokinetics: Option<ElectrokineticConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatticeParams {
    /// Global node count per axis.
    pub grid: [usize; 3],
    /// Lattice spacing.
    pub agrid: f64,
    /// Fluid time step.
    pub tau: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Cpu,
    Gpu,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundaryConfig {
    pub shape: ShapeConfig,
    #[serde(default)]
    pub velocity: Vec3,
    /// Surface charge density; 0 disables wall charge.
    #[serde(default)]
    pub charge_density: f64,
}

/// Geometry of a boundary. `direction = -1` inverts inside/outside.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShapeConfig {
    Wall {
        normal: Vec3,
        dist: f64,
    },
    Sphere {
        center: Vec3,
        radius: f64,
        #[serde(default = "default_direction")]
        direction: f64,
    },
    Cylinder {
        center: Vec3,
        axis: Vec3,
        radius: f64,
        length: f64,
        #[serde(default = "default_direction")]
        direction: f64,
        #[serde(default)]
        open: bool,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElectrokineticConfig {
    pub agrid: f64,
    /// Valency of each species, in species order.
    pub valencies: Vec<f64>,
}

fn default_node_grid() -> [usize; 3] {
    [1, 1, 1]
}
fn default_direction() -> f64 {
    1.0
}

impl LatticeConfig {
    /// Load from JSON file and validate.
    pub fn from_file(path: &str) -> LatticeResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(json: &str) -> LatticeResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> LatticeResult<()> {
        let lp = &self.lattice;
        if !(lp.agrid.is_finite() && lp.agrid > 0.0) {
            return Err(LatticeError::ConfigError(format!(
                "agrid must be finite and > 0, got {}",
                lp.agrid
            )));
        }
        if !(lp.tau.is_finite() && lp.tau > 0.0) {
            return Err(LatticeError::ConfigError(format!(
                "tau must be finite and > 0, got {}",
                lp.tau
            )));
        }
        if self.node_grid.iter().any(|&n| n == 0) {
            return Err(LatticeError::ConfigError(format!(
                "node_grid entries must be >= 1, got {:?}",
                self.node_grid
            )));
        }
        for (i, b) in self.boundaries.iter().enumerate() {
            if b.velocity.iter().any(|v| !v.is_finite()) || !b.charge_density.is_finite() {
                return Err(LatticeError::ConfigError(format!(
                    "boundary {i} has non-finite velocity or charge density"
                )));
            }
            b.shape.validate().map_err(|msg| {
                LatticeError::ConfigError(format!("boundary {i}: {msg}"))
            })?;
        }
        if let Some(ek) = &self.electrokinetics {
            if !(ek.agrid.is_finite() && ek.agrid > 0.0) {
                return Err(LatticeError::ConfigError(format!(
                    "electrokinetic agrid must be finite and > 0, got {}",
                    ek.agrid
                )));
            }
        }
        Ok(())
    }

    /// Global lattice described by this config.
    pub fn create_grid(&self) -> Grid3D {
        Grid3D::new(self.lattice.grid, self.lattice.agrid)
    }
}

impl ShapeConfig {
    fn validate(&self) -> Result<(), String> {
        match self {
            ShapeConfig::Wall { normal, dist } => {
                if !dist.is_finite() || norm(normal) == 0.0 {
                    return Err("wall needs a finite dist and a non-zero normal".to_string());
                }
            }
            ShapeConfig::Sphere { radius, .. } => {
                if !(radius.is_finite() && *radius >= 0.0) {
                    return Err(format!("sphere radius must be >= 0, got {radius}"));
                }
            }
            ShapeConfig::Cylinder {
                axis,
                radius,
                length,
                ..
            } => {
                if norm(axis) == 0.0 {
                    return Err("cylinder axis must be non-zero".to_string());
                }
                if !(radius.is_finite() && *radius >= 0.0 && length.is_finite() && *length >= 0.0)
                {
                    return Err(format!(
                        "cylinder radius/length must be >= 0, got {radius}/{length}"
                    ));
                }
            }
        }
        Ok(())
    }
}

fn norm(v: &Vec3) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    /// CARGO_MANIFEST_DIR points to crates/lattice-types/ at compile time.
    fn project_root() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("..").join("..")
    }

    fn config_path(relative: &str) -> String {
        project_root().join(relative).to_string_lossy().to_string()
    }

    const MINIMAL: &str = r#"{
        "system_name": "box",
        "lattice": { "grid": [4, 4, 4], "agrid": 1.0, "tau": 0.1 }
    }"#;

    #[test]
    fn test_load_charged_channel_config() {
        let cfg = LatticeConfig::from_file(&config_path("configs/charged_channel.json")).unwrap();
        assert_eq!(cfg.system_name, "charged-channel");
        assert_eq!(cfg.lattice.grid, [8, 8, 8]);
        assert_eq!(cfg.node_grid, [2, 1, 1]);
        assert_eq!(cfg.backend, BackendKind::Cpu);
        assert_eq!(cfg.boundaries.len(), 2);
        assert!((cfg.boundaries[0].charge_density - 0.5).abs() < 1e-12);
        let ek = cfg.electrokinetics.as_ref().expect("ek section");
        assert_eq!(ek.valencies, vec![1.0, -1.0]);
    }

    #[test]
    fn test_minimal_config_defaults() {
        let cfg = LatticeConfig::from_json_str(MINIMAL).unwrap();
        assert_eq!(cfg.node_grid, [1, 1, 1]);
        assert_eq!(cfg.backend, BackendKind::Cpu);
        assert_eq!(cfg.this_node, 0);
        assert!(cfg.boundaries.is_empty());
        assert!(cfg.electrokinetics.is_none());
        assert_eq!(cfg.create_grid().volume(), 64);
    }

    #[test]
    fn test_shape_defaults() {
        let json = r#"{
            "system_name": "sphere",
            "backend": "gpu",
            "lattice": { "grid": [4, 4, 4], "agrid": 1.0, "tau": 0.1 },
            "boundaries": [
                { "shape": { "type": "sphere", "center": [2, 2, 2], "radius": 1.0 } }
            ]
        }"#;
        let cfg = LatticeConfig::from_json_str(json).unwrap();
        assert_eq!(cfg.backend, BackendKind::Gpu);
        let b = &cfg.boundaries[0];
        assert_eq!(b.velocity, [0.0; 3]);
        assert_eq!(b.charge_density, 0.0);
        match b.shape {
            ShapeConfig::Sphere { direction, .. } => assert_eq!(direction, 1.0),
            ref other => panic!("Unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_non_positive_agrid() {
        let json = MINIMAL.replace("\"agrid\": 1.0", "\"agrid\": 0.0");
        let err = LatticeConfig::from_json_str(&json).expect_err("agrid=0 must fail");
        match err {
            LatticeError::ConfigError(msg) => assert!(msg.contains("agrid")),
            other => panic!("Unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_zero_wall_normal() {
        let json = r#"{
            "system_name": "bad",
            "lattice": { "grid": [4, 4, 4], "agrid": 1.0, "tau": 0.1 },
            "boundaries": [ { "shape": { "type": "wall", "normal": [0, 0, 0], "dist": 1.0 } } ]
        }"#;
        let err = LatticeConfig::from_json_str(json).expect_err("zero normal must fail");
        match err {
            LatticeError::ConfigError(msg) => assert!(msg.contains("boundary 0")),
            other => panic!("Unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_json_is_json_error() {
        let err = LatticeConfig::from_json_str("{ not json").expect_err("must fail");
        assert!(matches!(err, LatticeError::Json(_)));
    }

    #[test]
    fn test_roundtrip_serialization() {
        let cfg = LatticeConfig::from_file(&config_path("configs/charged_channel.json")).unwrap();
        let json = serde_json::to_string_pretty(&cfg).unwrap();
        let cfg2 = LatticeConfig::from_json_str(&json).unwrap();
        assert_eq!(cfg.system_name, cfg2.system_name);
        assert_eq!(cfg.lattice.grid, cfg2.lattice.grid);
        assert_eq!(cfg.boundaries.len(), cfg2.boundaries.len());
    }
}
