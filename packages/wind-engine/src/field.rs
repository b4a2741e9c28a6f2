//! field.rs — Spatial wind field over the race area
//!
//! Turns recent positioned fusion results into a gridded wind field at a
//! requested time. Samples are drift-projected to the field time first, then
//! interpolated: Gaussian-process regression (RBF kernel over lat/lon, one
//! regressor each for sin/cos of direction and for speed) when at least three
//! positioned samples are available and the kernel factorizes; otherwise
//! inverse-distance weighting. The grid covers the bounding box of the
//! positioned samples with a 10% margin and is regenerated per call, never
//! stored.

use nalgebra::{Cholesky, DMatrix, DVector, Dyn};
use tracing::debug;
use wind_types::{FusionResult, WindFieldGrid};

use crate::angles::normalize_deg;
use crate::config::FieldConfig;
use crate::fusion::DriftModel;

/// Minimum positioned samples for the GP path.
const MIN_GP_SAMPLES: usize = 3;
/// Fractional margin added around the sample bounding box.
const GRID_MARGIN: f64 = 0.1;
/// Degenerate-extent floor so a single cluster still gets a grid, degrees.
const MIN_EXTENT_DEG: f64 = 0.001;
/// IDW distance floor: a cell sitting exactly on a sample must not divide
/// by zero when the near-field override is configured off.
const IDW_DISTANCE_FLOOR: f64 = 1e-9;

/// One drift-projected sample feeding the interpolators.
#[derive(Debug, Clone, Copy)]
struct FieldSample {
    lat: f64,
    lon: f64,
    direction_deg: f64,
    speed_kts: f64,
    /// 0 at the field time, 1 at the edge of the time window
    time_uncertainty: f64,
}

pub struct SpatiotemporalFieldEstimator {
    cfg: FieldConfig,
}

impl SpatiotemporalFieldEstimator {
    pub fn new(cfg: FieldConfig) -> Self {
        Self { cfg }
    }

    /// Wind field at time `t` from recent fleet history. `None` when no
    /// positioned fusion result falls inside the time window.
    pub fn field_at(
        &self,
        history: &[FusionResult],
        drift: &DriftModel,
        t: f64,
    ) -> Option<WindFieldGrid> {
        let samples = self.project_samples(history, drift, t);
        if samples.is_empty() {
            debug!(t, "no positioned fusion results inside field window");
            return None;
        }

        let (lat_axis, lon_axis) = self.grid_axes(&samples);
        let rows = self.cfg.grid_resolution;
        let cols = self.cfg.grid_resolution;
        let cells = rows * cols;

        let mut grid = WindFieldGrid {
            rows,
            cols,
            lat: Vec::with_capacity(cells),
            lon: Vec::with_capacity(cells),
            direction_deg: Vec::with_capacity(cells),
            speed_kts: Vec::with_capacity(cells),
            confidence: Vec::with_capacity(cells),
            t,
        };
        for r in 0..rows {
            for c in 0..cols {
                grid.lat.push(lat_axis[r]);
                grid.lon.push(lon_axis[c]);
            }
        }

        // GP when enough samples and the kernel factorizes; IDW otherwise
        if samples.len() >= MIN_GP_SAMPLES {
            match GpWindModel::fit(&samples, &self.cfg) {
                Ok(gp) => {
                    self.fill_gp(&mut grid, &gp);
                    return Some(grid);
                }
                Err(err) => {
                    debug!(%err, "gaussian process fit failed, falling back to idw");
                }
            }
        }
        self.fill_idw(&mut grid, &samples);
        Some(grid)
    }

    /// Filter to positioned, in-window history and project each value to `t`
    /// along the drift model.
    fn project_samples(
        &self,
        history: &[FusionResult],
        drift: &DriftModel,
        t: f64,
    ) -> Vec<FieldSample> {
        history
            .iter()
            .filter(|r| (r.t - t).abs() <= self.cfg.time_window_s)
            .filter_map(|r| {
                let (lat, lon) = (r.lat?, r.lon?);
                let minutes = (t - r.t) / 60.0;
                Some(FieldSample {
                    lat,
                    lon,
                    direction_deg: normalize_deg(
                        r.wind_direction_deg + drift.direction_rate_deg_per_min * minutes,
                    ),
                    speed_kts: (r.wind_speed_kts + drift.speed_rate_kts_per_min * minutes)
                        .max(0.0),
                    time_uncertainty: ((r.t - t).abs() / self.cfg.time_window_s).min(1.0),
                })
            })
            .collect()
    }

    fn grid_axes(&self, samples: &[FieldSample]) -> (Vec<f64>, Vec<f64>) {
        let axis = |values: Vec<f64>| {
            let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let extent = (max - min).max(MIN_EXTENT_DEG);
            let lo = min - extent * GRID_MARGIN;
            let hi = max + extent * GRID_MARGIN;
            let n = self.cfg.grid_resolution;
            (0..n)
                .map(|i| lo + (hi - lo) * i as f64 / (n - 1).max(1) as f64)
                .collect::<Vec<f64>>()
        };
        (
            axis(samples.iter().map(|s| s.lat).collect()),
            axis(samples.iter().map(|s| s.lon).collect()),
        )
    }

    fn fill_gp(&self, grid: &mut WindFieldGrid, gp: &GpWindModel) {
        for i in 0..grid.lat.len() {
            let (lat, lon) = (grid.lat[i], grid.lon[i]);
            let (sin_d, sin_var) = gp.sin_dir.predict(lat, lon);
            let (cos_d, cos_var) = gp.cos_dir.predict(lat, lon);
            let (speed, speed_var) = gp.speed.predict(lat, lon);

            grid.direction_deg.push(normalize_deg(sin_d.atan2(cos_d).to_degrees()));
            grid.speed_kts.push(speed.max(0.0));

            // Direction uncertainty from the unit-vector component spread
            // (0 = certain, ~1 = uninformative), speed spread scaled to knots
            let dir_sigma = ((sin_var + cos_var) / 2.0).max(0.0).sqrt();
            let speed_sigma = speed_var.max(0.0).sqrt();
            grid.confidence.push(
                (0.8 - 0.4 * dir_sigma.min(1.0) - 0.4 * (speed_sigma / 5.0).min(1.0)).max(0.1),
            );
        }
    }

    fn fill_idw(&self, grid: &mut WindFieldGrid, samples: &[FieldSample]) {
        let mean_uncertainty =
            samples.iter().map(|s| s.time_uncertainty).sum::<f64>() / samples.len() as f64;
        let confidence = (0.6 - 0.4 * mean_uncertainty).max(0.1);

        for i in 0..grid.lat.len() {
            let (lat, lon) = (grid.lat[i], grid.lon[i]);

            // A cell sitting on top of a sample copies it exactly
            let near = samples.iter().find(|s| {
                ((s.lat - lat).powi(2) + (s.lon - lon).powi(2)).sqrt()
                    < self.cfg.near_field_distance
            });
            if let Some(s) = near {
                grid.direction_deg.push(s.direction_deg);
                grid.speed_kts.push(s.speed_kts);
                grid.confidence.push(confidence);
                continue;
            }

            let mut sin_sum = 0.0;
            let mut cos_sum = 0.0;
            let mut speed_sum = 0.0;
            let mut w_sum = 0.0;
            for s in samples {
                let d = ((s.lat - lat).powi(2) + (s.lon - lon).powi(2))
                    .sqrt()
                    .max(IDW_DISTANCE_FLOOR);
                let w = 1.0 / d.powf(self.cfg.idw_exponent);
                let rad = s.direction_deg.to_radians();
                sin_sum += w * rad.sin();
                cos_sum += w * rad.cos();
                speed_sum += w * s.speed_kts;
                w_sum += w;
            }
            grid.direction_deg
                .push(normalize_deg(sin_sum.atan2(cos_sum).to_degrees()));
            grid.speed_kts.push(speed_sum / w_sum);
            grid.confidence.push(confidence);
        }
    }
}

// ── Gaussian process regression ───────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
enum GpError {
    #[error("kernel matrix is not positive definite")]
    NotPositiveDefinite,
}

/// Three scalar GPs sharing one kernel geometry: sin/cos of direction and
/// speed, all over (lat, lon).
struct GpWindModel {
    sin_dir: GpRegressor,
    cos_dir: GpRegressor,
    speed: GpRegressor,
}

impl GpWindModel {
    fn fit(samples: &[FieldSample], cfg: &FieldConfig) -> Result<Self, GpError> {
        let xs: Vec<(f64, f64)> = samples.iter().map(|s| (s.lat, s.lon)).collect();
        let sin_y: Vec<f64> = samples
            .iter()
            .map(|s| s.direction_deg.to_radians().sin())
            .collect();
        let cos_y: Vec<f64> = samples
            .iter()
            .map(|s| s.direction_deg.to_radians().cos())
            .collect();
        let speed_y: Vec<f64> = samples.iter().map(|s| s.speed_kts).collect();
        Ok(Self {
            sin_dir: GpRegressor::fit(&xs, &sin_y, cfg)?,
            cos_dir: GpRegressor::fit(&xs, &cos_y, cfg)?,
            speed: GpRegressor::fit(&xs, &speed_y, cfg)?,
        })
    }
}

struct GpRegressor {
    xs: Vec<(f64, f64)>,
    chol: Cholesky<f64, Dyn>,
    alpha: DVector<f64>,
    length_scale: f64,
    signal_variance: f64,
    noise_variance: f64,
}

impl GpRegressor {
    fn fit(xs: &[(f64, f64)], ys: &[f64], cfg: &FieldConfig) -> Result<Self, GpError> {
        let n = xs.len();
        let mut k = DMatrix::zeros(n, n);
        for i in 0..n {
            for j in 0..n {
                k[(i, j)] = rbf(xs[i], xs[j], cfg.gp_length_scale, cfg.gp_signal_variance);
            }
            k[(i, i)] += cfg.gp_noise_variance;
        }
        let chol = Cholesky::new(k).ok_or(GpError::NotPositiveDefinite)?;
        let alpha = chol.solve(&DVector::from_column_slice(ys));
        Ok(Self {
            xs: xs.to_vec(),
            chol,
            alpha,
            length_scale: cfg.gp_length_scale,
            signal_variance: cfg.gp_signal_variance,
            noise_variance: cfg.gp_noise_variance,
        })
    }

    /// Posterior mean and variance at one point.
    fn predict(&self, lat: f64, lon: f64) -> (f64, f64) {
        let k_star = DVector::from_iterator(
            self.xs.len(),
            self.xs
                .iter()
                .map(|x| rbf((lat, lon), *x, self.length_scale, self.signal_variance)),
        );
        let mean = k_star.dot(&self.alpha);
        let v = self.chol.solve(&k_star);
        let var = self.signal_variance + self.noise_variance - k_star.dot(&v);
        (mean, var.max(0.0))
    }
}

fn rbf(a: (f64, f64), b: (f64, f64), length_scale: f64, signal_variance: f64) -> f64 {
    let d2 = (a.0 - b.0).powi(2) + (a.1 - b.1).powi(2);
    signal_variance * (-d2 / (2.0 * length_scale * length_scale)).exp()
}
