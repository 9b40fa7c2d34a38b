use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Settings of the iterative distortion inversion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UndistortConfig {
    pub max_iters: usize,
    /// Stop once the update of the normalized coordinate is smaller than this.
    pub eps: f64,
    /// Largest `|distort(x) - xd|` accepted when the iterations run out before `eps` is met.
    pub residual_tol: f64,
}

impl Default for UndistortConfig {
    fn default() -> Self {
        Self {
            max_iters: 20,
            eps: 1e-12,
            residual_tol: 1e-8,
        }
    }
}

/// Lens distortion acting on normalized image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Distortion {
    /// Brown-Conrady with the optional rational denominator.
    /// `k` is `[k1, k2, k3, k4, k5, k6]`, `p` is `[p1, p2]`.
    RadialTangential { k: [f64; 6], p: [f64; 2] },
    /// Kannala-Brandt, `[k1, k2, k3, k4]`.
    Equidistant { k: [f64; 4] },
}

impl Default for Distortion {
    fn default() -> Self {
        Distortion::none()
    }
}

impl Distortion {
    pub fn none() -> Distortion {
        Distortion::RadialTangential {
            k: [0.0; 6],
            p: [0.0; 2],
        }
    }

    /// Reads the coefficients the way ROS camera drivers publish them.
    pub fn from_camera_info(model: &str, d: &[f64]) -> Result<Distortion, ConfigError> {
        let shape_error = || ConfigError::DistortionShape {
            model: model.to_string(),
            len: d.len(),
        };
        match model.trim().to_ascii_lowercase().as_str() {
            "" | "plumb_bob" | "radtan" => match d.len() {
                0 => Ok(Distortion::none()),
                4 | 5 => Ok(Distortion::RadialTangential {
                    k: [d[0], d[1], d.get(4).copied().unwrap_or(0.0), 0.0, 0.0, 0.0],
                    p: [d[2], d[3]],
                }),
                _ => Err(shape_error()),
            },
            "rational_polynomial" => match d.len() {
                8 => Ok(Distortion::RadialTangential {
                    k: [d[0], d[1], d[4], d[5], d[6], d[7]],
                    p: [d[2], d[3]],
                }),
                _ => Err(shape_error()),
            },
            "equidistant" | "fisheye" => match d.len() {
                4 => Ok(Distortion::Equidistant {
                    k: [d[0], d[1], d[2], d[3]],
                }),
                _ => Err(shape_error()),
            },
            _ => Err(ConfigError::UnknownDistortionModel(model.to_string())),
        }
    }

    pub fn is_identity(&self) -> bool {
        match self {
            Distortion::RadialTangential { k, p } => {
                k.iter().chain(p.iter()).all(|c| *c == 0.0)
            }
            Distortion::Equidistant { .. } => false,
        }
    }

    /// Ideal normalized coordinate to distorted normalized coordinate.
    pub fn distort(&self, xn: [f64; 2]) -> [f64; 2] {
        match self {
            Distortion::RadialTangential { k, p } => {
                let [x, y] = xn;
                let r2 = x * x + y * y;
                let radial = radial_factor(k, r2);
                let dx = 2.0 * p[0] * x * y + p[1] * (r2 + 2.0 * x * x);
                let dy = p[0] * (r2 + 2.0 * y * y) + 2.0 * p[1] * x * y;
                [x * radial + dx, y * radial + dy]
            }
            Distortion::Equidistant { k } => {
                let r = (xn[0] * xn[0] + xn[1] * xn[1]).sqrt();
                if r < 1e-12 {
                    return xn;
                }
                let theta_d = kb_theta_d(k, r.atan());
                let d = theta_d / r;
                [xn[0] * d, xn[1] * d]
            }
        }
    }

    /// Distorted normalized coordinate back to the ideal one. `None` when the iteration
    /// leaves the valid domain of the model or stops without converging.
    pub fn undistort(&self, xd: [f64; 2], cfg: &UndistortConfig) -> Option<[f64; 2]> {
        match self {
            Distortion::RadialTangential { k, p } => {
                let (mut x, mut y) = (xd[0], xd[1]);
                let mut converged = false;
                for _ in 0..cfg.max_iters.max(1) {
                    let r2 = x * x + y * y;
                    let icdist = 1.0 / radial_factor(k, r2);
                    if !icdist.is_finite() || icdist < 0.0 {
                        return None;
                    }
                    let dx = 2.0 * p[0] * x * y + p[1] * (r2 + 2.0 * x * x);
                    let dy = p[0] * (r2 + 2.0 * y * y) + 2.0 * p[1] * x * y;
                    let x_next = (xd[0] - dx) * icdist;
                    let y_next = (xd[1] - dy) * icdist;
                    if !x_next.is_finite() || !y_next.is_finite() {
                        return None;
                    }
                    let step = ((x_next - x).powi(2) + (y_next - y).powi(2)).sqrt();
                    x = x_next;
                    y = y_next;
                    if step <= cfg.eps {
                        converged = true;
                        break;
                    }
                }
                (converged || self.residual([x, y], xd) <= cfg.residual_tol).then_some([x, y])
            }
            Distortion::Equidistant { k } => {
                let theta_d = (xd[0] * xd[0] + xd[1] * xd[1]).sqrt();
                if theta_d < 1e-12 {
                    return Some(xd);
                }
                let mut theta = theta_d;
                let mut converged = false;
                for _ in 0..cfg.max_iters.max(1) {
                    let theta_next = theta - (kb_theta_d(k, theta) - theta_d) / kb_dtheta(k, theta);
                    if !theta_next.is_finite() {
                        return None;
                    }
                    let step = (theta_next - theta).abs();
                    theta = theta_next;
                    if step <= cfg.eps {
                        converged = true;
                        break;
                    }
                }
                if !converged && (kb_theta_d(k, theta) - theta_d).abs() > cfg.residual_tol {
                    return None;
                }
                if !(0.0..std::f64::consts::FRAC_PI_2).contains(&theta) {
                    return None;
                }
                let scale = theta.tan() / theta_d;
                Some([xd[0] * scale, xd[1] * scale])
            }
        }
    }

    fn residual(&self, xn: [f64; 2], xd: [f64; 2]) -> f64 {
        let [x, y] = self.distort(xn);
        ((x - xd[0]).powi(2) + (y - xd[1]).powi(2)).sqrt()
    }
}

fn radial_factor(k: &[f64; 6], r2: f64) -> f64 {
    let r4 = r2 * r2;
    let r6 = r4 * r2;
    (1.0 + k[0] * r2 + k[1] * r4 + k[2] * r6) / (1.0 + k[3] * r2 + k[4] * r4 + k[5] * r6)
}

fn kb_theta_d(k: &[f64; 4], theta: f64) -> f64 {
    let theta2 = theta * theta;
    let theta4 = theta2 * theta2;
    let theta6 = theta2 * theta4;
    let theta8 = theta2 * theta6;
    theta * (1.0 + k[0] * theta2 + k[1] * theta4 + k[2] * theta6 + k[3] * theta8)
}

fn kb_dtheta(k: &[f64; 4], theta: f64) -> f64 {
    let theta2 = theta * theta;
    let theta4 = theta2 * theta2;
    let theta6 = theta2 * theta4;
    let theta8 = theta2 * theta6;
    1.0 + 3.0 * k[0] * theta2 + 5.0 * k[1] * theta4 + 7.0 * k[2] * theta6 + 9.0 * k[3] * theta8
}
