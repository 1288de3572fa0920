//! Standard 10-20 electrode positions.
//!
//! Positions are given in spherical BESA convention `(theta, phi)` in
//! degrees on a head sphere of radius [`HEAD_RADIUS`] metres, converted to
//! Cartesian head coordinates:
//!
//! ```text
//!   x = r · sin θ · cos φ
//!   y = r · sin θ · sin φ
//!   z = r · cos θ
//! ```
//!
//! Only topology-aware consumers look at these; the numeric pipeline never
//! does.
use ndarray::Array2;

/// Head sphere radius in metres.
pub const HEAD_RADIUS: f64 = 0.095;

/// `(label, theta°, phi°)`.
const STANDARD_1020: &[(&str, f64, f64)] = &[
    ("Fp1", -92.0, -72.0),
    ("Fp2", 92.0, 72.0),
    ("Fpz", 92.0, 90.0),
    ("AF3", -74.0, -65.0),
    ("AF4", 74.0, 65.0),
    ("F7", -92.0, -36.0),
    ("F3", -60.0, -51.0),
    ("Fz", 46.0, 90.0),
    ("F4", 60.0, 51.0),
    ("F8", 92.0, 36.0),
    ("FC5", -69.0, -21.0),
    ("FC6", 69.0, 21.0),
    ("T7", -92.0, 0.0),
    ("C3", -46.0, 0.0),
    ("Cz", 0.0, 0.0),
    ("C4", 46.0, 0.0),
    ("T8", 92.0, 0.0),
    ("TP9", -115.0, 18.0),
    ("TP10", 115.0, -18.0),
    ("P7", -92.0, 36.0),
    ("P3", -60.0, 51.0),
    ("Pz", 46.0, -90.0),
    ("P4", 60.0, -51.0),
    ("P8", 92.0, -36.0),
    ("O1", -92.0, 72.0),
    ("O2", 92.0, -72.0),
    ("Oz", 92.0, -90.0),
];

/// Cartesian position of `label` (case-insensitive), if it is a known site.
pub fn position(label: &str) -> Option<[f64; 3]> {
    STANDARD_1020
        .iter()
        .find(|(name, _, _)| name.eq_ignore_ascii_case(label))
        .map(|&(_, theta, phi)| {
            let (t, p) = (theta.to_radians(), phi.to_radians());
            [
                HEAD_RADIUS * t.sin() * p.cos(),
                HEAD_RADIUS * t.sin() * p.sin(),
                HEAD_RADIUS * t.cos(),
            ]
        })
}

/// `[C, 3]` positions for `channels`, plus the labels that are not part of
/// the montage (their rows are left at the origin).
pub fn positions(channels: &[String]) -> (Array2<f64>, Vec<String>) {
    let mut pos = Array2::<f64>::zeros((channels.len(), 3));
    let mut unknown = Vec::new();
    for (i, ch) in channels.iter().enumerate() {
        match position(ch) {
            Some(xyz) => {
                for (k, v) in xyz.into_iter().enumerate() {
                    pos[[i, k]] = v;
                }
            }
            None => unknown.push(ch.clone()),
        }
    }
    (pos, unknown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_site_lies_on_the_head_sphere() {
        for (name, _, _) in STANDARD_1020 {
            let [x, y, z] = position(name).unwrap();
            approx::assert_abs_diff_eq!((x * x + y * y + z * z).sqrt(), HEAD_RADIUS, epsilon = 1e-12);
        }
    }

    #[test]
    fn cz_is_the_vertex() {
        let [x, y, z] = position("cz").unwrap();
        approx::assert_abs_diff_eq!(x, 0.0, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(y, 0.0, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(z, HEAD_RADIUS, epsilon = 1e-12);
    }

    #[test]
    fn left_and_right_hemispheres_mirror() {
        let [x3, ..] = position("C3").unwrap();
        let [x4, ..] = position("C4").unwrap();
        assert!(x3 < 0.0 && x4 > 0.0);
        approx::assert_abs_diff_eq!(x3, -x4, epsilon = 1e-12);
    }

    #[test]
    fn unknown_labels_are_reported_and_zeroed() {
        let (pos, unknown) = positions(&["O1".to_string(), "EXG1".to_string()]);
        assert_eq!(unknown, vec!["EXG1"]);
        assert_eq!(pos.row(1).to_vec(), vec![0.0, 0.0, 0.0]);
        assert!(pos.row(0).iter().any(|&v| v != 0.0));
    }
}
