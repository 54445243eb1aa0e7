//! Fixed-matrix stand-ins for printing conditions. These approximate the look
//! of each press profile; they are not a color-management transform.

use super::matrix::ColorMatrix;

pub const SWOP_COATED: &str = "swop-coated";
pub const FOGRA39: &str = "fogra39";
pub const GRACOL: &str = "gra-col";
pub const UNCOATED: &str = "uncoated";

/// Matrix for a profile id. Custom and unknown ids share a generic one.
pub fn profile_matrix(profile_id: &str) -> ColorMatrix {
    match profile_id {
        SWOP_COATED => ColorMatrix::diagonal(0.95, 0.93, 0.90),
        FOGRA39 => ColorMatrix::diagonal(0.96, 0.96, 0.96),
        // Dot gain bleeds neighbouring channels into each other.
        UNCOATED => ColorMatrix::rgb([
            [0.80, 0.05, 0.05],
            [0.05, 0.80, 0.05],
            [0.05, 0.05, 0.80],
        ]),
        GRACOL => ColorMatrix::diagonal(0.94, 0.94, 0.92),
        _ => ColorMatrix::diagonal(0.90, 0.90, 0.90),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_profiles() {
        assert_eq!(profile_matrix(FOGRA39).0[0][0], 0.96);
        assert_eq!(profile_matrix(SWOP_COATED).0[2][2], 0.90);
        assert_eq!(profile_matrix(GRACOL).0[1][1], 0.94);
        assert_eq!(profile_matrix(UNCOATED).0[0][1], 0.05);
    }

    #[test]
    fn test_unknown_profile_falls_back() {
        assert_eq!(profile_matrix("custom-17"), profile_matrix(""));
        assert_eq!(profile_matrix("custom-17").0[1][1], 0.90);
        assert_eq!(profile_matrix("custom-17").0[3][3], 1.0);
    }

    #[test]
    fn test_uncoated_desaturates() {
        let red = [1.0, 0.0, 0.0, 1.0];
        let uncoated = profile_matrix(UNCOATED).transform(red);
        let fogra = profile_matrix(FOGRA39).transform(red);
        assert!(uncoated[1] > 0.0);
        assert_eq!(fogra[1], 0.0);
        assert!(uncoated[0] - uncoated[1] < fogra[0] - fogra[1]);
    }
}
