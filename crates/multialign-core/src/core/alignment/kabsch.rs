use super::AlignmentError;
use super::selection::AtomSelection;
use crate::core::models::structure::Structure;
use crate::core::utils::geometry::{calculate_rmsd, centroid};
use nalgebra::{Matrix3, Point3, Rotation3, Vector3};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Minimum number of paired points for a well-defined rotation.
pub const MIN_FIT_ATOMS: usize = 3;

/// A proper rotation followed by a translation: `x' = R x + t`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidTransform {
    pub rotation: Rotation3<f64>,
    pub translation: Vector3<f64>,
}

impl RigidTransform {
    #[inline]
    pub fn apply(&self, point: &Point3<f64>) -> Point3<f64> {
        self.rotation * point + self.translation
    }

    /// Moves every atom of `structure`.
    ///
    /// With the `parallel` feature and `chunks > 1`, the atoms are split into
    /// `chunks` slices that run on the current rayon pool.
    pub fn apply_to_structure(&self, structure: &mut Structure, chunks: usize) {
        #[cfg(feature = "parallel")]
        if chunks > 1 {
            let mut atoms: Vec<_> = structure.atoms_mut().collect();
            let chunk_len = atoms.len().div_ceil(chunks).max(1);
            atoms.par_chunks_mut(chunk_len).for_each(|slice| {
                for atom in slice.iter_mut() {
                    atom.position = self.apply(&atom.position);
                }
            });
            return;
        }

        #[cfg(not(feature = "parallel"))]
        let _ = chunks;

        for atom in structure.atoms_mut() {
            atom.position = self.apply(&atom.position);
        }
    }
}

/// Outcome of a least-squares fit of a mobile point set onto a reference set.
#[derive(Debug, Clone, PartialEq)]
pub struct Superposition {
    /// Transform that carries the mobile points onto the reference.
    pub transform: RigidTransform,
    /// RMSD over the fitted points after the transform.
    pub rmsd: f64,
    /// Number of point pairs in the fit.
    pub fitted_points: usize,
}

/// Kabsch superposition of `mobile` onto `reference`.
///
/// Points are paired by index. The rotation is the proper rotation that minimises
/// the RMSD between the transformed mobile points and the reference points.
pub fn superpose(
    mobile: &[Point3<f64>],
    reference: &[Point3<f64>],
) -> Result<Superposition, AlignmentError> {
    if mobile.len() != reference.len() {
        return Err(AlignmentError::AtomCountMismatch {
            selection: "points".to_string(),
            mobile: mobile.len(),
            reference: reference.len(),
        });
    }
    if mobile.len() < MIN_FIT_ATOMS {
        return Err(AlignmentError::InsufficientAtoms {
            selection: "points".to_string(),
            required: MIN_FIT_ATOMS,
            found: mobile.len(),
        });
    }

    let (Some(c_mobile), Some(c_reference)) = (centroid(mobile), centroid(reference)) else {
        return Err(AlignmentError::Degenerate);
    };

    // Cross-covariance of the centred sets.
    let mut h: Matrix3<f64> = Matrix3::zeros();
    for (m, r) in mobile.iter().zip(reference.iter()) {
        h += (m - c_mobile) * (r - c_reference).transpose();
    }

    let svd = h.svd(true, true);
    let (Some(u), Some(v_t)) = (svd.u, svd.v_t) else {
        return Err(AlignmentError::Degenerate);
    };

    let mut r: Matrix3<f64> = v_t.transpose() * u.transpose();
    if r.determinant() < 0.0 {
        // Reflection: flip the axis of the smallest singular value.
        let smallest = svd.singular_values.imin();
        let mut v_t_adj = v_t;
        v_t_adj.row_mut(smallest).neg_mut();
        r = v_t_adj.transpose() * u.transpose();
    }

    let rotation = Rotation3::from_matrix_unchecked(r);
    let translation = c_reference.coords - rotation * c_mobile.coords;
    let transform = RigidTransform {
        rotation,
        translation,
    };

    let fitted: Vec<Point3<f64>> = mobile.iter().map(|p| transform.apply(p)).collect();
    let rmsd = calculate_rmsd(&fitted, reference).ok_or(AlignmentError::Degenerate)?;

    Ok(Superposition {
        transform,
        rmsd,
        fitted_points: mobile.len(),
    })
}

/// Fits `mobile` onto `reference` using the atoms picked by `selection`, then
/// moves every atom of `mobile` by the resulting transform.
///
/// `chunks` controls how the final coordinate update is split; see
/// [`RigidTransform::apply_to_structure`].
pub fn superpose_structures(
    mobile: &mut Structure,
    reference: &Structure,
    selection: &AtomSelection,
    chunks: usize,
) -> Result<Superposition, AlignmentError> {
    let mobile_points = selected_positions(mobile, selection);
    let reference_points = selected_positions(reference, selection);

    if mobile_points.len() != reference_points.len() {
        return Err(AlignmentError::AtomCountMismatch {
            selection: selection.to_string(),
            mobile: mobile_points.len(),
            reference: reference_points.len(),
        });
    }
    if mobile_points.len() < MIN_FIT_ATOMS {
        return Err(AlignmentError::InsufficientAtoms {
            selection: selection.to_string(),
            required: MIN_FIT_ATOMS,
            found: mobile_points.len(),
        });
    }

    let superposition = superpose(&mobile_points, &reference_points)?;
    superposition
        .transform
        .apply_to_structure(mobile, chunks);
    Ok(superposition)
}

/// RMSD between the atoms picked by `selection` in two structures, as they stand.
pub fn selection_rmsd(
    mobile: &Structure,
    reference: &Structure,
    selection: &AtomSelection,
) -> Result<f64, AlignmentError> {
    let mobile_points = selected_positions(mobile, selection);
    let reference_points = selected_positions(reference, selection);

    if mobile_points.len() != reference_points.len() {
        return Err(AlignmentError::AtomCountMismatch {
            selection: selection.to_string(),
            mobile: mobile_points.len(),
            reference: reference_points.len(),
        });
    }
    calculate_rmsd(&mobile_points, &reference_points).ok_or_else(|| {
        AlignmentError::InsufficientAtoms {
            selection: selection.to_string(),
            required: 1,
            found: 0,
        }
    })
}

pub fn selected_positions(structure: &Structure, selection: &AtomSelection) -> Vec<Point3<f64>> {
    structure
        .atoms_iter()
        .filter(|(_, atom)| selection.matches(atom))
        .map(|(_, atom)| atom.position)
        .collect()
}
