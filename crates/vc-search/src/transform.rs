use vc_core::Vec3f;

/// Number of degrees of freedom searched per point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DofCount {
    /// Translation only.
    Translation = 3,
    /// Translation and rotation.
    Rigid = 6,
    /// Translation, rotation and six strain components.
    Full = 12,
}

impl DofCount {
    pub fn count(self) -> usize {
        self as usize
    }
}

/// Transform parameters for one subvolume placement.
///
/// Component order matches the search and the output table:
/// translation `(u, v, w)`, Euler rotation `(phi, theta, psi)` in radians
/// about the x, y and z axes, then the symmetric strain components
/// `(exx, eyy, ezz, exy, eyz, exz)`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TransformParams {
    pub translation: Vec3f,
    pub rotation: [f32; 3],
    pub strain: [f32; 6],
}

impl TransformParams {
    pub const NUM_COMPONENTS: usize = 12;

    pub fn identity() -> Self {
        Self::default()
    }

    pub fn from_translation(t: Vec3f) -> Self {
        Self {
            translation: t,
            ..Self::default()
        }
    }

    pub fn component(&self, idx: usize) -> f32 {
        match idx {
            0 => self.translation.x,
            1 => self.translation.y,
            2 => self.translation.z,
            3..=5 => self.rotation[idx - 3],
            6..=11 => self.strain[idx - 6],
            _ => panic!("transform component index out of range: {idx}"),
        }
    }

    pub fn set_component(&mut self, idx: usize, value: f32) {
        match idx {
            0 => self.translation.x = value,
            1 => self.translation.y = value,
            2 => self.translation.z = value,
            3..=5 => self.rotation[idx - 3] = value,
            6..=11 => self.strain[idx - 6] = value,
            _ => panic!("transform component index out of range: {idx}"),
        }
    }

    /// Euclidean distance between two parameter vectors, used for the
    /// successive-iteration convergence criterion.
    pub fn delta_norm(&self, other: &Self) -> f32 {
        let mut acc = 0.0f32;
        for i in 0..Self::NUM_COMPONENTS {
            let d = self.component(i) - other.component(i);
            acc += d * d;
        }
        acc.sqrt()
    }

    /// Precomputes the linear part `R(phi, theta, psi) * (I + E)` of the
    /// offset mapping so candidate evaluation is a matrix multiply per
    /// sample.
    pub fn offset_map(&self) -> OffsetMap {
        let r = rotation_matrix(self.rotation);
        let e = strain_matrix(self.strain);
        let mut m = [[0.0f32; 3]; 3];
        for (i, row) in m.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = (0..3).map(|k| r[i][k] * e[k][j]).sum();
            }
        }
        OffsetMap {
            linear: m,
            translation: self.translation,
        }
    }
}

/// Precomputed affine mapping of template offsets.
#[derive(Debug, Clone, Copy)]
pub struct OffsetMap {
    linear: [[f32; 3]; 3],
    translation: Vec3f,
}

impl OffsetMap {
    /// Maps a template offset into the correlated volume's frame.
    pub fn map(&self, d: Vec3f) -> Vec3f {
        let m = &self.linear;
        Vec3f::new(
            m[0][0] * d.x + m[0][1] * d.y + m[0][2] * d.z,
            m[1][0] * d.x + m[1][1] * d.y + m[1][2] * d.z,
            m[2][0] * d.x + m[2][1] * d.y + m[2][2] * d.z,
        ) + self.translation
    }
}

/// `Rz(psi) * Ry(theta) * Rx(phi)`.
fn rotation_matrix([phi, theta, psi]: [f32; 3]) -> [[f32; 3]; 3] {
    let (sp, cp) = phi.sin_cos();
    let (st, ct) = theta.sin_cos();
    let (ss, cs) = psi.sin_cos();

    [
        [cs * ct, cs * st * sp - ss * cp, cs * st * cp + ss * sp],
        [ss * ct, ss * st * sp + cs * cp, ss * st * cp - cs * sp],
        [-st, ct * sp, ct * cp],
    ]
}

/// `I + E` with symmetric shear components.
fn strain_matrix([exx, eyy, ezz, exy, eyz, exz]: [f32; 6]) -> [[f32; 3]; 3] {
    [
        [1.0 + exx, exy, exz],
        [exy, 1.0 + eyy, eyz],
        [exz, eyz, 1.0 + ezz],
    ]
}
