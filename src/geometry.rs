use super::*;

/// Failures of the geometry kernel. The kernel never substitutes a default rotation; callers decide.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum GeometryError {
    #[error("Geometry error: angle or axis requested for a zero-norm vector.")]
    ZeroNorm,
    #[error("Geometry error: rotation axis is undefined for antiparallel directions.")]
    DegenerateAxis,
}

/// 3x3 linear map acting on `Vector`s. Kept orthonormal (a proper rotation) within floating tolerance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    m: [[f64; 3]; 3],
}

impl Default for Transform {
    fn default() -> Transform {
        Transform::identity()
    }
}

impl Transform {
    pub fn identity() -> Transform {
        Transform {
            m: [
                [1., 0., 0.],
                [0., 1., 0.],
                [0., 0., 1.],
            ]
        }
    }

    pub fn from_rows(rows: [[f64; 3]; 3]) -> Transform {
        Transform { m: rows }
    }

    pub fn row(&self, i: usize) -> Vector {
        Vector::new(self.m[i][0], self.m[i][1], self.m[i][2])
    }

    pub fn column(&self, j: usize) -> Vector {
        Vector::new(self.m[0][j], self.m[1][j], self.m[2][j])
    }

    pub fn element(&self, i: usize, j: usize) -> f64 {
        self.m[i][j]
    }

    pub fn apply(&self, v: &Vector) -> Vector {
        Vector::new(self.row(0).dot(v), self.row(1).dot(v), self.row(2).dot(v))
    }

    pub fn determinant(&self) -> f64 {
        let m = &self.m;
        let positive = m[0][0]*m[1][1]*m[2][2] + m[1][0]*m[2][1]*m[0][2] + m[2][0]*m[0][1]*m[1][2];
        let negative = m[0][2]*m[1][1]*m[2][0] + m[1][2]*m[2][1]*m[0][0] + m[2][2]*m[0][1]*m[1][0];
        positive - negative
    }

    pub fn scale(&mut self, factor: f64) {
        for row in self.m.iter_mut() {
            for element in row.iter_mut() {
                *element *= factor;
            }
        }
    }

    /// Matrix product `self * other`: `other` is applied first.
    pub fn compose(&self, other: &Transform) -> Transform {
        let mut m = [[0.; 3]; 3];
        for (i, row) in m.iter_mut().enumerate() {
            for (j, element) in row.iter_mut().enumerate() {
                *element = self.row(i).dot(&other.column(j));
            }
        }
        Transform { m }
    }

    /// Rescale by det^(-1/3) to pull the determinant back to 1 after repeated composition.
    /// A singular transform is left as is.
    pub fn renormalize(&mut self) {
        let det = self.determinant();
        if det != 0. {
            self.scale(1./det.cbrt());
        }
    }

    /// Rodrigues rotation by `angle` radians about `axis`.
    pub fn rotation(axis: &Vector, angle: f64) -> Result<Transform, GeometryError> {
        let norm = axis.magnitude();
        if norm == 0. {
            return Err(GeometryError::ZeroNorm);
        }

        let nx = axis.x/norm;
        let ny = axis.y/norm;
        let nz = axis.z/norm;
        let sn = angle.sin();
        let cs = angle.cos();
        let vs = 1. - cs;

        Ok(Transform {
            m: [
                [nx*nx*vs + cs,    nx*ny*vs - nz*sn, nz*nx*vs + ny*sn],
                [nx*ny*vs + nz*sn, ny*ny*vs + cs,    ny*nz*vs - nx*sn],
                [nz*nx*vs - ny*sn, ny*nz*vs + nx*sn, nz*nz*vs + cs   ],
            ]
        })
    }

    /// Rotation carrying direction `from` onto direction `to`.
    ///
    /// Identical directions give the identity. Antiparallel directions have no unique axis and fail with
    /// `DegenerateAxis`; zero-norm inputs fail with `ZeroNorm`.
    pub fn rotation_between(from: &Vector, to: &Vector) -> Result<Transform, GeometryError> {
        let mut a = *from;
        let mut b = *to;
        if !a.normalize() || !b.normalize() {
            return Err(GeometryError::ZeroNorm);
        }

        let axis = a.cross(&b);
        if axis.magnitude() < PARALLEL_TOLERANCE {
            return if a.dot(&b) > 0. {
                Ok(Transform::identity())
            } else {
                Err(GeometryError::DegenerateAxis)
            };
        }
        let angle = a.angle(&b)?;
        Transform::rotation(&axis.normalized(), angle)
    }
}
