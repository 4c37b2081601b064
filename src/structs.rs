use super::*;

/// 3D vector.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector {
    pub fn new(x: f64, y: f64, z: f64) -> Vector {
        Vector {
            x,
            y,
            z
        }
    }

    pub fn zero() -> Vector {
        Vector::new(0., 0., 0.)
    }

    /// Calculates vector magnitude without overflow or underflow of the squared components.
    pub fn magnitude(&self) -> f64 {
        self.x.hypot(self.y).hypot(self.z)
    }

    /// True only for the exact zero vector, which records use as the "undefined direction" sentinel.
    pub fn is_zero(&self) -> bool {
        self.x == 0. && self.y == 0. && self.z == 0.
    }

    /// Normalizes vector components to magnitude 1. Returns false and leaves the vector untouched if its magnitude is zero.
    pub fn normalize(&mut self) -> bool {
        let magnitude = self.magnitude();
        if magnitude == 0. {
            return false;
        }
        self.x /= magnitude;
        self.y /= magnitude;
        self.z /= magnitude;
        true
    }

    /// Normalized copy; the zero vector maps to itself.
    pub fn normalized(&self) -> Vector {
        let mut v = *self;
        v.normalize();
        v
    }

    /// Add this vector and another and return a new vector.
    pub fn add(&self, other: &Vector) -> Vector {
        Vector::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    pub fn sub(&self, other: &Vector) -> Vector {
        Vector::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    pub fn scale(&self, factor: f64) -> Vector {
        Vector::new(factor*self.x, factor*self.y, factor*self.z)
    }

    pub fn dot(&self, other: &Vector) -> f64 {
        self.x*other.x + self.y*other.y + self.z*other.z
    }

    pub fn cross(&self, other: &Vector) -> Vector {
        Vector::new(
            self.y*other.z - self.z*other.y,
            self.z*other.x - self.x*other.z,
            self.x*other.y - self.y*other.x,
        )
    }

    /// Angle between two vectors in radians, in [0, pi].
    pub fn angle(&self, other: &Vector) -> Result<f64, GeometryError> {
        let mut a = *self;
        let mut b = *other;
        if !a.normalize() || !b.normalize() {
            return Err(GeometryError::ZeroNorm);
        }
        //Rounding can push |cos| slightly past 1 for (anti)parallel inputs
        let cosine = a.dot(&b).clamp(-1., 1.);
        Ok(cosine.acos())
    }

    /// Some unit vector perpendicular to this one, built against the axis of its smallest component.
    pub fn perpendicular(&self) -> Result<Vector, GeometryError> {
        let ax = self.x.abs();
        let ay = self.y.abs();
        let az = self.z.abs();
        let auxiliary = if ax <= ay && ax <= az {
            Vector::new(1., 0., 0.)
        } else if ay <= az {
            Vector::new(0., 1., 0.)
        } else {
            Vector::new(0., 0., 1.)
        };
        let mut perpendicular = self.cross(&auxiliary);
        if perpendicular.normalize() {
            Ok(perpendicular)
        } else {
            Err(GeometryError::ZeroNorm)
        }
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}
