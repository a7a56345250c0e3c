use core::ops::{Add, Mul, Neg, Sub};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point3f {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3f {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3f {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3f {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, rhs: Self) -> f32 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    pub fn norm(self) -> f32 {
        self.dot(self).sqrt()
    }
}

impl Add<Vec3f> for Point3f {
    type Output = Point3f;

    fn add(self, rhs: Vec3f) -> Self::Output {
        Point3f {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}

impl Sub<Vec3f> for Point3f {
    type Output = Point3f;

    fn sub(self, rhs: Vec3f) -> Self::Output {
        Point3f {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}

impl Sub<Point3f> for Point3f {
    type Output = Vec3f;

    fn sub(self, rhs: Point3f) -> Self::Output {
        Vec3f {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}

impl Add for Vec3f {
    type Output = Vec3f;

    fn add(self, rhs: Vec3f) -> Self::Output {
        Vec3f {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
            z: self.z + rhs.z,
        }
    }
}

impl Sub for Vec3f {
    type Output = Vec3f;

    fn sub(self, rhs: Vec3f) -> Self::Output {
        Vec3f {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
            z: self.z - rhs.z,
        }
    }
}

impl Mul<f32> for Vec3f {
    type Output = Vec3f;

    fn mul(self, rhs: f32) -> Self::Output {
        Vec3f {
            x: self.x * rhs,
            y: self.y * rhs,
            z: self.z * rhs,
        }
    }
}

impl Neg for Vec3f {
    type Output = Vec3f;

    fn neg(self) -> Self::Output {
        Vec3f {
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Point3f, Vec3f};

    #[test]
    fn point_vector_arithmetic() {
        let p = Point3f::new(1.0, 2.0, 3.0);
        let v = Vec3f::new(0.5, -1.0, 2.0);

        let q = p + v;
        assert_eq!(q, Point3f::new(1.5, 1.0, 5.0));
        assert_eq!(q - p, v);
        assert_eq!(p - v, Point3f::new(0.5, 3.0, 1.0));
    }

    #[test]
    fn norm_and_dot() {
        let v = Vec3f::new(3.0, 4.0, 0.0);
        assert!((v.norm() - 5.0).abs() < 1e-6);
        assert!((v.dot(Vec3f::new(1.0, 1.0, 1.0)) - 7.0).abs() < 1e-6);
        assert_eq!(-v, Vec3f::new(-3.0, -4.0, 0.0));
        assert_eq!(v * 2.0, Vec3f::new(6.0, 8.0, 0.0));
    }
}
