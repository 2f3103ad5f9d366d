use num::traits::real::Real;
use num::{Num, NumCast};
use std::fmt;
use std::ops::{Add, Mul, Sub};

/// A 2D vector generic over any numeric type.
///
/// Used for pixel-space geometry: segment endpoints, midpoints and offsets.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct Vec2D<T> {
    /// The x-component of the vector.
    x: T,
    /// The y-component of the vector.
    y: T,
}

impl<T: Copy> Vec2D<T> {
    /// Creates a new vector with the given x and y components.
    pub const fn new(x: T, y: T) -> Self { Self { x, y } }

    /// Returns the x-component of the vector.
    pub const fn x(&self) -> T { self.x }

    /// Returns the y-component of the vector.
    pub const fn y(&self) -> T { self.y }
}

impl<T> Vec2D<T>
where T: Real + NumCast
{
    /// Computes the magnitude (absolute value) of the vector.
    pub fn abs(&self) -> T { (self.x.powi(2) + self.y.powi(2)).sqrt() }

    /// Creates a vector pointing from the current vector (`self`) to another vector.
    pub fn to(&self, other: &Vec2D<T>) -> Vec2D<T> {
        Vec2D::new(other.x - self.x, other.y - self.y)
    }

    /// Computes the Euclidean distance between the current vector and another vector.
    pub fn euclid_distance(&self, other: &Self) -> T {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Midpoint between `self` and `other`.
    pub fn midpoint(&self, other: &Self) -> Self {
        let half = T::from(0.5).unwrap();
        Vec2D::new((self.x + other.x) * half, (self.y + other.y) * half)
    }
}

impl<T> Vec2D<T>
where T: Num + NumCast + Copy
{
    /// Casts the components to another numeric type.
    pub fn cast<U: Num + NumCast + Copy>(&self) -> Vec2D<U> {
        Vec2D::new(U::from(self.x).unwrap(), U::from(self.y).unwrap())
    }
}

impl<T: Num + Copy> Add for Vec2D<T> {
    type Output = Self;
    fn add(self, rhs: Self) -> Self { Vec2D::new(self.x + rhs.x, self.y + rhs.y) }
}

impl<T: Num + Copy> Sub for Vec2D<T> {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self { Vec2D::new(self.x - rhs.x, self.y - rhs.y) }
}

impl<T: Num + Copy> Mul<T> for Vec2D<T> {
    type Output = Self;
    fn mul(self, rhs: T) -> Self { Vec2D::new(self.x * rhs, self.y * rhs) }
}

impl<T: Copy> From<(T, T)> for Vec2D<T> {
    fn from(value: (T, T)) -> Self { Vec2D::new(value.0, value.1) }
}

impl<T: fmt::Display> fmt::Display for Vec2D<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
