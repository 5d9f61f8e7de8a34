use crate::{DropCounter, Tracked};

/// A trait used for testing pointers to trait objects
pub trait Shape {
    /// The shape's name
    fn name(&self) -> &str;

    /// The shape's area
    fn area(&self) -> f64;
}

/// A circle that reports its destruction to a [`DropCounter`]
#[derive(Debug)]
pub struct Circle {
    radius: Tracked<f64>,
}

impl Circle {
    /// Makes a circle with the given radius
    pub fn new(radius: f64, counter: &DropCounter) -> Self {
        Self {
            radius: counter.track(radius),
        }
    }
}

impl Shape for Circle {
    fn name(&self) -> &str {
        "circle"
    }

    fn area(&self) -> f64 {
        std::f64::consts::PI * *self.radius * *self.radius
    }
}

/// A square that reports its destruction to a [`DropCounter`]
#[derive(Debug)]
pub struct Square {
    side: Tracked<f64>,
}

impl Square {
    /// Makes a square with the given side length
    pub fn new(side: f64, counter: &DropCounter) -> Self {
        Self {
            side: counter.track(side),
        }
    }
}

impl Shape for Square {
    fn name(&self) -> &str {
        "square"
    }

    fn area(&self) -> f64 {
        *self.side * *self.side
    }
}
