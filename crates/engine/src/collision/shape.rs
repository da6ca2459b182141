use serde::Deserialize;

use crate::content::BuildError;
use crate::math::Vec2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub position: Vec2,
    pub offset: Vec2,
    pub radius: f32,
}

impl Circle {
    pub fn new(position: Vec2, radius: f32) -> Self {
        Self {
            position,
            offset: Vec2::ZERO,
            radius,
        }
    }

    pub fn contains_point(&self, point: Vec2) -> bool {
        self.position.distance(point) <= self.radius
    }
}

/// Axis-aligned; `position` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle {
    pub position: Vec2,
    pub offset: Vec2,
    pub width: f32,
    pub height: f32,
}

impl Rectangle {
    pub fn new(position: Vec2, width: f32, height: f32) -> Self {
        Self {
            position,
            offset: Vec2::ZERO,
            width,
            height,
        }
    }

    pub fn corners(&self) -> [Vec2; 4] {
        let Vec2 { x, y } = self.position;
        [
            Vec2::new(x, y),
            Vec2::new(x + self.width, y),
            Vec2::new(x + self.width, y + self.height),
            Vec2::new(x, y + self.height),
        ]
    }

    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.position.x
            && point.x <= self.position.x + self.width
            && point.y >= self.position.y
            && point.y <= self.position.y + self.height
    }

    fn overlaps(&self, other: &Rectangle) -> bool {
        self.position.x <= other.position.x + other.width
            && other.position.x <= self.position.x + self.width
            && self.position.y <= other.position.y + other.height
            && other.position.y <= self.position.y + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Circle(Circle),
    Rectangle(Rectangle),
}

impl Shape {
    pub fn position(&self) -> Vec2 {
        match self {
            Shape::Circle(circle) => circle.position,
            Shape::Rectangle(rect) => rect.position,
        }
    }

    pub fn offset(&self) -> Vec2 {
        match self {
            Shape::Circle(circle) => circle.offset,
            Shape::Rectangle(rect) => rect.offset,
        }
    }

    pub fn set_position(&mut self, position: Vec2) {
        match self {
            Shape::Circle(circle) => circle.position = position,
            Shape::Rectangle(rect) => rect.position = position,
        }
    }

    /// Places the shape at `origin + offset`.
    pub fn place_at(&mut self, origin: Vec2) {
        let offset = self.offset();
        self.set_position(origin + offset);
    }

    pub fn contains_point(&self, point: Vec2) -> bool {
        match self {
            Shape::Circle(circle) => circle.contains_point(point),
            Shape::Rectangle(rect) => rect.contains_point(point),
        }
    }

    /// Circle against rectangle only samples the rectangle's four corners, so a
    /// rectangle edge crossing the circle with every corner outside does not count.
    pub fn intersects(&self, other: &Shape) -> bool {
        match (self, other) {
            (Shape::Circle(a), Shape::Circle(b)) => {
                a.position.distance(b.position) <= a.radius + b.radius
            }
            (Shape::Circle(circle), Shape::Rectangle(rect))
            | (Shape::Rectangle(rect), Shape::Circle(circle)) => rect
                .corners()
                .iter()
                .any(|corner| circle.contains_point(*corner)),
            (Shape::Rectangle(a), Shape::Rectangle(b)) => a.overlaps(b),
        }
    }
}

/// Shape as written in level data; `type` is matched case-insensitively.
#[derive(Debug, Clone, Deserialize)]
pub struct ShapeRecord {
    #[serde(rename = "type")]
    pub shape_type: String,
    #[serde(default)]
    pub position: Vec2,
    #[serde(default)]
    pub offset: Vec2,
    pub radius: Option<f32>,
    pub width: Option<f32>,
    pub height: Option<f32>,
}

impl ShapeRecord {
    pub fn into_shape(self, type_tag: &str) -> Result<Shape, BuildError> {
        let missing = |field: &str| BuildError::InvalidRecord {
            type_tag: type_tag.to_string(),
            path: format!("shape.{field}"),
            message: format!("missing field `{field}`"),
        };
        match self.shape_type.to_lowercase().as_str() {
            "circle" => Ok(Shape::Circle(Circle {
                position: self.position,
                offset: self.offset,
                radius: self.radius.ok_or_else(|| missing("radius"))?,
            })),
            "rectangle" => Ok(Shape::Rectangle(Rectangle {
                position: self.position,
                offset: self.offset,
                width: self.width.ok_or_else(|| missing("width"))?,
                height: self.height.ok_or_else(|| missing("height"))?,
            })),
            other => Err(BuildError::UnsupportedShape {
                shape_type: other.to_string(),
            }),
        }
    }
}
