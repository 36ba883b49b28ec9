#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: [f32; 3],
    /// Unit quaternion, `[x, y, z, w]`
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
}

impl Transform {
    pub fn from_position(position: [f32; 3]) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            rotation: [0.0, 0.0, 0.0, 1.0],
            scale: [1.0; 3],
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RigidbodyState {
    pub linear_velocity: [f32; 3],
    pub angular_velocity: [f32; 3],
}
