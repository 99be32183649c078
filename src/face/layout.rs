//! Where the parts of the face go on the 2.13" panel (portrait, USB at the bottom)

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceLayout {
    /// Panel width in pixels
    pub width: u32,
    /// Panel height in pixels
    pub height: u32,
    pub eye_y: i32,
    pub mouth_y: i32,
    pub left_eye_x: i32,
    pub right_eye_x: i32,
    pub eye_radius: u32,
    pub pupil_radius: u32,
    /// Baseline of the label under the face
    pub label_y: i32,
}

impl FaceLayout {
    pub const DEFAULT: Self = Self {
        width: 122,
        height: 250,
        eye_y: 70,
        mouth_y: 115,
        left_eye_x: 40,
        right_eye_x: 82,
        eye_radius: 10,
        pupil_radius: 4,
        label_y: 230,
    };

    /// Horizontal centre of the face
    pub const fn center_x(&self) -> i32 {
        self.width as i32 / 2
    }
}

impl Default for FaceLayout {
    fn default() -> Self {
        Self::DEFAULT
    }
}
