// Letter point values

/// Points for `a` through `z`, in alphabet order
const STANDARD_POINTS: [u32; 26] = [
    1, 3, 3, 2, 1, 4, 2, 4, 1, 8, 5, 1, 3, // a-m
    1, 1, 3, 10, 1, 1, 1, 1, 4, 4, 8, 4, 10, // n-z
];

/// Immutable letter -> points mapping for `a`..=`z`
#[derive(Debug, Clone)]
pub struct ScoreTable {
    points: [u32; 26],
}

impl ScoreTable {
    /// Standard tile values
    pub fn standard() -> Self {
        Self {
            points: STANDARD_POINTS,
        }
    }

    /// Points for a letter, or `None` if it is not `a`..=`z`
    pub fn get(&self, letter: char) -> Option<u32> {
        if letter.is_ascii_lowercase() {
            Some(self.points[(letter as u8 - b'a') as usize])
        } else {
            None
        }
    }
}

impl Default for ScoreTable {
    fn default() -> Self {
        Self::standard()
    }
}
