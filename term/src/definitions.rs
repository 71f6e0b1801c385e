//! The definitions of the terminal front-end

pub(crate) mod keyboard {
    use std::time::Duration;

    /// The QWERTY block, laid over the hex keypad layout.
    ///
    /// ```text
    /// 1 2 3 C      1 2 3 4
    /// 4 5 6 D      q w e r
    /// 7 8 9 E      a s d f
    /// A 0 B F      z x c v
    /// ```
    pub const QWERTY: [[char; 4]; 4] = [
        ['1', '2', '3', '4'],
        ['q', 'w', 'e', 'r'],
        ['a', 's', 'd', 'f'],
        ['z', 'x', 'c', 'v'],
    ];

    /// How long a key counts as held after its last press, when the terminal does not
    /// report releases.
    pub const HOLD_WINDOW: Duration = Duration::from_millis(150);
}

pub(crate) mod display {
    /// Both pixels of a text cell are set.
    pub const FULL: char = '█';
    /// Only the upper pixel is set.
    pub const UPPER: char = '▀';
    /// Only the lower pixel is set.
    pub const LOWER: char = '▄';
    pub const EMPTY: char = ' ';
    /// The amount of pixel rows per text row.
    pub const ROWS_PER_CELL: usize = 2;
}

pub(crate) mod sound {
    /// The terminal bell.
    pub const BELL: &str = "\x07";
}
